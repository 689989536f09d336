//! Field rules understood by the reference engine.

use crate::error::{RuleError, RuleParseError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Formats with a fixed built-in pattern.
#[derive(Debug, Clone, Copy)]
enum Format {
    Email,
    Url,
}

impl Format {
    const fn source(self) -> &'static str {
        match self {
            Format::Email => r"^[^\s@]+@[^\s@.]+(\.[^\s@.]+)+$",
            Format::Url => r"^(?i:https?|ftp)://[^\s/?#.][^\s/?#]*(?:[/?#]\S*)?$",
        }
    }

    fn matches(self, text: &str) -> bool {
        static COMPILED: [OnceLock<Regex>; 2] = [OnceLock::new(), OnceLock::new()];
        COMPILED[self as usize]
            .get_or_init(|| Regex::new(self.source()).expect("built-in format pattern"))
            .is_match(text)
    }
}

/// A user-supplied `regex` rule pattern, compiled once when the rule is built.
///
/// Construction fails on an invalid pattern, whether the rule comes from
/// code, from `regex:...` text or from JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Pattern(Regex);

impl Pattern {
    /// Compile a pattern.
    pub fn new(source: &str) -> Result<Self, RuleParseError> {
        Regex::new(source)
            .map(Pattern)
            .map_err(|_| RuleParseError::InvalidParameter {
                rule: "regex".to_string(),
                param: source.to_string(),
            })
    }

    /// The pattern source.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Check whether `text` matches.
    pub fn is_match(&self, text: &str) -> bool {
        self.0.is_match(text)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl FromStr for Pattern {
    type Err = RuleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Pattern::new(s)
    }
}

impl TryFrom<String> for Pattern {
    type Error = RuleParseError;

    fn try_from(source: String) -> Result<Self, Self::Error> {
        Pattern::new(&source)
    }
}

impl From<Pattern> for String {
    fn from(pattern: Pattern) -> Self {
        pattern.as_str().to_string()
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single constraint on a nested field.
///
/// Rules can be built directly, deserialized from JSON
/// (`{"type": "min", "value": 3}`) or parsed from their textual form
/// (`"min:3"`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldRule {
    /// Value must be present and not empty
    Required,
    /// Null is accepted and skips the remaining rules
    Nullable,
    /// Value must be a string
    String,
    /// Value must be a number or a numeric string
    Numeric,
    /// Value must be an integer or an integer string
    Integer,
    /// Value must be a boolean (or `0`/`1`, `"true"`/`"false"`)
    Boolean,
    /// Value must be an email address
    Email,
    /// Value must be a URL
    Url,
    /// Size must be at least the bound
    Min(f64),
    /// Size must be at most the bound
    Max(f64),
    /// Value must match the pattern
    Regex(Pattern),
    /// Value must be one of the listed options
    In(Vec<String>),
}

impl FieldRule {
    /// Get the rule name/code for error reporting.
    pub fn rule_name(&self) -> &'static str {
        match self {
            FieldRule::Required => "required",
            FieldRule::Nullable => "nullable",
            FieldRule::String => "string",
            FieldRule::Numeric => "numeric",
            FieldRule::Integer => "integer",
            FieldRule::Boolean => "boolean",
            FieldRule::Email => "email",
            FieldRule::Url => "url",
            FieldRule::Min(_) => "min",
            FieldRule::Max(_) => "max",
            FieldRule::Regex(_) => "regex",
            FieldRule::In(_) => "in",
        }
    }

    /// Check whether the rule runs against absent or null values.
    pub fn is_implicit(&self) -> bool {
        matches!(self, FieldRule::Required)
    }

    /// Check a value against this rule.
    ///
    /// `None` means the field is missing from the data. Messages keep an
    /// `{attribute}` placeholder for the engine to fill in.
    pub fn check(&self, value: Option<&Value>) -> Result<(), RuleError> {
        match self {
            FieldRule::Required => {
                if is_filled(value) {
                    Ok(())
                } else {
                    Err(RuleError::new("required", "The {attribute} field is required."))
                }
            }
            FieldRule::Nullable => Ok(()),
            FieldRule::String => match value {
                Some(Value::String(_)) => Ok(()),
                _ => Err(RuleError::new("string", "The {attribute} field must be a string.")),
            },
            FieldRule::Numeric => {
                if value.and_then(as_number).is_some() {
                    Ok(())
                } else {
                    Err(RuleError::new("numeric", "The {attribute} field must be a number."))
                }
            }
            FieldRule::Integer => {
                if value.is_some_and(is_integer) {
                    Ok(())
                } else {
                    Err(RuleError::new("integer", "The {attribute} field must be an integer."))
                }
            }
            FieldRule::Boolean => {
                if value.is_some_and(is_boolean) {
                    Ok(())
                } else {
                    Err(RuleError::new(
                        "boolean",
                        "The {attribute} field must be true or false.",
                    ))
                }
            }
            FieldRule::Email => match value {
                Some(Value::String(s)) if Format::Email.matches(s) => Ok(()),
                _ => Err(RuleError::new(
                    "email",
                    "The {attribute} field must be a valid email address.",
                )),
            },
            FieldRule::Url => match value {
                Some(Value::String(s)) if Format::Url.matches(s) => Ok(()),
                _ => Err(RuleError::new("url", "The {attribute} field must be a valid URL.")),
            },
            FieldRule::Min(min) => match value.and_then(Size::of) {
                Some(size) if size.amount() >= *min => Ok(()),
                size => Err(RuleError::new("min", Size::min_message(size))
                    .with("min", format_bound(*min))),
            },
            FieldRule::Max(max) => match value.and_then(Size::of) {
                Some(size) if size.amount() <= *max => Ok(()),
                size => Err(RuleError::new("max", Size::max_message(size))
                    .with("max", format_bound(*max))),
            },
            FieldRule::Regex(pattern) => match value {
                Some(Value::String(s)) if pattern.is_match(s) => Ok(()),
                _ => Err(RuleError::new("regex", "The {attribute} field format is invalid.")),
            },
            FieldRule::In(options) => {
                let text = value.and_then(scalar_text);
                if text.is_some_and(|t| options.iter().any(|o| *o == t)) {
                    Ok(())
                } else {
                    Err(RuleError::new("in", "The selected {attribute} is invalid."))
                }
            }
        }
    }
}

impl fmt::Display for FieldRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldRule::Min(min) => write!(f, "min:{}", format_bound(*min)),
            FieldRule::Max(max) => write!(f, "max:{}", format_bound(*max)),
            FieldRule::Regex(pattern) => write!(f, "regex:{pattern}"),
            FieldRule::In(options) => write!(f, "in:{}", options.join(",")),
            other => f.write_str(other.rule_name()),
        }
    }
}

impl FromStr for FieldRule {
    type Err = RuleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (name, param) = match s.split_once(':') {
            Some((name, param)) => (name, Some(param)),
            None => (s, None),
        };

        let bound = |param: Option<&str>| -> Result<f64, RuleParseError> {
            let param = param.ok_or_else(|| RuleParseError::MissingParameter(name.to_string()))?;
            param
                .trim()
                .parse()
                .map_err(|_| RuleParseError::InvalidParameter {
                    rule: name.to_string(),
                    param: param.to_string(),
                })
        };

        match name {
            "required" => Ok(FieldRule::Required),
            "nullable" => Ok(FieldRule::Nullable),
            "string" => Ok(FieldRule::String),
            "numeric" => Ok(FieldRule::Numeric),
            "integer" => Ok(FieldRule::Integer),
            "boolean" => Ok(FieldRule::Boolean),
            "email" => Ok(FieldRule::Email),
            "url" => Ok(FieldRule::Url),
            "min" => bound(param).map(FieldRule::Min),
            "max" => bound(param).map(FieldRule::Max),
            "regex" => {
                let source =
                    param.ok_or_else(|| RuleParseError::MissingParameter(name.to_string()))?;
                Pattern::new(source).map(FieldRule::Regex)
            }
            "in" => {
                let list = param.ok_or_else(|| RuleParseError::MissingParameter(name.to_string()))?;
                Ok(FieldRule::In(list.split(',').map(|o| o.trim().to_string()).collect()))
            }
            other => Err(RuleParseError::Unknown(other.to_string())),
        }
    }
}

/// Size of a value as measured by `min`/`max`.
#[derive(Debug, Clone, Copy)]
enum Size {
    Chars(usize),
    Number(f64),
    Items(usize),
}

impl Size {
    fn of(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Size::Chars(s.chars().count())),
            Value::Number(n) => n.as_f64().map(Size::Number),
            Value::Array(items) => Some(Size::Items(items.len())),
            Value::Object(map) => Some(Size::Items(map.len())),
            _ => None,
        }
    }

    fn amount(self) -> f64 {
        match self {
            Size::Chars(n) | Size::Items(n) => n as f64,
            Size::Number(n) => n,
        }
    }

    fn min_message(size: Option<Self>) -> &'static str {
        match size {
            Some(Size::Chars(_)) => "The {attribute} field must be at least {min} characters.",
            Some(Size::Items(_)) => "The {attribute} field must have at least {min} items.",
            _ => "The {attribute} field must be at least {min}.",
        }
    }

    fn max_message(size: Option<Self>) -> &'static str {
        match size {
            Some(Size::Chars(_)) => "The {attribute} field must not be greater than {max} characters.",
            Some(Size::Items(_)) => "The {attribute} field must not have more than {max} items.",
            _ => "The {attribute} field must not be greater than {max}.",
        }
    }
}

/// Render a bound without a trailing `.0` for whole numbers.
fn format_bound(bound: f64) -> String {
    if bound.fract() == 0.0 && bound.abs() < 1e15 {
        format!("{}", bound as i64)
    } else {
        bound.to_string()
    }
}

fn is_filled(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(map)) => !map.is_empty(),
        Some(_) => true,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

fn is_integer(value: &Value) -> bool {
    match value {
        Value::Number(n) => n.is_i64() || n.is_u64(),
        Value::String(s) => s.trim().parse::<i64>().is_ok(),
        _ => false,
    }
}

fn is_boolean(value: &Value) -> bool {
    match value {
        Value::Bool(_) => true,
        Value::Number(n) => matches!(n.as_u64(), Some(0 | 1)),
        Value::String(s) => matches!(s.as_str(), "0" | "1" | "true" | "false"),
        _ => false,
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

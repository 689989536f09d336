//! Dot-separated attribute paths.
//!
//! A path such as `orders.2.address.city` names a location in the data tree;
//! numeric segments are array indices and `*` matches every index.

/// Segment separator.
pub const SEPARATOR: char = '.';

/// Wildcard segment matching every array element.
pub const WILDCARD: &str = "*";

/// Check whether a segment is an array index (non-empty, ASCII digits only).
pub fn is_index(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

/// Iterate over the segments of a path.
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split(SEPARATOR)
}

/// Join a nested field name onto an attribute path.
///
/// An empty attribute yields the field unchanged.
pub fn join(attribute: &str, field: &str) -> String {
    if attribute.is_empty() {
        field.to_string()
    } else {
        format!("{attribute}{SEPARATOR}{field}")
    }
}

/// Collapse a trailing array index into a wildcard.
///
/// `items.3` becomes `items.*`. Only the last segment is considered, so
/// `a.1.b.2` becomes `a.1.b.*`, and a path with no separator is returned as
/// it is.
pub fn parent_key(attribute: &str) -> String {
    match attribute.rsplit_once(SEPARATOR) {
        Some((prefix, last)) if is_index(last) => format!("{prefix}{SEPARATOR}{WILDCARD}"),
        _ => attribute.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_trailing_index() {
        assert_eq!(parent_key("items.3"), "items.*");
        assert_eq!(parent_key("orders.12"), "orders.*");
    }

    #[test]
    fn only_last_segment_collapses() {
        assert_eq!(parent_key("a.1.b.2"), "a.1.b.*");
        assert_eq!(parent_key("items.3.price"), "items.3.price");
    }

    #[test]
    fn leaves_other_paths_alone() {
        assert_eq!(parent_key("address.city"), "address.city");
        assert_eq!(parent_key("contact"), "contact");
        assert_eq!(parent_key("3"), "3");
        assert_eq!(parent_key("items."), "items.");
        assert_eq!(parent_key("items.3a"), "items.3a");
        assert_eq!(parent_key(""), "");
    }

    #[test]
    fn index_segments() {
        assert!(is_index("0"));
        assert!(is_index("042"));
        assert!(!is_index(""));
        assert!(!is_index("-1"));
        assert!(!is_index("*"));
        assert!(!is_index("١"));
    }

    #[test]
    fn join_paths() {
        assert_eq!(join("contact", "email"), "contact.email");
        assert_eq!(join("items.2", "email"), "items.2.email");
        assert_eq!(join("", "email"), "email");
    }

    #[test]
    fn split_segments() {
        let parts: Vec<_> = segments("orders.2.address").collect();
        assert_eq!(parts, ["orders", "2", "address"]);
    }
}

//! Substring search helpers
//!
//! `?search=` and `?name=` filters are case-insensitive substring matches.
//! Postgres adapters use `ILIKE` patterns; in-memory adapters use
//! [`icontains`] so both behave the same.

/// `ILIKE` pattern matching `term` anywhere, with wildcards escaped
///
/// ```rust
/// assert_eq!(kernel::search::ilike_contains("50%_off"), "%50\\%\\_off%");
/// ```
pub fn ilike_contains(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Case-insensitive substring test
pub fn icontains(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ilike_contains_plain() {
        assert_eq!(ilike_contains("bob"), "%bob%");
    }

    #[test]
    fn test_icontains() {
        assert!(icontains("The Godfather", "godf"));
        assert!(icontains("Ёлка", "ёл"));
        assert!(!icontains("Alien", "aliens"));
    }
}

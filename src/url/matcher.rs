/// Checks if a host matches a recipe domain pattern
///
/// Two pattern forms are accepted:
/// 1. Exact: "shop.example.com" matches only "shop.example.com"
/// 2. Wildcard: "*.example.com" matches "example.com" and any subdomain of it
///
/// Both sides are expected to be lowercase already.
///
/// # Examples
///
/// ```
/// use price_sentinel::url::matches_wildcard;
///
/// assert!(matches_wildcard("shop.example.com", "shop.example.com"));
/// assert!(matches_wildcard("*.example.com", "www.example.com"));
/// assert!(matches_wildcard("*.example.com", "example.com"));
/// assert!(!matches_wildcard("*.example.com", "myexample.com"));
/// ```
pub fn matches_wildcard(pattern: &str, candidate: &str) -> bool {
    match pattern.strip_prefix("*.") {
        Some(base) => {
            candidate == base
                || (candidate.len() > base.len()
                    && candidate.ends_with(base)
                    && candidate.as_bytes()[candidate.len() - base.len() - 1] == b'.')
        }
        None => candidate == pattern,
    }
}

use crate::{UrlError, UrlResult};
use url::Url;

/// Parses a string into an HTTP(S) URL that has a host
///
/// # Arguments
///
/// * `raw` - The URL string to parse
///
/// # Returns
///
/// * `Ok(Url)` - The parsed URL
/// * `Err(UrlError)` - If the string is not an http/https URL with a host
pub fn parse_http_url(raw: &str) -> UrlResult<Url> {
    let url = Url::parse(raw).map_err(|e| UrlError::Parse(format!("{}: {}", raw, e)))?;

    match url.scheme() {
        "http" | "https" => {}
        other => return Err(UrlError::InvalidScheme(other.to_string())),
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingDomain);
    }

    Ok(url)
}

/// Extracts the domain from a URL
///
/// This function retrieves the host portion of a URL and converts it to lowercase.
/// If the URL has no host (which shouldn't happen for valid HTTP(S) URLs), it returns None.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use price_sentinel::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Returns the `scheme://host[:port]` base of a URL
///
/// The base is the unit of robots.txt caching and per-domain rate limiting, so
/// `http://` and `https://` variants of the same host are tracked separately.
/// Default ports are omitted by `url`, explicit ones are kept.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use price_sentinel::url::domain_base;
///
/// let url = Url::parse("https://Shop.Example.com/item/7?ref=x").unwrap();
/// assert_eq!(domain_base(&url).unwrap(), "https://shop.example.com");
///
/// let url = Url::parse("http://127.0.0.1:8080/p").unwrap();
/// assert_eq!(domain_base(&url).unwrap(), "http://127.0.0.1:8080");
/// ```
pub fn domain_base(url: &Url) -> UrlResult<String> {
    let host = extract_domain(url).ok_or(UrlError::MissingDomain)?;
    Ok(match url.port() {
        Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
        None => format!("{}://{}", url.scheme(), host),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_simple_domain() {
        let url = Url::parse("https://example.com/").unwrap();
        assert_eq!(extract_domain(&url), Some("example.com".to_string()));
    }

    #[test]
    fn test_extract_with_port() {
        let url = Url::parse("https://example.com:8080/").unwrap();
        assert_eq!(extract_domain(&url), Some("example.com".to_string()));
    }

    #[test]
    fn test_extract_mixed_case() {
        let url = Url::parse("https://Example.COM/").unwrap();
        assert_eq!(extract_domain(&url), Some("example.com".to_string()));
    }

    #[test]
    fn test_base_drops_path_query_and_fragment() {
        let url = Url::parse("https://example.com/path/to/page?query=value#frag").unwrap();
        assert_eq!(domain_base(&url).unwrap(), "https://example.com");
    }

    #[test]
    fn test_base_keeps_explicit_port() {
        let url = Url::parse("http://localhost:3000/").unwrap();
        assert_eq!(domain_base(&url).unwrap(), "http://localhost:3000");
    }

    #[test]
    fn test_base_omits_default_port() {
        let url = Url::parse("https://example.com:443/").unwrap();
        assert_eq!(domain_base(&url).unwrap(), "https://example.com");
    }

    #[test]
    fn test_base_distinguishes_scheme() {
        let http = Url::parse("http://example.com/").unwrap();
        let https = Url::parse("https://example.com/").unwrap();
        assert_ne!(domain_base(&http).unwrap(), domain_base(&https).unwrap());
    }

    #[test]
    fn test_parse_http_url_accepts_https() {
        assert!(parse_http_url("https://shop.example.com/p/1").is_ok());
    }

    #[test]
    fn test_parse_http_url_rejects_other_schemes() {
        assert!(matches!(
            parse_http_url("ftp://example.com/file"),
            Err(UrlError::InvalidScheme(_))
        ));
        assert!(matches!(
            parse_http_url("mailto:someone@example.com"),
            Err(UrlError::InvalidScheme(_))
        ));
    }

    #[test]
    fn test_parse_http_url_rejects_garbage() {
        assert!(matches!(parse_http_url("not a url"), Err(UrlError::Parse(_))));
    }
}

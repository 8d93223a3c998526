//! Domain key derivation from page addresses.

use url::Url;

/// Derive the per-page domain key (host name) from a page address.
///
/// Addresses without a host (`file:` URLs, `about:blank`) and unparseable
/// addresses map to the empty string, which never matches a domain entry and
/// therefore falls back to the default configuration.
#[must_use]
pub fn domain_from_url(address: &str) -> String {
    match Url::parse(address) {
        Ok(url) => url.host_str().unwrap_or_default().to_owned(),
        Err(e) => {
            tracing::warn!(address, error = %e, "Unparseable page address, using empty domain");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_name() {
        assert_eq!(domain_from_url("https://github.com/org/repo"), "github.com");
        assert_eq!(domain_from_url("http://localhost:8080/page"), "localhost");
        assert_eq!(domain_from_url("https://Docs.Example.COM/"), "docs.example.com");
    }

    #[test]
    fn test_no_host() {
        assert_eq!(domain_from_url("file:///tmp/page.html"), "");
        assert_eq!(domain_from_url("not a url"), "");
    }
}

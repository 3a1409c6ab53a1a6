//! Absolute URL splitting for the HTTP client

use crate::error::HttpError;

const MAX_SCHEME_LEN: usize = 8;
const MAX_HOST_LEN: usize = 127;
const MAX_PATH_LEN: usize = 511;

/// URL scheme recognized by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    Http,
    Https,
}
impl Scheme {
    pub fn default_port(&self) -> u16 {
        match self {
            Self::Http => 80,
            Self::Https => 443,
        }
    }
}

/// An absolute URL split into scheme, host, port, and path.
///
/// Produced by [`UrlParts::parse`], which is a pure function: no resolution, no percent
/// decoding, no normalization beyond defaulting the port and the path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlParts {
    pub scheme: Scheme,
    pub host: String,
    pub port: u16,
    pub path: String,
}
impl UrlParts {
    /// Split an absolute URL of the form `scheme://host[:port][/path]`.
    ///
    /// The host ends at the first `:` or `/`, whichever comes first. A `:` that occurs
    /// before any `/` introduces an explicit port, which must be all digits and in `u16`
    /// range. The path defaults to `/` when absent. A missing port defaults to 80 for
    /// `http` and 443 for `https` (case-insensitive); any other scheme is rejected.
    /// Oversized fields are rejected, never truncated.
    pub fn parse(url: &str) -> Result<UrlParts, HttpError> {
        let bad = || HttpError::InvalidUrl(url.to_string());

        let (scheme_str, rest) = url.split_once("://").ok_or_else(bad)?;
        if scheme_str.is_empty() || scheme_str.len() > MAX_SCHEME_LEN {
            return Err(bad());
        }
        let scheme = if scheme_str.eq_ignore_ascii_case("http") {
            Scheme::Http
        } else if scheme_str.eq_ignore_ascii_case("https") {
            Scheme::Https
        } else {
            return Err(bad());
        };

        // host ends at the first ':' or '/', whichever comes first
        let slash = rest.find('/');
        let colon = rest.find(':').filter(|c| slash.map_or(true, |s| *c < s));
        let host_end = colon.or(slash).unwrap_or(rest.len());
        let host = &rest[..host_end];
        if host.is_empty() || host.len() > MAX_HOST_LEN {
            return Err(bad());
        }

        let (port, path_start) = match colon {
            Some(c) => {
                let port_end = slash.unwrap_or(rest.len());
                let port_str = &rest[c + 1..port_end];
                if port_str.is_empty() || !port_str.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(bad());
                }
                let port: u16 = port_str.parse().map_err(|_| bad())?;
                (port, port_end)
            }
            None => (scheme.default_port(), host_end),
        };

        let path = match &rest[path_start..] {
            "" => "/".to_string(),
            p => p.to_string(),
        };
        if path.len() > MAX_PATH_LEN {
            return Err(bad());
        }

        Ok(UrlParts {
            scheme,
            host: host.to_string(),
            port,
            path,
        })
    }
}

#[cfg(test)]
mod test {
    use super::{Scheme, UrlParts};

    #[test]
    fn splits_full_url() {
        let parts = UrlParts::parse("http://example.com:8080/some/path?q=1").unwrap();
        assert_eq!(parts.scheme, Scheme::Http);
        assert_eq!(parts.host, "example.com");
        assert_eq!(parts.port, 8080);
        assert_eq!(parts.path, "/some/path?q=1");
    }

    #[test]
    fn defaults_port_and_path() {
        let parts = UrlParts::parse("http://example.com").unwrap();
        assert_eq!(parts.port, 80);
        assert_eq!(parts.path, "/");

        let parts = UrlParts::parse("HTTPS://example.com").unwrap();
        assert_eq!(parts.scheme, Scheme::Https);
        assert_eq!(parts.port, 443);
    }

    #[test]
    fn colon_after_slash_is_not_a_port() {
        let parts = UrlParts::parse("http://example.com/a:b").unwrap();
        assert_eq!(parts.port, 80);
        assert_eq!(parts.path, "/a:b");
    }

    #[test]
    fn rejects_malformed() {
        assert!(UrlParts::parse("example.com").is_err());
        assert!(UrlParts::parse("://example.com").is_err());
        assert!(UrlParts::parse("ftp://example.com").is_err());
        assert!(UrlParts::parse("gopher2://example.com/x").is_err());
        assert!(UrlParts::parse("http://").is_err());
        assert!(UrlParts::parse("http://:8080/").is_err());
        assert!(UrlParts::parse("http://example.com:/").is_err());
        assert!(UrlParts::parse("http://example.com:80a/").is_err());
        assert!(UrlParts::parse("http://example.com:+80/").is_err());
        assert!(UrlParts::parse("http://example.com:99999/").is_err());
    }

    #[test]
    fn rejects_oversized_fields() {
        let host = "h".repeat(128);
        assert!(UrlParts::parse(&format!("http://{host}/")).is_err());
        let path = "p".repeat(520);
        assert!(UrlParts::parse(&format!("http://example.com/{path}")).is_err());
    }
}

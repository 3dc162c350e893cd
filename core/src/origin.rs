//! Resolution of request paths against the application's own origin.
//!
//! Descriptors only ever carry a path+query. `BaseLocation::resolve` refuses
//! anything that could redirect the request to another origin (schemes,
//! protocol-relative `//host` forms, backslashes that browsers and the WHATWG
//! parser treat as slashes) and double-checks the origin after joining.

use url::Url;

/// Why a base location or a request path was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("invalid base location {0:?}: {1}")]
    InvalidBase(String, String),

    #[error("request path {0:?} is not relative to the application origin")]
    NotRelative(String),

    #[error("request path {0:?} could not be joined: {1}")]
    Join(String, String),

    #[error("request path {path:?} resolved to foreign origin {resolved}")]
    CrossOrigin { path: String, resolved: String },
}

/// The application's base location; every request resolves against it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseLocation {
    url: Url,
}

impl BaseLocation {
    pub fn parse(base: &str) -> Result<Self, ResolveError> {
        let url =
            Url::parse(base).map_err(|e| ResolveError::InvalidBase(base.to_string(), e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") || url.host().is_none() {
            return Err(ResolveError::InvalidBase(
                base.to_string(),
                "expected an http(s) URL with a host".to_string(),
            ));
        }
        Ok(Self { url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Join `path` onto the base, guaranteeing the result keeps the base origin.
    pub fn resolve(&self, path: &str) -> Result<Url, ResolveError> {
        if has_scheme(path)
            || path.starts_with("//")
            || path.contains('\\')
            || path.chars().any(char::is_control)
        {
            return Err(ResolveError::NotRelative(path.to_string()));
        }

        let resolved = self
            .url
            .join(path)
            .map_err(|e| ResolveError::Join(path.to_string(), e.to_string()))?;

        if resolved.origin() != self.url.origin() {
            return Err(ResolveError::CrossOrigin {
                path: path.to_string(),
                resolved: resolved.to_string(),
            });
        }
        Ok(resolved)
    }
}

/// `scheme:` prefix per RFC 3986: ALPHA *( ALPHA / DIGIT / "+" / "-" / "." ) ":".
fn has_scheme(path: &str) -> bool {
    let Some((scheme, _)) = path.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> BaseLocation {
        BaseLocation::parse("https://arcade.example:8443/").unwrap()
    }

    #[test]
    fn resolves_root_relative_path_with_query() {
        let url = base().resolve("/api/rooms?player=p%201").unwrap();
        assert_eq!(url.as_str(), "https://arcade.example:8443/api/rooms?player=p%201");
    }

    #[test]
    fn relative_path_joins_onto_base_directory() {
        let base = BaseLocation::parse("http://localhost:3000/arcade/").unwrap();
        assert_eq!(
            base.resolve("api/rooms").unwrap().as_str(),
            "http://localhost:3000/arcade/api/rooms"
        );
        assert_eq!(
            base.resolve("/api/rooms").unwrap().as_str(),
            "http://localhost:3000/api/rooms"
        );
    }

    #[test]
    fn rejects_absolute_urls() {
        for path in ["https://evil.example/api", "http:/evil", "javascript:alert(1)"] {
            assert!(
                matches!(base().resolve(path), Err(ResolveError::NotRelative(_))),
                "{path}"
            );
        }
    }

    #[test]
    fn rejects_protocol_relative_and_backslash_forms() {
        for path in ["//evil.example/api", "/\\evil.example", "\\\\evil.example"] {
            assert!(
                matches!(base().resolve(path), Err(ResolveError::NotRelative(_))),
                "{path}"
            );
        }
    }

    #[test]
    fn rejects_control_characters() {
        assert!(base().resolve("/api\n/rooms").is_err());
    }

    #[test]
    fn colon_after_slash_is_not_a_scheme() {
        let url = base().resolve("/api/rooms/a:b").unwrap();
        assert_eq!(url.origin(), base().url().origin());
    }

    #[test]
    fn dot_segments_never_leave_origin() {
        let url = base().resolve("/../../etc/passwd").unwrap();
        assert_eq!(url.origin(), base().url().origin());
        assert_eq!(url.path(), "/etc/passwd");
    }

    #[test]
    fn base_must_be_http_with_host() {
        assert!(BaseLocation::parse("file:///tmp/x").is_err());
        assert!(BaseLocation::parse("not a url").is_err());
        assert!(BaseLocation::parse("http://localhost:3000").is_ok());
    }
}

//! Composition of the `.npmrc` credentials file used for publishing.
//!
//! npm scopes credentials to a registry with "nerf-darted" keys, where the
//! registry URL loses its protocol:
//!
//! ```text
//! https://registry.npmjs.org/ → //registry.npmjs.org/:_authToken=...
//! ```
//!
//! Composition keeps unrelated settings from an existing `.npmrc`, drops every
//! registry override and every nerf-darted directive, and appends a single
//! token line for the target registry.

use crate::error::{Error, Result};
use crate::registry::registry_url;
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;
use url::Url;

/// Tokens shorter than this are rejected before anything is written.
pub const MIN_TOKEN_LENGTH: usize = 4;

/// Matches an unscoped `registry=<value>` directive.
static REGISTRY_DIRECTIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^registry\s*=\s*(?P<value>\S+)").unwrap());

/// Matches secret values on nerf-darted lines, for redaction.
static SECRET_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^(?P<key>\s*//\S*:(?:_authToken|_auth|_password)\s*=\s*).*$").unwrap()
});

/// A registry auth token.
///
/// The `Debug` implementation redacts the value so tokens don't end up in
/// logs or error messages.
#[derive(Clone)]
pub struct AuthToken(String);

impl AuthToken {
    /// Wrap a token without validating it.
    pub fn new(token: impl Into<String>) -> Self {
        AuthToken(token.into())
    }

    /// Wrap a token, rejecting anything shorter than [`MIN_TOKEN_LENGTH`].
    pub fn validated(token: impl Into<String>) -> Result<Self> {
        let token = token.into();
        let length = token.chars().count();
        if length < MIN_TOKEN_LENGTH {
            return Err(Error::InvalidToken {
                length,
                min: MIN_TOKEN_LENGTH,
            });
        }
        Ok(AuthToken(token))
    }

    /// The raw token value.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AuthToken").field(&"[REDACTED]").finish()
    }
}

/// One line of an `.npmrc` file, classified by what it configures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NpmrcLine {
    /// Unscoped `registry=<value>` override.
    Registry(String),
    /// Nerf-darted directive `//host/path/:key=value`.
    Scoped {
        host: String,
        key: String,
        value: String,
    },
    /// Anything else, kept verbatim.
    Other(String),
}

impl NpmrcLine {
    /// Classify a single line.
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();

        if let Some(caps) = REGISTRY_DIRECTIVE.captures(trimmed) {
            return NpmrcLine::Registry(caps["value"].to_string());
        }

        if trimmed.starts_with("//") {
            let (target, value) = match trimmed.split_once('=') {
                Some((target, value)) => (target.trim(), value.trim()),
                None => (trimmed, ""),
            };
            let (host, key) = match target.rfind("/:") {
                Some(idx) => (&target[..=idx], &target[idx + 2..]),
                None => (target, ""),
            };
            return NpmrcLine::Scoped {
                host: host.to_string(),
                key: key.to_string(),
                value: value.to_string(),
            };
        }

        NpmrcLine::Other(line.to_string())
    }

    /// Whether this line configures a registry or registry credentials.
    pub fn is_registry_directive(&self) -> bool {
        !matches!(self, NpmrcLine::Other(_))
    }
}

impl fmt::Display for NpmrcLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NpmrcLine::Registry(value) => write!(f, "registry={}", value),
            NpmrcLine::Scoped { host, key, value } if key.is_empty() => {
                write!(f, "{}={}", host, value)
            }
            NpmrcLine::Scoped { host, key, value } => write!(f, "{}:{}={}", host, key, value),
            NpmrcLine::Other(text) => f.write_str(text),
        }
    }
}

/// Parse `.npmrc` content into classified lines.
pub fn parse_lines(content: &str) -> Vec<NpmrcLine> {
    content.lines().map(NpmrcLine::parse).collect()
}

/// Convert a registry URL to nerf-dart format.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use jsr_npm_mirror::nerf_dart;
///
/// let url = Url::parse("https://registry.npmjs.org/").unwrap();
/// assert_eq!(nerf_dart(&url), "//registry.npmjs.org/");
///
/// let url = Url::parse("https://example.com/some/path/").unwrap();
/// assert_eq!(nerf_dart(&url), "//example.com/some/path/");
/// ```
pub fn nerf_dart(url: &Url) -> String {
    let host = url.host_str().unwrap_or("");
    let port = url.port().map(|p| format!(":{}", p)).unwrap_or_default();

    // Like `new URL('.', url)`: keep the directory part of the path.
    let path = url.path();
    let normalized_path = if path.ends_with('/') {
        path.to_string()
    } else {
        match path.rfind('/') {
            Some(idx) => path[..=idx].to_string(),
            None => "/".to_string(),
        }
    };

    format!("//{}{}{}", host, port, normalized_path)
}

/// The auth line for a registry, e.g. `//registry.npmjs.org/:_authToken=abc`.
pub fn auth_token_line(registry: &str, token: &AuthToken) -> Result<NpmrcLine> {
    let url = registry_url(registry)?;
    Ok(NpmrcLine::Scoped {
        host: nerf_dart(&url),
        key: "_authToken".to_string(),
        value: token.expose().to_string(),
    })
}

/// Compose the `.npmrc` used for publishing.
///
/// Every `registry=` override and every `//...` directive in `existing` is
/// removed, then a single `_authToken` line for `registry` is appended. The
/// result ends with exactly one newline.
///
/// # Examples
///
/// ```
/// use jsr_npm_mirror::{compose_credentials, AuthToken};
///
/// let npmrc = compose_credentials(
///     "save-exact=true\nregistry=https://old/\n",
///     "https://registry.npmjs.org",
///     &AuthToken::new("abc123"),
/// ).unwrap();
/// assert_eq!(npmrc, "save-exact=true\n//registry.npmjs.org/:_authToken=abc123\n");
/// ```
pub fn compose_credentials(existing: &str, registry: &str, token: &AuthToken) -> Result<String> {
    let auth = auth_token_line(registry, token)?;

    let mut lines: Vec<NpmrcLine> = parse_lines(existing.trim())
        .into_iter()
        .filter(|line| !line.is_registry_directive())
        .collect();
    lines.push(auth);

    Ok(serialize_lines(&lines))
}

/// Serialize lines, trimmed to exactly one trailing newline.
pub fn serialize_lines(lines: &[NpmrcLine]) -> String {
    let joined = lines
        .iter()
        .map(|line| line.to_string())
        .collect::<Vec<_>>()
        .join("\n");
    format!("{}\n", joined.trim())
}

/// Replace credential values with `[REDACTED]` so a blob can be logged.
pub fn redact_credentials(content: &str) -> String {
    SECRET_VALUE
        .replace_all(content, "${key}[REDACTED]")
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nerf_dart_normalizes_path() {
        let url = Url::parse("https://example.com/some/path").unwrap();
        assert_eq!(nerf_dart(&url), "//example.com/some/");
    }

    #[test]
    fn test_nerf_dart_with_port() {
        let url = Url::parse("https://registry.example.com:8080/npm/").unwrap();
        assert_eq!(nerf_dart(&url), "//registry.example.com:8080/npm/");
    }

    #[test]
    fn test_parse_registry_line() {
        assert_eq!(
            NpmrcLine::parse("registry=https://old/"),
            NpmrcLine::Registry("https://old/".to_string())
        );
        assert_eq!(
            NpmrcLine::parse("  registry = https://old/"),
            NpmrcLine::Registry("https://old/".to_string())
        );
    }

    #[test]
    fn test_parse_scoped_line() {
        assert_eq!(
            NpmrcLine::parse("//old.example/:_authToken=x"),
            NpmrcLine::Scoped {
                host: "//old.example/".to_string(),
                key: "_authToken".to_string(),
                value: "x".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_other_lines() {
        for line in ["@myorg:registry=https://x/", "# registry=foo", "save-exact=true", ""] {
            assert_eq!(NpmrcLine::parse(line), NpmrcLine::Other(line.to_string()));
        }
    }

    #[test]
    fn test_scoped_line_round_trip() {
        let line = NpmrcLine::parse("//npm.example.com/path/:_authToken=secret");
        assert_eq!(line.to_string(), "//npm.example.com/path/:_authToken=secret");
    }

    #[test]
    fn test_auth_token_validated() {
        assert!(AuthToken::validated("abcd").is_ok());

        match AuthToken::validated("abc") {
            Err(Error::InvalidToken { length, min }) => {
                assert_eq!(length, 3);
                assert_eq!(min, MIN_TOKEN_LENGTH);
            }
            other => panic!("Expected InvalidToken, got: {:?}", other),
        }
        assert!(AuthToken::validated("").is_err());
    }

    #[test]
    fn test_debug_redacts_token() {
        let token = AuthToken::new("super-secret-token");
        let debug_output = format!("{:?}", token);
        assert!(
            !debug_output.contains("super-secret-token"),
            "Debug output should not contain the actual token"
        );
        assert!(debug_output.contains("[REDACTED]"));
    }

    #[test]
    fn test_redact_credentials() {
        let content = "save-exact=true\n//registry.npmjs.org/:_authToken=abc123\n";
        assert_eq!(
            redact_credentials(content),
            "save-exact=true\n//registry.npmjs.org/:_authToken=[REDACTED]\n"
        );
    }
}

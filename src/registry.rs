//! Target registry kinds and registry URL handling.
//!
//! This module knows which registries we can publish to, where the JSR
//! npm-compatibility layer lives, and how user-supplied registry values
//! (`registry.npmjs.org`, `https://npm.pkg.github.com/owner`) become URLs.

use crate::error::{Error, Result};
use crate::identifier::JSR_COMPAT_SCOPE;
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use url::Url;

/// The default npm registry host.
pub const DEFAULT_REGISTRY_HOST: &str = "registry.npmjs.org";

/// The JSR npm-compatibility registry URL.
pub const JSR_NPM_REGISTRY: &str = "https://npm.jsr.io/";

static PROTOCOL_PREFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^https?://").unwrap());

/// Registry kinds a package can be mirrored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryKind {
    Npm,
}

impl FromStr for RegistryKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "npm" => Ok(RegistryKind::Npm),
            other => Err(Error::UnsupportedRegistry(other.to_string())),
        }
    }
}

impl fmt::Display for RegistryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryKind::Npm => f.write_str("npm"),
        }
    }
}

/// Build the config key for a scoped registry.
///
/// # Examples
///
/// ```
/// use jsr_npm_mirror::registry::scope_registry_key;
///
/// assert_eq!(scope_registry_key("@jsr"), "@jsr:registry");
/// ```
pub fn scope_registry_key(scope: &str) -> String {
    format!("{}:registry", scope)
}

/// The `.npmrc` content that routes the `@jsr` scope to JSR's npm layer.
///
/// # Examples
///
/// ```
/// use jsr_npm_mirror::registry::jsr_registry_override;
///
/// assert_eq!(jsr_registry_override(), "@jsr:registry=https://npm.jsr.io/\n");
/// ```
pub fn jsr_registry_override() -> String {
    format!("{}={}\n", scope_registry_key(JSR_COMPAT_SCOPE), JSR_NPM_REGISTRY)
}

/// Strip an `http://` or `https://` prefix.
pub fn strip_protocol(registry: &str) -> &str {
    match PROTOCOL_PREFIX.find(registry) {
        Some(m) => &registry[m.end()..],
        None => registry,
    }
}

/// Parse a registry URL, ensuring it has a trailing slash.
pub fn parse_registry_url(url: &str) -> std::result::Result<Url, url::ParseError> {
    let normalized = if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{}/", url)
    };
    Url::parse(&normalized)
}

/// Turn a registry input into a URL.
///
/// An explicit `http://` or `https://` scheme is kept; a bare host gets
/// `https://`.
///
/// # Examples
///
/// ```
/// use jsr_npm_mirror::registry::registry_url;
///
/// let url = registry_url("registry.npmjs.org").unwrap();
/// assert_eq!(url.as_str(), "https://registry.npmjs.org/");
///
/// let url = registry_url("https://npm.pkg.github.com/owner").unwrap();
/// assert_eq!(url.as_str(), "https://npm.pkg.github.com/owner/");
///
/// let url = registry_url("http://localhost:4873").unwrap();
/// assert_eq!(url.as_str(), "http://localhost:4873/");
/// ```
pub fn registry_url(registry: &str) -> Result<Url> {
    let trimmed = registry.trim();
    let host = strip_protocol(trimmed);
    let scheme = match &trimmed[..trimmed.len() - host.len()] {
        "" => "https://",
        given => given,
    };
    let invalid = |message: String| Error::InvalidUrl {
        url: registry.to_string(),
        message,
    };

    if host.is_empty() {
        return Err(invalid("empty registry".to_string()));
    }

    let url = parse_registry_url(&format!("{}{}", scheme, host)).map_err(|e| invalid(e.to_string()))?;
    if url.host_str().is_none_or(str::is_empty) {
        return Err(invalid("missing host".to_string()));
    }
    Ok(url)
}

/// Whether a registry URL points at the public npm registry.
pub fn is_default_registry(url: &Url) -> bool {
    url.host_str() == Some(DEFAULT_REGISTRY_HOST) && url.port().is_none() && url.path() == "/"
}

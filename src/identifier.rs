//! Scoped package identifiers and their JSR npm-compatibility form.
//!
//! JSR serves every package through an npm-compatible registry under the
//! `@jsr` scope, flattening the original scope into the package name:
//!
//! ```text
//! @std/path@1.0.0 → @jsr/std__path@1.0.0
//! ```

use crate::error::{Error, Result};
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// Scope under which JSR publishes npm-compatible packages.
pub const JSR_COMPAT_SCOPE: &str = "@jsr";

/// Matches `@scope/name` with an optional non-empty `@version` suffix.
static SCOPED_IDENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^@(?P<scope>[^/@]+)/(?P<name>[^/@]+)(?:@(?P<version>.+))?$").unwrap());

/// A package identifier of the form `@scope/name[@version]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopedIdentifier {
    /// Scope without the leading `@`.
    pub scope: String,
    /// Package name within the scope.
    pub name: String,
    /// Version or range, passed through verbatim.
    pub version: Option<String>,
}

impl ScopedIdentifier {
    /// Parse a scoped identifier.
    ///
    /// No casing or whitespace normalization is performed.
    ///
    /// # Examples
    ///
    /// ```
    /// use jsr_npm_mirror::ScopedIdentifier;
    ///
    /// let id = ScopedIdentifier::parse("@std/path@1.0.0").unwrap();
    /// assert_eq!(id.scope, "std");
    /// assert_eq!(id.name, "path");
    /// assert_eq!(id.version.as_deref(), Some("1.0.0"));
    ///
    /// assert!(ScopedIdentifier::parse("lodash").is_err());
    /// ```
    pub fn parse(input: &str) -> Result<Self> {
        let caps = SCOPED_IDENT
            .captures(input)
            .ok_or_else(|| Error::MalformedIdentifier(input.to_string()))?;

        Ok(ScopedIdentifier {
            scope: caps["scope"].to_string(),
            name: caps["name"].to_string(),
            version: caps.name("version").map(|m| m.as_str().to_string()),
        })
    }

    /// Build an identifier from a package name and an optional version.
    pub fn from_parts(package: &str, version: Option<&str>) -> Result<Self> {
        let mut id = Self::parse(package)?;
        if id.version.is_some() {
            return Err(Error::MalformedIdentifier(package.to_string()));
        }
        id.version = version.filter(|v| !v.is_empty()).map(str::to_string);
        Ok(id)
    }

    /// The package name without version, e.g. `@std/path`.
    pub fn package_name(&self) -> String {
        format!("@{}/{}", self.scope, self.name)
    }

    /// The identifier as served by the JSR npm-compatibility layer.
    ///
    /// # Examples
    ///
    /// ```
    /// use jsr_npm_mirror::ScopedIdentifier;
    ///
    /// let id = ScopedIdentifier::parse("@luca/flag@1.0.1").unwrap();
    /// assert_eq!(id.to_compat_identifier(), "@jsr/luca__flag@1.0.1");
    /// ```
    pub fn to_compat_identifier(&self) -> String {
        let base = format!("{}/{}__{}", JSR_COMPAT_SCOPE, self.scope, self.name);
        match &self.version {
            Some(version) => format!("{}@{}", base, version),
            None => base,
        }
    }
}

impl fmt::Display for ScopedIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "@{}/{}@{}", self.scope, self.name, version),
            None => write!(f, "@{}/{}", self.scope, self.name),
        }
    }
}

/// Translate a scoped identifier string straight to its compatibility form.
pub fn compat_identifier(input: &str) -> Result<String> {
    ScopedIdentifier::parse(input).map(|id| id.to_compat_identifier())
}

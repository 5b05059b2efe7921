//! Error types for jsr-npm-mirror.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while mirroring a package.
#[derive(Error, Debug)]
pub enum Error {
    /// The target registry kind is not one we know how to publish to.
    #[error("unknown registry: {0}")]
    UnsupportedRegistry(String),

    /// Registry token missing or too short to be real.
    #[error("registry token is required for publishing (got {length} characters, need at least {min})")]
    InvalidToken { length: usize, min: usize },

    /// Package identifier is not of the form `@scope/name[@version]`.
    #[error("malformed package identifier '{0}': expected @scope/name or @scope/name@version")]
    MalformedIdentifier(String),

    /// `npm install` of the compatibility identifier failed.
    #[error("failed to fetch {package}: {message}")]
    FetchFailed { package: String, message: String },

    /// Repository metadata lookup failed. Recovered by the synthesizer.
    #[error("failed to fetch repository metadata: {0}")]
    BackfillFailed(String),

    /// `npm publish` failed.
    #[error("failed to publish {package}: {message}")]
    PublishFailed { package: String, message: String },

    /// Failed to read an input file.
    #[error("failed to read file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write an output file.
    #[error("failed to write file {path}: {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A manifest or config file is not a JSON object.
    #[error("failed to parse {origin} as a JSON object: {source}")]
    ParseManifest {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    /// Invalid registry URL.
    #[error("invalid URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    /// Unknown publish access level.
    #[error("invalid access '{0}': expected public or restricted")]
    InvalidAccess(String),

    /// Repository reference is not of the form `owner/repo`.
    #[error("invalid repository '{0}': expected owner/repo")]
    InvalidRepository(String),

    /// The `npm` executable could not be located.
    #[error("npm executable not found on PATH: {0}")]
    NpmNotFound(#[from] which::Error),

    /// Working directory could not be created or removed.
    #[error("working directory error: {0}")]
    Workspace(#[source] std::io::Error),
}

/// Result type alias for jsr-npm-mirror operations.
pub type Result<T> = std::result::Result<T, Error>;

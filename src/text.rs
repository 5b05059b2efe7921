//! Text and JSON file access with line-ending normalization.
//!
//! Everything is handled as LF internally. Files are read with CRLF / CR
//! folded to LF and written back with the host's native line ending.

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

/// The host's native line ending.
#[cfg(windows)]
pub const NATIVE_EOL: &str = "\r\n";
/// The host's native line ending.
#[cfg(not(windows))]
pub const NATIVE_EOL: &str = "\n";

/// Fold CRLF and lone CR line endings to LF.
pub fn normalize_to_lf(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Convert LF-normalized text to the host's native line ending.
pub fn to_native_eol(text: &str) -> String {
    let lf = normalize_to_lf(text);
    if NATIVE_EOL == "\n" {
        lf
    } else {
        lf.replace('\n', NATIVE_EOL)
    }
}

/// Read a text file, normalizing line endings to LF.
///
/// A missing file reads as an empty string.
pub fn read_text_file(path: &Path) -> Result<String> {
    if !path.exists() {
        return Ok(String::new());
    }

    let content = std::fs::read_to_string(path).map_err(|e| Error::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    Ok(normalize_to_lf(&content))
}

/// Write a text file using the host's native line ending.
pub fn write_text_file(path: &Path, text: &str) -> Result<()> {
    std::fs::write(path, to_native_eol(text)).map_err(|e| Error::WriteFile {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Parse JSON text, treating empty (or whitespace-only) text as `{}`.
pub fn parse_json_or_empty<T: DeserializeOwned>(text: &str, origin: &str) -> Result<T> {
    let text = if text.trim().is_empty() { "{}" } else { text };
    serde_json::from_str(text).map_err(|e| Error::ParseManifest {
        origin: origin.to_string(),
        source: e,
    })
}

/// Serialize a value as 2-space indented JSON.
pub fn to_pretty_json<T: Serialize>(value: &T, origin: &str) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| Error::ParseManifest {
        origin: origin.to_string(),
        source: e,
    })
}

//! Path resolution for input files and the npm executable.

use crate::error::Result;
use std::path::{Path, PathBuf};

/// Default location of the Deno config.
pub const DEFAULT_DENO_CONFIG_PATH: &str = "deno.json";
/// Default location of the override manifest.
pub const DEFAULT_MANIFEST_PATH: &str = "package.json";
/// Default location of the existing `.npmrc`.
pub const DEFAULT_NPMRC_PATH: &str = ".npmrc";
/// Default location of the existing `.npmignore`.
pub const DEFAULT_NPMIGNORE_PATH: &str = ".npmignore";

/// Locate the `npm` executable on `PATH`.
///
/// On Windows this finds `npm.cmd`.
pub fn find_npm() -> Result<PathBuf> {
    Ok(which::which("npm")?)
}

/// Expand `~` at the start of a path to the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    } else if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

/// Resolve an input path: expand `~`, then anchor relative paths at `base`.
pub fn resolve_input_path(base: &Path, path: &str) -> PathBuf {
    let expanded = expand_tilde(path);
    if expanded.is_absolute() {
        expanded
    } else {
        base.join(expanded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_tilde() {
        let home = dirs::home_dir().unwrap();

        assert_eq!(expand_tilde("~/foo/bar"), home.join("foo/bar"));
        assert_eq!(expand_tilde("~"), home);
        assert_eq!(
            expand_tilde("/absolute/path"),
            PathBuf::from("/absolute/path")
        );
        assert_eq!(
            expand_tilde("relative/path"),
            PathBuf::from("relative/path")
        );
    }

    #[test]
    fn test_resolve_relative_input_path() {
        let base = PathBuf::from("/work/repo");
        assert_eq!(
            resolve_input_path(&base, "deno.json"),
            PathBuf::from("/work/repo/deno.json")
        );
        assert_eq!(
            resolve_input_path(&base, "packages/a/deno.json"),
            PathBuf::from("/work/repo/packages/a/deno.json")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_absolute_input_path() {
        let base = PathBuf::from("/work/repo");
        assert_eq!(
            resolve_input_path(&base, "/etc/npmrc"),
            PathBuf::from("/etc/npmrc")
        );
    }

    #[test]
    fn test_resolve_tilde_input_path() {
        let home = dirs::home_dir().unwrap();
        let base = PathBuf::from("/work/repo");
        assert_eq!(resolve_input_path(&base, "~/.npmrc"), home.join(".npmrc"));
    }
}

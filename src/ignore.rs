//! Composition of the `.npmignore` file used for publishing.

/// Deno project files that must never ship in the npm tarball.
pub const DENO_IGNORE_PATTERNS: [&str; 3] = ["deno.json", "deno.jsonc", "deno.lock"];

/// Append the Deno project files to existing `.npmignore` content.
///
/// Append-only: lines already present are not deduplicated, so feed it the
/// original file each run rather than its own output.
///
/// # Examples
///
/// ```
/// use jsr_npm_mirror::compose_ignore;
///
/// assert_eq!(
///     compose_ignore("node_modules\n"),
///     "node_modules\ndeno.json\ndeno.jsonc\ndeno.lock\n"
/// );
/// ```
pub fn compose_ignore(existing: &str) -> String {
    let mut content = format!("{}\n", existing.trim());
    for pattern in DENO_IGNORE_PATTERNS {
        content.push_str(pattern);
        content.push('\n');
    }
    format!("{}\n", content.trim())
}

//! `.npmignore` composition tests.

use jsr_npm_mirror::{compose_ignore, DENO_IGNORE_PATTERNS};

#[test]
fn test_appends_deno_files() {
    assert_eq!(
        compose_ignore("node_modules\n"),
        "node_modules\ndeno.json\ndeno.jsonc\ndeno.lock\n"
    );
}

#[test]
fn test_each_pattern_appended_once() {
    let result = compose_ignore("node_modules\n");
    for pattern in DENO_IGNORE_PATTERNS {
        assert_eq!(result.lines().filter(|l| *l == pattern).count(), 1);
    }
}

#[test]
fn test_single_trailing_newline() {
    let result = compose_ignore("dist/\n\n\n");
    assert!(result.ends_with("deno.lock\n"));
    assert!(!result.ends_with("\n\n"));
}

#[test]
fn test_missing_file_content() {
    assert_eq!(compose_ignore(""), "deno.json\ndeno.jsonc\ndeno.lock\n");
}

#[test]
fn test_not_deduplicated_on_recomposition() {
    let once = compose_ignore("");
    let twice = compose_ignore(&once);
    assert_eq!(twice.lines().filter(|l| *l == "deno.json").count(), 2);
}

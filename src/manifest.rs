//! Synthesis of the npm `package.json` from Deno config and overrides.
//!
//! Three sources feed the final manifest, lowest priority first:
//!
//! 1. **Deno config** (`deno.json`), minus the Deno-only `imports`, `exports`
//!    and `publish` keys
//! 2. **Override manifest** (an existing `package.json`); every key it defines
//!    wins, including the Deno-only keys
//! 3. **Explicit inputs** for the six identity fields; empty inputs are ignored
//!
//! If `keywords` or `author` is still missing afterwards, repository metadata
//! is consulted through a [`MetadataSource`].

use crate::backfill::{backfill_manifest, MetadataSource, RepositoryRef};
use crate::error::Result;
use crate::text::parse_json_or_empty;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Deno config keys that are meaningless to npm.
pub const DENO_ONLY_KEYS: [&str; 3] = ["imports", "exports", "publish"];

/// A manifest field: the expected shape, or any other JSON kept verbatim.
///
/// An explicit `null` is `Other(Value::Null)`, distinct from an absent key, so
/// an override can clear a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Field<T> {
    Typed(T),
    Other(Value),
}

impl<T> Field<T> {
    /// The value when it has the expected shape.
    pub fn typed(&self) -> Option<&T> {
        match self {
            Field::Typed(value) => Some(value),
            Field::Other(_) => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Field::Other(Value::Null))
    }
}

impl Field<String> {
    /// Strings as-is, numbers and booleans printed; `None` for anything else.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Field::Typed(text) => Some(text.clone()),
            Field::Other(value @ (Value::Number(_) | Value::Bool(_))) => Some(value.to_string()),
            Field::Other(_) => None,
        }
    }
}

// A present key always yields `Some`, even for `null`.
fn present<'de, D, T>(deserializer: D) -> std::result::Result<Option<Field<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Field::deserialize(deserializer).map(Some)
}

/// Package keywords.
///
/// npm expects an array, but a comma-joined string is kept as-is when that is
/// what the winning source supplied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Keywords {
    List(Vec<String>),
    Joined(String),
}

impl Keywords {
    pub fn is_empty(&self) -> bool {
        match self {
            Keywords::List(items) => items.is_empty(),
            Keywords::Joined(text) => text.is_empty(),
        }
    }
}

/// An npm person object. Keys beyond `name`, `email` and `url` are kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Person {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Package author, as a plain string or a person object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Author {
    Name(String),
    Person(Person),
}

impl Author {
    pub fn is_empty(&self) -> bool {
        match self {
            Author::Name(name) => name.is_empty(),
            Author::Person(person) => {
                person.name.as_deref().is_none_or(str::is_empty)
                    && person.email.is_none()
                    && person.url.is_none()
                    && person.extra.is_empty()
            }
        }
    }
}

/// A package manifest: the identity fields plus everything else verbatim.
///
/// Used for the Deno config, the override manifest and the final result.
/// Identity fields of an unexpected JSON type are carried as [`Field::Other`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub name: Option<Field<String>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub version: Option<Field<String>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub description: Option<Field<String>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Field<Keywords>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub license: Option<Field<String>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub author: Option<Field<Author>>,
    /// All other keys, in their original order.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Manifest {
    /// Parse manifest JSON. Empty text is an empty manifest.
    pub fn from_json(text: &str, origin: &str) -> Result<Self> {
        parse_json_or_empty(text, origin)
    }

    pub fn name_text(&self) -> Option<String> {
        self.name.as_ref().and_then(Field::to_text)
    }

    pub fn version_text(&self) -> Option<String> {
        self.version.as_ref().and_then(Field::to_text)
    }

    pub fn license_text(&self) -> Option<String> {
        self.license.as_ref().and_then(Field::to_text)
    }

    pub fn typed_keywords(&self) -> Option<&Keywords> {
        self.keywords.as_ref().and_then(Field::typed)
    }

    pub fn typed_author(&self) -> Option<&Author> {
        self.author.as_ref().and_then(Field::typed)
    }

    /// Whether `keywords` is absent, `null` or empty.
    pub fn missing_keywords(&self) -> bool {
        match &self.keywords {
            None => true,
            Some(Field::Typed(keywords)) => keywords.is_empty(),
            Some(other) => other.is_null(),
        }
    }

    /// Whether `author` is absent, `null` or empty.
    pub fn missing_author(&self) -> bool {
        match &self.author {
            None => true,
            Some(Field::Typed(author)) => author.is_empty(),
            Some(other) => other.is_null(),
        }
    }

    /// Whether any field that backfill can supply is missing.
    pub fn needs_backfill(&self) -> bool {
        self.missing_keywords() || self.missing_author()
    }

    /// `name@version` for log messages.
    pub fn package_spec(&self) -> String {
        format!(
            "{}@{}",
            self.name_text().unwrap_or_default(),
            self.version_text().unwrap_or_default()
        )
    }
}

/// Explicitly supplied metadata. Empty values mean "not supplied".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataInputs {
    pub name: String,
    pub version: String,
    pub description: String,
    pub keywords: Vec<String>,
    pub license: String,
    pub author: String,
}

/// Split a comma-separated keyword list, trimming items and dropping empties.
///
/// # Examples
///
/// ```
/// use jsr_npm_mirror::manifest::parse_keywords;
///
/// assert_eq!(parse_keywords(" cli, tool ,,deno"), vec!["cli", "tool", "deno"]);
/// assert!(parse_keywords("").is_empty());
/// ```
pub fn parse_keywords(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

/// Merge the Deno config with the override manifest.
///
/// Deno-only keys are dropped from `source`; every field present in
/// `override_manifest` then replaces the merged value.
pub fn merge_manifests(source: Manifest, override_manifest: &Manifest) -> Manifest {
    let mut merged = source;
    merged
        .extra
        .retain(|key, _| !DENO_ONLY_KEYS.contains(&key.as_str()));

    if let Some(name) = &override_manifest.name {
        merged.name = Some(name.clone());
    }
    if let Some(version) = &override_manifest.version {
        merged.version = Some(version.clone());
    }
    if let Some(description) = &override_manifest.description {
        merged.description = Some(description.clone());
    }
    if let Some(keywords) = &override_manifest.keywords {
        merged.keywords = Some(keywords.clone());
    }
    if let Some(license) = &override_manifest.license {
        merged.license = Some(license.clone());
    }
    if let Some(author) = &override_manifest.author {
        merged.author = Some(author.clone());
    }
    for (key, value) in &override_manifest.extra {
        merged.extra.insert(key.clone(), value.clone());
    }

    merged
}

/// Apply explicit inputs; each non-empty input overwrites its field.
pub fn apply_inputs(manifest: &mut Manifest, inputs: &MetadataInputs) {
    if let Some(name) = non_empty(&inputs.name) {
        manifest.name = Some(Field::Typed(name));
    }
    if let Some(version) = non_empty(&inputs.version) {
        manifest.version = Some(Field::Typed(version));
    }
    if let Some(description) = non_empty(&inputs.description) {
        manifest.description = Some(Field::Typed(description));
    }
    if !inputs.keywords.is_empty() {
        manifest.keywords = Some(Field::Typed(Keywords::List(inputs.keywords.clone())));
    }
    if let Some(license) = non_empty(&inputs.license) {
        manifest.license = Some(Field::Typed(license));
    }
    if let Some(author) = non_empty(&inputs.author) {
        manifest.author = Some(Field::Typed(Author::Name(author)));
    }
}

/// Produce the final manifest.
///
/// Backfill failures are logged and otherwise ignored; this never fails.
pub fn synthesize(
    source: Manifest,
    override_manifest: &Manifest,
    inputs: &MetadataInputs,
    metadata: &dyn MetadataSource,
    repository: Option<&RepositoryRef>,
) -> Manifest {
    let mut manifest = merge_manifests(source, override_manifest);
    apply_inputs(&mut manifest, inputs);

    if manifest.needs_backfill() {
        backfill_manifest(&mut manifest, metadata, repository);
    }

    manifest
}

/// Like [`synthesize`], parsing both JSON sources first.
pub fn synthesize_from_json(
    source: &str,
    override_manifest: &str,
    inputs: &MetadataInputs,
    metadata: &dyn MetadataSource,
    repository: Option<&RepositoryRef>,
) -> Result<Manifest> {
    let source = Manifest::from_json(source, "deno config")?;
    let override_manifest = Manifest::from_json(override_manifest, "package manifest")?;
    Ok(synthesize(
        source,
        &override_manifest,
        inputs,
        metadata,
        repository,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backfill::NoMetadataSource;
    use serde_json::json;

    fn manifest(value: Value) -> Manifest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_from_json_empty_is_default() {
        assert_eq!(Manifest::from_json("", "test").unwrap(), Manifest::default());
    }

    #[test]
    fn test_from_json_rejects_non_object() {
        assert!(Manifest::from_json("[1, 2]", "test").is_err());
    }

    #[test]
    fn test_keywords_forms() {
        let m = manifest(json!({"keywords": ["a", "b"]}));
        assert_eq!(
            m.typed_keywords(),
            Some(&Keywords::List(vec!["a".to_string(), "b".to_string()]))
        );

        let m = manifest(json!({"keywords": "a,b"}));
        assert_eq!(m.typed_keywords(), Some(&Keywords::Joined("a,b".to_string())));
    }

    #[test]
    fn test_author_forms() {
        let m = manifest(json!({"author": {"name": "Jane", "email": "jane@example.com"}}));
        match m.typed_author() {
            Some(Author::Person(person)) => {
                assert_eq!(person.name.as_deref(), Some("Jane"));
                assert_eq!(person.email.as_deref(), Some("jane@example.com"));
            }
            other => panic!("Expected person author, got: {:?}", other),
        }
    }

    #[test]
    fn test_missing_checks() {
        let m = manifest(json!({"keywords": [], "author": ""}));
        assert!(m.missing_keywords());
        assert!(m.missing_author());

        let m = manifest(json!({"keywords": ["x"], "author": "me"}));
        assert!(!m.needs_backfill());
    }

    #[test]
    fn test_merge_drops_deno_only_keys() {
        let source = manifest(json!({
            "name": "@a/b",
            "imports": {"x": "jsr:@x/y"},
            "exports": "./mod.ts",
            "publish": {"exclude": ["tests"]},
            "tasks": {"dev": "deno run mod.ts"}
        }));
        let merged = merge_manifests(source, &Manifest::default());

        assert!(!merged.extra.contains_key("imports"));
        assert!(!merged.extra.contains_key("exports"));
        assert!(!merged.extra.contains_key("publish"));
        assert!(merged.extra.contains_key("tasks"));
    }

    #[test]
    fn test_merge_restores_overridden_deno_only_keys() {
        let source = manifest(json!({"exports": "./mod.ts"}));
        let override_manifest = manifest(json!({"exports": {".": "./mod.js"}}));
        let merged = merge_manifests(source, &override_manifest);

        assert_eq!(merged.extra.get("exports"), Some(&json!({".": "./mod.js"})));
    }

    #[test]
    fn test_merge_keeps_key_order() {
        let source = manifest(json!({"zeta": 1, "alpha": 2}));
        let override_manifest = manifest(json!({"main": "mod.js"}));
        let merged = merge_manifests(source, &override_manifest);

        let keys: Vec<&str> = merged.extra.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "main"]);
    }

    #[test]
    fn test_apply_inputs_ignores_empty() {
        let mut m = manifest(json!({"name": "@a/b", "version": "1.0.0"}));
        apply_inputs(&mut m, &MetadataInputs::default());
        assert_eq!(m.name_text().as_deref(), Some("@a/b"));
        assert_eq!(m.version_text().as_deref(), Some("1.0.0"));
    }

    #[test]
    fn test_apply_inputs_overwrites() {
        let mut m = manifest(json!({"keywords": "old", "author": {"name": "Old"}}));
        apply_inputs(
            &mut m,
            &MetadataInputs {
                keywords: vec!["new".to_string()],
                author: "New".to_string(),
                ..Default::default()
            },
        );
        assert_eq!(m.typed_keywords(), Some(&Keywords::List(vec!["new".to_string()])));
        assert_eq!(m.typed_author(), Some(&Author::Name("New".to_string())));
    }

    #[test]
    fn test_synthesize_serializes_identity_fields_first() {
        let m = synthesize_from_json(
            r#"{"exports": "./mod.ts", "license": "MIT", "name": "@a/b", "version": "1.0.0"}"#,
            r#"{"type": "module"}"#,
            &MetadataInputs {
                author: "me".to_string(),
                keywords: vec!["k".to_string()],
                ..Default::default()
            },
            &NoMetadataSource,
            None,
        )
        .unwrap();

        let text = serde_json::to_string(&m).unwrap();
        assert_eq!(
            text,
            r#"{"name":"@a/b","version":"1.0.0","keywords":["k"],"license":"MIT","author":"me","type":"module"}"#
        );
    }

    #[test]
    fn test_null_is_present() {
        let m = manifest(json!({"license": null}));
        assert_eq!(m.license, Some(Field::Other(Value::Null)));
        assert_eq!(m.license_text(), None);
        assert_eq!(serde_json::to_value(&m).unwrap(), json!({"license": null}));

        assert_eq!(manifest(json!({})).license, None);
    }

    #[test]
    fn test_untyped_identity_fields_kept() {
        let m = manifest(json!({
            "version": 1,
            "license": {"type": "MIT", "url": "https://opensource.org/licenses/MIT"},
            "keywords": [1, 2]
        }));
        assert_eq!(m.version, Some(Field::Other(json!(1))));
        assert_eq!(m.version_text().as_deref(), Some("1"));
        assert_eq!(m.license_text(), None);
        assert_eq!(m.typed_keywords(), None);
        assert!(!m.missing_keywords());
    }

    #[test]
    fn test_null_author_needs_backfill() {
        let m = manifest(json!({"keywords": null, "author": null}));
        assert!(m.missing_keywords());
        assert!(m.missing_author());
    }

    #[test]
    fn test_person_keeps_extra_keys() {
        let value = json!({"author": {"name": "J", "email": "j@x", "github": "jj"}});
        let m = manifest(value.clone());
        assert_eq!(serde_json::to_value(&m).unwrap(), value);

        let m = manifest(json!({"author": {"github": "jj"}}));
        assert!(!m.missing_author());
        assert_eq!(serde_json::to_value(&m).unwrap(), json!({"author": {"github": "jj"}}));
    }

    #[test]
    fn test_merge_override_null_wins() {
        let source = manifest(json!({"license": "MIT", "author": "Jane"}));
        let override_manifest = manifest(json!({"license": null}));
        let merged = merge_manifests(source, &override_manifest);

        assert_eq!(merged.license, Some(Field::Other(Value::Null)));
        assert_eq!(merged.typed_author(), Some(&Author::Name("Jane".to_string())));
    }

    #[test]
    fn test_package_spec() {
        let m = manifest(json!({"name": "@a/b", "version": "1.0.0"}));
        assert_eq!(m.package_spec(), "@a/b@1.0.0");
    }
}

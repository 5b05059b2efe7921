//! Repository metadata used to fill in missing manifest fields.
//!
//! When neither the Deno config, the override manifest nor the explicit
//! inputs provide `keywords` or `author`, they are taken from the hosting
//! repository: topics become keywords, and the owner's public email (or login)
//! becomes the author.

use crate::credentials::AuthToken;
use crate::error::{Error, Result};
use crate::manifest::{Author, Field, Keywords, Manifest};
use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Public GitHub REST API endpoint.
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

const GITHUB_API_VERSION: &str = "2022-11-28";
const USER_AGENT: &str = concat!("jsr-npm-mirror/", env!("CARGO_PKG_VERSION"));

/// A repository on the hosting service, `owner/repo`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryRef {
    pub owner: String,
    pub repo: String,
}

impl FromStr for RepositoryRef {
    type Err = Error;

    /// Parse the `owner/repo` form used by `GITHUB_REPOSITORY`.
    fn from_str(s: &str) -> Result<Self> {
        match s.split_once('/') {
            Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
                Ok(RepositoryRef {
                    owner: owner.to_string(),
                    repo: repo.to_string(),
                })
            }
            _ => Err(Error::InvalidRepository(s.to_string())),
        }
    }
}

impl fmt::Display for RepositoryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// The parts of a repository description backfill cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryMetadata {
    pub topics: Vec<String>,
    pub owner_login: String,
    pub owner_email: Option<String>,
}

/// Something that can describe a repository.
pub trait MetadataSource {
    /// Look up a repository. `Ok(None)` means this source has nothing to offer.
    fn fetch(&self, repository: &RepositoryRef) -> Result<Option<RepositoryMetadata>>;
}

/// A source that never provides metadata, for runs without a GitHub token.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMetadataSource;

impl MetadataSource for NoMetadataSource {
    fn fetch(&self, _repository: &RepositoryRef) -> Result<Option<RepositoryMetadata>> {
        Ok(None)
    }
}

#[derive(Deserialize)]
struct RepoResponse {
    #[serde(default)]
    topics: Vec<String>,
    owner: OwnerResponse,
}

#[derive(Deserialize)]
struct OwnerResponse {
    login: String,
    #[serde(default)]
    email: Option<String>,
}

impl From<RepoResponse> for RepositoryMetadata {
    fn from(response: RepoResponse) -> Self {
        RepositoryMetadata {
            topics: response.topics,
            owner_login: response.owner.login,
            owner_email: response.owner.email,
        }
    }
}

/// Repository metadata from the GitHub REST API (`GET /repos/{owner}/{repo}`).
#[derive(Debug)]
pub struct GitHubMetadataSource {
    client: Client,
    api_url: String,
    token: AuthToken,
}

impl GitHubMetadataSource {
    /// Create a source authenticated with `token`.
    pub fn new(token: AuthToken) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::BackfillFailed(format!("failed to build HTTP client: {}", e)))?;

        Ok(GitHubMetadataSource {
            client,
            api_url: DEFAULT_GITHUB_API_URL.to_string(),
            token,
        })
    }

    /// Use a different API base URL, e.g. a GitHub Enterprise Server.
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// The endpoint describing `repository`.
    pub fn repository_url(&self, repository: &RepositoryRef) -> String {
        format!(
            "{}/repos/{}/{}",
            self.api_url.trim_end_matches('/'),
            repository.owner,
            repository.repo
        )
    }
}

impl MetadataSource for GitHubMetadataSource {
    fn fetch(&self, repository: &RepositoryRef) -> Result<Option<RepositoryMetadata>> {
        let url = self.repository_url(repository);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(self.token.expose())
            .header(ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION)
            .send()
            .map_err(|e| Error::BackfillFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::BackfillFailed(format!("HTTP {} from {}", status, url)));
        }

        let body: RepoResponse = response
            .json()
            .map_err(|e| Error::BackfillFailed(format!("invalid response from {}: {}", url, e)))?;

        Ok(Some(body.into()))
    }
}

/// Fill `keywords` and `author` from repository metadata, where missing.
///
/// Topics are joined into one comma-separated string. The author is the
/// owner's public email, or the owner's login when there is none.
pub fn apply_repository_metadata(manifest: &mut Manifest, metadata: &RepositoryMetadata) {
    if manifest.missing_keywords() && !metadata.topics.is_empty() {
        manifest.keywords = Some(Field::Typed(Keywords::Joined(metadata.topics.join(","))));
    }

    if manifest.missing_author() {
        let author = metadata
            .owner_email
            .as_deref()
            .filter(|email| !email.is_empty())
            .unwrap_or(&metadata.owner_login);
        if !author.is_empty() {
            manifest.author = Some(Field::Typed(Author::Name(author.to_string())));
        }
    }
}

/// Ask `source` about `repository` and fill whatever is missing.
///
/// Lookup failures are logged as warnings and leave the manifest untouched.
pub fn backfill_manifest(
    manifest: &mut Manifest,
    source: &dyn MetadataSource,
    repository: Option<&RepositoryRef>,
) {
    let Some(repository) = repository else {
        debug!("No repository context, skipping metadata backfill");
        return;
    };

    match source.fetch(repository) {
        Ok(Some(metadata)) => {
            info!("Filling missing manifest fields from {}", repository);
            apply_repository_metadata(manifest, &metadata);
        }
        Ok(None) => debug!("No metadata available for {}", repository),
        Err(e) => warn!("Failed to fetch data from GitHub API: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingSource;

    impl MetadataSource for FailingSource {
        fn fetch(&self, _repository: &RepositoryRef) -> Result<Option<RepositoryMetadata>> {
            Err(Error::BackfillFailed("HTTP 404".to_string()))
        }
    }

    fn repo() -> RepositoryRef {
        "octo/tool".parse().unwrap()
    }

    #[test]
    fn test_parse_repository_ref() {
        let repo: RepositoryRef = "octo/tool".parse().unwrap();
        assert_eq!(repo.owner, "octo");
        assert_eq!(repo.repo, "tool");
        assert_eq!(repo.to_string(), "octo/tool");

        for bad in ["", "octo", "octo/", "/tool", "a/b/c"] {
            assert!(bad.parse::<RepositoryRef>().is_err(), "{:?} should not parse", bad);
        }
    }

    #[test]
    fn test_apply_prefers_email() {
        let mut manifest = Manifest::default();
        apply_repository_metadata(
            &mut manifest,
            &RepositoryMetadata {
                topics: vec![],
                owner_login: "octo".to_string(),
                owner_email: Some("octo@example.com".to_string()),
            },
        );
        assert_eq!(manifest.typed_author(), Some(&Author::Name("octo@example.com".to_string())));
        assert_eq!(manifest.keywords, None);
    }

    #[test]
    fn test_apply_keeps_present_fields() {
        let mut manifest = Manifest {
            keywords: Some(Field::Typed(Keywords::List(vec!["mine".to_string()]))),
            ..Default::default()
        };
        apply_repository_metadata(
            &mut manifest,
            &RepositoryMetadata {
                topics: vec!["cli".to_string()],
                owner_login: "octo".to_string(),
                owner_email: None,
            },
        );
        assert_eq!(manifest.typed_keywords(), Some(&Keywords::List(vec!["mine".to_string()])));
        assert_eq!(manifest.typed_author(), Some(&Author::Name("octo".to_string())));
    }

    #[test]
    fn test_backfill_failure_is_not_fatal() {
        let mut manifest = Manifest::default();
        backfill_manifest(&mut manifest, &FailingSource, Some(&repo()));
        assert_eq!(manifest, Manifest::default());
    }

    #[test]
    fn test_backfill_without_repository() {
        let mut manifest = Manifest::default();
        backfill_manifest(&mut manifest, &NoMetadataSource, None);
        assert_eq!(manifest, Manifest::default());
    }

    #[test]
    fn test_repository_url() {
        let source = GitHubMetadataSource::new(AuthToken::new("ghp_test"))
            .unwrap()
            .with_api_url("https://ghe.example.com/api/v3/");
        assert_eq!(
            source.repository_url(&repo()),
            "https://ghe.example.com/api/v3/repos/octo/tool"
        );
    }

    #[test]
    fn test_parse_github_response() {
        let body = r#"{
            "name": "tool",
            "topics": ["cli", "tool"],
            "owner": {"login": "octo", "email": null, "id": 1}
        }"#;
        let response: RepoResponse = serde_json::from_str(body).unwrap();
        let metadata = RepositoryMetadata::from(response);
        assert_eq!(metadata.topics, vec!["cli", "tool"]);
        assert_eq!(metadata.owner_login, "octo");
        assert_eq!(metadata.owner_email, None);
    }
}

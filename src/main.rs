//! jsr-npm-mirror - publish a JSR package to npm from CI
//!
//! Usage:
//!   jsr-npm-mirror --registry-token <TOKEN>
//!   jsr-npm-mirror --deno-config-path packages/a/deno.json --access public
//!
//! Every flag can also be supplied as the GitHub Actions input variable
//! `INPUT_<NAME>` (e.g. `INPUT_REGISTRY-TOKEN`); empty values use the default.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use jsr_npm_mirror::backfill::DEFAULT_GITHUB_API_URL;
use jsr_npm_mirror::manifest::parse_keywords;
use jsr_npm_mirror::registry::DEFAULT_REGISTRY_HOST;
use jsr_npm_mirror::{
    Access, AuthToken, GitHubMetadataSource, MetadataInputs, MetadataSource, Mirror,
    MirrorOptions, NoMetadataSource, NpmCli, RepositoryRef,
};

#[derive(Parser, Debug)]
#[command(name = "jsr-npm-mirror")]
#[command(about = "Mirror a JSR package to an npm registry", long_about = None)]
struct Cli {
    /// Path to the Deno config [default: deno.json]
    #[arg(long, env = "INPUT_DENO-CONFIG-PATH")]
    deno_config_path: Option<String>,

    /// Target registry kind [default: npm]
    #[arg(long, env = "INPUT_REGISTRY")]
    registry: Option<String>,

    /// Auth token for the target registry
    #[arg(long, env = "INPUT_REGISTRY-TOKEN", hide_env_values = true)]
    registry_token: Option<String>,

    /// Target registry host or URL [default: registry.npmjs.org]
    #[arg(long, env = "INPUT_REGISTRY-URL")]
    registry_url: Option<String>,

    /// GitHub token, used to fill in missing keywords and author
    #[arg(long, env = "INPUT_GITHUB-TOKEN", hide_env_values = true)]
    github_token: Option<String>,

    /// Path to an existing package.json to merge in [default: package.json]
    #[arg(long, env = "INPUT_MANIFEST-PATH")]
    manifest_path: Option<String>,

    /// Path to an existing .npmrc [default: .npmrc]
    #[arg(long, env = "INPUT_NPMRC-PATH")]
    npmrc_path: Option<String>,

    /// Path to an existing .npmignore [default: .npmignore]
    #[arg(long, env = "INPUT_NPMIGNORE-PATH")]
    npmignore_path: Option<String>,

    /// Package name
    #[arg(long, env = "INPUT_NAME")]
    name: Option<String>,

    /// Package version
    #[arg(long, env = "INPUT_VERSION")]
    version: Option<String>,

    /// Package description
    #[arg(long, env = "INPUT_DESCRIPTION")]
    description: Option<String>,

    /// Comma-separated package keywords
    #[arg(long, env = "INPUT_KEYWORDS")]
    keywords: Option<String>,

    /// Package license
    #[arg(long, env = "INPUT_LICENSE")]
    license: Option<String>,

    /// Package author
    #[arg(long, env = "INPUT_AUTHOR")]
    author: Option<String>,

    /// Publish access (public or restricted)
    #[arg(long, env = "INPUT_ACCESS")]
    access: Option<String>,

    /// Run `npm publish --dry-run`
    #[arg(long, env = "INPUT_DRY-RUN", value_parser = clap::builder::FalseyValueParser::new())]
    dry_run: bool,

    /// Repository to read metadata from, as owner/repo
    #[arg(long, env = "GITHUB_REPOSITORY")]
    repository: Option<String>,

    /// GitHub API base URL
    #[arg(long, env = "GITHUB_API_URL")]
    github_api_url: Option<String>,

    /// Directory input paths are relative to [default: current directory]
    #[arg(long, env = "GITHUB_WORKSPACE")]
    workspace: Option<PathBuf>,
}

/// An input value, or `None` when absent or empty.
fn input(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// An input value, or `default` when absent or empty.
fn input_or(value: Option<String>, default: &str) -> String {
    input(value).unwrap_or_else(|| default.to_string())
}

impl Cli {
    fn repository(&self) -> Option<RepositoryRef> {
        let raw = input(self.repository.clone())?;
        raw.parse::<RepositoryRef>()
            .inspect_err(|e| warn!("Ignoring repository context: {}", e))
            .ok()
    }

    fn metadata_source(&self) -> Result<Box<dyn MetadataSource>> {
        let Some(token) = input(self.github_token.clone()) else {
            return Ok(Box::new(NoMetadataSource));
        };
        let api_url = input_or(self.github_api_url.clone(), DEFAULT_GITHUB_API_URL);
        let source = GitHubMetadataSource::new(AuthToken::new(token))
            .context("Failed to set up GitHub API client")?
            .with_api_url(api_url);
        Ok(Box::new(source))
    }

    fn into_options(self) -> Result<MirrorOptions> {
        let repository = self.repository();
        let access = input(self.access)
            .map(|a| a.parse::<Access>())
            .transpose()?;
        let base_dir = match self.workspace {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => std::env::current_dir().context("Failed to determine current directory")?,
        };
        let defaults = MirrorOptions::default();

        Ok(MirrorOptions {
            base_dir,
            deno_config_path: input_or(self.deno_config_path, &defaults.deno_config_path),
            registry: input_or(self.registry, &defaults.registry),
            registry_token: input(self.registry_token).unwrap_or_default(),
            registry_url: input_or(self.registry_url, DEFAULT_REGISTRY_HOST),
            manifest_path: input_or(self.manifest_path, &defaults.manifest_path),
            npmrc_path: input_or(self.npmrc_path, &defaults.npmrc_path),
            npmignore_path: input_or(self.npmignore_path, &defaults.npmignore_path),
            metadata: MetadataInputs {
                name: input(self.name).unwrap_or_default(),
                version: input(self.version).unwrap_or_default(),
                description: input(self.description).unwrap_or_default(),
                keywords: self.keywords.as_deref().map(parse_keywords).unwrap_or_default(),
                license: input(self.license).unwrap_or_default(),
                author: input(self.author).unwrap_or_default(),
            },
            repository,
            access,
            dry_run: self.dry_run,
            work_dir_parent: None,
        })
    }
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "jsr_npm_mirror=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let metadata = cli.metadata_source()?;
    let options = cli.into_options()?;

    let npm = NpmCli::new();
    let report = Mirror::new(options, &npm, metadata.as_ref())
        .run()
        .context("Mirror failed")?;

    println!(
        "Published {} (from {})",
        report.manifest.package_spec(),
        report.source
    );
    Ok(())
}

//! Mirror a JSR package to an npm registry.
//!
//! This crate implements the logic behind a CI step that takes a package
//! already published to [JSR](https://jsr.io) and republishes it to npm:
//!
//! - Fetching the package through JSR's npm-compatibility layer
//!   (`@std/path` is served as `@jsr/std__path` from `https://npm.jsr.io/`)
//! - Synthesizing `package.json` from `deno.json`, an optional existing
//!   `package.json` and explicit inputs
//! - Backfilling `keywords` and `author` from repository metadata
//! - Writing a publish `.npmrc` with a single scoped auth token
//! - Extending `.npmignore` with the Deno project files
//! - Running `npm publish` in a throwaway working directory
//!
//! # Quick Start
//!
//! ```no_run
//! use jsr_npm_mirror::{Mirror, MirrorOptions, NoMetadataSource, NpmCli};
//!
//! let options = MirrorOptions {
//!     registry_token: "npm_secret".to_string(),
//!     ..Default::default()
//! };
//! let npm = NpmCli::new();
//! let report = Mirror::new(options, &npm, &NoMetadataSource).run()?;
//! println!("published {}", report.manifest.package_spec());
//! # Ok::<(), jsr_npm_mirror::Error>(())
//! ```
//!
//! # Manifest Precedence
//!
//! Fields of the published manifest come from, highest priority first:
//!
//! 1. **Inputs** - explicit `name`, `version`, `description`, `keywords`,
//!    `license`, `author` (empty means not supplied)
//! 2. **Override** - an existing `package.json`
//! 3. **Deno config** - `deno.json`, without `imports`, `exports`, `publish`
//! 4. **Repository** - topics and owner, only for missing `keywords`/`author`
//!
//! # Credentials
//!
//! The publish `.npmrc` keeps unrelated settings from the existing file but
//! drops every `registry=` override and every nerf-darted directive:
//!
//! ```text
//! registry=https://old/              (dropped)
//! //old.example/:_authToken=x        (dropped)
//! //registry.npmjs.org/:_authToken=… (appended)
//! ```

pub mod backfill;
mod credentials;
mod error;
mod identifier;
mod ignore;
pub mod manifest;
mod mirror;
pub mod npm;
mod paths;
pub mod registry;
pub mod text;

// Re-export main types
pub use backfill::{
    GitHubMetadataSource, MetadataSource, NoMetadataSource, RepositoryMetadata, RepositoryRef,
};
pub use credentials::{
    compose_credentials, nerf_dart, redact_credentials, AuthToken, NpmrcLine, MIN_TOKEN_LENGTH,
};
pub use error::{Error, Result};
pub use identifier::{compat_identifier, ScopedIdentifier};
pub use ignore::{compose_ignore, DENO_IGNORE_PATTERNS};
pub use manifest::{synthesize, Author, Keywords, Manifest, MetadataInputs};
pub use mirror::{source_identifier, InputFiles, Mirror, MirrorOptions, MirrorReport, Stage};
pub use npm::{Access, CommandOutput, NpmCli, PackageManager, PublishOptions};
pub use paths::{expand_tilde, find_npm, resolve_input_path};

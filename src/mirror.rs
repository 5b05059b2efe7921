//! The mirror pipeline: fetch from JSR, synthesize, configure and publish.
//!
//! A run moves through these stages in order, stopping at the first error:
//!
//! ```text
//! Init → Fetch → Synthesize → WriteManifest → WriteCredentials → WriteIgnore → Publish → Cleanup → Done
//! ```
//!
//! All output files go to a temporary working directory that is removed on
//! every exit path; the caller's files are only read.

use crate::backfill::{MetadataSource, RepositoryRef};
use crate::credentials::{compose_credentials, redact_credentials, AuthToken};
use crate::error::{Error, Result};
use crate::identifier::ScopedIdentifier;
use crate::ignore::compose_ignore;
use crate::manifest::{synthesize, Manifest, MetadataInputs};
use crate::npm::{Access, CommandOutput, PackageManager, PublishOptions};
use crate::paths::{
    resolve_input_path, DEFAULT_DENO_CONFIG_PATH, DEFAULT_MANIFEST_PATH, DEFAULT_NPMIGNORE_PATH,
    DEFAULT_NPMRC_PATH,
};
use crate::registry::{
    is_default_registry, jsr_registry_override, registry_url, RegistryKind, DEFAULT_REGISTRY_HOST,
};
use crate::text::{read_text_file, to_pretty_json, write_text_file};
use std::fmt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{error, info, warn};

/// Prefix of the temporary working directory.
pub const WORK_DIR_PREFIX: &str = "jsr-mirror-";

const MANIFEST_FILE: &str = "package.json";
const NPMRC_FILE: &str = ".npmrc";
const NPMIGNORE_FILE: &str = ".npmignore";

/// Everything a mirror run needs, gathered once by the caller.
#[derive(Debug, Clone)]
pub struct MirrorOptions {
    /// Directory relative input paths are resolved against.
    pub base_dir: PathBuf,
    /// Path of the Deno config (`deno.json`).
    pub deno_config_path: String,
    /// Target registry kind; only `npm` is supported.
    pub registry: String,
    /// Token written to the publish `.npmrc`.
    pub registry_token: String,
    /// Target registry host or URL.
    pub registry_url: String,
    /// Path of the override manifest (`package.json`).
    pub manifest_path: String,
    /// Path of the existing `.npmrc`.
    pub npmrc_path: String,
    /// Path of the existing `.npmignore`.
    pub npmignore_path: String,
    /// Explicit manifest fields.
    pub metadata: MetadataInputs,
    /// Repository to backfill metadata from.
    pub repository: Option<RepositoryRef>,
    /// `--access` for publish.
    pub access: Option<Access>,
    /// Run `npm publish --dry-run`.
    pub dry_run: bool,
    /// Where to create the working directory (system temp dir by default).
    pub work_dir_parent: Option<PathBuf>,
}

impl Default for MirrorOptions {
    fn default() -> Self {
        MirrorOptions {
            base_dir: PathBuf::from("."),
            deno_config_path: DEFAULT_DENO_CONFIG_PATH.to_string(),
            registry: RegistryKind::Npm.to_string(),
            registry_token: String::new(),
            registry_url: DEFAULT_REGISTRY_HOST.to_string(),
            manifest_path: DEFAULT_MANIFEST_PATH.to_string(),
            npmrc_path: DEFAULT_NPMRC_PATH.to_string(),
            npmignore_path: DEFAULT_NPMIGNORE_PATH.to_string(),
            metadata: MetadataInputs::default(),
            repository: None,
            access: None,
            dry_run: false,
            work_dir_parent: None,
        }
    }
}

/// Pipeline stages, used to label log lines and failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Init,
    Fetch,
    Synthesize,
    WriteManifest,
    WriteCredentials,
    WriteIgnore,
    Publish,
    Cleanup,
    Done,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Init => "init",
            Stage::Fetch => "fetch",
            Stage::Synthesize => "synthesize",
            Stage::WriteManifest => "write-manifest",
            Stage::WriteCredentials => "write-credentials",
            Stage::WriteIgnore => "write-ignore",
            Stage::Publish => "publish",
            Stage::Cleanup => "cleanup",
            Stage::Done => "done",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Contents of the caller's files, LF-normalized; missing files are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputFiles {
    pub deno_config: String,
    pub manifest: String,
    pub npmrc: String,
    pub npmignore: String,
}

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct MirrorReport {
    /// The JSR package that was fetched.
    pub source: ScopedIdentifier,
    /// The name it was installed under from JSR's npm layer.
    pub compat_identifier: String,
    /// The manifest that was published.
    pub manifest: Manifest,
    /// Output of `npm publish`.
    pub publish_output: CommandOutput,
}

/// Validated settings carried through the stages after `Init`.
struct Prepared {
    token: AuthToken,
    source: Manifest,
    override_manifest: Manifest,
    inputs: InputFiles,
}

/// The identifier to fetch: name and version from the Deno config, falling
/// back to the explicit inputs.
pub fn source_identifier(source: &Manifest, inputs: &MetadataInputs) -> Result<ScopedIdentifier> {
    let name = source
        .name_text()
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| inputs.name.clone());
    let version = source
        .version_text()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| inputs.version.clone());
    ScopedIdentifier::from_parts(&name, Some(&version))
}

/// Runs the pipeline against a package manager and a metadata source.
pub struct Mirror<'a> {
    options: MirrorOptions,
    package_manager: &'a dyn PackageManager,
    metadata: &'a dyn MetadataSource,
}

impl<'a> Mirror<'a> {
    pub fn new(
        options: MirrorOptions,
        package_manager: &'a dyn PackageManager,
        metadata: &'a dyn MetadataSource,
    ) -> Self {
        Mirror {
            options,
            package_manager,
            metadata,
        }
    }

    pub fn options(&self) -> &MirrorOptions {
        &self.options
    }

    /// Read the caller's input files.
    pub fn read_inputs(&self) -> Result<InputFiles> {
        let base = &self.options.base_dir;
        Ok(InputFiles {
            deno_config: read_text_file(&resolve_input_path(base, &self.options.deno_config_path))?,
            manifest: read_text_file(&resolve_input_path(base, &self.options.manifest_path))?,
            npmrc: read_text_file(&resolve_input_path(base, &self.options.npmrc_path))?,
            npmignore: read_text_file(&resolve_input_path(base, &self.options.npmignore_path))?,
        })
    }

    /// Run every stage. The working directory is removed whatever happens.
    pub fn run(&self) -> Result<MirrorReport> {
        let mut stage = Stage::Init;
        let prepared = self.init().inspect_err(|e| {
            error!(stage = %Stage::Failed, failed_at = %stage, "{}", e);
        })?;

        let work_dir = self.create_work_dir()?;
        let result = self.run_stages(prepared, work_dir.path(), &mut stage);
        if let Err(e) = &result {
            error!(stage = %Stage::Failed, failed_at = %stage, "{}", e);
        }

        info!(stage = %Stage::Cleanup, "Removing {}", work_dir.path().display());
        let cleanup = work_dir.close();

        let report = result?;
        cleanup.map_err(Error::Workspace)?;

        info!(stage = %Stage::Done, "Published {} to npm.", report.source);
        Ok(report)
    }

    /// Validation and input loading; no side effects.
    fn init(&self) -> Result<Prepared> {
        let kind: RegistryKind = self.options.registry.parse()?;
        let token = AuthToken::validated(self.options.registry_token.as_str())?;
        registry_url(&self.options.registry_url)?;
        info!(stage = %Stage::Init, "Mirroring to {} ({})", kind, self.options.registry_url);

        let inputs = self.read_inputs()?;
        let source = Manifest::from_json(&inputs.deno_config, &self.options.deno_config_path)?;
        let override_manifest = Manifest::from_json(&inputs.manifest, &self.options.manifest_path)?;

        Ok(Prepared {
            token,
            source,
            override_manifest,
            inputs,
        })
    }

    fn create_work_dir(&self) -> Result<TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(WORK_DIR_PREFIX);
        let dir = match &self.options.work_dir_parent {
            Some(parent) => builder.tempdir_in(parent),
            None => builder.tempdir(),
        };
        dir.map_err(Error::Workspace)
    }

    fn run_stages(&self, prepared: Prepared, cwd: &Path, stage: &mut Stage) -> Result<MirrorReport> {
        let Prepared {
            token,
            source,
            override_manifest,
            inputs,
        } = prepared;

        *stage = Stage::Fetch;
        let identifier = source_identifier(&source, &self.options.metadata)?;
        let compat_identifier = self.fetch(&identifier, cwd)?;

        *stage = Stage::Synthesize;
        info!(stage = %stage, "Synthesizing package.json ...");
        let manifest = synthesize(
            source,
            &override_manifest,
            &self.options.metadata,
            self.metadata,
            self.options.repository.as_ref(),
        );

        *stage = Stage::WriteManifest;
        let manifest_json = to_pretty_json(&manifest, MANIFEST_FILE)?;
        write_text_file(&cwd.join(MANIFEST_FILE), &manifest_json)?;
        info!(stage = %stage, "Contents of package.json:\n{}", manifest_json);

        *stage = Stage::WriteCredentials;
        let npmrc = compose_credentials(&inputs.npmrc, &self.options.registry_url, &token)?;
        write_text_file(&cwd.join(NPMRC_FILE), &npmrc)?;
        info!(stage = %stage, "Contents of .npmrc:\n{}", redact_credentials(&npmrc));

        *stage = Stage::WriteIgnore;
        let npmignore = compose_ignore(&inputs.npmignore);
        write_text_file(&cwd.join(NPMIGNORE_FILE), &npmignore)?;
        info!(stage = %stage, "Contents of .npmignore:\n{}", npmignore);

        *stage = Stage::Publish;
        let package = manifest.package_spec();
        let options = self.publish_options()?;
        info!(
            stage = %stage,
            "Publishing {} to {} ...", package, self.options.registry_url
        );
        let publish_output = self.package_manager.publish(&package, &options, cwd)?;

        Ok(MirrorReport {
            source: identifier,
            compat_identifier,
            manifest,
            publish_output,
        })
    }

    /// Install the package through JSR's npm layer to prove it resolves.
    fn fetch(&self, identifier: &ScopedIdentifier, cwd: &Path) -> Result<String> {
        let compat_identifier = identifier.to_compat_identifier();

        let npmrc = jsr_registry_override();
        write_text_file(&cwd.join(NPMRC_FILE), &npmrc)?;
        info!(stage = %Stage::Fetch, "Contents of .npmrc:\n{}", npmrc);

        info!(stage = %Stage::Fetch, "Fetching {} as {} ...", identifier, compat_identifier);
        self.package_manager.install(&compat_identifier, cwd)?;
        Ok(compat_identifier)
    }

    fn publish_options(&self) -> Result<PublishOptions> {
        let url = registry_url(&self.options.registry_url)?;
        let registry = if is_default_registry(&url) {
            None
        } else {
            Some(url)
        };
        if self.options.dry_run {
            warn!(stage = %Stage::Publish, "Dry run: nothing will be uploaded");
        }
        Ok(PublishOptions {
            access: self.options.access,
            dry_run: self.options.dry_run,
            registry,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{Field, Keywords};

    #[test]
    fn test_source_identifier_from_config() {
        let source = Manifest {
            name: Some(Field::Typed("@std/path".to_string())),
            version: Some(Field::Typed("1.0.0".to_string())),
            ..Default::default()
        };
        let id = source_identifier(&source, &MetadataInputs::default()).unwrap();
        assert_eq!(id.to_string(), "@std/path@1.0.0");
    }

    #[test]
    fn test_source_identifier_falls_back_to_inputs() {
        let inputs = MetadataInputs {
            name: "@std/path".to_string(),
            version: "2.0.0".to_string(),
            ..Default::default()
        };
        let id = source_identifier(&Manifest::default(), &inputs).unwrap();
        assert_eq!(id.to_compat_identifier(), "@jsr/std__path@2.0.0");
    }

    #[test]
    fn test_source_identifier_requires_name() {
        let source = Manifest {
            keywords: Some(Field::Typed(Keywords::Joined("x".to_string()))),
            ..Default::default()
        };
        assert!(matches!(
            source_identifier(&source, &MetadataInputs::default()),
            Err(Error::MalformedIdentifier(_))
        ));
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::WriteCredentials.to_string(), "write-credentials");
        assert_eq!(Stage::Done.to_string(), "done");
    }

    #[test]
    fn test_default_options() {
        let options = MirrorOptions::default();
        assert_eq!(options.registry, "npm");
        assert_eq!(options.registry_url, "registry.npmjs.org");
        assert_eq!(options.deno_config_path, "deno.json");
        assert_eq!(options.npmignore_path, ".npmignore");
    }
}

//! Tool configuration and the local filesystem layout derived from it

use crate::{errors::ImageError, image::ImageReference};
use std::{
    env,
    path::{Path, PathBuf},
};

/// File extension of a packaged cell image archive
pub static IMAGE_FILE_EXT: &str = "zip";

/// File extension of the deployment descriptor
pub static DESCRIPTOR_FILE_EXT: &str = "yaml";

static REPO_DIR: &str = "repo";
static STAGING_DIR: &str = "tmp";
static BUNDLE_SOURCE_DIR: &str = "src";
static BUNDLE_ARTIFACTS_DIR: &str = "artifacts";
static BUNDLE_DESCRIPTOR_DIR: &str = "cells";

static DEFAULT_RUNTIME_PROGRAM: &str = "ballerina";
static DEFAULT_ORCHESTRATOR_PROGRAM: &str = "kubectl";

/// Settings shared by one deployment invocation
///
/// Collects everything that used to be ambient: the tool home directory, the
/// names of the two external programs, and the offline and keep-failed
/// switches. Construct one with [Config::new] or [Config::with_home] and
/// chain the `with_*` methods to adjust it.
#[derive(Clone, Debug)]
pub struct Config {
    home: PathBuf,
    offline: bool,
    keep_failed: bool,
    runtime_program: String,
    orchestrator_program: String,
}

impl Config {
    /// Construct a configuration rooted at the default home directory
    pub fn new() -> Result<Self, ImageError> {
        Ok(Config::with_home(Config::default_home()?))
    }

    /// Construct a configuration rooted at an explicit home directory
    pub fn with_home(home: PathBuf) -> Self {
        Config {
            home,
            offline: false,
            keep_failed: false,
            runtime_program: DEFAULT_RUNTIME_PROGRAM.to_owned(),
            orchestrator_program: DEFAULT_ORCHESTRATOR_PROGRAM.to_owned(),
        }
    }

    /// Determine the default per-user home directory which will be used if
    /// an alternate home is not specified.
    ///
    /// Typically this returns `$HOME/.cellrun`, but the location can be
    /// customized directly via the `$CELLRUN_HOME` environment variable.
    pub fn default_home() -> Result<PathBuf, ImageError> {
        match env::var("CELLRUN_HOME") {
            Ok(s) => Ok(Path::new(&s).to_path_buf()),
            Err(_) => match env::var("HOME") {
                Ok(s) => Ok(Path::new(&s).join(".cellrun")),
                Err(_) => Err(ImageError::NoDefaultHomeDir),
            },
        }
    }

    /// Only use images already present in the local repository
    pub fn offline(mut self) -> Self {
        self.offline = true;
        self
    }

    /// Keep staged directories on disk when a deployment fails
    ///
    /// The kept paths are logged so a failed deployment can be inspected.
    /// Successful deployments always release their staged directories.
    pub fn keep_failed(mut self) -> Self {
        self.keep_failed = true;
        self
    }

    /// Change the external language runtime program
    pub fn with_runtime_program(mut self, program: &str) -> Self {
        self.runtime_program = program.to_owned();
        self
    }

    /// Change the external cluster orchestrator program
    pub fn with_orchestrator_program(mut self, program: &str) -> Self {
        self.orchestrator_program = program.to_owned();
        self
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn is_offline(&self) -> bool {
        self.offline
    }

    pub fn keeps_failed(&self) -> bool {
        self.keep_failed
    }

    pub fn runtime_program(&self) -> &str {
        &self.runtime_program
    }

    pub fn orchestrator_program(&self) -> &str {
        &self.orchestrator_program
    }

    /// Local repository directory holding one image revision
    pub fn repo_dir(&self, image: &ImageReference) -> PathBuf {
        self.home
            .join(REPO_DIR)
            .join(image.organization())
            .join(image.name())
            .join(image.version())
    }

    /// Path of the local archive for one image revision
    pub fn archive_path(&self, image: &ImageReference) -> PathBuf {
        let mut path = self.repo_dir(image).join(image.name());
        path.set_extension(IMAGE_FILE_EXT);
        path
    }

    /// Staging directory for one invocation, keyed by image name
    ///
    /// Two simultaneous runs of the same image name share this path and will
    /// corrupt each other's staging; callers must serialize such runs.
    pub fn staging_dir(&self, image: &ImageReference) -> PathBuf {
        self.home.join(STAGING_DIR).join(image.name())
    }

    /// Directory holding the bundle's language source inside a staging dir
    pub fn bundle_source_dir(staging_dir: &Path) -> PathBuf {
        staging_dir.join(BUNDLE_SOURCE_DIR)
    }

    /// Directory holding the deployment descriptor inside a staging dir
    pub fn bundle_descriptor_dir(staging_dir: &Path) -> PathBuf {
        staging_dir
            .join(BUNDLE_ARTIFACTS_DIR)
            .join(BUNDLE_DESCRIPTOR_DIR)
    }
}

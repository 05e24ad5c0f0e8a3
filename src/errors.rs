//! Error types you might see while staging or deploying a cell image

use std::{io, path::PathBuf, process::ExitStatus};
use thiserror::Error;

/// Errors during cell image staging
#[derive(Error, Debug)]
pub enum ImageError {
    /// invalid image reference format
    #[error("invalid image reference format: {0:?}")]
    InvalidReferenceFormat(String),

    /// storage io error
    #[error("storage io error: {0}")]
    Storage(#[from] io::Error),

    /// cell image archive error
    #[error("cell image archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// network request error
    #[error("network request error: {0}")]
    NetworkRequest(#[from] reqwest::Error),

    /// invalid registry base url
    #[error("invalid registry base url: {0}")]
    InvalidRegistryUrl(#[from] url::ParseError),

    /// asynchronous task failed during image staging
    #[error("asynchronous task failed during image staging")]
    TaskJoin(#[from] tokio::task::JoinError),

    /// can't determine where the tool home directory lives
    #[error("can't determine where the tool home directory lives")]
    NoDefaultHomeDir,

    /// we are in offline mode, but the image is not in the local repository
    #[error("image is not available in the local repository: {0}")]
    NotFound(String),

    /// the fetch collaborator reported success but the artifact is missing
    #[error("the fetch collaborator reported success but the artifact is missing")]
    MissingAfterFetch,
}

/// Errors that occur while orchestrating a deployment
#[derive(Error, Debug)]
pub enum RunError {
    /// io error
    #[error("io error: {0}")]
    IOError(#[from] io::Error),

    /// cell image error
    #[error("cell image error: {0}")]
    ImageError(#[from] ImageError),

    /// task join error
    #[error("task join error: {0}")]
    TaskJoinError(#[from] tokio::task::JoinError),

    /// no source file inside the extracted bundle
    #[error("no source file found under {0:?}")]
    SourceFileMissing(PathBuf),

    /// more than one source file inside the extracted bundle
    #[error("more than one source file found under {0:?}")]
    SourceFileAmbiguous(PathBuf),

    /// dependency entry is not a key:value pair
    #[error("dependency entry is not a key:value pair: {0:?}")]
    InvalidDependency(String),

    /// deployment descriptor missing from the extracted bundle
    #[error("deployment descriptor missing from the extracted bundle: {0:?}")]
    DescriptorMissing(PathBuf),

    /// failed to start an external program
    #[error("failed to start {program:?}: {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: io::Error,
    },

    /// external program exited unsuccessfully
    #[error("{program:?} exited unsuccessfully: {status}")]
    CommandFailed { program: String, status: ExitStatus },
}

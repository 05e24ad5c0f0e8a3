//! Fetching cell image archives from a registry server

use crate::{config::IMAGE_FILE_EXT, errors::ImageError, image::ImageReference};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::{fs, io::AsyncWriteExt};
use url::Url;

/// Collaborator that can populate a local cell image archive
///
/// The deployment sequence calls this exactly once, when the archive for an
/// image is not already in the local repository. A failed fetch is fatal to
/// the whole invocation.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch the archive for `image`, writing it to `dest`
    async fn fetch(&self, image: &ImageReference, dest: &Path) -> Result<(), ImageError>;
}

/// Fetches archives over HTTP from a registry base URL
///
/// Archives are published under
/// `<base>/<organization>/<name>/<version>/<name>.zip`. The download is
/// streamed into a temporary file beside the destination and renamed into
/// place once complete, so a partial download never looks like a valid
/// archive.
pub struct HttpFetcher {
    base: Url,
    req: reqwest::Client,
}

impl HttpFetcher {
    /// Construct a fetcher for the registry at `base`
    pub fn new(base: &str) -> Result<Self, ImageError> {
        Ok(HttpFetcher {
            base: Url::parse(base)?,
            req: reqwest::Client::new(),
        })
    }

    fn archive_url(&self, image: &ImageReference) -> Result<Url, ImageError> {
        Ok(self.base.join(&format!(
            "{}/{}/{}/{}.{}",
            image.organization(),
            image.name(),
            image.version(),
            image.name(),
            IMAGE_FILE_EXT
        ))?)
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, image: &ImageReference, dest: &Path) -> Result<(), ImageError> {
        let url = self.archive_url(image)?;
        log::info!("{} <{}> downloading archive...", image, url);
        let mut response = self.req.get(url).send().await?.error_for_status()?;

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).await?;
        }
        let temp_path = temp_sibling(dest);
        let mut temp_file = fs::File::create(&temp_path).await?;
        let mut hasher = Sha256::new();
        let mut written = 0u64;

        let result: Result<(), ImageError> = loop {
            match response.chunk().await {
                Err(err) => break Err(err.into()),
                Ok(None) => break Ok(()),
                Ok(Some(chunk)) => {
                    hasher.update(&chunk);
                    written += chunk.len() as u64;
                    match temp_file.write_all(&chunk).await {
                        Err(err) => break Err(err.into()),
                        Ok(()) => (),
                    }
                }
            }
        };

        if let Err(err) = result {
            let _ = fs::remove_file(&temp_path).await;
            return Err(err);
        }

        temp_file.flush().await?;
        drop(temp_file);
        fs::rename(&temp_path, dest).await?;
        log::info!(
            "{} downloaded, {} bytes, sha256:{}",
            image,
            written,
            hex_digest(&hasher.finalize())
        );
        Ok(())
    }
}

fn temp_sibling(dest: &Path) -> PathBuf {
    let mut path = dest.to_path_buf();
    path.set_extension(format!(
        "{}-{}.tmp",
        std::process::id(),
        rand::random::<u64>()
    ));
    path
}

fn hex_digest(digest: &[u8]) -> String {
    digest.iter().map(|byte| format!("{:02x}", byte)).collect()
}

//! Staging a cell image into a local working directory

use crate::{
    config::{Config, DESCRIPTOR_FILE_EXT},
    errors::ImageError,
    fetch::Fetcher,
    image::ImageReference,
};
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use tokio::task;

/// Filesystem layout of one staged cell image
///
/// All of these paths live inside the working directory, which is owned
/// exclusively by one deployment invocation.
#[derive(Clone, Debug)]
pub struct StagedImage {
    /// Working directory the archive was extracted into
    pub working_dir: PathBuf,
    /// Directory holding the bundle's language source
    pub source_dir: PathBuf,
    /// Directory holding the deployment descriptor
    pub descriptor_dir: PathBuf,
    /// The deployment descriptor file itself
    pub descriptor_file: PathBuf,
}

impl StagedImage {
    fn new(config: &Config, image: &ImageReference) -> StagedImage {
        let working_dir = config.staging_dir(image);
        let source_dir = Config::bundle_source_dir(&working_dir);
        let descriptor_dir = Config::bundle_descriptor_dir(&working_dir);
        let mut descriptor_file = descriptor_dir.join(image.name());
        descriptor_file.set_extension(DESCRIPTOR_FILE_EXT);
        StagedImage {
            working_dir,
            source_dir,
            descriptor_dir,
            descriptor_file,
        }
    }
}

/// Ensure a local archive exists for `image` and extract it into a clean
/// staging directory
///
/// A missing archive is fetched through the collaborator first, unless the
/// configuration is offline. Extraction always starts from an empty
/// directory; leftovers from a previous run of the same image are cleared.
///
/// The returned [StagingGuard] owns the staged directories. It is acquired
/// before anything is written, so a failure partway through extraction still
/// releases whatever was created.
pub async fn stage(
    config: &Config,
    fetcher: &dyn Fetcher,
    image: &ImageReference,
) -> Result<(StagedImage, StagingGuard), ImageError> {
    let archive = config.archive_path(image);
    if !archive.is_file() {
        if config.is_offline() {
            return Err(ImageError::NotFound(image.as_str().to_owned()));
        }
        println!("Unable to find image {} locally.", image);
        println!("Pulling image: {}", image);
        fetcher.fetch(image, &archive).await?;
        if !archive.is_file() {
            return Err(ImageError::MissingAfterFetch);
        }
    }

    let staged = StagedImage::new(config, image);
    let guard = StagingGuard::new(&staged, config.keeps_failed());
    let working_dir = staged.working_dir.clone();
    task::spawn_blocking(move || {
        clean_or_create_dir(&working_dir)?;
        extract_archive(&archive, &working_dir)
    })
    .await??;
    Ok((staged, guard))
}

/// Create `dir`, clearing any previous contents
pub fn clean_or_create_dir(dir: &Path) -> Result<(), ImageError> {
    match fs::remove_dir_all(dir) {
        Ok(()) => (),
        Err(err) if err.kind() == io::ErrorKind::NotFound => (),
        Err(err) => return Err(err.into()),
    }
    Ok(fs::create_dir_all(dir)?)
}

fn extract_archive(archive: &Path, dest: &Path) -> Result<(), ImageError> {
    let file = fs::File::open(archive)?;
    let mut bundle = zip::ZipArchive::new(file)?;
    log::debug!("extracting {} entries from {:?}", bundle.len(), archive);
    for index in 0..bundle.len() {
        let mut entry = bundle.by_index(index)?;
        let path = dest.join(entry.sanitized_name());
        if entry.name().ends_with('/') {
            fs::create_dir_all(&path)?;
        } else {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut out = fs::File::create(&path)?;
            io::copy(&mut entry, &mut out)?;
        }
    }
    Ok(())
}

/// Scoped ownership of the staged directories
///
/// The guard removes the staged paths when dropped, so every exit path from
/// the deployment sequence releases them, early aborts included. With
/// `keep_failed` set the failure path keeps them instead and logs where they
/// are. The success path calls [StagingGuard::cleanup], which removes them
/// unconditionally.
pub struct StagingGuard {
    paths: Vec<PathBuf>,
    keep_failed: bool,
}

impl StagingGuard {
    pub fn new(staged: &StagedImage, keep_failed: bool) -> StagingGuard {
        StagingGuard {
            paths: vec![staged.descriptor_dir.clone(), staged.working_dir.clone()],
            keep_failed,
        }
    }

    /// Remove the staged directories now, consuming the guard
    pub fn cleanup(mut self) {
        self.remove_all();
    }

    fn remove_all(&mut self) {
        for path in self.paths.drain(..) {
            match fs::remove_dir_all(&path) {
                Ok(()) => log::debug!("removed staged directory {:?}", path),
                Err(err) if err.kind() == io::ErrorKind::NotFound => (),
                Err(err) => log::warn!("error removing staged directory {:?}, {:?}", path, err),
            }
        }
    }
}

impl Drop for StagingGuard {
    fn drop(&mut self) {
        if self.paths.is_empty() {
            return;
        }
        if self.keep_failed {
            for path in self.paths.drain(..) {
                log::warn!("keeping staged directory for inspection: {:?}", path);
            }
        } else {
            self.remove_all();
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!(
            "cellrun-stage-test-{}-{}",
            std::process::id(),
            rand::random::<u64>()
        ))
    }

    #[test]
    fn clean_or_create_clears_previous_contents() {
        let dir = temp_dir();
        fs::create_dir_all(dir.join("nested")).unwrap();
        fs::write(dir.join("nested").join("leftover"), "old").unwrap();

        clean_or_create_dir(&dir).unwrap();
        assert!(dir.is_dir());
        assert_eq!(fs::read_dir(&dir).unwrap().count(), 0);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn clean_or_create_makes_missing_directories() {
        let dir = temp_dir().join("deeper");
        clean_or_create_dir(&dir).unwrap();
        assert!(dir.is_dir());
        fs::remove_dir_all(dir.parent().unwrap()).unwrap();
    }

    #[test]
    fn guard_removes_staged_directories_on_drop() {
        let working_dir = temp_dir();
        let descriptor_dir = Config::bundle_descriptor_dir(&working_dir);
        fs::create_dir_all(&descriptor_dir).unwrap();
        let staged = StagedImage {
            working_dir: working_dir.clone(),
            source_dir: Config::bundle_source_dir(&working_dir),
            descriptor_dir,
            descriptor_file: working_dir.join("x.yaml"),
        };

        drop(StagingGuard::new(&staged, false));
        assert!(!working_dir.exists());
    }

    #[test]
    fn guard_keeps_staged_directories_when_asked() {
        let working_dir = temp_dir();
        let descriptor_dir = Config::bundle_descriptor_dir(&working_dir);
        fs::create_dir_all(&descriptor_dir).unwrap();
        let staged = StagedImage {
            working_dir: working_dir.clone(),
            source_dir: Config::bundle_source_dir(&working_dir),
            descriptor_dir,
            descriptor_file: working_dir.join("x.yaml"),
        };

        drop(StagingGuard::new(&staged, true));
        assert!(working_dir.exists());

        drop(StagingGuard::new(&staged, false));
        assert!(!working_dir.exists());
    }
}

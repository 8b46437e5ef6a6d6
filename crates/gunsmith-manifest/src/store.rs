//! Local manifest files.

use std::fs::{self, File};
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};

use zip::ZipArchive;

use crate::bungie::{content_file_name, BungieClient};
use crate::error::{ManifestError, ManifestResult};

/// File extension of manifest content files.
const CONTENT_EXTENSION: &str = "content";

/// The directory downloaded manifests live in.
#[derive(Debug, Clone)]
pub struct ManifestStore {
    dir: PathBuf,
    language: String,
}

impl ManifestStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, language: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            language: language.into(),
        }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Local path a content file is stored at.
    pub fn local_path(&self, content_path: &str) -> ManifestResult<PathBuf> {
        let name = content_file_name(content_path).ok_or_else(|| ManifestError::Api {
            code: 0,
            status: "InvalidContentPath".to_string(),
            message: format!("no file name in '{content_path}'"),
        })?;
        Ok(self.dir.join(name))
    }

    /// Make sure the current manifest is on disk and return its path.
    ///
    /// Bungie names each content file after its version, so an existing file
    /// with the same name is already up to date.
    pub async fn ensure(&self, client: &BungieClient) -> ManifestResult<PathBuf> {
        let info = client.manifest_info().await?;
        let content_path = info.content_path(&self.language)?;
        let path = self.local_path(content_path)?;

        if path.is_file() {
            log::debug!("Manifest {} is current", path.display());
            return Ok(path);
        }

        log::info!("New manifest version {}", info.version);
        fs::create_dir_all(&self.dir)?;
        let archive = client.download_content(content_path).await?;
        let dest = path.clone();
        tokio::task::spawn_blocking(move || extract_archive(&archive, &dest)).await??;
        log::info!("Manifest saved to {}", path.display());
        Ok(path)
    }

    /// Most recently modified manifest in the directory, if any.
    pub fn latest_local(&self) -> ManifestResult<Option<PathBuf>> {
        if !self.dir.is_dir() {
            return Ok(None);
        }
        let mut latest: Option<(std::time::SystemTime, PathBuf)> = None;
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(CONTENT_EXTENSION) {
                continue;
            }
            let modified = fs::metadata(&path)?.modified()?;
            if latest.as_ref().is_none_or(|(newest, _)| modified > *newest) {
                latest = Some((modified, path));
            }
        }
        Ok(latest.map(|(_, path)| path))
    }
}

/// Write the single entry of a zipped manifest to `dest`.
///
/// The entry is written next to `dest` and renamed into place.
pub fn extract_archive(archive: &[u8], dest: &Path) -> ManifestResult<()> {
    let mut zip = ZipArchive::new(Cursor::new(archive))?;
    if zip.is_empty() {
        return Err(ManifestError::EmptyArchive);
    }
    let mut entry = zip.by_index(0)?;

    let mut staging = dest.as_os_str().to_owned();
    staging.push(".part");
    let staging = PathBuf::from(staging);

    {
        let mut out = File::create(&staging)?;
        io::copy(&mut entry, &mut out)?;
        out.sync_all()?;
    }
    fs::rename(&staging, dest)?;
    Ok(())
}

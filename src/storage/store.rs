use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use tokio::fs::{self, OpenOptions};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, error, info, warn};

use crate::error::MediaError;
use crate::storage::{StoredMedia, UploadRequest, extension_for, filename};

/// Flat on-disk media directory plus the URL prefix it is served under.
#[derive(Clone, Debug)]
pub struct MediaStore {
    root: PathBuf,
    url_prefix: String,
}

impl MediaStore {
    pub fn new(root: PathBuf, url_prefix: impl Into<String>) -> Self {
        Self {
            root,
            url_prefix: url_prefix.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn ensure_root(&self) -> Result<(), MediaError> {
        fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    pub fn resolve_path(&self, name: &str) -> PathBuf {
        self.root.join(name.trim_start_matches('/'))
    }

    pub fn public_url(&self, name: &str) -> String {
        let prefix = self.url_prefix.trim_end_matches('/');
        let name = name.trim_start_matches('/');
        format!("{prefix}/{name}")
    }

    /// Stores each file in order and returns what was written.
    ///
    /// Files are written one at a time. A rejected content type aborts the
    /// call before any of that file's bytes hit the disk, but files stored
    /// earlier in the same call are kept.
    pub async fn store(&self, files: Vec<UploadRequest>) -> Result<Vec<StoredMedia>, MediaError> {
        if files.is_empty() {
            return Err(MediaError::EmptyUpload);
        }

        let mut saved = Vec::with_capacity(files.len());
        for file in files {
            let ext = match extension_for(&file.content_type) {
                Ok(ext) => ext,
                Err(err) => {
                    if !saved.is_empty() {
                        warn!(
                            kept = saved.len(),
                            "upload aborted after earlier files were stored"
                        );
                    }
                    return Err(err);
                }
            };
            saved.push(self.store_one(&file, ext).await?);
        }
        Ok(saved)
    }

    async fn store_one(&self, file: &UploadRequest, ext: &str) -> Result<StoredMedia, MediaError> {
        let base = filename::sanitize_base(&file.file_name);
        for name in filename::candidates(&base, ext) {
            let path = self.resolve_path(&name);
            // create_new makes the claim on `name` atomic across writers.
            let out = match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(out) => out,
                Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                    debug!(%name, "name taken, trying next suffix");
                    continue;
                }
                Err(err) => return Err(err.into()),
            };
            let size = write_claimed(out, &path, &file.data).await?;

            info!(%name, size, content_type = %file.content_type, "stored upload");
            return Ok(StoredMedia {
                url: self.public_url(&name),
                filename: name,
                content_type: file.content_type.clone(),
                size,
            });
        }
        Err(io::Error::new(ErrorKind::AlreadyExists, format!("no free name left for {base}{ext}")).into())
    }
}

/// Fills a freshly claimed file and returns its size on disk.
///
/// On failure the claimed file is removed so a partial upload never keeps
/// its name or shows up in listings.
async fn write_claimed<W>(mut out: W, path: &Path, data: &[u8]) -> Result<u64, MediaError>
where
    W: AsyncWrite + Unpin,
{
    let mut written = out.write_all(data).await;
    if written.is_ok() {
        written = out.flush().await;
    }
    drop(out);
    let result = match written {
        Ok(()) => fs::metadata(path).await.map(|meta| meta.len()),
        Err(err) => Err(err),
    };
    match result {
        Ok(size) => Ok(size),
        Err(err) => {
            match fs::remove_file(path).await {
                Ok(()) => warn!(path = %path.display(), "removed partial upload after write failure"),
                Err(cleanup) => {
                    error!(path = %path.display(), "failed to remove partial upload: {cleanup}")
                }
            }
            Err(err.into())
        }
    }
}

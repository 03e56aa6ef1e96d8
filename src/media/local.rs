use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};

use super::{allowed_extension, MediaError, MediaHost, UploadedMedia};
use crate::extractors::FileUpload;

/// Stores attachments on local disk and serves them under `/media`.
pub struct LocalMediaHost {
    root: PathBuf,
    base_url: String,
}

impl LocalMediaHost {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl MediaHost for LocalMediaHost {
    async fn upload(&self, folder: &str, file: &FileUpload) -> Result<UploadedMedia, MediaError> {
        let ext = allowed_extension(&file.file_name)?;
        let id = uuid::Uuid::now_v7().to_string();

        let dir = resolve_media_path(&self.root, folder)
            .ok_or_else(|| MediaError::Upstream(format!("invalid folder: {}", folder)))?;
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(format!("{}.{}", id, ext)), &file.data).await?;

        Ok(UploadedMedia {
            url: format!("{}/media/{}/{}.{}", self.base_url, folder, id, ext),
            public_id: format!("{}/{}", folder, id),
        })
    }

    async fn destroy(&self, public_id: &str) -> Result<(), MediaError> {
        let Some(target) = resolve_media_path(&self.root, public_id) else {
            return Ok(());
        };
        let (Some(dir), Some(stem)) = (target.parent(), target.file_name()) else {
            return Ok(());
        };

        let mut entries = match tokio::fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.file_stem() == Some(stem) {
                tokio::fs::remove_file(&path).await?;
                tracing::info!("Removed media {}", public_id);
            }
        }
        Ok(())
    }
}

/// Join a client-supplied relative path onto `root`, refusing anything that
/// could escape it.
pub fn resolve_media_path(root: &Path, relative: &str) -> Option<PathBuf> {
    let relative = Path::new(relative);
    if relative.as_os_str().is_empty() {
        return None;
    }
    for component in relative.components() {
        if !matches!(component, Component::Normal(_)) {
            return None;
        }
    }
    Some(root.join(relative))
}

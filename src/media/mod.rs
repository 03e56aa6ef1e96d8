mod local;

use async_trait::async_trait;

use crate::extractors::FileUpload;

pub use self::local::{resolve_media_path, LocalMediaHost};

/// Extensions accepted for report, notice and donation attachments.
pub const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "mp4", "mov"];

/// Most attachments accepted on a single report or notice.
pub const MAX_ATTACHMENTS: usize = 5;

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("media io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("media host error: {0}")]
    Upstream(String),
}

/// A stored asset: the URL handed to clients and the id used to delete it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedMedia {
    pub url: String,
    pub public_id: String,
}

/// Where uploaded attachments live. Uploads block the request until stored.
#[async_trait]
pub trait MediaHost: Send + Sync {
    async fn upload(&self, folder: &str, file: &FileUpload) -> Result<UploadedMedia, MediaError>;

    /// Remove a stored asset. Removing an unknown id is not an error.
    async fn destroy(&self, public_id: &str) -> Result<(), MediaError>;
}

/// Lowercased extension of `file_name` if it is on the allow-list.
pub fn allowed_extension(file_name: &str) -> Result<String, MediaError> {
    let ext = std::path::Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    if ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        Ok(ext)
    } else {
        Err(MediaError::UnsupportedType(file_name.to_string()))
    }
}

/// Upload every file into `folder`, returning their URLs in order.
/// All names are checked before anything is stored.
pub async fn upload_all(
    host: &dyn MediaHost,
    folder: &str,
    files: &[FileUpload],
) -> Result<Vec<String>, MediaError> {
    for file in files {
        allowed_extension(&file.file_name)?;
    }

    let mut urls = Vec::with_capacity(files.len());
    for file in files {
        let stored = host.upload(folder, file).await?;
        tracing::info!("Stored {} as {}", file.file_name, stored.public_id);
        urls.push(stored.url);
    }
    Ok(urls)
}

/// Derive `<folder>/<file stem>` from a hosted asset URL.
pub fn public_id_from_url(url: &str, folder: &str) -> String {
    let path = url::Url::parse(url)
        .map(|u| u.path().to_string())
        .unwrap_or_else(|_| url.to_string());
    let last = path.rsplit('/').next().unwrap_or_default();
    let stem = last.split('.').next().unwrap_or_default();
    format!("{}/{}", folder, stem)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allow_list_is_case_insensitive() {
        assert_eq!(allowed_extension("photo.JPG").unwrap(), "jpg");
        assert_eq!(allowed_extension("clip.mov").unwrap(), "mov");
        assert!(allowed_extension("script.exe").is_err());
        assert!(allowed_extension("no-extension").is_err());
        assert!(allowed_extension("anim.gif").is_err());
    }

    #[test]
    fn public_id_strips_host_and_extension() {
        assert_eq!(
            public_id_from_url(
                "https://res.example.com/demo/image/upload/v1712/donations/abc123.jpg",
                "donations"
            ),
            "donations/abc123"
        );
        assert_eq!(
            public_id_from_url("http://localhost:5000/media/donations/0190-x.png", "donations"),
            "donations/0190-x"
        );
        assert_eq!(public_id_from_url("plain/name.png", "donations"), "donations/name");
    }
}

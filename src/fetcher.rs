//! Image fetcher.
//!
//! Downloads an image by URL into a per-request temporary file under the
//! scratch directory. Each request gets its own uniquely-named file, deleted
//! when the [`ScratchImage`] handle drops, so concurrent requests never touch
//! each other's files.

use reqwest::Client;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::ServiceError;

/// A downloaded image held in scratch storage. The backing file is removed
/// when this handle is dropped.
#[derive(Debug)]
pub struct ScratchImage {
    file: tempfile::NamedTempFile,
}

impl ScratchImage {
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

/// Downloads images into a scratch directory.
pub struct ImageFetcher {
    client: Client,
    scratch_dir: PathBuf,
}

impl ImageFetcher {
    /// Create a fetcher, creating the scratch directory if needed.
    pub fn new(scratch_dir: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let scratch_dir = scratch_dir.into();
        std::fs::create_dir_all(&scratch_dir)?;
        Ok(Self {
            client: Client::new(),
            scratch_dir,
        })
    }

    /// Download `url` into the scratch directory.
    ///
    /// The body is written as-is with a `.jpg` suffix regardless of actual
    /// format; decoding happens later in the extractor. A non-success status
    /// from the remote host maps to [`ServiceError::ImageNotFound`]; any
    /// transport or I/O failure maps to [`ServiceError::Download`].
    pub async fn download(&self, url: &str) -> Result<ScratchImage, ServiceError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ServiceError::Download(format!("GET {url}: {e}")))?;

        if !response.status().is_success() {
            return Err(ServiceError::ImageNotFound(url.to_string()));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ServiceError::Download(format!("reading body of {url}: {e}")))?;

        let mut file = tempfile::Builder::new()
            .prefix(&format!("{}-", url_stem(url)))
            .suffix(".jpg")
            .tempfile_in(&self.scratch_dir)
            .map_err(|e| ServiceError::Download(format!("creating scratch file: {e}")))?;

        file.as_file_mut()
            .write_all(&bytes)
            .map_err(|e| ServiceError::Download(format!("writing scratch file: {e}")))?;

        debug!(url, path = %file.path().display(), bytes = bytes.len(), "image downloaded");

        Ok(ScratchImage { file })
    }
}

/// Derive a filename stem from the URL's path basename, stripped of any
/// extension and query string.
fn url_stem(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let base = path.rsplit('/').next().unwrap_or(path);
    let stem = base.split('.').next().unwrap_or(base);
    let stem: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if stem.is_empty() {
        "image".to_string()
    } else {
        stem
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_stem_strips_extension_and_query() {
        assert_eq!(
            url_stem("https://cdn.example.com/photos/labrador.jpeg?format=1500w"),
            "labrador"
        );
        assert_eq!(url_stem("http://example.com/a/b/cat.png"), "cat");
        assert_eq!(url_stem("http://example.com/dog"), "dog");
    }

    #[test]
    fn test_url_stem_sanitizes() {
        assert_eq!(
            url_stem("https://example.com/my%20dog.jpg"),
            "my_20dog"
        );
        assert_eq!(url_stem("https://example.com/"), "image");
    }

    #[tokio::test]
    async fn test_scratch_file_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let file = tempfile::Builder::new()
            .prefix("img-")
            .suffix(".jpg")
            .tempfile_in(dir.path())
            .unwrap();
        let image = ScratchImage { file };
        let path = image.path().to_path_buf();
        assert!(path.exists());
        drop(image);
        assert!(!path.exists());
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_download_missing_image_is_not_found() {
        let fetcher = ImageFetcher::new(tempfile::tempdir().unwrap().path()).unwrap();
        let err = fetcher
            .download("https://httpbin.org/status/404")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::ImageNotFound(_)));
    }
}

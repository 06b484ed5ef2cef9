use std::path::{Path, PathBuf};

use crate::error::AppResult;

/// Subdirectory for pipeline-generated clothing images.
pub const GENERATED_IMAGES_DIR: &str = "generated_images";

/// Subdirectory for uploaded profile pictures.
pub const PROFILE_PICS_DIR: &str = "profile_pics";

/// Filesystem-backed media storage
///
/// Files live under a single media root which the HTTP layer also serves
/// statically, so every saved file is reachable at a public URL. That URL
/// must be resolvable by external services (the reverse image search engine
/// fetches generated images through it).
pub struct MediaStore {
    root: PathBuf,
    public_base_url: String,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into(),
        }
    }

    /// Writes bytes under the media root, creating parent directories as
    /// needed. Returns the stored path relative to the root.
    pub async fn save(&self, relative_path: &str, bytes: &[u8]) -> AppResult<String> {
        let path = self.root.join(relative_path);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;

        tracing::debug!(path = %path.display(), bytes = bytes.len(), "Stored media file");

        Ok(relative_path.to_string())
    }

    /// Reads a stored file back by its root-relative path.
    pub async fn read(&self, relative_path: &str) -> AppResult<Vec<u8>> {
        Ok(tokio::fs::read(self.root.join(relative_path)).await?)
    }

    /// Absolute URL under which the file is served.
    pub fn public_url(&self, relative_path: &str) -> String {
        format!(
            "{}/media/{}",
            self.public_base_url.trim_end_matches('/'),
            relative_path
        )
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

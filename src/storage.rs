// SPDX-License-Identifier: MPL-2.0

//! Storage locations for captured photos and videos
//!
//! The session only asks for "a writable file for this kind of content"; where
//! that file lives is decided here.

use crate::backends::camera::PhotoCodec;
use crate::config::SessionConfig;
use crate::constants::{TEMP_DIR_NAME, VIDEO_EXTENSION};
use crate::errors::StorageError;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Kind of media a file will hold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Image(PhotoCodec),
    Video,
}

impl ContentType {
    /// File extension without the leading dot
    pub fn extension(&self) -> &'static str {
        match self {
            ContentType::Image(codec) => codec.extension(),
            ContentType::Video => VIDEO_EXTENSION,
        }
    }
}

/// Hands out writable file locations for captured media
pub trait MediaStorage: Send + Sync {
    /// A fresh, not yet existing file location for `content`
    fn file_url(&self, content: ContentType) -> Result<PathBuf, StorageError>;
}

/// Storage backed by one directory for photos and one for videos
#[derive(Debug, Clone)]
pub struct DirectoryStorage {
    photos_dir: PathBuf,
    videos_dir: PathBuf,
}

impl DirectoryStorage {
    pub fn new(photos_dir: impl Into<PathBuf>, videos_dir: impl Into<PathBuf>) -> Self {
        Self {
            photos_dir: photos_dir.into(),
            videos_dir: videos_dir.into(),
        }
    }

    /// Directories from the config, falling back to the platform media dirs
    pub fn from_config(config: &SessionConfig) -> Result<Self, StorageError> {
        let photos_dir = match &config.photos_dir {
            Some(dir) => dir.clone(),
            None => dirs::picture_dir()
                .ok_or_else(|| StorageError::DirectoryUnavailable("picture".to_string()))?,
        };
        let videos_dir = match &config.videos_dir {
            Some(dir) => dir.clone(),
            None => dirs::video_dir()
                .ok_or_else(|| StorageError::DirectoryUnavailable("video".to_string()))?,
        };

        Ok(Self::new(photos_dir, videos_dir))
    }

    /// Both kinds of media in one directory under the system temp dir
    pub fn temporary() -> Self {
        let dir = std::env::temp_dir().join(TEMP_DIR_NAME);
        Self::new(dir.clone(), dir)
    }

    pub fn photos_dir(&self) -> &Path {
        &self.photos_dir
    }

    pub fn videos_dir(&self) -> &Path {
        &self.videos_dir
    }

    /// Write `data` to a fresh file for `content`
    pub fn save(&self, content: ContentType, data: &[u8]) -> Result<PathBuf, StorageError> {
        let path = self.file_url(content)?;
        std::fs::write(&path, data)?;
        info!(path = %path.display(), size = data.len(), "Saved media file");
        Ok(path)
    }

    fn dir_for(&self, content: ContentType) -> &Path {
        match content {
            ContentType::Image(_) => &self.photos_dir,
            ContentType::Video => &self.videos_dir,
        }
    }
}

impl MediaStorage for DirectoryStorage {
    fn file_url(&self, content: ContentType) -> Result<PathBuf, StorageError> {
        let dir = self.dir_for(content);
        std::fs::create_dir_all(dir)?;

        let name = format!(
            "{}.{}",
            uuid::Uuid::new_v4().as_hyphenated(),
            content.extension()
        );
        let path = dir.join(name);
        debug!(path = %path.display(), ?content, "Allocated media file");
        Ok(path)
    }
}

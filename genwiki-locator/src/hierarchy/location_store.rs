//! Location page store
//!
//! Receives the structured location records written by the path resolver.
//! [`FileLocationStore`] keeps one `<path>.wiki` file per location below a
//! root directory, so `DE/TH/Weimar` lands in `<root>/DE/TH/Weimar.wiki`.

use crate::error::StoreError;
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::debug;

const PAGE_EXTENSION: &str = "wiki";

/// Page store addressed by location path
#[async_trait]
pub trait LocationStore: Send + Sync {
    async fn exists(&self, path: &str) -> Result<bool, StoreError>;

    async fn read(&self, path: &str) -> Result<Option<String>, StoreError>;

    /// Create or replace the page
    async fn write(&self, path: &str, markup: &str) -> Result<(), StoreError>;
}

/// Filesystem-backed store
#[derive(Debug, Clone)]
pub struct FileLocationStore {
    root: PathBuf,
}

impl FileLocationStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    /// File for a location path; rejects paths that would leave the root
    pub fn file_for(&self, path: &str) -> Result<PathBuf, StoreError> {
        let segments: Vec<&str> = path.split('/').collect();
        let valid = !path.is_empty()
            && segments
                .iter()
                .all(|s| !s.is_empty() && *s != "." && *s != ".." && !s.contains('\\'));
        if !valid {
            return Err(StoreError::InvalidPath(path.to_string()));
        }

        let mut file = self.root.clone();
        let (last, parents) = segments
            .split_last()
            .ok_or_else(|| StoreError::InvalidPath(path.to_string()))?;
        for segment in parents {
            file.push(segment);
        }
        // appended rather than set: names may contain dots ("St. Gallen")
        file.push(format!("{}.{}", last, PAGE_EXTENSION));
        Ok(file)
    }
}

#[async_trait]
impl LocationStore for FileLocationStore {
    async fn exists(&self, path: &str) -> Result<bool, StoreError> {
        let file = self.file_for(path)?;
        Ok(tokio::fs::try_exists(&file).await?)
    }

    async fn read(&self, path: &str) -> Result<Option<String>, StoreError> {
        let file = self.file_for(path)?;
        match tokio::fs::read_to_string(&file).await {
            Ok(markup) => Ok(Some(markup)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, path: &str, markup: &str) -> Result<(), StoreError> {
        let file = self.file_for(path)?;
        if let Some(parent) = file.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&file, markup).await?;
        debug!(path = %path, file = %file.display(), "Location page written");
        Ok(())
    }
}

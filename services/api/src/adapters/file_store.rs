//! services/api/src/adapters/file_store.rs
//!
//! Local-disk implementation of the `FileStore` port. Each bucket is a directory
//! under the configured storage root.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use portal_core::domain::{Bucket, StoredFile};
use portal_core::ports::{FileStore, PortError, PortResult};
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tokio::fs;

#[derive(Clone, Debug)]
pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Creates the bucket directories so the first upload doesn't race on them.
    pub async fn ensure_buckets(&self) -> std::io::Result<()> {
        for bucket in [
            Bucket::QuestionBanks,
            Bucket::ParsedBanks,
            Bucket::Papers,
            Bucket::FacultyProfiles,
        ] {
            fs::create_dir_all(self.root.join(bucket.dir_name())).await?;
        }
        Ok(())
    }

    /// Resolves `key` inside the bucket, refusing anything that could escape it.
    fn resolve(&self, bucket: Bucket, key: &str) -> PortResult<PathBuf> {
        let relative = Path::new(key);
        let is_plain = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if key.is_empty() || !is_plain {
            return Err(PortError::Invalid(format!("invalid storage key '{}'", key)));
        }
        Ok(self.root.join(bucket.dir_name()).join(relative))
    }
}

fn io_err(e: std::io::Error, key: &str) -> PortError {
    match e.kind() {
        ErrorKind::NotFound => PortError::NotFound(format!("File {} not found", key)),
        _ => PortError::Unexpected(format!("{}: {}", key, e)),
    }
}

fn modified_at(meta: &std::fs::Metadata) -> DateTime<Utc> {
    meta.modified()
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| Utc::now())
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn put(&self, bucket: Bucket, key: &str, data: Bytes) -> PortResult<()> {
        let path = self.resolve(bucket, key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| io_err(e, key))?;
        }
        fs::write(&path, &data).await.map_err(|e| io_err(e, key))
    }

    async fn get(&self, bucket: Bucket, key: &str) -> PortResult<Bytes> {
        let path = self.resolve(bucket, key)?;
        let data = fs::read(&path).await.map_err(|e| io_err(e, key))?;
        Ok(Bytes::from(data))
    }

    async fn delete(&self, bucket: Bucket, key: &str) -> PortResult<()> {
        let path = self.resolve(bucket, key)?;
        fs::remove_file(&path).await.map_err(|e| io_err(e, key))
    }

    async fn list(&self, bucket: Bucket, dir: &str) -> PortResult<Vec<StoredFile>> {
        let path = self.resolve(bucket, dir)?;
        let mut entries = match fs::read_dir(&path).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_err(e, dir)),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| io_err(e, dir))? {
            let meta = entry.metadata().await.map_err(|e| io_err(e, dir))?;
            if !meta.is_file() {
                continue;
            }
            files.push(StoredFile {
                name: entry.file_name().to_string_lossy().into_owned(),
                size: meta.len(),
                modified: modified_at(&meta),
            });
        }
        Ok(files)
    }

    async fn count(&self, bucket: Bucket, extension: &str) -> PortResult<usize> {
        let mut pending = vec![self.root.join(bucket.dir_name())];
        let mut total = 0;

        while let Some(dir) = pending.pop() {
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(io_err(e, &dir.to_string_lossy())),
            };
            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| io_err(e, &dir.to_string_lossy()))?
            {
                let path = entry.path();
                let file_type = entry
                    .file_type()
                    .await
                    .map_err(|e| io_err(e, &path.to_string_lossy()))?;
                if file_type.is_dir() {
                    pending.push(path);
                } else if path
                    .extension()
                    .map_or(false, |ext| ext.eq_ignore_ascii_case(extension))
                {
                    total += 1;
                }
            }
        }
        Ok(total)
    }
}

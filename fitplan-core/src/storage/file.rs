//! Directory-backed document store.
//!
//! Storage layout:
//! ```text
//! <data_dir>/
//! ├── users/
//! │   └── <user-id>.automerge
//! └── plans/
//!     └── <plan-uuid>.automerge
//! ```

use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

use super::{DocKey, DocKind, DocumentStore, StoreError};

/// File extension for Automerge documents.
const DOC_EXTENSION: &str = "automerge";

/// Stores each document as one file under a per-kind directory.
#[derive(Clone, Debug)]
pub struct FileStore {
    data_dir: PathBuf,
}

impl FileStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn kind_dir(&self, kind: DocKind) -> PathBuf {
        self.data_dir.join(kind.namespace())
    }

    /// Returns the full path for a document.
    pub fn doc_path(&self, key: &DocKey) -> PathBuf {
        self.kind_dir(key.kind)
            .join(format!("{}.{}", key.id, DOC_EXTENSION))
    }
}

#[async_trait]
impl DocumentStore for FileStore {
    async fn load(&self, key: &DocKey) -> Result<Option<Vec<u8>>, StoreError> {
        key.validate()?;
        let path = self.doc_path(key);

        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io(path, e)),
        }
    }

    async fn save(&self, key: &DocKey, bytes: &[u8]) -> Result<(), StoreError> {
        key.validate()?;
        let dir = self.kind_dir(key.kind);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| StoreError::io(&dir, e))?;

        let path = self.doc_path(key);

        // Write atomically using temp file + rename. The suffix keeps
        // concurrent writers of the same document off each other's temp file.
        let temp_path = dir.join(format!(".{}.{}.tmp", key.id, Uuid::new_v4().simple()));
        fs::write(&temp_path, bytes)
            .await
            .map_err(|e| StoreError::io(&temp_path, e))?;
        if let Err(e) = fs::rename(&temp_path, &path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(StoreError::io(path, e));
        }

        tracing::trace!(doc = %key, bytes = bytes.len(), "saved document");
        Ok(())
    }

    async fn delete(&self, key: &DocKey) -> Result<bool, StoreError> {
        key.validate()?;
        let path = self.doc_path(key);

        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StoreError::io(path, e)),
        }
    }

    async fn list(&self, kind: DocKind) -> Result<Vec<DocKey>, StoreError> {
        let dir = self.kind_dir(kind);
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io(dir, e)),
        };

        let mut keys = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StoreError::io(&dir, e))?
        {
            let path = entry.path();

            // Check extension
            if path.extension().and_then(|s| s.to_str()) != Some(DOC_EXTENSION) {
                continue;
            }

            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                let key = DocKey::new(kind, stem);
                if key.validate().is_ok() {
                    keys.push(key);
                }
            }
        }

        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (FileStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path());
        (store, temp_dir)
    }

    #[tokio::test]
    async fn test_load_nonexistent_returns_none() {
        let (store, _temp) = setup();
        assert!(store.load(&DocKey::user("alice")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let (store, _temp) = setup();
        let key = DocKey::user("alice");

        store.save(&key, b"first").await.unwrap();
        store.save(&key, b"second").await.unwrap();

        assert_eq!(store.load(&key).await.unwrap().unwrap(), b"second");
    }

    #[tokio::test]
    async fn test_directory_structure() {
        let (store, temp) = setup();
        let plan_id = Uuid::new_v4();

        store.save(&DocKey::user("alice"), b"u").await.unwrap();
        store.save(&DocKey::plan(plan_id), b"p").await.unwrap();

        assert!(temp.path().join("users/alice.automerge").is_file());
        assert!(temp
            .path()
            .join(format!("plans/{}.automerge", plan_id))
            .is_file());
    }

    #[tokio::test]
    async fn test_no_temp_files_left_behind() {
        let (store, temp) = setup();
        store.save(&DocKey::user("alice"), b"u").await.unwrap();

        let names: Vec<_> = std::fs::read_dir(temp.path().join("users"))
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["alice.automerge".to_string()]);
    }

    #[tokio::test]
    async fn test_delete() {
        let (store, _temp) = setup();
        let key = DocKey::user("bob");

        assert!(!store.delete(&key).await.unwrap());
        store.save(&key, b"x").await.unwrap();
        assert!(store.delete(&key).await.unwrap());
        assert!(store.load(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_by_kind() {
        let (store, temp) = setup();
        store.save(&DocKey::user("carol"), b"c").await.unwrap();
        store.save(&DocKey::user("alice"), b"a").await.unwrap();
        store.save(&DocKey::plan(Uuid::new_v4()), b"p").await.unwrap();
        std::fs::write(temp.path().join("users/notes.txt"), b"ignored").unwrap();

        let users = store.list(DocKind::User).await.unwrap();
        assert_eq!(
            users,
            vec![DocKey::user("alice"), DocKey::user("carol")]
        );
        assert_eq!(store.list(DocKind::Plan).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_missing_dir_is_empty() {
        let (store, _temp) = setup();
        assert!(store.list(DocKind::Plan).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_id_rejected() {
        let (store, _temp) = setup();
        let result = store.save(&DocKey::user("../escape"), b"x").await;
        assert!(matches!(result, Err(StoreError::InvalidId(_))));
    }
}

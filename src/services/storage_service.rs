//! File uploads on local disk
//!
//! Blobs live under `<root>/<profile_id>/<uuid>-<name>`; the relative part is
//! the object key, recorded in the `files` table together with a sha256
//! checksum. The server exposes `root` read-only under `/storage`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Serialize;
use sha2::{Digest, Sha256};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::database::entities::files;
use crate::errors::{CoreError, CoreResult};
use crate::services::ValidationService;

pub const PUBLIC_PREFIX: &str = "/storage";
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StoredFile {
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub file: files::Model,
    pub url: String,
}

#[derive(Clone)]
pub struct StorageService {
    db: DatabaseConnection,
    root: PathBuf,
    max_bytes: u64,
}

impl StorageService {
    pub fn new(db: DatabaseConnection, root: impl Into<PathBuf>, max_bytes: u64) -> Self {
        Self {
            db,
            root: root.into(),
            max_bytes,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn public_url(object_key: &str) -> String {
        format!("{}/{}", PUBLIC_PREFIX, object_key)
    }

    pub async fn upload(
        &self,
        profile_id: i32,
        file_name: &str,
        content_type: Option<&str>,
        bytes: &[u8],
    ) -> CoreResult<StoredFile> {
        if bytes.is_empty() {
            return Err(CoreError::invalid_field("file", "File is empty"));
        }
        if bytes.len() as u64 > self.max_bytes {
            return Err(CoreError::invalid_field(
                "file",
                format!("File exceeds the {} byte upload limit", self.max_bytes),
            ));
        }

        let file_name = ValidationService::sanitize_file_name(file_name);
        let object_key = format!("{}/{}-{}", profile_id, Uuid::new_v4(), file_name);
        let path = self.root.join(&object_key);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                CoreError::internal("Failed to prepare storage directory").with_source(e)
            })?;
        }
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| CoreError::internal("Failed to write file").with_source(e))?;

        let checksum = format!("{:x}", Sha256::digest(bytes));
        let content_type = content_type
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_CONTENT_TYPE);

        let record = files::ActiveModel {
            profile_id: Set(profile_id),
            object_key: Set(object_key),
            file_name: Set(file_name),
            content_type: Set(content_type.to_string()),
            size_bytes: Set(bytes.len() as i64),
            checksum: Set(checksum),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.db)
        .await;

        let file = match record {
            Ok(file) => file,
            Err(e) => {
                // Do not leave an orphaned blob behind
                let _ = tokio::fs::remove_file(&path).await;
                return Err(e.into());
            }
        };

        tracing::info!(
            profile_id,
            object_key = %file.object_key,
            size_bytes = file.size_bytes,
            "Stored upload"
        );

        Ok(StoredFile {
            url: Self::public_url(&file.object_key),
            file,
        })
    }

    pub async fn list_files(&self, profile_id: i32) -> CoreResult<Vec<StoredFile>> {
        let rows = files::Entity::find()
            .filter(files::Column::ProfileId.eq(profile_id))
            .order_by_desc(files::Column::CreatedAt)
            .order_by_desc(files::Column::Id)
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|file| StoredFile {
                url: Self::public_url(&file.object_key),
                file,
            })
            .collect())
    }

    /// Remove the row and its blob. A blob that is already gone only logs a warning.
    pub async fn delete_file(&self, profile_id: i32, file_id: i32) -> CoreResult<()> {
        let file = files::Entity::find_by_id(file_id)
            .filter(files::Column::ProfileId.eq(profile_id))
            .one(&self.db)
            .await?
            .ok_or_else(|| CoreError::not_found("File", file_id.to_string()))?;

        let path = self.root.join(&file.object_key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::warn!(object_key = %file.object_key, "Blob already missing");
            }
            Err(e) => {
                return Err(CoreError::internal("Failed to delete file").with_source(e));
            }
        }

        files::Entity::delete_by_id(file.id).exec(&self.db).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::entities::profiles;
    use crate::database::test_utils::{create_profile, setup_test_db};
    use crate::errors::CoreErrorKind;
    use tempfile::TempDir;

    async fn service(max_bytes: u64) -> (StorageService, TempDir, DatabaseConnection) {
        let db = setup_test_db().await;
        let dir = TempDir::new().unwrap();
        (StorageService::new(db.clone(), dir.path(), max_bytes), dir, db)
    }

    #[tokio::test]
    async fn upload_writes_blob_and_record() {
        let (storage, dir, db) = service(1024).await;
        let owner = create_profile(&db, profiles::ROLE_STUDENT).await;

        let stored = storage
            .upload(owner.id, "../../My Notes.txt", Some("text/plain"), b"hello")
            .await
            .unwrap();

        assert_eq!(stored.file.file_name, "My_Notes.txt");
        assert!(stored.file.object_key.starts_with(&format!("{}/", owner.id)));
        assert!(stored.file.object_key.ends_with("-My_Notes.txt"));
        assert_eq!(stored.url, format!("/storage/{}", stored.file.object_key));
        assert_eq!(
            stored.file.checksum,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
        assert_eq!(stored.file.size_bytes, 5);

        let on_disk = std::fs::read(dir.path().join(&stored.file.object_key)).unwrap();
        assert_eq!(on_disk, b"hello");
    }

    #[tokio::test]
    async fn rejects_empty_and_oversized_files() {
        let (storage, _dir, db) = service(4).await;
        let owner = create_profile(&db, profiles::ROLE_STUDENT).await;

        let err = storage.upload(owner.id, "a.txt", None, b"").await.unwrap_err();
        assert_eq!(err.kind(), CoreErrorKind::Validation);

        let err = storage
            .upload(owner.id, "a.txt", None, b"too big")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), CoreErrorKind::Validation);
    }

    #[tokio::test]
    async fn delete_tolerates_missing_blob_but_checks_owner() {
        let (storage, dir, db) = service(1024).await;
        let owner = create_profile(&db, profiles::ROLE_STUDENT).await;
        let other = create_profile(&db, profiles::ROLE_STUDENT).await;

        let stored = storage.upload(owner.id, "x.bin", None, b"data").await.unwrap();
        assert_eq!(stored.file.content_type, "application/octet-stream");

        let err = storage.delete_file(other.id, stored.file.id).await.unwrap_err();
        assert_eq!(err.kind(), CoreErrorKind::NotFound);

        std::fs::remove_file(dir.path().join(&stored.file.object_key)).unwrap();
        storage.delete_file(owner.id, stored.file.id).await.unwrap();
        assert!(storage.list_files(owner.id).await.unwrap().is_empty());
    }
}

use study_core::model::{FolderId, SessionId};

use super::SqliteRepository;
use super::mapping::{conn, map_folder_row, session_ids_to_json};
use crate::repository::{FolderRecord, FolderRepository, StorageError};

#[async_trait::async_trait]
impl FolderRepository for SqliteRepository {
    async fn insert_folder(&self, record: &FolderRecord) -> Result<(), StorageError> {
        let session_ids = session_ids_to_json(&record.session_ids)?;

        sqlx::query(
            r"
                INSERT INTO folders (id, user_id, name, session_ids)
                VALUES (?1, ?2, ?3, ?4)
            ",
        )
        .bind(record.id.as_str())
        .bind(&record.user_id)
        .bind(&record.name)
        .bind(session_ids)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn update_folder_sessions(
        &self,
        id: &FolderId,
        session_ids: &[SessionId],
    ) -> Result<(), StorageError> {
        let json = session_ids_to_json(session_ids)?;

        let res = sqlx::query("UPDATE folders SET session_ids = ?1 WHERE id = ?2")
            .bind(json)
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn list_folders(&self, user_id: &str) -> Result<Vec<FolderRecord>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, user_id, name, session_ids
                FROM folders
                WHERE user_id = ?1
            ",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_folder_row).collect()
    }
}

use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::{FolderRecord, QuestionRecord, SessionRecord, StorageError};
use study_core::model::{FolderId, SessionId};

pub(super) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(super) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

pub(super) fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(super) fn questions_to_json(questions: &[QuestionRecord]) -> Result<String, StorageError> {
    serde_json::to_string(questions).map_err(ser)
}

pub(super) fn session_ids_to_json(session_ids: &[SessionId]) -> Result<String, StorageError> {
    serde_json::to_string(session_ids).map_err(ser)
}

pub(super) fn map_session_row(row: &SqliteRow) -> Result<SessionRecord, StorageError> {
    let id: String = row.try_get("id").map_err(ser)?;
    let questions_json: String = row.try_get("questions").map_err(ser)?;
    let questions: Vec<QuestionRecord> = serde_json::from_str(&questions_json).map_err(ser)?;

    Ok(SessionRecord {
        id: SessionId::new(id),
        user_id: row.try_get("user_id").map_err(ser)?,
        title: row.try_get("title").map_err(ser)?,
        content: row.try_get("content").map_err(ser)?,
        summary: row.try_get("summary").map_err(ser)?,
        questions,
        score: u32_from_i64("score", row.try_get::<i64, _>("score").map_err(ser)?)?,
        total_questions: u32_from_i64(
            "total_questions",
            row.try_get::<i64, _>("total_questions").map_err(ser)?,
        )?,
        created_at: row.try_get("created_at").map_err(ser)?,
        is_favorite: row.try_get("is_favorite").map_err(ser)?,
    })
}

pub(super) fn map_folder_row(row: &SqliteRow) -> Result<FolderRecord, StorageError> {
    let id: String = row.try_get("id").map_err(ser)?;
    let session_ids_json: String = row.try_get("session_ids").map_err(ser)?;
    let session_ids: Vec<SessionId> = serde_json::from_str(&session_ids_json).map_err(ser)?;

    Ok(FolderRecord {
        id: FolderId::new(id),
        user_id: row.try_get("user_id").map_err(ser)?,
        name: row.try_get("name").map_err(ser)?,
        session_ids,
    })
}

use study_core::model::SessionId;

use super::SqliteRepository;
use super::mapping::{conn, map_session_row, questions_to_json};
use crate::repository::{QuestionRecord, SessionRecord, SessionRepository, StorageError};

#[async_trait::async_trait]
impl SessionRepository for SqliteRepository {
    async fn insert_session(&self, record: &SessionRecord) -> Result<(), StorageError> {
        let questions = questions_to_json(&record.questions)?;

        sqlx::query(
            r"
                INSERT INTO sessions (
                    id, user_id, title, content, summary, questions,
                    score, total_questions, created_at, is_favorite
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ",
        )
        .bind(record.id.as_str())
        .bind(&record.user_id)
        .bind(&record.title)
        .bind(&record.content)
        .bind(&record.summary)
        .bind(questions)
        .bind(i64::from(record.score))
        .bind(i64::from(record.total_questions))
        .bind(record.created_at)
        .bind(record.is_favorite)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn update_score(&self, id: &SessionId, score: u32) -> Result<(), StorageError> {
        let res = sqlx::query("UPDATE sessions SET score = ?1 WHERE id = ?2")
            .bind(i64::from(score))
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn update_title(&self, id: &SessionId, title: &str) -> Result<(), StorageError> {
        let res = sqlx::query("UPDATE sessions SET title = ?1 WHERE id = ?2")
            .bind(title)
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn update_favorite(
        &self,
        id: &SessionId,
        is_favorite: bool,
    ) -> Result<(), StorageError> {
        let res = sqlx::query("UPDATE sessions SET is_favorite = ?1 WHERE id = ?2")
            .bind(is_favorite)
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn update_questions(
        &self,
        id: &SessionId,
        questions: &[QuestionRecord],
    ) -> Result<(), StorageError> {
        let json = questions_to_json(questions)?;
        let total = i64::try_from(questions.len())
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        // One statement: questions, total and the score reset land together.
        let res = sqlx::query(
            r"
                UPDATE sessions
                SET questions = ?1, total_questions = ?2, score = 0
                WHERE id = ?3
            ",
        )
        .bind(json)
        .bind(total)
        .bind(id.as_str())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn list_sessions(&self, user_id: &str) -> Result<Vec<SessionRecord>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT
                    id, user_id, title, content, summary, questions,
                    score, total_questions, created_at, is_favorite
                FROM sessions
                WHERE user_id = ?1
                ORDER BY created_at DESC
            ",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_session_row).collect()
    }
}

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use study_core::model::{
    Folder, FolderId, Question, QuestionId, SessionId, StudySession,
};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Persisted shape for a question.
///
/// Stored as part of the JSON `questions` column on the session row; the
/// remote row-store keeps the whole array inline rather than in a child
/// table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub id: String,
    pub text: String,
    pub options: Vec<String>,
    pub correct_answer_index: usize,
    pub explanation: String,
}

impl QuestionRecord {
    #[must_use]
    pub fn from_question(question: &Question) -> Self {
        Self {
            id: question.id().as_str().to_owned(),
            text: question.text().to_owned(),
            options: question.options().to_vec(),
            correct_answer_index: question.correct_answer_index(),
            explanation: question.explanation().to_owned(),
        }
    }

    /// Convert the record back into a domain `Question`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` when the persisted shape fails
    /// domain validation.
    pub fn into_question(self) -> Result<Question, StorageError> {
        Question::new(
            QuestionId::new(self.id),
            self.text,
            self.options,
            self.correct_answer_index,
            self.explanation,
        )
        .map_err(|e| StorageError::Serialization(e.to_string()))
    }
}

/// Persisted shape for a study session, keyed by owning-user identity.
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub id: SessionId,
    pub user_id: String,
    pub title: String,
    pub content: String,
    pub summary: String,
    pub questions: Vec<QuestionRecord>,
    pub score: u32,
    pub total_questions: u32,
    pub created_at: DateTime<Utc>,
    pub is_favorite: bool,
}

impl SessionRecord {
    #[must_use]
    pub fn from_session(user_id: impl Into<String>, session: &StudySession) -> Self {
        Self {
            id: session.id().clone(),
            user_id: user_id.into(),
            title: session.title().to_owned(),
            content: session.content().to_owned(),
            summary: session.summary().to_owned(),
            questions: session
                .questions()
                .iter()
                .map(QuestionRecord::from_question)
                .collect(),
            score: session.score(),
            total_questions: session.total_questions(),
            created_at: session.created_at(),
            is_favorite: session.is_favorite(),
        }
    }

    /// Convert the record back into a domain `StudySession`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` when the persisted state
    /// violates a domain invariant (blank title, score above total, a
    /// malformed question).
    pub fn into_session(self) -> Result<StudySession, StorageError> {
        let questions = self
            .questions
            .into_iter()
            .map(QuestionRecord::into_question)
            .collect::<Result<Vec<_>, _>>()?;

        StudySession::from_persisted(
            self.id,
            self.title,
            self.content,
            self.summary,
            questions,
            self.score,
            self.total_questions,
            self.created_at,
            self.is_favorite,
        )
        .map_err(|e| StorageError::Serialization(e.to_string()))
    }
}

/// Persisted shape for a folder, keyed by owning-user identity.
#[derive(Debug, Clone)]
pub struct FolderRecord {
    pub id: FolderId,
    pub user_id: String,
    pub name: String,
    pub session_ids: Vec<SessionId>,
}

impl FolderRecord {
    #[must_use]
    pub fn from_folder(user_id: impl Into<String>, folder: &Folder) -> Self {
        Self {
            id: folder.id().clone(),
            user_id: user_id.into(),
            name: folder.name().to_owned(),
            session_ids: folder.session_ids().to_vec(),
        }
    }

    /// Convert the record back into a domain `Folder`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` for a blank folder name.
    pub fn into_folder(self) -> Result<Folder, StorageError> {
        Folder::from_persisted(self.id, self.name, self.session_ids)
            .map_err(|e| StorageError::Serialization(e.to_string()))
    }
}

/// Repository contract for sessions.
///
/// Writes are field-level updates keyed by record id: no transactions span
/// multiple records and concurrent edits resolve as last write wins.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Insert a newly created session.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the session cannot be stored.
    async fn insert_session(&self, record: &SessionRecord) -> Result<(), StorageError>;

    /// Overwrite the score of an existing session.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn update_score(&self, id: &SessionId, score: u32) -> Result<(), StorageError>;

    /// Overwrite the title of an existing session.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn update_title(&self, id: &SessionId, title: &str) -> Result<(), StorageError>;

    /// Overwrite the favorite flag of an existing session.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn update_favorite(&self, id: &SessionId, is_favorite: bool)
    -> Result<(), StorageError>;

    /// Replace the question sequence after a regeneration.
    ///
    /// Writes questions, `total_questions` and a zeroed score in a single
    /// statement so no reader observes the two out of sync.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn update_questions(
        &self,
        id: &SessionId,
        questions: &[QuestionRecord],
    ) -> Result<(), StorageError>;

    /// Fetch every session owned by the user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on query failures.
    async fn list_sessions(&self, user_id: &str) -> Result<Vec<SessionRecord>, StorageError>;
}

/// Repository contract for folders.
#[async_trait]
pub trait FolderRepository: Send + Sync {
    /// Insert a newly created folder.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the folder cannot be stored.
    async fn insert_folder(&self, record: &FolderRecord) -> Result<(), StorageError>;

    /// Overwrite a folder's membership list.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn update_folder_sessions(
        &self,
        id: &FolderId,
        session_ids: &[SessionId],
    ) -> Result<(), StorageError>;

    /// Fetch every folder owned by the user.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on query failures.
    async fn list_folders(&self, user_id: &str) -> Result<Vec<FolderRecord>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    sessions: Arc<Mutex<HashMap<SessionId, SessionRecord>>>,
    folders: Arc<Mutex<HashMap<FolderId, FolderRecord>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionRepository for InMemoryRepository {
    async fn insert_session(&self, record: &SessionRecord) -> Result<(), StorageError> {
        let mut guard = self
            .sessions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn update_score(&self, id: &SessionId, score: u32) -> Result<(), StorageError> {
        let mut guard = self
            .sessions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let record = guard.get_mut(id).ok_or(StorageError::NotFound)?;
        record.score = score;
        Ok(())
    }

    async fn update_title(&self, id: &SessionId, title: &str) -> Result<(), StorageError> {
        let mut guard = self
            .sessions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let record = guard.get_mut(id).ok_or(StorageError::NotFound)?;
        record.title = title.to_owned();
        Ok(())
    }

    async fn update_favorite(
        &self,
        id: &SessionId,
        is_favorite: bool,
    ) -> Result<(), StorageError> {
        let mut guard = self
            .sessions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let record = guard.get_mut(id).ok_or(StorageError::NotFound)?;
        record.is_favorite = is_favorite;
        Ok(())
    }

    async fn update_questions(
        &self,
        id: &SessionId,
        questions: &[QuestionRecord],
    ) -> Result<(), StorageError> {
        let mut guard = self
            .sessions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let record = guard.get_mut(id).ok_or(StorageError::NotFound)?;
        record.questions = questions.to_vec();
        record.total_questions =
            u32::try_from(questions.len()).map_err(|e| StorageError::Serialization(e.to_string()))?;
        record.score = 0;
        Ok(())
    }

    async fn list_sessions(&self, user_id: &str) -> Result<Vec<SessionRecord>, StorageError> {
        let guard = self
            .sessions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut records: Vec<SessionRecord> = guard
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }
}

#[async_trait]
impl FolderRepository for InMemoryRepository {
    async fn insert_folder(&self, record: &FolderRecord) -> Result<(), StorageError> {
        let mut guard = self
            .folders
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn update_folder_sessions(
        &self,
        id: &FolderId,
        session_ids: &[SessionId],
    ) -> Result<(), StorageError> {
        let mut guard = self
            .folders
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let record = guard.get_mut(id).ok_or(StorageError::NotFound)?;
        record.session_ids = session_ids.to_vec();
        Ok(())
    }

    async fn list_folders(&self, user_id: &str) -> Result<Vec<FolderRecord>, StorageError> {
        let guard = self
            .folders
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }
}

/// Aggregates session and folder repositories behind trait objects for easy
/// backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub sessions: Arc<dyn SessionRepository>,
    pub folders: Arc<dyn FolderRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let sessions: Arc<dyn SessionRepository> = Arc::new(repo.clone());
        let folders: Arc<dyn FolderRepository> = Arc::new(repo);
        Self { sessions, folders }
    }
}

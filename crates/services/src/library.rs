//! Session lifecycle controller.
//!
//! Owns the in-memory session and folder collections for one authenticated
//! user and mediates every mutation. The in-memory state is the source of
//! truth for the running client: remote persistence is a best-effort side
//! effect on a detached task, observed only through logging, and the
//! local-only identity skips it entirely.

use std::sync::Arc;

use storage::repository::{FolderRecord, QuestionRecord, SessionRecord, Storage, StorageError};
use study_core::Clock;
use study_core::model::{Folder, FolderId, SessionId, StudySession, UserId};

use crate::error::LibraryError;
use crate::generation::{ContentGenerator, GeneratedContent};

pub struct LibraryService {
    user: UserId,
    storage: Storage,
    generator: Arc<dyn ContentGenerator>,
    clock: Clock,
    sessions: Vec<StudySession>,
    folders: Vec<Folder>,
}

impl LibraryService {
    #[must_use]
    pub fn new(
        user: UserId,
        storage: Storage,
        generator: Arc<dyn ContentGenerator>,
        clock: Clock,
    ) -> Self {
        Self {
            user,
            storage,
            generator,
            clock,
            sessions: Vec::new(),
            folders: Vec::new(),
        }
    }

    #[must_use]
    pub fn user(&self) -> &UserId {
        &self.user
    }

    /// Sessions owned by the user, most recent first.
    #[must_use]
    pub fn sessions(&self) -> &[StudySession] {
        &self.sessions
    }

    #[must_use]
    pub fn session(&self, id: &SessionId) -> Option<&StudySession> {
        self.sessions.iter().find(|s| s.id() == id)
    }

    #[must_use]
    pub fn folders(&self) -> &[Folder] {
        &self.folders
    }

    #[must_use]
    pub fn folder(&self, id: &FolderId) -> Option<&Folder> {
        self.folders.iter().find(|f| f.id() == id)
    }

    /// Fetches the user's sessions and folders from the remote store.
    ///
    /// Sessions arrive newest first. The local-only identity loads nothing
    /// and starts empty.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for query failures or records that fail
    /// rehydration. Unlike background writes, the initial read is
    /// synchronous and its failure is surfaced.
    pub async fn load(&mut self) -> Result<(), StorageError> {
        let Some(owner) = self.user.as_account() else {
            return Ok(());
        };

        let session_records = self.storage.sessions.list_sessions(owner).await?;
        let folder_records = self.storage.folders.list_folders(owner).await?;

        self.sessions = session_records
            .into_iter()
            .map(SessionRecord::into_session)
            .collect::<Result<Vec<_>, _>>()?;
        self.folders = folder_records
            .into_iter()
            .map(FolderRecord::into_folder)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(())
    }

    /// Generates study content for the given source text and creates a
    /// session from it.
    ///
    /// The generation call is awaited: the caller blocks (and should show a
    /// loading state) until the provider answers. No session is created when
    /// generation fails.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::Generation` for provider failures and
    /// `LibraryError::Session` for validation failures (blank title or
    /// content), both before any state is touched.
    pub async fn generate_session(
        &mut self,
        title: impl Into<String>,
        source_text: &str,
    ) -> Result<&StudySession, LibraryError> {
        let title = title.into();
        // Validate before spending a provider call.
        if title.trim().is_empty() {
            return Err(study_core::model::SessionError::EmptyTitle.into());
        }
        if source_text.trim().is_empty() {
            return Err(study_core::model::SessionError::EmptyContent.into());
        }

        let generated = self.generator.generate(source_text).await?;
        self.create_session(title, source_text, generated)
    }

    /// Creates a session from already-generated content, prepends it to the
    /// session list and schedules its insert.
    ///
    /// The caller sees the new session immediately regardless of the
    /// persistence outcome.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::Session` when the title or content is blank.
    pub fn create_session(
        &mut self,
        title: impl Into<String>,
        content: impl Into<String>,
        generated: GeneratedContent,
    ) -> Result<&StudySession, LibraryError> {
        let session = StudySession::new(
            SessionId::generate(),
            title,
            content,
            generated.summary,
            generated.questions,
            self.clock.now(),
        )?;

        if let Some(owner) = self.user.as_account() {
            let record = SessionRecord::from_session(owner, &session);
            let repo = Arc::clone(&self.storage.sessions);
            spawn_write("insert_session", async move {
                repo.insert_session(&record).await
            });
        }

        self.sessions.insert(0, session);
        Ok(&self.sessions[0])
    }

    /// Overwrites the session's score in place.
    ///
    /// The value is trusted to be within `[0, total_questions]`; the quiz
    /// engine is the only producer.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::SessionNotFound` for an unknown id.
    pub fn update_score(&mut self, id: &SessionId, score: u32) -> Result<(), LibraryError> {
        let session = self
            .sessions
            .iter_mut()
            .find(|s| s.id() == id)
            .ok_or(LibraryError::SessionNotFound)?;
        session.set_score(score);

        if !self.user.is_local() {
            let repo = Arc::clone(&self.storage.sessions);
            let id = id.clone();
            spawn_write("update_score", async move {
                repo.update_score(&id, score).await
            });
        }
        Ok(())
    }

    /// Renames a session. Titles are not unique across sessions.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::SessionNotFound` for an unknown id and
    /// `LibraryError::Session` for a blank title.
    pub fn update_title(
        &mut self,
        id: &SessionId,
        title: impl Into<String>,
    ) -> Result<(), LibraryError> {
        let title = title.into();
        let session = self
            .sessions
            .iter_mut()
            .find(|s| s.id() == id)
            .ok_or(LibraryError::SessionNotFound)?;
        session.rename(title.clone())?;

        if !self.user.is_local() {
            let repo = Arc::clone(&self.storage.sessions);
            let id = id.clone();
            spawn_write("update_title", async move {
                repo.update_title(&id, &title).await
            });
        }
        Ok(())
    }

    /// Flips a session's favorite flag.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::SessionNotFound` for an unknown id.
    pub fn toggle_favorite(&mut self, id: &SessionId) -> Result<bool, LibraryError> {
        let session = self
            .sessions
            .iter_mut()
            .find(|s| s.id() == id)
            .ok_or(LibraryError::SessionNotFound)?;
        session.toggle_favorite();
        let is_favorite = session.is_favorite();

        if !self.user.is_local() {
            let repo = Arc::clone(&self.storage.sessions);
            let id = id.clone();
            spawn_write("update_favorite", async move {
                repo.update_favorite(&id, is_favorite).await
            });
        }
        Ok(is_favorite)
    }

    /// Requests a fresh question sequence for the session's stored content
    /// and swaps it in, resetting the score. The only operation that changes
    /// `total_questions` after creation.
    ///
    /// The generation call is awaited; on failure nothing changes.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::SessionNotFound` for an unknown id and
    /// `LibraryError::Generation` when the provider call fails.
    pub async fn regenerate_quiz(&mut self, id: &SessionId) -> Result<(), LibraryError> {
        let content = self
            .session(id)
            .ok_or(LibraryError::SessionNotFound)?
            .content()
            .to_owned();

        let generated = self.generator.generate(&content).await?;

        let session = self
            .sessions
            .iter_mut()
            .find(|s| s.id() == id)
            .ok_or(LibraryError::SessionNotFound)?;
        session.replace_questions(generated.questions);

        if !self.user.is_local() {
            let records: Vec<QuestionRecord> = session
                .questions()
                .iter()
                .map(QuestionRecord::from_question)
                .collect();
            let repo = Arc::clone(&self.storage.sessions);
            let id = id.clone();
            spawn_write("update_questions", async move {
                repo.update_questions(&id, &records).await
            });
        }
        Ok(())
    }

    /// Creates an empty folder.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::Folder` for a blank name.
    pub fn create_folder(&mut self, name: impl Into<String>) -> Result<&Folder, LibraryError> {
        let folder = Folder::new(FolderId::generate(), name)?;

        if let Some(owner) = self.user.as_account() {
            let record = FolderRecord::from_folder(owner, &folder);
            let repo = Arc::clone(&self.storage.folders);
            spawn_write("insert_folder", async move {
                repo.insert_folder(&record).await
            });
        }

        let index = self.folders.len();
        self.folders.push(folder);
        Ok(&self.folders[index])
    }

    /// Adds a session to a folder with set semantics: returns `Ok(false)`
    /// and writes nothing when the session is already a member.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::FolderNotFound` / `SessionNotFound` for
    /// unknown ids.
    pub fn add_session_to_folder(
        &mut self,
        session_id: &SessionId,
        folder_id: &FolderId,
    ) -> Result<bool, LibraryError> {
        if self.session(session_id).is_none() {
            return Err(LibraryError::SessionNotFound);
        }
        let folder = self
            .folders
            .iter_mut()
            .find(|f| f.id() == folder_id)
            .ok_or(LibraryError::FolderNotFound)?;

        if !folder.add_session(session_id.clone()) {
            return Ok(false);
        }

        if !self.user.is_local() {
            let session_ids = folder.session_ids().to_vec();
            let repo = Arc::clone(&self.storage.folders);
            let id = folder_id.clone();
            spawn_write("update_folder_sessions", async move {
                repo.update_folder_sessions(&id, &session_ids).await
            });
        }
        Ok(true)
    }
}

/// Fire-and-forget persistence: failures are logged, never retried, and
/// never fed back into the in-memory state.
fn spawn_write<F>(op: &'static str, fut: F)
where
    F: Future<Output = Result<(), StorageError>> + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(error) = fut.await {
            tracing::warn!(op, %error, "background persistence failed");
        }
    });
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use study_core::model::{Question, QuestionId, SessionError};
    use study_core::time::fixed_clock;

    use crate::error::GenerationError;

    struct FixedGenerator {
        question_count: usize,
    }

    #[async_trait]
    impl ContentGenerator for FixedGenerator {
        async fn generate(&self, _source: &str) -> Result<GeneratedContent, GenerationError> {
            Ok(GeneratedContent {
                summary: "### Summary".into(),
                questions: (0..self.question_count)
                    .map(|n| {
                        Question::new(
                            QuestionId::generate(),
                            format!("question {n}"),
                            vec!["a".into(), "b".into(), "c".into(), "d".into()],
                            0,
                            "because",
                        )
                        .unwrap()
                    })
                    .collect(),
            })
        }
    }

    struct FailingGenerator;

    #[async_trait]
    impl ContentGenerator for FailingGenerator {
        async fn generate(&self, _source: &str) -> Result<GeneratedContent, GenerationError> {
            Err(GenerationError::MalformedResponse)
        }
    }

    fn library_with(question_count: usize, user: UserId) -> LibraryService {
        LibraryService::new(
            user,
            Storage::in_memory(),
            Arc::new(FixedGenerator { question_count }),
            fixed_clock(),
        )
    }

    /// Lets detached persistence tasks run on the current-thread runtime.
    async fn settle() {
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn generate_session_prepends_newest_first() {
        let mut library = library_with(10, UserId::Local);
        library.generate_session("First", "text one").await.unwrap();
        library.generate_session("Second", "text two").await.unwrap();

        let titles: Vec<&str> = library.sessions().iter().map(|s| s.title()).collect();
        assert_eq!(titles, ["Second", "First"]);
        assert_eq!(library.sessions()[0].total_questions(), 10);
        assert_eq!(library.sessions()[0].score(), 0);
    }

    #[tokio::test]
    async fn blank_input_is_rejected_before_generation() {
        let mut library = LibraryService::new(
            UserId::Local,
            Storage::in_memory(),
            Arc::new(FailingGenerator),
            fixed_clock(),
        );

        // FailingGenerator would error if it were reached.
        let err = library.generate_session("  ", "text").await.unwrap_err();
        assert!(matches!(
            err,
            LibraryError::Session(SessionError::EmptyTitle)
        ));
        let err = library.generate_session("Title", "  ").await.unwrap_err();
        assert!(matches!(
            err,
            LibraryError::Session(SessionError::EmptyContent)
        ));
        assert!(library.sessions().is_empty());
    }

    #[tokio::test]
    async fn failed_generation_creates_no_session() {
        let mut library = LibraryService::new(
            UserId::Local,
            Storage::in_memory(),
            Arc::new(FailingGenerator),
            fixed_clock(),
        );

        let err = library.generate_session("Title", "text").await.unwrap_err();
        assert!(matches!(
            err,
            LibraryError::Generation(GenerationError::MalformedResponse)
        ));
        assert!(library.sessions().is_empty());
    }

    #[tokio::test]
    async fn update_score_overwrites_in_place() {
        let mut library = library_with(10, UserId::Local);
        library.generate_session("Study", "text").await.unwrap();
        let id = library.sessions()[0].id().clone();

        library.update_score(&id, 7).unwrap();
        assert_eq!(library.session(&id).unwrap().score(), 7);

        let err = library.update_score(&SessionId::new("missing"), 1).unwrap_err();
        assert!(matches!(err, LibraryError::SessionNotFound));
    }

    #[tokio::test]
    async fn regenerate_resets_score_and_total_atomically() {
        let mut library = library_with(10, UserId::Local);
        library.generate_session("Study", "text").await.unwrap();
        let id = library.sessions()[0].id().clone();
        library.update_score(&id, 8).unwrap();

        // The next generation yields a different question count.
        library.generator = Arc::new(FixedGenerator { question_count: 4 });
        library.regenerate_quiz(&id).await.unwrap();

        let session = library.session(&id).unwrap();
        assert_eq!(session.score(), 0);
        assert_eq!(session.total_questions(), 4);
        assert_eq!(session.questions().len(), 4);
    }

    #[tokio::test]
    async fn failed_regeneration_leaves_the_session_untouched() {
        let mut library = library_with(10, UserId::Local);
        library.generate_session("Study", "text").await.unwrap();
        let id = library.sessions()[0].id().clone();
        library.update_score(&id, 8).unwrap();

        library.generator = Arc::new(FailingGenerator);
        assert!(library.regenerate_quiz(&id).await.is_err());

        let session = library.session(&id).unwrap();
        assert_eq!(session.score(), 8);
        assert_eq!(session.total_questions(), 10);
    }

    #[tokio::test]
    async fn folder_membership_has_set_semantics() {
        let mut library = library_with(2, UserId::Local);
        library.generate_session("Study", "text").await.unwrap();
        let session_id = library.sessions()[0].id().clone();
        let folder_id = library.create_folder("Exams").unwrap().id().clone();

        assert!(library.add_session_to_folder(&session_id, &folder_id).unwrap());
        assert!(!library.add_session_to_folder(&session_id, &folder_id).unwrap());
        assert_eq!(library.folder(&folder_id).unwrap().session_ids().len(), 1);

        let err = library
            .add_session_to_folder(&session_id, &FolderId::new("missing"))
            .unwrap_err();
        assert!(matches!(err, LibraryError::FolderNotFound));
    }

    #[tokio::test]
    async fn account_mutations_write_through_in_the_background() {
        let storage = Storage::in_memory();
        let mut library = LibraryService::new(
            UserId::account("u-1"),
            storage.clone(),
            Arc::new(FixedGenerator { question_count: 3 }),
            fixed_clock(),
        );

        library.generate_session("Study", "text").await.unwrap();
        let id = library.sessions()[0].id().clone();
        settle().await;
        library.update_score(&id, 2).unwrap();
        library.toggle_favorite(&id).unwrap();
        settle().await;

        let records = storage.sessions.list_sessions("u-1").await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].score, 2);
        assert!(records[0].is_favorite);
    }

    #[tokio::test]
    async fn local_identity_never_touches_the_store() {
        let storage = Storage::in_memory();
        let mut library = LibraryService::new(
            UserId::Local,
            storage.clone(),
            Arc::new(FixedGenerator { question_count: 3 }),
            fixed_clock(),
        );

        library.generate_session("Study", "text").await.unwrap();
        let id = library.sessions()[0].id().clone();
        library.update_score(&id, 1).unwrap();
        library.create_folder("Exams").unwrap();
        settle().await;

        // Nothing was written under any owner.
        assert!(storage.sessions.list_sessions("").await.unwrap().is_empty());
        assert!(storage.folders.list_folders("").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn load_restores_sessions_newest_first() {
        let storage = Storage::in_memory();
        {
            let mut writer = LibraryService::new(
                UserId::account("u-1"),
                storage.clone(),
                Arc::new(FixedGenerator { question_count: 2 }),
                fixed_clock(),
            );
            writer.generate_session("Older", "text").await.unwrap();
            writer.clock = Clock::fixed(fixed_clock().now() + chrono::Duration::hours(1));
            writer.generate_session("Newer", "text").await.unwrap();
            writer.create_folder("Exams").unwrap();
            settle().await;
        }

        let mut library = LibraryService::new(
            UserId::account("u-1"),
            storage,
            Arc::new(FixedGenerator { question_count: 2 }),
            fixed_clock(),
        );
        library.load().await.unwrap();

        let titles: Vec<&str> = library.sessions().iter().map(|s| s.title()).collect();
        assert_eq!(titles, ["Newer", "Older"]);
        assert_eq!(library.folders().len(), 1);
    }
}

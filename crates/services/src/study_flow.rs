//! Orchestrates quiz attempts against the library.
//!
//! The flow service hands out engines for sessions that are ready, records
//! final scores through the lifecycle controller, and keeps the per-process
//! attempt counters that feed the displayed-mastery boost. Counters are
//! never persisted; a fresh process starts every session at zero attempts.

use std::collections::{HashMap, HashSet};

use study_core::model::SessionId;
use study_core::quiz::QuizEngine;

use crate::error::LibraryError;
use crate::library::LibraryService;
use crate::view::{DashboardStats, displayed_mastery};

#[derive(Default)]
pub struct StudyFlowService {
    attempts: HashMap<SessionId, u32>,
}

impl StudyFlowService {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a fresh attempt over the session's current questions.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::SessionNotFound` for an unknown id and
    /// `LibraryError::QuizUnavailable` when the session has no questions;
    /// the caller must regenerate instead of entering the state machine.
    pub fn start_attempt(
        &self,
        library: &LibraryService,
        id: &SessionId,
    ) -> Result<QuizEngine, LibraryError> {
        let session = library.session(id).ok_or(LibraryError::SessionNotFound)?;
        if !session.has_questions() {
            return Err(LibraryError::QuizUnavailable);
        }
        QuizEngine::new(session.questions().to_vec())
            .map_err(|_| LibraryError::QuizUnavailable)
    }

    /// Records a completed attempt: writes the engine's final score through
    /// the controller and bumps the session's attempt counter.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::AttemptNotComplete` when the engine has not
    /// reached its terminal state, and `LibraryError::SessionNotFound` when
    /// the session disappeared mid-attempt.
    pub fn finish_attempt(
        &mut self,
        library: &mut LibraryService,
        id: &SessionId,
        engine: &QuizEngine,
    ) -> Result<u32, LibraryError> {
        if !engine.is_complete() {
            return Err(LibraryError::AttemptNotComplete);
        }
        let score = engine.running_score();
        library.update_score(id, score)?;
        *self.attempts.entry(id.clone()).or_insert(0) += 1;
        Ok(score)
    }

    /// Finished attempts for the session in this process.
    #[must_use]
    pub fn attempt_count(&self, id: &SessionId) -> u32 {
        self.attempts.get(id).copied().unwrap_or(0)
    }

    /// Mastery percentage to display for the session, practice boost
    /// included.
    #[must_use]
    pub fn displayed_mastery_for(&self, library: &LibraryService, id: &SessionId) -> Option<u32> {
        let session = library.session(id)?;
        Some(displayed_mastery(
            session.score(),
            session.total_questions(),
            self.attempt_count(id),
        ))
    }

    /// Dashboard aggregates over the library, with "completed" derived from
    /// this process's attempt counters.
    #[must_use]
    pub fn dashboard(&self, library: &LibraryService) -> DashboardStats {
        let attempted: HashSet<SessionId> = self.attempts.keys().cloned().collect();
        DashboardStats::from_sessions(library.sessions(), &attempted)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

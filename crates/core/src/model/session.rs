use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::SessionId;
use crate::model::question::Question;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("session title cannot be empty")]
    EmptyTitle,

    #[error("session content cannot be empty")]
    EmptyContent,

    #[error("score ({score}) exceeds total questions ({total})")]
    ScoreExceedsTotal { score: u32, total: u32 },
}

//
// ─── STUDY SESSION ─────────────────────────────────────────────────────────────
//

/// One unit of study material plus its generated summary and quiz.
///
/// The score reflects the most recently completed quiz attempt.
/// `total_questions` is captured when the question sequence is (re)generated
/// and is the denominator for every mastery display.
#[derive(Debug, Clone, PartialEq)]
pub struct StudySession {
    id: SessionId,
    title: String,
    content: String,
    questions: Vec<Question>,
    summary: String,
    score: u32,
    total_questions: u32,
    created_at: DateTime<Utc>,
    is_favorite: bool,
}

impl StudySession {
    /// Creates a fresh session with a zero score.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptyTitle` / `EmptyContent` when the trimmed
    /// title or source content is empty. These are caught before any network
    /// call is made on behalf of the session.
    pub fn new(
        id: SessionId,
        title: impl Into<String>,
        content: impl Into<String>,
        summary: impl Into<String>,
        questions: Vec<Question>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(SessionError::EmptyTitle);
        }
        let content = content.into();
        if content.trim().is_empty() {
            return Err(SessionError::EmptyContent);
        }

        let total_questions = u32::try_from(questions.len()).unwrap_or(u32::MAX);
        Ok(Self {
            id,
            title,
            content,
            questions,
            summary: summary.into(),
            score: 0,
            total_questions,
            created_at,
            is_favorite: false,
        })
    }

    /// Rehydrates a session from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::ScoreExceedsTotal` when the at-rest invariant
    /// `score <= total_questions` does not hold, and the usual validation
    /// errors for an empty title or content.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        id: SessionId,
        title: impl Into<String>,
        content: impl Into<String>,
        summary: impl Into<String>,
        questions: Vec<Question>,
        score: u32,
        total_questions: u32,
        created_at: DateTime<Utc>,
        is_favorite: bool,
    ) -> Result<Self, SessionError> {
        if score > total_questions {
            return Err(SessionError::ScoreExceedsTotal {
                score,
                total: total_questions,
            });
        }

        let mut session = Self::new(id, title, content, summary, questions, created_at)?;
        session.score = score;
        session.total_questions = total_questions;
        session.is_favorite = is_favorite;
        Ok(session)
    }

    #[must_use]
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Original source text; immutable after creation.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Generated summary; immutable after creation.
    #[must_use]
    pub fn summary(&self) -> &str {
        &self.summary
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn is_favorite(&self) -> bool {
        self.is_favorite
    }

    /// True when an attempt can be started; a session without questions must
    /// be regenerated instead of entering the quiz state machine.
    #[must_use]
    pub fn has_questions(&self) -> bool {
        !self.questions.is_empty()
    }

    /// Ratio of correct answers to total questions, in `0.0..=1.0`.
    ///
    /// The denominator is floored at 1 so a session regenerated into an empty
    /// question set displays as 0% instead of dividing by zero.
    #[must_use]
    pub fn mastery_ratio(&self) -> f64 {
        f64::from(self.score) / f64::from(self.total_questions.max(1))
    }

    /// Overwrites the score with the result of a completed attempt.
    ///
    /// The value is not validated against `total_questions`; the quiz engine
    /// is the only producer and its running score cannot exceed the question
    /// count.
    pub fn set_score(&mut self, score: u32) {
        self.score = score;
    }

    /// Replaces the question sequence, updating `total_questions` and
    /// resetting the score in the same call. This is the only way
    /// `total_questions` changes after creation.
    pub fn replace_questions(&mut self, questions: Vec<Question>) {
        self.total_questions = u32::try_from(questions.len()).unwrap_or(u32::MAX);
        self.questions = questions;
        self.score = 0;
    }

    /// Renames the session. Titles are not unique across sessions.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptyTitle` for a blank title.
    pub fn rename(&mut self, title: impl Into<String>) -> Result<(), SessionError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(SessionError::EmptyTitle);
        }
        self.title = title;
        Ok(())
    }

    pub fn toggle_favorite(&mut self) {
        self.is_favorite = !self.is_favorite;
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::QuestionId;
    use crate::time::fixed_now;

    fn question(n: usize) -> Question {
        Question::new(
            QuestionId::new(format!("q-{n}")),
            format!("question {n}"),
            vec!["a".into(), "b".into(), "c".into(), "d".into()],
            0,
            "because",
        )
        .unwrap()
    }

    fn session(question_count: usize) -> StudySession {
        StudySession::new(
            SessionId::new("s-1"),
            "Biology",
            "cells and membranes",
            "### Summary",
            (0..question_count).map(question).collect(),
            fixed_now(),
        )
        .unwrap()
    }

    #[test]
    fn new_session_starts_unscored() {
        let s = session(10);
        assert_eq!(s.score(), 0);
        assert_eq!(s.total_questions(), 10);
        assert!(!s.is_favorite());
        assert!(s.has_questions());
    }

    #[test]
    fn rejects_blank_title_and_content() {
        let err = StudySession::new(
            SessionId::new("s"),
            "   ",
            "text",
            "",
            vec![],
            fixed_now(),
        )
        .unwrap_err();
        assert_eq!(err, SessionError::EmptyTitle);

        let err =
            StudySession::new(SessionId::new("s"), "title", "", "", vec![], fixed_now())
                .unwrap_err();
        assert_eq!(err, SessionError::EmptyContent);
    }

    #[test]
    fn from_persisted_rejects_score_above_total() {
        let err = StudySession::from_persisted(
            SessionId::new("s"),
            "title",
            "text",
            "",
            vec![],
            5,
            3,
            fixed_now(),
            false,
        )
        .unwrap_err();
        assert_eq!(err, SessionError::ScoreExceedsTotal { score: 5, total: 3 });
    }

    #[test]
    fn replace_questions_resets_score_and_total_together() {
        let mut s = session(10);
        s.set_score(7);

        s.replace_questions((0..4).map(question).collect());

        assert_eq!(s.score(), 0);
        assert_eq!(s.total_questions(), 4);
        assert_eq!(s.questions().len(), 4);
    }

    #[test]
    fn mastery_ratio_floors_denominator_at_one() {
        let mut s = session(10);
        s.replace_questions(Vec::new());
        assert_eq!(s.total_questions(), 0);
        assert!((s.mastery_ratio() - 0.0).abs() < f64::EPSILON);
        assert!(!s.has_questions());
    }

    #[test]
    fn rename_rejects_blank_title() {
        let mut s = session(2);
        assert_eq!(s.rename("  "), Err(SessionError::EmptyTitle));
        s.rename("Chemistry").unwrap();
        assert_eq!(s.title(), "Chemistry");
    }

    #[test]
    fn toggle_favorite_flips() {
        let mut s = session(2);
        s.toggle_favorite();
        assert!(s.is_favorite());
        s.toggle_favorite();
        assert!(!s.is_favorite());
    }
}

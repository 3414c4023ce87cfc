//! Presentation-agnostic read models for the dashboard and library views.
//!
//! These are intentionally **not** UI view-models: no pre-formatted strings
//! and no localization assumptions. The UI formats timestamps and rounds
//! percentages however it likes.

use chrono::{DateTime, Utc};
use std::collections::HashSet;

use study_core::model::{SessionId, StudySession};

/// Each additional attempt is worth this many display percentage points.
const BOOST_PER_ATTEMPT: u32 = 2;
/// The practice boost tops out here.
const BOOST_CAP: u32 = 10;

/// Aggregate dashboard numbers over every session the user owns.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardStats {
    pub total_sessions: usize,
    /// Sessions that have undergone at least one finished attempt.
    pub completed: usize,
    /// Mean of per-session mastery ratios, as a percentage in `0.0..=100.0`.
    pub average_mastery_percent: f64,
}

impl DashboardStats {
    #[must_use]
    pub fn from_sessions(sessions: &[StudySession], attempted: &HashSet<SessionId>) -> Self {
        let total_sessions = sessions.len();
        let completed = sessions
            .iter()
            .filter(|s| attempted.contains(s.id()))
            .count();
        let average_mastery_percent = if sessions.is_empty() {
            0.0
        } else {
            let sum: f64 = sessions.iter().map(StudySession::mastery_ratio).sum();
            sum / total_sessions as f64 * 100.0
        };

        Self {
            total_sessions,
            completed,
            average_mastery_percent,
        }
    }
}

/// List entry for the recent-sessions and library views.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionListItem {
    pub id: SessionId,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub is_favorite: bool,
    /// `score / total_questions` as a percentage, denominator floored at 1.
    pub mastery_percent: f64,
}

impl SessionListItem {
    #[must_use]
    pub fn from_session(session: &StudySession) -> Self {
        Self {
            id: session.id().clone(),
            title: session.title().to_owned(),
            created_at: session.created_at(),
            is_favorite: session.is_favorite(),
            mastery_percent: session.mastery_ratio() * 100.0,
        }
    }
}

/// Mastery percentage shown for a single session, with the practice boost.
///
/// Base percentage from `score / max(total, 1)` plus 2 points per finished
/// attempt, boost capped at +10 and the total capped at 100. The boost is a
/// presentation heuristic recomputed from the attempt counter on every
/// render; it is never stored and never feeds back into the score.
#[must_use]
pub fn displayed_mastery(score: u32, total_questions: u32, attempts: u32) -> u32 {
    let base = f64::from(score) / f64::from(total_questions.max(1)) * 100.0;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let base = base.round() as u32;
    let boost = attempts.min(BOOST_CAP / BOOST_PER_ATTEMPT) * BOOST_PER_ATTEMPT;
    (base + boost).min(100)
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

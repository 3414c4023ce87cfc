//! Quiz progression state machine.
//!
//! One engine instance drives a single attempt over a session's ordered
//! question sequence. Invalid transitions are silent no-ops rather than
//! errors: a confirmed answer cannot be revised, a completed engine ignores
//! everything, and the final score is reported exactly once.

use thiserror::Error;

use crate::model::Question;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    /// The session has no questions; the caller must trigger regeneration
    /// instead of entering the state machine.
    #[error("no questions available for a quiz attempt")]
    NoQuestions,
}

/// Where the attempt stands for the current question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizState {
    /// Waiting for a selection (which may be revised) and a confirmation.
    AwaitingSelection,
    /// The answer is locked in; the explanation is revealed.
    Answered,
    /// Terminal. The engine must be discarded; a new attempt gets a new one.
    Completed,
}

/// Outcome of confirming the current selection, for the reveal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub question_index: usize,
    pub selected: usize,
    pub correct: bool,
    pub correct_answer_index: usize,
    pub explanation: String,
}

/// Result of an `advance` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    /// Moved to the next question, selection cleared.
    Next { question_index: usize },
    /// The last question was advanced past; carries the final score.
    /// Emitted exactly once per attempt.
    Finished { score: u32 },
    /// The call was a no-op (not in `Answered`, or already completed).
    Idle,
}

/// Walks a learner through one question at a time, accumulating a running
/// score and reporting it once on completion.
#[derive(Debug)]
pub struct QuizEngine {
    questions: Vec<Question>,
    current: usize,
    selected: Option<usize>,
    state: QuizState,
    score: u32,
}

impl QuizEngine {
    /// Starts an attempt at the first question with no selection.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NoQuestions` for an empty sequence; an engine is
    /// never constructed in that case.
    pub fn new(questions: Vec<Question>) -> Result<Self, QuizError> {
        if questions.is_empty() {
            return Err(QuizError::NoQuestions);
        }
        Ok(Self {
            questions,
            current: 0,
            selected: None,
            state: QuizState::AwaitingSelection,
            score: 0,
        })
    }

    #[must_use]
    pub fn state(&self) -> QuizState {
        self.state
    }

    /// Index of the question currently shown. Stays at the last question
    /// once the attempt completes.
    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        if self.state == QuizState::Completed {
            None
        } else {
            self.questions.get(self.current)
        }
    }

    #[must_use]
    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    #[must_use]
    pub fn running_score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.state == QuizState::Completed
    }

    /// Records or revises the selection for the current question.
    ///
    /// No-op outside `AwaitingSelection` and for indexes that do not point
    /// into the current question's options.
    pub fn select(&mut self, option_index: usize) {
        if self.state != QuizState::AwaitingSelection {
            return;
        }
        let Some(question) = self.questions.get(self.current) else {
            return;
        };
        if option_index >= question.options().len() {
            return;
        }
        self.selected = Some(option_index);
    }

    /// Locks in the current selection and scores it.
    ///
    /// Returns `None` (no-op) when no selection has been made or the engine
    /// is not awaiting one; in particular a second confirm cannot
    /// double-count the answer.
    pub fn confirm(&mut self) -> Option<AnswerOutcome> {
        if self.state != QuizState::AwaitingSelection {
            return None;
        }
        let selected = self.selected?;
        let question = self.questions.get(self.current)?;

        let correct = question.is_correct(selected);
        if correct {
            self.score += 1;
        }
        self.state = QuizState::Answered;

        Some(AnswerOutcome {
            question_index: self.current,
            selected,
            correct,
            correct_answer_index: question.correct_answer_index(),
            explanation: question.explanation().to_owned(),
        })
    }

    /// Moves past an answered question.
    ///
    /// From the last question this transitions to `Completed` and reports
    /// the final score; any call after that returns `Progress::Idle`.
    pub fn advance(&mut self) -> Progress {
        if self.state != QuizState::Answered {
            return Progress::Idle;
        }

        if self.current + 1 < self.questions.len() {
            self.current += 1;
            self.selected = None;
            self.state = QuizState::AwaitingSelection;
            Progress::Next {
                question_index: self.current,
            }
        } else {
            self.state = QuizState::Completed;
            self.selected = None;
            Progress::Finished { score: self.score }
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

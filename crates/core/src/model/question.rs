use thiserror::Error;

use crate::model::ids::QuestionId;

/// Fewer options than this makes a question unanswerable.
pub const MIN_OPTIONS: usize = 2;
/// The content producer caps questions at four options.
pub const MAX_OPTIONS: usize = 4;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question needs at least {MIN_OPTIONS} options, got {got}")]
    TooFewOptions { got: usize },

    #[error("question may have at most {MAX_OPTIONS} options, got {got}")]
    TooManyOptions { got: usize },

    #[error("correct answer index {index} is out of range for {options} options")]
    AnswerIndexOutOfRange { index: usize, options: usize },
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A single multiple-choice question.
///
/// Immutable after construction; regeneration replaces a session's question
/// sequence wholesale rather than editing individual questions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    text: String,
    options: Vec<String>,
    correct_answer_index: usize,
    explanation: String,
}

impl Question {
    /// Builds a validated question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` when the option count is outside
    /// `MIN_OPTIONS..=MAX_OPTIONS` or the answer index does not point into
    /// `options`.
    pub fn new(
        id: QuestionId,
        text: impl Into<String>,
        options: Vec<String>,
        correct_answer_index: usize,
        explanation: impl Into<String>,
    ) -> Result<Self, QuestionError> {
        if options.len() < MIN_OPTIONS {
            return Err(QuestionError::TooFewOptions { got: options.len() });
        }
        if options.len() > MAX_OPTIONS {
            return Err(QuestionError::TooManyOptions { got: options.len() });
        }
        if correct_answer_index >= options.len() {
            return Err(QuestionError::AnswerIndexOutOfRange {
                index: correct_answer_index,
                options: options.len(),
            });
        }

        Ok(Self {
            id,
            text: text.into(),
            options,
            correct_answer_index,
            explanation: explanation.into(),
        })
    }

    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Ordered answer options shown to the learner.
    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn correct_answer_index(&self) -> usize {
        self.correct_answer_index
    }

    /// Free text revealed after the question is answered.
    #[must_use]
    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    /// Strict index equality; no partial credit.
    #[must_use]
    pub fn is_correct(&self, selected: usize) -> bool {
        selected == self.correct_answer_index
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn options(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("option {i}")).collect()
    }

    #[test]
    fn accepts_two_to_four_options() {
        for n in MIN_OPTIONS..=MAX_OPTIONS {
            let q = Question::new(QuestionId::new("q"), "t", options(n), n - 1, "e");
            assert!(q.is_ok(), "{n} options should be valid");
        }
    }

    #[test]
    fn rejects_single_option() {
        let err = Question::new(QuestionId::new("q"), "t", options(1), 0, "e").unwrap_err();
        assert_eq!(err, QuestionError::TooFewOptions { got: 1 });
    }

    #[test]
    fn rejects_five_options() {
        let err = Question::new(QuestionId::new("q"), "t", options(5), 0, "e").unwrap_err();
        assert_eq!(err, QuestionError::TooManyOptions { got: 5 });
    }

    #[test]
    fn rejects_out_of_range_answer_index() {
        let err = Question::new(QuestionId::new("q"), "t", options(4), 4, "e").unwrap_err();
        assert_eq!(
            err,
            QuestionError::AnswerIndexOutOfRange {
                index: 4,
                options: 4
            }
        );
    }

    #[test]
    fn correctness_is_strict_index_equality() {
        let q = Question::new(QuestionId::new("q"), "t", options(4), 2, "e").unwrap();
        assert!(q.is_correct(2));
        assert!(!q.is_correct(1));
        assert!(!q.is_correct(3));
    }
}

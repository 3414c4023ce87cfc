//! Shared error types for the services crate.

use thiserror::Error;

use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;
use study_core::model::SessionError;

/// Errors emitted by the content-generation client.
///
/// These are the synchronous, user-facing failures: they abort the
/// generation flow and are shown to the user, unlike background
/// persistence errors which are only logged.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GenerationError {
    /// Configuration error: no API credential. Fatal for the generation
    /// flow, no partial operation is possible.
    #[error("content generation is not configured: set STUDY_AI_API_KEY")]
    MissingApiKey,

    /// The provider rejected the request; `message` is extracted from its
    /// error envelope when possible.
    #[error("provider error ({status}): {message}")]
    Provider { status: u16, message: String },

    /// The provider answered but the payload could not be turned into a
    /// summary and quiz. Distinct from network errors so the user can be
    /// told to retry with shorter input.
    #[error("could not parse the generated content; try again with a shorter text")]
    MalformedResponse,

    #[error("provider returned an empty response")]
    EmptyResponse,

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors emitted by the session lifecycle controller and attempt workflow.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LibraryError {
    #[error("session not found")]
    SessionNotFound,

    #[error("folder not found")]
    FolderNotFound,

    /// The session has no questions; regeneration must be triggered before
    /// a quiz attempt can start.
    #[error("quiz is not ready; regenerate the questions first")]
    QuizUnavailable,

    /// An attempt must run to completion before its score is recorded.
    #[error("quiz attempt is not complete")]
    AttemptNotComplete,

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Folder(#[from] study_core::model::FolderError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

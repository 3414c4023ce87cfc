mod folder;
mod ids;
mod question;
mod session;

pub use folder::{Folder, FolderError};
pub use ids::{FolderId, QuestionId, SessionId, UserId};
pub use question::{MAX_OPTIONS, MIN_OPTIONS, Question, QuestionError};
pub use session::{SessionError, StudySession};

use thiserror::Error;

use crate::model::ids::{FolderId, SessionId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum FolderError {
    #[error("folder name cannot be empty")]
    EmptyName,
}

/// A user-defined named grouping referencing zero or more sessions.
///
/// Membership is semantically a set: a session id appears at most once.
/// The references are weak; folders never own the sessions they list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Folder {
    id: FolderId,
    name: String,
    session_ids: Vec<SessionId>,
}

impl Folder {
    /// Creates an empty folder.
    ///
    /// # Errors
    ///
    /// Returns `FolderError::EmptyName` for a blank name.
    pub fn new(id: FolderId, name: impl Into<String>) -> Result<Self, FolderError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(FolderError::EmptyName);
        }
        Ok(Self {
            id,
            name,
            session_ids: Vec::new(),
        })
    }

    /// Rehydrates a folder from persisted storage, dropping any duplicate
    /// session ids a sloppy writer may have left behind.
    ///
    /// # Errors
    ///
    /// Returns `FolderError::EmptyName` for a blank name.
    pub fn from_persisted(
        id: FolderId,
        name: impl Into<String>,
        session_ids: Vec<SessionId>,
    ) -> Result<Self, FolderError> {
        let mut folder = Self::new(id, name)?;
        for session_id in session_ids {
            folder.add_session(session_id);
        }
        Ok(folder)
    }

    #[must_use]
    pub fn id(&self) -> &FolderId {
        &self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Member session ids in insertion order.
    #[must_use]
    pub fn session_ids(&self) -> &[SessionId] {
        &self.session_ids
    }

    #[must_use]
    pub fn contains(&self, session_id: &SessionId) -> bool {
        self.session_ids.contains(session_id)
    }

    /// Adds a session to the folder. Returns `false` without modifying the
    /// folder when the session is already a member.
    pub fn add_session(&mut self, session_id: SessionId) -> bool {
        if self.contains(&session_id) {
            return false;
        }
        self.session_ids.push(session_id);
        true
    }
}

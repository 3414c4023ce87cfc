use std::sync::Arc;

use study_core::model::UserId;
use storage::repository::Storage;

use crate::error::AppServicesError;
use crate::generation::{ContentGenerator, GenerationService};
use crate::library::LibraryService;
use crate::study_flow::StudyFlowService;
use crate::Clock;

/// Assembles app-facing services for one signed-in (or local) user.
pub struct AppServices {
    library: LibraryService,
    flow: StudyFlowService,
}

impl AppServices {
    /// Build services backed by `SQLite` storage, with the AI generator
    /// configured from the environment.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization or the initial
    /// library load fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        user: UserId,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        let generator: Arc<dyn ContentGenerator> = Arc::new(GenerationService::from_env());
        let mut library = LibraryService::new(user, storage, generator, clock);
        library.load().await?;

        Ok(Self {
            library,
            flow: StudyFlowService::new(),
        })
    }

    /// Build services over in-memory storage with a caller-supplied generator.
    #[must_use]
    pub fn in_memory(user: UserId, generator: Arc<dyn ContentGenerator>, clock: Clock) -> Self {
        Self {
            library: LibraryService::new(user, Storage::in_memory(), generator, clock),
            flow: StudyFlowService::new(),
        }
    }

    #[must_use]
    pub fn library(&self) -> &LibraryService {
        &self.library
    }

    pub fn library_mut(&mut self) -> &mut LibraryService {
        &mut self.library
    }

    #[must_use]
    pub fn flow(&self) -> &StudyFlowService {
        &self.flow
    }

    /// Both halves at once, for flows that read the library while mutating
    /// attempt state.
    pub fn split_mut(&mut self) -> (&mut LibraryService, &mut StudyFlowService) {
        (&mut self.library, &mut self.flow)
    }
}

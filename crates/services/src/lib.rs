#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod generation;
pub mod library;
pub mod study_flow;
pub mod view;

pub use study_core::Clock;

pub use app_services::AppServices;
pub use error::{AppServicesError, GenerationError, LibraryError};
pub use generation::{ContentGenerator, GeneratedContent, GenerationConfig, GenerationService};
pub use library::LibraryService;
pub use study_flow::StudyFlowService;
pub use view::{DashboardStats, SessionListItem, displayed_mastery};

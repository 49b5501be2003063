#![forbid(unsafe_code)]

pub mod app_services;
pub mod attempt_service;
pub mod dashboard;
pub mod error;
pub mod import;
pub mod lesson_service;
pub mod lesson_view;
pub mod session;
pub mod stats;

pub use lms_core::Clock;

pub use app_services::AppServices;
pub use attempt_service::AttemptService;
pub use dashboard::{Dashboard, DashboardService, LessonCard, LessonSummary};
pub use error::{
    AppServicesError, AttemptServiceError, DashboardError, ImportError, LessonServiceError,
    SessionError,
};
pub use import::{ImportPreview, ImportStep, ImportWizard};
pub use lesson_service::LessonService;
pub use lesson_view::LessonView;
pub use session::Session;
pub use stats::LessonStats;

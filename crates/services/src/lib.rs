#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod exam;

pub use exam_core::Clock;

pub use app_services::{AppServices, BackendKind};
pub use error::{AppServicesError, ExamError};
pub use exam::{
    BackgroundSync, ControllerOptions, ExamProgress, ExamService, ExamSessionController,
    PendingSubmission, SessionFailure, SubmitOutcome, SubmitTrigger, SyncOutcome, SyncReport,
    TickOutcome, reconcile,
};

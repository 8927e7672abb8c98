mod controller;
mod payload;
mod progress;
mod sync;
mod workflow;

pub use controller::{
    ControllerOptions, ExamSessionController, PendingSubmission, SessionFailure, SubmitOutcome,
    SubmitTrigger, TickOutcome,
};
pub use payload::reconcile;
pub use progress::ExamProgress;
pub use sync::{BackgroundSync, SyncOutcome, SyncReport};
pub use workflow::ExamService;

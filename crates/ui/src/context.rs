use std::sync::Arc;

use exam_core::model::{ExamId, ExamMode};
use services::{ExamService, ExamSessionController};

pub trait UiApp: Send + Sync {
    fn exam_id(&self) -> ExamId;
    fn exam_mode(&self) -> ExamMode;

    fn exams(&self) -> Arc<ExamService>;
}

#[derive(Clone)]
pub struct AppContext {
    exam_id: ExamId,
    exam_mode: ExamMode,
    exams: Arc<ExamService>,
}

impl AppContext {
    #[must_use]
    pub fn new(app: &Arc<dyn UiApp>) -> Self {
        Self {
            exam_id: app.exam_id(),
            exam_mode: app.exam_mode(),
            exams: app.exams(),
        }
    }

    #[must_use]
    pub fn exam_id(&self) -> ExamId {
        self.exam_id
    }

    #[must_use]
    pub fn exam_mode(&self) -> ExamMode {
        self.exam_mode
    }

    #[must_use]
    pub fn exams(&self) -> Arc<ExamService> {
        Arc::clone(&self.exams)
    }

    /// A fresh, not yet started controller for the configured exam.
    #[must_use]
    pub fn new_controller(&self) -> ExamSessionController {
        self.exams.controller(self.exam_id, self.exam_mode)
    }
}

// This context is provided by the application composition root (e.g. `crates/app`).

/// Build an `AppContext` from a UI-facing app implementation.
#[must_use]
pub fn build_app_context(app: &Arc<dyn UiApp>) -> AppContext {
    AppContext::new(app)
}

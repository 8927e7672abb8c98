use std::sync::Arc;

use backend::{ExamBackend, SessionContext};
use exam_core::model::{ExamId, ExamMode};

use super::controller::{ControllerOptions, ExamSessionController};
use crate::Clock;
use crate::error::ExamError;

/// Creates exam session controllers wired to one backend and session context.
#[derive(Clone)]
pub struct ExamService {
    clock: Clock,
    backend: Arc<dyn ExamBackend>,
    context: SessionContext,
    options: ControllerOptions,
}

impl ExamService {
    #[must_use]
    pub fn new(clock: Clock, backend: Arc<dyn ExamBackend>, context: SessionContext) -> Self {
        Self {
            clock,
            backend,
            context,
            options: ControllerOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: ControllerOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    #[must_use]
    pub fn options(&self) -> ControllerOptions {
        self.options
    }

    /// A controller in `NotStarted`, ready for the user to confirm the start.
    #[must_use]
    pub fn controller(&self, exam_id: ExamId, mode: ExamMode) -> ExamSessionController {
        ExamSessionController::new(
            Arc::clone(&self.backend),
            self.context.clone(),
            exam_id,
            mode,
        )
        .with_clock(self.clock)
        .with_options(self.options)
    }

    /// Builds a controller and starts or resumes the attempt.
    ///
    /// # Errors
    ///
    /// Returns `ExamError` when the exam cannot be loaded.
    pub async fn start_exam(
        &self,
        exam_id: ExamId,
        mode: ExamMode,
    ) -> Result<ExamSessionController, ExamError> {
        let mut controller = self.controller(exam_id, mode);
        controller.start().await?;
        Ok(controller)
    }
}

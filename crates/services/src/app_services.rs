use std::sync::Arc;

use backend::{BackendConfig, ExamBackend, HttpBackend, InMemoryBackend, SessionContext};
use tracing::info;

use crate::Clock;
use crate::error::AppServicesError;
use crate::exam::{ControllerOptions, ExamService};

/// Which backend collaborator the services talk to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendKind {
    Http { base_url: String },
    InMemory,
}

/// Assembles app-facing services around one backend and session context.
#[derive(Clone)]
pub struct AppServices {
    kind: BackendKind,
    context: SessionContext,
    exams: Arc<ExamService>,
}

impl AppServices {
    /// Build services backed by the HTTP backend described by `config`.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the HTTP client cannot be created.
    pub fn from_config(
        config: BackendConfig,
        clock: Clock,
        options: ControllerOptions,
    ) -> Result<Self, AppServicesError> {
        let context = SessionContext::new(config.bearer_token.clone());
        let kind = BackendKind::Http {
            base_url: config.base_url.to_string(),
        };
        let backend: Arc<dyn ExamBackend> = Arc::new(HttpBackend::new(config, context.clone())?);
        info!(?kind, authenticated = context.is_authenticated(), "exam services ready");
        Ok(Self::assemble(kind, backend, context, clock, options))
    }

    /// Build services backed by the in-memory sample exam.
    #[must_use]
    pub fn in_memory(clock: Clock, options: ControllerOptions) -> Self {
        let backend: Arc<dyn ExamBackend> =
            Arc::new(InMemoryBackend::with_sample_exam().with_clock(clock));
        info!("exam services ready with the in-memory backend");
        Self::assemble(
            BackendKind::InMemory,
            backend,
            SessionContext::anonymous(),
            clock,
            options,
        )
    }

    /// Build services around any backend, e.g. a scripted test double.
    #[must_use]
    pub fn with_backend(
        backend: Arc<dyn ExamBackend>,
        context: SessionContext,
        clock: Clock,
        options: ControllerOptions,
    ) -> Self {
        Self::assemble(BackendKind::InMemory, backend, context, clock, options)
    }

    fn assemble(
        kind: BackendKind,
        backend: Arc<dyn ExamBackend>,
        context: SessionContext,
        clock: Clock,
        options: ControllerOptions,
    ) -> Self {
        let exams = Arc::new(ExamService::new(clock, backend, context.clone()).with_options(options));
        Self {
            kind,
            context,
            exams,
        }
    }

    #[must_use]
    pub fn backend_kind(&self) -> &BackendKind {
        &self.kind
    }

    #[must_use]
    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    #[must_use]
    pub fn exams(&self) -> Arc<ExamService> {
        Arc::clone(&self.exams)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exam_core::model::{ExamId, ExamMode, SessionState};
    use exam_core::time::fixed_clock;

    #[tokio::test]
    async fn in_memory_services_start_the_sample_exam() {
        let services = AppServices::in_memory(fixed_clock(), ControllerOptions::default());
        assert_eq!(services.backend_kind(), &BackendKind::InMemory);

        let controller = services
            .exams()
            .start_exam(ExamId::new(1), ExamMode::Practice)
            .await
            .unwrap();
        assert_eq!(controller.state(), SessionState::InProgress);
        assert_eq!(controller.paper().unwrap().question_count(), 3);
    }

    #[test]
    fn http_services_carry_the_configured_credential() {
        let config = BackendConfig::new("https://exams.example.com/api")
            .unwrap()
            .with_bearer_token(Some("secret".into()));
        let services =
            AppServices::from_config(config, fixed_clock(), ControllerOptions::default()).unwrap();
        assert!(services.context().is_authenticated());
        assert!(matches!(services.backend_kind(), BackendKind::Http { .. }));
    }
}

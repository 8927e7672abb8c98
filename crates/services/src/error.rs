//! Shared error types for the services crate.

use thiserror::Error;

use backend::{BackendError, ConfigError};
use exam_core::model::{ExamDefinitionError, QuestionId};

/// Errors emitted by the exam session runtime.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExamError {
    #[error("could not load the exam: {0}")]
    LoadFailed(#[source] BackendError),
    #[error("exam has no questions")]
    NoQuestions,
    #[error("exam data is invalid: {0}")]
    InvalidExam(#[source] ExamDefinitionError),
    #[error("exam already started")]
    AlreadyStarted,
    #[error("exam is not in progress")]
    NotInProgress,
    #[error("question index {index} is out of range for {count} questions")]
    InvalidQuestionIndex { index: usize, count: usize },
    #[error("question {0} is not part of this exam")]
    UnknownQuestion(QuestionId),
    #[error("submission failed: {0}")]
    SubmissionFailed(#[source] BackendError),
    #[error("session is no longer authorized")]
    Unauthorized,
}

impl ExamError {
    /// Converts a failed `start_exam` call into the load-failure taxonomy.
    #[must_use]
    pub fn from_load(err: BackendError) -> Self {
        match err {
            BackendError::Unauthorized => ExamError::Unauthorized,
            BackendError::InvalidExam(ExamDefinitionError::NoQuestions) => ExamError::NoQuestions,
            BackendError::InvalidExam(inner) => ExamError::InvalidExam(inner),
            other => ExamError::LoadFailed(other),
        }
    }

    /// Converts a failed `submit_exam` call.
    #[must_use]
    pub fn from_submission(err: BackendError) -> Self {
        if err.is_auth() {
            ExamError::Unauthorized
        } else {
            ExamError::SubmissionFailed(err)
        }
    }

    /// Whether the user can retry the failed action inside the exam flow.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ExamError::LoadFailed(_)
                | ExamError::NoQuestions
                | ExamError::InvalidExam(_)
                | ExamError::SubmissionFailed(_)
        )
    }

    /// Human-readable text for the user-facing error panel.
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            ExamError::LoadFailed(_) => "The exam could not be loaded. Please try again.",
            ExamError::NoQuestions | ExamError::InvalidExam(_) => {
                "This exam is not available right now. Please try again later."
            }
            ExamError::SubmissionFailed(_) => {
                "Your answers could not be submitted. They are kept; please retry."
            }
            ExamError::Unauthorized => "Your session has expired. Please sign in again.",
            ExamError::AlreadyStarted
            | ExamError::NotInProgress
            | ExamError::InvalidQuestionIndex { .. }
            | ExamError::UnknownQuestion(_) => "That action is not available right now.",
        }
    }
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

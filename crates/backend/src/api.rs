use async_trait::async_trait;
use exam_core::model::{
    ExamDefinitionError, ExamId, ExamMode, ExamPaper, OptionKey, QuestionId, SessionId,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures of any backend call, already converted to typed outcomes.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BackendError {
    /// The credential was rejected. Fatal for the attempt.
    #[error("unauthorized")]
    Unauthorized,

    #[error("not found")]
    NotFound,

    #[error("backend rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("could not decode backend response: {0}")]
    Decode(String),

    /// The backend returned exam data that fails validation.
    #[error("invalid exam data: {0}")]
    InvalidExam(#[from] ExamDefinitionError),
}

impl BackendError {
    #[must_use]
    pub fn is_auth(&self) -> bool {
        matches!(self, BackendError::Unauthorized)
    }

    /// Whether repeating the same call may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            BackendError::Network(_) => true,
            BackendError::Rejected { status, .. } => *status >= 500 || *status == 429,
            BackendError::Unauthorized
            | BackendError::NotFound
            | BackendError::Decode(_)
            | BackendError::InvalidExam(_) => false,
        }
    }
}

/// Answer state persisted by an earlier, unfinished visit to the same attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriorAnswer {
    pub question_id: QuestionId,
    pub selected: Option<OptionKey>,
    pub flagged: bool,
    pub time_spent_secs: u64,
}

/// Outcome of `start_exam`: a new or resumed attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartedExam {
    pub session_id: SessionId,
    pub paper: ExamPaper,
    pub prior_answers: Vec<PriorAnswer>,
    /// Time left on a resumed attempt. `None` starts the full duration.
    pub remaining_secs: Option<u64>,
}

/// Full current state of one question, sent as a background upsert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerSync {
    #[serde(skip)]
    pub session_id: SessionId,
    pub question_id: QuestionId,
    pub selected_option_key: Option<OptionKey>,
    pub time_spent_seconds: u64,
    pub is_flagged: bool,
}

/// One entry of the final submission payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmittedAnswer {
    pub question_id: QuestionId,
    pub selected_option_key: Option<OptionKey>,
    pub time_spent_seconds: u64,
    pub is_flagged: bool,
}

/// Graded result returned by the backend for a submitted attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamResult {
    pub score: f64,
    pub correct_count: u32,
    pub total: u32,
    pub passed: bool,
}

impl ExamResult {
    /// Share of correct answers in percent, `0.0` for an empty exam.
    #[must_use]
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        f64::from(self.correct_count) * 100.0 / f64::from(self.total)
    }
}

/// The remote collaborator that owns scoring, persistence and question banks.
///
/// Implementations must convert every failure into a `BackendError`; nothing
/// may panic or leak transport errors.
#[async_trait]
pub trait ExamBackend: Send + Sync {
    /// Begins or resumes an attempt.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` when the request fails or the exam data is invalid.
    async fn start_exam(&self, exam_id: ExamId, mode: ExamMode)
    -> Result<StartedExam, BackendError>;

    /// Upserts the current state of one question. Idempotent per question.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` when the request fails.
    async fn submit_answer(&self, sync: &AnswerSync) -> Result<(), BackendError>;

    /// Submits the final answer set, covering every question in exam order.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` when the submission is rejected or fails.
    async fn submit_exam(
        &self,
        session_id: &SessionId,
        answers: &[SubmittedAnswer],
    ) -> Result<ExamResult, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_are_retryable_client_errors_are_not() {
        let server = BackendError::Rejected {
            status: 503,
            message: "busy".into(),
        };
        let client = BackendError::Rejected {
            status: 422,
            message: "bad key".into(),
        };
        assert!(server.is_retryable());
        assert!(!client.is_retryable());
        assert!(BackendError::Network("reset".into()).is_retryable());
        assert!(!BackendError::Unauthorized.is_retryable());
        assert!(BackendError::Unauthorized.is_auth());
    }

    #[test]
    fn percentage_handles_empty_result() {
        let result = ExamResult {
            score: 0.0,
            correct_count: 0,
            total: 0,
            passed: false,
        };
        assert!(result.percentage().abs() < f64::EPSILON);

        let result = ExamResult {
            score: 2.0,
            correct_count: 1,
            total: 4,
            passed: false,
        };
        assert!((result.percentage() - 25.0).abs() < f64::EPSILON);
    }
}

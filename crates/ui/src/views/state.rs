use services::ExamError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewError {
    Unknown,
    LoadFailed,
    ExamUnavailable,
    SubmissionFailed,
    SessionExpired,
    /// The action does not apply in the current state.
    Unavailable,
}

impl ViewError {
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            ViewError::Unknown => "Something went wrong. Please try again.",
            ViewError::LoadFailed => "The exam could not be loaded. Please try again.",
            ViewError::ExamUnavailable => {
                "This exam is not available right now. Please try again later."
            }
            ViewError::SubmissionFailed => {
                "Your answers could not be submitted. They are kept; please retry."
            }
            ViewError::SessionExpired => "Your session has expired. Please sign in again.",
            ViewError::Unavailable => "That action is not available right now.",
        }
    }

    #[must_use]
    pub fn is_retryable(self) -> bool {
        !matches!(self, ViewError::SessionExpired)
    }
}

impl From<&ExamError> for ViewError {
    fn from(err: &ExamError) -> Self {
        match err {
            ExamError::LoadFailed(_) => ViewError::LoadFailed,
            ExamError::NoQuestions | ExamError::InvalidExam(_) => ViewError::ExamUnavailable,
            ExamError::SubmissionFailed(_) => ViewError::SubmissionFailed,
            ExamError::Unauthorized => ViewError::SessionExpired,
            ExamError::AlreadyStarted
            | ExamError::NotInProgress
            | ExamError::InvalidQuestionIndex { .. }
            | ExamError::UnknownQuestion(_) => ViewError::Unavailable,
            _ => ViewError::Unknown,
        }
    }
}

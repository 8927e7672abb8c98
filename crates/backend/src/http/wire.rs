//! JSON shapes exchanged with the exam backend.

use serde::{Deserialize, Serialize};

use crate::api::SubmittedAnswer;

#[derive(Debug, Serialize)]
pub(crate) struct StartExamRequest<'a> {
    pub mode: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StartExamResponse {
    pub session_id: String,
    pub exam: ExamWire,
    pub questions: Vec<QuestionWire>,
    #[serde(default)]
    pub prior_answers: Vec<PriorAnswerWire>,
    #[serde(default)]
    pub remaining_seconds: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ExamWire {
    pub id: u64,
    pub title: String,
    pub duration_minutes: u32,
    pub total_questions: u32,
    #[serde(default)]
    pub passing_score: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QuestionWire {
    pub id: u64,
    pub text: String,
    pub options: Vec<OptionWire>,
    #[serde(default)]
    pub correct_option: Option<String>,
    #[serde(default)]
    pub explanation: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OptionWire {
    pub id: u64,
    pub key: String,
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PriorAnswerWire {
    pub question_id: u64,
    #[serde(default)]
    pub selected_option_key: Option<String>,
    #[serde(default)]
    pub is_flagged: bool,
    #[serde(default)]
    pub time_spent_seconds: u64,
}

#[derive(Debug, Serialize)]
pub(crate) struct SubmitExamRequest<'a> {
    pub answers: &'a [SubmittedAnswer],
}

/// Error body; the backend uses either `error` or `message`.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    pub fn into_message(self) -> Option<String> {
        self.error.or(self.message)
    }
}

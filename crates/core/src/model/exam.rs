use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{ExamId, OptionId, OptionKey, QuestionId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ExamDefinitionError {
    #[error("exam title cannot be empty")]
    EmptyTitle,

    #[error("exam duration must be at least one minute")]
    InvalidDuration,

    #[error("passing threshold must be between 0 and 100, got {0}")]
    InvalidPassingThreshold(u32),

    #[error("exam has no questions")]
    NoQuestions,

    #[error("question {0} appears more than once")]
    DuplicateQuestion(QuestionId),

    #[error("question {0} has no options")]
    NoOptions(QuestionId),
}

//
// ─── EXAM ──────────────────────────────────────────────────────────────────────
//

/// Whether the attempt is graded (`Exam`) or a practice run that ships the
/// correct keys and explanations with each question.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExamMode {
    #[default]
    Exam,
    Practice,
}

impl ExamMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ExamMode::Exam => "exam",
            ExamMode::Practice => "practice",
        }
    }
}

/// Immutable exam metadata, read-only for the lifetime of an attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamDefinition {
    id: ExamId,
    title: String,
    duration_minutes: u32,
    total_questions: u32,
    passing_threshold: u32,
}

impl ExamDefinition {
    /// Creates a validated exam definition.
    ///
    /// `passing_threshold` is a percentage in `0..=100`.
    ///
    /// # Errors
    ///
    /// Returns `ExamDefinitionError` for an empty title, a zero duration or an
    /// out-of-range threshold.
    pub fn new(
        id: ExamId,
        title: impl Into<String>,
        duration_minutes: u32,
        total_questions: u32,
        passing_threshold: u32,
    ) -> Result<Self, ExamDefinitionError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(ExamDefinitionError::EmptyTitle);
        }
        if duration_minutes == 0 {
            return Err(ExamDefinitionError::InvalidDuration);
        }
        if passing_threshold > 100 {
            return Err(ExamDefinitionError::InvalidPassingThreshold(passing_threshold));
        }

        Ok(Self {
            id,
            title,
            duration_minutes,
            total_questions,
            passing_threshold,
        })
    }

    #[must_use]
    pub fn id(&self) -> ExamId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn duration_minutes(&self) -> u32 {
        self.duration_minutes
    }

    #[must_use]
    pub fn duration_secs(&self) -> u64 {
        u64::from(self.duration_minutes) * 60
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn passing_threshold(&self) -> u32 {
        self.passing_threshold
    }
}

//
// ─── QUESTIONS ─────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOption {
    pub id: OptionId,
    pub key: OptionKey,
    pub text: String,
}

/// One question of a loaded exam. Immutable after load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionEntry {
    pub id: QuestionId,
    pub text: String,
    pub options: Vec<AnswerOption>,
    /// Present only in practice mode.
    pub correct_key: Option<OptionKey>,
    pub explanation: Option<String>,
}

impl QuestionEntry {
    #[must_use]
    pub fn option(&self, key: &OptionKey) -> Option<&AnswerOption> {
        self.options.iter().find(|option| &option.key == key)
    }

    /// Whether `key` is the correct answer. `None` when the key is not known,
    /// which is always the case outside practice mode.
    #[must_use]
    pub fn is_correct(&self, key: &OptionKey) -> Option<bool> {
        self.correct_key.as_ref().map(|correct| correct == key)
    }
}

//
// ─── PAPER ─────────────────────────────────────────────────────────────────────
//

/// A definition plus its ordered question list, validated as a unit.
///
/// The question order is the order the backend returned and the order every
/// submission payload follows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamPaper {
    definition: ExamDefinition,
    mode: ExamMode,
    questions: Vec<QuestionEntry>,
}

impl ExamPaper {
    /// # Errors
    ///
    /// Returns `ExamDefinitionError::NoQuestions` for an empty list,
    /// `DuplicateQuestion` for repeated ids and `NoOptions` for a question
    /// without choices.
    ///
    /// The served list is authoritative: it may hold fewer or more questions
    /// than the definition declares.
    pub fn new(
        definition: ExamDefinition,
        mode: ExamMode,
        questions: Vec<QuestionEntry>,
    ) -> Result<Self, ExamDefinitionError> {
        if questions.is_empty() {
            return Err(ExamDefinitionError::NoQuestions);
        }
        let mut seen = HashSet::with_capacity(questions.len());
        for question in &questions {
            if !seen.insert(question.id) {
                return Err(ExamDefinitionError::DuplicateQuestion(question.id));
            }
            if question.options.is_empty() {
                return Err(ExamDefinitionError::NoOptions(question.id));
            }
        }

        Ok(Self {
            definition,
            mode,
            questions,
        })
    }

    #[must_use]
    pub fn definition(&self) -> &ExamDefinition {
        &self.definition
    }

    #[must_use]
    pub fn mode(&self) -> ExamMode {
        self.mode
    }

    #[must_use]
    pub fn questions(&self) -> &[QuestionEntry] {
        &self.questions
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn question_at(&self, index: usize) -> Option<&QuestionEntry> {
        self.questions.get(index)
    }

    #[must_use]
    pub fn question(&self, id: QuestionId) -> Option<&QuestionEntry> {
        self.questions.iter().find(|question| question.id == id)
    }

    #[must_use]
    pub fn index_of(&self, id: QuestionId) -> Option<usize> {
        self.questions.iter().position(|question| question.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(id: u64) -> QuestionEntry {
        QuestionEntry {
            id: QuestionId::new(id),
            text: format!("Question {id}"),
            options: ["A", "B", "C"]
                .iter()
                .enumerate()
                .map(|(idx, key)| AnswerOption {
                    id: OptionId::new(id * 10 + idx as u64),
                    key: OptionKey::from(*key),
                    text: format!("Option {key}"),
                })
                .collect(),
            correct_key: Some(OptionKey::from("B")),
            explanation: None,
        }
    }

    fn definition(total: u32) -> ExamDefinition {
        ExamDefinition::new(ExamId::new(1), "Physics", 10, total, 60).unwrap()
    }

    #[test]
    fn definition_rejects_zero_duration() {
        let err = ExamDefinition::new(ExamId::new(1), "Physics", 0, 3, 60).unwrap_err();
        assert_eq!(err, ExamDefinitionError::InvalidDuration);
    }

    #[test]
    fn definition_rejects_threshold_over_100() {
        let err = ExamDefinition::new(ExamId::new(1), "Physics", 10, 3, 101).unwrap_err();
        assert_eq!(err, ExamDefinitionError::InvalidPassingThreshold(101));
    }

    #[test]
    fn paper_without_questions_is_rejected() {
        let err = ExamPaper::new(definition(0), ExamMode::Exam, Vec::new()).unwrap_err();
        assert_eq!(err, ExamDefinitionError::NoQuestions);
    }

    #[test]
    fn paper_rejects_duplicate_questions() {
        let err = ExamPaper::new(
            definition(2),
            ExamMode::Exam,
            vec![question(1), question(1)],
        )
        .unwrap_err();
        assert_eq!(err, ExamDefinitionError::DuplicateQuestion(QuestionId::new(1)));
    }

    #[test]
    fn paper_follows_the_served_list_over_the_declared_total() {
        let paper = ExamPaper::new(definition(3), ExamMode::Exam, vec![question(1)]).unwrap();
        assert_eq!(paper.definition().total_questions(), 3);
        assert_eq!(paper.question_count(), 1);
        assert_eq!(paper.index_of(QuestionId::new(1)), Some(0));
    }

    #[test]
    fn paper_keeps_question_order() {
        let paper = ExamPaper::new(
            definition(3),
            ExamMode::Practice,
            vec![question(30), question(10), question(20)],
        )
        .unwrap();
        assert_eq!(paper.index_of(QuestionId::new(10)), Some(1));
        assert_eq!(paper.question_at(0).map(|q| q.id), Some(QuestionId::new(30)));
        assert_eq!(paper.definition().duration_secs(), 600);
    }

    #[test]
    fn practice_question_reports_correctness() {
        let q = question(1);
        assert_eq!(q.is_correct(&OptionKey::from("B")), Some(true));
        assert_eq!(q.is_correct(&OptionKey::from("A")), Some(false));
        let mut hidden = q.clone();
        hidden.correct_key = None;
        assert_eq!(hidden.is_correct(&OptionKey::from("B")), None);
    }
}

use exam_core::model::{
    AnswerOption, ExamDefinition, ExamId, ExamMode, ExamPaper, OptionId, OptionKey,
    QuestionEntry, QuestionId, SessionId,
};

use super::wire::{PriorAnswerWire, QuestionWire, StartExamResponse};
use crate::api::{BackendError, PriorAnswer, StartedExam};

/// Converts a start response into a validated attempt.
///
/// # Errors
///
/// Returns `BackendError::InvalidExam` when the exam or its questions fail
/// validation, and `BackendError::Decode` for an empty session id.
pub(crate) fn started_exam_from_wire(
    response: StartExamResponse,
    mode: ExamMode,
) -> Result<StartedExam, BackendError> {
    if response.session_id.trim().is_empty() {
        return Err(BackendError::Decode("empty session id".into()));
    }

    let exam = response.exam;
    let definition = ExamDefinition::new(
        ExamId::new(exam.id),
        exam.title,
        exam.duration_minutes,
        exam.total_questions,
        exam.passing_score,
    )?;
    let questions = response
        .questions
        .into_iter()
        .map(|question| question_from_wire(question, mode))
        .collect();
    let paper = ExamPaper::new(definition, mode, questions)?;
    let prior_answers = response
        .prior_answers
        .into_iter()
        .map(prior_answer_from_wire)
        .collect();

    Ok(StartedExam {
        session_id: SessionId::new(response.session_id),
        paper,
        prior_answers,
        remaining_secs: response.remaining_seconds,
    })
}

fn question_from_wire(question: QuestionWire, mode: ExamMode) -> QuestionEntry {
    // Graded attempts never expose the key, even if the backend leaks it.
    let correct_key = match mode {
        ExamMode::Practice => question.correct_option.map(OptionKey::new),
        ExamMode::Exam => None,
    };
    QuestionEntry {
        id: QuestionId::new(question.id),
        text: question.text,
        options: question
            .options
            .into_iter()
            .map(|option| AnswerOption {
                id: OptionId::new(option.id),
                key: OptionKey::new(option.key),
                text: option.text,
            })
            .collect(),
        correct_key,
        explanation: question.explanation.filter(|text| !text.trim().is_empty()),
    }
}

fn prior_answer_from_wire(prior: PriorAnswerWire) -> PriorAnswer {
    PriorAnswer {
        question_id: QuestionId::new(prior.question_id),
        selected: prior.selected_option_key.map(OptionKey::new),
        flagged: prior.is_flagged,
        time_spent_secs: prior.time_spent_seconds,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exam_core::model::ExamDefinitionError;

    fn response(json: &str) -> StartExamResponse {
        serde_json::from_str(json).unwrap()
    }

    const BODY: &str = r#"{
        "session_id": "s-1",
        "exam": { "id": 7, "title": "Biology", "duration_minutes": 10, "total_questions": 2, "passing_score": 50 },
        "questions": [
            { "id": 1, "text": "Cell?", "options": [{ "id": 11, "key": "A", "text": "x" }], "correct_option": "A", "explanation": "because" },
            { "id": 2, "text": "DNA?", "options": [{ "id": 21, "key": "B", "text": "y" }] }
        ],
        "prior_answers": [ { "question_id": 2, "selected_option_key": "B", "is_flagged": true, "time_spent_seconds": 30 } ],
        "remaining_seconds": 420
    }"#;

    #[test]
    fn maps_practice_response() {
        let started = started_exam_from_wire(response(BODY), ExamMode::Practice).unwrap();
        assert_eq!(started.session_id.as_str(), "s-1");
        assert_eq!(started.paper.question_count(), 2);
        let first = started.paper.question_at(0).unwrap();
        assert_eq!(first.correct_key, Some(OptionKey::from("A")));
        assert_eq!(first.explanation.as_deref(), Some("because"));
        assert_eq!(started.remaining_secs, Some(420));
        assert_eq!(
            started.prior_answers,
            vec![PriorAnswer {
                question_id: QuestionId::new(2),
                selected: Some(OptionKey::from("B")),
                flagged: true,
                time_spent_secs: 30,
            }]
        );
    }

    #[test]
    fn exam_mode_strips_correct_keys() {
        let started = started_exam_from_wire(response(BODY), ExamMode::Exam).unwrap();
        assert!(started.paper.questions().iter().all(|q| q.correct_key.is_none()));
    }

    #[test]
    fn zero_questions_is_invalid_exam() {
        let body = r#"{
            "session_id": "s-2",
            "exam": { "id": 7, "title": "Empty", "duration_minutes": 10, "total_questions": 0 },
            "questions": []
        }"#;
        let err = started_exam_from_wire(response(body), ExamMode::Exam).unwrap_err();
        assert!(matches!(
            err,
            BackendError::InvalidExam(ExamDefinitionError::NoQuestions)
        ));
    }
}

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use exam_core::Clock;
use exam_core::model::{
    AnswerOption, ExamDefinition, ExamId, ExamMode, ExamPaper, OptionId, OptionKey,
    QuestionEntry, QuestionId, SessionId,
};
use exam_core::time::elapsed_ms;

use crate::api::{
    AnswerSync, BackendError, ExamBackend, ExamResult, PriorAnswer, StartedExam, SubmittedAnswer,
};

/// Failure the in-memory backend can be told to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptedFailure {
    Network,
    Unauthorized,
    Rejected(u16),
}

impl ScriptedFailure {
    fn into_error(self) -> BackendError {
        match self {
            ScriptedFailure::Network => BackendError::Network("scripted network failure".into()),
            ScriptedFailure::Unauthorized => BackendError::Unauthorized,
            ScriptedFailure::Rejected(status) => BackendError::Rejected {
                status,
                message: "scripted rejection".into(),
            },
        }
    }
}

#[derive(Debug, Clone)]
struct StoredExam {
    definition: ExamDefinition,
    questions: Vec<QuestionEntry>,
}

#[derive(Debug, Clone)]
struct StoredSession {
    exam_id: ExamId,
    started_at: DateTime<Utc>,
    answers: HashMap<QuestionId, AnswerSync>,
    result: Option<ExamResult>,
}

#[derive(Debug, Default)]
struct MemoryState {
    clock: Clock,
    exams: HashMap<ExamId, StoredExam>,
    sessions: HashMap<SessionId, StoredSession>,
    start_calls: Vec<(ExamId, ExamMode)>,
    sync_calls: Vec<AnswerSync>,
    submit_calls: Vec<(SessionId, Vec<SubmittedAnswer>)>,
    start_failures: VecDeque<ScriptedFailure>,
    submit_failures: VecDeque<ScriptedFailure>,
    sync_failure: Option<ScriptedFailure>,
}

/// Mock-data backed `ExamBackend` for the offline exam flow and for tests.
///
/// Scores submissions against the stored correct keys, resumes unsubmitted
/// attempts with the time they have left, records every call and can be
/// scripted to fail.
#[derive(Clone, Default)]
pub struct InMemoryBackend {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend preloaded with `sample_exam()`.
    #[must_use]
    pub fn with_sample_exam() -> Self {
        let backend = Self::new();
        let (definition, questions) = sample_exam();
        backend.insert_exam(definition, questions);
        backend
    }

    /// Clock that stamps session starts and measures the time left on resume.
    #[must_use]
    pub fn with_clock(self, clock: Clock) -> Self {
        self.lock_or_recover().clock = clock;
        self
    }

    /// Moves a fixed backend clock forward.
    pub fn advance_clock(&self, delta: Duration) {
        self.lock_or_recover().clock.advance(delta);
    }

    /// Registers an exam. Questions should carry their correct keys; they are
    /// only handed out in practice mode.
    pub fn insert_exam(&self, definition: ExamDefinition, questions: Vec<QuestionEntry>) {
        let mut state = self.lock_or_recover();
        state.exams.insert(
            definition.id(),
            StoredExam {
                definition,
                questions,
            },
        );
    }

    /// Makes the next `times` calls to `start_exam` fail.
    pub fn fail_start(&self, times: usize, failure: ScriptedFailure) {
        let mut state = self.lock_or_recover();
        state.start_failures.extend(std::iter::repeat_n(failure, times));
    }

    /// Makes the next `times` calls to `submit_exam` fail.
    pub fn fail_submit(&self, times: usize, failure: ScriptedFailure) {
        let mut state = self.lock_or_recover();
        state.submit_failures.extend(std::iter::repeat_n(failure, times));
    }

    /// Makes every `submit_answer` call fail until reset with `None`.
    pub fn fail_sync(&self, failure: Option<ScriptedFailure>) {
        self.lock_or_recover().sync_failure = failure;
    }

    #[must_use]
    pub fn start_calls(&self) -> Vec<(ExamId, ExamMode)> {
        self.lock_or_recover().start_calls.clone()
    }

    #[must_use]
    pub fn sync_calls(&self) -> Vec<AnswerSync> {
        self.lock_or_recover().sync_calls.clone()
    }

    #[must_use]
    pub fn submit_calls(&self) -> Vec<(SessionId, Vec<SubmittedAnswer>)> {
        self.lock_or_recover().submit_calls.clone()
    }

    /// Last upserted state per question for `session_id`.
    #[must_use]
    pub fn stored_answer(&self, session_id: &SessionId, question: QuestionId) -> Option<AnswerSync> {
        let state = self.lock_or_recover();
        state
            .sessions
            .get(session_id)
            .and_then(|session| session.answers.get(&question).cloned())
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, BackendError> {
        self.state
            .lock()
            .map_err(|e| BackendError::Network(e.to_string()))
    }

    fn lock_or_recover(&self) -> MutexGuard<'_, MemoryState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl ExamBackend for InMemoryBackend {
    async fn start_exam(
        &self,
        exam_id: ExamId,
        mode: ExamMode,
    ) -> Result<StartedExam, BackendError> {
        let mut state = self.lock()?;
        state.start_calls.push((exam_id, mode));
        if let Some(failure) = state.start_failures.pop_front() {
            return Err(failure.into_error());
        }

        let stored = state.exams.get(&exam_id).cloned().ok_or(BackendError::NotFound)?;
        let questions = stored
            .questions
            .into_iter()
            .map(|mut question| {
                if mode == ExamMode::Exam {
                    question.correct_key = None;
                    question.explanation = None;
                }
                question
            })
            .collect();
        let paper = ExamPaper::new(stored.definition, mode, questions)?;

        let now = state.clock.now();
        let open = state
            .sessions
            .iter()
            .find(|(_, session)| session.exam_id == exam_id && session.result.is_none())
            .map(|(id, session)| (id.clone(), session.started_at, session.answers.clone()));

        let (session_id, prior_answers, remaining_secs) = match open {
            Some((session_id, started_at, answers)) => {
                let prior = paper
                    .questions()
                    .iter()
                    .filter_map(|question| answers.get(&question.id))
                    .map(|sync| PriorAnswer {
                        question_id: sync.question_id,
                        selected: sync.selected_option_key.clone(),
                        flagged: sync.is_flagged,
                        time_spent_secs: sync.time_spent_seconds,
                    })
                    .collect();
                let total_secs = u64::from(paper.definition().duration_minutes()) * 60;
                let remaining = total_secs.saturating_sub(elapsed_ms(started_at, now) / 1000);
                (session_id, prior, Some(remaining))
            }
            None => {
                let session_id = SessionId::new(uuid::Uuid::new_v4().to_string());
                state.sessions.insert(
                    session_id.clone(),
                    StoredSession {
                        exam_id,
                        started_at: now,
                        answers: HashMap::new(),
                        result: None,
                    },
                );
                (session_id, Vec::new(), None)
            }
        };

        Ok(StartedExam {
            session_id,
            paper,
            prior_answers,
            remaining_secs,
        })
    }

    async fn submit_answer(&self, sync: &AnswerSync) -> Result<(), BackendError> {
        let mut state = self.lock()?;
        state.sync_calls.push(sync.clone());
        if let Some(failure) = state.sync_failure {
            return Err(failure.into_error());
        }

        let session = state
            .sessions
            .get_mut(&sync.session_id)
            .ok_or(BackendError::NotFound)?;
        if session.result.is_some() {
            return Err(BackendError::Rejected {
                status: 409,
                message: "attempt already submitted".into(),
            });
        }
        session.answers.insert(sync.question_id, sync.clone());
        Ok(())
    }

    async fn submit_exam(
        &self,
        session_id: &SessionId,
        answers: &[SubmittedAnswer],
    ) -> Result<ExamResult, BackendError> {
        let mut state = self.lock()?;
        state
            .submit_calls
            .push((session_id.clone(), answers.to_vec()));
        if let Some(failure) = state.submit_failures.pop_front() {
            return Err(failure.into_error());
        }

        let session = state
            .sessions
            .get(session_id)
            .cloned()
            .ok_or(BackendError::NotFound)?;
        if session.result.is_some() {
            return Err(BackendError::Rejected {
                status: 409,
                message: "attempt already submitted".into(),
            });
        }
        let exam = state
            .exams
            .get(&session.exam_id)
            .cloned()
            .ok_or(BackendError::NotFound)?;

        let in_order = answers.len() == exam.questions.len()
            && answers
                .iter()
                .zip(&exam.questions)
                .all(|(answer, question)| answer.question_id == question.id);
        if !in_order {
            return Err(BackendError::Rejected {
                status: 422,
                message: "answers must cover every question in exam order".into(),
            });
        }

        let result = grade(&exam, answers);
        if let Some(stored) = state.sessions.get_mut(session_id) {
            stored.result = Some(result.clone());
        }
        Ok(result)
    }
}

fn grade(exam: &StoredExam, answers: &[SubmittedAnswer]) -> ExamResult {
    let correct_count = answers
        .iter()
        .zip(&exam.questions)
        .filter(|(answer, question)| {
            matches!(
                (&answer.selected_option_key, &question.correct_key),
                (Some(selected), Some(correct)) if selected == correct
            )
        })
        .count();
    let correct_count = u32::try_from(correct_count).unwrap_or(u32::MAX);
    let total = u32::try_from(exam.questions.len()).unwrap_or(u32::MAX);
    let score = if total == 0 {
        0.0
    } else {
        f64::from(correct_count) * 100.0 / f64::from(total)
    };

    ExamResult {
        score,
        correct_count,
        total,
        passed: score >= f64::from(exam.definition.passing_threshold()),
    }
}

/// Small three-question exam used by the offline flow.
///
/// # Panics
///
/// Panics only if the hard-coded definition is invalid.
#[must_use]
pub fn sample_exam() -> (ExamDefinition, Vec<QuestionEntry>) {
    let definition = ExamDefinition::new(ExamId::new(1), "General Science Practice", 10, 3, 60)
        .expect("sample exam definition is valid");

    let question = |id: u64, text: &str, options: [&str; 4], correct: &str, why: &str| {
        QuestionEntry {
            id: QuestionId::new(id),
            text: text.to_string(),
            options: ["A", "B", "C", "D"]
                .into_iter()
                .zip(options)
                .enumerate()
                .map(|(idx, (key, text))| AnswerOption {
                    id: OptionId::new(id * 10 + idx as u64),
                    key: OptionKey::from(key),
                    text: text.to_string(),
                })
                .collect(),
            correct_key: Some(OptionKey::from(correct)),
            explanation: Some(why.to_string()),
        }
    };

    let questions = vec![
        question(
            1,
            "Which gas do plants absorb during **photosynthesis**?",
            ["Oxygen", "Carbon dioxide", "Nitrogen", "Helium"],
            "B",
            "Plants take in carbon dioxide and release oxygen.",
        ),
        question(
            2,
            "What is the SI unit of force?",
            ["Joule", "Watt", "Newton", "Pascal"],
            "C",
            "One newton accelerates one kilogram at one metre per second squared.",
        ),
        question(
            3,
            "Which organelle is known as the powerhouse of the cell?",
            ["Nucleus", "Ribosome", "Golgi body", "Mitochondrion"],
            "D",
            "Mitochondria produce most of the cell's ATP.",
        ),
    ];

    (definition, questions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use exam_core::time::fixed_now;

    fn full_payload(keys: [Option<&str>; 3]) -> Vec<SubmittedAnswer> {
        keys.iter()
            .enumerate()
            .map(|(idx, key)| SubmittedAnswer {
                question_id: QuestionId::new(idx as u64 + 1),
                selected_option_key: key.map(OptionKey::from),
                time_spent_seconds: 0,
                is_flagged: false,
            })
            .collect()
    }

    #[tokio::test]
    async fn exam_mode_hides_answer_keys() {
        let backend = InMemoryBackend::with_sample_exam();
        let started = backend.start_exam(ExamId::new(1), ExamMode::Exam).await.unwrap();
        assert!(started.paper.questions().iter().all(|q| q.correct_key.is_none()));

        let practice = InMemoryBackend::with_sample_exam();
        let started = practice
            .start_exam(ExamId::new(1), ExamMode::Practice)
            .await
            .unwrap();
        assert!(started.paper.questions().iter().all(|q| q.correct_key.is_some()));
    }

    #[tokio::test]
    async fn unknown_exam_is_not_found() {
        let backend = InMemoryBackend::new();
        let err = backend
            .start_exam(ExamId::new(9), ExamMode::Exam)
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::NotFound));
    }

    #[tokio::test]
    async fn grades_and_rejects_second_submission() {
        let backend = InMemoryBackend::with_sample_exam();
        let started = backend.start_exam(ExamId::new(1), ExamMode::Exam).await.unwrap();

        let result = backend
            .submit_exam(&started.session_id, &full_payload([Some("B"), Some("C"), None]))
            .await
            .unwrap();
        assert_eq!(result.correct_count, 2);
        assert_eq!(result.total, 3);
        assert!(result.passed);

        let err = backend
            .submit_exam(&started.session_id, &full_payload([None, None, None]))
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Rejected { status: 409, .. }));
    }

    #[tokio::test]
    async fn incomplete_payload_is_rejected() {
        let backend = InMemoryBackend::with_sample_exam();
        let started = backend.start_exam(ExamId::new(1), ExamMode::Exam).await.unwrap();
        let mut payload = full_payload([None, None, None]);
        payload.pop();
        let err = backend
            .submit_exam(&started.session_id, &payload)
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Rejected { status: 422, .. }));
    }

    #[tokio::test]
    async fn open_attempt_is_resumed_with_prior_answers() {
        let backend = InMemoryBackend::with_sample_exam();
        let first = backend.start_exam(ExamId::new(1), ExamMode::Exam).await.unwrap();
        backend
            .submit_answer(&AnswerSync {
                session_id: first.session_id.clone(),
                question_id: QuestionId::new(2),
                selected_option_key: Some(OptionKey::from("A")),
                time_spent_seconds: 12,
                is_flagged: true,
            })
            .await
            .unwrap();

        let resumed = backend.start_exam(ExamId::new(1), ExamMode::Exam).await.unwrap();
        assert_eq!(resumed.session_id, first.session_id);
        assert_eq!(resumed.prior_answers.len(), 1);
        assert_eq!(resumed.prior_answers[0].time_spent_secs, 12);
        assert!(resumed.prior_answers[0].flagged);
    }

    #[tokio::test]
    async fn resumed_attempt_reports_the_time_left() {
        let backend = InMemoryBackend::with_sample_exam().with_clock(Clock::fixed(fixed_now()));
        let first = backend.start_exam(ExamId::new(1), ExamMode::Exam).await.unwrap();
        assert_eq!(first.remaining_secs, None);

        backend.advance_clock(Duration::milliseconds(90_500));
        let resumed = backend.start_exam(ExamId::new(1), ExamMode::Exam).await.unwrap();
        assert_eq!(resumed.session_id, first.session_id);
        assert_eq!(resumed.remaining_secs, Some(510));

        backend.advance_clock(Duration::minutes(20));
        let late = backend.start_exam(ExamId::new(1), ExamMode::Exam).await.unwrap();
        assert_eq!(late.remaining_secs, Some(0));
    }

    #[tokio::test]
    async fn scripted_failures_are_consumed_in_order() {
        let backend = InMemoryBackend::with_sample_exam();
        backend.fail_start(1, ScriptedFailure::Network);
        let err = backend
            .start_exam(ExamId::new(1), ExamMode::Exam)
            .await
            .unwrap_err();
        assert!(err.is_retryable());
        assert!(backend.start_exam(ExamId::new(1), ExamMode::Exam).await.is_ok());
        assert_eq!(backend.start_calls().len(), 2);
    }
}

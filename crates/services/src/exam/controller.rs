use std::fmt;
use std::sync::Arc;

use backend::{
    AnswerSync, BackendError, ExamBackend, ExamResult, SessionContext, StartedExam,
    SubmittedAnswer,
};
use chrono::Duration;
use exam_core::Clock;
use exam_core::model::{
    AnswerEntry, AnswerLedger, CountdownTimer, DEFAULT_LOW_TIME_PERCENT, ExamId, ExamMode,
    ExamPaper, LedgerSnapshot, OptionKey, QuestionEntry, QuestionId, SessionId, SessionState,
    TimeAccountant, TimeSpentLedger, TimerEvent, TimerStrategy,
};
use tracing::{debug, error, info, warn};

use super::payload::reconcile;
use super::progress::ExamProgress;
use super::sync::{BackgroundSync, SyncReport};
use crate::error::ExamError;

//
// ─── OPTIONS & OUTCOMES ────────────────────────────────────────────────────────
//

/// Sync reports kept for the caller between drains.
pub const MAX_BUFFERED_SYNC_REPORTS: usize = 128;

/// Tuning knobs for one controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerOptions {
    pub timer_strategy: TimerStrategy,
    /// Remaining share of the duration, in percent, that counts as low time.
    pub low_time_percent: u8,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            timer_strategy: TimerStrategy::default(),
            low_time_percent: DEFAULT_LOW_TIME_PERCENT,
        }
    }
}

/// What started a submission attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitTrigger {
    User,
    TimerExpired,
    Retry,
}

/// Visible failure of the current attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionFailure {
    pub message: String,
    pub detail: String,
    /// False once the session is no longer authorized.
    pub retryable: bool,
}

impl SessionFailure {
    fn from_error(err: &ExamError) -> Self {
        Self {
            message: err.user_message().to_owned(),
            detail: err.to_string(),
            retryable: err.is_retryable(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Completed(ExamResult),
    /// A submission is already outstanding; nothing was sent.
    AlreadyInFlight,
    /// The attempt was already graded; nothing was sent.
    AlreadyCompleted,
}

#[derive(Debug)]
pub enum TickOutcome {
    Inert,
    Ticked {
        remaining_secs: u64,
        entered_low_time: bool,
    },
    /// The countdown hit zero and the attempt was submitted.
    Expired(Result<SubmitOutcome, ExamError>),
}

/// A reconciled submission waiting to be sent.
///
/// Produced by [`ExamSessionController::prepare_submission`]; the controller is
/// already `Submitting` while this exists, so the call can run without holding
/// the controller.
pub struct PendingSubmission {
    backend: Arc<dyn ExamBackend>,
    session_id: SessionId,
    answers: Vec<SubmittedAnswer>,
    trigger: SubmitTrigger,
}

impl PendingSubmission {
    #[must_use]
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    #[must_use]
    pub fn answers(&self) -> &[SubmittedAnswer] {
        &self.answers
    }

    #[must_use]
    pub fn trigger(&self) -> SubmitTrigger {
        self.trigger
    }

    /// Issues the single `submit_exam` call.
    ///
    /// # Errors
    ///
    /// Returns the backend failure unchanged; hand it to
    /// [`ExamSessionController::complete_submission`].
    pub async fn send(self) -> Result<ExamResult, BackendError> {
        self.backend
            .submit_exam(&self.session_id, &self.answers)
            .await
    }
}

impl fmt::Debug for PendingSubmission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingSubmission")
            .field("session_id", &self.session_id)
            .field("answers", &self.answers.len())
            .field("trigger", &self.trigger)
            .finish_non_exhaustive()
    }
}

//
// ─── CONTROLLER ────────────────────────────────────────────────────────────────
//

struct ActiveAttempt {
    session_id: SessionId,
    paper: ExamPaper,
    ledger: AnswerLedger,
    time: TimeAccountant,
    timer: CountdownTimer,
    current: usize,
}

/// Runtime of one exam attempt.
///
/// Owns the answer ledger, the time accountant, the countdown and the current
/// question index. Every mutation is synchronous; backend upserts run in the
/// background and the final submission goes out at most once while it is
/// outstanding or after it succeeded.
pub struct ExamSessionController {
    backend: Arc<dyn ExamBackend>,
    context: SessionContext,
    exam_id: ExamId,
    mode: ExamMode,
    clock: Clock,
    options: ControllerOptions,
    state: SessionState,
    attempt: Option<ActiveAttempt>,
    sync: BackgroundSync,
    sync_reports: Vec<SyncReport>,
    payload: Option<Vec<SubmittedAnswer>>,
    result: Option<ExamResult>,
    failure: Option<SessionFailure>,
}

impl ExamSessionController {
    #[must_use]
    pub fn new(
        backend: Arc<dyn ExamBackend>,
        context: SessionContext,
        exam_id: ExamId,
        mode: ExamMode,
    ) -> Self {
        let sync = BackgroundSync::new(Arc::clone(&backend), context.clone());
        Self {
            backend,
            context,
            exam_id,
            mode,
            clock: Clock::default(),
            options: ControllerOptions::default(),
            state: SessionState::NotStarted,
            attempt: None,
            sync,
            sync_reports: Vec::new(),
            payload: None,
            result: None,
            failure: None,
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: ControllerOptions) -> Self {
        self.options = options;
        self
    }

    //
    // ─── READS ─────────────────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn exam_id(&self) -> ExamId {
        self.exam_id
    }

    #[must_use]
    pub fn mode(&self) -> ExamMode {
        self.mode
    }

    #[must_use]
    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    #[must_use]
    pub fn session_id(&self) -> Option<&SessionId> {
        self.attempt.as_ref().map(|a| &a.session_id)
    }

    #[must_use]
    pub fn paper(&self) -> Option<&ExamPaper> {
        self.attempt.as_ref().map(|a| &a.paper)
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.attempt.as_ref().map_or(0, |a| a.current)
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&QuestionEntry> {
        self.attempt
            .as_ref()
            .and_then(|a| a.paper.question_at(a.current))
    }

    /// Read-only copy of the answer ledger; empty before the attempt starts.
    #[must_use]
    pub fn ledger_snapshot(&self) -> LedgerSnapshot {
        self.attempt
            .as_ref()
            .map(|a| a.ledger.snapshot())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn time_spent(&self) -> TimeSpentLedger {
        self.attempt
            .as_ref()
            .map(|a| a.time.ledger().clone())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn remaining_secs(&self) -> Option<u64> {
        self.attempt.as_ref().map(|a| a.timer.remaining_secs())
    }

    #[must_use]
    pub fn total_secs(&self) -> Option<u64> {
        self.attempt.as_ref().map(|a| a.timer.total_secs())
    }

    #[must_use]
    pub fn is_low_time(&self) -> bool {
        self.attempt.as_ref().is_some_and(|a| a.timer.is_low_time())
    }

    #[must_use]
    pub fn progress(&self) -> ExamProgress {
        let Some(attempt) = self.attempt.as_ref() else {
            return ExamProgress {
                total: 0,
                answered: 0,
                flagged: 0,
                unanswered: 0,
                current_index: 0,
            };
        };
        let questions = attempt.paper.questions();
        let answered = questions
            .iter()
            .filter(|q| attempt.ledger.entry(q.id).is_answered())
            .count();
        let flagged = questions
            .iter()
            .filter(|q| attempt.ledger.is_flagged(q.id))
            .count();
        ExamProgress {
            total: questions.len(),
            answered,
            flagged,
            unanswered: questions.len() - answered,
            current_index: attempt.current,
        }
    }

    /// Payload of the last submission attempt, kept for retries.
    #[must_use]
    pub fn submitted_payload(&self) -> Option<&[SubmittedAnswer]> {
        self.payload.as_deref()
    }

    #[must_use]
    pub fn result(&self) -> Option<&ExamResult> {
        self.result.as_ref()
    }

    #[must_use]
    pub fn failure(&self) -> Option<&SessionFailure> {
        self.failure.as_ref()
    }

    /// Whether the attempt ended in a state the user cannot retry from.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        self.failure.as_ref().is_some_and(|f| !f.retryable)
            && self.state == SessionState::Errored
    }

    //
    // ─── START ─────────────────────────────────────────────────────────────────
    //

    /// Loads the exam from the backend and enters `InProgress`.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::AlreadyStarted` outside `NotStarted`. Load failures
    /// keep the controller in `NotStarted` so the call can be retried; an auth
    /// failure ends the attempt.
    pub async fn start(&mut self) -> Result<(), ExamError> {
        let load = self.load()?;
        let started = load.await;
        self.finish_load(started)
    }

    /// Checks that a load may begin and returns the `start_exam` call.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::AlreadyStarted` outside `NotStarted` and
    /// `ExamError::Unauthorized` when the session context is invalidated.
    pub fn load(
        &mut self,
    ) -> Result<
        impl Future<Output = Result<StartedExam, BackendError>> + Send + 'static + use<>,
        ExamError,
    > {
        self.check_auth()?;
        if self.state != SessionState::NotStarted {
            return Err(ExamError::AlreadyStarted);
        }
        let backend = Arc::clone(&self.backend);
        let exam_id = self.exam_id;
        let mode = self.mode;
        info!(exam = %exam_id, mode = mode.as_str(), "loading exam");
        Ok(async move { backend.start_exam(exam_id, mode).await })
    }

    /// Applies the outcome of a `start_exam` call.
    ///
    /// # Errors
    ///
    /// Returns the load failure mapped onto `ExamError`.
    pub fn finish_load(
        &mut self,
        started: Result<StartedExam, BackendError>,
    ) -> Result<(), ExamError> {
        match started {
            Ok(started) => self.begin(started),
            Err(err) => {
                let err = ExamError::from_load(err);
                if matches!(err, ExamError::Unauthorized) {
                    self.enter_fatal();
                } else {
                    warn!(exam = %self.exam_id, error = %err, "exam load failed");
                    self.failure = Some(SessionFailure::from_error(&err));
                }
                Err(err)
            }
        }
    }

    /// Enters `InProgress` with already-loaded exam data.
    ///
    /// Prior answers seed the ledgers; entries for questions the paper does not
    /// contain are dropped. A remaining-time hint resumes the countdown.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::AlreadyStarted` outside `NotStarted`.
    pub fn begin(&mut self, started: StartedExam) -> Result<(), ExamError> {
        if self.state != SessionState::NotStarted {
            return Err(ExamError::AlreadyStarted);
        }

        let StartedExam {
            session_id,
            paper,
            prior_answers,
            remaining_secs,
        } = started;

        let known = prior_answers
            .into_iter()
            .filter(|prior| paper.index_of(prior.question_id).is_some())
            .collect::<Vec<_>>();
        let ledger = AnswerLedger::from_entries(known.iter().map(|prior| {
            (
                prior.question_id,
                AnswerEntry {
                    selected: prior.selected.clone(),
                    flagged: prior.flagged,
                },
            )
        }));
        let time_spent = TimeSpentLedger::from_entries(
            known
                .iter()
                .map(|prior| (prior.question_id, prior.time_spent_secs)),
        );

        let now = self.clock.now();
        let mut timer = CountdownTimer::new(
            paper.definition().duration_minutes(),
            self.options.timer_strategy,
        )
        .with_low_time_percent(self.options.low_time_percent);
        let remaining = remaining_secs.unwrap_or_else(|| timer.total_secs());
        timer.start_with_remaining(remaining, now);

        let declared = paper.definition().total_questions();
        if usize::try_from(declared).ok() != Some(paper.question_count()) {
            warn!(
                session = %session_id,
                declared,
                served = paper.question_count(),
                "question count differs from the exam definition; using the served list"
            );
        }

        info!(
            session = %session_id,
            questions = paper.question_count(),
            resumed = !known.is_empty() || remaining_secs.is_some(),
            remaining_secs = timer.remaining_secs(),
            "exam started"
        );

        self.attempt = Some(ActiveAttempt {
            session_id,
            paper,
            ledger,
            time: TimeAccountant::with_ledger(time_spent, now),
            timer,
            current: 0,
        });
        self.failure = None;
        self.transition(SessionState::InProgress);
        Ok(())
    }

    //
    // ─── ANSWERS ───────────────────────────────────────────────────────────────
    //

    /// Selects `key` for `question`, replacing any earlier selection.
    ///
    /// The key is not checked against the question's options.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::NotInProgress` outside `InProgress` and
    /// `ExamError::UnknownQuestion` for a question the exam does not contain.
    pub fn select(&mut self, question: QuestionId, key: OptionKey) -> Result<(), ExamError> {
        let attempt = self.input_target(question)?;
        attempt.ledger.select(question, key);
        self.dispatch_sync(question);
        Ok(())
    }

    /// Selects `key` on the question currently shown.
    ///
    /// # Errors
    ///
    /// Same as [`Self::select`].
    pub fn select_current(&mut self, key: OptionKey) -> Result<(), ExamError> {
        let question = self.current_question_id()?;
        self.select(question, key)
    }

    /// Resets the selection of `question` to none.
    ///
    /// # Errors
    ///
    /// Same as [`Self::select`].
    pub fn clear(&mut self, question: QuestionId) -> Result<(), ExamError> {
        let attempt = self.input_target(question)?;
        attempt.ledger.clear(question);
        self.dispatch_sync(question);
        Ok(())
    }

    /// Flips the review flag of `question`. The selection is untouched.
    ///
    /// # Errors
    ///
    /// Same as [`Self::select`].
    pub fn toggle_flag(&mut self, question: QuestionId) -> Result<bool, ExamError> {
        let attempt = self.input_target(question)?;
        let flagged = attempt.ledger.toggle_flag(question).flagged;
        self.dispatch_sync(question);
        Ok(flagged)
    }

    //
    // ─── NAVIGATION ────────────────────────────────────────────────────────────
    //

    /// Moves to the next question; stays put on the last one.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::NotInProgress` outside `InProgress`.
    pub fn next(&mut self) -> Result<usize, ExamError> {
        let (current, count) = self.position()?;
        if current + 1 >= count {
            return Ok(current);
        }
        self.move_to(current + 1)
    }

    /// Moves to the previous question; stays put on the first one.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::NotInProgress` outside `InProgress`.
    pub fn previous(&mut self) -> Result<usize, ExamError> {
        let (current, _) = self.position()?;
        if current == 0 {
            return Ok(current);
        }
        self.move_to(current - 1)
    }

    /// Moves to the question at `index`.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::InvalidQuestionIndex` when `index` is out of range
    /// and `ExamError::NotInProgress` outside `InProgress`.
    pub fn jump_to(&mut self, index: usize) -> Result<usize, ExamError> {
        let (current, count) = self.position()?;
        if index >= count {
            return Err(ExamError::InvalidQuestionIndex { index, count });
        }
        if index == current {
            return Ok(current);
        }
        self.move_to(index)
    }

    //
    // ─── TIMER ─────────────────────────────────────────────────────────────────
    //

    /// Advances the countdown by one tick.
    ///
    /// Only an `InProgress` attempt ticks. On `TimerEvent::Expired` the caller
    /// is expected to submit with `SubmitTrigger::TimerExpired`.
    pub fn tick_timer(&mut self) -> TimerEvent {
        self.absorb_sync_reports();
        if self.check_auth().is_err() || self.state != SessionState::InProgress {
            return TimerEvent::Inert;
        }
        let now = self.clock.now();
        let Some(attempt) = self.attempt.as_mut() else {
            return TimerEvent::Inert;
        };
        let event = attempt.timer.tick(now);
        match event {
            TimerEvent::Tick {
                remaining_secs,
                entered_low_time: true,
            } => info!(session = %attempt.session_id, remaining_secs, "low time"),
            TimerEvent::Expired => info!(session = %attempt.session_id, "time is up"),
            TimerEvent::Tick { .. } | TimerEvent::Inert => {}
        }
        event
    }

    /// Ticks the countdown and submits when it runs out.
    pub async fn tick(&mut self) -> TickOutcome {
        match self.tick_timer() {
            TimerEvent::Inert => TickOutcome::Inert,
            TimerEvent::Tick {
                remaining_secs,
                entered_low_time,
            } => TickOutcome::Ticked {
                remaining_secs,
                entered_low_time,
            },
            TimerEvent::Expired => {
                TickOutcome::Expired(self.submit_with(SubmitTrigger::TimerExpired).await)
            }
        }
    }

    /// Moves a fixed clock forward. Has no effect on the system clock.
    pub fn advance_clock(&mut self, delta: Duration) {
        self.clock.advance(delta);
    }

    //
    // ─── SUBMISSION ────────────────────────────────────────────────────────────
    //

    /// Submits the attempt and waits for the backend.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::SubmissionFailed` (retryable, state `Errored`) or
    /// `ExamError::Unauthorized` (fatal).
    pub async fn submit(&mut self) -> Result<SubmitOutcome, ExamError> {
        self.submit_with(SubmitTrigger::User).await
    }

    /// Re-sends the payload of a failed submission.
    ///
    /// # Errors
    ///
    /// Same as [`Self::submit`].
    pub async fn retry_submission(&mut self) -> Result<SubmitOutcome, ExamError> {
        self.submit_with(SubmitTrigger::Retry).await
    }

    async fn submit_with(&mut self, trigger: SubmitTrigger) -> Result<SubmitOutcome, ExamError> {
        let Some(pending) = self.prepare_submission(trigger)? else {
            return Ok(if self.state == SessionState::Completed {
                SubmitOutcome::AlreadyCompleted
            } else {
                SubmitOutcome::AlreadyInFlight
            });
        };
        let result = pending.send().await;
        self.complete_submission(result)
            .map(SubmitOutcome::Completed)
    }

    /// Enters `Submitting` and hands out the one submission call to make.
    ///
    /// From `InProgress` this flushes the time of the current question, pauses
    /// the countdown and reconciles the payload. From a retryable `Errored` it
    /// reuses the stored payload untouched. Returns `None` while a submission is
    /// outstanding or after one succeeded.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::NotInProgress` before the attempt started and
    /// `ExamError::Unauthorized` once the session is no longer authorized.
    pub fn prepare_submission(
        &mut self,
        trigger: SubmitTrigger,
    ) -> Result<Option<PendingSubmission>, ExamError> {
        self.absorb_sync_reports();
        self.check_auth()?;

        match self.state {
            SessionState::Submitting | SessionState::Completed => {
                debug!(?trigger, state = ?self.state, "submission ignored");
                return Ok(None);
            }
            SessionState::NotStarted => return Err(ExamError::NotInProgress),
            SessionState::Errored => {
                if self.is_fatal() {
                    return Err(ExamError::Unauthorized);
                }
            }
            SessionState::InProgress => {
                let now = self.clock.now();
                let Some(attempt) = self.attempt.as_mut() else {
                    return Err(ExamError::NotInProgress);
                };
                if let Some(question) = attempt.paper.question_at(attempt.current) {
                    attempt.time.record_elapsed(question.id, now);
                }
                attempt.timer.pause(now);
                self.payload = Some(reconcile(
                    attempt.paper.questions(),
                    &attempt.ledger.snapshot(),
                    attempt.time.ledger(),
                ));
            }
        }

        let (Some(attempt), Some(answers)) = (self.attempt.as_ref(), self.payload.as_ref()) else {
            return Err(ExamError::NotInProgress);
        };
        let pending = PendingSubmission {
            backend: Arc::clone(&self.backend),
            session_id: attempt.session_id.clone(),
            answers: answers.clone(),
            trigger,
        };
        info!(session = %pending.session_id, ?trigger, answers = answers.len(), "submitting exam");
        self.failure = None;
        self.transition(SessionState::Submitting);
        Ok(Some(pending))
    }

    /// Applies the response of the submission call.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::NotInProgress` when no submission is outstanding and
    /// the mapped backend failure otherwise.
    pub fn complete_submission(
        &mut self,
        result: Result<ExamResult, BackendError>,
    ) -> Result<ExamResult, ExamError> {
        if self.state != SessionState::Submitting {
            warn!(state = ?self.state, "submission response without a pending submission");
            return Err(ExamError::NotInProgress);
        }
        match result {
            Ok(result) => {
                info!(
                    score = result.score,
                    correct = result.correct_count,
                    total = result.total,
                    passed = result.passed,
                    "exam submitted"
                );
                self.result = Some(result.clone());
                self.transition(SessionState::Completed);
                Ok(result)
            }
            Err(err) => {
                let err = ExamError::from_submission(err);
                if matches!(err, ExamError::Unauthorized) {
                    self.enter_fatal();
                } else {
                    error!(error = %err, "exam submission failed");
                    self.failure = Some(SessionFailure::from_error(&err));
                    self.transition(SessionState::Errored);
                }
                Err(err)
            }
        }
    }

    //
    // ─── SYNC ──────────────────────────────────────────────────────────────────
    //

    /// Reports of finished background upserts since the last call.
    pub fn drain_sync_reports(&mut self) -> Vec<SyncReport> {
        self.absorb_sync_reports();
        std::mem::take(&mut self.sync_reports)
    }

    /// Waits for outstanding background upserts and returns every report not
    /// drained yet.
    pub async fn flush_syncs(&mut self) -> Vec<SyncReport> {
        let flushed = self.sync.flush().await;
        self.buffer_sync_reports(flushed);
        let _ = self.check_auth();
        std::mem::take(&mut self.sync_reports)
    }

    //
    // ─── INTERNALS ─────────────────────────────────────────────────────────────
    //

    fn transition(&mut self, next: SessionState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {:?} -> {next:?}",
            self.state
        );
        debug!(from = ?self.state, to = ?next, "session state");
        self.state = next;
    }

    /// Ends the attempt after the credential was rejected.
    fn enter_fatal(&mut self) {
        self.context.invalidate();
        if let Some(attempt) = self.attempt.as_mut() {
            attempt.timer.pause(self.clock.now());
        }
        warn!(exam = %self.exam_id, from = ?self.state, "session unauthorized; attempt ended");
        self.failure = Some(SessionFailure::from_error(&ExamError::Unauthorized));
        self.state = SessionState::Errored;
    }

    /// Turns an invalidated context into the fatal state.
    ///
    /// A submission in flight decides for itself, and a completed attempt stays
    /// completed.
    fn check_auth(&mut self) -> Result<(), ExamError> {
        if self.is_fatal() {
            return Err(ExamError::Unauthorized);
        }
        if !self.context.is_invalidated()
            || matches!(
                self.state,
                SessionState::Submitting | SessionState::Completed
            )
        {
            return Ok(());
        }
        self.enter_fatal();
        Err(ExamError::Unauthorized)
    }

    fn absorb_sync_reports(&mut self) {
        let reports = self.sync.drain_reports();
        self.buffer_sync_reports(reports);
    }

    /// Keeps the newest `MAX_BUFFERED_SYNC_REPORTS` reports.
    fn buffer_sync_reports(&mut self, reports: Vec<SyncReport>) {
        self.sync_reports.extend(reports);
        let excess = self
            .sync_reports
            .len()
            .saturating_sub(MAX_BUFFERED_SYNC_REPORTS);
        if excess > 0 {
            debug!(dropped = excess, "sync report buffer full; oldest dropped");
            self.sync_reports.drain(..excess);
        }
    }

    fn input_target(&mut self, question: QuestionId) -> Result<&mut ActiveAttempt, ExamError> {
        self.absorb_sync_reports();
        self.check_auth()?;
        if !self.state.accepts_input() {
            return Err(ExamError::NotInProgress);
        }
        let attempt = self.attempt.as_mut().ok_or(ExamError::NotInProgress)?;
        if attempt.paper.index_of(question).is_none() {
            return Err(ExamError::UnknownQuestion(question));
        }
        Ok(attempt)
    }

    fn current_question_id(&self) -> Result<QuestionId, ExamError> {
        self.current_question()
            .map(|q| q.id)
            .ok_or(ExamError::NotInProgress)
    }

    fn position(&mut self) -> Result<(usize, usize), ExamError> {
        self.absorb_sync_reports();
        self.check_auth()?;
        if !self.state.accepts_input() {
            return Err(ExamError::NotInProgress);
        }
        let attempt = self.attempt.as_ref().ok_or(ExamError::NotInProgress)?;
        Ok((attempt.current, attempt.paper.question_count()))
    }

    fn move_to(&mut self, index: usize) -> Result<usize, ExamError> {
        let now = self.clock.now();
        let attempt = self.attempt.as_mut().ok_or(ExamError::NotInProgress)?;
        if let Some(leaving) = attempt.paper.question_at(attempt.current) {
            attempt.time.record_elapsed(leaving.id, now);
        }
        attempt.current = index;
        Ok(index)
    }

    fn dispatch_sync(&mut self, question: QuestionId) {
        let Some(attempt) = self.attempt.as_ref() else {
            return;
        };
        let entry = attempt.ledger.entry(question);
        let on_screen = attempt
            .paper
            .question_at(attempt.current)
            .is_some_and(|current| current.id == question);
        let time_spent_seconds = if on_screen {
            attempt.time.seconds_with_pending(question, self.clock.now())
        } else {
            attempt.time.ledger().seconds(question)
        };
        self.sync.dispatch(AnswerSync {
            session_id: attempt.session_id.clone(),
            question_id: question,
            selected_option_key: entry.selected,
            time_spent_seconds,
            is_flagged: entry.flagged,
        });
    }
}

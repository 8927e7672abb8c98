use exam_core::model::{ExamMode, OptionKey, SessionState};
use services::ExamSessionController;

use super::markdown_vm::{inline_markdown_to_html, markdown_to_html};
use super::navigator_vm::NavigatorVm;
use super::result_vm::ResultVm;
use super::time_fmt::format_time_spent;
use super::timer_vm::TimerVm;
use crate::views::ViewError;

/// Input that only touches local state and never waits on the backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AnswerIntent {
    Select(OptionKey),
    ClearSelection,
    ToggleFlag,
    Next,
    Previous,
    JumpTo(usize),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExamIntent {
    Start,
    Answer(AnswerIntent),
    Submit,
    Retry,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExamPhase {
    Intro,
    InProgress,
    Submitting,
    Completed,
    Failed { retryable: bool },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OptionVm {
    pub key: OptionKey,
    pub html: String,
    pub selected: bool,
    /// Practice mode only, once the question is answered.
    pub correct: Option<bool>,
}

impl OptionVm {
    #[must_use]
    pub fn css_class(&self) -> &'static str {
        match (self.selected, self.correct) {
            (_, Some(true)) => "exam-option exam-option--correct",
            (true, Some(false)) => "exam-option exam-option--selected exam-option--wrong",
            (true, None) => "exam-option exam-option--selected",
            (false, _) => "exam-option",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuestionCardVm {
    pub number: usize,
    pub total: usize,
    pub html: String,
    pub options: Vec<OptionVm>,
    pub flagged: bool,
    pub answered: bool,
    pub explanation_html: Option<String>,
    pub time_spent_label: String,
}

/// View model over one exam attempt.
pub struct ExamVm {
    controller: ExamSessionController,
}

impl ExamVm {
    #[must_use]
    pub fn new(controller: ExamSessionController) -> Self {
        Self { controller }
    }

    #[must_use]
    pub fn controller(&self) -> &ExamSessionController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut ExamSessionController {
        &mut self.controller
    }

    #[must_use]
    pub fn phase(&self) -> ExamPhase {
        match self.controller.state() {
            SessionState::NotStarted => ExamPhase::Intro,
            SessionState::InProgress => ExamPhase::InProgress,
            SessionState::Submitting => ExamPhase::Submitting,
            SessionState::Completed => ExamPhase::Completed,
            SessionState::Errored => ExamPhase::Failed {
                retryable: !self.controller.is_fatal(),
            },
        }
    }

    #[must_use]
    pub fn title(&self) -> String {
        self.controller.paper().map_or_else(
            || format!("Exam #{}", self.controller.exam_id()),
            |paper| paper.definition().title().to_string(),
        )
    }

    #[must_use]
    pub fn mode_label(&self) -> &'static str {
        match self.controller.mode() {
            ExamMode::Exam => "Exam mode",
            ExamMode::Practice => "Practice mode",
        }
    }

    #[must_use]
    pub fn intro_label(&self) -> Option<String> {
        let paper = self.controller.paper()?;
        let definition = paper.definition();
        Some(format!(
            "{} questions · {} minutes",
            paper.question_count(),
            definition.duration_minutes()
        ))
    }

    #[must_use]
    pub fn question_card(&self) -> Option<QuestionCardVm> {
        let paper = self.controller.paper()?;
        let question = self.controller.current_question()?;
        let ledger = self.controller.ledger_snapshot();
        let entry = ledger.entry(question.id);
        let reveal = paper.mode() == ExamMode::Practice && entry.is_answered();

        let options = question
            .options
            .iter()
            .map(|option| {
                let selected = entry.selected.as_ref() == Some(&option.key);
                let correct = if reveal {
                    question
                        .is_correct(&option.key)
                        .filter(|is_correct| *is_correct || selected)
                } else {
                    None
                };
                OptionVm {
                    key: option.key.clone(),
                    html: inline_markdown_to_html(&option.text),
                    selected,
                    correct,
                }
            })
            .collect();

        Some(QuestionCardVm {
            number: self.controller.current_index() + 1,
            total: paper.question_count(),
            html: markdown_to_html(&question.text),
            options,
            flagged: entry.flagged,
            answered: entry.is_answered(),
            explanation_html: question
                .explanation
                .as_deref()
                .filter(|_| reveal)
                .map(markdown_to_html),
            time_spent_label: format_time_spent(self.controller.time_spent().seconds(question.id)),
        })
    }

    #[must_use]
    pub fn navigator(&self) -> NavigatorVm {
        self.controller.paper().map_or_else(NavigatorVm::default, |paper| {
            NavigatorVm::derive(
                paper.questions(),
                &self.controller.ledger_snapshot(),
                self.controller.current_index(),
            )
        })
    }

    #[must_use]
    pub fn timer(&self) -> Option<TimerVm> {
        self.controller
            .remaining_secs()
            .map(|remaining| TimerVm::new(remaining, self.controller.is_low_time()))
    }

    #[must_use]
    pub fn progress_label(&self) -> String {
        let progress = self.controller.progress();
        format!(
            "Answered {} of {} · Flagged {}",
            progress.answered, progress.total, progress.flagged
        )
    }

    #[must_use]
    pub fn unanswered_count(&self) -> usize {
        self.controller.progress().unanswered
    }

    #[must_use]
    pub fn result(&self) -> Option<ResultVm> {
        let result = self.controller.result()?;
        let threshold = self
            .controller
            .paper()
            .map_or(0, |paper| paper.definition().passing_threshold());
        Some(ResultVm::new(result, threshold))
    }

    #[must_use]
    pub fn failure_message(&self) -> Option<String> {
        self.controller.failure().map(|failure| failure.message.clone())
    }

    /// Applies a local input to the controller.
    ///
    /// # Errors
    ///
    /// Returns the `ViewError` matching the controller's refusal.
    pub fn apply(&mut self, intent: AnswerIntent) -> Result<(), ViewError> {
        let controller = &mut self.controller;
        let outcome = match intent {
            AnswerIntent::Select(key) => controller.select_current(key),
            AnswerIntent::ClearSelection => match controller.current_question().map(|q| q.id) {
                Some(question) => controller.clear(question),
                None => Ok(()),
            },
            AnswerIntent::ToggleFlag => match controller.current_question().map(|q| q.id) {
                Some(question) => controller.toggle_flag(question).map(|_| ()),
                None => Ok(()),
            },
            AnswerIntent::Next => controller.next().map(|_| ()),
            AnswerIntent::Previous => controller.previous().map(|_| ()),
            AnswerIntent::JumpTo(index) => controller.jump_to(index).map(|_| ()),
        };
        outcome.map_err(|err| ViewError::from(&err))
    }
}

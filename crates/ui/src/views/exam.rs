use std::time::Duration;

use dioxus::prelude::*;
use exam_core::model::TimerEvent;
use services::SubmitTrigger;
use tokio::time::MissedTickBehavior;

use crate::context::AppContext;
use crate::views::ViewError;
use crate::vm::{AnswerIntent, ExamIntent, ExamPhase, ExamVm, NavigatorVm, QuestionCardVm, ResultVm};

#[cfg(test)]
use std::cell::RefCell;
#[cfg(test)]
use std::rc::Rc;

#[component]
pub fn ExamView() -> Element {
    let ctx = use_context::<AppContext>();
    let vm = use_signal(|| ExamVm::new(ctx.new_controller()));
    let error = use_signal(|| None::<ViewError>);
    let loading = use_signal(|| false);

    let submit = use_callback(move |trigger: SubmitTrigger| {
        let mut vm = vm;
        let mut error = error;
        spawn(async move {
            let prepared = vm.write().controller_mut().prepare_submission(trigger);
            let pending = match prepared {
                Ok(Some(pending)) => pending,
                Ok(None) => return,
                Err(err) => {
                    error.set(Some(ViewError::from(&err)));
                    return;
                }
            };

            let response = pending.send().await;

            let completed = vm.write().controller_mut().complete_submission(response);
            error.set(completed.err().as_ref().map(ViewError::from));
        });
    });

    let dispatch = use_callback(move |intent: ExamIntent| {
        let mut vm = vm;
        let mut error = error;
        let mut loading = loading;

        match intent {
            ExamIntent::Start => {
                if loading() {
                    return;
                }
                loading.set(true);
                spawn(async move {
                    let load = vm.write().controller_mut().load();
                    let started = match load {
                        Ok(call) => call.await,
                        Err(err) => {
                            loading.set(false);
                            error.set(Some(ViewError::from(&err)));
                            return;
                        }
                    };
                    let outcome = vm.write().controller_mut().finish_load(started);
                    loading.set(false);
                    error.set(outcome.err().as_ref().map(ViewError::from));
                });
            }
            ExamIntent::Answer(answer) => {
                let outcome = vm.write().apply(answer);
                error.set(outcome.err());
            }
            ExamIntent::Submit => submit.call(SubmitTrigger::User),
            ExamIntent::Retry => submit.call(SubmitTrigger::Retry),
        }
    });

    #[cfg(test)]
    {
        let mut registered = use_signal(|| false);
        if !registered() {
            registered.set(true);
            if let Some(handles) = try_consume_context::<ExamTestHandles>() {
                handles.register(dispatch, vm);
            }
        }
    }

    // One tick per second; expiry goes through the same submit path as the button.
    use_future(move || async move {
        let mut vm = vm;
        let mut interval = tokio::time::interval(Duration::from_secs(1));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval.tick().await;
        loop {
            interval.tick().await;
            let event = {
                let mut vm = vm.write();
                let controller = vm.controller_mut();
                // Failures are already logged by the sync task.
                controller.drain_sync_reports();
                controller.tick_timer()
            };
            if event == TimerEvent::Expired {
                submit.call(SubmitTrigger::TimerExpired);
            }
        }
    });

    let on_key = use_callback(move |evt: KeyboardEvent| {
        if vm.read().phase() != ExamPhase::InProgress {
            return;
        }
        let intent = match evt.data.key() {
            Key::ArrowRight => AnswerIntent::Next,
            Key::ArrowLeft => AnswerIntent::Previous,
            Key::Character(value) => match value.as_str() {
                "f" | "F" => AnswerIntent::ToggleFlag,
                "a" | "A" | "b" | "B" | "c" | "C" | "d" | "D" | "e" | "E" => {
                    AnswerIntent::Select(value.to_ascii_uppercase().as_str().into())
                }
                _ => return,
            },
            _ => return,
        };
        evt.prevent_default();
        dispatch.call(ExamIntent::Answer(intent));
    });

    let vm_guard = vm.read();
    let phase = vm_guard.phase();
    let title = vm_guard.title();
    let mode_label = vm_guard.mode_label();
    let intro_label = vm_guard.intro_label();
    let timer = vm_guard.timer();
    let card = vm_guard.question_card();
    let navigator = vm_guard.navigator();
    let progress_label = vm_guard.progress_label();
    let unanswered = vm_guard.unanswered_count();
    let result = vm_guard.result();
    let failure = vm_guard.failure_message();
    drop(vm_guard);
    let current_error = *error.read();
    let is_loading = loading();

    rsx! {
        div { class: "page exam-page", id: "exam-root", tabindex: "0",
            onkeydown: move |evt| on_key.call(evt),
            header { class: "exam-header",
                div { class: "exam-header__heading",
                    h2 { class: "exam-title", "{title}" }
                    p { class: "exam-mode", "{mode_label}" }
                }
                if let Some(timer) = timer.filter(|_| phase == ExamPhase::InProgress) {
                    span { class: timer.css_class(), id: "exam-timer", "{timer.label}" }
                }
            }
            if let Some(err) = current_error.filter(|_| !matches!(phase, ExamPhase::Failed { .. })) {
                p { class: "exam-error", role: "alert", "{err.message()}" }
            }
            match phase {
                ExamPhase::Intro => rsx! {
                    div { class: "exam-intro",
                        if let Some(label) = intro_label {
                            p { "{label}" }
                        }
                        p { "Answer each question, flag the ones to revisit and submit before time runs out." }
                        button {
                            class: "btn btn-primary",
                            id: "exam-start",
                            r#type: "button",
                            disabled: is_loading,
                            onclick: move |_| dispatch.call(ExamIntent::Start),
                            if is_loading { "Loading..." } else { "Start exam" }
                        }
                    }
                },
                ExamPhase::InProgress => rsx! {
                    div { class: "exam-body",
                        if let Some(card) = card {
                            QuestionCard { card, on_intent: dispatch }
                        }
                        aside { class: "exam-sidebar",
                            p { class: "exam-progress", "{progress_label}" }
                            NavigatorGrid { navigator, on_intent: dispatch }
                            if unanswered > 0 {
                                p { class: "exam-unanswered", "{unanswered} unanswered" }
                            }
                            button {
                                class: "btn btn-primary",
                                id: "exam-submit",
                                r#type: "button",
                                onclick: move |_| dispatch.call(ExamIntent::Submit),
                                "Submit exam"
                            }
                        }
                    }
                },
                ExamPhase::Submitting => rsx! {
                    div { class: "exam-submitting", role: "status",
                        p { "Submitting your answers..." }
                    }
                },
                ExamPhase::Completed => rsx! {
                    if let Some(result) = result {
                        ResultPanel { result }
                    }
                },
                ExamPhase::Failed { retryable } => rsx! {
                    div { class: "exam-failed", role: "alert",
                        if let Some(message) = failure {
                            p { "{message}" }
                        }
                        if retryable {
                            button {
                                class: "btn btn-secondary",
                                id: "exam-retry",
                                r#type: "button",
                                onclick: move |_| dispatch.call(ExamIntent::Retry),
                                "Retry submission"
                            }
                        }
                    }
                },
            }
        }
    }
}

#[component]
fn QuestionCard(card: QuestionCardVm, on_intent: EventHandler<ExamIntent>) -> Element {
    let flag_label = if card.flagged { "Unflag" } else { "Flag for review" };
    let is_first = card.number == 1;
    let is_last = card.number == card.total;

    rsx! {
        section { class: "exam-question",
            div { class: "exam-question__meta",
                span { "Question {card.number} of {card.total}" }
                span { class: "exam-question__time", "{card.time_spent_label}" }
            }
            div { class: "exam-question__text", dangerous_inner_html: "{card.html}" }
            ul { class: "exam-options",
                for option in card.options.iter().cloned() {
                    li { key: "{option.key}",
                        button {
                            class: option.css_class(),
                            r#type: "button",
                            aria_pressed: option.selected,
                            onclick: {
                                let key = option.key.clone();
                                move |_| on_intent.call(ExamIntent::Answer(AnswerIntent::Select(key.clone())))
                            },
                            span { class: "exam-option__key", "{option.key}" }
                            span { class: "exam-option__text", dangerous_inner_html: "{option.html}" }
                        }
                    }
                }
            }
            if let Some(explanation) = card.explanation_html.as_deref() {
                div { class: "exam-explanation", dangerous_inner_html: "{explanation}" }
            }
            div { class: "exam-question__actions",
                button {
                    class: "btn btn-secondary",
                    r#type: "button",
                    disabled: is_first,
                    onclick: move |_| on_intent.call(ExamIntent::Answer(AnswerIntent::Previous)),
                    "Previous"
                }
                button {
                    class: if card.flagged { "btn btn-flag btn-flag--on" } else { "btn btn-flag" },
                    r#type: "button",
                    onclick: move |_| on_intent.call(ExamIntent::Answer(AnswerIntent::ToggleFlag)),
                    "{flag_label}"
                }
                button {
                    class: "btn btn-ghost",
                    r#type: "button",
                    disabled: !card.answered,
                    onclick: move |_| on_intent.call(ExamIntent::Answer(AnswerIntent::ClearSelection)),
                    "Clear"
                }
                button {
                    class: "btn btn-secondary",
                    r#type: "button",
                    disabled: is_last,
                    onclick: move |_| on_intent.call(ExamIntent::Answer(AnswerIntent::Next)),
                    "Next"
                }
            }
        }
    }
}

#[component]
fn NavigatorGrid(navigator: NavigatorVm, on_intent: EventHandler<ExamIntent>) -> Element {
    rsx! {
        nav { class: "exam-navigator", aria_label: "Questions",
            for item in navigator.items.iter().cloned() {
                button {
                    key: "{item.question_id}",
                    class: item.status.css_class(),
                    r#type: "button",
                    title: item.status.label(),
                    onclick: move |_| on_intent.call(ExamIntent::Answer(AnswerIntent::JumpTo(item.index))),
                    "{item.number}"
                    if item.flagged {
                        span { class: "nav-item__flag", "⚑" }
                    }
                }
            }
        }
    }
}

#[component]
fn ResultPanel(result: ResultVm) -> Element {
    rsx! {
        section { class: result.css_class(),
            h3 { class: "exam-result__verdict", "{result.verdict}" }
            p { class: "exam-result__score", "{result.score_label}" }
            p { "{result.correct_label}" }
            p { class: "exam-result__threshold", "{result.threshold_label}" }
        }
    }
}

#[cfg(test)]
#[derive(Clone, Default)]
pub(crate) struct ExamTestHandles {
    dispatch: Rc<RefCell<Option<Callback<ExamIntent>>>>,
    vm: Rc<RefCell<Option<Signal<ExamVm>>>>,
}

#[cfg(test)]
impl ExamTestHandles {
    pub(crate) fn register(&self, dispatch: Callback<ExamIntent>, vm: Signal<ExamVm>) {
        *self.dispatch.borrow_mut() = Some(dispatch);
        *self.vm.borrow_mut() = Some(vm);
    }

    pub(crate) fn dispatch(&self) -> Callback<ExamIntent> {
        (*self.dispatch.borrow()).expect("exam dispatch registered")
    }

    pub(crate) fn vm(&self) -> Signal<ExamVm> {
        (*self.vm.borrow()).expect("exam vm registered")
    }
}

use std::sync::Arc;

use dioxus::prelude::ReadableExt;
use backend::{InMemoryBackend, ScriptedFailure};
use exam_core::model::{ExamMode, SessionState};

use super::test_harness::{setup_view_harness, setup_view_harness_with_backend};
use crate::vm::{AnswerIntent, ExamIntent};

#[tokio::test(flavor = "current_thread")]
async fn exam_view_smoke_renders_intro() {
    let harness = setup_view_harness(ExamMode::Exam);
    let html = harness.render();
    assert!(html.contains("Exam #1"), "missing title in {html}");
    assert!(html.contains("Start exam"), "missing start button in {html}");
    assert!(html.contains("Exam mode"), "missing mode in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn exam_view_smoke_starts_and_renders_first_question() {
    let mut harness = setup_view_harness(ExamMode::Exam);
    harness.dispatch(ExamIntent::Start);
    harness.settle().await;

    let html = harness.render();
    assert!(html.contains("General Science Practice"), "missing title in {html}");
    assert!(html.contains("Question 1 of 3"), "missing header in {html}");
    assert!(html.contains("<strong>photosynthesis</strong>"), "missing markdown in {html}");
    assert!(html.contains("10:00"), "missing timer in {html}");
    assert!(html.contains("Answered 0 of 3"), "missing progress in {html}");
    assert_eq!(harness.backend.start_calls().len(), 1);
}

#[tokio::test(flavor = "current_thread")]
async fn exam_view_smoke_answers_navigates_and_submits() {
    let mut harness = setup_view_harness(ExamMode::Exam);
    harness.dispatch(ExamIntent::Start);
    harness.settle().await;

    harness.dispatch(ExamIntent::Answer(AnswerIntent::Select("B".into())));
    harness.dispatch(ExamIntent::Answer(AnswerIntent::Next));
    harness.dispatch(ExamIntent::Answer(AnswerIntent::ToggleFlag));
    harness.settle().await;

    let html = harness.render();
    assert!(html.contains("Question 2 of 3"), "missing header in {html}");
    assert!(html.contains("Answered 1 of 3 · Flagged 1"), "missing progress in {html}");
    assert!(html.contains("Unflag"), "missing flag toggle in {html}");

    harness.dispatch(ExamIntent::Submit);
    harness.settle().await;

    assert_eq!(harness.vm().read().controller().state(), SessionState::Completed);
    let html = harness.render();
    assert!(html.contains("Not passed"), "missing verdict in {html}");
    assert!(html.contains("1 of 3 correct"), "missing score in {html}");
    assert_eq!(harness.backend.submit_calls().len(), 1);
}

#[tokio::test(flavor = "current_thread")]
async fn exam_view_smoke_practice_mode_reveals_explanation() {
    let mut harness = setup_view_harness(ExamMode::Practice);
    harness.dispatch(ExamIntent::Start);
    harness.settle().await;

    harness.dispatch(ExamIntent::Answer(AnswerIntent::Select("A".into())));
    harness.settle().await;

    let html = harness.render();
    assert!(html.contains("Practice mode"), "missing mode in {html}");
    assert!(
        html.contains("Plants take in carbon dioxide"),
        "missing explanation in {html}"
    );
}

#[tokio::test(flavor = "current_thread")]
async fn exam_view_smoke_load_failure_keeps_start_available() {
    let backend = Arc::new(InMemoryBackend::with_sample_exam());
    backend.fail_start(1, ScriptedFailure::Network);
    let mut harness = setup_view_harness_with_backend(ExamMode::Exam, Arc::clone(&backend));

    harness.dispatch(ExamIntent::Start);
    harness.settle().await;
    let html = harness.render();
    assert!(html.contains("could not be loaded"), "missing error in {html}");
    assert!(html.contains("Start exam"), "missing start button in {html}");

    harness.dispatch(ExamIntent::Start);
    harness.settle().await;
    let html = harness.render();
    assert!(html.contains("Question 1 of 3"), "missing question in {html}");
    assert!(!html.contains("could not be loaded"), "stale error in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn exam_view_smoke_failed_submission_offers_retry() {
    let backend = Arc::new(InMemoryBackend::with_sample_exam());
    backend.fail_submit(1, ScriptedFailure::Network);
    let mut harness = setup_view_harness_with_backend(ExamMode::Exam, Arc::clone(&backend));

    harness.dispatch(ExamIntent::Start);
    harness.settle().await;
    harness.dispatch(ExamIntent::Submit);
    harness.settle().await;

    let html = harness.render();
    assert!(html.contains("Retry submission"), "missing retry in {html}");

    harness.dispatch(ExamIntent::Retry);
    harness.settle().await;

    let html = harness.render();
    assert!(html.contains("0 of 3 correct"), "missing result in {html}");
    let calls = backend.submit_calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].1, calls[1].1);
}

#[tokio::test(flavor = "current_thread")]
async fn exam_view_smoke_unauthorized_submission_has_no_retry() {
    let backend = Arc::new(InMemoryBackend::with_sample_exam());
    backend.fail_submit(1, ScriptedFailure::Unauthorized);
    let mut harness = setup_view_harness_with_backend(ExamMode::Exam, Arc::clone(&backend));

    harness.dispatch(ExamIntent::Start);
    harness.settle().await;
    harness.dispatch(ExamIntent::Submit);
    harness.settle().await;

    let html = harness.render();
    assert!(!html.contains("Retry submission"), "unexpected retry in {html}");
    assert_eq!(harness.vm().read().controller().state(), SessionState::Errored);
}

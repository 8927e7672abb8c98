use std::sync::Arc;

use backend::{ExamBackend, InMemoryBackend, SessionContext};
use dioxus::core::NoOpMutations;
use dioxus::prelude::*;
use dioxus_router::{Routable, Router};
use exam_core::model::{ExamId, ExamMode};
use exam_core::time::fixed_now;
use services::{AppServices, Clock, ControllerOptions, ExamService};

use super::exam::ExamTestHandles;
use crate::context::{UiApp, build_app_context};
use crate::views::ExamView;
use crate::vm::{ExamIntent, ExamVm};

#[derive(Clone)]
struct TestApp {
    exam_mode: ExamMode,
    exams: Arc<ExamService>,
}

impl UiApp for TestApp {
    fn exam_id(&self) -> ExamId {
        ExamId::new(1)
    }

    fn exam_mode(&self) -> ExamMode {
        self.exam_mode
    }

    fn exams(&self) -> Arc<ExamService> {
        Arc::clone(&self.exams)
    }
}

#[derive(Props, Clone)]
struct ViewHarnessProps {
    app: Arc<TestApp>,
    handles: ExamTestHandles,
}

impl PartialEq for ViewHarnessProps {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

#[component]
fn ViewRouterHarness(props: ViewHarnessProps) -> Element {
    let app: Arc<dyn UiApp> = props.app.clone();
    use_context_provider(|| build_app_context(&app));
    use_context_provider(|| props.handles.clone());
    rsx! { Router::<TestRoute> {} }
}

#[derive(Clone, Routable, PartialEq)]
#[rustfmt::skip]
enum TestRoute {
    #[route("/")]
    Root {},
}

#[component]
fn Root() -> Element {
    rsx! { ExamView {} }
}

pub struct ViewHarness {
    pub dom: VirtualDom,
    pub backend: Arc<InMemoryBackend>,
    handles: ExamTestHandles,
}

impl ViewHarness {
    pub fn rebuild(&mut self) {
        self.dom.rebuild_in_place();
        drive_dom(&mut self.dom);
    }

    pub fn dispatch(&mut self, intent: ExamIntent) {
        let dispatch = self.handles.dispatch();
        self.dom.in_runtime(|| dispatch.call(intent));
        drive_dom(&mut self.dom);
    }

    pub fn vm(&self) -> Signal<ExamVm> {
        self.handles.vm()
    }

    pub async fn drive_async(&mut self) {
        let _ = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            self.dom.wait_for_work(),
        )
        .await;
        self.dom.render_immediate(&mut NoOpMutations);
        self.dom.process_events();
    }

    /// Runs a few rounds so spawned backend calls land and re-render.
    pub async fn settle(&mut self) {
        for _ in 0..4 {
            self.drive_async().await;
        }
    }

    pub fn render(&self) -> String {
        dioxus_ssr::render(&self.dom)
    }
}

pub fn drive_dom(dom: &mut VirtualDom) {
    dom.process_events();
    dom.render_immediate(&mut NoOpMutations);
    dom.process_events();
}

pub fn setup_view_harness(mode: ExamMode) -> ViewHarness {
    setup_view_harness_with_backend(mode, Arc::new(InMemoryBackend::with_sample_exam()))
}

pub fn setup_view_harness_with_backend(
    mode: ExamMode,
    backend: Arc<InMemoryBackend>,
) -> ViewHarness {
    let services = AppServices::with_backend(
        Arc::clone(&backend) as Arc<dyn ExamBackend>,
        SessionContext::anonymous(),
        Clock::fixed(fixed_now()),
        ControllerOptions::default(),
    );
    let handles = ExamTestHandles::default();
    let app = Arc::new(TestApp {
        exam_mode: mode,
        exams: services.exams(),
    });

    let mut harness = ViewHarness {
        dom: VirtualDom::new_with_props(
            ViewRouterHarness,
            ViewHarnessProps {
                app,
                handles: handles.clone(),
            },
        ),
        backend,
        handles,
    };
    harness.rebuild();
    harness
}

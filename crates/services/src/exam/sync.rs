use std::sync::Arc;

use backend::{AnswerSync, ExamBackend, SessionContext};
use exam_core::model::QuestionId;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// How one background upsert ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Synced,
    Failed { message: String, unauthorized: bool },
    /// No async runtime was available to run the call.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub question_id: QuestionId,
    pub outcome: SyncOutcome,
}

impl SyncReport {
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self.outcome,
            SyncOutcome::Failed {
                unauthorized: true,
                ..
            }
        )
    }
}

/// Fire-and-forget per-answer persistence.
///
/// Each dispatch carries the full current state of one question, so calls for
/// the same question may race freely: whichever the backend applies last wins.
/// Results only flow back through the report channel and never block callers.
pub struct BackgroundSync {
    backend: Arc<dyn ExamBackend>,
    context: SessionContext,
    in_flight: Vec<JoinHandle<()>>,
    reports_tx: UnboundedSender<SyncReport>,
    reports_rx: UnboundedReceiver<SyncReport>,
}

impl BackgroundSync {
    #[must_use]
    pub fn new(backend: Arc<dyn ExamBackend>, context: SessionContext) -> Self {
        let (reports_tx, reports_rx) = unbounded_channel();
        Self {
            backend,
            context,
            in_flight: Vec::new(),
            reports_tx,
            reports_rx,
        }
    }

    /// Starts the upsert in the background and returns immediately.
    pub fn dispatch(&mut self, sync: AnswerSync) {
        self.in_flight.retain(|handle| !handle.is_finished());

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(question = %sync.question_id, "no runtime for answer sync; skipped");
            let _ = self.reports_tx.send(SyncReport {
                question_id: sync.question_id,
                outcome: SyncOutcome::Skipped,
            });
            return;
        };

        let backend = Arc::clone(&self.backend);
        let context = self.context.clone();
        let reports = self.reports_tx.clone();
        let handle = runtime.spawn(async move {
            let question_id = sync.question_id;
            let outcome = match backend.submit_answer(&sync).await {
                Ok(()) => {
                    debug!(question = %question_id, "answer synced");
                    SyncOutcome::Synced
                }
                Err(err) => {
                    let unauthorized = err.is_auth();
                    if unauthorized {
                        context.invalidate();
                    }
                    warn!(question = %question_id, error = %err, "answer sync failed");
                    SyncOutcome::Failed {
                        message: err.to_string(),
                        unauthorized,
                    }
                }
            };
            let _ = reports.send(SyncReport {
                question_id,
                outcome,
            });
        });
        self.in_flight.push(handle);
    }

    /// Number of dispatched calls that have not finished yet.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.in_flight.iter().filter(|h| !h.is_finished()).count()
    }

    /// Reports of calls that finished since the last drain.
    pub fn drain_reports(&mut self) -> Vec<SyncReport> {
        let mut reports = Vec::new();
        while let Ok(report) = self.reports_rx.try_recv() {
            reports.push(report);
        }
        reports
    }

    /// Waits for every in-flight call, then drains their reports.
    pub async fn flush(&mut self) -> Vec<SyncReport> {
        for handle in self.in_flight.drain(..) {
            if let Err(err) = handle.await {
                warn!(error = %err, "answer sync task aborted");
            }
        }
        self.drain_reports()
    }
}

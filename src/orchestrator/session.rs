//! Single-flight request orchestrator.
//!
//! At most one analysis is current per session. Every terminal decision
//! (compare handle, clear the slot, emit the event) happens under one lock,
//! so a late resolution can never overtake a newer `start` or a `cancel`.

use crate::engine::{AnalysisError, CancelSignal, ProgressSink, Submission, Transport};
use crate::model::{AnalysisRequest, AnalysisResult, InfoEvent, OperationHandle, SessionEvent};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

/// The running operation, if any.
struct Active {
    handle: OperationHandle,
    cancel: CancelSignal,
    last_progress: u8,
}

#[derive(Default)]
struct Slot {
    next_id: u64,
    active: Option<Active>,
}

impl Slot {
    fn is_current(&self, handle: OperationHandle) -> bool {
        self.active.as_ref().is_some_and(|a| a.handle == handle)
    }
}

/// Owns the lifecycle of the session's analysis requests.
#[derive(Clone)]
pub(crate) struct RequestOrchestrator {
    transport: Arc<dyn Transport>,
    event_tx: UnboundedSender<SessionEvent>,
    slot: Arc<Mutex<Slot>>,
}

impl RequestOrchestrator {
    pub fn new(transport: Arc<dyn Transport>, event_tx: UnboundedSender<SessionEvent>) -> Self {
        Self {
            transport,
            event_tx,
            slot: Arc::new(Mutex::new(Slot::default())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        // Slot updates never panic midway, so a poisoned lock still holds a consistent slot.
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn emit(&self, ev: SessionEvent) {
        let _ = self.event_tx.send(ev);
    }

    /// Start a new analysis, superseding (and cancelling) any running one.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&self, request: AnalysisRequest) -> OperationHandle {
        let handle = {
            let mut slot = self.lock();
            slot.next_id += 1;
            OperationHandle(slot.next_id)
        };

        let file = request.file.display().to_string();

        // Submit outside the lock: a transport may report progress re-entrantly.
        let Submission { outcome, cancel } = self.transport.submit(request, self.progress_sink(handle));

        {
            let mut slot = self.lock();
            if slot.next_id != handle.0 {
                // A concurrent start allocated a newer handle; this one never becomes current.
                debug!(%handle, "submission superseded before it was installed");
                cancel.cancel();
                return handle;
            }
            if let Some(prev) = slot.active.take() {
                debug!(old = %prev.handle, new = %handle, "superseding running analysis");
                prev.cancel.cancel();
                self.emit(SessionEvent::Info(InfoEvent::Superseded { handle: prev.handle }));
            }
            slot.active = Some(Active {
                handle,
                cancel,
                last_progress: 0,
            });
            info!(%handle, %file, "analysis started");
            self.emit(SessionEvent::Started { handle });
            self.emit(SessionEvent::Info(InfoEvent::Submitting { file }));
            self.emit(SessionEvent::Progress { handle, percent: 0 });
        }

        let this = self.clone();
        tokio::spawn(async move {
            let res = outcome.await;
            this.resolve(handle, res);
        });

        handle
    }

    /// Cancel `handle` if it is the running analysis. Returns whether anything was cancelled.
    pub fn cancel(&self, handle: OperationHandle) -> bool {
        let mut slot = self.lock();
        if !slot.is_current(handle) {
            debug!(%handle, "cancel ignored: not the running analysis");
            return false;
        }
        if let Some(active) = slot.active.take() {
            active.cancel.cancel();
            info!(%handle, "analysis cancelled");
            self.emit(SessionEvent::Cancelled { handle });
        }
        true
    }

    /// Cancel whatever is running; a no-op on an idle session.
    pub fn cancel_current(&self) -> Option<OperationHandle> {
        let handle = self.current()?;
        self.cancel(handle).then_some(handle)
    }

    pub fn current(&self) -> Option<OperationHandle> {
        self.lock().active.as_ref().map(|a| a.handle)
    }

    fn progress_sink(&self, handle: OperationHandle) -> ProgressSink {
        let this = self.clone();
        Arc::new(move |percent: u8| {
            let percent = percent.min(100);
            let mut slot = this.lock();
            let Some(active) = slot.active.as_mut().filter(|a| a.handle == handle) else {
                return;
            };
            if percent > active.last_progress {
                active.last_progress = percent;
                this.emit(SessionEvent::Progress { handle, percent });
            }
        })
    }

    /// Deliver a transport outcome, unless `handle` is no longer current.
    fn resolve(&self, handle: OperationHandle, outcome: Result<AnalysisResult, AnalysisError>) {
        let mut slot = self.lock();
        if !slot.is_current(handle) {
            debug!(%handle, ok = outcome.is_ok(), "dropping stale resolution");
            return;
        }
        let Some(active) = slot.active.take() else {
            return;
        };

        match outcome {
            Ok(result) => {
                if active.last_progress < 100 {
                    self.emit(SessionEvent::Progress { handle, percent: 100 });
                }
                info!(%handle, topics = result.topics.len(), points = result.phrase_clusters.len(), "analysis completed");
                self.emit(SessionEvent::Completed {
                    handle,
                    result: Box::new(result),
                });
            }
            Err(AnalysisError::Cancelled) => {
                debug!(%handle, "transport reported cancellation");
                self.emit(SessionEvent::Cancelled { handle });
            }
            Err(e) => {
                warn!(%handle, error = %e, "analysis failed");
                self.emit(SessionEvent::Failed {
                    handle,
                    message: e.to_string(),
                });
            }
        }
    }
}

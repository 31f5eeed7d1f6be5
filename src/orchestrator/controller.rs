//! Session lifecycle controller.
//!
//! Translates presentation-layer commands into orchestrator calls and enforces the
//! optional caller-side deadline.

use super::RequestOrchestrator;
use crate::model::{AnalysisRequest, InfoEvent, OperationHandle, SessionEvent};
use anyhow::Result;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::time::{Duration, Instant};
use tracing::debug;

/// Commands emitted by UI/CLI layers to control the session.
#[derive(Debug, Clone)]
pub(crate) enum SessionCommand {
    Submit(AnalysisRequest),
    Cancel,
    Quit,
}

/// Orchestrate analyses based on session commands until `Quit` or the command channel closes.
pub(crate) async fn run_controller(
    orchestrator: RequestOrchestrator,
    event_tx: UnboundedSender<SessionEvent>,
    mut cmd_rx: UnboundedReceiver<SessionCommand>,
    deadline: Option<Duration>,
) -> Result<()> {
    // Deadline for the current handle; a stale entry is harmless since cancel checks currency.
    let mut pending_deadline: Option<(OperationHandle, Instant)> = None;

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(SessionCommand::Submit(request)) => {
                        let handle = orchestrator.start(request);
                        pending_deadline = deadline.map(|d| (handle, Instant::now() + d));
                    }
                    Some(SessionCommand::Cancel) => {
                        if orchestrator.cancel_current().is_none() {
                            debug!("cancel requested on idle session");
                        }
                        pending_deadline = None;
                    }
                    Some(SessionCommand::Quit) | None => {
                        // Leave nothing running behind; late resolutions are dropped as stale.
                        orchestrator.cancel_current();
                        break Ok(());
                    }
                }
            }
            handle = async {
                match pending_deadline {
                    Some((handle, at)) => {
                        tokio::time::sleep_until(at).await;
                        handle
                    }
                    None => futures::future::pending().await,
                }
            } => {
                pending_deadline = None;
                if orchestrator.cancel(handle) {
                    if let Some(after) = deadline {
                        let _ = event_tx.send(SessionEvent::Info(InfoEvent::DeadlineElapsed {
                            handle,
                            after,
                        }));
                    }
                }
            }
        }
    }
}

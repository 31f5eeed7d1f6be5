//! Transport seam between the orchestrator and the analysis backend.

mod http;

pub(crate) use http::HttpTransport;

use crate::model::{AnalysisRequest, AnalysisResult};
use futures::future::BoxFuture;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tokio::sync::Notify;

/// Failure taxonomy surfaced by transports and the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalysisError {
    /// User intent; ends the loading state but is not shown as an error.
    #[error("Analysis cancelled by user.")]
    Cancelled,
    /// Connectivity, timeout or local I/O failure.
    #[error("{0}")]
    Transport(String),
    /// The backend rejected or failed the request.
    #[error("{0}")]
    Server(String),
}

/// Upload progress callback, percent in 0..=100.
pub type ProgressSink = Arc<dyn Fn(u8) + Send + Sync>;

/// Cooperative cancellation flag shared between the orchestrator and a transport.
#[derive(Debug, Clone, Default)]
pub struct CancelSignal {
    inner: Arc<CancelInner>,
}

#[derive(Debug, Default)]
struct CancelInner {
    flag: AtomicBool,
    notify: Notify,
}

impl CancelSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request abort of the underlying transfer. Idempotent.
    pub fn cancel(&self) {
        self.inner.flag.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.flag.load(Ordering::SeqCst)
    }

    /// Resolves once `cancel` has been called.
    pub async fn cancelled(&self) {
        loop {
            // Register before checking the flag so a concurrent `cancel` is not missed.
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

/// An issued request: its eventual outcome plus the means to abort it.
pub struct Submission {
    pub outcome: BoxFuture<'static, Result<AnalysisResult, AnalysisError>>,
    pub cancel: CancelSignal,
}

/// Backend collaborator that performs the upload/analyze call.
///
/// `submit` must not do any work before the returned future is polled; the
/// orchestrator decides whether the submission becomes current in between.
pub trait Transport: Send + Sync {
    fn submit(&self, request: AnalysisRequest, progress: ProgressSink) -> Submission;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn cancelled_resolves_after_cancel() {
        let signal = CancelSignal::new();
        let waiter = signal.clone();
        let task = tokio::spawn(async move { waiter.cancelled().await });
        tokio::task::yield_now().await;
        assert!(!signal.is_cancelled());
        signal.cancel();
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("cancelled() did not resolve")
            .unwrap();
    }

    #[tokio::test]
    async fn cancelled_returns_immediately_when_already_set() {
        let signal = CancelSignal::new();
        signal.cancel();
        signal.cancel();
        tokio::time::timeout(Duration::from_millis(100), signal.cancelled())
            .await
            .expect("already-cancelled signal should resolve");
    }

    #[test]
    fn error_messages_are_human_readable() {
        assert_eq!(AnalysisError::Cancelled.to_string(), "Analysis cancelled by user.");
        assert_eq!(
            AnalysisError::Server("Invalid file type. Please upload a CSV.".into()).to_string(),
            "Invalid file type. Please upload a CSV."
        );
    }
}

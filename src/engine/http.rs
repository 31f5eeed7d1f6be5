use super::{AnalysisError, CancelSignal, ProgressSink, Submission, Transport};
use crate::model::{AnalysisRequest, AnalysisResult, SessionConfig};
use anyhow::{Context, Result};
use bytes::Bytes;
use futures::{stream, StreamExt};
use reqwest::multipart::{Form, Part};
use tracing::{debug, info};

/// Chunk size for upload stream generation (64 KB)
const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;
const ANALYZE_PATH: &str = "/api/feedback/analyze";
const NETWORK_ERROR: &str = "Network error or server is not responding.";
const UNEXPECTED_ERROR: &str = "An unexpected error occurred.";

/// Multipart upload transport for the feedback analysis endpoint.
pub(crate) struct HttpTransport {
    http: reqwest::Client,
    analyze_url: String,
}

impl HttpTransport {
    pub fn new(cfg: &SessionConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(cfg.user_agent.clone());
        if let Some(timeout) = cfg.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("build HTTP client")?;
        Ok(Self::with_client(http, &cfg.base_url))
    }

    fn with_client(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            analyze_url: format!("{}{}", base_url.trim_end_matches('/'), ANALYZE_PATH),
        }
    }
}

impl Transport for HttpTransport {
    fn submit(&self, request: AnalysisRequest, progress: ProgressSink) -> Submission {
        let cancel = CancelSignal::new();
        let signal = cancel.clone();
        let http = self.http.clone();
        let url = self.analyze_url.clone();

        let outcome = async move {
            tokio::select! {
                biased;
                _ = signal.cancelled() => Err(AnalysisError::Cancelled),
                res = post_analysis(http, url, request, progress, signal.clone()) => {
                    // The body stream aborts with an I/O error once cancelled.
                    if signal.is_cancelled() {
                        Err(AnalysisError::Cancelled)
                    } else {
                        res
                    }
                }
            }
        };

        Submission {
            outcome: Box::pin(outcome),
            cancel,
        }
    }
}

async fn post_analysis(
    http: reqwest::Client,
    url: String,
    request: AnalysisRequest,
    progress: ProgressSink,
    cancel: CancelSignal,
) -> Result<AnalysisResult, AnalysisError> {
    let contents = tokio::fs::read(&request.file).await.map_err(|e| {
        AnalysisError::Transport(format!("Failed to read {}: {e}", request.file.display()))
    })?;
    let file_name = request
        .file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "feedback.csv".to_string());
    let total = contents.len() as u64;
    info!(file = %file_name, bytes = total, "submitting analysis");

    let body = upload_body(Bytes::from(contents), progress, cancel);
    let part = Part::stream_with_length(body, total)
        .file_name(file_name)
        .mime_str("text/csv")
        .map_err(|e| AnalysisError::Transport(format!("Invalid upload part: {e}")))?;
    let form = Form::new().part("file", part);

    let mut query: Vec<(&str, String)> = Vec::new();
    if let Some(topics) = request.topics_query() {
        query.push(("topics", topics));
    }
    if let Some(columns) = request.columns_query() {
        query.push(("columns", columns));
    }

    let resp = http
        .post(&url)
        .query(&query)
        .multipart(form)
        .send()
        .await
        .map_err(transport_error)?;

    let status = resp.status();
    let payload = resp.bytes().await.map_err(transport_error)?;
    debug!(%status, bytes = payload.len(), "analysis response received");

    if !status.is_success() {
        return Err(AnalysisError::Server(server_detail(&payload)));
    }

    serde_json::from_slice::<AnalysisResult>(&payload)
        .map_err(|e| AnalysisError::Server(format!("Malformed analysis response: {e}")))
}

/// Wrap the file contents as a streamed request body.
fn upload_body(contents: Bytes, progress: ProgressSink, cancel: CancelSignal) -> reqwest::Body {
    if contents.is_empty() {
        progress(100);
        return reqwest::Body::from(contents);
    }
    reqwest::Body::wrap_stream(upload_chunks(contents, progress, cancel))
}

/// Stream the file in fixed chunks, reporting progress as each chunk is handed to reqwest.
/// Counting produced chunks is a close approximation of bytes put on the wire.
fn upload_chunks(
    contents: Bytes,
    progress: ProgressSink,
    cancel: CancelSignal,
) -> impl futures::Stream<Item = Result<Bytes, std::io::Error>> + Send + Sync + 'static {
    let total = contents.len();
    let chunks: Vec<Bytes> = (0..total)
        .step_by(UPLOAD_CHUNK_SIZE)
        .map(|start| contents.slice(start..(start + UPLOAD_CHUNK_SIZE).min(total)))
        .collect();

    let mut sent = 0usize;
    stream::iter(chunks).map(move |chunk| {
        if cancel.is_cancelled() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::Interrupted,
                "upload cancelled",
            ));
        }
        sent += chunk.len();
        progress(upload_percent(sent as u64, total as u64));
        Ok(chunk)
    })
}

pub(crate) fn upload_percent(sent: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    let pct = (sent.min(total) as f64 * 100.0 / total as f64).round();
    pct as u8
}

fn transport_error(e: reqwest::Error) -> AnalysisError {
    debug!(error = %e, "transport failure");
    AnalysisError::Transport(NETWORK_ERROR.to_string())
}

/// Extract the backend's `detail` field from an error body.
pub(crate) fn server_detail(body: &[u8]) -> String {
    match serde_json::from_slice::<serde_json::Value>(body) {
        Ok(v) => match v.get("detail") {
            Some(serde_json::Value::String(s)) if !s.trim().is_empty() => s.clone(),
            Some(serde_json::Value::Null) | None => UNEXPECTED_ERROR.to_string(),
            Some(other) => other.to_string(),
        },
        Err(_) => UNEXPECTED_ERROR.to_string(),
    }
}

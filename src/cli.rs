use crate::engine::{AnalysisError, HttpTransport};
use crate::model::{AnalysisRequest, AnalysisResult, SessionConfig, SessionEvent};
use crate::orchestrator::{
    process_completion, run_controller, ProcessedAnalysis, RequestOrchestrator, SessionCommand,
};
use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Output line routing for stdout/stderr writer.
enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Spawn a blocking writer for stdout/stderr to avoid blocking async tasks.
fn spawn_output_writer() -> (
    mpsc::UnboundedSender<OutputLine>,
    tokio::task::JoinHandle<()>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
    let handle = tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        let mut out = std::io::LineWriter::new(stdout.lock());
        let mut err = std::io::LineWriter::new(stderr.lock());

        while let Some(line) = rx.blocking_recv() {
            match line {
                OutputLine::Stdout(msg) => {
                    let _ = writeln!(out, "{}", msg);
                }
                OutputLine::Stderr(msg) => {
                    let _ = writeln!(err, "{}", msg);
                }
            }
        }

        let _ = out.flush();
        let _ = err.flush();
    });
    (tx, handle)
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "feedback-explorer",
    version,
    about = "Submit a feedback CSV for analysis and summarise topics, sentiment and phrase clusters"
)]
pub struct Cli {
    /// CSV file with the feedback to analyse
    pub file: std::path::PathBuf,

    /// Base URL of the analysis service
    #[arg(long, env = "FEEDBACK_API_URL", default_value = "http://localhost:8000")]
    pub base_url: String,

    /// Only analyse these topics (comma-separated, e.g. "Price, UI")
    #[arg(long, default_value = "")]
    pub topics: String,

    /// Columns to read from the CSV (comma-separated, e.g. "Text, Rating")
    #[arg(long, default_value = "")]
    pub columns: String,

    /// Print JSON result and geometry instead of the text summary
    #[arg(long)]
    pub json: bool,

    /// Print the text summary (default)
    #[arg(long, conflicts_with = "json")]
    pub text: bool,

    /// Run silently: suppress all output except errors (for cron usage)
    #[arg(long)]
    pub silent: bool,

    /// Cancel the analysis if it has not finished after this long (e.g. 5m)
    #[arg(long)]
    pub timeout: Option<humantime::Duration>,

    /// Transport-level timeout for the HTTP exchange
    #[arg(long, default_value = "10m")]
    pub request_timeout: humantime::Duration,

    /// Export result and cluster geometry as JSON
    #[arg(long)]
    pub export_json: Option<std::path::PathBuf>,

    /// Log filter for diagnostics on stderr (overrides RUST_LOG)
    #[arg(long)]
    pub log_level: Option<String>,
}

/// Build a `SessionConfig` from CLI arguments.
pub fn build_config(args: &Cli) -> SessionConfig {
    SessionConfig {
        base_url: args.base_url.clone(),
        user_agent: format!("feedback-explorer/{}", env!("CARGO_PKG_VERSION")),
        request_timeout: Some(Duration::from(args.request_timeout)),
        deadline: args.timeout.map(Duration::from),
    }
}

/// Build the analysis request from CLI arguments.
pub fn build_request(args: &Cli) -> AnalysisRequest {
    AnalysisRequest::new(args.file.clone())
        .with_topics(&args.topics)
        .with_columns(&args.columns)
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    result: &'a AnalysisResult,
    geometry: &'a crate::geometry::ClusterGeometry,
}

/// How the session ended.
enum Outcome {
    Completed(Box<AnalysisResult>),
    Failed(String),
    Cancelled,
}

pub async fn run(args: Cli) -> Result<()> {
    // Validate that --silent can only be used with --json
    if args.silent && !args.json {
        return Err(anyhow::anyhow!(
            "--silent can only be used with --json. Use --silent --json together."
        ));
    }
    if !args.file.is_file() {
        anyhow::bail!("input file not found: {}", args.file.display());
    }

    let cfg = build_config(&args);
    let transport = HttpTransport::new(&cfg).context("failed to set up transport")?;

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<SessionEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<SessionCommand>();
    let orchestrator = RequestOrchestrator::new(Arc::new(transport), event_tx.clone());
    let controller = tokio::spawn(run_controller(orchestrator, event_tx, cmd_rx, cfg.deadline));

    // Ctrl-C cancels the running analysis rather than killing the process.
    let cancel_tx = cmd_tx.clone();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = cancel_tx.send(SessionCommand::Cancel);
        }
    });

    let (out_tx, out_handle) = if args.silent {
        (None, None)
    } else {
        let (tx, handle) = spawn_output_writer();
        (Some(tx), Some(handle))
    };
    let status = |line: String| {
        if let Some(tx) = out_tx.as_ref() {
            let _ = tx.send(OutputLine::Stderr(line));
        }
    };

    cmd_tx
        .send(SessionCommand::Submit(build_request(&args)))
        .context("session controller stopped")?;

    let outcome = loop {
        let Some(ev) = event_rx.recv().await else {
            break Outcome::Failed("session ended unexpectedly".into());
        };
        match ev {
            SessionEvent::Started { handle } => status(format!("Analysis {handle} started")),
            SessionEvent::Progress { percent, .. } => status(format!("Uploading: {percent}%")),
            SessionEvent::Info(info) => status(info.to_message()),
            SessionEvent::Completed { result, .. } => break Outcome::Completed(result),
            SessionEvent::Failed { message, .. } => break Outcome::Failed(message),
            SessionEvent::Cancelled { .. } => break Outcome::Cancelled,
        }
    };

    let _ = cmd_tx.send(SessionCommand::Quit);
    ctrl_c.abort();
    controller
        .await
        .context("session controller task failed")??;

    let res = match outcome {
        Outcome::Completed(result) => {
            let processed = process_completion(&args, &result);
            for msg in &processed.export_messages {
                status(msg.clone());
            }
            if args.export_json.is_some() && processed.exported_path.is_none() {
                Err(anyhow::anyhow!("failed to export analysis"))
            } else {
                render_result(&args, out_tx.as_ref(), &result, processed)
            }
        }
        Outcome::Failed(message) => Err(anyhow::anyhow!(message)),
        // Cron callers need a non-zero exit to tell an aborted run from a finished one.
        Outcome::Cancelled if args.silent => Err(anyhow::anyhow!(AnalysisError::Cancelled)),
        Outcome::Cancelled => {
            status("Analysis cancelled.".to_string());
            Ok(())
        }
    };

    drop(out_tx);
    if let Some(handle) = out_handle {
        let _ = handle.await;
    }

    res
}

/// Send the completed analysis to stdout in the selected format.
fn render_result(
    args: &Cli,
    out_tx: Option<&mpsc::UnboundedSender<OutputLine>>,
    result: &AnalysisResult,
    processed: ProcessedAnalysis,
) -> Result<()> {
    let Some(tx) = out_tx else {
        return Ok(());
    };
    if args.json {
        let out = serde_json::to_string_pretty(&JsonOutput {
            result,
            geometry: &processed.geometry,
        })
        .context("failed to serialize analysis")?;
        let _ = tx.send(OutputLine::Stdout(out));
    } else {
        for line in processed.summary.lines {
            let _ = tx.send(OutputLine::Stdout(line));
        }
    }
    Ok(())
}

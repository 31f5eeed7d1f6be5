//! Application-level orchestration.
//!
//! This module owns the analysis lifecycle (submit/cancel/supersede) and post-run
//! processing such as cluster geometry, summaries and exports. UI/CLI layers call
//! into this module to keep responsibilities separated.

mod controller;
mod post_process;
mod session;

pub(crate) use controller::{run_controller, SessionCommand};
pub(crate) use post_process::{process_completion, ProcessedAnalysis};
pub(crate) use session::RequestOrchestrator;

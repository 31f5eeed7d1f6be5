//! Post-analysis processing utilities.
//!
//! Derives cluster geometry, the text summary and exports once an analysis completes.

use crate::cli::Cli;
use crate::geometry::{compute_geometry, ClusterGeometry};
use crate::model::AnalysisResult;
use crate::text_summary::{build_text_summary, TextSummary};

/// Result of post-analysis processing, ready for presentation layers.
pub(crate) struct ProcessedAnalysis {
    pub geometry: ClusterGeometry,
    pub summary: TextSummary,
    pub export_messages: Vec<String>,
    pub exported_path: Option<std::path::PathBuf>,
}

/// Process a completed analysis: compute geometry, build the summary and run exports.
pub(crate) fn process_completion(args: &Cli, result: &AnalysisResult) -> ProcessedAnalysis {
    let geometry = compute_geometry(&result.phrase_clusters);
    let summary = build_text_summary(result, &geometry);

    let mut export_messages = Vec::new();
    let mut exported_path = None;
    if let Some(export_path) = args.export_json.as_deref() {
        let source = args.file.to_str();
        match crate::export::export_json(export_path, source, result, &geometry) {
            Ok(p) => {
                export_messages.push(format!("Exported JSON: {}", p.display()));
                exported_path = Some(p);
            }
            Err(e) => export_messages.push(format!("Export JSON failed: {e:#}")),
        }
    }

    ProcessedAnalysis {
        geometry,
        summary,
        export_messages,
        exported_path,
    }
}

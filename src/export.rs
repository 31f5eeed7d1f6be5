//! JSON export of an analysis together with its cluster geometry.

use crate::geometry::ClusterGeometry;
use crate::model::AnalysisResult;
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Serialize)]
struct ExportEnvelope<'a> {
    generated_at: String,
    source_file: Option<&'a str>,
    result: &'a AnalysisResult,
    geometry: &'a ClusterGeometry,
}

/// Write `result` and `geometry` as pretty JSON to `path`, creating parent directories.
pub fn export_json(
    path: &Path,
    source_file: Option<&str>,
    result: &AnalysisResult,
    geometry: &ClusterGeometry,
) -> Result<PathBuf> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create export directory {}", parent.display()))?;
    }

    let envelope = ExportEnvelope {
        generated_at: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_else(|_| "now".into()),
        source_file,
        result,
        geometry,
    };
    let json = serde_json::to_string_pretty(&envelope).context("serialize export")?;
    std::fs::write(path, json).with_context(|| format!("write export {}", path.display()))?;
    Ok(path.to_path_buf())
}

//! Text summary builder for CLI output.
//!
//! This module computes metrics and formats human-readable lines for text mode.

use crate::geometry::{ClusterGeometry, HullKind};
use crate::metrics;
use crate::model::AnalysisResult;

/// Pre-formatted lines for text output.
pub(crate) struct TextSummary {
    pub lines: Vec<String>,
}

/// Build a text summary from an analysis result and its cluster geometry.
pub(crate) fn build_text_summary(result: &AnalysisResult, geometry: &ClusterGeometry) -> TextSummary {
    let mut lines = Vec::new();

    if let Some(name) = result.filename.as_deref() {
        lines.push(format!("File: {name}"));
    }
    if !result.summary.trim().is_empty() {
        lines.push(format!("Summary: {}", result.summary.trim()));
    }

    let s = result.sentiment;
    let total = s.total();
    lines.push(format!(
        "Sentiment: positive {} ({:.1}%) negative {} ({:.1}%) neutral {} ({:.1}%)",
        s.positive,
        metrics::percent(s.positive, total),
        s.negative,
        metrics::percent(s.negative, total),
        s.neutral,
        metrics::percent(s.neutral, total),
    ));

    if !result.topics.is_empty() {
        lines.push(format!("Topics ({}):", result.topics.len()));
        for b in result
            .topics
            .iter()
            .filter_map(|t| metrics::topic_breakdown(result, &t.name))
        {
            lines.push(format!(
                "  {:<30} {:>6}  [+{} -{} ={}] {} rows",
                b.name,
                b.count,
                b.sentiments.positive,
                b.sentiments.negative,
                b.sentiments.neutral,
                b.feedback.len()
            ));
            if !b.summary.trim().is_empty() {
                lines.push(format!("    {}", b.summary.trim()));
            }
        }
    }

    lines.push(format!("Feedback rows: {}", result.feedback_analysis.len()));

    match metrics::reply_score_metrics(result) {
        Some((mean, median, p25, p75)) => lines.push(format!(
            "Reply scores: avg {:.2} med {:.2} p25 {:.2} p75 {:.2} ({} replies)",
            mean,
            median,
            p25,
            p75,
            result.feedback_replies.len()
        )),
        None => lines.push(format!("Replies: {}", result.feedback_replies.len())),
    }

    if geometry.is_empty() {
        lines.push("Phrase clusters: none".to_string());
    } else {
        lines.push(format!(
            "Phrase clusters ({} clusters, {} points):",
            geometry.clusters.len(),
            geometry.point_count()
        ));
        for (id, shape) in &geometry.clusters {
            let boundary = match shape.kind {
                HullKind::None => "no boundary".to_string(),
                HullKind::Segment => "segment".to_string(),
                // Closed polygons repeat their first vertex.
                HullKind::Polygon => format!("hull of {} vertices", shape.hull.len() - 1),
            };
            lines.push(format!(
                "  cluster {:<6} {:>5} points, {}",
                id.to_string(),
                shape.points.len(),
                boundary
            ));
        }
    }

    if let Some(b) = geometry.bounds {
        lines.push(format!(
            "Plot bounds: x [{:.3}, {:.3}] y [{:.3}, {:.3}]",
            b.x_min, b.x_max, b.y_min, b.y_max
        ));
    }

    TextSummary { lines }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::compute_geometry;
    use crate::model::{ClusterId, PhrasePoint, SentimentCounts, Topic};

    #[test]
    fn summary_lists_topics_and_clusters() {
        let result = AnalysisResult {
            summary: "Users like the UI.".into(),
            sentiment: SentimentCounts {
                positive: 3,
                negative: 1,
                neutral: 0,
            },
            topics: vec![Topic {
                name: "UI".into(),
                count: 4,
                summary: String::new(),
            }],
            phrase_clusters: vec![
                PhrasePoint { x: 0.0, y: 0.0, cluster: ClusterId(0), phrase: "a".into() },
                PhrasePoint { x: 2.0, y: 0.0, cluster: ClusterId(0), phrase: "b".into() },
                PhrasePoint { x: 1.0, y: 2.0, cluster: ClusterId(0), phrase: "c".into() },
                PhrasePoint { x: 5.0, y: 5.0, cluster: ClusterId::NOISE, phrase: "d".into() },
            ],
            ..Default::default()
        };
        let geometry = compute_geometry(&result.phrase_clusters);
        let text = build_text_summary(&result, &geometry).lines.join("\n");

        assert!(text.contains("Summary: Users like the UI."));
        assert!(text.contains("positive 3 (75.0%)"));
        assert!(text.contains("UI"));
        assert!(text.contains("hull of 3 vertices"));
        assert!(text.contains("cluster noise"));
        assert!(text.contains("Plot bounds"));
    }

    #[test]
    fn summary_handles_empty_result() {
        let result = AnalysisResult::default();
        let text = build_text_summary(&result, &compute_geometry(&[])).lines.join("\n");
        assert!(text.contains("Phrase clusters: none"));
        assert!(!text.contains("Plot bounds"));
    }
}

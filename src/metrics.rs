use crate::model::{AnalysisResult, FeedbackRow, SentimentCounts};

/// Compute metrics (mean, median, 25th percentile, 75th percentile) from samples
pub fn compute_metrics(samples: &[f64]) -> Option<(f64, f64, f64, f64)> {
    if samples.len() < 2 {
        return None;
    }
    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let n = sorted.len();
    let mean = samples.iter().sum::<f64>() / samples.len() as f64;
    let median = sorted[n / 2];
    let p25 = sorted[n / 4];
    let p75 = sorted[3 * n / 4];
    Some((mean, median, p25, p75))
}

/// Metrics over the scores of generated replies.
pub fn reply_score_metrics(result: &AnalysisResult) -> Option<(f64, f64, f64, f64)> {
    let scores: Vec<f64> = result
        .feedback_replies
        .iter()
        .map(|r| r.score)
        .filter(|s| s.is_finite())
        .collect();
    compute_metrics(&scores)
}

/// Share of `part` in `total` as a percentage, 0 for an empty total.
pub fn percent(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 * 100.0 / total as f64
    }
}

/// Drill-down view of a single topic.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicBreakdown<'a> {
    pub name: &'a str,
    pub summary: &'a str,
    pub count: u64,
    pub sentiments: SentimentCounts,
    pub feedback: Vec<&'a FeedbackRow>,
}

/// Collect the feedback rows and sentiment split for `topic`.
pub fn topic_breakdown<'a>(result: &'a AnalysisResult, topic: &str) -> Option<TopicBreakdown<'a>> {
    let t = result.topics.iter().find(|t| t.name == topic)?;
    let feedback: Vec<&FeedbackRow> = result
        .feedback_analysis
        .iter()
        .filter(|row| row.topic == t.name)
        .collect();
    Some(TopicBreakdown {
        name: &t.name,
        summary: &t.summary,
        count: t.count,
        sentiments: SentimentCounts::tally(feedback.iter().copied()),
        feedback,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ReplyRow, Sentiment, Topic};

    fn row(text: &str, topic: &str, sentiment: Sentiment) -> FeedbackRow {
        FeedbackRow {
            text: text.into(),
            topic: topic.into(),
            sentiment,
        }
    }

    #[test]
    fn metrics_need_two_samples() {
        assert_eq!(compute_metrics(&[1.0]), None);
        let (mean, median, p25, p75) = compute_metrics(&[4.0, 1.0, 3.0, 2.0]).unwrap();
        assert_eq!(mean, 2.5);
        assert_eq!(median, 3.0);
        assert_eq!(p25, 2.0);
        assert_eq!(p75, 4.0);
    }

    #[test]
    fn reply_scores_feed_metrics() {
        let result = AnalysisResult {
            feedback_replies: vec![
                ReplyRow {
                    feedback_text: "a".into(),
                    feedback_reply: "thanks".into(),
                    score: 8.0,
                },
                ReplyRow {
                    feedback_text: "b".into(),
                    feedback_reply: "sorry".into(),
                    score: 6.0,
                },
            ],
            ..Default::default()
        };
        let (mean, ..) = reply_score_metrics(&result).unwrap();
        assert_eq!(mean, 7.0);
    }

    #[test]
    fn percent_handles_zero_total() {
        assert_eq!(percent(3, 0), 0.0);
        assert_eq!(percent(1, 4), 25.0);
    }

    #[test]
    fn topic_breakdown_filters_rows() {
        let result = AnalysisResult {
            topics: vec![Topic {
                name: "Pricing".into(),
                count: 2,
                summary: "Too expensive".into(),
            }],
            feedback_analysis: vec![
                row("costly", "Pricing", Sentiment::Negative),
                row("fair", "Pricing", Sentiment::Positive),
                row("slow", "Performance", Sentiment::Negative),
            ],
            ..Default::default()
        };
        let b = topic_breakdown(&result, "Pricing").unwrap();
        assert_eq!(b.feedback.len(), 2);
        assert_eq!(b.sentiments.negative, 1);
        assert_eq!(b.sentiments.positive, 1);
        assert_eq!(b.summary, "Too expensive");
        assert!(topic_breakdown(&result, "Unknown").is_none());
    }
}

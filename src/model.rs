use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Session configuration derived from CLI arguments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub base_url: String,
    pub user_agent: String,
    /// Transport-level timeout applied to the whole HTTP exchange.
    #[serde(default, with = "humantime_serde")]
    pub request_timeout: Option<Duration>,
    /// Caller-side deadline after which the running analysis is cancelled.
    #[serde(default, with = "humantime_serde")]
    pub deadline: Option<Duration>,
}

/// One submission to the analysis backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub file: PathBuf,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub columns: Vec<String>,
}

impl AnalysisRequest {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            topics: Vec::new(),
            columns: Vec::new(),
        }
    }

    pub fn with_topics(mut self, raw: &str) -> Self {
        self.topics = parse_list(raw);
        self
    }

    pub fn with_columns(mut self, raw: &str) -> Self {
        self.columns = parse_list(raw);
        self
    }

    /// Value for the `topics` query parameter, `None` when no filter is set.
    pub fn topics_query(&self) -> Option<String> {
        join_non_empty(&self.topics)
    }

    /// Value for the `columns` query parameter, `None` to use the backend defaults.
    pub fn columns_query(&self) -> Option<String> {
        join_non_empty(&self.columns)
    }
}

/// Split a comma-separated user string into trimmed, non-empty, de-duplicated entries.
pub fn parse_list(raw: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for item in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if !out.iter().any(|existing| existing == item) {
            out.push(item.to_string());
        }
    }
    out
}

fn join_non_empty(items: &[String]) -> Option<String> {
    if items.is_empty() {
        None
    } else {
        Some(items.join(","))
    }
}

/// Opaque token for one started analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OperationHandle(pub(crate) u64);

impl fmt::Display for OperationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Cluster label assigned by the backend clusterer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ClusterId(pub i64);

impl ClusterId {
    /// Label for points the density clusterer left unassigned.
    pub const NOISE: ClusterId = ClusterId(-1);

    pub fn is_noise(self) -> bool {
        self == Self::NOISE
    }
}

impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_noise() {
            write!(f, "noise")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

// The clustering backend stringifies its labels, older payloads carry integers.
impl<'de> Deserialize<'de> for ClusterId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(i64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Int(v) => Ok(ClusterId(v)),
            Raw::Text(s) => s
                .trim()
                .parse::<i64>()
                .map(ClusterId)
                .map_err(|_| serde::de::Error::custom(format!("invalid cluster id: {s:?}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
    Other(String),
}

impl Sentiment {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "positive" => Sentiment::Positive,
            "negative" => Sentiment::Negative,
            "neutral" => Sentiment::Neutral,
            _ => Sentiment::Other(raw.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Sentiment::Positive => "Positive",
            Sentiment::Negative => "Negative",
            Sentiment::Neutral => "Neutral",
            Sentiment::Other(s) => s,
        }
    }
}

impl Serialize for Sentiment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Sentiment {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Sentiment::parse(&raw))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentCounts {
    #[serde(default)]
    pub positive: u64,
    #[serde(default)]
    pub negative: u64,
    #[serde(default)]
    pub neutral: u64,
}

impl SentimentCounts {
    pub fn total(&self) -> u64 {
        self.positive + self.negative + self.neutral
    }

    /// Count rows by sentiment; unrecognised labels are not counted.
    pub fn tally<'a>(rows: impl IntoIterator<Item = &'a FeedbackRow>) -> Self {
        rows.into_iter()
            .fold(Self::default(), |mut acc, row| {
                match row.sentiment {
                    Sentiment::Positive => acc.positive += 1,
                    Sentiment::Negative => acc.negative += 1,
                    Sentiment::Neutral => acc.neutral += 1,
                    Sentiment::Other(_) => {}
                }
                acc
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    #[serde(rename = "topic")]
    pub name: String,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRow {
    pub text: String,
    #[serde(default)]
    pub topic: String,
    pub sentiment: Sentiment,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyRow {
    pub feedback_text: String,
    pub feedback_reply: String,
    #[serde(default)]
    pub score: f64,
}

/// A phrase embedded in 2-D with its cluster label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhrasePoint {
    pub x: f64,
    pub y: f64,
    pub cluster: ClusterId,
    #[serde(default)]
    pub phrase: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub sentiment: SentimentCounts,
    #[serde(default)]
    pub topics: Vec<Topic>,
    #[serde(default)]
    pub feedback_analysis: Vec<FeedbackRow>,
    #[serde(default)]
    pub feedback_replies: Vec<ReplyRow>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub phrase_clusters: Vec<PhrasePoint>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Events emitted by the orchestrator and consumed by UI/CLI layers.
#[derive(Debug, Clone, Serialize)]
pub enum SessionEvent {
    Started {
        handle: OperationHandle,
    },
    Progress {
        handle: OperationHandle,
        percent: u8,
    },
    Completed {
        handle: OperationHandle,
        // Boxed to keep the enum small; results carry every feedback row.
        result: Box<AnalysisResult>,
    },
    Failed {
        handle: OperationHandle,
        message: String,
    },
    Cancelled {
        handle: OperationHandle,
    },
    Info(InfoEvent),
}

impl SessionEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionEvent::Completed { .. } | SessionEvent::Failed { .. } | SessionEvent::Cancelled { .. }
        )
    }
}

/// Structured info events for status lines.
#[derive(Debug, Clone, Serialize)]
pub enum InfoEvent {
    Submitting { file: String },
    Superseded { handle: OperationHandle },
    DeadlineElapsed { handle: OperationHandle, after: Duration },
}

impl InfoEvent {
    /// Render a human-readable message for UI/CLI layers.
    pub fn to_message(&self) -> String {
        match self {
            InfoEvent::Submitting { file } => format!("Uploading {}", file),
            InfoEvent::Superseded { handle } => {
                format!("Analysis {} superseded by a newer submission", handle)
            }
            InfoEvent::DeadlineElapsed { handle, after } => format!(
                "Analysis {} cancelled after {}",
                handle,
                humantime::format_duration(*after)
            ),
        }
    }
}

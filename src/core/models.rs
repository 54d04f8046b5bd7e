use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

pub const SUPPORTED_RUN_LANGUAGES: [&str; 4] = ["python", "cpp", "java", "javascript"];

const THUMBNAIL_BASE: &str = "https://img.youtube.com/vi";

/// Identity of one polling/refresh session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TopicKey {
    pub language: String,
    pub topic: String,
}

impl TopicKey {
    pub fn new(language: impl Into<String>, topic: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            topic: topic.into(),
        }
    }
}

impl fmt::Display for TopicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.language, self.topic)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoRecord {
    pub video_id: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl VideoRecord {
    pub fn thumbnail_url(&self) -> String {
        format!("{}/{}/0.jpg", THUMBNAIL_BASE, self.video_id)
    }
}

/// Payload of the job status endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoResults {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub videos: Vec<VideoRecord>,
    #[serde(default)]
    pub fetching: Option<bool>,
    #[serde(default)]
    pub current: Option<u32>,
    #[serde(default)]
    pub total: Option<u32>,
    #[serde(default)]
    pub error: Option<String>,
}

impl VideoResults {
    pub fn is_ok(&self) -> bool {
        self.status.as_deref() == Some("ok")
    }

    /// True while the server reports the curation job as still running.
    pub fn is_fetching(&self) -> bool {
        self.fetching.unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoadmapResponse {
    #[serde(default)]
    pub roadmap: Option<Value>,
}

impl RoadmapResponse {
    /// Topic names from `roadmap.topics`. Entries may be plain strings or
    /// objects carrying a `name`; anything else is skipped.
    pub fn topic_names(&self) -> Vec<String> {
        let Some(topics) = self
            .roadmap
            .as_ref()
            .and_then(|r| r.get("topics"))
            .and_then(Value::as_array)
        else {
            return Vec::new();
        };

        topics
            .iter()
            .filter_map(|entry| match entry {
                Value::String(name) => Some(name.clone()),
                Value::Object(obj) => obj.get("name").and_then(Value::as_str).map(str::to_string),
                _ => None,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DefinitionResponse {
    #[serde(default)]
    pub summary: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub input_format: Option<String>,
    #[serde(default)]
    pub output_format: Option<String>,
    #[serde(default)]
    pub example_input: Option<String>,
    #[serde(default)]
    pub example_output: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum QuestionKind {
    Coding,
    Theory,
}

impl QuestionKind {
    pub fn label(&self) -> &'static str {
        match self {
            QuestionKind::Coding => "Coding",
            QuestionKind::Theory => "Theory",
        }
    }
}

fn field_is_empty(field: Option<&str>) -> bool {
    match field.map(str::trim) {
        None => true,
        Some(value) => value.is_empty() || value.eq_ignore_ascii_case("none"),
    }
}

impl Question {
    fn format_fields(&self) -> [(&'static str, Option<&str>); 4] {
        [
            ("Input Format", self.input_format.as_deref()),
            ("Output Format", self.output_format.as_deref()),
            ("Example Input", self.example_input.as_deref()),
            ("Example Output", self.example_output.as_deref()),
        ]
    }

    pub fn kind(&self) -> QuestionKind {
        let empty = self
            .format_fields()
            .iter()
            .filter(|(_, value)| field_is_empty(*value))
            .count();

        if empty < 3 {
            QuestionKind::Coding
        } else {
            QuestionKind::Theory
        }
    }

    /// Labelled format/example fields that carry content.
    pub fn present_fields(&self) -> Vec<(&'static str, &str)> {
        self.format_fields()
            .into_iter()
            .filter(|(_, value)| !field_is_empty(*value))
            .filter_map(|(label, value)| value.map(|v| (label, v.trim())))
            .collect()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuestionsResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(default)]
    pub message: Option<String>,
}

impl QuestionsResponse {
    /// Questions to list. A non-ok status shows none.
    pub fn listed(&self) -> &[Question] {
        if self.status.as_deref() == Some("ok") {
            &self.questions
        } else {
            &[]
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunRequest {
    pub source_code: String,
    pub language: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RunResult {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub stdout: Option<String>,
    #[serde(default)]
    pub compile_output: Option<String>,
    #[serde(default)]
    pub stderr: Option<String>,
    #[serde(default)]
    pub status: Option<Value>,
}

impl RunResult {
    pub fn status_text(&self) -> String {
        match &self.status {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Object(obj)) => obj
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or("unknown")
                .to_string(),
            Some(other) => other.to_string(),
            None => "unknown".to_string(),
        }
    }

    /// Text shown for a finished run: the first non-empty output stream
    /// followed by the status line, or the server error.
    pub fn display_text(&self) -> String {
        if let Some(error) = &self.error {
            return error.clone();
        }

        let output = [&self.stdout, &self.compile_output, &self.stderr]
            .into_iter()
            .flatten()
            .find(|s| !s.is_empty())
            .map(String::as_str)
            .unwrap_or("No output");

        format!("{}\n\nStatus: {}", output, self.status_text())
    }
}

/// Persisted cursor and selection for one language's topic list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionState {
    #[serde(default)]
    pub scroll_index: usize,
    #[serde(default)]
    pub selected_index: Option<usize>,
    pub updated_at: DateTime<Utc>,
}

impl Default for SelectionState {
    fn default() -> Self {
        Self {
            scroll_index: 0,
            selected_index: None,
            updated_at: Utc::now(),
        }
    }
}

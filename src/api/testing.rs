use crate::api::{ApiError, RoadmapApi};
use crate::core::models::{
    Question, QuestionsResponse, RunRequest, RunResult, TopicKey, VideoRecord, VideoResults,
};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, PartialEq)]
pub enum ApiCall {
    FetchRoadmap(String),
    GenerateRoadmap(String),
    Definition(TopicKey),
    Trigger(TopicKey),
    FetchVideos(TopicKey),
    Questions(String),
    Run(String),
}

#[derive(Debug, Clone)]
pub enum Scripted {
    Results(VideoResults),
    Failure,
}

/// In-memory `RoadmapApi` that replays scripted video responses and records
/// every call with the (tokio) time it was issued.
#[derive(Default)]
pub struct ScriptedApi {
    calls: Mutex<Vec<(Instant, ApiCall)>>,
    videos: Mutex<HashMap<String, VecDeque<Scripted>>>,
    latency: Mutex<Duration>,
    topics: Mutex<Vec<String>>,
    fail_definition: Mutex<bool>,
    questions_status: Mutex<Option<String>>,
}

pub fn video(id: &str) -> VideoRecord {
    VideoRecord {
        video_id: id.to_string(),
        url: format!("https://www.youtube.com/watch?v={}", id),
        title: format!("Video {}", id),
        description: Some(format!("About {}", id)),
    }
}

pub fn fetching(videos: Vec<VideoRecord>) -> VideoResults {
    VideoResults {
        status: Some("ok".to_string()),
        videos,
        fetching: Some(true),
        ..VideoResults::default()
    }
}

pub fn finished(videos: Vec<VideoRecord>) -> VideoResults {
    VideoResults {
        status: Some("ok".to_string()),
        videos,
        fetching: Some(false),
        ..VideoResults::default()
    }
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_topics(topics: &[&str]) -> Self {
        let api = Self::new();
        *api.topics.lock().unwrap() = topics.iter().map(|t| t.to_string()).collect();
        api
    }

    /// Queues responses for `topic`. The last queued response repeats.
    pub fn script(&self, topic: &str, responses: Vec<Scripted>) {
        self.videos
            .lock()
            .unwrap()
            .entry(topic.to_string())
            .or_default()
            .extend(responses);
    }

    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = latency;
    }

    /// Status reported by question fetches. Defaults to "ok".
    pub fn set_questions_status(&self, status: &str) {
        *self.questions_status.lock().unwrap() = Some(status.to_string());
    }

    pub fn fail_definitions(&self) {
        *self.fail_definition.lock().unwrap() = true;
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.calls.lock().unwrap().iter().map(|(_, c)| c.clone()).collect()
    }

    /// Issue times of video fetches for `topic`.
    pub fn fetch_times(&self, topic: &str) -> Vec<Instant> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter_map(|(at, call)| match call {
                ApiCall::FetchVideos(key) if key.topic == topic => Some(*at),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, predicate: impl Fn(&ApiCall) -> bool) -> usize {
        self.calls().iter().filter(|c| predicate(c)).count()
    }

    fn record(&self, call: ApiCall) {
        self.calls.lock().unwrap().push((Instant::now(), call));
    }

    fn next_video_response(&self, topic: &str) -> Scripted {
        let mut videos = self.videos.lock().unwrap();
        match videos.get_mut(topic) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or(Scripted::Failure),
            Some(queue) => queue
                .front()
                .cloned()
                .unwrap_or_else(|| Scripted::Results(fetching(Vec::new()))),
            None => Scripted::Results(fetching(Vec::new())),
        }
    }
}

#[async_trait]
impl RoadmapApi for ScriptedApi {
    async fn fetch_roadmap(&self, language: &str) -> Result<Vec<String>, ApiError> {
        self.record(ApiCall::FetchRoadmap(language.to_string()));
        Ok(self.topics.lock().unwrap().clone())
    }

    async fn generate_roadmap(&self, language: &str) -> Result<(), ApiError> {
        self.record(ApiCall::GenerateRoadmap(language.to_string()));
        Ok(())
    }

    async fn topic_definition(&self, key: &TopicKey) -> Result<Option<String>, ApiError> {
        self.record(ApiCall::Definition(key.clone()));
        if *self.fail_definition.lock().unwrap() {
            return Err(ApiError::Status {
                status: 500,
                message: "definition engine down".to_string(),
            });
        }
        Ok(Some(format!("{} in {}", key.topic, key.language)))
    }

    async fn trigger_fetch(&self, key: &TopicKey) -> Result<Value, ApiError> {
        self.record(ApiCall::Trigger(key.clone()));
        Ok(json!({ "status": "processing" }))
    }

    async fn fetch_videos(&self, key: &TopicKey) -> Result<VideoResults, ApiError> {
        self.record(ApiCall::FetchVideos(key.clone()));

        let latency = *self.latency.lock().unwrap();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        match self.next_video_response(&key.topic) {
            Scripted::Results(results) => Ok(results),
            Scripted::Failure => Err(ApiError::Status {
                status: 502,
                message: "bad gateway".to_string(),
            }),
        }
    }

    async fn fetch_questions(&self, video_id: &str) -> Result<QuestionsResponse, ApiError> {
        self.record(ApiCall::Questions(video_id.to_string()));
        let status = self
            .questions_status
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| "ok".to_string());
        Ok(QuestionsResponse {
            status: Some(status),
            questions: vec![Question {
                title: "Question 1".to_string(),
                description: format!("Explain {}", video_id),
                ..Question::default()
            }],
            message: None,
        })
    }

    async fn run_code(&self, request: &RunRequest) -> Result<RunResult, ApiError> {
        self.record(ApiCall::Run(request.language.clone()));
        Ok(RunResult {
            stdout: Some(request.source_code.clone()),
            status: Some(json!("Accepted")),
            ..RunResult::default()
        })
    }
}

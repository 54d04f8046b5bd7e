use crate::api::{validate_language, ApiError, RoadmapApi};
use crate::core::models::{
    DefinitionResponse, QuestionsResponse, RoadmapResponse, RunRequest, RunResult, TopicKey,
    VideoResults,
};
use crate::core::settings::ServerSettings;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, COOKIE};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

const CSRF_HEADER: &str = "X-CSRFToken";

const ROADMAP_PATH: &str = "/roadmap/";
const GENERATE_PATH: &str = "/generate_roadmap/";
const DEFINITION_PATH: &str = "/get_topic/";
const TRIGGER_PATH: &str = "/get_videos/";
const VIDEOS_PATH: &str = "/get_filtered_videos/";
const QUESTIONS_PATH: &str = "/get_questions/";
const RUN_PATH: &str = "/run_code/";

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// `RoadmapApi` over the server's JSON endpoints.
pub struct HttpApi {
    client: reqwest::Client,
    base_url: String,
    headers: HeaderMap,
}

impl HttpApi {
    pub fn new(settings: &ServerSettings) -> Result<Self> {
        let mut headers = HeaderMap::new();

        if let Some(cookie) = &settings.session_cookie {
            headers.insert(
                COOKIE,
                HeaderValue::from_str(cookie).context("Invalid server.session_cookie")?,
            );
        }
        if let Some(token) = &settings.csrf_token {
            headers.insert(
                CSRF_HEADER,
                HeaderValue::from_str(token).context("Invalid server.csrf_token")?,
            );
        }

        let client = reqwest::Client::builder()
            .timeout(settings.request_timeout())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            headers,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get_request(&self, path: &str, query: &[(&str, &str)]) -> RequestBuilder {
        self.client
            .get(self.url(path))
            .headers(self.headers.clone())
            .query(query)
    }

    fn post_request<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> RequestBuilder {
        self.client
            .post(self.url(path))
            .headers(self.headers.clone())
            .json(body)
    }

    fn topic_request(&self, path: &str, key: &TopicKey) -> RequestBuilder {
        self.get_request(
            path,
            &[("language", key.language.as_str()), ("topic", key.topic.as_str())],
        )
    }

    fn roadmap_request(&self, language: &str) -> RequestBuilder {
        self.get_request(ROADMAP_PATH, &[("language", language)])
    }

    fn generate_request(&self, language: &str) -> RequestBuilder {
        self.post_request(GENERATE_PATH, &json!({ "language": language }))
    }

    fn definition_request(&self, key: &TopicKey) -> RequestBuilder {
        self.post_request(
            DEFINITION_PATH,
            &json!({ "language": key.language, "topic": key.topic }),
        )
    }

    fn trigger_request(&self, key: &TopicKey) -> RequestBuilder {
        self.topic_request(TRIGGER_PATH, key)
    }

    fn videos_request(&self, key: &TopicKey) -> RequestBuilder {
        self.topic_request(VIDEOS_PATH, key)
    }

    fn questions_request(&self, video_id: &str) -> RequestBuilder {
        self.get_request(QUESTIONS_PATH, &[("video_id", video_id)])
    }

    fn run_request(&self, request: &RunRequest) -> RequestBuilder {
        self.post_request(RUN_PATH, request)
    }

    async fn send<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        decode_body(status, &body)
    }
}

/// Decodes a response body. Non-2xx statuses carry the server's `error` or
/// `message` text.
fn decode_body<T: DeserializeOwned>(status: StatusCode, body: &str) -> Result<T, ApiError> {
    if !status.is_success() {
        let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
        let message = parsed
            .error
            .or(parsed.message)
            .unwrap_or_else(|| "Unknown error".to_string());
        return Err(ApiError::Status {
            status: status.as_u16(),
            message,
        });
    }

    Ok(serde_json::from_str(body)?)
}

#[async_trait]
impl RoadmapApi for HttpApi {
    async fn fetch_roadmap(&self, language: &str) -> Result<Vec<String>, ApiError> {
        let response: RoadmapResponse = Self::send(self.roadmap_request(language)).await?;
        Ok(response.topic_names())
    }

    async fn generate_roadmap(&self, language: &str) -> Result<(), ApiError> {
        let language = validate_language(language)?;
        let response: Value = Self::send(self.generate_request(language)).await?;
        tracing::debug!(language, ?response, "Roadmap generated");
        Ok(())
    }

    async fn topic_definition(&self, key: &TopicKey) -> Result<Option<String>, ApiError> {
        let response: DefinitionResponse = Self::send(self.definition_request(key)).await?;
        Ok(response.summary.filter(|s| !s.trim().is_empty()))
    }

    async fn trigger_fetch(&self, key: &TopicKey) -> Result<Value, ApiError> {
        Self::send(self.trigger_request(key)).await
    }

    async fn fetch_videos(&self, key: &TopicKey) -> Result<VideoResults, ApiError> {
        Self::send(self.videos_request(key)).await
    }

    async fn fetch_questions(&self, video_id: &str) -> Result<QuestionsResponse, ApiError> {
        Self::send(self.questions_request(video_id)).await
    }

    async fn run_code(&self, request: &RunRequest) -> Result<RunResult, ApiError> {
        Self::send(self.run_request(request)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash() {
        let settings = ServerSettings {
            base_url: "https://roadmap.example.com/".to_string(),
            ..ServerSettings::default()
        };
        let api = HttpApi::new(&settings).unwrap();
        assert_eq!(
            api.url("/get_filtered_videos/"),
            "https://roadmap.example.com/get_filtered_videos/"
        );
    }

    #[test]
    fn test_invalid_cookie_rejected() {
        let settings = ServerSettings {
            session_cookie: Some("bad\nvalue".to_string()),
            ..ServerSettings::default()
        };
        assert!(HttpApi::new(&settings).is_err());
    }

    fn authed_api() -> HttpApi {
        let settings = ServerSettings {
            base_url: "http://roadmap.test/".to_string(),
            session_cookie: Some("sessionid=abc123".to_string()),
            csrf_token: Some("csrf-token".to_string()),
            ..ServerSettings::default()
        };
        HttpApi::new(&settings).unwrap()
    }

    fn query_pairs(request: &reqwest::Request) -> Vec<(String, String)> {
        request
            .url()
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    fn json_body(request: &reqwest::Request) -> Value {
        let bytes = request.body().and_then(|b| b.as_bytes()).unwrap();
        serde_json::from_slice(bytes).unwrap()
    }

    #[test]
    fn test_trigger_and_status_share_topic_query() {
        let api = authed_api();
        let key = TopicKey::new("python", "Arrays");

        let trigger = api.trigger_request(&key).build().unwrap();
        assert_eq!(trigger.method(), reqwest::Method::GET);
        assert_eq!(trigger.url().path(), "/get_videos/");
        assert_eq!(trigger.url().query(), Some("language=python&topic=Arrays"));

        let status = api.videos_request(&key).build().unwrap();
        assert_eq!(status.method(), reqwest::Method::GET);
        assert_eq!(status.url().path(), "/get_filtered_videos/");
        assert_eq!(status.url().query(), Some("language=python&topic=Arrays"));
    }

    #[test]
    fn test_topic_query_is_encoded() {
        let api = authed_api();
        let key = TopicKey::new("python", "Linked Lists & Trees");

        let request = api.videos_request(&key).build().unwrap();
        assert_eq!(
            request.url().query(),
            Some("language=python&topic=Linked+Lists+%26+Trees")
        );
        assert_eq!(
            query_pairs(&request),
            vec![
                ("language".to_string(), "python".to_string()),
                ("topic".to_string(), "Linked Lists & Trees".to_string()),
            ]
        );
    }

    #[test]
    fn test_auth_headers_on_every_request() {
        let api = authed_api();
        let key = TopicKey::new("java", "Streams");

        let requests = [
            api.roadmap_request("java").build().unwrap(),
            api.trigger_request(&key).build().unwrap(),
            api.videos_request(&key).build().unwrap(),
            api.definition_request(&key).build().unwrap(),
            api.questions_request("v1").build().unwrap(),
        ];
        for request in &requests {
            assert_eq!(request.headers()[COOKIE], "sessionid=abc123");
            assert_eq!(request.headers()["x-csrftoken"], "csrf-token");
        }

        let anonymous = HttpApi::new(&ServerSettings::default()).unwrap();
        let request = anonymous.videos_request(&key).build().unwrap();
        assert!(request.headers().get(COOKIE).is_none());
        assert!(request.headers().get(CSRF_HEADER).is_none());
    }

    #[test]
    fn test_other_endpoints() {
        let api = authed_api();
        let key = TopicKey::new("python", "Arrays");

        let roadmap = api.roadmap_request("python").build().unwrap();
        assert_eq!(roadmap.url().path(), "/roadmap/");
        assert_eq!(roadmap.url().query(), Some("language=python"));

        let generate = api.generate_request("python").build().unwrap();
        assert_eq!(generate.method(), reqwest::Method::POST);
        assert_eq!(generate.url().path(), "/generate_roadmap/");
        assert_eq!(json_body(&generate), json!({ "language": "python" }));

        let definition = api.definition_request(&key).build().unwrap();
        assert_eq!(definition.method(), reqwest::Method::POST);
        assert_eq!(definition.url().path(), "/get_topic/");
        assert_eq!(
            json_body(&definition),
            json!({ "language": "python", "topic": "Arrays" })
        );

        let questions = api.questions_request("dQw4w9WgXcQ").build().unwrap();
        assert_eq!(questions.url().path(), "/get_questions/");
        assert_eq!(questions.url().query(), Some("video_id=dQw4w9WgXcQ"));

        let run = api
            .run_request(&RunRequest {
                source_code: "print(1)".to_string(),
                language: "python".to_string(),
            })
            .build()
            .unwrap();
        assert_eq!(run.method(), reqwest::Method::POST);
        assert_eq!(run.url().path(), "/run_code/");
        assert_eq!(
            json_body(&run),
            json!({ "source_code": "print(1)", "language": "python" })
        );
    }

    #[test]
    fn test_decode_error_status() {
        let err = decode_body::<Value>(StatusCode::BAD_REQUEST, r#"{"error": "Bad language"}"#)
            .unwrap_err();
        assert!(matches!(
            err,
            ApiError::Status { status: 400, ref message } if message == "Bad language"
        ));

        let err = decode_body::<Value>(
            StatusCode::INTERNAL_SERVER_ERROR,
            r#"{"message": "Generation failed"}"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ApiError::Status { status: 500, ref message } if message == "Generation failed"
        ));

        let err = decode_body::<Value>(StatusCode::BAD_GATEWAY, "<html>502</html>").unwrap_err();
        assert!(matches!(
            err,
            ApiError::Status { status: 502, ref message } if message == "Unknown error"
        ));
    }

    #[test]
    fn test_decode_success() {
        let results: VideoResults = decode_body(
            StatusCode::OK,
            r#"{"status": "ok", "videos": [{"video_id": "v1"}], "fetching": true}"#,
        )
        .unwrap();
        assert!(results.is_ok());
        assert!(results.is_fetching());
        assert_eq!(results.videos[0].video_id, "v1");

        let err = decode_body::<VideoResults>(StatusCode::OK, "not json").unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[tokio::test]
    async fn test_generate_validates_before_request() {
        let settings = ServerSettings {
            base_url: "http://127.0.0.1:9".to_string(),
            ..ServerSettings::default()
        };
        let api = HttpApi::new(&settings).unwrap();
        let err = api.generate_roadmap("select").await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }
}

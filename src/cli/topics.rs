use crate::api::HttpApi;
use crate::cli::{load_topics, open_store};
use crate::core::settings::Settings;
use crate::core::store::SelectionStore;
use crate::ui::terminal::format_topics;
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct TopicsOutput {
    language: String,
    topics: Vec<String>,
    scroll_index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    selected_index: Option<usize>,
    #[serde(with = "chrono::serde::ts_seconds")]
    fetched_at: DateTime<Utc>,
}

pub async fn run(settings: &Settings, language: &str, json: bool) -> Result<()> {
    let api = HttpApi::new(&settings.server)?;
    let store = open_store(settings);

    let topics = load_topics(&api, language).await?;
    let output = build_output(&store, language, topics).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if output.topics.is_empty() {
        println!("No topics found for {}. Try `roadmap generate`.", language);
    } else {
        print!(
            "{}",
            format_topics(
                &output.language,
                &output.topics,
                output.scroll_index,
                output.selected_index
            )
        );
    }

    Ok(())
}

async fn build_output(store: &SelectionStore, language: &str, topics: Vec<String>) -> TopicsOutput {
    let language = language.trim().to_string();
    let scroll_index = store.scroll_index(&language, topics.len()).await;
    let selected_index = store.selected_index(&language, topics.len()).await;

    TopicsOutput {
        language,
        topics,
        scroll_index,
        selected_index,
        fetched_at: Utc::now(),
    }
}

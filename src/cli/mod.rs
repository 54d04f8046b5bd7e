pub mod generate;
pub mod questions;
pub mod run;
pub mod topics;
pub mod watch;

use crate::api::{validate_language, RoadmapApi};
use crate::core::settings::Settings;
use crate::core::store::SelectionStore;
use anyhow::Result;

/// Fetches the roadmap topics for `language` after validating it.
pub(crate) async fn load_topics(api: &dyn RoadmapApi, language: &str) -> Result<Vec<String>> {
    let language = validate_language(language)?;
    let topics = api.fetch_roadmap(language).await?;
    if topics.is_empty() {
        tracing::warn!(language, "Roadmap has no topics");
    }
    Ok(topics)
}

/// Selection store at the configured path, or an in-memory one when no data
/// directory is available.
pub(crate) fn open_store(settings: &Settings) -> SelectionStore {
    match settings.storage.selections_path() {
        Some(path) => SelectionStore::open(path),
        None => {
            tracing::warn!("No data directory, selections will not be persisted");
            SelectionStore::in_memory()
        }
    }
}

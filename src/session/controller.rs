use crate::api::RoadmapApi;
use crate::core::models::TopicKey;
use crate::core::settings::SessionTimings;
use crate::core::store::SelectionStore;
use crate::session::poller::start_poll_session;
use crate::session::refresh::start_refresh_session;
use crate::session::timers::{SessionToken, TimerRegistry};
use crate::ui::panel::ResultsPanel;
use std::sync::Arc;

pub const DEFINITION_FALLBACK: &str = "Definition not available.";

/// Reacts to topic selection: tears down the running sessions, remembers the
/// selection, and starts fresh poll and refresh sessions for the new topic.
pub struct SelectionController {
    api: Arc<dyn RoadmapApi>,
    registry: TimerRegistry,
    panel: ResultsPanel,
    selections: SelectionStore,
    timings: SessionTimings,
}

impl SelectionController {
    pub fn new(
        api: Arc<dyn RoadmapApi>,
        panel: ResultsPanel,
        selections: SelectionStore,
        timings: SessionTimings,
    ) -> Self {
        Self {
            api,
            registry: TimerRegistry::new(),
            panel,
            selections,
            timings,
        }
    }

    pub fn registry(&self) -> &TimerRegistry {
        &self.registry
    }

    pub fn panel(&self) -> &ResultsPanel {
        &self.panel
    }

    pub fn selections(&self) -> &SelectionStore {
        &self.selections
    }

    /// Selects `topics[index]` for `language`. Returns the new session key,
    /// or `None` if the index is out of range.
    pub async fn select(
        &self,
        language: &str,
        topics: &[String],
        index: usize,
        scroll_index: usize,
    ) -> Option<TopicKey> {
        let Some(topic) = topics.get(index) else {
            tracing::warn!(language, index, count = topics.len(), "Topic index out of range");
            return None;
        };

        self.registry.stop_all();

        let key = TopicKey::new(language, topic.as_str());
        tracing::info!(%key, index, "Selected topic");

        if let Err(e) = self
            .selections
            .record_selection(language, index, scroll_index)
            .await
        {
            tracing::warn!(%key, error = %e, "Failed to persist selection");
        }

        // The poll session's entry step fires the background-job trigger.
        let token = start_poll_session(
            Arc::clone(&self.api),
            self.panel.clone(),
            &self.registry,
            key.clone(),
            self.timings,
        );

        self.spawn_definition(&key, token.clone());
        self.spawn_snapshot(&key, token);

        start_refresh_session(
            Arc::clone(&self.api),
            self.panel.clone(),
            &self.registry,
            key.clone(),
            self.timings,
        );

        Some(key)
    }

    /// Re-selects the topic remembered for `language`, as on startup.
    pub async fn restore(&self, language: &str, topics: &[String]) -> Option<TopicKey> {
        let index = self.selections.selected_index(language, topics.len()).await?;
        let scroll = self.selections.scroll_index(language, topics.len()).await;
        tracing::info!(language, index, "Restoring last selected topic");
        self.select(language, topics, index, scroll).await
    }

    pub async fn scroll(&self, language: &str, scroll_index: usize) {
        if let Err(e) = self.selections.record_scroll(language, scroll_index).await {
            tracing::warn!(language, error = %e, "Failed to persist scroll position");
        }
    }

    /// Stops every session, as when leaving the topic list.
    pub fn stop_all(&self) {
        self.registry.stop_all();
    }

    fn spawn_definition(&self, key: &TopicKey, token: SessionToken) {
        let api = Arc::clone(&self.api);
        let panel = self.panel.clone();
        let key = key.clone();

        tokio::spawn(async move {
            let text = match api.topic_definition(&key).await {
                Ok(Some(summary)) => summary,
                Ok(None) => DEFINITION_FALLBACK.to_string(),
                Err(e) => {
                    tracing::warn!(%key, error = %e, "Error fetching topic definition");
                    DEFINITION_FALLBACK.to_string()
                }
            };
            if !token.is_cancelled() {
                panel.show_definition(&key, text);
            }
        });
    }

    fn spawn_snapshot(&self, key: &TopicKey, token: SessionToken) {
        let api = Arc::clone(&self.api);
        let panel = self.panel.clone();
        let key = key.clone();

        tokio::spawn(async move {
            let outcome = api.fetch_videos(&key).await;
            if token.is_cancelled() {
                tracing::debug!(%key, "Discarding snapshot of replaced selection");
                return;
            }
            panel.show(&key, &outcome);
        });
    }
}

impl Drop for SelectionController {
    fn drop(&mut self) {
        self.registry.stop_all();
    }
}

use crate::core::models::SelectionState;
use anyhow::{Context, Result};
use chrono::Utc;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct StoreInner {
    languages: HashMap<String, SelectionState>,
}

/// Per-language topic cursor and selection, persisted as JSON so a later run
/// restores the same position in the topic list.
#[derive(Clone, Default)]
pub struct SelectionStore {
    inner: Arc<RwLock<StoreInner>>,
    path: Option<PathBuf>,
}

impl SelectionStore {
    /// Store that never touches the filesystem.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Opens the store at `path`. A missing or unreadable file starts empty.
    pub fn open(path: PathBuf) -> Self {
        let languages = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(languages) => languages,
                Err(e) => {
                    tracing::warn!(?path, error = %e, "Ignoring corrupt selection file");
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };

        Self {
            inner: Arc::new(RwLock::new(StoreInner { languages })),
            path: Some(path),
        }
    }

    pub async fn get(&self, language: &str) -> Option<SelectionState> {
        self.inner.read().await.languages.get(language).cloned()
    }

    /// Cursor position for `language`, clamped to a list of `topic_count` entries.
    pub async fn scroll_index(&self, language: &str, topic_count: usize) -> usize {
        let stored = self
            .get(language)
            .await
            .map(|s| s.scroll_index)
            .unwrap_or(0);
        stored.min(topic_count.saturating_sub(1))
    }

    /// Last selected topic for `language`, if it still exists in a list of
    /// `topic_count` entries.
    pub async fn selected_index(&self, language: &str, topic_count: usize) -> Option<usize> {
        self.get(language)
            .await
            .and_then(|s| s.selected_index)
            .filter(|idx| *idx < topic_count)
    }

    pub async fn record_scroll(&self, language: &str, scroll_index: usize) -> Result<()> {
        {
            let mut inner = self.inner.write().await;
            let state = inner.languages.entry(language.to_string()).or_default();
            state.scroll_index = scroll_index;
            state.updated_at = Utc::now();
        }
        self.save().await
    }

    pub async fn record_selection(
        &self,
        language: &str,
        selected_index: usize,
        scroll_index: usize,
    ) -> Result<()> {
        {
            let mut inner = self.inner.write().await;
            let state = inner.languages.entry(language.to_string()).or_default();
            state.selected_index = Some(selected_index);
            state.scroll_index = scroll_index;
            state.updated_at = Utc::now();
        }
        self.save().await
    }

    async fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let content = {
            let inner = self.inner.read().await;
            serde_json::to_string_pretty(&inner.languages)?
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write selections to {}", path.display()))?;

        tracing::debug!(?path, "Saved topic selections");
        Ok(())
    }
}

use crate::core::models::TopicKey;
use crate::ui::render::{render, FetchOutcome, RevealState, VideoCard, View};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    Results { key: TopicKey, view: View },
    Definition { key: TopicKey, text: String },
    Notice(String),
}

#[derive(Default)]
struct PanelInner {
    reveal: RevealState,
    current: Option<(TopicKey, View)>,
}

/// The single results container. Every session renders through it so the
/// visible state stays consistent whichever session fetched last.
#[derive(Clone)]
pub struct ResultsPanel {
    inner: Arc<Mutex<PanelInner>>,
    tx: mpsc::UnboundedSender<UiEvent>,
}

impl ResultsPanel {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<UiEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let panel = Self {
            inner: Arc::new(Mutex::new(PanelInner::default())),
            tx,
        };
        (panel, rx)
    }

    fn lock(&self) -> MutexGuard<'_, PanelInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn emit(&self, event: UiEvent) {
        if self.tx.send(event).is_err() {
            tracing::debug!("UI receiver dropped, discarding event");
        }
    }

    /// Renders a fetch outcome for `key` and returns the resulting view.
    pub fn show(&self, key: &TopicKey, outcome: &FetchOutcome) -> View {
        let view = {
            let mut inner = self.lock();
            let (view, reveal) = render(&inner.reveal, outcome);
            inner.reveal = reveal;
            inner.current = Some((key.clone(), view.clone()));
            view
        };
        self.emit(UiEvent::Results {
            key: key.clone(),
            view: view.clone(),
        });
        view
    }

    pub fn show_view(&self, key: &TopicKey, view: View) {
        self.lock().current = Some((key.clone(), view.clone()));
        self.emit(UiEvent::Results {
            key: key.clone(),
            view,
        });
    }

    pub fn show_definition(&self, key: &TopicKey, text: impl Into<String>) {
        self.emit(UiEvent::Definition {
            key: key.clone(),
            text: text.into(),
        });
    }

    pub fn notice(&self, text: impl Into<String>) {
        self.emit(UiEvent::Notice(text.into()));
    }

    /// Reveals the practice action of the card at `index` (0-based) and
    /// returns that card.
    pub fn reveal(&self, index: usize) -> Option<VideoCard> {
        let (key, view, card) = {
            let mut inner = self.lock();
            let PanelInner { reveal, current } = &mut *inner;
            let Some((_, View::Cards { cards, .. })) = current.as_mut() else {
                return None;
            };
            let card = cards.get_mut(index)?;
            card.practice_revealed = true;
            reveal.reveal(&card.video_id);
            let card = card.clone();
            let (key, view) = current.clone()?;
            (key, view, card)
        };
        self.emit(UiEvent::Results { key, view });
        Some(card)
    }

    pub fn card(&self, index: usize) -> Option<VideoCard> {
        match &self.lock().current {
            Some((_, View::Cards { cards, .. })) => cards.get(index).cloned(),
            _ => None,
        }
    }

    #[cfg(test)]
    pub fn current(&self) -> Option<(TopicKey, View)> {
        self.lock().current.clone()
    }
}

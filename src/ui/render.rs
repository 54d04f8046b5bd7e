use crate::api::ApiError;
use crate::core::models::VideoResults;
use std::collections::HashSet;

pub type FetchOutcome = Result<VideoResults, ApiError>;

pub const ERROR_TEXT: &str = "Error fetching videos.";
pub const STOPPED_TEXT: &str = "Auto-refresh stopped. Select the topic again to refresh.";

/// Video ids whose "practice" action has been revealed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RevealState {
    revealed: HashSet<String>,
}

impl RevealState {
    pub fn reveal(&mut self, video_id: &str) {
        self.revealed.insert(video_id.to_string());
    }

    pub fn is_revealed(&self, video_id: &str) -> bool {
        self.revealed.contains(video_id)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.revealed.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoCard {
    pub video_id: String,
    pub title: String,
    pub url: String,
    pub description: String,
    pub thumbnail_url: String,
    pub practice_revealed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub current: u32,
    pub total: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    Cards {
        cards: Vec<VideoCard>,
        progress: Option<Progress>,
    },
    /// Non-terminal: the job may still produce results.
    Loading,
    Error {
        message: String,
    },
    /// Terminal: the poll session gave up.
    Stopped {
        message: String,
    },
}

impl View {
    pub fn error() -> Self {
        View::Error {
            message: ERROR_TEXT.to_string(),
        }
    }

    pub fn stopped() -> Self {
        View::Stopped {
            message: STOPPED_TEXT.to_string(),
        }
    }

    pub fn card_count(&self) -> usize {
        match self {
            View::Cards { cards, .. } => cards.len(),
            _ => 0,
        }
    }
}

/// Maps the previous reveal state and a fetch outcome to the view to show and
/// the reveal state to keep.
pub fn render(previous: &RevealState, outcome: &FetchOutcome) -> (View, RevealState) {
    let results = match outcome {
        Ok(results) => results,
        Err(_) => return (View::error(), previous.clone()),
    };

    if !results.is_ok() || results.videos.is_empty() {
        return (View::Loading, previous.clone());
    }

    let mut next = RevealState::default();
    let cards = results
        .videos
        .iter()
        .map(|video| {
            let practice_revealed = previous.is_revealed(&video.video_id);
            if practice_revealed {
                next.reveal(&video.video_id);
            }
            VideoCard {
                video_id: video.video_id.clone(),
                title: video.title.clone(),
                url: video.url.clone(),
                description: video.description.clone().unwrap_or_default(),
                thumbnail_url: video.thumbnail_url(),
                practice_revealed,
            }
        })
        .collect();

    let progress = match (results.current, results.total) {
        (Some(current), Some(total)) if total > 0 => Some(Progress { current, total }),
        _ => None,
    };

    (View::Cards { cards, progress }, next)
}

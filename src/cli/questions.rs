use crate::api::{HttpApi, RoadmapApi};
use crate::core::settings::Settings;
use crate::ui::terminal::{format_question_detail, format_question_list};
use anyhow::Result;

pub const NO_VIDEO: &str = "No video selected.";
pub const FETCH_ERROR: &str = "Error fetching questions.";

pub async fn run(settings: &Settings, video_id: &str, show: Option<usize>) -> Result<()> {
    let api = HttpApi::new(&settings.server)?;
    print!("{}", questions_text(&api, video_id, show).await);
    Ok(())
}

/// Question list for a video, or the detail of question `show` (1-based).
pub(crate) async fn questions_text(
    api: &dyn RoadmapApi,
    video_id: &str,
    show: Option<usize>,
) -> String {
    let video_id = video_id.trim();
    if video_id.is_empty() {
        return format!("{}\n", NO_VIDEO);
    }

    let response = match api.fetch_questions(video_id).await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(video_id, error = %e, "Failed to fetch questions");
            return format!("{}\n", FETCH_ERROR);
        }
    };

    let questions = response.listed();
    if questions.is_empty() {
        tracing::debug!(
            video_id,
            status = ?response.status,
            message = ?response.message,
            "Server returned no questions"
        );
    }

    match show {
        Some(number) => match number.checked_sub(1).and_then(|i| questions.get(i)) {
            Some(question) => format_question_detail(number - 1, question),
            None => format!("Question {} not found.\n", number),
        },
        None => format_question_list(questions),
    }
}

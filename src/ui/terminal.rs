use crate::core::models::{Question, QuestionKind, TopicKey};
use crate::ui::panel::UiEvent;
use crate::ui::render::{Progress, View};
use std::fmt::Write;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const BAR_WIDTH: usize = 20;
const NO_QUESTIONS: &str = "No questions found for this video.";

pub fn progress_bar(progress: Progress) -> String {
    let ratio = (progress.current as f64 / progress.total as f64).clamp(0.0, 1.0);
    let filled = (ratio * BAR_WIDTH as f64).round() as usize;
    format!(
        "[{}{}] {}/{} curated",
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled),
        progress.current,
        progress.total
    )
}

pub fn format_view(key: &TopicKey, view: &View) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== {} ==", key);

    match view {
        View::Cards { cards, progress } => {
            for (i, card) in cards.iter().enumerate() {
                let _ = writeln!(out, "{:>3}. {}", i + 1, card.title);
                let _ = writeln!(out, "     {}", card.url);
                let _ = writeln!(out, "     thumbnail: {}", card.thumbnail_url);
                if !card.description.is_empty() {
                    let _ = writeln!(out, "     {}", card.description);
                }
                if card.practice_revealed {
                    let _ = writeln!(out, "     [practice {}]", i + 1);
                }
            }
            let _ = writeln!(out, "Total videos: {}", view.card_count());
            if let Some(progress) = progress {
                let _ = writeln!(out, "{}", progress_bar(*progress));
            }
        }
        View::Loading => {
            let _ = writeln!(out, "Loading videos...");
        }
        View::Error { message } | View::Stopped { message } => {
            let _ = writeln!(out, "{}", message);
        }
    }
    out
}

/// Topic list with the cursor (`>`) and the selected topic (`*`) marked.
/// Entries next to the cursor are kept, farther ones are dimmed with `.`.
pub fn format_topics(
    language: &str,
    topics: &[String],
    cursor: usize,
    selected: Option<usize>,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} roadmap", language.to_uppercase());

    for (idx, topic) in topics.iter().enumerate() {
        let pointer = if idx == cursor {
            '>'
        } else if idx.abs_diff(cursor) <= 2 {
            ' '
        } else {
            '.'
        };
        let mark = if Some(idx) == selected { '*' } else { ' ' };
        let _ = writeln!(out, "{}{} {:>3}. {}", pointer, mark, idx + 1, topic);
    }
    out
}

pub fn format_question_list(questions: &[Question]) -> String {
    if questions.is_empty() {
        return format!("{}\n", NO_QUESTIONS);
    }

    let mut out = String::new();
    for (i, question) in questions.iter().enumerate() {
        let _ = writeln!(
            out,
            "Question {}: {} [{}]",
            i + 1,
            question.description,
            question.kind().label()
        );
    }
    out
}

pub fn format_question_detail(index: usize, question: &Question) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Question {} - {}", index + 1, question.title);
    let _ = writeln!(out, "Description: {}", question.description);

    match question.kind() {
        QuestionKind::Coding => {
            for (label, value) in question.present_fields() {
                let _ = writeln!(out, "{}:\n{}", label, value);
            }
        }
        QuestionKind::Theory => {
            let _ = writeln!(
                out,
                "This is a descriptive/theory question. No coding required."
            );
        }
    }
    out
}

/// Prints UI events until every panel handle is dropped.
pub fn spawn_printer(mut rx: mpsc::UnboundedReceiver<UiEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event {
                UiEvent::Results { key, view } => print!("{}", format_view(&key, &view)),
                UiEvent::Definition { key, text } => println!("[{}] {}", key.topic, text),
                UiEvent::Notice(text) => println!("{}", text),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::render::VideoCard;

    fn card(id: &str, revealed: bool) -> VideoCard {
        VideoCard {
            video_id: id.to_string(),
            title: format!("Title {}", id),
            url: format!("https://youtu.be/{}", id),
            description: String::new(),
            thumbnail_url: format!("https://img.youtube.com/vi/{}/0.jpg", id),
            practice_revealed: revealed,
        }
    }

    #[test]
    fn test_progress_bar() {
        assert_eq!(
            progress_bar(Progress {
                current: 5,
                total: 10
            }),
            "[##########----------] 5/10 curated"
        );
        assert_eq!(
            progress_bar(Progress {
                current: 12,
                total: 10
            }),
            "[####################] 12/10 curated"
        );
    }

    #[test]
    fn test_format_cards() {
        let key = TopicKey::new("python", "Arrays");
        let view = View::Cards {
            cards: vec![card("a", false), card("b", true)],
            progress: None,
        };
        let out = format_view(&key, &view);
        assert!(out.starts_with("== python/Arrays =="));
        assert!(out.contains("  1. Title a"));
        assert!(out.contains("  2. Title b"));
        assert!(out.contains("[practice 2]"));
        assert!(!out.contains("[practice 1]"));
        assert!(out.contains("     thumbnail: https://img.youtube.com/vi/b/0.jpg"));
        assert!(out.contains("Total videos: 2"));
    }

    #[test]
    fn test_format_loading_and_stopped() {
        let key = TopicKey::new("python", "Arrays");
        assert!(format_view(&key, &View::Loading).contains("Loading videos"));
        assert!(format_view(&key, &View::stopped()).contains("Auto-refresh stopped"));
    }

    #[test]
    fn test_format_topics_marks() {
        let topics: Vec<String> = ["A", "B", "C", "D", "E"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let out = format_topics("python", &topics, 0, Some(1));
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "PYTHON roadmap");
        assert_eq!(lines[1], ">    1. A");
        assert_eq!(lines[2], " *   2. B");
        assert_eq!(lines[4], ".    4. D");
    }

    #[test]
    fn test_question_formatting() {
        let coding = Question {
            title: "Sum".to_string(),
            description: "Add numbers".to_string(),
            input_format: Some("two ints".to_string()),
            output_format: Some("one int".to_string()),
            example_input: Some("none".to_string()),
            example_output: None,
        };
        let theory = Question {
            title: "Why".to_string(),
            description: "Explain lists".to_string(),
            ..Question::default()
        };

        let list = format_question_list(&[coding.clone(), theory.clone()]);
        assert!(list.contains("Question 1: Add numbers [Coding]"));
        assert!(list.contains("Question 2: Explain lists [Theory]"));
        assert_eq!(format_question_list(&[]), format!("{}\n", NO_QUESTIONS));

        let detail = format_question_detail(0, &coding);
        assert!(detail.contains("Input Format:\ntwo ints"));
        assert!(!detail.contains("Example Input"));

        let detail = format_question_detail(1, &theory);
        assert!(detail.contains("No coding required."));
    }
}

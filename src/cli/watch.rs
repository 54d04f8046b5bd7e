use crate::api::{validate_language, HttpApi, RoadmapApi};
use crate::cli::questions::questions_text;
use crate::cli::{load_topics, open_store};
use crate::core::settings::Settings;
use crate::session::SelectionController;
use crate::ui::panel::ResultsPanel;
use crate::ui::terminal::{format_topics, spawn_printer};
use anyhow::{Context, Result};
use std::io;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

const HELP: &str = "Commands: <n> | select <n> | up | down | open <n> | practice <n> | list | quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Select(usize),
    Up,
    Down,
    Open(usize),
    Practice(usize),
    List,
    Quit,
}

/// Parses one input line. Numbers are 1-based on input and 0-based in the
/// returned command.
fn parse_command(line: &str) -> Result<Command, String> {
    let mut parts = line.split_whitespace();
    let word = parts.next().unwrap_or_default().to_lowercase();
    let arg = parts.next();

    let index = |arg: Option<&str>| -> Result<usize, String> {
        let raw = arg.ok_or_else(|| format!("`{}` needs a number", word))?;
        match raw.parse::<usize>() {
            Ok(n) if n > 0 => Ok(n - 1),
            _ => Err(format!("Not a valid number: {}", raw)),
        }
    };

    let command = match word.as_str() {
        "select" | "s" => index(arg).map(Command::Select),
        "open" | "o" => index(arg).map(Command::Open),
        "practice" | "p" => index(arg).map(Command::Practice),
        "up" | "k" => Ok(Command::Up),
        "down" | "j" => Ok(Command::Down),
        "list" | "l" => Ok(Command::List),
        "quit" | "q" | "exit" => Ok(Command::Quit),
        _ => index(Some(word.as_str())).map(Command::Select),
    };
    command.map_err(|e| format!("{}\n{}", e, HELP))
}

type Opener = fn(&str) -> io::Result<()>;

fn open_in_browser(url: &str) -> io::Result<()> {
    open::that(url)
}

struct WatchSession {
    api: Arc<dyn RoadmapApi>,
    controller: SelectionController,
    language: String,
    topics: Vec<String>,
    cursor: usize,
    opener: Opener,
}

impl WatchSession {
    fn panel(&self) -> &ResultsPanel {
        self.controller.panel()
    }

    async fn show_topics(&self) {
        let selected = self
            .controller
            .selections()
            .selected_index(&self.language, self.topics.len())
            .await;
        let listing = format_topics(&self.language, &self.topics, self.cursor, selected);
        self.panel().notice(listing.trim_end());
    }

    /// Selects `--topic` if given, otherwise the remembered topic.
    async fn start(&mut self, topic: Option<&str>) -> Result<()> {
        self.cursor = self
            .controller
            .selections()
            .scroll_index(&self.language, self.topics.len())
            .await;

        if let Some(name) = topic {
            let index = self
                .topics
                .iter()
                .position(|t| t.eq_ignore_ascii_case(name.trim()))
                .with_context(|| format!("Unknown topic: {}", name))?;
            self.cursor = index;
            self.controller
                .select(&self.language, &self.topics, index, self.cursor)
                .await;
            return Ok(());
        }

        if self
            .controller
            .restore(&self.language, &self.topics)
            .await
            .is_none()
        {
            self.show_topics().await;
            self.panel().notice("Type a topic number to start watching.");
        }
        Ok(())
    }

    /// Applies one command. Returns `false` once the session should end.
    async fn handle(&mut self, command: Command) -> bool {
        match command {
            Command::Select(index) => {
                if index >= self.topics.len() {
                    self.panel().notice(format!("No topic {}.", index + 1));
                    return true;
                }
                self.cursor = index;
                self.controller
                    .select(&self.language, &self.topics, index, self.cursor)
                    .await;
            }
            Command::Up | Command::Down => {
                let last = self.topics.len().saturating_sub(1);
                self.cursor = match command {
                    Command::Up => self.cursor.saturating_sub(1),
                    _ => (self.cursor + 1).min(last),
                };
                self.controller.scroll(&self.language, self.cursor).await;
                self.show_topics().await;
            }
            Command::Open(index) => match self.panel().reveal(index) {
                Some(card) => {
                    self.panel().notice(format!("Opening {}", card.title));
                    if let Err(e) = (self.opener)(&card.url) {
                        tracing::warn!(url = %card.url, error = %e, "Failed to open video");
                        self.panel().notice(card.url);
                    }
                }
                None => self.panel().notice(format!("No video {}.", index + 1)),
            },
            Command::Practice(index) => match self.panel().card(index) {
                Some(card) if card.practice_revealed => {
                    let text = questions_text(self.api.as_ref(), &card.video_id, None).await;
                    self.panel().notice(text.trim_end());
                }
                Some(_) => self
                    .panel()
                    .notice(format!("Open video {} first to unlock practice.", index + 1)),
                None => self.panel().notice(format!("No video {}.", index + 1)),
            },
            Command::List => self.show_topics().await,
            Command::Quit => {
                self.controller.stop_all();
                return false;
            }
        }
        true
    }
}

pub async fn run(settings: &Settings, language: &str, topic: Option<&str>) -> Result<()> {
    let language = validate_language(language)?.to_lowercase();
    let api: Arc<dyn RoadmapApi> = Arc::new(HttpApi::new(&settings.server)?);

    let topics = load_topics(api.as_ref(), &language).await?;
    if topics.is_empty() {
        anyhow::bail!("No topics found for {}. Try `roadmap generate`.", language);
    }

    let (panel, rx) = ResultsPanel::new();
    let printer = spawn_printer(rx);
    let controller = SelectionController::new(
        Arc::clone(&api),
        panel,
        open_store(settings),
        settings.polling.timings(),
    );

    let mut session = WatchSession {
        api,
        controller,
        language,
        topics,
        cursor: 0,
        opener: open_in_browser,
    };
    session.start(topic).await?;
    session.panel().notice(HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read command")? else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match parse_command(&line) {
                    Ok(command) => {
                        if !session.handle(command).await {
                            break;
                        }
                    }
                    Err(message) => session.panel().notice(message),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted");
                break;
            }
        }
    }

    session.controller.stop_all();
    drop(session);
    printer.abort();
    Ok(())
}

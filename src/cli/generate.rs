use crate::api::{validate_language, HttpApi, RoadmapApi};
use crate::cli::load_topics;
use crate::core::settings::Settings;
use crate::ui::terminal::format_topics;
use anyhow::{Context, Result};
use std::time::Duration;

/// Pause between a successful generation and re-reading the roadmap.
const RELOAD_DELAY: Duration = Duration::from_millis(900);

pub async fn run(settings: &Settings, language: &str) -> Result<()> {
    let api = HttpApi::new(&settings.server)?;

    println!("Generating roadmap... Please wait.");
    let topics = generate_and_reload(&api, language).await?;

    println!("Roadmap generated successfully!");
    print!("{}", format_topics(language.trim(), &topics, 0, None));
    Ok(())
}

async fn generate_and_reload(api: &dyn RoadmapApi, language: &str) -> Result<Vec<String>> {
    let language = validate_language(language)?;

    api.generate_roadmap(language)
        .await
        .context("Failed to generate roadmap")?;
    tracing::info!(language, "Roadmap generated");

    tokio::time::sleep(RELOAD_DELAY).await;
    load_topics(api, language).await
}

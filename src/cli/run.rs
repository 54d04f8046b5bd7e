use crate::api::{HttpApi, RoadmapApi};
use crate::core::models::{RunRequest, SUPPORTED_RUN_LANGUAGES};
use crate::core::settings::Settings;
use anyhow::{Context, Result};
use std::path::Path;
use tokio::io::AsyncReadExt;

pub async fn run(settings: &Settings, language: &str, file: Option<&Path>) -> Result<()> {
    let source_code = match file {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buf)
                .await
                .context("Failed to read source from stdin")?;
            buf
        }
    };

    let request = build_request(language, source_code)?;
    let api = HttpApi::new(&settings.server)?;

    println!("Running...");
    println!("{}", execute(&api, &request).await);
    Ok(())
}

fn build_request(language: &str, source_code: String) -> Result<RunRequest> {
    if source_code.trim().is_empty() {
        anyhow::bail!("Please write some code first!");
    }

    let language = language.trim().to_lowercase();
    if !SUPPORTED_RUN_LANGUAGES.contains(&language.as_str()) {
        anyhow::bail!(
            "Unsupported language: {}. Valid languages: {}",
            language,
            SUPPORTED_RUN_LANGUAGES.join(", ")
        );
    }

    Ok(RunRequest {
        source_code,
        language,
    })
}

/// Text shown in the output pane. Failures render as a message instead of
/// aborting.
async fn execute(api: &dyn RoadmapApi, request: &RunRequest) -> String {
    match api.run_code(request).await {
        Ok(result) => result.display_text(),
        Err(e) => {
            tracing::warn!(language = %request.language, error = %e, "Code run failed");
            format!("Error: {}", e)
        }
    }
}

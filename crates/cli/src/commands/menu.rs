//! Menu commands.

use std::path::Path;

use comanda_server::state::AppState;
use thiserror::Error;

use super::print_json;

#[derive(Debug, Error)]
pub enum MenuCommandError {
    #[error("Menu extraction is not configured (set GEMINI_API_KEY)")]
    ExtractionDisabled,

    #[error("Failed to read {path}: {source}")]
    ReadImage {
        path: String,
        source: std::io::Error,
    },
}

/// Print today's menu.
pub fn show(state: &AppState) -> Result<(), Box<dyn std::error::Error>> {
    print_json(&state.menu().current()?)?;
    Ok(())
}

/// Extract a menu from a photo and print the merged result.
pub async fn extract(
    state: &AppState,
    image: &Path,
    save: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let gemini = state
        .gemini()
        .ok_or(MenuCommandError::ExtractionDisabled)?;
    let bytes = tokio::fs::read(image)
        .await
        .map_err(|source| MenuCommandError::ReadImage {
            path: image.display().to_string(),
            source,
        })?;

    tracing::info!(model = gemini.model(), bytes = bytes.len(), "Extracting menu");
    let extracted = gemini.extract_menu(&bytes).await?;
    let merged = state.menu().current()?.apply_extraction(extracted);

    if save {
        state.menu().replace(&merged)?;
        tracing::info!("Menu saved");
    }
    print_json(&merged)?;
    Ok(())
}

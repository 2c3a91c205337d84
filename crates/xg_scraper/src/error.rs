use std::time::Duration;
use thiserror::Error;

/// Fatální chyby renderu. Parsování samotné nikdy nechybuje.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Chrome nešel spustit nebo nešel otevřít tab
    #[error("failed to launch browser: {0}")]
    Launch(String),

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    /// Stránka se načetla, ale shot map nadpis se neobjevil
    #[error("shot map marker never became visible on {url} (waited {waited:?})")]
    MarkerNotVisible { url: String, waited: Duration },

    #[error("no data found on page {url}")]
    EmptyMarkup { url: String },

    #[error("scrape of {url} exceeded {limit:?}")]
    Timeout { url: String, limit: Duration },

    #[error("render worker failed: {0}")]
    Worker(String),
}

impl RenderError {
    /// Stabilní label pro event log
    pub fn kind(&self) -> &'static str {
        match self {
            RenderError::Launch(_) => "launch",
            RenderError::Navigation { .. } => "navigation",
            RenderError::MarkerNotVisible { .. } => "marker_not_visible",
            RenderError::EmptyMarkup { .. } => "empty_markup",
            RenderError::Timeout { .. } => "timeout",
            RenderError::Worker(_) => "worker",
        }
    }
}

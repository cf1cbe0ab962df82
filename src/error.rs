//! Error types for Arabic PDF generation.
//!
//! Engine failures are wrapped once into [`Error`] and otherwise propagate
//! unchanged; nothing in this crate retries or recovers.

use std::path::PathBuf;

use thiserror::Error;

use crate::engine::EngineId;

/// Errors raised by the service, the engines and the font installer.
#[derive(Error, Debug)]
pub enum Error {
    /// The configured engine's backing library or executable is not present.
    #[error("{engine} engine is not available: {hint}")]
    EngineUnavailable {
        engine: EngineId,
        hint: &'static str,
    },

    /// `set_default_font` was given a name outside the font registry while
    /// the unknown-font policy is `reject`.
    #[error("unknown font `{0}`")]
    InvalidFontName(String),

    #[error("unknown engine `{0}` (expected forge, chromium or wkhtmltopdf)")]
    UnknownEngine(String),

    #[error("unknown page format `{0}`")]
    InvalidPageFormat(String),

    #[error("unknown orientation `{0}` (expected P, L, portrait or landscape)")]
    InvalidOrientation(String),

    #[error("invalid value for `{key}`: {value}")]
    InvalidValue { key: String, value: String },

    #[error("font source directory not found: {}", .0.display())]
    FontSourceMissing(PathBuf),

    /// An engine failed while rendering; `message` is the engine's own report.
    #[error("{engine} rendering failed: {message}")]
    Render { engine: EngineId, message: String },

    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

//! # arabic-pdf – right-to-left Arabic PDF generation
//!
//! The crate prepares caller HTML for Arabic output and hands it to one of
//! several HTML → PDF engines:
//!
//! 1. **Select** – pick the configured or recommended engine ([`engine`])
//! 2. **Prepare** – prefix the HTML with font faces and RTL rules ([`prepare`])
//! 3. **Render** – run the engine and return its native document ([`service`])
//!
//! The built-in engine lives in [`forge`] and is compiled in with the `forge`
//! feature. A C-compatible FFI surface is exposed via the [`ffi`] module.

pub mod config;
pub mod engine;
pub mod error;
pub mod ffi;
pub mod fonts;
#[cfg(feature = "forge")]
pub mod forge;
pub mod install;
pub mod prepare;
pub mod requirements;
pub mod service;
#[cfg(test)]
mod templates;

// Re-exports for convenience
pub use config::{Config, ConfigOverrides, Orientation, PageFormat, UnknownFontPolicy};
pub use engine::{EngineId, EngineProvider, EngineRegistry, PdfResponse, RenderJob, RenderedDocument};
pub use error::{Error, Result};
pub use install::install_fonts;
pub use prepare::prepare_arabic_html;
pub use requirements::RequirementsReport;
pub use service::{ArabicPdfService, GenerateOptions};

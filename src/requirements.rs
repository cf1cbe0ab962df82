//! Environment report for `check-requirements`.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

use crate::engine::{EngineId, EngineRegistry, ENGINE_PRIORITY};
use crate::fonts::FontRegistry;

/// Crate version embedded at build time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// What is installed and what is missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequirementsReport {
    pub version: &'static str,
    pub font_directory: PathBuf,
    pub fonts_present: Vec<&'static str>,
    pub fonts_missing: Vec<&'static str>,
    /// Available engines with their descriptions.
    pub engines: BTreeMap<EngineId, String>,
    /// True when at least one engine can render.
    pub status: bool,
}

impl RequirementsReport {
    pub fn collect(engines: &EngineRegistry, fonts: &FontRegistry, font_directory: PathBuf) -> Self {
        let available = engines.available_engines();
        Self {
            version: VERSION,
            font_directory,
            fonts_present: fonts.present(),
            fonts_missing: fonts.missing(),
            status: !available.is_empty(),
            engines: available,
        }
    }
}

/// Install hints, one per engine, when no engine is available.
pub fn installation_instructions(engines: &EngineRegistry) -> Vec<String> {
    if !engines.available_engines().is_empty() {
        return Vec::new();
    }
    let mut out = vec!["No PDF engines found. Install one of the following:".to_string()];
    out.extend(
        ENGINE_PRIORITY
            .iter()
            .map(|id| format!("• {}: {}", id.description(), id.install_hint())),
    );
    out
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::Arc;

    use super::*;
    use crate::engine::{ChromiumProvider, EngineProvider, WkhtmltopdfProvider};

    fn unavailable() -> EngineRegistry {
        EngineRegistry::new(vec![
            Arc::new(ChromiumProvider::with_executable("/nonexistent/chrome")) as Arc<dyn EngineProvider>,
            Arc::new(WkhtmltopdfProvider::with_executable("/nonexistent/wkhtmltopdf")),
        ])
    }

    #[test]
    fn no_engines_means_failed_status_and_instructions() {
        let fonts = FontRegistry::from_dir(Path::new("/nonexistent"));
        let report = RequirementsReport::collect(&unavailable(), &fonts, "/nonexistent".into());
        assert!(!report.status);
        assert!(report.engines.is_empty());
        assert_eq!(report.fonts_missing.len(), 8);
        assert!(report.fonts_present.is_empty());

        let lines = installation_instructions(&unavailable());
        assert_eq!(lines.len(), 1 + ENGINE_PRIORITY.len());
        assert!(lines[2].contains("Chromium"));
    }

    #[test]
    fn report_serialises_engine_tokens() {
        let fonts = FontRegistry::from_dir(Path::new("/nonexistent"));
        let report = RequirementsReport::collect(&unavailable(), &fonts, "/x".into());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], false);
        assert_eq!(json["version"], VERSION);
    }
}

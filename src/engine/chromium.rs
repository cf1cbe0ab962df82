//! Headless Chrome / Chromium backend.
//!
//! The prepared HTML is written to a scratch file and printed with
//! `--print-to-pdf`. Page size and margins are passed through an `@page`
//! rule since Chrome has no command-line switches for them.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use super::process::{self, Scratch};
use super::{count_pdf_pages, Disposition, EngineId, EngineProvider, PdfResponse, RenderJob, RenderedDocument};
use crate::config::PageSetup;
use crate::error::{Error, Result};

const ENV_OVERRIDE: &str = "ARABIC_PDF_CHROME";
const CANDIDATES: &[&str] = &[
    "chromium",
    "chromium-browser",
    "google-chrome",
    "google-chrome-stable",
    "chrome",
];

#[derive(Debug, Clone, Default)]
pub struct ChromiumProvider {
    executable: Option<PathBuf>,
}

impl ChromiumProvider {
    /// Look for Chrome in `ARABIC_PDF_CHROME`, then on the `PATH`.
    pub fn discover() -> Self {
        Self {
            executable: process::find_executable(ENV_OVERRIDE, CANDIDATES),
        }
    }

    pub fn with_executable(path: impl Into<PathBuf>) -> Self {
        Self {
            executable: Some(path.into()),
        }
    }
}

impl EngineProvider for ChromiumProvider {
    fn id(&self) -> EngineId {
        EngineId::Chromium
    }

    fn is_available(&self) -> bool {
        self.executable.as_deref().is_some_and(Path::is_file)
    }

    fn render(&self, job: &RenderJob<'_>) -> Result<RenderedDocument> {
        let Some(exe) = self.executable.as_deref().filter(|p| p.is_file()) else {
            return Err(Error::EngineUnavailable {
                engine: EngineId::Chromium,
                hint: EngineId::Chromium.install_hint(),
            });
        };

        let mut css = page_rule(&job.page);
        css.push_str(&process::font_face_css(job.fonts));
        let document = process::html_document(job.html, job.title, &css);
        let scratch = Scratch::new(job.temp_dir, &document)?;

        let mut cmd = Command::new(exe);
        cmd.arg("--headless")
            .arg("--disable-gpu")
            .arg("--no-pdf-header-footer")
            .arg("--run-all-compositor-stages-before-draw")
            .arg("--allow-file-access-from-files")
            .arg(format!("--print-to-pdf={}", scratch.output.display()))
            .arg(format!("file://{}", scratch.input.display()));
        process::run(EngineId::Chromium, &mut cmd)?;

        let bytes = scratch.read_output(EngineId::Chromium)?;
        log::info!("chromium rendered {} bytes", bytes.len());
        Ok(RenderedDocument::Chromium(ChromiumPdf { bytes }))
    }
}

fn page_rule(page: &PageSetup) -> String {
    let m = page.margins;
    format!(
        "@page {{ size: {} {}; margin: {}mm {}mm {}mm {}mm; }}\n",
        page.format.as_str(),
        page.orientation.as_str(),
        m.top,
        m.right,
        m.bottom,
        m.left
    )
}

/// PDF printed by Chrome. Behaves like a ready-made response: it can be
/// downloaded, streamed inline, or written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChromiumPdf {
    bytes: Vec<u8>,
}

impl ChromiumPdf {
    pub fn output(&self) -> &[u8] {
        &self.bytes
    }

    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        fs::write(path, &self.bytes)
    }

    pub fn download(&self, filename: &str) -> PdfResponse {
        PdfResponse::new(filename, Disposition::Attachment, self.bytes.clone())
    }

    pub fn stream(&self, filename: &str) -> PdfResponse {
        PdfResponse::new(filename, Disposition::Inline, self.bytes.clone())
    }

    pub fn page_count(&self) -> usize {
        count_pdf_pages(&self.bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Margins, Orientation, PageFormat};

    #[test]
    fn page_rule_carries_size_and_margins() {
        let page = PageSetup {
            format: PageFormat::A5,
            orientation: Orientation::Landscape,
            margins: Margins {
                top: 10.0,
                right: 12.5,
                bottom: 10.0,
                left: 8.0,
            },
        };
        assert_eq!(
            page_rule(&page),
            "@page { size: A5 landscape; margin: 10mm 12.5mm 10mm 8mm; }\n"
        );
    }

    #[test]
    fn missing_executable_is_unavailable() {
        let p = ChromiumProvider::with_executable("/nonexistent/chrome");
        assert!(!p.is_available());
        assert_eq!(p.description(), "Chromium (headless browser rendering)");
    }
}

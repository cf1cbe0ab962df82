//! `wkhtmltopdf` backend.

use std::path::{Path, PathBuf};
use std::process::Command;

use super::process::{self, Scratch};
use super::{count_pdf_pages, Disposition, EngineId, EngineProvider, PdfResponse, RenderJob, RenderedDocument};
use crate::config::{Orientation, PageSetup};
use crate::error::{Error, Result};

const ENV_OVERRIDE: &str = "ARABIC_PDF_WKHTMLTOPDF";
const CANDIDATES: &[&str] = &["wkhtmltopdf"];

#[derive(Debug, Clone, Default)]
pub struct WkhtmltopdfProvider {
    executable: Option<PathBuf>,
}

impl WkhtmltopdfProvider {
    /// Look for the converter in `ARABIC_PDF_WKHTMLTOPDF`, then on the `PATH`.
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

impl EngineProvider for WkhtmltopdfProvider {
    fn id(&self) -> EngineId {
        EngineId::Wkhtmltopdf
    }

    fn is_available(&self) -> bool {
        self.executable.as_deref().is_some_and(Path::is_file)
    }

    fn render(&self, job: &RenderJob<'_>) -> Result<RenderedDocument> {
        let Some(exe) = self.executable.as_deref().filter(|p| p.is_file()) else {
            return Err(Error::EngineUnavailable {
                engine: EngineId::Wkhtmltopdf,
                hint: EngineId::Wkhtmltopdf.install_hint(),
            });
        };

        let css = process::font_face_css(job.fonts);
        let document = process::html_document(job.html, job.title, &css);
        let scratch = Scratch::new(job.temp_dir, &document)?;

        let mut cmd = Command::new(exe);
        cmd.args(page_args(&job.page))
            .arg("--title")
            .arg(job.title)
            .arg(&*scratch.input)
            .arg(&*scratch.output);
        process::run(EngineId::Wkhtmltopdf, &mut cmd)?;

        let bytes = scratch.read_output(EngineId::Wkhtmltopdf)?;
        log::info!("wkhtmltopdf rendered {} bytes", bytes.len());
        Ok(RenderedDocument::Wkhtmltopdf(WkhtmlDocument { bytes }))
    }
}

fn page_args(page: &PageSetup) -> Vec<String> {
    let orientation = match page.orientation {
        Orientation::Portrait => "Portrait",
        Orientation::Landscape => "Landscape",
    };
    let m = page.margins;
    let mut args: Vec<String> = ["--quiet", "--encoding", "utf-8", "--enable-local-file-access"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    args.extend([
        "--page-size".to_string(),
        page.format.as_str().to_string(),
        "--orientation".to_string(),
        orientation.to_string(),
    ]);
    for (flag, value) in [
        ("--margin-top", m.top),
        ("--margin-right", m.right),
        ("--margin-bottom", m.bottom),
        ("--margin-left", m.left),
    ] {
        args.push(flag.to_string());
        args.push(format!("{value}mm"));
    }
    args
}

/// Converted document. Exposes the raw bytes and an HTTP stream; saving is
/// done by the caller writing [`output`](Self::output).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WkhtmlDocument {
    bytes: Vec<u8>,
}

impl WkhtmlDocument {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn output(&self) -> &[u8] {
        &self.bytes
    }

    /// Stream the PDF; `attachment` selects download over inline display.
    pub fn stream(&self, filename: &str, attachment: bool) -> PdfResponse {
        let disposition = if attachment {
            Disposition::Attachment
        } else {
            Disposition::Inline
        };
        PdfResponse::new(filename, disposition, self.bytes.clone())
    }

    pub fn page_count(&self) -> usize {
        count_pdf_pages(&self.bytes)
    }
}

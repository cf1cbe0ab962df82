//! The built-in engine: runs the in-process pipeline from [`crate::forge`].

#[cfg(feature = "forge")]
use std::fs;
#[cfg(feature = "forge")]
use std::path::Path;

use super::{EngineId, EngineProvider, RenderJob, RenderedDocument};
#[cfg(feature = "forge")]
use super::{Disposition, PdfResponse};
use crate::error::{Error, Result};
#[cfg(feature = "forge")]
use crate::forge::{generate_pdf, FontManager, LayoutConfig, PipelineConfig};
#[cfg(feature = "forge")]
use crate::fonts::FontRegistration;

/// Provider for the built-in engine. Available whenever the crate was
/// compiled with the `forge` feature.
#[derive(Debug, Clone, Copy, Default)]
pub struct ForgeProvider;

impl EngineProvider for ForgeProvider {
    fn id(&self) -> EngineId {
        EngineId::Forge
    }

    fn is_available(&self) -> bool {
        cfg!(feature = "forge")
    }

    #[cfg(feature = "forge")]
    fn render(&self, job: &RenderJob<'_>) -> Result<RenderedDocument> {
        let fonts = font_manager(job.fonts, job.default_family);
        let config = PipelineConfig::from_page_setup(&job.page, job.title);
        let (bytes, layout) = generate_pdf(job.html, &config, &fonts).map_err(|message| Error::Render {
            engine: EngineId::Forge,
            message,
        })?;
        log::info!(
            "forge rendered {} page(s), {} bytes",
            layout.page_count(),
            bytes.len()
        );
        Ok(RenderedDocument::Forge(ForgeDocument { bytes, layout }))
    }

    #[cfg(not(feature = "forge"))]
    fn render(&self, _job: &RenderJob<'_>) -> Result<RenderedDocument> {
        Err(Error::EngineUnavailable {
            engine: EngineId::Forge,
            hint: EngineId::Forge.install_hint(),
        })
    }
}

/// Load every registered face. Unreadable files are skipped with a warning;
/// with nothing loaded the pipeline falls back to Helvetica.
#[cfg(feature = "forge")]
fn font_manager(registrations: &[FontRegistration], default_family: &str) -> FontManager {
    let mut fonts = FontManager::new();
    for reg in registrations {
        let faces = [
            (false, false, Some(&reg.regular)),
            (true, false, reg.bold.as_ref()),
            (false, true, reg.italic.as_ref()),
            (true, true, reg.bold_italic.as_ref()),
        ];
        for (bold, italic, path) in faces {
            let Some(path) = path else { continue };
            if let Err(e) = fonts.load_file(&reg.family, bold, italic, path) {
                log::warn!("skipping font {}: {e}", path.display());
            }
        }
    }
    fonts.ensure_default();
    if !fonts.set_default_family(default_family) {
        log::debug!(
            "default family {default_family} not loaded, using {}",
            fonts.default_family()
        );
    }
    fonts
}

/// A document produced by the built-in engine: the PDF bytes plus the
/// layout they were drawn from.
#[cfg(feature = "forge")]
#[derive(Debug, Clone)]
pub struct ForgeDocument {
    bytes: Vec<u8>,
    layout: LayoutConfig,
}

#[cfg(feature = "forge")]
impl ForgeDocument {
    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    pub fn page_count(&self) -> usize {
        self.layout.page_count()
    }

    pub fn output(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        fs::write(path, &self.bytes)
    }

    pub fn download(&self, filename: &str) -> PdfResponse {
        PdfResponse::new(filename, Disposition::Attachment, self.bytes.clone())
    }

    pub fn inline(&self, filename: &str) -> PdfResponse {
        PdfResponse::new(filename, Disposition::Inline, self.bytes.clone())
    }
}

#[cfg(all(test, feature = "forge"))]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::config::PageSetup;

    fn job<'a>(html: &'a str, fonts: &'a [FontRegistration], temp: &'a Path) -> RenderJob<'a> {
        RenderJob {
            html,
            page: PageSetup::default(),
            fonts,
            default_family: "Amiri",
            title: "اختبار",
            temp_dir: temp,
        }
    }

    #[test]
    fn renders_without_font_files() {
        let temp = std::env::temp_dir();
        let doc = ForgeProvider.render(&job("<p>مرحبا</p>", &[], &temp)).unwrap();
        assert_eq!(doc.engine(), EngineId::Forge);
        assert_eq!(doc.page_count(), 1);
        let RenderedDocument::Forge(doc) = doc else {
            panic!("expected a forge document");
        };
        assert!(doc.output().starts_with(b"%PDF-"));
        assert_eq!(doc.layout().title, "اختبار");
    }

    #[test]
    fn unreadable_font_is_skipped() {
        let regs = [FontRegistration {
            family: "Amiri".into(),
            regular: PathBuf::from("/nonexistent/Amiri-Regular.ttf"),
            bold: None,
            italic: None,
            bold_italic: None,
        }];
        let fonts = font_manager(&regs, "Amiri");
        assert!(!fonts.has_real_fonts());
        assert_eq!(fonts.default_family(), crate::forge::fonts::FALLBACK_FAMILY);
    }

    #[test]
    fn download_is_an_attachment() {
        let temp = std::env::temp_dir();
        let RenderedDocument::Forge(doc) = ForgeProvider.render(&job("<p>x</p>", &[], &temp)).unwrap() else {
            panic!("expected a forge document");
        };
        let resp = doc.download("doc.pdf");
        assert_eq!(resp.disposition, Disposition::Attachment);
        assert_eq!(resp.body, doc.output());
    }
}

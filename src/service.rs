//! The generation facade.
//!
//! [`ArabicPdfService`] owns the configuration, the font registry and the
//! engine registry. Every generation call checks that the configured engine
//! is available, prepares the HTML once and hands it to the engine.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{Config, ConfigOverrides, UnknownFontPolicy};
use crate::engine::{EngineId, EngineRegistry, PdfResponse, RenderJob, RenderedDocument};
use crate::error::{Error, Result};
use crate::fonts::{FontRegistry, DEFAULT_FONT};
use crate::prepare;
use crate::requirements::{self, RequirementsReport};

/// Title used when [`GenerateOptions::title`] is not set.
pub const DEFAULT_TITLE: &str = "Arabic Document";
/// File name offered by [`ArabicPdfService::download`] callers that have none.
pub const DEFAULT_DOWNLOAD_NAME: &str = "arabic-document.pdf";

/// Per-call generation options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateOptions {
    /// Document title stored in the PDF metadata.
    pub title: Option<String>,
}

impl GenerateOptions {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
        }
    }

    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or(DEFAULT_TITLE)
    }
}

/// Arabic PDF generator.
#[derive(Debug, Clone)]
pub struct ArabicPdfService {
    config: Config,
    fonts: FontRegistry,
    engines: EngineRegistry,
}

impl ArabicPdfService {
    /// Build a service over the bundled engines.
    pub fn new(overrides: ConfigOverrides) -> Result<Self> {
        Self::with_engines(overrides, EngineRegistry::builtin())
    }

    /// Build a service over an explicit engine registry.
    ///
    /// When `overrides` names no engine, the recommended engine is picked
    /// once here; with nothing available the built-in default is kept.
    pub fn with_engines(overrides: ConfigOverrides, engines: EngineRegistry) -> Result<Self> {
        let config = Config::with_overrides(&overrides)?;
        Ok(Self::build(config, overrides.engine.is_some(), engines))
    }

    fn build(mut config: Config, engine_given: bool, engines: EngineRegistry) -> Self {
        let fonts = FontRegistry::from_dir(&config.font_path);

        if !fonts.contains(&config.default_font) {
            log::warn!(
                "default font {} is not a known font, using {DEFAULT_FONT}",
                config.default_font
            );
            config.default_font = DEFAULT_FONT.to_string();
        }

        if !engine_given {
            match engines.recommended() {
                Some(id) => config.engine = id,
                None => log::debug!("no engine available, keeping {}", config.engine),
            }
        }
        log::debug!("arabic-pdf service using engine {}", config.engine);

        Self {
            config,
            fonts,
            engines,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Merge `overrides` onto the current configuration. Invalid margins
    /// are rejected and leave the configuration untouched.
    ///
    /// The engine is taken as given; it is only checked when generating.
    /// The font registry keeps the directory it was built from.
    pub fn set_config(&mut self, overrides: ConfigOverrides) -> Result<&mut Self> {
        let previous_font = self.config.default_font.clone();
        self.config.apply(&overrides)?;
        if !self.fonts.contains(&self.config.default_font) {
            log::warn!(
                "ignoring unknown default font {}",
                self.config.default_font
            );
            self.config.default_font = previous_font;
        }
        Ok(self)
    }

    pub fn default_font(&self) -> &str {
        &self.config.default_font
    }

    /// Change the default font. Unknown names are handled according to
    /// the configured [`UnknownFontPolicy`].
    pub fn set_default_font(&mut self, name: &str) -> Result<&mut Self> {
        if self.fonts.contains(name) {
            self.config.default_font = name.to_string();
            return Ok(self);
        }
        match self.config.unknown_font_policy {
            UnknownFontPolicy::Ignore => {
                log::debug!("ignoring unknown font {name}");
                Ok(self)
            }
            UnknownFontPolicy::Reject => Err(Error::InvalidFontName(name.to_string())),
        }
    }

    /// Symbolic names of every registered font.
    pub fn available_fonts(&self) -> Vec<&'static str> {
        self.fonts.names()
    }

    pub fn fonts(&self) -> &FontRegistry {
        &self.fonts
    }

    pub fn engines(&self) -> &EngineRegistry {
        &self.engines
    }

    pub fn available_engines(&self) -> BTreeMap<EngineId, String> {
        self.engines.available_engines()
    }

    pub fn is_engine_available(&self, id: EngineId) -> bool {
        self.engines.is_available(id)
    }

    pub fn recommended_engine(&self) -> Option<EngineId> {
        self.engines.recommended()
    }

    pub fn check_requirements(&self) -> RequirementsReport {
        RequirementsReport::collect(&self.engines, &self.fonts, self.config.font_path.clone())
    }

    pub fn installation_instructions(&self) -> Vec<String> {
        requirements::installation_instructions(&self.engines)
    }

    /// Render `html` with the configured engine.
    pub fn generate(&self, html: &str, options: &GenerateOptions) -> Result<RenderedDocument> {
        let engine = self.config.engine;
        let provider = self
            .engines
            .provider(engine)
            .filter(|p| p.is_available())
            .ok_or(Error::EngineUnavailable {
                engine,
                hint: engine.install_hint(),
            })?;

        let registrations = self.fonts.registrations();
        let default_family = self
            .fonts
            .spec(&self.config.default_font)
            .map_or("Amiri", |s| s.family);
        let prepared = prepare::prepare_arabic_html(html, &self.fonts);

        let job = RenderJob {
            html: &prepared,
            page: self.config.page_setup(),
            fonts: &registrations,
            default_family,
            title: options.title(),
            temp_dir: &self.config.temp_path,
        };
        log::debug!(
            "rendering {} bytes of html with {engine}, {} font files in {} families",
            prepared.len(),
            registrations.iter().map(|r| r.files().len()).sum::<usize>(),
            registrations.len()
        );
        provider.render(&job)
    }

    /// Render and write the PDF to `path`. Returns the path written.
    pub fn save(&self, html: &str, path: &Path, options: &GenerateOptions) -> Result<PathBuf> {
        match self.generate(html, options)? {
            #[cfg(feature = "forge")]
            RenderedDocument::Forge(doc) => doc.save(path)?,
            RenderedDocument::Chromium(pdf) => pdf.save(path)?,
            RenderedDocument::Wkhtmltopdf(doc) => fs::write(path, doc.output())?,
        }
        log::info!("saved {}", path.display());
        Ok(path.to_path_buf())
    }

    /// Render into an attachment response.
    pub fn download(&self, html: &str, filename: &str, options: &GenerateOptions) -> Result<PdfResponse> {
        Ok(match self.generate(html, options)? {
            #[cfg(feature = "forge")]
            RenderedDocument::Forge(doc) => doc.download(filename),
            RenderedDocument::Chromium(pdf) => pdf.download(filename),
            RenderedDocument::Wkhtmltopdf(doc) => doc.stream(filename, true),
        })
    }

    /// Render an inline (display in place) response.
    pub fn stream(&self, html: &str, filename: &str, options: &GenerateOptions) -> Result<PdfResponse> {
        Ok(match self.generate(html, options)? {
            #[cfg(feature = "forge")]
            RenderedDocument::Forge(doc) => doc.inline(filename),
            RenderedDocument::Chromium(pdf) => pdf.stream(filename),
            RenderedDocument::Wkhtmltopdf(doc) => doc.stream(filename, false),
        })
    }

    /// Render and return the raw PDF bytes.
    pub fn output(&self, html: &str, options: &GenerateOptions) -> Result<Vec<u8>> {
        Ok(self.generate(html, options)?.into_bytes())
    }

    /// A titled document with a single paragraph. Both values are escaped
    /// and newlines in `content` become line breaks.
    pub fn create_simple_document(
        &self,
        title: &str,
        content: &str,
        options: &GenerateOptions,
    ) -> Result<RenderedDocument> {
        self.generate(&prepare::simple_document_html(title, content), options)
    }

    /// A single Quran verse under a `سورة … - الآية …` heading.
    pub fn create_quran_document(
        &self,
        surah: &str,
        ayah: &str,
        text: &str,
        options: &GenerateOptions,
    ) -> Result<RenderedDocument> {
        self.generate(&prepare::quran_document_html(surah, ayah, text), options)
    }
}

impl Default for ArabicPdfService {
    fn default() -> Self {
        Self::build(Config::default(), false, EngineRegistry::builtin())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::engine::{ChromiumProvider, EngineProvider, WkhtmltopdfProvider};

    fn no_engines() -> EngineRegistry {
        EngineRegistry::new(vec![
            Arc::new(ChromiumProvider::with_executable("/nonexistent/chrome")) as Arc<dyn EngineProvider>,
            Arc::new(WkhtmltopdfProvider::with_executable("/nonexistent/wkhtmltopdf")),
        ])
    }

    #[test]
    fn unavailable_engine_fails_before_rendering() {
        let svc = ArabicPdfService::with_engines(
            ConfigOverrides {
                engine: Some(EngineId::Chromium),
                ..Default::default()
            },
            no_engines(),
        )
        .unwrap();
        let err = svc.generate("<p>x</p>", &GenerateOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            Error::EngineUnavailable {
                engine: EngineId::Chromium,
                ..
            }
        ));
    }

    #[test]
    fn no_available_engine_keeps_default() {
        let svc = ArabicPdfService::with_engines(ConfigOverrides::default(), no_engines()).unwrap();
        assert_eq!(svc.config().engine, EngineId::Forge);
        assert_eq!(svc.recommended_engine(), None);
        assert!(!svc.check_requirements().status);
    }

    #[test]
    fn unknown_font_is_ignored_by_default() {
        let mut svc = ArabicPdfService::with_engines(ConfigOverrides::default(), no_engines()).unwrap();
        svc.set_default_font("Cairo-Bold").unwrap();
        svc.set_default_font("Comic Sans").unwrap();
        assert_eq!(svc.default_font(), "Cairo-Bold");
    }

    #[test]
    fn unknown_font_can_be_rejected() {
        let mut svc = ArabicPdfService::with_engines(
            ConfigOverrides {
                unknown_font_policy: Some(UnknownFontPolicy::Reject),
                ..Default::default()
            },
            no_engines(),
        )
        .unwrap();
        let err = svc.set_default_font("Comic Sans").unwrap_err();
        assert!(matches!(err, Error::InvalidFontName(name) if name == "Comic Sans"));
        assert_eq!(svc.default_font(), DEFAULT_FONT);
    }

    #[test]
    fn unknown_configured_font_falls_back() {
        let svc = ArabicPdfService::with_engines(
            ConfigOverrides {
                default_font: Some("Missing".into()),
                ..Default::default()
            },
            no_engines(),
        )
        .unwrap();
        assert_eq!(svc.default_font(), DEFAULT_FONT);
    }

    #[test]
    fn set_config_merges_and_chains() {
        let mut svc = ArabicPdfService::with_engines(ConfigOverrides::default(), no_engines()).unwrap();
        svc.set_config(ConfigOverrides {
            margin_top: Some(30.0),
            ..Default::default()
        })
        .unwrap()
        .set_config(ConfigOverrides {
            engine: Some(EngineId::Wkhtmltopdf),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(svc.config().margin_top, 30.0);
        assert_eq!(svc.config().margin_left, crate::config::DEFAULT_MARGIN_MM);
        assert_eq!(svc.config().engine, EngineId::Wkhtmltopdf);
    }

    #[test]
    fn set_config_rejects_invalid_margin() {
        let mut svc = ArabicPdfService::with_engines(ConfigOverrides::default(), no_engines()).unwrap();
        let err = svc
            .set_config(ConfigOverrides {
                margin_left: Some(f32::NAN),
                engine: Some(EngineId::Chromium),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, Error::InvalidValue { .. }));
        assert_eq!(svc.config().margin_left, crate::config::DEFAULT_MARGIN_MM);
        assert_eq!(svc.config().engine, EngineId::Forge);
    }

    #[test]
    fn construction_rejects_negative_margin() {
        let err = ArabicPdfService::with_engines(
            ConfigOverrides {
                margin_top: Some(-50.0),
                ..Default::default()
            },
            no_engines(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidValue { key, .. } if key == "margin_top"));
    }

    #[test]
    fn options_default_title() {
        assert_eq!(GenerateOptions::default().title(), "Arabic Document");
        assert_eq!(GenerateOptions::titled("تقرير").title(), "تقرير");
    }
}

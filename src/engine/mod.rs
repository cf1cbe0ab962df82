//! Rendering engines and the registry that selects between them.
//!
//! Every backend implements [`EngineProvider`]: it reports its own
//! availability and turns a [`RenderJob`] into its native document type.
//! Native results are not normalised; they come back wrapped in the
//! [`RenderedDocument`] tagged union.

mod chromium;
mod forge;
mod process;
mod wkhtml;

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::PageSetup;
use crate::error::{Error, Result};
use crate::fonts::FontRegistration;

pub use chromium::{ChromiumPdf, ChromiumProvider};
#[cfg(feature = "forge")]
pub use forge::ForgeDocument;
pub use forge::ForgeProvider;
pub use wkhtml::{WkhtmlDocument, WkhtmltopdfProvider};

// ---------------------------------------------------------------------------
// Engine identifiers
// ---------------------------------------------------------------------------

/// One of the supported PDF engines.
///
/// The declaration order is the recommendation priority, so the derived
/// `Ord` sorts engines from most to least preferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum EngineId {
    /// Built-in printpdf pipeline.
    Forge,
    /// Headless Chrome / Chromium.
    Chromium,
    /// The `wkhtmltopdf` converter.
    Wkhtmltopdf,
}

/// Engines in recommendation order.
pub const ENGINE_PRIORITY: [EngineId; 3] =
    [EngineId::Forge, EngineId::Chromium, EngineId::Wkhtmltopdf];

impl EngineId {
    pub fn as_str(self) -> &'static str {
        match self {
            EngineId::Forge => "forge",
            EngineId::Chromium => "chromium",
            EngineId::Wkhtmltopdf => "wkhtmltopdf",
        }
    }

    /// Human-readable description shown by `available_engines`.
    pub fn description(self) -> &'static str {
        match self {
            EngineId::Forge => "Forge (built-in, recommended for Arabic)",
            EngineId::Chromium => "Chromium (headless browser rendering)",
            EngineId::Wkhtmltopdf => "wkhtmltopdf (fast external converter)",
        }
    }

    /// What to do to make this engine available.
    pub fn install_hint(self) -> &'static str {
        match self {
            EngineId::Forge => "rebuild arabic-pdf with the `forge` cargo feature enabled",
            EngineId::Chromium => {
                "install Chromium or Google Chrome, or point ARABIC_PDF_CHROME at the executable"
            }
            EngineId::Wkhtmltopdf => {
                "install wkhtmltopdf (https://wkhtmltopdf.org), or point ARABIC_PDF_WKHTMLTOPDF at the executable"
            }
        }
    }
}

impl fmt::Display for EngineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EngineId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "forge" => Ok(EngineId::Forge),
            "chromium" | "chrome" => Ok(EngineId::Chromium),
            "wkhtmltopdf" | "wkhtml" => Ok(EngineId::Wkhtmltopdf),
            _ => Err(Error::UnknownEngine(s.to_string())),
        }
    }
}

impl TryFrom<String> for EngineId {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<EngineId> for String {
    fn from(id: EngineId) -> Self {
        id.as_str().to_string()
    }
}

// ---------------------------------------------------------------------------
// Provider contract
// ---------------------------------------------------------------------------

/// A fully prepared rendering request.
#[derive(Debug, Clone, Copy)]
pub struct RenderJob<'a> {
    /// Prepared HTML (style block + caller fragment).
    pub html: &'a str,
    pub page: PageSetup,
    /// Font families whose files exist on disk.
    pub fonts: &'a [FontRegistration],
    /// Family of the default font.
    pub default_family: &'a str,
    /// Document title for the PDF metadata.
    pub title: &'a str,
    /// Scratch directory for engines that work through files.
    pub temp_dir: &'a Path,
}

/// A PDF backend.
pub trait EngineProvider: Send + Sync {
    fn id(&self) -> EngineId;

    fn description(&self) -> &'static str {
        self.id().description()
    }

    /// Whether the backing library or executable is present right now.
    fn is_available(&self) -> bool;

    /// Render a job into this engine's native document.
    fn render(&self, job: &RenderJob<'_>) -> Result<RenderedDocument>;
}

/// Engine-native result of a generation call.
#[derive(Debug, Clone)]
pub enum RenderedDocument {
    #[cfg(feature = "forge")]
    Forge(ForgeDocument),
    Chromium(ChromiumPdf),
    Wkhtmltopdf(WkhtmlDocument),
}

impl RenderedDocument {
    /// The engine that produced this document.
    pub fn engine(&self) -> EngineId {
        match self {
            #[cfg(feature = "forge")]
            RenderedDocument::Forge(_) => EngineId::Forge,
            RenderedDocument::Chromium(_) => EngineId::Chromium,
            RenderedDocument::Wkhtmltopdf(_) => EngineId::Wkhtmltopdf,
        }
    }

    /// The raw PDF bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            #[cfg(feature = "forge")]
            RenderedDocument::Forge(doc) => doc.into_bytes(),
            RenderedDocument::Chromium(pdf) => pdf.output().to_vec(),
            RenderedDocument::Wkhtmltopdf(doc) => doc.output().to_vec(),
        }
    }

    /// Number of pages as reported by the native document.
    pub fn page_count(&self) -> usize {
        match self {
            #[cfg(feature = "forge")]
            RenderedDocument::Forge(doc) => doc.page_count(),
            RenderedDocument::Chromium(pdf) => pdf.page_count(),
            RenderedDocument::Wkhtmltopdf(doc) => doc.page_count(),
        }
    }
}

/// Count `/Type /Page` objects in a PDF byte stream.
///
/// Good enough for documents written by the supported engines, which do not
/// compress their object streams.
pub fn count_pdf_pages(bytes: &[u8]) -> usize {
    let mut count = 0;
    for needle in [&b"/Type /Page"[..], &b"/Type/Page"[..]] {
        let mut i = 0;
        while let Some(pos) = find(&bytes[i..], needle) {
            let end = i + pos + needle.len();
            if bytes.get(end) != Some(&b's') {
                count += 1;
            }
            i = end;
        }
    }
    count
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

// ---------------------------------------------------------------------------
// Download responses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Ask the client to save the file.
    Attachment,
    /// Let the client display the file.
    Inline,
}

/// A PDF ready to be sent by a host HTTP layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfResponse {
    pub filename: String,
    pub disposition: Disposition,
    pub body: Vec<u8>,
}

impl PdfResponse {
    pub fn new(filename: &str, disposition: Disposition, body: Vec<u8>) -> Self {
        Self {
            filename: filename.to_string(),
            disposition,
            body,
        }
    }

    pub fn content_disposition(&self) -> String {
        let kind = match self.disposition {
            Disposition::Attachment => "attachment",
            Disposition::Inline => "inline",
        };
        let name = self.filename.replace('\\', "\\\\").replace('"', "\\\"");
        format!("{kind}; filename=\"{name}\"")
    }

    /// Response headers in the order a host would send them.
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Content-Type", "application/pdf".to_string()),
            ("Content-Disposition", self.content_disposition()),
            ("Content-Length", self.body.len().to_string()),
        ]
    }

    pub fn into_body(self) -> Vec<u8> {
        self.body
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// The set of providers a service can route to.
#[derive(Clone)]
pub struct EngineRegistry {
    providers: Vec<Arc<dyn EngineProvider>>,
}

impl EngineRegistry {
    pub fn new(providers: Vec<Arc<dyn EngineProvider>>) -> Self {
        Self { providers }
    }

    /// The three bundled providers, with external executables discovered
    /// from the environment.
    pub fn builtin() -> Self {
        Self::new(vec![
            Arc::new(ForgeProvider),
            Arc::new(ChromiumProvider::discover()),
            Arc::new(WkhtmltopdfProvider::discover()),
        ])
    }

    pub fn provider(&self, id: EngineId) -> Option<&Arc<dyn EngineProvider>> {
        self.providers.iter().find(|p| p.id() == id)
    }

    /// Engines whose provider reports itself available, with descriptions.
    pub fn available_engines(&self) -> BTreeMap<EngineId, String> {
        self.providers
            .iter()
            .filter(|p| p.is_available())
            .map(|p| (p.id(), p.description().to_string()))
            .collect()
    }

    pub fn is_available(&self, id: EngineId) -> bool {
        self.available_engines().contains_key(&id)
    }

    /// First available engine in [`ENGINE_PRIORITY`] order.
    pub fn recommended(&self) -> Option<EngineId> {
        let available = self.available_engines();
        ENGINE_PRIORITY
            .into_iter()
            .find(|id| available.contains_key(id))
    }
}

impl Default for EngineRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl fmt::Debug for EngineRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.providers.iter().map(|p| p.id()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Probe {
        id: EngineId,
        present: bool,
    }

    impl EngineProvider for Probe {
        fn id(&self) -> EngineId {
            self.id
        }

        fn is_available(&self) -> bool {
            self.present
        }

        fn render(&self, _job: &RenderJob<'_>) -> Result<RenderedDocument> {
            Ok(RenderedDocument::Wkhtmltopdf(WkhtmlDocument::from_bytes(
                b"%PDF-1.4".to_vec(),
            )))
        }
    }

    fn registry(present: [bool; 3]) -> EngineRegistry {
        EngineRegistry::new(
            ENGINE_PRIORITY
                .iter()
                .zip(present)
                .map(|(&id, present)| Arc::new(Probe { id, present }) as Arc<dyn EngineProvider>)
                .collect(),
        )
    }

    #[test]
    fn available_engines_follow_availability() {
        let reg = registry([false, true, true]);
        let engines = reg.available_engines();
        assert_eq!(engines.len(), 2);
        assert!(!engines.contains_key(&EngineId::Forge));
        assert_eq!(
            engines.get(&EngineId::Chromium).map(String::as_str),
            Some("Chromium (headless browser rendering)")
        );
    }

    #[test]
    fn recommendation_respects_priority() {
        assert_eq!(registry([true, false, true]).recommended(), Some(EngineId::Forge));
        assert_eq!(registry([false, true, true]).recommended(), Some(EngineId::Chromium));
        assert_eq!(registry([false, false, true]).recommended(), Some(EngineId::Wkhtmltopdf));
        assert_eq!(registry([false, false, false]).recommended(), None);
    }

    #[test]
    fn recommendation_ignores_provider_order() {
        let reg = EngineRegistry::new(vec![
            Arc::new(Probe { id: EngineId::Wkhtmltopdf, present: true }),
            Arc::new(Probe { id: EngineId::Forge, present: true }),
        ]);
        assert_eq!(reg.recommended(), Some(EngineId::Forge));
    }

    #[test]
    fn engine_tokens_parse() {
        assert_eq!("Forge".parse::<EngineId>().unwrap(), EngineId::Forge);
        assert_eq!("chrome".parse::<EngineId>().unwrap(), EngineId::Chromium);
        assert!(matches!(
            "tcpdf".parse::<EngineId>(),
            Err(Error::UnknownEngine(_))
        ));
    }

    #[test]
    fn response_headers_describe_attachment() {
        let r = PdfResponse::new("تقرير \"1\".pdf", Disposition::Attachment, vec![0; 12]);
        let headers = r.headers();
        assert_eq!(headers[0].1, "application/pdf");
        assert_eq!(headers[1].1, "attachment; filename=\"تقرير \\\"1\\\".pdf\"");
        assert_eq!(headers[2].1, "12");
    }

    #[test]
    fn page_counter_skips_pages_tree() {
        let pdf = b"<< /Type /Pages /Kids [3 0 R 4 0 R] >> << /Type /Page >> << /Type/Page >>";
        assert_eq!(count_pdf_pages(pdf), 2);
    }
}

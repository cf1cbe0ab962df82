//! Pipeline – ties together parsing, styling, layout, pagination, and
//! rendering into a single function call.

use crate::config::{Orientation, PageSetup};

use super::dom::{body_children, parse_html, stylesheet_text};
use super::fonts::FontManager;
use super::layout::compute_layout;
use super::layout_config::LayoutConfig;
use super::pagination::{paginate, VerticalMargins};
use super::render::render_pdf;
use super::style::{build_styled_tree, ComputedStyle, Stylesheet};

const PT_PER_MM: f32 = 72.0 / 25.4;

/// Page margins in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageMargins {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

/// Configuration for the PDF generation pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Document title embedded in the PDF metadata.
    pub title: String,
    /// Portrait page width in points (default: A4 = 595.28).
    pub page_width: f32,
    /// Portrait page height in points (default: A4 = 841.89).
    pub page_height: f32,
    pub margins: PageMargins,
    /// Swaps effective width/height when `Landscape`.
    pub orientation: Orientation,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::from_page_setup(&PageSetup::default(), "Arabic Document")
    }
}

impl PipelineConfig {
    /// Convert a millimetre page setup into points.
    pub fn from_page_setup(page: &PageSetup, title: &str) -> Self {
        let (w, h) = page.format.size_mm();
        let m = page.margins;
        Self {
            title: title.to_string(),
            page_width: w * PT_PER_MM,
            page_height: h * PT_PER_MM,
            margins: PageMargins {
                top: m.top * PT_PER_MM,
                right: m.right * PT_PER_MM,
                bottom: m.bottom * PT_PER_MM,
                left: m.left * PT_PER_MM,
            },
            orientation: page.orientation,
        }
    }

    /// Effective page width after applying orientation.
    pub fn effective_width(&self) -> f32 {
        match self.orientation {
            Orientation::Portrait => self.page_width,
            Orientation::Landscape => self.page_height,
        }
    }

    /// Effective page height after applying orientation.
    pub fn effective_height(&self) -> f32 {
        match self.orientation {
            Orientation::Portrait => self.page_height,
            Orientation::Landscape => self.page_width,
        }
    }
}

/// Full pipeline: HTML string → PDF bytes.
///
/// Returns the PDF bytes together with the layout they were rendered from.
pub fn generate_pdf(
    html: &str,
    config: &PipelineConfig,
    fonts: &FontManager,
) -> Result<(Vec<u8>, LayoutConfig), String> {
    let layout = compute_layout_config(html, config, fonts)?;
    let pdf_bytes = render_pdf(&layout, fonts)?;
    log::debug!(
        "forge rendered {} page(s), {} bytes",
        layout.page_count(),
        pdf_bytes.len()
    );
    Ok((pdf_bytes, layout))
}

/// Generate only the layout config (no PDF rendering).
pub fn compute_layout_config(
    html: &str,
    config: &PipelineConfig,
    fonts: &FontManager,
) -> Result<LayoutConfig, String> {
    // 1. Parse HTML and collect the document's <style> blocks
    let dom = parse_html(html);
    let sheet = Stylesheet::parse(&stylesheet_text(&dom));
    let dom_nodes = body_children(&dom);

    // 2. Build styled tree
    let base = ComputedStyle {
        font_family: fonts.default_family().to_string(),
        ..ComputedStyle::default()
    };
    let root = sheet.root_style(base);
    let styled = build_styled_tree(&dom_nodes, Some(&root), &sheet);

    // 3. Compute layout
    let eff_w = config.effective_width();
    let eff_h = config.effective_height();
    let m = config.margins;
    let boxes = compute_layout(&styled, eff_w, m.left, m.right, fonts)?;

    // 4. Paginate
    let margins = VerticalMargins {
        top: m.top,
        bottom: m.bottom,
    };
    let mut layout = paginate(&boxes, eff_w, eff_h, margins, fonts);
    layout.title = config.title.clone();
    Ok(layout)
}

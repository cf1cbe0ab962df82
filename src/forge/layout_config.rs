//! Layout config – the frozen per-page description handed to the renderer.
//!
//! Everything here is plain data and serialisable, so a layout can be dumped
//! with `--layout` and inspected without rendering.

use serde::Serialize;

/// A complete document layout ready for rendering.
#[derive(Debug, Clone, Serialize)]
pub struct LayoutConfig {
    /// Document title embedded in the PDF metadata.
    pub title: String,
    /// Width of each page in PDF points (1 pt = 1/72 inch).
    pub page_width_pt: f32,
    /// Height of each page in PDF points.
    pub page_height_pt: f32,
    pub pages: Vec<PageLayout>,
}

/// One page of content.
#[derive(Debug, Clone, Serialize)]
pub struct PageLayout {
    pub page_index: usize,
    pub boxes: Vec<LayoutBox>,
}

/// A positioned rectangle with optional content.
#[derive(Debug, Clone, Serialize)]
pub struct LayoutBox {
    /// Position relative to page top-left, in points.
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,

    pub background_color: Option<[f32; 4]>,
    pub border: Option<BorderStyle>,

    pub text: Option<TextContent>,
    pub image: Option<ImageContent>,

    pub children: Vec<LayoutBox>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BorderStyle {
    pub width: f32,
    pub color: [f32; 4],
}

#[derive(Debug, Clone, Serialize)]
pub struct TextContent {
    /// Pre-wrapped lines of text, in logical order.
    pub lines: Vec<TextLine>,
    pub font_family: String,
    pub font_size: f32,
    pub bold: bool,
    pub italic: bool,
    pub color: [f32; 4],
    pub line_height: f32,
    /// Physical alignment: `left`, `center` or `right`.
    pub text_align: String,
    /// Right-to-left paragraph direction.
    pub rtl: bool,
    pub underline: bool,
    /// List bullet or number (e.g. "•" or "1.")
    pub list_marker: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TextLine {
    pub text: String,
    /// X offset of the line's left edge within the layout box.
    pub x_offset: f32,
    /// Y offset of the line's top within the layout box.
    pub y_offset: f32,
    /// Measured width of the line.
    pub width: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageContent {
    pub src: String,
    pub width: f32,
    pub height: f32,
}

impl LayoutConfig {
    /// An empty layout for a page of the given size in points.
    pub fn new(page_width_pt: f32, page_height_pt: f32) -> Self {
        Self {
            title: "Arabic Document".to_string(),
            page_width_pt,
            page_height_pt,
            pages: Vec::new(),
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn to_json(&self) -> Result<String, String> {
        serde_json::to_string_pretty(self).map_err(|e| e.to_string())
    }
}

impl LayoutBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            background_color: None,
            border: None,
            text: None,
            image: None,
            children: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_layout_has_default_title() {
        let config = LayoutConfig::new(595.28, 841.89);
        assert_eq!(config.title, "Arabic Document");
        assert_eq!(config.page_count(), 0);
    }

    #[test]
    fn json_dump_keeps_direction() {
        let mut page = PageLayout {
            page_index: 0,
            boxes: vec![LayoutBox::new(0.0, 0.0, 10.0, 10.0)],
        };
        page.boxes[0].text = Some(TextContent {
            lines: vec![],
            font_family: "Amiri".into(),
            font_size: 12.0,
            bold: false,
            italic: false,
            color: [0.0, 0.0, 0.0, 1.0],
            line_height: 18.0,
            text_align: "right".into(),
            rtl: true,
            underline: false,
            list_marker: None,
        });
        let mut config = LayoutConfig::new(100.0, 100.0);
        config.pages.push(page);

        let dumped: serde_json::Value = serde_json::from_str(&config.to_json().unwrap()).unwrap();
        let text = &dumped["pages"][0]["boxes"][0]["text"];
        assert_eq!(text["rtl"], true);
        assert_eq!(text["text_align"], "right");
        assert_eq!(dumped["title"], "Arabic Document");
    }
}

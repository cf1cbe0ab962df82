//! Pagination – splits positioned boxes into pages and fixes the position of
//! every text line.
//!
//! Handles:
//! - page boundaries inside the configured margins
//! - page-break-before / page-break-after hints
//! - table row splitting across pages
//! - per-line alignment for LTR and RTL paragraphs, including the first-line
//!   indent

use super::fonts::FontManager;
use super::layout::{font_query, BoxContent, PositionedBox};
use super::layout_config::*;
use super::style::{self, TextAlign};

/// Vertical margins of the printable area, in points.
#[derive(Debug, Clone, Copy)]
pub struct VerticalMargins {
    pub top: f32,
    pub bottom: f32,
}

/// Expand pure containers taller than a page so their children can be
/// split across pages individually.
fn flatten_for_pagination(boxes: &[PositionedBox], content_height: f32) -> Vec<&PositionedBox> {
    let mut result = Vec::new();
    for pbox in boxes {
        if pbox.height > content_height
            && matches!(pbox.content, BoxContent::None)
            && !pbox.children.is_empty()
        {
            result.extend(flatten_for_pagination(&pbox.children, content_height));
        } else {
            result.push(pbox);
        }
    }
    result
}

struct Paginator<'a> {
    config: LayoutConfig,
    current: PageLayout,
    /// Document-space y at which the current page begins.
    page_start: f32,
    content_height: f32,
    margin_top: f32,
    fonts: &'a FontManager,
}

impl Paginator<'_> {
    fn y_on_page(&self, pbox: &PositionedBox) -> f32 {
        (pbox.y - self.page_start).max(0.0)
    }

    fn new_page(&mut self, page_start: f32) {
        let next = PageLayout {
            page_index: self.config.pages.len() + 1,
            boxes: Vec::new(),
        };
        let done = std::mem::replace(&mut self.current, next);
        self.config.pages.push(done);
        self.page_start = page_start;
    }

    fn place(&mut self, pbox: &PositionedBox) {
        let abs_y = self.margin_top + self.y_on_page(pbox);
        let lbox = build_layout_box(pbox, abs_y, self.fonts);
        self.current.boxes.push(lbox);
    }

    fn split_table(&mut self, pbox: &PositionedBox) {
        for row in &pbox.children {
            let bottom = self.y_on_page(row) + row.height;
            if bottom > self.content_height && !self.current.boxes.is_empty() {
                self.new_page(row.y);
            }
            self.place(row);
        }
    }
}

/// Convert positioned boxes into a paginated [`LayoutConfig`].
pub fn paginate(
    boxes: &[PositionedBox],
    page_width: f32,
    page_height: f32,
    margins: VerticalMargins,
    fonts: &FontManager,
) -> LayoutConfig {
    let content_height = (page_height - margins.top - margins.bottom).max(1.0);
    let flat = flatten_for_pagination(boxes, content_height);

    let mut p = Paginator {
        config: LayoutConfig::new(page_width, page_height),
        current: PageLayout {
            page_index: 0,
            boxes: Vec::new(),
        },
        page_start: 0.0,
        content_height,
        margin_top: margins.top,
        fonts,
    };

    for pbox in flat {
        if pbox.page_break_before && !p.current.boxes.is_empty() {
            p.new_page(pbox.y);
        }

        let box_bottom = p.y_on_page(pbox) + pbox.height;
        if box_bottom > content_height && !p.current.boxes.is_empty() {
            if is_table_like(pbox) && !pbox.page_break_inside_avoid {
                p.split_table(pbox);
                continue;
            }
            p.new_page(pbox.y);
        }

        p.place(pbox);

        if pbox.page_break_after {
            p.new_page(pbox.y + pbox.height);
        }
    }

    if !p.current.boxes.is_empty() || p.config.pages.is_empty() {
        p.config.pages.push(p.current);
    }
    p.config
}

fn is_table_like(pbox: &PositionedBox) -> bool {
    pbox.style.display == style::Display::Grid && !pbox.children.is_empty()
}

/// Position each wrapped line inside a text box of width `box_width`.
fn place_lines(pbox: &PositionedBox, lines: &[String], fonts: &FontManager) -> Vec<TextLine> {
    let s = &pbox.style;
    let q = font_query(s);
    let line_height = fonts.line_height_px(s.font_size, s.line_height);
    let inset_x = s.padding_left + s.border_width;
    let inset_y = s.padding_top + s.border_width;
    let avail = (pbox.width - inset_x - s.padding_right - s.border_width).max(0.0);
    let align = s.physical_align();
    let rtl = s.is_rtl();

    lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let width = fonts.measure_text_width(line, &q);
            let indent = if i == 0 { s.text_indent } else { 0.0 };
            let x = match align {
                TextAlign::Center => (avail - width) / 2.0,
                TextAlign::Right => avail - width - if rtl { indent } else { 0.0 },
                _ => {
                    if rtl {
                        0.0
                    } else {
                        indent
                    }
                }
            };
            TextLine {
                text: line.clone(),
                x_offset: inset_x + x.max(0.0),
                y_offset: inset_y + i as f32 * line_height,
                width,
            }
        })
        .collect()
}

fn align_name(align: TextAlign) -> &'static str {
    match align {
        TextAlign::Center => "center",
        TextAlign::Right => "right",
        _ => "left",
    }
}

/// Recursively build a [`LayoutBox`] with page-absolute coordinates.
///
/// `PositionedBox` coordinates are document-space absolutes, so a child's
/// page y is its parent's page y plus `child.y - parent.y`. x values already
/// include the left page margin.
fn build_layout_box(pbox: &PositionedBox, abs_y: f32, fonts: &FontManager) -> LayoutBox {
    let s = &pbox.style;
    let mut lb = LayoutBox::new(pbox.x, abs_y, pbox.width, pbox.height);

    if !s.background_color.is_transparent() {
        let c = &s.background_color;
        lb.background_color = Some([c.r, c.g, c.b, c.a]);
    }

    if s.border_width > 0.5 {
        let c = &s.border_color;
        lb.border = Some(BorderStyle {
            width: s.border_width,
            color: [c.r, c.g, c.b, c.a],
        });
    }

    let c = &s.color;
    let text_content = |lines: Vec<TextLine>, list_marker: Option<String>| TextContent {
        lines,
        font_family: s.font_family.clone(),
        font_size: s.font_size,
        bold: s.font_weight == style::FontWeight::Bold,
        italic: s.font_style == style::FontStyle::Italic,
        color: [c.r, c.g, c.b, c.a],
        line_height: fonts.line_height_px(s.font_size, s.line_height),
        text_align: align_name(s.physical_align()).to_string(),
        rtl: s.is_rtl(),
        underline: s.text_decoration == style::TextDecoration::Underline,
        list_marker,
    };

    match &pbox.content {
        BoxContent::Text { lines } => {
            lb.text = Some(text_content(place_lines(pbox, lines, fonts), None));
        }
        BoxContent::Image { src } => {
            lb.image = Some(ImageContent {
                src: src.clone(),
                width: pbox.width,
                height: pbox.height,
            });
        }
        BoxContent::ListItem { marker } => {
            // The marker sits in the gutter; the item's text comes from
            // its children.
            lb.text = Some(text_content(Vec::new(), Some(marker.clone())));
        }
        BoxContent::None => {}
    }

    for child in &pbox.children {
        let child_abs_y = abs_y + (child.y - pbox.y);
        lb.children.push(build_layout_box(child, child_abs_y, fonts));
    }

    lb
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forge::dom::{parse_html, stylesheet_text};
    use crate::forge::layout::compute_layout;
    use crate::forge::style::{build_styled_tree, ComputedStyle, Stylesheet};

    const MARGINS: VerticalMargins = VerticalMargins {
        top: 42.5,
        bottom: 42.5,
    };

    fn paginate_html(html: &str) -> LayoutConfig {
        let dom = parse_html(html);
        let sheet = Stylesheet::parse(&stylesheet_text(&dom));
        let root = sheet.root_style(ComputedStyle::default());
        let styled = build_styled_tree(&dom, Some(&root), &sheet);
        let fonts = FontManager::default();
        let boxes = compute_layout(&styled, 595.0, 42.5, 42.5, &fonts).unwrap();
        paginate(&boxes, 595.0, 842.0, MARGINS, &fonts)
    }

    fn first_text(config: &LayoutConfig) -> &TextContent {
        config.pages[0].boxes[0].text.as_ref().unwrap()
    }

    #[test]
    fn single_page() {
        let config = paginate_html("<p>نص قصير</p>");
        assert_eq!(config.pages.len(), 1);
        assert!((config.pages[0].boxes[0].y - 42.5).abs() < 0.01);
    }

    #[test]
    fn multiple_pages() {
        let html: String = (0..80)
            .map(|i| format!("<p>الفقرة رقم {i} مع بعض النص</p>"))
            .collect();
        let config = paginate_html(&html);
        assert!(config.pages.len() > 1, "got {} pages", config.pages.len());
        for (i, page) in config.pages.iter().enumerate() {
            assert_eq!(page.page_index, i);
        }
    }

    #[test]
    fn explicit_page_break() {
        let config = paginate_html(
            r#"<p style="page-break-after: always">أ</p><p>ب</p>"#,
        );
        assert_eq!(config.pages.len(), 2);
    }

    #[test]
    fn rtl_lines_hug_the_right_edge() {
        let config = paginate_html("<style>body { direction: rtl; text-align: right; }</style><p>كلمة</p>");
        let text = first_text(&config);
        assert!(text.rtl);
        assert_eq!(text.text_align, "right");
        let line = &text.lines[0];
        let content_width = 595.0 - 85.0;
        assert!((line.x_offset + line.width - content_width).abs() < 0.5);
    }

    #[test]
    fn rtl_indent_is_taken_from_the_right() {
        let config = paginate_html(
            "<style>body { direction: rtl; } p { text-align: justify; text-indent: 20px; }</style><p>كلمة</p>",
        );
        let line = &first_text(&config).lines[0];
        let content_width = 595.0 - 85.0;
        assert!((line.x_offset + line.width + 20.0 - content_width).abs() < 0.5);
    }

    #[test]
    fn centered_title() {
        let config = paginate_html(r#"<div style="text-align: center">عنوان</div>"#);
        let line = &first_text(&config).lines[0];
        let content_width = 595.0 - 85.0;
        assert!((line.x_offset * 2.0 + line.width - content_width).abs() < 0.5);
    }
}

//! Layout engine – uses Taffy to compute block / flex layout from a styled
//! DOM tree, then converts the result into a tree of positioned boxes.
//!
//! Blocks whose children are all inline (text, spans, `<b>`, `<br>`) become a
//! single wrapped text leaf. Text leaves that are not plain left-aligned LTR
//! span the full available width so pagination can align each line inside it.

use std::collections::HashMap;

use taffy::prelude::*;

use super::dom::Tag;
use super::fonts::{wrap_text, FontManager, FontQuery};
use super::style::{self, ComputedStyle, FontStyle as CssFontStyle, FontWeight, StyledNode, TextAlign};

// ---------------------------------------------------------------------------
// Intermediate layout tree (pre-pagination)
// ---------------------------------------------------------------------------

/// A positioned box in document coordinates (before page splitting).
#[derive(Debug, Clone)]
pub struct PositionedBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub style: ComputedStyle,
    pub content: BoxContent,
    pub children: Vec<PositionedBox>,
    pub page_break_before: bool,
    pub page_break_after: bool,
    pub page_break_inside_avoid: bool,
}

#[derive(Debug, Clone)]
pub enum BoxContent {
    None,
    Text { lines: Vec<String> },
    Image { src: String },
    /// List item marker
    ListItem { marker: String },
}

/// Font request for a computed style.
pub fn font_query(style: &ComputedStyle) -> FontQuery<'_> {
    FontQuery {
        family: &style.font_family,
        size: style.font_size,
        bold: style.font_weight == FontWeight::Bold,
        italic: style.font_style == CssFontStyle::Italic,
    }
}

// ---------------------------------------------------------------------------
// Build Taffy tree from styled nodes
// ---------------------------------------------------------------------------

struct LayoutBuilder<'a> {
    taffy: TaffyTree<()>,
    fonts: &'a FontManager,
    node_styles: HashMap<NodeId, ComputedStyle>,
    node_content: HashMap<NodeId, BoxContent>,
    available_width: f32,
}

type LayoutResult<T> = Result<T, String>;

fn taffy_err(e: taffy::TaffyError) -> String {
    format!("layout failed: {e}")
}

impl<'a> LayoutBuilder<'a> {
    fn new(fonts: &'a FontManager, available_width: f32) -> Self {
        Self {
            taffy: TaffyTree::new(),
            fonts,
            node_styles: HashMap::new(),
            node_content: HashMap::new(),
            available_width,
        }
    }

    /// Flatten an inline subtree to text. `<br>` becomes a newline; source
    /// newlines are plain whitespace.
    fn collect_inline_text(node: &StyledNode, out: &mut String) {
        match node {
            StyledNode::Text { text, .. } => {
                out.extend(text.chars().map(|c| if c == '\n' { ' ' } else { c }));
            }
            StyledNode::Element { tag: Tag::Br, .. } => out.push('\n'),
            StyledNode::Element { children, .. } => {
                for child in children {
                    Self::collect_inline_text(child, out);
                }
            }
        }
    }

    /// Collapse whitespace inside each line and trim blank edges.
    fn normalize_inline_text(raw: &str) -> String {
        let lines: Vec<String> = raw
            .split('\n')
            .map(|l| l.split_whitespace().collect::<Vec<_>>().join(" "))
            .collect();
        let start = lines.iter().position(|l| !l.is_empty()).unwrap_or(lines.len());
        let end = lines.iter().rposition(|l| !l.is_empty()).map_or(start, |i| i + 1);
        lines[start..end].join("\n")
    }

    /// True when every child is text or a display:inline element.
    fn all_inline(children: &[StyledNode]) -> bool {
        children.iter().all(|c| match c {
            StyledNode::Text { .. } => true,
            StyledNode::Element {
                style,
                children: gc,
                tag,
                ..
            } => {
                *tag != Tag::Img
                    && matches!(style.display, style::Display::Inline | style::Display::InlineBlock)
                    && Self::all_inline(gc)
            }
        })
    }

    fn build_node(&mut self, styled: &StyledNode, parent_width: f32) -> LayoutResult<NodeId> {
        match styled {
            StyledNode::Text { text, style } => {
                let text = Self::normalize_inline_text(&text.replace('\n', " "));
                self.build_text_node(&text, style, parent_width)
            }
            StyledNode::Element {
                tag,
                style,
                children,
                attrs,
            } => self.build_element_node(tag, style, children, attrs, parent_width),
        }
    }

    /// A text leaf that carries its enclosing block's margins, padding,
    /// border and background.
    fn build_paragraph(
        &mut self,
        text: &str,
        block_style: &ComputedStyle,
        parent_width: f32,
    ) -> LayoutResult<NodeId> {
        let s = block_style;
        let outer = match s.width {
            style::Dimension::Px(w) => w,
            style::Dimension::Percent(p) => parent_width * p / 100.0,
            style::Dimension::Auto => parent_width - s.margin_left - s.margin_right,
        };
        let chrome_w = s.padding_left + s.padding_right + 2.0 * s.border_width;
        let chrome_h = s.padding_top + s.padding_bottom + 2.0 * s.border_width;
        let inner = (outer - chrome_w).max(1.0);

        let node = self.build_text_node(text, block_style, inner)?;
        let current = self.taffy.style(node).map_err(taffy_err)?.clone();
        let width = match current.size.width {
            taffy::Dimension::Length(w) => w + chrome_w,
            _ => outer,
        };
        let height = match current.size.height {
            taffy::Dimension::Length(h) => h + chrome_h,
            _ => chrome_h,
        };
        let updated = Style {
            size: Size {
                width: taffy::Dimension::Length(width),
                height: taffy::Dimension::Length(height),
            },
            margin: Rect {
                top: LengthPercentageAuto::Length(s.margin_top),
                right: LengthPercentageAuto::Length(s.margin_right),
                bottom: LengthPercentageAuto::Length(s.margin_bottom),
                left: LengthPercentageAuto::Length(s.margin_left),
            },
            padding: Rect {
                top: LengthPercentage::Length(s.padding_top),
                right: LengthPercentage::Length(s.padding_right),
                bottom: LengthPercentage::Length(s.padding_bottom),
                left: LengthPercentage::Length(s.padding_left),
            },
            border: uniform_border(s.border_width),
            flex_shrink: 0.0,
            ..current
        };
        self.taffy.set_style(node, updated).map_err(taffy_err)?;
        Ok(node)
    }

    fn build_text_node(
        &mut self,
        text: &str,
        style: &ComputedStyle,
        parent_width: f32,
    ) -> LayoutResult<NodeId> {
        let q = font_query(style);
        let line_height_px = self.fonts.line_height_px(style.font_size, style.line_height);

        let max_w = if parent_width > 0.0 {
            parent_width
        } else {
            self.available_width
        };
        let lines = wrap_text(text, &q, max_w, style.text_indent, self.fonts);

        let full_width = style.is_rtl() || style.physical_align() != TextAlign::Left;
        let text_width = if full_width {
            max_w
        } else {
            lines
                .iter()
                .enumerate()
                .map(|(i, l)| {
                    let indent = if i == 0 { style.text_indent } else { 0.0 };
                    self.fonts.measure_text_width(l, &q) + indent
                })
                .fold(0.0f32, f32::max)
        };
        let text_height = lines.len() as f32 * line_height_px;

        let taffy_style = Style {
            size: Size {
                width: taffy::Dimension::Length(text_width),
                height: taffy::Dimension::Length(text_height),
            },
            flex_shrink: 0.0,
            ..Default::default()
        };

        let node = self.taffy.new_leaf(taffy_style).map_err(taffy_err)?;
        self.node_styles.insert(node, style.clone());
        self.node_content.insert(node, BoxContent::Text { lines });
        Ok(node)
    }

    fn build_element_node(
        &mut self,
        tag: &Tag,
        style: &ComputedStyle,
        children: &[StyledNode],
        attrs: &HashMap<String, String>,
        parent_width: f32,
    ) -> LayoutResult<NodeId> {
        // Blocks holding only inline content become one wrapped text leaf.
        let is_text_block = matches!(
            tag,
            Tag::P | Tag::H1 | Tag::H2 | Tag::H3 | Tag::Div | Tag::Unknown(_)
        );
        if is_text_block && !children.is_empty() && Self::all_inline(children) {
            let mut raw = String::new();
            for child in children {
                Self::collect_inline_text(child, &mut raw);
            }
            let combined = Self::normalize_inline_text(&raw);
            if !combined.is_empty() {
                return self.build_paragraph(&combined, style, parent_width);
            }
        }

        let my_width = match style.width {
            style::Dimension::Px(w) => w,
            style::Dimension::Percent(p) => parent_width * p / 100.0,
            style::Dimension::Auto => parent_width - style.margin_left - style.margin_right,
        };
        let inner_width =
            my_width - style.padding_left - style.padding_right - 2.0 * style.border_width;

        // Flex rows and table rows split the width between their children
        // so text wraps to the column width at build time.
        let is_flex_row = style.display == style::Display::Flex
            && style.flex_direction == style::FlexDirection::Row;
        let is_table_row = *tag == Tag::Tr;

        let elem_child_count = children
            .iter()
            .filter(|c| matches!(c, StyledNode::Element { .. }))
            .count()
            .max(1);

        let child_build_width = if is_flex_row || is_table_row {
            let gap_total = style.gap * (elem_child_count.saturating_sub(1)) as f32;
            ((inner_width - gap_total) / elem_child_count as f32).max(1.0)
        } else {
            inner_width
        };

        let mut child_nodes = Vec::new();
        let mut list_counter = 0u32;

        for child in children {
            let li_marker = match child {
                StyledNode::Element { tag: Tag::Li, .. } => {
                    list_counter += 1;
                    Some(if *tag == Tag::Ol {
                        format!("{list_counter}.")
                    } else {
                        "\u{2022}".to_string()
                    })
                }
                _ => None,
            };

            let child_id = self.build_node(child, child_build_width)?;

            if let Some(marker) = li_marker {
                self.node_content
                    .entry(child_id)
                    .or_insert(BoxContent::ListItem { marker });
            }

            child_nodes.push(child_id);
        }

        let style_override = if *tag == Tag::Img
            && (matches!(style.width, style::Dimension::Auto)
                || matches!(style.height, style::Dimension::Auto))
        {
            let src = attrs.get("src").map(|s| s.as_str()).unwrap_or("");
            resolve_img_auto_dimensions(src, style, parent_width)
        } else {
            None
        };

        let effective_style = style_override.as_ref().unwrap_or(style);
        let taffy_style = computed_to_taffy(effective_style, tag);
        let node = self
            .taffy
            .new_with_children(taffy_style, &child_nodes)
            .map_err(taffy_err)?;
        self.node_styles.insert(node, effective_style.clone());

        if *tag == Tag::Img {
            let src = attrs.get("src").cloned().unwrap_or_default();
            self.node_content.insert(node, BoxContent::Image { src });
        }

        Ok(node)
    }

    /// Extract positioned boxes after layout computation.
    fn extract(&self, node: NodeId, offset_x: f32, offset_y: f32) -> LayoutResult<PositionedBox> {
        let layout = self.taffy.layout(node).map_err(taffy_err)?;
        let style = self.node_styles.get(&node).cloned().unwrap_or_default();
        let content = self
            .node_content
            .get(&node)
            .cloned()
            .unwrap_or(BoxContent::None);

        let x = offset_x + layout.location.x;
        let y = offset_y + layout.location.y;

        let children = self
            .taffy
            .children(node)
            .map_err(taffy_err)?
            .iter()
            .map(|&child| self.extract(child, x, y))
            .collect::<LayoutResult<Vec<_>>>()?;

        Ok(PositionedBox {
            x,
            y,
            width: layout.size.width,
            height: layout.size.height,
            page_break_before: style.page_break_before,
            page_break_after: style.page_break_after,
            page_break_inside_avoid: style.page_break_inside_avoid,
            style,
            content,
            children,
        })
    }
}

fn uniform_border(width: f32) -> Rect<LengthPercentage> {
    Rect {
        top: LengthPercentage::Length(width),
        right: LengthPercentage::Length(width),
        bottom: LengthPercentage::Length(width),
        left: LengthPercentage::Length(width),
    }
}

fn spacing(s: &ComputedStyle) -> (Rect<LengthPercentageAuto>, Rect<LengthPercentage>) {
    (
        Rect {
            top: LengthPercentageAuto::Length(s.margin_top),
            right: LengthPercentageAuto::Length(s.margin_right),
            bottom: LengthPercentageAuto::Length(s.margin_bottom),
            left: LengthPercentageAuto::Length(s.margin_left),
        },
        Rect {
            top: LengthPercentage::Length(s.padding_top),
            right: LengthPercentage::Length(s.padding_right),
            bottom: LengthPercentage::Length(s.padding_bottom),
            left: LengthPercentage::Length(s.padding_left),
        },
    )
}

fn computed_to_taffy(s: &ComputedStyle, tag: &Tag) -> Style {
    let mut ts = Style::default();
    let (margin, padding) = spacing(s);

    // Tables are stacked flex boxes; RTL rows lay their cells out from the
    // right.
    match tag {
        Tag::Table => {
            ts.display = taffy::Display::Flex;
            ts.flex_direction = taffy::FlexDirection::Column;
            ts.size.width = dim_to_taffy(s.width);
            ts.size.height = dim_to_taffy(s.height);
            ts.min_size.width = taffy::Dimension::Length(0.0);
            ts.padding = padding;
            ts.margin = margin;
            ts.flex_shrink = 0.0;
            return ts;
        }
        Tag::Tr => {
            ts.display = taffy::Display::Flex;
            ts.flex_direction = if s.is_rtl() {
                taffy::FlexDirection::RowReverse
            } else {
                taffy::FlexDirection::Row
            };
            ts.align_items = Some(taffy::AlignItems::Stretch);
            ts.size.width = taffy::Dimension::Percent(1.0);
            ts.min_size.width = taffy::Dimension::Length(0.0);
            ts.margin = margin;
            ts.flex_shrink = 0.0;
            return ts;
        }
        Tag::Td | Tag::Th => {
            ts.display = taffy::Display::Flex;
            ts.flex_direction = taffy::FlexDirection::Column;
            ts.flex_grow = 1.0;
            ts.flex_shrink = 1.0;
            ts.flex_basis = taffy::Dimension::Length(0.0);
            ts.min_size.width = taffy::Dimension::Length(0.0);
            ts.padding = padding;
            ts.border = uniform_border(s.border_width);
            return ts;
        }
        _ => {}
    }

    match s.display {
        style::Display::Flex => {
            ts.display = taffy::Display::Flex;
            ts.flex_direction = match (s.flex_direction, s.is_rtl()) {
                (style::FlexDirection::Row, false) => taffy::FlexDirection::Row,
                (style::FlexDirection::Row, true) => taffy::FlexDirection::RowReverse,
                (style::FlexDirection::Column, _) => taffy::FlexDirection::Column,
            };
            ts.flex_wrap = match s.flex_wrap {
                style::FlexWrap::NoWrap => taffy::FlexWrap::NoWrap,
                style::FlexWrap::Wrap => taffy::FlexWrap::Wrap,
            };
            ts.justify_content = Some(match s.justify_content {
                style::JustifyContent::Start => taffy::JustifyContent::Start,
                style::JustifyContent::End => taffy::JustifyContent::End,
                style::JustifyContent::Center => taffy::JustifyContent::Center,
                style::JustifyContent::SpaceBetween => taffy::JustifyContent::SpaceBetween,
                style::JustifyContent::SpaceAround => taffy::JustifyContent::SpaceAround,
                style::JustifyContent::SpaceEvenly => taffy::JustifyContent::SpaceEvenly,
            });
            ts.align_items = Some(match s.align_items {
                style::AlignItems::Start => taffy::AlignItems::Start,
                style::AlignItems::End => taffy::AlignItems::End,
                style::AlignItems::Center => taffy::AlignItems::Center,
                style::AlignItems::Stretch => taffy::AlignItems::Stretch,
            });
        }
        style::Display::Grid => {
            ts.display = taffy::Display::Flex;
            ts.flex_direction = taffy::FlexDirection::Column;
        }
        style::Display::Block
        | style::Display::ListItem
        | style::Display::TableRow
        | style::Display::TableCell
        | style::Display::InlineBlock => {
            ts.display = taffy::Display::Flex;
            ts.flex_direction = taffy::FlexDirection::Column;
        }
        style::Display::Inline => {
            ts.display = taffy::Display::Flex;
            ts.flex_direction = taffy::FlexDirection::Row;
            ts.flex_wrap = taffy::FlexWrap::Wrap;
        }
        style::Display::None => {
            ts.display = taffy::Display::None;
        }
    }

    ts.size = Size {
        width: dim_to_taffy(s.width),
        height: dim_to_taffy(s.height),
    };
    ts.min_size = Size {
        width: taffy::Dimension::Length(0.0),
        height: taffy::Dimension::Auto,
    };
    ts.max_size = Size {
        width: dim_to_taffy(s.max_width),
        height: taffy::Dimension::Auto,
    };
    ts.flex_grow = s.flex_grow;
    ts.flex_shrink = if s.display == style::Display::Flex { s.flex_shrink } else { 0.0 };
    ts.margin = margin;
    if *tag == Tag::Img && s.is_rtl() {
        // Push images to the right edge of their column.
        ts.margin.left = LengthPercentageAuto::Auto;
    }
    ts.padding = padding;
    ts.border = uniform_border(s.border_width);
    ts.gap = Size {
        width: LengthPercentage::Length(s.gap),
        height: LengthPercentage::Length(s.gap),
    };

    ts
}

fn dim_to_taffy(d: style::Dimension) -> taffy::Dimension {
    match d {
        style::Dimension::Auto => taffy::Dimension::Auto,
        style::Dimension::Px(v) => taffy::Dimension::Length(v),
        style::Dimension::Percent(v) => taffy::Dimension::Percent(v / 100.0),
    }
}

// ---------------------------------------------------------------------------
// Image intrinsic-size helper
// ---------------------------------------------------------------------------

/// Replace `Auto` width/height of an `<img>` with sizes derived from the
/// intrinsic dimensions of a base64 data URI. `None` when nothing can be
/// decoded or both sizes are already set.
fn resolve_img_auto_dimensions(
    src: &str,
    style: &ComputedStyle,
    parent_width: f32,
) -> Option<ComputedStyle> {
    use base64::{engine::general_purpose::STANDARD as BASE64_STD, Engine as _};

    let (header, data) = src.strip_prefix("data:")?.split_once(',')?;
    if !header.contains(";base64") {
        return None;
    }
    let bytes = BASE64_STD.decode(data.trim()).ok()?;
    let img = ::image::load_from_memory(&bytes).ok()?;
    let (px_w, px_h) = (img.width() as f32, img.height() as f32);
    if px_w == 0.0 || px_h == 0.0 {
        return None;
    }
    let aspect = px_w / px_h;

    let known_w = match style.width {
        style::Dimension::Px(v) => Some(v),
        style::Dimension::Percent(p) => Some(parent_width * p / 100.0),
        style::Dimension::Auto => None,
    };
    let known_h = match style.height {
        style::Dimension::Px(v) => Some(v),
        _ => None,
    };

    let mut s = style.clone();
    match (known_w, known_h) {
        (Some(w), None) => s.height = style::Dimension::Px((w / aspect).max(1.0)),
        (None, Some(h)) => s.width = style::Dimension::Px((h * aspect).max(1.0)),
        (None, None) => {
            s.width = style::Dimension::Px(px_w.min(parent_width));
            s.height = style::Dimension::Px(px_w.min(parent_width) / aspect);
        }
        (Some(_), Some(_)) => return None,
    }
    Some(s)
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Lay out a styled tree inside the printable width of a page and return
/// the top-level boxes in document coordinates. `x` values already include
/// the left margin.
pub fn compute_layout(
    styled_nodes: &[StyledNode],
    page_width: f32,
    margin_left: f32,
    margin_right: f32,
    fonts: &FontManager,
) -> Result<Vec<PositionedBox>, String> {
    let content_width = (page_width - margin_left - margin_right).max(1.0);
    let mut builder = LayoutBuilder::new(fonts, content_width);

    let child_ids = styled_nodes
        .iter()
        .map(|node| builder.build_node(node, content_width))
        .collect::<LayoutResult<Vec<_>>>()?;

    let root_style = Style {
        display: taffy::Display::Flex,
        flex_direction: taffy::FlexDirection::Column,
        size: Size {
            width: taffy::Dimension::Length(content_width),
            height: taffy::Dimension::Auto,
        },
        ..Default::default()
    };

    let root = builder
        .taffy
        .new_with_children(root_style, &child_ids)
        .map_err(taffy_err)?;

    builder
        .taffy
        .compute_layout(
            root,
            Size {
                width: AvailableSpace::Definite(content_width),
                height: AvailableSpace::MaxContent,
            },
        )
        .map_err(taffy_err)?;

    Ok(builder.extract(root, margin_left, 0.0)?.children)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forge::dom::parse_html;
    use crate::forge::style::{build_styled_tree, Stylesheet};

    fn layout(html: &str) -> Vec<PositionedBox> {
        let dom = parse_html(html);
        let sheet = Stylesheet::parse(&crate::forge::dom::stylesheet_text(&dom));
        let root = sheet.root_style(ComputedStyle::default());
        let styled = build_styled_tree(&dom, Some(&root), &sheet);
        let fonts = FontManager::default();
        compute_layout(&styled, 595.0, 40.0, 40.0, &fonts).unwrap()
    }

    fn lines(b: &PositionedBox) -> &[String] {
        match &b.content {
            BoxContent::Text { lines } => lines,
            other => panic!("expected text, got {other:?}"),
        }
    }

    #[test]
    fn layout_simple_paragraph() {
        let boxes = layout("<p>Hello world</p>");
        assert_eq!(boxes.len(), 1);
        assert!(boxes[0].width > 0.0);
        assert!(boxes[0].height > 0.0);
        assert_eq!(boxes[0].x, 40.0);
    }

    #[test]
    fn br_breaks_lines_in_div() {
        let boxes = layout("<div class=\"arabic-paragraph\">سطر أول<br />\nسطر ثان</div>");
        assert_eq!(lines(&boxes[0]), ["سطر أول", "سطر ثان"]);
    }

    #[test]
    fn rtl_text_spans_content_width() {
        let boxes = layout("<style>body { direction: rtl; }</style><div>نص قصير</div>");
        assert_eq!(boxes.len(), 1);
        assert!((boxes[0].width - 515.0).abs() < 0.5);
    }

    #[test]
    fn margins_are_kept_on_paragraph_leaves() {
        let boxes = layout(
            "<style>.t { margin-bottom: 20px; }</style><div class=\"t\">أ</div><div>ب</div>",
        );
        let gap = boxes[1].y - (boxes[0].y + boxes[0].height);
        assert!((gap - 20.0).abs() < 0.5, "gap was {gap}");
    }

    #[test]
    fn layout_flex_row() {
        let boxes = layout(
            r#"<div style="display: flex"><div style="flex-grow: 1">A</div><div style="flex-grow: 1">B</div></div>"#,
        );
        assert_eq!(boxes.len(), 1);
        assert_eq!(boxes[0].children.len(), 2);
    }

    #[test]
    fn list_items_get_markers() {
        let boxes = layout("<ol><li><p>أ</p></li><li><p>ب</p></li></ol>");
        let markers: Vec<&str> = boxes[0]
            .children
            .iter()
            .filter_map(|c| match &c.content {
                BoxContent::ListItem { marker } => Some(marker.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(markers, ["1.", "2."]);
    }
}

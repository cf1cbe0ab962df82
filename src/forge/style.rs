//! Style resolver – applies `<style>` rules and inline `style` attributes to
//! produce a flat [`ComputedStyle`] per element.
//!
//! The stylesheet support covers what prepared Arabic documents use: type
//! selectors, class selectors, `body`/`html` rules and comma-separated
//! selector lists. At-rules (`@font-face`, `@page`, `@media`) are skipped;
//! fonts reach the engine through the font registry instead.

use std::collections::HashMap;

use super::dom::{DomNode, ElementNode, Tag};

/// Fully resolved style for a single element.
#[derive(Debug, Clone)]
pub struct ComputedStyle {
    // Display / layout
    pub display: Display,
    pub flex_direction: FlexDirection,
    pub flex_wrap: FlexWrap,
    pub flex_grow: f32,
    pub flex_shrink: f32,
    pub justify_content: JustifyContent,
    pub align_items: AlignItems,
    pub gap: f32,

    // Sizing
    pub width: Dimension,
    pub height: Dimension,
    pub max_width: Dimension,

    // Spacing (px)
    pub margin_top: f32,
    pub margin_right: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
    pub padding_top: f32,
    pub padding_right: f32,
    pub padding_bottom: f32,
    pub padding_left: f32,

    // Border
    pub border_width: f32,
    pub border_color: Color,

    // Typography
    pub font_size: f32,
    pub font_weight: FontWeight,
    pub font_family: String,
    pub font_style: FontStyle,
    pub color: Color,
    pub direction: Direction,
    pub text_align: TextAlign,
    pub text_indent: f32,
    pub line_height: f32,
    pub text_decoration: TextDecoration,

    // Background
    pub background_color: Color,

    // Page break
    pub page_break_before: bool,
    pub page_break_after: bool,
    pub page_break_inside_avoid: bool,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            display: Display::Block,
            flex_direction: FlexDirection::Row,
            flex_wrap: FlexWrap::NoWrap,
            flex_grow: 0.0,
            flex_shrink: 1.0,
            justify_content: JustifyContent::Start,
            align_items: AlignItems::Stretch,
            gap: 0.0,
            width: Dimension::Auto,
            height: Dimension::Auto,
            max_width: Dimension::Auto,
            margin_top: 0.0,
            margin_right: 0.0,
            margin_bottom: 0.0,
            margin_left: 0.0,
            padding_top: 0.0,
            padding_right: 0.0,
            padding_bottom: 0.0,
            padding_left: 0.0,
            border_width: 0.0,
            border_color: Color::BLACK,
            font_size: 12.0,
            font_weight: FontWeight::Normal,
            font_family: "Helvetica".to_string(),
            font_style: FontStyle::Normal,
            color: Color::BLACK,
            direction: Direction::Ltr,
            text_align: TextAlign::Start,
            text_indent: 0.0,
            line_height: 1.4,
            text_decoration: TextDecoration::None,
            background_color: Color::TRANSPARENT,
            page_break_before: false,
            page_break_after: false,
            page_break_inside_avoid: false,
        }
    }
}

impl ComputedStyle {
    pub fn is_rtl(&self) -> bool {
        self.direction == Direction::Rtl
    }

    /// Physical alignment once `start` and `justify` are resolved against the
    /// writing direction. Justified lines are set flush to the start edge.
    pub fn physical_align(&self) -> TextAlign {
        match (self.text_align, self.direction) {
            (TextAlign::Start | TextAlign::Justify, Direction::Rtl) => TextAlign::Right,
            (TextAlign::Start | TextAlign::Justify, Direction::Ltr) => TextAlign::Left,
            (other, _) => other,
        }
    }
}

// ---------------------------------------------------------------------------
// Supporting enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Display {
    Block,
    Flex,
    Grid,
    Inline,
    InlineBlock,
    ListItem,
    TableRow,
    TableCell,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlexDirection {
    Row,
    Column,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlexWrap {
    NoWrap,
    Wrap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JustifyContent {
    Start,
    End,
    Center,
    SpaceBetween,
    SpaceAround,
    SpaceEvenly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignItems {
    Start,
    End,
    Center,
    Stretch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
    Normal,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ltr,
    Rtl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    /// Follows the writing direction.
    Start,
    Left,
    Center,
    Right,
    Justify,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextDecoration {
    None,
    Underline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontStyle {
    Normal,
    Italic,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Dimension {
    Auto,
    Px(f32),
    Percent(f32),
}

/// RGBA colour (0.0 – 1.0).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);
    pub const TRANSPARENT: Self = Self {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 0.0,
    };

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn is_transparent(&self) -> bool {
        self.a < 0.001
    }

    /// Parse `#rgb`, `#rrggbb` or one of a few named colours.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        match value.to_ascii_lowercase().as_str() {
            "black" => return Some(Self::BLACK),
            "white" => return Some(Self::WHITE),
            "transparent" => return Some(Self::TRANSPARENT),
            "gray" | "grey" => return Some(Self::rgb(0.5, 0.5, 0.5)),
            "red" => return Some(Self::rgb(1.0, 0.0, 0.0)),
            "green" => return Some(Self::rgb(0.0, 0.5, 0.0)),
            "blue" => return Some(Self::rgb(0.0, 0.0, 1.0)),
            _ => {}
        }
        let hex = value.strip_prefix('#')?;
        let channel = |s: &str| u8::from_str_radix(s, 16).ok().map(|v| v as f32 / 255.0);
        match hex.len() {
            6 => Some(Self::rgb(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            )),
            3 => Some(Self::rgb(
                channel(&hex[0..1].repeat(2))?,
                channel(&hex[1..2].repeat(2))?,
                channel(&hex[2..3].repeat(2))?,
            )),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Stylesheet
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
enum Selector {
    /// `body` or `html`: applied to the root style.
    Root,
    Tag(String),
    Class(String),
}

#[derive(Debug, Clone)]
struct StyleRule {
    selector: Selector,
    declarations: String,
}

/// Rules collected from the document's `<style>` blocks, in source order.
#[derive(Debug, Clone, Default)]
pub struct Stylesheet {
    rules: Vec<StyleRule>,
}

impl Stylesheet {
    /// Parse CSS text. Unsupported selectors and at-rules are dropped.
    pub fn parse(css: &str) -> Self {
        let css = strip_comments(css);
        let mut rules = Vec::new();
        let mut rest = css.as_str();

        while let Some(open) = rest.find('{') {
            let prelude = rest[..open].trim();
            let Some(len) = block_len(&rest[open..]) else {
                break;
            };
            let body = &rest[open + 1..open + len - 1];
            rest = &rest[open + len..];

            if prelude.starts_with('@') {
                continue;
            }
            for sel in prelude.split(',').filter_map(parse_selector) {
                rules.push(StyleRule {
                    selector: sel,
                    declarations: body.to_string(),
                });
            }
        }

        Self { rules }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Apply `body`/`html` rules on top of `base`.
    pub fn root_style(&self, mut base: ComputedStyle) -> ComputedStyle {
        for rule in self.rules.iter().filter(|r| r.selector == Selector::Root) {
            apply_declarations(&mut base, &rule.declarations);
        }
        base
    }

    /// Apply every rule that matches `element`, in source order.
    fn apply(&self, style: &mut ComputedStyle, element: &ElementNode) {
        let classes = element.classes();
        for rule in &self.rules {
            let hit = match &rule.selector {
                Selector::Root => false,
                Selector::Tag(t) => t == element.tag.name(),
                Selector::Class(c) => classes.contains(&c.as_str()),
            };
            if hit {
                apply_declarations(style, &rule.declarations);
            }
        }
    }
}

fn strip_comments(css: &str) -> String {
    let mut out = String::with_capacity(css.len());
    let mut rest = css;
    while let Some(start) = rest.find("/*") {
        out.push_str(&rest[..start]);
        match rest[start + 2..].find("*/") {
            Some(end) => rest = &rest[start + 2 + end + 2..],
            None => return out,
        }
    }
    out.push_str(rest);
    out
}

/// Length of the `{ ... }` block at the start of `s`, braces included.
fn block_len(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }
    None
}

fn parse_selector(raw: &str) -> Option<Selector> {
    let sel = raw.trim();
    let simple = |s: &str| {
        !s.is_empty()
            && s
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    };
    if let Some(class) = sel.strip_prefix('.') {
        return simple(class).then(|| Selector::Class(class.to_string()));
    }
    let lower = sel.to_ascii_lowercase();
    match lower.as_str() {
        "body" | "html" => Some(Selector::Root),
        t if simple(t) => Some(Selector::Tag(t.to_string())),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Style resolution
// ---------------------------------------------------------------------------

/// Resolve the style for an element: tag defaults, inherited text
/// properties, stylesheet rules, then the inline `style` attribute.
pub fn resolve_style(
    element: &ElementNode,
    parent: Option<&ComputedStyle>,
    sheet: &Stylesheet,
) -> ComputedStyle {
    let mut style = base_style_for_tag(&element.tag);

    if let Some(p) = parent {
        style.font_size = p.font_size;
        style.font_family = p.font_family.clone();
        style.color = p.color;
        style.direction = p.direction;
        style.text_align = p.text_align;
        style.text_indent = p.text_indent;
        style.line_height = p.line_height;
        style.font_style = p.font_style;
        if style.font_weight == FontWeight::Normal {
            style.font_weight = p.font_weight;
        }
    }
    if let Tag::H1 | Tag::H2 | Tag::H3 = element.tag {
        let (size, _) = heading_metrics(&element.tag);
        style.font_size = size;
    }

    match element.dir().as_deref() {
        Some("rtl") => style.direction = Direction::Rtl,
        Some("ltr") => style.direction = Direction::Ltr,
        _ => {}
    }

    sheet.apply(&mut style, element);

    if let Some(inline) = element.inline_style() {
        apply_declarations(&mut style, inline);
    }

    style
}

fn heading_metrics(tag: &Tag) -> (f32, f32) {
    match tag {
        Tag::H1 => (24.0, 12.0),
        Tag::H2 => (18.0, 10.0),
        _ => (15.0, 8.0),
    }
}

/// Default styles based on tag semantics.
fn base_style_for_tag(tag: &Tag) -> ComputedStyle {
    let mut s = ComputedStyle::default();
    match tag {
        Tag::H1 | Tag::H2 | Tag::H3 => {
            let (size, spacing) = heading_metrics(tag);
            s.font_size = size;
            s.font_weight = FontWeight::Bold;
            s.margin_top = spacing;
            s.margin_bottom = spacing;
        }
        Tag::P => {
            s.margin_bottom = 10.0;
        }
        Tag::Ul | Tag::Ol => {
            s.margin_bottom = 10.0;
            s.padding_left = 24.0;
        }
        Tag::Li => {
            s.display = Display::ListItem;
            s.margin_bottom = 4.0;
        }
        Tag::Table => {
            s.display = Display::Grid;
            s.border_width = 1.0;
            s.margin_bottom = 10.0;
        }
        Tag::Tr => {
            s.display = Display::TableRow;
        }
        Tag::Td | Tag::Th => {
            s.display = Display::TableCell;
            s.padding_top = 4.0;
            s.padding_right = 8.0;
            s.padding_bottom = 4.0;
            s.padding_left = 8.0;
            s.border_width = 1.0;
            if *tag == Tag::Th {
                s.font_weight = FontWeight::Bold;
                s.background_color = Color::rgb(0.93, 0.93, 0.93);
            }
        }
        Tag::Span | Tag::Br => {
            s.display = Display::Inline;
        }
        Tag::B | Tag::Strong => {
            s.display = Display::Inline;
            s.font_weight = FontWeight::Bold;
        }
        Tag::Img => {
            s.display = Display::InlineBlock;
        }
        Tag::Style | Tag::Head => {
            s.display = Display::None;
        }
        Tag::Div | Tag::Body | Tag::Html | Tag::Unknown(_) => {}
    }
    s
}

// ---------------------------------------------------------------------------
// Declaration parsing
// ---------------------------------------------------------------------------

fn apply_declarations(s: &mut ComputedStyle, block: &str) {
    for decl in block.split(';') {
        let Some((prop, val)) = decl.split_once(':') else {
            continue;
        };
        let val = val.trim().trim_end_matches("!important").trim();
        apply_css_property(s, &prop.trim().to_ascii_lowercase(), val);
    }
}

fn apply_css_property(s: &mut ComputedStyle, prop: &str, val: &str) {
    match prop {
        "display" => {
            s.display = match val {
                "flex" => Display::Flex,
                "grid" => Display::Grid,
                "block" => Display::Block,
                "inline" => Display::Inline,
                "inline-block" => Display::InlineBlock,
                "none" => Display::None,
                _ => s.display,
            }
        }
        "flex-direction" => {
            s.flex_direction = match val {
                "row" => FlexDirection::Row,
                "column" => FlexDirection::Column,
                _ => s.flex_direction,
            }
        }
        "flex-wrap" => {
            s.flex_wrap = if val == "wrap" {
                FlexWrap::Wrap
            } else {
                FlexWrap::NoWrap
            }
        }
        "flex-grow" => {
            if let Ok(v) = val.parse() {
                s.flex_grow = v;
            }
        }
        "justify-content" => {
            s.justify_content = match val {
                "flex-end" | "end" => JustifyContent::End,
                "center" => JustifyContent::Center,
                "space-between" => JustifyContent::SpaceBetween,
                "space-around" => JustifyContent::SpaceAround,
                "space-evenly" => JustifyContent::SpaceEvenly,
                _ => JustifyContent::Start,
            }
        }
        "align-items" => {
            s.align_items = match val {
                "flex-start" | "start" => AlignItems::Start,
                "flex-end" | "end" => AlignItems::End,
                "center" => AlignItems::Center,
                _ => AlignItems::Stretch,
            }
        }
        "font-size" => {
            if let Some(px) = parse_length(val, s.font_size) {
                s.font_size = px;
            }
        }
        "font-weight" => {
            s.font_weight = match val {
                "bold" | "bolder" | "600" | "700" | "800" | "900" => FontWeight::Bold,
                _ => FontWeight::Normal,
            }
        }
        "font-style" => {
            s.font_style = match val {
                "italic" | "oblique" => FontStyle::Italic,
                _ => FontStyle::Normal,
            }
        }
        "font-family" => {
            if let Some(first) = val.split(',').next() {
                let family = first.trim().trim_matches(|c| c == '"' || c == '\'');
                if !family.is_empty() {
                    s.font_family = family.to_string();
                }
            }
        }
        "color" => {
            if let Some(c) = Color::parse(val) {
                s.color = c;
            }
        }
        "background-color" | "background" => {
            if let Some(c) = Color::parse(val) {
                s.background_color = c;
            }
        }
        "direction" => {
            s.direction = match val {
                "rtl" => Direction::Rtl,
                _ => Direction::Ltr,
            }
        }
        "text-align" => {
            s.text_align = match val {
                "center" => TextAlign::Center,
                "right" => TextAlign::Right,
                "left" => TextAlign::Left,
                "justify" => TextAlign::Justify,
                _ => TextAlign::Start,
            }
        }
        "text-indent" => {
            if let Some(px) = parse_length(val, s.font_size) {
                s.text_indent = px;
            }
        }
        "text-decoration" => {
            s.text_decoration = if val.contains("underline") {
                TextDecoration::Underline
            } else {
                TextDecoration::None
            }
        }
        "line-height" => {
            if let Ok(v) = val.parse::<f32>() {
                s.line_height = v;
            } else if let Some(px) = parse_length(val, s.font_size) {
                if s.font_size > 0.0 {
                    s.line_height = px / s.font_size;
                }
            }
        }
        "width" => s.width = parse_dimension(val, s.font_size),
        "height" => s.height = parse_dimension(val, s.font_size),
        "max-width" => s.max_width = parse_dimension(val, s.font_size),
        "margin" => {
            if let Some([t, r, b, l]) = parse_box_shorthand(val, s.font_size) {
                s.margin_top = t;
                s.margin_right = r;
                s.margin_bottom = b;
                s.margin_left = l;
            }
        }
        "margin-top" => set_length(&mut s.margin_top, val, s.font_size),
        "margin-right" => set_length(&mut s.margin_right, val, s.font_size),
        "margin-bottom" => set_length(&mut s.margin_bottom, val, s.font_size),
        "margin-left" => set_length(&mut s.margin_left, val, s.font_size),
        "padding" => {
            if let Some([t, r, b, l]) = parse_box_shorthand(val, s.font_size) {
                s.padding_top = t;
                s.padding_right = r;
                s.padding_bottom = b;
                s.padding_left = l;
            }
        }
        "padding-top" => set_length(&mut s.padding_top, val, s.font_size),
        "padding-right" => set_length(&mut s.padding_right, val, s.font_size),
        "padding-bottom" => set_length(&mut s.padding_bottom, val, s.font_size),
        "padding-left" => set_length(&mut s.padding_left, val, s.font_size),
        "border" => {
            for part in val.split_whitespace() {
                if let Some(px) = parse_length(part, s.font_size) {
                    s.border_width = px;
                } else if let Some(c) = Color::parse(part) {
                    s.border_color = c;
                } else if part == "none" {
                    s.border_width = 0.0;
                }
            }
        }
        "border-width" => set_length(&mut s.border_width, val, s.font_size),
        "border-color" => {
            if let Some(c) = Color::parse(val) {
                s.border_color = c;
            }
        }
        "gap" => set_length(&mut s.gap, val, s.font_size),
        "break-before" | "page-break-before" => {
            s.page_break_before = val == "always" || val == "page";
        }
        "break-after" | "page-break-after" => {
            s.page_break_after = val == "always" || val == "page";
        }
        "break-inside" | "page-break-inside" => {
            s.page_break_inside_avoid = val == "avoid";
        }
        _ => {}
    }
}

fn set_length(slot: &mut f32, val: &str, font_size: f32) {
    if let Some(px) = parse_length(val, font_size) {
        *slot = px;
    }
}

/// Parse `12px`, `12pt`, `1.5em`, `0` or a bare number as pixels.
fn parse_length(s: &str, font_size: f32) -> Option<f32> {
    let s = s.trim();
    if let Some(v) = s.strip_suffix("px") {
        v.trim().parse().ok()
    } else if let Some(v) = s.strip_suffix("pt") {
        v.trim().parse::<f32>().ok().map(|pt| pt * 4.0 / 3.0)
    } else if let Some(v) = s.strip_suffix("rem") {
        v.trim().parse::<f32>().ok().map(|em| em * 16.0)
    } else if let Some(v) = s.strip_suffix("em") {
        v.trim().parse::<f32>().ok().map(|em| em * font_size)
    } else {
        s.parse().ok()
    }
}

fn parse_dimension(s: &str, font_size: f32) -> Dimension {
    let s = s.trim();
    if s == "auto" {
        Dimension::Auto
    } else if let Some(p) = s.strip_suffix('%') {
        p.parse::<f32>()
            .map(Dimension::Percent)
            .unwrap_or(Dimension::Auto)
    } else {
        parse_length(s, font_size)
            .map(Dimension::Px)
            .unwrap_or(Dimension::Auto)
    }
}

/// Expand a one to four value box shorthand to `[top, right, bottom, left]`.
fn parse_box_shorthand(val: &str, font_size: f32) -> Option<[f32; 4]> {
    let parts: Vec<f32> = val
        .split_whitespace()
        .map(|p| if p == "auto" { Some(0.0) } else { parse_length(p, font_size) })
        .collect::<Option<_>>()?;
    match parts[..] {
        [a] => Some([a, a, a, a]),
        [v, h] => Some([v, h, v, h]),
        [t, h, b] => Some([t, h, b, h]),
        [t, r, b, l] => Some([t, r, b, l]),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Styled DOM tree
// ---------------------------------------------------------------------------

/// A DOM node annotated with its computed style.
#[derive(Debug, Clone)]
pub enum StyledNode {
    Element {
        tag: Tag,
        style: ComputedStyle,
        children: Vec<StyledNode>,
        /// Original attributes (for images src, etc.)
        attrs: HashMap<String, String>,
    },
    Text {
        text: String,
        style: ComputedStyle,
    },
}

/// Build a styled tree from a DOM tree, resolving styles top-down.
/// `<style>` and `<head>` elements are dropped.
pub fn build_styled_tree(
    nodes: &[DomNode],
    parent_style: Option<&ComputedStyle>,
    sheet: &Stylesheet,
) -> Vec<StyledNode> {
    let mut result = Vec::new();
    for node in nodes {
        match node {
            DomNode::Element(e) => {
                if e.tag.is_hidden() {
                    continue;
                }
                let style = resolve_style(e, parent_style, sheet);
                let children = build_styled_tree(&e.children, Some(&style), sheet);
                result.push(StyledNode::Element {
                    tag: e.tag.clone(),
                    style,
                    children,
                    attrs: e.attributes.clone(),
                });
            }
            DomNode::Text(text) => {
                if text.trim().is_empty() {
                    continue;
                }
                let mut style = parent_style.cloned().unwrap_or_default();
                // Text renders inside its parent's box; drop box-model properties.
                style.display = Display::Inline;
                style.border_width = 0.0;
                style.background_color = Color::TRANSPARENT;
                style.margin_top = 0.0;
                style.margin_right = 0.0;
                style.margin_bottom = 0.0;
                style.margin_left = 0.0;
                style.padding_top = 0.0;
                style.padding_right = 0.0;
                style.padding_bottom = 0.0;
                style.padding_left = 0.0;
                style.width = Dimension::Auto;
                style.height = Dimension::Auto;
                style.max_width = Dimension::Auto;
                style.page_break_before = false;
                style.page_break_after = false;
                result.push(StyledNode::Text {
                    text: text.clone(),
                    style,
                });
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forge::dom::parse_html;

    const SHEET: &str = r#"
        @font-face { font-family: "Amiri"; src: url("/f/Amiri-Regular.ttf") format("truetype"); }
        body { font-family: "Amiri", "Cairo", Arial, sans-serif; direction: rtl; text-align: right; line-height: 1.6; }
        /* headings */
        .arabic-title { text-align: center; font-size: 18px; font-weight: bold; margin-bottom: 20px; }
        .arabic-paragraph, .note { text-align: justify; text-indent: 20px; margin-bottom: 10px; }
        .quran-text { font-family: "AmiriQuran", "Amiri", Arial, sans-serif; margin: 20px 0; line-height: 2; }
        div > p { color: red; }
    "#;

    fn first_element(html: &str, sheet: &Stylesheet) -> ComputedStyle {
        let root = sheet.root_style(ComputedStyle::default());
        let nodes = parse_html(html);
        match &build_styled_tree(&nodes, Some(&root), sheet)[0] {
            StyledNode::Element { style, .. } => style.clone(),
            StyledNode::Text { .. } => panic!("expected element"),
        }
    }

    #[test]
    fn stylesheet_keeps_supported_rules_only() {
        let sheet = Stylesheet::parse(SHEET);
        // body, .arabic-title, .arabic-paragraph, .note, .quran-text
        assert_eq!(sheet.rules.len(), 5);
    }

    #[test]
    fn body_rules_build_root_style() {
        let root = Stylesheet::parse(SHEET).root_style(ComputedStyle::default());
        assert_eq!(root.font_family, "Amiri");
        assert!(root.is_rtl());
        assert_eq!(root.text_align, TextAlign::Right);
        assert!((root.line_height - 1.6).abs() < 1e-6);
    }

    #[test]
    fn class_rules_apply_and_inherit_direction() {
        let sheet = Stylesheet::parse(SHEET);
        let title = first_element(r#"<div class="arabic-title">عنوان</div>"#, &sheet);
        assert_eq!(title.text_align, TextAlign::Center);
        assert_eq!(title.font_weight, FontWeight::Bold);
        assert_eq!(title.font_size, 18.0);
        assert_eq!(title.margin_bottom, 20.0);
        assert!(title.is_rtl());

        let para = first_element(r#"<div class="arabic-paragraph">نص</div>"#, &sheet);
        assert_eq!(para.text_indent, 20.0);
        assert_eq!(para.physical_align(), TextAlign::Right);

        let quran = first_element(r#"<div class="quran-text">آية</div>"#, &sheet);
        assert_eq!(quran.font_family, "AmiriQuran");
        assert_eq!((quran.margin_top, quran.margin_left), (20.0, 0.0));
        assert_eq!(quran.line_height, 2.0);
    }

    #[test]
    fn inline_style_beats_stylesheet() {
        let sheet = Stylesheet::parse(SHEET);
        let s = first_element(
            r#"<div class="arabic-title" style="text-align: left; color: #ff0000">x</div>"#,
            &sheet,
        );
        assert_eq!(s.text_align, TextAlign::Left);
        assert!((s.color.r - 1.0).abs() < 0.01);
    }

    #[test]
    fn dir_attribute_sets_direction() {
        let s = first_element(r#"<p dir="ltr">English</p>"#, &Stylesheet::parse(SHEET));
        assert_eq!(s.direction, Direction::Ltr);
        assert_eq!(s.physical_align(), TextAlign::Right);
    }

    #[test]
    fn style_elements_are_not_rendered() {
        let nodes = parse_html("<style>.x{}</style><p>نص</p>");
        let styled = build_styled_tree(&nodes, None, &Stylesheet::default());
        assert_eq!(styled.len(), 1);
    }

    #[test]
    fn color_parsing() {
        let c = Color::parse("#ff8800").unwrap();
        assert!((c.g - 0.533).abs() < 0.01);
        assert_eq!(Color::parse("white"), Some(Color::WHITE));
        assert_eq!(Color::parse("#12"), None);
    }

    #[test]
    fn lengths_convert_to_px() {
        assert_eq!(parse_length("12pt", 16.0), Some(16.0));
        assert_eq!(parse_length("2em", 10.0), Some(20.0));
        assert_eq!(parse_box_shorthand("20px 0", 16.0), Some([20.0, 0.0, 20.0, 0.0]));
    }
}

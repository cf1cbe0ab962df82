//! PDF renderer – takes a [`LayoutConfig`] and produces PDF bytes using
//! `printpdf` (v0.8 ops-based API).
//!
//! TrueType fonts loaded in the [`FontManager`] are embedded and text is
//! written as shaped glyph runs, so Arabic letters join correctly. Text whose
//! family has no embedded face falls back to builtin Helvetica.

use std::collections::{HashMap, HashSet};

use base64::{engine::general_purpose::STANDARD as BASE64_STD, Engine as _};
use printpdf::*;

use super::bidi;
use super::fonts::{FontKey, FontManager, FontQuery};
use super::layout_config::*;

/// A printpdf XObject together with the pixel dimensions of the source image.
struct ImageResource {
    xobj_id: XObjectId,
    px_width: u32,
    px_height: u32,
}

/// Resources shared by every page.
struct Resources<'a> {
    fonts: &'a FontManager,
    font_ids: HashMap<FontKey, FontId>,
    images: HashMap<String, ImageResource>,
    page_height: f32,
}

/// Render a LayoutConfig into PDF bytes.
///
/// `<img>` elements whose `src` is not a base64 data URI, or whose bytes
/// cannot be decoded, are skipped with a `log::warn`.
pub fn render_pdf(config: &LayoutConfig, fonts: &FontManager) -> Result<Vec<u8>, String> {
    let page_w = Mm(config.page_width_pt * 0.352778); // pt → mm
    let page_h = Mm(config.page_height_pt * 0.352778);

    let mut doc = PdfDocument::new(&config.title);
    let mut warnings: Vec<PdfWarnMsg> = Vec::new();

    // ── Embed fonts ───────────────────────────────────────────────────────
    let mut font_ids = HashMap::new();
    for key in fonts.keys() {
        let Some(bytes) = fonts.font_bytes(&key) else {
            continue;
        };
        match ParsedFont::from_bytes(bytes, 0, &mut warnings) {
            Some(parsed) => {
                font_ids.insert(key, doc.add_font(&parsed));
            }
            None => log::warn!("Cannot embed font {} – falling back to Helvetica", key.family),
        }
    }

    // ── Pre-register images ───────────────────────────────────────────────
    let mut all_srcs: HashSet<&str> = HashSet::new();
    for page_layout in &config.pages {
        for lbox in &page_layout.boxes {
            collect_image_srcs(lbox, &mut all_srcs);
        }
    }

    let mut images = HashMap::new();
    for src in all_srcs {
        let bytes = match parse_data_uri(src) {
            Ok(b) => b,
            Err(e) => {
                log::warn!("Skipping image – {e}");
                continue;
            }
        };
        let dyn_img = match ::image::load_from_memory(&bytes) {
            Ok(img) => img,
            Err(e) => {
                log::warn!("Skipping image – decode error: {e}");
                continue;
            }
        };
        let raw = match RawImage::decode_from_bytes(&bytes, &mut warnings) {
            Ok(r) => r,
            Err(e) => {
                log::warn!("Skipping image – PDF encode error: {e}");
                continue;
            }
        };
        images.insert(
            src.to_string(),
            ImageResource {
                xobj_id: doc.add_image(&raw),
                px_width: dyn_img.width(),
                px_height: dyn_img.height(),
            },
        );
    }

    let res = Resources {
        fonts,
        font_ids,
        images,
        page_height: config.page_height_pt,
    };

    // ── Render pages ──────────────────────────────────────────────────────
    let mut pages: Vec<PdfPage> = config
        .pages
        .iter()
        .map(|page_layout| {
            let mut ops = Vec::new();
            for lbox in &page_layout.boxes {
                render_box(&mut ops, lbox, &res);
            }
            PdfPage::new(page_w, page_h, ops)
        })
        .collect();

    if pages.is_empty() {
        pages.push(PdfPage::new(page_w, page_h, Vec::new()));
    }

    doc.with_pages(pages);
    let bytes = doc.save(&PdfSaveOptions::default(), &mut warnings);
    for w in &warnings {
        log::debug!("printpdf: {w:?}");
    }

    Ok(bytes)
}

/// Convert a UTF-8 string to raw Windows-1252 bytes then wrap in a String so
/// printpdf writes the bytes unchanged into the PDF stream (builtin fonts use
/// WinAnsiEncoding, so each glyph is one byte 0x00–0xFF).
fn to_winlatin(s: &str) -> String {
    let bytes: Vec<u8> = s
        .chars()
        .map(|c| match c {
            '\u{20AC}' => 0x80, // euro
            '\u{2026}' => 0x85, // ellipsis
            '\u{2018}' => 0x91, // left single quote
            '\u{2019}' => 0x92, // right single quote
            '\u{201C}' => 0x93, // left double quote
            '\u{201D}' => 0x94, // right double quote
            '\u{2022}' => 0x95, // bullet
            '\u{2013}' => 0x96, // en dash
            '\u{00A0}' => 0x20, // non-breaking space
            c if (c as u32) < 256 => c as u8,
            _ => b'?',
        })
        .collect();
    // SAFETY: intentionally non-UTF-8 for 0x80-0x9F range; printpdf passes
    // these bytes straight to the PDF stream, decoded by WinAnsiEncoding.
    #[allow(unsafe_code)]
    unsafe {
        String::from_utf8_unchecked(bytes)
    }
}

/// Decode a `data:<mime>;base64,<data>` URI.
fn parse_data_uri(src: &str) -> Result<Vec<u8>, String> {
    let Some(rest) = src.strip_prefix("data:") else {
        let preview: String = src.chars().take(80).collect();
        return Err(format!(
            "image src must be a base64 data URI (data:image/png;base64,...), got {preview:?}"
        ));
    };
    let (header, data) = rest
        .split_once(',')
        .ok_or_else(|| "invalid data URI: missing `,` after the header".to_string())?;
    if !header.contains(";base64") {
        return Err("only base64-encoded data URIs are supported".to_string());
    }
    BASE64_STD
        .decode(data.trim())
        .map_err(|e| format!("base64 decode error: {e}"))
}

fn collect_image_srcs<'a>(lbox: &'a LayoutBox, srcs: &mut HashSet<&'a str>) {
    if let Some(img) = &lbox.image {
        srcs.insert(img.src.as_str());
    }
    for child in &lbox.children {
        collect_image_srcs(child, srcs);
    }
}

fn rgb(c: [f32; 4]) -> Color {
    Color::Rgb(Rgb {
        r: c[0],
        g: c[1],
        b: c[2],
        icc_profile: None,
    })
}

fn point(x: f32, y: f32) -> LinePoint {
    LinePoint {
        p: Point { x: Pt(x), y: Pt(y) },
        bezier: false,
    }
}

/// Corners of a box in PDF space, starting top-left and going clockwise.
fn rect_points(x: f32, top: f32, w: f32, h: f32) -> Vec<LinePoint> {
    vec![
        point(x, top),
        point(x + w, top),
        point(x + w, top - h),
        point(x, top - h),
    ]
}

/// Draw one line of text at a baseline position.
fn write_line(ops: &mut Vec<Op>, text: &TextContent, line: &str, x: f32, baseline: f32, res: &Resources<'_>) {
    let q = FontQuery {
        family: &text.font_family,
        size: text.font_size,
        bold: text.bold,
        italic: text.italic,
    };
    let key = res.fonts.resolve(q.family, q.bold, q.italic);

    ops.push(Op::StartTextSection);
    ops.push(Op::SetTextCursor {
        pos: Point {
            x: Pt(x),
            y: Pt(baseline),
        },
    });
    ops.push(Op::SetFillColor { col: rgb(text.color) });

    match res.font_ids.get(&key) {
        Some(font) => {
            let mut cp = Vec::new();
            for run in bidi::visual_runs(line, text.rtl) {
                if let Some(glyphs) = res.fonts.shape_run(&run.text, run.rtl, &q) {
                    cp.extend(glyphs);
                }
            }
            ops.push(Op::SetFontSize {
                size: Pt(text.font_size),
                font: font.clone(),
            });
            ops.push(Op::WriteCodepoints {
                font: font.clone(),
                cp,
            });
        }
        None => {
            let builtin = match (text.bold, text.italic) {
                (true, true) => BuiltinFont::HelveticaBoldOblique,
                (true, false) => BuiltinFont::HelveticaBold,
                (false, true) => BuiltinFont::HelveticaOblique,
                (false, false) => BuiltinFont::Helvetica,
            };
            ops.push(Op::SetFontSizeBuiltinFont {
                size: Pt(text.font_size),
                font: builtin,
            });
            ops.push(Op::WriteTextBuiltinFont {
                items: vec![TextItem::Text(to_winlatin(&bidi::visual_order(line, text.rtl)))],
                font: builtin,
            });
        }
    }

    ops.push(Op::EndTextSection);
}

/// Recursively render a LayoutBox and its children into PDF ops.
fn render_box(ops: &mut Vec<Op>, lbox: &LayoutBox, res: &Resources<'_>) {
    // PDF origin is bottom-left; layout origin is top-left.
    let pdf_y = res.page_height - lbox.y;

    if let Some(bg) = lbox.background_color {
        ops.push(Op::SetFillColor { col: rgb(bg) });
        ops.push(Op::DrawPolygon {
            polygon: Polygon {
                rings: vec![PolygonRing {
                    points: rect_points(lbox.x, pdf_y, lbox.width, lbox.height),
                }],
                mode: PaintMode::Fill,
                winding_order: WindingOrder::NonZero,
            },
        });
    }

    if let Some(border) = &lbox.border {
        ops.push(Op::SetOutlineColor { col: rgb(border.color) });
        ops.push(Op::SetOutlineThickness {
            pt: Pt(border.width),
        });
        ops.push(Op::DrawLine {
            line: Line {
                points: rect_points(lbox.x, pdf_y, lbox.width, lbox.height),
                is_closed: true,
            },
        });
    }

    if let Some(text) = &lbox.text {
        let q = FontQuery {
            family: &text.font_family,
            size: text.font_size,
            bold: text.bold,
            italic: text.italic,
        };
        let ascent = res.fonts.ascender_px(&q);
        // Centre the glyphs vertically within the line box.
        let half_leading = ((text.line_height - text.font_size) / 2.0).max(0.0);

        for tline in &text.lines {
            if tline.text.is_empty() {
                continue;
            }
            let text_x = lbox.x + tline.x_offset;
            let baseline = pdf_y - tline.y_offset - half_leading - ascent;
            write_line(ops, text, &tline.text, text_x, baseline, res);

            if text.underline {
                let underline_y = baseline - text.font_size * 0.1;
                ops.push(Op::SetOutlineThickness { pt: Pt(0.5) });
                ops.push(Op::SetOutlineColor { col: rgb(text.color) });
                ops.push(Op::DrawLine {
                    line: Line {
                        points: vec![
                            point(text_x, underline_y),
                            point(text_x + tline.width, underline_y),
                        ],
                        is_closed: false,
                    },
                });
            }
        }

        if let Some(marker) = &text.list_marker {
            // Markers go in the gutter on the start side.
            let marker_x = if text.rtl {
                lbox.x + lbox.width + 6.0
            } else {
                lbox.x - 16.0
            };
            let marker_y = pdf_y - half_leading - text.font_size * 0.75;
            ops.push(Op::StartTextSection);
            ops.push(Op::SetTextCursor {
                pos: Point {
                    x: Pt(marker_x),
                    y: Pt(marker_y),
                },
            });
            ops.push(Op::SetFontSizeBuiltinFont {
                size: Pt(text.font_size),
                font: BuiltinFont::Helvetica,
            });
            ops.push(Op::SetFillColor { col: rgb(text.color) });
            ops.push(Op::WriteTextBuiltinFont {
                items: vec![TextItem::Text(to_winlatin(marker))],
                font: BuiltinFont::Helvetica,
            });
            ops.push(Op::EndTextSection);
        }
    }

    if let Some(img) = &lbox.image {
        if let Some(r) = res.images.get(&img.src) {
            let img_bottom_y = res.page_height - lbox.y - img.height;
            // At dpi=72 printpdf renders 1 px = 1 pt.
            let scale_x = if r.px_width > 0 {
                img.width / r.px_width as f32
            } else {
                1.0
            };
            let scale_y = if r.px_height > 0 {
                img.height / r.px_height as f32
            } else {
                1.0
            };
            ops.push(Op::UseXobject {
                id: r.xobj_id.clone(),
                transform: XObjectTransform {
                    translate_x: Some(Pt(lbox.x)),
                    translate_y: Some(Pt(img_bottom_y)),
                    dpi: Some(72.0),
                    scale_x: Some(scale_x),
                    scale_y: Some(scale_y),
                    rotate: None,
                },
            });
        }
    }

    for child in &lbox.children {
        render_box(ops, child, res);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_box(line: &str, rtl: bool) -> LayoutBox {
        let mut lb = LayoutBox::new(40.0, 40.0, 500.0, 20.0);
        lb.text = Some(TextContent {
            lines: vec![TextLine {
                text: line.to_string(),
                x_offset: 0.0,
                y_offset: 0.0,
                width: 100.0,
            }],
            font_family: "Amiri".into(),
            font_size: 12.0,
            bold: false,
            italic: false,
            color: [0.0, 0.0, 0.0, 1.0],
            line_height: 18.0,
            text_align: "right".into(),
            rtl,
            underline: true,
            list_marker: Some("1.".into()),
        });
        lb
    }

    #[test]
    fn render_empty_page() {
        let config = LayoutConfig::new(595.28, 841.89);
        let bytes = render_pdf(&config, &FontManager::default()).unwrap();
        assert!(bytes.len() > 100);
        assert_eq!(&bytes[0..5], b"%PDF-");
    }

    #[test]
    fn render_text_with_fallback_font() {
        let mut config = LayoutConfig::new(595.28, 841.89);
        config.pages.push(PageLayout {
            page_index: 0,
            boxes: vec![text_box("مرحبا Hello", true), text_box("Hello", false)],
        });
        let bytes = render_pdf(&config, &FontManager::default()).unwrap();
        assert_eq!(&bytes[0..5], b"%PDF-");
    }

    #[test]
    fn data_uri_errors() {
        assert!(parse_data_uri("logo.png").is_err());
        assert!(parse_data_uri("data:image/png,abc").is_err());
        assert_eq!(parse_data_uri("data:text/plain;base64,aGk=").unwrap(), b"hi");
    }

    #[test]
    fn winlatin_maps_unknown_to_question_mark() {
        assert_eq!(to_winlatin("a\u{00A0}ب").as_bytes(), b"a ?");
    }
}

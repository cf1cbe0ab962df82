//! Font loading, shaping and text measurement.
//!
//! Metrics come from `ttf-parser`; widths and glyph runs come from
//! `rustybuzz`, so Arabic joining forms are measured the way they are drawn.
//! When no TrueType font is loaded a Helvetica stand-in with synthetic metrics
//! is used.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use super::bidi;

/// Family name of the built-in stand-in font.
pub const FALLBACK_FAMILY: &str = "Helvetica";

/// A loaded font face with metrics.
#[derive(Clone)]
pub struct FontData {
    /// Raw font bytes; empty for the synthetic fallback.
    pub bytes: Vec<u8>,
    pub units_per_em: f32,
    pub ascender: f32,
    pub descender: f32,
    pub line_gap: f32,
}

static SYNTHETIC: FontData = FontData {
    bytes: Vec::new(),
    units_per_em: 1000.0,
    ascender: 750.0,
    descender: -250.0,
    line_gap: 0.0,
};

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct FontKey {
    pub family: String,
    pub bold: bool,
    pub italic: bool,
}

impl FontKey {
    pub fn new(family: &str, bold: bool, italic: bool) -> Self {
        Self {
            family: family.to_string(),
            bold,
            italic,
        }
    }
}

/// What to measure or shape with.
#[derive(Debug, Clone, Copy)]
pub struct FontQuery<'a> {
    pub family: &'a str,
    pub size: f32,
    pub bold: bool,
    pub italic: bool,
}

/// A shaped glyph: glyph id plus the source character it came from.
pub type ShapedGlyph = (u16, char);

/// Manages loaded fonts.
pub struct FontManager {
    fonts: HashMap<FontKey, FontData>,
    default_key: FontKey,
}

impl FontManager {
    pub fn new() -> Self {
        Self {
            fonts: HashMap::new(),
            default_key: FontKey::new(FALLBACK_FAMILY, false, false),
        }
    }

    /// Load a TTF/OTF font from bytes.
    pub fn load_font(
        &mut self,
        family: &str,
        bold: bool,
        italic: bool,
        bytes: Vec<u8>,
    ) -> Result<(), String> {
        let face = ttf_parser::Face::parse(&bytes, 0)
            .map_err(|e| format!("failed to parse font for {family}: {e}"))?;

        let data = FontData {
            units_per_em: face.units_per_em() as f32,
            ascender: face.ascender() as f32,
            descender: face.descender() as f32,
            line_gap: face.line_gap() as f32,
            bytes,
        };

        let key = FontKey::new(family, bold, italic);
        if self.fonts.is_empty() {
            self.default_key = key.clone();
        }
        self.fonts.insert(key, data);
        Ok(())
    }

    /// Read and load a font file.
    pub fn load_file(&mut self, family: &str, bold: bool, italic: bool, path: &Path) -> Result<(), String> {
        let bytes = fs::read(path).map_err(|e| format!("cannot read {}: {e}", path.display()))?;
        self.load_font(family, bold, italic, bytes)
    }

    /// Register the synthetic Helvetica stand-in when nothing is loaded.
    pub fn ensure_default(&mut self) {
        if self.fonts.is_empty() {
            for bold in [false, true] {
                self.fonts
                    .insert(FontKey::new(FALLBACK_FAMILY, bold, false), SYNTHETIC.clone());
            }
            self.default_key = FontKey::new(FALLBACK_FAMILY, false, false);
        }
    }

    /// Make `family` the default. Returns false (and changes nothing) when
    /// the family has no regular face loaded.
    pub fn set_default_family(&mut self, family: &str) -> bool {
        let key = FontKey::new(family, false, false);
        if self.fonts.contains_key(&key) {
            self.default_key = key;
            true
        } else {
            false
        }
    }

    pub fn default_family(&self) -> &str {
        &self.default_key.family
    }

    /// The key that will actually be used for a request: the exact face,
    /// then the family without italic, then the family's regular face, then
    /// the default.
    pub fn resolve(&self, family: &str, bold: bool, italic: bool) -> FontKey {
        let candidates = [
            FontKey::new(family, bold, italic),
            FontKey::new(family, bold, false),
            FontKey::new(family, false, false),
        ];
        candidates
            .into_iter()
            .find(|k| self.fonts.contains_key(k))
            .unwrap_or_else(|| self.default_key.clone())
    }

    /// Font data for a key, falling back to the default and then to
    /// synthetic metrics.
    pub fn get(&self, key: &FontKey) -> &FontData {
        self.fonts
            .get(key)
            .or_else(|| self.fonts.get(&self.default_key))
            .unwrap_or(&SYNTHETIC)
    }

    fn data_for(&self, q: &FontQuery<'_>) -> &FontData {
        self.get(&self.resolve(q.family, q.bold, q.italic))
    }

    /// Shape one directional run. Glyphs come back in visual order.
    /// Returns `None` for the synthetic font.
    pub fn shape_run(&self, text: &str, rtl: bool, q: &FontQuery<'_>) -> Option<Vec<ShapedGlyph>> {
        let data = self.data_for(q);
        let face = rustybuzz::Face::from_slice(&data.bytes, 0)?;
        let glyphs = shape(&face, text, rtl);
        Some(
            glyphs
                .glyph_infos()
                .iter()
                .map(|info| {
                    let ch = text
                        .get(info.cluster as usize..)
                        .and_then(|s| s.chars().next())
                        .unwrap_or(' ');
                    (info.glyph_id as u16, ch)
                })
                .collect(),
        )
    }

    /// Measure the advance width of `text` in px.
    ///
    /// Real fonts are shaped with `rustybuzz`; the synthetic fallback uses
    /// an average character width (0.5 × font size, 0.55 for bold).
    pub fn measure_text_width(&self, text: &str, q: &FontQuery<'_>) -> f32 {
        let data = self.data_for(q);
        let heuristic = || {
            let avg = if q.bold { 0.55 } else { 0.5 };
            text.chars().count() as f32 * q.size * avg
        };
        if data.bytes.is_empty() {
            return heuristic();
        }
        let Some(face) = rustybuzz::Face::from_slice(&data.bytes, 0) else {
            return heuristic();
        };
        let scale = q.size / data.units_per_em;
        let units: i32 = bidi::visual_runs(text, false)
            .iter()
            .map(|run| {
                shape(&face, &run.text, run.rtl)
                    .glyph_positions()
                    .iter()
                    .map(|p| p.x_advance)
                    .sum::<i32>()
            })
            .sum();
        units as f32 * scale
    }

    /// Line height in px.
    pub fn line_height_px(&self, font_size: f32, line_height_factor: f32) -> f32 {
        font_size * line_height_factor
    }

    /// Ascender in px for the given font.
    pub fn ascender_px(&self, q: &FontQuery<'_>) -> f32 {
        let data = self.data_for(q);
        data.ascender * q.size / data.units_per_em
    }

    /// Whether the default font is a real TrueType face.
    pub fn has_real_fonts(&self) -> bool {
        self.fonts
            .get(&self.default_key)
            .is_some_and(|d| !d.bytes.is_empty())
    }

    /// All loaded font keys.
    pub fn keys(&self) -> Vec<FontKey> {
        self.fonts.keys().cloned().collect()
    }

    /// Font bytes for embedding; `None` for the synthetic font.
    pub fn font_bytes(&self, key: &FontKey) -> Option<&[u8]> {
        self.fonts
            .get(key)
            .filter(|d| !d.bytes.is_empty())
            .map(|d| d.bytes.as_slice())
    }
}

impl Default for FontManager {
    fn default() -> Self {
        let mut mgr = Self::new();
        mgr.ensure_default();
        mgr
    }
}

fn shape(face: &rustybuzz::Face<'_>, text: &str, rtl: bool) -> rustybuzz::GlyphBuffer {
    let mut buffer = rustybuzz::UnicodeBuffer::new();
    buffer.push_str(text);
    buffer.guess_segment_properties();
    buffer.set_direction(if rtl {
        rustybuzz::Direction::RightToLeft
    } else {
        rustybuzz::Direction::LeftToRight
    });
    rustybuzz::shape(face, &[], buffer)
}

/// Word-wrap text to fit within `max_width` px. The first line is
/// shortened by `first_indent`. Explicit newlines always break.
pub fn wrap_text(
    text: &str,
    q: &FontQuery<'_>,
    max_width: f32,
    first_indent: f32,
    fonts: &FontManager,
) -> Vec<String> {
    if max_width <= 0.0 || text.is_empty() {
        return vec![text.to_string()];
    }

    let mut lines: Vec<String> = Vec::new();
    for paragraph in text.split('\n') {
        let words: Vec<&str> = paragraph.split_whitespace().collect();
        if words.is_empty() {
            lines.push(String::new());
            continue;
        }

        let mut current = String::new();
        for word in &words {
            let limit = if lines.is_empty() {
                max_width - first_indent
            } else {
                max_width
            };
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };
            if !current.is_empty() && fonts.measure_text_width(&candidate, q) > limit {
                lines.push(std::mem::replace(&mut current, word.to_string()));
            } else {
                current = candidate;
            }
        }
        lines.push(current);
    }

    lines
}

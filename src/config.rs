//! Service configuration.
//!
//! A [`Config`] is built once per service by merging [`ConfigOverrides`] onto
//! the built-in defaults. Overrides can come from code, a JSON file, or the
//! `ARABIC_PDF_*` environment variables.

use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::engine::EngineId;
use crate::error::{Error, Result};
use crate::fonts::DEFAULT_FONT;

/// Default page margin on every side, in millimetres.
pub const DEFAULT_MARGIN_MM: f32 = 15.0;

// ---------------------------------------------------------------------------
// Page geometry
// ---------------------------------------------------------------------------

/// Paper size token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PageFormat {
    A3,
    #[default]
    A4,
    A5,
    Letter,
    Legal,
}

impl PageFormat {
    /// Portrait width and height in millimetres.
    pub fn size_mm(self) -> (f32, f32) {
        match self {
            PageFormat::A3 => (297.0, 420.0),
            PageFormat::A4 => (210.0, 297.0),
            PageFormat::A5 => (148.0, 210.0),
            PageFormat::Letter => (215.9, 279.4),
            PageFormat::Legal => (215.9, 355.6),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PageFormat::A3 => "A3",
            PageFormat::A4 => "A4",
            PageFormat::A5 => "A5",
            PageFormat::Letter => "Letter",
            PageFormat::Legal => "Legal",
        }
    }
}

impl FromStr for PageFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a3" => Ok(PageFormat::A3),
            "a4" => Ok(PageFormat::A4),
            "a5" => Ok(PageFormat::A5),
            "letter" => Ok(PageFormat::Letter),
            "legal" => Ok(PageFormat::Legal),
            _ => Err(Error::InvalidPageFormat(s.to_string())),
        }
    }
}

impl TryFrom<String> for PageFormat {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<PageFormat> for String {
    fn from(f: PageFormat) -> Self {
        f.as_str().to_string()
    }
}

impl fmt::Display for PageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Page orientation. Accepts the single-letter `P`/`L` tokens as well as the
/// full words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

impl Orientation {
    pub fn as_str(self) -> &'static str {
        match self {
            Orientation::Portrait => "portrait",
            Orientation::Landscape => "landscape",
        }
    }
}

impl FromStr for Orientation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "p" | "portrait" => Ok(Orientation::Portrait),
            "l" | "landscape" => Ok(Orientation::Landscape),
            _ => Err(Error::InvalidOrientation(s.to_string())),
        }
    }
}

impl TryFrom<String> for Orientation {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Orientation> for String {
    fn from(o: Orientation) -> Self {
        o.as_str().to_string()
    }
}

/// Page margins in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margins {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            top: DEFAULT_MARGIN_MM,
            right: DEFAULT_MARGIN_MM,
            bottom: DEFAULT_MARGIN_MM,
            left: DEFAULT_MARGIN_MM,
        }
    }
}

/// Everything an engine needs to know about the physical page.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PageSetup {
    pub format: PageFormat,
    pub orientation: Orientation,
    pub margins: Margins,
}

impl PageSetup {
    /// Width and height in millimetres after applying the orientation.
    pub fn size_mm(&self) -> (f32, f32) {
        let (w, h) = self.format.size_mm();
        match self.orientation {
            Orientation::Portrait => (w, h),
            Orientation::Landscape => (h, w),
        }
    }
}

/// What `set_default_font` does with a name that is not in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownFontPolicy {
    /// Keep the previous default font and carry on.
    #[default]
    Ignore,
    /// Fail with [`Error::InvalidFontName`].
    Reject,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Fully resolved configuration used by a service instance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Config {
    pub engine: EngineId,
    pub page_format: PageFormat,
    pub orientation: Orientation,
    pub margin_top: f32,
    pub margin_right: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
    /// Directory holding the bundled font files.
    pub font_path: PathBuf,
    /// Scratch directory for engines that work through temporary files.
    pub temp_path: PathBuf,
    /// Symbolic name of the default font.
    pub default_font: String,
    pub unknown_font_policy: UnknownFontPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            engine: EngineId::Forge,
            page_format: PageFormat::A4,
            orientation: Orientation::Portrait,
            margin_top: DEFAULT_MARGIN_MM,
            margin_right: DEFAULT_MARGIN_MM,
            margin_bottom: DEFAULT_MARGIN_MM,
            margin_left: DEFAULT_MARGIN_MM,
            font_path: default_font_path(),
            temp_path: env::temp_dir().join("arabic-pdf"),
            default_font: DEFAULT_FONT.to_string(),
            unknown_font_policy: UnknownFontPolicy::Ignore,
        }
    }
}

impl Config {
    /// Defaults with `overrides` applied on top.
    pub fn with_overrides(overrides: &ConfigOverrides) -> Result<Self> {
        let mut config = Self::default();
        config.apply(overrides)?;
        Ok(config)
    }

    /// Overwrite every field that `overrides` sets. Nothing changes when
    /// `overrides` holds an invalid margin.
    pub fn apply(&mut self, overrides: &ConfigOverrides) -> Result<()> {
        overrides.validate()?;
        if let Some(engine) = overrides.engine {
            self.engine = engine;
        }
        if let Some(format) = overrides.page_format {
            self.page_format = format;
        }
        if let Some(orientation) = overrides.orientation {
            self.orientation = orientation;
        }
        if let Some(v) = overrides.margin_top {
            self.margin_top = v;
        }
        if let Some(v) = overrides.margin_right {
            self.margin_right = v;
        }
        if let Some(v) = overrides.margin_bottom {
            self.margin_bottom = v;
        }
        if let Some(v) = overrides.margin_left {
            self.margin_left = v;
        }
        if let Some(p) = &overrides.font_path {
            self.font_path = p.clone();
        }
        if let Some(p) = &overrides.temp_path {
            self.temp_path = p.clone();
        }
        if let Some(f) = &overrides.default_font {
            self.default_font = f.clone();
        }
        if let Some(policy) = overrides.unknown_font_policy {
            self.unknown_font_policy = policy;
        }
        Ok(())
    }

    pub fn margins(&self) -> Margins {
        Margins {
            top: self.margin_top,
            right: self.margin_right,
            bottom: self.margin_bottom,
            left: self.margin_left,
        }
    }

    pub fn page_setup(&self) -> PageSetup {
        PageSetup {
            format: self.page_format,
            orientation: self.orientation,
            margins: self.margins(),
        }
    }
}

fn default_font_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fonts")
}

// ---------------------------------------------------------------------------
// Overrides
// ---------------------------------------------------------------------------

/// Caller-supplied configuration; every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigOverrides {
    pub engine: Option<EngineId>,
    pub page_format: Option<PageFormat>,
    pub orientation: Option<Orientation>,
    pub margin_top: Option<f32>,
    pub margin_right: Option<f32>,
    pub margin_bottom: Option<f32>,
    pub margin_left: Option<f32>,
    pub font_path: Option<PathBuf>,
    pub temp_path: Option<PathBuf>,
    pub default_font: Option<String>,
    pub unknown_font_policy: Option<UnknownFontPolicy>,
}

impl ConfigOverrides {
    /// Combine two override sets; fields set in `other` win.
    pub fn merge(self, other: ConfigOverrides) -> Self {
        Self {
            engine: other.engine.or(self.engine),
            page_format: other.page_format.or(self.page_format),
            orientation: other.orientation.or(self.orientation),
            margin_top: other.margin_top.or(self.margin_top),
            margin_right: other.margin_right.or(self.margin_right),
            margin_bottom: other.margin_bottom.or(self.margin_bottom),
            margin_left: other.margin_left.or(self.margin_left),
            font_path: other.font_path.or(self.font_path),
            temp_path: other.temp_path.or(self.temp_path),
            default_font: other.default_font.or(self.default_font),
            unknown_font_policy: other.unknown_font_policy.or(self.unknown_font_policy),
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let overrides: Self = serde_json::from_str(json)?;
        overrides.validate()?;
        Ok(overrides)
    }

    /// Margins must be finite and not negative.
    pub fn validate(&self) -> Result<()> {
        let margins = [
            ("margin_top", self.margin_top),
            ("margin_right", self.margin_right),
            ("margin_bottom", self.margin_bottom),
            ("margin_left", self.margin_left),
        ];
        for (key, value) in margins {
            if let Some(v) = value {
                check_margin(key, v)?;
            }
        }
        Ok(())
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Read the `ARABIC_PDF_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env) but reads variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let margin = |key: &str| -> Result<Option<f32>> {
            match get(key) {
                Some(v) => match v.trim().parse::<f32>() {
                    Ok(mm) => check_margin(key, mm).map(Some),
                    Err(_) => Err(Error::InvalidValue {
                        key: key.to_string(),
                        value: v,
                    }),
                },
                None => Ok(None),
            }
        };

        Ok(Self {
            engine: get("ARABIC_PDF_ENGINE").map(|v| v.parse()).transpose()?,
            page_format: get("ARABIC_PDF_PAGE_FORMAT").map(|v| v.parse()).transpose()?,
            orientation: get("ARABIC_PDF_ORIENTATION").map(|v| v.parse()).transpose()?,
            margin_top: margin("ARABIC_PDF_MARGIN_TOP")?,
            margin_right: margin("ARABIC_PDF_MARGIN_RIGHT")?,
            margin_bottom: margin("ARABIC_PDF_MARGIN_BOTTOM")?,
            margin_left: margin("ARABIC_PDF_MARGIN_LEFT")?,
            font_path: get("ARABIC_PDF_FONT_PATH").map(PathBuf::from),
            temp_path: get("ARABIC_PDF_TEMP_PATH").map(PathBuf::from),
            default_font: get("ARABIC_PDF_DEFAULT_FONT"),
            unknown_font_policy: None,
        })
    }
}

fn check_margin(key: &str, mm: f32) -> Result<f32> {
    if mm.is_finite() && mm >= 0.0 {
        Ok(mm)
    } else {
        Err(Error::InvalidValue {
            key: key.to_string(),
            value: mm.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_match_a4_portrait_15mm() {
        let c = Config::default();
        assert_eq!(c.page_format, PageFormat::A4);
        assert_eq!(c.orientation, Orientation::Portrait);
        assert_eq!(c.margins(), Margins::default());
        assert_eq!(c.default_font, "Amiri-Regular");
        assert!(c.font_path.ends_with("fonts"));
    }

    #[test]
    fn overrides_win_over_defaults() {
        let o = ConfigOverrides {
            orientation: Some(Orientation::Landscape),
            margin_left: Some(25.0),
            ..Default::default()
        };
        let c = Config::with_overrides(&o).unwrap();
        assert_eq!(c.orientation, Orientation::Landscape);
        assert_eq!(c.margin_left, 25.0);
        assert_eq!(c.margin_right, DEFAULT_MARGIN_MM);
    }

    #[test]
    fn merge_prefers_later_values() {
        let a = ConfigOverrides {
            page_format: Some(PageFormat::A5),
            margin_top: Some(5.0),
            ..Default::default()
        };
        let b = ConfigOverrides {
            page_format: Some(PageFormat::Letter),
            ..Default::default()
        };
        let m = a.merge(b);
        assert_eq!(m.page_format, Some(PageFormat::Letter));
        assert_eq!(m.margin_top, Some(5.0));
    }

    #[test]
    fn json_accepts_php_style_tokens() {
        let o = ConfigOverrides::from_json(
            r#"{"engine": "wkhtmltopdf", "page_format": "a4", "orientation": "L", "margin_top": 10}"#,
        )
        .unwrap();
        assert_eq!(o.engine, Some(EngineId::Wkhtmltopdf));
        assert_eq!(o.page_format, Some(PageFormat::A4));
        assert_eq!(o.orientation, Some(Orientation::Landscape));
        assert_eq!(o.margin_top, Some(10.0));
    }

    #[test]
    fn json_rejects_unknown_keys() {
        assert!(ConfigOverrides::from_json(r#"{"paper": "A4"}"#).is_err());
    }

    #[test]
    fn env_lookup_parses_values() {
        let vars: HashMap<&str, &str> = [
            ("ARABIC_PDF_ENGINE", "chromium"),
            ("ARABIC_PDF_MARGIN_BOTTOM", "20"),
            ("ARABIC_PDF_PAGE_FORMAT", ""),
        ]
        .into_iter()
        .collect();
        let o = ConfigOverrides::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(o.engine, Some(EngineId::Chromium));
        assert_eq!(o.margin_bottom, Some(20.0));
        assert_eq!(o.page_format, None);
    }

    #[test]
    fn env_lookup_rejects_bad_margin() {
        let err = ConfigOverrides::from_lookup(|k| {
            (k == "ARABIC_PDF_MARGIN_TOP").then(|| "wide".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, Error::InvalidValue { .. }));
    }

    #[test]
    fn env_lookup_rejects_non_finite_and_negative_margins() {
        for value in ["NaN", "inf", "-50"] {
            let err = ConfigOverrides::from_lookup(|k| {
                (k == "ARABIC_PDF_MARGIN_LEFT").then(|| value.to_string())
            })
            .unwrap_err();
            assert!(
                matches!(&err, Error::InvalidValue { key, .. } if key == "ARABIC_PDF_MARGIN_LEFT"),
                "{value}: {err}"
            );
        }
    }

    #[test]
    fn json_rejects_negative_margin() {
        let err = ConfigOverrides::from_json(r#"{"margin_right": -1.5}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidValue { key, .. } if key == "margin_right"));
    }

    #[test]
    fn apply_rejects_invalid_margins_atomically() {
        let mut c = Config::default();
        let err = c
            .apply(&ConfigOverrides {
                orientation: Some(Orientation::Landscape),
                margin_bottom: Some(f32::NAN),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, Error::InvalidValue { key, .. } if key == "margin_bottom"));
        assert_eq!(c, Config::default());

        let negative = ConfigOverrides {
            margin_top: Some(-50.0),
            ..Default::default()
        };
        assert!(Config::with_overrides(&negative).is_err());

        let zero = ConfigOverrides {
            margin_top: Some(0.0),
            ..Default::default()
        };
        assert_eq!(Config::with_overrides(&zero).unwrap().margin_top, 0.0);
    }

    #[test]
    fn landscape_swaps_page_size() {
        let setup = PageSetup {
            orientation: Orientation::Landscape,
            ..Default::default()
        };
        assert_eq!(setup.size_mm(), (297.0, 210.0));
    }
}

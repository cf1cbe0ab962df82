//! Font registry – symbolic Arabic font names mapped to font files.
//!
//! The registry is built once from the configured font directory. Paths are
//! recorded whether or not the file exists; existence is only checked when
//! fonts are handed to an engine ([`FontRegistry::registrations`]).

use std::path::{Path, PathBuf};

/// Symbolic name of the built-in default font.
pub const DEFAULT_FONT: &str = "Amiri-Regular";

/// One entry of the bundled font set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FontSpec {
    pub name: &'static str,
    pub file: &'static str,
    pub family: &'static str,
    pub bold: bool,
    pub italic: bool,
}

const fn spec(
    name: &'static str,
    file: &'static str,
    family: &'static str,
    bold: bool,
    italic: bool,
) -> FontSpec {
    FontSpec {
        name,
        file,
        family,
        bold,
        italic,
    }
}

/// The eight fonts expected in the font directory.
pub const FONT_LIST: [FontSpec; 8] = [
    spec("Amiri-Regular", "Amiri-Regular.ttf", "Amiri", false, false),
    spec("Amiri-Bold", "Amiri-Bold.ttf", "Amiri", true, false),
    spec("Amiri-Italic", "Amiri-Italic.ttf", "Amiri", false, true),
    spec("Amiri-BoldItalic", "Amiri-BoldItalic.ttf", "Amiri", true, true),
    spec("AmiriQuran", "AmiriQuran.ttf", "AmiriQuran", false, false),
    spec("AmiriQuranColored", "AmiriQuranColored.ttf", "AmiriQuranColored", false, false),
    spec("Cairo-Regular", "Cairo-Regular.ttf", "Cairo", false, false),
    spec("Cairo-Bold", "Cairo-Bold.ttf", "Cairo", true, false),
];

/// A font family whose files exist on disk, ready to hand to an engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontRegistration {
    pub family: String,
    pub regular: PathBuf,
    pub bold: Option<PathBuf>,
    pub italic: Option<PathBuf>,
    pub bold_italic: Option<PathBuf>,
}

impl FontRegistration {
    /// Every distinct file in this registration, regular slot first.
    pub fn files(&self) -> Vec<&Path> {
        let mut files = vec![self.regular.as_path()];
        for path in [&self.bold, &self.italic, &self.bold_italic].into_iter().flatten() {
            if !files.contains(&path.as_path()) {
                files.push(path.as_path());
            }
        }
        files
    }
}

/// Mapping from symbolic font name to font file path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontRegistry {
    entries: Vec<(FontSpec, PathBuf)>,
}

impl FontRegistry {
    /// Register every font of [`FONT_LIST`] under `dir`.
    pub fn from_dir(dir: &Path) -> Self {
        let entries = FONT_LIST
            .iter()
            .map(|spec| (*spec, dir.join(spec.file)))
            .collect();
        Self { entries }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(s, _)| s.name == name)
    }

    pub fn path(&self, name: &str) -> Option<&Path> {
        self.entries
            .iter()
            .find(|(s, _)| s.name == name)
            .map(|(_, p)| p.as_path())
    }

    pub fn spec(&self, name: &str) -> Option<&FontSpec> {
        self.entries
            .iter()
            .find(|(s, _)| s.name == name)
            .map(|(s, _)| s)
    }

    /// Symbolic names in registration order.
    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|(s, _)| s.name).collect()
    }

    /// Names whose file currently exists.
    pub fn present(&self) -> Vec<&'static str> {
        self.entries
            .iter()
            .filter(|(_, p)| p.is_file())
            .map(|(s, _)| s.name)
            .collect()
    }

    /// Names whose file is missing.
    pub fn missing(&self) -> Vec<&'static str> {
        self.entries
            .iter()
            .filter(|(_, p)| !p.is_file())
            .map(|(s, _)| s.name)
            .collect()
    }

    /// Group the fonts that exist on disk by family.
    ///
    /// Every existing file is registered. A family without a regular face
    /// uses its first existing variant as the regular one.
    pub fn registrations(&self) -> Vec<FontRegistration> {
        let mut out: Vec<FontRegistration> = Vec::new();

        for (spec, path) in &self.entries {
            if !path.is_file() {
                log::debug!("font {} not found at {}, skipping", spec.name, path.display());
                continue;
            }
            let index = match out.iter().position(|r| r.family == spec.family) {
                Some(i) => i,
                None => {
                    if spec.bold || spec.italic {
                        log::debug!("no regular {} face yet, using {}", spec.family, spec.name);
                    }
                    out.push(FontRegistration {
                        family: spec.family.to_string(),
                        regular: path.clone(),
                        bold: None,
                        italic: None,
                        bold_italic: None,
                    });
                    out.len() - 1
                }
            };
            let reg = &mut out[index];
            match (spec.bold, spec.italic) {
                (false, false) => reg.regular = path.clone(),
                (true, false) => reg.bold = Some(path.clone()),
                (false, true) => reg.italic = Some(path.clone()),
                (true, true) => reg.bold_italic = Some(path.clone()),
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn registry_holds_all_eight_names() {
        let reg = FontRegistry::from_dir(Path::new("/nonexistent"));
        assert_eq!(reg.names().len(), 8);
        assert!(reg.contains("AmiriQuran"));
        assert_eq!(
            reg.path("Cairo-Bold"),
            Some(Path::new("/nonexistent/Cairo-Bold.ttf"))
        );
    }

    #[test]
    fn missing_files_are_not_registered() {
        let reg = FontRegistry::from_dir(Path::new("/nonexistent"));
        assert!(reg.registrations().is_empty());
        assert_eq!(reg.missing().len(), 8);
    }

    #[test]
    fn variants_group_under_their_family() {
        let dir = TempDir::new().unwrap();
        for file in ["Amiri-Regular.ttf", "Amiri-Bold.ttf", "AmiriQuran.ttf"] {
            fs::write(dir.path().join(file), b"stub").unwrap();
        }
        let reg = FontRegistry::from_dir(dir.path());
        let regs = reg.registrations();

        assert_eq!(regs.len(), 2);
        assert_eq!(regs[0].family, "Amiri");
        assert_eq!(regs[0].regular, dir.path().join("Amiri-Regular.ttf"));
        assert_eq!(regs[0].bold, Some(dir.path().join("Amiri-Bold.ttf")));
        assert!(regs[0].italic.is_none());
        assert_eq!(regs[1].family, "AmiriQuran");
    }

    #[test]
    fn every_present_file_is_registered() {
        let dir = TempDir::new().unwrap();
        for file in ["Amiri-Regular.ttf", "Cairo-Bold.ttf", "AmiriQuran.ttf", "Amiri-Italic.ttf"] {
            fs::write(dir.path().join(file), b"stub").unwrap();
        }
        let reg = FontRegistry::from_dir(dir.path());
        let regs = reg.registrations();

        let registered: usize = regs.iter().map(|r| r.files().len()).sum();
        assert_eq!(registered, reg.present().len());

        // Cairo has no regular face, so its bold face stands in for it.
        let cairo = regs.iter().find(|r| r.family == "Cairo").unwrap();
        assert_eq!(cairo.regular, dir.path().join("Cairo-Bold.ttf"));
        assert_eq!(cairo.bold, Some(dir.path().join("Cairo-Bold.ttf")));
        assert_eq!(cairo.files(), vec![dir.path().join("Cairo-Bold.ttf").as_path()]);
    }

    #[test]
    fn variant_only_family_gets_the_first_variant_as_regular() {
        let dir = TempDir::new().unwrap();
        for file in ["Amiri-Italic.ttf", "Amiri-BoldItalic.ttf"] {
            fs::write(dir.path().join(file), b"stub").unwrap();
        }
        let regs = FontRegistry::from_dir(dir.path()).registrations();
        assert_eq!(regs.len(), 1);
        assert_eq!(regs[0].regular, dir.path().join("Amiri-Italic.ttf"));
        assert_eq!(regs[0].italic, Some(dir.path().join("Amiri-Italic.ttf")));
        assert_eq!(regs[0].bold_italic, Some(dir.path().join("Amiri-BoldItalic.ttf")));
        assert_eq!(regs[0].files().len(), 2);
    }
}

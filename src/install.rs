//! Font installation – copies the bundled font files into a public
//! directory.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{Error, Result};

/// Default destination, relative to the working directory.
pub const DEFAULT_FONT_DESTINATION: &str = "public/fonts/arabic";

/// Outcome of an installation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InstallReport {
    pub destination: PathBuf,
    /// Whether the destination directory had to be created.
    pub created_destination: bool,
    /// File names copied, in directory order.
    pub copied: Vec<String>,
    /// File names left alone because they already existed.
    pub skipped: Vec<String>,
}

fn is_font_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("ttf") || e.eq_ignore_ascii_case("otf"))
}

/// Copy every `.ttf`/`.otf` file in `source` into `destination`.
///
/// Existing files are kept unless `force` is set. The destination is
/// created when missing; a missing source is an error.
pub fn install_fonts(source: &Path, destination: &Path, force: bool) -> Result<InstallReport> {
    if !source.is_dir() {
        return Err(Error::FontSourceMissing(source.to_path_buf()));
    }

    let mut report = InstallReport {
        destination: destination.to_path_buf(),
        ..InstallReport::default()
    };

    if !destination.exists() {
        fs::create_dir_all(destination)?;
        report.created_destination = true;
        log::info!("created fonts directory {}", destination.display());
    }

    let mut entries = fs::read_dir(source)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort();

    for path in entries {
        if !path.is_file() || !is_font_file(&path) {
            continue;
        }
        let Some(name) = path.file_name() else {
            continue;
        };
        let target = destination.join(name);
        let name = name.to_string_lossy().into_owned();

        if target.exists() && !force {
            log::warn!("font already exists: {name}");
            report.skipped.push(name);
            continue;
        }

        fs::copy(&path, &target)?;
        log::info!("copied {name}");
        report.copied.push(name);
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn source_with(files: &[&str]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for f in files {
            fs::write(dir.path().join(f), f.as_bytes()).unwrap();
        }
        dir
    }

    #[test]
    fn copies_only_font_files() {
        let src = source_with(&["Amiri-Regular.ttf", "Cairo-Bold.OTF", "README.md"]);
        let dest = TempDir::new().unwrap();
        let target = dest.path().join("fonts/arabic");

        let report = install_fonts(src.path(), &target, false).unwrap();
        assert!(report.created_destination);
        assert_eq!(report.copied, vec!["Amiri-Regular.ttf", "Cairo-Bold.OTF"]);
        assert!(target.join("Amiri-Regular.ttf").is_file());
        assert!(!target.join("README.md").exists());
    }

    #[test]
    fn existing_files_need_force() {
        let src = source_with(&["Amiri-Regular.ttf"]);
        let dest = TempDir::new().unwrap();
        fs::write(dest.path().join("Amiri-Regular.ttf"), b"old").unwrap();

        let report = install_fonts(src.path(), dest.path(), false).unwrap();
        assert_eq!(report.skipped, vec!["Amiri-Regular.ttf"]);
        assert_eq!(fs::read(dest.path().join("Amiri-Regular.ttf")).unwrap(), b"old");

        let report = install_fonts(src.path(), dest.path(), true).unwrap();
        assert_eq!(report.copied, vec!["Amiri-Regular.ttf"]);
        assert_eq!(
            fs::read(dest.path().join("Amiri-Regular.ttf")).unwrap(),
            b"Amiri-Regular.ttf"
        );
    }

    #[test]
    fn missing_source_is_an_error() {
        let dest = TempDir::new().unwrap();
        let err = install_fonts(Path::new("/nonexistent/fonts"), dest.path(), false).unwrap_err();
        assert!(matches!(err, Error::FontSourceMissing(_)));
    }
}

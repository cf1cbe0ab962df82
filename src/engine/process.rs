//! Shared plumbing for engines that shell out to an external executable.

use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempPath;

use super::EngineId;
use crate::error::{Error, Result};
use crate::fonts::FontRegistration;
use crate::prepare::escape_html;

/// Resolve an executable from an override variable or the `PATH`.
pub(crate) fn find_executable(env_var: &str, candidates: &[&str]) -> Option<PathBuf> {
    if let Some(path) = env::var_os(env_var).map(PathBuf::from) {
        if path.is_file() {
            return Some(path);
        }
        log::warn!("{env_var} points at {}, which is not a file", path.display());
    }
    let search = env::var_os("PATH")?;
    env::split_paths(&search)
        .flat_map(|dir| candidates.iter().map(move |name| dir.join(name)))
        .find(|p| p.is_file())
}

/// Input and output scratch files for a single conversion.
///
/// Both files are removed when the value is dropped.
pub(crate) struct Scratch {
    pub input: TempPath,
    pub output: TempPath,
}

impl Scratch {
    pub fn new(temp_dir: &Path, document: &str) -> Result<Self> {
        fs::create_dir_all(temp_dir)?;

        let mut input = tempfile::Builder::new()
            .prefix("arabic-pdf-")
            .suffix(".html")
            .tempfile_in(temp_dir)?;
        input.write_all(document.as_bytes())?;
        input.flush()?;

        let output = tempfile::Builder::new()
            .prefix("arabic-pdf-")
            .suffix(".pdf")
            .tempfile_in(temp_dir)?;

        Ok(Self {
            input: input.into_temp_path(),
            output: output.into_temp_path(),
        })
    }

    /// Read the PDF the engine wrote.
    pub fn read_output(&self, engine: EngineId) -> Result<Vec<u8>> {
        let bytes = fs::read(&self.output)?;
        if bytes.is_empty() {
            return Err(Error::Render {
                engine,
                message: "engine produced an empty file".to_string(),
            });
        }
        Ok(bytes)
    }
}

/// Run `cmd` to completion; a non-zero exit becomes [`Error::Render`].
pub(crate) fn run(engine: EngineId, cmd: &mut Command) -> Result<()> {
    log::debug!("running {engine}: {cmd:?}");
    let output = cmd.output()?;
    if output.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    let message = if stderr.is_empty() {
        format!("exited with {}", output.status)
    } else {
        stderr
    };
    Err(Error::Render { engine, message })
}

/// Wrap a prepared fragment into a standalone RTL document.
pub(crate) fn html_document(body: &str, title: &str, head_css: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"ar\" dir=\"rtl\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{}</title>\n<style>\n{}</style>\n</head>\n<body>\n{}\n</body>\n</html>\n",
        escape_html(title),
        head_css,
        body
    )
}

/// `@font-face` rules that point at the registered files with absolute
/// `file://` URLs.
pub(crate) fn font_face_css(fonts: &[FontRegistration]) -> String {
    let mut css = String::new();
    for reg in fonts {
        let faces = [
            (Some(&reg.regular), "normal", "normal"),
            (reg.bold.as_ref(), "bold", "normal"),
            (reg.italic.as_ref(), "normal", "italic"),
            (reg.bold_italic.as_ref(), "bold", "italic"),
        ];
        for (path, weight, style) in faces {
            let Some(path) = path else { continue };
            css.push_str(&format!(
                "@font-face {{ font-family: \"{}\"; src: url(\"{}\") format(\"truetype\"); \
                 font-weight: {weight}; font-style: {style}; }}\n",
                reg.family,
                file_url(path)
            ));
        }
    }
    css
}

fn file_url(path: &Path) -> String {
    let absolute = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    let mut url = String::from("file://");
    for c in absolute.to_string_lossy().chars() {
        match c {
            ' ' => url.push_str("%20"),
            '"' => url.push_str("%22"),
            '\\' => url.push('/'),
            c => url.push(c),
        }
    }
    url
}

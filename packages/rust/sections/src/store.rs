//! Reading and atomically publishing section files.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use termgroup_shared::{OutputFormat, Result, SectionList, TermGroupError};

use crate::builtin::builtin_sections;
use crate::literal::{LiteralMeta, decode_literal, encode_literal};
use crate::text::{TextOptions, decode_text, encode_text_with};

/// Where a section list is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionsSource {
    /// A file on disk; the encoding is chosen by [`detect_format`].
    Path(PathBuf),
    /// A section set bundled with the crate, addressed by name.
    Builtin(String),
}

impl SectionsSource {
    /// Label used in error messages and logs.
    pub fn label(&self) -> String {
        match self {
            Self::Path(path) => path.display().to_string(),
            Self::Builtin(name) => format!("builtin:{name}"),
        }
    }
}

/// `.json` files hold literals; anything else is structured text.
pub fn detect_format(path: &Path) -> OutputFormat {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => OutputFormat::Literal,
        _ => OutputFormat::Text,
    }
}

/// Read a section list from a file or builtin.
#[instrument(skip_all, fields(source = %source.label()))]
pub fn read_sections(source: &SectionsSource) -> Result<SectionList> {
    match source {
        SectionsSource::Builtin(name) => builtin_sections(name),
        SectionsSource::Path(path) => {
            let content = std::fs::read_to_string(path)
                .map_err(|e| TermGroupError::storage(path, e))?;
            let label = source.label();
            let list = match detect_format(path) {
                OutputFormat::Literal => decode_literal(&content, &label)?,
                OutputFormat::Text => decode_text(&content, &label)?,
            };
            debug!(sections = list.len(), "read sections file");
            Ok(list)
        }
    }
}

/// Encode as structured text and publish to `path`.
pub fn write_text<F>(path: &Path, list: &SectionList, opts: &TextOptions, label: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let content = encode_text_with(list, opts, label)?;
    publish(path, &content)?;
    info!(path = %path.display(), sections = list.len(), "wrote text sections");
    Ok(())
}

/// Encode as a JSON literal and publish to `path`.
pub fn write_literal(path: &Path, list: &SectionList, meta: &LiteralMeta) -> Result<()> {
    let content = encode_literal(list, meta)?;
    publish(path, &content)?;
    info!(path = %path.display(), sections = list.len(), "wrote literal sections");
    Ok(())
}

/// Write `content` to `path` atomically: a hidden temp file in the same
/// directory, then rename over the target.
///
/// The parent directory must already exist. On any failure the temp file is
/// removed and the target is left untouched.
#[instrument(skip(content), fields(path = %path.display(), bytes = content.len()))]
pub fn publish(path: &Path, content: &str) -> Result<()> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            TermGroupError::storage(
                path,
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no file name"),
            )
        })?;

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    if !parent.is_dir() {
        return Err(TermGroupError::storage(
            &parent,
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "parent directory does not exist",
            ),
        ));
    }

    let temp = parent.join(format!(".{file_name}.{}.tmp", uuid::Uuid::now_v7()));

    // Write to temp file first
    if let Err(e) = std::fs::write(&temp, content) {
        let _ = std::fs::remove_file(&temp);
        return Err(TermGroupError::storage(&temp, e));
    }

    // Atomic rename
    if let Err(e) = std::fs::rename(&temp, path) {
        warn!(temp = %temp.display(), "rename failed, removing temp file");
        let _ = std::fs::remove_file(&temp);
        return Err(TermGroupError::storage(path, e));
    }

    debug!("published file");
    Ok(())
}

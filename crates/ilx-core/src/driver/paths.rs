//! Project layout: roots, companions and output locations

use std::path::{Path, PathBuf};

use super::UnitKind;
use crate::{IlxConfig, IlxError};

const ROOT_MARKERS: &[&str] = &["Gemfile", ".git"];
const SIGNATURE_DIR: &str = "sig";
const TREE_EXTENSION: &str = ".json";
const OUTPUT_EXTENSION: &str = ".ilx";

/// Walk up from `path` to the first directory holding a `Gemfile` or `.git`
pub fn find_project_root(path: &Path) -> Option<PathBuf> {
    path.ancestors()
        .filter(|dir| dir.is_dir())
        .find(|dir| ROOT_MARKERS.iter().any(|marker| dir.join(marker).exists()))
        .map(Path::to_path_buf)
}

/// Like [`find_project_root`], failing when no marker exists
pub fn project_root(path: &Path) -> crate::Result<PathBuf> {
    find_project_root(path).ok_or_else(|| IlxError::NoProjectRoot {
        path: path.to_path_buf(),
    })
}

pub fn is_excluded(path: &Path, config: &IlxConfig) -> bool {
    let text = path.to_string_lossy().replace('\\', "/");
    config
        .excluded_dirs
        .iter()
        .any(|fragment| text.contains(fragment.as_str()))
}

/// Kind of unit a parsed tree document holds, judged by its suffix
pub fn unit_kind(path: &Path, config: &IlxConfig) -> Option<UnitKind> {
    let name = path.file_name()?.to_string_lossy();
    if name.ends_with(&config.markup_suffix) {
        Some(UnitKind::View)
    } else if name.ends_with(&config.source_suffix) {
        Some(UnitKind::Domain)
    } else {
        None
    }
}

fn suffix_for<'a>(kind: UnitKind, config: &'a IlxConfig) -> &'a str {
    match kind {
        UnitKind::Domain => &config.source_suffix,
        UnitKind::View => &config.markup_suffix,
    }
}

/// Strip the input suffix from a path string
fn without_suffix(path: &Path, suffix: &str) -> String {
    let text = path.to_string_lossy();
    text.strip_suffix(suffix).unwrap_or(text.as_ref()).to_string()
}

/// `<root>/<output_dir>/<relative path, input suffix replaced by .ilx>`
pub fn output_path(root: &Path, unit: &Path, kind: UnitKind, config: &IlxConfig) -> PathBuf {
    let relative = unit.strip_prefix(root).unwrap_or(unit);
    let stem = without_suffix(relative, suffix_for(kind, config));
    root.join(&config.output_dir)
        .join(format!("{stem}{OUTPUT_EXTENSION}"))
}

/// Signature table for a source unit: co-located first, then mirrored
/// under `sig/` at the project root.
pub fn signature_path(root: &Path, unit: &Path, config: &IlxConfig) -> Option<PathBuf> {
    let co_located = PathBuf::from(format!(
        "{}{}",
        without_suffix(unit, &config.source_suffix),
        config.signature_suffix
    ));
    if co_located.is_file() {
        return Some(co_located);
    }

    let relative = unit.strip_prefix(root).ok()?;
    let mirrored = root.join(SIGNATURE_DIR).join(format!(
        "{}{}",
        without_suffix(relative, &config.source_suffix),
        config.signature_suffix
    ));
    mirrored.is_file().then_some(mirrored)
}

/// Unit name used in provenance: the path below the root without the
/// trailing tree extension (`app/models/post.rb`).
pub fn unit_name(root: &Path, unit: &Path) -> String {
    let relative = unit.strip_prefix(root).unwrap_or(unit);
    without_suffix(relative, TREE_EXTENSION).replace('\\', "/")
}

/// Parsed tree document for an edited file: the file itself when it is
/// already a tree document, otherwise `<file>.json` next to it.
pub fn tree_document_for(file: &Path, config: &IlxConfig) -> Option<PathBuf> {
    if unit_kind(file, config).is_some() {
        return Some(file.to_path_buf());
    }
    let candidate = PathBuf::from(format!("{}{TREE_EXTENSION}", file.to_string_lossy()));
    (candidate.is_file() && unit_kind(&candidate, config).is_some()).then_some(candidate)
}

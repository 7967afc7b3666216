//! # ILX Core
//!
//! Compiles parsed source artifacts into ILX, a compact line-oriented graph
//! notation:
//! - Generic graph encoding of statement/expression trees
//! - Domain extraction (entities, relationships, features)
//! - View tree extraction from parsed templates
//! - Batch conversion of a project and the editor hook
//!
//! Parsing stays outside this crate. Source trees and markup trees arrive
//! already built, normally as JSON documents.

#![warn(clippy::all)]

pub mod ast;
pub mod domain;
pub mod driver;
pub mod errors;
pub mod graph;
pub mod signatures;
pub mod view;

// Re-export commonly used types
pub use ast::{Param, ParamKind, SourceAst, ToSource, WhenClause};
pub use domain::{DomainExtractor, DomainModel, Entity, Feature};
pub use driver::{BatchDriver, BatchSummary, JsonTreeLoader, TreeLoader, UnitKind};
pub use errors::{IlxError, Result};
pub use graph::{encode_tree, to_ilx, GraphEncoder, NodeStore};
pub use signatures::Signatures;
pub use view::{MarkupDocument, ViewExtractor, ViewRecord};

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

/// ILX core version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

fn env_filter() -> EnvFilter {
    let filter = EnvFilter::from_default_env();
    match "ilx_core=info".parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    }
}

/// Initialize tracing for ILX core components on stderr
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .try_init();
}

/// Initialize tracing into an append-only log file.
/// Used by the editor hook, whose stdout and stderr belong to the caller.
pub fn init_tracing_to_file(path: impl AsRef<Path>) -> Result<()> {
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_ansi(false)
        .with_writer(std::sync::Mutex::new(file))
        .try_init()
        .map_err(|e| IlxError::Config(e.to_string()))
}

/// Conversion settings shared by the CLI, the batch driver and the hook
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IlxConfig {
    /// Output directory, relative to the project root
    pub output_dir: PathBuf,
    /// Suffix of parsed source trees (`post.rb` → `post.rb.json`)
    pub source_suffix: String,
    /// Suffix of parsed markup trees
    pub markup_suffix: String,
    /// Suffix of signature tables
    pub signature_suffix: String,
    /// Path fragments that exclude a unit
    pub excluded_dirs: Vec<String>,
    /// Superclasses that mark a data-model class
    pub model_superclasses: Vec<String>,
    /// Convert units in parallel
    pub parallel: bool,
}

impl Default for IlxConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(".agentc/ilx"),
            source_suffix: ".rb.json".to_string(),
            markup_suffix: ".html.erb.json".to_string(),
            signature_suffix: ".rbs.json".to_string(),
            excluded_dirs: vec![
                "/vendor/".to_string(),
                "/spec/fixtures/".to_string(),
                "/test/fixtures/".to_string(),
            ],
            model_superclasses: domain::vocabulary::DEFAULT_MODEL_SUPERCLASSES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            parallel: true,
        }
    }
}

impl IlxConfig {
    /// Load settings from a JSON file; missing keys keep their defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text)
            .map_err(|e| IlxError::Config(format!("{}: {e}", path.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ilx.json");
        std::fs::write(&path, r#"{"parallel": false, "output_dir": "out"}"#).unwrap();

        let config = IlxConfig::load(&path).unwrap();
        assert!(!config.parallel);
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.source_suffix, ".rb.json");
        assert_eq!(config.model_superclasses.len(), 2);
    }

    #[test]
    fn test_bad_config_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ilx.json");
        std::fs::write(&path, "[1, 2").unwrap();
        assert!(matches!(IlxConfig::load(&path), Err(IlxError::Config(_))));
    }
}

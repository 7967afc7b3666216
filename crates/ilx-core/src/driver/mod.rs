/*!
# Batch driver

Discovers parsed units under a project root, runs the domain or view pass
on each one and writes the results below the output directory. A unit that
fails is recorded in the summary; it never stops the others.
*/

pub mod hook;
pub mod paths;


use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    ast::SourceAst,
    domain::{self, DomainExtractor},
    signatures::Signatures,
    view::{self, MarkupDocument, ViewExtractor},
    IlxConfig,
};

/// Separator between units when a directory is emitted as one text
pub const UNIT_SEPARATOR: &str = "---";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitKind {
    /// Parsed source tree, emitted as domain ILX
    Domain,
    /// Parsed markup tree, emitted as view ILX
    View,
}

/// Front end handing parsed trees to the passes
pub trait TreeLoader: Send + Sync {
    fn load_source(&self, path: &Path) -> crate::Result<SourceAst>;
    fn load_markup(&self, path: &Path) -> crate::Result<MarkupDocument>;
    fn load_signatures(&self, path: &Path) -> crate::Result<Signatures>;
}

/// Loads trees from JSON documents
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonTreeLoader;

impl TreeLoader for JsonTreeLoader {
    fn load_source(&self, path: &Path) -> crate::Result<SourceAst> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    fn load_markup(&self, path: &Path) -> crate::Result<MarkupDocument> {
        MarkupDocument::from_json(&fs::read_to_string(path)?)
    }

    fn load_signatures(&self, path: &Path) -> crate::Result<Signatures> {
        Signatures::load(path)
    }
}

/// Result of converting one unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitOutcome {
    pub source: PathBuf,
    pub kind: UnitKind,
    /// Output file on success, error text on failure
    pub result: std::result::Result<PathBuf, String>,
}

impl UnitOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Summary of a batch run
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub domain_successes: u64,
    pub domain_failures: u64,
    pub view_successes: u64,
    pub view_failures: u64,
    pub errors: Vec<String>,
    pub outcomes: Vec<UnitOutcome>,
}

impl BatchSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, outcome: UnitOutcome) {
        match (&outcome.result, outcome.kind) {
            (Ok(_), UnitKind::Domain) => self.domain_successes += 1,
            (Ok(_), UnitKind::View) => self.view_successes += 1,
            (Err(error), kind) => {
                match kind {
                    UnitKind::Domain => self.domain_failures += 1,
                    UnitKind::View => self.view_failures += 1,
                }
                self.errors
                    .push(format!("Error processing {}: {}", outcome.source.display(), error));
            }
        }
        self.outcomes.push(outcome);
    }

    pub fn successes(&self) -> u64 {
        self.domain_successes + self.view_successes
    }

    pub fn failures(&self) -> u64 {
        self.domain_failures + self.view_failures
    }

    pub fn total(&self) -> u64 {
        self.successes() + self.failures()
    }

    pub fn success_rate(&self) -> f64 {
        if self.total() == 0 {
            0.0
        } else {
            (self.successes() as f64) / (self.total() as f64)
        }
    }

    pub fn success(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Converts units of a project to ILX
pub struct BatchDriver<L: TreeLoader = JsonTreeLoader> {
    config: IlxConfig,
    loader: L,
}

impl BatchDriver<JsonTreeLoader> {
    pub fn new(config: IlxConfig) -> Self {
        Self::with_loader(config, JsonTreeLoader)
    }
}

impl<L: TreeLoader> BatchDriver<L> {
    pub fn with_loader(config: IlxConfig, loader: L) -> Self {
        Self { config, loader }
    }

    pub fn config(&self) -> &IlxConfig {
        &self.config
    }

    /// Find every unit below `dir`, in sorted path order. Excluded
    /// directories and the output directory are skipped.
    pub fn discover(&self, dir: &Path) -> Result<Vec<(PathBuf, UnitKind)>> {
        let mut units = Vec::new();
        let output_dir = dir.join(&self.config.output_dir);
        self.discover_recursive(dir, &output_dir, &mut units)?;
        units.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(units)
    }

    fn discover_recursive(
        &self,
        current_dir: &Path,
        output_dir: &Path,
        units: &mut Vec<(PathBuf, UnitKind)>,
    ) -> Result<()> {
        for entry in fs::read_dir(current_dir)? {
            let path = entry?.path();
            if path.is_dir() {
                // Compare with a trailing slash so `/vendor/` matches the directory itself
                let as_dir = path.join("");
                if path == output_dir || paths::is_excluded(&as_dir, &self.config) {
                    continue;
                }
                self.discover_recursive(&path, output_dir, units)?;
            } else if let Some(kind) = paths::unit_kind(&path, &self.config) {
                if !paths::is_excluded(&path, &self.config) {
                    units.push((path, kind));
                }
            }
        }
        Ok(())
    }

    /// Convert every unit below `root` and write the results
    pub fn run(&self, root: &Path) -> Result<BatchSummary> {
        if !root.is_dir() {
            return Err(anyhow!("{} is not a directory", root.display()));
        }
        let units = self.discover(root)?;
        info!(root = %root.display(), units = units.len(), "starting batch conversion");

        let convert = |(path, kind): &(PathBuf, UnitKind)| UnitOutcome {
            source: path.clone(),
            kind: *kind,
            result: self
                .convert_unit(root, path, *kind)
                .map_err(|e| format!("{e:#}")),
        };
        let outcomes: Vec<UnitOutcome> = if self.config.parallel {
            units.par_iter().map(convert).collect()
        } else {
            units.iter().map(convert).collect()
        };

        let mut summary = BatchSummary::new();
        for outcome in outcomes {
            match &outcome.result {
                Ok(output) => debug!(source = %outcome.source.display(), output = %output.display(), "converted"),
                Err(error) => warn!(source = %outcome.source.display(), %error, "conversion failed"),
            }
            summary.record(outcome);
        }
        info!(
            successes = summary.successes(),
            failures = summary.failures(),
            "batch conversion complete"
        );
        Ok(summary)
    }

    /// Convert one unit and write its output file
    pub fn convert_unit(&self, root: &Path, unit: &Path, kind: UnitKind) -> Result<PathBuf> {
        let text = match kind {
            UnitKind::Domain => self.emit_domain(root, unit)?,
            UnitKind::View => self.emit_view(unit)?,
        };
        let output = paths::output_path(root, unit, kind, &self.config);
        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&output, text)
            .with_context(|| format!("writing {}", output.display()))?;
        Ok(output)
    }

    /// Domain ILX for a source unit, using its signature companion when found
    pub fn emit_domain(&self, root: &Path, unit: &Path) -> Result<String> {
        let tree = self
            .loader
            .load_source(unit)
            .with_context(|| format!("loading {}", unit.display()))?;
        let signatures = self.signatures_for(root, unit);
        let extractor = DomainExtractor::new()
            .with_model_superclasses(self.config.model_superclasses.clone());
        let model = match &signatures {
            Some(signatures) => extractor.with_signatures(signatures).extract(&tree),
            None => extractor.extract(&tree),
        };
        Ok(domain::to_ilx(&model))
    }

    /// View ILX for a markup unit. Malformed documents are errors here.
    pub fn emit_view(&self, unit: &Path) -> Result<String> {
        let document = self
            .loader
            .load_markup(unit)
            .with_context(|| format!("loading {}", unit.display()))?;
        let records = ViewExtractor::new().extract(&document)?;
        Ok(view::to_ilx(&view::view_name(unit), &records))
    }

    /// View ILX that turns any failure into the error line
    pub fn render_view(&self, unit: &Path) -> String {
        let name = view::view_name(unit);
        let records = self
            .loader
            .load_markup(unit)
            .and_then(|document| ViewExtractor::new().extract(&document));
        match records {
            Ok(records) => view::to_ilx(&name, &records),
            Err(error) => view::error_ilx(&name, &error),
        }
    }

    /// Generic graph line for a source unit
    pub fn emit_graph(&self, root: &Path, unit: &Path) -> Result<String> {
        let tree = self
            .loader
            .load_source(unit)
            .with_context(|| format!("loading {}", unit.display()))?;
        let signatures = self.signatures_for(root, unit);
        let store = crate::graph::encode_tree(
            &paths::unit_name(root, unit),
            &tree,
            signatures.as_ref(),
        );
        Ok(crate::graph::to_ilx(&store))
    }

    /// Emit every unit of one kind below `dir`, joined by separator lines.
    /// Source units that cannot be loaded are logged and left out.
    pub fn emit_directory(&self, dir: &Path, kind: UnitKind) -> Result<String> {
        let root = paths::find_project_root(dir).unwrap_or_else(|| dir.to_path_buf());
        let mut outputs = Vec::new();
        for (unit, unit_kind) in self.discover(dir)? {
            if unit_kind != kind {
                continue;
            }
            match kind {
                UnitKind::Domain => match self.emit_domain(&root, &unit) {
                    Ok(text) => outputs.push(text),
                    Err(error) => warn!(unit = %unit.display(), error = %format!("{error:#}"), "skipping unit"),
                },
                UnitKind::View => outputs.push(self.render_view(&unit)),
            }
        }
        Ok(outputs.join(&format!("\n{UNIT_SEPARATOR}\n")))
    }

    fn signatures_for(&self, root: &Path, unit: &Path) -> Option<Signatures> {
        let path = paths::signature_path(root, unit, &self.config)?;
        match self.loader.load_signatures(&path) {
            Ok(signatures) => Some(signatures),
            Err(error) => {
                warn!(signatures = %path.display(), %error, "ignoring unreadable signatures");
                None
            }
        }
    }
}

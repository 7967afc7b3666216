use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ilx_core::{
    domain,
    driver::{hook, paths},
    encode_tree, to_ilx, BatchDriver, BatchSummary, DomainExtractor, IlxConfig, Signatures,
    SourceAst, ToSource, UnitKind,
};

fn load_tree(path: &Path) -> Result<SourceAst> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("decoding {}", path.display()))
}

fn load_signatures(path: Option<&Path>) -> Result<Option<Signatures>> {
    path.map(|path| {
        Signatures::load(path).with_context(|| format!("loading signatures {}", path.display()))
    })
    .transpose()
}

/// Project root for a path, or the path's own directory when there is none
fn root_or_parent(path: &Path) -> PathBuf {
    paths::find_project_root(path).unwrap_or_else(|| {
        if path.is_dir() {
            path.to_path_buf()
        } else {
            path.parent().map(Path::to_path_buf).unwrap_or_default()
        }
    })
}

/// Generic graph line for one source tree
pub fn emit_graph(tree: &Path, unit: Option<&str>, signatures: Option<&Path>) -> Result<String> {
    let ast = load_tree(tree)?;
    let signatures = load_signatures(signatures)?;
    let unit = match unit {
        Some(unit) => unit.to_string(),
        None => paths::unit_name(&root_or_parent(tree), tree),
    };
    Ok(to_ilx(&encode_tree(&unit, &ast, signatures.as_ref())))
}

/// Approximate source text for a tree
pub fn emit_source(tree: &Path) -> Result<String> {
    Ok(load_tree(tree)?.to_source())
}

/// Domain ILX for a tree file, or for every source tree below a directory
pub fn emit_domain(path: &Path, signatures: Option<&Path>, config: &IlxConfig) -> Result<String> {
    let driver = BatchDriver::new(config.clone());
    if path.is_dir() {
        return driver.emit_directory(path, UnitKind::Domain);
    }
    match load_signatures(signatures)? {
        Some(signatures) => {
            let model = DomainExtractor::new()
                .with_signatures(&signatures)
                .with_model_superclasses(config.model_superclasses.clone())
                .extract(&load_tree(path)?);
            Ok(domain::to_ilx(&model))
        }
        None => driver.emit_domain(&root_or_parent(path), path),
    }
}

/// View ILX for a markup tree file, or for every markup tree below a directory.
/// Malformed documents render as an error line.
pub fn emit_view(path: &Path, config: &IlxConfig) -> Result<String> {
    let driver = BatchDriver::new(config.clone());
    if path.is_dir() {
        driver.emit_directory(path, UnitKind::View)
    } else {
        Ok(driver.render_view(path))
    }
}

/// Convert a whole project and return the summary with its report
pub fn run_batch(root: &Path, config: &IlxConfig) -> Result<(BatchSummary, String)> {
    let summary = BatchDriver::new(config.clone()).run(root)?;
    let report = report(&summary, &root.join(&config.output_dir));
    Ok((summary, report))
}

pub fn report(summary: &BatchSummary, output: &Path) -> String {
    let rule = "=".repeat(60);
    let mut lines = vec![
        rule.clone(),
        "Conversion Complete".to_string(),
        "  Domain:".to_string(),
        format!("    Success: {}", summary.domain_successes),
        format!("    Failures: {}", summary.domain_failures),
        "  Views:".to_string(),
        format!("    Success: {}", summary.view_successes),
        format!("    Failures: {}", summary.view_failures),
        format!("  Output: {}", output.display()),
        rule,
    ];
    if !summary.errors.is_empty() {
        lines.push("Errors:".to_string());
        lines.extend(summary.errors.iter().map(|error| format!("  {error}")));
    }
    lines.join("\n")
}

/// Run the editor hook on one stdin payload
pub fn run_hook(payload: &str, config: &IlxConfig) -> hook::HookAction {
    hook::handle_json(payload, config, hook::disabled_by_env())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn write(path: &Path, text: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, text).unwrap();
    }

    const POST: &str = r#"{"class": {"name": "Post", "superclass": "ApplicationRecord",
        "body": {"def": {"name": "title_for", "params": [{"name": "locale"}], "line": 4}}}}"#;

    #[test]
    fn test_graph_with_explicit_unit() {
        let dir = tempfile::tempdir().unwrap();
        let tree = dir.path().join("post.rb.json");
        write(&tree, POST);
        assert_eq!(
            emit_graph(&tree, Some("app/models/post.rb"), None).unwrap(),
            "@app/models/post.rb:4:title_for FUA_;*"
        );
    }

    #[test]
    fn test_graph_unit_defaults_to_relative_path() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Gemfile"), "").unwrap();
        let tree = dir.path().join("app/models/post.rb.json");
        write(&tree, POST);
        assert_eq!(
            emit_graph(&tree, None, None).unwrap(),
            "@app/models/post.rb:4:title_for FUA_;*"
        );
    }

    #[test]
    fn test_domain_with_explicit_signatures() {
        let dir = tempfile::tempdir().unwrap();
        let tree = dir.path().join("post.rb.json");
        let sigs = dir.path().join("types.json");
        write(&tree, POST);
        write(&sigs, r#"{"title_for": {"params": ["Symbol"], "returns": "String"}}"#);

        let config = IlxConfig::default();
        assert_eq!(
            emit_domain(&tree, Some(&sigs), &config).unwrap(),
            "@app\nPost{}\n  #title_for(locale)→String"
        );
        assert_eq!(
            emit_domain(&tree, None, &config).unwrap(),
            "@app\nPost{}\n  #title_for(locale)→Post"
        );
    }

    #[test]
    fn test_view_of_broken_file_is_an_error_line() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("app/views/posts/show.html.erb.json");
        write(&file, "{oops");
        let output = emit_view(&file, &IlxConfig::default()).unwrap();
        assert!(output.starts_with("view:posts/show\n!error:"));
    }

    #[test]
    fn test_missing_tree_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(emit_graph(&dir.path().join("none.rb.json"), None, None).is_err());
        assert!(emit_source(&dir.path().join("none.rb.json")).is_err());
    }

    #[test]
    fn test_batch_report() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("app/models/post.rb.json"), POST);
        write(&dir.path().join("app/models/bad.rb.json"), "[");

        let (summary, report) = run_batch(dir.path(), &IlxConfig::default()).unwrap();
        assert_eq!(summary.domain_successes, 1);
        assert_eq!(summary.domain_failures, 1);
        assert!(report.contains("    Success: 1\n    Failures: 1"));
        assert!(report.contains("Errors:\n  Error processing"));
    }
}

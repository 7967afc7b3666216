//! Editor hook: regenerate ILX for a file right after an editing tool wrote it.
//!
//! The hook reads one JSON event, acts only on file-writing tools and never
//! reports failure to the caller. Everything it does goes to the log.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info, warn};

use super::{paths, BatchDriver, TreeLoader};
use crate::IlxConfig;

/// Environment switch that turns the hook off when set to `1`
pub const DISABLE_ENV: &str = "DISABLE_ILX_EMITTER";

/// Default diagnostic log
pub const DEFAULT_LOG: &str = "/tmp/ilx-emitter-hook.log";

const WRITING_TOOLS: &[&str] = &["Write", "Edit", "MultiEdit"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ToolInput {
    #[serde(default)]
    pub file_path: Option<PathBuf>,
}

/// Event received on stdin
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct HookInput {
    #[serde(default)]
    pub tool_name: Option<String>,
    #[serde(default)]
    pub tool_input: ToolInput,
}

impl HookInput {
    pub fn from_json(text: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookAction {
    /// Switched off through the environment
    Disabled,
    /// Nothing to do for this event
    Ignored(String),
    /// Output written
    Emitted(PathBuf),
    /// Conversion failed; logged only
    Failed(String),
}

/// Whether the disable switch is set in the environment
pub fn disabled_by_env() -> bool {
    std::env::var(DISABLE_ENV).map(|v| v == "1").unwrap_or(false)
}

/// React to one raw stdin payload
pub fn handle_json(text: &str, config: &IlxConfig, disabled: bool) -> HookAction {
    if disabled {
        info!("ILX generation disabled via {DISABLE_ENV}=1");
        return HookAction::Disabled;
    }
    match HookInput::from_json(text) {
        Ok(input) => handle(&input, config, false),
        Err(error) => {
            warn!(%error, "unreadable hook input");
            HookAction::Ignored(format!("unreadable input: {error}"))
        }
    }
}

/// React to one editor event
pub fn handle(input: &HookInput, config: &IlxConfig, disabled: bool) -> HookAction {
    handle_with(&BatchDriver::new(config.clone()), input, disabled)
}

pub fn handle_with<L: TreeLoader>(
    driver: &BatchDriver<L>,
    input: &HookInput,
    disabled: bool,
) -> HookAction {
    if disabled {
        info!("ILX generation disabled via {DISABLE_ENV}=1");
        return HookAction::Disabled;
    }

    let tool = input.tool_name.as_deref().unwrap_or_default();
    if !WRITING_TOOLS.contains(&tool) {
        return HookAction::Ignored(format!("tool {tool:?} does not write files"));
    }
    let Some(file) = input.tool_input.file_path.as_deref() else {
        return HookAction::Ignored("no file path".to_string());
    };
    if paths::is_excluded(file, driver.config()) {
        debug!(file = %file.display(), "excluded file");
        return HookAction::Ignored(format!("{} is excluded", file.display()));
    }

    info!(tool, file = %file.display(), "hook triggered");
    emit_for(driver, file)
}

fn emit_for<L: TreeLoader>(driver: &BatchDriver<L>, file: &Path) -> HookAction {
    let config = driver.config();
    let Some(unit) = paths::tree_document_for(file, config) else {
        debug!(file = %file.display(), "no parsed tree for file");
        return HookAction::Ignored(format!("no parsed tree for {}", file.display()));
    };
    let Some(kind) = paths::unit_kind(&unit, config) else {
        return HookAction::Ignored(format!("{} is not a unit", unit.display()));
    };
    let root = match paths::project_root(&unit) {
        Ok(root) => root,
        Err(error) => {
            info!(%error, "skipping");
            return HookAction::Ignored(error.to_string());
        }
    };
    debug!(root = %root.display(), unit = %unit.display(), ?kind, "emitting");

    match driver.convert_unit(&root, &unit, kind) {
        Ok(output) => {
            info!(output = %output.display(), "successfully generated");
            HookAction::Emitted(output)
        }
        Err(error) => {
            let message = format!("{error:#}");
            warn!(unit = %unit.display(), error = %message, "ILX emission failed");
            HookAction::Failed(message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn event(tool: &str, file: &Path) -> HookInput {
        HookInput {
            tool_name: Some(tool.to_string()),
            tool_input: ToolInput {
                file_path: Some(file.to_path_buf()),
            },
        }
    }

    fn project() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        let models = dir.path().join("app/models");
        fs::create_dir_all(&models).unwrap();
        fs::write(models.join("post.rb"), "class Post < ApplicationRecord; end").unwrap();
        fs::write(
            models.join("post.rb.json"),
            r#"{"class": {"name": "Post", "superclass": "ApplicationRecord"}}"#,
        )
        .unwrap();
        dir
    }

    #[test]
    fn test_write_event_emits_domain_output() {
        let dir = project();
        let file = dir.path().join("app/models/post.rb");
        let action = handle(&event("Write", &file), &IlxConfig::default(), false);

        let expected = dir.path().join(".agentc/ilx/app/models/post.ilx");
        assert_eq!(action, HookAction::Emitted(expected.clone()));
        assert_eq!(fs::read_to_string(expected).unwrap(), "@app\nPost{}");
    }

    #[test]
    fn test_non_writing_tools_and_disabled_hook() {
        let dir = project();
        let file = dir.path().join("app/models/post.rb");
        let config = IlxConfig::default();

        assert!(matches!(
            handle(&event("Read", &file), &config, false),
            HookAction::Ignored(_)
        ));
        assert_eq!(handle(&event("Edit", &file), &config, true), HookAction::Disabled);
        assert!(!dir.path().join(".agentc").exists());
    }

    #[test]
    fn test_excluded_and_unparsed_files_are_ignored() {
        let dir = project();
        let config = IlxConfig::default();

        let vendored = dir.path().join("vendor/gems/x.rb");
        assert!(matches!(
            handle(&event("Write", &vendored), &config, false),
            HookAction::Ignored(reason) if reason.contains("excluded")
        ));
        let unparsed = dir.path().join("app/models/comment.rb");
        assert!(matches!(
            handle(&event("Write", &unparsed), &config, false),
            HookAction::Ignored(_)
        ));
    }

    #[test]
    fn test_broken_view_fails_without_output() {
        let dir = project();
        let views = dir.path().join("app/views/posts");
        fs::create_dir_all(&views).unwrap();
        fs::write(
            views.join("show.html.erb.json"),
            r#"{"errors": ["unclosed <p>"], "nodes": []}"#,
        )
        .unwrap();

        let file = views.join("show.html.erb");
        let action = handle(&event("MultiEdit", &file), &IlxConfig::default(), false);
        assert!(matches!(action, HookAction::Failed(message) if message.contains("unclosed <p>")));
        assert!(!dir.path().join(".agentc/ilx/app/views/posts/show.ilx").exists());
    }

    #[test]
    fn test_raw_payloads() {
        let config = IlxConfig::default();
        assert!(matches!(
            handle_json("not json", &config, false),
            HookAction::Ignored(_)
        ));
        assert!(matches!(
            handle_json(r#"{"tool_name": "Write", "tool_input": {}}"#, &config, false),
            HookAction::Ignored(reason) if reason == "no file path"
        ));
        assert_eq!(handle_json("not json", &config, true), HookAction::Disabled);
    }
}

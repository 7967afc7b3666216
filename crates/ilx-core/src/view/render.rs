use std::path::{Component, Path};

use super::{Element, ViewRecord};
use crate::IlxError;

const HEADER: &str = "view:";
const ERROR_MARKER: &str = "!error:";
const INDENT: &str = "  ";
const VIEWS_DIR: &str = "views";

/// Name of a view: the path below a `views` directory with every extension
/// removed, or the bare file stem when there is no such directory.
///
/// `app/views/posts/_form.html.erb.json` → `posts/_form`
pub fn view_name(path: &Path) -> String {
    let parts: Vec<String> = path
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    let below_views = parts
        .iter()
        .rposition(|part| part == VIEWS_DIR)
        .map(|index| &parts[index + 1..])
        .filter(|rest| !rest.is_empty());
    let parts = below_views.unwrap_or_else(|| &parts[parts.len().saturating_sub(1)..]);

    let mut name: Vec<&str> = parts.iter().map(String::as_str).collect();
    if let Some(last) = name.last_mut() {
        *last = strip_extensions(last);
    }
    name.join("/")
}

fn strip_extensions(file_name: &str) -> &str {
    match file_name.find('.') {
        Some(0) | None => file_name,
        Some(dot) => &file_name[..dot],
    }
}

pub fn to_ilx(name: &str, records: &[ViewRecord]) -> String {
    let mut lines = Vec::with_capacity(records.len() + 1);
    lines.push(format!("{HEADER}{name}"));
    for record in records {
        lines.push(format!("{}{}", INDENT.repeat(record.level()), record_text(record)));
    }
    lines.join("\n")
}

/// Output for a document that could not be processed
pub fn error_ilx(name: &str, error: &IlxError) -> String {
    let message = match error {
        IlxError::MalformedMarkup { message } => message.clone(),
        other => other.to_string(),
    };
    format!("{HEADER}{name}\n{ERROR_MARKER}{}", message.replace('\n', " "))
}

fn record_text(record: &ViewRecord) -> String {
    match record {
        ViewRecord::Element(element) => element_text(element),
        ViewRecord::Iterate { collection, .. } => format!("each:{collection}"),
        ViewRecord::Condition { condition, .. } => format!("cond:{condition}"),
    }
}

fn element_text(element: &Element) -> String {
    let mut text = element.kind.name().to_string();
    match (&element.binding, &element.literal) {
        (Some(binding), _) => {
            text.push(':');
            text.push_str(&binding.expression);
        }
        (None, Some(literal)) => {
            text.push(':');
            text.push_str(&quote(literal));
        }
        (None, None) => {}
    }
    for class in &element.classes {
        text.push('.');
        text.push_str(class);
    }
    if let Some(action) = &element.action {
        text.push('→');
        text.push_str(action);
    }
    if let Some(formatter) = element.binding.as_ref().and_then(|b| b.formatter.as_deref()) {
        text.push_str("|fmt:");
        text.push_str(formatter);
    }
    for (name, value) in &element.attributes {
        text.push_str(&format!("|{name}:{value}"));
    }
    text
}

fn quote(literal: &str) -> String {
    serde_json::to_string(literal).unwrap_or_else(|_| format!("\"{literal}\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_names() {
        assert_eq!(view_name(Path::new("app/views/posts/index.html.erb.json")), "posts/index");
        assert_eq!(
            view_name(Path::new("/src/app/views/admin/users/_form.html.erb")),
            "admin/users/_form"
        );
        assert_eq!(view_name(Path::new("templates/card.html.erb.json")), "card");
        assert_eq!(view_name(Path::new("show.erb")), "show");
        assert_eq!(view_name(Path::new("app/views")), "views");
    }

    #[test]
    fn test_error_line() {
        let error = IlxError::malformed_markup("unclosed <div>");
        assert_eq!(error_ilx("posts/index", &error), "view:posts/index\n!error:unclosed <div>");
    }
}

//! Element classification and the small string tables of the view pass

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElementKind {
    Layout,
    Container,
    Action,
    Text,
    Component,
    Input,
}

impl ElementKind {
    pub fn name(self) -> &'static str {
        match self {
            ElementKind::Layout => "layout",
            ElementKind::Container => "container",
            ElementKind::Action => "action",
            ElementKind::Text => "text",
            ElementKind::Component => "component",
            ElementKind::Input => "input",
        }
    }
}

const ACTION_TAGS: &[&str] = &["a", "button"];
const TEXT_TAGS: &[&str] = &[
    "h1", "h2", "h3", "h4", "h5", "h6", "p", "label", "span", "strong", "em", "small",
];
const COMPONENT_TAGS: &[&str] = &["form"];
const INPUT_TAGS: &[&str] = &["input", "textarea", "select"];

/// Attributes carried into the output
pub const KEPT_ATTRIBUTES: &[&str] = &["required", "disabled", "placeholder", "min", "max"];

/// Display helper → short formatter name
const FORMATTERS: &[(&str, &str)] = &[
    ("number_to_currency", "currency"),
    ("number_with_delimiter", "number"),
    ("number_to_percentage", "percent"),
    ("time_ago_in_words", "ago"),
    ("l", "date"),
    ("localize", "date"),
    ("truncate", "truncate"),
    ("pluralize", "plural"),
    ("simple_format", "para"),
    ("humanize", "humanize"),
];

pub const SELF_TARGET: &str = "#self";

static NAMED_ROUTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([a-z_][a-z0-9_]*?)_(?:path|url)\b").expect("route pattern compiles"));

/// Kind for a tag. `output_empty` is true while nothing has been recorded
/// yet; the first container-like element in that state is the layout.
pub fn classify(tag: &str, output_empty: bool) -> ElementKind {
    let tag = tag.to_ascii_lowercase();
    let tag = tag.as_str();
    if ACTION_TAGS.contains(&tag) {
        ElementKind::Action
    } else if TEXT_TAGS.contains(&tag) {
        ElementKind::Text
    } else if COMPONENT_TAGS.contains(&tag) {
        ElementKind::Component
    } else if INPUT_TAGS.contains(&tag) {
        ElementKind::Input
    } else if output_empty {
        ElementKind::Layout
    } else {
        ElementKind::Container
    }
}

pub fn formatter_for(helper: &str) -> Option<&'static str> {
    FORMATTERS
        .iter()
        .find(|(name, _)| *name == helper)
        .map(|(_, short)| *short)
}

/// Split `helper(arg, ...)` or `helper arg, ...` into the formatter name and
/// the first argument. Expressions that are not a known helper call pass
/// through unchanged.
pub fn unwrap_formatter(expression: &str) -> (String, Option<String>) {
    let expression = expression.trim();
    let name_end = expression
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(expression.len());
    let (helper, rest) = expression.split_at(name_end);

    let Some(formatter) = formatter_for(helper) else {
        return (expression.to_string(), None);
    };
    let args = match rest.strip_prefix('(') {
        Some(inner) => inner.strip_suffix(')').unwrap_or(inner),
        None if rest.starts_with(' ') => rest,
        None => return (expression.to_string(), None),
    };
    let first = first_argument(args).trim();
    if first.is_empty() {
        return (expression.to_string(), None);
    }
    (first.to_string(), Some(formatter.to_string()))
}

/// Text up to the first comma that is not nested in brackets or quotes
fn first_argument(args: &str) -> &str {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for (index, c) in args.char_indices() {
        match (quote, c) {
            (Some(open), c) if c == open => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '(' | '[' | '{') => depth += 1,
            (None, ')' | ']' | '}') => depth = depth.saturating_sub(1),
            (None, ',') if depth == 0 => return &args[..index],
            _ => {}
        }
    }
    args
}

/// Normalize a link or form target: fragments stay as they are, named routes
/// become `#route`, anything else is the current page.
pub fn action_target(value: &str) -> String {
    let value = value.trim();
    if value.starts_with('#') {
        return value.to_string();
    }
    match NAMED_ROUTE.captures(value).and_then(|caps| caps.get(1)) {
        Some(route) => format!("#{}", route.as_str()),
        None => SELF_TARGET.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert_eq!(classify("div", true), ElementKind::Layout);
        assert_eq!(classify("div", false), ElementKind::Container);
        assert_eq!(classify("a", true), ElementKind::Action);
        assert_eq!(classify("BUTTON", false), ElementKind::Action);
        assert_eq!(classify("h3", false), ElementKind::Text);
        assert_eq!(classify("form", true), ElementKind::Component);
        assert_eq!(classify("select", false), ElementKind::Input);
    }

    #[test]
    fn test_formatter_unwrapping() {
        assert_eq!(
            unwrap_formatter("number_to_currency(@order.total, unit: \"€\")"),
            ("@order.total".to_string(), Some("currency".to_string()))
        );
        assert_eq!(
            unwrap_formatter("time_ago_in_words post.created_at"),
            ("post.created_at".to_string(), Some("ago".to_string()))
        );
        assert_eq!(
            unwrap_formatter("truncate(format(a, b), length: 20)"),
            ("format(a, b)".to_string(), Some("truncate".to_string()))
        );
        assert_eq!(unwrap_formatter("post.title"), ("post.title".to_string(), None));
        assert_eq!(unwrap_formatter("link_to(x)"), ("link_to(x)".to_string(), None));
        assert_eq!(unwrap_formatter("l"), ("l".to_string(), None));
    }

    #[test]
    fn test_action_targets() {
        assert_eq!(action_target("#comments"), "#comments");
        assert_eq!(action_target("<%= posts_path %>"), "#posts");
        assert_eq!(action_target("edit_post_path(@post)"), "#edit_post");
        assert_eq!(action_target("root_url"), "#root");
        assert_eq!(action_target("https://example.com"), "#self");
        assert_eq!(action_target(""), "#self");
    }
}

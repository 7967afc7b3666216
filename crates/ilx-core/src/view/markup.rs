//! Parsed markup handed over by the template front end.
//!
//! Template directives are already reduced to [`Placeholder`] tokens. Block
//! directives are flat: an `IterationOpen` and its `BlockClose` are siblings
//! in the same child list, not parent and child.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{IlxError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placeholder {
    /// `<%= expression %>`
    Binding {
        expression: String,
        #[serde(default)]
        formatter: Option<String>,
    },
    /// `<% collection.each do |variable| %>`
    IterationOpen {
        collection: String,
        #[serde(default)]
        variable: Option<String>,
    },
    /// `<% if condition %>` / `<% unless condition %>`
    ConditionalOpen {
        condition: String,
        #[serde(default)]
        negated: bool,
    },
    /// `<% else %>` / `<% elsif ... %>`
    AlternateBranch,
    /// `<% end %>`
    BlockClose,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkupNode {
    Element {
        tag: String,
        #[serde(default)]
        attributes: IndexMap<String, String>,
        #[serde(default)]
        children: Vec<MarkupNode>,
    },
    Text(String),
    Template(Placeholder),
}

impl MarkupNode {
    pub fn element(tag: &str, attributes: &[(&str, &str)], children: Vec<MarkupNode>) -> Self {
        MarkupNode::Element {
            tag: tag.to_string(),
            attributes: attributes
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            children,
        }
    }

    pub fn text(text: &str) -> Self {
        MarkupNode::Text(text.to_string())
    }

    pub fn binding(expression: &str) -> Self {
        MarkupNode::Template(Placeholder::Binding {
            expression: expression.to_string(),
            formatter: None,
        })
    }

    pub fn each(collection: &str, variable: &str) -> Self {
        MarkupNode::Template(Placeholder::IterationOpen {
            collection: collection.to_string(),
            variable: Some(variable.to_string()),
        })
    }

    pub fn when(condition: &str) -> Self {
        MarkupNode::Template(Placeholder::ConditionalOpen {
            condition: condition.to_string(),
            negated: false,
        })
    }

    pub fn close() -> Self {
        MarkupNode::Template(Placeholder::BlockClose)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkupDocument {
    /// Problems reported by the markup parser
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub nodes: Vec<MarkupNode>,
}

impl MarkupDocument {
    pub fn new(nodes: Vec<MarkupNode>) -> Self {
        Self {
            errors: Vec::new(),
            nodes,
        }
    }

    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| IlxError::malformed_markup(e.to_string()))
    }

    /// Reject documents the parser flagged and elements without a tag
    pub fn validate(&self) -> Result<()> {
        if !self.errors.is_empty() {
            return Err(IlxError::malformed_markup(self.errors.join("; ")));
        }
        let mut stack: Vec<&MarkupNode> = self.nodes.iter().collect();
        while let Some(node) = stack.pop() {
            if let MarkupNode::Element { tag, children, .. } = node {
                if tag.trim().is_empty() {
                    return Err(IlxError::malformed_markup("element without a tag name"));
                }
                stack.extend(children);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_from_json() {
        let doc = MarkupDocument::from_json(
            r#"{"nodes": [
                {"element": {"tag": "p", "attributes": {"class": "lead"}, "children": [
                    {"text": "Hello"},
                    {"template": {"binding": {"expression": "@user.name"}}}
                ]}},
                {"template": "block_close"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(
            doc.nodes,
            vec![
                MarkupNode::element(
                    "p",
                    &[("class", "lead")],
                    vec![MarkupNode::text("Hello"), MarkupNode::binding("@user.name")]
                ),
                MarkupNode::close(),
            ]
        );
        assert!(doc.validate().is_ok());
    }

    #[test]
    fn test_invalid_documents() {
        assert!(MarkupDocument::from_json("{not json").is_err());

        let flagged = MarkupDocument {
            errors: vec!["unclosed <div>".to_string()],
            nodes: vec![],
        };
        assert!(flagged.validate().is_err());

        let untagged = MarkupDocument::new(vec![MarkupNode::element(
            "div",
            &[],
            vec![MarkupNode::element("", &[], vec![])],
        )]);
        assert!(untagged.validate().is_err());
    }
}

//! # View tree extraction
//!
//! Turns a parsed template into a flat, level-annotated list of elements,
//! iteration regions and conditional regions. Nesting is tracked with an
//! explicit level counter because template blocks open and close as
//! sibling tokens rather than as tree structure.

pub mod classify;
pub mod extractor;
pub mod markup;
pub mod render;


pub use classify::ElementKind;
pub use extractor::ViewExtractor;
pub use markup::{MarkupDocument, MarkupNode, Placeholder};
pub use render::{error_ilx, to_ilx, view_name};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
    pub expression: String,
    pub formatter: Option<String>,
}

impl Binding {
    pub fn new(expression: &str) -> Self {
        Self {
            expression: expression.to_string(),
            formatter: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    pub kind: ElementKind,
    pub binding: Option<Binding>,
    /// Static text absorbed by text elements
    pub literal: Option<String>,
    pub classes: Vec<String>,
    pub action: Option<String>,
    pub attributes: Vec<(String, String)>,
    pub level: usize,
}

impl Element {
    pub fn new(kind: ElementKind, level: usize) -> Self {
        Self {
            kind,
            binding: None,
            literal: None,
            classes: Vec::new(),
            action: None,
            attributes: Vec::new(),
            level,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViewRecord {
    Element(Element),
    Iterate {
        collection: String,
        variable: Option<String>,
        level: usize,
    },
    Condition {
        condition: String,
        negated: bool,
        level: usize,
    },
}

impl ViewRecord {
    pub fn level(&self) -> usize {
        match self {
            ViewRecord::Element(element) => element.level,
            ViewRecord::Iterate { level, .. } | ViewRecord::Condition { level, .. } => *level,
        }
    }
}

/// Parse, extract and render one markup document. Any failure becomes the
/// error line of the output.
pub fn view_ilx(name: &str, document: &str) -> String {
    let records = MarkupDocument::from_json(document)
        .and_then(|document| ViewExtractor::new().extract(&document));
    match records {
        Ok(records) => to_ilx(name, &records),
        Err(error) => error_ilx(name, &error),
    }
}

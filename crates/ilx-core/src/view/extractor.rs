use indexmap::IndexMap;
use tracing::debug;

use super::{
    classify::{self, ElementKind, KEPT_ATTRIBUTES, SELF_TARGET},
    Binding, Element, MarkupDocument, MarkupNode, Placeholder, ViewRecord,
};
use crate::Result;

/// Records start one level below the view header
const TOP_LEVEL: usize = 1;

#[derive(Debug, Default)]
pub struct ViewExtractor;

impl ViewExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, document: &MarkupDocument) -> Result<Vec<ViewRecord>> {
        document.validate()?;
        let mut walk = Walk::new();
        for node in &document.nodes {
            walk.node(node);
        }
        debug!(records = walk.records.len(), "extracted view tree");
        Ok(walk.records)
    }
}

/// Block region opened by an iteration or conditional placeholder
#[derive(Debug)]
struct Region {
    restore_level: usize,
    variable: Option<String>,
}

/// Mutable state of one extraction
struct Walk {
    records: Vec<ViewRecord>,
    level: usize,
    regions: Vec<Region>,
    /// Regions below this depth belong to an enclosing element
    region_floor: usize,
    form_actions: Vec<String>,
}

impl Walk {
    fn new() -> Self {
        Self {
            records: Vec::new(),
            level: TOP_LEVEL,
            regions: Vec::new(),
            region_floor: 0,
            form_actions: Vec::new(),
        }
    }

    fn node(&mut self, node: &MarkupNode) {
        match node {
            MarkupNode::Element {
                tag,
                attributes,
                children,
            } => self.element(tag, attributes, children),
            MarkupNode::Text(text) => {
                if let Some(text) = clean_text(text) {
                    let mut element = Element::new(ElementKind::Text, self.level);
                    element.literal = Some(text);
                    self.records.push(ViewRecord::Element(element));
                }
            }
            MarkupNode::Template(placeholder) => self.placeholder(placeholder),
        }
    }

    fn placeholder(&mut self, placeholder: &Placeholder) {
        match placeholder {
            Placeholder::Binding {
                expression,
                formatter,
            } => {
                let mut element = Element::new(ElementKind::Text, self.level);
                element.binding = Some(binding(expression, formatter.as_deref()));
                self.records.push(ViewRecord::Element(element));
            }
            Placeholder::IterationOpen {
                collection,
                variable,
            } => {
                self.records.push(ViewRecord::Iterate {
                    collection: collection.trim().to_string(),
                    variable: variable.clone(),
                    level: self.level,
                });
                self.open_region(variable.clone());
            }
            Placeholder::ConditionalOpen { condition, negated } => {
                self.records.push(ViewRecord::Condition {
                    condition: condition.trim().to_string(),
                    negated: *negated,
                    level: self.level,
                });
                self.open_region(None);
            }
            Placeholder::AlternateBranch => {}
            Placeholder::BlockClose => {
                if self.regions.len() > self.region_floor {
                    if let Some(region) = self.regions.pop() {
                        self.level = region.restore_level;
                    }
                }
            }
        }
    }

    fn open_region(&mut self, variable: Option<String>) {
        self.regions.push(Region {
            restore_level: self.level,
            variable,
        });
        self.level += 1;
    }

    fn loop_variable(&self) -> Option<&str> {
        self.regions
            .iter()
            .rev()
            .find_map(|region| region.variable.as_deref())
    }

    fn element(&mut self, tag: &str, attributes: &IndexMap<String, String>, children: &[MarkupNode]) {
        let kind = classify::classify(tag, self.records.is_empty());
        let level = self.level;
        let mut element = Element::new(kind, level);

        // The first binding among the direct children belongs to the element
        let bound_index = children.iter().position(|child| {
            matches!(child, MarkupNode::Template(Placeholder::Binding { .. }))
        });
        if let Some(MarkupNode::Template(Placeholder::Binding {
            expression,
            formatter,
        })) = bound_index.and_then(|index| children.get(index))
        {
            element.binding = Some(binding(expression, formatter.as_deref()));
        }

        // A bound text element keeps its static text as child records
        let absorbs_text = kind == ElementKind::Text && element.binding.is_none();
        if absorbs_text {
            let text: Vec<String> = children
                .iter()
                .filter_map(|child| match child {
                    MarkupNode::Text(text) => clean_text(text),
                    _ => None,
                })
                .collect();
            if !text.is_empty() {
                element.literal = Some(text.join(" "));
            }
        }

        if element.binding.is_none() && kind != ElementKind::Text {
            let fallback = match attributes.get("name") {
                Some(name) if kind == ElementKind::Input => Some(name.as_str()),
                _ => self.loop_variable(),
            };
            element.binding = fallback.map(Binding::new);
        }

        if let Some(class) = attributes.get("class") {
            element.classes = class.split_whitespace().map(str::to_string).collect();
        }

        if kind == ElementKind::Action {
            let target = match tag.to_ascii_lowercase().as_str() {
                "button" => attributes
                    .get("formaction")
                    .or_else(|| self.form_actions.last()),
                _ => attributes.get("href"),
            };
            element.action = Some(
                target
                    .map(|target| classify::action_target(target))
                    .unwrap_or_else(|| SELF_TARGET.to_string()),
            );
        }

        element.attributes = attributes
            .iter()
            .filter(|(name, _)| KEPT_ATTRIBUTES.contains(&name.as_str()))
            .map(|(name, value)| {
                let value = if value.trim().is_empty() {
                    "true".to_string()
                } else {
                    value.clone()
                };
                (name.clone(), value)
            })
            .collect();

        self.records.push(ViewRecord::Element(element));

        let is_form = kind == ElementKind::Component && tag.eq_ignore_ascii_case("form");
        if is_form {
            self.form_actions
                .push(attributes.get("action").cloned().unwrap_or_default());
        }

        // Children one level down; regions left open inside are dropped on exit
        let saved_floor = self.region_floor;
        self.region_floor = self.regions.len();
        self.level = level + 1;
        for (index, child) in children.iter().enumerate() {
            if Some(index) == bound_index {
                continue;
            }
            if absorbs_text && matches!(child, MarkupNode::Text(_)) {
                continue;
            }
            self.node(child);
        }
        self.regions.truncate(self.region_floor);
        self.region_floor = saved_floor;
        self.level = level;

        if is_form {
            self.form_actions.pop();
        }
    }
}

fn binding(expression: &str, formatter: Option<&str>) -> Binding {
    match formatter {
        Some(formatter) => Binding {
            expression: expression.trim().to_string(),
            formatter: Some(formatter.to_string()),
        },
        None => {
            let (expression, formatter) = classify::unwrap_formatter(expression);
            Binding {
                expression,
                formatter,
            }
        }
    }
}

/// Collapse whitespace; blank text yields nothing
fn clean_text(text: &str) -> Option<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    (!words.is_empty()).then(|| words.join(" "))
}

use std::collections::HashSet;

use tracing::debug;

use super::{
    miners,
    vocabulary::{self, classify, singularize},
    CallbackRecord, Direction, DomainModel, Entity, Feature, FeatureParam, FieldSlot,
    Relationship, ValidationRecord, CUSTOM_VALIDATION,
};
use crate::{
    ast::{ParamKind, SourceAst},
    signatures::Signatures,
};

/// Walks a source tree and builds a [`DomainModel`].
///
/// The extractor itself holds only configuration; the entity table is fresh
/// for every call to [`DomainExtractor::extract`].
pub struct DomainExtractor<'a> {
    signatures: Option<&'a Signatures>,
    model_superclasses: Vec<String>,
}

impl Default for DomainExtractor<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> DomainExtractor<'a> {
    pub fn new() -> Self {
        Self {
            signatures: None,
            model_superclasses: vocabulary::DEFAULT_MODEL_SUPERCLASSES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    pub fn with_signatures(mut self, signatures: &'a Signatures) -> Self {
        self.signatures = Some(signatures);
        self
    }

    pub fn with_model_superclasses(mut self, superclasses: Vec<String>) -> Self {
        self.model_superclasses = superclasses;
        self
    }

    pub fn extract(&self, tree: &SourceAst) -> DomainModel {
        let mut model = DomainModel::default();
        self.visit(tree, None, &mut model);
        debug!(
            entities = model.entities.len(),
            features = model.features.len(),
            "extracted domain model"
        );
        model
    }

    fn visit(&self, node: &SourceAst, namespace: Option<&str>, model: &mut DomainModel) {
        match node {
            SourceAst::Class {
                name,
                superclass,
                body,
                ..
            } => {
                let qualified = qualify(namespace, name);
                if superclass.as_deref().is_some_and(|s| self.is_model_superclass(s)) {
                    self.model_class(&qualified, body.as_deref(), model);
                } else if let Some(body) = body {
                    self.visit(body, Some(&qualified), model);
                }
            }
            SourceAst::Module { name, body, .. } => {
                if let Some(body) = body {
                    self.visit(body, Some(&qualify(namespace, name)), model);
                }
            }
            SourceAst::Statements(stmts) => {
                for stmt in stmts {
                    self.visit(stmt, namespace, model);
                }
            }
            SourceAst::Other { children, .. } => {
                for child in children {
                    self.visit(child, namespace, model);
                }
            }
            _ => {}
        }
    }

    fn is_model_superclass(&self, superclass: &str) -> bool {
        let superclass = superclass.trim_start_matches("::");
        self.model_superclasses.iter().any(|s| s == superclass)
    }

    fn model_class(&self, name: &str, body: Option<&SourceAst>, model: &mut DomainModel) {
        debug!(entity = name, "found model class");
        let entity = model
            .entities
            .entry(name.to_string())
            .or_insert_with(|| Entity::new(name));
        let Some(body) = body else {
            return;
        };

        let mut in_private = false;
        let mut hidden: HashSet<&str> = HashSet::new();
        let mut features = Vec::new();
        let mut nested = Vec::new();

        for stmt in body.statements() {
            match stmt {
                SourceAst::Call {
                    receiver: None,
                    name: call,
                    args,
                    ..
                } => {
                    if vocabulary::HIDING_VISIBILITY.contains(&call.as_str()) {
                        if args.is_empty() {
                            in_private = true;
                        }
                        // `private :a, :b` and `private def a`
                        for arg in args {
                            match arg {
                                SourceAst::Def { name, .. } => {
                                    hidden.insert(name);
                                }
                                other => hidden.extend(other.literal_name()),
                            }
                        }
                    } else if call == vocabulary::PUBLIC_VISIBILITY && args.is_empty() {
                        in_private = false;
                    } else {
                        declare(entity, call, args);
                    }
                }
                SourceAst::Def { .. } => {
                    if let Some(feature) = self.feature(stmt, name, in_private) {
                        features.push(feature);
                    }
                }
                SourceAst::Class { .. } | SourceAst::Module { .. } => nested.push(stmt),
                _ => {}
            }
        }

        model.features.extend(
            features
                .into_iter()
                .filter(|feature| !hidden.contains(feature.name.as_str())),
        );
        for stmt in nested {
            self.visit(stmt, Some(name), model);
        }
    }

    fn feature(&self, def: &SourceAst, owner: &str, in_private: bool) -> Option<Feature> {
        let SourceAst::Def {
            name,
            params,
            body,
            singleton,
            ..
        } = def
        else {
            return None;
        };
        if name.starts_with('_') || name == "initialize" || (in_private && !singleton) {
            return None;
        }

        let params = params
            .iter()
            .filter(|param| param.kind != ParamKind::Block)
            .map(|param| FeatureParam {
                name: param.name.clone(),
                required: param.kind.is_required(),
            })
            .collect();
        let result = self
            .signatures
            .and_then(|sigs| sigs.return_type(name))
            .unwrap_or(owner)
            .to_string();
        let (constraints, triggers) = match body.as_deref() {
            Some(body) => (miners::constraints(body), miners::triggers(body)),
            None => (Vec::new(), Vec::new()),
        };

        Some(Feature {
            name: name.clone(),
            owner: owner.to_string(),
            params,
            result,
            constraints,
            triggers,
        })
    }
}

fn qualify(namespace: Option<&str>, name: &str) -> String {
    match namespace {
        Some(namespace) => format!("{namespace}::{name}"),
        None => name.to_string(),
    }
}

/// Apply one class-body declaration to the entity
fn declare(entity: &mut Entity, call: &str, args: &[SourceAst]) {
    match call {
        vocabulary::BELONGS_TO => relationship(entity, Direction::BelongsTo, args),
        vocabulary::HAS_ONE => relationship(entity, Direction::OwnsOne, args),
        vocabulary::HAS_MANY => relationship(entity, Direction::OwnsMany, args),
        vocabulary::VALIDATES => validation(entity, leading_names(args), option_keys(args)),
        vocabulary::VALIDATE => {
            let methods = leading_names(args);
            if !methods.is_empty() {
                entity.validations.push(ValidationRecord {
                    attributes: methods,
                    kinds: vec![CUSTOM_VALIDATION.to_string()],
                });
            }
        }
        vocabulary::ENUM => enumeration(entity, args),
        _ => {
            if let Some(kind) = vocabulary::classic_validation_kind(call) {
                validation(entity, leading_names(args), vec![kind.to_string()]);
            } else if vocabulary::is_callback(call) {
                entity.callbacks.push(CallbackRecord {
                    hook: call.to_string(),
                    targets: leading_names(args),
                });
            }
        }
    }
}

fn relationship(entity: &mut Entity, direction: Direction, args: &[SourceAst]) {
    let Some(name) = args.first().and_then(SourceAst::literal_name) else {
        return;
    };
    let target = match option(args, "class_name").and_then(SourceAst::literal_name) {
        Some(class_name) => class_name.trim_start_matches("::").to_string(),
        None if direction == Direction::OwnsMany => classify(&singularize(name)),
        None => classify(name),
    };
    let optional = matches!(option(args, "optional"), Some(SourceAst::True))
        || matches!(option(args, "required"), Some(SourceAst::False));
    let dependent = option(args, "dependent")
        .is_some_and(|value| !matches!(value, SourceAst::Nil | SourceAst::False));

    if direction == Direction::BelongsTo {
        entity.set_slot(
            name,
            FieldSlot::Reference {
                target: target.clone(),
                optional,
            },
        );
    }
    entity.relationships.push(Relationship {
        direction,
        target,
        name: name.to_string(),
        optional,
        dependent,
    });
}

fn validation(entity: &mut Entity, attributes: Vec<String>, kinds: Vec<String>) {
    if attributes.is_empty() {
        return;
    }
    let record = ValidationRecord { attributes, kinds };
    let required = record.requires_presence();
    for attribute in &record.attributes {
        entity.add_scalar(attribute, required);
    }
    entity.validations.push(record);
}

fn enumeration(entity: &mut Entity, args: &[SourceAst]) {
    match args {
        // enum :status, [...] / enum :status, {...}
        [name, values, ..] if name.literal_name().is_some() => {
            if let (Some(name), Some(values)) = (name.literal_name(), enum_values(values)) {
                entity.set_slot(name, FieldSlot::Enumerated { values });
            }
        }
        // enum status: {...}, _prefix: true
        _ => {
            for (key, value) in hash_entries(args) {
                if let (Some(name), Some(values)) = (key.literal_name(), enum_values(value)) {
                    if !name.starts_with('_') {
                        entity.set_slot(name, FieldSlot::Enumerated { values });
                    }
                }
            }
        }
    }
}

fn enum_values(node: &SourceAst) -> Option<Vec<String>> {
    let names: Vec<String> = match node {
        SourceAst::Array { elements } => elements
            .iter()
            .filter_map(SourceAst::literal_name)
            .map(str::to_string)
            .collect(),
        SourceAst::Hash { entries } => entries
            .iter()
            .filter_map(|(key, _)| key.literal_name())
            .map(str::to_string)
            .collect(),
        _ => return None,
    };
    Some(names)
}

/// Symbol/string arguments before the first option hash
fn leading_names(args: &[SourceAst]) -> Vec<String> {
    args.iter()
        .map_while(SourceAst::literal_name)
        .map(str::to_string)
        .collect()
}

fn hash_entries(args: &[SourceAst]) -> impl Iterator<Item = (&SourceAst, &SourceAst)> {
    args.iter()
        .filter_map(|arg| match arg {
            SourceAst::Hash { entries } => Some(entries),
            _ => None,
        })
        .flatten()
        .map(|(key, value)| (key, value))
}

fn option<'a>(args: &'a [SourceAst], key: &str) -> Option<&'a SourceAst> {
    hash_entries(args)
        .find(|(k, _)| k.literal_name() == Some(key))
        .map(|(_, value)| value)
}

/// Keys of option hashes whose value is not switched off
fn option_keys(args: &[SourceAst]) -> Vec<String> {
    hash_entries(args)
        .filter(|(_, value)| !matches!(value, SourceAst::False | SourceAst::Nil))
        .filter_map(|(key, _)| key.literal_name())
        .map(str::to_string)
        .collect()
}

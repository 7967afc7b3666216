//! # Domain extraction
//!
//! Recognizes data-model classes in a source tree and summarizes them as
//! entities (fields, relationships, validations, lifecycle callbacks) and
//! features (public operations with the conditions they check and the side
//! effects they trigger).

pub mod extractor;
pub mod miners;
pub mod render;
pub mod vocabulary;


pub use extractor::DomainExtractor;
pub use render::to_ilx;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    OwnsOne,
    OwnsMany,
    BelongsTo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub direction: Direction,
    pub target: String,
    pub name: String,
    pub optional: bool,
    /// Lifecycle ownership (`dependent:` was declared)
    pub dependent: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldSlot {
    Scalar { required: bool },
    Enumerated { values: Vec<String> },
    /// Inline form of a belongs-to relationship
    Reference { target: String, optional: bool },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub slot: FieldSlot,
}

/// Kind recorded for `validate :method` declarations
pub const CUSTOM_VALIDATION: &str = "custom";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationRecord {
    pub attributes: Vec<String>,
    pub kinds: Vec<String>,
}

impl ValidationRecord {
    pub fn is_custom(&self) -> bool {
        self.kinds.iter().any(|kind| kind == CUSTOM_VALIDATION)
    }

    pub fn requires_presence(&self) -> bool {
        self.kinds.iter().any(|kind| kind.contains("presence"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackRecord {
    pub hook: String,
    pub targets: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    pub fields: Vec<Field>,
    pub relationships: Vec<Relationship>,
    pub validations: Vec<ValidationRecord>,
    pub callbacks: Vec<CallbackRecord>,
}

impl Entity {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Record a scalar attribute. A field that already exists keeps its
    /// position; scalars only ever gain the required marker, richer slots
    /// (references, enumerations) are left alone.
    pub fn add_scalar(&mut self, name: &str, required: bool) {
        match self.fields.iter_mut().find(|field| field.name == name) {
            Some(Field {
                slot: FieldSlot::Scalar { required: existing },
                ..
            }) => *existing |= required,
            Some(_) => {}
            None => self.fields.push(Field {
                name: name.to_string(),
                slot: FieldSlot::Scalar { required },
            }),
        }
    }

    /// Set the slot of a field, replacing whatever was recorded before
    pub fn set_slot(&mut self, name: &str, slot: FieldSlot) {
        match self.fields.iter_mut().find(|field| field.name == name) {
            Some(field) => field.slot = slot,
            None => self.fields.push(Field {
                name: name.to_string(),
                slot,
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureParam {
    pub name: String,
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feature {
    pub name: String,
    pub owner: String,
    pub params: Vec<FeatureParam>,
    pub result: String,
    pub constraints: Vec<String>,
    pub triggers: Vec<String>,
}

/// Everything extracted from one unit
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DomainModel {
    pub entities: IndexMap<String, Entity>,
    pub features: Vec<Feature>,
}

impl DomainModel {
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.features.is_empty()
    }

    pub fn entity(&self, name: &str) -> Option<&Entity> {
        self.entities.get(name)
    }
}

//! # Generic graph encoding
//!
//! Statement/expression trees are lowered into an append-only sequence of
//! nodes. A node is identified only by its position, and every reference it
//! holds points at an earlier position, so the result is a DAG without
//! forward edges.
//!
//! - [`NodeStore`]: the append-only sequence
//! - [`radix`]: base-36 reference tokens and payload layouts
//! - [`ops`]: operator/primitive symbol table
//! - [`GraphEncoder`]: the post-order tree walk
//! - [`serializer`]: rendering a store as one ILX line

pub mod encoder;
pub mod ops;
pub mod radix;
pub mod serializer;
pub mod store;


pub use encoder::{encode_tree, GraphEncoder};
pub use serializer::to_ilx;
pub use store::NodeStore;

use std::fmt;

use serde::{Deserialize, Serialize};

/// Single-letter semantic type code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeTag {
    /// S: string or symbol
    Str,
    /// I: integer/numeric
    Int,
    /// B: boolean
    Bool,
    /// U: unit/null
    Unit,
    /// A: array, or apply context for calls
    Array,
    /// H: map/table
    Hash,
    /// R: range
    Range,
}

impl TypeTag {
    pub fn letter(self) -> char {
        match self {
            TypeTag::Str => 'S',
            TypeTag::Int => 'I',
            TypeTag::Bool => 'B',
            TypeTag::Unit => 'U',
            TypeTag::Array => 'A',
            TypeTag::Hash => 'H',
            TypeTag::Range => 'R',
        }
    }

    pub fn from_letter(letter: char) -> Option<Self> {
        match letter {
            'S' => Some(TypeTag::Str),
            'I' => Some(TypeTag::Int),
            'B' => Some(TypeTag::Bool),
            'U' => Some(TypeTag::Unit),
            'A' => Some(TypeTag::Array),
            'H' => Some(TypeTag::Hash),
            'R' => Some(TypeTag::Range),
            _ => None,
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// Reference from one node's payload to a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ref {
    /// Position of an earlier node in the store
    Node(usize),
    /// Index into the active function's parameter table
    Param(usize),
}

impl Ref {
    pub fn node(self) -> Option<usize> {
        match self {
            Ref::Node(position) => Some(position),
            Ref::Param(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LiteralValue {
    Str(String),
    Symbol(String),
    Int(i64),
    Bool(bool),
    Unit,
}

impl LiteralValue {
    pub fn type_tag(&self) -> TypeTag {
        match self {
            LiteralValue::Str(_) | LiteralValue::Symbol(_) => TypeTag::Str,
            LiteralValue::Int(_) => TypeTag::Int,
            LiteralValue::Bool(_) => TypeTag::Bool,
            LiteralValue::Unit => TypeTag::Unit,
        }
    }
}

/// Source location attached to function nodes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    pub unit: String,
    pub line: u32,
    pub name: String,
}

impl Provenance {
    pub fn new(unit: &str, line: u32, name: &str) -> Self {
        Self {
            unit: unit.to_string(),
            line,
            name: name.to_string(),
        }
    }
}

/// Node kind together with its kind-specific payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    Literal(LiteralValue),
    Function {
        body: Option<Ref>,
        input: TypeTag,
        output: TypeTag,
    },
    Apply {
        op: String,
        args: Vec<Ref>,
    },
    Branch {
        condition: Ref,
        then_ref: Ref,
        else_ref: Ref,
    },
    Loop {
        condition: Ref,
        body: Ref,
    },
    RecordArray(Vec<Ref>),
    MapTable(Vec<(Ref, Ref)>),
    Range {
        from: Ref,
        to: Ref,
    },
}

impl NodeKind {
    /// Record letter used by the serializer
    pub fn letter(&self) -> char {
        match self {
            NodeKind::Literal(_) => 'L',
            NodeKind::Function { .. } => 'F',
            NodeKind::Apply { .. } => 'A',
            NodeKind::Branch { .. } => 'B',
            NodeKind::Loop { .. } => 'W',
            NodeKind::RecordArray(_) => 'V',
            NodeKind::MapTable(_) => 'M',
            NodeKind::Range { .. } => 'R',
        }
    }

    /// Every reference held by the payload, in payload order
    pub fn references(&self) -> Vec<Ref> {
        match self {
            NodeKind::Literal(_) => Vec::new(),
            NodeKind::Function { body, .. } => body.iter().copied().collect(),
            NodeKind::Apply { args, .. } => args.clone(),
            NodeKind::Branch {
                condition,
                then_ref,
                else_ref,
            } => vec![*condition, *then_ref, *else_ref],
            NodeKind::Loop { condition, body } => vec![*condition, *body],
            NodeKind::RecordArray(elements) => elements.clone(),
            NodeKind::MapTable(pairs) => pairs.iter().flat_map(|(k, v)| [*k, *v]).collect(),
            NodeKind::Range { from, to } => vec![*from, *to],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub kind: NodeKind,
    pub type_tag: TypeTag,
    pub provenance: Option<Provenance>,
}

impl Node {
    pub fn new(kind: NodeKind, type_tag: TypeTag) -> Self {
        Self {
            kind,
            type_tag,
            provenance: None,
        }
    }

    pub fn literal(value: LiteralValue) -> Self {
        let tag = value.type_tag();
        Self::new(NodeKind::Literal(value), tag)
    }

    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = Some(provenance);
        self
    }
}

//! Lightweight method signatures
//!
//! A companion signature file maps method names to parameter and return type
//! names. Parsing the signature language happens upstream; this module only
//! holds the resulting table and turns type names into ILX type tags.
//! A missing entry is never an error: callers fall back to default tags.

use std::{collections::HashMap, path::Path};

use serde::{Deserialize, Serialize};

use crate::{graph::TypeTag, Result};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MethodSignature {
    #[serde(default)]
    pub params: Vec<String>,
    #[serde(default)]
    pub returns: Option<String>,
}

/// Name → signature table, queried by method name only
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Signatures {
    methods: HashMap<String, MethodSignature>,
}

impl Signatures {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a JSON signature table
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn insert(&mut self, name: &str, signature: MethodSignature) {
        self.methods.insert(name.to_string(), signature);
    }

    pub fn get(&self, name: &str) -> Option<&MethodSignature> {
        self.methods.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// Tag of the declared return type, if the method is known
    pub fn return_tag(&self, name: &str) -> Option<TypeTag> {
        self.get(name)
            .and_then(|sig| sig.returns.as_deref())
            .map(type_tag_for)
    }

    /// Tag of the first declared parameter type, if any
    pub fn input_tag(&self, name: &str) -> Option<TypeTag> {
        self.get(name)
            .and_then(|sig| sig.params.first())
            .map(|ty| type_tag_for(ty))
    }

    /// Declared return type name
    pub fn return_type(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|sig| sig.returns.as_deref())
    }
}

/// Map a signature type name onto a type tag.
///
/// Generic arguments and nilability markers are ignored: `Array[String]` is
/// an array, `String?` is a string. Unknown class names are unit-typed.
pub fn type_tag_for(type_name: &str) -> TypeTag {
    let base = type_name
        .trim()
        .trim_end_matches('?')
        .split(['[', '<'])
        .next()
        .unwrap_or_default()
        .trim_start_matches("::");

    match base {
        "String" | "Symbol" | "string" | "symbol" => TypeTag::Str,
        "Integer" | "Float" | "Numeric" | "BigDecimal" | "Rational" | "int" | "float" => {
            TypeTag::Int
        }
        "bool" | "boolish" | "TrueClass" | "FalseClass" | "true" | "false" => TypeTag::Bool,
        "Array" | "Set" | "Enumerable" => TypeTag::Array,
        "Hash" => TypeTag::Hash,
        "Range" => TypeTag::Range,
        _ => TypeTag::Unit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_names_map_to_tags() {
        assert_eq!(type_tag_for("String"), TypeTag::Str);
        assert_eq!(type_tag_for("Integer"), TypeTag::Int);
        assert_eq!(type_tag_for("bool"), TypeTag::Bool);
        assert_eq!(type_tag_for("Array[User]"), TypeTag::Array);
        assert_eq!(type_tag_for("Hash[Symbol, untyped]"), TypeTag::Hash);
        assert_eq!(type_tag_for("String?"), TypeTag::Str);
        assert_eq!(type_tag_for("void"), TypeTag::Unit);
        assert_eq!(type_tag_for("User"), TypeTag::Unit);
    }

    #[test]
    fn test_load_from_json() {
        let sigs = Signatures::from_json(
            r#"{"total": {"params": ["Integer"], "returns": "Float"}, "name": {"returns": "String"}}"#,
        )
        .unwrap();
        assert_eq!(sigs.return_tag("total"), Some(TypeTag::Int));
        assert_eq!(sigs.input_tag("total"), Some(TypeTag::Int));
        assert_eq!(sigs.input_tag("name"), None);
        assert_eq!(sigs.return_type("name"), Some("String"));
        assert_eq!(sigs.return_tag("missing"), None);
    }
}

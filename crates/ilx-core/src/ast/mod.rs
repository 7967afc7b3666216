// Source tree consumed by the ILX passes
// Trees are produced by an external parser and handed over already built,
// usually as JSON documents deserialized into these types.

pub mod source_gen;
pub use source_gen::ToSource;

#[cfg(test)]
mod source_gen_tests;

use std::fmt;

use serde::{Deserialize, Serialize};

/// Parameter flavour of a method, block or lambda
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    /// def f(a)
    Required,
    /// def f(a = 1)
    Optional,
    /// def f(*rest)
    Rest,
    /// def f(a:)
    Keyword,
    /// def f(a: 1)
    OptionalKeyword,
    /// def f(**opts)
    KeywordRest,
    /// def f(&blk)
    Block,
}

impl ParamKind {
    /// Whether a caller must supply this parameter
    pub fn is_required(self) -> bool {
        matches!(self, ParamKind::Required | ParamKind::Keyword)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    #[serde(default = "Param::default_kind")]
    pub kind: ParamKind,
}

impl Param {
    pub fn required(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: ParamKind::Required,
        }
    }

    pub fn optional(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: ParamKind::Optional,
        }
    }

    fn default_kind() -> ParamKind {
        ParamKind::Required
    }
}

/// One `when` arm of a case expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhenClause {
    pub conditions: Vec<SourceAst>,
    #[serde(default)]
    pub body: Option<Box<SourceAst>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceAst {
    // Literals
    Integer(i64),
    Float(f64),
    Str(String),
    Symbol(String),
    True,
    False,
    Nil,
    InterpolatedString {
        parts: Vec<SourceAst>,
    },

    // Variables and constants
    LocalVariableRead {
        name: String,
    },
    LocalVariableWrite {
        name: String,
        value: Box<SourceAst>,
    },
    InstanceVariableRead {
        name: String,
    },
    InstanceVariableWrite {
        name: String,
        value: Box<SourceAst>,
    },
    ConstantRead {
        name: String,
    },

    // Calls and operators
    Call {
        #[serde(default)]
        receiver: Option<Box<SourceAst>>,
        name: String,
        #[serde(default)]
        args: Vec<SourceAst>,
        #[serde(default)]
        block: Option<Box<SourceAst>>,
    },
    And {
        left: Box<SourceAst>,
        right: Box<SourceAst>,
    },
    Or {
        left: Box<SourceAst>,
        right: Box<SourceAst>,
    },

    // Collections
    Array {
        elements: Vec<SourceAst>,
    },
    Hash {
        entries: Vec<(SourceAst, SourceAst)>,
    },
    Range {
        #[serde(default)]
        from: Option<Box<SourceAst>>,
        #[serde(default)]
        to: Option<Box<SourceAst>>,
        #[serde(default)]
        exclusive: bool,
    },

    // Control structures
    If {
        condition: Box<SourceAst>,
        #[serde(default)]
        then_branch: Option<Box<SourceAst>>,
        #[serde(default)]
        else_branch: Option<Box<SourceAst>>,
    },
    Unless {
        condition: Box<SourceAst>,
        #[serde(default)]
        then_branch: Option<Box<SourceAst>>,
        #[serde(default)]
        else_branch: Option<Box<SourceAst>>,
    },
    While {
        condition: Box<SourceAst>,
        #[serde(default)]
        body: Option<Box<SourceAst>>,
    },
    Until {
        condition: Box<SourceAst>,
        #[serde(default)]
        body: Option<Box<SourceAst>>,
    },
    Case {
        #[serde(default)]
        subject: Option<Box<SourceAst>>,
        whens: Vec<WhenClause>,
        #[serde(default)]
        else_branch: Option<Box<SourceAst>>,
    },
    Return {
        #[serde(default)]
        value: Option<Box<SourceAst>>,
    },

    // Function boundaries
    Def {
        name: String,
        #[serde(default)]
        params: Vec<Param>,
        #[serde(default)]
        body: Option<Box<SourceAst>>,
        #[serde(default)]
        line: u32,
        #[serde(default)]
        singleton: bool,
    },
    Block {
        #[serde(default)]
        params: Vec<Param>,
        #[serde(default)]
        body: Option<Box<SourceAst>>,
    },
    Lambda {
        #[serde(default)]
        params: Vec<Param>,
        #[serde(default)]
        body: Option<Box<SourceAst>>,
    },

    // Declarations
    Class {
        name: String,
        #[serde(default)]
        superclass: Option<String>,
        #[serde(default)]
        body: Option<Box<SourceAst>>,
        #[serde(default)]
        line: u32,
    },
    Module {
        name: String,
        #[serde(default)]
        body: Option<Box<SourceAst>>,
        #[serde(default)]
        line: u32,
    },

    // Statement sequence
    Statements(Vec<SourceAst>),

    /// Any node kind the front end knows and this crate does not.
    /// Only its children are visited.
    Other {
        kind: String,
        #[serde(default)]
        children: Vec<SourceAst>,
    },
}

// Helper methods
impl SourceAst {
    /// Direct children in source order
    pub fn children(&self) -> Vec<&SourceAst> {
        fn push<'a>(out: &mut Vec<&'a SourceAst>, node: &'a Option<Box<SourceAst>>) {
            if let Some(node) = node {
                out.push(node);
            }
        }

        let mut out: Vec<&SourceAst> = Vec::new();
        match self {
            SourceAst::Integer(_)
            | SourceAst::Float(_)
            | SourceAst::Str(_)
            | SourceAst::Symbol(_)
            | SourceAst::True
            | SourceAst::False
            | SourceAst::Nil
            | SourceAst::LocalVariableRead { .. }
            | SourceAst::InstanceVariableRead { .. }
            | SourceAst::ConstantRead { .. } => {}
            SourceAst::InterpolatedString { parts } => out.extend(parts),
            SourceAst::LocalVariableWrite { value, .. }
            | SourceAst::InstanceVariableWrite { value, .. } => out.push(value),
            SourceAst::Call {
                receiver,
                args,
                block,
                ..
            } => {
                push(&mut out, receiver);
                out.extend(args);
                push(&mut out, block);
            }
            SourceAst::And { left, right } | SourceAst::Or { left, right } => {
                out.push(left);
                out.push(right);
            }
            SourceAst::Array { elements } => out.extend(elements),
            SourceAst::Hash { entries } => {
                for (key, value) in entries {
                    out.push(key);
                    out.push(value);
                }
            }
            SourceAst::Range { from, to, .. } => {
                push(&mut out, from);
                push(&mut out, to);
            }
            SourceAst::If {
                condition,
                then_branch,
                else_branch,
            }
            | SourceAst::Unless {
                condition,
                then_branch,
                else_branch,
            } => {
                out.push(condition);
                push(&mut out, then_branch);
                push(&mut out, else_branch);
            }
            SourceAst::While { condition, body } | SourceAst::Until { condition, body } => {
                out.push(condition);
                push(&mut out, body);
            }
            SourceAst::Case {
                subject,
                whens,
                else_branch,
            } => {
                push(&mut out, subject);
                for when in whens {
                    out.extend(&when.conditions);
                    push(&mut out, &when.body);
                }
                push(&mut out, else_branch);
            }
            SourceAst::Return { value } => push(&mut out, value),
            SourceAst::Def { body, .. }
            | SourceAst::Block { body, .. }
            | SourceAst::Lambda { body, .. }
            | SourceAst::Class { body, .. }
            | SourceAst::Module { body, .. } => push(&mut out, body),
            SourceAst::Statements(stmts) => out.extend(stmts),
            SourceAst::Other { children, .. } => out.extend(children),
        }
        out
    }

    /// Pre-order walk over this node and everything below it.
    /// Uses an explicit stack so deep trees do not grow the call stack.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }

    /// Statements of a body, flattening a `Statements` wrapper
    pub fn statements(&self) -> &[SourceAst] {
        match self {
            SourceAst::Statements(stmts) => stmts,
            other => std::slice::from_ref(other),
        }
    }

    /// Name carried by a symbol or string literal
    pub fn literal_name(&self) -> Option<&str> {
        match self {
            SourceAst::Symbol(s) | SourceAst::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Check if this node is a literal value
    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            SourceAst::Integer(_)
                | SourceAst::Float(_)
                | SourceAst::Str(_)
                | SourceAst::Symbol(_)
                | SourceAst::True
                | SourceAst::False
                | SourceAst::Nil
        )
    }

    /// Convenience constructor for a receiver-less call
    pub fn call(name: &str, args: Vec<SourceAst>) -> Self {
        SourceAst::Call {
            receiver: None,
            name: name.to_string(),
            args,
            block: None,
        }
    }

    /// Convenience constructor for a call on a receiver
    pub fn method_call(receiver: SourceAst, name: &str, args: Vec<SourceAst>) -> Self {
        SourceAst::Call {
            receiver: Some(Box::new(receiver)),
            name: name.to_string(),
            args,
            block: None,
        }
    }

    pub fn local(name: &str) -> Self {
        SourceAst::LocalVariableRead {
            name: name.to_string(),
        }
    }

    pub fn constant(name: &str) -> Self {
        SourceAst::ConstantRead {
            name: name.to_string(),
        }
    }

    pub fn sym(name: &str) -> Self {
        SourceAst::Symbol(name.to_string())
    }

    pub fn str(value: &str) -> Self {
        SourceAst::Str(value.to_string())
    }
}

/// Iterator returned by [`SourceAst::descendants`]
pub struct Descendants<'a> {
    stack: Vec<&'a SourceAst>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a SourceAst;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children().into_iter().rev());
        Some(node)
    }
}

impl fmt::Display for SourceAst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceAst::Integer(n) => write!(f, "{n}"),
            SourceAst::Float(fl) => write!(f, "{fl}"),
            SourceAst::Str(s) => write!(f, "\"{s}\""),
            SourceAst::Symbol(s) => write!(f, ":{s}"),
            SourceAst::True => write!(f, "true"),
            SourceAst::False => write!(f, "false"),
            SourceAst::Nil => write!(f, "nil"),
            SourceAst::LocalVariableRead { name } => write!(f, "{name}"),
            SourceAst::InstanceVariableRead { name } => write!(f, "{name}"),
            SourceAst::ConstantRead { name } => write!(f, "{name}"),
            _ => write!(f, "<expression>"),
        }
    }
}

//! Generic graph encoder
//!
//! A single depth-first, post-order walk: every operand is appended before
//! the node that uses it, which is what keeps all references pointing
//! backwards. Unknown shapes never fail; their children are visited and the
//! node itself contributes nothing.

use std::collections::HashMap;

use tracing::{debug, trace};

use super::{
    ops, LiteralValue, Node, NodeKind, NodeStore, Provenance, Ref, TypeTag,
};
use crate::{
    ast::{Param, SourceAst, WhenClause},
    signatures::Signatures,
};

/// Name used for closures that appear outside any method definition
const TOP_LEVEL: &str = "main";

/// Traversal state of the active function or closure.
///
/// Replaced wholesale on every function boundary and restored on exit.
/// Conditionals and loops do not get their own scope, so an assignment in a
/// nested branch overwrites the enclosing binding.
#[derive(Debug, Clone, Default)]
struct Scope {
    locals: HashMap<String, Ref>,
    params: Vec<String>,
    provenance: Option<Provenance>,
}

pub struct GraphEncoder<'a> {
    unit: String,
    signatures: Option<&'a Signatures>,
    store: NodeStore,
    scope: Scope,
}

impl<'a> GraphEncoder<'a> {
    pub fn new(unit: &str) -> Self {
        Self {
            unit: unit.to_string(),
            signatures: None,
            store: NodeStore::new(),
            scope: Scope::default(),
        }
    }

    /// Consult a signature table for call and function type tags
    pub fn with_signatures(mut self, signatures: &'a Signatures) -> Self {
        self.signatures = Some(signatures);
        self
    }

    /// Encode one tree into a fresh node store
    pub fn encode(mut self, tree: &SourceAst) -> NodeStore {
        self.walk(tree);
        debug!(unit = %self.unit, nodes = self.store.len(), "encoded graph");
        self.store
    }

    fn walk(&mut self, ast: &SourceAst) -> Option<Ref> {
        match ast {
            // Literals
            SourceAst::Integer(n) => Some(self.literal(LiteralValue::Int(*n))),
            // Truncated toward zero; NaN becomes 0
            SourceAst::Float(f) => Some(self.literal(LiteralValue::Int(f.trunc() as i64))),
            SourceAst::Str(s) => Some(self.literal(LiteralValue::Str(s.clone()))),
            SourceAst::Symbol(s) => Some(self.literal(LiteralValue::Symbol(s.clone()))),
            SourceAst::True => Some(self.literal(LiteralValue::Bool(true))),
            SourceAst::False => Some(self.literal(LiteralValue::Bool(false))),
            SourceAst::Nil => Some(self.literal(LiteralValue::Unit)),
            SourceAst::InterpolatedString { parts } => Some(self.interpolation(parts)),

            // Variables
            SourceAst::LocalVariableRead { name } => Some(self.read_local(name)),
            SourceAst::LocalVariableWrite { name, value } => {
                let value = self.require(Some(value));
                self.scope.locals.insert(name.clone(), value);
                Some(value)
            }
            SourceAst::InstanceVariableRead { name } => {
                let slot = self.literal(LiteralValue::Symbol(name.clone()));
                Some(self.apply(ops::IVAR_READ, vec![slot], None))
            }
            SourceAst::InstanceVariableWrite { name, value } => {
                let slot = self.literal(LiteralValue::Symbol(name.clone()));
                let value = self.require(Some(value));
                Some(self.apply(ops::IVAR_WRITE, vec![slot, value], None))
            }
            SourceAst::ConstantRead { name } => {
                Some(self.literal(LiteralValue::Symbol(name.clone())))
            }

            // Calls
            SourceAst::Call {
                receiver,
                name,
                args,
                block,
            } => {
                let mut refs = Vec::with_capacity(args.len() + 2);
                if let Some(receiver) = receiver {
                    refs.push(self.require(Some(receiver)));
                }
                for arg in args {
                    refs.push(self.require(Some(arg)));
                }
                if let Some(block) = block {
                    refs.push(self.require(Some(block)));
                }
                Some(self.apply(name, refs, Some(name)))
            }
            SourceAst::And { left, right } => {
                let left = self.require(Some(left));
                let right = self.require(Some(right));
                Some(self.apply("&&", vec![left, right], None))
            }
            SourceAst::Or { left, right } => {
                let left = self.require(Some(left));
                let right = self.require(Some(right));
                Some(self.apply("||", vec![left, right], None))
            }

            // Collections
            SourceAst::Array { elements } => {
                let refs = elements.iter().map(|e| self.require(Some(e))).collect();
                Some(self.emit(Node::new(NodeKind::RecordArray(refs), TypeTag::Array)))
            }
            SourceAst::Hash { entries } => {
                let pairs = entries
                    .iter()
                    .map(|(key, value)| {
                        let key = self.require(Some(key));
                        let value = self.require(Some(value));
                        (key, value)
                    })
                    .collect();
                Some(self.emit(Node::new(NodeKind::MapTable(pairs), TypeTag::Hash)))
            }
            SourceAst::Range { from, to, .. } => {
                let from = self.require(from.as_deref());
                let to = self.require(to.as_deref());
                Some(self.emit(Node::new(NodeKind::Range { from, to }, TypeTag::Range)))
            }

            // Control flow
            SourceAst::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let condition = self.require(Some(condition));
                let then_ref = self.require(then_branch.as_deref());
                let else_ref = match else_branch {
                    Some(else_branch) => self.require(Some(else_branch)),
                    None => then_ref,
                };
                Some(self.branch(condition, then_ref, else_ref))
            }
            SourceAst::Unless {
                condition,
                then_branch,
                else_branch,
            } => {
                // Same walk order as `if`; the walked branches swap roles on emission
                let condition = self.require(Some(condition));
                let body = self.require(then_branch.as_deref());
                let alternate = match else_branch {
                    Some(else_branch) => self.require(Some(else_branch)),
                    None => self.literal(LiteralValue::Unit),
                };
                Some(self.branch(condition, alternate, body))
            }
            SourceAst::While { condition, body } => {
                let condition = self.require(Some(condition));
                let body = self.require(body.as_deref());
                Some(self.emit(Node::new(NodeKind::Loop { condition, body }, TypeTag::Unit)))
            }
            SourceAst::Until { condition, body } => {
                let condition = self.require(Some(condition));
                let condition = self.apply(ops::NOT, vec![condition], None);
                let body = self.require(body.as_deref());
                Some(self.emit(Node::new(NodeKind::Loop { condition, body }, TypeTag::Unit)))
            }
            SourceAst::Case {
                subject,
                whens,
                else_branch,
            } => self.case(subject.as_deref(), whens, else_branch.as_deref()),
            SourceAst::Return { value } => value.as_deref().and_then(|value| self.walk(value)),

            // Function boundaries
            SourceAst::Def {
                name,
                params,
                body,
                line,
                ..
            } => {
                let provenance = Provenance::new(&self.unit, *line, name);
                let default_input = if params.is_empty() {
                    TypeTag::Unit
                } else {
                    TypeTag::Array
                };
                let input = self
                    .signatures
                    .and_then(|sigs| sigs.input_tag(name))
                    .unwrap_or(default_input);
                let output = self
                    .signatures
                    .and_then(|sigs| sigs.return_tag(name))
                    .unwrap_or(TypeTag::Unit);
                Some(self.function(params, body.as_deref(), provenance, input, output))
            }
            SourceAst::Block { params, body } | SourceAst::Lambda { params, body } => {
                let provenance = self
                    .scope
                    .provenance
                    .clone()
                    .unwrap_or_else(|| Provenance::new(&self.unit, 0, TOP_LEVEL));
                let input = if params.is_empty() {
                    TypeTag::Unit
                } else {
                    TypeTag::Array
                };
                Some(self.function(params, body.as_deref(), provenance, input, TypeTag::Unit))
            }

            // Declarations contribute only what their bodies contain
            SourceAst::Class { body, .. } | SourceAst::Module { body, .. } => {
                if let Some(body) = body {
                    self.walk(body);
                }
                None
            }

            SourceAst::Statements(stmts) => {
                let mut last = None;
                for stmt in stmts {
                    last = self.walk(stmt);
                }
                last
            }

            SourceAst::Other { kind, children } => {
                trace!(kind = %kind, "visiting children of unrecognized node");
                for child in children {
                    self.walk(child);
                }
                None
            }
        }
    }

    /// Walk a child that must produce a value; absent or silent children
    /// become a nil literal.
    fn require(&mut self, ast: Option<&SourceAst>) -> Ref {
        match ast.and_then(|ast| self.walk(ast)) {
            Some(reference) => reference,
            None => self.literal(LiteralValue::Unit),
        }
    }

    fn emit(&mut self, node: Node) -> Ref {
        Ref::Node(self.store.append(node))
    }

    fn literal(&mut self, value: LiteralValue) -> Ref {
        self.emit(Node::literal(value))
    }

    /// Append an apply node. `signature_name` is consulted for the result tag
    /// when the operator table has none.
    fn apply(&mut self, name: &str, args: Vec<Ref>, signature_name: Option<&str>) -> Ref {
        let operator = ops::resolve(name);
        let tag = operator
            .tag
            .or_else(|| {
                signature_name
                    .zip(self.signatures)
                    .and_then(|(name, sigs)| sigs.return_tag(name))
            })
            .unwrap_or(TypeTag::Array);
        self.emit(Node::new(
            NodeKind::Apply {
                op: operator.symbol,
                args,
            },
            tag,
        ))
    }

    fn branch(&mut self, condition: Ref, then_ref: Ref, else_ref: Ref) -> Ref {
        let tag = self.tag_of(then_ref);
        self.emit(Node::new(
            NodeKind::Branch {
                condition,
                then_ref,
                else_ref,
            },
            tag,
        ))
    }

    fn tag_of(&self, reference: Ref) -> TypeTag {
        reference
            .node()
            .and_then(|position| self.store.get(position))
            .map(|node| node.type_tag)
            .unwrap_or(TypeTag::Unit)
    }

    fn read_local(&mut self, name: &str) -> Ref {
        if let Some(bound) = self.scope.locals.get(name) {
            return *bound;
        }
        if let Some(index) = self.scope.params.iter().position(|param| param == name) {
            return Ref::Param(index);
        }
        // Reading before any assignment yields a fresh zero value
        self.literal(LiteralValue::Int(0))
    }

    fn interpolation(&mut self, parts: &[SourceAst]) -> Ref {
        let Some((first, rest)) = parts.split_first() else {
            return self.literal(LiteralValue::Str(String::new()));
        };
        let mut acc = self.require(Some(first));
        // Each segment is joined onto the accumulator as soon as it is walked
        for part in rest {
            let next = self.require(Some(part));
            acc = self.apply(ops::CONCAT, vec![acc, next], None);
        }
        acc
    }

    /// Lower case/when into nested branches, built from the last arm back to
    /// the first so the first arm ends up outermost.
    fn case(
        &mut self,
        subject: Option<&SourceAst>,
        whens: &[WhenClause],
        else_branch: Option<&SourceAst>,
    ) -> Option<Ref> {
        let subject = subject.map(|subject| self.require(Some(subject)));
        let mut fallthrough = else_branch.map(|else_branch| self.require(Some(else_branch)));

        for when in whens.iter().rev() {
            let mut condition: Option<Ref> = None;
            for value in &when.conditions {
                let value = self.require(Some(value));
                let test = match subject {
                    Some(subject) => self.apply(ops::CASE_EQ, vec![subject, value], None),
                    None => value,
                };
                condition = Some(match condition {
                    Some(previous) => self.apply(ops::OR, vec![previous, test], None),
                    None => test,
                });
            }
            let condition = match condition {
                Some(condition) => condition,
                None => self.literal(LiteralValue::Bool(false)),
            };
            let body = self.require(when.body.as_deref());
            let else_ref = fallthrough.unwrap_or(body);
            fallthrough = Some(self.branch(condition, body, else_ref));
        }
        fallthrough
    }

    /// Shared lowering for methods, blocks and lambdas
    fn function(
        &mut self,
        params: &[Param],
        body: Option<&SourceAst>,
        provenance: Provenance,
        input: TypeTag,
        output: TypeTag,
    ) -> Ref {
        let inner = Scope {
            locals: HashMap::new(),
            params: params.iter().map(|param| param.name.clone()).collect(),
            provenance: Some(provenance.clone()),
        };
        let outer = std::mem::replace(&mut self.scope, inner);

        let start = self.store.next_position();
        if let Some(body) = body {
            self.walk(body);
        }
        let end = self.store.next_position();
        self.scope = outer;

        // The function points at the last node its body appended
        let body = (end > start).then(|| Ref::Node(end - 1));
        self.emit(
            Node::new(
                NodeKind::Function {
                    body,
                    input,
                    output,
                },
                output,
            )
            .with_provenance(provenance),
        )
    }
}

/// Encode a tree with an optional signature table
pub fn encode_tree(unit: &str, tree: &SourceAst, signatures: Option<&Signatures>) -> NodeStore {
    let encoder = GraphEncoder::new(unit);
    match signatures {
        Some(signatures) => encoder.with_signatures(signatures).encode(tree),
        None => encoder.encode(tree),
    }
}

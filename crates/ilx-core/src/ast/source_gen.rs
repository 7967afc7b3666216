// Source text generation from the tree
// Used wherever an ILX record carries an expression verbatim (domain
// constraints, trigger receivers), so the text reads like the source it came from.

use super::*;

/// Trait for types that can generate their source code representation
pub trait ToSource {
    fn to_source(&self) -> String;
}

/// Binary operators rendered infix
const INFIX_OPERATORS: &[&str] = &[
    "+", "-", "*", "/", "%", "**", "==", "!=", "<", ">", "<=", ">=", "===", "<=>", "<<", "=~",
];

fn join_sources(nodes: &[SourceAst]) -> String {
    nodes
        .iter()
        .map(|node| node.to_source())
        .collect::<Vec<_>>()
        .join(", ")
}

fn body_source(body: &Option<Box<SourceAst>>) -> String {
    match body {
        Some(body) => body
            .statements()
            .iter()
            .map(|stmt| stmt.to_source())
            .collect::<Vec<_>>()
            .join("; "),
        None => String::new(),
    }
}

impl ToSource for Param {
    fn to_source(&self) -> String {
        match self.kind {
            ParamKind::Required => self.name.clone(),
            ParamKind::Optional => format!("{} = ...", self.name),
            ParamKind::Rest => format!("*{}", self.name),
            ParamKind::Keyword => format!("{}:", self.name),
            ParamKind::OptionalKeyword => format!("{}: ...", self.name),
            ParamKind::KeywordRest => format!("**{}", self.name),
            ParamKind::Block => format!("&{}", self.name),
        }
    }
}

impl ToSource for SourceAst {
    fn to_source(&self) -> String {
        match self {
            // Literals
            SourceAst::Integer(n) => n.to_string(),
            SourceAst::Float(f) => f.to_string(),
            SourceAst::Str(s) => format!("\"{}\"", escape_string(s)),
            SourceAst::Symbol(s) => format!(":{s}"),
            SourceAst::True => "true".to_string(),
            SourceAst::False => "false".to_string(),
            SourceAst::Nil => "nil".to_string(),
            SourceAst::InterpolatedString { parts } => {
                let mut result = String::from("\"");
                for part in parts {
                    match part {
                        SourceAst::Str(s) => result.push_str(&escape_string(s)),
                        other => result.push_str(&format!("#{{{}}}", other.to_source())),
                    }
                }
                result.push('"');
                result
            }

            // Variables
            SourceAst::LocalVariableRead { name }
            | SourceAst::InstanceVariableRead { name }
            | SourceAst::ConstantRead { name } => name.clone(),
            SourceAst::LocalVariableWrite { name, value }
            | SourceAst::InstanceVariableWrite { name, value } => {
                format!("{} = {}", name, value.to_source())
            }

            // Calls
            SourceAst::Call {
                receiver,
                name,
                args,
                block,
            } => {
                let mut result = match (receiver, name.as_str(), args.as_slice()) {
                    (Some(recv), "!", []) => format!("!{}", recv.to_source()),
                    (Some(recv), "-@", []) => format!("-{}", recv.to_source()),
                    (Some(recv), "[]", _) => format!("{}[{}]", recv.to_source(), join_sources(args)),
                    (Some(recv), op, [rhs]) if INFIX_OPERATORS.contains(&op) => {
                        format!("{} {} {}", recv.to_source(), op, rhs.to_source())
                    }
                    (Some(recv), _, []) => format!("{}.{}", recv.to_source(), name),
                    (Some(recv), _, _) => {
                        format!("{}.{}({})", recv.to_source(), name, join_sources(args))
                    }
                    (None, _, []) => name.clone(),
                    (None, _, _) => format!("{}({})", name, join_sources(args)),
                };
                if let Some(block) = block {
                    result.push(' ');
                    result.push_str(&block.to_source());
                }
                result
            }
            SourceAst::And { left, right } => {
                format!("{} && {}", left.to_source(), right.to_source())
            }
            SourceAst::Or { left, right } => {
                format!("{} || {}", left.to_source(), right.to_source())
            }

            // Collections
            SourceAst::Array { elements } => format!("[{}]", join_sources(elements)),
            SourceAst::Hash { entries } => {
                let entries_str = entries
                    .iter()
                    .map(|(k, v)| match k {
                        SourceAst::Symbol(key) => format!("{}: {}", key, v.to_source()),
                        other => format!("{} => {}", other.to_source(), v.to_source()),
                    })
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{{{entries_str}}}")
            }
            SourceAst::Range {
                from,
                to,
                exclusive,
            } => {
                let from = from.as_ref().map(|f| f.to_source()).unwrap_or_default();
                let to = to.as_ref().map(|t| t.to_source()).unwrap_or_default();
                let dots = if *exclusive { "..." } else { ".." };
                format!("({from}{dots}{to})")
            }

            // Control flow
            SourceAst::If {
                condition,
                then_branch,
                else_branch,
            } => conditional_source("if", condition, then_branch, else_branch),
            SourceAst::Unless {
                condition,
                then_branch,
                else_branch,
            } => conditional_source("unless", condition, then_branch, else_branch),
            SourceAst::While { condition, body } => {
                format!("while {}; {}; end", condition.to_source(), body_source(body))
            }
            SourceAst::Until { condition, body } => {
                format!("until {}; {}; end", condition.to_source(), body_source(body))
            }
            SourceAst::Case {
                subject,
                whens,
                else_branch,
            } => {
                let mut result = String::from("case");
                if let Some(subject) = subject {
                    result.push_str(&format!(" {}", subject.to_source()));
                }
                for when in whens {
                    result.push_str(&format!(
                        "; when {} then {}",
                        join_sources(&when.conditions),
                        body_source(&when.body)
                    ));
                }
                if else_branch.is_some() {
                    result.push_str(&format!("; else {}", body_source(else_branch)));
                }
                result.push_str("; end");
                result
            }
            SourceAst::Return { value } => match value {
                Some(val) => format!("return {}", val.to_source()),
                None => "return".to_string(),
            },

            // Function boundaries
            SourceAst::Def {
                name,
                params,
                body,
                singleton,
                ..
            } => {
                let prefix = if *singleton { "self." } else { "" };
                let params_str = params
                    .iter()
                    .map(|p| p.to_source())
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("def {prefix}{name}({params_str}); {}; end", body_source(body))
            }
            SourceAst::Block { params, body } => {
                let params_str = params
                    .iter()
                    .map(|p| p.to_source())
                    .collect::<Vec<_>>()
                    .join(", ");
                if params.is_empty() {
                    format!("{{ {} }}", body_source(body))
                } else {
                    format!("{{ |{}| {} }}", params_str, body_source(body))
                }
            }
            SourceAst::Lambda { params, body } => {
                let params_str = params
                    .iter()
                    .map(|p| p.to_source())
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("->({}) {{ {} }}", params_str, body_source(body))
            }

            // Declarations
            SourceAst::Class {
                name, superclass, ..
            } => match superclass {
                Some(parent) => format!("class {name} < {parent}"),
                None => format!("class {name}"),
            },
            SourceAst::Module { name, .. } => format!("module {name}"),

            SourceAst::Statements(stmts) => stmts
                .iter()
                .map(|stmt| stmt.to_source())
                .collect::<Vec<_>>()
                .join("; "),
            SourceAst::Other { kind, .. } => format!("<{kind}>"),
        }
    }
}

fn conditional_source(
    keyword: &str,
    condition: &SourceAst,
    then_branch: &Option<Box<SourceAst>>,
    else_branch: &Option<Box<SourceAst>>,
) -> String {
    let mut result = format!("{keyword} {}; {}", condition.to_source(), body_source(then_branch));
    if else_branch.is_some() {
        result.push_str(&format!("; else {}", body_source(else_branch)));
    }
    result.push_str("; end");
    result
}

fn escape_string(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\t', "\\t")
}

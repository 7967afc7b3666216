//! Constraint and trigger mining over a method body.
//!
//! Both miners run a pre-order worklist walk ([`SourceAst::descendants`]), so
//! results come out in source order no matter how deep the body nests.

use super::vocabulary;
use crate::ast::{SourceAst, ToSource};

/// Predicates guarding the body: one entry per `if` (its condition source)
/// and per `unless` (the negated condition).
pub fn constraints(body: &SourceAst) -> Vec<String> {
    body.descendants()
        .filter_map(|node| match node {
            SourceAst::If { condition, .. } => Some(condition.to_source()),
            SourceAst::Unless { condition, .. } => Some(format!("!({})", condition.to_source())),
            _ => None,
        })
        .collect()
}

/// Side-effecting calls in the body: trigger names, and any call on a
/// mailer or job constant
pub fn triggers(body: &SourceAst) -> Vec<String> {
    body.descendants()
        .filter_map(|node| {
            let SourceAst::Call { receiver, name, .. } = node else {
                return None;
            };
            let constant = match receiver.as_deref() {
                Some(SourceAst::ConstantRead { name: constant }) => Some(constant),
                _ => None,
            };
            let triggered = vocabulary::is_trigger(name)
                || constant.is_some_and(|constant| vocabulary::is_trigger_receiver(constant));
            if !triggered {
                return None;
            }
            let name = name.trim_end_matches('!');
            Some(match constant {
                Some(constant) => format!("{constant}.{name}"),
                None => name.to_string(),
            })
        })
        .collect()
}

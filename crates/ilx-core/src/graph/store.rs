use serde::{Deserialize, Serialize};

use super::{Node, Ref};

/// Append-only node sequence. Positions are 0-based and never reassigned.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeStore {
    nodes: Vec<Node>,
}

impl NodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node and return the position it was written at
    pub fn append(&mut self, node: Node) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    pub fn get(&self, position: usize) -> Option<&Node> {
        self.nodes.get(position)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Position the next append will receive
    pub fn next_position(&self) -> usize {
        self.nodes.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &Node)> {
        self.nodes.iter().enumerate()
    }

    /// First node holding a reference to itself or to a later position
    pub fn first_forward_reference(&self) -> Option<(usize, Ref)> {
        self.iter().find_map(|(position, node)| {
            node.kind
                .references()
                .into_iter()
                .find(|r| matches!(r, Ref::Node(target) if *target >= position))
                .map(|r| (position, r))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{LiteralValue, NodeKind, TypeTag};

    #[test]
    fn test_append_returns_positions() {
        let mut store = NodeStore::new();
        assert_eq!(store.append(Node::literal(LiteralValue::Int(1))), 0);
        assert_eq!(store.append(Node::literal(LiteralValue::Int(2))), 1);
        assert_eq!(store.next_position(), 2);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_forward_reference_detection() {
        let mut store = NodeStore::new();
        store.append(Node::literal(LiteralValue::Int(1)));
        store.append(Node::new(
            NodeKind::Apply {
                op: "+".to_string(),
                args: vec![Ref::Node(0), Ref::Param(4)],
            },
            TypeTag::Int,
        ));
        assert_eq!(store.first_forward_reference(), None);

        store.append(Node::new(
            NodeKind::Loop {
                condition: Ref::Node(0),
                body: Ref::Node(2),
            },
            TypeTag::Unit,
        ));
        assert_eq!(store.first_forward_reference(), Some((2, Ref::Node(2))));
    }
}

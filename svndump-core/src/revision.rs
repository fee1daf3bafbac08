//! A revision: its number, its property set, and the ordered nodes within it.

use std::collections::HashMap;

use crate::node::{Node, NodeAction};
use crate::propset::PropertySet;

/// `(revision number, property set, ordered list of nodes)`.
#[derive(Debug, Clone)]
pub struct Revision {
    number: u64,
    properties: PropertySet,
    nodes: Vec<Node>,
}

impl Revision {
    pub fn new(number: u64, properties: PropertySet) -> Self {
        Revision {
            number,
            properties,
            nodes: Vec::new(),
        }
    }

    pub fn number(&self) -> u64 {
        self.number
    }

    pub fn properties(&self) -> &PropertySet {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> &mut PropertySet {
        &mut self.properties
    }

    pub fn set_properties(&mut self, props: PropertySet) {
        self.properties = props;
    }

    pub fn date(&self) -> &str {
        self.properties.get_str("svn:date").unwrap_or("")
    }

    pub fn author(&self) -> &str {
        self.properties.get_str("svn:author").unwrap_or("")
    }

    pub fn log(&self) -> &str {
        self.properties.get_str("svn:log").unwrap_or("")
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> &mut Vec<Node> {
        &mut self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, i: usize) -> Option<&Node> {
        self.nodes.get(i)
    }

    pub fn push_node(&mut self, node: Node) {
        self.nodes.push(node);
    }

    /// Nodes whose path matches and whose action's first letter is in `actions`.
    pub fn get_nodes_by_path<'a>(
        &'a self,
        path: &'a str,
        actions: &'a [char],
    ) -> impl Iterator<Item = &'a Node> + 'a {
        self.nodes.iter().filter(move |n| {
            n.path() == path && actions.contains(&n.action().letter())
        })
    }

    /// Index nodes by `(action letter, path)`, as used by the diff tool to
    /// align nodes with identical identity across two dumps.
    pub fn index(&self) -> HashMap<(char, &str), usize> {
        let mut map = HashMap::with_capacity(self.nodes.len());
        for (i, n) in self.nodes.iter().enumerate() {
            map.insert((n.action().letter(), n.path()), i);
        }
        map
    }
}

pub fn action_letters(actions: &[NodeAction]) -> Vec<char> {
    actions.iter().map(|a| a.letter()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeKind;

    #[test]
    fn get_nodes_by_path_filters_by_action_letter() {
        let mut rev = Revision::new(1, PropertySet::new());
        rev.push_node(Node::new("a", NodeAction::Add, Some(NodeKind::File)).unwrap());
        rev.push_node(Node::new("a", NodeAction::Delete, None).unwrap());
        rev.push_node(Node::new("b", NodeAction::Add, Some(NodeKind::File)).unwrap());
        let found: Vec<_> = rev.get_nodes_by_path("a", &['A']).collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].action(), NodeAction::Add);
    }

    #[test]
    fn index_keys_by_action_letter_and_path() {
        let mut rev = Revision::new(1, PropertySet::new());
        rev.push_node(Node::new("a", NodeAction::Add, Some(NodeKind::File)).unwrap());
        let idx = rev.index();
        assert_eq!(idx.get(&('A', "a")), Some(&0));
    }
}

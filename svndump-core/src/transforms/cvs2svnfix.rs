//! Repairs nodes with a missing `Node-kind:` — a quirk of dumps produced by
//! older cvs2svn versions — by consulting a path→kind history built up as
//! the dump is walked.

use std::collections::HashMap;

use crate::error::Result;
use crate::node::NodeKind;
use crate::reader::DumpReader;
use crate::transform::Transformation;

#[derive(Default)]
pub struct Cvs2SvnFix {
    history: HashMap<String, NodeKind>,
}

impl Cvs2SvnFix {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Transformation for Cvs2SvnFix {
    fn apply(&mut self, reader: &mut DumpReader) -> Result<()> {
        let Some(rev) = reader.current_mut() else {
            return Ok(());
        };
        for node in rev.nodes_mut() {
            if let Some(kind) = node.kind() {
                self.history.insert(node.path().to_string(), kind);
                continue;
            }
            let lookup_path = node
                .copy_from()
                .map(|(path, _)| path.clone())
                .unwrap_or_else(|| node.path().to_string());
            let repaired = self.history.get(&lookup_path).copied().unwrap_or(NodeKind::Dir);
            node.set_kind(Some(repaired));
            self.history.insert(node.path().to_string(), repaired);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Node, NodeAction};
    use crate::propset::PropertySet;
    use crate::revision::Revision;

    #[test]
    fn repairs_missing_kind_from_copy_from_history() {
        let mut history = HashMap::new();
        history.insert("trunk/lib".to_string(), NodeKind::Dir);
        let mut fix = Cvs2SvnFix { history };

        let mut rev = Revision::new(2, PropertySet::new());
        let mut n = Node::new("branches/b/lib", NodeAction::Add, None).unwrap();
        n.set_copy_from("trunk/lib", 1).unwrap();
        rev.push_node(n);

        for node in rev.nodes_mut() {
            if node.kind().is_none() {
                let lookup = node.copy_from().map(|(p, _)| p.clone()).unwrap();
                let kind = fix.history.get(&lookup).copied().unwrap_or(NodeKind::Dir);
                node.set_kind(Some(kind));
            }
        }
        assert_eq!(rev.node(0).unwrap().kind(), Some(NodeKind::Dir));
    }
}

//! Node-property regex replace, across add/replace/change nodes.

use regex::Regex;

use crate::error::Result;
use crate::node::NodeAction;
use crate::reader::DumpReader;
use crate::transform::Transformation;

pub struct NodePropReplace {
    pub name: String,
    pub pattern: Regex,
    pub replacement: String,
}

impl NodePropReplace {
    pub fn new(name: impl Into<String>, pattern: Regex, replacement: impl Into<String>) -> Self {
        NodePropReplace {
            name: name.into(),
            pattern,
            replacement: replacement.into(),
        }
    }
}

impl Transformation for NodePropReplace {
    fn apply(&mut self, reader: &mut DumpReader) -> Result<()> {
        let Some(rev) = reader.current_mut() else {
            return Ok(());
        };
        for node in rev.nodes_mut() {
            if !matches!(node.action(), NodeAction::Add | NodeAction::Replace | NodeAction::Change) {
                continue;
            }
            let Some(props) = node.properties() else {
                continue;
            };
            let Some(current) = props.get_str(&self.name) else {
                continue;
            };
            if self.pattern.is_match(current) {
                let replaced = self.pattern.replace_all(current, self.replacement.as_str()).into_owned();
                node.properties_mut().set(self.name.clone(), replaced);
            }
        }
        Ok(())
    }
}

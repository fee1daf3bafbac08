//! Content replacement and property deletion pinned to a (revision, path) pair.

use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;

use crate::date::md5_hex;
use crate::error::Result;
use crate::reader::DumpReader;
use crate::transform::Transformation;

#[derive(Default)]
pub struct ContentEdit {
    pub new_content: Option<Vec<u8>>,
    pub delete_properties: Vec<String>,
}

pub struct ContentReplace {
    pub edits: HashMap<(u64, String), ContentEdit>,
    pub tmp_dir: PathBuf,
}

impl ContentReplace {
    pub fn new(tmp_dir: PathBuf) -> Self {
        ContentReplace {
            edits: HashMap::new(),
            tmp_dir,
        }
    }
}

impl Transformation for ContentReplace {
    fn apply(&mut self, reader: &mut DumpReader) -> Result<()> {
        let Some(rev) = reader.current_mut() else {
            return Ok(());
        };
        let rev_number = rev.number();
        for node in rev.nodes_mut() {
            let Some(edit) = self.edits.get(&(rev_number, node.path().to_string())) else {
                continue;
            };
            if let Some(content) = &edit.new_content {
                let md5 = md5_hex(content);
                let mut tmp = tempfile::NamedTempFile::new_in(&self.tmp_dir)?;
                tmp.write_all(content)?;
                let (file, tmp_path) = tmp.keep().map_err(|e| e.error)?;
                drop(file);
                node.set_text_from_file(tmp_path, true, Some(content.len() as u64), Some(md5))?;
            }
            for name in &edit.delete_properties {
                node.properties_mut().remove(name);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Node, NodeAction, NodeKind};
    use crate::propset::PropertySet;
    use crate::revision::Revision;

    #[test]
    fn deletes_requested_properties() {
        let mut rev = Revision::new(1, PropertySet::new());
        let mut n = Node::new("a", NodeAction::Add, Some(NodeKind::File)).unwrap();
        n.set_property("k", "v").unwrap();
        rev.push_node(n);

        let mut edits = HashMap::new();
        edits.insert(
            (1, "a".to_string()),
            ContentEdit {
                new_content: None,
                delete_properties: vec!["k".to_string()],
            },
        );
        let mut cr = ContentReplace {
            edits,
            tmp_dir: std::env::temp_dir(),
        };
        for node in rev.nodes_mut() {
            if let Some(edit) = cr.edits.get(&(1, node.path().to_string())) {
                for name in &edit.delete_properties {
                    node.properties_mut().remove(name);
                }
            }
        }
        assert!(!rev.node(0).unwrap().properties().unwrap().contains("k"));
    }
}

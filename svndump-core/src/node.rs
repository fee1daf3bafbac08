//! A single add/change/delete/replace operation on one repository path.

use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::date::is_valid_md5_hex;
use crate::error::{Error, Result};
use crate::propset::PropertySet;
use crate::text::TextRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeAction {
    Add,
    Change,
    Delete,
    Replace,
}

impl NodeAction {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeAction::Add => "add",
            NodeAction::Change => "change",
            NodeAction::Delete => "delete",
            NodeAction::Replace => "replace",
        }
    }

    pub fn from_str(s: &str) -> Option<NodeAction> {
        match s {
            "add" => Some(NodeAction::Add),
            "change" => Some(NodeAction::Change),
            "delete" => Some(NodeAction::Delete),
            "replace" => Some(NodeAction::Replace),
            _ => None,
        }
    }

    /// First letter, uppercased — the identity key used by the node index.
    pub fn letter(self) -> char {
        self.as_str().chars().next().unwrap().to_ascii_uppercase()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    File,
    Dir,
}

impl NodeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::File => "file",
            NodeKind::Dir => "dir",
        }
    }

    pub fn from_str(s: &str) -> Option<NodeKind> {
        match s {
            "file" => Some(NodeKind::File),
            "dir" => Some(NodeKind::Dir),
            _ => None,
        }
    }
}

/// One node record. `kind` is `None` only when `action == Delete`, or
/// transiently for an `add` whose producer omitted `Node-kind:` (§4.D).
#[derive(Debug, Clone)]
pub struct Node {
    path: String,
    action: NodeAction,
    kind: Option<NodeKind>,
    copy_from: Option<(String, u64)>,
    properties: Option<PropertySet>,
    text: Option<TextRef>,
}

impl Node {
    pub fn new(path: impl Into<String>, action: NodeAction, kind: Option<NodeKind>) -> Result<Node> {
        let path = strip_leading_slash(path.into());
        if path.is_empty() {
            return Err(Error::InvalidArgument("node path must not be empty".into()));
        }
        if action == NodeAction::Delete && kind.is_some() {
            return Err(Error::InvalidArgument(
                "delete nodes carry no kind".into(),
            ));
        }
        Ok(Node {
            path,
            action,
            kind,
            copy_from: None,
            properties: None,
            text: None,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn set_path(&mut self, path: impl Into<String>) {
        self.path = strip_leading_slash(path.into());
    }

    pub fn action(&self) -> NodeAction {
        self.action
    }

    pub fn kind(&self) -> Option<NodeKind> {
        self.kind
    }

    pub fn set_kind(&mut self, kind: Option<NodeKind>) {
        self.kind = kind;
    }

    pub fn copy_from(&self) -> Option<&(String, u64)> {
        self.copy_from.as_ref()
    }

    pub fn set_copy_from(&mut self, path: impl Into<String>, rev: u64) -> Result<()> {
        if !matches!(self.action, NodeAction::Add | NodeAction::Replace) {
            return Err(Error::InvalidArgument(
                "copy-from is legal only on add or replace".into(),
            ));
        }
        self.copy_from = Some((strip_leading_slash(path.into()), rev));
        Ok(())
    }

    pub fn clear_copy_from(&mut self) {
        self.copy_from = None;
    }

    pub fn properties(&self) -> Option<&PropertySet> {
        self.properties.as_ref()
    }

    pub fn properties_mut(&mut self) -> &mut PropertySet {
        self.properties.get_or_insert_with(PropertySet::new)
    }

    pub fn set_properties(&mut self, props: PropertySet) -> Result<()> {
        if self.action == NodeAction::Delete && !props.is_empty() {
            return Err(Error::InvalidArgument(
                "delete nodes carry no properties".into(),
            ));
        }
        self.properties = Some(props);
        Ok(())
    }

    pub fn set_property(&mut self, name: impl Into<String>, value: impl Into<String>) -> Result<()> {
        if self.action == NodeAction::Delete {
            return Err(Error::InvalidArgument(
                "delete nodes carry no properties".into(),
            ));
        }
        self.properties_mut().set(name, value);
        Ok(())
    }

    pub fn text(&self) -> Option<&TextRef> {
        self.text.as_ref()
    }

    /// Assign text from a byte range inside a (still-on-disk) dump file,
    /// trusting the caller-supplied md5 without recomputation.
    pub fn set_text_from_range(
        &mut self,
        dump_path: Rc<Path>,
        offset: u64,
        length: u64,
        md5: String,
    ) -> Result<()> {
        self.reject_text_on_delete()?;
        self.text = Some(TextRef::from_range(dump_path, offset, length, md5));
        Ok(())
    }

    /// Assign text from an external file, computing length/md5 when absent
    /// or when the caller-supplied value isn't 32 hex chars.
    pub fn set_text_from_file(
        &mut self,
        file_path: PathBuf,
        delete_on_drop: bool,
        length: Option<u64>,
        md5: Option<String>,
    ) -> Result<()> {
        self.reject_text_on_delete()?;
        let md5 = md5.filter(|m| is_valid_md5_hex(m));
        self.text = Some(TextRef::from_file(file_path, delete_on_drop, length, md5)?);
        Ok(())
    }

    /// Share another node's text reference (same source variant, no copy).
    pub fn set_text_from_node(&mut self, other: &Node) -> Result<()> {
        self.reject_text_on_delete()?;
        self.text = other.text.as_ref().map(TextRef::share);
        Ok(())
    }

    pub fn clear_text(&mut self) {
        self.text = None;
    }

    fn reject_text_on_delete(&self) -> Result<()> {
        if self.action == NodeAction::Delete {
            return Err(Error::InvalidArgument("delete nodes carry no text".into()));
        }
        Ok(())
    }
}

fn strip_leading_slash(mut path: String) -> String {
    while path.starts_with('/') {
        path.remove(0);
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_leading_slashes() {
        let n = Node::new("/a/b", NodeAction::Add, Some(NodeKind::File)).unwrap();
        assert_eq!(n.path(), "a/b");
    }

    #[test]
    fn delete_rejects_kind() {
        assert!(Node::new("a", NodeAction::Delete, Some(NodeKind::File)).is_err());
    }

    #[test]
    fn delete_rejects_text_and_properties() {
        let mut n = Node::new("a", NodeAction::Delete, None).unwrap();
        assert!(n.set_property("k", "v").is_err());
        assert!(n
            .set_text_from_file(PathBuf::from("/nonexistent"), false, Some(0), Some("d41d8cd98f00b204e9800998ecf8427e".into()))
            .is_err());
    }

    #[test]
    fn copy_from_only_on_add_or_replace() {
        let mut n = Node::new("a", NodeAction::Change, Some(NodeKind::File)).unwrap();
        assert!(n.set_copy_from("b", 1).is_err());
        let mut n = Node::new("a", NodeAction::Add, Some(NodeKind::File)).unwrap();
        assert!(n.set_copy_from("b", 1).is_ok());
    }
}

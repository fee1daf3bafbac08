//! Serializes the in-memory model back to the dump-file wire format.

use std::fs;
use std::io::Write;
use std::path::Path;

use crate::date::Timestamp;
use crate::error::{Error, Result};
use crate::node::{Node, NodeAction};
use crate::propset::{PropValue, PropertySet};
use crate::reader::DumpReader;
use crate::revision::Revision;

#[derive(Debug, PartialEq, Eq)]
enum WriterState {
    Creating,
    Writing,
}

pub struct DumpWriter {
    file: fs::File,
    state: WriterState,
    next_rev: u64,
    prev_date: Option<Timestamp>,
}

impl DumpWriter {
    /// Writes the header and a rev-0 record carrying only `svn:date`.
    pub fn create_with_rev0(path: impl AsRef<Path>, uuid: Option<&str>, rev0_date: &str) -> Result<Self> {
        let file = fs::File::create(path.as_ref())?;
        let mut w = DumpWriter {
            file,
            state: WriterState::Creating,
            next_rev: 0,
            prev_date: None,
        };
        w.write_header(uuid)?;
        let mut props = PropertySet::new();
        props.set("svn:date", rev0_date);
        w.write_revision_record(0, &props)?;
        w.prev_date = Some(Timestamp::parse(rev0_date));
        w.next_rev = 1;
        w.state = WriterState::Writing;
        Ok(w)
    }

    /// Writes the header only; the next `add_rev` emits `first_rev_nr`.
    pub fn create_with_rev_n(path: impl AsRef<Path>, uuid: Option<&str>, first_rev_nr: u64) -> Result<Self> {
        if first_rev_nr < 1 {
            return Err(Error::InvalidArgument(
                "create_with_rev_n requires first_rev_nr >= 1".into(),
            ));
        }
        let file = fs::File::create(path.as_ref())?;
        let mut w = DumpWriter {
            file,
            state: WriterState::Creating,
            next_rev: first_rev_nr,
            prev_date: None,
        };
        w.write_header(uuid)?;
        Ok(w)
    }

    /// Dispatches to the rev-0 or revN flavor based on `reader`'s current
    /// revision, advancing the reader past rev 0 when that flavor is used.
    pub fn create_like(path: impl AsRef<Path>, reader: &mut DumpReader) -> Result<Self> {
        let (number, date, uuid) = {
            let rev = reader
                .current()
                .ok_or_else(|| Error::InvalidState("create_like requires a positioned reader".into()))?;
            (rev.number(), rev.date().to_string(), reader.uuid().map(str::to_string))
        };
        if number == 0 {
            let w = DumpWriter::create_with_rev0(path, uuid.as_deref(), &date)?;
            reader.read_next_rev()?;
            Ok(w)
        } else {
            DumpWriter::create_with_rev_n(path, uuid.as_deref(), number)
        }
    }

    fn write_header(&mut self, uuid: Option<&str>) -> Result<()> {
        writeln!(self.file, "SVN-fs-dump-format-version: 2")?;
        writeln!(self.file)?;
        if let Some(u) = uuid {
            writeln!(self.file, "UUID: {u}")?;
            writeln!(self.file)?;
        }
        Ok(())
    }

    /// Renders properties, applies the monotone-date rule, and emits the
    /// revision header + property block.
    pub fn add_rev(&mut self, mut properties: PropertySet) -> Result<u64> {
        let rev_num = self.next_rev;
        let date_str = properties.get_str("svn:date").unwrap_or("").to_string();
        let candidate = Timestamp::parse(&date_str);
        let adjusted = match self.prev_date {
            Some(prev) => {
                let advanced = Timestamp::advance_if_not_monotone(prev, candidate);
                if advanced != candidate {
                    tracing::debug!(rev = rev_num, from = %date_str, to = %advanced.render(), "advancing non-monotone svn:date");
                    properties.set("svn:date", advanced.render());
                }
                advanced
            }
            None => candidate,
        };
        self.prev_date = Some(adjusted);
        self.write_revision_record(rev_num, &properties)?;
        self.next_rev += 1;
        self.state = WriterState::Writing;
        Ok(rev_num)
    }

    fn write_revision_record(&mut self, rev_num: u64, props: &PropertySet) -> Result<()> {
        let prop_bytes = render_property_block(props);
        writeln!(self.file, "Revision-number: {rev_num}")?;
        writeln!(self.file, "Prop-content-length: {}", prop_bytes.len())?;
        writeln!(self.file, "Content-length: {}", prop_bytes.len())?;
        writeln!(self.file)?;
        self.file.write_all(&prop_bytes)?;
        writeln!(self.file)?;
        Ok(())
    }

    pub fn add_node(&mut self, node: &Node) -> Result<()> {
        if self.state != WriterState::Writing {
            return Err(Error::InvalidState("add_node called before add_rev".into()));
        }
        writeln!(self.file, "Node-path: {}", node.path())?;
        if let Some(kind) = node.kind() {
            writeln!(self.file, "Node-kind: {}", kind.as_str())?;
        }
        writeln!(self.file, "Node-action: {}", node.action().as_str())?;

        if node.action() == NodeAction::Delete {
            writeln!(self.file)?;
            writeln!(self.file)?;
            return Ok(());
        }

        if let Some((cf_path, cf_rev)) = node.copy_from() {
            writeln!(self.file, "Node-copyfrom-rev: {cf_rev}")?;
            writeln!(self.file, "Node-copyfrom-path: {cf_path}")?;
        }

        let prop_bytes = node.properties().map(render_property_block).unwrap_or_default();
        let prop_len = prop_bytes.len() as u64;
        let text_len = node.text().map(|t| t.length).unwrap_or(0);

        if prop_len > 0 {
            writeln!(self.file, "Prop-content-length: {prop_len}")?;
        }
        if let Some(text) = node.text() {
            writeln!(self.file, "Text-content-length: {}", text.length)?;
            writeln!(self.file, "Text-content-md5: {}", text.md5)?;
        }
        if prop_len > 0 || node.text().is_some() {
            writeln!(self.file, "Content-length: {}", prop_len + text_len)?;
        }
        writeln!(self.file)?;

        if prop_len > 0 {
            self.file.write_all(&prop_bytes)?;
        }
        if let Some(text) = node.text() {
            let mut handle = text.open()?;
            let mut remaining = text.length;
            while remaining > 0 {
                let chunk = handle.read(64 * 1024)?;
                if chunk.is_empty() {
                    break;
                }
                remaining -= chunk.len() as u64;
                self.file.write_all(&chunk)?;
            }
            if remaining != 0 {
                return Err(Error::Truncated {
                    path: node.path().into(),
                    line: 0,
                    detail: "text source shorter than declared length".into(),
                });
            }
            writeln!(self.file)?;
        }
        writeln!(self.file)?;
        Ok(())
    }

    /// Convenience: `add_rev` with the reader's properties, then `add_node`
    /// for each of its nodes in order.
    pub fn add_rev_from_dump(&mut self, reader: &DumpReader) -> Result<u64> {
        let rev: &Revision = reader
            .current()
            .ok_or_else(|| Error::InvalidState("add_rev_from_dump requires a positioned reader".into()))?;
        let rev_num = self.add_rev(rev.properties().clone())?;
        for node in rev.nodes() {
            self.add_node(node)?;
        }
        Ok(rev_num)
    }

    pub fn close(mut self) -> Result<()> {
        self.file.flush()?;
        Ok(())
    }
}

/// Inverse of the reader's property-block parser.
pub fn render_property_block(props: &PropertySet) -> Vec<u8> {
    let mut buf = Vec::new();
    for (k, v) in props.iter() {
        match v {
            PropValue::Set(value) => {
                buf.extend_from_slice(format!("K {}\n", k.len()).as_bytes());
                buf.extend_from_slice(k.as_bytes());
                buf.push(b'\n');
                buf.extend_from_slice(format!("V {}\n", value.len()).as_bytes());
                buf.extend_from_slice(value.as_bytes());
                buf.push(b'\n');
            }
            PropValue::Delete => {
                buf.extend_from_slice(format!("D {}\n", k.len()).as_bytes());
                buf.extend_from_slice(k.as_bytes());
                buf.push(b'\n');
            }
        }
    }
    buf.extend_from_slice(b"PROPS-END\n");
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Node, NodeKind};
    use std::rc::Rc;

    #[test]
    fn roundtrip_simple_dump() {
        let src = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(src.path(), b"hi\n").unwrap();

        let out = tempfile::NamedTempFile::new().unwrap();
        let mut w = DumpWriter::create_with_rev0(out.path(), Some("uuid-1"), "2024-01-01T00:00:00.000000Z").unwrap();

        let mut props = PropertySet::new();
        props.set("svn:author", "user");
        props.set("svn:log", "test");
        props.set("svn:date", "2024-01-02T00:00:00.000000Z");
        w.add_rev(props).unwrap();

        let mut node = Node::new("a.txt", NodeAction::Add, Some(NodeKind::File)).unwrap();
        let path: Rc<Path> = Rc::from(src.path());
        node.set_text_from_range(path, 0, 3, crate::date::md5_hex(b"hi\n")).unwrap();
        w.add_node(&node).unwrap();
        w.close().unwrap();

        let mut r = DumpReader::open(out.path()).unwrap();
        assert!(r.read_next_rev().unwrap());
        assert_eq!(r.current().unwrap().number(), 0);
        assert!(r.read_next_rev().unwrap());
        let rev = r.current().unwrap();
        assert_eq!(rev.author(), "user");
        assert_eq!(rev.node_count(), 1);
        let n = rev.node(0).unwrap();
        assert_eq!(n.path(), "a.txt");
        assert_eq!(n.text().unwrap().read_all().unwrap(), b"hi\n");
    }

    #[test]
    fn add_node_before_add_rev_errors() {
        let out = tempfile::NamedTempFile::new().unwrap();
        let mut w = DumpWriter::create_with_rev_n(out.path(), None, 1).unwrap();
        let node = Node::new("a", NodeAction::Delete, None).unwrap();
        assert!(w.add_node(&node).is_err());
    }

    #[test]
    fn monotone_date_advances() {
        let out = tempfile::NamedTempFile::new().unwrap();
        let mut w = DumpWriter::create_with_rev_n(out.path(), None, 1).unwrap();
        let mut p1 = PropertySet::new();
        p1.set("svn:date", "2024-06-01T00:00:00.500000Z");
        w.add_rev(p1).unwrap();
        let mut p2 = PropertySet::new();
        p2.set("svn:date", "2024-06-01T00:00:00.500000Z");
        w.add_rev(p2).unwrap();
        w.close().unwrap();

        let mut r = DumpReader::open(out.path()).unwrap();
        r.read_next_rev().unwrap();
        assert_eq!(r.current().unwrap().date(), "2024-06-01T00:00:00.500000Z");
        r.read_next_rev().unwrap();
        assert_eq!(r.current().unwrap().date(), "2024-06-01T00:00:00.500001Z");
    }
}

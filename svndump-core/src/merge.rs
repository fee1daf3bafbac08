//! Interleaves N input dumps into one chronologically-ordered output,
//! rewriting paths and remapping copy-from revisions per input.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::error::{Error, Result};
use crate::node::{Node, NodeAction, NodeKind};
use crate::propset::PropertySet;
use crate::reader::DumpReader;
use crate::writer::DumpWriter;

/// One rename rule: `from` and `to` must both end in `/` so prefix matching
/// can't fire on a longer sibling path (`trunk/` vs `trunkish/`).
#[derive(Debug, Clone)]
pub struct PrefixRename {
    pub from: String,
    pub to: String,
}

impl PrefixRename {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        let ensure_slash = |mut s: String| {
            if !s.ends_with('/') {
                s.push('/');
            }
            s
        };
        PrefixRename {
            from: ensure_slash(from.into()),
            to: ensure_slash(to.into()),
        }
    }
}

/// One merge input: a dump file plus the rewrite rules that apply to it.
pub struct MergeInput {
    reader: DumpReader,
    renames: Vec<PrefixRename>,
    suppress_mkdir: HashSet<String>,
    rev_map: HashMap<u64, u64>,
    live: bool,
}

impl MergeInput {
    pub fn open(path: impl AsRef<Path>, renames: Vec<PrefixRename>, suppress_mkdir: HashSet<String>) -> Result<Self> {
        let reader = DumpReader::open(path)?;
        Ok(MergeInput {
            reader,
            renames,
            suppress_mkdir,
            rev_map: HashMap::new(),
            live: true,
        })
    }

    fn rename_path(&self, path: &str) -> String {
        for rule in &self.renames {
            if let Some(rest) = path.strip_prefix(rule.from.as_str()) {
                return format!("{}{}", rule.to, rest);
            }
        }
        path.to_string()
    }

    /// Rewrites one node per §4.G, or drops it (suppressed add-dir).
    fn rewrite(&self, input_index: usize, node: &Node) -> Result<Option<Node>> {
        if node.action() == NodeAction::Add
            && node.kind() == Some(NodeKind::Dir)
            && self.suppress_mkdir.contains(node.path())
        {
            return Ok(None);
        }

        let new_path = self.rename_path(node.path());
        let new_copy_from = match node.copy_from() {
            Some((cf_path, cf_rev)) => {
                let renamed = self.rename_path(cf_path);
                let written_rev = self.rev_map.get(cf_rev).copied().ok_or(Error::MissingMapping {
                    input: input_index,
                    source_rev: *cf_rev,
                })?;
                Some((renamed, written_rev))
            }
            None => None,
        };

        let path_changed = new_path != node.path();
        let copy_from_changed = new_copy_from.as_ref().map(|(p, r)| (p.as_str(), *r))
            != node.copy_from().map(|(p, r)| (p.as_str(), *r));

        if !path_changed && !copy_from_changed {
            return Ok(Some(node.clone()));
        }

        let mut clone = Node::new(new_path, node.action(), node.kind())?;
        if let Some((p, r)) = new_copy_from {
            clone.set_copy_from(p, r)?;
        }
        if let Some(props) = node.properties() {
            clone.set_properties(props.clone())?;
        }
        if node.action() != NodeAction::Delete {
            clone.set_text_from_node(node)?;
        }
        Ok(Some(clone))
    }
}

pub struct ExtraDirectories {
    pub paths: Vec<String>,
    pub log: String,
    pub author: String,
}

pub struct MergeBuilder {
    inputs: Vec<MergeInput>,
    extra_dirs: Option<ExtraDirectories>,
    output_starts_at_rev0: bool,
    first_rev_nr: u64,
}

impl MergeBuilder {
    pub fn new() -> Self {
        MergeBuilder {
            inputs: Vec::new(),
            extra_dirs: None,
            output_starts_at_rev0: true,
            first_rev_nr: 1,
        }
    }

    pub fn add_input(mut self, input: MergeInput) -> Self {
        self.inputs.push(input);
        self
    }

    pub fn extra_directories(mut self, extra: ExtraDirectories) -> Self {
        self.extra_dirs = Some(extra);
        self
    }

    pub fn start_at_rev(mut self, rev: u64) -> Self {
        self.output_starts_at_rev0 = false;
        self.first_rev_nr = rev;
        self
    }

    pub fn run(self, output_path: impl AsRef<Path>) -> Result<u64> {
        run_merge(self.inputs, self.extra_dirs, self.output_starts_at_rev0, self.first_rev_nr, output_path)
    }
}

impl Default for MergeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn run_merge(
    mut inputs: Vec<MergeInput>,
    extra_dirs: Option<ExtraDirectories>,
    start_at_rev0: bool,
    first_rev_nr: u64,
    output_path: impl AsRef<Path>,
) -> Result<u64> {
    // 1. Advance every input to its first revision; drop empties.
    for input in &mut inputs {
        input.live = input.reader.read_next_rev()?;
    }
    inputs.retain(|i| i.live);
    if inputs.is_empty() {
        return Err(Error::InvalidArgument("merge requires at least one non-empty input".into()));
    }

    // 2. Output header.
    let uuid = inputs[0].reader.uuid().map(str::to_string);
    let mut writer = if start_at_rev0 {
        let rev0_date = inputs[0].reader.current().map(|r| r.date().to_string()).unwrap_or_default();
        DumpWriter::create_with_rev0(output_path, uuid.as_deref(), &rev0_date)?
    } else {
        DumpWriter::create_with_rev_n(output_path, uuid.as_deref(), first_rev_nr)?
    };

    // 3. Skip every input still sitting on revision 0.
    for input in &mut inputs {
        if input.reader.current_rev_number() == Some(0) {
            input.live = input.reader.read_next_rev()?;
        }
    }
    inputs.retain(|i| i.live);

    let mut last_written = 0;

    // 4. Synthetic extra-directories revision.
    if let Some(extra) = extra_dirs {
        let min_date = inputs
            .iter()
            .filter_map(|i| i.reader.current().map(|r| r.date().to_string()))
            .min()
            .unwrap_or_default();
        let mut props = PropertySet::new();
        props.set("svn:date", min_date);
        props.set("svn:author", extra.author);
        props.set("svn:log", extra.log);
        last_written = writer.add_rev(props)?;
        for path in extra.paths {
            let node = Node::new(path, NodeAction::Add, Some(NodeKind::Dir))?;
            writer.add_node(&node)?;
        }
    }

    // 5. Main interleaving loop.
    while inputs.iter().any(|i| i.live) {
        let winner = pick_winner(&inputs);
        let source_rev_number;
        {
            let input = &inputs[winner];
            let rev = input.reader.current().expect("live input has a current revision");
            source_rev_number = rev.number();

            let props = rev.properties().clone();
            let written_rev = writer.add_rev(props)?;
            for node in rev.nodes() {
                if let Some(rewritten) = input.rewrite(winner, node)? {
                    writer.add_node(&rewritten)?;
                }
            }
            last_written = written_rev;
        }
        inputs[winner].rev_map.insert(source_rev_number, last_written);
        inputs[winner].live = inputs[winner].reader.read_next_rev()?;
    }

    writer.close()?;
    Ok(last_written)
}

/// Picks the live input with the lexicographically smallest current
/// `svn:date`; ties favor the lower input index.
fn pick_winner(inputs: &[MergeInput]) -> usize {
    let mut best: Option<(usize, &str)> = None;
    for (i, input) in inputs.iter().enumerate() {
        if !input.live {
            continue;
        }
        let date = input.reader.current().map(|r| r.date()).unwrap_or("");
        match best {
            None => best = Some((i, date)),
            Some((_, best_date)) if date < best_date => best = Some((i, date)),
            _ => {}
        }
    }
    best.map(|(i, _)| i).expect("pick_winner called with no live inputs")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn write_simple_dump(path: &Path, rev1_date: &str, add_path: &str) {
        let mut w = DumpWriter::create_with_rev0(path, Some("uuid-a"), "2024-01-01T00:00:00.000000Z").unwrap();
        let mut p = PropertySet::new();
        p.set("svn:date", rev1_date);
        p.set("svn:author", "a");
        p.set("svn:log", "l");
        w.add_rev(p).unwrap();
        let node = Node::new(add_path, NodeAction::Add, Some(NodeKind::File)).unwrap();
        w.add_node(&node).unwrap();
        w.close().unwrap();
    }

    #[test]
    fn merges_two_dumps_with_renames_and_extra_dirs() {
        let a = tempfile::NamedTempFile::new().unwrap();
        let b = tempfile::NamedTempFile::new().unwrap();
        write_simple_dump(a.path(), "2024-01-01T00:00:00.000000Z", "trunk/f");
        write_simple_dump(b.path(), "2024-01-02T00:00:00.000000Z", "trunk/g");

        let input_a = MergeInput::open(a.path(), vec![PrefixRename::new("trunk", "trunk/a")], HashSet::new()).unwrap();
        let input_b = MergeInput::open(b.path(), vec![PrefixRename::new("trunk", "trunk/b")], HashSet::new()).unwrap();

        let out = tempfile::NamedTempFile::new().unwrap();
        let last = MergeBuilder::new()
            .add_input(input_a)
            .add_input(input_b)
            .extra_directories(ExtraDirectories {
                paths: vec!["trunk".to_string()],
                log: "setup".to_string(),
                author: "merge".to_string(),
            })
            .run(out.path())
            .unwrap();
        assert_eq!(last, 3);

        let mut r = DumpReader::open(out.path()).unwrap();
        r.read_next_rev().unwrap();
        assert_eq!(r.current().unwrap().number(), 0);

        r.read_next_rev().unwrap();
        let rev1 = r.current().unwrap();
        assert_eq!(rev1.node(0).unwrap().path(), "trunk");

        r.read_next_rev().unwrap();
        let rev2 = r.current().unwrap();
        assert_eq!(rev2.node(0).unwrap().path(), "trunk/a/f");

        r.read_next_rev().unwrap();
        let rev3 = r.current().unwrap();
        assert_eq!(rev3.node(0).unwrap().path(), "trunk/b/g");
    }

    #[test]
    fn copy_from_remaps_through_rev_map() {
        let a = tempfile::NamedTempFile::new().unwrap();
        let mut w = DumpWriter::create_with_rev0(a.path(), Some("uuid-a"), "2024-01-01T00:00:00.000000Z").unwrap();
        let mut p1 = PropertySet::new();
        p1.set("svn:date", "2024-01-01T01:00:00.000000Z");
        w.add_rev(p1).unwrap();
        w.add_node(&Node::new("x", NodeAction::Add, Some(NodeKind::File)).unwrap()).unwrap();
        let mut p2 = PropertySet::new();
        p2.set("svn:date", "2024-01-01T02:00:00.000000Z");
        w.add_rev(p2).unwrap();
        let mut copy = Node::new("y", NodeAction::Add, Some(NodeKind::File)).unwrap();
        copy.set_copy_from("x", 1).unwrap();
        w.add_node(&copy).unwrap();
        w.close().unwrap();

        let renames = vec![PrefixRename::new("x", "sub/x"), PrefixRename::new("y", "sub/y")];
        let input = MergeInput::open(a.path(), renames, HashSet::new()).unwrap();
        let out = tempfile::NamedTempFile::new().unwrap();
        MergeBuilder::new().add_input(input).run(out.path()).unwrap();

        let mut r = DumpReader::open(out.path()).unwrap();
        r.read_next_rev().unwrap(); // rev0
        r.read_next_rev().unwrap(); // rev1: sub/x
        assert_eq!(r.current().unwrap().node(0).unwrap().path(), "sub/x");
        r.read_next_rev().unwrap(); // rev2: sub/y copy-from sub/x@1
        let rev2 = r.current().unwrap();
        let node = rev2.node(0).unwrap();
        assert_eq!(node.path(), "sub/y");
        assert_eq!(node.copy_from().unwrap(), &("sub/x".to_string(), 1));
    }

    #[test]
    fn rename_applies_to_delete_nodes_without_text() {
        let a = tempfile::NamedTempFile::new().unwrap();
        let mut w = DumpWriter::create_with_rev0(a.path(), Some("uuid-a"), "2024-01-01T00:00:00.000000Z").unwrap();
        let mut p1 = PropertySet::new();
        p1.set("svn:date", "2024-01-01T01:00:00.000000Z");
        w.add_rev(p1).unwrap();
        w.add_node(&Node::new("trunk/f", NodeAction::Add, Some(NodeKind::File)).unwrap()).unwrap();
        let mut p2 = PropertySet::new();
        p2.set("svn:date", "2024-01-01T02:00:00.000000Z");
        w.add_rev(p2).unwrap();
        w.add_node(&Node::new("trunk/f", NodeAction::Delete, None).unwrap()).unwrap();
        w.close().unwrap();

        let renames = vec![PrefixRename::new("trunk", "trunk/a")];
        let input = MergeInput::open(a.path(), renames, HashSet::new()).unwrap();
        let out = tempfile::NamedTempFile::new().unwrap();
        MergeBuilder::new().add_input(input).run(out.path()).unwrap();

        let mut r = DumpReader::open(out.path()).unwrap();
        r.read_next_rev().unwrap(); // rev0
        r.read_next_rev().unwrap(); // rev1: add trunk/a/f
        r.read_next_rev().unwrap(); // rev2: delete trunk/a/f
        let rev2 = r.current().unwrap();
        let node = rev2.node(0).unwrap();
        assert_eq!(node.path(), "trunk/a/f");
        assert_eq!(node.action(), NodeAction::Delete);
        assert!(node.text().is_none());
    }
}

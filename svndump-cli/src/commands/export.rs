use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::Result;
use svndump_core::{DumpReader, NodeKind};

/// Replays every add/change/delete against an in-memory path table and
/// writes the surviving file nodes' final content under `dst`. This is not
/// a working-copy checkout (no properties, no directory metadata) — just
/// enough to inspect what a dump's HEAD would contain.
pub fn run(src: &Path, dst: &Path) -> Result<()> {
    let mut reader = DumpReader::open(src)?;
    let mut files: BTreeMap<String, ()> = BTreeMap::new();
    let mut dirs: BTreeMap<String, ()> = BTreeMap::new();

    while reader.read_next_rev()? {
        let rev = reader.current().unwrap();
        for node in rev.nodes() {
            match node.action() {
                svndump_core::NodeAction::Delete => {
                    let prefix = format!("{}/", node.path());
                    files.retain(|p, _| p != node.path() && !p.starts_with(&prefix));
                    dirs.retain(|p, _| p != node.path() && !p.starts_with(&prefix));
                }
                _ => match node.kind() {
                    Some(NodeKind::Dir) => {
                        dirs.insert(node.path().to_string(), ());
                    }
                    Some(NodeKind::File) | None => {
                        files.insert(node.path().to_string(), ());
                    }
                },
            }
        }
    }

    for dir in dirs.keys() {
        fs::create_dir_all(dst.join(dir))?;
    }

    // Second pass: materialize file content as of the final revision each
    // path was last written, by re-reading and keeping the latest text ref.
    let mut reader = DumpReader::open(src)?;
    let mut latest_text: BTreeMap<String, svndump_core::TextRef> = BTreeMap::new();
    while reader.read_next_rev()? {
        let rev = reader.current().unwrap();
        for node in rev.nodes() {
            if files.contains_key(node.path()) {
                if let Some(text) = node.text() {
                    latest_text.insert(node.path().to_string(), text.share());
                }
            }
        }
    }

    for (path, text) in &latest_text {
        let out_path = dst.join(path);
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = text.read_all()?;
        fs::write(&out_path, data)?;
    }

    tracing::info!(files = latest_text.len(), dirs = dirs.len(), "export complete");
    Ok(())
}

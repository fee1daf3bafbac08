use std::path::Path;

use anyhow::Result;
use svndump_core::DumpReader;

/// Lists every path touched by the dump, with the action under which it last
/// appeared. Not a tree listing — the engine never replays a filesystem.
pub fn run(path: &Path) -> Result<()> {
    let mut reader = DumpReader::open(path)?;
    let mut last_action: std::collections::BTreeMap<String, char> = std::collections::BTreeMap::new();
    while reader.read_next_rev()? {
        let rev = reader.current().unwrap();
        for node in rev.nodes() {
            last_action.insert(node.path().to_string(), node.action().letter());
        }
    }
    for (path, action) in &last_action {
        println!("{action} {path}");
    }
    Ok(())
}

use std::path::Path;

use anyhow::Result;
use svndump_core::DumpReader;

pub fn run(path: &Path, verbose: bool) -> Result<()> {
    let mut reader = DumpReader::open(path)?;
    while reader.read_next_rev()? {
        let rev = reader.current().unwrap();
        println!(
            "r{} | {} | {} | {} node{}",
            rev.number(),
            rev.author(),
            rev.date(),
            rev.node_count(),
            if rev.node_count() == 1 { "" } else { "s" }
        );
        if verbose {
            println!("{}", rev.log());
            for node in rev.nodes() {
                let kind = node.kind().map(|k| k.as_str()).unwrap_or("");
                println!("   {} {} {}", node.action().letter(), kind, node.path());
            }
        }
    }
    Ok(())
}

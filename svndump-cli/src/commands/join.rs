use std::path::Path;

use anyhow::Result;
use svndump_core::{DumpReader, DumpWriter, transform};

/// Concatenates contiguous dump segments (as produced by `split`) into one
/// dump, relying on the writer's auto-incrementing revision counter to pick
/// up exactly where the previous segment's numbering ended.
pub fn run(segments: &[std::path::PathBuf], dst: &Path) -> Result<()> {
    let Some((first, rest)) = segments.split_first() else {
        return Ok(());
    };

    let mut reader = DumpReader::open(first)?;
    reader.read_next_rev()?;
    let mut writer = DumpWriter::create_like(dst, &mut reader)?;
    transform::copy(&mut reader, &mut writer)?;

    for segment in rest {
        let mut reader = DumpReader::open(segment)?;
        reader.read_next_rev()?;
        if reader.current().map(|r| r.number()) == Some(0) {
            reader.read_next_rev()?;
        }
        transform::copy(&mut reader, &mut writer)?;
    }

    writer.close()?;
    tracing::info!(segments = segments.len(), "join complete");
    Ok(())
}

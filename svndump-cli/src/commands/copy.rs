use std::path::Path;

use anyhow::Result;
use svndump_core::{DumpReader, DumpWriter, transform};

pub fn run(src: &Path, dst: &Path) -> Result<()> {
    let mut reader = DumpReader::open(src)?;
    reader.read_next_rev()?;
    let mut writer = DumpWriter::create_like(dst, &mut reader)?;
    let last_rev = transform::copy(&mut reader, &mut writer)?;
    writer.close()?;
    tracing::info!(rev = last_rev, "copy complete");
    Ok(())
}

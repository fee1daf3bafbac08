use std::path::Path;

use anyhow::Result;
use svndump_core::transforms::Cvs2SvnFix;
use svndump_core::{DumpReader, DumpWriter, transform};

pub fn run(src: &Path, dst: &Path) -> Result<()> {
    let mut reader = DumpReader::open(src)?;
    reader.read_next_rev()?;
    let mut writer = DumpWriter::create_like(dst, &mut reader)?;
    let mut fix = Cvs2SvnFix::new();
    let last_rev = transform::copy_with_transform(&mut reader, &mut writer, &mut fix)?;
    writer.close()?;
    tracing::info!(rev = last_rev, "cvs2svnfix complete");
    Ok(())
}

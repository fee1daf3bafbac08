use std::path::{Path, PathBuf};

use anyhow::Result;
use svndump_core::transforms::{ContentMode, Sanitizer};
use svndump_core::{DumpReader, DumpWriter, transform};

pub fn run(src: &Path, dst: &Path, salt: &str, content_mode: ContentMode, tmp_dir: PathBuf) -> Result<()> {
    let mut reader = DumpReader::open(src)?;
    reader.read_next_rev()?;
    let mut writer = DumpWriter::create_like(dst, &mut reader)?;
    let mut sanitizer = Sanitizer::new(salt, content_mode, tmp_dir);
    let last_rev = transform::copy_with_transform(&mut reader, &mut writer, &mut sanitizer)?;
    writer.close()?;
    tracing::info!(rev = last_rev, "sanitize complete");
    Ok(())
}

use std::path::Path;

use anyhow::Result;
use regex::Regex;
use svndump_core::transforms::{NodePropReplace, RevPropReplace};
use svndump_core::{DumpReader, DumpWriter, transform};

pub fn run_revprop(src: &Path, dst: &Path, name: &str, pattern: Regex, replacement: &str) -> Result<()> {
    let mut reader = DumpReader::open(src)?;
    reader.read_next_rev()?;
    let mut writer = DumpWriter::create_like(dst, &mut reader)?;
    let mut t = RevPropReplace::new(name, pattern, replacement);
    let last_rev = transform::copy_with_transform(&mut reader, &mut writer, &mut t)?;
    writer.close()?;
    tracing::info!(rev = last_rev, "transform-revprop complete");
    Ok(())
}

pub fn run_nodeprop(src: &Path, dst: &Path, name: &str, pattern: Regex, replacement: &str) -> Result<()> {
    let mut reader = DumpReader::open(src)?;
    reader.read_next_rev()?;
    let mut writer = DumpWriter::create_like(dst, &mut reader)?;
    let mut t = NodePropReplace::new(name, pattern, replacement);
    let last_rev = transform::copy_with_transform(&mut reader, &mut writer, &mut t)?;
    writer.close()?;
    tracing::info!(rev = last_rev, "transform-nodeprop complete");
    Ok(())
}

use std::path::Path;

use anyhow::Result;
use svndump_core::transforms::AutoProps;
use svndump_core::{DumpReader, DumpWriter, transform};

use crate::autoprops_config::load_auto_props;

pub fn run(src: &Path, dst: &Path, config_path: &Path, apply_to_change: bool) -> Result<()> {
    let rules = load_auto_props(config_path)?;
    let mut reader = DumpReader::open(src)?;
    reader.read_next_rev()?;
    let mut writer = DumpWriter::create_like(dst, &mut reader)?;
    let mut autoprops = AutoProps::new(rules);
    autoprops.apply_to_change = apply_to_change;
    let last_rev = transform::copy_with_transform(&mut reader, &mut writer, &mut autoprops)?;
    writer.close()?;
    tracing::info!(rev = last_rev, "apply-autoprops complete");
    Ok(())
}

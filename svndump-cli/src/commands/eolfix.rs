use std::path::{Path, PathBuf};

use anyhow::Result;
use regex::Regex;
use svndump_core::transforms::{EolFix, EolRule, EolSelector};
use svndump_core::{DumpReader, DumpWriter, transform};

pub struct EolFixOptions {
    pub rules: Vec<EolRule>,
    pub path_patterns: Vec<Regex>,
    pub use_eol_style_property: bool,
    pub tmp_dir: PathBuf,
    pub set_native_style: Option<String>,
}

pub fn run(src: &Path, dst: &Path, opts: EolFixOptions) -> Result<()> {
    let mut reader = DumpReader::open(src)?;
    reader.read_next_rev()?;
    let mut writer = DumpWriter::create_like(dst, &mut reader)?;

    let selector = if opts.use_eol_style_property {
        EolSelector::HasEolStyleProperty
    } else {
        EolSelector::PathMatches(opts.path_patterns)
    };
    let mut fix = EolFix {
        selector,
        rules: opts.rules,
        tmp_dir: opts.tmp_dir,
        set_native_style: opts.set_native_style,
    };

    let last_rev = transform::copy_with_transform(&mut reader, &mut writer, &mut fix)?;
    writer.close()?;
    tracing::info!(rev = last_rev, "eolfix complete");
    Ok(())
}

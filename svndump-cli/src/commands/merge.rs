use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::Result;
use svndump_core::{ExtraDirectories, MergeBuilder, MergeInput, PrefixRename};

/// One `-i` input plus the renames/suppressions scoped to it. The original
/// tool interleaves `-i`/`-r`/`-x` flags positionally; here each input is
/// collected as a structured plan entry up front, then the merge runs once.
pub struct MergeInputSpec {
    pub path: PathBuf,
    pub renames: Vec<(String, String)>,
    pub suppress_mkdir: Vec<String>,
}

pub struct MergeOptions {
    pub inputs: Vec<MergeInputSpec>,
    pub extra_dirs: Vec<String>,
    pub extra_dirs_log: String,
    pub extra_dirs_author: String,
    pub start_at_rev: Option<u64>,
}

pub fn run(opts: MergeOptions, output: &Path) -> Result<u64> {
    let mut builder = MergeBuilder::new();
    for spec in opts.inputs {
        let renames = spec
            .renames
            .into_iter()
            .map(|(from, to)| PrefixRename::new(from, to))
            .collect();
        let suppress: HashSet<String> = spec.suppress_mkdir.into_iter().collect();
        builder = builder.add_input(MergeInput::open(&spec.path, renames, suppress)?);
    }
    if !opts.extra_dirs.is_empty() {
        builder = builder.extra_directories(ExtraDirectories {
            paths: opts.extra_dirs,
            log: opts.extra_dirs_log,
            author: opts.extra_dirs_author,
        });
    }
    if let Some(rev) = opts.start_at_rev {
        builder = builder.start_at_rev(rev);
    }
    let last_rev = builder.run(output)?;
    tracing::info!(rev = last_rev, "merge complete");
    Ok(last_rev)
}

//! svndump — a multi-subcommand tool around the dump-file engine:
//! copy, diff, eolfix, merge, check, log, ls, export, join, split,
//! sanitize, transform-revprop, transform-nodeprop, cvs2svnfix, apply-autoprops.

mod autoprops_config;
mod commands;
mod exit;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use regex::Regex;
use svndump_core::transforms::{ContentMode, EolRule};

use commands::merge::{MergeInputSpec, MergeOptions};

#[derive(Parser, Debug)]
#[command(name = "svndump")]
#[command(author = "DSvn Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Subversion dump-file inspection and transformation tool")]
struct Cli {
    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Decrease verbosity to errors only
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Copy a dump file verbatim
    Copy { src: PathBuf, dst: PathBuf },

    /// Compare two dump files revision by revision
    Diff {
        a: PathBuf,
        b: PathBuf,
        /// Report EOL-only differences as "EOL" instead of "Text"
        #[arg(short = 'e', long = "check-eol")]
        check_eol: bool,
        /// Diff-kind label to ignore (repeatable): Path, Kind, Property, Text, EOL, RevProp
        #[arg(short = 'I', long = "ignore-kind")]
        ignore_kind: Vec<String>,
        #[arg(long = "ignore-revprop")]
        ignore_revprop: Vec<String>,
        #[arg(long = "ignore-property")]
        ignore_property: Vec<String>,
        /// Stop and exit at the first non-ignored difference
        #[arg(long = "stop-at-first")]
        stop_at_first: bool,
    },

    /// Normalize line endings in file content
    Eolfix {
        src: PathBuf,
        dst: PathBuf,
        /// CRLF -> LF
        #[arg(long)]
        crlf: bool,
        /// Bare CR -> LF
        #[arg(short = 'c', long)]
        cr: bool,
        /// Strip bare CR without inserting LF
        #[arg(long = "remove-cr")]
        remove_cr: bool,
        /// Select nodes by path regex instead of presence of svn:eol-style (repeatable)
        #[arg(short = 'r', long = "regex")]
        path_regex: Vec<String>,
        /// Set svn:eol-style to this value on every fixed node
        #[arg(short = 'E', long = "eol-style")]
        eol_style: Option<String>,
        #[arg(short = 't', long = "tmp-dir", default_value = ".")]
        tmp_dir: PathBuf,
    },

    /// Merge multiple dump files into one chronological timeline
    Merge {
        /// Input dump file (repeatable, order defines index for --rename/--suppress-mkdir)
        #[arg(short = 'i', long = "input")]
        input: Vec<PathBuf>,
        /// `idx:from:to` prefix rename scoped to one input (repeatable)
        #[arg(short = 'r', long = "rename")]
        rename: Vec<String>,
        /// `idx:path` add-dir to suppress for one input (repeatable)
        #[arg(short = 'x', long = "suppress-mkdir")]
        suppress_mkdir: Vec<String>,
        /// Extra directory to create in a synthetic first revision (repeatable)
        #[arg(short = 'd', long = "extra-dir")]
        extra_dir: Vec<String>,
        #[arg(short = 'm', long = "extra-log", default_value = "")]
        extra_log: String,
        #[arg(long = "extra-author", default_value = "")]
        extra_author: String,
        #[arg(long = "start-rev")]
        start_rev: Option<u64>,
        #[arg(short = 'o', long = "output")]
        output: PathBuf,
    },

    /// Scan for integrity problems
    Check {
        files: Vec<PathBuf>,
        /// Verify MD5 of every node's text
        #[arg(short = 'm')]
        verify_md5: bool,
        /// Check strictly monotone svn:date
        #[arg(short = 'd')]
        check_dates: bool,
        /// Check for missing Node-kind
        #[arg(short = 'A')]
        check_missing_kind: bool,
        /// Run every check
        #[arg(short = 'a')]
        all: bool,
    },

    /// Print a one-line-per-revision log
    Log {
        path: PathBuf,
        /// Also print the log message and each node's action and path
        #[arg(long = "show-nodes")]
        show_nodes: bool,
    },

    /// List every path touched by the dump
    Ls { path: PathBuf },

    /// Write the dump's final file content to a directory
    Export { src: PathBuf, dst: PathBuf },

    /// Concatenate contiguous dump segments
    Join {
        segments: Vec<PathBuf>,
        #[arg(short = 'o', long = "output")]
        output: PathBuf,
    },

    /// Split a dump into contiguous segments at the given revision boundaries
    Split {
        src: PathBuf,
        /// Revision numbers that begin a new segment
        boundaries: Vec<u64>,
        #[arg(short = 'o', long = "output-prefix")]
        output_prefix: PathBuf,
    },

    /// Replace authors/log/paths/content with salted MD5 fingerprints
    Sanitize {
        src: PathBuf,
        dst: PathBuf,
        #[arg(long)]
        salt: String,
        #[arg(long = "content-mode", default_value = "none")]
        content_mode: String,
        #[arg(short = 't', long = "tmp-dir", default_value = ".")]
        tmp_dir: PathBuf,
    },

    /// Regex-replace a revision property
    TransformRevprop {
        src: PathBuf,
        dst: PathBuf,
        name: String,
        pattern: String,
        replacement: String,
    },

    /// Regex-replace a node property across add/replace/change nodes
    TransformNodeprop {
        src: PathBuf,
        dst: PathBuf,
        name: String,
        pattern: String,
        replacement: String,
    },

    /// Repair nodes with a missing Node-kind using copy-from history
    Cvs2svnfix { src: PathBuf, dst: PathBuf },

    /// Apply filename-glob auto-props from a config file
    ApplyAutoprops {
        src: PathBuf,
        dst: PathBuf,
        #[arg(short = 'c', long = "config")]
        config: PathBuf,
        #[arg(long = "apply-to-change")]
        apply_to_change: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    match run(cli.command) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            tracing::error!("{err:#}");
            std::process::exit(exit::exit_code_for(&err));
        }
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    let default_directive = if quiet {
        "svndump=error"
    } else {
        match verbose {
            0 => "svndump=warn",
            1 => "svndump=info",
            _ => "svndump=debug",
        }
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_directive.parse().unwrap()),
        )
        .init();
}

fn run(command: Commands) -> Result<i32> {
    match command {
        Commands::Copy { src, dst } => commands::copy::run(&src, &dst).map(|()| exit::SUCCESS),

        Commands::Diff { a, b, check_eol, ignore_kind, ignore_revprop, ignore_property, stop_at_first } => {
            let opts = commands::diff::DiffOptions {
                check_eol,
                ignore_kinds: ignore_kind.into_iter().collect(),
                ignore_revprops: ignore_revprop.into_iter().collect(),
                ignore_properties: ignore_property.into_iter().collect(),
                stop_at_first,
            };
            let any_diff = commands::diff::run(&a, &b, &opts)?;
            Ok(if any_diff { exit::USER_ERROR } else { exit::SUCCESS })
        }

        Commands::Eolfix { src, dst, crlf, cr, remove_cr, path_regex, eol_style, tmp_dir } => {
            let mut rules = Vec::new();
            if crlf {
                rules.push(EolRule::CrlfToLf);
            }
            if cr {
                rules.push(EolRule::CrToLf);
            }
            if remove_cr {
                rules.push(EolRule::RemoveCr);
            }
            let patterns = path_regex
                .iter()
                .map(|p| Regex::new(p))
                .collect::<std::result::Result<Vec<_>, _>>()?;
            let opts = commands::eolfix::EolFixOptions {
                rules,
                path_patterns: patterns,
                use_eol_style_property: path_regex.is_empty(),
                tmp_dir,
                set_native_style: eol_style,
            };
            commands::eolfix::run(&src, &dst, opts).map(|()| exit::SUCCESS)
        }

        Commands::Merge { input, rename, suppress_mkdir, extra_dir, extra_log, extra_author, start_rev, output } => {
            let mut specs: Vec<MergeInputSpec> = input
                .into_iter()
                .map(|path| MergeInputSpec { path, renames: Vec::new(), suppress_mkdir: Vec::new() })
                .collect();
            for r in rename {
                let (idx, from, to) = parse_indexed_rename(&r)?;
                specs
                    .get_mut(idx)
                    .ok_or_else(|| anyhow::anyhow!("--rename references unknown input index {idx}"))?
                    .renames
                    .push((from, to));
            }
            for s in suppress_mkdir {
                let (idx, path) = parse_indexed_path(&s)?;
                specs
                    .get_mut(idx)
                    .ok_or_else(|| anyhow::anyhow!("--suppress-mkdir references unknown input index {idx}"))?
                    .suppress_mkdir
                    .push(path);
            }
            let opts = MergeOptions {
                inputs: specs,
                extra_dirs: extra_dir,
                extra_dirs_log: extra_log,
                extra_dirs_author: extra_author,
                start_at_rev: start_rev,
            };
            commands::merge::run(opts, &output)?;
            Ok(exit::SUCCESS)
        }

        Commands::Check { files, verify_md5, check_dates, check_missing_kind, all } => {
            let opts = if all {
                commands::check::CheckOptions::all()
            } else {
                commands::check::CheckOptions {
                    verify_md5,
                    check_dates,
                    check_missing_kind,
                    check_authors: false,
                }
            };
            let mut any_issue = false;
            for file in &files {
                any_issue |= commands::check::run(file, &opts)?;
            }
            Ok(if any_issue { exit::USER_ERROR } else { exit::SUCCESS })
        }

        Commands::Log { path, show_nodes } => commands::log::run(&path, show_nodes).map(|()| exit::SUCCESS),
        Commands::Ls { path } => commands::ls::run(&path).map(|()| exit::SUCCESS),
        Commands::Export { src, dst } => commands::export::run(&src, &dst).map(|()| exit::SUCCESS),
        Commands::Join { segments, output } => commands::join::run(&segments, &output).map(|()| exit::SUCCESS),
        Commands::Split { src, boundaries, output_prefix } => {
            commands::split::run(&src, &boundaries, &output_prefix).map(|()| exit::SUCCESS)
        }

        Commands::Sanitize { src, dst, salt, content_mode, tmp_dir } => {
            let mode = match content_mode.as_str() {
                "none" => ContentMode::None,
                "whole-file" => ContentMode::WholeFile,
                "per-line" => ContentMode::PerLine,
                other => anyhow::bail!("unknown --content-mode '{other}' (expected none, whole-file, per-line)"),
            };
            commands::sanitize::run(&src, &dst, &salt, mode, tmp_dir).map(|()| exit::SUCCESS)
        }

        Commands::TransformRevprop { src, dst, name, pattern, replacement } => {
            commands::transform_prop::run_revprop(&src, &dst, &name, Regex::new(&pattern)?, &replacement)
                .map(|()| exit::SUCCESS)
        }

        Commands::TransformNodeprop { src, dst, name, pattern, replacement } => {
            commands::transform_prop::run_nodeprop(&src, &dst, &name, Regex::new(&pattern)?, &replacement)
                .map(|()| exit::SUCCESS)
        }

        Commands::Cvs2svnfix { src, dst } => commands::cvs2svnfix::run(&src, &dst).map(|()| exit::SUCCESS),

        Commands::ApplyAutoprops { src, dst, config, apply_to_change } => {
            commands::apply_autoprops::run(&src, &dst, &config, apply_to_change).map(|()| exit::SUCCESS)
        }
    }
}

fn parse_indexed_rename(spec: &str) -> Result<(usize, String, String)> {
    let mut parts = spec.splitn(3, ':');
    let idx = parts.next().ok_or_else(|| anyhow::anyhow!("malformed --rename '{spec}'"))?;
    let from = parts.next().ok_or_else(|| anyhow::anyhow!("malformed --rename '{spec}', expected idx:from:to"))?;
    let to = parts.next().ok_or_else(|| anyhow::anyhow!("malformed --rename '{spec}', expected idx:from:to"))?;
    Ok((idx.parse()?, from.to_string(), to.to_string()))
}

fn parse_indexed_path(spec: &str) -> Result<(usize, String)> {
    let (idx, path) = spec.split_once(':').ok_or_else(|| anyhow::anyhow!("malformed '{spec}', expected idx:path"))?;
    Ok((idx.parse()?, path.to_string()))
}

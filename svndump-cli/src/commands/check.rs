use std::path::Path;

use anyhow::Result;
use svndump_core::{DumpReader, NodeAction};

pub struct CheckOptions {
    pub verify_md5: bool,
    pub check_dates: bool,
    pub check_missing_kind: bool,
    pub check_authors: bool,
}

impl CheckOptions {
    pub fn all() -> Self {
        CheckOptions {
            verify_md5: true,
            check_dates: true,
            check_missing_kind: true,
            check_authors: true,
        }
    }
}

/// Scans one dump file for integrity problems. Never stops at the first
/// finding — every issue is reported, and `Ok(true)` means at least one was.
pub fn run(path: &Path, opts: &CheckOptions) -> Result<bool> {
    let mut reader = DumpReader::open(path)?;
    let mut prev_date: Option<String> = None;
    let mut any_issue = false;

    while reader.read_next_rev()? {
        let rev = reader.current().unwrap();
        let rev_num = rev.number();

        if opts.check_authors && rev_num > 0 && rev.author().is_empty() {
            println!("W r{rev_num}: missing svn:author");
            any_issue = true;
        }

        if opts.check_dates && rev_num > 0 {
            if let Some(prev) = &prev_date {
                if rev.date() <= prev.as_str() {
                    println!("W r{rev_num}: svn:date {} not strictly after previous revision's date", rev.date());
                    any_issue = true;
                }
            }
            prev_date = Some(rev.date().to_string());
        }

        for node in rev.nodes() {
            if opts.check_missing_kind && node.action() != NodeAction::Delete && node.kind().is_none() {
                println!("W r{rev_num}: {} has no Node-kind", node.path());
                any_issue = true;
            }
            if opts.verify_md5 {
                if let Some(text) = node.text() {
                    if let Err(e) = text.verify() {
                        println!("E r{rev_num}: {} {}", node.path(), e);
                        any_issue = true;
                    }
                }
            }
        }
    }
    Ok(any_issue)
}

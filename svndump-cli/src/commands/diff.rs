use std::collections::HashSet;
use std::path::Path;

use anyhow::Result;
use svndump_core::DumpReader;

pub struct DiffOptions {
    pub check_eol: bool,
    pub ignore_kinds: HashSet<String>,
    pub ignore_revprops: HashSet<String>,
    pub ignore_properties: HashSet<String>,
    pub stop_at_first: bool,
}

/// Returns `true` if any non-ignored difference was found.
pub fn run(a: &Path, b: &Path, opts: &DiffOptions) -> Result<bool> {
    let mut ra = DumpReader::open(a)?;
    let mut rb = DumpReader::open(b)?;
    let mut any_diff = false;

    loop {
        let has_a = ra.read_next_rev()?;
        let has_b = rb.read_next_rev()?;
        if !has_a && !has_b {
            break;
        }
        if has_a != has_b {
            println!("D Count: dump files have a different number of revisions");
            any_diff = true;
            break;
        }

        let rev_a = ra.current().unwrap();
        let rev_b = rb.current().unwrap();
        let rev_num = rev_a.number();

        let mut report = |kind: &str, path: &str, detail: &str| -> bool {
            if opts.ignore_kinds.contains(kind) {
                return false;
            }
            println!("D {kind} r{rev_num}: {path} {detail}");
            true
        };

        for name in ["svn:author", "svn:log"] {
            if opts.ignore_revprops.contains(name) {
                continue;
            }
            if rev_a.properties().get_str(name) != rev_b.properties().get_str(name) {
                if report("RevProp", name, "differs") {
                    any_diff = true;
                    if opts.stop_at_first {
                        return Ok(true);
                    }
                }
            }
        }

        let idx_a = rev_a.index();
        let idx_b = rev_b.index();
        for (key, &i) in &idx_a {
            let node_a = rev_a.node(i).unwrap();
            match idx_b.get(key) {
                None => {
                    if report("Path", node_a.path(), &format!("present only in {}", a.display())) {
                        any_diff = true;
                    }
                }
                Some(&j) => {
                    let node_b = rev_b.node(j).unwrap();
                    if node_a.kind() != node_b.kind() && report("Kind", node_a.path(), "kind differs") {
                        any_diff = true;
                    }
                    if let (Some(pa), Some(pb)) = (node_a.properties(), node_b.properties()) {
                        for (name, value) in pa.iter() {
                            if opts.ignore_properties.contains(name) {
                                continue;
                            }
                            if pb.get(name) != Some(value) && report("Property", node_a.path(), &format!("prop {name} differs")) {
                                any_diff = true;
                            }
                        }
                    }
                    if let (Some(ta), Some(tb)) = (node_a.text(), node_b.text()) {
                        if ta.md5 != tb.md5 {
                            let kind = diff_text_kind(ta, tb, opts.check_eol)?;
                            if report(kind, node_a.path(), "content differs") {
                                any_diff = true;
                            }
                        }
                    }
                    if opts.stop_at_first && any_diff {
                        return Ok(true);
                    }
                }
            }
        }
        for (key, &j) in &idx_b {
            if !idx_a.contains_key(key) {
                let node_b = rev_b.node(j).unwrap();
                if report("Path", node_b.path(), &format!("present only in {}", b.display())) {
                    any_diff = true;
                }
            }
        }
    }
    Ok(any_diff)
}

fn diff_text_kind(ta: &svndump_core::TextRef, tb: &svndump_core::TextRef, check_eol: bool) -> Result<&'static str> {
    if !check_eol {
        return Ok("Text");
    }
    let da = ta.read_all()?;
    let db = tb.read_all()?;
    let stripped_a: Vec<u8> = da.iter().copied().filter(|&c| c != b'\r').collect();
    let stripped_b: Vec<u8> = db.iter().copied().filter(|&c| c != b'\r').collect();
    Ok(if stripped_a == stripped_b { "EOL" } else { "Text" })
}

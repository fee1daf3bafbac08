//! EOL normalization: rewrite `\r`-bearing text to a chosen line-ending style.

use std::io::Write;
use std::path::PathBuf;

use regex::Regex;

use crate::date::md5_hex;
use crate::error::Result;
use crate::reader::DumpReader;
use crate::transform::Transformation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EolRule {
    CrlfToLf,
    CrToLf,
    RemoveCr,
}

/// Which nodes are in scope: those carrying `svn:eol-style`, or those whose
/// path matches any of a caller-supplied regex list.
pub enum EolSelector {
    HasEolStyleProperty,
    PathMatches(Vec<Regex>),
}

pub struct EolFix {
    pub selector: EolSelector,
    pub rules: Vec<EolRule>,
    pub tmp_dir: PathBuf,
    /// When set, matched nodes get `svn:eol-style` set to this value.
    pub set_native_style: Option<String>,
}

impl EolFix {
    fn selected(&self, path: &str, has_eol_style: bool) -> bool {
        match &self.selector {
            EolSelector::HasEolStyleProperty => has_eol_style,
            EolSelector::PathMatches(patterns) => patterns.iter().any(|p| p.is_match(path)),
        }
    }

    fn normalize(&self, data: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(data.len());
        let mut i = 0;
        while i < data.len() {
            let b = data[i];
            if b == b'\r' {
                let followed_by_lf = i + 1 < data.len() && data[i + 1] == b'\n';
                if followed_by_lf && self.rules.contains(&EolRule::CrlfToLf) {
                    out.push(b'\n');
                    i += 2;
                    continue;
                }
                if !followed_by_lf && self.rules.contains(&EolRule::CrToLf) {
                    out.push(b'\n');
                    i += 1;
                    continue;
                }
                if self.rules.contains(&EolRule::RemoveCr) {
                    i += 1;
                    continue;
                }
                out.push(b);
                i += 1;
            } else {
                out.push(b);
                i += 1;
            }
        }
        out
    }
}

impl Transformation for EolFix {
    fn apply(&mut self, reader: &mut DumpReader) -> Result<()> {
        let Some(rev) = reader.current_mut() else {
            return Ok(());
        };
        for node in rev.nodes_mut() {
            let has_style = node
                .properties()
                .and_then(|p| p.get_str("svn:eol-style"))
                .is_some();
            if !self.selected(node.path(), has_style) {
                continue;
            }
            let Some(text) = node.text() else { continue };
            let original = text.read_all()?;
            if !original.contains(&b'\r') {
                continue;
            }
            let normalized = self.normalize(&original);
            let md5 = md5_hex(&normalized);
            let len = normalized.len() as u64;

            let mut tmp = tempfile::NamedTempFile::new_in(&self.tmp_dir)?;
            tmp.write_all(&normalized)?;
            let (file, tmp_path) = tmp.keep().map_err(|e| e.error)?;
            drop(file);

            node.set_text_from_file(tmp_path, true, Some(len), Some(md5))?;
            if let Some(style) = &self.set_native_style {
                node.set_property("svn:eol-style", style.clone())?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fix(rules: Vec<EolRule>) -> EolFix {
        EolFix {
            selector: EolSelector::PathMatches(vec![Regex::new(".*").unwrap()]),
            rules,
            tmp_dir: std::env::temp_dir(),
            set_native_style: None,
        }
    }

    #[test]
    fn crlf_and_cr_both_become_lf() {
        let f = fix(vec![EolRule::CrlfToLf, EolRule::CrToLf]);
        let out = f.normalize(b"A\r\nB\rC\n");
        assert_eq!(out, b"A\nB\nC\n");
    }

    #[test]
    fn remove_cr_strips_without_inserting_lf() {
        let f = fix(vec![EolRule::RemoveCr]);
        let out = f.normalize(b"A\rB");
        assert_eq!(out, b"AB");
    }
}

//! Replace log messages, authors, path components and optionally file
//! content with salted MD5 fingerprints, for sharing a dump without leaking
//! its real history.

use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;

use crate::date::md5_hex;
use crate::error::Result;
use crate::node::Node;
use crate::reader::DumpReader;
use crate::transform::Transformation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentMode {
    None,
    WholeFile,
    PerLine,
}

pub struct Sanitizer {
    salt: String,
    authors: HashMap<String, usize>,
    content_mode: ContentMode,
    tmp_dir: PathBuf,
}

impl Sanitizer {
    pub fn new(salt: impl Into<String>, content_mode: ContentMode, tmp_dir: PathBuf) -> Self {
        Sanitizer {
            salt: salt.into(),
            authors: HashMap::new(),
            content_mode,
            tmp_dir,
        }
    }

    /// Consistent integer aliasing: the same author always maps to the same name.
    fn alias_author(&mut self, author: &str) -> String {
        let next_id = self.authors.len();
        let id = *self.authors.entry(author.to_string()).or_insert(next_id);
        format!("user{id}")
    }

    fn fingerprint(&self, data: &[u8]) -> String {
        let mut buf = Vec::with_capacity(data.len() + self.salt.len());
        buf.extend_from_slice(self.salt.as_bytes());
        buf.extend_from_slice(data);
        md5_hex(&buf)
    }

    fn sanitize_path(&self, path: &str) -> String {
        path.split('/').map(|seg| self.fingerprint(seg.as_bytes())).collect::<Vec<_>>().join("/")
    }

    fn write_replacement(&self, node: &mut Node, data: &[u8]) -> Result<()> {
        let md5 = md5_hex(data);
        let mut tmp = tempfile::NamedTempFile::new_in(&self.tmp_dir)?;
        tmp.write_all(data)?;
        let (file, tmp_path) = tmp.keep().map_err(|e| e.error)?;
        drop(file);
        node.set_text_from_file(tmp_path, true, Some(data.len() as u64), Some(md5))
    }

    fn sanitize_content(&self, data: &[u8]) -> Vec<u8> {
        match self.content_mode {
            ContentMode::None => data.to_vec(),
            ContentMode::WholeFile => self.fingerprint(data).into_bytes(),
            ContentMode::PerLine => {
                let trailing_newline = data.ends_with(b"\n");
                let body = if trailing_newline { &data[..data.len() - 1] } else { data };
                let mut out = Vec::new();
                for line in body.split(|&b| b == b'\n') {
                    out.extend_from_slice(self.fingerprint(line).as_bytes());
                    out.push(b'\n');
                }
                out
            }
        }
    }
}

impl Transformation for Sanitizer {
    fn apply(&mut self, reader: &mut DumpReader) -> Result<()> {
        let Some(rev) = reader.current_mut() else {
            return Ok(());
        };

        let author = rev.author().to_string();
        if !author.is_empty() {
            let alias = self.alias_author(&author);
            rev.properties_mut().set("svn:author", alias);
        }
        let log = rev.log().to_string();
        if !log.is_empty() {
            let fp = self.fingerprint(log.as_bytes());
            rev.properties_mut().set("svn:log", fp);
        }

        for node in rev.nodes_mut() {
            let new_path = self.sanitize_path(node.path());
            node.set_path(new_path);

            if let Some((cf_path, cf_rev)) = node.copy_from().cloned() {
                let sanitized = self.sanitize_path(&cf_path);
                node.clear_copy_from();
                node.set_copy_from(sanitized, cf_rev)?;
            }

            if self.content_mode != ContentMode::None {
                if let Some(text) = node.text().cloned() {
                    let data = text.read_all()?;
                    let replaced = self.sanitize_content(&data);
                    self.write_replacement(node, &replaced)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_author_maps_to_same_alias() {
        let mut s = Sanitizer::new("salt", ContentMode::None, std::env::temp_dir());
        assert_eq!(s.alias_author("alice"), s.alias_author("alice"));
        assert_ne!(s.alias_author("alice"), s.alias_author("bob"));
    }

    #[test]
    fn per_line_preserves_line_count() {
        let s = Sanitizer::new("salt", ContentMode::PerLine, std::env::temp_dir());
        let out = s.sanitize_content(b"a\nb\nc\n");
        assert_eq!(out.iter().filter(|&&b| b == b'\n').count(), 3);
    }

    #[test]
    fn whole_file_mode_collapses_to_one_fingerprint() {
        let s = Sanitizer::new("salt", ContentMode::WholeFile, std::env::temp_dir());
        let out = s.sanitize_content(b"hello world");
        assert_eq!(out.len(), 32);
    }
}

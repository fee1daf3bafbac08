//! Streaming dump-file reader: walks revision and node records without
//! materializing text bodies.

use std::fs;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::node::{Node, NodeAction, NodeKind};
use crate::propset::PropertySet;
use crate::revision::Revision;

const BUF_SIZE: usize = 64 * 1024;
const SUPPORTED_VERSION: &str = "2";

/// Small buffered file reader that tracks its absolute byte offset, so a
/// node's range-style text reference can record exactly where its body
/// starts in the underlying file.
struct CountingReader {
    path: Rc<Path>,
    file: fs::File,
    buf: Vec<u8>,
    buf_pos: usize,
    buf_len: usize,
    base_offset: u64,
    line_no: u64,
}

impl CountingReader {
    fn open(path: Rc<Path>) -> Result<Self> {
        let file = fs::File::open(path.as_ref())?;
        Ok(CountingReader {
            path,
            file,
            buf: vec![0u8; BUF_SIZE],
            buf_pos: 0,
            buf_len: 0,
            base_offset: 0,
            line_no: 0,
        })
    }

    fn position(&self) -> u64 {
        self.base_offset + self.buf_pos as u64
    }

    fn line(&self) -> u64 {
        self.line_no
    }

    fn fill(&mut self) -> Result<usize> {
        if self.buf_pos < self.buf_len {
            return Ok(self.buf_len - self.buf_pos);
        }
        self.base_offset += self.buf_len as u64;
        self.buf_len = self.file.read(&mut self.buf)?;
        self.buf_pos = 0;
        Ok(self.buf_len)
    }

    /// Read one line, trailing `\n` stripped. `Ok(None)` only at clean EOF.
    fn read_line(&mut self) -> Result<Option<String>> {
        let mut out: Vec<u8> = Vec::new();
        loop {
            if self.fill()? == 0 {
                return if out.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(String::from_utf8_lossy(&out).into_owned()))
                };
            }
            let slice = &self.buf[self.buf_pos..self.buf_len];
            if let Some(nl) = slice.iter().position(|&b| b == b'\n') {
                out.extend_from_slice(&slice[..nl]);
                self.buf_pos += nl + 1;
                self.line_no += 1;
                return Ok(Some(String::from_utf8_lossy(&out).into_owned()));
            } else {
                out.extend_from_slice(slice);
                self.buf_pos = self.buf_len;
            }
        }
    }

    fn read_exact_bytes(&mut self, n: u64) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(n as usize);
        let mut remaining = n;
        while remaining > 0 {
            if self.fill()? == 0 {
                return Err(Error::Truncated {
                    path: self.path.to_path_buf(),
                    line: self.line_no,
                    detail: "unexpected EOF reading fixed-length block".into(),
                });
            }
            let avail = (self.buf_len - self.buf_pos) as u64;
            let take = avail.min(remaining) as usize;
            out.extend_from_slice(&self.buf[self.buf_pos..self.buf_pos + take]);
            self.buf_pos += take;
            remaining -= take as u64;
        }
        self.line_no += out.iter().filter(|&&b| b == b'\n').count() as u64;
        Ok(out)
    }

    fn skip_bytes(&mut self, n: u64) -> Result<()> {
        // Mirrors read_exact_bytes but discards; used for the text body itself.
        let mut remaining = n;
        while remaining > 0 {
            if self.fill()? == 0 {
                return Err(Error::Truncated {
                    path: self.path.to_path_buf(),
                    line: self.line_no,
                    detail: "unexpected EOF skipping text block".into(),
                });
            }
            let avail = (self.buf_len - self.buf_pos) as u64;
            let take = avail.min(remaining) as usize;
            self.buf_pos += take;
            remaining -= take as u64;
        }
        Ok(())
    }

    fn seek_to(&mut self, offset: u64) -> Result<()> {
        self.file.seek(SeekFrom::Start(offset))?;
        self.buf_pos = 0;
        self.buf_len = 0;
        self.base_offset = offset;
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq)]
enum ReaderState {
    Ready,
    Eof,
}

pub struct DumpReader {
    path: Rc<Path>,
    cr: CountingReader,
    uuid: Option<String>,
    state: ReaderState,
    current: Option<Revision>,
}

impl DumpReader {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path: Rc<Path> = Rc::from(path.as_ref());
        let mut cr = CountingReader::open(Rc::clone(&path))?;
        let version_line = cr.read_line()?.ok_or_else(|| truncated(&path, &cr, "missing version header"))?;
        let version = version_line
            .strip_prefix("SVN-fs-dump-format-version: ")
            .ok_or_else(|| bad_format(&path, &cr, "missing SVN-fs-dump-format-version header"))?;
        if version != SUPPORTED_VERSION {
            return Err(Error::BadFormat {
                path: path.to_path_buf(),
                line: cr.line(),
                detail: format!("unsupported dump format version {version}"),
            });
        }
        expect_blank(&path, &mut cr)?;

        let mut uuid = None;
        // Peek: either "UUID: ..." + blank, or the first Revision-number: block.
        let saved = cr.position();
        match cr.read_line()? {
            Some(line) if line.starts_with("UUID: ") => {
                uuid = Some(line["UUID: ".len()..].to_string());
                expect_blank(&path, &mut cr)?;
            }
            Some(_) => {
                cr.seek_to(saved)?;
            }
            None => {}
        }

        Ok(DumpReader {
            path,
            cr,
            uuid,
            state: ReaderState::Ready,
            current: None,
        })
    }

    pub fn uuid(&self) -> Option<&str> {
        self.uuid.as_deref()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn shared_path(&self) -> Rc<Path> {
        Rc::clone(&self.path)
    }

    /// Advance to the next revision. `Ok(false)` at clean EOF, after which
    /// the reader is terminal and further calls keep returning `false`.
    pub fn read_next_rev(&mut self) -> Result<bool> {
        if self.state == ReaderState::Eof {
            return Ok(false);
        }
        let rev_number = match self.next_nonblank_line()? {
            None => {
                self.state = ReaderState::Eof;
                return Ok(false);
            }
            Some((_, line)) => {
                let n = line.strip_prefix("Revision-number: ").ok_or_else(|| {
                    bad_format(&self.path, &self.cr, &format!("expected Revision-number, got '{line}'"))
                })?;
                n.parse::<u64>()
                    .map_err(|_| bad_format(&self.path, &self.cr, "bad revision number"))?
            }
        };

        let (prop_len, _content_len) = self.read_content_length_headers()?;
        expect_blank(&self.path, &mut self.cr)?;
        let prop_bytes = self.cr.read_exact_bytes(prop_len)?;
        let props = parse_property_block(&self.path, self.cr.line(), &prop_bytes)?;
        expect_blank(&self.path, &mut self.cr)?;

        let mut revision = Revision::new(rev_number, props);

        loop {
            let offset_before = self.cr.position();
            match self.next_nonblank_line()? {
                None => break,
                Some((_, line)) => {
                    if line.starts_with("Revision-number:") {
                        self.cr.seek_to(offset_before)?;
                        break;
                    } else if let Some(rest) = line.strip_prefix("Node-path: ") {
                        let node = self.read_node_record(rest)?;
                        revision.push_node(node);
                    } else {
                        return Err(bad_format(&self.path, &self.cr, &format!("unexpected line '{line}'")));
                    }
                }
            }
        }

        self.current = Some(revision);
        Ok(true)
    }

    fn read_node_record(&mut self, path: &str) -> Result<Node> {
        let mut kind: Option<NodeKind> = None;
        let mut action: Option<NodeAction> = None;
        let mut copy_from: Option<(String, u64)> = None;
        let mut prop_len: u64 = 0;
        let mut text_len: Option<u64> = None;
        let mut text_md5: Option<String> = None;

        loop {
            let line = self
                .cr
                .read_line()?
                .ok_or_else(|| truncated(&self.path, &self.cr, "EOF inside node header"))?;
            if line.is_empty() {
                break;
            }
            if let Some(v) = line.strip_prefix("Node-kind: ") {
                kind = Some(
                    NodeKind::from_str(v)
                        .ok_or_else(|| bad_format(&self.path, &self.cr, &format!("bad Node-kind '{v}'")))?,
                );
            } else if let Some(v) = line.strip_prefix("Node-action: ") {
                action = Some(
                    NodeAction::from_str(v)
                        .ok_or_else(|| bad_format(&self.path, &self.cr, &format!("bad Node-action '{v}'")))?,
                );
            } else if let Some(v) = line.strip_prefix("Node-copyfrom-rev: ") {
                let rev = v
                    .parse::<u64>()
                    .map_err(|_| bad_format(&self.path, &self.cr, "bad Node-copyfrom-rev"))?;
                copy_from = Some((copy_from.map(|(p, _)| p).unwrap_or_default(), rev));
            } else if let Some(v) = line.strip_prefix("Node-copyfrom-path: ") {
                let rev = copy_from.as_ref().map(|(_, r)| *r).unwrap_or(0);
                copy_from = Some((v.to_string(), rev));
            } else if let Some(v) = line.strip_prefix("Prop-content-length: ") {
                prop_len = v
                    .parse::<u64>()
                    .map_err(|_| bad_format(&self.path, &self.cr, "bad Prop-content-length"))?;
            } else if let Some(v) = line.strip_prefix("Text-content-length: ") {
                text_len = Some(
                    v.parse::<u64>()
                        .map_err(|_| bad_format(&self.path, &self.cr, "bad Text-content-length"))?,
                );
            } else if let Some(v) = line.strip_prefix("Text-content-md5: ") {
                text_md5 = Some(v.to_string());
            } else if line.starts_with("Content-length: ") || line.starts_with("Text-content-sha1: ") {
                // Declarative / unused by this engine.
            } else {
                return Err(bad_format(&self.path, &self.cr, &format!("unknown node header '{line}'")));
            }
        }

        let action = action.ok_or_else(|| bad_format(&self.path, &self.cr, "node record missing Node-action"))?;
        let mut node = Node::new(path, action, kind)?;

        if action == NodeAction::Delete {
            return Ok(node);
        }

        if let Some((cf_path, cf_rev)) = copy_from {
            node.set_copy_from(cf_path, cf_rev)?;
        }

        if prop_len > 0 {
            let prop_bytes = self.cr.read_exact_bytes(prop_len)?;
            let props = parse_property_block(&self.path, self.cr.line(), &prop_bytes)?;
            node.set_properties(props)?;
        }

        if let Some(len) = text_len {
            let offset = self.cr.position();
            self.cr.skip_bytes(len)?;
            // One trailing newline terminates the text block.
            self.cr.skip_bytes(1)?;
            let md5 = text_md5.unwrap_or_default();
            node.set_text_from_range(self.shared_path(), offset, len, md5)?;
        }

        Ok(node)
    }

    fn read_content_length_headers(&mut self) -> Result<(u64, u64)> {
        let mut prop_len = 0u64;
        let mut content_len = 0u64;
        loop {
            let line = self
                .cr
                .read_line()?
                .ok_or_else(|| truncated(&self.path, &self.cr, "EOF inside revision header"))?;
            if line.is_empty() {
                break;
            }
            if let Some(v) = line.strip_prefix("Prop-content-length: ") {
                prop_len = v
                    .parse::<u64>()
                    .map_err(|_| bad_format(&self.path, &self.cr, "bad Prop-content-length"))?;
            } else if let Some(v) = line.strip_prefix("Content-length: ") {
                content_len = v
                    .parse::<u64>()
                    .map_err(|_| bad_format(&self.path, &self.cr, "bad Content-length"))?;
            } else {
                return Err(bad_format(&self.path, &self.cr, &format!("unknown revision header '{line}'")));
            }
        }
        Ok((prop_len, content_len))
    }

    fn next_nonblank_line(&mut self) -> Result<Option<(u64, String)>> {
        loop {
            let offset = self.cr.position();
            match self.cr.read_line()? {
                None => return Ok(None),
                Some(line) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    return Ok(Some((offset, line)));
                }
            }
        }
    }

    pub fn current_rev_number(&self) -> Option<u64> {
        self.current.as_ref().map(Revision::number)
    }

    pub fn current(&self) -> Option<&Revision> {
        self.current.as_ref()
    }

    pub fn current_mut(&mut self) -> Option<&mut Revision> {
        self.current.as_mut()
    }

    pub fn is_eof(&self) -> bool {
        self.state == ReaderState::Eof
    }
}

fn expect_blank(path: &Path, cr: &mut CountingReader) -> Result<()> {
    match cr.read_line()? {
        Some(line) if line.trim().is_empty() => Ok(()),
        Some(line) => Err(bad_format(path, cr, &format!("expected blank line, got '{line}'"))),
        None => Err(truncated(path, cr, "expected blank line, got EOF")),
    }
}

fn bad_format(path: &Path, cr: &CountingReader, detail: &str) -> Error {
    Error::BadFormat {
        path: path.to_path_buf(),
        line: cr.line(),
        detail: detail.to_string(),
    }
}

fn truncated(path: &Path, cr: &CountingReader, detail: &str) -> Error {
    Error::Truncated {
        path: path.to_path_buf(),
        line: cr.line(),
        detail: detail.to_string(),
    }
}

/// Parse a raw `K/V/D ... PROPS-END` block. Binary safe: name/value bytes
/// are taken by exact declared length, never by scanning for a delimiter.
fn parse_property_block(path: &Path, line_hint: u64, data: &[u8]) -> Result<PropertySet> {
    let mut props = PropertySet::new();
    let mut pos = 0usize;
    loop {
        let line_end = find_newline(data, pos).ok_or_else(|| Error::BadFormat {
            path: path.to_path_buf(),
            line: line_hint,
            detail: "unterminated property header line".into(),
        })?;
        let line = &data[pos..line_end];
        pos = line_end + 1;
        if line == b"PROPS-END" {
            break;
        }
        if let Some(rest) = line.strip_prefix(b"K ") {
            let n = parse_usize(path, line_hint, rest)?;
            let name = take_exact(path, line_hint, data, &mut pos, n)?;
            pos += 1; // trailing newline after name
            let line2_end = find_newline(data, pos).ok_or_else(|| Error::BadFormat {
                path: path.to_path_buf(),
                line: line_hint,
                detail: "unterminated V header line".into(),
            })?;
            let line2 = &data[pos..line2_end];
            pos = line2_end + 1;
            let vrest = line2.strip_prefix(b"V ").ok_or_else(|| Error::BadFormat {
                path: path.to_path_buf(),
                line: line_hint,
                detail: "expected V header after K".into(),
            })?;
            let m = parse_usize(path, line_hint, vrest)?;
            let value = take_exact(path, line_hint, data, &mut pos, m)?;
            pos += 1;
            props.set(
                String::from_utf8_lossy(name).into_owned(),
                String::from_utf8_lossy(value).into_owned(),
            );
        } else if let Some(rest) = line.strip_prefix(b"D ") {
            let n = parse_usize(path, line_hint, rest)?;
            let name = take_exact(path, line_hint, data, &mut pos, n)?;
            pos += 1;
            props.delete_entry(String::from_utf8_lossy(name).into_owned());
        } else {
            return Err(Error::BadFormat {
                path: path.to_path_buf(),
                line: line_hint,
                detail: format!("illegal property-block prefix in '{}'", String::from_utf8_lossy(line)),
            });
        }
    }
    Ok(props)
}

fn find_newline(data: &[u8], from: usize) -> Option<usize> {
    data[from..].iter().position(|&b| b == b'\n').map(|i| from + i)
}

fn parse_usize(path: &Path, line_hint: u64, digits: &[u8]) -> Result<usize> {
    std::str::from_utf8(digits)
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .ok_or_else(|| Error::BadFormat {
            path: path.to_path_buf(),
            line: line_hint,
            detail: "expected a non-negative byte count".into(),
        })
}

fn take_exact<'a>(
    path: &Path,
    line_hint: u64,
    data: &'a [u8],
    pos: &mut usize,
    n: usize,
) -> Result<&'a [u8]> {
    if *pos + n > data.len() {
        return Err(Error::Truncated {
            path: path.to_path_buf(),
            line: line_hint,
            detail: "property block shorter than declared length".into(),
        });
    }
    let out = &data[*pos..*pos + n];
    *pos += n;
    Ok(out)
}

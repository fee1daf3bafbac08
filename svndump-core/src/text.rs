//! Deferred text bodies: a node's content is a `(length, md5, source)` triple
//! that is never materialized until something explicitly streams it.
//!
//! Per Design Notes §9 a "range" source stores the *path* of the dump file
//! it came from plus an absolute byte offset, not a handle borrowed from a
//! live `DumpReader`. Each `open()` call reopens that file independently, so
//! a node's text stays readable after the reader that produced it has moved
//! on to the next revision — only the underlying file on disk must still
//! exist and be unmodified.

use std::fs;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::date::{is_valid_md5_hex, md5_hex};
use crate::error::{Error, Result};

/// Where a node's text actually lives.
#[derive(Debug, Clone)]
pub enum TextSource {
    /// A byte range inside a dump file, identified by its path.
    Range { dump_path: Rc<Path>, offset: u64 },
    /// An independent file on disk, optionally owned (removed on drop).
    External {
        file_path: PathBuf,
        delete_on_drop: bool,
    },
}

/// Length, checksum and source of a node's text body.
#[derive(Debug, Clone)]
pub struct TextRef {
    pub length: u64,
    pub md5: String,
    pub source: Rc<TextSource>,
}

impl TextRef {
    pub fn from_range(dump_path: Rc<Path>, offset: u64, length: u64, md5: String) -> Self {
        TextRef {
            length,
            md5,
            source: Rc::new(TextSource::Range { dump_path, offset }),
        }
    }

    /// Build from an external file, computing length/md5 when not supplied.
    pub fn from_file(
        file_path: PathBuf,
        delete_on_drop: bool,
        length: Option<u64>,
        md5: Option<String>,
    ) -> Result<Self> {
        let (length, md5) = match (length, md5) {
            (Some(l), Some(m)) if is_valid_md5_hex(&m) => (l, m),
            _ => {
                let data = fs::read(&file_path)?;
                (data.len() as u64, md5_hex(&data))
            }
        };
        Ok(TextRef {
            length,
            md5,
            source: Rc::new(TextSource::External {
                file_path,
                delete_on_drop,
            }),
        })
    }

    /// Share this reference's source with another node (cheap `Rc` clone).
    pub fn share(&self) -> TextRef {
        TextRef {
            length: self.length,
            md5: self.md5.clone(),
            source: Rc::clone(&self.source),
        }
    }

    pub fn open(&self) -> Result<TextHandle> {
        match self.source.as_ref() {
            TextSource::Range { dump_path, offset } => {
                let mut file = fs::File::open(dump_path.as_ref())?;
                file.seek(SeekFrom::Start(*offset))?;
                Ok(TextHandle {
                    file,
                    remaining: self.length,
                })
            }
            TextSource::External { file_path, .. } => {
                let file = fs::File::open(file_path)?;
                Ok(TextHandle {
                    file,
                    remaining: self.length,
                })
            }
        }
    }

    /// Read the whole body eagerly; only ever used by small callers (tests,
    /// sanitize/eol transforms that must inspect content to decide anything).
    pub fn read_all(&self) -> Result<Vec<u8>> {
        let mut handle = self.open()?;
        let mut out = Vec::with_capacity(self.length as usize);
        loop {
            let chunk = handle.read(64 * 1024)?;
            if chunk.is_empty() {
                break;
            }
            out.extend_from_slice(&chunk);
        }
        Ok(out)
    }

    /// Verify the declared md5 against the actual bytes.
    pub fn verify(&self) -> Result<()> {
        let data = self.read_all()?;
        let computed = md5_hex(&data);
        if computed != self.md5 {
            return Err(Error::IntegrityFailure {
                path: format!("{:?}", self.source),
                declared: self.md5.clone(),
                computed,
            });
        }
        Ok(())
    }
}

impl Drop for TextSource {
    fn drop(&mut self) {
        if let TextSource::External {
            file_path,
            delete_on_drop: true,
        } = self
        {
            let _ = fs::remove_file(file_path);
        }
    }
}

/// An open read handle obeying the streaming protocol: `read(count)` returns
/// up to `count` bytes (empty at EOF, never `None` — see Design Notes §9),
/// `reopen()` rewinds, dropping releases the handle.
pub struct TextHandle {
    file: fs::File,
    remaining: u64,
}

impl TextHandle {
    pub fn read(&mut self, count: usize) -> Result<Vec<u8>> {
        let want = (count as u64).min(self.remaining) as usize;
        if want == 0 {
            return Ok(Vec::new());
        }
        let mut buf = vec![0u8; want];
        let mut got = 0;
        while got < want {
            let n = self.file.read(&mut buf[got..])?;
            if n == 0 {
                break;
            }
            got += n;
        }
        buf.truncate(got);
        self.remaining -= got as u64;
        Ok(buf)
    }

    pub fn reopen(&mut self, text_ref: &TextRef) -> Result<()> {
        *self = text_ref.open()?;
        Ok(())
    }
}

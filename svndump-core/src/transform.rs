//! The reader-to-writer copy loop and the trait transformations plug into.

use crate::error::Result;
use crate::reader::DumpReader;
use crate::writer::DumpWriter;

/// Mutates a positioned reader's current revision in place before it is
/// handed to the writer. Implementations may touch revision properties,
/// node properties, paths, copy-from targets, or node text.
pub trait Transformation {
    fn apply(&mut self, reader: &mut DumpReader) -> Result<()>;
}

impl<F> Transformation for F
where
    F: FnMut(&mut DumpReader) -> Result<()>,
{
    fn apply(&mut self, reader: &mut DumpReader) -> Result<()> {
        self(reader)
    }
}

/// `while reader.read_next_rev() { transform(reader); writer.add_rev_from_dump(reader) }`
///
/// Tolerates a reader that is already positioned (e.g. just past
/// `DumpWriter::create_like`, which reads ahead to inspect rev 0) by writing
/// its current revision before advancing, rather than unconditionally
/// reading past it.
pub fn copy_with_transform(
    reader: &mut DumpReader,
    writer: &mut DumpWriter,
    transform: &mut dyn Transformation,
) -> Result<u64> {
    let mut last_rev = 0;
    if reader.current().is_none() && !reader.read_next_rev()? {
        return Ok(last_rev);
    }
    loop {
        transform.apply(reader)?;
        last_rev = writer.add_rev_from_dump(reader)?;
        if !reader.read_next_rev()? {
            break;
        }
    }
    Ok(last_rev)
}

/// Plain copy, no transformation.
pub fn copy(reader: &mut DumpReader, writer: &mut DumpWriter) -> Result<u64> {
    let mut last_rev = 0;
    if reader.current().is_none() && !reader.read_next_rev()? {
        return Ok(last_rev);
    }
    loop {
        last_rev = writer.add_rev_from_dump(reader)?;
        if !reader.read_next_rev()? {
            break;
        }
    }
    Ok(last_rev)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::propset::PropertySet;

    #[test]
    fn plain_copy_preserves_revision_count() {
        let src = tempfile::NamedTempFile::new().unwrap();
        {
            let mut w = DumpWriter::create_with_rev0(src.path(), None, "2024-01-01T00:00:00.000000Z").unwrap();
            let mut p = PropertySet::new();
            p.set("svn:date", "2024-01-02T00:00:00.000000Z");
            p.set("svn:author", "a");
            p.set("svn:log", "l");
            w.add_rev(p).unwrap();
            w.close().unwrap();
        }
        let mut r = DumpReader::open(src.path()).unwrap();
        r.read_next_rev().unwrap();
        let dst = tempfile::NamedTempFile::new().unwrap();
        let mut w = DumpWriter::create_like(dst.path(), &mut r).unwrap();
        let last = copy(&mut r, &mut w).unwrap();
        w.close().unwrap();
        assert_eq!(last, 1);
    }
}

use std::path::Path;

use anyhow::Result;
use svndump_core::{DumpReader, DumpWriter};

/// Splits `src` into contiguous segments at each boundary revision number,
/// preserving original revision numbers in every segment so copy-from
/// references within a segment stay valid without remapping.
pub fn run(src: &Path, boundaries: &[u64], dst_prefix: &Path) -> Result<()> {
    let mut reader = DumpReader::open(src)?;
    if !reader.read_next_rev()? {
        return Ok(());
    }

    let mut segment = 0usize;
    let mut boundaries = boundaries.iter().copied().peekable();

    loop {
        let rev_num = reader.current().unwrap().number();
        while boundaries.peek().is_some_and(|&b| rev_num >= b) {
            boundaries.next();
            segment += 1;
        }

        let out_path = dst_prefix.with_extension(format!("{segment}.svndump"));
        let mut writer = DumpWriter::create_like(&out_path, &mut reader)?;
        let next_boundary = boundaries.peek().copied();

        loop {
            let at_boundary = reader
                .current()
                .map(|r| next_boundary.is_some_and(|b| r.number() >= b))
                .unwrap_or(true);
            if at_boundary {
                break;
            }
            writer.add_rev_from_dump(&reader)?;
            if !reader.read_next_rev()? {
                writer.close()?;
                tracing::info!(segments = segment + 1, "split complete");
                return Ok(());
            }
        }
        writer.close()?;
    }
}

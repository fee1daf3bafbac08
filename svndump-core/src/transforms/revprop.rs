//! Revision-property regex replace.

use regex::Regex;

use crate::error::Result;
use crate::reader::DumpReader;
use crate::transform::Transformation;

pub struct RevPropReplace {
    pub name: String,
    pub pattern: Regex,
    pub replacement: String,
}

impl RevPropReplace {
    pub fn new(name: impl Into<String>, pattern: Regex, replacement: impl Into<String>) -> Self {
        RevPropReplace {
            name: name.into(),
            pattern,
            replacement: replacement.into(),
        }
    }
}

impl Transformation for RevPropReplace {
    fn apply(&mut self, reader: &mut DumpReader) -> Result<()> {
        let Some(rev) = reader.current_mut() else {
            return Ok(());
        };
        let props = rev.properties_mut();
        if let Some(current) = props.get_str(&self.name) {
            if self.pattern.is_match(current) {
                let replaced = self.pattern.replace_all(current, self.replacement.as_str()).into_owned();
                props.set(self.name.clone(), replaced);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::propset::PropertySet;
    use crate::revision::Revision;
    use crate::writer::DumpWriter;

    fn reader_at(path: &std::path::Path) -> DumpReader {
        let mut r = DumpReader::open(path).unwrap();
        r.read_next_rev().unwrap();
        r
    }

    #[test]
    fn replaces_matching_log_message() {
        let src = tempfile::NamedTempFile::new().unwrap();
        let mut w = DumpWriter::create_with_rev0(src.path(), None, "2024-01-01T00:00:00.000000Z").unwrap();
        let mut p = PropertySet::new();
        p.set("svn:date", "2024-01-02T00:00:00.000000Z");
        p.set("svn:log", "fixes BUG-123 today");
        w.add_rev(p).unwrap();
        w.close().unwrap();

        let mut r = reader_at(src.path());
        r.read_next_rev().unwrap();
        let mut t = RevPropReplace::new("svn:log", Regex::new(r"BUG-(\d+)").unwrap(), "issue #$1");
        t.apply(&mut r).unwrap();
        let rev: &Revision = r.current().unwrap();
        assert_eq!(rev.log(), "fixes issue #123 today");
    }
}

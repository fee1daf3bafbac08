//! Reads, transforms, and writes Subversion dump files: the lexer/parser,
//! the revision/node object model, the byte-faithful writer, the
//! transformation pipeline, and the chronological merge engine.

pub mod date;
pub mod error;
pub mod merge;
pub mod node;
pub mod propset;
pub mod reader;
pub mod revision;
pub mod text;
pub mod transform;
pub mod transforms;
pub mod writer;

pub use date::{Md5Builder, Timestamp, is_valid_md5_hex, md5_hex};
pub use error::{Error, Result};
pub use merge::{ExtraDirectories, MergeBuilder, MergeInput, PrefixRename};
pub use node::{Node, NodeAction, NodeKind};
pub use propset::{PropValue, PropertySet};
pub use reader::DumpReader;
pub use revision::Revision;
pub use text::{TextHandle, TextRef, TextSource};
pub use transform::{Transformation, copy, copy_with_transform};
pub use writer::DumpWriter;

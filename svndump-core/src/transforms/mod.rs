//! Concrete [`crate::transform::Transformation`] implementations.

pub mod autoprops;
pub mod content;
pub mod cvs2svnfix;
pub mod eolfix;
pub mod nodeprop;
pub mod revprop;
pub mod sanitize;

pub use autoprops::{AutoProps, AutoPropRule, glob_to_regex};
pub use content::{ContentEdit, ContentReplace};
pub use cvs2svnfix::Cvs2SvnFix;
pub use eolfix::{EolFix, EolRule, EolSelector};
pub use nodeprop::NodePropReplace;
pub use revprop::RevPropReplace;
pub use sanitize::{ContentMode, Sanitizer};

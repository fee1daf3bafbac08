//! Auto-props: filename glob → property list, applied to new file content.

use regex::Regex;

use crate::error::Result;
use crate::node::{NodeAction, NodeKind};
use crate::reader::DumpReader;
use crate::transform::Transformation;

/// One compiled glob rule plus the properties it sets when it matches.
pub struct AutoPropRule {
    pub glob: String,
    pattern: Regex,
    pub props: Vec<(String, String)>,
}

impl AutoPropRule {
    pub fn new(glob: impl Into<String>, props: Vec<(String, String)>) -> Self {
        let glob = glob.into();
        let pattern = Regex::new(&format!("^{}$", glob_to_regex(&glob))).expect("glob compiles to valid regex");
        AutoPropRule { glob, pattern, props }
    }

    fn matches(&self, basename: &str) -> bool {
        self.pattern.is_match(basename)
    }
}

const REGEX_METACHARS: &[char] = &['.', '^', '$', '|', '(', ')', '[', ']', '{', '}', '+', '\\'];

/// Escapes regex metacharacters except `?` (any char) and `*` (any run).
pub fn glob_to_regex(glob: &str) -> String {
    let mut out = String::with_capacity(glob.len() * 2);
    for c in glob.chars() {
        match c {
            '?' => out.push('.'),
            '*' => out.push_str(".*"),
            _ => {
                if REGEX_METACHARS.contains(&c) {
                    out.push('\\');
                }
                out.push(c);
            }
        }
    }
    out
}

pub struct AutoProps {
    pub rules: Vec<AutoPropRule>,
    pub apply_to_change: bool,
}

impl AutoProps {
    pub fn new(rules: Vec<AutoPropRule>) -> Self {
        AutoProps {
            rules,
            apply_to_change: false,
        }
    }
}

impl Transformation for AutoProps {
    fn apply(&mut self, reader: &mut DumpReader) -> Result<()> {
        let Some(rev) = reader.current_mut() else {
            return Ok(());
        };
        for node in rev.nodes_mut() {
            let eligible = node.action() == NodeAction::Add
                || (self.apply_to_change && node.action() == NodeAction::Change && node.properties().is_some());
            if !eligible || node.kind() != Some(NodeKind::File) {
                continue;
            }
            let basename = node.path().rsplit('/').next().unwrap_or(node.path());
            for rule in &self.rules {
                if !rule.matches(basename) {
                    continue;
                }
                for (name, value) in &rule.props {
                    let value = if value.is_empty() && (name == "svn:executable" || name == "svn:needs-lock") {
                        "*"
                    } else {
                        value.as_str()
                    };
                    node.set_property(name.clone(), value)?;
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
    fn glob_star_and_question_translate() {
        assert_eq!(glob_to_regex("*.txt"), ".*\\.txt");
        assert_eq!(glob_to_regex("a?c"), "a.c");
    }

    #[test]
    fn empty_value_defaults_to_star_for_reserved_props() {
        let rule = AutoPropRule::new("*.sh", vec![("svn:executable".to_string(), String::new())]);
        assert!(rule.matches("run.sh"));
        assert_eq!(rule.props[0].1, "");
    }
}

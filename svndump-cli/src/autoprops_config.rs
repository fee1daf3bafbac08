//! Reads the `[auto-props]` section of a plain INI-style config file and
//! turns it into compiled glob rules for the `svndump_core` autoprops
//! transform.

use std::path::Path;

use anyhow::{Context, Result};
use svndump_core::transforms::AutoPropRule;

pub fn load_auto_props(path: impl AsRef<Path>) -> Result<Vec<AutoPropRule>> {
    let text = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("reading auto-props config {:?}", path.as_ref()))?;
    Ok(parse_auto_props(&text))
}

fn parse_auto_props(text: &str) -> Vec<AutoPropRule> {
    let mut rules = Vec::new();
    let mut in_section = false;
    let mut pending: Option<(String, String)> = None;

    let flush = |pending: &mut Option<(String, String)>, rules: &mut Vec<AutoPropRule>| {
        if let Some((glob, value)) = pending.take() {
            rules.push(AutoPropRule::new(glob, parse_prop_list(&value)));
        }
    };

    for raw_line in text.lines() {
        let trimmed = raw_line.trim_end();
        if trimmed.trim_start().starts_with(';') || trimmed.trim_start().starts_with('#') {
            continue;
        }
        if trimmed.trim().is_empty() {
            continue;
        }
        if let Some(name) = trimmed.trim().strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
            flush(&mut pending, &mut rules);
            in_section = name.trim() == "auto-props";
            continue;
        }
        if !in_section {
            continue;
        }
        if raw_line.starts_with(' ') || raw_line.starts_with('\t') {
            if let Some((_, value)) = pending.as_mut() {
                value.push(' ');
                value.push_str(trimmed.trim());
            }
            continue;
        }
        flush(&mut pending, &mut rules);
        if let Some((key, value)) = split_kv(trimmed) {
            pending = Some((key, value));
        }
    }
    flush(&mut pending, &mut rules);
    rules
}

fn split_kv(line: &str) -> Option<(String, String)> {
    let sep = line.find(['=', ':'])?;
    let key = line[..sep].trim().to_string();
    let value = line[sep + 1..].trim().to_string();
    Some((key, value))
}

/// `name=value;name=value;...` — value may be empty.
fn parse_prop_list(spec: &str) -> Vec<(String, String)> {
    spec.split(';')
        .filter(|entry| !entry.trim().is_empty())
        .map(|entry| match entry.split_once('=') {
            Some((name, value)) => (name.trim().to_string(), value.trim().to_string()),
            None => (entry.trim().to_string(), String::new()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_section() {
        let cfg = "[auto-props]\n*.txt = svn:eol-style=native\n*.sh = svn:executable=;svn:eol-style=native\n";
        let rules = parse_auto_props(cfg);
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].glob, "*.txt");
        assert_eq!(rules[1].props, vec![("svn:executable".to_string(), String::new()), ("svn:eol-style".to_string(), "native".to_string())]);
    }

    #[test]
    fn ignores_other_sections_and_comments() {
        let cfg = "; comment\n[helpers]\nsome = value\n[auto-props]\n*.png = svn:mime-type=image/png\n";
        let rules = parse_auto_props(cfg);
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].glob, "*.png");
    }
}

use std::collections::HashMap;
use std::io::BufRead;

use crate::error::{CompileError, Result};
use crate::pages::split_entry;

pub type Globals = HashMap<String, String>;

/// Parses `globals.spec`.
///
/// A `prod: value` line overrides the variable defined right before it, but
/// only for production builds. In any other build it is skipped.
pub fn parse_globals<R: BufRead>(reader: R, production: bool) -> Result<Globals> {
    let mut globals = Globals::new();
    let mut current: Option<String> = None;

    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.map_err(|_| CompileError::MalformedLine {
            line: line_no,
            text: "<unreadable>".to_string(),
        })?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (name, value) = split_entry(line_no, line)?;
        if name != "prod" {
            globals.insert(name.to_string(), value.to_string());
            current = Some(name.to_string());
            continue;
        }

        if !production {
            continue;
        }
        match &current {
            Some(var) => {
                log::debug!("Using production value for {var}");
                globals.insert(var.clone(), value.to_string());
            }
            None => log::warn!("Ignoring `prod` on line {line_no}: no variable defined before it"),
        }
    }

    Ok(globals)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPEC: &str = "
        title: Draft
        prod: Final
        base: http://localhost:8000
        prod: https://example.com
        author: Ana
    ";

    #[test]
    fn test_development_ignores_prod_lines() {
        let globals = parse_globals(SPEC.as_bytes(), false).unwrap();
        assert_eq!(globals["title"], "Draft");
        assert_eq!(globals["base"], "http://localhost:8000");
        assert_eq!(globals["author"], "Ana");
        assert!(!globals.contains_key("prod"));
    }

    #[test]
    fn test_production_applies_overrides() {
        let globals = parse_globals(SPEC.as_bytes(), true).unwrap();
        assert_eq!(globals["title"], "Final");
        assert_eq!(globals["base"], "https://example.com");
        assert_eq!(globals["author"], "Ana");
        assert_eq!(globals.len(), 3);
    }

    #[test]
    fn test_redefinition_wins() {
        let globals = parse_globals("a: 1\na: 2\n".as_bytes(), false).unwrap();
        assert_eq!(globals["a"], "2");
    }

    #[test]
    fn test_leading_prod_is_ignored() {
        let globals = parse_globals("prod: x\na: 1\n".as_bytes(), true).unwrap();
        assert_eq!(globals.len(), 1);
        assert_eq!(globals["a"], "1");
    }

    #[test]
    fn test_malformed_line() {
        let err = parse_globals("a: 1\nno separator\n".as_bytes(), false).unwrap_err();
        assert!(matches!(err, CompileError::MalformedLine { line: 2, .. }));
    }
}

//! The line-oriented terminal section of a grammar file.
//!
//! ```text
//! -- comment
//! %case_insensitive
//! DIGITS = [0-9]+
//! num: {{DIGITS}}(\.{{DIGITS}})?
//! ws: <skip> [ \t\r\n]+
//! comment: <skip, lazy> /\*.*\*/
//! ```

use anyhow::{Result, bail};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TerminalDecl {
    pub name: String,
    pub pattern: String,
    pub lazy: bool,
    pub skip: bool,
    pub line_no: usize,
}

#[derive(Debug, Default)]
pub(crate) struct TerminalSection {
    pub case_insensitive: bool,
    pub terminals: Vec<TerminalDecl>,
}

static VAR_DEF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^([A-Z_][A-Z0-9_]*)\s*=\s*(.*)$"#).unwrap());

static TERMINAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^([a-z][A-Za-z0-9_]*)\s*:\s*(?:<([^>]*)>\s*)?(.+)$"#).unwrap()
});

static VAR_IN_PATTERN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\{\{\s*([A-Z_][A-Z0-9_]*)\s*\}\}"#).unwrap());

/// `first_line` is the 1-based number of the section's first line.
pub(crate) fn parse_terminals(input: &str, first_line: usize) -> Result<TerminalSection> {
    let mut section = TerminalSection::default();
    let mut vars: HashMap<String, String> = HashMap::new();

    for (i, raw_line) in input.lines().enumerate() {
        let line_no = first_line + i;
        let line = raw_line.trim();

        if line.is_empty() || line.starts_with("--") {
            continue;
        }

        if line == "%case_insensitive" {
            section.case_insensitive = true;
            continue;
        }

        if let Some(cap) = VAR_DEF_RE.captures(line) {
            let value = expand_vars(cap[2].trim(), &vars)?;
            vars.insert(cap[1].to_string(), value);
            continue;
        }

        if let Some(cap) = TERMINAL_RE.captures(line) {
            let mut decl = TerminalDecl {
                name: cap[1].to_string(),
                pattern: expand_vars(cap[3].trim(), &vars)?,
                lazy: false,
                skip: false,
                line_no,
            };
            if let Some(flags) = cap.get(2) {
                for flag in flags.as_str().split(',').map(str::trim).filter(|s| !s.is_empty()) {
                    match flag {
                        "lazy" => decl.lazy = true,
                        "skip" => decl.skip = true,
                        _ => bail!("Unknown terminal flag {:?} at line {}", flag, line_no),
                    }
                }
            }
            if section.terminals.iter().any(|t| t.name == decl.name) {
                bail!("Terminal {:?} redeclared at line {}", decl.name, line_no);
            }
            section.terminals.push(decl);
            continue;
        }

        bail!("Unrecognized line ({}): {:?}", line_no, line);
    }

    Ok(section)
}

fn expand_vars(input: &str, vars: &HashMap<String, String>) -> Result<String> {
    let mut out = input.to_string();
    let mut seen_any = true;
    let mut depth = 0;

    while seen_any {
        depth += 1;
        if depth > 64 {
            bail!("Variable expansion exceeded depth (possible cycle): {}", input);
        }

        seen_any = false;
        let mut missing: HashSet<String> = HashSet::new();

        out = VAR_IN_PATTERN_RE
            .replace_all(&out, |caps: &Captures| {
                let name = &caps[1];
                match vars.get(name) {
                    Some(val) => {
                        seen_any = true;
                        format!("(?:{})", val)
                    }
                    None => {
                        missing.insert(name.to_string());
                        caps[0].to_string()
                    }
                }
            })
            .to_string();

        if !missing.is_empty() {
            let mut list: Vec<_> = missing.into_iter().collect();
            list.sort();
            bail!("Unknown variable(s): {}", list.join(", "));
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_terminal_section() {
        let input = r#"
-- numbers
%case_insensitive
DIGITS = [0-9]+
NUMBER = {{DIGITS}}(\.{{DIGITS}})?
num: {{NUMBER}}
kw_let: let
ws: <skip> [ \t]+
comment: <skip, lazy> /\*(.|\n)*\*/
"#;
        let section = parse_terminals(input, 1).unwrap();
        assert!(section.case_insensitive);
        assert_eq!(section.terminals.len(), 4);
        let num = &section.terminals[0];
        assert_eq!(num.name, "num");
        assert_eq!(num.pattern, r"(?:(?:[0-9]+)(\.(?:[0-9]+))?)");
        assert_eq!(num.line_no, 6);
        let comment = &section.terminals[3];
        assert!(comment.lazy && comment.skip);
        assert!(!section.terminals[1].skip);
    }

    #[test]
    fn reports_bad_lines() {
        let err = parse_terminals("num: {{MISSING}}", 1).unwrap_err();
        assert!(err.to_string().contains("MISSING"));
        let err = parse_terminals("\n\n?? what", 1).unwrap_err();
        assert!(err.to_string().contains("(3)"));
        let err = parse_terminals("a: <greedy> a", 1).unwrap_err();
        assert!(err.to_string().contains("greedy"));
        assert!(parse_terminals("a: a\na: b", 1).is_err());
    }
}

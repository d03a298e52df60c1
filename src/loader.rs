use std::collections::HashSet;

use crate::error::PolicyError;
use crate::types::{GroupEdge, PolicyRows, ResourcePattern, Rule, is_identifier};

/// Parse policy text into rule and group rows.
///
/// One row per line, fields separated by commas:
///
/// ```text
/// # anonymous callers are unauthenticated
/// g, system:anonymous, system:unauthenticated
/// p, system:unauthenticated, scribble/contents, -, listPosts
/// p, system:unauthenticated, scribble/contents, *, getPost
/// ```
///
/// Blank lines and `#` comments are skipped and duplicate rows are collapsed.
/// Any malformed row fails the whole parse.
///
/// Example:
/// ```rust
/// use scribble_authz::parse_policy;
/// let rows = parse_policy("p, alice, svc, *, read\ng, alice, editors").unwrap();
/// assert_eq!(rows.rules.len(), 1);
/// assert_eq!(rows.groups.len(), 1);
/// ```
pub fn parse_policy(text: &str) -> Result<PolicyRows, PolicyError> {
    let mut rows = PolicyRows::default();
    let mut seen_rules = HashSet::new();
    let mut seen_groups = HashSet::new();

    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = trimmed.split(',').map(str::trim).collect();
        match fields.as_slice() {
            ["p", subject, service, resource, action] => {
                check_fields(line, &[subject, service, action])?;
                let resource = parse_resource(line, resource)?;
                let rule = Rule::new(*subject, *service, resource, *action);
                if seen_rules.insert(rule.clone()) {
                    rows.rules.push(rule);
                }
            }
            ["g", member, group] => {
                check_fields(line, &[member, group])?;
                let edge = GroupEdge::new(*member, *group);
                if seen_groups.insert(edge.clone()) {
                    rows.groups.push(edge);
                }
            }
            ["p", ..] => {
                return Err(PolicyError::ParseError(format!(
                    "line {line}: permission rows take 4 fields (subject, service, resource, action), found {}",
                    fields.len() - 1
                )));
            }
            ["g", ..] => {
                return Err(PolicyError::ParseError(format!(
                    "line {line}: group rows take 2 fields (member, group), found {}",
                    fields.len() - 1
                )));
            }
            other => {
                let kind = other.first().copied().unwrap_or_default();
                return Err(PolicyError::ParseError(format!(
                    "line {line}: unknown row kind '{kind}' (expected 'p' or 'g')"
                )));
            }
        }
    }

    Ok(rows)
}

/// Render rows back into policy text, rules first.
pub fn render_policy(rows: &PolicyRows) -> String {
    let mut out = String::new();
    for rule in &rows.rules {
        out.push_str(&rule.to_string());
        out.push('\n');
    }
    for edge in &rows.groups {
        out.push_str(&render_group_edge(edge));
    }
    out
}

/// Render one group row, newline terminated.
pub fn render_group_edge(edge: &GroupEdge) -> String {
    format!("{edge}\n")
}

fn check_fields(line: usize, fields: &[&&str]) -> Result<(), PolicyError> {
    for field in fields {
        if !is_identifier(field) {
            return Err(PolicyError::ParseError(format!(
                "line {line}: empty or malformed field '{field}'"
            )));
        }
    }
    Ok(())
}

fn parse_resource(line: usize, raw: &str) -> Result<ResourcePattern, PolicyError> {
    raw.parse().map_err(|_| PolicyError::InvalidResourcePattern {
        line,
        pattern: raw.to_string(),
    })
}

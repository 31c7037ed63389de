//! Named-placeholder pattern rendering for document numbers
//!
//! Supports `{name}` substitution and `{name:0Nd}` zero-padded integer
//! directives, plus `{{`/`}}` escapes. This is the subset of directives
//! numbering patterns actually use; anything else is rejected as an invalid
//! pattern.

use std::collections::HashMap;

use crate::types::{LedgerError, LedgerResult};

/// A value substitutable into a pattern placeholder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternValue {
    Int(i64),
    Uint(u64),
    Text(String),
}

impl PatternValue {
    fn render(&self, spec: Option<&str>, name: &str) -> LedgerResult<String> {
        match (self, spec) {
            (PatternValue::Int(v), None) => Ok(v.to_string()),
            (PatternValue::Uint(v), None) => Ok(v.to_string()),
            (PatternValue::Int(v), Some(spec)) => {
                let width = int_spec_width(spec, name)?;
                Ok(format!("{v:0width$}"))
            }
            (PatternValue::Uint(v), Some(spec)) => {
                let width = int_spec_width(spec, name)?;
                Ok(format!("{v:0width$}"))
            }
            (PatternValue::Text(v), None) => Ok(v.clone()),
            (PatternValue::Text(_), Some(spec)) => Err(LedgerError::InvalidPattern(format!(
                "numeric format spec '{spec}' applied to text placeholder '{name}'"
            ))),
        }
    }
}

fn int_spec_width(spec: &str, name: &str) -> LedgerResult<usize> {
    parse_int_spec(spec).ok_or_else(|| {
        LedgerError::InvalidPattern(format!(
            "unsupported format spec '{spec}' for placeholder '{name}'"
        ))
    })
}

/// Parse a `0Nd`/`Nd` format spec into its pad width
fn parse_int_spec(spec: &str) -> Option<usize> {
    let digits = spec.strip_suffix('d')?;
    let digits = digits.strip_prefix('0').unwrap_or(digits);
    if digits.is_empty() {
        return Some(0);
    }
    digits.parse().ok()
}

/// Render `pattern`, substituting every `{name}` / `{name:spec}` placeholder
/// from `values`. Unknown placeholders and malformed braces are errors.
pub fn render_pattern(
    pattern: &str,
    values: &HashMap<String, PatternValue>,
) -> LedgerResult<String> {
    let mut out = String::with_capacity(pattern.len());
    let mut chars = pattern.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' => {
                if chars.peek() == Some(&'{') {
                    chars.next();
                    out.push('{');
                    continue;
                }
                let mut token = String::new();
                let mut closed = false;
                for t in chars.by_ref() {
                    if t == '}' {
                        closed = true;
                        break;
                    }
                    token.push(t);
                }
                if !closed {
                    return Err(LedgerError::InvalidPattern(format!(
                        "unclosed placeholder in pattern '{pattern}'"
                    )));
                }
                let (name, spec) = match token.split_once(':') {
                    Some((name, spec)) => (name, Some(spec)),
                    None => (token.as_str(), None),
                };
                let value = values.get(name).ok_or_else(|| {
                    LedgerError::InvalidPattern(format!(
                        "unknown placeholder '{{{name}}}' in pattern '{pattern}'"
                    ))
                })?;
                out.push_str(&value.render(spec, name)?);
            }
            '}' => {
                if chars.peek() == Some(&'}') {
                    chars.next();
                    out.push('}');
                } else {
                    return Err(LedgerError::InvalidPattern(format!(
                        "stray '}}' in pattern '{pattern}'"
                    )));
                }
            }
            _ => out.push(c),
        }
    }

    Ok(out)
}

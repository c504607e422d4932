//! Splits raw content into frontmatter and the markdown body.
//!
//! Two fence styles are recognized at the very start of the document:
//! `+++` blocks are parsed as TOML, `---` blocks as flat `key: value` lines.

use serde_json::Value;
use tracing::debug;

use darkmatter_shared::{DarkmatterError, Result};

use crate::pipeline::Frontmatter;

/// Separate frontmatter from the markdown body.
///
/// Content without a leading fence yields empty frontmatter and the full text
/// as the body.
pub fn extract(raw: &str) -> Result<(Frontmatter, String)> {
    match split_fenced(raw, "+++") {
        Fenced::Closed { header, body } => {
            let table: toml::Table = toml::from_str(header).map_err(|e| {
                DarkmatterError::frontmatter(format!("invalid TOML frontmatter: {e}"))
            })?;
            let frontmatter = match serde_json::to_value(table) {
                Ok(Value::Object(map)) => map,
                Ok(_) => Frontmatter::new(),
                Err(e) => return Err(DarkmatterError::frontmatter(e.to_string())),
            };
            debug!(keys = frontmatter.len(), "extracted TOML frontmatter");
            return Ok((frontmatter, body.to_string()));
        }
        Fenced::Unclosed => {
            return Err(DarkmatterError::frontmatter(
                "frontmatter opened with `+++` is never closed",
            ));
        }
        Fenced::Absent => {}
    }

    match split_fenced(raw, "---") {
        Fenced::Closed { header, body } => {
            let frontmatter = parse_key_values(header)?;
            debug!(keys = frontmatter.len(), "extracted key/value frontmatter");
            Ok((frontmatter, body.to_string()))
        }
        // A lone leading `---` is a horizontal rule.
        Fenced::Unclosed | Fenced::Absent => Ok((Frontmatter::new(), raw.to_string())),
    }
}

/// Fill in keys missing from `frontmatter`.
pub fn apply_defaults(frontmatter: &mut Frontmatter, defaults: &Frontmatter) {
    for (key, value) in defaults {
        frontmatter
            .entry(key.clone())
            .or_insert_with(|| value.clone());
    }
}

/// Overwrite keys regardless of what the page declared.
pub fn apply_overrides(frontmatter: &mut Frontmatter, overrides: &Frontmatter) {
    for (key, value) in overrides {
        frontmatter.insert(key.clone(), value.clone());
    }
}

enum Fenced<'a> {
    Absent,
    Unclosed,
    Closed { header: &'a str, body: &'a str },
}

/// Locate a block opened by `fence` on the first line of `raw`.
fn split_fenced<'a>(raw: &'a str, fence: &str) -> Fenced<'a> {
    let mut lines = raw.split_inclusive('\n');
    let Some(first) = lines.next() else {
        return Fenced::Absent;
    };
    if first.trim_end() != fence {
        return Fenced::Absent;
    }

    let start = first.len();
    let mut offset = start;
    for line in lines {
        if line.trim_end() == fence {
            return Fenced::Closed {
                header: &raw[start..offset],
                body: &raw[offset + line.len()..],
            };
        }
        offset += line.len();
    }

    Fenced::Unclosed
}

fn parse_key_values(header: &str) -> Result<Frontmatter> {
    let mut frontmatter = Frontmatter::new();

    for (i, line) in header.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            return Err(DarkmatterError::frontmatter(format!(
                "line {} is not a `key: value` pair: {line}",
                i + 1
            )));
        };
        frontmatter.insert(key.trim().to_string(), scalar(value.trim()));
    }

    Ok(frontmatter)
}

fn scalar(value: &str) -> Value {
    if let Some(inner) = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
    {
        return Value::String(inner.to_string());
    }
    match value {
        "" | "~" | "null" => Value::Null,
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => value
            .parse::<i64>()
            .map(Value::from)
            .or_else(|_| value.parse::<f64>().map(Value::from))
            .unwrap_or_else(|_| Value::String(value.to_string())),
    }
}

/// Front-matter parsing for corpus documents.
///
/// Supports a small YAML subset: `key: value` pairs, inline `[a, b]` lists
/// and `- item` continuation lines. Anything else is skipped, so parsing a
/// block never fails; only a block without its closing delimiter is
/// reported, and the loader decides what to do with it.
use std::collections::HashMap;

use thiserror::Error;

/// Marker line that opens and closes a front-matter block.
pub const DELIMITER: &str = "---";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum FrontMatterError {
    #[error("front matter not closed")]
    Unclosed,
}

/// Metadata fields a document may declare. Unknown keys are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrontMatter {
    pub id: Option<String>,
    pub title: Option<String>,
    pub source_url: Option<String>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Value {
    Scalar(String),
    List(Vec<String>),
}

/// Split front matter from document content. Returns `(Option<FrontMatter>, body)`.
///
/// Content that does not start with a delimiter line is all body. The body
/// is trimmed either way.
pub fn parse(content: &str) -> Result<(Option<FrontMatter>, String), FrontMatterError> {
    let lines: Vec<&str> = content.lines().collect();

    if lines.first().map(|l| l.trim()) != Some(DELIMITER) {
        return Ok((None, content.trim().to_string()));
    }

    let end_idx = lines[1..]
        .iter()
        .position(|l| l.trim() == DELIMITER)
        .map(|i| i + 1)
        .ok_or(FrontMatterError::Unclosed)?;

    let block = lines[1..end_idx].join("\n");
    let body = lines[end_idx + 1..].join("\n").trim().to_string();

    Ok((Some(parse_block(&block)), body))
}

/// Parse the lines between the delimiters into typed metadata.
pub fn parse_block(block: &str) -> FrontMatter {
    let mut fields: HashMap<String, Value> = HashMap::new();
    let mut current_key: Option<String> = None;

    for line in block.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(item) = line.strip_prefix('-') {
            let Some(key) = current_key.as_ref() else {
                continue;
            };
            let item = unquote(item.trim());
            if item.is_empty() {
                continue;
            }
            match fields.get_mut(key) {
                Some(Value::List(items)) => items.push(item.to_string()),
                _ => {
                    fields.insert(key.clone(), Value::List(vec![item.to_string()]));
                }
            }
            continue;
        }

        if let Some((key, value)) = line.split_once(':') {
            let key = key.trim();
            if key.is_empty() {
                continue;
            }
            fields.insert(key.to_string(), parse_value(value.trim()));
            current_key = Some(key.to_string());
        }
    }

    FrontMatter {
        id: scalar(&fields, "id"),
        title: scalar(&fields, "title"),
        source_url: scalar(&fields, "source_url"),
        tags: match fields.get("tags") {
            Some(Value::List(items)) => items.clone(),
            Some(Value::Scalar(s)) if !s.is_empty() => vec![s.clone()],
            _ => Vec::new(),
        },
    }
}

fn parse_value(value: &str) -> Value {
    match value
        .strip_prefix('[')
        .and_then(|v| v.strip_suffix(']'))
    {
        Some(inner) => Value::List(
            inner
                .split(',')
                .map(|item| unquote(item.trim()))
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect(),
        ),
        None => Value::Scalar(unquote(value).to_string()),
    }
}

/// Strip one pair of surrounding double quotes. No escape handling.
fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

/// Empty scalars count as absent so callers fall back to their defaults.
fn scalar(fields: &HashMap<String, Value>, key: &str) -> Option<String> {
    match fields.get(key) {
        Some(Value::Scalar(s)) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

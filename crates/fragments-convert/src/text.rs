//! Text family conversions
//!
//! | from | to | behavior |
//! |---|---|---|
//! | markdown | html | CommonMark rendering (tables, strikethrough, task lists) |
//! | html | markdown | tags stripped, remaining text kept verbatim |
//! | json | yaml | parse and re-serialize |
//! | yaml | json | parse and re-serialize (compact) |
//! | csv | json | header row keys, string values |
//! | json | csv | header from the first object's keys |
//! | anything else | | bytes passed through unchanged |
//!
//! CSV handling is deliberately naive: fields are split on `,` with no
//! quoting or escaping.

use std::sync::LazyLock;

use bytes::Bytes;
use pulldown_cmark::{Options, Parser, html};
use regex::Regex;
use serde_json::{Map, Value};

use crate::error::ConvertError;

const SCALAR_COLUMN: &str = "value";

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));

/// Convert between two members of the text family
pub fn convert_text(data: &Bytes, from: &str, to: &str) -> Result<Bytes, ConvertError> {
    let output = match (from, to) {
        ("text/markdown", "text/html") => markdown_to_html(utf8(data, from, to)?).into_bytes(),
        ("text/html", "text/markdown") => html_to_markdown(utf8(data, from, to)?).into_bytes(),
        ("application/json", "application/yaml") => {
            json_to_yaml(data).map_err(|e| ConvertError::failed(from, to, e))?.into_bytes()
        }
        ("application/yaml", "application/json") => {
            yaml_to_json(data).map_err(|e| ConvertError::failed(from, to, e))?
        }
        ("text/csv", "application/json") => {
            csv_to_json(utf8(data, from, to)?).map_err(|e| ConvertError::failed(from, to, e))?
        }
        ("application/json", "text/csv") => {
            json_to_csv(data).map_err(|e| ConvertError::failed(from, to, e))?.into_bytes()
        }
        _ => return Ok(data.clone()),
    };
    Ok(Bytes::from(output))
}

fn utf8<'a>(data: &'a [u8], from: &str, to: &str) -> Result<&'a str, ConvertError> {
    std::str::from_utf8(data).map_err(|e| ConvertError::failed(from, to, e))
}

/// Render markdown to HTML
pub fn markdown_to_html(markdown: &str) -> String {
    let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS;
    let parser = Parser::new_ext(markdown, options);
    let mut html_output = String::new();
    html::push_html(&mut html_output, parser);
    html_output
}

/// Strip every tag; the text between tags is kept as-is
pub fn html_to_markdown(html: &str) -> String {
    TAG_RE.replace_all(html, "").into_owned()
}

fn json_to_yaml(data: &[u8]) -> Result<String, String> {
    let value: Value = serde_json::from_slice(data).map_err(|e| e.to_string())?;
    serde_yaml::to_string(&value).map_err(|e| e.to_string())
}

fn yaml_to_json(data: &[u8]) -> Result<Vec<u8>, String> {
    let value: Value = serde_yaml::from_slice(data).map_err(|e| e.to_string())?;
    serde_json::to_vec(&value).map_err(|e| e.to_string())
}

fn csv_to_json(text: &str) -> Result<Vec<u8>, String> {
    let mut lines = text.lines().filter(|line| !line.trim().is_empty());
    let Some(header) = lines.next() else {
        return Ok(b"[]".to_vec());
    };
    let keys: Vec<&str> = header.split(',').collect();

    let rows: Vec<Value> = lines
        .map(|line| {
            let mut cells = line.split(',');
            let object: Map<String, Value> = keys
                .iter()
                .map(|key| {
                    let cell = cells.next().unwrap_or_default();
                    (key.to_string(), Value::String(cell.to_string()))
                })
                .collect();
            Value::Object(object)
        })
        .collect();

    serde_json::to_vec(&rows).map_err(|e| e.to_string())
}

fn json_to_csv(data: &[u8]) -> Result<String, String> {
    let rows = match serde_json::from_slice::<Value>(data).map_err(|e| e.to_string())? {
        Value::Array(rows) => rows,
        single => vec![single],
    };

    // Scalar and array rows occupy a single `value` column
    let objects: Vec<Map<String, Value>> = rows
        .into_iter()
        .map(|row| match row {
            Value::Object(object) => object,
            other => Map::from_iter([(SCALAR_COLUMN.to_string(), other)]),
        })
        .collect();

    let Some(first) = objects.first() else {
        return Ok(String::new());
    };
    let header: Vec<&str> = first.keys().map(String::as_str).collect();

    let mut lines = Vec::with_capacity(objects.len() + 1);
    lines.push(header.join(","));
    for object in &objects {
        let cells: Vec<String> = header
            .iter()
            .map(|key| object.get(*key).map(cell).unwrap_or_default())
            .collect();
        lines.push(cells.join(","));
    }
    Ok(lines.join("\n"))
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

//! Document layer: overlay a TOML or JSON file on a struct through serde.
//!
//! The struct is serialized to a JSON value, the document is deep-merged on
//! top of it and the result is deserialized back. Keys the document leaves
//! out keep their current value, so a file only needs the settings it
//! changes.
//!
//! In strict mode every key the struct does not consume is reported, with a
//! best-effort line number, and the struct is left untouched.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::TagfigError;

/// Document syntax, picked from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Toml,
    Json,
}

impl Format {
    pub fn from_path(path: &Path) -> Result<Self, TagfigError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Ok(Format::Toml),
            Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(Format::Json),
            _ => Err(TagfigError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

/// Read `path` and overlay it on `config`.
pub fn load_file<C>(config: &mut C, path: &Path, strict: bool) -> Result<(), TagfigError>
where
    C: Serialize + DeserializeOwned,
{
    let format = Format::from_path(path)?;
    let content = std::fs::read_to_string(path).map_err(|e| TagfigError::IoError {
        path: path.to_path_buf(),
        source: e,
    })?;
    load_str(config, &content, format, path, strict)
}

/// Overlay `content` on `config`. `path` only labels errors.
pub fn load_str<C>(
    config: &mut C,
    content: &str,
    format: Format,
    path: &Path,
    strict: bool,
) -> Result<(), TagfigError>
where
    C: Serialize + DeserializeOwned,
{
    let invalid = |source: serde_json::Error| TagfigError::InvalidDocument {
        path: path.to_path_buf(),
        source,
    };

    let overlay = parse_document(content, format, path)?;
    let mut merged = serde_json::to_value(&*config).map_err(invalid)?;
    deep_merge(&mut merged, overlay);

    let mut unknown: Vec<String> = Vec::new();
    let updated: C = serde_ignored::deserialize(merged, |ignored| {
        unknown.push(ignored.to_string());
    })
    .map_err(invalid)?;

    if !unknown.is_empty() {
        if strict {
            return Err(unknown_keys(unknown, content, format, path));
        }
        for key in &unknown {
            log::debug!("file: ignoring unknown key '{key}' in {}", path.display());
        }
    }

    *config = updated;
    log::debug!("file: loaded {}", path.display());
    Ok(())
}

fn parse_document(content: &str, format: Format, path: &Path) -> Result<Value, TagfigError> {
    match format {
        Format::Toml => {
            let table: toml::Table =
                toml::from_str(content).map_err(|e| TagfigError::TomlParse {
                    path: path.to_path_buf(),
                    source: e,
                })?;
            Ok(toml_to_json(toml::Value::Table(table)))
        }
        Format::Json => serde_json::from_str(content).map_err(|e| TagfigError::JsonParse {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// TOML datetimes become their RFC 3339 text; NaN and infinities become null.
fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::from(i),
        toml::Value::Float(f) => serde_json::Number::from_f64(f).map_or(Value::Null, Value::Number),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect::<Map<String, Value>>(),
        ),
    }
}

/// Deep-merge `overlay` into `base`. Objects recurse; anything else in
/// `overlay` replaces what `base` had.
fn deep_merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(slot) => deep_merge(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

fn unknown_keys(keys: Vec<String>, content: &str, format: Format, path: &Path) -> TagfigError {
    let errors = keys
        .into_iter()
        .map(|key| {
            let line = match format {
                Format::Toml => find_toml_line(content, &key),
                Format::Json => find_json_line(content, &key),
            };
            TagfigError::UnknownKey {
                key,
                path: PathBuf::from(path),
                line,
            }
        })
        .collect();
    TagfigError::UnknownKeys(errors)
}

/// 1-indexed line of `dotted_key` in TOML text, tracking `[section]`
/// headers. Quoted keys and inline tables are not handled. 0 if not found.
fn find_toml_line(content: &str, dotted_key: &str) -> usize {
    let segments: Vec<&str> = dotted_key.split('.').collect();
    let Some((leaf, section)) = segments.split_last() else {
        return 0;
    };

    let mut current: Vec<String> = Vec::new();
    for (i, line) in content.lines().enumerate() {
        let trimmed = line.trim();

        if trimmed.starts_with('[') && !trimmed.starts_with("[[") {
            let header = trimmed.trim_start_matches('[').trim_end_matches(']').trim();
            current = header.split('.').map(|s| s.trim().to_string()).collect();
            continue;
        }

        let in_section =
            section.len() == current.len() && section.iter().zip(&current).all(|(a, b)| a == b);
        if in_section
            && let Some(rest) = trimmed.strip_prefix(leaf)
            && rest.trim_start().starts_with('=')
        {
            return i + 1;
        }
    }
    0
}

/// 1-indexed line of the first `"leaf":` in JSON text. 0 if not found.
fn find_json_line(content: &str, dotted_key: &str) -> usize {
    let leaf = dotted_key.rsplit('.').next().unwrap_or(dotted_key);
    let quoted = format!("\"{leaf}\"");
    for (i, line) in content.lines().enumerate() {
        if let Some(pos) = line.find(&quoted)
            && line[pos + quoted.len()..].trim_start().starts_with(':')
        {
            return i + 1;
        }
    }
    0
}

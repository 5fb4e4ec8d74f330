use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TagfigError {
    #[error(
        "omitprefix cannot be used on non-struct field types (field '{field}', tag '{namespace}')"
    )]
    OmitPrefixOnLeaf { field: String, namespace: String },

    #[error("Short alias for '{field}' must be a single character, got '{alias}'")]
    InvalidShortAlias { field: String, alias: String },

    #[error("Invalid value for '{key}': cannot parse '{raw}' as {expected}{}: {reason}", layout_suffix(.layout))]
    Format {
        key: String,
        raw: String,
        expected: &'static str,
        reason: String,
        layout: Option<String>,
    },

    #[error("Type '{type_name}' of field '{field}' is marked no-follow but has no text codec; add #[tagfig(text)]")]
    NoFollowWithoutCodec { field: String, type_name: String },

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("Unknown key '{key}' in {path} (line {line})")]
    UnknownKey {
        key: String,
        path: PathBuf,
        line: usize,
    },

    #[error("Unknown keys in config file")]
    UnknownKeys(Vec<TagfigError>),

    #[error("Failed to parse {path}: {source}")]
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    JsonParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid document {path}: {source}")]
    InvalidDocument {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Unsupported config file format: {0} (expected .toml or .json)")]
    UnsupportedFormat(PathBuf),

    #[error("Failed to read {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[cfg(feature = "clap")]
    #[error(transparent)]
    Flag(#[from] clap::Error),
}

fn layout_suffix(layout: &Option<String>) -> String {
    match layout {
        Some(layout) => format!(" (format '{layout}')"),
        None => String::new(),
    }
}

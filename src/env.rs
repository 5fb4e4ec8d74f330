//! Environment variables: load values into a struct and render an
//! `export` template from it.

use std::collections::HashMap;
use std::fmt::Write;

use crate::codec::time::Layout;
use crate::error::TagfigError;
use crate::node::{Kind, Scalar};
use crate::path::ENV;
use crate::tree::{BuildOptions, Walk, build};

/// Settings for the environment source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvOptions {
    /// Prepended to every key with `_`, e.g. `MYAPP` → `MYAPP_PORT`.
    pub prefix: Option<String>,
    pub build: BuildOptions,
}

impl EnvOptions {
    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            prefix: Some(prefix.to_string()),
            ..Self::default()
        }
    }
}

/// Set every field whose variable is present and non-empty.
///
/// Takes an iterator so tests can pass synthetic data instead of
/// `std::env::vars()`. Returns the number of fields set.
pub fn load<C: Walk + ?Sized>(
    config: &mut C,
    opts: &EnvOptions,
    vars: impl IntoIterator<Item = (String, String)>,
) -> Result<usize, TagfigError> {
    let vars: HashMap<String, String> = vars.into_iter().collect();
    let mut nodes = build(config, &opts.build)?;
    let mut applied = 0;

    for resolved in nodes.resolve_leaves(&ENV, opts.prefix.as_deref())? {
        let Some(raw) = vars.get(&resolved.key).filter(|v| !v.is_empty()) else {
            continue;
        };
        let Some(node) = nodes.get_mut(&resolved.path) else {
            continue;
        };
        node.set_str(raw).map_err(|e| e.at(&resolved.key))?;
        log::debug!("env: {} <- {}", resolved.path, resolved.key);
        applied += 1;
    }

    Ok(applied)
}

/// Render one `export NAME=value` line per field, with the help text and any
/// timestamp layout as a trailing comment.
pub fn template<C: Walk + ?Sized>(config: &mut C, opts: &EnvOptions) -> Result<String, TagfigError> {
    let nodes = build(config, &opts.build)?;
    let mut out = String::new();

    for resolved in nodes.resolve_leaves(&ENV, opts.prefix.as_deref())? {
        let Some(node) = nodes.get(&resolved.path) else {
            continue;
        };
        let _ = write!(out, "export {}={}", resolved.key, node.get_str());

        let mut notes: Vec<String> = Vec::new();
        if let Some(help) = node.tags().get("help").filter(|h| !h.is_empty()) {
            notes.push(help.to_string());
        }
        if matches!(
            node.kind(),
            Kind::Scalar(Scalar::Timestamp) | Kind::Slice(Scalar::Timestamp)
        ) {
            let layout = Layout::resolve(node.tags().get("fmt"));
            notes.push(format!("(format: {})", layout.describe()));
        }
        if !notes.is_empty() {
            let _ = write!(out, " # {}", notes.join(" "));
        }
        out.push('\n');
    }

    Ok(out)
}

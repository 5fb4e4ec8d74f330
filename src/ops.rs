//! Listing and single-key access, addressed by `config` namespace keys
//! (`database.pool_size`).
//!
//! These are the operations behind a `config list` / `config get` /
//! `config set` style subcommand. Results implement `Display` so callers
//! can print them directly.

use std::fmt;

use crate::error::TagfigError;
use crate::path::CONFIG;
use crate::tree::{BuildOptions, NodeSet, Walk, build};

/// Every visible field as `(key, value)`, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub entries: Vec<(String, String)>,
}

impl fmt::Display for Listing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{key} = {value}")?;
        }
        Ok(())
    }
}

/// One field's value and help text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub key: String,
    pub value: String,
    pub help: Option<String>,
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(help) = &self.help {
            writeln!(f, "# {help}")?;
        }
        write!(f, "{} = {}", self.key, self.value)
    }
}

/// Walking materializes `None` sections, so `config` may change shape even
/// though no value is written.
pub fn list<C: Walk + ?Sized>(
    config: &mut C,
    options: &BuildOptions,
) -> Result<Listing, TagfigError> {
    let nodes = build(config, options)?;
    let mut entries = Vec::new();
    for resolved in nodes.resolve_leaves(&CONFIG, None)? {
        if let Some(node) = nodes.get(&resolved.path) {
            entries.push((resolved.key, node.get_str()));
        }
    }
    Ok(Listing { entries })
}

/// Field path behind a `config` key.
fn locate(nodes: &NodeSet<'_>, key: &str) -> Result<String, TagfigError> {
    nodes
        .resolve_leaves(&CONFIG, None)?
        .into_iter()
        .find(|r| r.key == key)
        .map(|r| r.path)
        .ok_or_else(|| TagfigError::KeyNotFound(key.to_string()))
}

pub fn get<C: Walk + ?Sized>(
    config: &mut C,
    key: &str,
    options: &BuildOptions,
) -> Result<Entry, TagfigError> {
    let nodes = build(config, options)?;
    let path = locate(&nodes, key)?;
    let node = nodes
        .get(&path)
        .ok_or_else(|| TagfigError::KeyNotFound(key.to_string()))?;
    Ok(Entry {
        key: key.to_string(),
        value: node.get_str(),
        help: node
            .tags()
            .get("help")
            .filter(|h| !h.is_empty())
            .map(str::to_string),
    })
}

/// Parse `raw` into the field at `key` and return the stored value as
/// re-encoded text. An empty `raw` leaves the field as it was.
pub fn set<C: Walk + ?Sized>(
    config: &mut C,
    key: &str,
    raw: &str,
    options: &BuildOptions,
) -> Result<Entry, TagfigError> {
    let mut nodes = build(config, options)?;
    let path = locate(&nodes, key)?;
    let node = nodes
        .get_mut(&path)
        .ok_or_else(|| TagfigError::KeyNotFound(key.to_string()))?;
    node.set_str(raw).map_err(|e| e.at(key))?;
    log::debug!("ops: {path} <- {key}");
    Ok(Entry {
        key: key.to_string(),
        value: node.get_str(),
        help: None,
    })
}

//! Field descriptors: one [`Node`] per configuration leaf (plus one per
//! nested struct, kept so path resolution can read the ancestors' tags).

use std::collections::BTreeMap;
use std::fmt;

use crate::codec::{CodecError, CodecOptions, FieldValue};

/// Tag value that removes a struct's own name from its descendants' keys.
pub const OMIT_PREFIX: &str = "omitprefix";

/// Tag value that excludes a field from one namespace.
pub const EXCLUDE: &str = "-";

/// Static description of a struct field, emitted by `#[derive(Walk)]`.
#[derive(Debug, Clone, Copy)]
pub struct FieldInfo {
    pub name: &'static str,
    pub type_name: &'static str,
    pub tags: &'static [(&'static str, &'static str)],
}

/// Shape of a scalar value, also used for slice elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scalar {
    String,
    Bool,
    Signed,
    Unsigned,
    Float,
    Duration,
    Timestamp,
}

impl Scalar {
    pub fn describe(self) -> &'static str {
        match self {
            Scalar::String => "string",
            Scalar::Bool => "bool",
            Scalar::Signed => "integer",
            Scalar::Unsigned => "unsigned integer",
            Scalar::Float => "float",
            Scalar::Duration => "duration",
            Scalar::Timestamp => "timestamp",
        }
    }
}

/// Closed set of node shapes, decided once when the tree is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Scalar(Scalar),
    Slice(Scalar),
    /// A struct encoded as a whole through its text codec.
    Opaque,
    /// A nested struct. Never a leaf; only a prefix for its children.
    Struct,
}

impl Kind {
    pub fn is_leaf(self) -> bool {
        !matches!(self, Kind::Struct)
    }

    /// Whether `omitprefix` may be placed on a field of this kind.
    pub fn accepts_omit_prefix(self) -> bool {
        matches!(
            self,
            Kind::Struct | Kind::Opaque | Kind::Scalar(Scalar::Timestamp)
        )
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::Scalar(s) => f.write_str(s.describe()),
            Kind::Slice(s) => write!(f, "list of {}", s.describe()),
            Kind::Opaque => f.write_str("value"),
            Kind::Struct => f.write_str("struct"),
        }
    }
}

/// Declared tags plus runtime overrides. Overrides win and never touch the
/// declared set.
#[derive(Debug, Clone, Default)]
pub struct Tags {
    declared: &'static [(&'static str, &'static str)],
    overrides: Vec<(String, String)>,
}

impl Tags {
    pub fn new(declared: &'static [(&'static str, &'static str)]) -> Self {
        Self {
            declared,
            overrides: Vec::new(),
        }
    }

    /// Raw tag value, including any `,option` suffix.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.overrides
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .or_else(|| {
                self.declared
                    .iter()
                    .find(|(k, _)| *k == key)
                    .map(|(_, v)| *v)
            })
    }

    /// Tag value with the `,option` suffix stripped.
    pub fn name(&self, key: &str) -> Option<&str> {
        self.get(key).map(|v| v.split(',').next().unwrap_or_default())
    }

    /// Whether the tag for `key` carries `,option`.
    pub fn has_option(&self, key: &str, option: &str) -> bool {
        self.get(key)
            .is_some_and(|v| v.split(',').skip(1).any(|o| o.trim() == option))
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.overrides.push((key.to_string(), value.to_string()));
    }

    pub fn declared(&self) -> &'static [(&'static str, &'static str)] {
        self.declared
    }

    /// Effective `(key, value)` pairs, declared order first, overrides applied.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        let mut seen: Vec<&str> = Vec::new();
        let mut out: Vec<(&str, &str)> = Vec::new();
        let keys = self
            .declared
            .iter()
            .map(|(k, _)| *k)
            .chain(self.overrides.iter().map(|(k, _)| k.as_str()));
        for key in keys {
            if seen.contains(&key) {
                continue;
            }
            seen.push(key);
            if let Some(v) = self.get(key) {
                out.push((key, v));
            }
        }
        out.into_iter()
    }
}

/// One addressable field of a walked struct.
pub struct Node<'a> {
    path: Vec<&'static str>,
    type_name: &'static str,
    kind: Kind,
    tags: Tags,
    metadata: BTreeMap<String, String>,
    value: Option<&'a mut dyn FieldValue>,
}

impl<'a> Node<'a> {
    pub(crate) fn leaf(
        path: Vec<&'static str>,
        info: &FieldInfo,
        value: &'a mut dyn FieldValue,
    ) -> Self {
        Self {
            path,
            type_name: info.type_name,
            kind: value.kind(),
            tags: Tags::new(info.tags),
            metadata: BTreeMap::new(),
            value: Some(value),
        }
    }

    pub(crate) fn branch(path: Vec<&'static str>, info: &FieldInfo) -> Self {
        Self {
            path,
            type_name: info.type_name,
            kind: Kind::Struct,
            tags: Tags::new(info.tags),
            metadata: BTreeMap::new(),
            value: None,
        }
    }

    /// Field names from the root down to this node.
    pub fn path(&self) -> &[&'static str] {
        &self.path
    }

    /// Dotted field path, e.g. `database.username`.
    pub fn key(&self) -> String {
        self.path.join(".")
    }

    /// The field's own name.
    pub fn name(&self) -> &'static str {
        self.path.last().copied().unwrap_or_default()
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn is_leaf(&self) -> bool {
        self.kind.is_leaf()
    }

    pub fn tags(&self) -> &Tags {
        &self.tags
    }

    pub fn tags_mut(&mut self) -> &mut Tags {
        &mut self.tags
    }

    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut BTreeMap<String, String> {
        &mut self.metadata
    }

    /// Codec settings derived from this node's `sep`, `fmt` and `,string` tags.
    pub fn codec_options(&self) -> CodecOptions {
        let quoted = ["env", "flag", "config"]
            .iter()
            .any(|ns| self.tags.has_option(ns, "string"));
        CodecOptions {
            separator: self.tags.get("sep").unwrap_or(",").to_string(),
            layout: self.tags.get("fmt").map(str::to_string),
            quoted,
        }
    }

    /// Current value rendered as text.
    ///
    /// # Panics
    ///
    /// Panics on a struct node; only leaves carry values.
    pub fn get_str(&self) -> String {
        let opts = self.codec_options();
        match &self.value {
            Some(value) => value.encode(&opts),
            None => panic!("node '{}' is a struct and has no value", self.key()),
        }
    }

    /// Parse `raw` into the field. An empty string leaves the field untouched.
    ///
    /// # Panics
    ///
    /// Panics on a struct node; only leaves carry values.
    pub fn set_str(&mut self, raw: &str) -> Result<(), CodecError> {
        if raw.is_empty() {
            return Ok(());
        }
        let opts = self.codec_options();
        match &mut self.value {
            Some(value) => value.decode(raw, &opts),
            None => panic!("node '{}' is a struct and has no value", self.key()),
        }
    }
}

impl fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("path", &self.path)
            .field("kind", &self.kind)
            .field("tags", &self.tags)
            .field("metadata", &self.metadata)
            .finish()
    }
}

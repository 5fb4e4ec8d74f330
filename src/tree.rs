//! Tree builder: walks a struct once and produces its [`NodeSet`].
//!
//! `#[derive(Walk)]` implements [`Walk`] for a struct by handing each visible
//! field to [`Walker::field`]. What happens next depends on the field type's
//! [`Visit`] implementation:
//!
//! - scalars, timestamps and lists of scalars become leaves;
//! - `Option<T>` is materialized to `Some(T::default())` and visited as `T`,
//!   `Box<T>` is visited as `T`; skip and no-follow match against `T`;
//! - nested structs become branches and are walked recursively;
//! - maps, fixed arrays, channels, function pointers, boxed closures,
//!   `dyn Any` and lists of structs are skipped.
//!
//! Function pointers and closures taking references (`fn(&str)`) are
//! higher-ranked and match none of the skip impls; mark those fields
//! `#[tagfig(ignore)]`.

use std::collections::{BTreeMap, HashMap};

use crate::codec::{Element, FieldValue};
use crate::error::TagfigError;
use crate::node::{FieldInfo, Kind, Node, OMIT_PREFIX};
use crate::path::NAMESPACES;

/// A struct whose fields can be walked into a [`NodeSet`].
pub trait Walk {
    fn walk<'a>(&'a mut self, walker: &mut Walker<'a>) -> Result<(), TagfigError>;

    /// Text codec for the whole struct, used when it is treated as a leaf.
    fn as_value(&mut self) -> Option<&mut dyn FieldValue> {
        None
    }
}

/// How a field of this type joins the tree.
pub trait Visit {
    fn visit<'a>(&'a mut self, field: &FieldInfo, walker: &mut Walker<'a>)
    -> Result<(), TagfigError>;
}

/// Type-name lists that adjust the walk. Names match either the full type
/// path (`std::any::type_name`) or the bare type name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildOptions {
    /// Struct types kept as single opaque leaves instead of being walked.
    /// Timestamps are always leaves and need no entry here.
    pub no_follow: Vec<String>,
    /// Types whose fields are left out of the tree.
    pub skip: Vec<String>,
}

impl BuildOptions {
    pub fn no_follow(mut self, type_name: &str) -> Self {
        self.no_follow.push(type_name.to_string());
        self
    }

    pub fn skip(mut self, type_name: &str) -> Self {
        self.skip.push(type_name.to_string());
        self
    }
}

/// `crate::server::Endpoint<u8>` → `Endpoint`.
fn bare_type_name(type_name: &str) -> &str {
    let base = type_name.split('<').next().unwrap_or(type_name);
    base.rsplit("::").next().unwrap_or(base)
}

fn listed(names: &[String], type_name: &str) -> bool {
    let bare = bare_type_name(type_name);
    names.iter().any(|n| n == type_name || n == bare)
}

/// Walk state: the current lineage and the nodes collected so far.
pub struct Walker<'a> {
    options: BuildOptions,
    lineage: Vec<&'static str>,
    nodes: NodeSet<'a>,
}

impl<'a> Walker<'a> {
    fn new(options: &BuildOptions) -> Self {
        Self {
            options: options.clone(),
            lineage: Vec::new(),
            nodes: NodeSet::default(),
        }
    }

    fn path_to(&self, field: &FieldInfo) -> Vec<&'static str> {
        let mut path = self.lineage.clone();
        path.push(field.name);
        path
    }

    /// Entry point for every struct field.
    pub fn field<T: Visit + ?Sized>(
        &mut self,
        field: FieldInfo,
        value: &'a mut T,
    ) -> Result<(), TagfigError> {
        if self.skips(&field) {
            return Ok(());
        }
        value.visit(&field, self)
    }

    /// Whether `field`'s type is listed in [`BuildOptions::skip`]. Pointer
    /// visits ask again with the pointee's type.
    pub fn skips(&self, field: &FieldInfo) -> bool {
        listed(&self.options.skip, field.type_name)
    }

    /// Record a leaf.
    pub fn leaf(
        &mut self,
        field: &FieldInfo,
        value: &'a mut dyn FieldValue,
    ) -> Result<(), TagfigError> {
        let node = Node::leaf(self.path_to(field), field, value);
        check_omit_prefix(&node)?;
        self.nodes.insert(node);
        Ok(())
    }

    /// Record a nested struct and walk its fields, or keep it as one leaf if
    /// its type is listed as no-follow.
    pub fn branch<S: Walk + ?Sized>(
        &mut self,
        field: &FieldInfo,
        value: &'a mut S,
    ) -> Result<(), TagfigError> {
        if listed(&self.options.no_follow, field.type_name) {
            let key = self.path_to(field).join(".");
            return match value.as_value() {
                Some(codec) => self.leaf(field, codec),
                None => Err(TagfigError::NoFollowWithoutCodec {
                    field: key,
                    type_name: field.type_name.to_string(),
                }),
            };
        }

        self.nodes.insert(Node::branch(self.path_to(field), field));
        self.lineage.push(field.name);
        let walked = value.walk(self);
        self.lineage.pop();
        walked
    }
}

fn check_omit_prefix(node: &Node<'_>) -> Result<(), TagfigError> {
    if node.kind().accepts_omit_prefix() {
        return Ok(());
    }
    for ns in NAMESPACES {
        if node.tags().name(ns.tag) == Some(OMIT_PREFIX) {
            return Err(TagfigError::OmitPrefixOnLeaf {
                field: node.key(),
                namespace: ns.tag.to_string(),
            });
        }
    }
    Ok(())
}

/// Walk `root` and collect its nodes.
pub fn build<'a, C: Walk + ?Sized>(
    root: &'a mut C,
    options: &BuildOptions,
) -> Result<NodeSet<'a>, TagfigError> {
    let mut walker = Walker::new(options);
    root.walk(&mut walker)?;
    Ok(walker.nodes)
}

/// All nodes of one walked struct, in declaration order, keyed by dotted path.
/// Every node's ancestors are present as struct nodes.
#[derive(Debug, Default)]
pub struct NodeSet<'a> {
    nodes: Vec<Node<'a>>,
    index: HashMap<String, usize>,
}

impl<'a> NodeSet<'a> {
    /// # Panics
    ///
    /// Panics if a node with the same path already exists; the walk visits
    /// each field exactly once, so a collision is a builder bug.
    fn insert(&mut self, node: Node<'a>) {
        let key = node.key();
        assert!(
            !self.index.contains_key(&key),
            "duplicate node path '{key}'"
        );
        self.index.insert(key, self.nodes.len());
        self.nodes.push(node);
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Node<'a>> {
        self.index.get(key).map(|&i| &self.nodes[i])
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Node<'a>> {
        self.index.get(key).map(|&i| &mut self.nodes[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Node<'a>> {
        self.nodes.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Node<'a>> {
        self.nodes.iter_mut()
    }

    /// Leaf nodes only, in declaration order.
    pub fn leaves(&self) -> impl Iterator<Item = &Node<'a>> {
        self.nodes.iter().filter(|n| n.is_leaf())
    }

    /// Direct parent of the node at `key`.
    pub fn parent(&self, key: &str) -> Option<&Node<'a>> {
        let (parent, _) = key.rsplit_once('.')?;
        self.get(parent)
    }

    /// Ancestors of the node at `key`, root first, excluding the node itself.
    pub fn ancestors(&self, key: &str) -> Vec<&Node<'a>> {
        key.match_indices('.')
            .filter_map(|(i, _)| self.get(&key[..i]))
            .collect()
    }

    /// Ancestors followed by the node itself.
    pub fn lineage(&self, key: &str) -> Vec<&Node<'a>> {
        let mut chain = self.ancestors(key);
        chain.extend(self.get(key));
        chain
    }
}

// --- Visit implementations ---

macro_rules! leaf_visit {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Visit for $ty {
                fn visit<'a>(
                    &'a mut self,
                    field: &FieldInfo,
                    walker: &mut Walker<'a>,
                ) -> Result<(), TagfigError> {
                    walker.leaf(field, self)
                }
            }
        )*
    };
}

leaf_visit!(
    String,
    bool,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    f32,
    f64,
    std::time::Duration,
    chrono::DateTime<chrono::Utc>,
    chrono::DateTime<chrono::FixedOffset>,
    chrono::NaiveDateTime,
);

impl<T: Element> Visit for Vec<T> {
    fn visit<'a>(
        &'a mut self,
        field: &FieldInfo,
        walker: &mut Walker<'a>,
    ) -> Result<(), TagfigError> {
        if T::KIND.is_none() {
            return Ok(());
        }
        walker.leaf(field, self)
    }
}

/// The same field, described by the type behind a pointer.
fn pointee<T: ?Sized>(field: &FieldInfo) -> FieldInfo {
    FieldInfo {
        type_name: std::any::type_name::<T>(),
        ..*field
    }
}

impl<T: Visit + Default> Visit for Option<T> {
    fn visit<'a>(
        &'a mut self,
        field: &FieldInfo,
        walker: &mut Walker<'a>,
    ) -> Result<(), TagfigError> {
        let inner = pointee::<T>(field);
        if walker.skips(&inner) {
            return Ok(());
        }
        self.get_or_insert_with(T::default).visit(&inner, walker)
    }
}

impl<T: Visit + ?Sized> Visit for Box<T> {
    fn visit<'a>(
        &'a mut self,
        field: &FieldInfo,
        walker: &mut Walker<'a>,
    ) -> Result<(), TagfigError> {
        let inner = pointee::<T>(field);
        if walker.skips(&inner) {
            return Ok(());
        }
        (**self).visit(&inner, walker)
    }
}

/// Types with no text form. Fields of these types never produce a node.
macro_rules! skipped_visit {
    ($([$($generics:tt)*] $ty:ty),* $(,)?) => {
        $(
            impl<$($generics)*> Visit for $ty {
                fn visit<'a>(
                    &'a mut self,
                    _field: &FieldInfo,
                    _walker: &mut Walker<'a>,
                ) -> Result<(), TagfigError> {
                    Ok(())
                }
            }
        )*
    };
}

skipped_visit!(
    [K, V, S] HashMap<K, V, S>,
    [K, V] BTreeMap<K, V>,
    [T, const N: usize] [T; N],
    [T] std::sync::mpsc::Sender<T>,
    [T] std::sync::mpsc::Receiver<T>,
    [T] std::sync::mpsc::SyncSender<T>,
    [] (),
    [] dyn std::any::Any,
    [] dyn std::any::Any + Send,
    [] dyn std::any::Any + Send + Sync,
);

/// Function pointers, up to six arguments.
macro_rules! skipped_fn_visit {
    ($($arg:ident)*) => {
        skipped_visit!(
            [R, $($arg),*] fn($($arg),*) -> R,
            [R, $($arg),*] unsafe fn($($arg),*) -> R,
        );
    };
}

skipped_fn_visit!();
skipped_fn_visit!(A);
skipped_fn_visit!(A B);
skipped_fn_visit!(A B C);
skipped_fn_visit!(A B C D);
skipped_fn_visit!(A B C D E);
skipped_fn_visit!(A B C D E F);

/// Closures and other callables behind a `Box`.
macro_rules! skipped_closure_visit {
    ($($arg:ident)*) => {
        skipped_visit!(
            [R, $($arg),*] dyn Fn($($arg),*) -> R,
            [R, $($arg),*] dyn Fn($($arg),*) -> R + Send,
            [R, $($arg),*] dyn Fn($($arg),*) -> R + Send + Sync,
            [R, $($arg),*] dyn FnMut($($arg),*) -> R,
            [R, $($arg),*] dyn FnMut($($arg),*) -> R + Send,
        );
    };
}

skipped_closure_visit!();
skipped_closure_visit!(A);
skipped_closure_visit!(A B);
skipped_closure_visit!(A B C);

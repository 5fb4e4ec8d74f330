//! External key resolution.
//!
//! Each source names fields in its own [`Namespace`]: the environment uses
//! `DATABASE_POOL_SIZE`, flags use `database-pool-size`, and listings use
//! `database.pool_size`. A key is built from the node's lineage, one
//! contribution per ancestor and one for the node itself:
//!
//! - no tag: the field name in the namespace's case;
//! - `omitprefix` on an ancestor: nothing, as if the ancestor were absent;
//! - `-`: the node is excluded from the namespace;
//! - anything else: the tag value verbatim.

use heck::{ToKebabCase, ToShoutySnakeCase};

use crate::error::TagfigError;
use crate::node::{EXCLUDE, Node, OMIT_PREFIX};
use crate::tree::NodeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Case {
    /// `pool_size` → `POOL_SIZE`
    UpperSnake,
    /// `pool_size` → `pool-size`
    Kebab,
    /// Field name unchanged.
    Verbatim,
}

impl Case {
    pub fn apply(self, name: &str) -> String {
        match self {
            Case::UpperSnake => name.to_shouty_snake_case(),
            Case::Kebab => name.to_kebab_case(),
            Case::Verbatim => name.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Namespace {
    /// Tag key read from each field, e.g. `env`.
    pub tag: &'static str,
    pub separator: &'static str,
    pub case: Case,
}

pub const ENV: Namespace = Namespace {
    tag: "env",
    separator: "_",
    case: Case::UpperSnake,
};

pub const FLAG: Namespace = Namespace {
    tag: "flag",
    separator: "-",
    case: Case::Kebab,
};

pub const CONFIG: Namespace = Namespace {
    tag: "config",
    separator: ".",
    case: Case::Verbatim,
};

/// Namespaces that understand `omitprefix` and `-`.
pub const NAMESPACES: [Namespace; 3] = [ENV, FLAG, CONFIG];

/// Resolve the key for the last node of `chain` (ancestors first).
///
/// Returns `Ok(None)` when any node in the chain is excluded with `-`.
pub fn resolve(
    chain: &[&Node<'_>],
    ns: &Namespace,
    prefix: Option<&str>,
) -> Result<Option<String>, TagfigError> {
    let mut parts: Vec<String> = Vec::new();
    if let Some(prefix) = prefix.filter(|p| !p.is_empty()) {
        parts.push(prefix.to_string());
    }

    let last = chain.len().saturating_sub(1);
    for (i, node) in chain.iter().enumerate() {
        match node.tags().name(ns.tag) {
            Some(EXCLUDE) => return Ok(None),
            Some(OMIT_PREFIX) => {
                if !node.kind().accepts_omit_prefix() {
                    return Err(TagfigError::OmitPrefixOnLeaf {
                        field: node.key(),
                        namespace: ns.tag.to_string(),
                    });
                }
                // A leaf has nothing below it to inherit from, so it keeps
                // its own name.
                if i == last {
                    parts.push(ns.case.apply(node.name()));
                }
            }
            Some(name) if !name.is_empty() => parts.push(name.to_string()),
            _ => parts.push(ns.case.apply(node.name())),
        }
    }

    Ok(Some(parts.join(ns.separator)))
}

/// One-character flag alias from the `short` tag.
pub fn short_alias(node: &Node<'_>) -> Result<Option<char>, TagfigError> {
    let Some(alias) = node.tags().get("short").filter(|a| !a.is_empty()) else {
        return Ok(None);
    };
    let mut chars = alias.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(Some(c)),
        _ => Err(TagfigError::InvalidShortAlias {
            field: node.key(),
            alias: alias.to_string(),
        }),
    }
}

/// A leaf paired with its resolved external key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    /// Dotted field path, usable with [`NodeSet::get_mut`].
    pub path: String,
    /// Key in the requested namespace.
    pub key: String,
}

impl NodeSet<'_> {
    /// External key of the node at `path`, or `None` if it is excluded.
    pub fn resolve(
        &self,
        path: &str,
        ns: &Namespace,
        prefix: Option<&str>,
    ) -> Result<Option<String>, TagfigError> {
        resolve(&self.lineage(path), ns, prefix)
    }

    /// Keys for every leaf that is not excluded from `ns`, in declaration order.
    pub fn resolve_leaves(
        &self,
        ns: &Namespace,
        prefix: Option<&str>,
    ) -> Result<Vec<Resolved>, TagfigError> {
        let mut out = Vec::new();
        for node in self.leaves() {
            let path = node.key();
            if let Some(key) = self.resolve(&path, ns, prefix)? {
                out.push(Resolved { path, key });
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Walk;
    use crate::tree::{BuildOptions, build};

    #[derive(Walk, Default)]
    struct Credentials {
        pub user_name: String,
        #[tagfig(env = "DB_PASS", flag = "pass")]
        pub password: String,
    }

    #[derive(Walk, Default)]
    struct Database {
        pub pool_size: u32,
        pub credentials: Credentials,
        #[tagfig(env = "omitprefix", flag = "omitprefix", config = "omitprefix")]
        pub auth: Credentials,
    }

    #[derive(Walk, Default)]
    struct App {
        pub log_level: String,
        pub database: Database,
        #[tagfig(env = "-")]
        pub secret: String,
        #[tagfig(env = "-")]
        pub internal: Credentials,
        #[tagfig(short = "p")]
        pub port: u16,
        #[tagfig(short = "vv")]
        pub verbose: bool,
    }

    fn key(set: &NodeSet<'_>, path: &str, ns: &Namespace) -> Option<String> {
        set.resolve(path, ns, None).unwrap()
    }

    #[test]
    fn case_per_namespace() {
        let mut app = App::default();
        let set = build(&mut app, &BuildOptions::default()).unwrap();
        let path = "database.pool_size";
        assert_eq!(key(&set, path, &ENV).unwrap(), "DATABASE_POOL_SIZE");
        assert_eq!(key(&set, path, &FLAG).unwrap(), "database-pool-size");
        assert_eq!(key(&set, path, &CONFIG).unwrap(), "database.pool_size");
    }

    #[test]
    fn custom_names_are_verbatim() {
        let mut app = App::default();
        let set = build(&mut app, &BuildOptions::default()).unwrap();
        let path = "database.credentials.password";
        assert_eq!(key(&set, path, &ENV).unwrap(), "DATABASE_CREDENTIALS_DB_PASS");
        assert_eq!(key(&set, path, &FLAG).unwrap(), "database-credentials-pass");
    }

    #[test]
    fn omitprefix_is_transparent() {
        let mut app = App::default();
        let set = build(&mut app, &BuildOptions::default()).unwrap();
        assert_eq!(
            key(&set, "database.auth.user_name", &ENV).unwrap(),
            "DATABASE_USER_NAME"
        );
        assert_eq!(
            key(&set, "database.auth.password", &FLAG).unwrap(),
            "database-pass"
        );
        assert_eq!(
            key(&set, "database.auth.user_name", &CONFIG).unwrap(),
            "database.user_name"
        );
    }

    #[test]
    fn omitprefix_equals_removing_the_ancestor() {
        let mut app = App::default();
        let set = build(&mut app, &BuildOptions::default()).unwrap();
        let chain = set.lineage("database.auth.user_name");
        let without: Vec<_> = chain
            .iter()
            .copied()
            .filter(|n| n.key() != "database.auth")
            .collect();
        for ns in NAMESPACES {
            assert_eq!(
                resolve(&chain, &ns, None).unwrap(),
                resolve(&without, &ns, None).unwrap()
            );
        }
    }

    #[test]
    fn dash_excludes_field_and_descendants() {
        let mut app = App::default();
        let set = build(&mut app, &BuildOptions::default()).unwrap();
        assert_eq!(key(&set, "secret", &ENV), None);
        assert_eq!(key(&set, "internal.user_name", &ENV), None);
        assert_eq!(key(&set, "secret", &FLAG).unwrap(), "secret");
    }

    #[test]
    fn prefix_is_joined_with_separator() {
        let mut app = App::default();
        let set = build(&mut app, &BuildOptions::default()).unwrap();
        assert_eq!(
            set.resolve("log_level", &ENV, Some("MYAPP")).unwrap().unwrap(),
            "MYAPP_LOG_LEVEL"
        );
        assert_eq!(
            set.resolve("log_level", &ENV, Some("")).unwrap().unwrap(),
            "LOG_LEVEL"
        );
    }

    #[test]
    fn runtime_override_applies() {
        let mut app = App::default();
        let mut set = build(&mut app, &BuildOptions::default()).unwrap();
        set.get_mut("database").unwrap().tags_mut().set("env", "DB");
        assert_eq!(key(&set, "database.pool_size", &ENV).unwrap(), "DB_POOL_SIZE");
    }

    #[test]
    fn runtime_omitprefix_on_leaf_fails() {
        let mut app = App::default();
        let mut set = build(&mut app, &BuildOptions::default()).unwrap();
        set.get_mut("log_level")
            .unwrap()
            .tags_mut()
            .set("env", "omitprefix");
        let err = set.resolve("log_level", &ENV, None).unwrap_err();
        assert!(err.to_string().contains("cannot be used on non-struct field types"));
    }

    #[test]
    fn resolve_leaves_skips_excluded() {
        let mut app = App::default();
        let set = build(&mut app, &BuildOptions::default()).unwrap();
        let keys: Vec<String> = set
            .resolve_leaves(&ENV, None)
            .unwrap()
            .into_iter()
            .map(|r| r.key)
            .collect();
        assert!(keys.contains(&"LOG_LEVEL".to_string()));
        assert!(!keys.contains(&"SECRET".to_string()));
        assert!(!keys.iter().any(|k| k.starts_with("INTERNAL")));
    }

    #[test]
    fn short_aliases() {
        let mut app = App::default();
        let set = build(&mut app, &BuildOptions::default()).unwrap();
        assert_eq!(short_alias(set.get("port").unwrap()).unwrap(), Some('p'));
        assert_eq!(short_alias(set.get("log_level").unwrap()).unwrap(), None);
        let err = short_alias(set.get("verbose").unwrap()).unwrap_err();
        assert!(matches!(err, TagfigError::InvalidShortAlias { .. }));
    }

    #[test]
    fn case_conversion() {
        assert_eq!(Case::UpperSnake.apply("maxConns"), "MAX_CONNS");
        assert_eq!(Case::Kebab.apply("max_conns"), "max-conns");
        assert_eq!(Case::Verbatim.apply("max_conns"), "max_conns");
    }
}

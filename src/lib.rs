//! Tag-driven configuration for Rust structs. Describe your settings once,
//! fill them from flags, environment variables and files.
//!
//! ```ignore
//! #[derive(Walk, Serialize, Deserialize, Default)]
//! struct AppConfig {
//!     /// Address to listen on.
//!     #[tagfig(short = "a")]
//!     pub addr: String,
//!     pub database: Database,
//! }
//!
//! let config: AppConfig = Tagfig::builder()
//!     .app_name("myapp")
//!     .file("myapp.toml")
//!     .args(std::env::args_os())
//!     .load()?;
//! ```
//!
//! That call overlays `myapp.toml` on the struct's defaults, then reads
//! `MYAPP_ADDR` and `MYAPP_DATABASE_URL` from the environment, then parses
//! `--addr`/`-a` and `--database-url` from the command line.
//!
//! # The node tree
//!
//! Everything source-specific builds on one walk of the struct.
//! `#[derive(Walk)]` lets [`build`] visit every public field and produce a
//! [`NodeSet`]: one [`Node`] per leaf value, plus one per nested struct so
//! that the nested struct's tags can shape its children's keys.
//!
//! - Scalars (`String`, `bool`, integers, floats, `Duration`) and timestamps
//!   (`chrono::DateTime`, `NaiveDateTime`) are leaves.
//! - `Vec<T>` of any of those is a list leaf, written `[a,b,c]`.
//! - `Option<T>` and `Box<T>` are see-through. A `None` is replaced by
//!   `Some(T::default())` during the walk, so a nested optional section can
//!   be populated by any source.
//! - Nested structs are walked recursively. Mark a struct
//!   `#[tagfig(text)]` to keep it as one leaf parsed with `FromStr`.
//! - Maps, arrays, channels and lists of structs are skipped.
//!
//! The tree is rebuilt for every source and dropped afterwards. Defaults
//! already present in the struct are what each source sees as the current
//! value.
//!
//! # Tags
//!
//! | Tag | Meaning |
//! |-----|---------|
//! | `env = "NAME"` | Environment key segment for this field |
//! | `flag = "name"` | Flag name segment for this field |
//! | `config = "name"` | Segment in [`ops`] keys (listings, get, set) |
//! | `short = "p"` | One-character flag alias |
//! | `help = "..."` | Help text (defaults to the `///` doc comment) |
//! | `sep = ";"` | List separator (default `,`) |
//! | `fmt = "RFC822"` | Timestamp layout: a well-known name or a strftime pattern |
//! | `ignore` | Drop the field entirely |
//!
//! Two values are special in the `env`, `flag` and `config` tags:
//!
//! - `"-"` excludes the field (and, on a struct, all of its fields) from that
//!   source only.
//! - `"omitprefix"` on a nested struct keeps its name out of its children's
//!   keys: `Outer { inner: Inner { field } }` reads `FIELD` instead of
//!   `INNER_FIELD`. Using it on a plain value is an error.
//!
//! A `,string` suffix on a namespace tag (`config = "ids,string"`, or just
//! `config = ",string"`) makes list elements quoted: `["1","2","3"]`.
//!
//! # Key styles
//!
//! | Source | Style | `database.pool_size` |
//! |--------|-------|----------------------|
//! | Environment | upper snake, `_` | `MYAPP_DATABASE_POOL_SIZE` |
//! | Flags | kebab, `-` | `--database-pool-size` |
//! | Listings | field names, `.` | `database.pool_size` |
//!
//! # Layer precedence
//!
//! ```text
//! Struct defaults       Default::default() or your own value
//!        ↑ overridden by
//! Config files          .file(), in the order added
//!        ↑ overridden by
//! Environment vars      PREFIX_KEY
//!        ↑ overridden by
//! Flags                 --key value
//! ```
//!
//! An empty value never overwrites a field, so an exported-but-empty
//! variable leaves the default in place.
//!
//! # Errors
//!
//! All fallible operations return [`TagfigError`]. Parse failures name the
//! external key and the offending text (and the layout tried, for
//! timestamps); tag misuse names the field.

// Lets `#[derive(Walk)]` output, which refers to `::tagfig`, work in this crate's own tests.
extern crate self as tagfig;

pub mod codec;
pub mod env;
pub mod error;
#[cfg(feature = "clap")]
pub mod flag;
pub mod file;
pub mod node;
pub mod ops;
pub mod path;
pub mod tree;

mod builder;

#[cfg(test)]
mod fixtures;

pub use builder::{Tagfig, TagfigBuilder};
pub use codec::{CodecError, CodecOptions, Element, FieldValue};
pub use error::TagfigError;
pub use node::{FieldInfo, Kind, Node, Scalar, Tags};
pub use path::{CONFIG, ENV, FLAG, Namespace};
pub use tagfig_derive::Walk;
pub use tree::{BuildOptions, NodeSet, Visit, Walk, Walker, build};

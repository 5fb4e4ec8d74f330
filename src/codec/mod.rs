//! Text codec for leaf values.
//!
//! [`FieldValue`] converts a whole field to and from its external string form.
//! [`Element`] does the same for one slice element, which lets `Vec<T>`,
//! `Vec<Option<T>>` and `Vec<Box<T>>` share a single implementation.

pub mod duration;
pub mod scalar;
pub mod slice;
pub mod time;

use crate::error::TagfigError;
use crate::node::{Kind, Scalar};

/// Per-node codec settings, resolved from the node's tags.
#[derive(Debug, Clone, PartialEq)]
pub struct CodecOptions {
    /// Slice separator (`sep` tag, default `,`).
    pub separator: String,
    /// Timestamp layout (`fmt` tag): a well-known name or a strftime pattern.
    pub layout: Option<String>,
    /// `,string` option: slice elements are wrapped in quotes.
    pub quoted: bool,
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self {
            separator: ",".to_string(),
            layout: None,
            quoted: false,
        }
    }
}

/// A value could not be parsed. Lifted into [`TagfigError::Format`] once the
/// caller knows the field's external name.
#[derive(Debug, Clone, PartialEq)]
pub struct CodecError {
    pub raw: String,
    pub expected: &'static str,
    pub reason: String,
    pub layout: Option<String>,
}

impl CodecError {
    pub fn new(raw: &str, expected: &'static str, reason: impl ToString) -> Self {
        Self {
            raw: raw.to_string(),
            expected,
            reason: reason.to_string(),
            layout: None,
        }
    }

    pub fn with_layout(mut self, layout: impl Into<String>) -> Self {
        self.layout = Some(layout.into());
        self
    }

    pub fn at(self, key: impl Into<String>) -> TagfigError {
        TagfigError::Format {
            key: key.into(),
            raw: self.raw,
            expected: self.expected,
            reason: self.reason,
            layout: self.layout,
        }
    }
}

/// A leaf value that can be rendered and parsed as text.
pub trait FieldValue {
    fn kind(&self) -> Kind;
    fn encode(&self, opts: &CodecOptions) -> String;
    fn decode(&mut self, raw: &str, opts: &CodecOptions) -> Result<(), CodecError>;
}

/// A slice element. `KIND` is `None` for non-scalar types, whose slices are
/// skipped by the tree builder and never reach the codec.
pub trait Element: Sized {
    const KIND: Option<Scalar>;

    fn encode_element(&self, opts: &CodecOptions) -> String;
    fn decode_element(raw: &str, opts: &CodecOptions) -> Result<Self, CodecError>;
}

/// An empty element is `None`, and `None` encodes as an empty element.
/// `Some` of a value whose text is empty (`Some(String::new())`) therefore
/// decodes back as `None`.
impl<T: Element> Element for Option<T> {
    const KIND: Option<Scalar> = T::KIND;

    fn encode_element(&self, opts: &CodecOptions) -> String {
        match self {
            Some(v) => v.encode_element(opts),
            None => String::new(),
        }
    }

    fn decode_element(raw: &str, opts: &CodecOptions) -> Result<Self, CodecError> {
        if raw.is_empty() {
            return Ok(None);
        }
        T::decode_element(raw, opts).map(Some)
    }
}

impl<T: Element> Element for Box<T> {
    const KIND: Option<Scalar> = T::KIND;

    fn encode_element(&self, opts: &CodecOptions) -> String {
        (**self).encode_element(opts)
    }

    fn decode_element(raw: &str, opts: &CodecOptions) -> Result<Self, CodecError> {
        T::decode_element(raw, opts).map(Box::new)
    }
}

/// Every scalar is a field value on its own.
macro_rules! scalar_field_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FieldValue for $ty {
                fn kind(&self) -> Kind {
                    match <$ty as Element>::KIND {
                        Some(scalar) => Kind::Scalar(scalar),
                        None => unreachable!(),
                    }
                }

                fn encode(&self, opts: &CodecOptions) -> String {
                    self.encode_element(opts)
                }

                fn decode(&mut self, raw: &str, opts: &CodecOptions) -> Result<(), CodecError> {
                    *self = <$ty as Element>::decode_element(raw, opts)?;
                    Ok(())
                }
            }
        )*
    };
}

scalar_field_value!(
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

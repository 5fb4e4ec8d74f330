//! List values: `[a,b,c]` with a configurable separator.
//!
//! Decoding strips one optional pair of enclosing brackets, splits on the
//! separator and trims each element. With the `,string` option each element
//! may also be wrapped in one pair of matching quotes.

use super::{CodecError, CodecOptions, Element, FieldValue};
use crate::node::Kind;

fn strip_brackets(raw: &str) -> &str {
    let trimmed = raw.trim();
    trimmed
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .unwrap_or(trimmed)
}

fn strip_quotes(element: &str) -> &str {
    for quote in ['"', '\''] {
        if element.len() >= 2 && element.starts_with(quote) && element.ends_with(quote) {
            return &element[1..element.len() - 1];
        }
    }
    element
}

/// The configured separator, or `,` when it is empty.
fn separator(opts: &CodecOptions) -> &str {
    if opts.separator.is_empty() {
        ","
    } else {
        opts.separator.as_str()
    }
}

pub fn decode_list<T: Element>(raw: &str, opts: &CodecOptions) -> Result<Vec<T>, CodecError> {
    let inner = strip_brackets(raw);
    if inner.trim().is_empty() {
        return Ok(Vec::new());
    }
    inner
        .split(separator(opts))
        .map(|element| {
            let element = element.trim();
            let element = if opts.quoted {
                strip_quotes(element)
            } else {
                element
            };
            T::decode_element(element, opts)
        })
        .collect()
}

pub fn encode_list<T: Element>(items: &[T], opts: &CodecOptions) -> String {
    let rendered: Vec<String> = items
        .iter()
        .map(|item| {
            let text = item.encode_element(opts);
            if opts.quoted {
                format!("\"{text}\"")
            } else {
                text
            }
        })
        .collect();
    format!("[{}]", rendered.join(separator(opts)))
}

impl<T: Element> FieldValue for Vec<T> {
    fn kind(&self) -> Kind {
        match T::KIND {
            Some(scalar) => Kind::Slice(scalar),
            None => unreachable!("slices of non-scalar elements are never walked"),
        }
    }

    fn encode(&self, opts: &CodecOptions) -> String {
        encode_list(self, opts)
    }

    fn decode(&mut self, raw: &str, opts: &CodecOptions) -> Result<(), CodecError> {
        *self = decode_list(raw, opts)?;
        Ok(())
    }
}

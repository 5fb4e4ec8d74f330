use super::{CodecError, CodecOptions, Element};
use crate::node::Scalar;

impl Element for String {
    const KIND: Option<Scalar> = Some(Scalar::String);

    fn encode_element(&self, _opts: &CodecOptions) -> String {
        self.clone()
    }

    fn decode_element(raw: &str, _opts: &CodecOptions) -> Result<Self, CodecError> {
        Ok(raw.to_string())
    }
}

impl Element for bool {
    const KIND: Option<Scalar> = Some(Scalar::Bool);

    fn encode_element(&self, _opts: &CodecOptions) -> String {
        self.to_string()
    }

    fn decode_element(raw: &str, _opts: &CodecOptions) -> Result<Self, CodecError> {
        parse_bool(raw)
    }
}

/// `"true"`, `"false"`, or empty (false). Anything else is rejected.
pub fn parse_bool(raw: &str) -> Result<bool, CodecError> {
    match raw {
        "true" => Ok(true),
        "false" | "" => Ok(false),
        _ => Err(CodecError::new(raw, "bool", "expected 'true' or 'false'")),
    }
}

macro_rules! number_element {
    ($kind:expr => $($ty:ty),*) => {
        $(
            impl Element for $ty {
                const KIND: Option<Scalar> = Some($kind);

                fn encode_element(&self, _opts: &CodecOptions) -> String {
                    self.to_string()
                }

                fn decode_element(raw: &str, _opts: &CodecOptions) -> Result<Self, CodecError> {
                    raw.parse::<$ty>()
                        .map_err(|e| CodecError::new(raw, $kind.describe(), e))
                }
            }
        )*
    };
}

number_element!(Scalar::Signed => i8, i16, i32, i64, i128, isize);
number_element!(Scalar::Unsigned => u8, u16, u32, u64, u128, usize);
// `Display` for floats already yields the shortest text that parses back to
// the same value, without trailing zeros.
number_element!(Scalar::Float => f32, f64);

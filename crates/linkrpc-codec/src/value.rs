use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{CodecError, Result};

/// Longest string payload, in bytes, that can be carried in one value.
pub const MAX_STRING_LEN: usize = 255;

/// Wire type of a value.
///
/// The discriminant is the type id written on the wire. Id `0` is never a
/// valid type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ValueType {
    String = 0x01,
    Int8 = 0x02,
    UInt8 = 0x03,
    Int16 = 0x04,
    UInt16 = 0x05,
    Int32 = 0x06,
    UInt32 = 0x07,
    Int64 = 0x08,
    /// Declared for wire compatibility; the codec cannot encode or decode it.
    UInt64 = 0x09,
    Float32 = 0x0C,
}

impl ValueType {
    pub const ALL: [ValueType; 10] = [
        ValueType::String,
        ValueType::Int8,
        ValueType::UInt8,
        ValueType::Int16,
        ValueType::UInt16,
        ValueType::Int32,
        ValueType::UInt32,
        ValueType::Int64,
        ValueType::UInt64,
        ValueType::Float32,
    ];

    /// The type id byte.
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// Fixed wire size in bytes. `0` for `String`, whose size is per value.
    pub const fn size(self) -> usize {
        match self {
            ValueType::String => 0,
            ValueType::Int8 | ValueType::UInt8 => 1,
            ValueType::Int16 | ValueType::UInt16 => 2,
            ValueType::Int32 | ValueType::UInt32 | ValueType::Float32 => 4,
            ValueType::Int64 | ValueType::UInt64 => 8,
        }
    }

    /// Look up a type by its id byte.
    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|ty| ty.id() == id)
    }

    /// Returns true for the integer types.
    pub const fn is_integer(self) -> bool {
        !matches!(self, ValueType::String | ValueType::Float32)
    }

    /// Inclusive range an integer of this type can hold on the wire.
    fn int_range(self) -> Option<(i64, i64)> {
        match self {
            ValueType::Int8 => Some((i8::MIN.into(), i8::MAX.into())),
            ValueType::UInt8 => Some((0, u8::MAX.into())),
            ValueType::Int16 => Some((i16::MIN.into(), i16::MAX.into())),
            ValueType::UInt16 => Some((0, u16::MAX.into())),
            ValueType::Int32 => Some((i32::MIN.into(), i32::MAX.into())),
            ValueType::UInt32 => Some((0, u32::MAX.into())),
            ValueType::Int64 => Some((i64::MIN, i64::MAX)),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            ValueType::String => "STRING",
            ValueType::Int8 => "INT8",
            ValueType::UInt8 => "UINT8",
            ValueType::Int16 => "INT16",
            ValueType::UInt16 => "UINT16",
            ValueType::Int32 => "INT32",
            ValueType::UInt32 => "UINT32",
            ValueType::Int64 => "INT64",
            ValueType::UInt64 => "UINT64",
            ValueType::Float32 => "FLOAT",
        }
    }
}

impl TryFrom<u8> for ValueType {
    type Error = CodecError;

    fn try_from(id: u8) -> Result<Self> {
        Self::from_id(id).ok_or(CodecError::UnknownType(id))
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single typed datum.
///
/// Integer variants hold an `i64` regardless of their wire width; the range
/// is checked when the value is encoded, not when it is built. This lets a
/// caller construct `Value::UInt8(300)` and get a clear error at send time.
///
/// Equality compares the type and the wire payload, so floats compare by
/// bit pattern: a NaN equals itself and `0.0` differs from `-0.0`.
#[derive(Debug, Clone)]
pub enum Value {
    String(String),
    Int8(i64),
    UInt8(i64),
    Int16(i64),
    UInt16(i64),
    Int32(i64),
    UInt32(i64),
    Int64(i64),
    Float32(f32),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Float32(a), Value::Float32(b)) => a.to_bits() == b.to_bits(),
            (a, b) => a.value_type() == b.value_type() && a.as_i64() == b.as_i64(),
        }
    }
}

impl Eq for Value {}

impl Value {
    /// Build an integer value of the given type.
    ///
    /// Returns `None` for non-integer types and for the unsupported `UInt64`.
    pub fn integer(ty: ValueType, value: i64) -> Option<Self> {
        Some(match ty {
            ValueType::Int8 => Value::Int8(value),
            ValueType::UInt8 => Value::UInt8(value),
            ValueType::Int16 => Value::Int16(value),
            ValueType::UInt16 => Value::UInt16(value),
            ValueType::Int32 => Value::Int32(value),
            ValueType::UInt32 => Value::UInt32(value),
            ValueType::Int64 => Value::Int64(value),
            ValueType::String | ValueType::UInt64 | ValueType::Float32 => return None,
        })
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            Value::String(_) => ValueType::String,
            Value::Int8(_) => ValueType::Int8,
            Value::UInt8(_) => ValueType::UInt8,
            Value::Int16(_) => ValueType::Int16,
            Value::UInt16(_) => ValueType::UInt16,
            Value::Int32(_) => ValueType::Int32,
            Value::UInt32(_) => ValueType::UInt32,
            Value::Int64(_) => ValueType::Int64,
            Value::Float32(_) => ValueType::Float32,
        }
    }

    /// Number of bytes this value occupies in the payload region.
    pub fn size(&self) -> usize {
        match self {
            Value::String(s) => string_wire_len(s.len()),
            other => other.value_type().size(),
        }
    }

    /// The integer payload, for any integer variant.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::Int8(v)
            | Value::UInt8(v)
            | Value::Int16(v)
            | Value::UInt16(v)
            | Value::Int32(v)
            | Value::UInt32(v)
            | Value::Int64(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match *self {
            Value::Float32(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Check that the value can be represented on the wire.
    pub fn validate(&self) -> Result<()> {
        match self {
            Value::String(s) => {
                if s.len() > MAX_STRING_LEN {
                    return Err(CodecError::StringTooLong {
                        len: s.len(),
                        max: MAX_STRING_LEN,
                    });
                }
                // A full-length string is sent without its terminator, so a
                // trailing NUL would be indistinguishable from one.
                if s.len() == MAX_STRING_LEN && s.ends_with('\0') {
                    return Err(CodecError::AmbiguousTerminator { len: s.len() });
                }
                Ok(())
            }
            Value::Float32(_) => Ok(()),
            int => {
                let ty = int.value_type();
                let value = int.as_i64().unwrap_or_default();
                match ty.int_range() {
                    Some((min, max)) if (min..=max).contains(&value) => Ok(()),
                    _ => Err(CodecError::OutOfRange { ty, value }),
                }
            }
        }
    }

    /// Encode the payload bytes of this value.
    pub fn encode(&self) -> Result<Bytes> {
        let mut dst = BytesMut::with_capacity(self.size());
        self.encode_into(&mut dst)?;
        Ok(dst.freeze())
    }

    /// Append the payload bytes of this value to `dst`.
    ///
    /// Nothing is written if the value fails validation.
    pub fn encode_into(&self, dst: &mut BytesMut) -> Result<()> {
        self.validate()?;
        match self {
            Value::String(s) => {
                dst.put_slice(s.as_bytes());
                if s.len() < MAX_STRING_LEN {
                    dst.put_u8(0);
                }
            }
            Value::Int8(v) => dst.put_i8(*v as i8),
            Value::UInt8(v) => dst.put_u8(*v as u8),
            Value::Int16(v) => dst.put_i16(*v as i16),
            Value::UInt16(v) => dst.put_u16(*v as u16),
            Value::Int32(v) => dst.put_i32(*v as i32),
            Value::UInt32(v) => dst.put_u32(*v as u32),
            Value::Int64(v) => dst.put_i64(*v),
            Value::Float32(v) => dst.put_f32(*v),
        }
        Ok(())
    }

    /// Decode one value of type `ty` from `buf[offset..offset + length]`.
    ///
    /// `length` is only consulted for strings; fixed-width types always read
    /// their own size. A single trailing NUL is stripped from strings.
    pub fn decode(ty: ValueType, buf: &[u8], offset: usize, length: usize) -> Result<Self> {
        let width = match ty {
            ValueType::String => length,
            ValueType::UInt64 => return Err(CodecError::UnsupportedType(ty)),
            fixed => fixed.size(),
        };
        let end = offset.checked_add(width).ok_or(CodecError::Truncated {
            needed: usize::MAX,
            available: buf.len(),
        })?;
        let bytes = buf.get(offset..end).ok_or(CodecError::Truncated {
            needed: end,
            available: buf.len(),
        })?;

        Ok(match ty {
            ValueType::String => {
                let text = bytes.strip_suffix(&[0u8]).unwrap_or(bytes);
                let text = std::str::from_utf8(text).map_err(|_| CodecError::InvalidUtf8)?;
                Value::String(text.to_owned())
            }
            ValueType::Int8 => Value::Int8(i8::from_be_bytes([bytes[0]]).into()),
            ValueType::UInt8 => Value::UInt8(bytes[0].into()),
            ValueType::Int16 => Value::Int16(i16::from_be_bytes(be(bytes)).into()),
            ValueType::UInt16 => Value::UInt16(u16::from_be_bytes(be(bytes)).into()),
            ValueType::Int32 => Value::Int32(i32::from_be_bytes(be(bytes)).into()),
            ValueType::UInt32 => Value::UInt32(u32::from_be_bytes(be(bytes)).into()),
            ValueType::Int64 => Value::Int64(i64::from_be_bytes(be(bytes))),
            ValueType::Float32 => Value::Float32(f32::from_be_bytes(be(bytes))),
            ValueType::UInt64 => return Err(CodecError::UnsupportedType(ty)),
        })
    }
}

/// Bytes a string of `len` content bytes takes on the wire.
pub(crate) fn string_wire_len(len: usize) -> usize {
    if len < MAX_STRING_LEN {
        len + 1
    } else {
        len
    }
}

fn be<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes[..N]);
    out
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => f.write_str(s),
            Value::Float32(v) => write!(f, "{v}"),
            int => write!(f, "{}", int.as_i64().unwrap_or_default()),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Float32(value)
    }
}

macro_rules! from_int {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::$variant(value.into())
                }
            }
        )*
    };
}

from_int!(i8 => Int8, u8 => UInt8, i16 => Int16, u16 => UInt16, i32 => Int32, u32 => UInt32, i64 => Int64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_is_bitwise_for_floats() {
        assert_eq!(Value::Float32(f32::NAN), Value::Float32(f32::NAN));
        assert_ne!(Value::Float32(0.0), Value::Float32(-0.0));
        assert_eq!(Value::Float32(1.5), Value::Float32(1.5));
        assert_ne!(Value::Int8(1), Value::UInt8(1));
        assert_ne!(Value::Int16(1), Value::Int16(2));
        assert_eq!(Value::from("a"), Value::from("a"));
        assert_ne!(Value::from("1"), Value::Int8(1));
    }

    #[test]
    fn type_ids_are_stable() {
        let ids: Vec<u8> = ValueType::ALL.iter().map(|ty| ty.id()).collect();
        assert_eq!(ids, vec![0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0C]);
        for ty in ValueType::ALL {
            assert_eq!(ValueType::from_id(ty.id()), Some(ty));
        }
    }

    #[test]
    fn id_zero_and_gaps_are_unknown() {
        assert_eq!(ValueType::from_id(0), None);
        assert_eq!(ValueType::try_from(0x0A), Err(CodecError::UnknownType(0x0A)));
        assert_eq!(ValueType::try_from(0xFF), Err(CodecError::UnknownType(0xFF)));
    }

    #[test]
    fn fixed_sizes() {
        assert_eq!(ValueType::String.size(), 0);
        assert_eq!(ValueType::Int8.size(), 1);
        assert_eq!(ValueType::UInt16.size(), 2);
        assert_eq!(ValueType::Float32.size(), 4);
        assert_eq!(ValueType::Int64.size(), 8);
        assert_eq!(ValueType::UInt64.size(), 8);
    }

    #[test]
    fn integers_are_big_endian() {
        assert_eq!(Value::UInt16(0x0102).encode().unwrap().as_ref(), &[0x01, 0x02]);
        assert_eq!(Value::Int16(320).encode().unwrap().as_ref(), &[0x01, 0x40]);
        assert_eq!(
            Value::Int32(-2).encode().unwrap().as_ref(),
            &[0xFF, 0xFF, 0xFF, 0xFE]
        );
        assert_eq!(
            Value::UInt32(0xDEADBEEF).encode().unwrap().as_ref(),
            &[0xDE, 0xAD, 0xBE, 0xEF]
        );
    }

    #[test]
    fn signed_widths_use_twos_complement() {
        assert_eq!(Value::Int8(-10).encode().unwrap().as_ref(), &[0xF6]);
        assert_eq!(
            Value::decode(ValueType::Int8, &[0xF6], 0, 1).unwrap(),
            Value::Int8(-10)
        );
        assert_eq!(
            Value::decode(ValueType::UInt8, &[0xF6], 0, 1).unwrap(),
            Value::UInt8(246)
        );
    }

    #[test]
    fn range_is_checked_on_encode() {
        let err = Value::UInt8(300).encode().unwrap_err();
        assert_eq!(
            err,
            CodecError::OutOfRange {
                ty: ValueType::UInt8,
                value: 300
            }
        );
        assert!(Value::UInt8(-1).encode().is_err());
        assert!(Value::Int8(128).encode().is_err());
        assert!(Value::Int8(-128).encode().is_ok());
        assert!(Value::UInt16(65_536).encode().is_err());
        assert!(Value::Int32(i64::from(i32::MAX) + 1).encode().is_err());
        assert!(Value::UInt32(i64::from(u32::MAX)).encode().is_ok());
        assert!(Value::Int64(i64::MIN).encode().is_ok());
    }

    #[test]
    fn failed_encode_writes_nothing() {
        let mut dst = BytesMut::from(&b"keep"[..]);
        assert!(Value::UInt8(999).encode_into(&mut dst).is_err());
        assert_eq!(dst.as_ref(), b"keep");
    }

    #[test]
    fn float_is_ieee754_big_endian() {
        let bytes = Value::Float32(1.5).encode().unwrap();
        assert_eq!(bytes.as_ref(), &[0x3F, 0xC0, 0x00, 0x00]);
        assert_eq!(
            Value::decode(ValueType::Float32, &bytes, 0, 4).unwrap(),
            Value::Float32(1.5)
        );
    }

    #[test]
    fn strings_carry_a_terminator() {
        let value = Value::from("hi");
        assert_eq!(value.size(), 3);
        assert_eq!(value.encode().unwrap().as_ref(), b"hi\0");
    }

    #[test]
    fn string_decode_strips_one_trailing_nul() {
        let buf = b"xxhello\0\0";
        assert_eq!(
            Value::decode(ValueType::String, buf, 2, 6).unwrap(),
            Value::from("hello")
        );
        assert_eq!(
            Value::decode(ValueType::String, buf, 2, 7).unwrap(),
            Value::from("hello\0")
        );
        assert_eq!(
            Value::decode(ValueType::String, buf, 2, 5).unwrap(),
            Value::from("hello")
        );
        assert_eq!(
            Value::decode(ValueType::String, buf, 0, 0).unwrap(),
            Value::from("")
        );
    }

    #[test]
    fn full_length_string_has_no_terminator() {
        let text = "a".repeat(MAX_STRING_LEN);
        let value = Value::from(text.as_str());
        let bytes = value.encode().unwrap();
        assert_eq!(bytes.len(), MAX_STRING_LEN);
        assert_eq!(value.size(), MAX_STRING_LEN);
        assert_eq!(
            Value::decode(ValueType::String, &bytes, 0, bytes.len()).unwrap(),
            value
        );
    }

    #[test]
    fn oversized_string_is_rejected() {
        let err = Value::from("a".repeat(256)).encode().unwrap_err();
        assert_eq!(err, CodecError::StringTooLong { len: 256, max: 255 });
    }

    #[test]
    fn full_length_string_ending_in_nul_is_rejected() {
        let mut text = "a".repeat(MAX_STRING_LEN - 1);
        text.push('\0');
        let err = Value::from(text).encode().unwrap_err();
        assert_eq!(err, CodecError::AmbiguousTerminator { len: 255 });
    }

    #[test]
    fn invalid_utf8_is_an_error() {
        let err = Value::decode(ValueType::String, &[0xFF, 0xFE, 0x00], 0, 3).unwrap_err();
        assert_eq!(err, CodecError::InvalidUtf8);
    }

    #[test]
    fn uint64_is_unsupported() {
        let err = Value::decode(ValueType::UInt64, &[0; 8], 0, 8).unwrap_err();
        assert_eq!(err, CodecError::UnsupportedType(ValueType::UInt64));
        assert_eq!(Value::integer(ValueType::UInt64, 1), None);
    }

    #[test]
    fn short_buffer_is_truncated() {
        let err = Value::decode(ValueType::Int32, &[0, 1], 0, 4).unwrap_err();
        assert_eq!(
            err,
            CodecError::Truncated {
                needed: 4,
                available: 2
            }
        );
    }

    #[test]
    fn integer_constructor_and_accessors() {
        let value = Value::integer(ValueType::Int16, -5).unwrap();
        assert_eq!(value, Value::Int16(-5));
        assert_eq!(value.as_i64(), Some(-5));
        assert_eq!(value.as_f32(), None);
        assert_eq!(Value::integer(ValueType::String, 1), None);
        assert_eq!(Value::from("x").as_str(), Some("x"));
        assert_eq!(Value::from(2.5f32).as_f32(), Some(2.5));
    }

    #[test]
    fn equality_compares_type_and_payload() {
        assert_ne!(Value::Int8(10), Value::UInt8(10));
        assert_eq!(Value::UInt8(10), Value::from(10u8));
        assert_ne!(Value::UInt8(10), Value::UInt8(11));
    }
}

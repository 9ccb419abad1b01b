use std::fmt;
use std::ops::{Deref, DerefMut};

use bytes::{BufMut, Bytes, BytesMut};
use tracing::trace;

use crate::error::{CodecError, Result};
use crate::value::{Value, ValueType};

/// Most values one message can carry (the count is a single byte).
pub const MAX_VALUES: usize = u8::MAX as usize;

/// Encode a sequence of values into a new buffer.
pub fn encode(values: &[Value]) -> Result<Bytes> {
    let mut dst = BytesMut::with_capacity(encoded_len(values));
    encode_into(values, &mut dst)?;
    Ok(dst.freeze())
}

/// Append the encoding of `values` to `dst`.
///
/// Every value is validated before anything is written, so a failed encode
/// leaves `dst` untouched.
pub fn encode_into(values: &[Value], dst: &mut BytesMut) -> Result<()> {
    if values.len() > MAX_VALUES {
        return Err(CodecError::TooManyValues {
            count: values.len(),
            max: MAX_VALUES,
        });
    }
    for value in values {
        value.validate()?;
    }

    dst.reserve(encoded_len(values));
    dst.put_u8(values.len() as u8);
    for value in values {
        dst.put_u8(value.value_type().id());
    }
    for value in values {
        if let Value::String(_) = value {
            // Validated above: a string's wire size always fits one byte.
            dst.put_u8(value.size() as u8);
        }
    }
    for value in values {
        value.encode_into(dst)?;
    }
    Ok(())
}

/// Decode a buffer produced by [`encode`].
pub fn decode(buf: &[u8]) -> Result<Vec<Value>> {
    let count = usize::from(*buf.first().ok_or(CodecError::Truncated {
        needed: 1,
        available: 0,
    })?);

    let type_ids = buf.get(1..1 + count).ok_or(CodecError::Truncated {
        needed: 1 + count,
        available: buf.len(),
    })?;
    let types = type_ids
        .iter()
        .map(|&id| ValueType::try_from(id))
        .collect::<Result<Vec<_>>>()?;

    let num_strings = types.iter().filter(|&&ty| ty == ValueType::String).count();
    let lengths_start = 1 + count;
    let string_lengths = buf
        .get(lengths_start..lengths_start + num_strings)
        .ok_or(CodecError::Truncated {
            needed: lengths_start + num_strings,
            available: buf.len(),
        })?;

    let mut offset = lengths_start + num_strings;
    let mut lengths = string_lengths.iter();
    let mut values = Vec::with_capacity(count);
    for ty in types {
        let width = match ty {
            ValueType::String => lengths.next().map(|&len| usize::from(len)).unwrap_or(0),
            ValueType::UInt64 => return Err(CodecError::UnsupportedType(ty)),
            fixed => fixed.size(),
        };
        values.push(Value::decode(ty, buf, offset, width)?);
        offset += width;
    }

    if offset < buf.len() {
        trace!(
            trailing = buf.len() - offset,
            "ignoring bytes after last value"
        );
    }
    Ok(values)
}

fn encoded_len(values: &[Value]) -> usize {
    let strings = values
        .iter()
        .filter(|value| matches!(value, Value::String(_)))
        .count();
    1 + values.len() + strings + values.iter().map(Value::size).sum::<usize>()
}

/// An owned, ordered sequence of values: the arguments of one call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Values(Vec<Value>);

impl Values {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a buffer into an owned sequence.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        decode(buf).map(Self)
    }

    /// Encode the sequence into a new buffer.
    pub fn encode(&self) -> Result<Bytes> {
        encode(&self.0)
    }

    /// Integer at `index`, if that entry is an integer.
    pub fn int_at(&self, index: usize) -> Option<i64> {
        self.0.get(index).and_then(Value::as_i64)
    }

    /// Float at `index`, if that entry is a float.
    pub fn float_at(&self, index: usize) -> Option<f32> {
        self.0.get(index).and_then(Value::as_f32)
    }

    /// String at `index`, if that entry is a string.
    pub fn str_at(&self, index: usize) -> Option<&str> {
        self.0.get(index).and_then(Value::as_str)
    }

    pub fn into_inner(self) -> Vec<Value> {
        self.0
    }
}

impl Deref for Values {
    type Target = Vec<Value>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Values {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<Vec<Value>> for Values {
    fn from(values: Vec<Value>) -> Self {
        Self(values)
    }
}

impl FromIterator<Value> for Values {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Values {
    type Item = Value;
    type IntoIter = std::vec::IntoIter<Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl fmt::Display for Values {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, value) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "[{i}]({}) {value}", value.value_type())?;
        }
        Ok(())
    }
}

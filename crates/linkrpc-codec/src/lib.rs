//! Typed values and their compact, self-describing binary layout.
//!
//! A message is an ordered list of [`Value`]s. On the wire it is laid out as:
//!
//! ```text
//! ┌──────────┬──────────────────┬──────────────────────┬──────────────────┐
//! │ Count    │ Type ids         │ String lengths       │ Payloads         │
//! │ (1B)     │ (1B × count)     │ (1B × strings)       │ (big-endian)     │
//! └──────────┴──────────────────┴──────────────────────┴──────────────────┘
//! ```
//!
//! Every type id and string length sits in front of the payload region, so a
//! decoder knows the offset of every value before touching any payload.

pub mod error;
pub mod serializer;
pub mod value;

pub use error::{CodecError, Result};
pub use serializer::{decode, encode, encode_into, Values, MAX_VALUES};
pub use value::{Value, ValueType, MAX_STRING_LEN};

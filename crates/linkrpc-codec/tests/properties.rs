//! Property tests for the value layout.
//!
//! Any valid sequence (at most 255 values, integers in range for their
//! width, strings of at most 255 bytes) must decode back to itself, and no
//! input may make the decoder panic.

use linkrpc_codec::{decode, encode, Value, MAX_STRING_LEN, MAX_VALUES};
use proptest::prelude::*;

/// Strings of 0..=255 bytes. A full-length string may not end in NUL,
/// since it travels without a terminator.
fn text() -> impl Strategy<Value = String> {
    let unicode = prop::collection::vec(any::<char>(), 0..=MAX_STRING_LEN).prop_map(|chars| {
        let mut text = String::new();
        for c in chars {
            if text.len() + c.len_utf8() > MAX_STRING_LEN {
                break;
            }
            text.push(c);
        }
        text
    });
    let ascii = "[ -~]{0,255}";
    prop_oneof![unicode, ascii].prop_map(|mut text| {
        if text.len() == MAX_STRING_LEN && text.ends_with('\0') {
            text.pop();
        }
        text
    })
}

fn value() -> impl Strategy<Value = Value> {
    prop_oneof![
        text().prop_map(Value::String),
        any::<i8>().prop_map(|v| Value::Int8(v.into())),
        any::<u8>().prop_map(|v| Value::UInt8(v.into())),
        any::<i16>().prop_map(|v| Value::Int16(v.into())),
        any::<u16>().prop_map(|v| Value::UInt16(v.into())),
        any::<i32>().prop_map(|v| Value::Int32(v.into())),
        any::<u32>().prop_map(|v| Value::UInt32(v.into())),
        any::<i64>().prop_map(Value::Int64),
        any::<u32>().prop_map(|bits| Value::Float32(f32::from_bits(bits))),
    ]
}

proptest! {
    #[test]
    fn any_valid_sequence_round_trips(values in prop::collection::vec(value(), 0..=MAX_VALUES)) {
        let bytes = encode(&values).unwrap();
        prop_assert_eq!(decode(&bytes).unwrap(), values);
    }

    #[test]
    fn any_string_length_round_trips(text in text()) {
        let values = vec![Value::UInt16(1), Value::String(text)];
        let bytes = encode(&values).unwrap();
        prop_assert_eq!(decode(&bytes).unwrap(), values);
    }

    #[test]
    fn decode_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..512)) {
        let _ = decode(&bytes);
    }
}

#[test]
fn one_value_too_many_is_rejected() {
    let values = vec![Value::Int8(0); MAX_VALUES + 1];
    assert!(encode(&values).is_err());
}

//! Coercion of loosely typed expected values into the representation of a reference value.
//!
//! Rules are tried in order, the first that applies wins:
//! 1. Direct conversion: numeric widening/narrowing between any two numeric representations,
//!    text to bytes and valid UTF-8 bytes to text, or identity for matching representations.
//! 2. Text into a [crate::domain::Domain] reference through its text hook.
//! 3. Sequence into sequence, element by element against the reference's first element.
//! 4. Bytes (or a list of byte-sized integers) into a domain reference through its binary hook.
//! 5. Otherwise the input is returned unchanged, and a later equality check reports the mismatch.

use tracing::{trace, warn};

use crate::{domain::Parsed, value::Value};

/// Converts `input` into the representation of `reference`, if one of the rules applies.
pub fn coerce(input: Value, reference: &Value) -> Value {
    trace!(
        from = input.kind_name(),
        to = reference.kind_name(),
        "coercing {input}"
    );

    let input = match convert(input, reference) {
        Ok(converted) => return converted,
        Err(input) => input,
    };

    let input = match from_text(input, reference) {
        Ok(parsed) => return parsed,
        Err(input) => input,
    };

    let input = match from_sequence(input, reference) {
        Ok(list) => return list,
        Err(input) => input,
    };

    match from_binary(input, reference) {
        Ok(parsed) => parsed,
        Err(input) => {
            trace!(
                from = input.kind_name(),
                to = reference.kind_name(),
                "no coercion applies"
            );
            input
        }
    }
}

macro_rules! cast_to {
    ($v:expr, $reference:expr) => {
        match $reference {
            Value::I8(_) => Some(Value::I8($v as i8)),
            Value::I16(_) => Some(Value::I16($v as i16)),
            Value::I32(_) => Some(Value::I32($v as i32)),
            Value::I64(_) => Some(Value::I64($v as i64)),
            Value::U8(_) => Some(Value::U8($v as u8)),
            Value::U16(_) => Some(Value::U16($v as u16)),
            Value::U32(_) => Some(Value::U32($v as u32)),
            Value::U64(_) => Some(Value::U64($v as u64)),
            Value::F32(_) => Some(Value::F32($v as f32)),
            Value::F64(_) => Some(Value::F64($v as f64)),
            _ => None,
        }
    };
}

/// Casts a numeric value to the numeric representation of `reference`.
///
/// Integer narrowing wraps, float to integer saturates.
fn cast_number(input: &Value, reference: &Value) -> Option<Value> {
    if let Some(v) = input.as_integer() {
        cast_to!(v, reference)
    } else {
        let v = input.as_float()?;
        cast_to!(v, reference)
    }
}

/// Rule 1: conversions that need no hook.
fn convert(input: Value, reference: &Value) -> Result<Value, Value> {
    if input.is_numeric() && reference.is_numeric() {
        return cast_number(&input, reference).ok_or(input);
    }

    match (input, reference) {
        (input @ Value::Nil, Value::Nil)
        | (input @ Value::Bool(_), Value::Bool(_))
        | (input @ Value::Str(_), Value::Str(_))
        | (input @ Value::Bytes(_), Value::Bytes(_)) => Ok(input),
        (Value::Str(text), Value::Bytes(_)) => Ok(Value::Bytes(text.into_bytes())),
        (Value::Bytes(bytes), Value::Str(_)) => String::from_utf8(bytes)
            .map(Value::Str)
            .map_err(|err| Value::Bytes(err.into_bytes())),
        (Value::Custom(custom), Value::Custom(reference))
            if custom.type_name() == reference.type_name() =>
        {
            Ok(Value::Custom(custom))
        }
        (input, _) => Err(input),
    }
}

/// Unwraps a hook outcome, logging a rejected input.
fn accept(parsed: Parsed, input: &Value) -> Option<Value> {
    match parsed? {
        Ok(value) => Some(Value::Custom(value)),
        Err(err) => {
            warn!(%err, "coercion hook rejected {input}");
            None
        }
    }
}

/// Rule 2: text through the reference's text hook.
fn from_text(input: Value, reference: &Value) -> Result<Value, Value> {
    let parsed = match (&input, reference) {
        (Value::Str(text), Value::Custom(prototype)) => accept(prototype.parse_text(text), &input),
        _ => None,
    };

    parsed.ok_or(input)
}

/// Rule 3: sequence to sequence.
fn from_sequence(input: Value, reference: &Value) -> Result<Value, Value> {
    let items = match input {
        Value::List(items) => items,
        Value::Bytes(bytes) if matches!(reference, Value::List(_)) => {
            bytes.into_iter().map(Value::U8).collect()
        }
        other => return Err(other),
    };

    match reference {
        Value::List(reference_items) => {
            // Without a first element there is no prototype to coerce against.
            let prototype = reference_items.first();
            Ok(Value::List(
                items
                    .into_iter()
                    .map(|item| match prototype {
                        Some(prototype) => coerce(item, prototype),
                        None => item,
                    })
                    .collect(),
            ))
        }
        Value::Bytes(_) => {
            let items: Vec<Value> = items
                .into_iter()
                .map(|item| coerce(item, &Value::U8(0)))
                .collect();

            if items.iter().all(|item| matches!(item, Value::U8(_))) {
                Ok(Value::Bytes(
                    items
                        .iter()
                        .filter_map(|item| match item {
                            Value::U8(byte) => Some(*byte),
                            _ => None,
                        })
                        .collect(),
                ))
            } else {
                Ok(Value::List(items))
            }
        }
        _ => Err(Value::List(items)),
    }
}

/// The content of `value` as raw bytes, if it is bytes or a list of integers in `0..=255`.
fn byte_content(value: &Value) -> Option<Vec<u8>> {
    match value {
        Value::Bytes(bytes) => Some(bytes.clone()),
        Value::List(items) => items
            .iter()
            .map(|item| item.as_integer().and_then(|v| u8::try_from(v).ok()))
            .collect(),
        _ => None,
    }
}

/// Rule 4: bytes through the reference's binary hook.
fn from_binary(input: Value, reference: &Value) -> Result<Value, Value> {
    let Value::Custom(prototype) = reference else {
        return Err(input);
    };
    let Some(bytes) = byte_content(&input) else {
        return Err(input);
    };

    accept(prototype.parse_binary(&bytes), &input).ok_or(input)
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use super::*;

    #[test]
    fn test_numeric_conversion() {
        assert_eq!(coerce(Value::I64(128), &Value::U64(128)), Value::U64(128));
        assert_eq!(coerce(Value::I64(7), &Value::U8(0)), Value::U8(7));
        assert_eq!(coerce(Value::I64(-1), &Value::U16(0)), Value::U16(u16::MAX));
        assert_eq!(coerce(Value::I64(3), &Value::F64(0.0)), Value::F64(3.0));
        assert_eq!(coerce(Value::F64(2.5), &Value::F32(0.0)), Value::F32(2.5));
    }

    #[test]
    fn test_sequence_conversion() {
        let input = Value::list([2i64, 4, 6]);
        let reference = Value::list([2u32, 4, 6]);

        assert_ne!(input, reference);
        assert_eq!(coerce(input, &reference), reference);
    }

    #[test]
    fn test_sequence_against_empty_reference() {
        let input = Value::list([1i64]);
        assert_eq!(coerce(input.clone(), &Value::List(vec![])), input);
    }

    #[test]
    fn test_list_into_bytes() {
        let input = Value::list([0x10i64, 0x0f, 0xff]);
        assert_eq!(
            coerce(input, &Value::Bytes(vec![])),
            Value::Bytes(vec![0x10, 0x0f, 0xff])
        );

        let input = Value::list([Value::I64(1), Value::Str("x".into())]);
        assert_eq!(
            coerce(input, &Value::Bytes(vec![])),
            Value::list([Value::U8(1), Value::Str("x".into())])
        );
    }

    #[test]
    fn test_bytes_into_list() {
        let input = Value::Bytes(vec![1, 2]);
        assert_eq!(
            coerce(input, &Value::list([0u16])),
            Value::list([1u16, 2])
        );
    }

    #[test]
    fn test_text_and_bytes() {
        assert_eq!(
            coerce(Value::Str("hi".into()), &Value::Bytes(vec![])),
            Value::Bytes(b"hi".to_vec())
        );
        assert_eq!(
            coerce(Value::Bytes(b"hi".to_vec()), &Value::Str(String::new())),
            Value::Str("hi".into())
        );
        assert_eq!(
            coerce(Value::Bytes(vec![0xff]), &Value::Str(String::new())),
            Value::Bytes(vec![0xff])
        );
    }

    #[test]
    fn test_unconvertible_is_unchanged() {
        let coerced = coerce(Value::Str("foo".into()), &Value::I64(128));
        assert_eq!(coerced, Value::Str("foo".into()));
        assert_ne!(coerced, Value::I64(128));

        assert_eq!(coerce(Value::Bool(true), &Value::I64(1)), Value::Bool(true));
    }

    #[test]
    fn test_text_hook() {
        let reference = Value::custom(Ipv4Addr::new(10, 0, 0, 1));

        assert_eq!(coerce(Value::Str("10.0.0.1".into()), &reference), reference);
        assert_eq!(
            coerce(Value::Str("10.0.0.x".into()), &reference),
            Value::Str("10.0.0.x".into())
        );
    }

    #[test]
    fn test_binary_hook() {
        let reference = Value::custom(Ipv4Addr::new(192, 168, 0, 1));

        assert_eq!(
            coerce(Value::Bytes(vec![192, 168, 0, 1]), &reference),
            reference
        );
        assert_eq!(
            coerce(Value::list([192i64, 168, 0, 1]), &reference),
            reference
        );

        let short = Value::list([192i64, 168]);
        assert_eq!(coerce(short.clone(), &reference), short);
    }

    #[test]
    fn test_sequence_of_domain_values() {
        let reference = Value::list([Value::custom(Ipv4Addr::LOCALHOST)]);
        let input = Value::list(["127.0.0.1", "10.0.0.2"]);

        assert_eq!(
            coerce(input, &reference),
            Value::list([
                Value::custom(Ipv4Addr::LOCALHOST),
                Value::custom(Ipv4Addr::new(10, 0, 0, 2)),
            ])
        );
    }

    #[cfg(feature = "time")]
    #[test]
    fn test_timestamp_text_hook() {
        let when = time::OffsetDateTime::from_unix_timestamp(1_483_228_800).unwrap();
        let reference = Value::custom(when);

        assert_eq!(
            coerce(Value::Str("2017-01-01T00:00:00Z".into()), &reference),
            reference
        );
    }

    #[cfg(feature = "time")]
    #[test]
    fn test_timestamp_binary_hook() {
        let when = time::OffsetDateTime::from_unix_timestamp(1_483_228_800).unwrap();
        let reference = Value::custom(when);
        let encoded = [1u8, 0, 0, 0, 14, 207, 250, 61, 128, 0, 0, 0, 0, 0xff, 0xff];

        assert_eq!(coerce(Value::Bytes(encoded.to_vec()), &reference), reference);
        assert_eq!(coerce(Value::list(encoded), &reference), reference);
    }
}

//! Domain values: richer types that expected literals are coerced into.
//!
//! A [Domain] type declares whether it can be parsed from text, from raw bytes, or both.
//! [crate::coerce::coerce] calls these hooks on the *reference* value, which acts as a
//! prototype for its type.

use std::{
    any::Any,
    fmt,
    net::{Ipv4Addr, Ipv6Addr},
    rc::Rc,
};

use crate::errors::CoerceError;

/// Outcome of a coercion hook. `None` means the type does not support the hook at all.
pub type Parsed = Option<Result<Rc<dyn Domain>, CoerceError>>;

pub trait Domain: fmt::Debug + fmt::Display + 'static {
    /// Short type name used in messages and to match identical types.
    fn type_name(&self) -> &'static str;

    fn as_any(&self) -> &dyn Any;

    /// Deep equality against another domain value.
    fn eq_domain(&self, other: &dyn Domain) -> bool;

    /// Builds a value of this type from text.
    fn parse_text(&self, _text: &str) -> Parsed {
        None
    }

    /// Builds a value of this type from raw bytes.
    fn parse_binary(&self, _bytes: &[u8]) -> Parsed {
        None
    }
}

/// Equality helper for [Domain::eq_domain] on types that are `PartialEq`.
pub fn eq_by_downcast<T: PartialEq + 'static>(value: &T, other: &dyn Domain) -> bool {
    other
        .as_any()
        .downcast_ref::<T>()
        .is_some_and(|other| value == other)
}

impl Domain for Ipv4Addr {
    fn type_name(&self) -> &'static str {
        "Ipv4Addr"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_domain(&self, other: &dyn Domain) -> bool {
        eq_by_downcast(self, other)
    }

    fn parse_text(&self, text: &str) -> Parsed {
        Some(
            text.parse::<Ipv4Addr>()
                .map(|addr| Rc::new(addr) as Rc<dyn Domain>)
                .map_err(|err| CoerceError::new("Ipv4Addr", err.to_string())),
        )
    }

    fn parse_binary(&self, bytes: &[u8]) -> Parsed {
        Some(
            <[u8; 4]>::try_from(bytes)
                .map(|octets| Rc::new(Ipv4Addr::from(octets)) as Rc<dyn Domain>)
                .map_err(|_| {
                    CoerceError::new("Ipv4Addr", format!("expected 4 bytes, got {}", bytes.len()))
                }),
        )
    }
}

impl Domain for Ipv6Addr {
    fn type_name(&self) -> &'static str {
        "Ipv6Addr"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_domain(&self, other: &dyn Domain) -> bool {
        eq_by_downcast(self, other)
    }

    fn parse_text(&self, text: &str) -> Parsed {
        Some(
            text.parse::<Ipv6Addr>()
                .map(|addr| Rc::new(addr) as Rc<dyn Domain>)
                .map_err(|err| CoerceError::new("Ipv6Addr", err.to_string())),
        )
    }

    fn parse_binary(&self, bytes: &[u8]) -> Parsed {
        Some(
            <[u8; 16]>::try_from(bytes)
                .map(|octets| Rc::new(Ipv6Addr::from(octets)) as Rc<dyn Domain>)
                .map_err(|_| {
                    CoerceError::new(
                        "Ipv6Addr",
                        format!("expected 16 bytes, got {}", bytes.len()),
                    )
                }),
        )
    }
}

#[cfg(feature = "time")]
impl Domain for time::OffsetDateTime {
    fn type_name(&self) -> &'static str {
        "OffsetDateTime"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_domain(&self, other: &dyn Domain) -> bool {
        eq_by_downcast(self, other)
    }

    /// Parses RFC 3339 timestamps such as `2017-01-01T00:00:00-00:00`.
    fn parse_text(&self, text: &str) -> Parsed {
        Some(
            time::OffsetDateTime::parse(text, &time::format_description::well_known::Rfc3339)
                .map(|when| Rc::new(when) as Rc<dyn Domain>)
                .map_err(|err| CoerceError::new("OffsetDateTime", err.to_string())),
        )
    }

    /// Decodes the versioned binary timestamp layout, see [decode_timestamp].
    fn parse_binary(&self, bytes: &[u8]) -> Parsed {
        Some(decode_timestamp(bytes).map(|when| Rc::new(when) as Rc<dyn Domain>))
    }
}

/// Seconds between 0001-01-01T00:00:00Z and the Unix epoch.
#[cfg(feature = "time")]
const SECONDS_BEFORE_UNIX_EPOCH: i64 = 62_135_596_800;

/// Decodes a binary timestamp.
///
/// Layout, big-endian: version byte (1 or 2), `i64` seconds since 0001-01-01T00:00:00Z, `i32`
/// nanoseconds, `i16` zone offset in minutes (`-1` for UTC). Version 2 appends one byte with
/// the offset's remaining seconds.
#[cfg(feature = "time")]
pub fn decode_timestamp(bytes: &[u8]) -> Result<time::OffsetDateTime, CoerceError> {
    let invalid = |reason: String| CoerceError::new("OffsetDateTime", reason);

    let (version, rest) = bytes
        .split_first()
        .ok_or_else(|| invalid("empty input".to_string()))?;
    let expected_len = match *version {
        1 => 15,
        2 => 16,
        v => return Err(invalid(format!("unsupported version {v}"))),
    };
    if bytes.len() != expected_len {
        return Err(invalid(format!(
            "expected {expected_len} bytes, got {}",
            bytes.len()
        )));
    }

    let truncated = || invalid("truncated timestamp".to_string());
    let (seconds, rest) = rest.split_first_chunk::<8>().ok_or_else(truncated)?;
    let (nanos, rest) = rest.split_first_chunk::<4>().ok_or_else(truncated)?;
    let (offset_minutes, rest) = rest.split_first_chunk::<2>().ok_or_else(truncated)?;

    let offset = match i16::from_be_bytes(*offset_minutes) {
        -1 => 0,
        minutes => i32::from(minutes) * 60 + rest.first().map_or(0, |s| i32::from(*s)),
    };

    let unix = i64::from_be_bytes(*seconds)
        .checked_sub(SECONDS_BEFORE_UNIX_EPOCH)
        .ok_or_else(|| invalid("seconds out of range".to_string()))?;
    let nanos = i128::from(unix) * 1_000_000_000 + i128::from(i32::from_be_bytes(*nanos));

    let offset =
        time::UtcOffset::from_whole_seconds(offset).map_err(|err| invalid(err.to_string()))?;
    time::OffsetDateTime::from_unix_timestamp_nanos(nanos)
        .map_err(|err| invalid(err.to_string()))?
        .checked_to_offset(offset)
        .ok_or_else(|| invalid("offset out of range".to_string()))
}

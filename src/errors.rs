//! Error types for packing, reading, coercion, getter resolution and fixture loading.

use thiserror::Error;

/// Errors produced when reading bits back out of a byte slice.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReadError {
    /// Requested bit range is beyond the end of the data.
    #[error("bit range is out of bounds")]
    OutOfBounds,
    /// More than 64 bits were requested in a single read.
    #[error("cannot read more than 64 bits at once")]
    TooManyBitsRead,
}

/// Errors produced by the validating [crate::packer::Packer].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PackError {
    /// Declaration has a width of zero bits.
    #[error("field {index} has zero width")]
    ZeroWidth { index: usize },
    /// Declaration is wider than the packer allows.
    #[error("field {index} is {width} bits wide, more than the allowed {max}")]
    WidthTooLarge { index: usize, width: usize, max: usize },
    /// Declaration writes a bit an earlier declaration already wrote.
    #[error("field {index} overlaps field {earlier} at bit {bit}")]
    Overlap {
        index: usize,
        earlier: usize,
        bit: usize,
    },
}

/// A coercion hook rejected its input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot convert to {target}: {reason}")]
pub struct CoerceError {
    pub target: &'static str,
    pub reason: String,
}

impl CoerceError {
    pub fn new(target: &'static str, reason: impl Into<String>) -> Self {
        Self {
            target,
            reason: reason.into(),
        }
    }
}

/// Why a path segment could not be used as a getter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotAGetterKind {
    /// No member with that name exists on the object.
    #[error("is not a method on {object}")]
    Missing { object: String },
    /// The member exists but cannot be called.
    #[error("does not appear to be a getter method (not callable)")]
    NotCallable,
    /// The member needs arguments.
    #[error("does not appear to be a getter method (takes {0} arguments)")]
    TakesArguments(usize),
    /// The member does not return exactly one value.
    #[error("does not appear to be a getter method (returns {0} values)")]
    ResultCount(usize),
    /// The member is declared as niladic with one result but has no accessor bound to it.
    #[error("does not appear to be a getter method (no accessor bound)")]
    Unbound,
}

/// A path segment does not name a zero-argument, single-result accessor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{name} {kind}")]
pub struct NotAGetter {
    pub name: String,
    pub kind: NotAGetterKind,
}

impl NotAGetter {
    pub fn new(name: impl Into<String>, kind: NotAGetterKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Errors produced while loading fixture files.
#[cfg(feature = "serde")]
#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse fixture yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// Neither `input` nor `bits` was given for a record.
    #[error("neither input nor bit definitions were specified for test {name}")]
    Incomplete { name: String },
    #[error("invalid hex input for test {name}: {source}")]
    Hex {
        name: String,
        #[source]
        source: hex::FromHexError,
    },
    #[error("invalid bit definitions for test {name}: {source}")]
    Pack {
        name: String,
        #[source]
        source: PackError,
    },
    #[error("invalid expected value in test {name}: {reason}")]
    InvalidValue { name: String, reason: String },
}

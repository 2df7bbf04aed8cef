//! Tagged values shared by expected literals and accessor results.

use std::{fmt, rc::Rc};

use crate::{domain::Domain, getter::Queryable};

/// A loosely or strongly typed value.
///
/// Expected values loaded from fixtures are usually `I64`, `Str`, `List` or `Nested`; accessor
/// results carry the concrete representation of what the accessor returns. Equality is deep and
/// representation-sensitive: `I64(1) != U8(1)` until one side is coerced with
/// [crate::coerce::coerce].
#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Str(String),
    Bytes(Vec<u8>),
    List(Vec<Value>),
    /// A domain value with its own parsing hooks.
    Custom(Rc<dyn Domain>),
    /// An object whose accessors can be queried further.
    Object(Rc<dyn Queryable>),
    /// Assertions to run against an object value.
    Nested(Expected),
}

impl Value {
    pub fn custom(value: impl Domain) -> Self {
        Value::Custom(Rc::new(value))
    }

    pub fn object(object: impl Queryable + 'static) -> Self {
        Value::Object(Rc::new(object))
    }

    pub fn list<V: Into<Value>>(items: impl IntoIterator<Item = V>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }

    /// Name of the representation, used in log output.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "bool",
            Value::I8(_) => "i8",
            Value::I16(_) => "i16",
            Value::I32(_) => "i32",
            Value::I64(_) => "i64",
            Value::U8(_) => "u8",
            Value::U16(_) => "u16",
            Value::U32(_) => "u32",
            Value::U64(_) => "u64",
            Value::F32(_) => "f32",
            Value::F64(_) => "f64",
            Value::Str(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::List(_) => "list",
            Value::Custom(custom) => custom.type_name(),
            Value::Object(_) => "object",
            Value::Nested(_) => "assertions",
        }
    }

    pub fn is_integer(&self) -> bool {
        self.as_integer().is_some()
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::F32(_) | Value::F64(_)) || self.is_integer()
    }

    /// Integer content widened to `i128`, for integer representations only.
    pub fn as_integer(&self) -> Option<i128> {
        match *self {
            Value::I8(v) => Some(v.into()),
            Value::I16(v) => Some(v.into()),
            Value::I32(v) => Some(v.into()),
            Value::I64(v) => Some(v.into()),
            Value::U8(v) => Some(v.into()),
            Value::U16(v) => Some(v.into()),
            Value::U32(v) => Some(v.into()),
            Value::U64(v) => Some(v.into()),
            _ => None,
        }
    }

    /// Numeric content as `f64`, for any numeric representation.
    pub fn as_float(&self) -> Option<f64> {
        match *self {
            Value::F32(v) => Some(v.into()),
            Value::F64(v) => Some(v),
            _ => self.as_integer().map(|v| v as f64),
        }
    }

    /// The assertions this value describes when compared against an object.
    ///
    /// Both a `Nested` value and a list made only of `Nested` values qualify; the latter is how
    /// a sequence of mappings in a fixture file comes out.
    pub fn as_assertions(&self) -> Option<Expected> {
        match self {
            Value::Nested(expected) => Some(expected.clone()),
            Value::List(items) if !items.is_empty() => {
                let mut expected = Vec::new();
                for item in items {
                    match item {
                        Value::Nested(nested) => expected.extend(nested.iter().cloned()),
                        _ => return None,
                    }
                }
                Some(expected)
            }
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::I8(a), Value::I8(b)) => a == b,
            (Value::I16(a), Value::I16(b)) => a == b,
            (Value::I32(a), Value::I32(b)) => a == b,
            (Value::I64(a), Value::I64(b)) => a == b,
            (Value::U8(a), Value::U8(b)) => a == b,
            (Value::U16(a), Value::U16(b)) => a == b,
            (Value::U32(a), Value::U32(b)) => a == b,
            (Value::U64(a), Value::U64(b)) => a == b,
            (Value::F32(a), Value::F32(b)) => a == b,
            (Value::F64(a), Value::F64(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Custom(a), Value::Custom(b)) => a.eq_domain(&**b),
            // Objects are opaque; only the same instance is equal to itself.
            (Value::Object(a), Value::Object(b)) => std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b)),
            (Value::Nested(a), Value::Nested(b)) => a == b,
            _ => false,
        }
    }
}

fn write_spaced<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    write!(f, "[")?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        write!(f, "{item}")?;
    }
    write!(f, "]")
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "<nil>"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::I8(v) => write!(f, "{v}"),
            Value::I16(v) => write!(f, "{v}"),
            Value::I32(v) => write!(f, "{v}"),
            Value::I64(v) => write!(f, "{v}"),
            Value::U8(v) => write!(f, "{v}"),
            Value::U16(v) => write!(f, "{v}"),
            Value::U32(v) => write!(f, "{v}"),
            Value::U64(v) => write!(f, "{v}"),
            Value::F32(v) => write!(f, "{v}"),
            Value::F64(v) => write!(f, "{v}"),
            Value::Str(v) => write!(f, "{v}"),
            Value::Bytes(v) => write_spaced(f, v),
            Value::List(v) => write_spaced(f, v),
            Value::Custom(v) => write!(f, "{v}"),
            Value::Object(v) => write!(f, "{v:?}"),
            Value::Nested(v) => write_spaced(f, v),
        }
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::$variant(value)
                }
            }
        )*
    };
}

impl_from! {
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    String => Str,
    Vec<u8> => Bytes,
    Vec<Value> => List,
    Expected => Nested,
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<&[u8]> for Value {
    fn from(value: &[u8]) -> Self {
        Value::Bytes(value.to_vec())
    }
}

impl From<usize> for Value {
    fn from(value: usize) -> Self {
        Value::U64(value as u64)
    }
}

impl From<isize> for Value {
    fn from(value: isize) -> Self {
        Value::I64(value as i64)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Nil, Into::into)
    }
}

/// One expected-state mapping: accessor paths and the values they should return.
///
/// Entries keep the order they were declared in.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Assertion {
    entries: Vec<(String, Value)>,
}

/// An ordered list of assertions evaluated against one object.
pub type Expected = Vec<Assertion>;

impl Assertion {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry, builder style.
    pub fn expect(mut self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(path, value);
        self
    }

    /// Adds an entry, replacing the value of an existing entry with the same path.
    pub fn insert(&mut self, path: impl Into<String>, value: impl Into<Value>) {
        let path = path.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(p, _)| *p == path) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((path, value)),
        }
    }

    pub fn get(&self, path: &str) -> Option<&Value> {
        self.entries.iter().find(|(p, _)| p == path).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(p, v)| (p.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<P: Into<String>, V: Into<Value>> From<(P, V)> for Assertion {
    fn from((path, value): (P, V)) -> Self {
        Assertion::new().expect(path, value)
    }
}

impl<P: Into<String>, V: Into<Value>> FromIterator<(P, V)> for Assertion {
    fn from_iter<I: IntoIterator<Item = (P, V)>>(iter: I) -> Self {
        let mut assertion = Assertion::new();
        for (path, value) in iter {
            assertion.insert(path, value);
        }
        assertion
    }
}

impl fmt::Display for Assertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "map[")?;
        for (i, (path, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{path}:{value}")?;
        }
        write!(f, "]")
    }
}

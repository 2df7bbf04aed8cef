//! String-addressed, zero-argument accessors on live objects.
//!
//! Types opt in by implementing [Queryable], usually by delegating to a static [Accessors]
//! registry. [resolve] walks dotted paths such as `"Header.Version"` through intermediate
//! accessor results.

use std::{fmt, rc::Rc};

use tracing::trace;

use crate::{
    errors::{NotAGetter, NotAGetterKind},
    value::Value,
};

/// A member found by name on a [Queryable] object.
pub enum Member<'a> {
    /// Zero-argument accessor returning exactly one value.
    Getter(Box<dyn Fn() -> Value + 'a>),
    /// A callable member with the given arity that is not a getter.
    Method { params: usize, results: usize },
    /// A member that cannot be called.
    Field,
}

impl fmt::Debug for Member<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Member::Getter(_) => write!(f, "Getter"),
            Member::Method { params, results } => f
                .debug_struct("Method")
                .field("params", params)
                .field("results", results)
                .finish(),
            Member::Field => write!(f, "Field"),
        }
    }
}

/// Late-bound read access to an object's computed properties.
pub trait Queryable: fmt::Debug {
    /// Looks up the member called `name`. Returns `None` when no such member exists.
    fn member(&self, name: &str) -> Option<Member<'_>>;
}

impl<T: Queryable + ?Sized> Queryable for &T {
    fn member(&self, name: &str) -> Option<Member<'_>> {
        (**self).member(name)
    }
}

impl<T: Queryable + ?Sized> Queryable for Rc<T> {
    fn member(&self, name: &str) -> Option<Member<'_>> {
        (**self).member(name)
    }
}

enum Entry<T> {
    Getter(fn(&T) -> Value),
    Method { params: usize, results: usize },
    Field,
}

/// Name-to-accessor registry for a concrete type.
///
/// ```
/// use std::sync::OnceLock;
/// use bitfixture::getter::{Accessors, Member, Queryable};
///
/// #[derive(Debug)]
/// struct Header {
///     version: u8,
/// }
///
/// impl Queryable for Header {
///     fn member(&self, name: &str) -> Option<Member<'_>> {
///         static ACCESSORS: OnceLock<Accessors<Header>> = OnceLock::new();
///         ACCESSORS
///             .get_or_init(|| {
///                 Accessors::<Header>::new().getter("Version", |h| h.version.into())
///             })
///             .bind(self, name)
///     }
/// }
///
/// let header = Header { version: 2 };
/// assert!(matches!(header.member("Version"), Some(Member::Getter(_))));
/// ```
pub struct Accessors<T> {
    entries: Vec<(&'static str, Entry<T>)>,
}

impl<T> Default for Accessors<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T> Accessors<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a zero-argument accessor.
    pub fn getter(mut self, name: &'static str, getter: fn(&T) -> Value) -> Self {
        self.entries.push((name, Entry::Getter(getter)));
        self
    }

    /// Registers a callable member that must not be used as a getter.
    pub fn method(mut self, name: &'static str, params: usize, results: usize) -> Self {
        self.entries.push((name, Entry::Method { params, results }));
        self
    }

    /// Registers a non-callable member.
    pub fn field(mut self, name: &'static str) -> Self {
        self.entries.push((name, Entry::Field));
        self
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(name, _)| *name)
    }

    /// Looks up `name` and binds it to `target`.
    pub fn bind<'a>(&self, target: &'a T, name: &str) -> Option<Member<'a>> {
        let (_, entry) = self.entries.iter().find(|(n, _)| *n == name)?;

        Some(match entry {
            Entry::Getter(getter) => {
                let getter = *getter;
                Member::Getter(Box::new(move || getter(target)))
            }
            Entry::Method { params, results } => Member::Method {
                params: *params,
                results: *results,
            },
            Entry::Field => Member::Field,
        })
    }
}

enum Receiver<'a> {
    Borrowed(&'a dyn Queryable),
    Owned(Rc<dyn Queryable>),
}

impl Receiver<'_> {
    fn object(&self) -> &dyn Queryable {
        match self {
            Receiver::Borrowed(object) => *object,
            Receiver::Owned(object) => &**object,
        }
    }
}

/// The final accessor of a resolved path, bound to its receiver and not yet invoked.
pub struct BoundGetter<'a> {
    receiver: Receiver<'a>,
    name: String,
}

impl fmt::Debug for BoundGetter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundGetter")
            .field("receiver", &self.receiver.object())
            .field("name", &self.name)
            .finish()
    }
}

impl BoundGetter<'_> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invokes the accessor.
    pub fn call(&self) -> Result<Value, NotAGetter> {
        let getter = lookup_getter(self.receiver.object(), &self.name)?;
        Ok(getter())
    }
}

/// Looks up `name` on `object`, checking that it is a zero-argument, single-result accessor.
fn lookup_getter<'a>(
    object: &'a dyn Queryable,
    name: &str,
) -> Result<Box<dyn Fn() -> Value + 'a>, NotAGetter> {
    match object.member(name) {
        Some(Member::Getter(getter)) => Ok(getter),
        Some(Member::Method { params, .. }) if params != 0 => Err(NotAGetter::new(
            name,
            NotAGetterKind::TakesArguments(params),
        )),
        Some(Member::Method { results, .. }) if results != 1 => {
            Err(NotAGetter::new(name, NotAGetterKind::ResultCount(results)))
        }
        Some(Member::Method { .. }) => Err(NotAGetter::new(name, NotAGetterKind::Unbound)),
        Some(Member::Field) => Err(NotAGetter::new(name, NotAGetterKind::NotCallable)),
        None => Err(NotAGetter::new(
            name,
            NotAGetterKind::Missing {
                object: format!("{object:?}"),
            },
        )),
    }
}

/// Resolves a dotted accessor `path` starting at `root`.
///
/// Every segment but the last is invoked to obtain the receiver of the next segment, which must
/// be a [Value::Object]. The last segment is checked but not invoked.
pub fn resolve<'a>(path: &str, root: &'a dyn Queryable) -> Result<BoundGetter<'a>, NotAGetter> {
    let (parents, last) = match path.rsplit_once('.') {
        Some((parents, last)) => (parents.split('.').collect::<Vec<_>>(), last),
        None => (Vec::new(), path),
    };

    let mut receiver = Receiver::Borrowed(root);
    for (i, segment) in parents.iter().enumerate() {
        let value = lookup_getter(receiver.object(), segment)?();
        trace!(segment, value = %value, "resolved intermediate accessor");

        receiver = match value {
            Value::Object(object) => Receiver::Owned(object),
            other => {
                let next = parents.get(i + 1).copied().unwrap_or(last);
                return Err(NotAGetter::new(
                    next,
                    NotAGetterKind::Missing {
                        object: other.to_string(),
                    },
                ));
            }
        };
    }

    let _ = lookup_getter(receiver.object(), last)?;
    Ok(BoundGetter {
        receiver,
        name: last.to_string(),
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use std::{cell::Cell, net::Ipv4Addr, sync::OnceLock};

    use super::*;

    #[derive(Debug, Default)]
    pub(crate) struct Bar;

    impl Queryable for Bar {
        fn member(&self, name: &str) -> Option<Member<'_>> {
            static ACCESSORS: OnceLock<Accessors<Bar>> = OnceLock::new();
            ACCESSORS
                .get_or_init(|| Accessors::<Bar>::new().getter("Value5", |_| Value::I32(5)))
                .bind(self, name)
        }
    }

    #[derive(Default)]
    pub(crate) struct Foo {
        pub(crate) calls: Cell<usize>,
    }

    // Omits the call counter.
    impl fmt::Debug for Foo {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("Foo")
        }
    }

    impl Foo {
        fn count(&self) {
            self.calls.set(self.calls.get() + 1);
        }
    }

    impl Queryable for Foo {
        fn member(&self, name: &str) -> Option<Member<'_>> {
            static ACCESSORS: OnceLock<Accessors<Foo>> = OnceLock::new();
            ACCESSORS
                .get_or_init(|| {
                    Accessors::<Foo>::new()
                        .getter("Value1", |_| Value::I32(1))
                        .getter("Value2", |_| Value::I32(2))
                        .getter("Value3", |_| Value::I32(3))
                        .getter("Value4", |f| {
                            f.count();
                            Value::object(Bar)
                        })
                        .getter("Value7", |_| Value::object(Bar))
                        .getter("Sizes", |_| Value::list([2u32, 4, 6]))
                        .getter("Bars", |_| Value::list([Value::object(Bar), Value::object(Bar)]))
                        .getter("Counted", |f| {
                            f.count();
                            Value::U8(1)
                        })
                        .getter("Source", |_| Value::custom(Ipv4Addr::new(10, 0, 0, 1)))
                        .method("GetterWithArg", 1, 1)
                        .method("NotGetter", 0, 0)
                        .method("Pair", 0, 2)
                        .method("Unbound", 0, 1)
                        .field("b")
                })
                .bind(self, name)
        }
    }

    #[test]
    fn test_resolve_getter() {
        let foo = Foo::default();
        let getter = resolve("Value1", &foo).unwrap();
        assert_eq!(getter.name(), "Value1");
        assert_eq!(getter.call().unwrap(), Value::I32(1));
    }

    #[test]
    fn test_resolve_chain() {
        let foo = Foo::default();
        let getter = resolve("Value4.Value5", &foo).unwrap();
        assert_eq!(getter.call().unwrap(), Value::I32(5));
    }

    #[test]
    fn test_resolve_missing() {
        let foo = Foo::default();
        let err = resolve("bar", &foo).unwrap_err();
        assert_eq!(err.name, "bar");
        assert!(matches!(err.kind, NotAGetterKind::Missing { .. }));
        assert_eq!(err.to_string(), "bar is not a method on Foo");
    }

    #[test]
    fn test_resolve_non_getters() {
        let foo = Foo::default();

        let err = resolve("GetterWithArg", &foo).unwrap_err();
        assert_eq!(err.kind, NotAGetterKind::TakesArguments(1));

        let err = resolve("NotGetter", &foo).unwrap_err();
        assert_eq!(err.kind, NotAGetterKind::ResultCount(0));
        assert_eq!(
            err.to_string(),
            "NotGetter does not appear to be a getter method (returns 0 values)"
        );

        let err = resolve("Pair", &foo).unwrap_err();
        assert_eq!(err.kind, NotAGetterKind::ResultCount(2));

        let err = resolve("b", &foo).unwrap_err();
        assert_eq!(err.kind, NotAGetterKind::NotCallable);

        let err = resolve("Unbound", &foo).unwrap_err();
        assert_eq!(err.kind, NotAGetterKind::Unbound);
        assert_eq!(
            err.to_string(),
            "Unbound does not appear to be a getter method (no accessor bound)"
        );
    }

    #[test]
    fn test_resolve_does_not_invoke_final_segment() {
        let foo = Foo::default();
        let getter = resolve("Counted", &foo).unwrap();
        assert_eq!(foo.calls.get(), 0);

        getter.call().unwrap();
        assert_eq!(foo.calls.get(), 1);
    }

    #[test]
    fn test_resolve_chain_through_plain_value() {
        let foo = Foo::default();
        let err = resolve("Value1.Value5", &foo).unwrap_err();
        assert_eq!(
            err,
            NotAGetter::new(
                "Value5",
                NotAGetterKind::Missing {
                    object: "1".to_string()
                }
            )
        );
    }

    #[test]
    fn test_resolve_chain_missing_inner() {
        let foo = Foo::default();
        let err = resolve("Value4.Value6", &foo).unwrap_err();
        assert_eq!(err.name, "Value6");
        assert_eq!(foo.calls.get(), 1);
    }

    #[test]
    fn test_accessor_names() {
        let accessors = Accessors::<Bar>::new().getter("A", |_| Value::Nil).field("B");
        assert_eq!(accessors.names().collect::<Vec<_>>(), vec!["A", "B"]);
    }
}

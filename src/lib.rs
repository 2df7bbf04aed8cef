//! # bitfixture
//!
//! Helpers for data-driven tests of binary decoders.
//!
//! Build expected payloads from bit-field declarations instead of hand-written byte strings,
//! then check a decoded object against expected accessor values written as plain data.
//! Expected literals (integers, strings, byte lists) are coerced into the representation the
//! accessor actually returns before comparing.
//!
//! ## Example
//!
//! ```
//! use std::sync::OnceLock;
//!
//! use bitfixture::compare::compare;
//! use bitfixture::field::FieldDeclaration;
//! use bitfixture::getter::{Accessors, Member, Queryable};
//! use bitfixture::packer::pack;
//! use bitfixture::value::{Assertion, Value};
//!
//! #[derive(Debug)]
//! struct Header {
//!     version: u8,
//!     length: u16,
//! }
//!
//! impl Queryable for Header {
//!     fn member(&self, name: &str) -> Option<Member<'_>> {
//!         static ACCESSORS: OnceLock<Accessors<Header>> = OnceLock::new();
//!         ACCESSORS
//!             .get_or_init(|| {
//!                 Accessors::<Header>::new()
//!                     .getter("Version", |h| Value::U8(h.version))
//!                     .getter("Length", |h| Value::U16(h.length))
//!             })
//!             .bind(self, name)
//!     }
//! }
//!
//! let input = pack(&[
//!     FieldDeclaration::new(0, 0, 4, 4),
//!     FieldDeclaration::new(2, 0, 16, 20),
//! ]);
//! assert_eq!(input, vec![0x40, 0x00, 0x00, 0x14]);
//!
//! let header = Header {
//!     version: input[0] >> 4,
//!     length: u16::from_be_bytes([input[2], input[3]]),
//! };
//! let expected = vec![
//!     Assertion::new().expect("Version", 4i64),
//!     Assertion::new().expect("Length", 20i64),
//! ];
//! let report = compare(&expected, &header);
//! assert!(!report.failed(), "{report}");
//! ```

pub mod bits;
pub mod coerce;
pub mod compare;
pub mod domain;
pub mod errors;
pub mod field;
#[cfg(feature = "serde")]
pub mod fixture;
pub mod getter;
pub mod packer;
pub mod report;
pub mod value;

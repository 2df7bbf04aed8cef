//! YAML fixture files.
//!
//! A fixture file maps test names to records:
//!
//! ```yaml
//! ipv4 header:
//!   bits:
//!     - {byte: 0, width: 4, value: 4}
//!     - {byte: 0, bit: 4, width: 4, value: 5}
//!   expected:
//!     - Version: 4
//!     - HeaderLength: 5
//! raw:
//!   input: "45 00 00 14"
//!   expected:
//!     - Version: 4
//!   error: truncated
//! ```
//!
//! `input` is either a list of byte values or a hex string (whitespace is ignored). When `input`
//! is missing or empty, the record's `bits` are packed to produce it.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    errors::FixtureError,
    field::FieldDeclaration,
    packer::{Packer, pack},
    value::{Assertion, Value},
};

/// A record as it appears in the file.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FixtureDef {
    /// Bit fields used to build the input when no literal input is given.
    #[serde(default)]
    pub bits: Vec<FieldDeclaration>,
    /// Literal input bytes.
    #[serde(default)]
    pub input: Option<InputDef>,
    /// Expected accessor values, one mapping per entry.
    #[serde(default)]
    pub expected: Vec<serde_yaml::Mapping>,
    /// Error the test expects the code under test to report.
    #[serde(default)]
    pub error: Option<String>,
}

/// Literal input bytes: a hex string or a list of byte values.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(untagged)]
pub enum InputDef {
    Hex(String),
    Bytes(Vec<u8>),
}

/// A loaded test case with its input materialized.
#[derive(Debug, Clone, PartialEq)]
pub struct Fixture {
    pub bits: Vec<FieldDeclaration>,
    pub input: Vec<u8>,
    pub expected: Vec<Assertion>,
    pub error: Option<String>,
}

impl Fixture {
    /// True if the record names an error the code under test should report.
    pub fn expects_error(&self) -> bool {
        self.error.as_deref().is_some_and(|error| !error.is_empty())
    }
}

/// Fixtures in the order they appear in the file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FixtureSet {
    fixtures: Vec<(String, Fixture)>,
}

impl FixtureSet {
    pub fn get(&self, name: &str) -> Option<&Fixture> {
        self.fixtures
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, fixture)| fixture)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Fixture)> {
        self.fixtures.iter().map(|(name, fixture)| (name.as_str(), fixture))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fixtures.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.fixtures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixtures.is_empty()
    }
}

impl IntoIterator for FixtureSet {
    type Item = (String, Fixture);
    type IntoIter = std::vec::IntoIter<(String, Fixture)>;

    fn into_iter(self) -> Self::IntoIter {
        self.fixtures.into_iter()
    }
}

/// Loads fixture files. By default bit fields are packed without validation.
#[derive(Debug, Clone, Default)]
pub struct FixtureLoader {
    /// If set, bit fields are validated by this packer before packing.
    pub packer: Option<Packer>,
}

impl FixtureLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_packer(&mut self, packer: Packer) -> &mut Self {
        self.packer = Some(packer);
        self
    }

    /// Reads and parses the fixture file at `path`.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<FixtureSet, FixtureError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading fixtures");
        let raw = std::fs::read_to_string(path)?;
        self.parse(&raw)
    }

    /// Parses fixtures from YAML text. Fails on the first invalid record.
    pub fn parse(&self, src: &str) -> Result<FixtureSet, FixtureError> {
        let records: serde_yaml::Mapping = serde_yaml::from_str(src)?;
        let mut fixtures = Vec::with_capacity(records.len());

        for (key, record) in records {
            let name = match key {
                serde_yaml::Value::String(name) => name,
                other => {
                    return Err(FixtureError::InvalidValue {
                        name: format!("{other:?}"),
                        reason: "test names must be strings".to_string(),
                    });
                }
            };

            let def: FixtureDef = serde_yaml::from_value(record)?;
            let fixture = self.materialize(&name, def)?;
            debug!(
                name = %name,
                input_len = fixture.input.len(),
                assertions = fixture.expected.len(),
                "loaded fixture"
            );
            fixtures.push((name, fixture));
        }

        Ok(FixtureSet { fixtures })
    }

    fn materialize(&self, name: &str, def: FixtureDef) -> Result<Fixture, FixtureError> {
        let mut input = match def.input {
            Some(InputDef::Bytes(bytes)) => bytes,
            Some(InputDef::Hex(text)) => {
                let digits: String = text.chars().filter(|c| !c.is_whitespace()).collect();
                hex::decode(digits).map_err(|source| FixtureError::Hex {
                    name: name.to_string(),
                    source,
                })?
            }
            None => Vec::new(),
        };

        if input.is_empty() {
            if def.bits.is_empty() {
                return Err(FixtureError::Incomplete {
                    name: name.to_string(),
                });
            }

            input = match &self.packer {
                Some(packer) => packer.pack(&def.bits).map_err(|source| FixtureError::Pack {
                    name: name.to_string(),
                    source,
                })?,
                None => pack(&def.bits),
            };
        }

        let expected = def
            .expected
            .into_iter()
            .map(|mapping| assertion_from_yaml(mapping).map_err(|reason| invalid(name, reason)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Fixture {
            bits: def.bits,
            input,
            expected,
            error: def.error,
        })
    }
}

fn invalid(name: &str, reason: String) -> FixtureError {
    FixtureError::InvalidValue {
        name: name.to_string(),
        reason,
    }
}

fn assertion_from_yaml(mapping: serde_yaml::Mapping) -> Result<Assertion, String> {
    let mut assertion = Assertion::new();
    for (key, value) in mapping {
        let serde_yaml::Value::String(path) = key else {
            return Err(format!("accessor path {key:?} is not a string"));
        };
        assertion.insert(path, value_from_yaml(value)?);
    }
    Ok(assertion)
}

/// Converts a YAML value into an expected [Value]. Mappings become nested assertions.
pub fn value_from_yaml(value: serde_yaml::Value) -> Result<Value, String> {
    Ok(match value {
        serde_yaml::Value::Null => Value::Nil,
        serde_yaml::Value::Bool(v) => Value::Bool(v),
        serde_yaml::Value::Number(n) => {
            if let Some(v) = n.as_i64() {
                Value::I64(v)
            } else if let Some(v) = n.as_u64() {
                Value::U64(v)
            } else if let Some(v) = n.as_f64() {
                Value::F64(v)
            } else {
                return Err(format!("unsupported number {n}"));
            }
        }
        serde_yaml::Value::String(v) => Value::Str(v),
        serde_yaml::Value::Sequence(items) => Value::List(
            items
                .into_iter()
                .map(value_from_yaml)
                .collect::<Result<_, _>>()?,
        ),
        serde_yaml::Value::Mapping(mapping) => Value::Nested(vec![assertion_from_yaml(mapping)?]),
        serde_yaml::Value::Tagged(tagged) => value_from_yaml(tagged.value)?,
    })
}

/// Loads the fixture file at `path` and calls `callback` once per record, in file order.
///
/// Every record is loaded before the first callback; a loading error means no callback runs.
pub fn iterate_fixtures(
    path: impl AsRef<Path>,
    mut callback: impl FnMut(&str, Fixture),
) -> Result<(), FixtureError> {
    let fixtures = FixtureLoader::new().load(path)?;
    for (name, fixture) in fixtures {
        callback(&name, fixture);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{compare::compare_value, errors::PackError};

    fn testdata(name: &str) -> String {
        format!("{}/testdata/{}", env!("CARGO_MANIFEST_DIR"), name)
    }

    #[test]
    fn test_iterate_good_fixtures() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
        let mut seen = Vec::new();

        iterate_fixtures(testdata("good.yml"), |name, fixture| {
            let expected = fixture.expected[0].get("bytes").unwrap();
            let report = compare_value("bytes", expected, &Value::Bytes(fixture.input.clone()));
            assert!(!report.failed(), "{name}:\n{report}");
            seen.push(name.to_string());
        })
        .unwrap();

        assert_eq!(
            seen,
            vec!["regression", "literal input", "hex input", "expects error"]
        );
    }

    #[test]
    fn test_iterate_bad_fixtures() {
        let mut calls = 0;
        let err = iterate_fixtures(testdata("bad.yml"), |_, _| calls += 1).unwrap_err();

        assert!(matches!(err, FixtureError::Incomplete { ref name } if name == "missing input"));
        assert_eq!(
            err.to_string(),
            "neither input nor bit definitions were specified for test missing input"
        );
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_missing_file() {
        let err = iterate_fixtures(testdata("nope.yml"), |_, _| {}).unwrap_err();
        assert!(matches!(err, FixtureError::Io(_)));
    }

    #[test]
    fn test_fixture_contents() {
        let fixtures = FixtureLoader::new().load(testdata("good.yml")).unwrap();
        assert_eq!(fixtures.len(), 4);
        assert_eq!(
            fixtures.names().collect::<Vec<_>>(),
            vec!["regression", "literal input", "hex input", "expects error"]
        );
        assert_eq!(
            fixtures
                .iter()
                .filter(|(_, fixture)| fixture.expects_error())
                .map(|(name, _)| name)
                .collect::<Vec<_>>(),
            vec!["expects error"]
        );

        let regression = fixtures.get("regression").unwrap();
        assert_eq!(regression.input, vec![0x10, 0x0f, 0xff, 0xf0, 0x42, 0x42]);
        assert_eq!(regression.bits.len(), 4);
        assert!(!regression.expects_error());

        let hex = fixtures.get("hex input").unwrap();
        assert_eq!(hex.input, vec![0xde, 0xad, 0xbe, 0xef]);

        let error = fixtures.get("expects error").unwrap();
        assert!(error.expects_error());
        assert_eq!(error.error.as_deref(), Some("short buffer"));
    }

    #[test]
    fn test_nested_expectations() {
        let src = r#"
header:
  input: [0x45]
  expected:
    - Header:
        Version: 4
        Flags: [1, 2]
    - Source: "10.0.0.1"
"#;
        let fixtures = FixtureLoader::new().parse(src).unwrap();
        let fixture = fixtures.get("header").unwrap();

        assert_eq!(
            fixture.expected,
            vec![
                Assertion::new().expect(
                    "Header",
                    vec![
                        Assertion::new()
                            .expect("Version", 4i64)
                            .expect("Flags", Value::list([1i64, 2]))
                    ]
                ),
                Assertion::new().expect("Source", "10.0.0.1"),
            ]
        );
    }

    #[test]
    fn test_bits_used_when_input_empty() {
        let src = r#"
empty input:
  input: []
  bits:
    - {byte: 0, width: 8, value: 0x7f}
"#;
        let fixtures = FixtureLoader::new().parse(src).unwrap();
        assert_eq!(fixtures.get("empty input").unwrap().input, vec![0x7f]);
    }

    #[test]
    fn test_validating_packer() {
        let src = r#"
overlap:
  bits:
    - {byte: 0, width: 8, value: 0xff}
    - {byte: 0, bit: 4, width: 8, value: 0}
"#;
        let fixtures = FixtureLoader::new().parse(src).unwrap();
        assert_eq!(fixtures.get("overlap").unwrap().input, vec![0xf0, 0x00]);

        let mut packer = Packer::new();
        packer.set_reject_overlaps(true);
        let err = FixtureLoader::new().set_packer(packer).parse(src).unwrap_err();
        assert!(matches!(
            err,
            FixtureError::Pack {
                source: PackError::Overlap { index: 1, earlier: 0, bit: 4 },
                ..
            }
        ));
    }

    #[test]
    fn test_invalid_hex() {
        let err = FixtureLoader::new()
            .parse("broken:\n  input: \"zz\"\n")
            .unwrap_err();
        assert!(matches!(err, FixtureError::Hex { ref name, .. } if name == "broken"));
    }
}

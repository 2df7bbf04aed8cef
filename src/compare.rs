//! Checking expected assertions against a live object.

use tracing::debug;

use crate::{
    coerce::coerce,
    getter::{Queryable, resolve},
    report::Report,
    value::{Assertion, Value},
};

/// Evaluates every assertion against `object` and collects all failures.
///
/// A path that does not resolve to a getter is recorded as a failure and the run continues with
/// the next entry. Values are compared after coercing the expected value toward the actual one.
pub fn compare(expected: &[Assertion], object: &dyn Queryable) -> Report {
    compare_at("", expected, object)
}

/// Compares a single expected value with an actual one, as [compare] does for each entry.
pub fn compare_value(path: &str, expected: &Value, actual: &Value) -> Report {
    let mut report = Report::new();
    check(path, expected, actual, &mut report);
    report
}

fn join(prefix: &str, path: &str) -> String {
    if prefix.is_empty() {
        path.to_string()
    } else {
        format!("{prefix}.{path}")
    }
}

fn compare_at(prefix: &str, expected: &[Assertion], object: &dyn Queryable) -> Report {
    let mut report = Report::new();

    for assertion in expected {
        for (path, expected_value) in assertion.iter() {
            let full_path = join(prefix, path);
            debug!(path = %full_path, expected = %expected_value, "comparing");

            let actual = match resolve(path, object).and_then(|getter| getter.call()) {
                Ok(actual) => actual,
                Err(err) => {
                    report.add(join(prefix, &err.to_string()));
                    continue;
                }
            };

            check(&full_path, expected_value, &actual, &mut report);
        }
    }

    report
}

fn check(path: &str, expected: &Value, actual: &Value, report: &mut Report) {
    if let Value::Object(object) = actual {
        if let Some(assertions) = expected.as_assertions() {
            report.merge(compare_at(path, &assertions, &**object));
            return;
        }
    }

    if let (Value::List(expected_items), Value::List(actual_items)) = (expected, actual) {
        if expected_items
            .iter()
            .any(|item| matches!(item, Value::Nested(_)))
        {
            if expected_items.len() != actual_items.len() {
                report.add(format_args!("{path} Expected {expected} but got {actual}"));
                return;
            }

            for (i, (expected, actual)) in expected_items.iter().zip(actual_items).enumerate() {
                check(&format!("{path}[{i}]"), expected, actual, report);
            }
            return;
        }
    }

    let expected = coerce(expected.clone(), actual);
    if expected != *actual {
        report.add(format_args!("{path} Expected {expected} but got {actual}"));
    }
}

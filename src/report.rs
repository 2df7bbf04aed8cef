//! Accumulated outcome of a comparison run.

use std::fmt;

/// Ordered, append-only list of failure messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    failures: Vec<String>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if at least one failure was recorded.
    pub fn failed(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Appends one failure message.
    pub fn add(&mut self, failure: impl fmt::Display) {
        self.failures.push(failure.to_string());
    }

    /// Appends the failures of `other`, after this report's own.
    pub fn merge(&mut self, other: Report) {
        self.extend(other.failures);
    }

    pub fn failures(&self) -> &[String] {
        &self.failures
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }
}

/// One failure per line, each indented by a tab.
impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, failure) in self.failures.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "\t{failure}")?;
        }
        Ok(())
    }
}

impl Extend<String> for Report {
    fn extend<I: IntoIterator<Item = String>>(&mut self, iter: I) {
        self.failures.extend(iter);
    }
}

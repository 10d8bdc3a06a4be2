//! Ordered, human-readable diagnostics collected while validating, compiling or aggregating.
//!
//! Nothing in this crate fails on bad configuration or bad selection input. Instead each entry
//! point returns an [`Outcome`]: the best-effort value plus every message explaining what was
//! dropped or replaced along the way.

use std::fmt;
use std::slice;

use serde::Serialize;

/// Accumulator for diagnostic messages, kept in the order they were produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Diagnostics(Vec<String>);

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one message.
    pub fn push(&mut self, message: impl Into<String>) {
        self.0.push(message.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> slice::Iter<'_, String> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// `true` if any message contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.0.iter().any(|m| m.contains(needle))
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl Extend<String> for Diagnostics {
    fn extend<I: IntoIterator<Item = String>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl IntoIterator for Diagnostics {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a String;
    type IntoIter = slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl From<Vec<String>> for Diagnostics {
    fn from(messages: Vec<String>) -> Self {
        Self(messages)
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, message) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            f.write_str(message)?;
        }
        Ok(())
    }
}

/// A value together with the diagnostics produced while building it.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome<T> {
    pub value: T,
    pub diagnostics: Diagnostics,
}

impl<T> Outcome<T> {
    pub fn new(value: T, diagnostics: Diagnostics) -> Self {
        Self { value, diagnostics }
    }

    /// A value with no diagnostics.
    pub fn clean(value: T) -> Self {
        Self::new(value, Diagnostics::new())
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        Outcome {
            value: f(self.value),
            diagnostics: self.diagnostics,
        }
    }

    pub fn into_parts(self) -> (T, Diagnostics) {
        (self.value, self.diagnostics)
    }
}

#[cfg(test)]
mod tests {
    use super::{Diagnostics, Outcome};

    #[test]
    fn keeps_insertion_order() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.push("first");
        diagnostics.push(String::from("second"));
        diagnostics.extend(vec!["third".to_string()]);

        assert_eq!(diagnostics.len(), 3);
        assert_eq!(diagnostics.as_slice(), ["first", "second", "third"]);
        assert!(diagnostics.contains("sec"));
        assert_eq!(diagnostics.to_string(), "first\nsecond\nthird");
    }

    #[test]
    fn outcome_map_keeps_diagnostics() {
        let outcome = Outcome::new(2, Diagnostics::from(vec!["note".to_string()]));
        let mapped = outcome.map(|v| v * 10);
        let (value, diagnostics) = mapped.into_parts();
        assert_eq!(value, 20);
        assert_eq!(diagnostics.into_vec(), vec!["note".to_string()]);
    }
}

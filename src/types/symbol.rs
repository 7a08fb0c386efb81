//! Open-ended symbol values.
//!
//! masscan keeps adding protocol names and status words. A textual value that
//! is not in our tables is carried through as [`Symbol::Raw`] instead of being
//! rejected, so newer scanner output still decodes.

use serde::{Serialize, Serializer};
use std::fmt;

/// A value that is either a known keyword or the raw text it was read from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Symbol<T> {
    /// The text matched an entry in the symbol table.
    Known(T),
    /// Unrecognized text, preserved verbatim.
    Raw(String),
}

impl<T> Symbol<T> {
    /// Get the known keyword, if any.
    pub fn known(&self) -> Option<&T> {
        match self {
            Self::Known(value) => Some(value),
            Self::Raw(_) => None,
        }
    }

    /// Check if the value matched a table entry.
    pub fn is_known(&self) -> bool {
        matches!(self, Self::Known(_))
    }
}

impl<T> From<T> for Symbol<T> {
    fn from(value: T) -> Self {
        Self::Known(value)
    }
}

impl<T: PartialEq> PartialEq<T> for Symbol<T> {
    fn eq(&self, other: &T) -> bool {
        matches!(self, Self::Known(value) if value == other)
    }
}

impl<T: fmt::Display> fmt::Display for Symbol<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(value) => value.fmt(f),
            Self::Raw(text) => f.write_str(text),
        }
    }
}

impl<T: Serialize> Serialize for Symbol<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Known(value) => value.serialize(serializer),
            Self::Raw(text) => serializer.serialize_str(text),
        }
    }
}

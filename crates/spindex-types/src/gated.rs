//! Gated-field wrapper for response redaction

use serde::{Deserialize, Serialize};

/// A field whose value is visible only to entitled or admin requesters.
///
/// Redaction replaces the value, never the key: callers rely on the
/// field being present to know the record carries one at all. A record
/// without a value serializes the surrounding `Option` as null instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "access", content = "value", rename_all = "snake_case")]
pub enum Gated<T> {
    /// The requester may read the value
    Visible(T),
    /// A value exists but the requester is not entitled to it
    Redacted,
}

impl<T> Gated<T> {
    /// Wrap a value, keeping it visible only when `visible` is true
    pub fn new(value: T, visible: bool) -> Self {
        if visible {
            Self::Visible(value)
        } else {
            Self::Redacted
        }
    }

    /// The value, if visible
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Visible(v) => Some(v),
            Self::Redacted => None,
        }
    }

    /// Whether the value was redacted
    pub fn is_redacted(&self) -> bool {
        matches!(self, Self::Redacted)
    }
}

//! Completion signals reported by an entity to its parent.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Name used when an entity simply completes without a reason.
pub const DONE: &str = "true";

/// Name of the synthetic transition produced by [`EntitySequence::skip`].
///
/// [`EntitySequence::skip`]: crate::sequence::EntitySequence
pub const SKIP: &str = "skip";

/// A completion signal: a name plus an opaque payload.
///
/// A bare boolean `true` completion is the transition named [`DONE`]; a
/// bare string completion carries `Value::Null` params.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    /// Why the entity completed.
    pub name: String,
    /// Opaque payload for the parent.
    #[serde(default)]
    pub params: Value,
}

impl Transition {
    /// A named transition without params.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Value::Null,
        }
    }

    /// A named transition carrying a payload.
    #[must_use]
    pub fn with_params(name: impl Into<String>, params: Value) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }

    /// The plain "completed" transition.
    #[must_use]
    pub fn done() -> Self {
        Self::new(DONE)
    }

    /// Returns `true` if this is the plain "completed" transition.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.name == DONE && self.params.is_null()
    }
}

impl Default for Transition {
    fn default() -> Self {
        Self::done()
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.params.is_null() {
            f.write_str(&self.name)
        } else {
            write!(f, "{}({})", self.name, self.params)
        }
    }
}

impl From<&str> for Transition {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Transition {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl From<bool> for Transition {
    fn from(value: bool) -> Self {
        Self::new(value.to_string())
    }
}

//! Identification of guarded methods and of single invocations.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A guarded method, identified by its declaring type and its name.
///
/// This is the key declarations are looked up and rules are memoized under.
/// Displays as `Type::method`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MethodKey {
    pub type_name: String,
    pub method_name: String,
}

impl MethodKey {
    pub fn new(type_name: impl Into<String>, method_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            method_name: method_name.into(),
        }
    }

    /// Parse a `Type::method` path. The split happens at the last `::`, so
    /// module-qualified type names are kept whole.
    pub fn parse(path: &str) -> Option<Self> {
        let (type_name, method_name) = path.rsplit_once("::")?;
        if type_name.is_empty() || method_name.is_empty() {
            return None;
        }
        Some(Self::new(type_name, method_name))
    }
}

impl fmt::Display for MethodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.type_name, self.method_name)
    }
}

/// Unique identifier for a single pass through the interceptor.
///
/// Correlates the tracing events and the observation event of one call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InvocationId(pub uuid::Uuid);

impl InvocationId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for InvocationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for InvocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

//! Structure identifiers for resources

use std::fmt;
use std::str::FromStr;

/// Stable identifier of a resource, independent of its current path
///
/// Backed by a UUID. The nil UUID is reserved as [`StructureId::NULL`], the
/// sentinel that stands in for a missing or unresolved endpoint id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StructureId(u128);

impl StructureId {
    /// The null sentinel (nil UUID)
    pub const NULL: StructureId = StructureId(0);

    /// Generate a new UUIDv7-based StructureId
    ///
    /// # Examples
    ///
    /// ```
    /// use linkguard_domain::StructureId;
    ///
    /// let id = StructureId::new();
    /// assert!(!id.is_null());
    /// ```
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().as_u128())
    }

    /// Create a StructureId from a raw u128 value
    ///
    /// This is primarily for storage layer deserialization.
    pub fn from_value(value: u128) -> Self {
        Self(value)
    }

    /// Parse a StructureId from its hyphenated UUID form
    ///
    /// # Examples
    ///
    /// ```
    /// use linkguard_domain::StructureId;
    ///
    /// let id = StructureId::new();
    /// let parsed = StructureId::parse(&id.to_string()).unwrap();
    /// assert_eq!(id, parsed);
    /// ```
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        uuid::Uuid::parse_str(s).map(|u| Self(u.as_u128()))
    }

    /// Get the raw u128 value
    pub fn value(&self) -> u128 {
        self.0
    }

    /// Whether this is the null sentinel
    pub fn is_null(&self) -> bool {
        self.0 == 0
    }
}

impl Default for StructureId {
    /// Defaults to the null sentinel, not a fresh id
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Display for StructureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", uuid::Uuid::from_u128(self.0))
    }
}

impl FromStr for StructureId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

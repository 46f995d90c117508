//! Badge identifiers.
//!
//! Badges are keyed by a random UUID rather than a database sequence so an
//! id can be minted before the row exists and reused verbatim as the key of
//! the badge's entry in the storefront mirror.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Primary key of a badge, serialized as the bare hyphenated UUID string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct BadgeId(uuid::Uuid);

impl BadgeId {
    /// Mints a fresh id for a badge about to be stored.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Wraps a UUID read back from storage.
    #[must_use]
    pub const fn from_uuid(uuid: uuid::Uuid) -> Self {
        Self(uuid)
    }

    /// Borrows the UUID, e.g. to bind it as a query parameter.
    #[must_use]
    pub const fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }

    /// Returns `true` for the all-zero id, which is never assigned.
    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl Default for BadgeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BadgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BadgeId {
    type Err = uuid::Error;

    /// Surrounding whitespace from a path segment is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::parse_str(s.trim()).map(Self)
    }
}

impl From<uuid::Uuid> for BadgeId {
    fn from(uuid: uuid::Uuid) -> Self {
        Self(uuid)
    }
}

impl From<BadgeId> for uuid::Uuid {
    fn from(id: BadgeId) -> Self {
        id.0
    }
}

//! Persistence layer: the [`BadgeStore`] trait and its backends.
//!
//! The store enforces name uniqueness and nothing else; field rules are
//! applied beforehand by [`crate::domain::validate_fields`]. Two backends
//! are provided: [`MemoryBadgeStore`] for tests and persistence-disabled
//! deployments, and [`PostgresBadgeStore`] backed by `sqlx::PgPool`.

pub mod memory;
pub mod models;
pub mod postgres;

pub use memory::MemoryBadgeStore;
pub use postgres::PostgresBadgeStore;

use async_trait::async_trait;

use crate::domain::{BadgeFields, BadgeId, BadgeRecord};
use crate::error::BadgeError;

/// Storage for badge records.
///
/// Implementations must reject a `timer_name` already used by a different
/// record with [`BadgeError::DuplicateName`], and report absent ids with
/// [`BadgeError::NotFound`].
#[async_trait]
pub trait BadgeStore: Send + Sync + std::fmt::Debug {
    /// Inserts a new record.
    ///
    /// # Errors
    ///
    /// [`BadgeError::DuplicateName`] on a name conflict,
    /// [`BadgeError::PersistenceError`] on backend failure.
    async fn insert(&self, record: BadgeRecord) -> Result<BadgeRecord, BadgeError>;

    /// Returns every record, oldest first.
    ///
    /// # Errors
    ///
    /// [`BadgeError::PersistenceError`] on backend failure.
    async fn list(&self) -> Result<Vec<BadgeRecord>, BadgeError>;

    /// Returns the record with the given id.
    ///
    /// # Errors
    ///
    /// [`BadgeError::NotFound`] if absent.
    async fn get(&self, id: BadgeId) -> Result<BadgeRecord, BadgeError>;

    /// Replaces every field of an existing record and returns the new state.
    ///
    /// # Errors
    ///
    /// [`BadgeError::NotFound`] if absent, [`BadgeError::DuplicateName`] if
    /// another record already uses the new name.
    async fn replace(&self, id: BadgeId, fields: BadgeFields) -> Result<BadgeRecord, BadgeError>;

    /// Removes a record and returns its last state.
    ///
    /// # Errors
    ///
    /// [`BadgeError::NotFound`] if absent.
    async fn remove(&self, id: BadgeId) -> Result<BadgeRecord, BadgeError>;
}

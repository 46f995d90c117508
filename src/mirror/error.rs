//! Mirror synchronization errors.

/// Failure of one mirror synchronization.
///
/// None of these reach an HTTP response: the badge mutation has already
/// been committed when the mirror runs, so callers log and move on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyncError {
    /// A required argument (installation id, credentials, badge id) was
    /// missing. Raised before any network call.
    #[error("missing sync precondition: {0}")]
    PreconditionFailed(String),

    /// The platform answered the write with user errors.
    #[error("Metafield update failed: {0}")]
    SyncRejected(String),

    /// Transport failure, timeout, non-success status or top-level
    /// GraphQL errors.
    #[error("metafield API unavailable: {0}")]
    SyncUnavailable(String),

    /// The blob changed between read and write (`compareDigest` mismatch).
    #[error("metafield changed since it was read")]
    StaleDigest,

    /// Every attempt lost the optimistic-concurrency race.
    #[error("metafield write kept conflicting after {attempts} attempts")]
    SyncConflict {
        /// Number of fetch/merge/write cycles tried.
        attempts: u32,
    },
}

impl SyncError {
    /// Returns `true` for failures worth retrying after a backoff delay.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::SyncUnavailable(_))
    }
}

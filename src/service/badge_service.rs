//! Badge service: CRUD over the store, then mirror replication.

use std::sync::Arc;

use crate::domain::{BadgeFields, BadgeId, BadgeInput, BadgeRecord, UrgencyNotification, validate_fields};
use crate::error::BadgeError;
use crate::mirror::{MirrorSync, SyncAction, SyncScope};
use crate::persistence::BadgeStore;

/// Orchestration layer for all badge operations.
///
/// Every mutation commits to the [`BadgeStore`] first and only then
/// replicates into the storefront mirror. A failed replication is logged
/// and leaves the committed change in place.
#[derive(Debug, Clone)]
pub struct BadgeService {
    store: Arc<dyn BadgeStore>,
    mirror: Option<Arc<MirrorSync>>,
}

impl BadgeService {
    /// Creates a service without mirror replication.
    #[must_use]
    pub fn new(store: Arc<dyn BadgeStore>) -> Self {
        Self {
            store,
            mirror: None,
        }
    }

    /// Enables replication into the storefront mirror.
    #[must_use]
    pub fn with_mirror(mut self, mirror: Arc<MirrorSync>) -> Self {
        self.mirror = Some(mirror);
        self
    }

    /// Returns `true` when mutations are replicated.
    #[must_use]
    pub fn mirror_enabled(&self) -> bool {
        self.mirror.is_some()
    }

    /// Validates `input` and stores it as a new badge.
    ///
    /// # Errors
    ///
    /// [`BadgeError::InvalidInput`] when the name is missing or a field is
    /// invalid, [`BadgeError::DuplicateName`] on a name conflict.
    pub async fn create(
        &self,
        input: BadgeInput,
        scope: &SyncScope,
    ) -> Result<BadgeRecord, BadgeError> {
        let fields = prepare(input)?;
        let badge = self.store.insert(BadgeRecord::new(fields)).await?;

        tracing::info!(badge_id = %badge.id, timer_name = %badge.fields.timer_name, "badge created");
        self.replicate(scope, &badge, SyncAction::Create).await;
        Ok(badge)
    }

    /// Returns every badge, oldest first.
    ///
    /// # Errors
    ///
    /// [`BadgeError::PersistenceError`] on store failure.
    pub async fn list(&self) -> Result<Vec<BadgeRecord>, BadgeError> {
        self.store.list().await
    }

    /// Looks up one badge. A malformed id is reported as not found.
    ///
    /// # Errors
    ///
    /// [`BadgeError::NotFound`] if no badge has this id.
    pub async fn get_by_id(&self, id: &str) -> Result<BadgeRecord, BadgeError> {
        self.store.get(parse_id(id)?).await
    }

    /// Replaces every field of an existing badge.
    ///
    /// Fields absent from `input` revert to their defaults. The id is
    /// resolved before the body is validated, so an unknown id is reported
    /// as not found whatever the body holds.
    ///
    /// # Errors
    ///
    /// [`BadgeError::NotFound`] if no badge has this id,
    /// [`BadgeError::InvalidInput`] or [`BadgeError::DuplicateName`] as for
    /// [`BadgeService::create`].
    pub async fn update(
        &self,
        id: &str,
        input: BadgeInput,
        scope: &SyncScope,
    ) -> Result<BadgeRecord, BadgeError> {
        let id = parse_id(id)?;
        self.store.get(id).await?;
        let fields = prepare(input)?;
        let badge = self.store.replace(id, fields).await?;

        tracing::info!(badge_id = %badge.id, "badge updated");
        self.replicate(scope, &badge, SyncAction::Update).await;
        Ok(badge)
    }

    /// Removes a badge and its mirror entry.
    ///
    /// # Errors
    ///
    /// [`BadgeError::NotFound`] if no badge has this id.
    pub async fn delete(&self, id: &str, scope: &SyncScope) -> Result<BadgeRecord, BadgeError> {
        let badge = self.store.remove(parse_id(id)?).await?;

        tracing::info!(badge_id = %badge.id, "badge deleted");
        self.replicate(scope, &badge, SyncAction::Delete).await;
        Ok(badge)
    }

    async fn replicate(&self, scope: &SyncScope, badge: &BadgeRecord, action: SyncAction) {
        let Some(mirror) = &self.mirror else {
            return;
        };
        if let Err(e) = mirror.sync_for_scope(scope, badge, action).await {
            tracing::warn!(
                badge_id = %badge.id,
                action = action.as_str(),
                error = %e,
                "metafield mirror not updated"
            );
        }
    }
}

/// Applies the submission rules shared by create and update: a name is
/// required and an unknown urgency mode becomes `None`.
fn prepare(mut input: BadgeInput) -> Result<BadgeFields, BadgeError> {
    let has_name = input
        .timer_name
        .as_deref()
        .is_some_and(|n| !n.trim().is_empty());
    if !has_name {
        return Err(BadgeError::InvalidInput("Timer name is required".to_string()));
    }

    let urgency = UrgencyNotification::coerce(input.urgency_notification.as_deref());
    input.urgency_notification = Some(urgency.as_str().to_string());

    Ok(validate_fields(&input)?)
}

fn parse_id(raw: &str) -> Result<BadgeId, BadgeError> {
    raw.parse()
        .map_err(|_| BadgeError::NotFound(raw.to_string()))
}

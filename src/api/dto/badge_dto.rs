//! Badge request and response bodies.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::badge::{DEFAULT_COLOR, DEFAULT_URGENCY_THRESHOLD_SECS};
use crate::domain::validation::{MAX_DESCRIPTION_CHARS, MIN_NAME_CHARS};
use crate::domain::{BadgeRecord, TimerPosition, TimerSize, UrgencyNotification};
use crate::mirror::SyncScope;

/// Query string sent by the embedded admin on mutating requests.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SyncQuery {
    /// Shop domain whose storefront mirror should be updated.
    pub shop: Option<String>,
    /// Base64 admin host passed by the embedded app. Accepted and ignored.
    pub host: Option<String>,
}

impl SyncQuery {
    /// Converts the query into a mirror routing scope.
    #[must_use]
    pub fn scope(&self) -> SyncScope {
        SyncScope {
            shop: self.shop.clone(),
        }
    }
}

/// `201` body of `createBadge`.
#[derive(Debug, Serialize, ToSchema)]
pub struct BadgeMutationResponse {
    /// Confirmation text shown in the admin toast.
    pub message: String,
    /// The stored badge.
    pub badge: BadgeRecord,
}

impl BadgeMutationResponse {
    /// Wraps a badge with a confirmation message.
    #[must_use]
    pub fn new(message: &str, badge: BadgeRecord) -> Self {
        Self {
            message: message.to_string(),
            badge,
        }
    }
}

/// Body of `getBadge`.
#[derive(Debug, Serialize, ToSchema)]
pub struct BadgeResponse {
    /// The requested badge.
    pub badge: BadgeRecord,
}

/// Body of `getBadges`.
#[derive(Debug, Serialize, ToSchema)]
pub struct BadgeListResponse {
    /// Every stored badge, oldest first.
    pub badges: Vec<BadgeRecord>,
}

/// Body of `deleteBadge`.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    /// Confirmation text.
    pub message: String,
}

/// Allowed values and defaults for the badge editor form.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BadgeOptionsResponse {
    /// Accepted `timerSize` values.
    pub timer_sizes: Vec<TimerSize>,
    /// Accepted `timerPosition` values.
    pub timer_positions: Vec<TimerPosition>,
    /// Accepted `urgencyNotification` values.
    pub urgency_notifications: Vec<UrgencyNotification>,
    /// Default `color`.
    pub default_color: &'static str,
    /// Default `urgencyTriggerThreshold`, in seconds.
    pub default_urgency_trigger_threshold: u64,
    /// Minimum `timerName` length.
    pub min_name_length: usize,
    /// Maximum `promotionDescription` length.
    pub max_description_length: usize,
}

impl Default for BadgeOptionsResponse {
    fn default() -> Self {
        Self {
            timer_sizes: TimerSize::ALL.to_vec(),
            timer_positions: TimerPosition::ALL.to_vec(),
            urgency_notifications: UrgencyNotification::ALL.to_vec(),
            default_color: DEFAULT_COLOR,
            default_urgency_trigger_threshold: DEFAULT_URGENCY_THRESHOLD_SECS,
            min_name_length: MIN_NAME_CHARS,
            max_description_length: MAX_DESCRIPTION_CHARS,
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn options_list_wire_names() {
        let Ok(json) = serde_json::to_value(BadgeOptionsResponse::default()) else {
            panic!("serialization failed");
        };
        assert_eq!(
            json["urgencyNotifications"],
            serde_json::json!(["Color pulse", "Notification banner", "None"])
        );
        assert_eq!(json["defaultUrgencyTriggerThreshold"], 3600);
    }

    #[test]
    fn blank_query_has_no_shop() {
        assert_eq!(SyncQuery::default().scope(), SyncScope::default());
    }
}

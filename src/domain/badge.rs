//! Timer badge records and the raw request payload they are built from.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::BadgeId;

/// Default badge color (`hsb(120, 50%, 80%)` in the admin color picker).
pub const DEFAULT_COLOR: &str = "#78CCB3";

/// Default urgency trigger threshold: one hour before the end time.
pub const DEFAULT_URGENCY_THRESHOLD_SECS: u64 = 3600;

/// Returned when a stored string does not name a known enum variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownVariant {
    /// Enum being parsed.
    pub kind: &'static str,
    /// Offending value.
    pub value: String,
}

/// Rendered size of the countdown widget.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum TimerSize {
    /// Compact widget.
    Small,
    /// Standard widget.
    #[default]
    Medium,
    /// Enlarged widget.
    Large,
}

impl TimerSize {
    /// Every accepted size, in display order.
    pub const ALL: [Self; 3] = [Self::Small, Self::Medium, Self::Large];

    /// Wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Small => "Small",
            Self::Medium => "Medium",
            Self::Large => "Large",
        }
    }
}

impl FromStr for TimerSize {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| UnknownVariant {
                kind: "timer size",
                value: s.to_string(),
            })
    }
}

impl fmt::Display for TimerSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the widget is anchored on the storefront page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum TimerPosition {
    /// Above the product content.
    #[default]
    Top,
    /// Below the product content.
    Bottom,
    /// Left of the product content.
    Left,
    /// Right of the product content.
    Right,
}

impl TimerPosition {
    /// Every accepted position, in display order.
    pub const ALL: [Self; 4] = [Self::Top, Self::Bottom, Self::Left, Self::Right];

    /// Wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Top => "Top",
            Self::Bottom => "Bottom",
            Self::Left => "Left",
            Self::Right => "Right",
        }
    }
}

impl FromStr for TimerPosition {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| UnknownVariant {
                kind: "timer position",
                value: s.to_string(),
            })
    }
}

impl fmt::Display for TimerPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Visual effect shown once the countdown crosses the urgency threshold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum UrgencyNotification {
    /// The widget color pulses.
    #[default]
    #[serde(rename = "Color pulse")]
    ColorPulse,
    /// A banner is shown above the widget.
    #[serde(rename = "Notification banner")]
    NotificationBanner,
    /// No urgency effect.
    None,
}

impl UrgencyNotification {
    /// Every accepted mode, in display order.
    pub const ALL: [Self; 3] = [Self::ColorPulse, Self::NotificationBanner, Self::None];

    /// Wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ColorPulse => "Color pulse",
            Self::NotificationBanner => "Notification banner",
            Self::None => "None",
        }
    }

    /// Maps any unrecognized or missing value to [`UrgencyNotification::None`].
    #[must_use]
    pub fn coerce(value: Option<&str>) -> Self {
        value.and_then(|v| v.parse().ok()).unwrap_or(Self::None)
    }
}

impl FromStr for UrgencyNotification {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| UnknownVariant {
                kind: "urgency notification",
                value: s.to_string(),
            })
    }
}

impl fmt::Display for UrgencyNotification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The validated, persisted configuration of a badge.
///
/// This is exactly the set of fields mirrored into the metafield blob;
/// identity and timestamps live on [`BadgeRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BadgeFields {
    /// Unique, trimmed display name (at least 3 characters).
    pub timer_name: String,
    /// `MM/DD/YYYY` or empty.
    pub start_date: String,
    /// `HH:MM` or empty.
    pub start_time: String,
    /// `MM/DD/YYYY` or empty.
    pub end_date: String,
    /// `HH:MM` or empty.
    pub end_time: String,
    /// Free text shown with the timer (at most 500 characters).
    pub promotion_description: String,
    /// `#RRGGBB` hex color.
    pub color: String,
    /// Widget size.
    pub timer_size: TimerSize,
    /// Widget anchor.
    pub timer_position: TimerPosition,
    /// Effect shown when the threshold is crossed.
    pub urgency_notification: UrgencyNotification,
    /// Seconds before the end time at which the urgency effect starts.
    pub urgency_trigger_threshold: u64,
}

impl BadgeFields {
    /// Creates a field set with the given name and every other field at
    /// its default.
    #[must_use]
    pub fn with_name(timer_name: impl Into<String>) -> Self {
        Self {
            timer_name: timer_name.into(),
            start_date: String::new(),
            start_time: String::new(),
            end_date: String::new(),
            end_time: String::new(),
            promotion_description: String::new(),
            color: DEFAULT_COLOR.to_string(),
            timer_size: TimerSize::default(),
            timer_position: TimerPosition::default(),
            urgency_notification: UrgencyNotification::default(),
            urgency_trigger_threshold: DEFAULT_URGENCY_THRESHOLD_SECS,
        }
    }
}

/// A stored timer badge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BadgeRecord {
    /// Badge identity.
    #[serde(rename = "_id")]
    pub id: BadgeId,
    /// Persisted configuration.
    #[serde(flatten)]
    pub fields: BadgeFields,
    /// Creation timestamp (immutable).
    pub created_at: DateTime<Utc>,
    /// Timestamp of the last replace.
    pub updated_at: DateTime<Utc>,
}

impl BadgeRecord {
    /// Creates a new record with a fresh id.
    #[must_use]
    pub fn new(fields: BadgeFields) -> Self {
        let now = Utc::now();
        Self {
            id: BadgeId::new(),
            fields,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns a copy with `fields` swapped in and `updated_at` bumped.
    #[must_use]
    pub fn replaced(&self, fields: BadgeFields) -> Self {
        Self {
            id: self.id,
            fields,
            created_at: self.created_at,
            updated_at: Utc::now(),
        }
    }
}

/// Untrusted badge payload as submitted by the admin UI.
///
/// Every field is optional and loosely typed so that the service decides
/// between defaulting, coercion and rejection rather than the JSON decoder.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BadgeInput {
    /// Display name. Required.
    pub timer_name: Option<String>,
    /// `MM/DD/YYYY`.
    pub start_date: Option<String>,
    /// `HH:MM`.
    pub start_time: Option<String>,
    /// `MM/DD/YYYY`.
    pub end_date: Option<String>,
    /// `HH:MM`.
    pub end_time: Option<String>,
    /// Free text, at most 500 characters.
    pub promotion_description: Option<String>,
    /// `#RRGGBB`.
    pub color: Option<String>,
    /// `Small`, `Medium` or `Large`.
    pub timer_size: Option<String>,
    /// `Top`, `Bottom`, `Left` or `Right`.
    pub timer_position: Option<String>,
    /// `Color pulse`, `Notification banner` or `None`.
    pub urgency_notification: Option<String>,
    /// Seconds, as a JSON number or numeric string.
    #[schema(value_type = Option<u64>)]
    pub urgency_trigger_threshold: Option<serde_json::Value>,
}

#[cfg(test)]
#[allow(clippy::panic, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn urgency_coerces_unknown_to_none() {
        assert_eq!(
            UrgencyNotification::coerce(Some("Bogus")),
            UrgencyNotification::None
        );
        assert_eq!(UrgencyNotification::coerce(None), UrgencyNotification::None);
        assert_eq!(
            UrgencyNotification::coerce(Some("Notification banner")),
            UrgencyNotification::NotificationBanner
        );
    }

    #[test]
    fn enum_parsing_is_case_sensitive() {
        assert!("small".parse::<TimerSize>().is_err());
        assert_eq!("Left".parse::<TimerPosition>().ok(), Some(TimerPosition::Left));
    }

    #[test]
    fn record_serializes_with_mongo_style_id() {
        let record = BadgeRecord::new(BadgeFields::with_name("Sale"));
        let Ok(json) = serde_json::to_value(&record) else {
            panic!("serialization failed");
        };
        assert_eq!(json["_id"], serde_json::json!(record.id.to_string()));
        assert_eq!(json["timerName"], "Sale");
        assert_eq!(json["urgencyNotification"], "Color pulse");
        assert_eq!(json["urgencyTriggerThreshold"], 3600);
        assert!(json.get("fields").is_none());
    }

    #[test]
    fn replaced_keeps_identity_and_creation_time() {
        let record = BadgeRecord::new(BadgeFields::with_name("Sale"));
        let next = record.replaced(BadgeFields::with_name("Clearance"));
        assert_eq!(next.id, record.id);
        assert_eq!(next.created_at, record.created_at);
        assert_eq!(next.fields.timer_name, "Clearance");
    }

    #[test]
    fn input_accepts_partial_payloads() {
        let Ok(input) = serde_json::from_str::<BadgeInput>(r#"{"timerName":"Sale"}"#) else {
            panic!("partial payload should decode");
        };
        assert_eq!(input.timer_name.as_deref(), Some("Sale"));
        assert!(input.color.is_none());
    }
}

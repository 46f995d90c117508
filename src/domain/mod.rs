//! Domain layer: badge identity, records and field validation.
//!
//! Everything in here is storage-agnostic. The persistence backends and the
//! metafield mirror both consume [`BadgeRecord`] and [`BadgeFields`] but
//! never re-validate them.

pub mod badge;
pub mod badge_id;
pub mod validation;

pub use badge::{
    BadgeFields, BadgeInput, BadgeRecord, TimerPosition, TimerSize, UrgencyNotification,
};
pub use badge_id::BadgeId;
pub use validation::{FieldError, ValidationErrors, validate_fields};

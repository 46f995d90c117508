//! Data Transfer Objects for REST request/response serialization.
//!
//! Badge requests are decoded straight into [`crate::domain::BadgeInput`];
//! this module holds the envelopes around it.

pub mod badge_dto;

pub use badge_dto::*;

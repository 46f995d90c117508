//! Service layer: business logic orchestration.
//!
//! [`BadgeService`] validates submissions, commits them to the
//! [`crate::persistence::BadgeStore`] and replicates each change into the
//! storefront mirror through [`crate::mirror::MirrorSync`].

pub mod badge_service;

pub use badge_service::BadgeService;

//! # badge-admin
//!
//! REST backend for storefront countdown ("timer") badges.
//!
//! Badges are stored in PostgreSQL (or in memory) and every committed
//! change is replicated into a single JSON metafield on the Shopify app
//! installation, where the theme extension reads it.
//!
//! ## Architecture
//!
//! ```text
//! Admin UI (HTTP)
//!     │
//!     ├── REST Handlers (api/)
//!     │
//!     ├── BadgeService (service/)
//!     │     ├── validation (domain/)
//!     │     └── MirrorSync (mirror/) ──► Shopify Admin GraphQL
//!     │
//!     └── BadgeStore (persistence/) ──► PostgreSQL | memory
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod mirror;
pub mod persistence;
pub mod service;

//! Storefront mirror: a copy of every badge kept in one JSON metafield on
//! the app installation, readable by the theme extension.

pub mod blob;
pub mod client;
pub mod error;
pub mod memory;
pub mod shopify;
pub mod sync;

pub use blob::{MirrorMap, SyncAction};
pub use client::{CredentialSource, MetafieldClient, RemoteBlob, ShopCredentials, StaticCredentials};
pub use error::SyncError;
pub use memory::InMemoryMetafieldClient;
pub use shopify::{MetafieldLocation, ShopifyMetafieldClient};
pub use sync::{MirrorSync, RetryPolicy, SyncScope};

//! Remote metafield access and per-shop credentials.

use std::collections::HashMap;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use secrecy::{ExposeSecret, SecretString};

use super::SyncError;

/// Access credentials for one shop's Admin API.
#[derive(Clone)]
pub struct ShopCredentials {
    /// Shop domain, e.g. `example.myshopify.com`.
    pub shop: String,
    /// Admin API access token.
    pub access_token: SecretString,
}

impl ShopCredentials {
    /// Creates credentials for `shop`.
    #[must_use]
    pub fn new(shop: impl Into<String>, access_token: SecretString) -> Self {
        Self {
            shop: shop.into(),
            access_token,
        }
    }

    /// Returns `true` when both the shop and the token are non-empty.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.shop.trim().is_empty() && !self.access_token.expose_secret().trim().is_empty()
    }
}

impl std::fmt::Debug for ShopCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopCredentials")
            .field("shop", &self.shop)
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

/// Returns `true` for a bare `<store>.myshopify.com` host name.
#[must_use]
pub fn is_shop_domain(shop: &str) -> bool {
    SHOP_DOMAIN_RE.is_match(shop)
}

#[allow(clippy::expect_used)]
static SHOP_DOMAIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9-]*\.myshopify\.com$").expect("valid shop domain regex")
});

/// Resolves the credentials to use for a shop.
pub trait CredentialSource: Send + Sync + std::fmt::Debug {
    /// Returns credentials for `shop`, or `None` if the shop is unknown.
    fn credentials_for(&self, shop: &str) -> Option<ShopCredentials>;
}

/// Credentials taken from configuration.
///
/// Only shops registered with [`StaticCredentials::with_shop`] resolve;
/// a token is never handed to a shop it was not configured for.
#[derive(Debug, Default, Clone)]
pub struct StaticCredentials {
    per_shop: HashMap<String, SecretString>,
}

impl StaticCredentials {
    /// Creates a source that knows no shop.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `token` for `shop`. Names that are not a
    /// `*.myshopify.com` host are ignored with a warning.
    #[must_use]
    pub fn with_shop(mut self, shop: impl Into<String>, token: SecretString) -> Self {
        let shop = shop.into().trim().to_ascii_lowercase();
        if is_shop_domain(&shop) {
            self.per_shop.insert(shop, token);
        } else {
            tracing::warn!(%shop, "ignoring credentials for a host that is not a myshopify.com domain");
        }
        self
    }

    /// Number of shops with a token.
    #[must_use]
    pub fn len(&self) -> usize {
        self.per_shop.len()
    }

    /// Returns `true` when no shop has a token.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.per_shop.is_empty()
    }
}

impl CredentialSource for StaticCredentials {
    fn credentials_for(&self, shop: &str) -> Option<ShopCredentials> {
        let shop = shop.trim().to_ascii_lowercase();
        if !is_shop_domain(&shop) {
            return None;
        }
        let token = self.per_shop.get(&shop)?.clone();
        Some(ShopCredentials::new(shop, token))
    }
}

/// Current remote value of the mirror metafield.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteBlob {
    /// Raw JSON string, `None` when the metafield does not exist yet.
    pub value: Option<String>,
    /// Opaque version token used for optimistic concurrency.
    pub compare_digest: Option<String>,
}

/// Read/write access to the mirror metafield of an app installation.
///
/// `write` must replace the whole value in one operation and must fail with
/// [`SyncError::StaleDigest`] when `compare_digest` no longer matches the
/// stored value (`None` meaning "the metafield must not exist yet").
#[async_trait]
pub trait MetafieldClient: Send + Sync + std::fmt::Debug {
    /// Looks up the id of the current app installation for the shop.
    ///
    /// # Errors
    ///
    /// [`SyncError::SyncUnavailable`] on transport failure.
    async fn current_installation_id(
        &self,
        credentials: &ShopCredentials,
    ) -> Result<String, SyncError>;

    /// Reads the mirror blob.
    ///
    /// # Errors
    ///
    /// [`SyncError::SyncUnavailable`] on transport failure.
    async fn fetch(
        &self,
        credentials: &ShopCredentials,
        installation_id: &str,
    ) -> Result<RemoteBlob, SyncError>;

    /// Replaces the mirror blob with `value`.
    ///
    /// # Errors
    ///
    /// [`SyncError::StaleDigest`] on a digest mismatch,
    /// [`SyncError::SyncRejected`] on other user errors,
    /// [`SyncError::SyncUnavailable`] on transport failure.
    async fn write(
        &self,
        credentials: &ShopCredentials,
        installation_id: &str,
        value: &str,
        compare_digest: Option<&str>,
    ) -> Result<(), SyncError>;
}

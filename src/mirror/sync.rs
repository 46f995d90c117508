//! Read-merge-write synchronization of the metafield mirror.
//!
//! One sync cycle fetches the blob and its digest, applies a single badge
//! change, and writes the whole blob back conditioned on that digest. A
//! digest mismatch restarts the cycle against the fresh value; transport
//! failures restart it after an exponential backoff. The whole sync,
//! installation lookup included, is bounded by a deadline so it always
//! finishes inside the HTTP request that triggered it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::instrument;

use super::SyncError;
use super::blob::{self, SyncAction};
use super::client::{CredentialSource, MetafieldClient, ShopCredentials, is_shop_domain};
use crate::domain::BadgeRecord;

/// Bounds on how hard one sync tries before giving up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum fetch/merge/write cycles per sync (at least 1).
    pub max_attempts: u32,
    /// Delay before the first retry after a transient failure.
    pub base_delay: Duration,
    /// Upper bound on the backoff delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
        }
    }
}

/// Default bound on one [`MirrorSync::sync_for_scope`] call.
pub const DEFAULT_SYNC_DEADLINE: Duration = Duration::from_secs(10);

/// Request-scoped routing for a sync: which shop's mirror to update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncScope {
    /// Shop domain from the request, if any.
    pub shop: Option<String>,
}

/// Keeps the remote mirror in step with committed badge changes.
#[derive(Debug)]
pub struct MirrorSync {
    client: Arc<dyn MetafieldClient>,
    credentials: Arc<dyn CredentialSource>,
    default_shop: Option<String>,
    static_installation_id: Option<String>,
    installation_ids: RwLock<HashMap<String, String>>,
    policy: RetryPolicy,
    deadline: Duration,
}

impl MirrorSync {
    /// Creates a sync over `client`, resolving tokens through `credentials`.
    #[must_use]
    pub fn new(client: Arc<dyn MetafieldClient>, credentials: Arc<dyn CredentialSource>) -> Self {
        Self {
            client,
            credentials,
            default_shop: None,
            static_installation_id: None,
            installation_ids: RwLock::new(HashMap::new()),
            policy: RetryPolicy::default(),
            deadline: DEFAULT_SYNC_DEADLINE,
        }
    }

    /// Shop used when the request does not name one.
    #[must_use]
    pub fn with_default_shop(mut self, shop: Option<String>) -> Self {
        self.default_shop = shop.filter(|s| !s.trim().is_empty());
        self
    }

    /// Fixed installation id, skipping the `currentAppInstallation` lookup.
    #[must_use]
    pub fn with_installation_id(mut self, installation_id: Option<String>) -> Self {
        self.static_installation_id = installation_id.filter(|s| !s.trim().is_empty());
        self
    }

    /// Replaces the retry policy.
    #[must_use]
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Bounds the total time of one [`MirrorSync::sync_for_scope`] call.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Resolves shop, credentials and installation for `scope`, then syncs.
    ///
    /// Only shops the credential source knows are contacted. The
    /// installation-id cache is therefore bounded by the configured shops.
    ///
    /// # Errors
    ///
    /// - [`SyncError::PreconditionFailed`] when no shop can be resolved, the
    ///   shop is not a `*.myshopify.com` host, or it has no credentials.
    /// - [`SyncError::SyncUnavailable`] when the deadline passes first.
    /// - Otherwise whatever [`MirrorSync::sync`] returns.
    pub async fn sync_for_scope(
        &self,
        scope: &SyncScope,
        badge: &BadgeRecord,
        action: SyncAction,
    ) -> Result<(), SyncError> {
        let shop = scope
            .shop
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .or(self.default_shop.as_deref())
            .ok_or_else(|| SyncError::PreconditionFailed("no shop to sync".to_string()))?;

        if !is_shop_domain(shop) {
            return Err(SyncError::PreconditionFailed(format!(
                "{shop} is not a myshopify.com domain"
            )));
        }
        let credentials = self.credentials.credentials_for(shop).ok_or_else(|| {
            SyncError::PreconditionFailed(format!("shop {shop} is not configured"))
        })?;
        if !credentials.is_complete() {
            return Err(SyncError::PreconditionFailed(format!(
                "incomplete credentials for shop {shop}"
            )));
        }

        let run = async {
            let installation_id = self.installation_id(&credentials).await?;
            self.sync(&installation_id, &credentials, badge, action)
                .await
        };
        tokio::time::timeout(self.deadline, run)
            .await
            .unwrap_or_else(|_| {
                Err(SyncError::SyncUnavailable(format!(
                    "sync did not finish within {} ms",
                    self.deadline.as_millis()
                )))
            })
    }

    async fn installation_id(&self, credentials: &ShopCredentials) -> Result<String, SyncError> {
        if let Some(id) = &self.static_installation_id {
            return Ok(id.clone());
        }
        if let Some(id) = self.installation_ids.read().await.get(&credentials.shop) {
            return Ok(id.clone());
        }
        let id = self.client.current_installation_id(credentials).await?;
        self.installation_ids
            .write()
            .await
            .insert(credentials.shop.clone(), id.clone());
        Ok(id)
    }

    /// Mirrors one badge change into the installation's metafield.
    ///
    /// Entries for other badges are written back unchanged. A corrupt blob
    /// is replaced by one holding only this change.
    ///
    /// # Errors
    ///
    /// - [`SyncError::PreconditionFailed`] before any network call when the
    ///   installation id, the credentials or the badge id is missing.
    /// - [`SyncError::SyncConflict`] when every attempt hit a stale digest.
    /// - [`SyncError::SyncUnavailable`] when transient failures outlast the
    ///   retry budget.
    /// - [`SyncError::SyncRejected`] immediately on a rejected write.
    #[instrument(skip(self, credentials, badge), fields(shop = %credentials.shop, badge_id = %badge.id))]
    pub async fn sync(
        &self,
        installation_id: &str,
        credentials: &ShopCredentials,
        badge: &BadgeRecord,
        action: SyncAction,
    ) -> Result<(), SyncError> {
        if installation_id.trim().is_empty() {
            return Err(SyncError::PreconditionFailed(
                "installation id is required".to_string(),
            ));
        }
        if !credentials.is_complete() {
            return Err(SyncError::PreconditionFailed(
                "shop credentials are required".to_string(),
            ));
        }
        if badge.id.is_nil() {
            return Err(SyncError::PreconditionFailed("badge id is required".to_string()));
        }

        let max_attempts = self.policy.max_attempts.max(1);
        let mut delay = self.policy.base_delay;

        for attempt in 1..=max_attempts {
            match self.cycle(installation_id, credentials, badge, action).await {
                Ok(()) => {
                    tracing::info!(attempt, "metafield mirror updated");
                    return Ok(());
                }
                Err(SyncError::StaleDigest) if attempt < max_attempts => {
                    tracing::warn!(
                        attempt,
                        max_attempts,
                        "metafield changed concurrently, re-reading"
                    );
                }
                Err(SyncError::StaleDigest) => {
                    return Err(SyncError::SyncConflict {
                        attempts: max_attempts,
                    });
                }
                Err(e) if e.is_transient() && attempt < max_attempts => {
                    tracing::warn!(
                        attempt,
                        max_attempts,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "metafield sync attempt failed, retrying: {e}"
                    );
                    tokio::time::sleep(delay).await;
                    delay = (delay * 2).min(self.policy.max_delay);
                }
                Err(e) => return Err(e),
            }
        }

        Err(SyncError::SyncConflict {
            attempts: max_attempts,
        })
    }

    async fn cycle(
        &self,
        installation_id: &str,
        credentials: &ShopCredentials,
        badge: &BadgeRecord,
        action: SyncAction,
    ) -> Result<(), SyncError> {
        let remote = self.client.fetch(credentials, installation_id).await?;
        let merged = blob::apply(blob::parse(remote.value.as_deref()), badge, action);
        let value = blob::serialize(merged);
        self.client
            .write(
                credentials,
                installation_id,
                &value,
                remote.compare_digest.as_deref(),
            )
            .await
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::indexing_slicing)]
mod tests {
    use secrecy::SecretString;
    use serde_json::Value;

    use super::*;
    use crate::domain::{BadgeFields, BadgeId};
    use crate::mirror::{InMemoryMetafieldClient, StaticCredentials};

    const OWNER: &str = "gid://shopify/AppInstallation/1";
    const SHOP: &str = "demo.myshopify.com";

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
        }
    }

    fn token() -> SecretString {
        SecretString::from("shpat_test".to_string())
    }

    fn creds() -> ShopCredentials {
        ShopCredentials::new(SHOP, token())
    }

    fn setup(max_attempts: u32) -> (Arc<InMemoryMetafieldClient>, MirrorSync) {
        let client = Arc::new(InMemoryMetafieldClient::new(OWNER));
        let sync = MirrorSync::new(
            Arc::clone(&client) as Arc<dyn crate::mirror::MetafieldClient>,
            Arc::new(StaticCredentials::new().with_shop(SHOP, token())),
        )
        .with_policy(fast_policy(max_attempts));
        (client, sync)
    }

    fn badge(name: &str) -> BadgeRecord {
        BadgeRecord::new(BadgeFields::with_name(name))
    }

    fn stored(client: &InMemoryMetafieldClient) -> serde_json::Map<String, Value> {
        let Some(raw) = client.value() else {
            panic!("metafield was never written");
        };
        let Ok(Value::Object(map)) = serde_json::from_str::<Value>(&raw) else {
            panic!("metafield is not a JSON object: {raw}");
        };
        map
    }

    #[tokio::test]
    async fn create_on_empty_metafield_writes_single_entry() {
        let (client, sync) = setup(3);
        let b = badge("Sale");
        let Ok(()) = sync.sync(OWNER, &creds(), &b, SyncAction::Create).await else {
            panic!("sync should succeed");
        };
        let map = stored(&client);
        assert_eq!(map.len(), 1);
        assert_eq!(map[&b.id.to_string()]["timerName"], "Sale");
    }

    #[tokio::test]
    async fn delete_keeps_other_entries() {
        let (client, sync) = setup(3);
        let keep = badge("Keep");
        let gone = badge("Gone");
        for b in [&keep, &gone] {
            let Ok(()) = sync.sync(OWNER, &creds(), b, SyncAction::Create).await else {
                panic!("create sync failed");
            };
        }
        let Ok(()) = sync.sync(OWNER, &creds(), &gone, SyncAction::Delete).await else {
            panic!("delete sync failed");
        };
        let map = stored(&client);
        assert_eq!(map.len(), 1);
        assert!(map.contains_key(&keep.id.to_string()));
    }

    #[tokio::test]
    async fn corrupt_metafield_is_replaced() {
        let (client, sync) = setup(3);
        client.set_raw_value("not json at all");
        let b = badge("Sale");
        let Ok(()) = sync.sync(OWNER, &creds(), &b, SyncAction::Create).await else {
            panic!("sync should heal a corrupt blob");
        };
        let map = stored(&client);
        assert_eq!(map.len(), 1);
        assert!(map.contains_key(&b.id.to_string()));
    }

    #[tokio::test]
    async fn concurrent_writer_is_not_lost() {
        let (client, sync) = setup(3);
        let foreign = BadgeId::new().to_string();
        client.interfere_after_next_fetch(format!("{{\"{foreign}\":{{\"timerName\":\"Other\"}}}}"));

        let b = badge("Sale");
        let Ok(()) = sync.sync(OWNER, &creds(), &b, SyncAction::Create).await else {
            panic!("sync should retry after a stale digest");
        };
        let map = stored(&client);
        assert_eq!(map.len(), 2);
        assert!(map.contains_key(&foreign));
        assert!(map.contains_key(&b.id.to_string()));
        assert_eq!(client.fetch_count(), 2);
    }

    #[tokio::test]
    async fn persistent_conflict_is_reported() {
        let (client, sync) = setup(2);
        client.interfere_after_next_fetch("{}");
        client.interfere_after_next_fetch("{}");

        let result = sync.sync(OWNER, &creds(), &badge("Sale"), SyncAction::Create).await;
        assert_eq!(result, Err(SyncError::SyncConflict { attempts: 2 }));
        assert_eq!(client.write_count(), 0);
    }

    #[tokio::test]
    async fn transient_failures_are_retried() {
        let (client, sync) = setup(3);
        client.fail_next_fetch(SyncError::SyncUnavailable("timeout".to_string()));
        client.fail_next_write(SyncError::SyncUnavailable("HTTP 503".to_string()));

        let Ok(()) = sync.sync(OWNER, &creds(), &badge("Sale"), SyncAction::Create).await else {
            panic!("sync should recover from transient failures");
        };
        assert_eq!(client.write_count(), 1);
    }

    #[tokio::test]
    async fn transient_failures_exhaust_budget() {
        let (client, sync) = setup(2);
        client.fail_next_fetch(SyncError::SyncUnavailable("a".to_string()));
        client.fail_next_fetch(SyncError::SyncUnavailable("b".to_string()));

        let result = sync.sync(OWNER, &creds(), &badge("Sale"), SyncAction::Create).await;
        assert_eq!(result, Err(SyncError::SyncUnavailable("b".to_string())));
    }

    #[tokio::test]
    async fn rejection_is_not_retried() {
        let (client, sync) = setup(5);
        client.fail_next_write(SyncError::SyncRejected("Value is invalid JSON".to_string()));

        let result = sync.sync(OWNER, &creds(), &badge("Sale"), SyncAction::Create).await;
        assert!(matches!(result, Err(SyncError::SyncRejected(_))));
        assert_eq!(client.fetch_count(), 1);
    }

    #[tokio::test]
    async fn missing_preconditions_fail_before_any_call() {
        let (client, sync) = setup(3);
        let b = badge("Sale");

        let no_owner = sync.sync("", &creds(), &b, SyncAction::Create).await;
        assert!(matches!(no_owner, Err(SyncError::PreconditionFailed(_))));

        let empty_token = ShopCredentials::new(SHOP, SecretString::from(String::new()));
        let no_token = sync.sync(OWNER, &empty_token, &b, SyncAction::Create).await;
        assert!(matches!(no_token, Err(SyncError::PreconditionFailed(_))));

        let mut nil = b.clone();
        nil.id = BadgeId::from_uuid(uuid::Uuid::nil());
        let no_id = sync.sync(OWNER, &creds(), &nil, SyncAction::Create).await;
        assert!(matches!(no_id, Err(SyncError::PreconditionFailed(_))));

        assert_eq!(client.fetch_count(), 0);
    }

    #[tokio::test]
    async fn scope_falls_back_to_default_shop_and_looks_up_installation() {
        let (client, sync) = setup(3);
        let sync = sync.with_default_shop(Some(SHOP.to_string()));
        let b = badge("Sale");

        let Ok(()) = sync
            .sync_for_scope(&SyncScope::default(), &b, SyncAction::Create)
            .await
        else {
            panic!("scope sync should succeed");
        };
        assert!(stored(&client).contains_key(&b.id.to_string()));
    }

    #[tokio::test]
    async fn unconfigured_or_foreign_shop_is_never_contacted() {
        let (client, sync) = setup(3);
        for shop in ["other.myshopify.com", "attacker.example.com", "demo.myshopify.com.evil.io"] {
            let scope = SyncScope {
                shop: Some(shop.to_string()),
            };
            let result = sync
                .sync_for_scope(&scope, &badge("Sale"), SyncAction::Create)
                .await;
            assert!(
                matches!(result, Err(SyncError::PreconditionFailed(_))),
                "{shop}: {result:?}"
            );
        }
        assert_eq!(client.fetch_count(), 0);
        assert!(sync.installation_ids.read().await.is_empty());
    }

    #[tokio::test]
    async fn slow_platform_is_cut_off_at_the_deadline() {
        let (client, sync) = setup(5);
        let sync = sync.with_deadline(Duration::from_millis(50));
        client.delay_fetches(Duration::from_secs(5));

        let scope = SyncScope {
            shop: Some(SHOP.to_string()),
        };
        let started = std::time::Instant::now();
        let result = sync
            .sync_for_scope(&scope, &badge("Sale"), SyncAction::Create)
            .await;
        assert!(matches!(result, Err(SyncError::SyncUnavailable(_))));
        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(client.write_count(), 0);
    }

    #[tokio::test]
    async fn scope_without_any_shop_is_a_precondition_failure() {
        let (_client, sync) = setup(3);
        let result = sync
            .sync_for_scope(&SyncScope::default(), &badge("Sale"), SyncAction::Create)
            .await;
        assert!(matches!(result, Err(SyncError::PreconditionFailed(_))));
    }
}

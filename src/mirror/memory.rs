//! In-process [`MetafieldClient`] with `compareDigest` semantics.
//!
//! A test double: the server binary never constructs it. Failures, slow
//! responses and concurrent writers can be injected to exercise the retry
//! and deadline paths of the sync.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::SyncError;
use super::client::{MetafieldClient, RemoteBlob, ShopCredentials};

#[derive(Debug, Default)]
struct Inner {
    value: Option<String>,
    version: u64,
    writes: u64,
    fetches: u64,
    installation_id: String,
    fetch_failures: VecDeque<SyncError>,
    write_failures: VecDeque<SyncError>,
    interference: VecDeque<String>,
    fetch_delay: Duration,
}

impl Inner {
    fn digest(&self) -> Option<String> {
        self.value.as_ref().map(|_| format!("v{}", self.version))
    }

    fn store(&mut self, value: String) {
        self.value = Some(value);
        self.version += 1;
    }
}

/// Metafield held in memory, one blob per client.
#[derive(Debug)]
pub struct InMemoryMetafieldClient {
    inner: Mutex<Inner>,
}

impl Default for InMemoryMetafieldClient {
    fn default() -> Self {
        Self::new("gid://shopify/AppInstallation/1")
    }
}

impl InMemoryMetafieldClient {
    /// Creates an empty metafield owned by `installation_id`.
    #[must_use]
    pub fn new(installation_id: impl Into<String>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                installation_id: installation_id.into(),
                ..Inner::default()
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A poisoned lock only means a test panicked mid-call.
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Current raw value.
    #[must_use]
    pub fn value(&self) -> Option<String> {
        self.lock().value.clone()
    }

    /// Overwrites the stored value as an out-of-band writer would.
    pub fn set_raw_value(&self, value: impl Into<String>) {
        self.lock().store(value.into());
    }

    /// Number of successful writes.
    #[must_use]
    pub fn write_count(&self) -> u64 {
        self.lock().writes
    }

    /// Number of fetch calls, successful or not.
    #[must_use]
    pub fn fetch_count(&self) -> u64 {
        self.lock().fetches
    }

    /// Makes the next fetch fail with `error`. Calls queue up.
    pub fn fail_next_fetch(&self, error: SyncError) {
        self.lock().fetch_failures.push_back(error);
    }

    /// Makes the next write fail with `error`. Calls queue up.
    pub fn fail_next_write(&self, error: SyncError) {
        self.lock().write_failures.push_back(error);
    }

    /// Makes every later fetch wait `delay` before answering.
    pub fn delay_fetches(&self, delay: Duration) {
        self.lock().fetch_delay = delay;
    }

    /// Right after the next fetch, replaces the stored value with `value`,
    /// invalidating the digest that fetch returned.
    pub fn interfere_after_next_fetch(&self, value: impl Into<String>) {
        self.lock().interference.push_back(value.into());
    }

    fn check_owner(inner: &Inner, installation_id: &str) -> Result<(), SyncError> {
        if inner.installation_id == installation_id {
            Ok(())
        } else {
            Err(SyncError::SyncRejected(format!(
                "Owner does not exist: {installation_id}"
            )))
        }
    }
}

#[async_trait]
impl MetafieldClient for InMemoryMetafieldClient {
    async fn current_installation_id(
        &self,
        _credentials: &ShopCredentials,
    ) -> Result<String, SyncError> {
        Ok(self.lock().installation_id.clone())
    }

    async fn fetch(
        &self,
        _credentials: &ShopCredentials,
        installation_id: &str,
    ) -> Result<RemoteBlob, SyncError> {
        let delay = {
            let mut inner = self.lock();
            inner.fetches += 1;
            inner.fetch_delay
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let mut inner = self.lock();
        if let Some(err) = inner.fetch_failures.pop_front() {
            return Err(err);
        }
        Self::check_owner(&inner, installation_id)?;
        let blob = RemoteBlob {
            value: inner.value.clone(),
            compare_digest: inner.digest(),
        };
        if let Some(value) = inner.interference.pop_front() {
            inner.store(value);
        }
        Ok(blob)
    }

    async fn write(
        &self,
        _credentials: &ShopCredentials,
        installation_id: &str,
        value: &str,
        compare_digest: Option<&str>,
    ) -> Result<(), SyncError> {
        let mut inner = self.lock();
        if let Some(err) = inner.write_failures.pop_front() {
            return Err(err);
        }
        Self::check_owner(&inner, installation_id)?;
        if inner.digest().as_deref() != compare_digest {
            return Err(SyncError::StaleDigest);
        }
        inner.store(value.to_string());
        inner.writes += 1;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    const OWNER: &str = "gid://shopify/AppInstallation/1";

    fn creds() -> ShopCredentials {
        ShopCredentials::new("demo.myshopify.com", SecretString::from("t".to_string()))
    }

    #[tokio::test]
    async fn write_requires_current_digest() {
        let client = InMemoryMetafieldClient::default();
        let c = creds();

        let Ok(first) = client.fetch(&c, OWNER).await else {
            panic!("fetch failed");
        };
        assert_eq!(first, RemoteBlob::default());
        assert!(client.write(&c, OWNER, "{}", None).await.is_ok());

        // A create-only write against an existing value is stale.
        assert_eq!(
            client.write(&c, OWNER, "{}", None).await,
            Err(SyncError::StaleDigest)
        );

        let Ok(second) = client.fetch(&c, OWNER).await else {
            panic!("fetch failed");
        };
        assert!(
            client
                .write(&c, OWNER, "{\"a\":1}", second.compare_digest.as_deref())
                .await
                .is_ok()
        );
        assert_eq!(client.value().as_deref(), Some("{\"a\":1}"));
        assert_eq!(client.write_count(), 2);
    }

    #[tokio::test]
    async fn interference_invalidates_fetched_digest() {
        let client = InMemoryMetafieldClient::default();
        let c = creds();
        client.set_raw_value("{}");
        client.interfere_after_next_fetch("{\"other\":{}}");

        let Ok(blob) = client.fetch(&c, OWNER).await else {
            panic!("fetch failed");
        };
        assert_eq!(
            client
                .write(&c, OWNER, "{}", blob.compare_digest.as_deref())
                .await,
            Err(SyncError::StaleDigest)
        );
        assert_eq!(client.value().as_deref(), Some("{\"other\":{}}"));
    }

    #[tokio::test]
    async fn injected_failures_are_consumed_in_order() {
        let client = InMemoryMetafieldClient::default();
        let c = creds();
        client.fail_next_fetch(SyncError::SyncUnavailable("boom".to_string()));

        assert!(matches!(
            client.fetch(&c, OWNER).await,
            Err(SyncError::SyncUnavailable(_))
        ));
        assert!(client.fetch(&c, OWNER).await.is_ok());
        assert_eq!(client.fetch_count(), 2);
    }

    #[tokio::test]
    async fn unknown_owner_is_rejected() {
        let client = InMemoryMetafieldClient::default();
        assert!(matches!(
            client.fetch(&creds(), "gid://shopify/AppInstallation/999").await,
            Err(SyncError::SyncRejected(_))
        ));
    }
}

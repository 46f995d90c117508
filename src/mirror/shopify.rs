//! Shopify Admin GraphQL implementation of [`MetafieldClient`].
//!
//! The mirror lives in an `appInstallation` metafield of type `json`.
//! Reads return the value together with its `compareDigest`; writes go
//! through `metafieldsSet` carrying that digest so a concurrent writer is
//! detected instead of silently overwritten.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::instrument;

use super::client::{MetafieldClient, RemoteBlob, ShopCredentials};
use super::SyncError;

const FETCH_METAFIELD_QUERY: &str = r"
query AppInstallationMetafield($namespace: String!, $key: String!, $ownerId: ID!) {
  appInstallation(id: $ownerId) {
    badgeData: metafield(namespace: $namespace, key: $key) {
      value
      compareDigest
    }
  }
}
";

const SET_METAFIELD_MUTATION: &str = r"
mutation SetBadgeMirror($metafieldsSetInput: [MetafieldsSetInput!]!) {
  metafieldsSet(metafields: $metafieldsSetInput) {
    metafields {
      id
      namespace
      key
    }
    userErrors {
      field
      message
      code
    }
  }
}
";

const CURRENT_INSTALLATION_QUERY: &str = r"
query CurrentAppInstallation {
  currentAppInstallation {
    id
  }
}
";

/// User error code returned by `metafieldsSet` on a digest mismatch.
const STALE_OBJECT: &str = "STALE_OBJECT";

/// Namespace and key of the mirror metafield.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetafieldLocation {
    /// Metafield namespace.
    pub namespace: String,
    /// Metafield key.
    pub key: String,
}

impl Default for MetafieldLocation {
    fn default() -> Self {
        Self {
            namespace: "badge_data".to_string(),
            key: "badge_data_key".to_string(),
        }
    }
}

/// Shopify Admin API client scoped to the mirror metafield.
#[derive(Debug, Clone)]
pub struct ShopifyMetafieldClient {
    http: reqwest::Client,
    api_version: String,
    location: MetafieldLocation,
}

#[derive(Debug, Deserialize)]
struct GraphQLResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQLErrorResponse>,
}

#[derive(Debug, Deserialize)]
struct GraphQLErrorResponse {
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FetchData {
    app_installation: Option<AppInstallationNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppInstallationNode {
    badge_data: Option<MetafieldNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MetafieldNode {
    value: Option<String>,
    compare_digest: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CurrentInstallationData {
    current_app_installation: IdNode,
}

#[derive(Debug, Deserialize)]
struct IdNode {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SetData {
    metafields_set: Option<MetafieldsSetPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MetafieldsSetPayload {
    #[serde(default)]
    user_errors: Vec<UserError>,
}

#[derive(Debug, Deserialize)]
struct UserError {
    message: String,
    code: Option<String>,
}

impl ShopifyMetafieldClient {
    /// Creates a client whose every request is bounded by `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::PreconditionFailed`] if the HTTP client cannot
    /// be built.
    pub fn new(
        api_version: impl Into<String>,
        location: MetafieldLocation,
        timeout: Duration,
    ) -> Result<Self, SyncError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SyncError::PreconditionFailed(format!("http client: {e}")))?;
        Ok(Self {
            http,
            api_version: api_version.into(),
            location,
        })
    }

    fn endpoint(&self, shop: &str) -> String {
        format!(
            "https://{shop}/admin/api/{}/graphql.json",
            self.api_version
        )
    }

    /// Executes a GraphQL document and returns its `data`.
    async fn execute<T: DeserializeOwned>(
        &self,
        credentials: &ShopCredentials,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<T, SyncError> {
        let response = self
            .http
            .post(self.endpoint(&credentials.shop))
            .header(
                "X-Shopify-Access-Token",
                credentials.access_token.expose_secret(),
            )
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await
            .map_err(|e| SyncError::SyncUnavailable(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            return Err(SyncError::SyncUnavailable(format!("HTTP {status}")));
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(SyncError::SyncRejected(format!("HTTP {status}: {text}")));
        }

        let body: GraphQLResponse<T> = response
            .json()
            .await
            .map_err(|e| SyncError::SyncUnavailable(format!("invalid response body: {e}")))?;

        if !body.errors.is_empty() {
            let messages: Vec<String> = body.errors.into_iter().map(|e| e.message).collect();
            return Err(SyncError::SyncRejected(messages.join(", ")));
        }

        body.data
            .ok_or_else(|| SyncError::SyncUnavailable("no data in response".to_string()))
    }
}

/// Builds the `metafieldsSet` variables for one whole-blob write.
fn set_variables(
    location: &MetafieldLocation,
    installation_id: &str,
    value: &str,
    compare_digest: Option<&str>,
) -> serde_json::Value {
    json!({
        "metafieldsSetInput": [{
            "namespace": location.namespace,
            "key": location.key,
            "type": "json",
            "value": value,
            "ownerId": installation_id,
            "compareDigest": compare_digest,
        }]
    })
}

/// Interprets the `metafieldsSet` payload.
fn check_set_payload(payload: Option<MetafieldsSetPayload>) -> Result<(), SyncError> {
    let Some(payload) = payload else {
        return Err(SyncError::SyncUnavailable(
            "metafieldsSet returned no payload".to_string(),
        ));
    };
    if payload.user_errors.is_empty() {
        return Ok(());
    }
    if payload
        .user_errors
        .iter()
        .any(|e| e.code.as_deref() == Some(STALE_OBJECT))
    {
        return Err(SyncError::StaleDigest);
    }
    let messages: Vec<String> = payload.user_errors.into_iter().map(|e| e.message).collect();
    Err(SyncError::SyncRejected(messages.join(", ")))
}

#[async_trait]
impl MetafieldClient for ShopifyMetafieldClient {
    #[instrument(skip(self, credentials), fields(shop = %credentials.shop))]
    async fn current_installation_id(
        &self,
        credentials: &ShopCredentials,
    ) -> Result<String, SyncError> {
        let data: CurrentInstallationData = self
            .execute(credentials, CURRENT_INSTALLATION_QUERY, json!({}))
            .await?;
        Ok(data.current_app_installation.id)
    }

    #[instrument(skip(self, credentials), fields(shop = %credentials.shop))]
    async fn fetch(
        &self,
        credentials: &ShopCredentials,
        installation_id: &str,
    ) -> Result<RemoteBlob, SyncError> {
        let variables = json!({
            "namespace": self.location.namespace,
            "key": self.location.key,
            "ownerId": installation_id,
        });
        let data: FetchData = self
            .execute(credentials, FETCH_METAFIELD_QUERY, variables)
            .await?;

        let metafield = data.app_installation.and_then(|i| i.badge_data);
        Ok(metafield
            .map(|m| RemoteBlob {
                value: m.value,
                compare_digest: m.compare_digest,
            })
            .unwrap_or_default())
    }

    #[instrument(skip(self, credentials, value), fields(shop = %credentials.shop, bytes = value.len()))]
    async fn write(
        &self,
        credentials: &ShopCredentials,
        installation_id: &str,
        value: &str,
        compare_digest: Option<&str>,
    ) -> Result<(), SyncError> {
        let variables = set_variables(&self.location, installation_id, value, compare_digest);
        let data: SetData = self
            .execute(credentials, SET_METAFIELD_MUTATION, variables)
            .await?;
        check_set_payload(data.metafields_set)?;
        tracing::debug!("metafield updated");
        Ok(())
    }
}

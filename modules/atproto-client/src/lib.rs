pub mod error;
pub mod types;

mod cache;

pub use error::{AtprotoError, Result};
pub use types::{
    DidDocument, DidService, FeedAuthor, FeedItem, FeedPage, FeedPost, PlcLogEntry, PlcOperation,
    Profile, RecordEnvelope, RecordPage, RepoDescription, ResolveHandleResponse,
};

use serde::de::DeserializeOwned;
use serde_json::Value;

use cache::RequestCache;

pub const DEFAULT_APPVIEW_URL: &str = "https://public.api.bsky.app";
pub const DEFAULT_PLC_URL: &str = "https://plc.directory";

/// Service type of the personal data server entry in a DID document.
const PDS_SERVICE_TYPE: &str = "AtprotoPersonalDataServer";

/// Page size requested from cursor-paginated endpoints (server maximum).
const PAGE_LIMIT: u32 = 100;

/// Read-only XRPC client. Construct one per pipeline run: the request cache
/// lives and dies with the client, so a fresh instance sees fresh data.
pub struct AtprotoClient {
    client: reqwest::Client,
    appview_url: String,
    plc_url: String,
    cache: RequestCache,
}

impl AtprotoClient {
    pub fn new(appview_url: &str, plc_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            appview_url: appview_url.trim_end_matches('/').to_string(),
            plc_url: plc_url.trim_end_matches('/').to_string(),
            cache: RequestCache::default(),
        }
    }

    /// Resolve a handle to its DID via `com.atproto.identity.resolveHandle`.
    pub async fn resolve_handle(&self, handle: &str) -> Result<String> {
        let url = format!(
            "{}/xrpc/com.atproto.identity.resolveHandle?handle={}",
            self.appview_url, handle
        );
        let resp: ResolveHandleResponse = self.get_json(&url).await.map_err(|err| match err {
            AtprotoError::Api { status: 400, .. } => {
                AtprotoError::HandleNotFound(handle.to_string())
            }
            other => other,
        })?;
        if resp.did.is_empty() {
            return Err(AtprotoError::HandleNotFound(handle.to_string()));
        }
        Ok(resp.did)
    }

    /// Fetch the DID document for a `did:plc` or `did:web` identifier.
    pub async fn fetch_did_document(&self, did: &str) -> Result<DidDocument> {
        let url = if did.starts_with("did:plc:") {
            format!("{}/{}", self.plc_url, did)
        } else if let Some(host) = did.strip_prefix("did:web:") {
            // Only bare-domain did:web is supported (no path or port forms).
            if host.is_empty() || host.contains(':') || host.contains('/') {
                return Err(AtprotoError::UnsupportedDid(did.to_string()));
            }
            url::Url::parse(&format!("https://{host}/.well-known/did.json"))
                .map_err(|_| AtprotoError::UnsupportedDid(did.to_string()))?
                .to_string()
        } else {
            return Err(AtprotoError::UnsupportedDid(did.to_string()));
        };
        self.get_json(&url).await
    }

    /// Extract the personal-data-server endpoint from a DID document.
    pub fn pds_endpoint(document: &DidDocument) -> Result<String> {
        document
            .service
            .iter()
            .find(|s| s.service_type == PDS_SERVICE_TYPE || s.id.ends_with("#atproto_pds"))
            .map(|s| s.service_endpoint.trim_end_matches('/').to_string())
            .ok_or_else(|| AtprotoError::MissingPds(document.id.clone()))
    }

    /// List the collections a repo declares, via `com.atproto.repo.describeRepo`.
    pub async fn describe_repo(&self, pds_url: &str, did: &str) -> Result<RepoDescription> {
        let url = format!(
            "{}/xrpc/com.atproto.repo.describeRepo?repo={}",
            pds_url.trim_end_matches('/'),
            did
        );
        self.get_json(&url).await
    }

    /// Fetch one page of records from a collection.
    pub async fn list_records_page(
        &self,
        pds_url: &str,
        did: &str,
        collection: &str,
        cursor: Option<&str>,
    ) -> Result<RecordPage> {
        let mut url = format!(
            "{}/xrpc/com.atproto.repo.listRecords?repo={}&collection={}&limit={}",
            pds_url.trim_end_matches('/'),
            did,
            collection,
            PAGE_LIMIT
        );
        if let Some(cursor) = cursor {
            url.push_str(&format!("&cursor={cursor}"));
        }
        self.get_json(&url).await
    }

    /// Fetch one page of the identity's public activity feed.
    pub async fn author_feed_page(&self, did: &str, cursor: Option<&str>) -> Result<FeedPage> {
        let mut url = format!(
            "{}/xrpc/app.bsky.feed.getAuthorFeed?actor={}&limit={}",
            self.appview_url, did, PAGE_LIMIT
        );
        if let Some(cursor) = cursor {
            url.push_str(&format!("&cursor={cursor}"));
        }
        self.get_json(&url).await
    }

    /// Fetch the identity's profile view from the appview.
    pub async fn get_profile(&self, did: &str) -> Result<Profile> {
        let url = format!(
            "{}/xrpc/app.bsky.actor.getProfile?actor={}",
            self.appview_url, did
        );
        self.get_json(&url).await
    }

    /// Fetch the full PLC operation log for a `did:plc` identity. Returns an
    /// empty log for other DID methods, which have no public operation log.
    pub async fn plc_audit_log(&self, did: &str) -> Result<Vec<PlcLogEntry>> {
        if !did.starts_with("did:plc:") {
            return Ok(Vec::new());
        }
        let url = format!("{}/{}/log/audit", self.plc_url, did);
        self.get_json(&url).await
    }

    /// Cached GET returning a deserialized JSON body. At most one network
    /// round trip per distinct URL per client instance.
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        if let Some(hit) = self.cache.get(url) {
            tracing::debug!(url, "Request cache hit");
            return Ok(serde_json::from_value(hit)?);
        }

        let resp = self.client.get(url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AtprotoError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body: Value = resp.json().await?;
        self.cache.insert(url, body.clone());
        Ok(serde_json::from_value(body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_with_services(services: Vec<DidService>) -> DidDocument {
        DidDocument {
            id: "did:plc:abc123".to_string(),
            also_known_as: vec!["at://alice.bsky.social".to_string()],
            service: services,
        }
    }

    #[test]
    fn pds_endpoint_by_service_type() {
        let doc = doc_with_services(vec![DidService {
            id: "#atproto_pds".to_string(),
            service_type: "AtprotoPersonalDataServer".to_string(),
            service_endpoint: "https://morel.us-east.host.bsky.network/".to_string(),
        }]);
        assert_eq!(
            AtprotoClient::pds_endpoint(&doc).unwrap(),
            "https://morel.us-east.host.bsky.network"
        );
    }

    #[test]
    fn pds_endpoint_missing_is_an_error() {
        let doc = doc_with_services(vec![DidService {
            id: "#atproto_labeler".to_string(),
            service_type: "AtprotoLabeler".to_string(),
            service_endpoint: "https://labeler.example".to_string(),
        }]);
        assert!(matches!(
            AtprotoClient::pds_endpoint(&doc),
            Err(AtprotoError::MissingPds(_))
        ));
    }

    #[test]
    fn cache_returns_same_body_for_same_url() {
        let cache = cache::RequestCache::default();
        cache.insert("https://example.test/a", serde_json::json!({"n": 1}));
        cache.insert("https://example.test/a", serde_json::json!({"n": 1}));
        assert_eq!(cache.len(), 1);
        assert_eq!(
            cache.get("https://example.test/a"),
            Some(serde_json::json!({"n": 1}))
        );
        assert_eq!(cache.get("https://example.test/b"), None);
    }

    #[test]
    fn plc_log_entry_parses_audit_shape() {
        let raw = serde_json::json!({
            "did": "did:plc:abc123",
            "cid": "bafyexample",
            "nullified": false,
            "createdAt": "2023-04-01T12:00:00.000Z",
            "operation": {
                "type": "plc_operation",
                "rotationKeys": ["did:key:zQ3one", "did:key:zQ3two"],
                "alsoKnownAs": ["at://alice.bsky.social"]
            }
        });
        let entry: PlcLogEntry = serde_json::from_value(raw).unwrap();
        assert_eq!(entry.operation.rotation_keys.len(), 2);
        assert_eq!(entry.operation.also_known_as.len(), 1);
    }

    #[test]
    fn legacy_create_operation_defaults_to_empty() {
        let raw = serde_json::json!({
            "did": "did:plc:abc123",
            "cid": "bafylegacy",
            "createdAt": "2022-12-01T00:00:00.000Z",
            "operation": { "type": "create", "handle": "alice.bsky.social" }
        });
        let entry: PlcLogEntry = serde_json::from_value(raw).unwrap();
        assert!(entry.operation.rotation_keys.is_empty());
        assert!(entry.operation.also_known_as.is_empty());
    }
}

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

// --- Identity resolution ---

#[derive(Debug, Deserialize)]
pub struct ResolveHandleResponse {
    pub did: String,
}

/// A DID document as served by the PLC directory or a did:web host.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DidDocument {
    pub id: String,
    #[serde(default)]
    pub also_known_as: Vec<String>,
    #[serde(default)]
    pub service: Vec<DidService>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DidService {
    pub id: String,
    #[serde(rename = "type")]
    pub service_type: String,
    pub service_endpoint: String,
}

// --- Repo listing ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoDescription {
    pub did: String,
    #[serde(default)]
    pub collections: Vec<String>,
}

/// One page of `com.atproto.repo.listRecords`. The `value` payload is
/// collection-specific and left as raw JSON.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordPage {
    #[serde(default)]
    pub records: Vec<RecordEnvelope>,
    pub cursor: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecordEnvelope {
    pub uri: String,
    pub cid: String,
    pub value: Value,
}

// --- Author feed ---

#[derive(Debug, Deserialize)]
pub struct FeedPage {
    #[serde(default)]
    pub feed: Vec<FeedItem>,
    pub cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FeedItem {
    pub post: FeedPost,
    /// Present when the item is in the feed because of a repost.
    pub reason: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedPost {
    pub uri: String,
    pub author: FeedAuthor,
    #[serde(default)]
    pub like_count: u64,
    #[serde(default)]
    pub repost_count: u64,
    #[serde(default)]
    pub reply_count: u64,
    #[serde(default)]
    pub quote_count: u64,
}

#[derive(Debug, Deserialize)]
pub struct FeedAuthor {
    pub did: String,
}

// --- Profile ---

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(default)]
    pub did: String,
    #[serde(default)]
    pub handle: String,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub avatar: Option<String>,
    pub banner: Option<String>,
    #[serde(default)]
    pub followers_count: u64,
    #[serde(default)]
    pub follows_count: u64,
    #[serde(default)]
    pub posts_count: u64,
    pub created_at: Option<DateTime<Utc>>,
}

// --- PLC operation log ---

/// One entry of the PLC audit log. Source order is not guaranteed; callers
/// sort by `created_at` before replaying.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlcLogEntry {
    pub did: String,
    pub cid: String,
    #[serde(default)]
    pub nullified: bool,
    pub created_at: DateTime<Utc>,
    pub operation: PlcOperation,
}

/// The rotation/alias snapshot carried by a PLC operation. Legacy `create`
/// operations omit both arrays.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlcOperation {
    #[serde(default)]
    pub rotation_keys: Vec<String>,
    #[serde(default)]
    pub also_known_as: Vec<String>,
}

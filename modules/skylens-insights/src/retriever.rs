use async_trait::async_trait;
use atproto_client::{AtprotoClient, RecordEnvelope, RecordPage, Result as ClientResult};
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::warn;

use crate::progress::ProgressReporter;

/// A cursor-paginated source of record pages for one collection.
#[async_trait]
pub(crate) trait RecordPageSource: Send + Sync {
    /// Collection name, used for logging and timestamp dispatch.
    fn collection(&self) -> &str;

    async fn fetch_page(&self, cursor: Option<&str>) -> ClientResult<RecordPage>;
}

/// `com.atproto.repo.listRecords` as a page source.
pub(crate) struct ListRecordsSource<'a> {
    pub client: &'a AtprotoClient,
    pub pds_url: &'a str,
    pub did: &'a str,
    pub collection: &'a str,
}

#[async_trait]
impl RecordPageSource for ListRecordsSource<'_> {
    fn collection(&self) -> &str {
        self.collection
    }

    async fn fetch_page(&self, cursor: Option<&str>) -> ClientResult<RecordPage> {
        self.client
            .list_records_page(self.pds_url, self.did, self.collection, cursor)
            .await
    }
}

/// Content-timestamp extraction, keyed by collection name. First-party and
/// well-behaved third-party lexicons carry a top-level `createdAt`; the
/// profile record is an undated singleton. No recursive field guessing.
pub(crate) fn record_timestamp(collection: &str, value: &Value) -> Option<DateTime<Utc>> {
    let field = match collection {
        "app.bsky.actor.profile" => return None,
        _ => "createdAt",
    };
    value
        .get(field)?
        .as_str()?
        .parse::<DateTime<Utc>>()
        .ok()
}

/// Follow the cursor until exhaustion, or until the cutoff policy stops us.
///
/// With a cutoff, items dated at or after it are kept and undated items are
/// included by default. Retrieval stops after the first page that yields any
/// item older than the cutoff, or fewer qualifying items than it returned.
/// This assumes approximately descending order from the server; it is a
/// cost/completeness trade-off and can over- or under-count near the
/// boundary when that assumption does not hold.
///
/// A failed page request truncates the result to what was accumulated so
/// far; callers must treat the sequence as potentially incomplete.
pub(crate) async fn collect_records(
    source: &dyn RecordPageSource,
    cutoff: Option<DateTime<Utc>>,
    progress: &ProgressReporter,
) -> Vec<RecordEnvelope> {
    let mut records: Vec<RecordEnvelope> = Vec::new();
    let mut cursor: Option<String> = None;

    loop {
        let page = match source.fetch_page(cursor.as_deref()).await {
            Ok(page) => page,
            Err(err) => {
                warn!(
                    collection = source.collection(),
                    %err,
                    accumulated = records.len(),
                    "Page request failed, returning partial result"
                );
                break;
            }
        };
        progress.increment();

        let returned = page.records.len();
        let mut kept_in_page = 0usize;
        let mut saw_older = false;

        for record in page.records {
            match cutoff {
                Some(cut) => match record_timestamp(source.collection(), &record.value) {
                    Some(ts) if ts < cut => saw_older = true,
                    _ => {
                        records.push(record);
                        kept_in_page += 1;
                    }
                },
                None => {
                    records.push(record);
                    kept_in_page += 1;
                }
            }
        }

        if cutoff.is_some() && (saw_older || kept_in_page < returned) {
            break;
        }
        match page.cursor {
            Some(next) if !next.is_empty() => cursor = Some(next),
            _ => break,
        }
    }

    records
}

use std::collections::BTreeMap;

use atproto_client::AtprotoClient;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::info;

use skylens_common::{
    AggregateStats, CollectionCount, Identity, TimeWindow, BSKY_COLLECTION_PREFIX,
    POST_COLLECTION, REPOST_COLLECTION,
};

use crate::progress::ProgressReporter;
use crate::retriever::{collect_records, ListRecordsSource};

/// Everything one window traversal yields: the rolled-up counts plus the raw
/// post and repost payloads, retained for the post classifier.
pub(crate) struct WindowAggregation {
    pub aggregate: AggregateStats,
    pub post_records: Vec<Value>,
    pub repost_records: Vec<Value>,
}

fn rate(count: u64, period_days: f64) -> f64 {
    if period_days > 0.0 {
        count as f64 / period_days
    } else {
        0.0
    }
}

/// Roll per-collection counts up into window totals, partitioned by the
/// first-party namespace prefix.
fn build_aggregate(counts: Vec<(String, u64)>, period_days: f64) -> AggregateStats {
    let mut per_collection: BTreeMap<String, CollectionCount> = BTreeMap::new();
    let mut total: u64 = 0;
    let mut bsky: u64 = 0;

    for (collection, count) in counts {
        total += count;
        if collection.starts_with(BSKY_COLLECTION_PREFIX) {
            bsky += count;
        }
        per_collection.insert(
            collection,
            CollectionCount {
                count,
                per_day: rate(count, period_days),
            },
        );
    }

    let non_bsky = total - bsky;
    AggregateStats {
        total_records: total,
        total_bsky_records: bsky,
        total_non_bsky_records: non_bsky,
        records_per_day: rate(total, period_days),
        bsky_records_per_day: rate(bsky, period_days),
        non_bsky_records_per_day: rate(non_bsky, period_days),
        per_collection,
    }
}

/// Traverse every declared collection once with this window's cutoff.
/// Each window is an independent re-traversal; the request cache absorbs
/// the duplicate page fetches where traversals overlap.
pub(crate) async fn aggregate_window(
    client: &AtprotoClient,
    identity: &Identity,
    collections: &[String],
    window: TimeWindow,
    now: DateTime<Utc>,
    period_days: f64,
    progress: &ProgressReporter,
) -> WindowAggregation {
    let cutoff = window.cutoff_time(now);
    let mut counts: Vec<(String, u64)> = Vec::with_capacity(collections.len());
    let mut post_records = Vec::new();
    let mut repost_records = Vec::new();

    for collection in collections {
        let source = ListRecordsSource {
            client,
            pds_url: &identity.pds_endpoint,
            did: &identity.did,
            collection,
        };
        let records = collect_records(&source, cutoff, progress).await;
        counts.push((collection.clone(), records.len() as u64));

        match collection.as_str() {
            POST_COLLECTION => post_records.extend(records.into_iter().map(|r| r.value)),
            REPOST_COLLECTION => repost_records.extend(records.into_iter().map(|r| r.value)),
            _ => {}
        }
    }

    let aggregate = build_aggregate(counts, period_days);
    info!(
        did = %identity.did,
        window = %window,
        total_records = aggregate.total_records,
        collections = collections.len(),
        "Window aggregation complete"
    );

    WindowAggregation {
        aggregate,
        post_records,
        repost_records,
    }
}

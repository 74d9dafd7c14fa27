use std::collections::BTreeSet;

use atproto_client::{AtprotoClient, PlcLogEntry};
use chrono::{DateTime, Utc};
use tracing::warn;

use skylens_common::{IdentityLogSummary, DEFAULT_HANDLE_SUFFIX};

pub(crate) struct IdentityLogAnalysis {
    pub summary: IdentityLogSummary,
    /// Timestamp of the earliest operation; a fallback for account creation
    /// when the profile omits it.
    pub first_operation_at: Option<DateTime<Utc>>,
}

/// Replay the identity's full operation log. The current security posture
/// (rotation keys, active aliases) comes from the latest operation only;
/// the historical alias set is the union across every operation, so aliases
/// dropped along the way are still remembered.
pub(crate) async fn analyze_identity_log(client: &AtprotoClient, did: &str) -> IdentityLogAnalysis {
    let log = match client.plc_audit_log(did).await {
        Ok(log) => log,
        Err(err) => {
            warn!(did, %err, "Identity log fetch failed, reporting empty summary");
            Vec::new()
        }
    };
    IdentityLogAnalysis::from_log(log)
}

impl IdentityLogAnalysis {
    fn from_log(mut log: Vec<PlcLogEntry>) -> Self {
        // Source order is not guaranteed.
        log.sort_by_key(|entry| entry.created_at);

        let mut all_aliases: BTreeSet<String> = BTreeSet::new();
        for entry in &log {
            for aka in &entry.operation.also_known_as {
                all_aliases.insert(strip_aka_scheme(aka).to_string());
            }
        }

        let (rotation_key_count, active_alias_count) = log
            .last()
            .map(|entry| {
                (
                    entry.operation.rotation_keys.len(),
                    entry.operation.also_known_as.len(),
                )
            })
            .unwrap_or((0, 0));

        let bsky_alias_count = all_aliases
            .iter()
            .filter(|alias| alias.contains(DEFAULT_HANDLE_SUFFIX))
            .count();
        let custom_alias_count = all_aliases.len() - bsky_alias_count;

        Self {
            first_operation_at: log.first().map(|entry| entry.created_at),
            summary: IdentityLogSummary {
                rotation_key_count,
                active_alias_count,
                all_aliases,
                bsky_alias_count,
                custom_alias_count,
            },
        }
    }
}

fn strip_aka_scheme(aka: &str) -> &str {
    aka.strip_prefix("at://").unwrap_or(aka)
}

use atproto_client::AtprotoClient;
use tracing::{info, warn};

use skylens_common::EngagementStats;

use crate::progress::ProgressReporter;

/// Feed-item reason marking a repost of someone else's post.
const REASON_REPOST: &str = "app.bsky.feed.defs#reasonRepost";

/// Walk the identity's public activity feed end to end and sum the
/// engagement recorded against their own items. Reposted items are skipped:
/// their counters belong to the original author.
///
/// A failed page truncates the walk and keeps whatever was summed so far.
pub(crate) async fn collect_engagement(
    client: &AtprotoClient,
    did: &str,
    progress: &ProgressReporter,
) -> EngagementStats {
    let mut stats = EngagementStats::default();
    let mut cursor: Option<String> = None;

    loop {
        let page = match client.author_feed_page(did, cursor.as_deref()).await {
            Ok(page) => page,
            Err(err) => {
                warn!(did, %err, "Author feed page failed, keeping partial engagement totals");
                break;
            }
        };
        progress.increment();

        for item in page.feed {
            let is_repost = item
                .reason
                .as_ref()
                .and_then(|r| r.get("$type"))
                .and_then(|t| t.as_str())
                == Some(REASON_REPOST);
            if is_repost || item.post.author.did != did {
                continue;
            }
            stats.likes_received += item.post.like_count;
            stats.reposts_received += item.post.repost_count;
            stats.quotes_received += item.post.quote_count;
            stats.replies_received += item.post.reply_count;
        }

        match page.cursor {
            Some(next) if !next.is_empty() => cursor = Some(next),
            _ => break,
        }
    }

    info!(
        did,
        likes = stats.likes_received,
        reposts = stats.reposts_received,
        "Engagement walk complete"
    );
    stats
}

pub mod progress;

mod aggregate;
mod engagement;
mod identity;
mod identity_log;
mod labels;
mod narrative;
mod posts;
mod report;
mod retriever;

pub use progress::ProgressReporter;

use atproto_client::AtprotoClient;
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use skylens_common::{
    network_genesis, ClassificationLabels, Config, Identity, ProfileSummary, Report, ReportSet,
    SkylensError, TimeWindow, WindowStats,
};

use aggregate::aggregate_window;
use narrative::NarrativeInputs;

/// Resolve a handle and reduce everything it has published into the final
/// report set. `on_progress` observes a monotonically non-decreasing count
/// of completed page fetches and is finalized exactly once at the end.
///
/// A resolution failure aborts the run; every later failure degrades the
/// affected aggregate instead, so the caller always gets either a complete
/// report set or a single structured error.
pub async fn produce_report(
    config: &Config,
    handle: &str,
    on_progress: impl Fn(u64) + Send + Sync + 'static,
) -> Result<ReportSet, SkylensError> {
    // Fresh client per run: the request cache is scoped to its lifetime.
    let client = AtprotoClient::new(&config.appview_url, &config.plc_url);
    let identity = identity::resolve_identity(&client, handle).await?;
    let now = Utc::now();

    let progress = ProgressReporter::new(on_progress);

    let profile = match client.get_profile(&identity.did).await {
        Ok(profile) => ProfileSummary {
            display_name: profile.display_name,
            description: profile.description,
            banner: profile.banner,
            followers_count: profile.followers_count,
            follows_count: profile.follows_count,
            posts_count: profile.posts_count,
            created_at: profile.created_at,
        },
        Err(err) => {
            warn!(did = %identity.did, %err, "Profile fetch failed, using empty profile");
            ProfileSummary::default()
        }
    };

    let log_analysis = identity_log::analyze_identity_log(&client, &identity.did).await;

    // Account creation: profile first, earliest identity operation as the
    // fallback, network genesis as the floor.
    let created_at: DateTime<Utc> = profile
        .created_at
        .or(log_analysis.first_operation_at)
        .unwrap_or_else(network_genesis);
    let age_days = labels::age_days(created_at, now);
    let age_percentage = labels::age_percentage(age_days, now);

    let collections = match client
        .describe_repo(&identity.pds_endpoint, &identity.did)
        .await
    {
        Ok(description) => description.collections,
        Err(err) => {
            warn!(did = %identity.did, %err, "Repo description failed, aggregating nothing");
            Vec::new()
        }
    };

    // Three independent re-traversals; the request cache absorbs the
    // overlap between them.
    let all_time =
        window_snapshot(&client, &identity, &collections, TimeWindow::AllTime, now, age_days, &progress)
            .await;
    let last_30 =
        window_snapshot(&client, &identity, &collections, TimeWindow::Last30Days, now, age_days, &progress)
            .await;
    let last_90 =
        window_snapshot(&client, &identity, &collections, TimeWindow::Last90Days, now, age_days, &progress)
            .await;

    let engagement = engagement::collect_engagement(&client, &identity.did, &progress).await;

    let shared = SharedLabels {
        social_status: labels::social_status(
            age_days,
            profile.followers_count,
            profile.follows_count,
        ),
        profile_completion: labels::profile_completion(&profile),
        domain_rarity: labels::domain_rarity(&identity.handle),
        era: labels::era(created_at),
    };

    let report_30 = build_report(
        &identity,
        &profile,
        age_days,
        age_percentage,
        &all_time,
        &last_30,
        &shared,
        &engagement,
        &log_analysis.summary,
    );
    let report_90 = build_report(
        &identity,
        &profile,
        age_days,
        age_percentage,
        &all_time,
        &last_90,
        &shared,
        &engagement,
        &log_analysis.summary,
    );

    let total_pages = progress.finalize();
    info!(
        handle = %identity.handle,
        did = %identity.did,
        pages = total_pages,
        "Report complete"
    );

    Ok(ReportSet {
        identity,
        generated_at: now,
        profile,
        age_days: report::round2(age_days),
        age_percentage: report::round2(age_percentage),
        engagement,
        identity_log: log_analysis.summary,
        last_30_days: report_30,
        last_90_days: report_90,
    })
}

/// One window's traversal plus its post-composition reduction.
#[allow(clippy::too_many_arguments)]
async fn window_snapshot(
    client: &AtprotoClient,
    identity: &Identity,
    collections: &[String],
    window: TimeWindow,
    now: DateTime<Utc>,
    age_days: f64,
    progress: &ProgressReporter,
) -> WindowStats {
    let period_days = window.period_days(age_days);
    let aggregation =
        aggregate_window(client, identity, collections, window, now, period_days, progress).await;
    let posts = posts::classify_posts(
        &identity.did,
        &aggregation.post_records,
        &aggregation.repost_records,
        period_days,
    );
    WindowStats {
        window,
        period_days,
        aggregate: aggregation.aggregate,
        posts,
    }
}

/// Labels that do not depend on the time window.
struct SharedLabels {
    social_status: skylens_common::SocialStatus,
    profile_completion: skylens_common::ProfileCompletion,
    domain_rarity: skylens_common::DomainRarity,
    era: skylens_common::Era,
}

#[allow(clippy::too_many_arguments)]
fn build_report(
    identity: &Identity,
    profile: &ProfileSummary,
    age_days: f64,
    age_percentage: f64,
    all_time: &WindowStats,
    recent: &WindowStats,
    shared: &SharedLabels,
    engagement: &skylens_common::EngagementStats,
    identity_log: &skylens_common::IdentityLogSummary,
) -> Report {
    let labels = ClassificationLabels {
        posting_style: posts::posting_style(
            &recent.posts,
            recent.aggregate.bsky_records_per_day,
        ),
        social_status: shared.social_status,
        activity_all: labels::activity_level(recent.aggregate.records_per_day),
        activity_bsky: labels::activity_level(recent.aggregate.bsky_records_per_day),
        activity_non_bsky: labels::activity_level(recent.aggregate.non_bsky_records_per_day),
        profile_completion: shared.profile_completion,
        domain_rarity: shared.domain_rarity,
        era: shared.era,
    };

    let narrative = narrative::narrative(&NarrativeInputs {
        identity,
        profile,
        age_days,
        age_percentage,
        labels: &labels,
        posts: &recent.posts,
        aggregate: &recent.aggregate,
        engagement,
        identity_log,
    });

    Report {
        window: recent.window,
        all_time: report::rounded_window(all_time.clone()),
        recent: report::rounded_window(recent.clone()),
        labels,
        narrative,
    }
}

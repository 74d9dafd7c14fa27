use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

// --- Network constants ---

/// Namespace prefix of first-party (platform-native) collections.
pub const BSKY_COLLECTION_PREFIX: &str = "app.bsky.";

/// Collection holding post records.
pub const POST_COLLECTION: &str = "app.bsky.feed.post";

/// Collection holding repost records.
pub const REPOST_COLLECTION: &str = "app.bsky.feed.repost";

/// Suffix of platform-default handles.
pub const DEFAULT_HANDLE_SUFFIX: &str = ".bsky.social";

/// Host suffix of first-party personal data servers.
pub const PLATFORM_PDS_SUFFIX: &str = "bsky.network";

/// Public launch of the network; anchor for the age percentage and the
/// start of the invite era.
pub fn network_genesis() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2022, 11, 17, 0, 0, 0)
        .single()
        .expect("valid anchor date")
}

/// Registration opened to everyone.
pub fn open_registration_date() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 2, 6, 0, 0, 0)
        .single()
        .expect("valid anchor date")
}

/// Start of the mass-adoption wave.
pub fn mass_adoption_date() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 11, 5, 0, 0, 0)
        .single()
        .expect("valid anchor date")
}

// --- Identity ---

/// A resolved account. `did` and `pds_endpoint` are derived at resolution
/// time and immutable for the lifetime of one run; nothing here persists.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub handle: String,
    pub did: String,
    pub pds_endpoint: String,
}

/// Profile fields the classifiers and report need.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSummary {
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub banner: Option<String>,
    pub followers_count: u64,
    pub follows_count: u64,
    pub posts_count: u64,
    pub created_at: Option<DateTime<Utc>>,
}

// --- Time windows ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeWindow {
    AllTime,
    Last30Days,
    Last90Days,
}

impl TimeWindow {
    /// Retrieval cutoff for this window; `None` means unbounded.
    pub fn cutoff_time(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            TimeWindow::AllTime => None,
            TimeWindow::Last30Days => Some(now - Duration::days(30)),
            TimeWindow::Last90Days => Some(now - Duration::days(90)),
        }
    }

    /// Denominator for per-day rates: account age for all-time, otherwise
    /// the window length.
    pub fn period_days(&self, account_age_days: f64) -> f64 {
        match self {
            TimeWindow::AllTime => account_age_days,
            TimeWindow::Last30Days => 30.0,
            TimeWindow::Last90Days => 90.0,
        }
    }
}

impl std::fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimeWindow::AllTime => write!(f, "all time"),
            TimeWindow::Last30Days => write!(f, "last 30 days"),
            TimeWindow::Last90Days => write!(f, "last 90 days"),
        }
    }
}

// --- Aggregates ---

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionCount {
    pub count: u64,
    pub per_day: f64,
}

/// Per-window record counts and rates. Invariant:
/// `total_records == total_bsky_records + total_non_bsky_records`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateStats {
    pub total_records: u64,
    pub total_bsky_records: u64,
    pub total_non_bsky_records: u64,
    pub records_per_day: f64,
    pub bsky_records_per_day: f64,
    pub non_bsky_records_per_day: f64,
    pub per_collection: BTreeMap<String, CollectionCount>,
}

/// Post-type composition of one window, over the merged post + repost
/// record set. Every percentage divides by `posts_count` (alt-text coverage
/// divides by `image_posts_count`); every rate divides by the window's
/// period days; all divisions are zero-guarded.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostStats {
    pub posts_count: u64,
    pub only_posts_count: u64,
    pub reply_count: u64,
    pub reply_self_count: u64,
    pub reply_other_count: u64,
    pub quote_count: u64,
    pub quote_self_count: u64,
    pub quote_other_count: u64,
    pub repost_count: u64,
    pub repost_self_count: u64,
    pub repost_other_count: u64,
    pub image_posts_count: u64,
    pub image_posts_with_alt_count: u64,
    pub video_count: u64,
    pub link_count: u64,
    pub mention_count: u64,
    pub text_only_count: u64,

    pub posts_per_day: f64,
    pub only_posts_per_day: f64,
    pub reply_per_day: f64,
    pub quote_per_day: f64,
    pub repost_per_day: f64,

    pub only_posts_percentage: f64,
    pub reply_percentage: f64,
    pub reply_self_percentage: f64,
    pub reply_other_percentage: f64,
    pub quote_percentage: f64,
    pub quote_self_percentage: f64,
    pub quote_other_percentage: f64,
    pub repost_percentage: f64,
    pub repost_self_percentage: f64,
    pub repost_other_percentage: f64,
    pub image_percentage: f64,
    pub alt_text_percentage: f64,
    pub video_percentage: f64,
    pub link_percentage: f64,
    pub mention_percentage: f64,
    pub text_only_percentage: f64,
}

/// Engagement received on the identity's own items, from the public feed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngagementStats {
    pub likes_received: u64,
    pub reposts_received: u64,
    pub quotes_received: u64,
    pub replies_received: u64,
}

/// Security posture and alias history derived from the identity's
/// operation log.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityLogSummary {
    pub rotation_key_count: usize,
    pub active_alias_count: usize,
    pub all_aliases: BTreeSet<String>,
    pub bsky_alias_count: usize,
    pub custom_alias_count: usize,
}

// --- Classification labels ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostingStyle {
    Lurker,
    EngagedTextPoster,
    EngagedImagePoster,
    EngagedImagePosterBadAltText,
    EngagedLinkPoster,
    EngagedVideoPoster,
    EngagedPoster,
    UnengagedTextPoster,
    UnengagedImagePoster,
    UnengagedImagePosterBadAltText,
    UnengagedLinkPoster,
    UnengagedVideoPoster,
    UnengagedPoster,
    ReplyGuy,
    QuoteGuy,
    RepostGuy,
    Unknown,
}

impl std::fmt::Display for PostingStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PostingStyle::Lurker => "Lurker",
            PostingStyle::EngagedTextPoster => "Engaged Text Poster",
            PostingStyle::EngagedImagePoster => "Engaged Image Poster",
            PostingStyle::EngagedImagePosterBadAltText => {
                "Engaged Image Poster who's bad at alt text"
            }
            PostingStyle::EngagedLinkPoster => "Engaged Link Poster",
            PostingStyle::EngagedVideoPoster => "Engaged Video Poster",
            PostingStyle::EngagedPoster => "Engaged Poster",
            PostingStyle::UnengagedTextPoster => "Unengaged Text Poster",
            PostingStyle::UnengagedImagePoster => "Unengaged Image Poster",
            PostingStyle::UnengagedImagePosterBadAltText => {
                "Unengaged Image Poster who's bad at alt text"
            }
            PostingStyle::UnengagedLinkPoster => "Unengaged Link Poster",
            PostingStyle::UnengagedVideoPoster => "Unengaged Video Poster",
            PostingStyle::UnengagedPoster => "Unengaged Poster",
            PostingStyle::ReplyGuy => "Reply Guy",
            PostingStyle::QuoteGuy => "Quote Guy",
            PostingStyle::RepostGuy => "Repost Guy",
            PostingStyle::Unknown => "Unknown",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SocialStatus {
    Newcomer,
    CommunityMember,
    MicroInfluencer,
    Influencer,
    Celebrity,
}

impl std::fmt::Display for SocialStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SocialStatus::Newcomer => "Newcomer",
            SocialStatus::CommunityMember => "Community Member",
            SocialStatus::MicroInfluencer => "Micro Influencer",
            SocialStatus::Influencer => "Influencer",
            SocialStatus::Celebrity => "Celebrity",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    Inactive,
    BarelyActive,
    Active,
    VeryActive,
}

impl std::fmt::Display for ActivityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ActivityLevel::Inactive => "inactive",
            ActivityLevel::BarelyActive => "barely active",
            ActivityLevel::Active => "active",
            ActivityLevel::VeryActive => "very active",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileCompletion {
    Complete,
    Incomplete,
    NotStarted,
}

impl std::fmt::Display for ProfileCompletion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ProfileCompletion::Complete => "complete",
            ProfileCompletion::Incomplete => "incomplete",
            ProfileCompletion::NotStarted => "not started",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainRarity {
    ExtremelyRare,
    VeryRare,
    Rare,
    Uncommon,
    Common,
    VeryCommon,
}

impl std::fmt::Display for DomainRarity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DomainRarity::ExtremelyRare => "extremely rare",
            DomainRarity::VeryRare => "very rare",
            DomainRarity::Rare => "rare",
            DomainRarity::Uncommon => "uncommon",
            DomainRarity::Common => "common",
            DomainRarity::VeryCommon => "very common",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Era {
    Invite,
    OpenRegistration,
    Mainstream,
}

impl std::fmt::Display for Era {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Era::Invite => "invite era",
            Era::OpenRegistration => "open-registration era",
            Era::Mainstream => "mainstream era",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationLabels {
    pub posting_style: PostingStyle,
    pub social_status: SocialStatus,
    pub activity_all: ActivityLevel,
    pub activity_bsky: ActivityLevel,
    pub activity_non_bsky: ActivityLevel,
    pub profile_completion: ProfileCompletion,
    pub domain_rarity: DomainRarity,
    pub era: Era,
}

// --- Report ---

/// Three deterministic template paragraphs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Narrative {
    pub paragraphs: [String; 3],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowStats {
    pub window: TimeWindow,
    pub period_days: f64,
    pub aggregate: AggregateStats,
    pub posts: PostStats,
}

/// One sibling report: the all-time view plus one bounded window, with the
/// labels and narrative computed from that window.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub window: TimeWindow,
    pub all_time: WindowStats,
    pub recent: WindowStats,
    pub labels: ClassificationLabels,
    pub narrative: Narrative,
}

/// Terminal artifact of one pipeline run. Immutable once assembled;
/// ownership passes entirely to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSet {
    pub identity: Identity,
    pub generated_at: DateTime<Utc>,
    pub profile: ProfileSummary,
    pub age_days: f64,
    pub age_percentage: f64,
    pub engagement: EngagementStats,
    pub identity_log: IdentityLogSummary,
    pub last_30_days: Report,
    pub last_90_days: Report,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cutoff_is_none_for_all_time() {
        let now = Utc::now();
        assert!(TimeWindow::AllTime.cutoff_time(now).is_none());
        assert_eq!(
            TimeWindow::Last30Days.cutoff_time(now),
            Some(now - Duration::days(30))
        );
    }

    #[test]
    fn period_days_uses_age_for_all_time() {
        assert_eq!(TimeWindow::AllTime.period_days(412.5), 412.5);
        assert_eq!(TimeWindow::Last30Days.period_days(412.5), 30.0);
        assert_eq!(TimeWindow::Last90Days.period_days(412.5), 90.0);
    }

    #[test]
    fn era_anchors_are_ordered() {
        assert!(network_genesis() < open_registration_date());
        assert!(open_registration_date() < mass_adoption_date());
    }
}

use skylens_common::{
    AggregateStats, ClassificationLabels, EngagementStats, Identity, IdentityLogSummary,
    Narrative, PostStats, ProfileSummary, PLATFORM_PDS_SUFFIX,
};

/// Everything the narrative draws on. Paragraphs are assembled from fixed
/// phrase fragments; the output is fully deterministic given these inputs.
pub(crate) struct NarrativeInputs<'a> {
    pub identity: &'a Identity,
    pub profile: &'a ProfileSummary,
    pub age_days: f64,
    pub age_percentage: f64,
    pub labels: &'a ClassificationLabels,
    pub posts: &'a PostStats,
    pub aggregate: &'a AggregateStats,
    pub engagement: &'a EngagementStats,
    pub identity_log: &'a IdentityLogSummary,
}

fn age_fragment(age_percentage: f64) -> &'static str {
    if age_percentage >= 0.9 {
        "has been around almost since the network first opened its doors"
    } else if age_percentage >= 0.6 {
        "joined while the network was still finding its feet"
    } else if age_percentage >= 0.3 {
        "arrived once the network was well established"
    } else {
        "is a relatively recent arrival"
    }
}

fn alias_fragment(log: &IdentityLogSummary) -> &'static str {
    match (log.bsky_alias_count > 0, log.custom_alias_count > 0) {
        (true, true) => "has used both default and custom-domain handles over time",
        (true, false) => "has kept a default handle throughout",
        (false, true) => "has only ever used custom-domain handles",
        (false, false) => "has no recorded handle history",
    }
}

fn hosting_fragment(identity: &Identity) -> &'static str {
    if identity.pds_endpoint.contains(PLATFORM_PDS_SUFFIX) {
        "their data lives on a first-party server"
    } else {
        "they keep their data on a self-hosted or third-party server"
    }
}

fn rotation_fragment(log: &IdentityLogSummary) -> String {
    if log.rotation_key_count > 0 {
        format!(
            "{} rotation key{} registered for account recovery",
            log.rotation_key_count,
            if log.rotation_key_count == 1 { " is" } else { "s are" }
        )
    } else {
        "no custom rotation keys are registered".to_string()
    }
}

fn alt_text_fragment(posts: &PostStats) -> &'static str {
    if posts.image_posts_count == 0 {
        "images are not really part of their repertoire"
    } else if posts.alt_text_percentage >= 0.8 {
        "they reliably add alt text to their images"
    } else if posts.alt_text_percentage > 0.3 {
        "they add alt text to some of their images"
    } else {
        "their images mostly go out without alt text"
    }
}

fn protocol_fragment(aggregate: &AggregateStats) -> &'static str {
    let share = if aggregate.total_records > 0 {
        aggregate.total_non_bsky_records as f64 / aggregate.total_records as f64
    } else {
        0.0
    };
    if share == 0.0 {
        "their activity sits entirely within the flagship app"
    } else if share < 0.1 {
        "they have dipped a toe into the wider protocol ecosystem"
    } else if share < 0.3 {
        "a meaningful slice of their activity happens outside the flagship app"
    } else {
        "they are a heavy user of the wider protocol ecosystem"
    }
}

/// Produce the three report paragraphs: identity history, posting
/// behavior, and reach.
pub(crate) fn narrative(inputs: &NarrativeInputs<'_>) -> Narrative {
    let identity_paragraph = format!(
        "{handle} {age_frag}, joining during the {era} roughly {age:.0} days ago. \
         The account {alias_frag}, and {hosting_frag}; {rotation_frag}.",
        handle = inputs.identity.handle,
        age_frag = age_fragment(inputs.age_percentage),
        era = inputs.labels.era,
        age = inputs.age_days,
        alias_frag = alias_fragment(inputs.identity_log),
        hosting_frag = hosting_fragment(inputs.identity),
        rotation_frag = rotation_fragment(inputs.identity_log),
    );

    let behavior_paragraph = format!(
        "On the feed they read as a {style}: {total:.1} records per day overall, which makes \
         them {activity} on the platform's own collections and {activity_other} across the rest \
         of the protocol. Counting both posts and reposts they average {posts:.1} items per day, \
         and {alt_frag}.",
        style = inputs.labels.posting_style,
        total = inputs.aggregate.records_per_day,
        activity = inputs.labels.activity_bsky,
        activity_other = inputs.labels.activity_non_bsky,
        posts = inputs.posts.posts_per_day,
        alt_frag = alt_text_fragment(inputs.posts),
    );

    let reach_paragraph = format!(
        "With {followers} followers against {follows} follows they sit in the {status} tier, \
         their profile is {completion}, and their handle is {rarity} for its kind. Their own \
         items have drawn {likes} likes, {reposts} reposts, {quotes} quotes, and {replies} \
         replies; {protocol_frag}.",
        followers = inputs.profile.followers_count,
        follows = inputs.profile.follows_count,
        status = inputs.labels.social_status,
        completion = inputs.labels.profile_completion,
        rarity = inputs.labels.domain_rarity,
        likes = inputs.engagement.likes_received,
        reposts = inputs.engagement.reposts_received,
        quotes = inputs.engagement.quotes_received,
        replies = inputs.engagement.replies_received,
        protocol_frag = protocol_fragment(inputs.aggregate),
    );

    Narrative {
        paragraphs: [identity_paragraph, behavior_paragraph, reach_paragraph],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skylens_common::{
        ActivityLevel, DomainRarity, Era, PostingStyle, ProfileCompletion, SocialStatus,
    };

    fn fixture() -> (
        Identity,
        ProfileSummary,
        ClassificationLabels,
        PostStats,
        AggregateStats,
        EngagementStats,
        IdentityLogSummary,
    ) {
        (
            Identity {
                handle: "alice.example.com".to_string(),
                did: "did:plc:abc".to_string(),
                pds_endpoint: "https://pds.example.com".to_string(),
            },
            ProfileSummary {
                followers_count: 1200,
                follows_count: 300,
                ..Default::default()
            },
            ClassificationLabels {
                posting_style: PostingStyle::ReplyGuy,
                social_status: SocialStatus::MicroInfluencer,
                activity_all: ActivityLevel::Active,
                activity_bsky: ActivityLevel::Active,
                activity_non_bsky: ActivityLevel::Inactive,
                profile_completion: ProfileCompletion::Complete,
                domain_rarity: DomainRarity::Uncommon,
                era: Era::Invite,
            },
            PostStats::default(),
            AggregateStats::default(),
            EngagementStats::default(),
            IdentityLogSummary::default(),
        )
    }

    #[test]
    fn output_is_three_paragraphs_and_deterministic() {
        let (identity, profile, labels, posts, aggregate, engagement, log) = fixture();
        let inputs = NarrativeInputs {
            identity: &identity,
            profile: &profile,
            age_days: 500.0,
            age_percentage: 0.7,
            labels: &labels,
            posts: &posts,
            aggregate: &aggregate,
            engagement: &engagement,
            identity_log: &log,
        };
        let first = narrative(&inputs);
        let second = narrative(&inputs);
        assert_eq!(first.paragraphs.len(), 3);
        assert_eq!(first.paragraphs, second.paragraphs);
        assert!(first.paragraphs[0].contains("alice.example.com"));
        assert!(first.paragraphs[0].contains("invite era"));
        assert!(first.paragraphs[1].contains("Reply Guy"));
        assert!(first.paragraphs[2].contains("Micro Influencer"));
    }

    #[test]
    fn fragments_pick_expected_bands() {
        assert_eq!(
            age_fragment(0.95),
            "has been around almost since the network first opened its doors"
        );
        assert_eq!(age_fragment(0.1), "is a relatively recent arrival");

        let mut posts = PostStats::default();
        assert_eq!(
            alt_text_fragment(&posts),
            "images are not really part of their repertoire"
        );
        posts.image_posts_count = 10;
        posts.alt_text_percentage = 0.9;
        assert_eq!(
            alt_text_fragment(&posts),
            "they reliably add alt text to their images"
        );

        let mut aggregate = AggregateStats::default();
        aggregate.total_records = 100;
        aggregate.total_non_bsky_records = 40;
        assert_eq!(
            protocol_fragment(&aggregate),
            "they are a heavy user of the wider protocol ecosystem"
        );
    }
}

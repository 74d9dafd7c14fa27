use chrono::{DateTime, Utc};

use skylens_common::{
    mass_adoption_date, network_genesis, open_registration_date, ActivityLevel, DomainRarity, Era,
    ProfileCompletion, ProfileSummary, SocialStatus, DEFAULT_HANDLE_SUFFIX,
};

/// Commercial TLDs treated as "standard" for rarity banding.
const COMMON_TLDS: [&str; 3] = [".com", ".net", ".org"];

pub(crate) fn age_days(created_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    ((now - created_at).num_seconds() as f64 / 86_400.0).max(0.0)
}

/// Account age as a share of the network's lifetime. Narrative framing
/// only; no classifier thresholds depend on it.
pub(crate) fn age_percentage(age: f64, now: DateTime<Utc>) -> f64 {
    let network_age = age_days(network_genesis(), now);
    if network_age > 0.0 {
        (age / network_age).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

pub(crate) fn social_status(age: f64, followers: u64, follows: u64) -> SocialStatus {
    if age < 30.0 {
        return SocialStatus::Newcomer;
    }
    let follow_ratio = if followers > 0 {
        follows as f64 / followers as f64
    } else {
        f64::INFINITY
    };
    if follow_ratio < 0.5 {
        if followers >= 100_000 {
            SocialStatus::Celebrity
        } else if followers >= 10_000 {
            SocialStatus::Influencer
        } else if followers >= 500 {
            SocialStatus::MicroInfluencer
        } else {
            SocialStatus::CommunityMember
        }
    } else {
        SocialStatus::CommunityMember
    }
}

pub(crate) fn activity_level(per_day: f64) -> ActivityLevel {
    if per_day <= 0.0 {
        ActivityLevel::Inactive
    } else if per_day < 1.0 {
        ActivityLevel::BarelyActive
    } else if per_day < 10.0 {
        ActivityLevel::Active
    } else {
        ActivityLevel::VeryActive
    }
}

pub(crate) fn profile_completion(profile: &ProfileSummary) -> ProfileCompletion {
    let filled = [
        profile.display_name.as_deref(),
        profile.banner.as_deref(),
        profile.description.as_deref(),
    ]
    .iter()
    .filter(|field| field.is_some_and(|value| !value.trim().is_empty()))
    .count();

    match filled {
        3 => ProfileCompletion::Complete,
        0 => ProfileCompletion::NotStarted,
        _ => ProfileCompletion::Incomplete,
    }
}

/// Handle-length rarity bands. The bands differ per domain class because a
/// short name costs much more on the default domain than on a custom one.
pub(crate) fn domain_rarity(handle: &str) -> DomainRarity {
    let len = handle.chars().count();
    if handle.ends_with(DEFAULT_HANDLE_SUFFIX) {
        match len {
            0..=14 => DomainRarity::ExtremelyRare,
            15 => DomainRarity::VeryRare,
            16 => DomainRarity::Rare,
            17 => DomainRarity::Uncommon,
            18..=20 => DomainRarity::Common,
            _ => DomainRarity::VeryCommon,
        }
    } else if COMMON_TLDS.iter().any(|tld| handle.ends_with(tld)) {
        match len {
            0..=5 => DomainRarity::ExtremelyRare,
            6 => DomainRarity::VeryRare,
            7 => DomainRarity::Rare,
            8..=10 => DomainRarity::Uncommon,
            11..=15 => DomainRarity::Common,
            _ => DomainRarity::VeryCommon,
        }
    } else {
        match len {
            0..=9 => DomainRarity::ExtremelyRare,
            10..=11 => DomainRarity::VeryRare,
            12..=13 => DomainRarity::Rare,
            14..=16 => DomainRarity::Uncommon,
            17..=20 => DomainRarity::Common,
            _ => DomainRarity::VeryCommon,
        }
    }
}

pub(crate) fn era(created_at: DateTime<Utc>) -> Era {
    if created_at < open_registration_date() {
        Era::Invite
    } else if created_at < mass_adoption_date() {
        Era::OpenRegistration
    } else {
        Era::Mainstream
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn default_domain_length_bands() {
        // "xx.bsky.social" is 14 chars; each added char moves one band.
        assert_eq!(domain_rarity("xx.bsky.social"), DomainRarity::ExtremelyRare);
        assert_eq!(domain_rarity("xxx.bsky.social"), DomainRarity::VeryRare);
        assert_eq!(domain_rarity("xxxx.bsky.social"), DomainRarity::Rare);
        assert_eq!(domain_rarity("xxxxx.bsky.social"), DomainRarity::Uncommon);
        assert_eq!(domain_rarity("xxxxxx.bsky.social"), DomainRarity::Common);
        // Length 21.
        assert_eq!(
            domain_rarity("xxxxxxxxx.bsky.social"),
            DomainRarity::VeryCommon
        );
    }

    #[test]
    fn tld_and_custom_domains_use_their_own_bands() {
        assert_eq!(domain_rarity("x.com"), DomainRarity::ExtremelyRare);
        assert_eq!(domain_rarity("ab.com"), DomainRarity::VeryRare);
        assert_eq!(domain_rarity("news.org"), DomainRarity::Uncommon);
        assert_eq!(domain_rarity("alice.dev"), DomainRarity::ExtremelyRare);
        assert_eq!(domain_rarity("a.very-long-custom.example"), DomainRarity::VeryCommon);
    }

    #[test]
    fn social_status_tiers() {
        assert_eq!(social_status(10.0, 1_000_000, 10), SocialStatus::Newcomer);
        assert_eq!(social_status(100.0, 200_000, 50), SocialStatus::Celebrity);
        assert_eq!(social_status(100.0, 20_000, 50), SocialStatus::Influencer);
        assert_eq!(social_status(100.0, 600, 50), SocialStatus::MicroInfluencer);
        assert_eq!(social_status(100.0, 400, 50), SocialStatus::CommunityMember);
        // Following half or more of one's audience is community behavior.
        assert_eq!(
            social_status(100.0, 20_000, 15_000),
            SocialStatus::CommunityMember
        );
        assert_eq!(social_status(100.0, 0, 0), SocialStatus::CommunityMember);
    }

    #[test]
    fn activity_thresholds() {
        assert_eq!(activity_level(0.0), ActivityLevel::Inactive);
        assert_eq!(activity_level(0.5), ActivityLevel::BarelyActive);
        assert_eq!(activity_level(1.0), ActivityLevel::Active);
        assert_eq!(activity_level(9.99), ActivityLevel::Active);
        assert_eq!(activity_level(10.0), ActivityLevel::VeryActive);
    }

    #[test]
    fn profile_completion_counts_trimmed_fields() {
        let full = ProfileSummary {
            display_name: Some("Alice".to_string()),
            banner: Some("https://cdn.example/banner.jpg".to_string()),
            description: Some("hello".to_string()),
            ..Default::default()
        };
        assert_eq!(profile_completion(&full), ProfileCompletion::Complete);

        let partial = ProfileSummary {
            display_name: Some("Alice".to_string()),
            banner: Some("   ".to_string()),
            description: None,
            ..Default::default()
        };
        assert_eq!(profile_completion(&partial), ProfileCompletion::Incomplete);

        assert_eq!(
            profile_completion(&ProfileSummary::default()),
            ProfileCompletion::NotStarted
        );
    }

    #[test]
    fn era_boundaries() {
        let invite = Utc.with_ymd_and_hms(2023, 5, 1, 0, 0, 0).single().unwrap();
        let open = Utc.with_ymd_and_hms(2024, 2, 6, 0, 0, 0).single().unwrap();
        let mainstream = Utc.with_ymd_and_hms(2024, 12, 1, 0, 0, 0).single().unwrap();
        assert_eq!(era(invite), Era::Invite);
        assert_eq!(era(open), Era::OpenRegistration);
        assert_eq!(era(mainstream), Era::Mainstream);
    }

    #[test]
    fn age_percentage_is_clamped() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).single().unwrap();
        let pct = age_percentage(100_000.0, now);
        assert_eq!(pct, 1.0);
        assert_eq!(age_percentage(0.0, now), 0.0);
    }
}

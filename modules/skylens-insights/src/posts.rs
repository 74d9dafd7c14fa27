use serde_json::Value;

use skylens_common::{PostStats, PostingStyle};

// Embed and facet type tags, as they appear in record payloads.
const EMBED_IMAGES: &str = "app.bsky.embed.images";
const EMBED_VIDEO: &str = "app.bsky.embed.video";
const EMBED_EXTERNAL: &str = "app.bsky.embed.external";
const EMBED_RECORD: &str = "app.bsky.embed.record";
const EMBED_RECORD_WITH_MEDIA: &str = "app.bsky.embed.recordWithMedia";
const FACET_MENTION: &str = "app.bsky.richtext.facet#mention";
const FACET_LINK: &str = "app.bsky.richtext.facet#link";

/// What one post record contributes to the counters. Malformed records
/// simply match no category; classification never fails.
#[derive(Debug, Default)]
struct PostShape {
    is_reply: bool,
    reply_to_self: bool,
    is_quote: bool,
    quote_of_self: bool,
    has_images: bool,
    has_alt_text: bool,
    has_video: bool,
    has_link_embed: bool,
    has_link_facet: bool,
    has_mention: bool,
}

fn type_tag(value: &Value) -> Option<&str> {
    value.get("$type")?.as_str()
}

/// URI of the record a quote embed points at.
fn quoted_uri(embed: &Value) -> Option<&str> {
    match type_tag(embed) {
        Some(EMBED_RECORD) => embed.get("record")?.get("uri")?.as_str(),
        Some(EMBED_RECORD_WITH_MEDIA) => embed
            .get("record")?
            .get("record")?
            .get("uri")?
            .as_str(),
        _ => None,
    }
}

/// The media half of an embed: the embed itself, or the `media` side of a
/// record-with-media embed.
fn media_embed(embed: &Value) -> Option<&Value> {
    match type_tag(embed) {
        Some(EMBED_RECORD_WITH_MEDIA) => embed.get("media"),
        Some(_) => Some(embed),
        None => None,
    }
}

fn images_of(embed: &Value) -> Option<&Vec<Value>> {
    let media = media_embed(embed)?;
    if type_tag(media) != Some(EMBED_IMAGES) {
        return None;
    }
    media.get("images")?.as_array()
}

fn facet_features<'a>(value: &'a Value) -> Vec<&'a str> {
    let Some(facets) = value.get("facets").and_then(|f| f.as_array()) else {
        return Vec::new();
    };
    facets
        .iter()
        .filter_map(|facet| facet.get("features")?.as_array())
        .flatten()
        .filter_map(type_tag)
        .collect()
}

fn shape_of(did: &str, value: &Value) -> PostShape {
    let mut shape = PostShape::default();

    if let Some(reply) = value.get("reply") {
        shape.is_reply = true;
        shape.reply_to_self = reply
            .get("parent")
            .and_then(|p| p.get("uri"))
            .and_then(|u| u.as_str())
            .is_some_and(|uri| uri.contains(did));
    }

    if let Some(embed) = value.get("embed") {
        if matches!(
            type_tag(embed),
            Some(EMBED_RECORD) | Some(EMBED_RECORD_WITH_MEDIA)
        ) {
            shape.is_quote = true;
            shape.quote_of_self = quoted_uri(embed).is_some_and(|uri| uri.contains(did));
        }
        if let Some(images) = images_of(embed) {
            shape.has_images = true;
            shape.has_alt_text = images.iter().any(|img| {
                img.get("alt")
                    .and_then(|a| a.as_str())
                    .is_some_and(|alt| !alt.trim().is_empty())
            });
        }
        if let Some(media) = media_embed(embed) {
            match type_tag(media) {
                Some(EMBED_VIDEO) => shape.has_video = true,
                Some(EMBED_EXTERNAL) => shape.has_link_embed = true,
                _ => {}
            }
        }
    }

    for feature in facet_features(value) {
        match feature {
            FACET_MENTION => shape.has_mention = true,
            FACET_LINK => shape.has_link_facet = true,
            _ => {}
        }
    }

    shape
}

fn percentage(count: u64, denominator: u64) -> f64 {
    if denominator > 0 {
        count as f64 / denominator as f64
    } else {
        0.0
    }
}

fn rate(count: u64, period_days: f64) -> f64 {
    if period_days > 0.0 {
        count as f64 / period_days
    } else {
        0.0
    }
}

/// Reduce the merged post + repost record set of one window into its
/// composition stats. `posts_count` covers both record kinds, so every
/// percentage shares it as denominator and stays within [0, 1]; alt-text
/// coverage is the exception, dividing by the image-post count.
pub(crate) fn classify_posts(
    did: &str,
    posts: &[Value],
    reposts: &[Value],
    period_days: f64,
) -> PostStats {
    let mut stats = PostStats::default();

    for value in posts {
        let shape = shape_of(did, value);

        if shape.is_reply {
            stats.reply_count += 1;
            if shape.reply_to_self {
                stats.reply_self_count += 1;
            } else {
                stats.reply_other_count += 1;
            }
        } else {
            stats.only_posts_count += 1;
        }

        if shape.is_quote {
            stats.quote_count += 1;
            if shape.quote_of_self {
                stats.quote_self_count += 1;
            } else {
                stats.quote_other_count += 1;
            }
        }

        if shape.has_images {
            stats.image_posts_count += 1;
            if shape.has_alt_text {
                stats.image_posts_with_alt_count += 1;
            }
        }
        if shape.has_video {
            stats.video_count += 1;
        }
        if shape.has_link_embed {
            stats.link_count += 1;
        }
        if shape.has_mention {
            stats.mention_count += 1;
        }
        if !shape.is_reply && value.get("embed").is_none() && !shape.has_link_facet {
            stats.text_only_count += 1;
        }
    }

    for value in reposts {
        stats.repost_count += 1;
        let of_self = value
            .get("subject")
            .and_then(|s| s.get("uri"))
            .and_then(|u| u.as_str())
            .is_some_and(|uri| uri.contains(did));
        if of_self {
            stats.repost_self_count += 1;
        } else {
            stats.repost_other_count += 1;
        }
    }

    stats.posts_count = posts.len() as u64 + reposts.len() as u64;

    stats.posts_per_day = rate(stats.posts_count, period_days);
    stats.only_posts_per_day = rate(stats.only_posts_count, period_days);
    stats.reply_per_day = rate(stats.reply_count, period_days);
    stats.quote_per_day = rate(stats.quote_count, period_days);
    stats.repost_per_day = rate(stats.repost_count, period_days);

    let n = stats.posts_count;
    stats.only_posts_percentage = percentage(stats.only_posts_count, n);
    stats.reply_percentage = percentage(stats.reply_count, n);
    stats.reply_self_percentage = percentage(stats.reply_self_count, n);
    stats.reply_other_percentage = percentage(stats.reply_other_count, n);
    stats.quote_percentage = percentage(stats.quote_count, n);
    stats.quote_self_percentage = percentage(stats.quote_self_count, n);
    stats.quote_other_percentage = percentage(stats.quote_other_count, n);
    stats.repost_percentage = percentage(stats.repost_count, n);
    stats.repost_self_percentage = percentage(stats.repost_self_count, n);
    stats.repost_other_percentage = percentage(stats.repost_other_count, n);
    stats.image_percentage = percentage(stats.image_posts_count, n);
    stats.alt_text_percentage =
        percentage(stats.image_posts_with_alt_count, stats.image_posts_count);
    stats.video_percentage = percentage(stats.video_count, n);
    stats.link_percentage = percentage(stats.link_count, n);
    stats.mention_percentage = percentage(stats.mention_count, n);
    stats.text_only_percentage = percentage(stats.text_only_count, n);

    stats
}

/// Content type with the strictly largest share, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DominantType {
    Text,
    Image,
    Link,
    Video,
}

fn dominant_type(posts: &PostStats) -> Option<DominantType> {
    let candidates = [
        (DominantType::Text, posts.text_only_percentage),
        (DominantType::Image, posts.image_percentage),
        (DominantType::Link, posts.link_percentage),
        (DominantType::Video, posts.video_percentage),
    ];
    let max = candidates
        .iter()
        .map(|(_, v)| *v)
        .fold(f64::MIN, f64::max);
    let mut at_max = candidates.iter().filter(|(_, v)| *v == max);
    let winner = at_max.next()?.0;
    if at_max.next().is_some() {
        return None;
    }
    Some(winner)
}

/// Alt-text coverage at or below this marks an image poster as bad at it.
const BAD_ALT_TEXT_THRESHOLD: f64 = 0.3;

fn typed_poster(posts: &PostStats, engaged: bool) -> PostingStyle {
    match dominant_type(posts) {
        Some(DominantType::Text) => {
            if engaged {
                PostingStyle::EngagedTextPoster
            } else {
                PostingStyle::UnengagedTextPoster
            }
        }
        Some(DominantType::Image) => {
            let bad_alt = posts.alt_text_percentage <= BAD_ALT_TEXT_THRESHOLD;
            match (engaged, bad_alt) {
                (true, true) => PostingStyle::EngagedImagePosterBadAltText,
                (true, false) => PostingStyle::EngagedImagePoster,
                (false, true) => PostingStyle::UnengagedImagePosterBadAltText,
                (false, false) => PostingStyle::UnengagedImagePoster,
            }
        }
        Some(DominantType::Link) => {
            if engaged {
                PostingStyle::EngagedLinkPoster
            } else {
                PostingStyle::UnengagedLinkPoster
            }
        }
        Some(DominantType::Video) => {
            if engaged {
                PostingStyle::EngagedVideoPoster
            } else {
                PostingStyle::UnengagedVideoPoster
            }
        }
        None => {
            if engaged {
                PostingStyle::EngagedPoster
            } else {
                PostingStyle::UnengagedPoster
            }
        }
    }
}

/// Ordered posting-style rules; first match wins.
pub(crate) fn posting_style(posts: &PostStats, bsky_records_per_day: f64) -> PostingStyle {
    if posts.posts_per_day < 0.1 && bsky_records_per_day > 0.3 {
        return PostingStyle::Lurker;
    }
    if posts.only_posts_per_day > 0.8 {
        let engaged = posts.reply_other_percentage >= 0.3;
        return typed_poster(posts, engaged);
    }
    if posts.reply_other_percentage >= 0.5 {
        return PostingStyle::ReplyGuy;
    }
    if posts.quote_other_percentage >= 0.5 {
        return PostingStyle::QuoteGuy;
    }
    if posts.repost_other_percentage >= 0.5 {
        return PostingStyle::RepostGuy;
    }
    PostingStyle::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const DID: &str = "did:plc:selfself";

    fn text_post() -> Value {
        json!({ "text": "plain words", "createdAt": "2025-06-01T00:00:00Z" })
    }

    fn reply_post(parent_did: &str) -> Value {
        json!({
            "text": "replying",
            "createdAt": "2025-06-01T00:00:00Z",
            "reply": {
                "root": { "uri": format!("at://{parent_did}/app.bsky.feed.post/1"), "cid": "r" },
                "parent": { "uri": format!("at://{parent_did}/app.bsky.feed.post/2"), "cid": "p" }
            }
        })
    }

    fn image_post(alt: &str) -> Value {
        json!({
            "text": "look",
            "createdAt": "2025-06-01T00:00:00Z",
            "embed": {
                "$type": "app.bsky.embed.images",
                "images": [{ "alt": alt, "image": { "ref": "blob" } }]
            }
        })
    }

    fn quote_post(quoted_did: &str) -> Value {
        json!({
            "text": "quoting",
            "createdAt": "2025-06-01T00:00:00Z",
            "embed": {
                "$type": "app.bsky.embed.record",
                "record": { "uri": format!("at://{quoted_did}/app.bsky.feed.post/9"), "cid": "q" }
            }
        })
    }

    fn link_facet_post() -> Value {
        json!({
            "text": "see example.com",
            "createdAt": "2025-06-01T00:00:00Z",
            "facets": [{
                "index": { "byteStart": 4, "byteEnd": 15 },
                "features": [{ "$type": "app.bsky.richtext.facet#link", "uri": "https://example.com" }]
            }]
        })
    }

    fn mention_post() -> Value {
        json!({
            "text": "hey @bob",
            "createdAt": "2025-06-01T00:00:00Z",
            "facets": [{
                "index": { "byteStart": 4, "byteEnd": 8 },
                "features": [{ "$type": "app.bsky.richtext.facet#mention", "did": "did:plc:bob" }]
            }]
        })
    }

    fn repost(of_did: &str) -> Value {
        json!({
            "createdAt": "2025-06-01T00:00:00Z",
            "subject": { "uri": format!("at://{of_did}/app.bsky.feed.post/3"), "cid": "s" }
        })
    }

    #[test]
    fn buckets_reply_quote_and_media_shapes() {
        let posts = vec![
            text_post(),
            reply_post(DID),
            reply_post("did:plc:other"),
            image_post("a guide dog"),
            image_post("   "),
            quote_post("did:plc:other"),
            link_facet_post(),
            mention_post(),
        ];
        let reposts = vec![repost("did:plc:other"), repost(DID)];
        let stats = classify_posts(DID, &posts, &reposts, 10.0);

        assert_eq!(stats.posts_count, 10);
        assert_eq!(stats.reply_count, 2);
        assert_eq!(stats.reply_self_count, 1);
        assert_eq!(stats.reply_other_count, 1);
        assert_eq!(stats.quote_count, 1);
        assert_eq!(stats.quote_other_count, 1);
        assert_eq!(stats.image_posts_count, 2);
        assert_eq!(stats.image_posts_with_alt_count, 1);
        assert_eq!(stats.alt_text_percentage, 0.5);
        assert_eq!(stats.repost_count, 2);
        assert_eq!(stats.repost_self_count, 1);
        assert_eq!(stats.repost_other_count, 1);
        assert_eq!(stats.mention_count, 1);
        // Text-only excludes the link-facet post but not the mention post.
        assert_eq!(stats.text_only_count, 2);
        assert_eq!(stats.posts_per_day, 1.0);
    }

    #[test]
    fn record_with_media_counts_as_quote_and_image() {
        let post = json!({
            "text": "both",
            "createdAt": "2025-06-01T00:00:00Z",
            "embed": {
                "$type": "app.bsky.embed.recordWithMedia",
                "record": {
                    "record": { "uri": "at://did:plc:other/app.bsky.feed.post/7", "cid": "q" }
                },
                "media": {
                    "$type": "app.bsky.embed.images",
                    "images": [{ "alt": "screenshot of a chart", "image": { "ref": "b" } }]
                }
            }
        });
        let stats = classify_posts(DID, &[post], &[], 1.0);
        assert_eq!(stats.quote_count, 1);
        assert_eq!(stats.quote_other_count, 1);
        assert_eq!(stats.image_posts_count, 1);
        assert_eq!(stats.image_posts_with_alt_count, 1);
    }

    #[test]
    fn empty_input_yields_zeroes_not_nan() {
        let stats = classify_posts(DID, &[], &[], 0.0);
        assert_eq!(stats.posts_count, 0);
        assert_eq!(stats.reply_percentage, 0.0);
        assert_eq!(stats.alt_text_percentage, 0.0);
        assert_eq!(stats.posts_per_day, 0.0);
        assert!(!stats.text_only_percentage.is_nan());
    }

    #[test]
    fn percentages_stay_in_unit_range() {
        let posts = vec![text_post(), image_post("alt"), reply_post(DID)];
        let stats = classify_posts(DID, &posts, &[repost("did:plc:other")], 30.0);
        for p in [
            stats.only_posts_percentage,
            stats.reply_percentage,
            stats.quote_percentage,
            stats.repost_percentage,
            stats.image_percentage,
            stats.alt_text_percentage,
            stats.video_percentage,
            stats.link_percentage,
            stats.mention_percentage,
            stats.text_only_percentage,
        ] {
            assert!((0.0..=1.0).contains(&p), "percentage out of range: {p}");
        }
    }

    #[test]
    fn malformed_records_match_no_category() {
        let stats = classify_posts(
            DID,
            &[json!("not an object"), json!({ "reply": 7 })],
            &[json!({ "subject": "bare string" })],
            1.0,
        );
        // The degenerate reply field still registers as a reply marker; the
        // bare-string subject falls through to repost-of-other.
        assert_eq!(stats.posts_count, 3);
        assert_eq!(stats.repost_other_count, 1);
    }

    #[test]
    fn low_posting_high_platform_rate_is_a_lurker() {
        let mut stats = PostStats::default();
        stats.posts_per_day = 0.05;
        stats.reply_other_percentage = 0.9;
        assert_eq!(posting_style(&stats, 0.5), PostingStyle::Lurker);
    }

    #[test]
    fn engaged_image_poster_with_poor_alt_text() {
        let mut stats = PostStats::default();
        stats.posts_per_day = 1.2;
        stats.only_posts_per_day = 0.9;
        stats.reply_other_percentage = 0.4;
        stats.image_percentage = 0.6;
        stats.text_only_percentage = 0.2;
        stats.link_percentage = 0.1;
        stats.video_percentage = 0.05;
        stats.alt_text_percentage = 0.2;
        assert_eq!(
            posting_style(&stats, 2.0),
            PostingStyle::EngagedImagePosterBadAltText
        );
    }

    #[test]
    fn unengaged_mirror_applies_below_reply_threshold() {
        let mut stats = PostStats::default();
        stats.posts_per_day = 1.2;
        stats.only_posts_per_day = 0.9;
        stats.reply_other_percentage = 0.1;
        stats.text_only_percentage = 0.7;
        stats.image_percentage = 0.2;
        assert_eq!(posting_style(&stats, 2.0), PostingStyle::UnengagedTextPoster);
    }

    #[test]
    fn tied_shares_fall_back_to_plain_poster() {
        let mut stats = PostStats::default();
        stats.posts_per_day = 1.0;
        stats.only_posts_per_day = 0.9;
        stats.reply_other_percentage = 0.5;
        stats.text_only_percentage = 0.4;
        stats.image_percentage = 0.4;
        assert_eq!(posting_style(&stats, 2.0), PostingStyle::EngagedPoster);
    }

    #[test]
    fn reply_quote_repost_guys_in_priority_order() {
        let mut stats = PostStats::default();
        stats.posts_per_day = 0.5;
        stats.reply_other_percentage = 0.6;
        stats.quote_other_percentage = 0.7;
        assert_eq!(posting_style(&stats, 0.1), PostingStyle::ReplyGuy);

        stats.reply_other_percentage = 0.1;
        assert_eq!(posting_style(&stats, 0.1), PostingStyle::QuoteGuy);

        stats.quote_other_percentage = 0.2;
        stats.repost_other_percentage = 0.8;
        assert_eq!(posting_style(&stats, 0.1), PostingStyle::RepostGuy);

        stats.repost_other_percentage = 0.2;
        assert_eq!(posting_style(&stats, 0.1), PostingStyle::Unknown);
    }
}

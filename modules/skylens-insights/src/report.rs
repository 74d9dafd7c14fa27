use skylens_common::{AggregateStats, PostStats, WindowStats};

/// Uniform rounding applied to every derived float in the final report.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn rounded_aggregate(mut aggregate: AggregateStats) -> AggregateStats {
    aggregate.records_per_day = round2(aggregate.records_per_day);
    aggregate.bsky_records_per_day = round2(aggregate.bsky_records_per_day);
    aggregate.non_bsky_records_per_day = round2(aggregate.non_bsky_records_per_day);
    for count in aggregate.per_collection.values_mut() {
        count.per_day = round2(count.per_day);
    }
    aggregate
}

fn rounded_posts(mut posts: PostStats) -> PostStats {
    for rate in [
        &mut posts.posts_per_day,
        &mut posts.only_posts_per_day,
        &mut posts.reply_per_day,
        &mut posts.quote_per_day,
        &mut posts.repost_per_day,
    ] {
        *rate = round2(*rate);
    }
    for pct in [
        &mut posts.only_posts_percentage,
        &mut posts.reply_percentage,
        &mut posts.reply_self_percentage,
        &mut posts.reply_other_percentage,
        &mut posts.quote_percentage,
        &mut posts.quote_self_percentage,
        &mut posts.quote_other_percentage,
        &mut posts.repost_percentage,
        &mut posts.repost_self_percentage,
        &mut posts.repost_other_percentage,
        &mut posts.image_percentage,
        &mut posts.alt_text_percentage,
        &mut posts.video_percentage,
        &mut posts.link_percentage,
        &mut posts.mention_percentage,
        &mut posts.text_only_percentage,
    ] {
        *pct = round2(*pct);
    }
    posts
}

pub(crate) fn rounded_window(mut window: WindowStats) -> WindowStats {
    window.period_days = round2(window.period_days);
    window.aggregate = rounded_aggregate(window.aggregate);
    window.posts = rounded_posts(window.posts);
    window
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_to_two_decimals() {
        assert_eq!(round2(0.3333333), 0.33);
        assert_eq!(round2(0.666666), 0.67);
        assert_eq!(round2(2.0), 2.0);
        assert_eq!(round2(0.005), 0.01);
    }
}

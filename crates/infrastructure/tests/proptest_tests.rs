//! Property-based tests for chaos matching and replay statistics

use std::time::Duration;

use infrastructure::{ReplayStats, chaos::EndpointMatcher};
use proptest::prelude::*;

proptest! {
    #[test]
    fn literal_pattern_matches_only_itself(
        pattern in "[a-z0-9/._+()?$^|-]{1,24}",
        other in "[a-z0-9/._+()?$^|-]{1,24}",
    ) {
        let matcher = EndpointMatcher::new(&[pattern.as_str()]).unwrap();
        prop_assert!(matcher.matches(&pattern));
        prop_assert_eq!(matcher.matches(&other), other == pattern);
    }

    #[test]
    fn prefix_wildcard_matches_any_suffix(
        prefix in "/[a-z]{1,8}/",
        suffix in "[a-z0-9/]{0,16}",
    ) {
        let matcher = EndpointMatcher::new(&[format!("{prefix}*")]).unwrap();
        let endpoint = format!("{prefix}{suffix}");
        prop_assert!(matcher.matches(&endpoint));
    }

    #[test]
    fn online_mean_stays_within_sample_range(samples in prop::collection::vec(1u64..10_000, 1..50)) {
        let mut stats = ReplayStats::default();
        for ms in &samples {
            stats.record(Duration::from_millis(*ms), true);
        }
        let min = Duration::from_millis(*samples.iter().min().unwrap());
        let max = Duration::from_millis(*samples.iter().max().unwrap());
        prop_assert!(stats.average_latency >= min.saturating_sub(Duration::from_nanos(samples.len() as u64)));
        prop_assert!(stats.average_latency <= max);
        prop_assert_eq!(stats.total_requests, samples.len() as u64);
    }
}

//! Property-based tests for the event normalizer.
//!
//! These tests check ordering and derived fields of the normalized sequence
//! for arbitrary visit/item sets.

use historysync::services::normalizer::{
    normalize, platform_time_to_unix_millis, MAX_DWELL_SECS, PLATFORM_EPOCH_MILLIS,
};
use historysync::types::event::{RawHistory, RawItem, RawVisit};
use proptest::prelude::*;

/// Strategy for a store with up to 5 items and visits that may reference
/// unknown items. Visit times are millisecond-precise platform seconds.
fn arb_history() -> impl Strategy<Value = RawHistory> {
    let items = prop::collection::vec(
        ("[a-z]{3,10}", proptest::option::of("[A-Za-z ]{0,12}")),
        1..5,
    )
    .prop_map(|entries| {
        entries
            .into_iter()
            .enumerate()
            .map(|(i, (host, title))| RawItem {
                id: i as i64 + 1,
                url: format!("https://{}.example", host),
                title,
            })
            .collect::<Vec<_>>()
    });
    let visits = prop::collection::vec(
        (1i64..8, -1_000_000_000i64..1_000_000_000_000i64, proptest::option::of("[a-z]{0,6}")),
        0..40,
    )
    .prop_map(|entries| {
        entries
            .into_iter()
            .map(|(history_item, millis, title)| RawVisit {
                history_item,
                visit_time: millis as f64 / 1000.0,
                title,
            })
            .collect::<Vec<_>>()
    });
    (items, visits).prop_map(|(items, visits)| RawHistory { items, visits })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn events_are_sorted_newest_first(history in arb_history()) {
        let events = normalize(&history);
        for pair in events.windows(2) {
            prop_assert!(pair[0].visited_at >= pair[1].visited_at);
        }
    }

    #[test]
    fn only_visits_with_known_items_survive(history in arb_history()) {
        let known = history
            .visits
            .iter()
            .filter(|v| history.items.iter().any(|i| i.id == v.history_item))
            .count();
        prop_assert_eq!(normalize(&history).len(), known);
    }

    /// Read oldest-first, each event's next visit is the event after it and
    /// its duration is the capped, floored gap in seconds.
    #[test]
    fn next_visit_and_duration_follow_chronological_neighbour(history in arb_history()) {
        let mut ascending = normalize(&history);
        ascending.reverse();

        for pair in ascending.windows(2) {
            let (current, next) = (&pair[0], &pair[1]);
            prop_assert_eq!(current.next_visited_at, Some(next.visited_at));
            let expected = ((next.visited_at - current.visited_at) / 1000).min(MAX_DWELL_SECS);
            prop_assert_eq!(current.duration, Some(expected));
            prop_assert!((0..=MAX_DWELL_SECS).contains(&expected));
        }
    }

    #[test]
    fn most_recent_event_has_no_next(history in arb_history()) {
        let events = normalize(&history);
        if let Some(newest) = events.first() {
            prop_assert_eq!(newest.next_visited_at, None);
            prop_assert_eq!(newest.duration, None);
        }
        for event in events.iter().skip(1) {
            prop_assert!(event.next_visited_at.is_some());
        }
    }

    #[test]
    fn datetime_matches_visited_at(history in arb_history()) {
        for event in normalize(&history) {
            let parsed = chrono::DateTime::parse_from_rfc3339(&event.datetime).unwrap();
            prop_assert_eq!(parsed.timestamp_millis(), event.visited_at);
            prop_assert!(event.datetime.ends_with('Z'));
        }
    }

    #[test]
    fn whole_second_conversion_is_exact(secs in -1_000_000_000i64..2_000_000_000i64) {
        prop_assert_eq!(
            platform_time_to_unix_millis(secs as f64),
            Some(PLATFORM_EPOCH_MILLIS + secs * 1000)
        );
    }
}

#[test]
fn epoch_conversion_examples() {
    assert_eq!(platform_time_to_unix_millis(0.0), Some(978_307_200_000));
    assert_eq!(platform_time_to_unix_millis(86_400.0), Some(978_393_600_000));
}

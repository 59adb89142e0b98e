//! Property-based tests for the aggregation engine

use adlens::engine::{
    aggregate, apply_view, AggregationLevel, CopyEngine, GroupMode, MetricId, PatternEngine,
    PerformanceRecord, RawRecord, SortDir, SortKey, ViewOptions,
};
use proptest::prelude::*;

fn engines() -> (PatternEngine, CopyEngine) {
    (PatternEngine::new(), CopyEngine::new())
}

/// Names made of plain word segments, never containing a 10+ digit run, so
/// level-5 keys fall back to the verbatim name.
fn word_name() -> impl Strategy<Value = String> {
    proptest::collection::vec("[A-Za-z][A-Za-z0-9]{0,8}", 1..6)
        .prop_map(|segments| segments.join(" | "))
}

fn raw_record(ad_id: String, name: String, impressions: u64) -> PerformanceRecord {
    PerformanceRecord::from_raw(RawRecord {
        ad_id: Some(ad_id),
        display_name: Some(name),
        impressions: Some(serde_json::json!(impressions)),
        ..RawRecord::default()
    })
}

proptest! {
    #[test]
    fn discover_is_deterministic(name in ".{0,80}", level in 1..=5u8) {
        let patterns = PatternEngine::new();
        let level = AggregationLevel::from_u8(level).unwrap();
        let first = patterns.discover(&name, level);
        let second = patterns.discover(&name, level);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn retained_segments_grow_with_level(name in word_name()) {
        let patterns = PatternEngine::new();
        let mut previous = 0usize;
        for level in 1..=5u8 {
            let level = AggregationLevel::from_u8(level).unwrap();
            let count = patterns.discover(&name, level).segments.len();
            prop_assert!(
                count >= previous,
                "level {:?} retained {} < {}", level, count, previous
            );
            previous = count;
        }
    }

    #[test]
    fn level_five_never_merges_distinct_names(a in word_name(), b in word_name()) {
        prop_assume!(a != b);
        let patterns = PatternEngine::new();
        let key_a = patterns.discover(&a, AggregationLevel::Exact).group_key;
        let key_b = patterns.discover(&b, AggregationLevel::Exact).group_key;
        prop_assert_ne!(key_a, key_b);
    }

    #[test]
    fn zero_counter_records_have_zero_metrics(name in ".{0,40}") {
        let (patterns, copy) = engines();
        let record = raw_record("a1".to_string(), name, 0);
        let rows = aggregate(&[record], AggregationLevel::Variant, GroupMode::Creative, &patterns, &copy);
        for row in rows {
            for metric in MetricId::ALL {
                prop_assert_eq!(row.metrics.get(metric), 0.0);
            }
        }
    }

    #[test]
    fn impressions_are_conserved_at_every_level(
        names in proptest::collection::vec(word_name(), 0..20),
        level in 1..=5u8,
    ) {
        let (patterns, copy) = engines();
        let records: Vec<PerformanceRecord> = names
            .into_iter()
            .enumerate()
            .map(|(i, name)| raw_record(format!("a{i}"), name, (i as u64 % 7) + 1))
            .collect();
        let input_total: u64 = records.iter().map(|r| r.impressions).sum();

        let rows = aggregate(
            &records,
            AggregationLevel::from_u8(level).unwrap(),
            GroupMode::Creative,
            &patterns,
            &copy,
        );
        let output_total: u64 = rows.iter().map(|r| r.impressions).sum();
        prop_assert_eq!(output_total, input_total);
    }

    #[test]
    fn extracted_copy_is_never_empty_and_fits(name in ".{0,120}") {
        let (patterns, copy) = engines();
        let record = raw_record("a1".to_string(), name, 1);
        let text = copy.extract(&record, &patterns);
        prop_assert!(!text.trim().is_empty());
        prop_assert!(text.lines().count() <= 3);
    }

    #[test]
    fn view_is_idempotent(
        names in proptest::collection::vec(word_name(), 0..12),
        query in "[a-z]{0,4}",
        desc in any::<bool>(),
    ) {
        let (patterns, copy) = engines();
        let records: Vec<PerformanceRecord> = names
            .into_iter()
            .enumerate()
            .map(|(i, name)| raw_record(format!("a{i}"), name, i as u64))
            .collect();
        let rows = aggregate(&records, AggregationLevel::Concept, GroupMode::Creative, &patterns, &copy);

        let options = ViewOptions {
            query,
            sort_key: SortKey::Impressions,
            sort_dir: if desc { SortDir::Desc } else { SortDir::Asc },
        };
        let once = apply_view(rows, &options);
        let twice = apply_view(once.clone(), &options);

        let keys = |rows: &[adlens::engine::AggregateRow]| {
            rows.iter().map(|r| r.group_key.clone()).collect::<Vec<_>>()
        };
        prop_assert_eq!(keys(&once), keys(&twice));
    }
}

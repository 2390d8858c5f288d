use super::*;

fn date(y: i32, m: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, 1).expect("valid date")
}

fn series(topic: &str, values: &[f64]) -> RawTrendSeries {
    RawTrendSeries {
        topic: topic.to_owned(),
        points: values
            .iter()
            .enumerate()
            .map(|(i, v)| SeriesPoint {
                date: date(2024, u32::try_from(i % 12).unwrap() + 1),
                value: *v,
            })
            .collect(),
        ..RawTrendSeries::default()
    }
}

fn provider(name: &str, series: Vec<RawTrendSeries>, related: Vec<RawRelatedTopic>) -> ProviderTrends {
    ProviderTrends {
        provider: name.to_owned(),
        series,
        related,
    }
}

#[test]
fn growth_doubles_to_one_hundred_percent() {
    let s = series("x", &[100.0, 200.0]);
    assert!((growth_rate(&s.points) - 100.0).abs() < f64::EPSILON);
}

#[test]
fn growth_of_single_point_is_zero() {
    assert!(growth_rate(&series("x", &[100.0]).points).abs() < f64::EPSILON);
    assert!(growth_rate(&[]).abs() < f64::EPSILON);
}

#[test]
fn growth_from_zero_start_is_zero() {
    assert!(growth_rate(&series("x", &[0.0, 50.0]).points).abs() < f64::EPSILON);
}

#[test]
fn growth_can_be_negative() {
    let g = growth_rate(&series("x", &[200.0, 150.0, 50.0]).points);
    assert!((g + 75.0).abs() < 1e-9);
}

#[test]
fn december_spike_is_top_peak() {
    let mut values = vec![10.0; 11];
    values.push(100.0);
    let (peaks, lows) = seasonality(&series("x", &values).points);
    assert_eq!(peaks, vec!["Dec", "Jan", "Feb"]);
    assert_eq!(lows, vec!["Mar", "Apr", "May"]);
}

#[test]
fn seasonality_averages_within_month() {
    // Two Januaries (10, 90 → 50) beat a single 40 in February.
    let points = vec![
        SeriesPoint { date: date(2023, 1), value: 10.0 },
        SeriesPoint { date: date(2023, 2), value: 40.0 },
        SeriesPoint { date: date(2024, 1), value: 90.0 },
    ];
    let (peaks, lows) = seasonality(&points);
    assert_eq!(peaks, vec!["Jan", "Feb"]);
    assert!(lows.is_empty());
}

#[test]
fn seasonality_peaks_and_lows_are_disjoint_for_short_series() {
    let (peaks, lows) = seasonality(&series("x", &[5.0, 4.0, 3.0, 2.0]).points);
    assert_eq!(peaks, vec!["Jan", "Feb", "Mar"]);
    assert_eq!(lows, vec!["Apr"]);
    assert!(peaks.iter().all(|p| !lows.contains(p)));
}

#[test]
fn seasonality_of_empty_series_is_empty() {
    let (peaks, lows) = seasonality(&[]);
    assert!(peaks.is_empty());
    assert!(lows.is_empty());
}

#[test]
fn same_topic_growth_is_averaged() {
    let a = provider("a", vec![series("x", &[100.0, 110.0])], vec![]);
    let b = provider("b", vec![series("x", &[100.0, 130.0])], vec![]);
    let merged = aggregate(&["x".to_owned()], &[a, b]);

    assert_eq!(merged.trends.len(), 1);
    assert!((merged.trends[0].growth_pct - 20.0).abs() < 1e-9);
}

#[test]
fn single_provider_topic_passes_through() {
    let a = provider("a", vec![series("x", &[100.0, 150.0])], vec![]);
    let merged = aggregate(&[], &[a, ProviderTrends::empty("b")]);
    assert_eq!(merged.trends.len(), 1);
    assert!((merged.trends[0].growth_pct - 50.0).abs() < 1e-9);
}

#[test]
fn relevance_comes_from_difficulty_and_is_clamped() {
    let mut with_difficulty = series("x", &[1.0, 2.0]);
    with_difficulty.difficulty = Some(62.0);
    let mut too_hard = series("y", &[1.0, 2.0]);
    too_hard.difficulty = Some(140.0);

    let a = provider("a", vec![series("x", &[1.0, 2.0]), series("y", &[1.0, 1.0])], vec![]);
    let b = provider("b", vec![with_difficulty, too_hard], vec![]);
    let merged = aggregate(&[], &[a, b]);

    assert!((merged.trends[0].relevance - 0.62).abs() < 1e-9);
    assert!((merged.trends[1].relevance - 1.0).abs() < f64::EPSILON);
}

#[test]
fn relevance_defaults_to_zero_without_difficulty() {
    let merged = aggregate(&[], &[provider("a", vec![series("x", &[1.0, 2.0])], vec![])]);
    assert!(merged.trends[0].relevance.abs() < f64::EPSILON);
}

#[test]
fn output_preserves_first_seen_order() {
    let a = provider("a", vec![series("b", &[1.0, 2.0]), series("a", &[1.0, 9.0])], vec![]);
    let b = provider("b", vec![series("c", &[1.0, 50.0]), series("b", &[1.0, 2.0])], vec![]);
    let merged = aggregate(&[], &[a, b]);
    let order: Vec<&str> = merged.trends.iter().map(|t| t.topic.as_str()).collect();
    assert_eq!(order, vec!["b", "a", "c"]);
}

#[test]
fn seasonality_is_taken_from_one_provider_only() {
    let mut dec_heavy = vec![10.0; 11];
    dec_heavy.push(100.0);
    let mut jun_heavy = vec![10.0; 12];
    jun_heavy[5] = 100.0;

    let a = provider("a", vec![series("x", &dec_heavy)], vec![]);
    let b = provider("b", vec![series("x", &jun_heavy)], vec![]);
    let merged = aggregate(&[], &[a, b]);
    assert_eq!(merged.trends[0].seasonality_peak_months[0], "Dec");
    assert!(!merged.trends[0].seasonality_peak_months.contains(&"Jun".to_owned()));
}

#[test]
fn provider_without_points_does_not_dilute_growth() {
    let mut metrics_only = RawTrendSeries {
        topic: "x".to_owned(),
        ..RawTrendSeries::default()
    };
    metrics_only.difficulty = Some(40.0);
    metrics_only.search_volume = Some(5_000);

    let a = provider("a", vec![series("x", &[100.0, 140.0])], vec![]);
    let b = provider("b", vec![metrics_only], vec![]);
    let merged = aggregate(&["x".to_owned()], &[a, b]);

    assert!((merged.trends[0].growth_pct - 40.0).abs() < 1e-9);
    assert!((merged.trends[0].relevance - 0.4).abs() < 1e-9);
    assert_eq!(merged.volumes.get("x"), Some(&5_000));
}

#[test]
fn related_topics_merge_by_name() {
    let a = provider(
        "a",
        vec![],
        vec![
            RawRelatedTopic { name: "nitro".to_owned(), correlation: 0.8, search_volume: 0 },
            RawRelatedTopic { name: "decaf".to_owned(), correlation: 0.3, search_volume: 0 },
        ],
    );
    let b = provider(
        "b",
        vec![],
        vec![
            RawRelatedTopic { name: "nitro".to_owned(), correlation: 0.4, search_volume: 9_900 },
            RawRelatedTopic { name: "Nitro".to_owned(), correlation: 1.7, search_volume: 10 },
        ],
    );
    let merged = aggregate(&[], &[a, b]);

    let names: Vec<&str> = merged.related_topics.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["nitro", "decaf", "Nitro"]);
    assert!((merged.related_topics[0].correlation - 0.6).abs() < 1e-9);
    assert_eq!(merged.related_topics[0].search_volume, 9_900);
    assert!((merged.related_topics[2].correlation - 1.0).abs() < f64::EPSILON);
}

#[test]
fn first_non_zero_volume_wins() {
    let a = provider(
        "a",
        vec![],
        vec![RawRelatedTopic { name: "r".to_owned(), correlation: 0.5, search_volume: 300 }],
    );
    let b = provider(
        "b",
        vec![],
        vec![RawRelatedTopic { name: "r".to_owned(), correlation: 0.5, search_volume: 900 }],
    );
    let merged = aggregate(&[], &[a, b]);
    assert_eq!(merged.related_topics[0].search_volume, 300);
}

#[test]
fn demographics_are_unioned_across_providers() {
    let mut a_series = series("x", &[1.0, 2.0]);
    a_series.demographics.locations.insert("US".to_owned());
    let mut b_series = series("x", &[1.0, 2.0]);
    b_series.demographics.locations.insert("DE".to_owned());
    b_series.demographics.age_groups.insert("18-24".to_owned());

    let merged = aggregate(
        &[],
        &[provider("a", vec![a_series], vec![]), provider("b", vec![b_series], vec![])],
    );
    let demographics = &merged.trends[0].demographics;
    assert_eq!(demographics.locations.len(), 2);
    assert!(demographics.age_groups.contains("18-24"));
}

#[test]
fn aggregation_is_deterministic() {
    let build = || {
        let a = provider(
            "a",
            vec![series("x", &[3.0, 1.0, 4.0, 1.0, 5.0]), series("y", &[9.0, 2.0, 6.0])],
            vec![RawRelatedTopic { name: "z".to_owned(), correlation: 0.5, search_volume: 1 }],
        );
        let b = provider("b", vec![series("y", &[5.0, 3.0, 5.0])], vec![]);
        aggregate(&["x".to_owned(), "y".to_owned()], &[a, b])
    };
    let first = serde_json::to_string(&build()).unwrap();
    for _ in 0..20 {
        assert_eq!(serde_json::to_string(&build()).unwrap(), first);
    }
}

#[test]
fn no_providers_yield_empty_trends_with_keywords() {
    let merged = aggregate(&["x".to_owned()], &[]);
    assert_eq!(merged.keywords, vec!["x".to_owned()]);
    assert!(merged.trends.is_empty());
    assert!(merged.related_topics.is_empty());
}

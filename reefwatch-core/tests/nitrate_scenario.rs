use chrono::NaiveDate;
use reefwatch_core::{
    analytics::{alerts::AlertLevel, ParameterAnalytics, TrendDirection},
    health::{calculate_tank_health, HealthStatus},
    history::WaterTestLog,
};
use reefwatch_schemas::parameters::{Parameter, WaterParameters};

fn date(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

fn nitrate_tests() -> Vec<WaterParameters> {
    vec![
        WaterParameters::new("w1", "TANK-01", date("2024-01-01")).with(Parameter::Nitrate, 30.0),
        WaterParameters::new("w2", "TANK-01", date("2024-01-08")).with(Parameter::Nitrate, 20.0),
        WaterParameters::new("w3", "TANK-01", date("2024-01-15")).with(Parameter::Nitrate, 10.0),
    ]
}

#[test]
fn falling_nitrate_is_a_confident_decreasing_trend() {
    let analytics = ParameterAnalytics::new(&nitrate_tests(), date("2024-01-15"));

    let trend = analytics.analyze_trend(Parameter::Nitrate, 3);
    assert_eq!(trend.trend, TrendDirection::Decreasing);
    assert!(trend.confidence > 50.0);
    assert!((trend.change_rate + 10.0).abs() < 1e-9);

    // strong trend: newest value plus slope, not the moving average
    let prediction = analytics.predict_next_value(Parameter::Nitrate);
    assert!(prediction.predicted_value < 10.0);
    assert!((prediction.predicted_value - (10.0 + trend.change_rate)).abs() < 1e-9);
    assert_eq!(prediction.range.0, 0.0);
}

#[test]
fn scenario_survives_a_csv_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let log = WaterTestLog::new(dir.path().join("TANK-01.csv"));
    for test in nitrate_tests() {
        log.append(&test).unwrap();
    }

    let analytics = ParameterAnalytics::new(&log.read_all().unwrap(), date("2024-01-20"));
    let summary = analytics.get_analysis_summary();
    assert_eq!(summary.test_count, 3);
    assert_eq!(summary.trends[&Parameter::Nitrate].trend, TrendDirection::Decreasing);
    assert_eq!(summary.testing_pattern.average_interval_days, 7.0);
    assert_eq!(summary.testing_pattern.next_suggested_test, date("2024-01-22"));
    // fewer than five tests is the only quality issue
    assert_eq!(summary.data_quality.score, 80);
}

#[test]
fn acute_ammonia_spike_is_critical_and_hurts_health() {
    let today = date("2024-02-01");
    let tests = vec![
        WaterParameters::new("a", "TANK-02", date("2024-01-25"))
            .with(Parameter::Ammonia, 0.0)
            .with(Parameter::Ph, 8.2),
        WaterParameters::new("b", "TANK-02", today)
            .with(Parameter::Ammonia, 0.5)
            .with(Parameter::Ph, 8.2),
    ];

    let alerts = ParameterAnalytics::new(&tests, today).check_for_alerts();
    let ammonia = alerts.iter().find(|a| a.parameter == Parameter::Ammonia).unwrap();
    assert_eq!(ammonia.level, AlertLevel::Critical);
    assert!(alerts.iter().all(|a| a.parameter != Parameter::Ph));

    let health = calculate_tank_health(&tests, today);
    assert_eq!(health.factors.time_since_last_issue, 30.0);
    assert_ne!(health.status, HealthStatus::Excellent);
}

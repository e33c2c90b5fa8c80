//! Single 0-100 health score for a tank, built from parameter stability,
//! testing recency and how long ago the water last went out of range.

use crate::analytics::stats;
use chrono::NaiveDate;
use reefwatch_schemas::parameters::{Parameter, WaterParameters};
use serde::Serialize;
use tracing::debug;

const STABILITY_WINDOW: usize = 5;
const ADHERENCE_INTERVALS: usize = 4;
const ISSUE_WINDOW: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Excellent,
    Good,
    Warning,
    Critical,
}

impl HealthStatus {
    pub fn from_score(score: u32) -> Self {
        if score >= 85 {
            HealthStatus::Excellent
        } else if score >= 70 {
            HealthStatus::Good
        } else if score >= 50 {
            HealthStatus::Warning
        } else {
            HealthStatus::Critical
        }
    }

    /// Colour token used by dashboards when rendering the badge.
    pub fn color(self) -> &'static str {
        match self {
            HealthStatus::Excellent => "green",
            HealthStatus::Good => "blue",
            HealthStatus::Warning => "yellow",
            HealthStatus::Critical => "red",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthFactors {
    pub parameter_stability: f64,
    pub maintenance_adherence: f64,
    pub time_since_last_issue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthScore {
    pub score: u32,
    pub status: HealthStatus,
    pub color: &'static str,
    pub factors: HealthFactors,
}

/// Band used for the stability sub-score of one parameter.
struct StabilityBand {
    parameter: Parameter,
    min: f64,
    max: f64,
    ideal: f64,
}

const STABILITY_BANDS: [StabilityBand; 5] = [
    StabilityBand { parameter: Parameter::Ph, min: 7.8, max: 8.5, ideal: 8.2 },
    StabilityBand { parameter: Parameter::Salinity, min: 1.020, max: 1.026, ideal: 1.025 },
    StabilityBand { parameter: Parameter::Temperature, min: 74.0, max: 82.0, ideal: 78.0 },
    StabilityBand { parameter: Parameter::Ammonia, min: 0.0, max: 0.25, ideal: 0.0 },
    StabilityBand { parameter: Parameter::Nitrate, min: 0.0, max: 25.0, ideal: 5.0 },
];

/// Scores a tank from its tests. Input order does not matter.
pub fn calculate_tank_health(records: &[WaterParameters], today: NaiveDate) -> HealthScore {
    let mut sorted: Vec<&WaterParameters> = records.iter().collect();
    sorted.sort_by(|a, b| b.test_date.cmp(&a.test_date));

    let factors = HealthFactors {
        parameter_stability: parameter_stability(&sorted),
        maintenance_adherence: maintenance_adherence(&sorted, today),
        time_since_last_issue: time_since_last_issue(&sorted, today),
    };

    let weighted = 0.4 * factors.parameter_stability
        + 0.3 * factors.maintenance_adherence
        + 0.3 * factors.time_since_last_issue;
    let score = weighted.round().clamp(0.0, 100.0) as u32;
    let status = HealthStatus::from_score(score);
    debug!(score, ?factors, "calculated tank health");

    HealthScore {
        score,
        status,
        color: status.color(),
        factors,
    }
}

fn parameter_stability(sorted: &[&WaterParameters]) -> f64 {
    match sorted.len() {
        0 => return 0.0,
        1 => return 70.0,
        _ => {}
    }

    let window = &sorted[..sorted.len().min(STABILITY_WINDOW)];
    let scores: Vec<f64> = STABILITY_BANDS
        .iter()
        .filter_map(|band| {
            let values: Vec<f64> = window.iter().filter_map(|r| r.value(band.parameter)).collect();
            (!values.is_empty()).then(|| band_score(band, &values))
        })
        .collect();

    if scores.is_empty() {
        return 0.0;
    }
    stats::mean(&scores)
}

fn band_score(band: &StabilityBand, values: &[f64]) -> f64 {
    let max_distance = (band.ideal - band.min).max(band.max - band.ideal);
    let adherence: Vec<f64> = values
        .iter()
        .map(|&v| {
            if v < band.min || v > band.max {
                30.0
            } else if max_distance > 0.0 {
                70.0 + 30.0 * (1.0 - (v - band.ideal).abs() / max_distance)
            } else {
                100.0
            }
        })
        .collect();

    let width = band.max - band.min;
    let penalty = if width > 0.0 {
        (stats::std_dev(values) / width * 100.0).min(20.0)
    } else {
        0.0
    };
    (stats::mean(&adherence) - penalty).max(0.0)
}

fn maintenance_adherence(sorted: &[&WaterParameters], today: NaiveDate) -> f64 {
    let Some(newest) = sorted.first() else {
        return 0.0;
    };

    let days_since = (today - newest.test_date).num_days();
    let base: f64 = if days_since <= 7 {
        100.0
    } else if days_since <= 14 {
        80.0
    } else if days_since <= 21 {
        60.0
    } else if days_since <= 30 {
        40.0
    } else {
        20.0
    };

    let intervals: Vec<f64> = sorted
        .windows(2)
        .take(ADHERENCE_INTERVALS)
        .map(|pair| (pair[0].test_date - pair[1].test_date).num_days() as f64)
        .collect();
    let bonus = if !intervals.is_empty()
        && stats::mean(&intervals) <= 14.0
        && stats::variance(&intervals) < 25.0
    {
        10.0
    } else {
        0.0
    };

    (base + bonus).min(100.0)
}

fn has_issue(record: &WaterParameters) -> bool {
    let outside = |p: Parameter, min: f64, max: f64| record.value(p).is_some_and(|v| v < min || v > max);
    let above = |p: Parameter, max: f64| record.value(p).is_some_and(|v| v > max);

    outside(Parameter::Ph, 7.8, 8.5)
        || outside(Parameter::Salinity, 1.020, 1.026)
        || above(Parameter::Ammonia, 0.25)
        || above(Parameter::Nitrite, 0.1)
        || above(Parameter::Nitrate, 25.0)
        || outside(Parameter::Temperature, 74.0, 82.0)
}

fn time_since_last_issue(sorted: &[&WaterParameters], today: NaiveDate) -> f64 {
    let last_issue = sorted.iter().take(ISSUE_WINDOW).find(|r| has_issue(r));

    let Some(record) = last_issue else {
        return 100.0;
    };
    let days = (today - record.test_date).num_days();
    if days < 7 {
        30.0
    } else if days < 14 {
        60.0
    } else if days < 30 {
        80.0
    } else {
        95.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn ideal_test(day: NaiveDate) -> WaterParameters {
        WaterParameters::new(format!("t-{}", day), "tank-1", day)
            .with(Parameter::Ph, 8.2)
            .with(Parameter::Salinity, 1.025)
            .with(Parameter::Temperature, 78.0)
            .with(Parameter::Ammonia, 0.0)
            .with(Parameter::Nitrate, 5.0)
    }

    #[test]
    fn empty_history_is_critical() {
        let health = calculate_tank_health(&[], date(2024, 3, 1));
        assert_eq!(health.factors.parameter_stability, 0.0);
        assert_eq!(health.factors.maintenance_adherence, 0.0);
        assert_eq!(health.status, HealthStatus::Critical);
        assert_eq!(health.color, "red");
    }

    #[test]
    fn daily_ideal_tests_score_excellent() {
        let today = date(2024, 3, 7);
        let records: Vec<_> = (0..7).map(|i| ideal_test(today - Duration::days(i))).collect();

        let health = calculate_tank_health(&records, today);
        assert!(health.factors.parameter_stability > 99.999);
        assert_eq!(health.factors.maintenance_adherence, 100.0);
        assert_eq!(health.factors.time_since_last_issue, 100.0);
        assert!(health.score >= 85);
        assert_eq!(health.status, HealthStatus::Excellent);
    }

    #[test]
    fn single_test_uses_default_stability() {
        let today = date(2024, 3, 7);
        let health = calculate_tank_health(&[ideal_test(today)], today);
        assert_eq!(health.factors.parameter_stability, 70.0);
        // 0.4 * 70 + 0.3 * 100 + 0.3 * 100
        assert_eq!(health.score, 88);
    }

    #[test]
    fn out_of_band_values_drag_stability_down() {
        let today = date(2024, 3, 7);
        let records: Vec<_> = (0..5)
            .map(|i| ideal_test(today - Duration::days(i * 7)).with(Parameter::Nitrate, 40.0))
            .collect();
        let health = calculate_tank_health(&records, today);
        // four bands at 100, nitrate at 30
        assert!((health.factors.parameter_stability - 86.0).abs() < 1e-6);
    }

    #[test]
    fn adherence_steps_down_with_staleness() {
        let last = date(2024, 3, 1);
        let records = vec![ideal_test(last)];
        let score = |days| calculate_tank_health(&records, last + Duration::days(days)).factors.maintenance_adherence;
        assert_eq!(score(7), 100.0);
        assert_eq!(score(10), 80.0);
        assert_eq!(score(20), 60.0);
        assert_eq!(score(30), 40.0);
        assert_eq!(score(45), 20.0);
    }

    #[test]
    fn regular_testing_earns_a_bonus() {
        let last = date(2024, 3, 1);
        let records: Vec<_> = (0..5).map(|i| ideal_test(last - Duration::days(i * 7))).collect();
        let health = calculate_tank_health(&records, last + Duration::days(10));
        assert_eq!(health.factors.maintenance_adherence, 90.0);
    }

    #[test]
    fn irregular_testing_gets_no_bonus() {
        // gaps 1, 13, 1, 14: mean 7.25 but variance well above 25
        let last = date(2024, 3, 1);
        let records: Vec<_> = [0, 1, 14, 15, 29]
            .into_iter()
            .map(|days| ideal_test(last - Duration::days(days)))
            .collect();
        let health = calculate_tank_health(&records, last + Duration::days(10));
        assert_eq!(health.factors.maintenance_adherence, 80.0);
    }

    #[test]
    fn recent_issue_lowers_the_score() {
        let today = date(2024, 3, 10);
        let records = vec![
            ideal_test(today),
            ideal_test(today - Duration::days(3)).with(Parameter::Ammonia, 0.5),
            ideal_test(today - Duration::days(20)).with(Parameter::Nitrite, 0.3),
        ];
        let health = calculate_tank_health(&records, today);
        assert_eq!(health.factors.time_since_last_issue, 30.0);

        let older = vec![ideal_test(today), ideal_test(today - Duration::days(20)).with(Parameter::Ph, 7.5)];
        assert_eq!(calculate_tank_health(&older, today).factors.time_since_last_issue, 80.0);
    }

    #[test]
    fn status_buckets() {
        assert_eq!(HealthStatus::from_score(85), HealthStatus::Excellent);
        assert_eq!(HealthStatus::from_score(84), HealthStatus::Good);
        assert_eq!(HealthStatus::from_score(70), HealthStatus::Good);
        assert_eq!(HealthStatus::from_score(69), HealthStatus::Warning);
        assert_eq!(HealthStatus::from_score(50), HealthStatus::Warning);
        assert_eq!(HealthStatus::from_score(49), HealthStatus::Critical);
    }
}

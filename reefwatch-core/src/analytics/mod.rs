//! Water-parameter analytics: descriptive statistics, least-squares trends,
//! naive next-value prediction, testing cadence and threshold alerts.
//!
//! Everything here is recomputed from the raw tests on each call. The
//! analyzer owns a copy of the tests sorted newest-first by date, so callers
//! may pass them in any order.

pub mod alerts;
pub mod stats;

use alerts::ParameterAlert;
use chrono::{Duration, NaiveDate};
use reefwatch_schemas::parameters::{Parameter, WaterParameters};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Window used by [`ParameterAnalytics::analyze_trend`] when callers have no preference.
pub const DEFAULT_TREND_PERIODS: usize = 10;

const PREDICTION_TREND_PERIODS: usize = 5;
const MOVING_AVERAGE_POINTS: usize = 3;
const STABLE_SLOPE: f64 = 0.01;
const DEFAULT_TEST_INTERVAL_DAYS: f64 = 7.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stability {
    Stable,
    Fluctuating,
    Volatile,
}

impl Stability {
    fn prediction_factor(self) -> f64 {
        match self {
            Stability::Stable => 0.8,
            Stability::Fluctuating => 0.5,
            Stability::Volatile => 0.3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterStats {
    /// Number of valid readings the statistics were computed from.
    pub count: usize,
    pub average: f64,
    pub min: f64,
    pub max: f64,
    pub std_dev: f64,
    pub stability: Stability,
    pub last_change: f64,
}

impl Default for ParameterStats {
    fn default() -> Self {
        Self {
            count: 0,
            average: 0.0,
            min: 0.0,
            max: 0.0,
            std_dev: 0.0,
            stability: Stability::Stable,
            last_change: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
}

impl TrendDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            TrendDirection::Increasing => "increasing",
            TrendDirection::Decreasing => "decreasing",
            TrendDirection::Stable => "stable",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterTrend {
    pub parameter: Parameter,
    pub trend: TrendDirection,
    /// R² of the fit scaled to 0-100.
    pub confidence: f64,
    /// Slope of the fit, in parameter units per test.
    pub change_rate: f64,
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictedValue {
    pub parameter: Parameter,
    pub predicted_value: f64,
    pub confidence: f64,
    pub range: (f64, f64),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestingPattern {
    pub average_interval_days: f64,
    pub consistency_score: f64,
    pub next_suggested_test: NaiveDate,
    pub days_since_last_test: i64,
    pub is_overdue: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataQuality {
    pub score: u32,
    pub issues: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisSummary {
    pub test_count: usize,
    pub stats: BTreeMap<Parameter, ParameterStats>,
    pub trends: BTreeMap<Parameter, ParameterTrend>,
    pub predictions: BTreeMap<Parameter, PredictedValue>,
    pub testing_pattern: TestingPattern,
    pub alerts: Vec<ParameterAlert>,
    pub data_quality: DataQuality,
}

/// Analyzer over one tank's water-test history.
#[derive(Debug, Clone)]
pub struct ParameterAnalytics {
    records: Vec<WaterParameters>,
    today: NaiveDate,
}

impl ParameterAnalytics {
    /// Builds an analyzer; `today` anchors recency calculations.
    pub fn new(records: &[WaterParameters], today: NaiveDate) -> Self {
        let mut records = records.to_vec();
        records.sort_by(|a, b| b.test_date.cmp(&a.test_date));
        Self { records, today }
    }

    /// Tests, newest first.
    pub fn records(&self) -> &[WaterParameters] {
        &self.records
    }

    fn values(&self, parameter: Parameter) -> Vec<f64> {
        self.records.iter().filter_map(|r| r.value(parameter)).collect()
    }

    pub fn calculate_parameter_stats(&self, parameter: Parameter) -> ParameterStats {
        let values = self.values(parameter);
        if values.is_empty() {
            return ParameterStats::default();
        }

        let average = stats::mean(&values);
        let std_dev = stats::std_dev(&values);
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        let stability = if average == 0.0 {
            if std_dev == 0.0 {
                Stability::Stable
            } else {
                Stability::Volatile
            }
        } else {
            let cv = (std_dev / average).abs() * 100.0;
            if cv < 5.0 {
                Stability::Stable
            } else if cv < 15.0 {
                Stability::Fluctuating
            } else {
                Stability::Volatile
            }
        };

        let last_change = match values.as_slice() {
            [newest, previous, ..] => newest - previous,
            _ => 0.0,
        };

        ParameterStats {
            count: values.len(),
            average,
            min,
            max,
            std_dev,
            stability,
            last_change,
        }
    }

    pub fn analyze_trend(&self, parameter: Parameter, periods: usize) -> ParameterTrend {
        let mut window: Vec<f64> = self
            .records
            .iter()
            .take(periods)
            .filter_map(|r| r.value(parameter))
            .collect();
        window.reverse();

        let fit = match stats::linear_fit(&window) {
            Some(fit) if window.len() >= 3 => fit,
            _ => {
                return ParameterTrend {
                    parameter,
                    trend: TrendDirection::Stable,
                    confidence: 0.0,
                    change_rate: 0.0,
                    recommendation: recommendation(parameter, TrendDirection::Stable),
                }
            }
        };

        let confidence = (fit.r_squared * 100.0).clamp(0.0, 100.0);
        // TODO: scale the stable threshold per parameter; 0.01/test is noise for calcium but real drift for salinity.
        let trend = if fit.slope.abs() < STABLE_SLOPE {
            TrendDirection::Stable
        } else if fit.slope > 0.0 {
            TrendDirection::Increasing
        } else {
            TrendDirection::Decreasing
        };
        debug!(%parameter, points = window.len(), slope = fit.slope, confidence, "fitted trend");

        ParameterTrend {
            parameter,
            trend,
            confidence,
            change_rate: fit.slope,
            recommendation: recommendation(parameter, trend),
        }
    }

    /// Next reading from a confident trend, else the recent moving average.
    /// Readings are never negative, so a steep fall is floored at 0.
    pub fn predict_next_value(&self, parameter: Parameter) -> PredictedValue {
        let trend = self.analyze_trend(parameter, PREDICTION_TREND_PERIODS);
        let stats = self.calculate_parameter_stats(parameter);
        let recent: Vec<f64> = self
            .records
            .iter()
            .filter_map(|r| r.value(parameter))
            .take(MOVING_AVERAGE_POINTS)
            .collect();
        let last_value = recent.first().copied().unwrap_or(0.0);

        let predicted_value = if trend.confidence > 50.0 && trend.change_rate != 0.0 {
            (last_value + trend.change_rate).max(0.0)
        } else if recent.is_empty() {
            last_value
        } else {
            stats::mean(&recent)
        };

        let confidence = (trend.confidence * 0.7 + stats.stability.prediction_factor() * 100.0 * 0.3).min(90.0);
        let spread = 1.5 * stats.std_dev;

        PredictedValue {
            parameter,
            predicted_value,
            confidence,
            range: ((predicted_value - spread).max(0.0), predicted_value + spread),
        }
    }

    pub fn detect_testing_pattern(&self) -> TestingPattern {
        let newest = self.records.first().map(|r| r.test_date);
        let days_since_last_test = newest.map_or(0, |d| (self.today - d).num_days());

        if self.records.len() < 2 {
            let anchor = newest.unwrap_or(self.today);
            return TestingPattern {
                average_interval_days: DEFAULT_TEST_INTERVAL_DAYS,
                consistency_score: 0.0,
                next_suggested_test: anchor + Duration::days(DEFAULT_TEST_INTERVAL_DAYS as i64),
                days_since_last_test,
                is_overdue: false,
            };
        }

        let gaps: Vec<f64> = self
            .records
            .windows(2)
            .map(|pair| (pair[0].test_date - pair[1].test_date).num_days().abs() as f64)
            .collect();
        let average = stats::mean(&gaps);
        let consistency_score = if average > 0.0 {
            (100.0 - stats::std_dev(&gaps) / average * 100.0).max(0.0)
        } else {
            0.0
        };
        let is_overdue = days_since_last_test as f64 > average * 1.2;
        let next_suggested_test = newest.unwrap_or(self.today) + Duration::days(average.round() as i64);

        TestingPattern {
            average_interval_days: average,
            consistency_score,
            next_suggested_test,
            days_since_last_test,
            is_overdue,
        }
    }

    /// Alerts for the newest test only.
    pub fn check_for_alerts(&self) -> Vec<ParameterAlert> {
        let Some(latest) = self.records.first() else {
            return Vec::new();
        };

        Parameter::ALL
            .into_iter()
            .filter_map(|parameter| {
                let value = latest.value(parameter)?;
                let stats = self.calculate_parameter_stats(parameter);
                alerts::classify(parameter, value, (stats.average, stats.std_dev))
            })
            .collect()
    }

    pub fn get_analysis_summary(&self) -> AnalysisSummary {
        let mut stats = BTreeMap::new();
        let mut trends = BTreeMap::new();
        let mut predictions = BTreeMap::new();
        for parameter in Parameter::ALL {
            stats.insert(parameter, self.calculate_parameter_stats(parameter));
            trends.insert(parameter, self.analyze_trend(parameter, DEFAULT_TREND_PERIODS));
            predictions.insert(parameter, self.predict_next_value(parameter));
        }

        let testing_pattern = self.detect_testing_pattern();
        let data_quality = self.data_quality(&testing_pattern);

        AnalysisSummary {
            test_count: self.records.len(),
            stats,
            trends,
            predictions,
            alerts: self.check_for_alerts(),
            testing_pattern,
            data_quality,
        }
    }

    fn data_quality(&self, pattern: &TestingPattern) -> DataQuality {
        let mut score: u32 = 100;
        let mut issues = Vec::new();

        if self.records.len() < 5 {
            score -= 20;
            issues.push(format!(
                "Only {} water test(s) on record; at least 5 are needed for reliable trends.",
                self.records.len()
            ));
        }
        if pattern.consistency_score < 50.0 {
            score -= 15;
            issues.push("Testing schedule is inconsistent.".to_string());
        }
        if pattern.is_overdue {
            score -= 10;
            issues.push(format!(
                "Water test is overdue ({} days since the last test).",
                pattern.days_since_last_test
            ));
        }

        DataQuality { score, issues }
    }
}

fn recommendation(parameter: Parameter, trend: TrendDirection) -> String {
    use TrendDirection::*;
    let advice = match (parameter, trend) {
        (Parameter::Ph, Increasing) => "pH is rising. Check dosing and make sure alkalinity is not overshooting.",
        (Parameter::Ph, Decreasing) => "pH is falling. Improve aeration and check alkalinity and CO2 levels.",
        (Parameter::Ph, Stable) => "pH is holding steady. Keep the current routine.",
        (Parameter::Salinity, Increasing) => "Salinity is creeping up. Check the auto top-off and top off with fresh RO/DI water.",
        (Parameter::Salinity, Decreasing) => "Salinity is dropping. Check for overfilled top-off and mix new water slightly saltier.",
        (Parameter::Salinity, Stable) => "Salinity is stable. Evaporation is being replaced correctly.",
        (Parameter::Nitrate, Increasing) => "Nitrate is accumulating. Increase water changes or reduce feeding.",
        (Parameter::Nitrate, Decreasing) => "Nitrate is falling. Nutrient export is working; keep an eye out for bottoming out.",
        (Parameter::Nitrate, Stable) => "Nitrate is stable. Nutrient export matches the bioload.",
        (Parameter::Ammonia, Increasing) => "Ammonia is rising. Look for dead livestock or decaying food and test again within 24 hours.",
        (Parameter::Ammonia, Decreasing) => "Ammonia is decreasing. The biological filter is catching up.",
        (Parameter::Ammonia, Stable) => "Ammonia is stable.",
        _ => return format!("{} is {}", parameter.label(), trend.as_str()),
    };
    advice.to_string()
}

//! Subcommand handlers. Each loads what it needs from the knowledge base,
//! runs the core calculation and prints either a report or JSON.

use crate::config::KnowledgeBase;
use crate::plotting;
use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use reefwatch_core::{
    analytics::{alerts::AlertLevel, AnalysisSummary, ParameterAnalytics},
    health::{self, HealthScore},
    history::RecentTestCache,
    schedule::{self, MaintenanceSchedule},
    water_change::{WaterChangeBuilder, WaterChangeResult},
};
use reefwatch_schemas::{
    maintenance::MaintenanceEvent,
    parameters::{Parameter, WaterParameters},
};
use serde::Serialize;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Copy)]
pub struct Output {
    pub json: bool,
}

impl Output {
    /// Prints `value` as JSON when requested, otherwise hands it to `report`.
    fn emit<T: Serialize>(self, value: &T, report: impl FnOnce(&T)) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            report(value);
        }
        Ok(())
    }
}

fn load_tests(kb: &KnowledgeBase, tank_id: &str) -> Result<Vec<WaterParameters>> {
    kb.tank(tank_id)?;
    let log = kb.test_log(tank_id);
    log.read_all()
        .with_context(|| format!("Failed to load water tests for tank '{}'", tank_id))
}

pub fn run_analyze(
    kb: &KnowledgeBase,
    tank_id: &str,
    parameter: Option<Parameter>,
    periods: usize,
    today: NaiveDate,
    output: Output,
) -> Result<()> {
    let tests = load_tests(kb, tank_id)?;
    let analytics = ParameterAnalytics::new(&tests, today);

    if let Some(parameter) = parameter {
        let detail = ParameterDetail {
            stats: analytics.calculate_parameter_stats(parameter),
            trend: analytics.analyze_trend(parameter, periods),
            prediction: analytics.predict_next_value(parameter),
        };
        return output.emit(&detail, print_parameter_detail);
    }

    let summary = analytics.get_analysis_summary();
    output.emit(&summary, |s| print_analysis_summary(tank_id, s))
}

#[derive(Serialize)]
struct ParameterDetail {
    stats: reefwatch_core::analytics::ParameterStats,
    trend: reefwatch_core::analytics::ParameterTrend,
    prediction: reefwatch_core::analytics::PredictedValue,
}

fn print_parameter_detail(detail: &ParameterDetail) {
    let parameter = detail.trend.parameter;
    println!("\n--- [{}] ---", parameter.label());
    println!(
        "  Average {:.3} | Min {:.3} | Max {:.3} | Std dev {:.3} | {:?}",
        detail.stats.average, detail.stats.min, detail.stats.max, detail.stats.std_dev, detail.stats.stability
    );
    println!("  Last change: {:+.3} {}", detail.stats.last_change, parameter.unit());
    println!(
        "  Trend: {} ({:.0}% confidence, {:+.3} per test)",
        detail.trend.trend.as_str(),
        detail.trend.confidence,
        detail.trend.change_rate
    );
    println!("  {}", detail.trend.recommendation);
    println!(
        "  Next reading: {:.3} (range {:.3} - {:.3}, {:.0}% confidence)",
        detail.prediction.predicted_value,
        detail.prediction.range.0,
        detail.prediction.range.1,
        detail.prediction.confidence
    );
}

fn print_analysis_summary(tank_id: &str, summary: &AnalysisSummary) {
    println!("\n--- [Analysis Summary: {}] ---", tank_id);
    println!("========================================");
    println!("Tests on record: {}", summary.test_count);
    println!(
        "Data quality: {}/100{}",
        summary.data_quality.score,
        if summary.data_quality.issues.is_empty() { "" } else { ":" }
    );
    for issue in &summary.data_quality.issues {
        println!("  - {}", issue);
    }

    let pattern = &summary.testing_pattern;
    println!(
        "\nTesting every {:.1} days ({:.0}% consistent). Next test: {}{}",
        pattern.average_interval_days,
        pattern.consistency_score,
        pattern.next_suggested_test,
        if pattern.is_overdue { " (OVERDUE)" } else { "" }
    );

    println!("\n{:<16} {:>10} {:>10} {:>12} {:>10}", "Parameter", "Average", "Std dev", "Trend", "Next");
    for parameter in Parameter::ALL {
        let stats = &summary.stats[&parameter];
        if stats.count == 0 {
            continue;
        }
        let trend = &summary.trends[&parameter];
        let prediction = &summary.predictions[&parameter];
        println!(
            "{:<16} {:>10.3} {:>10.3} {:>12} {:>10.3}",
            parameter.label(),
            stats.average,
            stats.std_dev,
            trend.trend.as_str(),
            prediction.predicted_value
        );
    }

    if summary.alerts.is_empty() {
        println!("\nNo alerts. Latest test is within range.");
    } else {
        println!("\nAlerts:");
        for alert in &summary.alerts {
            let tag = match alert.level {
                AlertLevel::Critical => "CRITICAL",
                AlertLevel::Warning => "warning",
            };
            println!("  [{}] {}", tag, alert.message);
        }
    }

    println!("\nRecommendations:");
    for trend in summary.trends.values().filter(|t| t.confidence > 0.0) {
        println!("  - {}", trend.recommendation);
    }
    println!("========================================");
}

pub fn run_health(kb: &KnowledgeBase, tank_id: &str, today: NaiveDate, output: Output) -> Result<()> {
    let tests = load_tests(kb, tank_id)?;
    let score = health::calculate_tank_health(&tests, today);
    output.emit(&score, |s| print_health(tank_id, s))
}

fn print_health(tank_id: &str, health: &HealthScore) {
    println!("\n--- [Tank Health: {}] ---", tank_id);
    println!("  Score: {}/100 ({:?}, {})", health.score, health.status, health.color);
    println!("  - Parameter stability:   {:>5.1}", health.factors.parameter_stability);
    println!("  - Maintenance adherence: {:>5.1}", health.factors.maintenance_adherence);
    println!("  - Time since last issue: {:>5.1}", health.factors.time_since_last_issue);
}

pub fn run_water_change(
    kb: &KnowledgeBase,
    tank_id: &str,
    percent: f64,
    salt_mix_id: Option<&str>,
    output: Output,
) -> Result<()> {
    let tank = kb.tank(tank_id)?;
    let salt_mix_id = match salt_mix_id.or(tank.salt_mix_id.as_deref()) {
        Some(id) => id,
        None => bail!("Tank '{}' has no preferred salt mix; pass --salt-mix", tank_id),
    };
    let salt_mix = kb.salt_mix(salt_mix_id)?;

    let mut cache = RecentTestCache::new();
    cache.extend(load_tests(kb, tank_id)?);
    let Some(latest) = cache.latest(tank_id) else {
        bail!("Tank '{}' has no water tests; log one first", tank_id);
    };

    let result = WaterChangeBuilder::new()
        .with_current_parameters(latest.clone())
        .with_target_parameters(tank.target_parameters.clone())
        .with_salt_mix(salt_mix.clone())
        .with_tank_volume(tank.volume_gallons)
        .with_change_percent(percent)
        .build()?
        .calculate();

    output.emit(&result, |r| print_water_change(tank_id, &salt_mix.salt_mix_name, r))
}

fn print_water_change(tank_id: &str, salt_mix_name: &str, result: &WaterChangeResult) {
    println!("\n--- [Water Change: {}] ---", tank_id);
    println!(
        "  {:.0}% change = {:.1} gal of {} water",
        result.change_percent, result.gallons_changed, salt_mix_name
    );
    println!("\n  {:<16} {:>10} {:>10} {:>10}", "Parameter", "Now", "After", "Change");
    for change in &result.changes {
        println!(
            "  {:<16} {:>10.3} {:>10.3} {:>+10.3}",
            change.parameter.label(),
            change.current,
            change.predicted,
            change.delta
        );
    }
    println!(
        "\n  Salt required: {:.0} g ({:.2} lb) | Estimated cost: ${:.2} USD",
        result.salt_required_grams,
        result.salt_required_grams / 453.592,
        result.estimated_cost_usd
    );
    if result.is_safe() {
        println!("  All parameter swings are within safe limits.");
    } else {
        for warning in &result.warnings {
            println!("  [warning] {}", warning);
        }
    }
}

pub fn run_schedule(kb: &KnowledgeBase, tank_id: &str, today: NaiveDate, output: Output) -> Result<()> {
    let tank = kb.tank(tank_id)?;
    let logged_tests: Vec<MaintenanceEvent> = load_tests(kb, tank_id)?
        .into_iter()
        .map(|t| MaintenanceEvent::WaterTest { date: t.test_date })
        .collect();

    let schedule = schedule::generate_schedule(tank, &logged_tests, today);
    output.emit(&schedule, |s| print_schedule(&tank.tank_name, s))
}

fn print_schedule(tank_name: &str, schedule: &MaintenanceSchedule) {
    println!("\n--- [Maintenance Schedule: {}] ---", tank_name);
    println!("  {:<22} {:>8} {:>12} {:>12}", "Task", "Every", "Last done", "Next due");
    for entry in &schedule.entries {
        let last = entry.last_done.map_or_else(|| "never".to_string(), |d| d.to_string());
        println!(
            "  {:<22} {:>6} d {:>12} {:>12}{}",
            entry.task.to_string(),
            entry.interval_days,
            last,
            entry.next_due,
            if entry.is_overdue { "  <- due" } else { "" }
        );
    }
}

pub fn run_plot(kb: &KnowledgeBase, tank_id: &str, output_dir: &Path) -> Result<()> {
    let tests = load_tests(kb, tank_id)?;
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory: {}", output_dir.display()))?;
    plotting::generate_all_plots(output_dir, tank_id, &tests)
}

pub fn run_log_test(
    kb: &KnowledgeBase,
    tank_id: &str,
    date: NaiveDate,
    readings: &[(Parameter, f64)],
    notes: Option<String>,
) -> Result<()> {
    if readings.is_empty() {
        bail!("No readings given; use --set PARAM=VALUE");
    }
    let log = kb.test_log(tank_id);
    let existing = load_tests(kb, tank_id)?;

    let base_id = format!("{}-{}", tank_id, date.format("%Y%m%d"));
    let same_day = existing.iter().filter(|t| t.id.starts_with(&base_id)).count();
    let id = if same_day == 0 { base_id } else { format!("{}-{}", base_id, same_day + 1) };

    let mut test = readings
        .iter()
        .fold(WaterParameters::new(id, tank_id, date), |t, (p, v)| t.with(*p, *v));
    test.ai_insights = notes;

    log.append(&test)?;
    info!(test = %test.id, path = %log.path().display(), "Recorded water test");

    let mut cache = RecentTestCache::new();
    cache.extend(existing);
    cache.insert(test);

    println!("\n--- [Recent tests: {}] ---", tank_id);
    for recent in cache.recent(tank_id) {
        let values: Vec<String> = recent
            .readings()
            .iter()
            .map(|(p, v)| format!("{}={}", p.key(), v))
            .collect();
        println!("  {}  {}", recent.test_date, values.join(" "));
    }
    Ok(())
}

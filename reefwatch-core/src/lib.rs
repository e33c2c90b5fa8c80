//! Water chemistry engine for saltwater aquariums.
//!
//! - [`analytics`]: statistics, trends, predictions and alerts over a tank's tests.
//! - [`health`]: the weighted 0-100 tank health score.
//! - [`water_change`]: predicted chemistry, salt and cost of a partial water change.
//! - [`schedule`]: maintenance intervals and due dates.
//! - [`history`]: CSV test history and the recent-test cache.

pub mod analytics;
pub mod error;
pub mod health;
pub mod history;
pub mod schedule;
pub mod water_change;

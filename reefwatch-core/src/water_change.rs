//! Predicts what a partial water change does to tank chemistry.
//!
//! New water is mixed from a salt mix to the target salinity, so the
//! predicted value for each parameter is
//! `current + (replacement - current) * fraction_changed`.

use crate::error::ReefwatchError;
use reefwatch_schemas::{
    parameters::{Parameter, ParameterSet, WaterParameters},
    salt_mix::SaltMix,
};
use serde::Serialize;
use tracing::{debug, warn};

/// Highest specific gravity accepted for mixed water.
pub const MAX_SALINITY_SG: f64 = 1.035;

/// Largest swing per parameter that livestock tolerate in one change.
pub fn max_safe_delta(parameter: Parameter) -> Option<f64> {
    match parameter {
        Parameter::Salinity => Some(0.002),
        Parameter::Ph => Some(0.2),
        Parameter::Temperature => Some(2.0),
        Parameter::Kh => Some(1.0),
        Parameter::Calcium => Some(25.0),
        Parameter::Magnesium => Some(100.0),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterChange {
    pub parameter: Parameter,
    pub current: f64,
    pub replacement: f64,
    pub predicted: f64,
    pub delta: f64,
    pub target: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WaterChangeResult {
    pub change_percent: f64,
    pub gallons_changed: f64,
    pub changes: Vec<ParameterChange>,
    pub warnings: Vec<String>,
    pub salt_required_grams: f64,
    pub estimated_cost_usd: f64,
}

impl WaterChangeResult {
    pub fn change_for(&self, parameter: Parameter) -> Option<&ParameterChange> {
        self.changes.iter().find(|c| c.parameter == parameter)
    }

    pub fn is_safe(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// A fluent builder for a [`WaterChangeCalculator`].
#[derive(Default)]
pub struct WaterChangeBuilder {
    current: Option<WaterParameters>,
    target: ParameterSet,
    salt_mix: Option<SaltMix>,
    tank_volume_gallons: f64,
    change_percent: f64,
}

impl WaterChangeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the tank's latest water test.
    pub fn with_current_parameters(mut self, current: WaterParameters) -> Self {
        self.current = Some(current);
        self
    }

    /// Sets the values the new water should be mixed towards.
    pub fn with_target_parameters(mut self, target: ParameterSet) -> Self {
        self.target = target;
        self
    }

    pub fn with_salt_mix(mut self, salt_mix: SaltMix) -> Self {
        self.salt_mix = Some(salt_mix);
        self
    }

    pub fn with_tank_volume(mut self, gallons: f64) -> Self {
        self.tank_volume_gallons = gallons;
        self
    }

    pub fn with_change_percent(mut self, percent: f64) -> Self {
        self.change_percent = percent;
        self
    }

    /// Consumes the builder and returns a validated calculator.
    ///
    /// # Errors
    ///
    /// Returns a `ReefwatchError` if the current test or salt mix is missing,
    /// the volume is not positive, the percentage lies outside (0, 100], or a
    /// salinity is not a specific gravity within (1.000, 1.035].
    pub fn build(self) -> Result<WaterChangeCalculator, ReefwatchError> {
        let current = self.current.ok_or(ReefwatchError::CurrentParametersNotDefined)?;
        let salt_mix = self.salt_mix.ok_or(ReefwatchError::SaltMixNotDefined)?;

        if !self.tank_volume_gallons.is_finite() || self.tank_volume_gallons <= 0.0 {
            return Err(ReefwatchError::InvalidVolume(self.tank_volume_gallons));
        }
        if self.change_percent.is_nan() || self.change_percent <= 0.0 || self.change_percent > 100.0 {
            return Err(ReefwatchError::InvalidChangePercent(self.change_percent));
        }
        if !is_plausible_sg(salt_mix.reference_salinity) {
            return Err(ReefwatchError::InvalidReferenceSalinity(salt_mix.salt_mix_id.clone()));
        }
        if let Some(&target) = self.target.get(&Parameter::Salinity) {
            if !is_plausible_sg(target) {
                return Err(ReefwatchError::InvalidTargetSalinity(target));
            }
        }

        Ok(WaterChangeCalculator {
            current,
            target: self.target,
            salt_mix,
            tank_volume_gallons: self.tank_volume_gallons,
            change_percent: self.change_percent,
        })
    }
}

fn is_plausible_sg(value: f64) -> bool {
    value > 1.0 && value <= MAX_SALINITY_SG
}

pub struct WaterChangeCalculator {
    current: WaterParameters,
    target: ParameterSet,
    salt_mix: SaltMix,
    tank_volume_gallons: f64,
    change_percent: f64,
}

impl WaterChangeCalculator {
    fn target_salinity(&self) -> f64 {
        self.target
            .get(&Parameter::Salinity)
            .copied()
            .unwrap_or(self.salt_mix.reference_salinity)
    }

    /// Dose scale relative to the salt mix's reference salinity.
    fn mix_strength(&self) -> f64 {
        (self.target_salinity() - 1.0) / (self.salt_mix.reference_salinity - 1.0)
    }

    /// Value of `parameter` in freshly mixed replacement water, if known.
    pub fn replacement_value(&self, parameter: Parameter) -> Option<f64> {
        let target = self.target.get(&parameter).copied();
        let mix = self.salt_mix.composition_value(parameter);
        match parameter {
            Parameter::Salinity => Some(self.target_salinity()),
            Parameter::Ph => target.or(mix),
            Parameter::Temperature => target,
            Parameter::Kh | Parameter::Calcium | Parameter::Magnesium => mix.map(|v| v * self.mix_strength()),
            Parameter::Ammonia | Parameter::Nitrite | Parameter::Nitrate | Parameter::Phosphate => {
                Some(mix.unwrap_or(0.0))
            }
        }
    }

    pub fn calculate(&self) -> WaterChangeResult {
        let fraction = self.change_percent / 100.0;
        let gallons_changed = self.tank_volume_gallons * fraction;

        let mut changes = Vec::new();
        let mut warnings = Vec::new();
        for parameter in Parameter::ALL {
            let (Some(current), Some(replacement)) = (self.current.value(parameter), self.replacement_value(parameter))
            else {
                continue;
            };
            let predicted = current + (replacement - current) * fraction;
            let delta = predicted - current;

            if let Some(limit) = max_safe_delta(parameter) {
                if delta.abs() > limit {
                    warn!(%parameter, delta, limit, "water change exceeds safe swing");
                    warnings.push(format!(
                        "{} would shift by {:+.3} {} in one change (safe limit {}). Match the new water more closely or change less water.",
                        parameter.label(),
                        delta,
                        parameter.unit(),
                        limit
                    ));
                }
            }

            changes.push(ParameterChange {
                parameter,
                current,
                replacement,
                predicted,
                delta,
                target: self.target.get(&parameter).copied(),
            });
        }

        let salt_required_grams = gallons_changed * self.salt_mix.grams_per_gallon * self.mix_strength();
        let estimated_cost_usd = if self.salt_mix.bag_size_grams > 0.0 {
            salt_required_grams / self.salt_mix.bag_size_grams * self.salt_mix.bag_price_usd
        } else {
            0.0
        };
        debug!(gallons_changed, salt_required_grams, estimated_cost_usd, "planned water change");

        WaterChangeResult {
            change_percent: self.change_percent,
            gallons_changed,
            changes,
            warnings,
            salt_required_grams,
            estimated_cost_usd,
        }
    }
}

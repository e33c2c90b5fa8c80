use crate::parameters::{Parameter, ParameterSet};
use serde::{Deserialize, Serialize};

/// A synthetic sea salt product and what it yields when mixed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaltMix {
    pub salt_mix_id: String,
    pub salt_mix_name: String,
    pub manufacturer: Option<String>,
    /// Specific gravity the composition and dose refer to.
    pub reference_salinity: f64,
    /// Parameter values of freshly mixed water at `reference_salinity`.
    pub composition: ParameterSet,
    pub grams_per_gallon: f64,
    pub bag_size_grams: f64,
    pub bag_price_usd: f64,
}

impl SaltMix {
    pub fn composition_value(&self, parameter: Parameter) -> Option<f64> {
        self.composition.get(&parameter).copied()
    }
}

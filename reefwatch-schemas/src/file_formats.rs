use crate::{salt_mix::SaltMix, tank::Tank};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct TankFile {
    pub schema_version: String,
    pub tanks: Vec<Tank>,
}

#[derive(Debug, Deserialize)]
pub struct SaltMixFile {
    pub schema_version: String,
    pub salt_mixes: Vec<SaltMix>,
}

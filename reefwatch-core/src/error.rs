use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReefwatchError {
    #[error("Tank '{0}' not found")]
    TankNotFound(String),

    #[error("Salt mix '{0}' not found")]
    SaltMixNotFound(String),

    #[error("Current water parameters are missing")]
    CurrentParametersNotDefined,

    #[error("Salt mix is missing")]
    SaltMixNotDefined,

    #[error("Tank volume must be positive, got {0} gallons")]
    InvalidVolume(f64),

    #[error("Water change percentage must be within (0, 100], got {0}")]
    InvalidChangePercent(f64),

    #[error("Salt mix '{0}' has a reference salinity outside (1.000, 1.035]")]
    InvalidReferenceSalinity(String),

    #[error("Target salinity must be a specific gravity within (1.000, 1.035], got {0}")]
    InvalidTargetSalinity(f64),

    #[error("I/O error for file '{0}': {1}")]
    FileIO(String, #[source] std::io::Error),

    #[error("Failed to process CSV file '{0}': {1}")]
    CsvError(String, #[source] csv::Error),
}

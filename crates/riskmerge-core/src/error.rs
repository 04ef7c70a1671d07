use thiserror::Error;

/// Invalid run configuration. Fatal to a run, raised before any comparison work.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("similarity threshold {0} is outside [0, 1]")]
    ThresholdOutOfRange(f64),

    #[error("{field} must be a finite non-negative number, got {value}")]
    InvalidWeight { field: &'static str, value: f64 },

    #[error("all similarity weights are zero; scoring is undefined")]
    ZeroWeights,

    #[error("config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("config render error: {0}")]
    TomlRender(#[from] toml::ser::Error),
}

use thiserror::Error;

use crate::config::EngineMode;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MedianError {
    #[error("The median of an empty structure is undefined")]
    EmptyStructure,
    #[error("Median engine invariant violated: {0}")]
    InvariantViolation(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("The window width must be greater than zero")]
    ZeroWidth,
    #[error("The `{0}` mode requires a window width")]
    MissingWidth(EngineMode),
    #[error("Unable to read the engine configuration `{0}`")]
    Env(#[from] envy::Error),
}

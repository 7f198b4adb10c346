use burn::config::ConfigError;
use burn::record::RecorderError;
use rand::distributions::WeightedError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum A2cError {
    #[error("invalid action distribution: {0}")]
    Distribution(#[from] WeightedError),

    #[error("action {action} is outside the action space of size {act_dim}")]
    ActionOutOfRange { action: usize, act_dim: usize },

    #[error("failed to record model parameters: {0}")]
    Record(#[from] RecorderError),

    #[error("invalid configuration file: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

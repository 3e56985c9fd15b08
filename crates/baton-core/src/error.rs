use baton_model::ConfigError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("invalid runner config: {0}")]
    Config(#[from] ConfigError),
    #[error("runner has already been started")]
    AlreadyStarted,
}

use thiserror::Error;

/// Startup configuration failures. Any of these is fatal: the binary refuses
/// to run a command until the environment is fixed.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} not set; add it to your environment or .env file ({needed_by})")]
    MissingCredential { key: String, needed_by: String },

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: String, reason: String },
}

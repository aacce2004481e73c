pub mod config;
pub mod error;
pub mod retry;

pub use config::Config;
pub use error::ConfigError;
pub use retry::RetryPolicy;

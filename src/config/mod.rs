//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → PORT environment override
//!     → validation.rs (semantic checks)
//!     → ServerConfig (validated, immutable)
//!     → handed to WebhookServer::new
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{apply_env_overrides, load_config, ConfigError};
pub use schema::{
    LimitsConfig, ListenerConfig, LogFormat, LoggingConfig, ObservabilityConfig, ServerConfig,
    ShutdownConfig, TimeoutConfig, TlsConfig,
};
pub use validation::{parse_bind_address, validate_config, ValidationError};

//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → RouterConfig (validated, immutable)
//!     → shared by value/Arc with every subsystem
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the set of services is fixed at startup
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - A load failure at startup is the only fatal error in the process

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    DiscoveryConfig, DiscoveryKind, HealthCheckConfig, ListenerConfig, LogFormat,
    ObservabilityConfig, ReconcileMode, RegistryConfig, RegistryKind, RouterConfig,
    ServiceConfig, StaticCandidate,
};
pub use validation::ValidationError;

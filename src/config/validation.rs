//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (static candidates reference configured selectors)
//! - Validate value ranges (interval, timeout, concurrency > 0, ports valid)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RouterConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;
use thiserror::Error;
use crate::config::schema::{DiscoveryKind, RouterConfig};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("at least one service must be configured")]
    NoServices,

    #[error("service #{0} has an empty name")]
    EmptyServiceName(usize),

    #[error("service `{0}` is configured more than once")]
    DuplicateService(String),

    #[error("service `{0}` has an empty selector")]
    EmptySelector(String),

    #[error("service `{0}` has port 0")]
    InvalidPort(String),

    #[error("health_check.{0} must be greater than zero")]
    ZeroValue(&'static str),

    #[error("health_check.timeout_secs ({timeout}) must not exceed interval_secs ({interval})")]
    TimeoutExceedsInterval { timeout: u64, interval: u64 },

    #[error("health_check.ready_phases must not be empty")]
    NoReadyPhases,

    #[error("{field} `{value}` is not a valid socket address")]
    InvalidAddress { field: &'static str, value: String },

    #[error("static candidates for selector `{0}` match no configured service")]
    UnknownSelector(String),
}

/// Validate a parsed configuration.
pub fn validate_config(config: &RouterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.services.is_empty() {
        errors.push(ValidationError::NoServices);
    }

    let mut names = HashSet::new();
    for (i, service) in config.services.iter().enumerate() {
        if service.name.trim().is_empty() {
            errors.push(ValidationError::EmptyServiceName(i));
        } else if !names.insert(service.name.as_str()) {
            errors.push(ValidationError::DuplicateService(service.name.clone()));
        }
        if service.selector.trim().is_empty() {
            errors.push(ValidationError::EmptySelector(service.name.clone()));
        }
        if service.port == 0 {
            errors.push(ValidationError::InvalidPort(service.name.clone()));
        }
    }

    let hc = &config.health_check;
    if hc.interval_secs == 0 {
        errors.push(ValidationError::ZeroValue("interval_secs"));
    }
    if hc.timeout_secs == 0 {
        errors.push(ValidationError::ZeroValue("timeout_secs"));
    }
    if hc.concurrency == 0 {
        errors.push(ValidationError::ZeroValue("concurrency"));
    }
    if hc.interval_secs > 0 && hc.timeout_secs > hc.interval_secs {
        errors.push(ValidationError::TimeoutExceedsInterval {
            timeout: hc.timeout_secs,
            interval: hc.interval_secs,
        });
    }
    if hc.ready_phases.is_empty() {
        errors.push(ValidationError::NoReadyPhases);
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if config.discovery.kind == DiscoveryKind::Static {
        let selectors: HashSet<&str> = config.services.iter().map(|s| s.selector.as_str()).collect();
        let mut unknown: Vec<&String> = config
            .discovery
            .candidates
            .keys()
            .filter(|k| !selectors.contains(k.as_str()))
            .collect();
        unknown.sort();
        for selector in unknown {
            errors.push(ValidationError::UnknownSelector(selector.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, limits > 0, addresses parse)
//! - Check naming rules that discovery relies on
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ApiConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use tracing_subscriber::filter::LevelFilter;

use crate::config::schema::ApiConfig;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("discovery.extension must not be empty")]
    EmptyExtension,

    #[error("discovery.extension must not start with '.': {0}")]
    DottedExtension(String),

    #[error("discovery.index_name must be a plain file stem: {0:?}")]
    InvalidIndexName(String),

    #[error("listener.bind_address is not a socket address: {0}")]
    InvalidBindAddress(String),

    #[error("listener.mount_path must start with '/' and not end with '/': {0}")]
    InvalidMountPath(String),

    #[error("static_page.file must be a relative path: {0}")]
    AbsoluteStaticPage(String),

    #[error("observability.log_level is not a log level: {0}")]
    InvalidLogLevel(String),

    #[error("limits.max_body_bytes must be greater than 0")]
    ZeroBodyLimit,

    #[error("limits.request_timeout_secs must be greater than 0")]
    ZeroTimeout,
}

/// Checks every semantic rule and returns all violations.
pub fn validate_config(config: &ApiConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let discovery = &config.discovery;
    if discovery.extension.is_empty() {
        errors.push(ValidationError::EmptyExtension);
    } else if discovery.extension.starts_with('.') {
        errors.push(ValidationError::DottedExtension(discovery.extension.clone()));
    }

    let index = &discovery.index_name;
    if index.is_empty() || index.contains('/') || index.contains('.') {
        errors.push(ValidationError::InvalidIndexName(index.clone()));
    }

    let listener = &config.listener;
    if listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(listener.bind_address.clone()));
    }
    let mount = &listener.mount_path;
    if !mount.starts_with('/') || (mount.len() > 1 && mount.ends_with('/')) {
        errors.push(ValidationError::InvalidMountPath(mount.clone()));
    }

    if config.static_page.file.is_absolute() {
        errors.push(ValidationError::AbsoluteStaticPage(
            config.static_page.file.display().to_string(),
        ));
    }

    if config.limits.max_body_bytes == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }
    if config.limits.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    if config
        .observability
        .log_level
        .parse::<LevelFilter>()
        .is_err()
    {
        errors.push(ValidationError::InvalidLogLevel(config.observability.log_level.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert_eq!(validate_config(&ApiConfig::default()), Ok(()));
    }

    #[test]
    fn test_every_problem_is_reported() {
        let mut config = ApiConfig::default();
        config.discovery.extension = ".rs".to_string();
        config.discovery.index_name = "index.rs".to_string();
        config.listener.bind_address = "localhost".to_string();
        config.listener.mount_path = "api/".to_string();
        config.limits.request_timeout_secs = 0;
        config.observability.log_level = "loud".to_string();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::DottedExtension(".rs".to_string()),
                ValidationError::InvalidIndexName("index.rs".to_string()),
                ValidationError::InvalidBindAddress("localhost".to_string()),
                ValidationError::InvalidMountPath("api/".to_string()),
                ValidationError::ZeroTimeout,
                ValidationError::InvalidLogLevel("loud".to_string()),
            ]
        );
    }

    #[test]
    fn test_root_mount_is_valid() {
        let mut config = ApiConfig::default();
        config.listener.mount_path = "/".to_string();
        assert_eq!(validate_config(&config), Ok(()));
    }
}

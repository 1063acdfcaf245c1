//! Configuration for the HTTP binding.
//!
//! [`BindingConfig`] decides which converters a
//! [`RequestExtractor`](crate::RequestExtractor) is assembled from and how
//! much body it is willing to buffer. It is cheap to clone and deserialises
//! from any serde format, so services can embed it in their own settings.
//!
//! # Quick Start
//!
//! ```rust
//! use binding::BindingConfig;
//!
//! let config = BindingConfig::default();
//! config.validate().expect("default configuration is valid");
//! ```
//!
//! # Strict Configuration
//!
//! ```rust
//! use binding::BindingConfig;
//!
//! let config = BindingConfig {
//!     structured_media_types: vec![
//!         "application/cloudevents+json".to_string(),
//!         "application/vnd.acme.event+json".to_string(),
//!     ],
//!     binary_fallback: false,
//!     max_body_bytes: Some(256 * 1024),
//!     ..Default::default()
//! };
//!
//! if let Err(e) = config.validate() {
//!     eprintln!("Configuration error: {}", e);
//! }
//! ```
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::wire::{essence, STRUCTURED_JSON};

/// Runtime configuration for request extraction.
///
/// ```json
/// {
///   "version": 1,
///   "structured_media_types": ["application/cloudevents+json"],
///   "binary_fallback": true,
///   "max_body_bytes": 1048576
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BindingConfig {
    /// Version of the configuration layout.
    ///
    /// Default: `1`
    pub version: u32,

    /// Media types decoded as a whole JSON event.
    ///
    /// Each entry must be a bare `type/subtype` without parameters; requests
    /// are matched after their parameters are stripped.
    ///
    /// Default: `["application/cloudevents+json"]`
    pub structured_media_types: Vec<String>,

    /// Register the binary converter after the structured one.
    ///
    /// The binary converter accepts every media type, so it must come last.
    /// With this disabled, requests that are not structured fail with
    /// [`CodecError::ContentTypeNotSupported`](crate::CodecError::ContentTypeNotSupported).
    ///
    /// Default: `true`
    pub binary_fallback: bool,

    /// Maximum body size the converters buffer.
    ///
    /// Larger bodies fail with
    /// [`CodecError::PayloadTooLarge`](crate::CodecError::PayloadTooLarge).
    ///
    /// Default: `None` (unlimited)
    pub max_body_bytes: Option<usize>,
}

impl Default for BindingConfig {
    fn default() -> Self {
        Self {
            version: 1,
            structured_media_types: vec![STRUCTURED_JSON.to_string()],
            binary_fallback: true,
            max_body_bytes: None,
        }
    }
}

/// Errors raised when validating a [`BindingConfig`].
///
/// These surface at start-up, before any request is handled.
///
/// ```rust
/// use binding::{BindingConfig, ConfigError};
///
/// let config = BindingConfig {
///     max_body_bytes: Some(0),
///     ..Default::default()
/// };
/// assert_eq!(config.validate(), Err(ConfigError::ZeroBodyLimit));
/// ```
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    /// No structured media type is configured.
    #[error("at least one structured media type is required")]
    EmptyStructuredMediaTypes,

    /// An entry is not a bare `type/subtype` media type.
    #[error("invalid structured media type {0:?}")]
    InvalidMediaType(String),

    /// A body limit of zero would reject every event with a payload.
    #[error("max_body_bytes must be greater than zero")]
    ZeroBodyLimit,
}

impl BindingConfig {
    /// Checks the configuration for internal consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.structured_media_types.is_empty() {
            return Err(ConfigError::EmptyStructuredMediaTypes);
        }
        for media_type in &self.structured_media_types {
            match essence(media_type) {
                Ok(bare) if bare == *media_type => {}
                _ => return Err(ConfigError::InvalidMediaType(media_type.clone())),
            }
        }
        if self.max_body_bytes == Some(0) {
            return Err(ConfigError::ZeroBodyLimit);
        }
        Ok(())
    }
}

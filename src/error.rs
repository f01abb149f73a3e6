//! Error types for column profiling

use thiserror::Error;

/// Errors that can occur while configuring, merging or decoding profiles
///
/// Crossing a cap is not an error; it is recorded in the profile state
/// (see [`crate::Exactness`]).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProfileError {
    /// A capacity or format setting is unusable
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Two summaries were built under different settings or value domains
    #[error("Cannot merge summaries with different {setting}: {left} vs {right}")]
    IncompatibleMerge {
        setting: &'static str,
        left: String,
        right: String,
    },

    /// Two shape models with different shape keys were combined
    #[error("Cannot combine shape {left} with shape {right}")]
    ShapeMismatch { left: String, right: String },

    /// A generated pattern failed to compile
    #[error("Pattern error: {0}")]
    Pattern(String),

    /// Snapshot encoding or decoding failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Snapshot was written by an incompatible version
    #[error("Unsupported snapshot version {found} (expected {expected})")]
    SnapshotVersion { expected: u32, found: u32 },
}

/// Result alias used throughout the crate
pub type ProfileResult<T> = Result<T, ProfileError>;

impl From<serde_json::Error> for ProfileError {
    fn from(e: serde_json::Error) -> Self {
        ProfileError::Serialization(e.to_string())
    }
}

impl From<serde_yaml::Error> for ProfileError {
    fn from(e: serde_yaml::Error) -> Self {
        ProfileError::Serialization(e.to_string())
    }
}

impl From<regex::Error> for ProfileError {
    fn from(e: regex::Error) -> Self {
        ProfileError::Pattern(e.to_string())
    }
}

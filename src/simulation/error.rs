//! Error types for the spatial index, the environment and its collaborators.

use thiserror::Error;

use super::object::{ObjectId, ObjectKind};

/// Errors reported by spatial index implementations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SpatialError {
    /// The position lies outside the indexed extent (or is not a number).
    #[error("position ({x}, {y}) lies outside the indexed extent")]
    OutOfBounds {
        /// Horizontal coordinate of the rejected position.
        x: f32,
        /// Vertical coordinate of the rejected position.
        y: f32,
    },
    /// The key is not (or no longer) registered in the index.
    #[error("object is not registered in the spatial index")]
    StaleReference,
    /// The key is already registered in the index.
    #[error("object is already registered in the spatial index")]
    DuplicateKey,
    /// Internal bookkeeping disagrees with the stored objects.
    #[error("spatial index is inconsistent: {0}")]
    Inconsistent(String),
}

/// Errors reported by [`super::environment::Environment`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EnvironmentError {
    /// The underlying spatial index rejected the operation.
    #[error(transparent)]
    Spatial(#[from] SpatialError),
    /// The handle does not refer to a live object.
    #[error("object {0:?} does not exist in the environment")]
    UnknownObject(ObjectId),
    /// The handle refers to an object of another kind.
    #[error("object {id:?} is not a {expected:?}")]
    WrongKind {
        /// The offending handle.
        id: ObjectId,
        /// The kind the caller asked for.
        expected: ObjectKind,
    },
    /// Food must carry a strictly positive energy value.
    #[error("food energy must be positive, got {0}")]
    InvalidFoodEnergy(f32),
    /// A parameter other than the extent cannot be used.
    #[error("{0}")]
    InvalidParams(String),
    /// The environment extent must be strictly positive.
    #[error("invalid environment dimensions {width}x{height}")]
    InvalidDimensions {
        /// Requested width.
        width: f32,
        /// Requested height.
        height: f32,
    },
}

/// Errors reported when decoding genes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenesError {
    /// DNA must have exactly [`super::genes::DNA_LEN`] bytes.
    #[error("DNA must be {expected} bytes long, got {0}", expected = super::genes::DNA_LEN)]
    InvalidLength(usize),
}

/// Errors reported when loading or validating [`super::params::Params`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading or writing the parameter file failed.
    #[error("failed to access parameter file: {0}")]
    Io(#[from] std::io::Error),
    /// The parameter file is not valid JSON for [`super::params::Params`].
    #[error("failed to parse parameters: {0}")]
    Json(#[from] serde_json::Error),
    /// A parameter value cannot be used.
    #[error("invalid parameter: {0}")]
    Invalid(&'static str),
}

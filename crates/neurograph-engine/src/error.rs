// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for graph construction, execution and persistence

use neurograph_bundle::BundleError;
use neurograph_structures::{BasicType, StructuresError};
use thiserror::Error;

use crate::network::NetworkState;

/// Errors raised by the factory, regions and networks
#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("Unknown region type: {0}")]
    UnknownRegionType(String),

    #[error("Region type already registered: {0}")]
    DuplicateRegionType(String),

    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("Missing parameter: {0}")]
    MissingParameter(String),

    #[error("Parameter type mismatch for '{name}': expected {expected}, got {actual}")]
    ParameterTypeMismatch {
        name: String,
        expected: String,
        actual: String,
    },

    #[error("Parameter '{name}' of region '{region}' is not writable")]
    ParameterNotWritable { region: String, name: String },

    #[error("Region already exists: {0}")]
    DuplicateRegion(String),

    #[error("Unknown region: {0}")]
    UnknownRegion(String),

    #[error("Region '{region}' has no output '{output}'")]
    UnknownOutput { region: String, output: String },

    #[error("Region '{region}' has no input '{input}'")]
    UnknownInput { region: String, input: String },

    #[error("Duplicate link: {0}")]
    DuplicateLink(String),

    #[error("Missing link: {0}")]
    MissingLink(String),

    #[error("Type mismatch on link {link}: source is {source_type}, destination is {dest_type}")]
    TypeMismatchOnLink {
        link: String,
        source_type: BasicType,
        dest_type: BasicType,
    },

    #[error("Illegal topology change while network is {0}")]
    IllegalTopologyChange(NetworkState),

    #[error("Cyclic graph: no execution order exists for regions {0:?}")]
    CyclicGraph(Vec<String>),

    #[error("Required input '{input}' of region '{region}' is not connected")]
    MissingRequiredInput { region: String, input: String },

    #[error("Element count mismatch on {endpoint}: expected {expected}, got {actual}")]
    ElementCountMismatch {
        endpoint: String,
        expected: usize,
        actual: usize,
    },

    #[error("Cannot determine element count of output {0}")]
    UnresolvedElementCount(String),

    #[error("Cannot resize {endpoint} from {current} to {requested} elements while links are attached")]
    BufferResize {
        endpoint: String,
        current: usize,
        requested: usize,
    },

    #[error("Invalid reindex on link {link}: {reason}")]
    InvalidReindex { link: String, reason: String },

    #[error("Invalid spec for region type {region_type}: {reason}")]
    InvalidSpec { region_type: String, reason: String },

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Implementation error: {0}")]
    Implementation(String),

    #[error("Region '{region}' failed at cycle {cycle}: {source}")]
    RegionComputeFailure {
        region: String,
        cycle: u64,
        source: Box<NetworkError>,
    },

    #[error(transparent)]
    Structures(StructuresError),

    #[error(transparent)]
    Bundle(#[from] BundleError),
}

/// Result type for engine operations
pub type NetworkResult<T> = Result<T, NetworkError>;

impl From<StructuresError> for NetworkError {
    fn from(err: StructuresError) -> Self {
        match err {
            StructuresError::MissingParameter(name) => NetworkError::MissingParameter(name),
            StructuresError::ParameterTypeMismatch { name, expected } => {
                NetworkError::ParameterTypeMismatch {
                    name,
                    expected,
                    actual: "an incompatible value".to_string(),
                }
            }
            other => NetworkError::Structures(other),
        }
    }
}

// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Neurograph Bundle
//!
//! Persisted state of a complete network: topology, per-region implementation
//! state and output buffers, and the in-flight contents of delayed links.
//!
//! ## Design Goals
//! - **Fast**: bincode payload
//! - **Compact**: optional LZ4 compression
//! - **Safe**: magic, format version and checksum are verified on load
//!
//! ## Usage
//! ```
//! use neurograph_bundle::{Bundle, RegionRecord, TopologyRecord};
//! use neurograph_structures::ParameterMap;
//!
//! let mut bundle = Bundle::new();
//! bundle.write_topology(TopologyRecord::default());
//! bundle
//!     .write_region("a", RegionRecord::new("Gen", ParameterMap::new(), vec![1, 2, 3]))
//!     .unwrap();
//!
//! let bytes = bundle.to_bytes(false).unwrap();
//! let restored = Bundle::from_bytes(&bytes).unwrap();
//! assert_eq!(restored.read_region("a").unwrap().state, vec![1, 2, 3]);
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

use thiserror::Error;

mod bundle;
mod format;
mod records;

pub use bundle::Bundle;
pub use format::{FORMAT_VERSION, MAGIC};
pub use records::*;

/// Bundle I/O errors
#[derive(Error, Debug)]
pub enum BundleError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Version mismatch: file version {file_version}, expected {expected_version}")]
    VersionMismatch {
        file_version: u32,
        expected_version: u32,
    },

    #[error("Invalid magic number: expected NGRPH, got {0:?}")]
    InvalidMagic([u8; 5]),

    #[error("Checksum mismatch: bundle may be corrupted")]
    ChecksumMismatch,

    #[error("Compression error: {0}")]
    Compression(String),

    #[error("Bundle has no topology record")]
    MissingTopology,

    #[error("Bundle has no record for region '{0}'")]
    MissingRegion(String),

    #[error("Bundle already holds a record for region '{0}'")]
    DuplicateRegion(String),
}

pub type Result<T> = std::result::Result<T, BundleError>;

// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use ahash::AHashMap;
use neurograph_structures::{Array, ParameterMap, ReindexRule};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Saved state of one region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionRecord {
    /// Region type name used to find the implementation on load
    pub type_name: String,

    /// Normalised parameter snapshot the region was created with
    pub parameters: ParameterMap,

    /// Opaque implementation state
    pub state: Vec<u8>,

    /// Output buffers at save time, by output name
    pub outputs: BTreeMap<String, Array>,

    /// Whether the implementation had been initialised when saved
    pub initialized: bool,
}

impl RegionRecord {
    pub fn new(type_name: impl Into<String>, parameters: ParameterMap, state: Vec<u8>) -> Self {
        Self {
            type_name: type_name.into(),
            parameters,
            state,
            outputs: BTreeMap::new(),
            initialized: false,
        }
    }
}

/// Saved link descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkRecord {
    pub src_region: String,
    pub src_output: String,
    pub dest_region: String,
    pub dest_input: String,
    pub reindex: Option<ReindexRule>,
    pub delay: u32,

    /// Buffered snapshots of a delayed link, oldest first.
    /// Empty for delay 0 or when the network was never initialised.
    pub pending: Vec<Array>,
}

/// Region name and type, in network insertion order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionEntry {
    pub name: String,
    pub type_name: String,
}

/// Graph structure of a saved network
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopologyRecord {
    pub regions: Vec<RegionEntry>,

    /// Links in registration order
    pub links: Vec<LinkRecord>,

    /// Iteration counter at save time
    pub iteration: u64,
}

/// Bundle metadata (for tracking and debugging)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleMetadata {
    /// When this bundle was created, seconds since the Unix epoch
    pub timestamp: u64,

    /// Human-readable description
    pub description: String,

    /// Source (e.g., "checkpoint: iteration 1200")
    pub source: String,

    /// Custom tags for organization
    pub tags: AHashMap<String, String>,
}

impl Default for BundleMetadata {
    fn default() -> Self {
        Self {
            timestamp: std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or_default(),
            description: String::new(),
            source: String::from("unknown"),
            tags: AHashMap::new(),
        }
    }
}

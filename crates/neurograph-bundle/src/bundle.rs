// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::format::{self, FORMAT_VERSION};
use crate::records::{BundleMetadata, RegionRecord, TopologyRecord};
use crate::{BundleError, Result};

/// In-memory bundle.
///
/// Writers record the topology first and then one record per region; readers
/// fetch the topology, then each region by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bundle {
    /// Format version (for backward compatibility)
    pub version: u32,

    pub metadata: BundleMetadata,

    topology: Option<TopologyRecord>,

    regions: BTreeMap<String, RegionRecord>,
}

impl Default for Bundle {
    fn default() -> Self {
        Self::new()
    }
}

impl Bundle {
    pub fn new() -> Self {
        Self {
            version: FORMAT_VERSION,
            metadata: BundleMetadata::default(),
            topology: None,
            regions: BTreeMap::new(),
        }
    }

    pub fn with_metadata(metadata: BundleMetadata) -> Self {
        Self {
            metadata,
            ..Self::new()
        }
    }

    /// Record the network topology, replacing any previous one
    pub fn write_topology(&mut self, topology: TopologyRecord) {
        self.topology = Some(topology);
    }

    pub fn topology(&self) -> Result<&TopologyRecord> {
        self.topology.as_ref().ok_or(BundleError::MissingTopology)
    }

    /// Record the state of one region; each name may be written once
    pub fn write_region(&mut self, name: impl Into<String>, record: RegionRecord) -> Result<()> {
        let name = name.into();
        if self.regions.contains_key(&name) {
            return Err(BundleError::DuplicateRegion(name));
        }
        self.regions.insert(name, record);
        Ok(())
    }

    pub fn read_region(&self, name: &str) -> Result<&RegionRecord> {
        self.regions
            .get(name)
            .ok_or_else(|| BundleError::MissingRegion(name.to_string()))
    }

    pub fn region_names(&self) -> impl Iterator<Item = &str> {
        self.regions.keys().map(String::as_str)
    }

    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    /// Encode into the binary file format.
    ///
    /// `compress` is honoured only when the `compression` feature is enabled.
    pub fn to_bytes(&self, compress: bool) -> Result<Vec<u8>> {
        let payload =
            bincode::serialize(self).map_err(|e| BundleError::Serialization(e.to_string()))?;
        format::encode(payload, compress)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Bundle> {
        let payload = format::decode(bytes)?;
        bincode::deserialize(&payload).map_err(|e| BundleError::Deserialization(e.to_string()))
    }

    /// Write the bundle to `path`
    pub fn save<P: AsRef<Path>>(&self, path: P, compress: bool) -> Result<()> {
        let bytes = self.to_bytes(compress)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Bundle> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neurograph_structures::ParameterMap;

    #[test]
    fn test_missing_topology() {
        let bundle = Bundle::new();
        assert!(matches!(bundle.topology(), Err(BundleError::MissingTopology)));
    }

    #[test]
    fn test_region_written_once() {
        let mut bundle = Bundle::new();
        let record = RegionRecord::new("T", ParameterMap::new(), vec![]);
        bundle.write_region("r", record.clone()).unwrap();
        assert!(matches!(
            bundle.write_region("r", record),
            Err(BundleError::DuplicateRegion(name)) if name == "r"
        ));
        assert!(matches!(
            bundle.read_region("other"),
            Err(BundleError::MissingRegion(_))
        ));
    }
}

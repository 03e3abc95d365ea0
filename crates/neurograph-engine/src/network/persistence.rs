// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Network save/restore through [`Bundle`].
//!
//! Saving writes the topology first and then one record per region. Loading
//! rebuilds every region before any link, so link endpoints always exist.
//! Restored implementations keep their state and are not initialised again;
//! output buffers and delayed-link snapshots are restored as saved.

use neurograph_bundle::{Bundle, BundleMetadata, LinkRecord, RegionEntry, TopologyRecord};
use neurograph_config::{BundleConfig, NetworkConfig};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use super::Network;
use crate::error::{NetworkError, NetworkResult};
use crate::factory::RegionImplFactory;
use crate::link::LinkSpec;
use crate::region::Region;
use crate::region_impl::RegionIdentity;

impl Network {
    /// Capture topology, implementation state, outputs and link buffers
    pub fn save_bundle(&self) -> NetworkResult<Bundle> {
        let mut bundle = Bundle::with_metadata(BundleMetadata {
            source: format!("iteration {}", self.iteration),
            ..BundleMetadata::default()
        });

        let regions = self
            .regions
            .iter()
            .map(|r| RegionEntry {
                name: r.name().to_string(),
                type_name: r.type_name().to_string(),
            })
            .collect();
        let links = self
            .links
            .values()
            .map(|l| LinkRecord {
                src_region: l.src_region().to_string(),
                src_output: l.src_output().to_string(),
                dest_region: l.dest_region().to_string(),
                dest_input: l.dest_input().to_string(),
                reindex: l.reindex().cloned(),
                delay: l.delay(),
                pending: l.pending().cloned().collect(),
            })
            .collect();
        bundle.write_topology(TopologyRecord {
            regions,
            links,
            iteration: self.iteration,
        });

        for region in &self.regions {
            bundle.write_region(region.name(), region.save_record()?)?;
        }
        Ok(bundle)
    }

    /// Rebuild a network saved with [`Network::save_bundle`]
    pub fn from_bundle(bundle: &Bundle, factory: Arc<RegionImplFactory>) -> NetworkResult<Network> {
        Self::from_bundle_with_config(bundle, factory, NetworkConfig::default())
    }

    pub fn from_bundle_with_config(
        bundle: &Bundle,
        factory: Arc<RegionImplFactory>,
        config: NetworkConfig,
    ) -> NetworkResult<Network> {
        let topology = bundle.topology()?;
        let mut network = Network::with_config(factory, config);

        for entry in &topology.regions {
            if network.region_index.contains_key(&entry.name) {
                return Err(NetworkError::DuplicateRegion(entry.name.clone()));
            }
            let record = bundle.read_region(&entry.name)?;
            if record.type_name != entry.type_name {
                return Err(NetworkError::InvalidState(format!(
                    "region {} is recorded as {} but its state belongs to {}",
                    entry.name, entry.type_name, record.type_name
                )));
            }

            let identity = RegionIdentity::new(&entry.name, &entry.type_name);
            let implementation =
                network
                    .factory
                    .deserialize_impl(&entry.type_name, record, &identity)?;
            let spec = network.factory.get_spec(&entry.type_name)?;
            let region = Region::restored(
                &entry.name,
                &entry.type_name,
                spec,
                record.parameters.clone(),
                implementation,
                record.outputs.clone(),
                record.initialized,
            )?;
            network.insert_region(region);
        }

        for saved in &topology.links {
            let spec = LinkSpec {
                src_region: saved.src_region.clone(),
                src_output: saved.src_output.clone(),
                dest_region: saved.dest_region.clone(),
                dest_input: saved.dest_input.clone(),
                reindex: saved.reindex.clone(),
                delay: saved.delay,
            };
            let id = network.add_link(spec)?;
            if let Some(link) = network.links.get_mut(&id) {
                link.restore_pending(saved.pending.clone());
            }
        }

        network.iteration = topology.iteration;
        info!(
            "[NETWORK] Restored {} regions and {} links at iteration {}",
            network.regions.len(),
            network.links.len(),
            network.iteration
        );
        Ok(network)
    }

    /// Save to a bundle file
    pub fn save<P: AsRef<Path>>(&self, path: P, compress: bool) -> NetworkResult<()> {
        self.save_bundle()?.save(path.as_ref(), compress)?;
        info!("[NETWORK] Saved bundle to {}", path.as_ref().display());
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P, factory: Arc<RegionImplFactory>) -> NetworkResult<Network> {
        let bundle = Bundle::load(path)?;
        Self::from_bundle(&bundle, factory)
    }

    /// Save as `name` under the configured bundle directory, creating it if needed
    pub fn save_to(&self, config: &BundleConfig, name: &str) -> NetworkResult<PathBuf> {
        std::fs::create_dir_all(&config.directory).map_err(neurograph_bundle::BundleError::from)?;
        let path = config.bundle_path(name);
        self.save(&path, config.compression)?;
        Ok(path)
    }
}

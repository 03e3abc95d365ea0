// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Neurograph
//!
//! Region graph dataflow engine. Compose named regions backed by pluggable
//! implementations, wire typed outputs to typed inputs, run the graph in
//! dependency order and persist the whole network to a bundle.
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! neurograph = "0.1"  # Default: compression + file logging
//! ```
//!
//! ## Feature Flags
//!
//! - **`compression`** (default): LZ4 compressed bundle files
//! - **`file-logging`** (default): JSON log files with run-folder rotation
//!
//! ## Usage
//!
//! ```rust
//! use neurograph::prelude::*;
//!
//! let factory = Arc::new(RegionImplFactory::with_builtin_regions());
//! let mut net = Network::new(factory);
//! net.add_region("gen", "CounterSource", &ParameterMap::new().with("start", 1i32))?;
//! net.add_region("inc", "Incrementer", &ParameterMap::new())?;
//! net.link_default("gen", "inc")?;
//!
//! net.run(1)?;
//! let out = net.region("inc")?.output_data("out")?;
//! assert_eq!(out.to_vec::<i32>()?, vec![2, 3, 4, 5]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Foundation: neurograph-structures                      │
//! │  (BasicType, Array, parameters, reindex rules)          │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Persistence: neurograph-bundle                         │
//! │  (Bundle records, versioned file format)                │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Engine: neurograph-engine                              │
//! │  (Factory, regions, links, network execution)           │
//! └─────────────────────────────────────────────────────────┘
//!
//!   Cross-cutting: neurograph-config, neurograph-observability
//! ```
//!
//! ## License
//!
//! Apache-2.0

use anyhow::Result;

// Re-export foundation
pub use neurograph_structures as structures;

// Re-export persistence
pub use neurograph_bundle as bundle;

// Re-export engine
pub use neurograph_engine as engine;

// Re-export infrastructure
pub use neurograph_config as config;
pub use neurograph_observability as observability;

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude - commonly used types and traits
pub mod prelude {
    pub use std::sync::Arc;

    pub use crate::structures::{
        Array, ArrayElement, BasicType, ParameterMap, ParameterValue, ReindexRule, Scalar,
    };

    pub use crate::engine::{
        AccessMode, CycleControl, InputSpec, InputWidths, LinkSpec, Network, NetworkError,
        NetworkResult, NetworkState, OutputSpec, ParameterSpec, Region, RegionIdentity,
        RegionImpl, RegionImplFactory, RegionImplType, RegionIo, RegisteredRegionImpl, Spec,
    };

    pub use crate::bundle::Bundle;
    pub use crate::config::NeurographConfig;
}

/// Install logging as described by the `[logging]` config section
///
/// Per-crate debug flags are still read from the command line and
/// environment; the config only sets the base level, format and file output.
///
/// # Errors
/// Fails on an unknown format or level, or when a subscriber is already set.
pub fn init_logging_from_config(
    logging: &config::LoggingConfig,
) -> Result<observability::LoggingGuard> {
    let options = observability::LoggingOptions {
        level: logging.level.clone(),
        format: logging.format.parse()?,
        log_dir: logging.file_logging.then(|| logging.log_dir.clone()),
        ..Default::default()
    };
    observability::init_logging(&observability::parse_debug_flags(), &options)
}

/// Build an empty network using the `[network]` config section
pub fn network_from_config(
    factory: std::sync::Arc<engine::RegionImplFactory>,
    config: &config::NeurographConfig,
) -> engine::Network {
    engine::Network::with_config(factory, config.network.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_facade_imports() {
        use crate::prelude::*;
        let params = ParameterMap::new().with("width", 2u32);
        assert!(params.contains("width"));
        assert_eq!(BasicType::Int32.size(), 4);
    }

    #[test]
    fn test_network_takes_config_section() {
        let mut settings = config::NeurographConfig::default();
        settings.network.profiling = true;
        let factory = std::sync::Arc::new(engine::RegionImplFactory::with_builtin_regions());
        let net = network_from_config(factory, &settings);
        assert!(net.config().profiling);
    }
}

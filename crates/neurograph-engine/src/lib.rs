// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Neurograph Engine
//!
//! Region graph dataflow engine. A [`Network`] owns named [`Region`]s, each
//! wrapping one pluggable [`RegionImpl`], and typed [`Link`]s that route
//! output buffers into input buffers. Every cycle regions run in dependency
//! order; delayed links carry data across cycles.
//!
//! ## Architecture
//! - **Factory**: [`RegionImplFactory`] resolves a type name to an
//!   implementation and its [`Spec`], from static registrations or
//!   pluggable [`ImplResolver`]s
//! - **Wiring**: [`Output`], [`Input`] and [`Link`] with optional reindexing
//!   and delay
//! - **Execution**: Kahn ordering of delay-0 links, cycle callbacks
//! - **Persistence**: save/restore of topology, implementation state and
//!   in-flight buffers through `neurograph-bundle`
//!
//! ## Example
//! ```
//! use std::sync::Arc;
//! use neurograph_engine::{Network, RegionImplFactory};
//! use neurograph_structures::ParameterMap;
//!
//! let factory = Arc::new(RegionImplFactory::with_builtin_regions());
//! let mut net = Network::new(factory);
//! net.add_region("gen", "CounterSource", &ParameterMap::new().with("start", 1i32))
//!     .unwrap();
//! net.add_region("inc", "Incrementer", &ParameterMap::new()).unwrap();
//! net.link_default("gen", "inc").unwrap();
//!
//! net.run(1).unwrap();
//! let out = net.region("inc").unwrap().output_data("out").unwrap();
//! assert_eq!(out.to_vec::<i32>().unwrap(), vec![2, 3, 4, 5]);
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod error;
pub mod factory;
pub mod input;
pub mod link;
pub mod network;
pub mod output;
pub mod region;
pub mod region_impl;
pub mod regions;
pub mod registered;
pub mod spec;

pub use error::{NetworkError, NetworkResult};
pub use factory::{ImplResolver, ImplementationHandle, RegionImplAdapter, RegionImplFactory};
pub use input::Input;
pub use link::{Link, LinkSpec};
pub use network::{CycleCallback, CycleControl, Network, NetworkState};
pub use output::{LinkId, Output};
pub use region::{Region, RegionStats};
pub use region_impl::{
    decode_state, encode_state, InputWidths, RegionIdentity, RegionImpl, RegionImplType, RegionIo,
};
pub use registered::RegisteredRegionImpl;
pub use spec::{AccessMode, InputSpec, OutputSpec, ParameterSpec, Spec, SpecBuilder};

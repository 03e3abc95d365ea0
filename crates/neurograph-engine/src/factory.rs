// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Region implementation factory.
//!
//! Translates a region type name into a constructible implementation and its
//! [`Spec`]. Names are looked up in the static registrations first, then
//! offered to each [`ImplResolver`] in the order they were added. The factory
//! is explicitly constructed and shared as `Arc<RegionImplFactory>`; there is
//! no process-wide instance.

use ahash::AHashMap;
use neurograph_bundle::RegionRecord;
use neurograph_structures::ParameterMap;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{NetworkError, NetworkResult};
use crate::region_impl::{RegionIdentity, RegionImpl, RegionImplType};
use crate::registered::RegisteredRegionImpl;
use crate::spec::Spec;

/// Type-erased constructor of one region type
pub trait RegionImplAdapter: Send + Sync {
    /// Build an instance from an already normalised parameter snapshot
    fn create_impl(
        &self,
        params: &ParameterMap,
        region: &RegionIdentity,
    ) -> NetworkResult<Box<dyn RegionImpl>>;

    /// Rebuild an instance from a saved record
    fn deserialize_impl(
        &self,
        record: &RegionRecord,
        region: &RegionIdentity,
    ) -> NetworkResult<Box<dyn RegionImpl>>;

    fn create_spec(&self) -> Arc<Spec>;
}

/// Shared handle to a resolved region type
pub type ImplementationHandle = Arc<dyn RegionImplAdapter>;

/// Resolution strategy for names without a static registration, e.g.
/// implementations provided by an external module loader
pub trait ImplResolver: Send + Sync {
    fn resolve(&self, type_name: &str) -> Option<ImplementationHandle>;
}

impl<F> ImplResolver for F
where
    F: Fn(&str) -> Option<ImplementationHandle> + Send + Sync,
{
    fn resolve(&self, type_name: &str) -> Option<ImplementationHandle> {
        self(type_name)
    }
}

#[derive(Default)]
pub struct RegionImplFactory {
    /// Static registrations (type name -> adapter)
    registered: RwLock<AHashMap<String, ImplementationHandle>>,

    /// Fallback strategies, in registration order
    resolvers: RwLock<Vec<Arc<dyn ImplResolver>>>,

    /// Handles produced by resolvers
    resolved: RwLock<AHashMap<String, ImplementationHandle>>,

    /// Validated specs, one per type name
    specs: RwLock<AHashMap<String, Arc<Spec>>>,
}

impl std::fmt::Debug for RegionImplFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegionImplFactory")
            .field("registered", &self.registered_types())
            .field("resolvers", &self.resolvers.read().len())
            .finish()
    }
}

impl RegionImplFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Factory with the built-in reference regions registered
    pub fn with_builtin_regions() -> Self {
        let factory = Self::new();
        crate::regions::register_builtin_regions(&factory);
        factory
    }

    /// Register an adapter under `type_name`
    pub fn register_type(
        &self,
        type_name: impl Into<String>,
        adapter: ImplementationHandle,
    ) -> NetworkResult<()> {
        let type_name = type_name.into();
        let mut registered = self.registered.write();
        if registered.contains_key(&type_name) {
            warn!("[FACTORY] Region type already registered: {}", type_name);
            return Err(NetworkError::DuplicateRegionType(type_name));
        }
        debug!("[FACTORY] Registered region type {}", type_name);
        registered.insert(type_name, adapter);
        Ok(())
    }

    /// Register a statically typed implementation
    pub fn register<T: RegionImplType>(&self, type_name: impl Into<String>) -> NetworkResult<()> {
        self.register_type(type_name, Arc::new(RegisteredRegionImpl::<T>::new()))
    }

    /// Remove a static registration and its cached spec
    pub fn unregister_type(&self, type_name: &str) -> NetworkResult<()> {
        if self.registered.write().remove(type_name).is_none() {
            return Err(NetworkError::UnknownRegionType(type_name.to_string()));
        }
        self.specs.write().remove(type_name);
        debug!("[FACTORY] Unregistered region type {}", type_name);
        Ok(())
    }

    pub fn add_resolver(&self, resolver: Arc<dyn ImplResolver>) {
        self.resolvers.write().push(resolver);
    }

    pub fn is_registered(&self, type_name: &str) -> bool {
        self.registered.read().contains_key(type_name)
    }

    /// Statically registered type names, sorted
    pub fn registered_types(&self) -> Vec<String> {
        let mut names: Vec<String> = self.registered.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Find the adapter for `type_name`
    pub fn resolve(&self, type_name: &str) -> NetworkResult<ImplementationHandle> {
        if let Some(handle) = self.registered.read().get(type_name) {
            return Ok(Arc::clone(handle));
        }
        if let Some(handle) = self.resolved.read().get(type_name) {
            return Ok(Arc::clone(handle));
        }

        let resolvers: Vec<Arc<dyn ImplResolver>> = self.resolvers.read().clone();
        for resolver in resolvers {
            if let Some(handle) = resolver.resolve(type_name) {
                debug!("[FACTORY] Resolved region type {} through resolver", type_name);
                self.resolved
                    .write()
                    .insert(type_name.to_string(), Arc::clone(&handle));
                return Ok(handle);
            }
        }
        Err(NetworkError::UnknownRegionType(type_name.to_string()))
    }

    /// Spec of `type_name`, validated and cached on first request
    pub fn get_spec(&self, type_name: &str) -> NetworkResult<Arc<Spec>> {
        if let Some(spec) = self.specs.read().get(type_name) {
            return Ok(Arc::clone(spec));
        }
        let spec = self.resolve(type_name)?.create_spec();
        spec.validate(type_name)?;

        let mut specs = self.specs.write();
        let cached = specs
            .entry(type_name.to_string())
            .or_insert_with(|| Arc::clone(&spec));
        Ok(Arc::clone(cached))
    }

    /// Validate `params` against the type's `Spec` and build a new instance.
    ///
    /// Returns the instance together with the normalised parameter snapshot
    /// (declared types, defaults filled in).
    pub fn create_impl(
        &self,
        type_name: &str,
        params: &ParameterMap,
        region: &RegionIdentity,
    ) -> NetworkResult<(Box<dyn RegionImpl>, ParameterMap)> {
        let handle = self.resolve(type_name)?;
        let spec = self.get_spec(type_name)?;
        let normalized = spec.normalize_parameters(params)?;
        let instance = handle.create_impl(&normalized, region)?;
        debug!(
            "[FACTORY] Created {} implementation for region {}",
            type_name, region.name
        );
        Ok((instance, normalized))
    }

    /// Rebuild an instance from saved state
    pub fn deserialize_impl(
        &self,
        type_name: &str,
        record: &RegionRecord,
        region: &RegionIdentity,
    ) -> NetworkResult<Box<dyn RegionImpl>> {
        let handle = self.resolve(type_name)?;
        handle.deserialize_impl(record, region)
    }

    /// Drop cached specs and resolver-produced handles.
    ///
    /// Static registrations and resolvers are kept. No region built from
    /// the dropped entries may still be in use.
    pub fn reset(&self) {
        self.specs.write().clear();
        self.resolved.write().clear();
        info!("[FACTORY] Caches cleared");
    }
}

// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Network: regions, links and the execution loop.
//!
//! ## Lifecycle
//! ```text
//! Unbuilt --initialize()--> Initialized --run()--> Running --+--> Initialized
//!    ^                                                       |
//!    +------- topology change <------- Stopped <-------------+ (halt, stop(), failure)
//! ```
//!
//! Regions execute in a topological order of the delay-0 link graph. Ties
//! are broken by region insertion order. Links with a delay of one or more
//! cycles do not constrain the order, which is how feedback loops are
//! expressed.

use ahash::AHashMap;
use neurograph_config::NetworkConfig;
use neurograph_structures::ParameterMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{NetworkError, NetworkResult};
use crate::factory::RegionImplFactory;
use crate::input::Input;
use crate::link::{Link, LinkSpec};
use crate::output::{LinkId, Output};
use crate::region::Region;
use crate::region_impl::{InputWidths, RegionIdentity};

mod persistence;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NetworkState {
    /// Topology changed since the last successful initialisation
    Unbuilt,
    Initialized,
    Running,
    /// Halted by a callback, `stop()` or a compute failure
    Stopped,
}

impl Display for NetworkState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            NetworkState::Unbuilt => "unbuilt",
            NetworkState::Initialized => "initialized",
            NetworkState::Running => "running",
            NetworkState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Returned by cycle callbacks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleControl {
    Continue,
    /// Stop `run` after the current cycle
    Halt,
}

/// Invoked after every completed cycle with the new iteration count
pub type CycleCallback = Box<dyn FnMut(&Network, u64) -> CycleControl + Send>;

pub struct Network {
    factory: Arc<RegionImplFactory>,
    config: NetworkConfig,

    /// Regions in insertion order
    regions: Vec<Region>,
    region_index: AHashMap<String, usize>,

    /// Links keyed by id; id order is registration order
    links: BTreeMap<LinkId, Link>,
    next_link_id: u64,

    execution_order: Option<Vec<usize>>,
    phase_count: usize,
    state: NetworkState,
    iteration: u64,
    callbacks: Vec<CycleCallback>,
}

impl std::fmt::Debug for Network {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Network")
            .field("regions", &self.regions.len())
            .field("links", &self.links.len())
            .field("state", &self.state)
            .field("iteration", &self.iteration)
            .finish()
    }
}

fn index_of(index: &AHashMap<String, usize>, name: &str) -> NetworkResult<usize> {
    index
        .get(name)
        .copied()
        .ok_or_else(|| NetworkError::UnknownRegion(name.to_string()))
}

impl Network {
    pub fn new(factory: Arc<RegionImplFactory>) -> Self {
        Self::with_config(factory, NetworkConfig::default())
    }

    pub fn with_config(factory: Arc<RegionImplFactory>, config: NetworkConfig) -> Self {
        Self {
            factory,
            config,
            regions: Vec::new(),
            region_index: AHashMap::new(),
            links: BTreeMap::new(),
            next_link_id: 0,
            execution_order: None,
            phase_count: 0,
            state: NetworkState::Unbuilt,
            iteration: 0,
            callbacks: Vec::new(),
        }
    }

    pub fn factory(&self) -> &Arc<RegionImplFactory> {
        &self.factory
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    pub fn state(&self) -> NetworkState {
        self.state
    }

    /// Completed cycles
    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    /// Number of Kahn levels, known after initialisation
    pub fn phase_count(&self) -> usize {
        self.phase_count
    }

    /// Region names in execution order, known after initialisation
    pub fn execution_order(&self) -> Option<Vec<&str>> {
        self.execution_order
            .as_ref()
            .map(|order| order.iter().map(|&r| self.regions[r].name()).collect())
    }

    pub fn regions(&self) -> impl Iterator<Item = &Region> {
        self.regions.iter()
    }

    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    pub fn region(&self, name: &str) -> NetworkResult<&Region> {
        let r = index_of(&self.region_index, name)?;
        Ok(&self.regions[r])
    }

    /// Mutable access for runtime parameter changes
    pub fn region_mut(&mut self, name: &str) -> NetworkResult<&mut Region> {
        let r = index_of(&self.region_index, name)?;
        Ok(&mut self.regions[r])
    }

    /// Links in registration order
    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.links.values()
    }

    pub fn link(&self, id: LinkId) -> Option<&Link> {
        self.links.get(&id)
    }

    /// Id of the link between the given endpoints
    pub fn find_link(
        &self,
        src_region: &str,
        src_output: &str,
        dest_region: &str,
        dest_input: &str,
    ) -> Option<LinkId> {
        self.links
            .values()
            .find(|l| {
                l.src_region() == src_region
                    && l.src_output() == src_output
                    && l.dest_region() == dest_region
                    && l.dest_input() == dest_input
            })
            .map(Link::id)
    }

    pub fn add_callback<F>(&mut self, callback: F)
    where
        F: FnMut(&Network, u64) -> CycleControl + Send + 'static,
    {
        self.callbacks.push(Box::new(callback));
    }

    // ------------------------------------------------------------------
    // Topology
    // ------------------------------------------------------------------

    fn ensure_mutable(&self) -> NetworkResult<()> {
        match self.state {
            NetworkState::Unbuilt | NetworkState::Stopped => Ok(()),
            state => Err(NetworkError::IllegalTopologyChange(state)),
        }
    }

    fn invalidate(&mut self) {
        self.state = NetworkState::Unbuilt;
        self.execution_order = None;
        self.phase_count = 0;
        for region in &mut self.regions {
            region.set_phase(None);
        }
    }

    /// Create a region of `type_name` through the factory.
    ///
    /// Parameters are validated before anything is added; on error the
    /// network is unchanged.
    pub fn add_region(
        &mut self,
        name: &str,
        type_name: &str,
        params: &ParameterMap,
    ) -> NetworkResult<&mut Region> {
        self.ensure_mutable()?;
        if self.region_index.contains_key(name) {
            return Err(NetworkError::DuplicateRegion(name.to_string()));
        }

        let identity = RegionIdentity::new(name, type_name);
        let (implementation, normalized) = self.factory.create_impl(type_name, params, &identity)?;
        let spec = self.factory.get_spec(type_name)?;
        let region = Region::new(name, type_name, spec, normalized, implementation);

        info!("[NETWORK] Added region {} ({})", name, type_name);
        Ok(self.insert_region(region))
    }

    fn insert_region(&mut self, region: Region) -> &mut Region {
        let r = self.regions.len();
        self.region_index.insert(region.name().to_string(), r);
        self.regions.push(region);
        self.invalidate();
        &mut self.regions[r]
    }

    /// Remove a region together with every link touching it
    pub fn remove_region(&mut self, name: &str) -> NetworkResult<()> {
        self.ensure_mutable()?;
        let r = index_of(&self.region_index, name)?;

        let incident: Vec<LinkId> = self
            .links
            .values()
            .filter(|l| l.src_region() == name || l.dest_region() == name)
            .map(Link::id)
            .collect();
        for id in incident {
            self.detach_link(id)?;
        }

        self.regions.remove(r);
        self.region_index = self
            .regions
            .iter()
            .enumerate()
            .map(|(i, region)| (region.name().to_string(), i))
            .collect();
        self.invalidate();
        info!("[NETWORK] Removed region {}", name);
        Ok(())
    }

    /// Connect an output to an input.
    ///
    /// Empty endpoint names select the default output or input. Element types
    /// must match exactly.
    pub fn add_link(&mut self, spec: LinkSpec) -> NetworkResult<LinkId> {
        self.ensure_mutable()?;
        let spec = self.resolve_endpoints(spec)?;

        let s = index_of(&self.region_index, &spec.src_region)?;
        let d = index_of(&self.region_index, &spec.dest_region)?;
        let source_type = self.regions[s].output(&spec.src_output)?.element_type();
        let dest_type = self.regions[d].input(&spec.dest_input)?.element_type();
        if source_type != dest_type {
            return Err(NetworkError::TypeMismatchOnLink {
                link: spec.to_string(),
                source_type,
                dest_type,
            });
        }
        if self
            .find_link(&spec.src_region, &spec.src_output, &spec.dest_region, &spec.dest_input)
            .is_some()
        {
            return Err(NetworkError::DuplicateLink(spec.to_string()));
        }
        if let Some(rule) = &spec.reindex {
            if rule.width() == 0 {
                return Err(NetworkError::InvalidReindex {
                    link: spec.to_string(),
                    reason: "rule selects no elements".to_string(),
                });
            }
        }

        let id = LinkId(self.next_link_id);
        self.regions[s].output_mut(&spec.src_output)?.add_link(id)?;
        if let Err(e) = self.regions[d].input_mut(&spec.dest_input)?.add_link(id) {
            self.regions[s].output_mut(&spec.src_output)?.remove_link(id)?;
            return Err(e);
        }
        self.next_link_id += 1;

        debug!("[NETWORK] Added {} {}", id, spec);
        self.links.insert(id, Link::new(id, spec));
        self.invalidate();
        Ok(id)
    }

    /// Connect the default output of `src_region` to the default input of `dest_region`
    pub fn link_default(&mut self, src_region: &str, dest_region: &str) -> NetworkResult<LinkId> {
        self.add_link(LinkSpec::between_defaults(src_region, dest_region))
    }

    fn resolve_endpoints(&self, mut spec: LinkSpec) -> NetworkResult<LinkSpec> {
        if spec.src_output.is_empty() {
            let src = self.region(&spec.src_region)?;
            spec.src_output = src
                .default_output_name()
                .ok_or_else(|| NetworkError::UnknownOutput {
                    region: spec.src_region.clone(),
                    output: "<default>".to_string(),
                })?
                .to_string();
        }
        if spec.dest_input.is_empty() {
            let dest = self.region(&spec.dest_region)?;
            spec.dest_input = dest
                .default_input_name()
                .ok_or_else(|| NetworkError::UnknownInput {
                    region: spec.dest_region.clone(),
                    input: "<default>".to_string(),
                })?
                .to_string();
        }
        Ok(spec)
    }

    pub fn remove_link(&mut self, id: LinkId) -> NetworkResult<()> {
        self.ensure_mutable()?;
        self.detach_link(id)?;
        self.invalidate();
        Ok(())
    }

    fn detach_link(&mut self, id: LinkId) -> NetworkResult<()> {
        let link = self
            .links
            .remove(&id)
            .ok_or_else(|| NetworkError::MissingLink(id.to_string()))?;
        let s = index_of(&self.region_index, link.src_region())?;
        let d = index_of(&self.region_index, link.dest_region())?;
        self.regions[s].output_mut(link.src_output())?.remove_link(id)?;
        self.regions[d].input_mut(link.dest_input())?.remove_link(id)?;
        debug!("[NETWORK] Removed {}", link);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Initialisation
    // ------------------------------------------------------------------

    /// Order regions, size every buffer and initialise implementations.
    ///
    /// All validation runs before any buffer is allocated.
    pub fn initialize(&mut self) -> NetworkResult<()> {
        match self.state {
            NetworkState::Initialized => return Ok(()),
            NetworkState::Running => {
                return Err(NetworkError::InvalidState(
                    "cannot initialize a running network".to_string(),
                ))
            }
            NetworkState::Unbuilt | NetworkState::Stopped => {}
        }

        let (order, phases, phase_count) = self.compute_order()?;
        self.check_required_inputs()?;
        let output_counts = self.resolve_output_counts(&order)?;
        self.check_reindex_rules(&output_counts)?;
        let input_counts = self.resolve_input_counts(&output_counts)?;
        self.check_output_resizes(&output_counts)?;

        for (r, region) in self.regions.iter_mut().enumerate() {
            for (name, &count) in &output_counts[r] {
                region.output_mut(name)?.initialize(count)?;
            }
            for (name, &count) in &input_counts[r] {
                region.input_mut(name)?.initialize(count);
            }
            region.set_phase(Some(phases[r]));
        }

        for link in self.links.values_mut() {
            if link.delay() > 0 {
                let s = index_of(&self.region_index, link.src_region())?;
                let source = self.regions[s].output_data(link.src_output())?;
                link.initialize_buffers(source);
            }
        }

        for &r in &order {
            self.regions[r].initialize_impl()?;
        }

        info!(
            "[NETWORK] Initialized {} regions, {} links, {} phases",
            self.regions.len(),
            self.links.len(),
            phase_count
        );
        self.execution_order = Some(order);
        self.phase_count = phase_count;
        self.state = NetworkState::Initialized;
        Ok(())
    }

    /// Kahn's algorithm by levels over delay-0 links.
    ///
    /// Returns the order, the level of every region and the level count.
    fn compute_order(&self) -> NetworkResult<(Vec<usize>, Vec<usize>, usize)> {
        let n = self.regions.len();
        let mut in_degree = vec![0usize; n];
        let mut successors: Vec<Vec<usize>> = vec![Vec::new(); n];
        for link in self.links.values().filter(|l| l.delay() == 0) {
            let s = index_of(&self.region_index, link.src_region())?;
            let d = index_of(&self.region_index, link.dest_region())?;
            successors[s].push(d);
            in_degree[d] += 1;
        }

        let mut phases = vec![0usize; n];
        let mut order = Vec::with_capacity(n);
        let mut level: Vec<usize> = (0..n).filter(|&r| in_degree[r] == 0).collect();
        let mut phase = 0;
        while !level.is_empty() {
            let mut next = Vec::new();
            for &r in &level {
                phases[r] = phase;
                order.push(r);
                for &d in &successors[r] {
                    in_degree[d] -= 1;
                    if in_degree[d] == 0 {
                        next.push(d);
                    }
                }
            }
            next.sort_unstable();
            level = next;
            phase += 1;
        }

        if order.len() < n {
            let cycle = self.cycle_members(&in_degree, &successors);
            warn!("[NETWORK] Cycle of delay-0 links between {:?}", cycle);
            return Err(NetworkError::CyclicGraph(cycle));
        }
        Ok((order, phases, phase))
    }

    /// Regions left after Kahn's pass, minus those that only hang off a cycle
    fn cycle_members(&self, in_degree: &[usize], successors: &[Vec<usize>]) -> Vec<String> {
        let mut residual: BTreeSet<usize> = (0..in_degree.len())
            .filter(|&r| in_degree[r] > 0)
            .collect();
        loop {
            let sinks: Vec<usize> = residual
                .iter()
                .copied()
                .filter(|r| !successors[*r].iter().any(|d| residual.contains(d)))
                .collect();
            if sinks.is_empty() {
                break;
            }
            for r in sinks {
                residual.remove(&r);
            }
        }
        residual
            .into_iter()
            .map(|r| self.regions[r].name().to_string())
            .collect()
    }

    fn check_required_inputs(&self) -> NetworkResult<()> {
        for region in &self.regions {
            if let Some(input) = region.inputs().find(|i| i.is_required() && !i.is_connected()) {
                return Err(NetworkError::MissingRequiredInput {
                    region: region.name().to_string(),
                    input: input.name().to_string(),
                });
            }
        }
        Ok(())
    }

    /// Element count of every output.
    ///
    /// Fixed counts come from the `Spec`; the rest are asked from the
    /// implementation with the input widths known so far, repeating until no
    /// more counts can be resolved.
    fn resolve_output_counts(&self, order: &[usize]) -> NetworkResult<Vec<BTreeMap<String, usize>>> {
        let mut counts: Vec<BTreeMap<String, usize>> = vec![BTreeMap::new(); self.regions.len()];
        loop {
            let mut progress = false;
            for &r in order {
                let region = &self.regions[r];
                let pending: Vec<&str> = region
                    .outputs()
                    .map(Output::name)
                    .filter(|name| !counts[r].contains_key(*name))
                    .collect();
                if pending.is_empty() {
                    continue;
                }
                let widths = self.known_input_widths(r, &counts)?;
                for name in pending {
                    if let Some(count) = region.output_element_count(name, &widths) {
                        counts[r].insert(name.to_string(), count);
                        progress = true;
                    }
                }
            }
            if !progress {
                break;
            }
        }

        for (region, resolved) in self.regions.iter().zip(&counts) {
            if let Some(output) = region.outputs().find(|o| !resolved.contains_key(o.name())) {
                return Err(NetworkError::UnresolvedElementCount(format!(
                    "{}.{}",
                    region.name(),
                    output.name()
                )));
            }
        }
        Ok(counts)
    }

    /// Widths of the inputs of region `r` whose sources all have known counts.
    /// Unconnected inputs have width 0.
    fn known_input_widths(
        &self,
        r: usize,
        output_counts: &[BTreeMap<String, usize>],
    ) -> NetworkResult<InputWidths> {
        let mut widths = InputWidths::new();
        'inputs: for input in self.regions[r].inputs() {
            let mut total = 0;
            for id in input.links() {
                let link = self
                    .links
                    .get(id)
                    .ok_or_else(|| NetworkError::MissingLink(id.to_string()))?;
                let s = index_of(&self.region_index, link.src_region())?;
                match output_counts[s].get(link.src_output()) {
                    Some(&count) => total += link.width(count),
                    None => continue 'inputs,
                }
            }
            widths.insert(input.name().to_string(), total);
        }
        Ok(widths)
    }

    fn check_reindex_rules(&self, output_counts: &[BTreeMap<String, usize>]) -> NetworkResult<()> {
        for link in self.links.values() {
            if let Some(rule) = link.reindex() {
                let s = index_of(&self.region_index, link.src_region())?;
                let source_len = output_counts[s].get(link.src_output()).copied().unwrap_or(0);
                rule.validate(source_len)
                    .map_err(|e| NetworkError::InvalidReindex {
                        link: link.to_string(),
                        reason: e.to_string(),
                    })?;
            }
        }
        Ok(())
    }

    /// Linked outputs that already hold data must keep their element count
    fn check_output_resizes(&self, output_counts: &[BTreeMap<String, usize>]) -> NetworkResult<()> {
        for (region, counts) in self.regions.iter().zip(output_counts) {
            for output in region.outputs() {
                let data = output.data();
                let requested = counts.get(output.name()).copied().unwrap_or(0);
                if data.is_allocated() && data.len() != requested && output.has_outgoing_links() {
                    return Err(NetworkError::BufferResize {
                        endpoint: format!("{}.{}", region.name(), output.name()),
                        current: data.len(),
                        requested,
                    });
                }
            }
        }
        Ok(())
    }

    /// Input sizes from link contributions, checked against fixed spec counts
    fn resolve_input_counts(
        &self,
        output_counts: &[BTreeMap<String, usize>],
    ) -> NetworkResult<Vec<BTreeMap<String, usize>>> {
        let mut counts = Vec::with_capacity(self.regions.len());
        for (r, region) in self.regions.iter().enumerate() {
            let widths = self.known_input_widths(r, output_counts)?;
            for input in region.inputs().filter(|i| i.is_connected()) {
                let expected = region
                    .spec()
                    .input(input.name())
                    .map(|spec| spec.count)
                    .unwrap_or(0);
                let actual = widths.get(input.name()).copied().unwrap_or(0);
                if expected > 0 && actual != expected {
                    return Err(NetworkError::ElementCountMismatch {
                        endpoint: format!("{}.{}", region.name(), input.name()),
                        expected,
                        actual,
                    });
                }
            }
            counts.push(widths);
        }
        Ok(counts)
    }

    // ------------------------------------------------------------------
    // Execution
    // ------------------------------------------------------------------

    /// Run `cycles` cycles, initialising first if the topology changed.
    ///
    /// A failing region stops the network; regions after it keep the data of
    /// the previous cycle.
    pub fn run(&mut self, cycles: u64) -> NetworkResult<()> {
        if self.execution_order.is_none() {
            self.initialize()?;
        }
        let order = match &self.execution_order {
            Some(order) => order.clone(),
            None => {
                return Err(NetworkError::InvalidState(
                    "network has no execution order".to_string(),
                ))
            }
        };

        self.state = NetworkState::Running;
        debug!("[NETWORK] Running {} cycles from iteration {}", cycles, self.iteration);

        for _ in 0..cycles {
            for &r in &order {
                if let Err(source) = self.step_region(r) {
                    let region = self.regions[r].name().to_string();
                    warn!(
                        "[NETWORK] Region {} failed at iteration {}: {}",
                        region, self.iteration, source
                    );
                    self.state = NetworkState::Stopped;
                    return Err(NetworkError::RegionComputeFailure {
                        region,
                        cycle: self.iteration,
                        source: Box::new(source),
                    });
                }
            }

            self.shift_delayed_links()?;
            self.iteration += 1;

            if self.config.log_interval > 0 && self.iteration % self.config.log_interval == 0 {
                info!("[NETWORK] Iteration {}", self.iteration);
            }

            if self.invoke_callbacks() == CycleControl::Halt {
                info!("[NETWORK] Halted by callback at iteration {}", self.iteration);
                self.state = NetworkState::Stopped;
                return Ok(());
            }
        }

        self.state = NetworkState::Initialized;
        Ok(())
    }

    /// Move an initialised network to `Stopped` so its topology can change
    pub fn stop(&mut self) -> NetworkResult<()> {
        if self.state == NetworkState::Unbuilt {
            return Err(NetworkError::InvalidState(
                "network has not been initialized".to_string(),
            ));
        }
        self.state = NetworkState::Stopped;
        Ok(())
    }

    fn step_region(&mut self, r: usize) -> NetworkResult<()> {
        let mut inputs = self.regions[r].take_inputs();
        let filled = self.fill_inputs(&mut inputs);
        self.regions[r].put_inputs(inputs);
        filled?;
        self.regions[r].compute(self.iteration, self.config.profiling)
    }

    /// Concatenate link contributions into each input, in link registration order
    fn fill_inputs(&self, inputs: &mut BTreeMap<String, Input>) -> NetworkResult<()> {
        for input in inputs.values_mut() {
            let (links, data) = input.links_and_data_mut();
            let mut offset = 0;
            for id in links {
                let link = self
                    .links
                    .get(id)
                    .ok_or_else(|| NetworkError::MissingLink(id.to_string()))?;
                let s = index_of(&self.region_index, link.src_region())?;
                let source = link.visible(self.regions[s].output_data(link.src_output())?);
                offset += source.copy_into(data, offset, link.reindex())?;
            }
        }
        Ok(())
    }

    fn shift_delayed_links(&mut self) -> NetworkResult<()> {
        for link in self.links.values_mut().filter(|l| l.delay() > 0) {
            let s = index_of(&self.region_index, link.src_region())?;
            link.shift(self.regions[s].output_data(link.src_output())?);
        }
        Ok(())
    }

    fn invoke_callbacks(&mut self) -> CycleControl {
        if self.callbacks.is_empty() {
            return CycleControl::Continue;
        }
        let mut callbacks = std::mem::take(&mut self.callbacks);
        let mut control = CycleControl::Continue;
        for callback in callbacks.iter_mut() {
            if callback(self, self.iteration) == CycleControl::Halt {
                control = CycleControl::Halt;
            }
        }
        self.callbacks = callbacks;
        control
    }
}

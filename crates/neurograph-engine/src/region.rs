// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Graph node wrapping one implementation instance.

use neurograph_bundle::RegionRecord;
use neurograph_structures::{Array, ParameterMap, ParameterValue};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::trace;

use crate::error::{NetworkError, NetworkResult};
use crate::input::Input;
use crate::output::Output;
use crate::region_impl::{InputWidths, RegionImpl, RegionIo};
use crate::spec::{AccessMode, Spec};

/// Compute statistics, collected when profiling is enabled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegionStats {
    pub compute_count: u64,
    pub total_compute_time: Duration,
    pub last_compute_time: Duration,
}

impl RegionStats {
    pub fn average_compute_time(&self) -> Duration {
        if self.compute_count == 0 {
            return Duration::ZERO;
        }
        let nanos = self.total_compute_time.as_nanos() / u128::from(self.compute_count);
        Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
    }
}

pub struct Region {
    name: String,
    type_name: String,
    spec: Arc<Spec>,
    parameters: ParameterMap,
    outputs: BTreeMap<String, Output>,
    inputs: BTreeMap<String, Input>,
    implementation: Box<dyn RegionImpl>,
    initialized: bool,
    phase: Option<usize>,
    stats: RegionStats,
}

impl std::fmt::Debug for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Region")
            .field("name", &self.name)
            .field("type_name", &self.type_name)
            .field("parameters", &self.parameters)
            .field("outputs", &self.outputs.keys().collect::<Vec<_>>())
            .field("inputs", &self.inputs.keys().collect::<Vec<_>>())
            .field("initialized", &self.initialized)
            .field("phase", &self.phase)
            .finish()
    }
}

impl Region {
    /// Build a region around a freshly created implementation.
    ///
    /// Outputs and inputs are created from `spec`, unallocated.
    pub(crate) fn new(
        name: impl Into<String>,
        type_name: impl Into<String>,
        spec: Arc<Spec>,
        parameters: ParameterMap,
        implementation: Box<dyn RegionImpl>,
    ) -> Self {
        let name = name.into();
        let outputs = spec
            .outputs()
            .map(|(out, s)| {
                (
                    out.to_string(),
                    Output::new(name.as_str(), out, s.data_type, s.is_default),
                )
            })
            .collect();
        let inputs = spec
            .inputs()
            .map(|(inp, s)| {
                (
                    inp.to_string(),
                    Input::new(name.as_str(), inp, s.data_type, s.required, s.is_default),
                )
            })
            .collect();

        Self {
            name,
            type_name: type_name.into(),
            spec,
            parameters,
            outputs,
            inputs,
            implementation,
            initialized: false,
            phase: None,
            stats: RegionStats::default(),
        }
    }

    /// Build a region around a deserialized implementation and its saved buffers.
    /// An implementation saved after initialisation is not initialised again.
    pub(crate) fn restored(
        name: impl Into<String>,
        type_name: impl Into<String>,
        spec: Arc<Spec>,
        parameters: ParameterMap,
        implementation: Box<dyn RegionImpl>,
        saved_outputs: BTreeMap<String, Array>,
        initialized: bool,
    ) -> NetworkResult<Self> {
        let mut region = Self::new(name, type_name, spec, parameters, implementation);
        for (out, array) in saved_outputs {
            let region_name = region.name.clone();
            region
                .outputs
                .get_mut(&out)
                .ok_or(NetworkError::UnknownOutput {
                    region: region_name,
                    output: out.clone(),
                })?
                .restore(array)?;
        }
        region.initialized = initialized;
        Ok(region)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn spec(&self) -> &Arc<Spec> {
        &self.spec
    }

    /// Normalised parameter snapshot, updated by `set_parameter`
    pub fn parameters(&self) -> &ParameterMap {
        &self.parameters
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Kahn level in the delay-0 dependency graph, known after network initialisation
    pub fn phase(&self) -> Option<usize> {
        self.phase
    }

    pub fn stats(&self) -> &RegionStats {
        &self.stats
    }

    pub fn outputs(&self) -> impl Iterator<Item = &Output> {
        self.outputs.values()
    }

    pub fn inputs(&self) -> impl Iterator<Item = &Input> {
        self.inputs.values()
    }

    pub fn output(&self, name: &str) -> NetworkResult<&Output> {
        self.outputs.get(name).ok_or_else(|| NetworkError::UnknownOutput {
            region: self.name.clone(),
            output: name.to_string(),
        })
    }

    pub fn input(&self, name: &str) -> NetworkResult<&Input> {
        self.inputs.get(name).ok_or_else(|| NetworkError::UnknownInput {
            region: self.name.clone(),
            input: name.to_string(),
        })
    }

    pub fn output_data(&self, name: &str) -> NetworkResult<&Array> {
        self.output(name).map(Output::data)
    }

    pub fn input_data(&self, name: &str) -> NetworkResult<&Array> {
        self.input(name).map(Input::data)
    }

    pub(crate) fn output_mut(&mut self, name: &str) -> NetworkResult<&mut Output> {
        let region = &self.name;
        self.outputs
            .get_mut(name)
            .ok_or_else(|| NetworkError::UnknownOutput {
                region: region.clone(),
                output: name.to_string(),
            })
    }

    pub(crate) fn input_mut(&mut self, name: &str) -> NetworkResult<&mut Input> {
        let region = &self.name;
        self.inputs
            .get_mut(name)
            .ok_or_else(|| NetworkError::UnknownInput {
                region: region.clone(),
                input: name.to_string(),
            })
    }

    /// Detach the inputs so they can be filled while other regions are borrowed
    pub(crate) fn take_inputs(&mut self) -> BTreeMap<String, Input> {
        std::mem::take(&mut self.inputs)
    }

    pub(crate) fn put_inputs(&mut self, inputs: BTreeMap<String, Input>) {
        self.inputs = inputs;
    }

    /// Name of the default output, if the type declares one
    pub fn default_output_name(&self) -> Option<&str> {
        self.spec.default_output().map(|(name, _)| name)
    }

    pub fn default_input_name(&self) -> Option<&str> {
        self.spec.default_input().map(|(name, _)| name)
    }

    /// Current value of a parameter.
    ///
    /// The implementation is asked first; the creation snapshot answers for
    /// parameters it does not track.
    pub fn get_parameter(&self, name: &str) -> NetworkResult<ParameterValue> {
        if self.spec.parameter(name).is_none() {
            return Err(NetworkError::InvalidParameter {
                name: name.to_string(),
                reason: format!("not declared by region type {}", self.type_name),
            });
        }
        self.implementation
            .get_parameter(name)
            .or_else(|| self.parameters.get(name).cloned())
            .ok_or_else(|| NetworkError::InvalidParameter {
                name: name.to_string(),
                reason: "no value available".to_string(),
            })
    }

    /// Change a read-write parameter at runtime
    pub fn set_parameter(
        &mut self,
        name: &str,
        value: impl Into<ParameterValue>,
    ) -> NetworkResult<()> {
        let param = self
            .spec
            .parameter(name)
            .ok_or_else(|| NetworkError::InvalidParameter {
                name: name.to_string(),
                reason: format!("not declared by region type {}", self.type_name),
            })?;
        if param.access != AccessMode::ReadWrite {
            return Err(NetworkError::ParameterNotWritable {
                region: self.name.clone(),
                name: name.to_string(),
            });
        }
        let value = param.check_value(name, &value.into())?;
        self.implementation.set_parameter(name, &value)?;
        self.parameters.insert(name, value);
        Ok(())
    }

    pub(crate) fn set_phase(&mut self, phase: Option<usize>) {
        self.phase = phase;
    }

    /// Fixed spec count, else whatever the implementation reports
    pub(crate) fn output_element_count(&self, output: &str, widths: &InputWidths) -> Option<usize> {
        match self.spec.output(output) {
            Some(spec) if spec.count > 0 => Some(spec.count),
            Some(_) => self.implementation.output_element_count(output, widths),
            None => None,
        }
    }

    pub(crate) fn initialize_impl(&mut self) -> NetworkResult<()> {
        if !self.initialized {
            self.implementation.initialize()?;
            self.initialized = true;
        }
        Ok(())
    }

    pub(crate) fn compute(&mut self, iteration: u64, profiling: bool) -> NetworkResult<()> {
        trace!("[REGION] compute {} at iteration {}", self.name, iteration);
        let started = profiling.then(Instant::now);

        let mut io = RegionIo::new(&self.name, iteration, &mut self.inputs, &mut self.outputs);
        self.implementation.compute(&mut io)?;

        if let Some(started) = started {
            let elapsed = started.elapsed();
            self.stats.compute_count += 1;
            self.stats.total_compute_time += elapsed;
            self.stats.last_compute_time = elapsed;
        }
        Ok(())
    }

    pub(crate) fn save_record(&self) -> NetworkResult<RegionRecord> {
        let mut record = RegionRecord::new(
            self.type_name.clone(),
            self.parameters.clone(),
            self.implementation.serialize_state()?,
        );
        record.outputs = self
            .outputs
            .iter()
            .map(|(name, out)| (name.clone(), out.data().clone()))
            .collect();
        record.initialized = self.initialized;
        Ok(record)
    }
}

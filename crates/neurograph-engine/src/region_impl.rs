// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Capability traits implemented by region algorithms.
//!
//! [`RegionImpl`] is the object safe per-instance interface a region drives
//! every cycle. [`RegionImplType`] adds the static constructors and the
//! [`Spec`] of a concrete type so it can be registered with the factory
//! through [`RegisteredRegionImpl`](crate::RegisteredRegionImpl).

use neurograph_structures::{Array, ArrayElement, ParameterMap, ParameterValue};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::error::{NetworkError, NetworkResult};
use crate::input::Input;
use crate::output::Output;
use crate::spec::Spec;

/// Identity of the region that owns an implementation instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionIdentity {
    pub name: String,
    pub type_name: String,
}

impl RegionIdentity {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

/// Element count each input will receive, by input name
pub type InputWidths = BTreeMap<String, usize>;

fn unknown_input(region: &str, name: &str) -> NetworkError {
    NetworkError::UnknownInput {
        region: region.to_string(),
        input: name.to_string(),
    }
}

fn unknown_output(region: &str, name: &str) -> NetworkError {
    NetworkError::UnknownOutput {
        region: region.to_string(),
        output: name.to_string(),
    }
}

/// View of a region's buffers handed to [`RegionImpl::compute`].
///
/// Input buffers are private copies refilled before every compute, so an
/// implementation may use them as scratch space.
pub struct RegionIo<'a> {
    region: &'a str,
    iteration: u64,
    inputs: &'a mut BTreeMap<String, Input>,
    outputs: &'a mut BTreeMap<String, Output>,
}

impl<'a> RegionIo<'a> {
    pub(crate) fn new(
        region: &'a str,
        iteration: u64,
        inputs: &'a mut BTreeMap<String, Input>,
        outputs: &'a mut BTreeMap<String, Output>,
    ) -> Self {
        Self {
            region,
            iteration,
            inputs,
            outputs,
        }
    }

    pub fn region_name(&self) -> &str {
        self.region
    }

    /// Network iteration being computed
    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    /// Materialised input buffer
    pub fn input(&self, name: &str) -> NetworkResult<&Array> {
        self.inputs
            .get(name)
            .map(Input::data)
            .ok_or_else(|| unknown_input(self.region, name))
    }

    pub fn input_slice<T: ArrayElement>(&self, name: &str) -> NetworkResult<&[T]> {
        Ok(self.input(name)?.as_slice::<T>()?)
    }

    pub fn input_slice_mut<T: ArrayElement>(&mut self, name: &str) -> NetworkResult<&mut [T]> {
        let input = self
            .inputs
            .get_mut(name)
            .ok_or_else(|| unknown_input(self.region, name))?;
        Ok(input.data_mut().as_mut_slice::<T>()?)
    }

    pub fn is_input_connected(&self, name: &str) -> bool {
        self.inputs.get(name).map_or(false, Input::is_connected)
    }

    pub fn output(&self, name: &str) -> NetworkResult<&Array> {
        self.outputs
            .get(name)
            .map(Output::data)
            .ok_or_else(|| unknown_output(self.region, name))
    }

    pub fn output_slice_mut<T: ArrayElement>(&mut self, name: &str) -> NetworkResult<&mut [T]> {
        let output = self
            .outputs
            .get_mut(name)
            .ok_or_else(|| unknown_output(self.region, name))?;
        Ok(output.data_mut().as_mut_slice::<T>()?)
    }

    /// Read one input while writing one output
    pub fn input_output<I: ArrayElement, O: ArrayElement>(
        &mut self,
        input: &str,
        output: &str,
    ) -> NetworkResult<(&[I], &mut [O])> {
        let source = self
            .inputs
            .get(input)
            .ok_or_else(|| unknown_input(self.region, input))?;
        let target = self
            .outputs
            .get_mut(output)
            .ok_or_else(|| unknown_output(self.region, output))?;
        Ok((source.data().as_slice::<I>()?, target.data_mut().as_mut_slice::<O>()?))
    }
}

/// Per-instance algorithm interface
pub trait RegionImpl: Send {
    /// Called once, after buffers are allocated and before the first compute.
    /// Restored instances are not initialised again.
    fn initialize(&mut self) -> NetworkResult<()> {
        Ok(())
    }

    /// Read inputs, write outputs
    fn compute(&mut self, io: &mut RegionIo<'_>) -> NetworkResult<()>;

    /// Opaque state that `RegionImplType::from_saved_state` can rebuild from
    fn serialize_state(&self) -> NetworkResult<Vec<u8>> {
        Ok(Vec::new())
    }

    /// Current value of a parameter, when the implementation tracks it
    fn get_parameter(&self, _name: &str) -> Option<ParameterValue> {
        None
    }

    /// Apply a runtime change to a read-write parameter.
    ///
    /// The value has already been converted to the declared type.
    fn set_parameter(&mut self, name: &str, _value: &ParameterValue) -> NetworkResult<()> {
        Err(NetworkError::InvalidParameter {
            name: name.to_string(),
            reason: "implementation does not accept runtime changes".to_string(),
        })
    }

    /// Element count of an output whose spec count is 0, given the widths of
    /// the inputs that are already known
    fn output_element_count(&self, _output: &str, _inputs: &InputWidths) -> Option<usize> {
        None
    }
}

/// Statically known implementation type
pub trait RegionImplType: RegionImpl + Sized + 'static {
    fn spec() -> Spec;

    /// Build from a normalised parameter snapshot
    fn from_parameters(params: &ParameterMap, region: &RegionIdentity) -> NetworkResult<Self>;

    /// Rebuild from `serialize_state` output and the saved parameter snapshot
    fn from_saved_state(
        state: &[u8],
        params: &ParameterMap,
        region: &RegionIdentity,
    ) -> NetworkResult<Self>;
}

/// bincode-encode implementation state
pub fn encode_state<T: Serialize>(state: &T) -> NetworkResult<Vec<u8>> {
    bincode::serialize(state)
        .map_err(|e| NetworkError::Implementation(format!("State encoding failed: {}", e)))
}

/// Decode state written by [`encode_state`]
pub fn decode_state<T: DeserializeOwned>(bytes: &[u8]) -> NetworkResult<T> {
    bincode::deserialize(bytes)
        .map_err(|e| NetworkError::Implementation(format!("State decoding failed: {}", e)))
}

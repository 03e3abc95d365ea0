// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use neurograph_structures::{BasicType, ParameterMap, ParameterValue};

use super::scalar_value;
use crate::error::{NetworkError, NetworkResult};
use crate::region_impl::{
    decode_state, encode_state, InputWidths, RegionIdentity, RegionImpl, RegionImplType, RegionIo,
};
use crate::spec::{AccessMode, OutputSpec, ParameterSpec, Spec};

/// Source emitting `start + step * k + i` for element `i` at its k-th compute
#[derive(Debug)]
pub struct CounterSource {
    width: usize,
    start: i32,
    step: i32,
    /// Completed computes
    ticks: u64,
}

impl CounterSource {
    fn configured(params: &ParameterMap, ticks: u64) -> NetworkResult<Self> {
        let width = params.get_scalar::<u32>("width")? as usize;
        if width == 0 {
            return Err(NetworkError::InvalidParameter {
                name: "width".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(Self {
            width,
            start: params.get_scalar("start")?,
            step: params.get_scalar("step")?,
            ticks,
        })
    }
}

impl RegionImpl for CounterSource {
    fn compute(&mut self, io: &mut RegionIo<'_>) -> NetworkResult<()> {
        // Wrapping: a long running counter must not abort the network
        let base = self
            .start
            .wrapping_add(self.step.wrapping_mul(self.ticks as i32));
        for (i, value) in io.output_slice_mut::<i32>("out")?.iter_mut().enumerate() {
            *value = base.wrapping_add(i as i32);
        }
        self.ticks += 1;
        Ok(())
    }

    fn serialize_state(&self) -> NetworkResult<Vec<u8>> {
        encode_state(&self.ticks)
    }

    fn get_parameter(&self, name: &str) -> Option<ParameterValue> {
        match name {
            "start" => Some(self.start.into()),
            "step" => Some(self.step.into()),
            _ => None,
        }
    }

    fn set_parameter(&mut self, name: &str, value: &ParameterValue) -> NetworkResult<()> {
        match name {
            "start" => self.start = scalar_value(name, value)?,
            "step" => self.step = scalar_value(name, value)?,
            _ => {
                return Err(NetworkError::InvalidParameter {
                    name: name.to_string(),
                    reason: "not writable".to_string(),
                })
            }
        }
        Ok(())
    }

    fn output_element_count(&self, output: &str, _inputs: &InputWidths) -> Option<usize> {
        (output == "out").then_some(self.width)
    }
}

impl RegionImplType for CounterSource {
    fn spec() -> Spec {
        Spec::builder("Counting source; element i of cycle k is start + step * k + i")
            .parameter(
                "width",
                ParameterSpec::new(BasicType::UInt32, AccessMode::CreateOnly)
                    .description("Number of output elements")
                    .constraints(">= 1")
                    .default_value(4u32),
            )
            .parameter(
                "start",
                ParameterSpec::new(BasicType::Int32, AccessMode::ReadWrite)
                    .description("Value of element 0 at the first compute")
                    .default_value(0i32),
            )
            .parameter(
                "step",
                ParameterSpec::new(BasicType::Int32, AccessMode::ReadWrite)
                    .description("Increase per compute")
                    .default_value(1i32),
            )
            .output(
                "out",
                OutputSpec::new(BasicType::Int32)
                    .description("Counter values, `width` elements")
                    .default_output(),
            )
            .build()
    }

    fn from_parameters(params: &ParameterMap, _region: &RegionIdentity) -> NetworkResult<Self> {
        Self::configured(params, 0)
    }

    fn from_saved_state(
        state: &[u8],
        params: &ParameterMap,
        _region: &RegionIdentity,
    ) -> NetworkResult<Self> {
        Self::configured(params, decode_state(state)?)
    }
}

// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use neurograph_structures::{BasicType, ParameterMap, ParameterValue};

use super::scalar_value;
use crate::error::{NetworkError, NetworkResult};
use crate::region_impl::{
    decode_state, encode_state, InputWidths, RegionIdentity, RegionImpl, RegionImplType, RegionIo,
};
use crate::spec::{AccessMode, InputSpec, OutputSpec, ParameterSpec, Spec};

/// Running per-element sum of its input, widened to Int64
#[derive(Debug, Default)]
pub struct Accumulator {
    sums: Vec<i64>,
}

impl RegionImpl for Accumulator {
    fn compute(&mut self, io: &mut RegionIo<'_>) -> NetworkResult<()> {
        let input = io.input_slice::<i32>("in")?;
        if self.sums.len() != input.len() {
            self.sums.resize(input.len(), 0);
        }
        for (sum, value) in self.sums.iter_mut().zip(input) {
            *sum = sum.wrapping_add(i64::from(*value));
        }
        io.output_slice_mut::<i64>("sum")?
            .copy_from_slice(&self.sums);
        Ok(())
    }

    fn serialize_state(&self) -> NetworkResult<Vec<u8>> {
        encode_state(&self.sums)
    }

    fn get_parameter(&self, name: &str) -> Option<ParameterValue> {
        (name == "reset").then(|| false.into())
    }

    fn set_parameter(&mut self, name: &str, value: &ParameterValue) -> NetworkResult<()> {
        if name != "reset" {
            return Err(NetworkError::InvalidParameter {
                name: name.to_string(),
                reason: "not writable".to_string(),
            });
        }
        if scalar_value::<bool>(name, value)? {
            self.sums.iter_mut().for_each(|s| *s = 0);
        }
        Ok(())
    }

    fn output_element_count(&self, output: &str, inputs: &InputWidths) -> Option<usize> {
        match output {
            "sum" => inputs.get("in").copied(),
            _ => None,
        }
    }
}

impl RegionImplType for Accumulator {
    fn spec() -> Spec {
        Spec::builder("Running sum of every input element")
            .parameter(
                "reset",
                ParameterSpec::new(BasicType::Bool, AccessMode::ReadWrite)
                    .description("Writing true clears the sums")
                    .default_value(false),
            )
            .input(
                "in",
                InputSpec::new(BasicType::Int32).required().default_input(),
            )
            .output("sum", OutputSpec::new(BasicType::Int64).default_output())
            .build()
    }

    fn from_parameters(_params: &ParameterMap, _region: &RegionIdentity) -> NetworkResult<Self> {
        Ok(Self::default())
    }

    fn from_saved_state(
        state: &[u8],
        _params: &ParameterMap,
        _region: &RegionIdentity,
    ) -> NetworkResult<Self> {
        Ok(Self {
            sums: decode_state(state)?,
        })
    }
}

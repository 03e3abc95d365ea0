// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use neurograph_structures::{BasicType, ParameterMap, ParameterValue};

use super::scalar_value;
use crate::error::{NetworkError, NetworkResult};
use crate::region_impl::{InputWidths, RegionIdentity, RegionImpl, RegionImplType, RegionIo};
use crate::spec::{AccessMode, InputSpec, OutputSpec, ParameterSpec, Spec};

/// `out[i] = in[i] + increment`
#[derive(Debug)]
pub struct Incrementer {
    increment: i32,
}

impl RegionImpl for Incrementer {
    fn compute(&mut self, io: &mut RegionIo<'_>) -> NetworkResult<()> {
        let (input, output) = io.input_output::<i32, i32>("in", "out")?;
        for (o, i) in output.iter_mut().zip(input) {
            *o = i.wrapping_add(self.increment);
        }
        Ok(())
    }

    fn get_parameter(&self, name: &str) -> Option<ParameterValue> {
        (name == "increment").then(|| self.increment.into())
    }

    fn set_parameter(&mut self, name: &str, value: &ParameterValue) -> NetworkResult<()> {
        if name != "increment" {
            return Err(NetworkError::InvalidParameter {
                name: name.to_string(),
                reason: "not writable".to_string(),
            });
        }
        self.increment = scalar_value(name, value)?;
        Ok(())
    }

    fn output_element_count(&self, output: &str, inputs: &InputWidths) -> Option<usize> {
        match output {
            "out" => inputs.get("in").copied(),
            _ => None,
        }
    }
}

impl RegionImplType for Incrementer {
    fn spec() -> Spec {
        Spec::builder("Adds a constant to every input element")
            .parameter(
                "increment",
                ParameterSpec::new(BasicType::Int32, AccessMode::ReadWrite).default_value(1i32),
            )
            .input(
                "in",
                InputSpec::new(BasicType::Int32).required().default_input(),
            )
            .output(
                "out",
                OutputSpec::new(BasicType::Int32)
                    .description("Same width as the input")
                    .default_output(),
            )
            .build()
    }

    fn from_parameters(params: &ParameterMap, _region: &RegionIdentity) -> NetworkResult<Self> {
        Ok(Self {
            increment: params.get_scalar("increment")?,
        })
    }

    fn from_saved_state(
        _state: &[u8],
        params: &ParameterMap,
        region: &RegionIdentity,
    ) -> NetworkResult<Self> {
        Self::from_parameters(params, region)
    }
}

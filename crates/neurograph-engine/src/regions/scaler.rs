// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use neurograph_structures::{BasicType, ParameterMap, ParameterValue};

use super::scalar_value;
use crate::error::{NetworkError, NetworkResult};
use crate::region_impl::{InputWidths, RegionIdentity, RegionImpl, RegionImplType, RegionIo};
use crate::spec::{AccessMode, InputSpec, OutputSpec, ParameterSpec, Spec};

/// `out[i] = in[i] * gain`
#[derive(Debug)]
pub struct Scaler {
    gain: f32,
}

impl RegionImpl for Scaler {
    fn compute(&mut self, io: &mut RegionIo<'_>) -> NetworkResult<()> {
        let (input, output) = io.input_output::<f32, f32>("in", "out")?;
        for (o, i) in output.iter_mut().zip(input) {
            *o = i * self.gain;
        }
        Ok(())
    }

    fn get_parameter(&self, name: &str) -> Option<ParameterValue> {
        (name == "gain").then(|| self.gain.into())
    }

    fn set_parameter(&mut self, name: &str, value: &ParameterValue) -> NetworkResult<()> {
        if name != "gain" {
            return Err(NetworkError::InvalidParameter {
                name: name.to_string(),
                reason: "not writable".to_string(),
            });
        }
        self.gain = scalar_value(name, value)?;
        Ok(())
    }

    fn output_element_count(&self, output: &str, inputs: &InputWidths) -> Option<usize> {
        match output {
            "out" => inputs.get("in").copied(),
            _ => None,
        }
    }
}

impl RegionImplType for Scaler {
    fn spec() -> Spec {
        Spec::builder("Multiplies every input element by a gain")
            .parameter(
                "gain",
                ParameterSpec::new(BasicType::Real32, AccessMode::ReadWrite).default_value(1.0f32),
            )
            .input("in", InputSpec::new(BasicType::Real32).default_input())
            .output("out", OutputSpec::new(BasicType::Real32).default_output())
            .build()
    }

    fn from_parameters(params: &ParameterMap, _region: &RegionIdentity) -> NetworkResult<Self> {
        Ok(Self {
            gain: params.get_scalar("gain")?,
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

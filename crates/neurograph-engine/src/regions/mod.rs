// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Small deterministic reference regions.
//!
//! They exercise every part of the region contract (fixed and derived output
//! sizes, runtime parameters, saved state) and are handy for wiring tests
//! and benchmarks.

mod accumulator;
mod counter_source;
mod incrementer;
mod scaler;

pub use accumulator::Accumulator;
pub use counter_source::CounterSource;
pub use incrementer::Incrementer;
pub use scaler::Scaler;

use neurograph_structures::{ParameterValue, ScalarValue};
use tracing::warn;

use crate::error::{NetworkError, NetworkResult};
use crate::factory::RegionImplFactory;

/// Register every reference region under its type name.
/// Names that are already taken are left alone.
pub fn register_builtin_regions(factory: &RegionImplFactory) {
    let results = [
        factory.register::<CounterSource>("CounterSource"),
        factory.register::<Incrementer>("Incrementer"),
        factory.register::<Accumulator>("Accumulator"),
        factory.register::<Scaler>("Scaler"),
    ];
    for err in results.into_iter().filter_map(Result::err) {
        warn!("[REGIONS] Built-in registration skipped: {}", err);
    }
}

/// Read a scalar runtime parameter value
pub(crate) fn scalar_value<T: ScalarValue>(name: &str, value: &ParameterValue) -> NetworkResult<T> {
    value
        .as_scalar()
        .and_then(T::from_scalar)
        .ok_or_else(|| NetworkError::ParameterTypeMismatch {
            name: name.to_string(),
            expected: T::BASIC_TYPE.to_string(),
            actual: value.to_string(),
        })
}

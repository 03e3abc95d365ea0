// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use neurograph_bundle::RegionRecord;
use neurograph_structures::ParameterMap;
use once_cell::sync::OnceCell;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::NetworkResult;
use crate::factory::RegionImplAdapter;
use crate::region_impl::{RegionIdentity, RegionImpl, RegionImplType};
use crate::spec::Spec;

/// Factory adapter for a statically known implementation type.
///
/// The `Spec` is computed on first use and shared afterwards. Errors from `T`
/// pass through unchanged.
pub struct RegisteredRegionImpl<T> {
    spec: OnceCell<Arc<Spec>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: RegionImplType> RegisteredRegionImpl<T> {
    pub fn new() -> Self {
        Self {
            spec: OnceCell::new(),
            _marker: PhantomData,
        }
    }
}

impl<T: RegionImplType> Default for RegisteredRegionImpl<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: RegionImplType> RegionImplAdapter for RegisteredRegionImpl<T> {
    fn create_impl(
        &self,
        params: &ParameterMap,
        region: &RegionIdentity,
    ) -> NetworkResult<Box<dyn RegionImpl>> {
        Ok(Box::new(T::from_parameters(params, region)?))
    }

    fn deserialize_impl(
        &self,
        record: &RegionRecord,
        region: &RegionIdentity,
    ) -> NetworkResult<Box<dyn RegionImpl>> {
        Ok(Box::new(T::from_saved_state(
            &record.state,
            &record.parameters,
            region,
        )?))
    }

    fn create_spec(&self) -> Arc<Spec> {
        Arc::clone(self.spec.get_or_init(|| Arc::new(T::spec())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NetworkError;
    use crate::region_impl::RegionIo;
    use crate::spec::{OutputSpec, Spec};
    use neurograph_structures::BasicType;

    struct Failing;

    impl RegionImpl for Failing {
        fn compute(&mut self, _io: &mut RegionIo<'_>) -> NetworkResult<()> {
            Ok(())
        }
    }

    impl RegionImplType for Failing {
        fn spec() -> Spec {
            Spec::builder("never builds")
                .output("out", OutputSpec::new(BasicType::Byte).count(1))
                .build()
        }

        fn from_parameters(_: &ParameterMap, region: &RegionIdentity) -> NetworkResult<Self> {
            Err(NetworkError::Implementation(format!("{} refused", region.name)))
        }

        fn from_saved_state(
            state: &[u8],
            _: &ParameterMap,
            _: &RegionIdentity,
        ) -> NetworkResult<Self> {
            if state.is_empty() {
                Ok(Failing)
            } else {
                Err(NetworkError::InvalidState("unexpected state".to_string()))
            }
        }
    }

    #[test]
    fn test_spec_is_computed_once() {
        let adapter = RegisteredRegionImpl::<Failing>::new();
        let a = adapter.create_spec();
        let b = adapter.create_spec();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.description, "never builds");
    }

    #[test]
    fn test_errors_pass_through() {
        let adapter = RegisteredRegionImpl::<Failing>::new();
        let region = RegionIdentity::new("x", "Failing");
        assert!(matches!(
            adapter.create_impl(&ParameterMap::new(), &region),
            Err(NetworkError::Implementation(msg)) if msg == "x refused"
        ));

        let mut record = RegionRecord::new("Failing", ParameterMap::new(), vec![1]);
        assert!(matches!(
            adapter.deserialize_impl(&record, &region),
            Err(NetworkError::InvalidState(_))
        ));
        record.state.clear();
        assert!(adapter.deserialize_impl(&record, &region).is_ok());
    }
}

// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0
//! Factory resolution, registration and parameter validation.

use std::sync::Arc;

use neurograph_engine::{
    AccessMode, ImplementationHandle, NetworkError, NetworkResult, OutputSpec, ParameterSpec,
    RegionIdentity, RegionImpl, RegionImplFactory, RegionImplType, RegionIo,
    RegisteredRegionImpl, Spec,
};
use neurograph_structures::{BasicType, ParameterMap, ParameterValue, Scalar};

/// Emits its `values` parameter every cycle
struct Constant {
    values: Vec<i32>,
}

impl RegionImpl for Constant {
    fn compute(&mut self, io: &mut RegionIo<'_>) -> NetworkResult<()> {
        io.output_slice_mut::<i32>("out")?
            .copy_from_slice(&self.values);
        Ok(())
    }

    fn output_element_count(
        &self,
        _output: &str,
        _inputs: &neurograph_engine::InputWidths,
    ) -> Option<usize> {
        Some(self.values.len())
    }
}

impl RegionImplType for Constant {
    fn spec() -> Spec {
        Spec::builder("constant")
            .parameter(
                "values",
                ParameterSpec::new(BasicType::Int32, AccessMode::CreateOnly).count(0),
            )
            .parameter(
                "label",
                ParameterSpec::string(AccessMode::CreateOnly).default_value("constant"),
            )
            .parameter(
                "revision",
                ParameterSpec::new(BasicType::UInt32, AccessMode::ReadOnly),
            )
            .output("out", OutputSpec::new(BasicType::Int32).default_output())
            .build()
    }

    fn from_parameters(params: &ParameterMap, _region: &RegionIdentity) -> NetworkResult<Self> {
        Ok(Self {
            values: params.get_array("values")?,
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

fn factory() -> RegionImplFactory {
    let factory = RegionImplFactory::new();
    factory.register::<Constant>("Constant").unwrap();
    factory
}

fn identity() -> RegionIdentity {
    RegionIdentity::new("c", "Constant")
}

#[test]
fn test_create_impl_fills_defaults() {
    let factory = factory();
    let params = ParameterMap::new().with("values", vec![1i64, 2, 3]);
    let (_instance, normalized) = factory.create_impl("Constant", &params, &identity()).unwrap();

    assert_eq!(normalized.get_string("label").unwrap(), "constant");
    assert_eq!(
        normalized.get("values"),
        Some(&ParameterValue::Sequence(vec![
            Scalar::Int32(1),
            Scalar::Int32(2),
            Scalar::Int32(3)
        ]))
    );
    assert!(!normalized.contains("revision"));
}

#[test]
fn test_create_impl_error_kinds() {
    let factory = factory();
    let id = identity();

    assert!(matches!(
        factory.create_impl("Nope", &ParameterMap::new(), &id),
        Err(NetworkError::UnknownRegionType(_))
    ));
    assert!(matches!(
        factory.create_impl("Constant", &ParameterMap::new(), &id),
        Err(NetworkError::MissingParameter(name)) if name == "values"
    ));
    assert!(matches!(
        factory.create_impl(
            "Constant",
            &ParameterMap::new().with("values", vec![1i32]).with("bogus", 1u8),
            &id
        ),
        Err(NetworkError::InvalidParameter { .. })
    ));
    assert!(matches!(
        factory.create_impl(
            "Constant",
            &ParameterMap::new().with("values", vec![1i32]).with("revision", 2u32),
            &id
        ),
        Err(NetworkError::InvalidParameter { .. })
    ));
    assert!(matches!(
        factory.create_impl(
            "Constant",
            &ParameterMap::new().with("values", vec![0.5f64]),
            &id
        ),
        Err(NetworkError::ParameterTypeMismatch { .. })
    ));
}

#[test]
fn test_register_twice_then_unregister() {
    let factory = factory();
    assert!(matches!(
        factory.register::<Constant>("Constant"),
        Err(NetworkError::DuplicateRegionType(_))
    ));
    factory.unregister_type("Constant").unwrap();
    assert!(matches!(
        factory.resolve("Constant"),
        Err(NetworkError::UnknownRegionType(_))
    ));
}

#[test]
fn test_resolvers_are_tried_in_order() {
    let factory = RegionImplFactory::new();
    let first = |name: &str| -> Option<ImplementationHandle> {
        name.starts_with("ext.")
            .then(|| Arc::new(RegisteredRegionImpl::<Constant>::new()) as ImplementationHandle)
    };
    let second = |_: &str| -> Option<ImplementationHandle> { None };
    factory.add_resolver(Arc::new(second));
    factory.add_resolver(Arc::new(first));

    let spec = factory.get_spec("ext.constant").unwrap();
    assert_eq!(spec.description, "constant");
    assert!(factory.resolve("local").is_err());
}

#[test]
fn test_factory_is_shareable_across_threads() {
    let factory = Arc::new(RegionImplFactory::with_builtin_regions());
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let factory = Arc::clone(&factory);
            std::thread::spawn(move || factory.get_spec("Incrementer").map(|s| s.inputs().count()))
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap().unwrap(), 1);
    }
}

// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0
//! Wiring, ordering and cycle execution.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use neurograph_config::NetworkConfig;
use neurograph_engine::{
    AccessMode, CycleControl, InputSpec, LinkId, LinkSpec, Network, NetworkError, NetworkResult,
    NetworkState, OutputSpec, ParameterSpec, RegionIdentity, RegionImpl, RegionImplFactory,
    RegionImplType, RegionIo, Spec,
};
use neurograph_structures::{BasicType, ParameterMap, ParameterValue, ReindexRule};
use proptest::prelude::*;

/// Two element relay: `out = in + 1`
struct Relay;

impl RegionImpl for Relay {
    fn compute(&mut self, io: &mut RegionIo<'_>) -> NetworkResult<()> {
        let (input, output) = io.input_output::<i32, i32>("in", "out")?;
        for (o, i) in output.iter_mut().zip(input) {
            *o = i + 1;
        }
        Ok(())
    }
}

impl RegionImplType for Relay {
    fn spec() -> Spec {
        Spec::builder("relay")
            .input("in", InputSpec::new(BasicType::Int32).count(2))
            .output("out", OutputSpec::new(BasicType::Int32).count(2))
            .build()
    }

    fn from_parameters(_: &ParameterMap, _: &RegionIdentity) -> NetworkResult<Self> {
        Ok(Relay)
    }

    fn from_saved_state(_: &[u8], _: &ParameterMap, _: &RegionIdentity) -> NetworkResult<Self> {
        Ok(Relay)
    }
}

/// Copies its input, failing from iteration `fail_at` on
struct Faulty {
    fail_at: u64,
}

impl RegionImpl for Faulty {
    fn compute(&mut self, io: &mut RegionIo<'_>) -> NetworkResult<()> {
        if io.iteration() >= self.fail_at {
            return Err(NetworkError::Implementation("sensor unplugged".to_string()));
        }
        let (input, output) = io.input_output::<i32, i32>("in", "out")?;
        output.copy_from_slice(input);
        Ok(())
    }

    fn output_element_count(
        &self,
        _output: &str,
        inputs: &neurograph_engine::InputWidths,
    ) -> Option<usize> {
        inputs.get("in").copied()
    }
}

impl RegionImplType for Faulty {
    fn spec() -> Spec {
        Spec::builder("fails on purpose")
            .parameter(
                "fail_at",
                ParameterSpec::new(BasicType::UInt64, AccessMode::CreateOnly),
            )
            .input("in", InputSpec::new(BasicType::Int32).required().default_input())
            .output("out", OutputSpec::new(BasicType::Int32).default_output())
            .build()
    }

    fn from_parameters(params: &ParameterMap, _: &RegionIdentity) -> NetworkResult<Self> {
        Ok(Faulty {
            fail_at: params.get_scalar("fail_at")?,
        })
    }

    fn from_saved_state(_: &[u8], params: &ParameterMap, id: &RegionIdentity) -> NetworkResult<Self> {
        Self::from_parameters(params, id)
    }
}

/// Prefix sums computed in place in its input buffer, then copied out
struct PrefixSum;

impl RegionImpl for PrefixSum {
    fn compute(&mut self, io: &mut RegionIo<'_>) -> NetworkResult<()> {
        let scratch = io.input_slice_mut::<i32>("in")?;
        for i in 1..scratch.len() {
            scratch[i] += scratch[i - 1];
        }
        let (sums, output) = io.input_output::<i32, i32>("in", "out")?;
        output.copy_from_slice(sums);
        Ok(())
    }

    fn output_element_count(
        &self,
        _output: &str,
        inputs: &neurograph_engine::InputWidths,
    ) -> Option<usize> {
        inputs.get("in").copied()
    }
}

impl RegionImplType for PrefixSum {
    fn spec() -> Spec {
        Spec::builder("prefix sums")
            .input("in", InputSpec::new(BasicType::Int32).required().default_input())
            .output("out", OutputSpec::new(BasicType::Int32).default_output())
            .build()
    }

    fn from_parameters(_: &ParameterMap, _: &RegionIdentity) -> NetworkResult<Self> {
        Ok(PrefixSum)
    }

    fn from_saved_state(_: &[u8], _: &ParameterMap, _: &RegionIdentity) -> NetworkResult<Self> {
        Ok(PrefixSum)
    }
}

fn factory() -> Arc<RegionImplFactory> {
    let factory = RegionImplFactory::with_builtin_regions();
    factory.register::<Relay>("Relay").unwrap();
    factory.register::<Faulty>("Faulty").unwrap();
    factory.register::<PrefixSum>("PrefixSum").unwrap();
    Arc::new(factory)
}

fn counter(net: &mut Network, name: &str, width: u32, start: i32) {
    net.add_region(
        name,
        "CounterSource",
        &ParameterMap::new().with("width", width).with("start", start),
    )
    .unwrap();
}

fn values(net: &Network, region: &str, output: &str) -> Vec<i32> {
    net.region(region)
        .unwrap()
        .output_data(output)
        .unwrap()
        .to_vec::<i32>()
        .unwrap()
}

#[test]
fn test_identity_propagation_after_one_cycle() {
    let mut net = Network::new(factory());
    counter(&mut net, "gen", 3, 5);
    net.add_region("acc", "Accumulator", &ParameterMap::new()).unwrap();
    net.link_default("gen", "acc").unwrap();
    net.initialize().unwrap();
    net.run(1).unwrap();

    let acc = net.region("acc").unwrap();
    assert_eq!(acc.input_data("in").unwrap().to_vec::<i32>().unwrap(), vec![5, 6, 7]);
    assert_eq!(
        acc.output_data("sum").unwrap().to_vec::<i64>().unwrap(),
        vec![5, 6, 7]
    );
    assert_eq!(net.iteration(), 1);
    assert_eq!(net.state(), NetworkState::Initialized);
}

#[test]
fn test_links_concatenate_in_registration_order() {
    let mut net = Network::new(factory());
    counter(&mut net, "gen", 6, 10);
    net.add_region("inc", "Incrementer", &ParameterMap::new().with("increment", 100i32))
        .unwrap();
    net.add_link(
        LinkSpec::new("gen", "out", "inc", "in").reindex(ReindexRule::Range { offset: 2, count: 3 }),
    )
    .unwrap();
    // One link per endpoint pair, whatever its reindex rule
    assert!(matches!(
        net.add_link(
            LinkSpec::new("gen", "out", "inc", "in").reindex(ReindexRule::Indices(vec![5, 0])),
        ),
        Err(NetworkError::DuplicateLink(_))
    ));
    net.add_region("gen2", "CounterSource", &ParameterMap::new().with("width", 2u32))
        .unwrap();
    net.add_link(
        LinkSpec::new("gen2", "out", "inc", "in").reindex(ReindexRule::Indices(vec![1, 0])),
    )
    .unwrap();

    net.run(1).unwrap();
    assert_eq!(values(&net, "inc", "out"), vec![112, 113, 114, 101, 100]);
}

#[test]
fn test_duplicate_and_missing_link() {
    let mut net = Network::new(factory());
    counter(&mut net, "gen", 2, 0);
    net.add_region("inc", "Incrementer", &ParameterMap::new()).unwrap();
    let id = net.link_default("gen", "inc").unwrap();

    assert!(matches!(
        net.link_default("gen", "inc"),
        Err(NetworkError::DuplicateLink(_))
    ));
    net.remove_link(id).unwrap();
    assert!(matches!(
        net.remove_link(id),
        Err(NetworkError::MissingLink(_))
    ));
    assert!(matches!(
        net.remove_link(LinkId(99)),
        Err(NetworkError::MissingLink(_))
    ));
}

#[test]
fn test_type_mismatch_rejected_at_add() {
    let mut net = Network::new(factory());
    counter(&mut net, "gen", 2, 0);
    net.add_region("scale", "Scaler", &ParameterMap::new()).unwrap();
    assert!(matches!(
        net.link_default("gen", "scale"),
        Err(NetworkError::TypeMismatchOnLink {
            source_type: BasicType::Int32,
            dest_type: BasicType::Real32,
            ..
        })
    ));
    assert_eq!(net.links().count(), 0);
}

#[test]
fn test_cycle_needs_a_delay() {
    let mut net = Network::new(factory());
    net.add_region("a", "Relay", &ParameterMap::new()).unwrap();
    net.add_region("b", "Relay", &ParameterMap::new()).unwrap();
    net.add_link(LinkSpec::new("a", "out", "b", "in")).unwrap();
    let back = net.add_link(LinkSpec::new("b", "out", "a", "in")).unwrap();

    match net.initialize() {
        Err(NetworkError::CyclicGraph(regions)) => assert_eq!(regions, vec!["a", "b"]),
        other => panic!("expected a cycle, got {:?}", other),
    }

    net.remove_link(back).unwrap();
    net.add_link(LinkSpec::new("b", "out", "a", "in").delay(1))
        .unwrap();
    net.initialize().unwrap();
    assert_eq!(net.execution_order().unwrap(), vec!["a", "b"]);

    net.run(3).unwrap();
    assert_eq!(values(&net, "a", "out"), vec![5, 5]);
    assert_eq!(values(&net, "b", "out"), vec![6, 6]);
}

#[test]
fn test_delay_shifts_visibility() {
    let mut net = Network::new(factory());
    counter(&mut net, "gen", 1, 10);
    net.add_region("inc", "Incrementer", &ParameterMap::new()).unwrap();
    net.add_link(LinkSpec::between_defaults("gen", "inc").delay(2))
        .unwrap();

    let mut seen = Vec::new();
    for _ in 0..4 {
        net.run(1).unwrap();
        seen.push(values(&net, "inc", "out")[0]);
    }
    assert_eq!(seen, vec![1, 1, 11, 12]);
}

#[test]
fn test_initialize_validation_errors() {
    let mut net = Network::new(factory());
    counter(&mut net, "gen", 4, 0);
    net.add_region("relay", "Relay", &ParameterMap::new()).unwrap();
    net.add_link(LinkSpec::new("gen", "out", "relay", "in")).unwrap();
    assert!(matches!(
        net.initialize(),
        Err(NetworkError::ElementCountMismatch {
            expected: 2,
            actual: 4,
            ..
        })
    ));

    let mut net = Network::new(factory());
    counter(&mut net, "gen", 4, 0);
    net.add_region("inc", "Incrementer", &ParameterMap::new()).unwrap();
    net.add_link(
        LinkSpec::between_defaults("gen", "inc").reindex(ReindexRule::Range { offset: 3, count: 4 }),
    )
    .unwrap();
    assert!(matches!(
        net.initialize(),
        Err(NetworkError::InvalidReindex { .. })
    ));

    let mut net = Network::new(factory());
    net.add_region("x", "Incrementer", &ParameterMap::new()).unwrap();
    net.add_region("y", "Incrementer", &ParameterMap::new()).unwrap();
    net.link_default("x", "y").unwrap();
    net.add_link(LinkSpec::between_defaults("y", "x").delay(1)).unwrap();
    assert!(matches!(
        net.initialize(),
        Err(NetworkError::UnresolvedElementCount(_))
    ));
}

#[test]
fn test_default_endpoints_required_for_shorthand() {
    let mut net = Network::new(factory());
    net.add_region("a", "Relay", &ParameterMap::new()).unwrap();
    net.add_region("b", "Relay", &ParameterMap::new()).unwrap();
    assert!(matches!(
        net.link_default("a", "b"),
        Err(NetworkError::UnknownOutput { .. })
    ));
}

#[test]
fn test_compute_failure_stops_network() {
    let mut net = Network::new(factory());
    counter(&mut net, "gen", 2, 1);
    net.add_region("faulty", "Faulty", &ParameterMap::new().with("fail_at", 2u64))
        .unwrap();
    net.add_region("inc", "Incrementer", &ParameterMap::new()).unwrap();
    net.link_default("gen", "faulty").unwrap();
    net.link_default("faulty", "inc").unwrap();

    match net.run(5) {
        Err(NetworkError::RegionComputeFailure { region, cycle, source }) => {
            assert_eq!(region, "faulty");
            assert_eq!(cycle, 2);
            assert!(matches!(*source, NetworkError::Implementation(_)));
        }
        other => panic!("expected compute failure, got {:?}", other),
    }
    assert_eq!(net.state(), NetworkState::Stopped);
    assert_eq!(net.iteration(), 2);
    // Downstream keeps the values of the last completed cycle
    assert_eq!(values(&net, "inc", "out"), vec![3, 4]);
}

#[test]
fn test_callback_halts_between_cycles() {
    let mut net = Network::new(factory());
    counter(&mut net, "gen", 1, 0);
    let calls = Arc::new(AtomicU64::new(0));
    let seen = Arc::clone(&calls);
    net.add_callback(move |network, iteration| {
        seen.fetch_add(1, Ordering::SeqCst);
        assert_eq!(network.iteration(), iteration);
        if iteration == 3 {
            CycleControl::Halt
        } else {
            CycleControl::Continue
        }
    });

    net.run(10).unwrap();
    assert_eq!(net.iteration(), 3);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(net.state(), NetworkState::Stopped);

    // Stopped networks accept topology changes again
    net.add_region("inc", "Incrementer", &ParameterMap::new()).unwrap();
    net.link_default("gen", "inc").unwrap();
    net.run(1).unwrap();
    assert_eq!(values(&net, "inc", "out"), vec![4]);
}

#[test]
fn test_runtime_parameter_change() {
    let mut net = Network::new(factory());
    counter(&mut net, "gen", 2, 0);
    net.run(1).unwrap();
    assert_eq!(values(&net, "gen", "out"), vec![0, 1]);

    let gen = net.region_mut("gen").unwrap();
    gen.set_parameter("step", 10i32).unwrap();
    assert!(matches!(
        gen.set_parameter("width", 3u32),
        Err(NetworkError::ParameterNotWritable { .. })
    ));
    net.run(1).unwrap();
    assert_eq!(values(&net, "gen", "out"), vec![10, 11]);
    assert_eq!(
        net.region("gen").unwrap().get_parameter("step").unwrap(),
        ParameterValue::from(10i32)
    );
}

#[test]
fn test_profiling_collects_stats() {
    let config = NetworkConfig {
        profiling: true,
        log_interval: 2,
    };
    let mut net = Network::with_config(factory(), config);
    counter(&mut net, "gen", 8, 0);
    net.run(4).unwrap();
    assert_eq!(net.region("gen").unwrap().stats().compute_count, 4);

    let mut quiet = Network::new(factory());
    counter(&mut quiet, "gen", 8, 0);
    quiet.run(4).unwrap();
    assert_eq!(quiet.region("gen").unwrap().stats().compute_count, 0);
}

#[test]
fn test_remove_region_detaches_links() {
    let mut net = Network::new(factory());
    counter(&mut net, "gen", 2, 0);
    net.add_region("inc", "Incrementer", &ParameterMap::new()).unwrap();
    net.add_region("acc", "Accumulator", &ParameterMap::new()).unwrap();
    net.link_default("gen", "inc").unwrap();
    net.link_default("inc", "acc").unwrap();

    net.remove_region("inc").unwrap();
    assert_eq!(net.links().count(), 0);
    assert!(!net.region("gen").unwrap().output("out").unwrap().has_outgoing_links());
    assert!(matches!(net.region("inc"), Err(NetworkError::UnknownRegion(_))));

    net.link_default("gen", "acc").unwrap();
    net.run(1).unwrap();
    assert_eq!(net.execution_order().unwrap(), vec!["gen", "acc"]);
}

#[test]
fn test_stop_requires_initialized_network() {
    let mut net = Network::new(factory());
    assert!(matches!(net.stop(), Err(NetworkError::InvalidState(_))));
    counter(&mut net, "gen", 1, 0);
    net.initialize().unwrap();
    net.stop().unwrap();
    assert_eq!(net.state(), NetworkState::Stopped);
}

proptest! {
    #[test]
    fn prop_execution_order_respects_links(
        (n, bits, insertion) in (2usize..8).prop_flat_map(|n| (
            Just(n),
            proptest::collection::vec(any::<bool>(), n * n),
            Just((0..n).collect::<Vec<usize>>()).prop_shuffle(),
        ))
    ) {
        let mut net = Network::new(factory());
        for node in &insertion {
            net.add_region(&format!("n{}", node), "Scaler", &ParameterMap::new()).unwrap();
        }
        let mut edges = Vec::new();
        for i in 0..n {
            for j in (i + 1)..n {
                if bits[i * n + j] {
                    net.link_default(&format!("n{}", i), &format!("n{}", j)).unwrap();
                    edges.push((i, j));
                }
            }
        }
        net.initialize().unwrap();

        let order = net.execution_order().unwrap();
        let position = |node: usize| {
            let name = format!("n{}", node);
            order.iter().position(|r| *r == name).unwrap()
        };
        for (i, j) in edges {
            prop_assert!(position(i) < position(j));
            let phase_i = net.region(&format!("n{}", i)).unwrap().phase().unwrap();
            let phase_j = net.region(&format!("n{}", j)).unwrap().phase().unwrap();
            prop_assert!(phase_i < phase_j);
        }
        prop_assert_eq!(order.len(), n);
    }
}

#[test]
fn test_rejected_resize_leaves_buffers_untouched() {
    let mut net = Network::new(factory());
    net.add_region("pre", "Incrementer", &ParameterMap::new()).unwrap();
    counter(&mut net, "gen", 4, 0);
    counter(&mut net, "small", 3, 0);
    net.add_region("inc", "Incrementer", &ParameterMap::new()).unwrap();
    net.add_region("acc", "Accumulator", &ParameterMap::new()).unwrap();
    net.link_default("gen", "pre").unwrap();
    net.link_default("gen", "inc").unwrap();
    net.link_default("inc", "acc").unwrap();
    net.run(1).unwrap();
    net.stop().unwrap();

    // Both incrementers switch to the narrower source; only `inc` feeds a link
    for dest in ["pre", "inc"] {
        let id = net.find_link("gen", "out", dest, "in").unwrap();
        net.remove_link(id).unwrap();
        net.link_default("small", dest).unwrap();
    }

    assert!(matches!(
        net.initialize(),
        Err(NetworkError::BufferResize { ref endpoint, current: 4, requested: 3 })
            if endpoint == "inc.out"
    ));
    assert_eq!(net.state(), NetworkState::Unbuilt);
    assert_eq!(values(&net, "pre", "out"), vec![1, 2, 3, 4]);
    assert_eq!(values(&net, "inc", "out"), vec![1, 2, 3, 4]);
}

#[test]
fn test_input_buffer_is_private_scratch() {
    let mut net = Network::new(factory());
    counter(&mut net, "gen", 4, 1);
    net.add_region("sum", "PrefixSum", &ParameterMap::new()).unwrap();
    net.link_default("gen", "sum").unwrap();

    net.run(1).unwrap();
    assert_eq!(values(&net, "gen", "out"), vec![1, 2, 3, 4]);
    assert_eq!(values(&net, "sum", "out"), vec![1, 3, 6, 10]);

    // Refilled from the source every cycle
    net.run(1).unwrap();
    assert_eq!(values(&net, "sum", "out"), vec![2, 5, 9, 14]);
}

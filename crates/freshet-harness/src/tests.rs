//! Harness property suite: guards, identity and fold semantics, joins,
//! window bucketing, configuration, determinism, and facade accumulation.

#![allow(clippy::similar_names)]

use std::collections::BTreeMap;

use freshet_core::{
    Codec, FlowError, JsonCodec, StringCodec, TopologyBuilder, TumblingWindow,
};

use crate::config::TIMESTAMP_POLICY;
use crate::error::HarnessError;
use crate::harness::{Harness, HarnessBuilder};

const KEYS: StringCodec = StringCodec;
const VALUES: StringCodec = StringCodec;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
    items
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

/// Uppercases string values, key untouched.
fn uppercase_topology(t: &mut TopologyBuilder) {
    t.stream("input")
        .map(|key, value| Ok((key.to_vec(), value.to_ascii_uppercase())))
        .to("output");
}

/// Forwards records unchanged.
fn passthrough_topology(t: &mut TopologyBuilder) {
    t.stream("input").to("output");
}

fn uppercase_harness() -> Harness {
    HarnessBuilder::new().topology(uppercase_topology)
}

/// Materializes both inputs as tables and joins them by integer addition.
fn sum_join_topology(t: &mut TopologyBuilder) {
    let values = JsonCodec::<i64>::new();
    let left = t.stream("a").table("store-a");
    let right = t.stream("b").table("store-b");
    left.join(&right, move |l, r| {
        let sum = values.decode(l)? + values.decode(r)?;
        values.encode(&sum)
    })
    .to("joined");
}

/// Counts records per key within 10-unit tumbling windows.
fn windowed_count_topology(t: &mut TopologyBuilder) {
    let counts = JsonCodec::<i64>::new();
    let _ = t.stream("events").window_aggregate(
        "window-counts",
        TumblingWindow::new(10),
        move |acc, _key, _value| {
            let current = match acc {
                Some(bytes) => counts.decode(bytes)?,
                None => 0,
            };
            counts.encode(&(current + 1))
        },
    );
}

// ---- Validation guards ----

#[test]
fn test_zero_count_rejected_before_runtime() {
    // The topology references an undeclared store, so any run would fail;
    // the size guard must fire before a run is ever attempted.
    let harness = HarnessBuilder::new()
        .topology(|t| {
            let _ = t.stream("input").table("undeclared");
        })
        .input("input", &KEYS, &VALUES, pairs(&[("k", "v")]));

    assert!(matches!(
        harness.output("output", &KEYS, &VALUES, 0),
        Err(HarnessError::ExpectedOutputIsEmpty)
    ));
    assert!(matches!(
        harness.output_table("output", &KEYS, &VALUES, 0),
        Err(HarnessError::ExpectedOutputIsEmpty)
    ));
}

#[test]
fn test_reads_without_input_rejected() {
    let harness = uppercase_harness().stores(["some-store"]);

    assert!(matches!(
        harness.output("output", &KEYS, &VALUES, 1),
        Err(HarnessError::NoInputSpecified)
    ));
    assert!(matches!(
        harness.output_table("output", &KEYS, &VALUES, 1),
        Err(HarnessError::NoInputSpecified)
    ));
    assert!(matches!(
        harness.state_table("some-store", &KEYS, &VALUES),
        Err(HarnessError::NoInputSpecified)
    ));
    assert!(matches!(
        harness.window_state_table("some-store", &"k".to_string(), &KEYS, &VALUES),
        Err(HarnessError::NoInputSpecified)
    ));
}

#[test]
fn test_empty_batch_does_not_satisfy_input_guard() {
    let harness = uppercase_harness().input("input", &KEYS, &VALUES, Vec::new());
    assert!(matches!(
        harness.output("output", &KEYS, &VALUES, 1),
        Err(HarnessError::NoInputSpecified)
    ));
}

// ---- Output extraction ----

#[test]
fn test_uppercase_identity() {
    init_tracing();
    let harness =
        uppercase_harness().input("input", &KEYS, &VALUES, pairs(&[("x", "v1"), ("y", "v2")]));

    let out = harness.output("output", &KEYS, &VALUES, 2).unwrap();
    assert_eq!(out, pairs(&[("x", "V1"), ("y", "V2")]));

    let table = harness.output_table("output", &KEYS, &VALUES, 2).unwrap();
    let expected: BTreeMap<String, String> =
        pairs(&[("x", "V1"), ("y", "V2")]).into_iter().collect();
    assert_eq!(table, expected);
}

#[test]
fn test_output_shortfall_is_not_an_error() {
    let harness = uppercase_harness().input("input", &KEYS, &VALUES, pairs(&[("x", "v")]));
    let out = harness.output("output", &KEYS, &VALUES, 5).unwrap();
    assert_eq!(out, pairs(&[("x", "V")]));
}

#[test]
fn test_unwritten_output_channel_reads_empty() {
    let harness = uppercase_harness().input("input", &KEYS, &VALUES, pairs(&[("x", "v")]));
    let out = harness
        .output("nobody-writes-here", &KEYS, &VALUES, 3)
        .unwrap();
    assert_eq!(out, pairs(&[]));
}

#[test]
fn test_output_table_is_last_write_wins_fold_of_output() {
    let harness = HarnessBuilder::new().topology(passthrough_topology).input(
        "input",
        &KEYS,
        &VALUES,
        pairs(&[("x", "1"), ("y", "2"), ("x", "3"), ("x", "4"), ("z", "5")]),
    );

    let sequence = harness.output("output", &KEYS, &VALUES, 5).unwrap();
    let mut folded: BTreeMap<String, String> = BTreeMap::new();
    for (k, v) in sequence {
        folded.insert(k, v);
    }

    let table = harness.output_table("output", &KEYS, &VALUES, 5).unwrap();
    assert_eq!(table, folded);
    assert_eq!(table.get("x"), Some(&"4".to_string()));
}

#[test]
fn test_output_table_fold_respects_count_bound() {
    let harness = HarnessBuilder::new().topology(passthrough_topology).input(
        "input",
        &KEYS,
        &VALUES,
        pairs(&[("x", "1"), ("x", "2"), ("x", "3")]),
    );

    // Only the first two emissions take part in the fold.
    let table = harness.output_table("output", &KEYS, &VALUES, 2).unwrap();
    assert_eq!(table.get("x"), Some(&"2".to_string()));
}

// ---- Joins and state tables ----

#[test]
fn test_join_adds_values_and_keeps_intermediate_store() {
    init_tracing();
    let values = JsonCodec::<i64>::new();
    let harness = HarnessBuilder::new()
        .topology(sum_join_topology)
        .stores(["store-a", "store-b"])
        .input(
            "a",
            &KEYS,
            &values,
            vec![("x".to_string(), 1), ("y".to_string(), 2)],
        )
        .input(
            "b",
            &KEYS,
            &values,
            vec![("x".to_string(), 4), ("y".to_string(), 3)],
        );

    let out = harness.output("joined", &KEYS, &values, 2).unwrap();
    assert_eq!(out, vec![("x".to_string(), 5), ("y".to_string(), 5)]);

    // The left table holds the last value seen per key from input "a".
    let store_a = harness.state_table("store-a", &KEYS, &values).unwrap();
    let expected: BTreeMap<String, i64> = [("x".to_string(), 1), ("y".to_string(), 2)]
        .into_iter()
        .collect();
    assert_eq!(store_a, expected);
}

#[test]
fn test_state_table_reads_whole_store() {
    let values = JsonCodec::<i64>::new();
    let harness = HarnessBuilder::new()
        .topology(|t| {
            let _ = t.stream("input").table("latest");
        })
        .stores(["latest"])
        .input(
            "input",
            &KEYS,
            &values,
            vec![
                ("a".to_string(), 1),
                ("b".to_string(), 2),
                ("a".to_string(), 10),
                ("c".to_string(), 3),
            ],
        );

    let table = harness.state_table("latest", &KEYS, &values).unwrap();
    assert_eq!(table.len(), 3);
    assert_eq!(table.get("a"), Some(&10));
}

#[test]
fn test_declared_but_unwritten_store_reads_empty() {
    let harness = uppercase_harness()
        .stores(["spare"])
        .input("input", &KEYS, &VALUES, pairs(&[("k", "v")]));

    let table = harness.state_table("spare", &KEYS, &VALUES).unwrap();
    assert_eq!(table, BTreeMap::new());
}

#[test]
fn test_reading_undeclared_store_fails() {
    let harness = uppercase_harness().input("input", &KEYS, &VALUES, pairs(&[("k", "v")]));
    assert!(matches!(
        harness.state_table("missing", &KEYS, &VALUES),
        Err(HarnessError::Flow(FlowError::StoreNotRegistered(name))) if name == "missing"
    ));
}

#[test]
fn test_topology_referencing_undeclared_store_fails_the_read() {
    let harness = HarnessBuilder::new()
        .topology(|t| {
            let _ = t.stream("input").table("forgotten");
        })
        .input("input", &KEYS, &VALUES, pairs(&[("k", "v")]));

    assert!(matches!(
        harness.output("output", &KEYS, &VALUES, 1),
        Err(HarnessError::Flow(FlowError::StoreNotRegistered(name))) if name == "forgotten"
    ));
}

#[test]
fn test_aggregate_changelog_and_store_agree() {
    let values = JsonCodec::<i64>::new();
    let sums = JsonCodec::<i64>::new();
    let harness = HarnessBuilder::new()
        .topology(move |t| {
            t.stream("input")
                .aggregate("running-sums", move |acc, _key, value| {
                    let current = match acc {
                        Some(bytes) => sums.decode(bytes)?,
                        None => 0,
                    };
                    sums.encode(&(current + sums.decode(value)?))
                })
                .to_stream()
                .to("changelog");
        })
        .stores(["running-sums"])
        .input(
            "input",
            &KEYS,
            &values,
            vec![
                ("x".to_string(), 1),
                ("x".to_string(), 2),
                ("y".to_string(), 10),
            ],
        );

    let changelog = harness.output("changelog", &KEYS, &values, 3).unwrap();
    assert_eq!(
        changelog,
        vec![
            ("x".to_string(), 1),
            ("x".to_string(), 3),
            ("y".to_string(), 10),
        ]
    );

    let store = harness.state_table("running-sums", &KEYS, &values).unwrap();
    assert_eq!(store.get("x"), Some(&3));
    assert_eq!(store.get("y"), Some(&10));
}

// ---- Windowed state ----

#[test]
fn test_window_bucketing_partitions_by_window_start() {
    let counts = JsonCodec::<i64>::new();
    let harness = HarnessBuilder::new()
        .topology(windowed_count_topology)
        .stores(["window-counts"])
        .input_at(
            "events",
            &KEYS,
            &VALUES,
            vec![
                ("u".to_string(), "a".to_string(), 1),
                ("u".to_string(), "b".to_string(), 5),
                ("u".to_string(), "c".to_string(), 12),
                ("v".to_string(), "d".to_string(), 3),
            ],
        );

    let windows_u = harness
        .window_state_table("window-counts", &"u".to_string(), &KEYS, &counts)
        .unwrap();
    let expected_u: BTreeMap<i64, i64> = [(0, 2), (10, 1)].into_iter().collect();
    assert_eq!(windows_u, expected_u);

    // No cross-key leakage: "v" only sees its own window.
    let windows_v = harness
        .window_state_table("window-counts", &"v".to_string(), &KEYS, &counts)
        .unwrap();
    let expected_v: BTreeMap<i64, i64> = [(0, 1)].into_iter().collect();
    assert_eq!(windows_v, expected_v);

    let windows_absent = harness
        .window_state_table("window-counts", &"w".to_string(), &KEYS, &counts)
        .unwrap();
    assert!(windows_absent.is_empty());
}

#[test]
fn test_default_sequence_time_drives_windows() {
    // Without explicit timestamps the sequence counter supplies logical
    // time: six records get times 0..=5, so a 4-unit window sees four
    // records in window 0 and two in window 4.
    let counts = JsonCodec::<i64>::new();
    let harness = HarnessBuilder::new()
        .topology(|t| {
            let counts = JsonCodec::<i64>::new();
            let _ = t.stream("events").window_aggregate(
                "window-counts",
                TumblingWindow::new(4),
                move |acc, _key, _value| {
                    let current = match acc {
                        Some(bytes) => counts.decode(bytes)?,
                        None => 0,
                    };
                    counts.encode(&(current + 1))
                },
            );
        })
        .stores(["window-counts"])
        .input(
            "events",
            &KEYS,
            &VALUES,
            pairs(&[
                ("k", "a"),
                ("k", "b"),
                ("k", "c"),
                ("k", "d"),
                ("k", "e"),
                ("k", "f"),
            ]),
        );

    let windows = harness
        .window_state_table("window-counts", &"k".to_string(), &KEYS, &counts)
        .unwrap();
    let expected: BTreeMap<i64, i64> = [(0, 4), (4, 2)].into_iter().collect();
    assert_eq!(windows, expected);
}

// ---- Configuration ----

#[test]
fn test_record_policy_requires_explicit_timestamps() {
    let harness = uppercase_harness()
        .config([(TIMESTAMP_POLICY.to_string(), "record".to_string())])
        .input("input", &KEYS, &VALUES, pairs(&[("k", "v")]));

    assert!(matches!(
        harness.output("output", &KEYS, &VALUES, 1),
        Err(HarnessError::Flow(FlowError::MissingTimestamp))
    ));
}

#[test]
fn test_record_policy_accepts_timestamped_input() {
    let harness = uppercase_harness()
        .config([(TIMESTAMP_POLICY.to_string(), "record".to_string())])
        .input_at(
            "input",
            &KEYS,
            &VALUES,
            vec![("k".to_string(), "v".to_string(), 99)],
        );

    let out = harness.output("output", &KEYS, &VALUES, 1).unwrap();
    assert_eq!(out, pairs(&[("k", "V")]));
}

#[test]
fn test_unknown_policy_fails_the_read_not_the_config_call() {
    let harness = uppercase_harness()
        .config([(TIMESTAMP_POLICY.to_string(), "wallclock".to_string())])
        .input("input", &KEYS, &VALUES, pairs(&[("k", "v")]));

    assert!(matches!(
        harness.output("output", &KEYS, &VALUES, 1),
        Err(HarnessError::Flow(FlowError::UnknownTimestampPolicy(value))) if value == "wallclock"
    ));
}

#[test]
fn test_config_overrides_accumulate_last_write_wins() {
    let harness = uppercase_harness()
        .config([(TIMESTAMP_POLICY.to_string(), "wallclock".to_string())])
        // A later override repairs the earlier one.
        .config([(TIMESTAMP_POLICY.to_string(), "sequence".to_string())])
        .input("input", &KEYS, &VALUES, pairs(&[("k", "v")]));

    assert!(harness.output("output", &KEYS, &VALUES, 1).is_ok());
}

// ---- Determinism and accumulation ----

#[test]
fn test_repeated_reads_are_identical() {
    let values = JsonCodec::<i64>::new();
    let harness = HarnessBuilder::new()
        .topology(sum_join_topology)
        .stores(["store-a", "store-b"])
        .input("a", &KEYS, &values, vec![("x".to_string(), 1)])
        .input("b", &KEYS, &values, vec![("x".to_string(), 4)]);

    let first = harness.output("joined", &KEYS, &values, 2).unwrap();
    let second = harness.output("joined", &KEYS, &values, 2).unwrap();
    assert_eq!(first, second);

    let table_first = harness.state_table("store-a", &KEYS, &values).unwrap();
    let table_second = harness.state_table("store-a", &KEYS, &values).unwrap();
    assert_eq!(table_first, table_second);
}

#[test]
fn test_each_read_runs_from_scratch() {
    // An aggregate over re-run inputs would double-count if any state
    // survived between reads.
    let values = JsonCodec::<i64>::new();
    let sums = JsonCodec::<i64>::new();
    let harness = HarnessBuilder::new()
        .topology(move |t| {
            let _ = t.stream("input").aggregate("sums", move |acc, _key, value| {
                let current = match acc {
                    Some(bytes) => sums.decode(bytes)?,
                    None => 0,
                };
                sums.encode(&(current + sums.decode(value)?))
            });
        })
        .stores(["sums"])
        .input("input", &KEYS, &values, vec![("x".to_string(), 2)]);

    for _ in 0..3 {
        let table = harness.state_table("sums", &KEYS, &values).unwrap();
        assert_eq!(table.get("x"), Some(&2));
    }
}

#[test]
fn test_inputs_accumulate_across_calls() {
    let harness = HarnessBuilder::new()
        .topology(passthrough_topology)
        .input("input", &KEYS, &VALUES, pairs(&[("a", "1")]))
        .input("input", &KEYS, &VALUES, pairs(&[("b", "2")]));

    let out = harness.output("output", &KEYS, &VALUES, 10).unwrap();
    assert_eq!(out, pairs(&[("a", "1"), ("b", "2")]));
}

#[test]
fn test_channels_replay_in_first_registration_order() {
    let harness = HarnessBuilder::new()
        .topology(|t| {
            t.stream("late").to("output");
            t.stream("early").to("output");
        })
        .input("early", &KEYS, &VALUES, pairs(&[("e", "1")]))
        .input("late", &KEYS, &VALUES, pairs(&[("l", "2")]))
        .input("early", &KEYS, &VALUES, pairs(&[("e", "3")]));

    // "early" was registered first, so both of its records replay before
    // anything on "late", regardless of source declaration order.
    let out = harness.output("output", &KEYS, &VALUES, 3).unwrap();
    assert_eq!(out, pairs(&[("e", "1"), ("e", "3"), ("l", "2")]));
}

#[test]
fn test_repeated_topology_last_write_wins() {
    let harness = uppercase_harness()
        .input("input", &KEYS, &VALUES, pairs(&[("k", "value")]))
        .topology(passthrough_topology);

    let out = harness.output("output", &KEYS, &VALUES, 1).unwrap();
    assert_eq!(out, pairs(&[("k", "value")]));
}

// ---- Codec failures ----

#[test]
fn test_encode_failure_surfaces_on_next_read() {
    let floats = JsonCodec::<f64>::new();
    let harness = HarnessBuilder::new()
        .topology(passthrough_topology)
        .input("input", &KEYS, &VALUES, pairs(&[("ok", "fine")]))
        // Non-finite floats have no JSON representation; the batch is
        // dropped and the failure parked for the next read.
        .input("input", &KEYS, &floats, vec![("bad".to_string(), f64::NAN)]);

    assert!(matches!(
        harness.output("output", &KEYS, &VALUES, 1),
        Err(HarnessError::Codec(_))
    ));
}

#[test]
fn test_decode_failure_surfaces_on_read() {
    let numbers = JsonCodec::<i64>::new();
    let harness = HarnessBuilder::new()
        .topology(passthrough_topology)
        .input("input", &KEYS, &VALUES, pairs(&[("k", "not a number")]));

    // Values were written as plain strings; reading them back as integers
    // must fail loudly rather than skip records.
    assert!(matches!(
        harness.output("output", &KEYS, &numbers, 1),
        Err(HarnessError::Codec(_))
    ));
}

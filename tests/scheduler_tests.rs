//! Runs, cycles, and the poll loop against in-memory collaborators.

mod common;

use common::{Call, CallLog, MemorySource, NameParser, RecordingStore, saves, sweeps};
use invsweep::engine::progress::RecordProgress;
use invsweep::engine::{EntityHandler, Registry};
use invsweep::pipeline::{CycleOutcome, Scheduler, SchedulerState, run_entity_type};
use invsweep::{EntityType, ErrorKind, InventoryTarget, Opts};
use std::collections::BTreeMap;
use std::rc::Rc;
use std::thread;
use std::time::Duration;

fn opts(types: Vec<EntityType>) -> Opts {
    Opts {
        single_shot: true,
        poll_interval: Duration::from_millis(10),
        entity_types: types,
        ..Opts::default()
    }
}

fn scheduler(source: MemorySource, store: RecordingStore, opts: Opts) -> Scheduler {
    let src = Rc::new(source);
    let registry =
        Registry::new().with_fallback(EntityHandler::new(src.clone(), Rc::new(NameParser)));
    Scheduler::new(opts, &registry, src, Box::new(store)).unwrap()
}

fn save_sizes(calls: &CallLog) -> Vec<BTreeMap<String, usize>> {
    saves(calls)
        .into_iter()
        .filter_map(|c| match c {
            Call::Save { sizes, .. } => Some(sizes),
            _ => None,
        })
        .collect()
}

fn vms_with_related() -> Vec<EntityType> {
    vec![
        EntityType::new("vms").with_related(&["network_adapters"]),
        EntityType::new("network_adapters").related_only(),
    ]
}

#[test]
fn test_limit_two_three_records_two_flushes() {
    let mut src = MemorySource::new(&["111"], &["r1"]);
    src.add("111", "r1", "vms", "vm", 3);
    let (store, calls) = RecordingStore::new();
    let mut s = scheduler(src, store, opts(vec![EntityType::new("vms").with_limit(2)]));

    let outcome = s.run_cycle();
    assert!(outcome.error().is_none());

    let sizes = save_sizes(&calls);
    assert_eq!(sizes.len(), 2);
    assert_eq!(sizes[0]["vms"], 2);
    assert_eq!(sizes[1]["vms"], 1);
    match &sweeps(&calls)[..] {
        [Call::Sweep { total_parts, .. }] => assert_eq!(*total_parts, 2),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(outcome.report().runs[0].total_parts, 2);
}

#[test]
fn test_total_parts_uses_store_reported_count() {
    let mut src = MemorySource::new(&["111"], &["r1"]);
    src.add("111", "r1", "vms", "vm", 3);
    let (mut store, calls) = RecordingStore::new();
    store.parts_per_save = 2;
    let mut s = scheduler(src, store, opts(vec![EntityType::new("vms").with_limit(2)]));
    s.run_cycle();
    match &sweeps(&calls)[..] {
        [Call::Sweep { total_parts, .. }] => assert_eq!(*total_parts, 4),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_sweep_scope_includes_related_collections() {
    let mut src = MemorySource::new(&["111"], &["r1"]);
    src.add("111", "r1", "vms", "vm", 1);
    src.add("111", "r1", "network_adapters", "nic", 2);
    let (store, calls) = RecordingStore::new();
    let mut s = scheduler(src, store, opts(vms_with_related()));
    s.run_cycle();

    let all = sweeps(&calls);
    assert_eq!(all.len(), 1);
    match &all[0] {
        Call::Sweep { scope, .. } => {
            assert!(scope.contains("vms"));
            assert!(scope.contains("network_adapters"));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_related_collection_kept_when_empty_in_some_scopes() {
    let mut src = MemorySource::new(&["111"], &["r1", "r2"]);
    src.add("111", "r1", "vms", "vm", 1);
    src.add("111", "r2", "vms", "vm2", 1);
    src.add("111", "r2", "network_adapters", "nic", 1);
    let (store, calls) = RecordingStore::new();
    let mut types = vms_with_related();
    types[0].limit = 1;
    let mut s = scheduler(src, store, opts(types));
    s.run_cycle();

    match &sweeps(&calls)[..] {
        [Call::Sweep { scope, total_parts, .. }] => {
            assert_eq!(*total_parts, 3);
            assert!(scope.contains("network_adapters"));
            assert!(scope.contains("vms"));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_sweep_is_last_call_of_run() {
    let mut src = MemorySource::new(&["111", "222"], &["r1", "r2"]);
    for a in ["111", "222"] {
        for r in ["r1", "r2"] {
            src.add(a, r, "vms", &format!("{a}-{r}"), 3);
        }
    }
    let (store, calls) = RecordingStore::new();
    let mut s = scheduler(src, store, opts(vec![EntityType::new("vms").with_limit(5)]));
    s.run_cycle();

    let log = calls.borrow();
    let last = log.last().cloned();
    let Some(Call::Sweep { run_id, total_parts, .. }) = last else {
        panic!("last call was not a sweep");
    };
    assert_eq!(total_parts as usize, log.len() - 1);
    for call in &log[..log.len() - 1] {
        match call {
            Call::Save { run_id: r, .. } => assert_eq!(r, &run_id),
            other => panic!("unexpected {other:?}"),
        }
    }
}

#[test]
fn test_no_records_no_sweep() {
    let src = MemorySource::new(&["111"], &["r1"]);
    let (store, calls) = RecordingStore::new();
    let mut s = scheduler(src, store, opts(vec![EntityType::new("vms")]));
    let outcome = s.run_cycle();
    assert!(outcome.error().is_none());
    assert!(calls.borrow().is_empty());
    assert!(!outcome.report().runs[0].sweep.was_swept());
}

#[test]
fn test_denied_account_contributes_no_scopes() {
    let mut src = MemorySource::new(&["111", "222", "333"], &["r1", "r2"]);
    src.denied.insert("222".into());
    let (store, _calls) = RecordingStore::new();
    let mut s = scheduler(src, store, opts(vec![EntityType::new("vms")]));
    let outcome = s.run_cycle();
    assert!(outcome.error().is_none());
    let report = outcome.report();
    assert_eq!(report.accounts_candidate, 3);
    assert_eq!(report.accounts_valid, 2);
    assert_eq!(report.scopes, 4);
}

#[test]
fn test_upload_error_on_second_part_aborts_without_sweep() {
    let mut src = MemorySource::new(&["111"], &["r1"]);
    src.add("111", "r1", "vms", "vm", 3);
    let (mut store, calls) = RecordingStore::new();
    store.fail_on_save = Some(2);
    let mut s = scheduler(src, store, opts(vec![EntityType::new("vms").with_limit(2)]));

    let outcome = s.run_cycle();
    let err = outcome.error().expect("cycle should fail");
    assert_eq!(err.kind(), ErrorKind::Transient);
    assert_eq!(saves(&calls).len(), 1);
    assert!(sweeps(&calls).is_empty());
    assert!(outcome.report().runs.is_empty());
}

#[test]
fn test_fail_fast_skips_later_types() {
    let mut src = MemorySource::new(&["111"], &["r1"]);
    src.add("111", "r1", "vms", "vm", 1);
    src.add("111", "r1", "volumes", "vol", 1);
    src.failing_types.insert("vms".into());
    let (store, calls) = RecordingStore::new();
    let mut s = scheduler(
        src,
        store,
        opts(vec![EntityType::new("vms"), EntityType::new("volumes")]),
    );
    let outcome = s.run_cycle();
    assert!(outcome.error().is_some());
    assert!(calls.borrow().is_empty());
    assert_eq!(outcome.report().failed_types, vec!["vms".to_string()]);
}

#[test]
fn test_earlier_type_keeps_sweep_when_later_fails() {
    let mut src = MemorySource::new(&["111"], &["r1"]);
    src.add("111", "r1", "vms", "vm", 1);
    src.failing_types.insert("volumes".into());
    let (store, calls) = RecordingStore::new();
    let mut s = scheduler(
        src,
        store,
        opts(vec![EntityType::new("vms"), EntityType::new("volumes")]),
    );
    let outcome = s.run_cycle();
    assert!(outcome.error().is_some());
    assert_eq!(sweeps(&calls).len(), 1);
    assert_eq!(outcome.report().runs.len(), 1);
}

#[test]
fn test_isolated_failures_continue_with_later_types() {
    let mut src = MemorySource::new(&["111"], &["r1"]);
    src.add("111", "r1", "volumes", "vol", 2);
    src.failing_types.insert("vms".into());
    let (store, calls) = RecordingStore::new();
    let mut o = opts(vec![EntityType::new("vms"), EntityType::new("volumes")]);
    o.isolate_failures = true;
    let mut s = scheduler(src, store, o);

    let outcome = s.run_cycle();
    assert!(matches!(outcome, CycleOutcome::Failed { .. }));
    assert_eq!(outcome.report().failed_types, vec!["vms".to_string()]);
    assert_eq!(outcome.report().runs.len(), 1);
    match &sweeps(&calls)[..] {
        [Call::Sweep { scope, .. }] => assert!(scope.contains("volumes")),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_each_cycle_uses_new_run_id() {
    let mut src = MemorySource::new(&["111"], &["r1"]);
    src.add("111", "r1", "vms", "vm", 1);
    let (store, calls) = RecordingStore::new();
    let mut s = scheduler(src, store, opts(vec![EntityType::new("vms")]));
    s.run_cycle();
    s.run_cycle();
    let ids: Vec<String> = sweeps(&calls)
        .into_iter()
        .filter_map(|c| match c {
            Call::Sweep { run_id, .. } => Some(run_id),
            _ => None,
        })
        .collect();
    assert_eq!(ids.len(), 2);
    assert_ne!(ids[0], ids[1]);
}

#[test]
fn test_run_entity_type_directly() {
    let mut src = MemorySource::new(&["111"], &["r1"]);
    src.add("111", "r1", "vms", "vm", 4);
    let src = Rc::new(src);
    let registry =
        Registry::new().with_fallback(EntityHandler::new(src.clone(), Rc::new(NameParser)));
    let plans = registry
        .resolve(&[EntityType::new("vms").with_limit(3)])
        .unwrap_or_default();
    let scopes = invsweep::engine::enumerate_scopes(&src.accounts, &src.regions, None);
    let (mut store, _calls) = RecordingStore::new();
    let target = InventoryTarget {
        inventory: "cloud".into(),
        schema: "default".into(),
    };
    let summary = run_entity_type(
        &plans[0],
        &scopes,
        &mut store,
        &target,
        &mut RecordProgress::disabled(),
    )
    .unwrap();
    assert_eq!(summary.records, 4);
    assert_eq!(summary.flushes, 2);
    assert_eq!(summary.total_parts, 2);
}

// --- Poll loop ---

#[test]
fn test_single_shot_runs_once_and_stops() {
    let mut src = MemorySource::new(&["111"], &["r1"]);
    src.add("111", "r1", "vms", "vm", 1);
    let (store, _calls) = RecordingStore::new();
    let mut s = scheduler(src, store, opts(vec![EntityType::new("vms")]));
    assert_eq!(s.state(), SchedulerState::Idle);
    s.run().unwrap();
    assert_eq!(s.state(), SchedulerState::Stopped);
    assert!(s.stop_signal().is_stopped());
    let m = s.metrics().snapshot();
    assert_eq!(m.cycles_completed, 1);
    assert_eq!(m.sweeps_issued, 1);
}

#[test]
fn test_single_shot_failure_still_exits_cleanly() {
    let mut src = MemorySource::new(&["111"], &["r1"]);
    src.failing_types.insert("vms".into());
    let (store, _calls) = RecordingStore::new();
    let mut s = scheduler(src, store, opts(vec![EntityType::new("vms")]));
    assert!(s.run().is_ok());
    assert_eq!(s.metrics().snapshot().cycles_failed, 1);
    assert_eq!(s.state(), SchedulerState::Stopped);
}

#[test]
fn test_continuous_mode_keeps_cycling_until_stopped() {
    let mut src = MemorySource::new(&["111"], &["r1"]);
    src.failing_types.insert("vms".into());
    let (store, _calls) = RecordingStore::new();
    let mut o = opts(vec![EntityType::new("vms")]);
    o.single_shot = false;
    let mut s = scheduler(src, store, o);

    let stop = s.stop_signal();
    let stopper = thread::spawn(move || {
        thread::sleep(Duration::from_millis(100));
        stop.stop();
    });
    s.run().unwrap();
    stopper.join().unwrap();

    assert_eq!(s.state(), SchedulerState::Stopped);
    assert!(s.metrics().snapshot().cycles_failed >= 2);
}

#[test]
fn test_stop_before_run_executes_no_cycle() {
    let src = MemorySource::new(&["111"], &["r1"]);
    let (store, _calls) = RecordingStore::new();
    let mut o = opts(vec![EntityType::new("vms")]);
    o.single_shot = false;
    let mut s = scheduler(src, store, o);
    s.stop_signal().stop();
    s.run().unwrap();
    assert_eq!(s.metrics().snapshot().cycles_completed, 0);
    assert_eq!(s.state(), SchedulerState::Stopped);
}

#[test]
fn test_unknown_related_type_fails_at_construction() {
    let src = Rc::new(MemorySource::new(&["111"], &["r1"]));
    let registry =
        Registry::new().with_fallback(EntityHandler::new(src.clone(), Rc::new(NameParser)));
    let (store, _calls) = RecordingStore::new();
    let result = Scheduler::new(
        opts(vec![EntityType::new("vms").with_related(&["ghost"])]),
        &registry,
        src,
        Box::new(store),
    );
    assert_eq!(result.err().map(|e| e.kind()), Some(ErrorKind::Config));
}

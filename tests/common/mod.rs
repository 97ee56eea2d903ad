//! Shared test doubles: an in-memory provider and a store that records every call.

#![allow(dead_code)]

use invsweep::engine::{Batcher, InventoryStore, PartId, RunId};
use invsweep::source::{Discovery, Parser, RawRecord, RecordSource};
use invsweep::{
    Account, CollectError, CollectResult, Collections, Entity, EntityType, Scope, SweepScope,
};
use serde_json::json;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::rc::Rc;

#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    Save {
        run_id: String,
        part_id: String,
        sizes: BTreeMap<String, usize>,
    },
    Sweep {
        run_id: String,
        total_parts: u64,
        scope: SweepScope,
    },
}

pub type CallLog = Rc<RefCell<Vec<Call>>>;

/// Store that logs calls. `parts_per_save` is what each save reports; `fail_on_save` (1-based) errors.
pub struct RecordingStore {
    pub calls: CallLog,
    pub parts_per_save: u64,
    pub fail_on_save: Option<usize>,
    saves: usize,
}

impl RecordingStore {
    pub fn new() -> (Self, CallLog) {
        let calls: CallLog = Rc::new(RefCell::new(Vec::new()));
        (
            Self {
                calls: Rc::clone(&calls),
                parts_per_save: 1,
                fail_on_save: None,
                saves: 0,
            },
            calls,
        )
    }
}

impl InventoryStore for RecordingStore {
    fn save_inventory(
        &mut self,
        collections: &Collections,
        _inventory: &str,
        _schema: &str,
        run_id: &RunId,
        part_id: &PartId,
    ) -> CollectResult<u64> {
        self.saves += 1;
        if self.fail_on_save == Some(self.saves) {
            return Err(CollectError::Remote("upload refused".into()));
        }
        self.calls.borrow_mut().push(Call::Save {
            run_id: run_id.to_string(),
            part_id: part_id.to_string(),
            sizes: collections
                .iter()
                .map(|(k, v)| (k.clone(), v.len()))
                .collect(),
        });
        Ok(self.parts_per_save)
    }

    fn sweep_inventory(
        &mut self,
        _inventory: &str,
        _schema: &str,
        run_id: &RunId,
        total_parts: u64,
        sweep_scope: &SweepScope,
    ) -> CollectResult<()> {
        self.calls.borrow_mut().push(Call::Sweep {
            run_id: run_id.to_string(),
            total_parts,
            scope: sweep_scope.clone(),
        });
        Ok(())
    }
}

pub fn saves(calls: &CallLog) -> Vec<Call> {
    calls
        .borrow()
        .iter()
        .filter(|c| matches!(c, Call::Save { .. }))
        .cloned()
        .collect()
}

pub fn sweeps(calls: &CallLog) -> Vec<Call> {
    calls
        .borrow()
        .iter()
        .filter(|c| matches!(c, Call::Sweep { .. }))
        .cloned()
        .collect()
}

/// In-memory provider keyed by (account, region, entity type).
#[derive(Default)]
pub struct MemorySource {
    pub regions: Vec<String>,
    pub accounts: Vec<Account>,
    pub denied: HashSet<String>,
    pub broken: HashSet<String>,
    pub failing_types: HashSet<String>,
    pub records: HashMap<(String, String, String), Vec<RawRecord>>,
    pub probes: RefCell<usize>,
}

impl MemorySource {
    pub fn new(accounts: &[&str], regions: &[&str]) -> Self {
        Self {
            regions: regions.iter().map(|r| r.to_string()).collect(),
            accounts: accounts
                .iter()
                .enumerate()
                .map(|(i, id)| Account::new(*id, i == 0))
                .collect(),
            ..Self::default()
        }
    }

    /// Add `n` records with ids `<prefix>-0..n`.
    pub fn add(&mut self, account: &str, region: &str, entity_type: &str, prefix: &str, n: usize) {
        let list = self
            .records
            .entry((account.into(), region.into(), entity_type.into()))
            .or_default();
        for i in 0..n {
            list.push(json!({ "id": format!("{prefix}-{i}") }));
        }
    }
}

impl Discovery for MemorySource {
    fn list_regions(&self) -> CollectResult<Vec<String>> {
        Ok(self.regions.clone())
    }

    fn list_accounts(&self) -> CollectResult<Vec<Account>> {
        Ok(self.accounts.clone())
    }

    fn probe_access(&self, scope: &Scope) -> CollectResult<()> {
        *self.probes.borrow_mut() += 1;
        if self.denied.contains(scope.account_id()) {
            return Err(CollectError::access_denied(scope.account_id(), "denied"));
        }
        if self.broken.contains(scope.account_id()) {
            return Err(CollectError::Remote("throttled".into()));
        }
        Ok(())
    }
}

impl RecordSource for MemorySource {
    fn for_each_record(
        &self,
        entity_type: &EntityType,
        scope: &Scope,
        on_record: &mut dyn FnMut(RawRecord) -> CollectResult<()>,
    ) -> CollectResult<()> {
        if self.failing_types.contains(&entity_type.name) {
            return Err(CollectError::Remote(format!("{} listing failed", entity_type.name)));
        }
        let key = (
            scope.account_id().to_string(),
            scope.region().to_string(),
            entity_type.name.clone(),
        );
        for record in self.records.get(&key).cloned().unwrap_or_default() {
            on_record(record)?;
        }
        Ok(())
    }
}

/// Parser writing each record to the entity type's own collection.
pub struct NameParser;

impl Parser for NameParser {
    fn parse(
        &self,
        entity_type: &EntityType,
        record: &RawRecord,
        _scope: &Scope,
        batch: &mut Batcher,
    ) -> CollectResult<()> {
        let reference = record["id"].as_str().unwrap_or_default().to_string();
        batch.append(
            entity_type.collection(),
            Entity {
                reference,
                data: record.clone(),
            },
        );
        Ok(())
    }
}

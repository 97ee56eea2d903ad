//! Public and internal types for the invsweep API and pipeline.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::time::Duration;

use crate::utils::config::{DEFAULT_BATCH_LIMIT, DEFAULT_POLL_INTERVAL_SECS, MAX_PART_ROWS};

/// One account known to the provider. `master` marks the organization's master account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub master: bool,
}

impl Account {
    pub fn new(id: impl Into<String>, master: bool) -> Self {
        Self {
            id: id.into(),
            name: None,
            master,
        }
    }
}

/// One unit of work: a region within an account, plus the role to assume for non-master accounts.
///
/// Built only through [`Scope::new`] so the role is always derived from (region, account).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Scope {
    region: String,
    account: Account,
    role: Option<String>,
}

impl Scope {
    /// `role_template` may contain `{account}`; master accounts never assume a role.
    pub fn new(region: &str, account: &Account, role_template: Option<&str>) -> Self {
        let role = match role_template {
            Some(t) if !account.master => Some(t.replace("{account}", &account.id)),
            _ => None,
        };
        Self {
            region: region.to_string(),
            account: account.clone(),
            role,
        }
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    pub fn account_id(&self) -> &str {
        &self.account.id
    }

    pub fn role(&self) -> Option<&str> {
        self.role.as_deref()
    }
}

/// How the bundled [`RuleParser`](crate::source::RuleParser) turns a raw record into entities.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParseRules {
    /// Target collection. When None, the entity type name is used.
    pub collection: Option<String>,
    /// Field holding the record's stable identifier.
    pub id_field: String,
    /// Array field → collection. Each element becomes an entity of that collection.
    pub nested: BTreeMap<String, String>,
}

/// A named category of resource to collect.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntityType {
    pub name: String,
    /// Raw records per part before a flush is forced.
    pub limit: usize,
    /// Types collected and swept together with this one.
    pub related: Vec<String>,
    /// False for types that only run as a related type of another.
    pub top_level: bool,
    pub rules: ParseRules,
}

impl EntityType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            limit: DEFAULT_BATCH_LIMIT,
            related: Vec::new(),
            top_level: true,
            rules: ParseRules {
                id_field: "id".to_string(),
                ..ParseRules::default()
            },
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_related(mut self, related: &[&str]) -> Self {
        self.related = related.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Mark as related-only (not run as its own top-level pass).
    pub fn related_only(mut self) -> Self {
        self.top_level = false;
        self
    }

    /// Collection name the bundled parser writes primary entities to.
    pub fn collection(&self) -> &str {
        self.rules.collection.as_deref().unwrap_or(&self.name)
    }
}

/// One normalized record in a collection. `reference` is unique per (inventory, collection).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub reference: String,
    pub data: serde_json::Value,
}

/// Collection name → entities, in deterministic name order.
pub type Collections = BTreeMap<String, Vec<Entity>>;

/// Collection names a sweep applies to.
pub type SweepScope = BTreeSet<String>;

/// Where parts and sweeps are addressed in the downstream store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InventoryTarget {
    pub inventory: String,
    pub schema: String,
}

/// Full options (CLI and lib). Built once at startup; never mutated by the engine.
#[derive(Clone, Debug)]
pub struct Opts {
    pub inventory_name: String,
    pub schema_name: String,
    /// Root of the file-backed source. Required by the CLI.
    pub source_dir: Option<PathBuf>,
    /// Inventory database path. When None, uses the package db filename in the current directory.
    pub db_path: Option<PathBuf>,
    pub poll_interval: Duration,
    /// Run one cycle, then stop.
    pub single_shot: bool,
    /// Log parts and sweeps instead of writing them.
    pub dry_run: bool,
    /// Debug logging and record counter.
    pub verbose: bool,
    /// Role to assume for non-master accounts; `{account}` is substituted.
    pub role_template: Option<String>,
    /// Region used to probe account access. When None, the first discovered region.
    pub reference_region: Option<String>,
    /// Keep collecting later entity types when one Run fails.
    pub isolate_failures: bool,
    /// Rows per stored part before the SQLite store splits a payload.
    pub max_part_rows: usize,
    pub entity_types: Vec<EntityType>,
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            inventory_name: env!("CARGO_PKG_NAME").to_string(),
            schema_name: "default".to_string(),
            source_dir: None,
            db_path: None,
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            single_shot: false,
            dry_run: false,
            verbose: false,
            role_template: None,
            reference_region: None,
            isolate_failures: false,
            max_part_rows: MAX_PART_ROWS,
            entity_types: Vec::new(),
        }
    }
}

impl Opts {
    pub fn target(&self) -> InventoryTarget {
        InventoryTarget {
            inventory: self.inventory_name.clone(),
            schema: self.schema_name.clone(),
        }
    }
}

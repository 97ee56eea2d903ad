//! Load `.invsweep.toml` (CLI). Lib callers build [`Opts`] directly.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{CollectError, CollectResult};
use crate::utils::config::DEFAULT_BATCH_LIMIT;
use crate::{EntityType, Opts, ParseRules};

#[derive(Debug, Default, Deserialize)]
pub struct InvsweepToml {
    #[serde(default)]
    settings: SettingsSection,
    #[serde(default)]
    entity_types: Vec<EntityTypeSection>,
}

#[derive(Debug, Default, Deserialize)]
struct SettingsSection {
    inventory: Option<String>,
    schema: Option<String>,
    source_dir: Option<String>,
    db_path: Option<String>,
    /// Seconds.
    poll_interval: Option<u64>,
    single_shot: Option<bool>,
    dry_run: Option<bool>,
    verbose: Option<bool>,
    role_template: Option<String>,
    reference_region: Option<String>,
    isolate_failures: Option<bool>,
    max_part_rows: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct EntityTypeSection {
    name: String,
    limit: Option<usize>,
    #[serde(default)]
    related: Vec<String>,
    top_level: Option<bool>,
    collection: Option<String>,
    id_field: Option<String>,
    #[serde(default)]
    nested: BTreeMap<String, String>,
}

impl From<EntityTypeSection> for EntityType {
    fn from(s: EntityTypeSection) -> Self {
        EntityType {
            name: s.name,
            limit: s.limit.unwrap_or(DEFAULT_BATCH_LIMIT),
            related: s.related,
            top_level: s.top_level.unwrap_or(true),
            rules: ParseRules {
                collection: s.collection,
                id_field: s.id_field.unwrap_or_else(|| "id".to_string()),
                nested: s.nested,
            },
        }
    }
}

/// Parse config text. Errors are configuration errors.
pub fn parse_invsweep_toml(s: &str) -> CollectResult<InvsweepToml> {
    toml::from_str(s).map_err(|e| CollectError::Config(e.to_string()))
}

/// Load the config file at `path`. Returns None if the file is missing.
pub fn load_invsweep_toml(path: &Path) -> CollectResult<Option<InvsweepToml>> {
    let s = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(CollectError::Config(format!("{}: {}", path.display(), e)));
        }
    };
    parse_invsweep_toml(&s)
        .map(Some)
        .map_err(|e| CollectError::Config(format!("{}: {}", path.display(), e)))
}

/// Overwrite opts field from file when present.
macro_rules! apply_file_opt {
    ($sec:expr, $opts:expr, $sec_field:ident => $opts_field:ident) => {
        if let Some(v) = $sec.$sec_field.clone() {
            $opts.$opts_field = v;
        }
    };
}

/// Apply file config to opts (only fields present in the file). Call before applying CLI.
pub fn apply_file_to_opts(file: InvsweepToml, opts: &mut Opts) {
    let s = &file.settings;
    apply_file_opt!(s, opts, inventory => inventory_name);
    apply_file_opt!(s, opts, schema => schema_name);
    if let Some(ref p) = s.source_dir {
        opts.source_dir = Some(PathBuf::from(p));
    }
    if let Some(ref p) = s.db_path {
        opts.db_path = Some(PathBuf::from(p));
    }
    if let Some(secs) = s.poll_interval {
        opts.poll_interval = Duration::from_secs(secs);
    }
    apply_file_opt!(s, opts, single_shot => single_shot);
    apply_file_opt!(s, opts, dry_run => dry_run);
    apply_file_opt!(s, opts, verbose => verbose);
    if s.role_template.is_some() {
        opts.role_template = s.role_template.clone();
    }
    if s.reference_region.is_some() {
        opts.reference_region = s.reference_region.clone();
    }
    apply_file_opt!(s, opts, isolate_failures => isolate_failures);
    apply_file_opt!(s, opts, max_part_rows => max_part_rows);
    if !file.entity_types.is_empty() {
        opts.entity_types = file.entity_types.into_iter().map(EntityType::from).collect();
    }
}

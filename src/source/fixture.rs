//! File-backed provider: accounts, regions, and records laid out on disk.
//!
//! ```text
//! <root>/accounts.json                      [{"id": "...", "name": "...", "master": true}, ...]
//! <root>/regions.json                       ["us-east-1", ...]
//! <root>/<account>/<region>/<type>.jsonl    one record per line (streamed)
//! <root>/<account>/<region>/<type>.json     array of records
//! <root>/<account>/.denied                  account cannot be assumed
//! ```

use log::debug;
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::{Path, PathBuf};

use super::{Discovery, RawRecord, RecordSource};
use crate::error::{CollectError, CollectResult};
use crate::{Account, EntityType, Scope};

const ACCOUNTS_FILE: &str = "accounts.json";
const REGIONS_FILE: &str = "regions.json";
const DENIED_MARKER: &str = ".denied";

#[derive(Clone, Debug)]
pub struct FileSource {
    root: PathBuf,
}

impl FileSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn account_dir(&self, scope: &Scope) -> PathBuf {
        self.root.join(scope.account_id())
    }

    fn read_json<T: serde::de::DeserializeOwned>(&self, name: &str) -> CollectResult<T> {
        let path = self.root.join(name);
        let file = File::open(&path)
            .map_err(|e| CollectError::transient(format!("open {}", path.display()), e))?;
        serde_json::from_reader(BufReader::new(file))
            .map_err(|e| CollectError::transient(format!("parse {}", path.display()), e))
    }

    /// Map an I/O error on an account's files, treating permission errors as access denial.
    fn account_io_error(scope: &Scope, path: &Path, e: std::io::Error) -> CollectError {
        if e.kind() == ErrorKind::PermissionDenied {
            CollectError::access_denied(scope.account_id(), format!("{}: {}", path.display(), e))
        } else {
            CollectError::transient(format!("read {}", path.display()), e)
        }
    }
}

impl Discovery for FileSource {
    fn list_regions(&self) -> CollectResult<Vec<String>> {
        self.read_json(REGIONS_FILE)
    }

    fn list_accounts(&self) -> CollectResult<Vec<Account>> {
        self.read_json(ACCOUNTS_FILE)
    }

    fn probe_access(&self, scope: &Scope) -> CollectResult<()> {
        let dir = self.account_dir(scope);
        if dir.join(DENIED_MARKER).exists() {
            return Err(CollectError::access_denied(
                scope.account_id(),
                match scope.role() {
                    Some(role) => format!("not authorized to assume {role}"),
                    None => "not authorized".to_string(),
                },
            ));
        }
        match std::fs::read_dir(&dir) {
            Ok(_) => Ok(()),
            // An account with no data yet is still accessible.
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Self::account_io_error(scope, &dir, e)),
        }
    }
}

impl RecordSource for FileSource {
    fn for_each_record(
        &self,
        entity_type: &EntityType,
        scope: &Scope,
        on_record: &mut dyn FnMut(RawRecord) -> CollectResult<()>,
    ) -> CollectResult<()> {
        let dir = self.account_dir(scope).join(scope.region());
        let lines_path = dir.join(format!("{}.jsonl", entity_type.name));
        let array_path = dir.join(format!("{}.json", entity_type.name));

        match File::open(&lines_path) {
            Ok(file) => {
                debug!("streaming {}", lines_path.display());
                for (n, line) in BufReader::new(file).lines().enumerate() {
                    let line =
                        line.map_err(|e| Self::account_io_error(scope, &lines_path, e))?;
                    if line.trim().is_empty() {
                        continue;
                    }
                    let record = serde_json::from_str(&line).map_err(|e| {
                        CollectError::transient(
                            format!("{}:{}: malformed record", lines_path.display(), n + 1),
                            e,
                        )
                    })?;
                    on_record(record)?;
                }
                return Ok(());
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(Self::account_io_error(scope, &lines_path, e)),
        }

        match File::open(&array_path) {
            Ok(file) => {
                let records: Vec<RawRecord> = serde_json::from_reader(BufReader::new(file))
                    .map_err(|e| {
                        CollectError::transient(format!("parse {}", array_path.display()), e)
                    })?;
                for record in records {
                    on_record(record)?;
                }
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Self::account_io_error(scope, &array_path, e)),
        }
    }
}

//! Collaborators at the edge of the engine: discovery, record streams, parsing.
//!
//! The engine only sees these traits. A provider integration implements them;
//! [`FileSource`] and [`RuleParser`] are the bundled implementations used by the CLI.

pub mod fixture;
pub mod parser;

pub use fixture::FileSource;
pub use parser::RuleParser;

use crate::engine::Batcher;
use crate::error::CollectResult;
use crate::{Account, EntityType, Scope};

/// One provider record, as delivered by the source.
pub type RawRecord = serde_json::Value;

/// Lists what a pass covers and probes access to accounts.
pub trait Discovery {
    fn list_regions(&self) -> CollectResult<Vec<String>>;

    /// Candidate accounts. Not yet validated.
    fn list_accounts(&self) -> CollectResult<Vec<Account>>;

    /// Lightweight read-only call using the scope's identity. Must not mutate anything.
    fn probe_access(&self, scope: &Scope) -> CollectResult<()>;
}

/// Finite, lazy stream of raw records for one (entity type, scope).
///
/// Records are pushed one at a time; the source must not fetch the next page until
/// `on_record` returns. An error from `on_record` aborts the stream and is returned as is.
pub trait RecordSource {
    fn for_each_record(
        &self,
        entity_type: &EntityType,
        scope: &Scope,
        on_record: &mut dyn FnMut(RawRecord) -> CollectResult<()>,
    ) -> CollectResult<()>;
}

/// Turns one raw record into zero or more entities appended to `batch`.
pub trait Parser {
    fn parse(
        &self,
        entity_type: &EntityType,
        record: &RawRecord,
        scope: &Scope,
        batch: &mut Batcher,
    ) -> CollectResult<()>;
}

//! Account validation: keep only accounts whose identity can be assumed.

use log::{debug, warn};

use crate::error::ErrorKind;
use crate::source::Discovery;
use crate::{Account, Scope};

/// Probe one account in `region`. True when the probe succeeds.
pub fn valid_account(
    discovery: &dyn Discovery,
    region: &str,
    account: &Account,
    role_template: Option<&str>,
) -> bool {
    let scope = Scope::new(region, account, role_template);
    match discovery.probe_access(&scope) {
        Ok(()) => true,
        Err(e) if e.kind() == ErrorKind::Access => {
            warn!("Skipping account {}: {}", account.id, e);
            false
        }
        Err(e) => {
            warn!("Skipping account {} (probe failed): {}", account.id, e);
            false
        }
    }
}

/// Filter `candidates` to the accounts that pass [`valid_account`] in `reference_region`.
/// Order is preserved. Failures never propagate.
pub fn validate_accounts(
    discovery: &dyn Discovery,
    reference_region: &str,
    candidates: Vec<Account>,
    role_template: Option<&str>,
) -> Vec<Account> {
    let total = candidates.len();
    let valid: Vec<Account> = candidates
        .into_iter()
        .filter(|a| valid_account(discovery, reference_region, a, role_template))
        .collect();
    debug!(
        "{} of {} account(s) usable (probed in {})",
        valid.len(),
        total,
        reference_region
    );
    valid
}

//! Scope enumeration: accounts × regions.

use crate::{Account, Scope};

/// Cross-product of validated accounts and regions. Accounts outer, regions inner.
pub fn enumerate_scopes(
    accounts: &[Account],
    regions: &[String],
    role_template: Option<&str>,
) -> Vec<Scope> {
    accounts
        .iter()
        .flat_map(|account| {
            regions
                .iter()
                .map(move |region| Scope::new(region, account, role_template))
        })
        .collect()
}

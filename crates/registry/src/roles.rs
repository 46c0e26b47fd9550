//! Owner and issuer capabilities

use certchain_types::Address;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Who may mutate the registry.
///
/// The owner is fixed at creation. Issuers are granted and revoked by the
/// owner; the owner never appears in the issuer set implicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleTable {
    owner: Address,
    issuers: BTreeSet<Address>,
}

impl RoleTable {
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            issuers: BTreeSet::new(),
        }
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn is_owner(&self, address: &Address) -> bool {
        &self.owner == address
    }

    pub fn is_issuer(&self, address: &Address) -> bool {
        self.issuers.contains(address)
    }

    /// Capability check for issue and revoke.
    pub fn can_manage_credentials(&self, caller: &Address) -> bool {
        self.is_owner(caller) || self.is_issuer(caller)
    }

    /// Capability check for issuer grants.
    pub fn can_manage_roles(&self, caller: &Address) -> bool {
        self.is_owner(caller)
    }

    /// Returns `true` if the set changed.
    pub(crate) fn grant(&mut self, address: Address) -> bool {
        self.issuers.insert(address)
    }

    /// Returns `true` if the set changed.
    pub(crate) fn revoke(&mut self, address: &Address) -> bool {
        self.issuers.remove(address)
    }

    pub fn issuers(&self) -> impl Iterator<Item = &Address> {
        self.issuers.iter()
    }
}

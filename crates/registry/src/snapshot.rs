//! Serializable image of the whole registry state.

use certchain_types::{Address, CredentialRecord, GradeScale};
use serde::{Deserialize, Serialize};

pub const SNAPSHOT_VERSION: u32 = 1;

/// Everything needed to rebuild a registry, including its indexes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    pub version: u32,
    pub owner: Address,
    pub issuers: Vec<Address>,
    pub grade_scale: GradeScale,
    pub next_serial_no: u64,
    /// Active records ordered by serial number.
    pub records: Vec<CredentialRecord>,
}

impl RegistrySnapshot {
    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    pub fn from_json(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }
}

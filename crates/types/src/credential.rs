use crate::Address;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// An issued academic credential.
///
/// Records are immutable once stored. Field order is part of the serialized
/// format and must not be reordered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    /// Registry-wide issuance counter value; never reused.
    pub serial_no: u64,
    pub registration_number: String,
    pub holder_name: String,
    /// e.g. the school.
    pub organization_unit: String,
    /// e.g. the department.
    pub sub_unit: String,
    /// e.g. the examination year.
    pub period: String,
    /// Derived from `grade_score` by the registry's grade scale.
    pub grade_label: String,
    pub grade_score: String,
    pub issued_on: String,
    pub recipient: Address,
    /// Public verification handle; does not reveal the recipient.
    pub lookup_token: String,
}

impl CredentialRecord {
    /// Build the stored record for an accepted request.
    pub fn from_request(serial_no: u64, grade_label: String, request: IssueRequest) -> Self {
        Self {
            serial_no,
            registration_number: request.registration_number,
            holder_name: request.holder_name,
            organization_unit: request.organization_unit,
            sub_unit: request.sub_unit,
            period: request.period,
            grade_label,
            grade_score: request.grade_score,
            issued_on: request.issued_on,
            recipient: request.recipient,
            lookup_token: request.lookup_token,
        }
    }

    /// SHA-256 fingerprint over every field in declaration order.
    ///
    /// Strings are length-prefixed so adjacent fields cannot be shifted into
    /// one another.
    pub fn digest(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(b"CERTCHAIN_CREDENTIAL_V1");
        hasher.update(self.serial_no.to_le_bytes());
        for field in [
            &self.registration_number,
            &self.holder_name,
            &self.organization_unit,
            &self.sub_unit,
            &self.period,
            &self.grade_label,
            &self.grade_score,
            &self.issued_on,
        ] {
            update_str(&mut hasher, field);
        }
        hasher.update(self.recipient.as_bytes());
        update_str(&mut hasher, &self.lookup_token);
        hasher.finalize().into()
    }

    pub fn digest_hex(&self) -> String {
        hex::encode(self.digest())
    }
}

fn update_str(hasher: &mut Sha256, value: &str) {
    hasher.update((value.len() as u64).to_le_bytes());
    hasher.update(value.as_bytes());
}

/// Issuer-supplied input for a new credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRequest {
    pub recipient: Address,
    pub registration_number: String,
    pub holder_name: String,
    pub organization_unit: String,
    pub sub_unit: String,
    pub period: String,
    pub grade_score: String,
    pub issued_on: String,
    pub lookup_token: String,
}

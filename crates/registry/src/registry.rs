//! Credential registry implementation
//!
//! One record per recipient, indexed by registration number and by lookup
//! token. Mutations are gated by the role table and commit all-or-nothing.

use crate::config::RegistryConfig;
use crate::errors::*;
use crate::events::{EventSink, NoopEventSink};
use crate::roles::RoleTable;
use crate::snapshot::{RegistrySnapshot, SNAPSHOT_VERSION};
use certchain_types::{Address, CredentialRecord, GradeScale, IssueRequest, RegistryEvent};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Complete mutable state. Only ever touched under the registry's lock.
#[derive(Debug)]
struct RegistryState {
    roles: RoleTable,
    grade_scale: GradeScale,
    next_serial_no: u64,
    /// Recipient → active record
    records: HashMap<Address, CredentialRecord>,
    /// Registration number → recipient
    by_registration: HashMap<String, Address>,
    /// Lookup token → recipient
    by_token: HashMap<String, Address>,
}

impl RegistryState {
    fn new(owner: Address, grade_scale: GradeScale) -> Self {
        Self {
            roles: RoleTable::new(owner),
            grade_scale,
            next_serial_no: 0,
            records: HashMap::new(),
            by_registration: HashMap::new(),
            by_token: HashMap::new(),
        }
    }

    fn authorize_credentials(&self, caller: &Address, action: &'static str) -> Result<()> {
        if self.roles.can_manage_credentials(caller) {
            Ok(())
        } else {
            Err(RegistryError::Unauthorized {
                caller: *caller,
                action,
            })
        }
    }

    fn authorize_roles(&self, caller: &Address, action: &'static str) -> Result<()> {
        if self.roles.can_manage_roles(caller) {
            Ok(())
        } else {
            Err(RegistryError::Unauthorized {
                caller: *caller,
                action,
            })
        }
    }

    fn record_by_token(&self, lookup_token: &str) -> Option<&CredentialRecord> {
        self.by_token
            .get(lookup_token)
            .and_then(|recipient| self.records.get(recipient))
    }

    fn insert(&mut self, record: CredentialRecord) {
        self.by_registration
            .insert(record.registration_number.clone(), record.recipient);
        self.by_token
            .insert(record.lookup_token.clone(), record.recipient);
        self.records.insert(record.recipient, record);
    }

    fn snapshot(&self) -> RegistrySnapshot {
        let mut records: Vec<CredentialRecord> = self.records.values().cloned().collect();
        records.sort_by_key(|r| r.serial_no);

        RegistrySnapshot {
            version: SNAPSHOT_VERSION,
            owner: self.roles.owner(),
            issuers: self.roles.issuers().copied().collect(),
            grade_scale: self.grade_scale,
            next_serial_no: self.next_serial_no,
            records,
        }
    }

    /// Rebuild state and indexes, rejecting anything that breaks an invariant.
    fn restore(snapshot: RegistrySnapshot) -> Result<Self> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(RegistryError::CorruptSnapshot(format!(
                "unsupported snapshot version {}",
                snapshot.version
            )));
        }

        let mut state = Self::new(snapshot.owner, snapshot.grade_scale);
        state.next_serial_no = snapshot.next_serial_no;
        for issuer in snapshot.issuers {
            state.roles.grant(issuer);
        }

        let mut serials = std::collections::HashSet::new();
        for record in snapshot.records {
            let corrupt = |reason: String| {
                Err(RegistryError::CorruptSnapshot(format!(
                    "record {}: {reason}",
                    record.serial_no
                )))
            };

            if record.serial_no >= state.next_serial_no {
                return corrupt(format!(
                    "serial not below next serial {}",
                    state.next_serial_no
                ));
            }
            if !serials.insert(record.serial_no) {
                return corrupt("serial number repeated".into());
            }
            if state.records.contains_key(&record.recipient) {
                return corrupt(format!("second record for recipient {}", record.recipient));
            }
            if state.by_registration.contains_key(&record.registration_number) {
                return corrupt(format!(
                    "registration number {} repeated",
                    record.registration_number
                ));
            }
            if state.by_token.contains_key(&record.lookup_token) {
                return corrupt(format!("lookup token {} repeated", record.lookup_token));
            }
            match state.grade_scale.derive(&record.grade_score) {
                Ok(label) if label == record.grade_label => {}
                Ok(label) => {
                    return corrupt(format!(
                        "grade label {} does not match score (expected {label})",
                        record.grade_label
                    ))
                }
                Err(e) => return corrupt(e.to_string()),
            }

            state.insert(record);
        }

        Ok(state)
    }
}

fn require_non_empty(value: &str, field: &'static str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(RegistryError::EmptyField { field });
    }
    Ok(())
}

/// Academic credential registry
///
/// Mutations take the write guard for the whole validate-then-commit step,
/// so readers see either the full prior state or the full new state. Events
/// are handed to the sink after commit and before the guard is released.
pub struct CredentialRegistry {
    state: Arc<RwLock<RegistryState>>,
    sink: Arc<dyn EventSink>,
}

impl CredentialRegistry {
    /// Create an empty registry owned by `owner`, discarding events.
    pub fn new(owner: Address) -> Self {
        Self::with_config(owner, &RegistryConfig::default(), Arc::new(NoopEventSink))
    }

    pub fn with_config(owner: Address, config: &RegistryConfig, sink: Arc<dyn EventSink>) -> Self {
        Self {
            state: Arc::new(RwLock::new(RegistryState::new(owner, config.grade_scale))),
            sink,
        }
    }

    /// Rebuild a registry from a snapshot.
    pub fn from_snapshot(snapshot: RegistrySnapshot, sink: Arc<dyn EventSink>) -> Result<Self> {
        let state = RegistryState::restore(snapshot).map_err(|e| {
            warn!("rejected registry snapshot: {}", e);
            e
        })?;
        Ok(Self {
            state: Arc::new(RwLock::new(state)),
            sink,
        })
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        self.state.read().snapshot()
    }

    /// Issue a credential to `request.recipient`, returning its serial number.
    ///
    /// Checks run in a fixed order: authorization, then recipient,
    /// registration number and token uniqueness, then field validation.
    /// Nothing is written unless all of them pass.
    pub fn issue_credential(&self, caller: &Address, request: IssueRequest) -> Result<u64> {
        let mut state = self.state.write();

        state.authorize_credentials(caller, "issue credentials")?;

        if state.records.contains_key(&request.recipient) {
            return Err(RegistryError::DuplicateRecipient {
                recipient: request.recipient,
            });
        }
        if state
            .by_registration
            .contains_key(&request.registration_number)
        {
            return Err(RegistryError::DuplicateRegistrationNumber {
                registration_number: request.registration_number,
            });
        }
        if state.by_token.contains_key(&request.lookup_token) {
            return Err(RegistryError::DuplicateToken {
                lookup_token: request.lookup_token,
            });
        }

        require_non_empty(&request.registration_number, "registration_number")?;
        require_non_empty(&request.lookup_token, "lookup_token")?;
        let grade_label = state.grade_scale.derive(&request.grade_score)?;

        let serial_no = state.next_serial_no;
        let next_serial_no = serial_no
            .checked_add(1)
            .ok_or(RegistryError::SerialOverflow)?;

        let record = CredentialRecord::from_request(serial_no, grade_label, request);
        let event = RegistryEvent::Issued {
            recipient: record.recipient,
            serial_no,
            lookup_token: record.lookup_token.clone(),
        };

        state.insert(record);
        state.next_serial_no = next_serial_no;

        debug!(serial_no, caller = %caller, "credential issued");
        self.emit(&event);
        Ok(serial_no)
    }

    /// Remove the record holding `lookup_token`.
    ///
    /// Its registration number and token become reusable; its serial does not.
    pub fn revoke_credential(&self, caller: &Address, lookup_token: &str) -> Result<()> {
        let mut state = self.state.write();

        state.authorize_credentials(caller, "revoke credentials")?;
        let recipient = *state
            .by_token
            .get(lookup_token)
            .ok_or_else(|| RegistryError::NotFound {
                key: lookup_token.to_string(),
            })?;

        let record = state
            .records
            .remove(&recipient)
            .ok_or_else(|| RegistryError::NotFound {
                key: lookup_token.to_string(),
            })?;
        state.by_registration.remove(&record.registration_number);
        state.by_token.remove(&record.lookup_token);

        debug!(serial_no = record.serial_no, caller = %caller, "credential revoked");
        self.emit(&RegistryEvent::Revoked {
            recipient: record.recipient,
            serial_no: record.serial_no,
            lookup_token: record.lookup_token,
        });
        Ok(())
    }

    fn emit(&self, event: &RegistryEvent) {
        debug!(kind = event.kind(), "publishing registry event");
        self.sink.publish(event);
    }

    /// Authorize `address` to issue and revoke. Granting twice is a no-op.
    pub fn grant_issuer(&self, caller: &Address, address: Address) -> Result<()> {
        let mut state = self.state.write();
        state.authorize_roles(caller, "grant issuers")?;

        if state.roles.grant(address) {
            debug!(issuer = %address, "issuer granted");
            self.emit(&RegistryEvent::IssuerGranted { issuer: address });
        }
        Ok(())
    }

    /// Withdraw issuer rights. Revoking a non-issuer is a no-op.
    pub fn revoke_issuer(&self, caller: &Address, address: &Address) -> Result<()> {
        let mut state = self.state.write();
        state.authorize_roles(caller, "revoke issuers")?;

        if state.roles.revoke(address) {
            debug!(issuer = %address, "issuer revoked");
            self.emit(&RegistryEvent::IssuerRevoked { issuer: *address });
        }
        Ok(())
    }

    pub fn get_by_recipient(&self, recipient: &Address) -> Result<CredentialRecord> {
        self.state
            .read()
            .records
            .get(recipient)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound {
                key: recipient.to_string(),
            })
    }

    /// Public verification lookup.
    pub fn get_by_token(&self, lookup_token: &str) -> Result<CredentialRecord> {
        self.state
            .read()
            .record_by_token(lookup_token)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound {
                key: lookup_token.to_string(),
            })
    }

    pub fn is_active_issuer(&self, address: &Address) -> bool {
        self.state.read().roles.is_issuer(address)
    }

    pub fn is_owner(&self, address: &Address) -> bool {
        self.state.read().roles.is_owner(address)
    }

    pub fn owner(&self) -> Address {
        self.state.read().roles.owner()
    }

    /// Authorized issuers, sorted.
    pub fn issuers(&self) -> Vec<Address> {
        self.state.read().roles.issuers().copied().collect()
    }

    /// Serial the next successful issuance will receive.
    pub fn next_serial_no(&self) -> u64 {
        self.state.read().next_serial_no
    }

    pub fn registration_number_in_use(&self, registration_number: &str) -> bool {
        self.state
            .read()
            .by_registration
            .contains_key(registration_number)
    }

    pub fn lookup_token_in_use(&self, lookup_token: &str) -> bool {
        self.state.read().by_token.contains_key(lookup_token)
    }

    pub fn active_count(&self) -> usize {
        self.state.read().records.len()
    }

    pub fn grade_scale(&self) -> GradeScale {
        self.state.read().grade_scale
    }
}

impl std::fmt::Debug for CredentialRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("CredentialRegistry")
            .field("owner", &state.roles.owner())
            .field("active", &state.records.len())
            .field("next_serial_no", &state.next_serial_no)
            .finish()
    }
}

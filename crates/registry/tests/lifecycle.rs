//! End-to-end credential lifecycle: issuance, verification, revocation,
//! reissue, persistence, and event delivery.

use certchain_registry::{
    BroadcastEventSink, CredentialRegistry, MemoryEventSink, MemorySnapshotStore, NoopEventSink,
    RegistryConfig, RegistryError, SledSnapshotStore, SnapshotStore,
};
use certchain_types::{generate_lookup_token, Address, GradeScale, IssueRequest, RegistryEvent};
use std::sync::Arc;
use tempfile::TempDir;

const OWNER: Address = Address::new([0x0a; 32]);
const STUDENT: Address = Address::new([0x5a; 32]);
const SECOND_STUDENT: Address = Address::new([0x5b; 32]);
const STAFF: Address = Address::new([0x77; 32]);

/// Helper to create an issuance request
fn create_request(recipient: Address, registration_number: &str, token: &str) -> IssueRequest {
    IssueRequest {
        recipient,
        registration_number: registration_number.to_string(),
        holder_name: "Alice".to_string(),
        organization_unit: "School of Engineering".to_string(),
        sub_unit: "CSE".to_string(),
        period: "2025".to_string(),
        grade_score: "3.95".to_string(),
        issued_on: "2025-06-24".to_string(),
        lookup_token: token.to_string(),
    }
}

#[test]
fn test_owner_issue_reject_revoke_reissue() {
    let sink = MemoryEventSink::new();
    let registry =
        CredentialRegistry::with_config(OWNER, &RegistryConfig::default(), Arc::new(sink.clone()));

    let token = "0x1234567890abcdef";
    let serial = registry
        .issue_credential(&OWNER, create_request(STUDENT, "2025001", token))
        .unwrap();
    assert_eq!(serial, 0);
    assert_eq!(registry.get_by_recipient(&STUDENT).unwrap().grade_label, "A");

    let err = registry
        .issue_credential(&OWNER, create_request(STUDENT, "2025777", "fresh-token"))
        .unwrap_err();
    assert!(matches!(err, RegistryError::DuplicateRecipient { .. }));

    registry.revoke_credential(&OWNER, token).unwrap();
    let serial = registry
        .issue_credential(&OWNER, create_request(SECOND_STUDENT, "2025001", token))
        .unwrap();
    assert_eq!(serial, 1);

    let record = registry.get_by_token(token).unwrap();
    assert_eq!(record.recipient, SECOND_STUDENT);
    assert_eq!(record.serial_no, 1);

    let kinds: Vec<&str> = sink.events().iter().map(|e| e.kind()).collect();
    assert_eq!(kinds, vec!["issued", "revoked", "issued"]);
}

#[test]
fn test_lookup_is_stable_without_mutation() {
    let registry = CredentialRegistry::new(OWNER);
    let token = generate_lookup_token();
    registry
        .issue_credential(&OWNER, create_request(STUDENT, "2025001", &token))
        .unwrap();

    let first = registry.get_by_token(&token).unwrap();
    let second = registry.get_by_token(&token).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.digest(), second.digest());
}

#[test]
fn test_delegated_issuer_flow() {
    let registry = CredentialRegistry::new(OWNER);
    registry.grant_issuer(&OWNER, STAFF).unwrap();

    registry
        .issue_credential(&STAFF, create_request(STUDENT, "2025001", "staff-token"))
        .unwrap();
    assert!(registry.registration_number_in_use("2025001"));

    registry.revoke_issuer(&OWNER, &STAFF).unwrap();
    let err = registry
        .revoke_credential(&STAFF, "staff-token")
        .unwrap_err();
    assert!(matches!(err, RegistryError::Unauthorized { .. }));

    // The owner keeps full control over credentials issued by former staff.
    registry.revoke_credential(&OWNER, "staff-token").unwrap();
    assert_eq!(registry.active_count(), 0);
}

#[test]
fn test_memory_store_roundtrip() {
    let store = MemorySnapshotStore::new();
    assert!(store.load().unwrap().is_none());

    let registry = CredentialRegistry::new(OWNER);
    registry.grant_issuer(&OWNER, STAFF).unwrap();
    registry
        .issue_credential(&OWNER, create_request(STUDENT, "2025001", "t-1"))
        .unwrap();
    registry
        .issue_credential(&STAFF, create_request(SECOND_STUDENT, "2025002", "t-2"))
        .unwrap();
    registry.revoke_credential(&OWNER, "t-1").unwrap();
    store.save(&registry.snapshot()).unwrap();

    let restored =
        CredentialRegistry::from_snapshot(store.load().unwrap().unwrap(), Arc::new(NoopEventSink))
            .unwrap();
    assert_eq!(restored.snapshot(), registry.snapshot());
    assert_eq!(restored.next_serial_no(), 2);
    assert!(restored.is_active_issuer(&STAFF));
    assert!(!restored.registration_number_in_use("2025001"));
    assert_eq!(restored.get_by_token("t-2").unwrap().recipient, SECOND_STUDENT);
}

#[test]
fn test_sled_store_persists_across_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let config = RegistryConfig {
        grade_scale: GradeScale::Compact,
        ..RegistryConfig::default()
    };

    {
        let store = SledSnapshotStore::open(temp_dir.path()).unwrap();
        let registry = CredentialRegistry::with_config(OWNER, &config, Arc::new(NoopEventSink));
        registry
            .issue_credential(&OWNER, create_request(STUDENT, "2025001", "persisted"))
            .unwrap();
        store.save(&registry.snapshot()).unwrap();
    }

    let store = SledSnapshotStore::open(temp_dir.path()).unwrap();
    let snapshot = store.load().unwrap().expect("snapshot stored");
    let registry = CredentialRegistry::from_snapshot(snapshot, Arc::new(NoopEventSink)).unwrap();

    assert_eq!(registry.grade_scale(), GradeScale::Compact);
    assert_eq!(registry.next_serial_no(), 1);
    assert_eq!(registry.get_by_token("persisted").unwrap().recipient, STUDENT);
}

#[tokio::test]
async fn test_subscribers_observe_commit_order() {
    let config = RegistryConfig::default();
    let sink = BroadcastEventSink::for_config(&config);
    let mut events = sink.subscribe();
    let registry = CredentialRegistry::with_config(OWNER, &config, Arc::new(sink));

    registry
        .issue_credential(&OWNER, create_request(STUDENT, "2025001", "t-1"))
        .unwrap();
    registry.revoke_credential(&OWNER, "t-1").unwrap();
    // Rejected mutations publish nothing.
    registry.revoke_credential(&OWNER, "t-1").unwrap_err();

    assert_eq!(
        events.recv().await.unwrap(),
        RegistryEvent::Issued {
            recipient: STUDENT,
            serial_no: 0,
            lookup_token: "t-1".into()
        }
    );
    assert_eq!(
        events.recv().await.unwrap(),
        RegistryEvent::Revoked {
            recipient: STUDENT,
            serial_no: 0,
            lookup_token: "t-1".into()
        }
    );
    assert!(events.try_recv().is_err());
}

#[test]
fn test_concurrent_readers_see_whole_records() {
    let registry = Arc::new(CredentialRegistry::new(OWNER));
    for i in 0..32u8 {
        let mut recipient = [0u8; 32];
        recipient[0] = i;
        recipient[1] = 0xff;
        registry
            .issue_credential(
                &OWNER,
                create_request(Address::new(recipient), &format!("REG-{i}"), &format!("tok-{i}")),
            )
            .unwrap();
    }

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let registry = Arc::clone(&registry);
            std::thread::spawn(move || {
                for i in 0..32u8 {
                    let record = registry.get_by_token(&format!("tok-{i}")).unwrap();
                    assert_eq!(record.registration_number, format!("REG-{i}"));
                    assert_eq!(record.serial_no, u64::from(i));
                }
            })
        })
        .collect();

    for reader in readers {
        reader.join().unwrap();
    }
}

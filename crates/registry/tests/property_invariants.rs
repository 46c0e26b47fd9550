use certchain_registry::{CredentialRegistry, RegistryError};
use certchain_types::{Address, IssueRequest};
use proptest::prelude::*;
use std::collections::HashSet;

// Random issue/revoke/grant sequences against the registry, checking the
// uniqueness and serial invariants after every step.

const OWNER: Address = Address::new([0xee; 32]);

#[derive(Debug, Clone)]
enum Op {
    Issue {
        caller: u8,
        recipient: u8,
        registration: u8,
        token: u8,
    },
    Revoke {
        caller: u8,
        token: u8,
    },
    Grant {
        caller: u8,
        issuer: u8,
    },
}

/// Small id spaces force collisions. Caller id 0 is the owner.
fn address(id: u8) -> Address {
    if id == 0 {
        OWNER
    } else {
        Address::new([id; 32])
    }
}

fn arbitrary_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0u8..4, 1u8..6, 0u8..5, 0u8..5).prop_map(
            |(caller, recipient, registration, token)| Op::Issue {
                caller,
                recipient,
                registration,
                token,
            }
        ),
        2 => (0u8..4, 0u8..5).prop_map(|(caller, token)| Op::Revoke { caller, token }),
        1 => (0u8..4, 1u8..4).prop_map(|(caller, issuer)| Op::Grant { caller, issuer }),
    ]
}

fn request(recipient: u8, registration: u8, token: u8) -> IssueRequest {
    IssueRequest {
        recipient: address(recipient),
        registration_number: format!("REG-{registration}"),
        holder_name: format!("Holder {recipient}"),
        organization_unit: "School of Science".into(),
        sub_unit: "Physics".into(),
        period: "2024".into(),
        grade_score: "3.10".into(),
        issued_on: "2024-12-01".into(),
        lookup_token: format!("TOKEN{token}"),
    }
}

fn assert_invariants(registry: &CredentialRegistry) -> Result<(), TestCaseError> {
    let snapshot = registry.snapshot();
    let mut recipients = HashSet::new();
    let mut registrations = HashSet::new();
    let mut tokens = HashSet::new();

    for record in &snapshot.records {
        prop_assert!(recipients.insert(record.recipient));
        prop_assert!(registrations.insert(record.registration_number.clone()));
        prop_assert!(tokens.insert(record.lookup_token.clone()));
        prop_assert!(record.serial_no < snapshot.next_serial_no);
        prop_assert_eq!(&registry.get_by_token(&record.lookup_token).unwrap(), record);
        prop_assert_eq!(&registry.get_by_recipient(&record.recipient).unwrap(), record);
    }
    Ok(())
}

proptest! {
    #[test]
    fn invariants_hold_for_any_operation_sequence(
        ops in prop::collection::vec(arbitrary_op(), 1..60),
    ) {
        let registry = CredentialRegistry::new(OWNER);
        let mut issued_serials: Vec<u64> = Vec::new();

        for op in ops {
            let before = registry.snapshot();
            let outcome = match op {
                Op::Issue { caller, recipient, registration, token } => registry
                    .issue_credential(&address(caller), request(recipient, registration, token))
                    .map(|serial| issued_serials.push(serial)),
                Op::Revoke { caller, token } => {
                    registry.revoke_credential(&address(caller), &format!("TOKEN{token}"))
                }
                Op::Grant { caller, issuer } => {
                    registry.grant_issuer(&address(caller), address(issuer))
                }
            };

            if let Err(err) = outcome {
                // Failed operations never change state.
                prop_assert_eq!(&registry.snapshot(), &before);
                prop_assert!(
                    matches!(
                        err,
                        RegistryError::Unauthorized { .. }
                            | RegistryError::DuplicateRecipient { .. }
                            | RegistryError::DuplicateRegistrationNumber { .. }
                            | RegistryError::DuplicateToken { .. }
                            | RegistryError::NotFound { .. }
                    ),
                    "unexpected error: {}",
                    err
                );
            }
            assert_invariants(&registry)?;
        }

        prop_assert!(issued_serials.windows(2).all(|w| w[0] < w[1]));
        prop_assert_eq!(registry.next_serial_no(), issued_serials.len() as u64);
    }
}

proptest! {
    #[test]
    fn strangers_can_never_mutate(
        stranger in 10u8..=200,
        recipient in 1u8..6,
    ) {
        let registry = CredentialRegistry::new(OWNER);
        let caller = Address::new([stranger; 32]);

        let err = registry.issue_credential(&caller, request(recipient, 0, 0)).unwrap_err();
        prop_assert!(
            matches!(err, RegistryError::Unauthorized { .. }),
            "unexpected error: {}",
            err
        );
        prop_assert!(!registry.registration_number_in_use("REG-0"));
        prop_assert!(!registry.lookup_token_in_use("TOKEN0"));
        prop_assert!(registry.grant_issuer(&caller, caller).is_err());
        prop_assert!(!registry.is_active_issuer(&caller));
    }
}

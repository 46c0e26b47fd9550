use crate::Address;
use serde::{Deserialize, Serialize};

/// State-change notification published after a registry mutation commits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RegistryEvent {
    Issued {
        recipient: Address,
        serial_no: u64,
        lookup_token: String,
    },
    Revoked {
        recipient: Address,
        serial_no: u64,
        lookup_token: String,
    },
    IssuerGranted {
        issuer: Address,
    },
    IssuerRevoked {
        issuer: Address,
    },
}

impl RegistryEvent {
    /// Short name used in log lines; equal to the serialized `kind` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            RegistryEvent::Issued { .. } => "issued",
            RegistryEvent::Revoked { .. } => "revoked",
            RegistryEvent::IssuerGranted { .. } => "issuer_granted",
            RegistryEvent::IssuerRevoked { .. } => "issuer_revoked",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_serialized_tag() {
        let issuer = Address::new([3u8; 32]);
        let events = [
            RegistryEvent::Issued {
                recipient: issuer,
                serial_no: 7,
                lookup_token: "abc".into(),
            },
            RegistryEvent::Revoked {
                recipient: issuer,
                serial_no: 7,
                lookup_token: "abc".into(),
            },
            RegistryEvent::IssuerGranted { issuer },
            RegistryEvent::IssuerRevoked { issuer },
        ];

        for event in events {
            let json = serde_json::to_value(&event).unwrap();
            assert_eq!(json["kind"], event.kind());
        }
    }
}

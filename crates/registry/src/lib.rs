//! Academic credential registry
//!
//! Issues, revokes, and serves tamper-evident credentials. Each recipient
//! address holds at most one active credential, and every registration
//! number and lookup token is unique among active credentials. Callers are
//! authenticated by the ledger; this crate only checks their role.

pub mod config;
pub mod errors;
pub mod events;
pub mod registry;
pub mod roles;
pub mod snapshot;
pub mod storage;

pub use config::RegistryConfig;
pub use errors::*;
pub use events::*;
pub use registry::CredentialRegistry;
pub use roles::RoleTable;
pub use snapshot::*;
pub use storage::*;

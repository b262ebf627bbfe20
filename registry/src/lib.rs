//! Device Registry
//!
//! Binds ENS subdomains to per-user device managers. A [`Directory`] provisions
//! one [`UserDeviceManager`] per user and per ENS domain; each manager tracks the
//! user's devices and the permission level every app holds on them.

pub mod device_manager;
pub mod ens;
pub mod error;
pub mod events;
pub mod factory;
pub mod types;
pub mod verifier;

pub use device_manager::{Collaborators, RegistryInfo, UserDeviceManager};
pub use ens::{EnsError, EnsRegistry, InMemoryEns};
pub use error::{RegistryError, Result};
pub use events::{EventLog, EventSink, RegistryEvent};
pub use factory::{Directory, DirectoryConfig};
pub use types::{identity_hash, AppPermission, Device, PermissionLevel, ProofMaterial};
pub use verifier::{MockUniqueId, ProofInvalid, ProofVerifier};

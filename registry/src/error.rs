//! Error types for the device registry

use alloy_primitives::{Address, B256, U256};
use thiserror::Error;

use crate::ens::EnsError;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Unauthorized: caller {caller} is not {expected}")]
    Unauthorized { caller: Address, expected: Address },

    #[error("No registry for user: {0}")]
    UserNotFound(Address),

    #[error("Domain not registered: {0}")]
    DomainNotFound(String),

    #[error("Registry not found: {0}")]
    RegistryNotFound(Address),

    #[error("Device not found: {0}")]
    DeviceNotFound(B256),

    #[error("App {app_id} not found on device {identity_hash}")]
    AppNotFound { identity_hash: B256, app_id: String },

    #[error("User already has a registry: {0}")]
    UserAlreadyHasRegistry(Address),

    #[error("Domain already registered: {0}")]
    DomainAlreadyRegistered(String),

    #[error("Device already exists: {0}")]
    DeviceAlreadyExists(B256),

    #[error("Invalid permission level: {0} (max 3)")]
    InvalidPermission(u8),

    #[error("Proof verification failed: {0}")]
    ProofVerificationFailed(String),

    #[error("Proof nullifier already used: {0}")]
    ReplayedProof(U256),

    #[error("Invalid ENS domain: {0:?}")]
    InvalidDomain(String),

    #[error("Invalid device model: {0:?}")]
    InvalidModel(String),

    #[error("ENS error: {0}")]
    Ens(#[from] EnsError),
}

pub type Result<T> = std::result::Result<T, RegistryError>;

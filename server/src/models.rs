//! Data models for API requests/responses

use alloy_primitives::{Address, B256, U256};
use device_registry::{PermissionLevel, ProofMaterial, RegistryEvent};
use serde::{Deserialize, Serialize};

/// Provisioning request from the authority
#[derive(Debug, Clone, Deserialize)]
pub struct CreateRegistryRequest {
    pub owner: Address,
    pub ens_domain: String,
    pub owner_nullifier_hash: U256,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegistryListResponse {
    pub registries: Vec<Address>,
    pub count: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddDeviceRequest {
    pub model: String,
    pub device_address: Address,
    pub device_nullifier: U256,
    pub proof: ProofMaterial,
}

#[derive(Debug, Clone, Serialize)]
pub struct AddDeviceResponse {
    pub identity_hash: B256,
    pub subdomain: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeviceListResponse {
    pub registry: Address,
    pub device_hashes: Vec<B256>,
    pub device_count: usize,
}

/// Permission levels arrive raw so out-of-range values reach the registry check
#[derive(Debug, Clone, Deserialize)]
pub struct GrantAppRequest {
    pub app_id: String,
    pub permission_level: u8,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdatePermissionRequest {
    pub permission_level: u8,
}

#[derive(Debug, Clone, Serialize)]
pub struct PermissionChangeResponse {
    pub identity_hash: B256,
    pub app_id: String,
    pub old_level: Option<PermissionLevel>,
    pub new_level: PermissionLevel,
}

#[derive(Debug, Clone, Serialize)]
pub struct AppListResponse {
    pub identity_hash: B256,
    pub app_ids: Vec<String>,
    pub app_count: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventsQuery {
    pub since: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventsResponse {
    pub events: Vec<RegistryEvent>,
    /// Cursor for the next poll
    pub next: usize,
}

/// Health check response
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub chain_id: u64,
    pub directory: Address,
    pub authority: Address,
    pub registry_count: usize,
    pub version: String,
    pub timestamp: String,
}

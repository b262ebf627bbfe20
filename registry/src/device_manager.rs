//! Per-user device manager
//!
//! Holds one user's devices, keyed by identity hash, and the permission level
//! each app holds on each device. Devices are added with a one-time proof;
//! every other mutation is restricted to the registry owner.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use alloy_primitives::{Address, B256, U256};
use serde::Serialize;
use tracing::info;

use crate::ens::{namehash, EnsRegistry, ETH_COIN_TYPE};
use crate::error::{RegistryError, Result};
use crate::events::{EventSink, RegistryEvent};
use crate::types::{identity_hash, validate_model, AppPermission, Device, PermissionLevel, ProofMaterial};
use crate::verifier::{signal_hash, ProofVerifier, GROUP_ID};

/// External services every device manager talks to
#[derive(Clone)]
pub struct Collaborators {
    pub verifier: Arc<dyn ProofVerifier>,
    pub ens: Arc<dyn EnsRegistry>,
    pub events: Arc<dyn EventSink>,
}

/// Public summary of a device manager
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistryInfo {
    pub handle: Address,
    pub owner: Address,
    pub ens_domain: String,
    pub owner_nullifier_hash: U256,
    pub device_count: usize,
}

struct DeviceEntry {
    device: Device,
    apps: HashMap<String, PermissionLevel>,
    app_ids: Vec<String>,
}

pub struct UserDeviceManager {
    handle: Address,
    owner: Address,
    ens_domain: String,
    owner_nullifier_hash: U256,
    parent_node: B256,
    external_nullifier_hash: U256,
    devices: HashMap<B256, DeviceEntry>,
    device_hashes: Vec<B256>,
    used_nullifiers: HashSet<U256>,
    collaborators: Collaborators,
}

impl UserDeviceManager {
    /// `ens_domain` must already be normalized.
    pub(crate) fn new(
        handle: Address,
        owner: Address,
        ens_domain: String,
        owner_nullifier_hash: U256,
        external_nullifier_hash: U256,
        collaborators: Collaborators,
    ) -> Self {
        Self {
            handle,
            owner,
            parent_node: namehash(&ens_domain),
            ens_domain,
            owner_nullifier_hash,
            external_nullifier_hash,
            devices: HashMap::new(),
            device_hashes: Vec::new(),
            used_nullifiers: HashSet::new(),
            collaborators,
        }
    }

    pub fn handle(&self) -> Address {
        self.handle
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn ens_domain(&self) -> &str {
        &self.ens_domain
    }

    pub fn owner_nullifier_hash(&self) -> U256 {
        self.owner_nullifier_hash
    }

    pub fn info(&self) -> RegistryInfo {
        RegistryInfo {
            handle: self.handle,
            owner: self.owner,
            ens_domain: self.ens_domain.clone(),
            owner_nullifier_hash: self.owner_nullifier_hash,
            device_count: self.device_count(),
        }
    }

    pub fn is_nullifier_used(&self, nullifier_hash: U256) -> bool {
        self.used_nullifiers.contains(&nullifier_hash)
    }

    fn only_owner(&self, caller: Address) -> Result<()> {
        if caller != self.owner {
            return Err(RegistryError::Unauthorized {
                caller,
                expected: self.owner,
            });
        }
        Ok(())
    }

    fn entry(&self, identity_hash: B256) -> Result<&DeviceEntry> {
        self.devices
            .get(&identity_hash)
            .ok_or(RegistryError::DeviceNotFound(identity_hash))
    }

    /// Adds a device under `<model>.<ens_domain>`.
    ///
    /// Every check and the ENS registration run before any local state is
    /// written, so a failed call leaves the registry untouched.
    pub fn add_device(
        &mut self,
        model: &str,
        device_address: Address,
        device_nullifier: U256,
        proof: &ProofMaterial,
    ) -> Result<B256> {
        validate_model(model)?;

        if self.used_nullifiers.contains(&proof.nullifier_hash) {
            return Err(RegistryError::ReplayedProof(proof.nullifier_hash));
        }

        self.collaborators
            .verifier
            .verify(
                proof.root,
                GROUP_ID,
                signal_hash(self.owner),
                proof.nullifier_hash,
                self.external_nullifier_hash,
                &proof.proof,
            )
            .map_err(|e| RegistryError::ProofVerificationFailed(e.to_string()))?;

        let subdomain = format!("{}.{}", model, self.ens_domain);
        let hash = identity_hash(&subdomain, device_address, device_nullifier);
        if self.devices.contains_key(&hash) {
            return Err(RegistryError::DeviceAlreadyExists(hash));
        }

        let ens = &self.collaborators.ens;
        let node = ens.create_subnode(self.parent_node, model, device_address, hash.as_slice())?;
        ens.set_address(node, ETH_COIN_TYPE, device_address)?;
        ens.set_text(node, "model", model)?;

        let device = Device {
            model: model.to_string(),
            subdomain: subdomain.clone(),
            device_address,
            device_nullifier,
            identity_hash: hash,
        };
        self.devices.insert(
            hash,
            DeviceEntry {
                device,
                apps: HashMap::new(),
                app_ids: Vec::new(),
            },
        );
        self.device_hashes.push(hash);
        self.used_nullifiers.insert(proof.nullifier_hash);

        info!("Device added: {} -> {} ({})", subdomain, device_address, hash);
        self.collaborators.events.emit(RegistryEvent::DeviceAdded {
            registry: self.handle,
            identity_hash: hash,
            model: model.to_string(),
            subdomain,
            device_address,
            device_nullifier,
        });

        Ok(hash)
    }

    /// Grants `app_id` access to a device.
    ///
    /// A repeated grant for the same app overwrites its level in place and is
    /// reported as a permission update; the app id list never repeats.
    pub fn add_app_to_device(
        &mut self,
        caller: Address,
        identity_hash: B256,
        app_id: &str,
        permission_level: u8,
    ) -> Result<()> {
        self.only_owner(caller)?;
        let level = PermissionLevel::try_from(permission_level)?;

        let handle = self.handle;
        let entry = self
            .devices
            .get_mut(&identity_hash)
            .ok_or(RegistryError::DeviceNotFound(identity_hash))?;

        let event = match entry.apps.insert(app_id.to_string(), level) {
            Some(old_level) => RegistryEvent::PermissionUpdated {
                registry: handle,
                identity_hash,
                app_id: app_id.to_string(),
                old_level,
                new_level: level,
            },
            None => {
                entry.app_ids.push(app_id.to_string());
                RegistryEvent::AppAdded {
                    registry: handle,
                    identity_hash,
                    app_id: app_id.to_string(),
                    permission_level: level,
                }
            }
        };

        info!("App {} granted {} on {}", app_id, level, identity_hash);
        self.collaborators.events.emit(event);
        Ok(())
    }

    /// Changes an existing grant. Returns the previous level.
    pub fn update_app_permission(
        &mut self,
        caller: Address,
        identity_hash: B256,
        app_id: &str,
        new_level: u8,
    ) -> Result<PermissionLevel> {
        self.only_owner(caller)?;

        let handle = self.handle;
        let entry = self
            .devices
            .get_mut(&identity_hash)
            .ok_or(RegistryError::DeviceNotFound(identity_hash))?;
        let slot = entry
            .apps
            .get_mut(app_id)
            .ok_or_else(|| RegistryError::AppNotFound {
                identity_hash,
                app_id: app_id.to_string(),
            })?;
        let new_level = PermissionLevel::try_from(new_level)?;

        let old_level = std::mem::replace(slot, new_level);

        info!("App {} on {}: {} -> {}", app_id, identity_hash, old_level, new_level);
        self.collaborators.events.emit(RegistryEvent::PermissionUpdated {
            registry: handle,
            identity_hash,
            app_id: app_id.to_string(),
            old_level,
            new_level,
        });

        Ok(old_level)
    }

    pub fn get_device(&self, identity_hash: B256) -> Result<&Device> {
        self.entry(identity_hash).map(|e| &e.device)
    }

    pub fn get_app_permission(&self, identity_hash: B256, app_id: &str) -> Result<AppPermission> {
        let entry = self.entry(identity_hash)?;
        entry
            .apps
            .get(app_id)
            .map(|level| AppPermission {
                app_id: app_id.to_string(),
                permission_level: *level,
            })
            .ok_or_else(|| RegistryError::AppNotFound {
                identity_hash,
                app_id: app_id.to_string(),
            })
    }

    /// App ids in grant order; empty for a device with no apps.
    pub fn get_device_app_ids(&self, identity_hash: B256) -> Result<&[String]> {
        self.entry(identity_hash).map(|e| e.app_ids.as_slice())
    }

    pub fn get_device_app_count(&self, identity_hash: B256) -> Result<usize> {
        self.entry(identity_hash).map(|e| e.app_ids.len())
    }

    pub fn all_device_hashes(&self) -> &[B256] {
        &self.device_hashes
    }

    pub fn device_count(&self) -> usize {
        self.device_hashes.len()
    }
}

//! Directory of device managers
//!
//! Provisions one [`UserDeviceManager`] per user and per ENS domain and keeps
//! the lookup tables from user address and domain to registry handle.

use std::collections::HashMap;

use alloy_primitives::{Address, U256};
use tracing::info;

use crate::device_manager::{Collaborators, UserDeviceManager};
use crate::error::{RegistryError, Result};
use crate::events::RegistryEvent;
use crate::types::normalize_domain;
use crate::verifier::external_nullifier_hash;

#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    /// Only this caller may provision registries
    pub authority: Address,
    /// Deployer address registry handles are derived from
    pub address: Address,
    pub app_id: String,
    pub action: String,
}

pub struct Directory {
    config: DirectoryConfig,
    external_nullifier_hash: U256,
    nonce: u64,
    collaborators: Collaborators,
    registries: HashMap<Address, UserDeviceManager>,
    user_registry: HashMap<Address, Address>,
    domain_user: HashMap<String, Address>,
    all_registries: Vec<Address>,
}

impl Directory {
    pub fn new(config: DirectoryConfig, collaborators: Collaborators) -> Self {
        let external_nullifier_hash = external_nullifier_hash(&config.app_id, &config.action);
        Self {
            config,
            external_nullifier_hash,
            // Contract accounts start at nonce 1 (EIP-161)
            nonce: 1,
            collaborators,
            registries: HashMap::new(),
            user_registry: HashMap::new(),
            domain_user: HashMap::new(),
            all_registries: Vec::new(),
        }
    }

    pub fn authority(&self) -> Address {
        self.config.authority
    }

    pub fn address(&self) -> Address {
        self.config.address
    }

    /// Provisions a registry for `owner` under `ens_domain`.
    pub fn create(
        &mut self,
        caller: Address,
        owner: Address,
        ens_domain: &str,
        owner_nullifier_hash: U256,
    ) -> Result<Address> {
        if caller != self.config.authority {
            return Err(RegistryError::Unauthorized {
                caller,
                expected: self.config.authority,
            });
        }
        let domain = normalize_domain(ens_domain)?;
        if self.user_registry.contains_key(&owner) {
            return Err(RegistryError::UserAlreadyHasRegistry(owner));
        }
        if self.domain_user.contains_key(&domain) {
            return Err(RegistryError::DomainAlreadyRegistered(domain));
        }

        let handle = self.config.address.create(self.nonce);
        self.nonce += 1;

        let manager = UserDeviceManager::new(
            handle,
            owner,
            domain.clone(),
            owner_nullifier_hash,
            self.external_nullifier_hash,
            self.collaborators.clone(),
        );
        self.registries.insert(handle, manager);
        self.user_registry.insert(owner, handle);
        self.domain_user.insert(domain.clone(), owner);
        self.all_registries.push(handle);

        info!("Registry created: {} for {} ({})", handle, owner, domain);
        self.collaborators.events.emit(RegistryEvent::RegistryCreated {
            user: owner,
            ens_domain: domain,
            registry: handle,
            owner_nullifier_hash,
        });

        Ok(handle)
    }

    pub fn registry_of_user(&self, user: Address) -> Result<Address> {
        self.user_registry
            .get(&user)
            .copied()
            .ok_or(RegistryError::UserNotFound(user))
    }

    pub fn user_of_domain(&self, ens_domain: &str) -> Result<Address> {
        normalize_domain(ens_domain)
            .ok()
            .and_then(|d| self.domain_user.get(&d).copied())
            .ok_or_else(|| RegistryError::DomainNotFound(ens_domain.to_string()))
    }

    pub fn registry_of_domain(&self, ens_domain: &str) -> Result<Address> {
        let user = self.user_of_domain(ens_domain)?;
        self.registry_of_user(user)
    }

    pub fn has_registry(&self, user: Address) -> bool {
        self.user_registry.contains_key(&user)
    }

    pub fn is_domain_registered(&self, ens_domain: &str) -> bool {
        self.user_of_domain(ens_domain).is_ok()
    }

    /// Handles in creation order
    pub fn all_registries(&self) -> &[Address] {
        &self.all_registries
    }

    pub fn registry_count(&self) -> usize {
        self.all_registries.len()
    }

    pub fn registry(&self, handle: Address) -> Result<&UserDeviceManager> {
        self.registries
            .get(&handle)
            .ok_or(RegistryError::RegistryNotFound(handle))
    }

    pub fn registry_mut(&mut self, handle: Address) -> Result<&mut UserDeviceManager> {
        self.registries
            .get_mut(&handle)
            .ok_or(RegistryError::RegistryNotFound(handle))
    }
}

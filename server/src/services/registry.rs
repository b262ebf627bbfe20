//! Registry service
//!
//! Owns the directory behind one write lock. Each mutating call holds the lock
//! for its whole duration, so calls are serialized and all-or-nothing.

use std::sync::Arc;

use alloy_primitives::{Address, B256};
use device_registry::{
    AppPermission, Collaborators, Device, Directory, DirectoryConfig, EventLog, InMemoryEns,
    MockUniqueId, RegistryInfo,
};
use tokio::sync::RwLock;

use crate::config::Config;
use crate::error::AppError;
use crate::models::*;

pub struct RegistryService {
    directory: RwLock<Directory>,
    ens: Arc<InMemoryEns>,
    events: Arc<EventLog>,
}

impl RegistryService {
    pub fn new(config: &Config) -> Self {
        let ens = Arc::new(InMemoryEns::new());
        let events = Arc::new(EventLog::new());
        let directory = Directory::new(
            DirectoryConfig {
                authority: config.authority_address,
                address: config.directory_address,
                app_id: config.world_id_app_id.clone(),
                action: config.world_id_action.clone(),
            },
            Collaborators {
                verifier: Arc::new(MockUniqueId),
                ens: ens.clone(),
                events: events.clone(),
            },
        );

        Self {
            directory: RwLock::new(directory),
            ens,
            events,
        }
    }

    /// Directory address and provisioning authority
    pub async fn directory_identity(&self) -> (Address, Address) {
        let directory = self.directory.read().await;
        (directory.address(), directory.authority())
    }

    pub async fn registry_count(&self) -> usize {
        self.directory.read().await.registry_count()
    }

    pub async fn list_registries(&self) -> RegistryListResponse {
        let directory = self.directory.read().await;
        RegistryListResponse {
            registries: directory.all_registries().to_vec(),
            count: directory.registry_count(),
        }
    }

    pub async fn create_registry(
        &self,
        caller: Address,
        request: CreateRegistryRequest,
    ) -> Result<RegistryInfo, AppError> {
        let mut directory = self.directory.write().await;
        let handle = directory.create(
            caller,
            request.owner,
            &request.ens_domain,
            request.owner_nullifier_hash,
        )?;
        Ok(directory.registry(handle)?.info())
    }

    pub async fn registry_info(&self, handle: Address) -> Result<RegistryInfo, AppError> {
        Ok(self.directory.read().await.registry(handle)?.info())
    }

    pub async fn registry_by_user(&self, user: Address) -> Result<RegistryInfo, AppError> {
        let directory = self.directory.read().await;
        let handle = directory.registry_of_user(user)?;
        Ok(directory.registry(handle)?.info())
    }

    pub async fn registry_by_domain(&self, domain: &str) -> Result<RegistryInfo, AppError> {
        let directory = self.directory.read().await;
        let handle = directory.registry_of_domain(domain)?;
        Ok(directory.registry(handle)?.info())
    }

    pub async fn add_device(
        &self,
        handle: Address,
        request: AddDeviceRequest,
    ) -> Result<AddDeviceResponse, AppError> {
        let mut directory = self.directory.write().await;
        let registry = directory.registry_mut(handle)?;
        let identity_hash = registry.add_device(
            &request.model,
            request.device_address,
            request.device_nullifier,
            &request.proof,
        )?;

        Ok(AddDeviceResponse {
            identity_hash,
            subdomain: registry.get_device(identity_hash)?.subdomain.clone(),
        })
    }

    pub async fn list_devices(&self, handle: Address) -> Result<DeviceListResponse, AppError> {
        let directory = self.directory.read().await;
        let registry = directory.registry(handle)?;
        Ok(DeviceListResponse {
            registry: handle,
            device_hashes: registry.all_device_hashes().to_vec(),
            device_count: registry.device_count(),
        })
    }

    pub async fn get_device(&self, handle: Address, identity_hash: B256) -> Result<Device, AppError> {
        let directory = self.directory.read().await;
        Ok(directory.registry(handle)?.get_device(identity_hash)?.clone())
    }

    pub async fn grant_app(
        &self,
        caller: Address,
        handle: Address,
        identity_hash: B256,
        request: GrantAppRequest,
    ) -> Result<PermissionChangeResponse, AppError> {
        let mut directory = self.directory.write().await;
        let registry = directory.registry_mut(handle)?;
        let old_level = registry
            .get_app_permission(identity_hash, &request.app_id)
            .ok()
            .map(|p| p.permission_level);

        registry.add_app_to_device(caller, identity_hash, &request.app_id, request.permission_level)?;
        let new_level = registry
            .get_app_permission(identity_hash, &request.app_id)?
            .permission_level;

        Ok(PermissionChangeResponse {
            identity_hash,
            app_id: request.app_id,
            old_level,
            new_level,
        })
    }

    pub async fn update_permission(
        &self,
        caller: Address,
        handle: Address,
        identity_hash: B256,
        app_id: String,
        request: UpdatePermissionRequest,
    ) -> Result<PermissionChangeResponse, AppError> {
        let mut directory = self.directory.write().await;
        let registry = directory.registry_mut(handle)?;
        let old_level =
            registry.update_app_permission(caller, identity_hash, &app_id, request.permission_level)?;
        let new_level = registry.get_app_permission(identity_hash, &app_id)?.permission_level;

        Ok(PermissionChangeResponse {
            identity_hash,
            app_id,
            old_level: Some(old_level),
            new_level,
        })
    }

    pub async fn list_apps(&self, handle: Address, identity_hash: B256) -> Result<AppListResponse, AppError> {
        let directory = self.directory.read().await;
        let registry = directory.registry(handle)?;
        let app_ids = registry.get_device_app_ids(identity_hash)?.to_vec();

        Ok(AppListResponse {
            identity_hash,
            app_count: app_ids.len(),
            app_ids,
        })
    }

    pub async fn get_app(
        &self,
        handle: Address,
        identity_hash: B256,
        app_id: &str,
    ) -> Result<AppPermission, AppError> {
        let directory = self.directory.read().await;
        Ok(directory.registry(handle)?.get_app_permission(identity_hash, app_id)?)
    }

    pub fn events_since(&self, cursor: usize) -> EventsResponse {
        let (events, next) = self.events.page(cursor);
        EventsResponse { events, next }
    }

    pub fn resolve(&self, name: &str) -> Result<Address, AppError> {
        self.ens
            .resolve(name)
            .ok_or_else(|| AppError::NotFound(format!("No address record for {}", name)))
    }
}

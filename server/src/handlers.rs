//! HTTP handlers for the directory and per-user device registries

use alloy_primitives::{Address, B256};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use device_registry::{AppPermission, Device, RegistryInfo};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::config::Config;
use crate::error::AppError;
use crate::extractors::Caller;
use crate::models::*;
use crate::services::registry::RegistryService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub registry: Arc<RegistryService>,
}

impl AppState {
    pub fn new(config: Config, registry: RegistryService) -> Self {
        Self {
            config,
            registry: Arc::new(registry),
        }
    }
}

fn parse_address(raw: &str) -> Result<Address, AppError> {
    raw.parse()
        .map_err(|_| AppError::BadRequest(format!("Invalid address: {}", raw)))
}

fn parse_hash(raw: &str) -> Result<B256, AppError> {
    raw.parse()
        .map_err(|_| AppError::BadRequest(format!("Invalid identity hash: {}", raw)))
}

/// Health check endpoint
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let (directory, authority) = state.registry.directory_identity().await;
    Json(HealthResponse {
        status: "healthy".to_string(),
        chain_id: state.config.chain_id,
        directory,
        authority,
        registry_count: state.registry.registry_count().await,
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// List every registry handle in creation order
pub async fn list_registries(State(state): State<AppState>) -> Json<RegistryListResponse> {
    Json(state.registry.list_registries().await)
}

/// Provision a registry (authority only)
pub async fn create_registry(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Json(request): Json<CreateRegistryRequest>,
) -> Result<(StatusCode, Json<RegistryInfo>), AppError> {
    let info = state.registry.create_registry(caller, request).await?;
    Ok((StatusCode::CREATED, Json(info)))
}

pub async fn registry_by_user(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<RegistryInfo>, AppError> {
    let user = parse_address(&address)?;
    Ok(Json(state.registry.registry_by_user(user).await?))
}

pub async fn registry_by_domain(
    State(state): State<AppState>,
    Path(domain): Path<String>,
) -> Result<Json<RegistryInfo>, AppError> {
    Ok(Json(state.registry.registry_by_domain(&domain).await?))
}

pub async fn get_registry(
    State(state): State<AppState>,
    Path(handle): Path<String>,
) -> Result<Json<RegistryInfo>, AppError> {
    let handle = parse_address(&handle)?;
    Ok(Json(state.registry.registry_info(handle).await?))
}

/// Add a device; gated by the proof rather than the caller
pub async fn add_device(
    State(state): State<AppState>,
    Path(handle): Path<String>,
    Json(request): Json<AddDeviceRequest>,
) -> Result<(StatusCode, Json<AddDeviceResponse>), AppError> {
    let handle = parse_address(&handle)?;
    let response = state.registry.add_device(handle, request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn list_devices(
    State(state): State<AppState>,
    Path(handle): Path<String>,
) -> Result<Json<DeviceListResponse>, AppError> {
    let handle = parse_address(&handle)?;
    Ok(Json(state.registry.list_devices(handle).await?))
}

pub async fn get_device(
    State(state): State<AppState>,
    Path((handle, hash)): Path<(String, String)>,
) -> Result<Json<Device>, AppError> {
    let handle = parse_address(&handle)?;
    let hash = parse_hash(&hash)?;
    Ok(Json(state.registry.get_device(handle, hash).await?))
}

/// Grant an app access to a device (owner only)
pub async fn grant_app(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path((handle, hash)): Path<(String, String)>,
    Json(request): Json<GrantAppRequest>,
) -> Result<Json<PermissionChangeResponse>, AppError> {
    let handle = parse_address(&handle)?;
    let hash = parse_hash(&hash)?;
    Ok(Json(state.registry.grant_app(caller, handle, hash, request).await?))
}

pub async fn list_apps(
    State(state): State<AppState>,
    Path((handle, hash)): Path<(String, String)>,
) -> Result<Json<AppListResponse>, AppError> {
    let handle = parse_address(&handle)?;
    let hash = parse_hash(&hash)?;
    Ok(Json(state.registry.list_apps(handle, hash).await?))
}

pub async fn get_app(
    State(state): State<AppState>,
    Path((handle, hash, app_id)): Path<(String, String, String)>,
) -> Result<Json<AppPermission>, AppError> {
    let handle = parse_address(&handle)?;
    let hash = parse_hash(&hash)?;
    Ok(Json(state.registry.get_app(handle, hash, &app_id).await?))
}

/// Change an existing grant (owner only)
pub async fn update_permission(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path((handle, hash, app_id)): Path<(String, String, String)>,
    Json(request): Json<UpdatePermissionRequest>,
) -> Result<Json<PermissionChangeResponse>, AppError> {
    let handle = parse_address(&handle)?;
    let hash = parse_hash(&hash)?;
    Ok(Json(
        state
            .registry
            .update_permission(caller, handle, hash, app_id, request)
            .await?,
    ))
}

/// Poll the event log from a cursor
pub async fn events(
    State(state): State<AppState>,
    Query(query): Query<EventsQuery>,
) -> Json<EventsResponse> {
    Json(state.registry.events_since(query.since.unwrap_or(0)))
}

pub async fn resolve(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Value>, AppError> {
    let address = state.registry.resolve(&name)?;
    Ok(Json(json!({ "name": name, "address": address })))
}

//! Configuration management

use alloy_primitives::Address;
use anyhow::{Context, Result};
use std::env;

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub chain_id: u64,
    pub authority_address: Address, // Provisioning service allowed to create registries
    pub directory_address: Address,
    pub world_id_app_id: String,
    pub world_id_action: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("Invalid PORT")?,

            chain_id: env::var("CHAIN_ID")
                .unwrap_or_else(|_| "1".to_string()) // Ethereum Mainnet
                .parse()
                .context("Invalid CHAIN_ID")?,

            authority_address: env::var("AUTHORITY_ADDRESS")
                .unwrap_or_else(|_| "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".to_string())
                .parse()
                .context("Invalid AUTHORITY_ADDRESS")?,

            directory_address: env::var("DIRECTORY_ADDRESS")
                .unwrap_or_else(|_| "0x5FbDB2315678afecb367f032d93F642f64180aa3".to_string())
                .parse()
                .context("Invalid DIRECTORY_ADDRESS")?,

            world_id_app_id: env::var("WORLD_ID_APP_ID")
                .unwrap_or_else(|_| "app_staging_device_registry".to_string()),

            world_id_action: env::var("WORLD_ID_ACTION")
                .unwrap_or_else(|_| "add-device".to_string()),
        })
    }
}

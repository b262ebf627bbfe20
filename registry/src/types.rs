//! Core data types: permission levels, devices, proof material

use std::fmt;

use alloy_primitives::{keccak256, Address, B256, U256};
use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, Result};

/// Access level an app holds on a device
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum PermissionLevel {
    None = 0,
    Read = 1,
    ReadWrite = 2,
    Full = 3,
}

impl PermissionLevel {
    pub const MAX: u8 = 3;

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for PermissionLevel {
    type Error = RegistryError;

    fn try_from(level: u8) -> Result<Self> {
        match level {
            0 => Ok(Self::None),
            1 => Ok(Self::Read),
            2 => Ok(Self::ReadWrite),
            3 => Ok(Self::Full),
            other => Err(RegistryError::InvalidPermission(other)),
        }
    }
}

impl From<PermissionLevel> for u8 {
    fn from(level: PermissionLevel) -> Self {
        level.as_u8()
    }
}

impl fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::Read => "read",
            Self::ReadWrite => "read-write",
            Self::Full => "full",
        };
        write!(f, "{} ({})", name, self.as_u8())
    }
}

/// A device bound to a user's ENS namespace.
///
/// Identity fields never change after insertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub model: String,
    pub subdomain: String,
    pub device_address: Address,
    pub device_nullifier: U256,
    pub identity_hash: B256,
}

/// One app's access level on one device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppPermission {
    pub app_id: String,
    pub permission_level: PermissionLevel,
}

/// Proof submitted alongside a device addition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofMaterial {
    pub root: U256,
    /// One-time nullifier for this proof submission
    pub nullifier_hash: U256,
    pub proof: [U256; 8],
}

/// `keccak256(abi.encodePacked(subdomain, deviceAddress, deviceNullifier))`
pub fn identity_hash(subdomain: &str, device_address: Address, device_nullifier: U256) -> B256 {
    let mut packed = Vec::with_capacity(subdomain.len() + 20 + 32);
    packed.extend_from_slice(subdomain.as_bytes());
    packed.extend_from_slice(device_address.as_slice());
    packed.extend_from_slice(&device_nullifier.to_be_bytes::<32>());
    keccak256(packed)
}

/// Lowercases an ENS name and rejects empty names or empty labels.
pub fn normalize_domain(domain: &str) -> Result<String> {
    let normalized = domain.trim().to_ascii_lowercase();
    let valid = !normalized.is_empty()
        && normalized
            .split('.')
            .all(|label| !label.is_empty() && !label.chars().any(char::is_whitespace));

    if valid {
        Ok(normalized)
    } else {
        Err(RegistryError::InvalidDomain(domain.to_string()))
    }
}

/// A model becomes a single subdomain label.
pub fn validate_model(model: &str) -> Result<()> {
    if model.is_empty() || model.contains('.') || model.chars().any(char::is_whitespace) {
        return Err(RegistryError::InvalidModel(model.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    #[test]
    fn permission_levels_above_three_are_rejected() {
        for level in 0..=3u8 {
            assert_eq!(PermissionLevel::try_from(level).unwrap().as_u8(), level);
        }
        for level in [4u8, 5, 200, u8::MAX] {
            assert!(matches!(
                PermissionLevel::try_from(level),
                Err(RegistryError::InvalidPermission(l)) if l == level
            ));
        }
    }

    #[test]
    fn permission_level_serializes_as_integer() {
        let json = serde_json::to_string(&PermissionLevel::ReadWrite).unwrap();
        assert_eq!(json, "2");
        assert_eq!(serde_json::from_str::<PermissionLevel>("3").unwrap(), PermissionLevel::Full);
        assert!(serde_json::from_str::<PermissionLevel>("4").is_err());
    }

    #[test]
    fn identity_hash_matches_packed_encoding() {
        let device = address!("d1d1d1d1d1d1d1d1d1d1d1d1d1d1d1d1d1d1d1d1");
        let hash = identity_hash("phone.alice.eth", device, U256::from(42));

        let mut packed = b"phone.alice.eth".to_vec();
        packed.extend_from_slice(&[0xd1; 20]);
        let mut nullifier = [0u8; 32];
        nullifier[31] = 42;
        packed.extend_from_slice(&nullifier);

        assert_eq!(hash, keccak256(&packed));
    }

    #[test]
    fn identity_hash_depends_on_every_field() {
        let device = address!("d1d1d1d1d1d1d1d1d1d1d1d1d1d1d1d1d1d1d1d1");
        let other = address!("d2d2d2d2d2d2d2d2d2d2d2d2d2d2d2d2d2d2d2d2");
        let base = identity_hash("phone.alice.eth", device, U256::from(42));

        assert_eq!(base, identity_hash("phone.alice.eth", device, U256::from(42)));
        assert_ne!(base, identity_hash("tablet.alice.eth", device, U256::from(42)));
        assert_ne!(base, identity_hash("phone.alice.eth", other, U256::from(42)));
        assert_ne!(base, identity_hash("phone.alice.eth", device, U256::from(43)));
    }

    #[test]
    fn domains_are_normalized() {
        assert_eq!(normalize_domain("Alice.ETH").unwrap(), "alice.eth");
        assert_eq!(normalize_domain(" bob.eth ").unwrap(), "bob.eth");
        for bad in ["", ".eth", "alice.", "alice..eth", "al ice.eth"] {
            assert!(matches!(normalize_domain(bad), Err(RegistryError::InvalidDomain(_))));
        }
    }

    #[test]
    fn models_must_be_single_labels() {
        assert!(validate_model("phone").is_ok());
        assert!(validate_model("").is_err());
        assert!(validate_model("my.phone").is_err());
        assert!(validate_model("my phone").is_err());
    }
}

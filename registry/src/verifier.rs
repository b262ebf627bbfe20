//! Proof verification boundary
//!
//! The registry consumes a World ID style `verifyProof` call. No circuit lives
//! here; [`MockUniqueId`] accepts every proof.

use alloy_primitives::{keccak256, Address, U256};
use thiserror::Error;

/// Orb-verified group
pub const GROUP_ID: U256 = U256::from_limbs([1, 0, 0, 0]);

#[derive(Error, Debug)]
#[error("Proof invalid: {0}")]
pub struct ProofInvalid(pub String);

pub trait ProofVerifier: Send + Sync {
    fn verify(
        &self,
        root: U256,
        group_id: U256,
        signal_hash: U256,
        nullifier_hash: U256,
        external_nullifier_hash: U256,
        proof: &[U256; 8],
    ) -> Result<(), ProofInvalid>;
}

/// Stand-in verifier that accepts any proof
#[derive(Debug, Clone, Copy, Default)]
pub struct MockUniqueId;

impl ProofVerifier for MockUniqueId {
    fn verify(
        &self,
        root: U256,
        _group_id: U256,
        signal_hash: U256,
        nullifier_hash: U256,
        _external_nullifier_hash: U256,
        _proof: &[U256; 8],
    ) -> Result<(), ProofInvalid> {
        tracing::debug!(
            "Mock proof accepted: root={:#x}, signal={:#x}, nullifier={:#x}",
            root,
            signal_hash,
            nullifier_hash
        );
        Ok(())
    }
}

/// Reduces a keccak digest into the SNARK scalar field by dropping the low byte.
pub fn hash_to_field(bytes: &[u8]) -> U256 {
    U256::from_be_bytes(keccak256(bytes).0) >> 8usize
}

/// The signal ties a proof to the registry owner's address.
pub fn signal_hash(owner: Address) -> U256 {
    hash_to_field(owner.as_slice())
}

/// `hashToField(abi.encodePacked(hashToField(appId), action))`
pub fn external_nullifier_hash(app_id: &str, action: &str) -> U256 {
    let mut packed = hash_to_field(app_id.as_bytes()).to_be_bytes::<32>().to_vec();
    packed.extend_from_slice(action.as_bytes());
    hash_to_field(&packed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    #[test]
    fn field_hash_fits_in_248_bits() {
        let h = hash_to_field(b"anything");
        assert!(h < (U256::from(1) << 248usize));
        assert_eq!(h, U256::from_be_bytes(keccak256(b"anything").0) >> 8usize);
    }

    #[test]
    fn signal_depends_on_owner() {
        let alice = address!("a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1");
        let bob = address!("b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0");
        assert_eq!(signal_hash(alice), signal_hash(alice));
        assert_ne!(signal_hash(alice), signal_hash(bob));
    }

    #[test]
    fn external_nullifier_separates_actions() {
        let a = external_nullifier_hash("app_staging_123", "add-device");
        let b = external_nullifier_hash("app_staging_123", "add-app");
        let c = external_nullifier_hash("app_other", "add-device");
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn mock_accepts_everything() {
        let result = MockUniqueId.verify(
            U256::ZERO,
            GROUP_ID,
            U256::from(7),
            U256::from(9),
            U256::from(11),
            &[U256::ZERO; 8],
        );
        assert!(result.is_ok());
    }
}

//! ENS collaborator: subnode creation plus address and text records

use std::collections::HashMap;

use alloy_primitives::{keccak256, Address, B256};
use parking_lot::RwLock;
use thiserror::Error;

/// SLIP-44 coin type for ETH address records
pub const ETH_COIN_TYPE: u64 = 60;

#[derive(Error, Debug)]
pub enum EnsError {
    #[error("Unknown node: {0}")]
    UnknownNode(B256),

    #[error("ENS call {call} failed: {reason}")]
    CallFailed { call: &'static str, reason: String },
}

pub fn labelhash(label: &str) -> B256 {
    keccak256(label.as_bytes())
}

/// `keccak256(parent || keccak256(label))`
pub fn subnode(parent: B256, label: &str) -> B256 {
    let mut packed = [0u8; 64];
    packed[..32].copy_from_slice(parent.as_slice());
    packed[32..].copy_from_slice(labelhash(label).as_slice());
    keccak256(packed)
}

/// EIP-137 namehash
pub fn namehash(name: &str) -> B256 {
    if name.is_empty() {
        return B256::ZERO;
    }
    name.rsplit('.').fold(B256::ZERO, subnode)
}

pub trait EnsRegistry: Send + Sync {
    fn node_for(&self, parent: B256, label: &str) -> B256 {
        subnode(parent, label)
    }

    /// Creates or reassigns `label` under `parent`, returning the subnode.
    fn create_subnode(
        &self,
        parent: B256,
        label: &str,
        owner: Address,
        extra_data: &[u8],
    ) -> Result<B256, EnsError>;

    fn set_address(&self, node: B256, coin_type: u64, address: Address) -> Result<(), EnsError>;

    fn set_text(&self, node: B256, key: &str, value: &str) -> Result<(), EnsError>;
}

#[derive(Debug, Clone, Default)]
struct NodeRecord {
    owner: Address,
    extra_data: Vec<u8>,
    addresses: HashMap<u64, Address>,
    texts: HashMap<String, String>,
}

/// Process-local ENS registry and resolver
#[derive(Debug, Default)]
pub struct InMemoryEns {
    nodes: RwLock<HashMap<B256, NodeRecord>>,
}

impl InMemoryEns {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn owner(&self, node: B256) -> Option<Address> {
        self.nodes.read().get(&node).map(|r| r.owner)
    }

    pub fn address(&self, node: B256, coin_type: u64) -> Option<Address> {
        self.nodes
            .read()
            .get(&node)
            .and_then(|r| r.addresses.get(&coin_type).copied())
    }

    pub fn text(&self, node: B256, key: &str) -> Option<String> {
        self.nodes
            .read()
            .get(&node)
            .and_then(|r| r.texts.get(key).cloned())
    }

    pub fn extra_data(&self, node: B256) -> Option<Vec<u8>> {
        self.nodes.read().get(&node).map(|r| r.extra_data.clone())
    }

    /// Resolves a full name to its ETH address record.
    pub fn resolve(&self, name: &str) -> Option<Address> {
        self.address(namehash(&name.to_ascii_lowercase()), ETH_COIN_TYPE)
    }
}

impl EnsRegistry for InMemoryEns {
    fn create_subnode(
        &self,
        parent: B256,
        label: &str,
        owner: Address,
        extra_data: &[u8],
    ) -> Result<B256, EnsError> {
        let node = self.node_for(parent, label);
        let mut nodes = self.nodes.write();
        let record = nodes.entry(node).or_default();
        record.owner = owner;
        record.extra_data = extra_data.to_vec();
        Ok(node)
    }

    fn set_address(&self, node: B256, coin_type: u64, address: Address) -> Result<(), EnsError> {
        self.nodes
            .write()
            .get_mut(&node)
            .ok_or(EnsError::UnknownNode(node))?
            .addresses
            .insert(coin_type, address);
        Ok(())
    }

    fn set_text(&self, node: B256, key: &str, value: &str) -> Result<(), EnsError> {
        self.nodes
            .write()
            .get_mut(&node)
            .ok_or(EnsError::UnknownNode(node))?
            .texts
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, b256};

    #[test]
    fn namehash_matches_eip137_vectors() {
        assert_eq!(namehash(""), B256::ZERO);
        assert_eq!(
            namehash("eth"),
            b256!("93cdeb708b7545dc668eb9280176169d1c33cfd8ed6f04690a0bcc88a93fc4ae")
        );
        assert_eq!(
            namehash("foo.eth"),
            b256!("de9b09fd7c5f901e23a3f19fecc54828e9c848539801e86591bd9801b019f84f")
        );
    }

    #[test]
    fn subnode_composes_namehash() {
        assert_eq!(subnode(namehash("alice.eth"), "phone"), namehash("phone.alice.eth"));
    }

    #[test]
    fn records_are_written_to_created_subnodes() {
        let ens = InMemoryEns::new();
        let device = address!("d1d1d1d1d1d1d1d1d1d1d1d1d1d1d1d1d1d1d1d1");
        let parent = namehash("alice.eth");

        let node = ens.create_subnode(parent, "phone", device, b"extra").unwrap();
        ens.set_address(node, ETH_COIN_TYPE, device).unwrap();
        ens.set_text(node, "model", "phone").unwrap();

        assert_eq!(node, ens.node_for(parent, "phone"));
        assert_eq!(ens.owner(node), Some(device));
        assert_eq!(ens.resolve("Phone.Alice.eth"), Some(device));
        assert_eq!(ens.text(node, "model").as_deref(), Some("phone"));
        assert_eq!(ens.extra_data(node), Some(b"extra".to_vec()));
    }

    #[test]
    fn records_require_an_existing_node() {
        let ens = InMemoryEns::new();
        let node = namehash("ghost.alice.eth");
        assert!(matches!(
            ens.set_address(node, ETH_COIN_TYPE, Address::ZERO),
            Err(EnsError::UnknownNode(n)) if n == node
        ));
        assert!(ens.set_text(node, "model", "ghost").is_err());
    }
}

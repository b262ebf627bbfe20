//! Registry events and the append-only log indexers read from

use alloy_primitives::{Address, B256, U256};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::types::PermissionLevel;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RegistryEvent {
    RegistryCreated {
        user: Address,
        ens_domain: String,
        registry: Address,
        owner_nullifier_hash: U256,
    },
    DeviceAdded {
        registry: Address,
        identity_hash: B256,
        model: String,
        subdomain: String,
        device_address: Address,
        device_nullifier: U256,
    },
    AppAdded {
        registry: Address,
        identity_hash: B256,
        app_id: String,
        permission_level: PermissionLevel,
    },
    PermissionUpdated {
        registry: Address,
        identity_hash: B256,
        app_id: String,
        old_level: PermissionLevel,
        new_level: PermissionLevel,
    },
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: RegistryEvent);
}

#[derive(Debug, Default)]
pub struct EventLog {
    events: RwLock<Vec<RegistryEvent>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    /// Events at positions `cursor..`
    pub fn since(&self, cursor: usize) -> Vec<RegistryEvent> {
        self.page(cursor).0
    }

    /// Events at positions `cursor..` together with the log length, read under
    /// one lock. The length is the cursor for the next poll.
    pub fn page(&self, cursor: usize) -> (Vec<RegistryEvent>, usize) {
        let events = self.events.read();
        let page = events
            .get(cursor..)
            .map(<[RegistryEvent]>::to_vec)
            .unwrap_or_default();
        (page, events.len())
    }
}

impl EventSink for EventLog {
    fn emit(&self, event: RegistryEvent) {
        tracing::debug!(?event, "event appended");
        self.events.write().push(event);
    }
}

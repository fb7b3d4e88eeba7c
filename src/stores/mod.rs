// Live stores: explicitly constructed, shared by handle, written only by the dispatcher

mod agent;
mod trace;
mod traffic;

pub use agent::AgentStatusStore;
pub use trace::{TraceKey, TraceStore};
pub use traffic::{DEFAULT_HISTORY_CAPACITY, TrafficStore};

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::sync::Arc;

use crate::config::StoreConfig;

/// The store set for one client session. Cloning shares the same stores.
///
/// Each mutation runs under a single write lock, so a reader holding the read guard
/// sees either the state before a round or after it, never in between.
#[derive(Debug, Clone)]
pub struct LiveStores {
    traces: Arc<RwLock<TraceStore>>,
    traffic: Arc<RwLock<TrafficStore>>,
    agents: Arc<RwLock<AgentStatusStore>>,
}

impl Default for LiveStores {
    fn default() -> Self {
        Self::new(&StoreConfig::default())
    }
}

impl LiveStores {
    pub fn new(config: &StoreConfig) -> Self {
        Self {
            traces: Arc::new(RwLock::new(TraceStore::new(config.ring_capacity))),
            traffic: Arc::new(RwLock::new(TrafficStore::new(
                config.traffic_history_capacity,
            ))),
            agents: Arc::new(RwLock::new(AgentStatusStore::new())),
        }
    }

    pub fn traces(&self) -> RwLockReadGuard<'_, TraceStore> {
        self.traces.read()
    }

    pub fn traffic(&self) -> RwLockReadGuard<'_, TrafficStore> {
        self.traffic.read()
    }

    pub fn agents(&self) -> RwLockReadGuard<'_, AgentStatusStore> {
        self.agents.read()
    }

    pub(crate) fn traces_mut(&self) -> RwLockWriteGuard<'_, TraceStore> {
        self.traces.write()
    }

    pub(crate) fn traffic_mut(&self) -> RwLockWriteGuard<'_, TrafficStore> {
        self.traffic.write()
    }

    pub(crate) fn agents_mut(&self) -> RwLockWriteGuard<'_, AgentStatusStore> {
        self.agents.write()
    }

    /// Explicit teardown of a trace when its view goes away for good.
    pub fn clear_trace(&self, agent_id: &str, target_id: &str) {
        self.traces_mut().clear_trace(agent_id, target_id);
    }

    pub fn clear_traffic(&self, agent_id: &str) {
        self.traffic_mut().clear_traffic(agent_id);
    }
}

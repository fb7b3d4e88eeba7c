// Per-agent process traffic: latest snapshot plus a short history per process name

use std::collections::{BTreeMap, HashMap, VecDeque};

use crate::models::{
    LiveProcessTrafficUpdate, ProcessTrafficSummary, TrafficHistoryEntry, epoch_secs,
};

/// Five minutes at the agent's 5 s capture interval.
pub const DEFAULT_HISTORY_CAPACITY: usize = 60;

#[derive(Debug, Default)]
struct AgentTraffic {
    latest: Option<LiveProcessTrafficUpdate>,
    /// Keyed by process name; pids change across restarts.
    process_history: HashMap<String, VecDeque<TrafficHistoryEntry>>,
}

#[derive(Debug)]
pub struct TrafficStore {
    agents: HashMap<String, AgentTraffic>,
    history_capacity: usize,
}

impl Default for TrafficStore {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl TrafficStore {
    pub fn new(history_capacity: usize) -> Self {
        Self {
            agents: HashMap::new(),
            history_capacity: history_capacity.max(1),
        }
    }

    /// Replaces the agent's latest snapshot and appends one history entry per process name.
    /// Same-name processes in one update are summed into a single entry. Histories of
    /// processes absent from the update are left as they are.
    pub fn push_traffic(&mut self, update: LiveProcessTrafficUpdate) {
        let timestamp = epoch_secs(&update.captured_at);
        let capacity = self.history_capacity;

        let mut per_name: BTreeMap<&str, (f64, f64)> = BTreeMap::new();
        for proc in &update.processes {
            let rates = per_name.entry(proc.process_name.as_str()).or_default();
            rates.0 += proc.bytes_in_per_sec;
            rates.1 += proc.bytes_out_per_sec;
        }

        let agent = self.agents.entry(update.agent_id.clone()).or_default();
        for (name, (bytes_in, bytes_out)) in per_name {
            let history = agent
                .process_history
                .entry(name.to_string())
                .or_insert_with(|| VecDeque::with_capacity(capacity));
            history.push_back(TrafficHistoryEntry {
                timestamp,
                bytes_in_per_sec: bytes_in,
                bytes_out_per_sec: bytes_out,
            });
            while history.len() > capacity {
                history.pop_front();
            }
        }
        agent.latest = Some(update);
    }

    pub fn latest(&self, agent_id: &str) -> Option<LiveProcessTrafficUpdate> {
        self.agents.get(agent_id)?.latest.clone()
    }

    pub fn processes(&self, agent_id: &str) -> Vec<ProcessTrafficSummary> {
        self.agents
            .get(agent_id)
            .and_then(|a| a.latest.as_ref())
            .map(|l| l.processes.clone())
            .unwrap_or_default()
    }

    /// Oldest to newest; empty when the agent or process is unknown.
    pub fn process_history(&self, agent_id: &str, process_name: &str) -> Vec<TrafficHistoryEntry> {
        self.agents
            .get(agent_id)
            .and_then(|a| a.process_history.get(process_name))
            .map(|h| h.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn clear_traffic(&mut self, agent_id: &str) {
        self.agents.remove(agent_id);
    }

    pub fn agent_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.agents.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

// Per-path rolling time series, one ring set per (agent, target) pair.
//
// Rings hold microseconds for RTT/jitter and percent for loss; conversion to
// milliseconds happens only in the read projections.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{
    HopSnapshot, LiveHopData, Metric, TimeSeries, TraceSnapshot, epoch_secs,
};
use crate::ring::{DEFAULT_RING_CAPACITY, LOST, SampleRing};

/// Identifies one monitored path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceKey {
    pub agent_id: String,
    pub target_id: String,
}

#[derive(Debug, Clone)]
struct HopSeries {
    rtt: SampleRing,
    loss: SampleRing,
    jitter: SampleRing,
}

impl HopSeries {
    /// New series padded with `rounds` lost samples so it lines up with the timestamp ring.
    fn aligned(capacity: usize, rounds: usize) -> Self {
        Self {
            rtt: SampleRing::with_lost_prefix(capacity, rounds),
            loss: SampleRing::with_lost_prefix(capacity, rounds),
            jitter: SampleRing::with_lost_prefix(capacity, rounds),
        }
    }

    fn push(&mut self, hop: &LiveHopData) {
        self.rtt.push(hop.round_rtt_us().map_or(LOST, f64::from));
        self.loss.push(hop.stats.loss_pct);
        self.jitter.push(f64::from(hop.stats.jitter_avg_us));
    }

    fn push_missing(&mut self) {
        self.rtt.push(LOST);
        self.loss.push(LOST);
        self.jitter.push(LOST);
    }

    fn ring(&self, metric: Metric) -> &SampleRing {
        match metric {
            Metric::Rtt => &self.rtt,
            Metric::Loss => &self.loss,
            Metric::Jitter => &self.jitter,
        }
    }
}

#[derive(Debug, Clone)]
struct Trace {
    hops: BTreeMap<u8, LiveHopData>,
    timestamps: SampleRing,
    series: BTreeMap<u8, HopSeries>,
    round_count: u64,
}

impl Trace {
    fn new(capacity: usize) -> Self {
        Self {
            hops: BTreeMap::new(),
            timestamps: SampleRing::new(capacity),
            series: BTreeMap::new(),
            round_count: 0,
        }
    }

    fn push_round(&mut self, timestamp: f64, hops: &[LiveHopData]) {
        let capacity = self.timestamps.capacity();
        let rounds_before = self.timestamps.len();
        self.timestamps.push(timestamp);

        // Last entry wins if a hop number repeats within one round.
        let present: BTreeMap<u8, &LiveHopData> =
            hops.iter().map(|h| (h.hop_number, h)).collect();

        for (&hop_number, hop) in &present {
            self.hops.insert(hop_number, (*hop).clone());
            self.series
                .entry(hop_number)
                .or_insert_with(|| HopSeries::aligned(capacity, rounds_before))
                .push(hop);
        }
        for (hop_number, series) in self.series.iter_mut() {
            if !present.contains_key(hop_number) {
                series.push_missing();
            }
        }

        self.round_count += 1;
    }

    fn hop_snapshots(&self) -> Vec<HopSnapshot> {
        self.hops.values().map(HopSnapshot::from).collect()
    }

    fn time_series(&self, metric: Metric) -> TimeSeries {
        let mut series = Vec::with_capacity(self.series.len() + 1);
        series.push(self.timestamps.to_chronological());
        for hop in self.series.values() {
            series.push(hop.ring(metric).map_chronological(|v| metric.to_display(v)));
        }
        TimeSeries {
            hop_numbers: self.series.keys().copied().collect(),
            series,
        }
    }
}

/// Owns every live trace. Mutations are `&mut self`; reads return owned copies.
#[derive(Debug)]
pub struct TraceStore {
    traces: HashMap<String, HashMap<String, Trace>>,
    ring_capacity: usize,
}

impl Default for TraceStore {
    fn default() -> Self {
        Self::new(DEFAULT_RING_CAPACITY)
    }
}

impl TraceStore {
    pub fn new(ring_capacity: usize) -> Self {
        Self {
            traces: HashMap::new(),
            ring_capacity: ring_capacity.max(1),
        }
    }

    pub fn ring_capacity(&self) -> usize {
        self.ring_capacity
    }

    fn get(&self, agent_id: &str, target_id: &str) -> Option<&Trace> {
        self.traces.get(agent_id)?.get(target_id)
    }

    /// Trace that has ingested at least one round.
    fn get_live(&self, agent_id: &str, target_id: &str) -> Option<&Trace> {
        self.get(agent_id, target_id).filter(|t| t.round_count > 0)
    }

    fn entry(&mut self, agent_id: &str, target_id: &str) -> &mut Trace {
        let capacity = self.ring_capacity;
        self.traces
            .entry(agent_id.to_string())
            .or_default()
            .entry(target_id.to_string())
            .or_insert_with(|| Trace::new(capacity))
    }

    /// Creates the pair if absent; never resets an existing one.
    pub fn init_trace(&mut self, agent_id: &str, target_id: &str) {
        self.entry(agent_id, target_id);
    }

    /// Ingests one round. Every existing hop series receives exactly one sample; hops missing
    /// from this round get the lost sentinel, first-seen hops are back-filled so all series
    /// stay index-aligned with the timestamp ring.
    pub fn push_round(
        &mut self,
        agent_id: &str,
        target_id: &str,
        sent_at: DateTime<Utc>,
        hops: &[LiveHopData],
    ) {
        self.entry(agent_id, target_id)
            .push_round(epoch_secs(&sent_at), hops);
    }

    /// Overwrites a single hop's current snapshot without touching the series or round count.
    pub fn update_hop(&mut self, agent_id: &str, target_id: &str, hop: &LiveHopData) {
        self.entry(agent_id, target_id)
            .hops
            .insert(hop.hop_number, hop.clone());
    }

    pub fn clear_trace(&mut self, agent_id: &str, target_id: &str) {
        if let Some(targets) = self.traces.get_mut(agent_id) {
            targets.remove(target_id);
            if targets.is_empty() {
                self.traces.remove(agent_id);
            }
        }
    }

    pub fn contains(&self, agent_id: &str, target_id: &str) -> bool {
        self.get(agent_id, target_id).is_some()
    }

    /// Number of pairs held, including ones with no rounds yet.
    pub fn len(&self) -> usize {
        self.traces.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.traces.is_empty()
    }

    pub fn trace_keys(&self) -> Vec<TraceKey> {
        let mut keys: Vec<TraceKey> = self
            .traces
            .iter()
            .flat_map(|(agent_id, targets)| {
                targets.keys().map(move |target_id| TraceKey {
                    agent_id: agent_id.clone(),
                    target_id: target_id.clone(),
                })
            })
            .collect();
        keys.sort();
        keys
    }

    /// Change-detector value for consumers: bumps exactly once per ingested round.
    pub fn round_count(&self, agent_id: &str, target_id: &str) -> Option<u64> {
        self.get_live(agent_id, target_id).map(|t| t.round_count)
    }

    /// Current hop table, ascending by hop number.
    pub fn hops(&self, agent_id: &str, target_id: &str) -> Option<Vec<HopSnapshot>> {
        self.get_live(agent_id, target_id).map(Trace::hop_snapshots)
    }

    pub fn time_series(
        &self,
        agent_id: &str,
        target_id: &str,
        metric: Metric,
    ) -> Option<TimeSeries> {
        self.get_live(agent_id, target_id)
            .map(|t| t.time_series(metric))
    }

    pub fn rtt_series(&self, agent_id: &str, target_id: &str) -> Option<TimeSeries> {
        self.time_series(agent_id, target_id, Metric::Rtt)
    }

    pub fn loss_series(&self, agent_id: &str, target_id: &str) -> Option<TimeSeries> {
        self.time_series(agent_id, target_id, Metric::Loss)
    }

    pub fn jitter_series(&self, agent_id: &str, target_id: &str) -> Option<TimeSeries> {
        self.time_series(agent_id, target_id, Metric::Jitter)
    }

    /// Hops, all three series and the round count taken from the same state.
    pub fn snapshot(&self, agent_id: &str, target_id: &str) -> Option<TraceSnapshot> {
        let trace = self.get_live(agent_id, target_id)?;
        Some(TraceSnapshot {
            agent_id: agent_id.to_string(),
            target_id: target_id.to_string(),
            round_count: trace.round_count,
            hops: trace.hop_snapshots(),
            rtt: trace.time_series(Metric::Rtt),
            loss: trace.time_series(Metric::Loss),
            jitter: trace.time_series(Metric::Jitter),
        })
    }
}

// Live trace payloads (wire, microseconds) and per-hop read projections (milliseconds)

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::quality::{QualityBand, mos_score};

/// One probe round across every hop of a path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveTraceUpdate {
    pub agent_id: String,
    pub target_id: String,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub round_number: Option<u64>,
    pub sent_at: DateTime<Utc>,
    pub hops: Vec<LiveHopData>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveHopData {
    pub hop_number: u8,
    pub ip_address: Option<String>,
    pub hostname: Option<String>,
    pub rtt_us: Option<u32>,
    #[serde(default)]
    pub is_lost: bool,
    #[serde(default)]
    pub jitter_us: Option<u32>,
    pub stats: HopRunningStats,
}

impl LiveHopData {
    /// RTT of this round in microseconds, or `None` when the probe was lost.
    pub fn round_rtt_us(&self) -> Option<u32> {
        if self.is_lost { None } else { self.rtt_us }
    }
}

/// Running statistics computed upstream. Latencies in integer microseconds, loss in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HopRunningStats {
    pub min_rtt_us: u32,
    pub avg_rtt_us: u32,
    pub max_rtt_us: u32,
    pub loss_pct: f64,
    pub jitter_avg_us: u32,
    pub sample_count: u64,
}

impl HopRunningStats {
    /// sample_count - round(loss% * sample_count / 100), never negative.
    pub fn received(&self) -> u64 {
        let count = self.sample_count as f64;
        let lost = (self.loss_pct * count / 100.0).round();
        (count - lost).max(0.0) as u64
    }
}

pub(crate) fn us_to_ms(us: f64) -> f64 {
    us / 1000.0
}

/// Current state of one hop as shown in the hop table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HopSnapshot {
    pub hop_number: u8,
    pub ip: Option<String>,
    pub hostname: Option<String>,
    pub loss_pct: f64,
    pub sent: u64,
    pub received: u64,
    pub best_ms: f64,
    pub avg_ms: f64,
    pub worst_ms: f64,
    /// `None` when the latest probe was lost.
    pub last_ms: Option<f64>,
    pub jitter_ms: f64,
    pub quality: f64,
    pub quality_band: QualityBand,
}

impl From<&LiveHopData> for HopSnapshot {
    fn from(hop: &LiveHopData) -> Self {
        let stats = &hop.stats;
        let avg_ms = us_to_ms(stats.avg_rtt_us as f64);
        let jitter_ms = us_to_ms(stats.jitter_avg_us as f64);
        let quality = mos_score(avg_ms, jitter_ms, stats.loss_pct);
        HopSnapshot {
            hop_number: hop.hop_number,
            ip: hop.ip_address.clone(),
            hostname: hop.hostname.clone(),
            loss_pct: stats.loss_pct,
            sent: stats.sample_count,
            received: stats.received(),
            best_ms: us_to_ms(stats.min_rtt_us as f64),
            avg_ms,
            worst_ms: us_to_ms(stats.max_rtt_us as f64),
            last_ms: hop.round_rtt_us().map(|us| us_to_ms(us as f64)),
            jitter_ms,
            quality,
            quality_band: QualityBand::from_score(quality),
        }
    }
}

/// Metric family of a time-series projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Rtt,
    Loss,
    Jitter,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Rtt, Metric::Loss, Metric::Jitter];

    /// Converts a stored sample to its display unit (ms for latencies, percent for loss).
    pub fn to_display(self, stored: f64) -> f64 {
        match self {
            Metric::Rtt | Metric::Jitter => us_to_ms(stored),
            Metric::Loss => stored,
        }
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rtt" | "latency" => Ok(Metric::Rtt),
            "loss" => Ok(Metric::Loss),
            "jitter" => Ok(Metric::Jitter),
            other => Err(format!("unknown metric: {}", other)),
        }
    }
}

/// Column-oriented series: `series[0]` is timestamps (epoch seconds), `series[i + 1]` belongs to
/// `hop_numbers[i]`. All columns have equal length and index `k` is the same round everywhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeries {
    pub hop_numbers: Vec<u8>,
    pub series: Vec<Vec<f64>>,
}

impl TimeSeries {
    pub fn timestamps(&self) -> &[f64] {
        self.series.first().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn hop(&self, hop_number: u8) -> Option<&[f64]> {
        let idx = self.hop_numbers.iter().position(|&h| h == hop_number)?;
        self.series.get(idx + 1).map(Vec::as_slice)
    }
}

/// Consistent copy of one trace, versioned by its round count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceSnapshot {
    pub agent_id: String,
    pub target_id: String,
    pub round_count: u64,
    pub hops: Vec<HopSnapshot>,
    pub rtt: TimeSeries,
    pub loss: TimeSeries,
    pub jitter: TimeSeries,
}

// Shared test helpers

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use pathwatch::models::*;

pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

pub fn stats(avg_rtt_us: u32, loss_pct: f64, sample_count: u64) -> HopRunningStats {
    HopRunningStats {
        min_rtt_us: avg_rtt_us / 2,
        avg_rtt_us,
        max_rtt_us: avg_rtt_us * 2,
        loss_pct,
        jitter_avg_us: 500,
        sample_count,
    }
}

pub fn hop(hop_number: u8, rtt_us: Option<u32>) -> LiveHopData {
    LiveHopData {
        hop_number,
        ip_address: Some(format!("10.0.0.{}", hop_number)),
        hostname: None,
        rtt_us,
        is_lost: rtt_us.is_none(),
        jitter_us: Some(500),
        stats: stats(rtt_us.unwrap_or(10_000), 0.0, 10),
    }
}

pub fn process(pid: u32, name: &str, bytes_in: f64, bytes_out: f64) -> ProcessTrafficSummary {
    ProcessTrafficSummary {
        pid,
        process_name: name.to_string(),
        exe_path: None,
        bytes_in_per_sec: bytes_in,
        bytes_out_per_sec: bytes_out,
        active_connections: 1,
        top_remote_endpoints: vec![],
    }
}

pub fn traffic(agent_id: &str, secs: i64, processes: Vec<ProcessTrafficSummary>) -> LiveProcessTrafficUpdate {
    LiveProcessTrafficUpdate {
        agent_id: agent_id.to_string(),
        captured_at: at(secs),
        processes,
    }
}

/// `live_trace` frame as the server sends it.
pub fn live_trace_frame(agent_id: &str, target_id: &str, secs: i64, hops: &[LiveHopData]) -> String {
    serde_json::json!({
        "type": "live_trace",
        "data": {
            "agent_id": agent_id,
            "target_id": target_id,
            "session_id": "s-1",
            "round_number": 1,
            "sent_at": at(secs),
            "hops": hops,
        }
    })
    .to_string()
}

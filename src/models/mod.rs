// Domain models: wire payloads from the stream and read-side projections

mod events;
mod trace;
mod traffic;

pub use events::{
    AgentStatusChange, AlertFiredNotification, RouteChangeNotification, UpdateProgressReport,
    UpdateStatus,
};
pub use trace::{
    HopRunningStats, HopSnapshot, LiveHopData, LiveTraceUpdate, Metric, TimeSeries, TraceSnapshot,
};
pub use traffic::{
    ConnectionProtocol, LiveProcessTrafficUpdate, ProcessTrafficSummary, RemoteEndpoint,
    TrafficHistoryEntry,
};

/// Epoch seconds with millisecond precision, the timestamp unit of every rolling series.
pub(crate) fn epoch_secs(at: &chrono::DateTime<chrono::Utc>) -> f64 {
    at.timestamp_millis() as f64 / 1000.0
}

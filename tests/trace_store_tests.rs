// Trace store: round ingestion, alignment, projections

mod common;

use common::{at, hop, stats};
use pathwatch::models::{LiveHopData, Metric};
use pathwatch::quality::mos_score;
use pathwatch::stores::{TraceKey, TraceStore};

#[test]
fn reads_are_none_before_any_round() {
    let mut store = TraceStore::default();
    assert!(store.hops("a1", "t1").is_none());
    assert!(store.round_count("a1", "t1").is_none());

    store.init_trace("a1", "t1");
    assert!(store.contains("a1", "t1"));
    assert!(store.hops("a1", "t1").is_none());
    assert!(store.round_count("a1", "t1").is_none());
    assert!(store.time_series("a1", "t1", Metric::Rtt).is_none());
    assert!(store.snapshot("a1", "t1").is_none());
}

#[test]
fn push_round_creates_trace_lazily() {
    let mut store = TraceStore::default();
    store.push_round("a1", "t1", at(100), &[hop(1, Some(1_500))]);
    assert_eq!(store.round_count("a1", "t1"), Some(1));
    assert_eq!(store.len(), 1);
}

#[test]
fn init_trace_twice_keeps_existing_data() {
    let mut store = TraceStore::default();
    store.init_trace("a1", "t1");
    store.push_round("a1", "t1", at(100), &[hop(1, Some(1_500))]);
    store.push_round("a1", "t1", at(101), &[hop(1, Some(1_600))]);
    store.init_trace("a1", "t1");
    assert_eq!(store.round_count("a1", "t1"), Some(2));
    assert_eq!(store.hops("a1", "t1").unwrap().len(), 1);
}

#[test]
fn round_count_bumps_once_per_round_regardless_of_hop_count() {
    let mut store = TraceStore::default();
    let hops: Vec<LiveHopData> = (1..=12).map(|n| hop(n, Some(1_000 * n as u32))).collect();
    store.push_round("a1", "t1", at(1), &hops);
    store.push_round("a1", "t1", at(2), &[]);
    assert_eq!(store.round_count("a1", "t1"), Some(2));
}

#[test]
fn constant_hop_set_keeps_every_ring_aligned_and_bounded() {
    let capacity = 5;
    let mut store = TraceStore::new(capacity);
    for k in 1..=8i64 {
        store.push_round(
            "a1",
            "t1",
            at(k),
            &[hop(1, Some(1_000)), hop(2, Some(2_000)), hop(3, None)],
        );
        for metric in Metric::ALL {
            let ts = store.time_series("a1", "t1", metric).unwrap();
            assert_eq!(ts.hop_numbers, vec![1, 2, 3]);
            assert_eq!(ts.series.len(), 4);
            let expected = (k as usize).min(capacity);
            assert!(ts.series.iter().all(|col| col.len() == expected));
        }
    }
    let rtt = store.rtt_series("a1", "t1").unwrap();
    assert_eq!(rtt.timestamps(), &[4.0, 5.0, 6.0, 7.0, 8.0]);
}

#[test]
fn rtt_and_jitter_are_projected_in_milliseconds() {
    let mut store = TraceStore::default();
    let mut h = hop(1, Some(12_345));
    h.stats.jitter_avg_us = 2_500;
    h.stats.loss_pct = 12.5;
    store.push_round("a1", "t1", at(10), &[h]);

    assert_eq!(store.rtt_series("a1", "t1").unwrap().hop(1), Some(&[12.345][..]));
    assert_eq!(store.jitter_series("a1", "t1").unwrap().hop(1), Some(&[2.5][..]));
    assert_eq!(store.loss_series("a1", "t1").unwrap().hop(1), Some(&[12.5][..]));
}

#[test]
fn lost_probe_is_nan_never_zero() {
    let mut store = TraceStore::default();
    store.push_round("a1", "t1", at(1), &[hop(1, None)]);
    let mut lost_flagged = hop(2, Some(900));
    lost_flagged.is_lost = true;
    store.push_round("a1", "t1", at(2), &[hop(1, Some(800)), lost_flagged]);

    let rtt = store.rtt_series("a1", "t1").unwrap();
    let hop1 = rtt.hop(1).unwrap();
    assert!(hop1[0].is_nan());
    assert_eq!(hop1[1], 0.8);
    assert!(rtt.hop(2).unwrap()[1].is_nan());

    let hops = store.hops("a1", "t1").unwrap();
    assert_eq!(hops[1].last_ms, None);
}

#[test]
fn new_hop_mid_stream_is_backfilled_to_stay_aligned() {
    let mut store = TraceStore::default();
    store.push_round("a1", "t1", at(1), &[hop(1, Some(1_000))]);
    store.push_round("a1", "t1", at(2), &[hop(1, Some(1_000))]);
    store.push_round("a1", "t1", at(3), &[hop(1, Some(1_000)), hop(2, Some(4_000))]);

    let rtt = store.rtt_series("a1", "t1").unwrap();
    assert_eq!(rtt.hop_numbers, vec![1, 2]);
    let hop2 = rtt.hop(2).unwrap();
    assert_eq!(hop2.len(), 3);
    assert!(hop2[0].is_nan() && hop2[1].is_nan());
    assert_eq!(hop2[2], 4.0);
}

#[test]
fn hop_missing_from_a_round_gets_lost_sentinel_and_keeps_snapshot() {
    let mut store = TraceStore::default();
    store.push_round("a1", "t1", at(1), &[hop(1, Some(1_000)), hop(2, Some(2_000))]);
    store.push_round("a1", "t1", at(2), &[hop(1, Some(1_000))]);

    for metric in Metric::ALL {
        let ts = store.time_series("a1", "t1", metric).unwrap();
        let hop2 = ts.hop(2).unwrap();
        assert_eq!(hop2.len(), 2);
        assert!(hop2[1].is_nan(), "{metric:?}");
    }
    // route change keeps the last known hop row
    assert_eq!(store.hops("a1", "t1").unwrap().len(), 2);
}

#[test]
fn hops_are_sorted_and_derived_from_running_stats() {
    let mut store = TraceStore::default();
    let mut h3 = hop(3, Some(20_000));
    h3.stats = stats(20_000, 10.0, 25);
    h3.stats.jitter_avg_us = 2_000;
    store.push_round("a1", "t1", at(1), &[h3, hop(1, Some(1_000)), hop(2, Some(2_000))]);

    let hops = store.hops("a1", "t1").unwrap();
    let numbers: Vec<u8> = hops.iter().map(|h| h.hop_number).collect();
    assert_eq!(numbers, vec![1, 2, 3]);

    let h = &hops[2];
    assert_eq!(h.sent, 25);
    // 25 - round(2.5) = 22
    assert_eq!(h.received, 22);
    assert_eq!(h.best_ms, 10.0);
    assert_eq!(h.avg_ms, 20.0);
    assert_eq!(h.worst_ms, 40.0);
    assert_eq!(h.last_ms, Some(20.0));
    assert_eq!(h.jitter_ms, 2.0);
    assert_eq!(h.quality, mos_score(20.0, 2.0, 10.0));
}

#[test]
fn received_count_never_negative() {
    let mut store = TraceStore::default();
    let mut h = hop(1, None);
    h.stats = stats(0, 150.0, 4);
    store.push_round("a1", "t1", at(1), &[h]);
    assert_eq!(store.hops("a1", "t1").unwrap()[0].received, 0);
}

#[test]
fn update_hop_touches_snapshot_only() {
    let mut store = TraceStore::default();
    store.push_round("a1", "t1", at(1), &[hop(1, Some(1_000))]);
    store.update_hop("a1", "t1", &hop(1, Some(9_000)));

    assert_eq!(store.round_count("a1", "t1"), Some(1));
    assert_eq!(store.hops("a1", "t1").unwrap()[0].last_ms, Some(9.0));
    assert_eq!(store.rtt_series("a1", "t1").unwrap().hop(1), Some(&[1.0][..]));
}

#[test]
fn clear_trace_removes_only_that_pair() {
    let mut store = TraceStore::default();
    store.push_round("a1", "t1", at(1), &[hop(1, Some(1_000))]);
    store.push_round("a1", "t2", at(1), &[hop(1, Some(1_000))]);
    store.clear_trace("a1", "t1");

    assert!(!store.contains("a1", "t1"));
    assert!(store.round_count("a1", "t1").is_none());
    assert_eq!(store.round_count("a1", "t2"), Some(1));
    assert_eq!(
        store.trace_keys(),
        vec![TraceKey {
            agent_id: "a1".into(),
            target_id: "t2".into()
        }]
    );
    store.clear_trace("a1", "t2");
    assert!(store.is_empty());
}

#[test]
fn pairs_are_isolated() {
    let mut store = TraceStore::default();
    store.push_round("a1", "t1", at(1), &[hop(1, Some(1_000))]);
    store.push_round("a2", "t1", at(1), &[hop(1, Some(5_000))]);
    store.push_round("a2", "t1", at(2), &[hop(1, Some(5_000))]);
    assert_eq!(store.round_count("a1", "t1"), Some(1));
    assert_eq!(store.round_count("a2", "t1"), Some(2));
}

#[test]
fn snapshot_is_consistent_with_individual_reads() {
    let mut store = TraceStore::new(10);
    for k in 0..4 {
        store.push_round("a1", "t1", at(k), &[hop(1, Some(1_000)), hop(2, Some(3_000))]);
    }
    let snap = store.snapshot("a1", "t1").unwrap();
    assert_eq!(snap.round_count, 4);
    assert_eq!(snap.hops, store.hops("a1", "t1").unwrap());
    assert_eq!(snap.rtt, store.rtt_series("a1", "t1").unwrap());
    assert_eq!(snap.loss, store.loss_series("a1", "t1").unwrap());
    assert_eq!(snap.jitter, store.jitter_series("a1", "t1").unwrap());
    assert_eq!(snap.rtt.timestamps().len(), 4);
}

#[test]
fn repeated_hop_number_in_one_round_pushes_once() {
    let mut store = TraceStore::default();
    store.push_round("a1", "t1", at(1), &[hop(1, Some(1_000)), hop(1, Some(7_000))]);
    let rtt = store.rtt_series("a1", "t1").unwrap();
    assert_eq!(rtt.hop(1), Some(&[7.0][..]));
}

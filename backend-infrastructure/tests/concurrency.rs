mod common;

use std::sync::Arc;

use serde_json::json;

use backend_application::commands::{entitlement_commands, redemption_commands, stats_commands};
use backend_application::dtos::{RedeemRequest, SeedEntitlementRequest};
use backend_application::queries::{log_queries, stats_queries};
use backend_application::AppError;
use backend_infrastructure::MemoryRedemptionLog;

use common::{harness_with, runtime_config, Harness};

fn contended_harness() -> Harness {
    let mut config = runtime_config();
    config.transaction_max_attempts = 200;
    config.transaction_backoff_ms = 0;
    harness_with(config, Arc::new(MemoryRedemptionLog::new()))
}

async fn seed(h: &Harness, pid: &str, quantity: u32) {
    entitlement_commands::seed_if_missing(
        &h.state,
        pid,
        "RB1",
        SeedEntitlementRequest {
            quantity: Some(quantity),
        },
    )
    .await
    .expect("seed");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn two_doors_never_over_admit() {
    let h = contended_harness();
    seed(&h, "355", 5).await;

    let mut handles = Vec::new();
    for requested in [3, 4] {
        let state = h.state.clone();
        handles.push(tokio::spawn(async move {
            redemption_commands::redeem_adults(
                &state,
                "355",
                "RB1",
                RedeemRequest {
                    count: json!(requested),
                },
            )
            .await
        }));
    }

    let mut applied = 0;
    for handle in handles {
        let response = handle.await.expect("join").expect("redeem");
        applied += response.applied_count;
    }
    assert_eq!(applied, 5);

    let stats = stats_queries::get_event_stats(&h.state, "RB1", true)
        .await
        .expect("stats");
    assert_eq!(stats.total_consumed_adults, 5);

    let log = log_queries::list_redemption_log(&h.state, "RB1", true)
        .await
        .expect("log");
    assert_eq!(log.iter().map(|entry| entry.count).sum::<u32>(), 5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn many_single_entries_stop_at_quantity() {
    let h = contended_harness();
    seed(&h, "355", 10).await;

    let mut handles = Vec::new();
    for _ in 0..25 {
        let state = h.state.clone();
        handles.push(tokio::spawn(async move {
            redemption_commands::redeem_adults(&state, "355", "RB1", RedeemRequest { count: json!(1) }).await
        }));
    }

    let mut applied = 0;
    let mut full = 0;
    for handle in handles {
        let response = handle.await.expect("join").expect("redeem");
        applied += response.applied_count;
        if response.applied_count == 0 {
            full += 1;
        }
    }
    assert_eq!(applied, 10);
    assert_eq!(full, 15);

    let stats = stats_queries::get_event_stats(&h.state, "RB1", true)
        .await
        .expect("stats");
    assert_eq!(stats.total_consumed_adults, 10);
    assert_eq!(stats.total_eligible_adults, 10);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_seeds_count_the_participant_once() {
    let h = contended_harness();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let state = h.state.clone();
        handles.push(tokio::spawn(async move {
            entitlement_commands::seed_if_missing(
                &state,
                "355",
                "RB1",
                SeedEntitlementRequest { quantity: Some(2) },
            )
            .await
        }));
    }

    let mut created = 0;
    for handle in handles {
        if handle.await.expect("join").expect("seed").created {
            created += 1;
        }
    }
    assert_eq!(created, 1);

    let stats = stats_queries::get_event_stats(&h.state, "RB1", true)
        .await
        .expect("stats");
    assert_eq!(stats.participants, 1);
    assert_eq!(stats.total_eligible_adults, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn exhausted_retries_surface_a_retryable_conflict() {
    let mut config = runtime_config();
    config.transaction_max_attempts = 1;
    config.transaction_backoff_ms = 0;
    let h = harness_with(config, Arc::new(MemoryRedemptionLog::new()));
    seed(&h, "355", 1000).await;

    let mut handles = Vec::new();
    for _ in 0..64 {
        let state = h.state.clone();
        handles.push(tokio::spawn(async move {
            redemption_commands::redeem_adults(&state, "355", "RB1", RedeemRequest { count: json!(1) }).await
        }));
    }

    let mut applied = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.expect("join") {
            Ok(response) => applied += response.applied_count,
            Err(err @ AppError::TransactionConflict { .. }) => {
                assert!(err.is_retryable());
                conflicts += 1;
            }
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(applied + conflicts, 64);

    let stats = stats_queries::get_event_stats(&h.state, "RB1", true)
        .await
        .expect("stats");
    assert_eq!(stats.total_consumed_adults, i64::from(applied));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn rebuilds_under_live_traffic_keep_stats_exact() {
    let h = contended_harness();
    for pid in ["1", "2", "3", "4"] {
        seed(&h, pid, 6).await;
    }

    let mut redeems = Vec::new();
    for round in 0..24 {
        let state = h.state.clone();
        let pid = ["1", "2", "3", "4"][round % 4];
        redeems.push(tokio::spawn(async move {
            redemption_commands::redeem_adults(&state, pid, "RB1", RedeemRequest { count: json!(1) }).await
        }));
    }
    let mut rebuilds = Vec::new();
    for _ in 0..8 {
        let state = h.state.clone();
        rebuilds.push(tokio::spawn(async move {
            stats_commands::rebuild_event_stats(&state, "RB1").await
        }));
    }

    let mut applied = 0;
    for handle in redeems {
        applied += handle.await.expect("join").expect("redeem").applied_count;
    }
    for handle in rebuilds {
        handle.await.expect("join").expect("rebuild");
    }
    assert_eq!(applied, 24);

    let stats = stats_queries::get_event_stats(&h.state, "RB1", true)
        .await
        .expect("stats");
    assert_eq!(stats.total_consumed_adults, 24);
    assert_eq!(stats.total_eligible_adults, 24);
    assert_eq!(stats.participants, 4);
}

//! Request-lifecycle discipline tests: a cancelled scope leaves view
//! state untouched, and a batch-name switch discards whatever the
//! stale scope's requests eventually produce.

mod support;

use evodash::api::cancel::CancelScope;
use evodash::api::DashClient;
use evodash::view::batch::{
    spawn_table_fetches, TablesState, TABLE_SUMMARY_BY_EXP, TABLE_SUMMARY_TOTAL,
};
use std::sync::Arc;
use std::time::Duration;
use support::{rule, Reply, TestServer};
use tokio::sync::mpsc;

fn totals(n_instances: u64) -> String {
    format!(r#"[{{"n_instances":{n_instances},"bks_hit_total":0,"avg_dev_to_bks":0.0}}]"#)
}

fn table_rule(batch: &str, table: &str, reply: Reply) -> support::Rule {
    rule(&format!("batchName={batch}&tableName={table}"), reply)
}

#[tokio::test]
async fn cancelled_scope_applies_zero_state_transitions() {
    let server = TestServer::start(vec![rule(
        "/table",
        Reply::json(200, "[]").delayed(Duration::from_millis(300)),
    )])
    .await;
    let client = Arc::new(DashClient::new(&server.config()).unwrap());

    let scope = CancelScope::new();
    let (tx, mut rx) = mpsc::unbounded_channel();
    spawn_table_fetches(&client, "batch-01", &scope.token(), &tx);
    drop(tx);

    tokio::time::sleep(Duration::from_millis(50)).await;
    scope.cancel();

    // Every fetch task must exit without delivering an event; folding
    // whatever arrives until the channel closes must leave every slot
    // untouched.
    let mut state = TablesState::default();
    tokio::time::timeout(Duration::from_secs(2), async {
        while let Some(event) = rx.recv().await {
            state.apply(event);
        }
    })
    .await
    .expect("fetch tasks must wind down promptly after cancel");

    assert!(state.summary_total.is_pending());
    assert!(state.summary_by_exp.is_pending());
    assert!(state.convergence_info.is_pending());
    assert!(state.run_summary_stats.is_pending());
}

#[tokio::test]
async fn batch_switch_discards_the_stale_scope_results() {
    // The "old" batch answers slowly, the "new" one immediately,
    // simulating navigation away from a page whose data is in flight.
    let slow = Duration::from_millis(400);
    let server = TestServer::start(vec![
        table_rule(
            "old",
            TABLE_SUMMARY_TOTAL,
            Reply::json(200, &totals(1)).delayed(slow),
        ),
        rule("batchName=old", Reply::json(200, "[]").delayed(slow)),
        table_rule("new", TABLE_SUMMARY_TOTAL, Reply::json(200, &totals(2))),
        rule("batchName=new", Reply::json(200, "[]")),
    ])
    .await;
    let client = Arc::new(DashClient::new(&server.config()).unwrap());

    let old_scope = CancelScope::new();
    let (old_tx, mut old_rx) = mpsc::unbounded_channel();
    spawn_table_fetches(&client, "old", &old_scope.token(), &old_tx);
    drop(old_tx);

    tokio::time::sleep(Duration::from_millis(50)).await;

    // Navigate: cancel the stale scope before opening the new one.
    old_scope.cancel();
    let new_scope = CancelScope::new();
    let (new_tx, mut new_rx) = mpsc::unbounded_channel();
    spawn_table_fetches(&client, "new", &new_scope.token(), &new_tx);
    drop(new_tx);

    let mut state = TablesState::default();
    while let Some(event) = new_rx.recv().await {
        state.apply(event);
        if state.settled() {
            break;
        }
    }

    assert!(state.is_loaded());
    let rows = state.summary_total.ready().expect("new batch data");
    assert_eq!(rows[0].n_instances, 2, "state must hold the new batch's table");

    // Wait past the stale replies; nothing from the old scope may
    // surface anywhere.
    tokio::time::sleep(slow + Duration::from_millis(100)).await;
    let stale = tokio::time::timeout(Duration::from_secs(1), old_rx.recv())
        .await
        .expect("stale fetch tasks must have exited");
    assert!(stale.is_none(), "stale scope delivered {stale:?}");
}

#[tokio::test]
async fn view_is_ready_only_after_both_mandatory_tables_arrive() {
    // The mandatory summary tables are the slowest; the optional ones
    // arrive first and must not flip readiness on their own.
    let server = TestServer::start(vec![
        table_rule(
            "b",
            TABLE_SUMMARY_TOTAL,
            Reply::json(200, &totals(1)).delayed(Duration::from_millis(200)),
        ),
        table_rule(
            "b",
            TABLE_SUMMARY_BY_EXP,
            Reply::json(200, "[]").delayed(Duration::from_millis(200)),
        ),
        rule("batchName=b", Reply::json(200, "[]")),
    ])
    .await;
    let client = Arc::new(DashClient::new(&server.config()).unwrap());

    let scope = CancelScope::new();
    let (tx, mut rx) = mpsc::unbounded_channel();
    spawn_table_fetches(&client, "b", &scope.token(), &tx);
    drop(tx);

    let mut state = TablesState::default();
    let mut events_before_ready = 0usize;
    while let Some(event) = rx.recv().await {
        state.apply(event);
        if state.is_loaded() {
            break;
        }
        events_before_ready += 1;
    }

    // Both optional tables (and one mandatory) can have settled before
    // readiness; the fast optional pair alone never suffices.
    assert!(state.is_loaded());
    assert!(events_before_ready >= 2);
    assert!(state.convergence_info.is_ready());
    assert!(state.run_summary_stats.is_ready());
}

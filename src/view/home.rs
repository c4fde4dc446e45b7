//! Batch list and the process action.

use crate::api::cancel::CancelScope;
use crate::api::DashClient;
use crate::model::BatchInfo;
use crate::table;
use anyhow::Result;
use serde::Serialize;
use std::sync::Arc;

/// Flattened batch line for the overview table. Field order is display
/// order.
#[derive(Debug, Serialize)]
struct BatchOverviewRow {
    name: String,
    experiments: usize,
    series: u64,
    solved: String,
    processed: String,
    started: String,
}

/// The batch list is the one place the client reorders a response:
/// sorted by name for stable browsing. Everything else is preserved.
fn overview_rows(batches: &[BatchInfo]) -> Vec<BatchOverviewRow> {
    let mut rows: Vec<BatchOverviewRow> = batches
        .iter()
        .map(|info| BatchOverviewRow {
            name: info.name.clone(),
            experiments: info.config.configs.len(),
            series: info.total_series(),
            solved: info
                .solved_count
                .map(|count| count.to_string())
                .unwrap_or_else(|| "-".to_string()),
            processed: tri_state(info.is_processed).to_string(),
            started: info
                .config
                .start_time
                .clone()
                .unwrap_or_else(|| "-".to_string()),
        })
        .collect();
    rows.sort_by(|a, b| a.name.cmp(&b.name));
    rows
}

fn tri_state(value: Option<bool>) -> &'static str {
    match value {
        Some(true) => "yes",
        Some(false) => "no",
        None => "-",
    }
}

/// List all known batches.
pub async fn show_batches(client: &Arc<DashClient>, json: bool) -> Result<()> {
    let scope = CancelScope::new();
    let token = scope.token();

    let batches = tokio::select! {
        res = client.list_batches(&token) => res?,
        _ = tokio::signal::ctrl_c() => {
            scope.cancel();
            return Ok(());
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&batches)?);
        return Ok(());
    }

    println!("{}", table::render(&overview_rows(&batches)));
    Ok(())
}

/// Trigger processing of one batch. The call is fire-and-observe: a
/// 200 acknowledgement with an `error` field is a soft failure whose
/// text is shown to the user, and the actual processing status is only
/// visible by re-fetching the batch list afterwards.
pub async fn process(
    client: &Arc<DashClient>,
    batch_name: &str,
    max_cpus: Option<usize>,
    json: bool,
) -> Result<()> {
    let scope = CancelScope::new();
    let token = scope.token();

    let response = tokio::select! {
        res = client.process_batch(batch_name, max_cpus, &token) => res?,
        _ = tokio::signal::ctrl_c() => {
            scope.cancel();
            return Ok(());
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    match &response.error {
        Some(message) => println!("Processing rejected: {message}"),
        None => println!("Processing accepted for {batch_name}"),
    }

    let batches = client.list_batches(&token).await?;
    match batches.iter().find(|batch| batch.name == batch_name) {
        Some(batch) => println!("Current status: processed = {}", tri_state(batch.is_processed)),
        None => println!("Batch {batch_name} not present in the current list"),
    }
    Ok(())
}

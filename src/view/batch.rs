//! Batch details: result tables and plot references.

use crate::api::cancel::{CancelScope, CancelToken};
use crate::api::{ApiError, DashClient};
use crate::model::{
    ConvergenceInfoRow, ExperimentPlots, RunSummaryStatsRow, SummaryByExpRow, SummaryTotalRow,
};
use crate::table::{self, FieldOrder, RowStrategy};
use crate::view::Remote;
use anyhow::Result;
use comfy_table::{Attribute, Cell};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio::sync::mpsc;

pub const TABLE_SUMMARY_TOTAL: &str = "summary_total";
pub const TABLE_SUMMARY_BY_EXP: &str = "summary_by_exp";
pub const TABLE_CONVERGENCE_INFO: &str = "convergence_info";
pub const TABLE_RUN_SUMMARY_STATS: &str = "run_summary_stats";

/// One table fetch settling. Arrival order is arbitrary; the fold must
/// accept any subset arriving first.
#[derive(Debug)]
pub enum TableEvent {
    SummaryTotal(Result<Vec<SummaryTotalRow>, ApiError>),
    SummaryByExp(Result<Vec<SummaryByExpRow>, ApiError>),
    ConvergenceInfo(Result<Vec<ConvergenceInfoRow>, ApiError>),
    RunSummaryStats(Result<Vec<RunSummaryStatsRow>, ApiError>),
}

/// Per-table slots of the tables view.
#[derive(Debug, Default)]
pub struct TablesState {
    pub summary_total: Remote<Vec<SummaryTotalRow>>,
    pub summary_by_exp: Remote<Vec<SummaryByExpRow>>,
    pub convergence_info: Remote<Vec<ConvergenceInfoRow>>,
    pub run_summary_stats: Remote<Vec<RunSummaryStatsRow>>,
}

impl TablesState {
    pub fn apply(&mut self, event: TableEvent) {
        match event {
            TableEvent::SummaryTotal(res) => self.summary_total = Remote::from_result(res),
            TableEvent::SummaryByExp(res) => self.summary_by_exp = Remote::from_result(res),
            TableEvent::ConvergenceInfo(res) => self.convergence_info = Remote::from_result(res),
            TableEvent::RunSummaryStats(res) => self.run_summary_stats = Remote::from_result(res),
        }
    }

    /// Ready to render. Only the two mandatory summary tables gate
    /// this; the optional tables render independently once present.
    pub fn is_loaded(&self) -> bool {
        self.summary_total.is_ready() && self.summary_by_exp.is_ready()
    }

    /// Every slot has settled; nothing further will arrive.
    pub fn settled(&self) -> bool {
        self.summary_total.settled()
            && self.summary_by_exp.settled()
            && self.convergence_info.settled()
            && self.run_summary_stats.settled()
    }
}

/// Issue the four table fetches of one batch concurrently inside the
/// given scope. Each task delivers its settled result as an event; a
/// task whose fetch was cancelled delivers nothing at all.
pub fn spawn_table_fetches(
    client: &Arc<DashClient>,
    batch_name: &str,
    token: &CancelToken,
    tx: &mpsc::UnboundedSender<TableEvent>,
) {
    spawn_fetch(client, batch_name, TABLE_SUMMARY_TOTAL, token, tx, TableEvent::SummaryTotal);
    spawn_fetch(client, batch_name, TABLE_SUMMARY_BY_EXP, token, tx, TableEvent::SummaryByExp);
    spawn_fetch(
        client,
        batch_name,
        TABLE_CONVERGENCE_INFO,
        token,
        tx,
        TableEvent::ConvergenceInfo,
    );
    spawn_fetch(
        client,
        batch_name,
        TABLE_RUN_SUMMARY_STATS,
        token,
        tx,
        TableEvent::RunSummaryStats,
    );
}

fn spawn_fetch<T>(
    client: &Arc<DashClient>,
    batch_name: &str,
    table_name: &'static str,
    token: &CancelToken,
    tx: &mpsc::UnboundedSender<TableEvent>,
    wrap: fn(Result<Vec<T>, ApiError>) -> TableEvent,
) where
    T: DeserializeOwned + Send + 'static,
{
    let client = Arc::clone(client);
    let batch = batch_name.to_string();
    let token = token.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        match client.fetch_table_as::<T>(&batch, table_name, &token).await {
            // Cancelled requests must not touch view state.
            Err(err) if err.is_cancelled() => {}
            res => {
                let _ = tx.send(wrap(res));
            }
        }
    });
}

/// The tables tab: fetch all four tables, render once everything has
/// settled. Ctrl-C cancels the scope and exits quietly.
pub async fn show_tables(client: &Arc<DashClient>, batch_name: &str, json: bool) -> Result<()> {
    let scope = CancelScope::new();
    let (tx, mut rx) = mpsc::unbounded_channel();
    spawn_table_fetches(client, batch_name, &scope.token(), &tx);
    drop(tx);

    let mut state = TablesState::default();
    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Some(event) => {
                    state.apply(event);
                    if state.settled() {
                        break;
                    }
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                scope.cancel();
                return Ok(());
            }
        }
    }

    render_tables(batch_name, &state, json)
}

fn render_tables(batch_name: &str, state: &TablesState, json: bool) -> Result<()> {
    if json {
        let payload = serde_json::json!({
            "summaryTotal": state.summary_total.ready(),
            "summaryByExp": state.summary_by_exp.ready(),
            "convergenceInfo": state.convergence_info.ready(),
            "runSummaryStats": state.run_summary_stats.ready(),
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    if !state.is_loaded() {
        anyhow::bail!("summary tables unavailable for batch {batch_name}");
    }

    println!("# {batch_name}");

    if let Some(rows) = state.summary_total.ready() {
        println!("\n{TABLE_SUMMARY_TOTAL}");
        println!("{}", table::render(rows));
    }
    if let Some(rows) = state.summary_by_exp.ready() {
        println!("\n{TABLE_SUMMARY_BY_EXP}");
        println!("{}", table::render_with(rows, &HighlightBestKnown));
    }
    match &state.convergence_info {
        Remote::Ready(rows) => {
            println!("\n{TABLE_CONVERGENCE_INFO}");
            println!("{}", table::render(rows));
        }
        Remote::Failed => println!("\n{TABLE_CONVERGENCE_INFO}: unavailable"),
        Remote::Pending => {}
    }
    match &state.run_summary_stats {
        Remote::Ready(rows) => {
            println!("\n{TABLE_RUN_SUMMARY_STATS}");
            println!("{}", table::render(rows));
        }
        Remote::Failed => println!("\n{TABLE_RUN_SUMMARY_STATS}: unavailable"),
        Remote::Pending => {}
    }
    Ok(())
}

/// Bold the whole row when the best achieved fitness equals the best
/// known solution. Exact equality is the backend's contract for a hit;
/// both numbers come from the same table row.
struct HighlightBestKnown;

impl RowStrategy<SummaryByExpRow> for HighlightBestKnown {
    fn cells(&self, row: &SummaryByExpRow) -> Vec<Cell> {
        let cells = FieldOrder.cells(row);
        if row.fitness_best == row.bks {
            cells
                .into_iter()
                .map(|cell| cell.add_attribute(Attribute::Bold))
                .collect()
        } else {
            cells
        }
    }
}

/// The plots tab: list each experiment's plot references, sorted by
/// experiment name.
pub async fn show_plots(client: &Arc<DashClient>, batch_name: &str, json: bool) -> Result<()> {
    let scope = CancelScope::new();
    let token = scope.token();

    let mut plots = tokio::select! {
        res = client.fetch_batch_plots(batch_name, &token) => res?,
        _ = tokio::signal::ctrl_c() => {
            scope.cancel();
            return Ok(());
        }
    };

    plots.sort_by(|a, b| a.exp_name.cmp(&b.exp_name));

    if json {
        println!("{}", serde_json::to_string_pretty(&plots)?);
        return Ok(());
    }

    println!("# {batch_name}: plots");
    for exp in &plots {
        print_experiment_plots(exp);
    }
    Ok(())
}

fn print_experiment_plots(exp: &ExperimentPlots) {
    println!("\n{}", exp.exp_name);
    println!("  fit_avg:          {}", exp.fit_avg);
    println!("  best_run:         {}", exp.best_run);
    if let Some(url) = &exp.best_run_fit_avg {
        println!("  best_run_fit_avg: {url}");
    }
    if let Some(url) = &exp.pop_met {
        println!("  pop_met:          {url}");
    }
    if let Some(url) = &exp.solution {
        println!("  solution:         {url}");
    }
}

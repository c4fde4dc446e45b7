use serde::{Deserialize, Serialize};

/// One dynamic result-table row: column name -> scalar value.
///
/// The backend transmits no schema; column order is whatever the row
/// object carries, so the map must preserve insertion order (the
/// `preserve_order` feature of serde_json).
pub type TableRow = serde_json::Map<String, serde_json::Value>;

/// A batch as returned by the `/batches` endpoint.
///
/// `is_processed` is tri-state: the backend omits the field for batches
/// it has not inspected yet, so absence is distinct from `false`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchInfo {
    pub name: String,
    pub config: BatchConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solved_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_processed: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchConfig {
    #[serde(default)]
    pub output_dir: Option<String>,
    pub configs: Vec<Experiment>,
    #[serde(default)]
    pub solver_config: Option<SolverConfig>,
    #[serde(default)]
    pub start_time: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Experiment {
    pub name: String,
    pub instance: InstanceInfo,
    pub config: ExperimentConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentConfig {
    pub input_file: String,
    pub output_dir: String,
    #[serde(default)]
    pub config_file: Option<String>,
    pub n_series: u64,
}

/// Solver parameters dumped at the batch level. Everything except the
/// generation count is optional across solver versions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolverConfig {
    #[serde(default)]
    pub input_file: Option<String>,
    #[serde(default)]
    pub output_dir: Option<String>,
    pub n_gen: u64,
    #[serde(default)]
    pub pop_size: Option<u64>,
    #[serde(default)]
    pub delay_const_factor: Option<f64>,
    #[serde(default)]
    pub solver_type: Option<String>,
}

/// Problem-instance reference data. The backend's problem registry
/// emits these keys in snake_case, unlike the rest of the wire model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceInfo {
    pub id: String,
    #[serde(rename = "ref")]
    pub reference: String,
    pub jobs: u64,
    pub machines: u64,
    pub lower_bound: f64,
    pub lower_bound_ref: String,
    pub best_solution: f64,
    pub best_solution_ref: String,
    pub best_solution_time: String,
    pub best_solution_time_ref: String,
}

/// Per-experiment plot references. The best-run and average-fitness
/// curves always exist once a batch is processed; the rest depend on
/// which analyses the processing run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentPlots {
    pub exp_name: String,
    pub best_run: String,
    pub fit_avg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_run_fit_avg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pop_met: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solution: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchesResponse {
    pub batch_info: Vec<BatchInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchPlotsResponse {
    pub exp_plots: Vec<ExperimentPlots>,
}

/// Body of the `/process` POST. `max_cpus` must be omitted entirely
/// when unset; the backend rejects unknown-null keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRequest {
    pub batch_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_cpus: Option<usize>,
}

/// Acknowledgement of a process request. HTTP 200 with a populated
/// `error` is a soft failure the caller must read; it is not a
/// transport-level error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessResponse {
    #[serde(default)]
    pub error: Option<String>,
}

// Typed shapes for the known result tables. Field declaration order is
// display order: the generic renderer derives headers from it.

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryTotalRow {
    pub n_instances: u64,
    pub bks_hit_total: u64,
    pub avg_dev_to_bks: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryByExpRow {
    pub expname: String,
    pub fitness_avg: f64,
    pub fitness_best: f64,
    pub bks: f64,
    pub fitness_avg_to_bks_dev: f64,
    pub diversity_avg: f64,
    pub diversity_std: f64,
    pub fitness_n_improv_avg: f64,
    pub fitness_n_improv_std: f64,
    pub bks_hitratio: f64,
    pub itertime_avg: f64,
    pub itertime_std: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvergenceInfoRow {
    pub expname: String,
    pub avg_cvg_iter: f64,
    pub std_cvg_iter: f64,
    pub median_cvg_iter: f64,
    pub min_cvg_iter: f64,
    pub max_cvg_iter: f64,
    pub bks_hitratio: f64,
    pub pre400_bks_hitratio: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummaryStatsRow {
    pub expname: String,
    pub age_std: f64,
    pub age_max: f64,
    pub unique_sols: f64,
    pub indiv_count_avg: f64,
    pub indiv_count_std: f64,
    pub co_inv_max: f64,
    pub co_inv_min: f64,
    pub fitness_best: f64,
    pub total_time_avg: f64,
    pub total_time_std: f64,
}

impl BatchInfo {
    /// Total number of configured series across the batch's experiments.
    pub fn total_series(&self) -> u64 {
        self.config.configs.iter().map(|e| e.config.n_series).sum()
    }
}

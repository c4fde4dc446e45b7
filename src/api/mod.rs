//! Single point of contact with the dashboard backend.
//!
//! Four operations against four fixed endpoint paths under one base
//! address. Every operation is cancellable, never retries, never
//! caches, and logs a failure exactly once before handing it to the
//! caller.

pub mod cancel;

use crate::config::ServerConfig;
use crate::model::{
    BatchInfo, BatchPlotsResponse, BatchesResponse, ExperimentPlots, ProcessRequest,
    ProcessResponse, TableRow,
};
use cancel::CancelToken;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The request's scope was cancelled before the response completed.
    /// Not a failure; callers drop it silently.
    #[error("request cancelled")]
    Cancelled,

    /// Connection-level failure before any HTTP status was observed.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success HTTP status. `body` is the parsed JSON error body;
    /// that body is what callers observe, not the network object.
    #[error("server error ({status}): {body}")]
    Server {
        status: StatusCode,
        body: serde_json::Value,
    },

    /// The body (of either a success or an error response) was not the
    /// JSON we expected.
    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ApiError::Cancelled)
    }
}

/// Endpoint set, composed once from the configured base address and
/// reused for the client's lifetime.
#[derive(Debug, Clone)]
struct Endpoints {
    batches: String,
    table: String,
    process: String,
    plots: String,
}

impl Endpoints {
    fn new(base_url: &str) -> Self {
        Self {
            batches: format!("{base_url}/batches"),
            table: format!("{base_url}/table"),
            process: format!("{base_url}/process"),
            plots: format!("{base_url}/plots"),
        }
    }
}

pub struct DashClient {
    http: reqwest::Client,
    endpoints: Endpoints,
}

impl DashClient {
    pub fn new(cfg: &ServerConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("evodash/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            endpoints: Endpoints::new(&cfg.base_url()),
        })
    }

    /// GET `/batches`. No parameters.
    pub async fn list_batches(&self, cancel: &CancelToken) -> Result<Vec<BatchInfo>, ApiError> {
        let req = self.http.get(&self.endpoints.batches);
        let response: BatchesResponse = self
            .dispatch(req, cancel)
            .await
            .map_err(|err| log_failure("list_batches", None, None, err))?;
        Ok(response.batch_info)
    }

    /// GET `/table?batchName=..&tableName=..` as dynamic rows.
    pub async fn fetch_table(
        &self,
        batch_name: &str,
        table_name: &str,
        cancel: &CancelToken,
    ) -> Result<Vec<TableRow>, ApiError> {
        self.fetch_table_as(batch_name, table_name, cancel).await
    }

    /// GET `/table?batchName=..&tableName=..` decoded into the caller's
    /// row shape. The two query parameters are exactly these; the
    /// backend selects the dataset by the pair.
    pub async fn fetch_table_as<T: DeserializeOwned>(
        &self,
        batch_name: &str,
        table_name: &str,
        cancel: &CancelToken,
    ) -> Result<Vec<T>, ApiError> {
        let req = self
            .http
            .get(&self.endpoints.table)
            .query(&[("batchName", batch_name), ("tableName", table_name)]);
        self.dispatch(req, cancel)
            .await
            .map_err(|err| log_failure("fetch_table", Some(batch_name), Some(table_name), err))
    }

    /// POST `/process` with a JSON body. HTTP 200 is a successful call
    /// even when the response carries `error`; the caller inspects the
    /// field. Processing is fire-and-observe: re-fetch batch state to
    /// see the effect.
    pub async fn process_batch(
        &self,
        batch_name: &str,
        max_cpus: Option<usize>,
        cancel: &CancelToken,
    ) -> Result<ProcessResponse, ApiError> {
        let body = ProcessRequest {
            batch_name: batch_name.to_string(),
            max_cpus,
        };
        let req = self.http.post(&self.endpoints.process).json(&body);
        self.dispatch(req, cancel)
            .await
            .map_err(|err| log_failure("process_batch", Some(batch_name), None, err))
    }

    /// GET `/plots?batchName=..`.
    pub async fn fetch_batch_plots(
        &self,
        batch_name: &str,
        cancel: &CancelToken,
    ) -> Result<Vec<ExperimentPlots>, ApiError> {
        let req = self
            .http
            .get(&self.endpoints.plots)
            .query(&[("batchName", batch_name)]);
        let response: BatchPlotsResponse = self
            .dispatch(req, cancel)
            .await
            .map_err(|err| log_failure("fetch_batch_plots", Some(batch_name), None, err))?;
        Ok(response.exp_plots)
    }

    /// Issue one request with the shared lifecycle: race every
    /// suspension point against the token, split on HTTP status, parse
    /// the matching body. Once the token fires, nothing of the response
    /// is processed.
    async fn dispatch<T: DeserializeOwned>(
        &self,
        req: reqwest::RequestBuilder,
        cancel: &CancelToken,
    ) -> Result<T, ApiError> {
        if cancel.is_cancelled() {
            return Err(ApiError::Cancelled);
        }

        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(ApiError::Cancelled),
            resp = req.send() => resp?,
        };

        let status = response.status();
        let body = tokio::select! {
            _ = cancel.cancelled() => return Err(ApiError::Cancelled),
            body = response.text() => body?,
        };

        if !status.is_success() {
            let parsed = serde_json::from_str(&body)?;
            return Err(ApiError::Server {
                status,
                body: parsed,
            });
        }
        Ok(serde_json::from_str(&body)?)
    }
}

/// One log line per failed operation, then the error goes to the
/// caller unchanged. Cancellation is dropped silently.
fn log_failure(op: &str, batch: Option<&str>, table: Option<&str>, err: ApiError) -> ApiError {
    if !err.is_cancelled() {
        match (batch, table) {
            (Some(batch), Some(table)) => {
                error!(operation = op, batch, table, error = %err, "backend request failed")
            }
            (Some(batch), None) => {
                error!(operation = op, batch, error = %err, "backend request failed")
            }
            _ => error!(operation = op, error = %err, "backend request failed"),
        }
    }
    err
}

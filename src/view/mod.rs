//! Page-level drivers around the API client.
//!
//! Each view owns one cancellation scope, issues its requests
//! concurrently inside it, and folds results into per-request slots as
//! they arrive, in whatever order that happens.

pub mod batch;
pub mod home;

use crate::api::ApiError;

/// State of one data slot a view depends on.
///
/// `Failed` is deliberate and distinct from `Ready` of an empty
/// payload: "not yet arrived", "arrived empty" and "errored" each
/// render differently. A cancelled request never transitions its slot;
/// it simply stays `Pending` in a scope nobody reads again.
#[derive(Debug)]
pub enum Remote<T> {
    Pending,
    Ready(T),
    Failed,
}

impl<T> Default for Remote<T> {
    fn default() -> Self {
        Remote::Pending
    }
}

impl<T> Remote<T> {
    pub fn from_result(result: Result<T, ApiError>) -> Self {
        match result {
            Ok(value) => Remote::Ready(value),
            Err(_) => Remote::Failed,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Remote::Pending)
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Remote::Ready(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Remote::Failed)
    }

    /// The slot has been decided one way or the other.
    pub fn settled(&self) -> bool {
        !self.is_pending()
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            Remote::Ready(value) => Some(value),
            _ => None,
        }
    }
}

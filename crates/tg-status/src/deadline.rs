//! Per-request deadlines for upstream calls.

use std::future::Future;

use tokio::time::Instant;

use crate::error::{StatusError, StatusResult};

/// Run an upstream call, failing with [`StatusError::Timeout`] once
/// `deadline` passes.
pub async fn within<T, E, F>(
    deadline: Instant,
    operation: &'static str,
    call: F,
) -> StatusResult<T>
where
    F: Future<Output = Result<T, E>>,
    StatusError: From<E>,
{
    match tokio::time::timeout_at(deadline, call).await {
        Ok(result) => result.map_err(StatusError::from),
        Err(_) => Err(StatusError::Timeout { operation }),
    }
}

use std::time::Duration;

use tracing::warn;

use crate::error::{StoreError, StoreResult};

/// Run a blocking store operation on the tokio blocking pool.
///
/// A timeout abandons the wait, not the work: a commit that is already running
/// may still land after `StoreError::Timeout` is returned.
pub(crate) async fn offload<F, R>(
    operation: &'static str,
    timeout: Option<Duration>,
    work: F,
) -> StoreResult<R>
where
    F: FnOnce() -> StoreResult<R> + Send + 'static,
    R: Send + 'static,
{
    let task = tokio::task::spawn_blocking(work);

    let joined = match timeout {
        Some(after) => match tokio::time::timeout(after, task).await {
            Ok(joined) => joined,
            Err(_) => {
                warn!(operation, ?after, "store operation timed out");
                return Err(StoreError::Timeout { operation, after });
            }
        },
        None => task.await,
    };

    joined.map_err(|e| StoreError::Join(e.to_string()))?
}

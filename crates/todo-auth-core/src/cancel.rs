//! Cancellation guard for suspending calls

use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::error::AuthError;

/// Drive `fut` unless `cancel` fires first.
///
/// On cancellation the future is dropped, so nothing further is issued on
/// its behalf.
pub async fn guard<F, T>(cancel: &CancellationToken, fut: F) -> Result<T, AuthError>
where
    F: Future<Output = T>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(AuthError::Cancelled),
        out = fut => Ok(out),
    }
}

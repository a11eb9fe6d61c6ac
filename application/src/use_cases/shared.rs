//! Shared utilities for use cases.

use crate::use_cases::run_session::RunSessionError;
use tokio_util::sync::CancellationToken;

/// Returns `Err(RunSessionError::Cancelled)` if the token exists and is cancelled.
pub(crate) fn check_cancelled(token: &Option<CancellationToken>) -> Result<(), RunSessionError> {
    if let Some(token) = token
        && token.is_cancelled()
    {
        return Err(RunSessionError::Cancelled);
    }
    Ok(())
}

/// Whether the optional token has fired.
pub(crate) fn is_cancelled(token: &Option<CancellationToken>) -> bool {
    token.as_ref().is_some_and(|t| t.is_cancelled())
}

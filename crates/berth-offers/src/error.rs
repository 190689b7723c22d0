//! Launch error types.

use thiserror::Error;

use berth_state::OfferId;

/// Errors from launching a task against a held offer.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// The offer vanished between matching and launch, an expected race
    /// with cancellation or expiry. The task is still pending and must be
    /// retried on a later pass.
    #[error("offer no longer exists: {0}")]
    OfferGone(OfferId),

    /// The resource manager rejected the launch itself.
    #[error("launch failed: {0}")]
    Driver(#[source] anyhow::Error),
}

pub type LaunchResult<T> = Result<T, LaunchError>;

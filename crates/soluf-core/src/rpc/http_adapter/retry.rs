use std::time::Duration;

use crate::error::{CoreError, TransportError};

/// Bounded exponential backoff for transient transport failures.
///
/// Only failures of the HTTP exchange are retried. A JSON-RPC error
/// envelope or an undecodable success body is a definitive answer from the
/// node and is returned to the caller unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first one. `0` disables retrying.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay before retry number `attempt` (1-based): `base * 2^(attempt-1)`,
    /// capped at `max_delay`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay)
    }

    pub(super) fn should_retry(&self, attempt: u32, err: &CoreError) -> bool {
        attempt < self.max_retries && is_transient(err)
    }
}

pub(super) fn is_transient(err: &CoreError) -> bool {
    match err {
        CoreError::Transport(TransportError::Http(e)) => {
            e.is_connect() || e.is_timeout() || e.is_request()
        }
        CoreError::Transport(TransportError::Status { status, .. }) => {
            status.is_server_error() || *status == reqwest::StatusCode::TOO_MANY_REQUESTS
        }
        _ => false,
    }
}

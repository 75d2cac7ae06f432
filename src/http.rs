use crate::TdigestError;
use log::warn;
use std::time::Duration;

/// Statuses worth another attempt: rate limiting and transient server errors.
const RETRY_STATUS: [u16; 5] = [429, 500, 502, 503, 504];

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff_secs: u64) -> Self {
        Self {
            max_retries,
            backoff: Duration::from_secs(backoff_secs),
        }
    }

    /// Exponential backoff: backoff, 2*backoff, 4*backoff, ...
    pub fn delay(&self, attempt: u32) -> Duration {
        self.backoff * 2u32.saturating_pow(attempt)
    }
}

pub fn agent(timeout_secs: u64) -> ureq::Agent {
    ureq::Agent::new_with_config(
        ureq::config::Config::builder()
            .timeout_global(Some(Duration::from_secs(timeout_secs)))
            .build(),
    )
}

pub fn is_retryable(e: &ureq::Error) -> bool {
    match e {
        ureq::Error::StatusCode(code) => RETRY_STATUS.contains(code),
        ureq::Error::Io(_)
        | ureq::Error::Timeout(_)
        | ureq::Error::ConnectionFailed
        | ureq::Error::HostNotFound => true,
        _ => false,
    }
}

/// Run `f` until it succeeds, fails with a non-retryable error, or the
/// retry budget is spent.
pub fn with_retry<T>(
    policy: &RetryPolicy,
    what: &str,
    mut f: impl FnMut() -> Result<T, ureq::Error>,
) -> Result<T, TdigestError> {
    let mut attempt = 0;
    loop {
        match f() {
            Ok(v) => return Ok(v),
            Err(e) if attempt < policy.max_retries && is_retryable(&e) => {
                let delay = policy.delay(attempt);
                attempt += 1;
                warn!(
                    "{what}: {e}, retrying in {}s ({attempt}/{})",
                    delay.as_secs(),
                    policy.max_retries
                );
                std::thread::sleep(delay);
            }
            Err(e) => return Err(TdigestError::Http(format!("{what}: {e}"))),
        }
    }
}

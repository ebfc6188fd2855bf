//! Generic poll-until-state utility
//!
//! A [`StateRefresh`] reports an object together with a state label. A
//! [`StateWaiter`] calls it repeatedly until the label lands in the target set,
//! leaves the pending set, or the deadline passes.
//!
//! [`BackoffWaiter`] is the default waiter. It sleeps on the tokio clock, so a
//! paused runtime (`#[tokio::test(start_paused = true)]`) drives it without real
//! delays. Between refreshes it backs off exponentially from 100ms, bounded
//! below by [`StateChangeConf::min_timeout`] and above by 10s, unless a fixed
//! [`StateChangeConf::poll_interval`] is configured.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::time::{Instant, sleep_until, timeout_at};
use tracing::{debug, trace};

/// First backoff step; doubled before it is used
const INITIAL_WAIT: Duration = Duration::from_millis(100);

/// Upper bound of the backoff
const MAX_WAIT: Duration = Duration::from_secs(10);

/// Poll intervals at or above this are ignored in favour of backoff
const MAX_POLL_INTERVAL: Duration = Duration::from_secs(180);

const DEFAULT_NOT_FOUND_CHECKS: u32 = 20;

/// Stand-in deadline for timeouts too large to add to the clock (about 30 years)
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// Configuration for a single wait
#[derive(Debug, Clone, PartialEq)]
pub struct StateChangeConf {
    /// States that mean "keep polling"
    pub pending: Vec<String>,
    /// States that end the wait successfully
    pub target: Vec<String>,
    /// Sleep before the first refresh
    pub delay: Duration,
    /// Overall deadline, measured from the start of the wait
    pub timeout: Duration,
    /// Smallest wait between refreshes
    pub min_timeout: Duration,
    /// Fixed wait between refreshes, replacing backoff
    pub poll_interval: Option<Duration>,
    /// Consecutive refreshes without an object before giving up
    pub not_found_checks: u32,
    /// Consecutive target observations required
    pub continuous_target_occurence: u32,
}

impl StateChangeConf {
    pub fn new<P, T>(pending: P, target: T, timeout: Duration) -> Self
    where
        P: IntoIterator,
        P::Item: Into<String>,
        T: IntoIterator,
        T::Item: Into<String>,
    {
        Self {
            pending: pending.into_iter().map(Into::into).collect(),
            target: target.into_iter().map(Into::into).collect(),
            delay: Duration::ZERO,
            timeout,
            min_timeout: Duration::ZERO,
            poll_interval: None,
            not_found_checks: DEFAULT_NOT_FOUND_CHECKS,
            continuous_target_occurence: 1,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_min_timeout(mut self, min_timeout: Duration) -> Self {
        self.min_timeout = min_timeout;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Option<Duration>) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_not_found_checks(mut self, checks: u32) -> Self {
        self.not_found_checks = checks;
        self
    }

    pub fn with_continuous_target_occurence(mut self, occurences: u32) -> Self {
        self.continuous_target_occurence = occurences;
        self
    }

    /// Bound a backoff step, or replace it with the fixed poll interval
    fn next_wait(&self, wait: Duration) -> Duration {
        match self.poll_interval {
            Some(interval) if !interval.is_zero() && interval < MAX_POLL_INTERVAL => interval,
            _ if wait < self.min_timeout => self.min_timeout,
            _ => wait.min(MAX_WAIT),
        }
    }

    fn timeout_error<E>(&self, last_state: Option<String>) -> WaitError<E>
    where
        E: std::error::Error + 'static,
    {
        WaitError::Timeout {
            last_state,
            expected: self.target.clone(),
            timeout: self.timeout,
        }
    }
}

/// Why a wait ended without reaching a target state
#[derive(Error, Debug)]
pub enum WaitError<E>
where
    E: std::error::Error + 'static,
{
    /// The refresh callback failed; the wait stops immediately
    #[error("{0}")]
    Refresh(#[source] E),

    #[error("{}", describe_timeout(.last_state, .expected, .timeout))]
    Timeout {
        last_state: Option<String>,
        expected: Vec<String>,
        timeout: Duration,
    },

    #[error("unexpected state '{state}', wanted target '{}'", .expected.join(", "))]
    UnexpectedState { state: String, expected: Vec<String> },

    #[error("couldn't find resource ({retries} retries)")]
    NotFound { retries: u32 },
}

impl<E> WaitError<E>
where
    E: std::error::Error + 'static,
{
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, WaitError::Timeout { .. })
    }

    /// The refresh error, if that is what ended the wait
    pub fn refresh_error(&self) -> Option<&E> {
        match self {
            WaitError::Refresh(e) => Some(e),
            _ => None,
        }
    }
}

fn describe_timeout(last_state: &Option<String>, expected: &[String], timeout: &Duration) -> String {
    match last_state {
        Some(state) => format!(
            "timeout while waiting for state to become '{}' (last state: '{}', timeout: {:?})",
            expected.join(", "),
            state,
            timeout
        ),
        None => format!(
            "timeout while waiting for state to become '{}' (timeout: {:?})",
            expected.join(", "),
            timeout
        ),
    }
}

/// One status check: the current object and its state label, or `None` if it
/// does not exist (yet)
#[async_trait]
pub trait StateRefresh: Send + Sync {
    type Output: Send;
    type Error: std::error::Error + Send + Sync + 'static;

    async fn refresh(&self) -> Result<Option<(Self::Output, String)>, Self::Error>;
}

/// Drives a [`StateRefresh`] until it reports a target state
#[async_trait]
pub trait StateWaiter: Send + Sync {
    async fn wait_for_state<R>(
        &self,
        conf: &StateChangeConf,
        refresh: &R,
    ) -> Result<R::Output, WaitError<R::Error>>
    where
        R: StateRefresh;
}

/// Exponential backoff waiter on the tokio clock
#[derive(Debug, Clone, Copy, Default)]
pub struct BackoffWaiter;

#[async_trait]
impl StateWaiter for BackoffWaiter {
    async fn wait_for_state<R>(
        &self,
        conf: &StateChangeConf,
        refresh: &R,
    ) -> Result<R::Output, WaitError<R::Error>>
    where
        R: StateRefresh,
    {
        let deadline = deadline_after(conf.timeout);
        let mut last_state: Option<String> = None;
        let mut wait = INITIAL_WAIT;
        let mut target_occurence = 0u32;
        let mut not_found = 0u32;

        debug!(
            pending = ?conf.pending,
            target = ?conf.target,
            timeout = ?conf.timeout,
            "Waiting for state change"
        );

        if !sleep_within(deadline, conf.delay).await {
            return Err(conf.timeout_error(last_state));
        }

        loop {
            let refreshed = match timeout_at(deadline, refresh.refresh()).await {
                Ok(result) => result.map_err(WaitError::Refresh)?,
                Err(_) => return Err(conf.timeout_error(last_state)),
            };

            match refreshed {
                None => {
                    not_found += 1;
                    trace!(not_found, "Refresh returned no object");
                    if not_found > conf.not_found_checks {
                        return Err(WaitError::NotFound { retries: not_found });
                    }
                }
                Some((value, state)) => {
                    not_found = 0;
                    if conf.target.iter().any(|t| *t == state) {
                        target_occurence += 1;
                        if target_occurence >= conf.continuous_target_occurence.max(1) {
                            debug!(state = %state, "Reached target state");
                            return Ok(value);
                        }
                    } else if conf.pending.iter().any(|p| *p == state) {
                        target_occurence = 0;
                    } else if !conf.pending.is_empty() {
                        return Err(WaitError::UnexpectedState {
                            state,
                            expected: conf.target.clone(),
                        });
                    }
                    last_state = Some(state);
                }
            }

            // Keep the pace steady while waiting for the target to reoccur
            if target_occurence == 0 {
                wait = wait.checked_mul(2).unwrap_or(MAX_WAIT);
            }
            wait = conf.next_wait(wait);

            trace!(?wait, "Sleeping before next refresh");
            if !sleep_within(deadline, wait).await {
                return Err(conf.timeout_error(last_state));
            }
        }
    }
}

/// Sleep for `period`, or until `deadline` if that comes first. Returns false
/// when the deadline cut the sleep short.
async fn sleep_within(deadline: Instant, period: Duration) -> bool {
    match Instant::now().checked_add(period) {
        Some(wake) if wake <= deadline => {
            sleep_until(wake).await;
            true
        }
        _ => {
            sleep_until(deadline).await;
            false
        }
    }
}

fn deadline_after(timeout: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(timeout).unwrap_or(now + FAR_FUTURE)
}

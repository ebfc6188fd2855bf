//! Waiting on App Engine operations
//!
//! An operation is polled through [`OperationsApi::get_operation`] until it
//! reports `done`. The polling loop itself belongs to a [`StateWaiter`]
//! (by default [`BackoffWaiter`]); this module only supplies the refresh step,
//! the pending/target states and the unwrapping of the terminal record.
//!
//! # Example
//!
//! ```rust,ignore
//! use gae_opwait_core::{AppEngineClient, Operation, wait_for_operation};
//!
//! let client = AppEngineClient::builder().access_token(token).build()?;
//! let op = Operation::named("apps/my-app/operations/1234-abcd");
//!
//! // Default timeout of four minutes
//! wait_for_operation(&client, &op, "my-app", "App Engine app to be created", None).await?;
//! ```

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::client::{ApiError, OperationsApi};
use crate::config::WaitSettings;
use crate::error::{CoreError, OperationError, Result};
use crate::operation::{Operation, STATE_DONE, STATE_PENDING};
use crate::progress::{ProgressCallback, ProgressEvent, emit};
use crate::wait::{BackoffWaiter, StateChangeConf, StateRefresh, StateWaiter};

/// Wait for an operation to finish
///
/// Polls with the default timing (10s initial delay, 2s minimum interval) and
/// `timeout`, or four minutes when `None`. Returns an error if polling fails,
/// the deadline passes, or the finished operation carries an error payload.
pub async fn wait_for_operation<C>(
    client: &C,
    operation: &Operation,
    app_id: &str,
    activity: &str,
    timeout: Option<Duration>,
) -> Result<()>
where
    C: OperationsApi + ?Sized,
{
    let mut waiter = OperationWaiter::new(client, &operation.name, app_id);
    if let Some(timeout) = timeout {
        waiter = waiter.timeout(timeout);
    }
    waiter.wait(activity).await.map(|_| ())
}

/// Build the state-change configuration for an operation wait
pub fn operation_conf(settings: &WaitSettings) -> StateChangeConf {
    StateChangeConf::new([STATE_PENDING], [STATE_DONE], settings.timeout())
        .with_delay(settings.delay())
        .with_min_timeout(settings.min_timeout())
        .with_poll_interval(settings.poll_interval())
        .with_not_found_checks(settings.not_found_checks)
}

/// Configurable wait on a single operation
pub struct OperationWaiter<'a, C: ?Sized, W = BackoffWaiter> {
    client: &'a C,
    app_id: String,
    operation: String,
    conf: StateChangeConf,
    waiter: W,
    on_progress: Option<ProgressCallback>,
}

impl<'a, C> OperationWaiter<'a, C>
where
    C: OperationsApi + ?Sized,
{
    /// Wait on `operation` (a bare id or a full resource name) owned by `app_id`
    pub fn new(client: &'a C, operation: impl Into<String>, app_id: impl Into<String>) -> Self {
        Self {
            client,
            app_id: app_id.into(),
            operation: operation.into(),
            conf: operation_conf(&WaitSettings::default()),
            waiter: BackoffWaiter,
            on_progress: None,
        }
    }
}

impl<'a, C, W> OperationWaiter<'a, C, W>
where
    C: OperationsApi + ?Sized,
    W: StateWaiter,
{
    /// Replace the polling loop
    pub fn with_waiter<V: StateWaiter>(self, waiter: V) -> OperationWaiter<'a, C, V> {
        OperationWaiter {
            client: self.client,
            app_id: self.app_id,
            operation: self.operation,
            conf: self.conf,
            waiter,
            on_progress: self.on_progress,
        }
    }

    /// Apply timing from configuration
    pub fn settings(mut self, settings: &WaitSettings) -> Self {
        self.conf = operation_conf(settings);
        self
    }

    /// Replace the configuration wholesale
    pub fn with_conf(mut self, conf: StateChangeConf) -> Self {
        self.conf = conf;
        self
    }

    /// Override the overall deadline, keeping the rest of the timing
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.conf.timeout = timeout;
        self
    }

    /// Receive progress events while waiting
    pub fn on_progress(mut self, callback: ProgressCallback) -> Self {
        self.on_progress = Some(callback);
        self
    }

    /// The configuration handed to the waiter
    pub fn conf(&self) -> &StateChangeConf {
        &self.conf
    }

    /// Poll until the operation is done and return the finished record
    ///
    /// `activity` names what is being waited for in error messages, e.g.
    /// "App Engine app to be created".
    pub async fn wait(&self, activity: &str) -> Result<Operation> {
        emit(
            &self.on_progress,
            ProgressEvent::Started {
                operation: self.operation.clone(),
            },
        );

        let refresh = OperationRefresh {
            client: self.client,
            app_id: &self.app_id,
            operation: &self.operation,
            started: Instant::now(),
            on_progress: &self.on_progress,
        };

        let op = match self.waiter.wait_for_state(&self.conf, &refresh).await {
            Ok(op) => op,
            Err(source) => {
                let err = CoreError::Wait {
                    activity: activity.to_string(),
                    source,
                };
                warn!(operation = %self.operation, "{}", err);
                self.failed(&err);
                return Err(err);
            }
        };

        if let Some(status) = op.failure() {
            let err = CoreError::from(OperationError(status.clone()));
            warn!(
                operation = %self.operation,
                code = status.code,
                "Operation failed: {}",
                status.message
            );
            self.failed(&err);
            return Err(err);
        }

        info!(operation = %self.operation, "Operation completed");
        emit(
            &self.on_progress,
            ProgressEvent::Completed {
                operation: self.operation.clone(),
            },
        );
        Ok(op)
    }

    fn failed(&self, err: &CoreError) {
        emit(
            &self.on_progress,
            ProgressEvent::Failed {
                operation: self.operation.clone(),
                error: err.to_string(),
            },
        );
    }
}

/// Single status check against the operations API
struct OperationRefresh<'a, C: ?Sized> {
    client: &'a C,
    app_id: &'a str,
    operation: &'a str,
    started: Instant,
    on_progress: &'a Option<ProgressCallback>,
}

#[async_trait]
impl<'a, C> StateRefresh for OperationRefresh<'a, C>
where
    C: OperationsApi + ?Sized,
{
    type Output = Operation;
    type Error = ApiError;

    async fn refresh(&self) -> std::result::Result<Option<(Operation, String)>, ApiError> {
        let op = self
            .client
            .get_operation(self.app_id, self.operation)
            .await?;

        debug!(
            "Got {} when asking for operation {:?}",
            op.done, self.operation
        );
        emit(
            self.on_progress,
            ProgressEvent::Polling {
                operation: self.operation.to_string(),
                done: op.done,
                elapsed: self.started.elapsed(),
            },
        );

        let state = op.state().to_string();
        Ok(Some((op, state)))
    }
}

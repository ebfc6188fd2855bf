//! # gae-opwait-core
//!
//! Waits on App Engine Admin API long-running operations.
//!
//! Creating or updating an App Engine application returns an operation that
//! finishes later. This crate polls that operation until it reports `done`,
//! then turns an embedded failure into an error.
//!
//! ## Layers
//!
//! - [`wait`] - generic poll-until-state loop ([`StateWaiter`], [`BackoffWaiter`])
//! - [`client`] - `apps.operations.get` over HTTP ([`AppEngineClient`]) behind [`OperationsApi`]
//! - [`poller`] - operation-specific refresh and result unwrapping ([`wait_for_operation`])
//! - [`config`] - TOML configuration with wait timing
//!
//! ## Example
//!
//! ```rust,ignore
//! use gae_opwait_core::{AppEngineClient, Operation, wait_for_operation};
//! use std::time::Duration;
//!
//! let client = AppEngineClient::builder()
//!     .access_token(std::env::var("GAE_OPWAIT_ACCESS_TOKEN")?)
//!     .build()?;
//!
//! let op = Operation::named("apps/my-app/operations/1234-abcd");
//! wait_for_operation(
//!     &client,
//!     &op,
//!     "my-app",
//!     "App Engine app to be created",
//!     Some(Duration::from_secs(600)),
//! )
//! .await?;
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod operation;
pub mod poller;
pub mod progress;
pub mod wait;

pub use client::{ApiError, AppEngineClient, AppEngineClientBuilder, OperationsApi};
pub use config::{Config, ConfigError, WaitSettings};
pub use error::{CoreError, OperationError, Result};
pub use operation::{Operation, Status};
pub use poller::{OperationWaiter, operation_conf, wait_for_operation};
pub use progress::{ProgressCallback, ProgressEvent};
pub use wait::{BackoffWaiter, StateChangeConf, StateRefresh, StateWaiter, WaitError};

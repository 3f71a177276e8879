//! Domain types and seams of the Vibe dashboard synchronization layer.
//!
//! This crate performs no I/O. It defines the error type, the [`Transport`]
//! seam every remote call goes through, query keys and policies, and the
//! session, notification, account and resource models.
//!
//! [`Transport`]: transport::Transport

pub mod account;
pub mod config;
pub mod error;
pub mod notification;
pub mod query;
pub mod resource;
pub mod routes;
pub mod session;
pub mod transport;

pub use error::{Result, SyncError};

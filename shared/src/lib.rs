//! meeseeqls Shared Library
//!
//! This crate contains the polling engine used by the meeseeqls agent: the
//! result model, connector configuration, the query-execution seam, the
//! pollers that drive it and the sinks that persist what they produce.
//!
//! # Modules
//!
//! - [`models`] - The [`QueryResult`](models::QueryResult) record emitted per successful query
//! - [`config`] - Connector and output configuration loaded from a JSON file
//! - [`query`] - Connection traits and the `ClickHouse` implementation
//! - [`worker`] - Pollable units, the [`Poller`](worker::Poller) and the [`Aggregator`](worker::Aggregator)
//! - [`storage`] - Result sinks and the drain loop that feeds them
//!
//! # Example
//!
//! ```
//! use chrono::{TimeDelta, Utc};
//! use shared::models::QueryResult;
//!
//! let start = Utc::now();
//! let result = QueryResult::new(start, start + TimeDelta::milliseconds(25), "site-a", "site-b");
//!
//! assert_eq!(result.duration(), result.end() - result.start());
//! assert_eq!(result.source(), "site-a");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod models;
pub mod query;
pub mod storage;
pub mod worker;

/// Re-export common dependencies for convenience.
pub use async_trait::async_trait;
pub use chrono;
pub use serde_json;

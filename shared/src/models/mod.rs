//! Data models for meeseeqls.
//!
//! This module contains the record produced for every successful query execution.

pub mod result;

pub use result::QueryResult;

//! Integration tests for the meeseeqls agent.
//!
//! These tests drive the full pipeline, from connector configuration through
//! pollers and fan-in to a result sink, against fake query backends on a
//! paused clock.

mod common;
mod pipeline_tests;
mod sink_tests;

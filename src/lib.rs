//! Control-plane client for driving Flink streaming SQL jobs through their
//! lifecycle: submit, observe, pause (via snapshot), resume (from snapshot),
//! cancel.
//!
//! This crate is the orchestration core only. A CLI, configuration loader
//! beyond environment variables, and terminal rendering are left to callers.

pub mod cluster;
pub mod config;
pub mod domain;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod orchestrator;
pub mod splitter;
pub mod store;

pub use error::{Error, Result};

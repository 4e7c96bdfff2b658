//! Flink Job REST API client: job listing/details and the snapshot
//! (savepoint) trigger/poll/stop/cancel surface.

mod client;
mod model;

pub use client::ClusterClient;
pub use model::{JobDescriptor, SnapshotRequestState, SnapshotStatus};

//! SQL Gateway client: sessions, statement submission, status polling, and
//! the result-page pagination protocol.

mod client;
mod model;

pub use client::GatewayClient;
pub use model::{ColumnInfo, ResultPage, RowPayload, Session, StatementResult};

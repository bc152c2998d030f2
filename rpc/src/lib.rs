//! JSON boundary layer for the Buidl ledger.
//!
//! Provides:
//! - Decoding of caller-supplied amounts (negative or fractional values are
//!   rejected as out of bounds before the ledger is touched)
//! - One request variant per ledger operation and query
//! - Transport-independent dispatch onto a [`buidl_ledger::SharedLedger`]
//! - An axum HTTP server exposing dispatch on `POST /`

pub mod error;
pub mod handlers;
pub mod server;

pub use error::RpcError;
pub use handlers::{dispatch, RawAmount, RpcContext, RpcRequest, RpcResponse};
pub use server::RpcServer;

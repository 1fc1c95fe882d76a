//! Client for a running smf server
//!
//! Speaks JSON-RPC over HTTP to `/jsonrpc`.

mod client;
mod types;

pub use client::{ClientError, RpcClient};
pub use types::*;

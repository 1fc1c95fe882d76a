//! Method registry and the JSON-RPC layer shared by every transport
//!
//! # Methods
//! - `search` - Regex search across `AI/Memory`
//! - `get` / `resources/read` - Read one note
//! - `list` / `resources/list` - List a directory
//! - `write` / `resources/write` - Create or overwrite a note
//! - `batch` - Several calls in one request
//! - `tools/list`, `tools/call`, `prompts/list`, `prompts/get`
//! - `initialize`, `capabilities`, `status`, `metadata`, `shutdown`, `ping`

pub mod handlers;
pub mod jsonrpc;
pub mod registry;
pub mod state;
pub mod stdio;
pub mod tools;

pub use jsonrpc::{Request, Response, RpcError};
pub use registry::Registry;
pub use state::ServerState;
pub use stdio::run_stdio;

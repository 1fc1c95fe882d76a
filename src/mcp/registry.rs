//! Method registry
//!
//! Maps method names to handlers. Every transport funnels its requests
//! through [`Registry::handle`], so a method behaves the same whether it
//! arrives over HTTP, SSE, `/lsp` or stdio.

use std::collections::HashMap;

use serde_json::Value;
use tracing::{debug, info};

use super::handlers::{notes, prompts, search, system};
use super::jsonrpc::{Request, Response, RpcError};
use super::state::ServerState;

/// Handler signature shared by every method
pub type Handler = fn(&Registry, &Value) -> Result<Value, RpcError>;

/// One registered method
#[derive(Debug)]
pub struct MethodSpec {
    pub name: &'static str,
    pub handler: Handler,
    pub summary: &'static str,
}

#[rustfmt::skip]
pub static METHODS: &[MethodSpec] = &[
    MethodSpec { name: "search", handler: search::search, summary: "Regex search under AI/Memory" },
    MethodSpec { name: "get", handler: notes::get, summary: "Read one note" },
    MethodSpec { name: "resources/read", handler: notes::get, summary: "Alias of get" },
    MethodSpec { name: "list", handler: notes::list, summary: "List a directory" },
    MethodSpec { name: "resources/list", handler: notes::list, summary: "Alias of list" },
    MethodSpec { name: "write", handler: notes::write, summary: "Create or overwrite a note" },
    MethodSpec { name: "resources/write", handler: notes::write, summary: "Alias of write" },
    MethodSpec { name: "batch", handler: system::batch, summary: "Run several methods in order" },
    MethodSpec { name: "capabilities", handler: system::capabilities, summary: "Server capabilities" },
    MethodSpec { name: "status", handler: system::status, summary: "Health and uptime" },
    MethodSpec { name: "metadata", handler: system::metadata, summary: "Vault statistics" },
    MethodSpec { name: "tools/list", handler: system::tools_list, summary: "Tool descriptors" },
    MethodSpec { name: "tools/call", handler: super::handlers::tools_call, summary: "Invoke a tool" },
    MethodSpec { name: "prompts/list", handler: prompts::list, summary: "System prompts" },
    MethodSpec { name: "prompts/get", handler: prompts::get, summary: "One system prompt" },
    MethodSpec { name: "initialize", handler: system::initialize, summary: "Capability handshake" },
    MethodSpec { name: "shutdown", handler: system::shutdown, summary: "Acknowledge shutdown" },
    MethodSpec { name: "ping", handler: system::ping, summary: "Liveness check" },
];

/// Name to handler table plus the state handlers operate on
#[derive(Debug)]
pub struct Registry {
    state: ServerState,
    methods: HashMap<&'static str, Handler>,
}

impl Registry {
    pub fn new(state: ServerState) -> Self {
        let methods = METHODS.iter().map(|m| (m.name, m.handler)).collect();
        Self { state, methods }
    }

    pub fn state(&self) -> &ServerState {
        &self.state
    }

    /// Registered method names in table order
    pub fn method_names(&self) -> Vec<&'static str> {
        METHODS.iter().map(|m| m.name).collect()
    }

    /// Dispatch one method call
    pub fn call(&self, method: &str, params: &Value) -> Result<Value, RpcError> {
        let handler = self
            .methods
            .get(method)
            .ok_or_else(|| RpcError::method_not_found(method))?;
        debug!(method, "dispatch");
        handler(self, params)
    }

    /// Handle a request envelope
    ///
    /// Returns `None` for notifications. `notifications/*` messages are only
    /// logged, other notifications run with their result discarded.
    pub fn handle(&self, request: &Request) -> Option<Response> {
        if request.is_notification() {
            if request.method.starts_with("notifications/") {
                info!("Client notification: {}", request.method);
            } else if let Err(e) = self.call(&request.method, &request.params) {
                debug!("Notification {} failed: {}", request.method, e);
            }
            return None;
        }

        let id = request.id.clone().unwrap_or(Value::Null);
        Some(Response::from_result(
            id,
            self.call(&request.method, &request.params),
        ))
    }
}

//! Stdio transport
//!
//! Messages are framed as `Content-Length: <n>\r\n\r\n<json>` in both
//! directions. Input may also be newline-delimited JSON.
//!
//! The server greets first: a `capabilities` notification carrying the
//! initialize descriptor, then the three `list_changed` notifications. A
//! frame that cannot be decoded is answered as if the client had sent
//! `initialize` with a `null` id.

use std::io::{self, BufRead, Read, Write};
use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::handlers::system::{capability_descriptor, SUPPORTED_PROTOCOL_VERSIONS};
use super::jsonrpc::{Request, Response};
use super::registry::Registry;

/// Largest accepted frame body
pub const MAX_FRAME_BYTES: usize = 16 * 1024 * 1024;

/// Consecutive read errors tolerated before the loop gives up
pub const MAX_CONSECUTIVE_ERRORS: usize = 16;

const DISCOVERY_NOTIFICATIONS: &[&str] = &[
    "notifications/tools/list_changed",
    "notifications/prompts/list_changed",
    "notifications/resources/list_changed",
];

/// One decoded input frame
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Message(Value),
    Malformed(String),
}

/// Read the next frame
///
/// Returns `Ok(None)` at end of input. Blank lines between frames are
/// skipped.
pub fn read_frame<R: BufRead>(reader: &mut R) -> io::Result<Option<Frame>> {
    let mut line = Vec::new();

    // First non-blank line decides the framing
    let first = loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            return Ok(None);
        }
        let text = String::from_utf8_lossy(&line).trim().to_string();
        if !text.is_empty() {
            break text;
        }
    };

    if first.starts_with('{') || first.starts_with('[') {
        return Ok(Some(decode(first.as_bytes())));
    }

    let mut content_length = None;
    let mut header = first;
    loop {
        match header.split_once(':') {
            Some((name, value)) if name.trim().eq_ignore_ascii_case("content-length") => {
                match value.trim().parse::<usize>() {
                    Ok(n) => content_length = Some(n),
                    Err(_) => {
                        return Ok(Some(Frame::Malformed(format!(
                            "bad Content-Length: {}",
                            value.trim()
                        ))))
                    }
                }
            }
            Some(_) => {}
            None => return Ok(Some(Frame::Malformed(format!("bad header line: {}", header)))),
        }

        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            return Ok(None);
        }
        header = String::from_utf8_lossy(&line).trim().to_string();
        if header.is_empty() {
            break;
        }
    }

    let Some(length) = content_length else {
        return Ok(Some(Frame::Malformed("missing Content-Length".to_string())));
    };

    if length > MAX_FRAME_BYTES {
        // Drain the body so the next frame starts cleanly
        io::copy(&mut (&mut *reader).take(length as u64), &mut io::sink())?;
        return Ok(Some(Frame::Malformed(format!(
            "frame of {} bytes exceeds limit",
            length
        ))));
    }

    let mut body = vec![0u8; length];
    match reader.read_exact(&mut body) {
        Ok(()) => Ok(Some(decode(&body))),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(None),
        Err(e) => Err(e),
    }
}

fn decode(bytes: &[u8]) -> Frame {
    match serde_json::from_slice(bytes) {
        Ok(value) => Frame::Message(value),
        Err(e) => Frame::Malformed(format!("invalid JSON: {}", e)),
    }
}

/// Encode one outgoing frame
pub fn encode_frame<T: serde::Serialize>(message: &T) -> io::Result<Vec<u8>> {
    let body = serde_json::to_vec(message)?;
    let mut out = format!("Content-Length: {}\r\n\r\n", body.len()).into_bytes();
    out.extend_from_slice(&body);
    Ok(out)
}

/// Blocking request loop over a reader/writer pair
pub struct StdioServer<R, W> {
    registry: Arc<Registry>,
    reader: R,
    writer: W,
}

impl<R: BufRead, W: Write> StdioServer<R, W> {
    pub fn new(registry: Arc<Registry>, reader: R, writer: W) -> Self {
        Self {
            registry,
            reader,
            writer,
        }
    }

    /// Serve until end of input
    pub fn run(mut self) -> io::Result<()> {
        self.send_init_burst()?;

        let mut errors = 0;
        loop {
            let frame = match read_frame(&mut self.reader) {
                Ok(None) => break,
                Ok(Some(frame)) => {
                    errors = 0;
                    frame
                }
                Err(e) => {
                    errors += 1;
                    if errors >= MAX_CONSECUTIVE_ERRORS {
                        warn!("Giving up after {} consecutive read errors: {}", errors, e);
                        break;
                    }
                    Frame::Malformed(format!("read error: {}", e))
                }
            };

            match frame {
                Frame::Message(Value::Array(items)) => self.handle_batch(items)?,
                Frame::Message(value) => self.handle_message(value)?,
                Frame::Malformed(reason) => {
                    warn!("Malformed frame ({}), answering with initialize", reason);
                    let response = Response::from_result(
                        Value::Null,
                        self.registry.call("initialize", &json!({})),
                    );
                    self.send(&response)?;
                    self.send_discovery()?;
                }
            }
        }

        info!("stdio input closed");
        Ok(())
    }

    fn handle_message(&mut self, value: Value) -> io::Result<()> {
        let request = match Request::from_value(value) {
            Ok(request) => request,
            Err(invalid) => return self.send(&invalid),
        };
        debug!(method = %request.method, "stdio request");

        if let Some(response) = self.registry.handle(&request) {
            self.send(&response)?;
            if request.method == "initialize" {
                self.send_discovery()?;
            }
        }
        Ok(())
    }

    fn handle_batch(&mut self, items: Vec<Value>) -> io::Result<()> {
        if items.is_empty() {
            let response = Response::error(
                Value::Null,
                super::jsonrpc::RpcError::invalid_request("Empty batch"),
            );
            return self.send(&response);
        }

        let responses: Vec<Response> = items
            .into_iter()
            .filter_map(|item| match Request::from_value(item) {
                Ok(request) => self.registry.handle(&request),
                Err(invalid) => Some(invalid),
            })
            .collect();

        if responses.is_empty() {
            return Ok(());
        }
        self.send(&responses)
    }

    fn send_init_burst(&mut self) -> io::Result<()> {
        let descriptor = capability_descriptor(&self.registry, SUPPORTED_PROTOCOL_VERSIONS[0]);
        self.send(&Request::notification("capabilities", descriptor))?;
        self.send_discovery()
    }

    fn send_discovery(&mut self) -> io::Result<()> {
        for method in DISCOVERY_NOTIFICATIONS {
            self.send(&Request::notification(*method, json!({})))?;
        }
        Ok(())
    }

    fn send<T: serde::Serialize>(&mut self, message: &T) -> io::Result<()> {
        let frame = encode_frame(message)?;
        self.writer.write_all(&frame)?;
        self.writer.flush()
    }
}

/// Serve the registry over the process's stdin/stdout
pub fn run_stdio(registry: Arc<Registry>) -> anyhow::Result<()> {
    info!("smf stdio server starting");

    let stdin = io::stdin();
    let stdout = io::stdout();
    StdioServer::new(registry, stdin.lock(), stdout.lock()).run()?;

    info!("smf stdio server stopping");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::handlers::testing;
    use crate::mcp::jsonrpc::INVALID_REQUEST;
    use std::io::Cursor;

    fn frame(value: &Value) -> Vec<u8> {
        encode_frame(value).unwrap()
    }

    /// Run the server over `input` and decode everything it wrote
    fn run(input: Vec<u8>) -> Vec<Value> {
        let (_dir, registry) = testing::registry();
        let mut output = Vec::new();
        StdioServer::new(Arc::new(registry), Cursor::new(input), &mut output)
            .run()
            .unwrap();

        let mut reader = Cursor::new(output);
        let mut messages = Vec::new();
        while let Some(frame) = read_frame(&mut reader).unwrap() {
            match frame {
                Frame::Message(v) => messages.push(v),
                Frame::Malformed(reason) => panic!("server wrote malformed frame: {}", reason),
            }
        }
        messages
    }

    fn methods(messages: &[Value]) -> Vec<&str> {
        messages.iter().filter_map(|m| m["method"].as_str()).collect()
    }

    #[test]
    fn test_init_burst_on_empty_input() {
        let messages = run(Vec::new());
        assert_eq!(
            methods(&messages),
            vec![
                "capabilities",
                "notifications/tools/list_changed",
                "notifications/prompts/list_changed",
                "notifications/resources/list_changed",
            ]
        );
        assert!(messages[0]["params"]["tools"].is_array());
        assert!(messages.iter().all(|m| m.get("id").is_none()));
    }

    #[test]
    fn test_framed_request() {
        let input = frame(&json!({"jsonrpc": "2.0", "id": 1, "method": "ping"}));
        let messages = run(input);

        assert_eq!(messages.len(), 5);
        assert_eq!(messages[4], json!({"jsonrpc": "2.0", "id": 1, "result": {}}));
    }

    #[test]
    fn test_newline_delimited_fallback() {
        let input = b"\n{\"jsonrpc\":\"2.0\",\"id\":\"a\",\"method\":\"ping\"}\n".to_vec();
        let messages = run(input);
        assert_eq!(messages.last().unwrap()["id"], "a");
    }

    #[test]
    fn test_initialize_resends_discovery() {
        let input = frame(&json!({"jsonrpc": "2.0", "id": 1, "method": "initialize",
                                  "params": {"protocolVersion": "2024-11-05"}}));
        let messages = run(input);

        assert_eq!(messages[4]["result"]["protocolVersion"], "2024-11-05");
        assert_eq!(
            methods(&messages[5..]),
            vec![
                "notifications/tools/list_changed",
                "notifications/prompts/list_changed",
                "notifications/resources/list_changed",
            ]
        );
    }

    #[test]
    fn test_malformed_frame_gets_synthetic_initialize() {
        let mut input = b"Content-Length: 5\r\n\r\n{oops".to_vec();
        input.extend(frame(&json!({"jsonrpc": "2.0", "id": 2, "method": "ping"})));
        let messages = run(input);

        let responses: Vec<_> = messages.iter().filter(|m| m.get("method").is_none()).collect();
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["id"], Value::Null);
        assert!(responses[0]["result"]["serverInfo"].is_object());
        assert_eq!(responses[1]["id"], 2);
    }

    #[test]
    fn test_notifications_get_no_reply() {
        let input = frame(&json!({"jsonrpc": "2.0", "method": "notifications/initialized"}));
        assert_eq!(run(input).len(), 4);
    }

    #[test]
    fn test_invalid_envelope() {
        let input = frame(&json!({"jsonrpc": "2.0", "id": 3}));
        let messages = run(input);
        assert_eq!(messages[4]["error"]["code"], INVALID_REQUEST);
        assert_eq!(messages[4]["id"], 3);
    }

    #[test]
    fn test_read_frame_extra_headers_and_missing_length() {
        let mut input = Cursor::new(
            b"Content-Type: application/vscode-jsonrpc\r\ncontent-length: 2\r\n\r\n{}".to_vec(),
        );
        assert_eq!(read_frame(&mut input).unwrap(), Some(Frame::Message(json!({}))));
        assert_eq!(read_frame(&mut input).unwrap(), None);

        let mut input = Cursor::new(b"X-Thing: 1\r\n\r\n{}".to_vec());
        assert!(matches!(read_frame(&mut input).unwrap(), Some(Frame::Malformed(_))));
    }

    #[test]
    fn test_read_frame_oversized_is_drained() {
        let length = MAX_FRAME_BYTES + 1;
        let mut input = format!("Content-Length: {}\r\n\r\n", length).into_bytes();
        input.extend(std::iter::repeat(b' ').take(length));
        input.extend(b"{\"id\":1}\n");

        let mut reader = Cursor::new(input);
        assert!(matches!(read_frame(&mut reader).unwrap(), Some(Frame::Malformed(_))));
        assert_eq!(
            read_frame(&mut reader).unwrap(),
            Some(Frame::Message(json!({"id": 1})))
        );
    }

    #[test]
    fn test_truncated_body_is_eof() {
        let mut input = Cursor::new(b"Content-Length: 50\r\n\r\n{\"a\":".to_vec());
        assert_eq!(read_frame(&mut input).unwrap(), None);
    }
}

//! Stdio JSON-RPC transport.
//!
//! Deliberately thin: Content-Length framing, request dispatch into the
//! server's feature handlers, and diagnostics publication. Anything
//! protocol-shaped beyond that (capability negotiation detail, partial
//! results, progress) is out of scope — the editor side tolerates a
//! minimal server.

use std::io::{self, BufRead, Write};
use std::sync::{Arc, Mutex};

use couleuvre_core::protocol::Position;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::scheduler::DiagnosticsSink;
use crate::server::Server;

// ============================================================================
// Framing
// ============================================================================

/// Read one framed message; `None` on clean end of stream.
pub fn read_message<R: BufRead>(reader: &mut R) -> io::Result<Option<Value>> {
    let mut content_length: Option<usize> = None;
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some(value) = line.strip_prefix("Content-Length:") {
            content_length = value.trim().parse().ok();
        }
        // Content-Type headers are read and ignored.
    }

    let length = content_length
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "missing Content-Length"))?;
    let mut body = vec![0u8; length];
    reader.read_exact(&mut body)?;
    let message = serde_json::from_slice(&body)
        .map_err(|error| io::Error::new(io::ErrorKind::InvalidData, error))?;
    Ok(Some(message))
}

/// Shared framed writer; notifications and responses interleave safely.
#[derive(Clone)]
pub struct MessageWriter {
    inner: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl MessageWriter {
    /// Wrap a raw writer.
    pub fn new(writer: Box<dyn Write + Send>) -> MessageWriter {
        MessageWriter {
            inner: Arc::new(Mutex::new(writer)),
        }
    }

    /// Write one framed message.
    pub fn write(&self, message: &Value) {
        let body = message.to_string();
        let mut writer = self.inner.lock().expect("writer lock");
        let result = write!(writer, "Content-Length: {}\r\n\r\n{}", body.len(), body)
            .and_then(|_| writer.flush());
        if let Err(error) = result {
            warn!(%error, "failed to write message");
        }
    }

    /// Respond to a request.
    fn respond(&self, id: Value, result: Value) {
        self.write(&json!({"jsonrpc": "2.0", "id": id, "result": result}));
    }

    /// Respond with an error.
    fn respond_error(&self, id: Value, code: i64, message: &str) {
        self.write(&json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": {"code": code, "message": message},
        }));
    }
}

/// Diagnostics go out as `textDocument/publishDiagnostics`.
impl DiagnosticsSink for MessageWriter {
    fn publish(&self, uri: &str, diagnostics: Vec<couleuvre_core::protocol::Diagnostic>) {
        self.write(&json!({
            "jsonrpc": "2.0",
            "method": "textDocument/publishDiagnostics",
            "params": {"uri": uri, "diagnostics": diagnostics},
        }));
    }
}

// ============================================================================
// Dispatch
// ============================================================================

fn position_of(params: &Value) -> Option<Position> {
    let position = params.get("position")?;
    Some(Position::new(
        position.get("line")?.as_u64()? as u32,
        position.get("character")?.as_u64()? as u32,
    ))
}

fn document_uri(params: &Value) -> Option<&str> {
    params.get("textDocument")?.get("uri")?.as_str()
}

fn capabilities() -> Value {
    json!({
        "capabilities": {
            "textDocumentSync": 1,
            "definitionProvider": true,
            "referencesProvider": true,
            "documentSymbolProvider": true,
            "completionProvider": {"triggerCharacters": ["."]},
        },
        "serverInfo": {"name": "couleuvre", "version": env!("CARGO_PKG_VERSION")},
    })
}

/// Run the protocol loop until `exit` or end of stream.
pub fn run<R: BufRead>(server: &Server, reader: &mut R, writer: &MessageWriter) -> io::Result<()> {
    info!("protocol loop started");
    while let Some(message) = read_message(reader)? {
        let method = message.get("method").and_then(Value::as_str).unwrap_or("");
        let id = message.get("id").cloned();
        let params = message.get("params").cloned().unwrap_or(Value::Null);

        match (method, id) {
            ("initialize", Some(id)) => {
                let root = params
                    .get("rootUri")
                    .and_then(Value::as_str)
                    .and_then(couleuvre_core::uri::to_fs_path);
                server.set_workspace_root(root);
                writer.respond(id, capabilities());
            }
            ("initialized", None) => {}
            ("shutdown", Some(id)) => writer.respond(id, Value::Null),
            ("exit", None) => {
                info!("exit received");
                break;
            }

            ("textDocument/didOpen", None) => {
                if let (Some(uri), Some(text)) = (
                    params.pointer("/textDocument/uri").and_then(Value::as_str),
                    params.pointer("/textDocument/text").and_then(Value::as_str),
                ) {
                    server.did_open(uri, text);
                }
            }
            ("textDocument/didChange", None) => {
                // Full-document sync: the last change entry carries the
                // entire text.
                let text = params
                    .get("contentChanges")
                    .and_then(Value::as_array)
                    .and_then(|changes| changes.last())
                    .and_then(|change| change.get("text"))
                    .and_then(Value::as_str);
                if let (Some(uri), Some(text)) = (
                    params.pointer("/textDocument/uri").and_then(Value::as_str),
                    text,
                ) {
                    server.did_change(uri, text);
                }
            }
            ("textDocument/didClose", None) => {
                if let Some(uri) = params.pointer("/textDocument/uri").and_then(Value::as_str) {
                    server.did_close(uri);
                }
            }

            ("textDocument/definition", Some(id)) => {
                let result = document_uri(&params)
                    .zip(position_of(&params))
                    .and_then(|(uri, position)| server.definition(uri, position));
                match result {
                    Some(location) => writer.respond(id, json!(location)),
                    None => writer.respond(id, Value::Null),
                }
            }
            ("textDocument/references", Some(id)) => {
                let include_declaration = params
                    .pointer("/context/includeDeclaration")
                    .and_then(Value::as_bool)
                    .unwrap_or(false);
                let locations = document_uri(&params)
                    .zip(position_of(&params))
                    .map(|(uri, position)| server.references(uri, position, include_declaration))
                    .unwrap_or_default();
                writer.respond(id, json!(locations));
            }
            ("textDocument/documentSymbol", Some(id)) => {
                let symbols = document_uri(&params)
                    .map(|uri| server.document_symbols(uri))
                    .unwrap_or_default();
                writer.respond(id, json!(symbols));
            }
            ("textDocument/completion", Some(id)) => {
                let items = document_uri(&params)
                    .zip(position_of(&params))
                    .map(|(uri, position)| server.completion(uri, position))
                    .unwrap_or_default();
                writer.respond(id, json!(items));
            }

            (method, Some(id)) => {
                debug!(method, "unsupported request");
                writer.respond_error(id, -32601, &format!("method not found: {}", method));
            }
            (method, None) => {
                debug!(method, "notification ignored");
            }
        }
    }
    Ok(())
}

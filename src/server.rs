//! Line-delimited JSON-RPC 2.0 server over stdio.
//!
//! One request per line, one response per line. The only method is
//! `validate`, taking `{ "path": string }` or `{ "text": string, "path"?: string }`
//! and returning the validation result object.

use crate::engine::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::{BufRead, Write};
use std::path::Path;

pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;

#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
}

impl JsonRpcResponse {
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Option<Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ValidateParams {
    path: Option<String>,
    text: Option<String>,
}

/// Handle one request line.
pub fn handle_message(engine: &Engine, message: &str) -> JsonRpcResponse {
    let request: JsonRpcRequest = match serde_json::from_str(message) {
        Ok(r) => r,
        Err(e) => return JsonRpcResponse::error(None, PARSE_ERROR, e.to_string()),
    };
    let id = request.id.clone();
    if request.jsonrpc != "2.0" {
        return JsonRpcResponse::error(id, INVALID_REQUEST, "jsonrpc must be \"2.0\"");
    }

    match request.method.as_str() {
        "validate" => validate(engine, id, request.params),
        other => JsonRpcResponse::error(id, METHOD_NOT_FOUND, format!("Unknown method: {}", other)),
    }
}

fn validate(engine: &Engine, id: Option<Value>, params: Value) -> JsonRpcResponse {
    let params: ValidateParams = match serde_json::from_value(params) {
        Ok(p) => p,
        Err(e) => return JsonRpcResponse::error(id, INVALID_PARAMS, e.to_string()),
    };
    let result = match (params.text, params.path) {
        (Some(text), path) => engine.validate_text(&text, path.as_deref().map(Path::new)),
        (None, Some(path)) => engine.validate_path(Path::new(&path)),
        (None, None) => {
            return JsonRpcResponse::error(id, INVALID_PARAMS, "expected \"path\" or \"text\"")
        }
    };
    match serde_json::to_value(result) {
        Ok(v) => JsonRpcResponse::success(id, v),
        Err(e) => JsonRpcResponse::error(id, INTERNAL_ERROR, format!("Serialization error: {}", e)),
    }
}

/// Serve requests from `input` until it is exhausted.
pub fn serve<R: BufRead, W: Write>(engine: &Engine, input: R, mut output: W) -> anyhow::Result<()> {
    tracing::info!("Server started, waiting for requests");
    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        tracing::debug!("<- {} bytes", line.len());
        let response = handle_message(engine, &line);
        let out = serde_json::to_string(&response)?;
        writeln!(output, "{}", out)?;
        output.flush()?;
    }
    tracing::info!("Server shutting down");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ExternalCache;
    use crate::config::EngineConfig;
    use crate::loader::MemoryLoader;
    use std::sync::Arc;

    fn engine() -> Engine {
        let loader = MemoryLoader::new().with_file(
            "/rules/a.yaml",
            "$meta:\n  name: 'a'\n  purpose: \"A\"\n  version: 1.0\n  spec: 'x'\n  domains: ['core']\n",
        );
        Engine::with_loader(EngineConfig::default(), Arc::new(loader), Arc::new(ExternalCache::new()))
    }

    fn round_trip(engine: &Engine, request: &str) -> Value {
        serde_json::to_value(handle_message(engine, request)).unwrap()
    }

    #[test]
    fn test_validate_text() {
        let response = round_trip(
            &engine(),
            r#"{"jsonrpc":"2.0","id":1,"method":"validate","params":{"text":"a: 1\n"}}"#,
        );
        assert_eq!(response["id"], 1);
        assert_eq!(response["result"]["valid"], false);
        assert!(response["result"]["correctedText"].is_string());
    }

    #[test]
    fn test_validate_path() {
        let response = round_trip(
            &engine(),
            r#"{"jsonrpc":"2.0","id":"x","method":"validate","params":{"path":"/rules/a.yaml"}}"#,
        );
        assert_eq!(response["result"]["valid"], true);
    }

    #[test]
    fn test_error_codes() {
        let engine = engine();
        assert_eq!(round_trip(&engine, "{not json")["error"]["code"], PARSE_ERROR);
        assert_eq!(
            round_trip(&engine, r#"{"jsonrpc":"2.0","id":1,"method":"lint"}"#)["error"]["code"],
            METHOD_NOT_FOUND
        );
        assert_eq!(
            round_trip(&engine, r#"{"jsonrpc":"2.0","id":1,"method":"validate","params":{}}"#)["error"]["code"],
            INVALID_PARAMS
        );
        assert_eq!(
            round_trip(&engine, r#"{"jsonrpc":"2.0","id":1,"method":"validate","params":{"txt":"a"}}"#)
                ["error"]["code"],
            INVALID_PARAMS
        );
    }

    #[test]
    fn test_serve_loop() {
        let input = "\n{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"nope\"}\n";
        let mut output = Vec::new();
        serve(&engine(), input.as_bytes(), &mut output).unwrap();
        let text = String::from_utf8(output).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(text.contains("-32601"));
    }
}

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bugzilla_mcp::protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
use bugzilla_mcp::{McpServer, RequestHeaders};
use serde_json::Value;
use std::sync::Arc;
use tracing::Instrument;

/// Handle one JSON-RPC message posted to the MCP endpoint
pub async fn handle_mcp(
    State(server): State<Arc<McpServer>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let message: Value = match serde_json::from_slice(&body) {
        Ok(message) => message,
        Err(e) => {
            tracing::debug!("Malformed JSON-RPC body: {}", e);
            return rpc_error(Value::Null, JsonRpcError::parse_error());
        }
    };

    let id = message.get("id").cloned().unwrap_or(Value::Null);
    let request: JsonRpcRequest = match serde_json::from_value(message) {
        Ok(request) => request,
        Err(e) => {
            tracing::debug!("Invalid JSON-RPC request: {}", e);
            return rpc_error(id, JsonRpcError::invalid_request());
        }
    };

    let headers = request_headers(&headers);
    let span = tracing::info_span!(
        "mcp",
        request_id = %uuid::Uuid::new_v4(),
        method = %request.method,
    );

    match server.handle(request, &headers).instrument(span).await {
        Some(response) => (StatusCode::OK, Json(response)).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

fn rpc_error(id: Value, error: JsonRpcError) -> Response {
    (StatusCode::OK, Json(JsonRpcResponse::error(id, error))).into_response()
}

/// Headers with non-UTF-8 values are dropped.
fn request_headers(headers: &HeaderMap) -> RequestHeaders {
    RequestHeaders::from_pairs(headers.iter().filter_map(|(name, value)| {
        value
            .to_str()
            .ok()
            .map(|value| (name.as_str(), value.to_string()))
    }))
}

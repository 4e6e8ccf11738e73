//! # MCP Handler Module
//!
//! Implements the Model Context Protocol surface of the transaction analyzer.
//!
//! ## Supported Tools
//!
//! - `simulate-transaction` - simulate an EVM call against forked state,
//!   enrich the result with live balances and decoded function name, and
//!   return a natural-language risk summary alongside the structured analysis.
//!
//! The tool can also be invoked directly as a JSON-RPC method of the same
//! name; such requests are rewritten into `tools/call`.

use serde_json::{json, Value};
use tracing::{info, warn};

use crate::{
    mcp::{
        protocol::{error_codes, Request, Response},
        simulate::{simulate_transaction, SimulateTransactionArgs},
    },
    AppState,
};

pub const SIMULATE_TRANSACTION: &str = "simulate-transaction";
pub const SERVER_NAME: &str = "evm_tx_analyzer";
pub const PROTOCOL_VERSION: &str = "2025-06-18";

/// This is the main dispatcher for all incoming MCP requests.
pub async fn handle_mcp_request(req: Request, state: AppState) -> Option<Response> {
    info!("Handling MCP request for method: {}", req.method);

    if req.is_notification() {
        return None;
    }

    let response = match req.method.as_str() {
        "initialize" => handle_initialize(&req),
        "ping" => Response::success(req.id.clone(), json!({})),
        "tools/list" => handle_tools_list(&req),
        "tools/call" => handle_tool_call(req, state).await,
        SIMULATE_TRANSACTION => {
            let wrapped = Request {
                jsonrpc: req.jsonrpc.clone(),
                id: req.id.clone(),
                method: "tools/call".to_string(),
                params: Some(json!({
                    "name": SIMULATE_TRANSACTION,
                    "arguments": req.params.clone().unwrap_or_else(|| json!({}))
                })),
            };
            handle_tool_call(wrapped, state).await
        }
        _ => Response::error(
            req.id,
            error_codes::METHOD_NOT_FOUND,
            format!("Method not found: {}", req.method),
        ),
    };

    Some(response)
}

/// Handles a 'tools/call' request by dispatching it to the correct tool logic.
async fn handle_tool_call(req: Request, state: AppState) -> Response {
    let params = match req.params.as_ref() {
        Some(p) => p,
        None => {
            return Response::error(
                req.id,
                error_codes::INVALID_PARAMS,
                "Missing 'params' object".into(),
            )
        }
    };

    let tool_name = match params.get("name").and_then(|n| n.as_str()) {
        Some(name) => name,
        None => {
            return Response::error(
                req.id,
                error_codes::INVALID_PARAMS,
                "Missing 'name' field in params".into(),
            )
        }
    };
    let args = params.get("arguments").cloned().unwrap_or_else(|| json!({}));

    match tool_name {
        SIMULATE_TRANSACTION => {
            let args: SimulateTransactionArgs = match serde_json::from_value(args) {
                Ok(args) => args,
                Err(e) => {
                    warn!("Rejected {} arguments: {}", SIMULATE_TRANSACTION, e);
                    return Response::error(
                        req.id,
                        error_codes::INVALID_PARAMS,
                        format!("Invalid arguments for '{}': {}", SIMULATE_TRANSACTION, e),
                    );
                }
            };
            let result = simulate_transaction(&state, args).await;
            Response::success(req.id, result)
        }
        other => Response::error(
            req.id,
            error_codes::INVALID_PARAMS,
            format!("Unknown tool: {}", other),
        ),
    }
}

fn handle_initialize(req: &Request) -> Response {
    let server_info = json!({
        "name": SERVER_NAME,
        "version": env!("CARGO_PKG_VERSION")
    });
    let capabilities = json!({ "tools": { "listChanged": false } });
    let instructions = "Simulates EVM transactions before they are signed and explains, in plain \
        language, what they would do: token movements, balances, the called function and any \
        failure reason.";

    Response::success(
        req.id.clone(),
        json!({
            "serverInfo": server_info,
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": capabilities,
            "instructions": instructions
        }),
    )
}

fn simulate_transaction_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "networkId": {"type": "string", "description": "Numeric network id (e.g. '1' for Ethereum mainnet, '137' for Polygon)."},
            "from": {"type": "string", "description": "0x... sender address."},
            "to": {"type": "string", "description": "0x... contract or recipient address."},
            "value": {"type": "string", "description": "Native currency to send, in ether (e.g. '0.5'). Defaults to 0."},
            "data": {"type": "string", "description": "0x... call data. Calls without data are not simulated."},
            "useEmojis": {"type": "boolean", "description": "Allow emojis in the summary. Defaults to true."}
        },
        "required": ["networkId", "from", "to"],
        "additionalProperties": false
    })
}

/// Handles the 'tools/list' request by returning a JSON definition of all available tools.
fn handle_tools_list(req: &Request) -> Response {
    let tools = json!([
        {
            "name": SIMULATE_TRANSACTION,
            "description": "Simulate an EVM transaction without sending it and get a human readable \
                safety analysis: token and balance changes, decoded function, gas used and failure reasons.",
            "inputSchema": simulate_transaction_schema()
        }
    ]);
    Response::success(req.id.clone(), json!({ "tools": tools }))
}

// src/mcp/simulate.rs

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, info};

use super::protocol::tool_text_result;
use crate::analysis::{process_transaction_data, TransactionAnalysis};
use crate::simulation::SimulationRequest;
use crate::AppState;

/// Call data of a plain value transfer.
pub const EMPTY_CALL_DATA: &str = "0x";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulateTransactionArgs {
    pub network_id: String,
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub use_emojis: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationOutcome {
    pub ai_interpretation: Option<String>,
    pub pre_processed_result: Option<TransactionAnalysis>,
}

/// Simulate, analyse and summarize. Calls without input data are not
/// simulated and yield an empty outcome.
pub async fn run_simulation(state: &AppState, args: SimulateTransactionArgs) -> Result<SimulationOutcome> {
    let data = args
        .data
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| EMPTY_CALL_DATA.to_string());
    if data == EMPTY_CALL_DATA {
        info!("No call data for {}, skipping simulation", args.to);
        return Ok(SimulationOutcome {
            ai_interpretation: None,
            pre_processed_result: None,
        });
    }
    let use_emojis = args.use_emojis.unwrap_or(true);

    let request = SimulationRequest {
        network_id: args.network_id,
        from: args.from,
        to: args.to,
        value: args.value,
        data,
    };
    let simulation = state.simulator.simulate(&request).await?;
    let analysis =
        process_transaction_data(&simulation, state.connections.as_ref(), &state.signatures).await?;
    let interpretation = state.summarizer.summarize(&analysis, use_emojis).await?;

    Ok(SimulationOutcome {
        ai_interpretation: Some(interpretation),
        pre_processed_result: Some(analysis),
    })
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// `simulate-transaction` tool body. Failures come back as a
/// `{success: false, error}` text block flagged `isError`.
pub async fn simulate_transaction(state: &AppState, args: SimulateTransactionArgs) -> Value {
    let outcome = run_simulation(state, args)
        .await
        .and_then(|outcome| serde_json::to_value(outcome).map_err(Into::into));

    match outcome {
        Ok(payload) => tool_text_result(pretty(&payload), false),
        Err(e) => {
            error!("simulate-transaction failed: {:#}", e);
            let payload = json!({ "success": false, "error": format!("{:#}", e) });
            tool_text_result(pretty(&payload), true)
        }
    }
}

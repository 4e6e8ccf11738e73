// src/simulation/tenderly.rs

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use ethers::utils::parse_ether;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::models::{SimulationRequest, SimulationResult};
use crate::config::Config;

const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// Executes a transaction against forked chain state.
#[async_trait]
pub trait Simulator: Send + Sync {
    async fn simulate(&self, request: &SimulationRequest) -> Result<SimulationResult>;
}

#[derive(Clone, Debug)]
pub struct TenderlyClient {
    client: Client,
    api_url: String,
    account: Option<String>,
    project: Option<String>,
    api_key: Option<String>,
}

impl TenderlyClient {
    pub fn new(client: Client, config: &Config) -> Self {
        Self {
            client,
            api_url: config.tenderly_api_url.clone(),
            account: config.tenderly_account.clone(),
            project: config.tenderly_project.clone(),
            api_key: config.tenderly_api_key.clone(),
        }
    }

    fn simulate_url(&self) -> Result<String> {
        let account = self
            .account
            .as_deref()
            .ok_or_else(|| anyhow!("TENDERLY_ACCOUNT is not configured"))?;
        let project = self
            .project
            .as_deref()
            .ok_or_else(|| anyhow!("TENDERLY_PROJECT is not configured"))?;
        Ok(format!(
            "{}/account/{}/project/{}/simulate",
            self.api_url, account, project
        ))
    }
}

/// Body of a quick, saved simulation.
pub fn simulation_payload(request: &SimulationRequest) -> Result<Value> {
    let value = match request.value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => parse_ether(v)
            .map_err(|e| anyhow!("invalid value '{}': {}", v, e))?
            .to_string(),
        _ => "0".to_string(),
    };
    let from = if request.from.trim().is_empty() {
        ZERO_ADDRESS
    } else {
        request.from.as_str()
    };
    let input = if request.data.is_empty() { "0x" } else { request.data.as_str() };
    let body = input.strip_prefix("0x").unwrap_or(input);
    hex::decode(body).map_err(|e| anyhow!("invalid call data '{}': {}", input, e))?;

    Ok(json!({
        "network_id": request.network_id,
        "from": from,
        "to": request.to,
        "value": value,
        "input": input,
        "save": true,
        "save_if_fails": false,
        "simulation_type": "quick"
    }))
}

#[async_trait]
impl Simulator for TenderlyClient {
    async fn simulate(&self, request: &SimulationRequest) -> Result<SimulationResult> {
        let url = self.simulate_url()?;
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow!("TENDERLY_API_KEY is not configured"))?;
        let payload = simulation_payload(request)?;

        info!(
            "Simulating call to {} on network {}",
            request.to, request.network_id
        );
        let resp = self
            .client
            .post(&url)
            .header("X-Access-Key", api_key)
            .json(&payload)
            .send()
            .await
            .context("simulation request failed")?;

        let status = resp.status();
        let body: Value = resp
            .json()
            .await
            .context("simulation response is not JSON")?;
        if let Some(err) = body.get("error") {
            let message = err
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| err.to_string());
            return Err(anyhow!("simulation provider error: {}", message));
        }
        if !status.is_success() {
            return Err(anyhow!("simulation provider returned {}: {}", status, body));
        }

        debug!("Simulation finished with status {}", status);
        serde_json::from_value(body).context("unexpected simulation response shape")
    }
}

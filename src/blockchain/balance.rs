// src/blockchain/balance.rs

use anyhow::Result;
use tracing::debug;

use super::reader::ChainReader;
use super::units::{format_units, NATIVE_DECIMALS};

/// `balanceOf(holder)` on `token`, formatted with the token's decimals.
///
/// Read failures (non-token contract, RPC down) are returned to the caller.
pub async fn get_token_balance(
    reader: &dyn ChainReader,
    token: &str,
    holder: &str,
    decimals: u32,
) -> Result<String> {
    let raw = reader.token_balance(token, holder).await?;
    let formatted = format_units(raw, decimals);
    debug!("{} holds {} of {}", holder, formatted, token);
    Ok(formatted)
}

/// Native-currency balance of `address`, formatted in ether.
pub async fn get_native_balance(reader: &dyn ChainReader, address: &str) -> Result<String> {
    let raw = reader.native_balance(address).await?;
    Ok(format_units(raw, NATIVE_DECIMALS))
}

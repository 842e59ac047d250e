use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use ethers::types::{Address, Bytes, U256};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    chains::SupportedChain,
    error::GasOracleError,
    models::{ApiResponse, FeeResponse},
    services::{GasFeeRequest, GasFeeService},
};

#[derive(Clone)]
pub struct AppState {
    pub gas: Arc<GasFeeService>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GasFeeParams {
    pub chain_id: Option<u64>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub value: Option<String>,
    pub data: Option<String>,
}

pub async fn calculate_gas_fee(
    State(state): State<AppState>,
    Query(params): Query<GasFeeParams>,
) -> Result<Json<ApiResponse<FeeResponse>>, GasOracleError> {
    let request = params.into_request()?;
    let chain = request.chain;

    let response = state.gas.calculate(&request).await?;

    Ok(Json(ApiResponse {
        success: true,
        data: response,
        timestamp: Utc::now(),
        data_source: chain.name().to_string(),
        request_id: Uuid::new_v4().to_string(),
    }))
}

impl GasFeeParams {
    fn into_request(self) -> Result<GasFeeRequest, GasOracleError> {
        let chain_id = self
            .chain_id
            .ok_or_else(|| GasOracleError::InvalidRequest("chainId is required".into()))?;
        let chain = SupportedChain::try_from(chain_id)?;

        Ok(GasFeeRequest {
            chain,
            from: parse_address("from", self.from.as_deref())?,
            to: parse_address("to", self.to.as_deref())?,
            value: parse_value(self.value.as_deref())?,
            data: parse_data(self.data.as_deref())?,
        })
    }
}

fn parse_address(field: &str, raw: Option<&str>) -> Result<Option<Address>, GasOracleError> {
    raw.map(|raw| {
        raw.parse::<Address>()
            .map_err(|_| GasOracleError::InvalidRequest(format!("{field} is not a valid address")))
    })
    .transpose()
}

fn parse_value(raw: Option<&str>) -> Result<Option<U256>, GasOracleError> {
    raw.map(|raw| {
        U256::from_dec_str(raw).map_err(|_| {
            GasOracleError::InvalidRequest("value must be a decimal wei amount".into())
        })
    })
    .transpose()
}

fn parse_data(raw: Option<&str>) -> Result<Option<Bytes>, GasOracleError> {
    raw.map(|raw| {
        let stripped = raw.strip_prefix("0x").unwrap_or(raw);
        hex::decode(stripped)
            .map(Bytes::from)
            .map_err(|_| GasOracleError::InvalidRequest("data must be hex-encoded calldata".into()))
    })
    .transpose()
}

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum GasOracleError {
    #[error("unsupported chain id: {0}")]
    UnsupportedChain(u64),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("fee history field is empty: {0}")]
    EmptyFeeHistory(&'static str),

    #[error("reward history is empty")]
    EmptyRewardHistory,

    #[error("no usable reward samples at the {percentile}th percentile")]
    PriorityFeeUnavailable { percentile: u32 },

    #[error("RPC error: {0}")]
    RpcError(#[from] ethers::providers::ProviderError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub error_code: String,
    pub timestamp: chrono::DateTime<Utc>,
    pub request_id: String,
}

impl IntoResponse for GasOracleError {
    fn into_response(self) -> Response {
        let (status, error_code) = match &self {
            GasOracleError::UnsupportedChain(_) => (StatusCode::BAD_REQUEST, "UNSUPPORTED_CHAIN_ID"),
            GasOracleError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
            // Degenerate upstream data is an upstream problem, not ours
            GasOracleError::EmptyFeeHistory(_) | GasOracleError::EmptyRewardHistory => {
                (StatusCode::BAD_GATEWAY, "EMPTY_FEE_HISTORY")
            }
            GasOracleError::PriorityFeeUnavailable { .. } => {
                (StatusCode::BAD_GATEWAY, "PRIORITY_FEE_UNAVAILABLE")
            }
            GasOracleError::RpcError(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR"),
            GasOracleError::ConfigError(_) | GasOracleError::InternalError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        };

        let body = ErrorResponse {
            success: false,
            error: self.to_string(),
            error_code: error_code.to_string(),
            timestamp: Utc::now(),
            request_id: Uuid::new_v4().to_string(),
        };

        tracing::error!(
            error = ?self,
            error_code = error_code,
            "Request failed"
        );

        (status, Json(body)).into_response()
    }
}

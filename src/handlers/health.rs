use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use axum::{extract::State, Json};
use chrono::Utc;

use crate::{chains::SupportedChain, models::HealthStatus, services::EthereumService};

#[derive(Clone)]
pub struct HealthState {
    pub ethereum: Arc<EthereumService>,
    pub started_at: Instant,
}

pub async fn health_check(State(state): State<HealthState>) -> Json<HealthStatus> {
    let probes = SupportedChain::ALL.map(|chain| {
        let ethereum = state.ethereum.clone();
        async move { (chain, ethereum.ping(chain).await) }
    });
    let results = futures::future::join_all(probes).await;

    let chains: BTreeMap<String, bool> = results
        .iter()
        .map(|(chain, reachable)| (chain.name().to_string(), *reachable))
        .collect();

    let reachable = chains.values().filter(|ok| **ok).count();
    let status = if reachable == chains.len() {
        "healthy"
    } else if reachable > 0 {
        "degraded"
    } else {
        "unhealthy"
    };

    Json(HealthStatus {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        chains,
        uptime_seconds: state.started_at.elapsed().as_secs(),
        timestamp: Utc::now(),
    })
}

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use ethers::{
    providers::{Http, Middleware, Provider},
    types::{transaction::eip2718::TypedTransaction, U256},
};

use crate::{
    chains::SupportedChain,
    config::Config,
    engine::FeeHistoryProvider,
    error::GasOracleError,
    models::FeeHistory,
};

/// One JSON-RPC provider per supported chain.
pub struct EthereumService {
    clients: HashMap<SupportedChain, ChainClient>,
}

/// Handle for a single chain's provider. Implements the engine's
/// [`FeeHistoryProvider`] seam.
#[derive(Clone)]
pub struct ChainClient {
    chain: SupportedChain,
    provider: Arc<Provider<Http>>,
}

impl EthereumService {
    pub async fn new(config: &Config) -> Result<Self> {
        let mut clients = HashMap::new();
        for chain in SupportedChain::ALL {
            let url = config.rpc_url(chain);
            let provider = Arc::new(Provider::<Http>::try_from(url.as_str())?);
            clients.insert(chain, ChainClient { chain, provider });
        }

        // Test connection
        let block_number = clients[&SupportedChain::Mainnet]
            .provider
            .get_block_number()
            .await?;
        tracing::info!("Ethereum RPC connected, current block: {}", block_number);

        Ok(Self { clients })
    }

    pub fn client(&self, chain: SupportedChain) -> &ChainClient {
        &self.clients[&chain]
    }

    pub async fn estimate_gas(
        &self,
        chain: SupportedChain,
        tx: &TypedTransaction,
    ) -> Result<U256, GasOracleError> {
        self.client(chain)
            .provider
            .estimate_gas(tx, None)
            .await
            .map_err(Into::into)
    }

    pub async fn gas_price(&self, chain: SupportedChain) -> Result<U256, GasOracleError> {
        self.client(chain)
            .provider
            .get_gas_price()
            .await
            .map_err(Into::into)
    }

    pub async fn ping(&self, chain: SupportedChain) -> bool {
        self.client(chain).provider.get_block_number().await.is_ok()
    }
}

#[async_trait]
impl FeeHistoryProvider for ChainClient {
    async fn fee_history(
        &self,
        block_count: u64,
        reward_percentiles: &[f64],
    ) -> Result<FeeHistory, GasOracleError> {
        let history = self
            .provider
            .fee_history(
                block_count,
                ethers::types::BlockNumber::Latest,
                reward_percentiles,
            )
            .await?;

        tracing::debug!(
            chain = %self.chain,
            blocks = history.gas_used_ratio.len(),
            "Fetched fee history"
        );

        Ok(history.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn decodes_fee_history_from_rpc() {
        let mut server = mockito::Server::new_async().await;
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": {
                "oldestBlock": "0x1",
                "baseFeePerGas": ["0x6fc23ac00", "0x77359400", "0x7735940a"],
                "gasUsedRatio": [0.4, 0.9],
                "reward": [["0x3b9aca00"], ["0x77359400"]]
            }
        });
        let _mock = server
            .mock("POST", "/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create_async()
            .await;

        let provider = Arc::new(Provider::<Http>::try_from(server.url().as_str()).unwrap());
        let client = ChainClient {
            chain: SupportedChain::Mainnet,
            provider,
        };
        let history = client.fee_history(2, &[10.0]).await.unwrap();

        assert_eq!(history.base_fee_per_gas.len(), 3);
        assert_eq!(history.base_fee_per_gas[1], U256::from(2_000_000_000u64));
        assert_eq!(history.gas_used_ratio, vec![0.4, 0.9]);
        assert_eq!(history.reward.len(), 2);
        assert_eq!(history.reward[0][0], U256::from(1_000_000_000u64));
    }
}

use std::collections::HashMap;

use anyhow::{bail, Context, Result};

use crate::chains::SupportedChain;

#[derive(Debug, Clone)]
pub enum Environment {
    Development,
    Testnet,
    Production,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    pub host: String,
    pub port: u16,

    // RPC endpoints
    pub infura_api_key: String,
    pub rpc_overrides: HashMap<SupportedChain, String>,

    // Suggestion cache TTL, one mainnet block by default
    pub cache_ttl_seconds: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let environment = Self::parse_environment()?;

        let config = Self {
            environment: environment.clone(),
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3333".to_string())
                .parse()
                .context("Invalid PORT")?,

            infura_api_key: std::env::var("INFURA_KEY").context("INFURA_KEY required")?,
            rpc_overrides: Self::parse_rpc_overrides(),

            cache_ttl_seconds: std::env::var("CACHE_TTL_SECONDS")
                .unwrap_or_else(|_| "12".to_string())
                .parse()
                .context("Invalid CACHE_TTL_SECONDS")?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Resolves the RPC endpoint for a chain: an explicit override wins,
    /// otherwise the Infura endpoint for that network.
    pub fn rpc_url(&self, chain: SupportedChain) -> String {
        if let Some(url) = self.rpc_overrides.get(&chain) {
            return url.clone();
        }
        format!(
            "https://{}.infura.io/v3/{}",
            chain.infura_subdomain(),
            self.infura_api_key
        )
    }

    fn parse_environment() -> Result<Environment> {
        let env = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        match env.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "testnet" | "test" => Ok(Environment::Testnet),
            "production" | "prod" => Ok(Environment::Production),
            _ => bail!("Unknown environment: {}", env),
        }
    }

    fn parse_rpc_overrides() -> HashMap<SupportedChain, String> {
        let vars = [
            (SupportedChain::Mainnet, "RPC_URL_MAINNET"),
            (SupportedChain::Optimism, "RPC_URL_OPTIMISM"),
            (SupportedChain::Polygon, "RPC_URL_POLYGON"),
            (SupportedChain::ArbitrumOne, "RPC_URL_ARBITRUM"),
        ];
        vars.into_iter()
            .filter_map(|(chain, var)| std::env::var(var).ok().map(|url| (chain, url)))
            .collect()
    }

    fn validate(&self) -> Result<()> {
        if self.infura_api_key.trim().is_empty() {
            bail!("INFURA_KEY must not be empty");
        }
        for chain in SupportedChain::ALL {
            if !self.rpc_url(chain).starts_with("http") {
                bail!("RPC endpoint for {} must be an HTTP(S) URL", chain);
            }
        }
        if self.cache_ttl_seconds == 0 {
            bail!("CACHE_TTL_SECONDS must be at least 1");
        }

        tracing::info!(
            "Configuration validated for {:?} environment",
            self.environment
        );

        Ok(())
    }
}

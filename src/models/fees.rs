use std::collections::BTreeMap;

use ethers::types::U256;
use serde::{Deserialize, Serialize};

/// Qualitative direction of the base fee over the sampled window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BaseFeeTrend {
    Falling,
    Flat,
    Rising,
}

/// Output of the max-base-fee suggester.
#[derive(Debug, Clone)]
pub struct MaxFeeSuggestions {
    pub current_base_fee: U256,
    pub base_fee_suggestion: U256,
    pub base_fee_trend: BaseFeeTrend,
}

/// Output of the max-priority-fee suggester.
#[derive(Debug, Clone)]
pub struct MaxPriorityFeeSuggestions {
    pub priority_fee_suggestions: FeeTiers,
    pub confirmation_seconds_to_priority_fee: BTreeMap<u32, U256>,
}

/// A normal/fast/urgent triple of wei values. Used both for priority-fee
/// suggestions and for total-cost tiers in fee responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeTiers {
    #[serde(with = "u256_dec")]
    pub normal: U256,
    #[serde(with = "u256_dec")]
    pub fast: U256,
    #[serde(with = "u256_dec")]
    pub urgent: U256,
}

/// Merged engine output for one chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeSuggestion {
    #[serde(with = "u256_dec")]
    pub current_base_fee: U256,
    #[serde(with = "u256_dec")]
    pub base_fee_suggestion: U256,
    pub base_fee_trend: BaseFeeTrend,
    pub priority_fee_suggestions: FeeTiers,
    #[serde(with = "u256_dec_map")]
    pub confirmation_seconds_to_priority_fee: BTreeMap<u32, U256>,
}

/// Final per-chain fee calculation, shaped by how the chain prices
/// transactions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FeeResponse {
    #[serde(rename = "eip1559", rename_all = "camelCase")]
    Eip1559 {
        #[serde(with = "u256_dec")]
        gas_limit: U256,
        gas_fee: FeeTiers,
        #[serde(with = "u256_dec")]
        max_base_fee_per_gas: U256,
        max_priority_fee_per_gas: FeeTiers,
    },
    #[serde(rename = "legacy", rename_all = "camelCase")]
    Legacy {
        #[serde(with = "u256_dec")]
        gas_limit: U256,
        gas_fee: FeeTiers,
        gas_price: FeeTiers,
    },
}

/// Wei amounts cross the wire as decimal strings, never as JSON numbers
/// or hex.
pub mod u256_dec {
    use ethers::types::U256;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        let raw = String::deserialize(deserializer)?;
        U256::from_dec_str(&raw).map_err(de::Error::custom)
    }
}

/// Same decimal-string convention for the confirmation-latency map.
pub mod u256_dec_map {
    use std::collections::BTreeMap;

    use ethers::types::U256;
    use serde::{de, ser::SerializeMap, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        map: &BTreeMap<u32, U256>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut entries = serializer.serialize_map(Some(map.len()))?;
        for (seconds, fee) in map {
            entries.serialize_entry(seconds, &fee.to_string())?;
        }
        entries.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<u32, U256>, D::Error> {
        let raw = BTreeMap::<u32, String>::deserialize(deserializer)?;
        raw.into_iter()
            .map(|(seconds, fee)| {
                U256::from_dec_str(&fee)
                    .map(|fee| (seconds, fee))
                    .map_err(de::Error::custom)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn suggestion() -> FeeSuggestion {
        FeeSuggestion {
            current_base_fee: U256::from(30_000_000_000u64),
            base_fee_suggestion: U256::from(42_000_000_000u64),
            base_fee_trend: BaseFeeTrend::Rising,
            priority_fee_suggestions: FeeTiers {
                normal: U256::from(1_000_000_000u64),
                fast: U256::from(2_000_000_000u64),
                urgent: U256::from(3_000_000_000u64),
            },
            confirmation_seconds_to_priority_fee: BTreeMap::from([
                (15, U256::from(3_000_000_000u64)),
                (30, U256::from(2_000_000_000u64)),
                (45, U256::from(1_000_000_000u64)),
                (60, U256::from(500_000_000u64)),
            ]),
        }
    }

    #[test]
    fn fee_suggestion_wire_format() {
        let encoded = serde_json::to_value(suggestion()).unwrap();
        assert_eq!(
            encoded,
            json!({
                "currentBaseFee": "30000000000",
                "baseFeeSuggestion": "42000000000",
                "baseFeeTrend": "rising",
                "priorityFeeSuggestions": {
                    "normal": "1000000000",
                    "fast": "2000000000",
                    "urgent": "3000000000",
                },
                "confirmationSecondsToPriorityFee": {
                    "15": "3000000000",
                    "30": "2000000000",
                    "45": "1000000000",
                    "60": "500000000",
                },
            })
        );
    }

    #[test]
    fn fee_suggestion_round_trips() {
        let encoded = serde_json::to_string(&suggestion()).unwrap();
        let decoded: FeeSuggestion = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded.current_base_fee, suggestion().current_base_fee);
        assert_eq!(
            decoded.confirmation_seconds_to_priority_fee,
            suggestion().confirmation_seconds_to_priority_fee
        );
    }

    #[test]
    fn fee_response_is_tagged_by_type() {
        let legacy = FeeResponse::Legacy {
            gas_limit: U256::from(21_000u64),
            gas_fee: FeeTiers {
                normal: U256::from(10u64),
                fast: U256::from(12u64),
                urgent: U256::from(15u64),
            },
            gas_price: FeeTiers {
                normal: U256::from(1u64),
                fast: U256::from(2u64),
                urgent: U256::from(3u64),
            },
        };
        let encoded = serde_json::to_value(&legacy).unwrap();
        assert_eq!(encoded["type"], "legacy");
        assert_eq!(encoded["gasLimit"], "21000");
        assert_eq!(encoded["gasPrice"]["urgent"], "3");
    }
}

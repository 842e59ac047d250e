pub mod ethereum;
pub mod gas;

pub use ethereum::{ChainClient, EthereumService};
pub use gas::{GasFeeRequest, GasFeeService};

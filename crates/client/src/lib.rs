//! Account abstraction (ERC-4337) bundler submission pipeline
//!
//! This crate drives user operations end to end for one smart account:
//! building (init code and paymaster data resolution), EIP-712 signing,
//! submission to a bundler endpoint, and receipt polling with a bounded
//! timeout and cooperative cancellation.

pub mod bundler;
pub mod config;
pub mod errors;
pub mod handler;
pub mod receipt;

pub use bundler::BundlerClient;
pub use config::{FactoryConfig, GasConfig, PaymasterConfig, PaymasterDataProvider};
pub use errors::ClientError;
pub use handler::AccountHandler;
pub use receipt::AccountTransactionReceipt;

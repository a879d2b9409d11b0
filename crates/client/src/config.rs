//! Caller-supplied configuration consumed during the Building stage

use async_trait::async_trait;
use ethers::types::{Address, Bytes, U256};
use std::{fmt, sync::Arc, time::Duration};
use userop_primitives::{
    constants::bundler::{RECEIPT_POLL_INTERVAL_MS, RECEIPT_TIMEOUT_MS},
    UserOperation,
};

/// Counterfactual deployment configuration
#[derive(Clone, Debug)]
pub struct FactoryConfig {
    /// Account factory contract
    pub factory_address: Address,
    /// Owner the factory derives the account from
    pub owner: Address,
    /// Salt passed to `createAccount`
    pub salt: U256,
}

impl FactoryConfig {
    /// Factory configuration for the given owner and salt
    pub fn new(factory_address: Address, owner: Address, salt: U256) -> Self {
        Self { factory_address, owner, salt }
    }
}

/// Source of the data appended after the paymaster gas limits in
/// `paymasterAndData`
#[async_trait]
pub trait PaymasterDataProvider: Send + Sync {
    /// Computes paymaster data for the operation built so far
    async fn paymaster_data(&self, uo: &UserOperation) -> eyre::Result<Bytes>;
}

#[derive(Clone)]
enum PaymasterData {
    Static(Bytes),
    Provider(Arc<dyn PaymasterDataProvider>),
}

/// Paymaster sponsorship configuration
#[derive(Clone)]
pub struct PaymasterConfig {
    /// Paymaster contract sponsoring the operations
    pub address: Address,
    data: PaymasterData,
}

impl PaymasterConfig {
    /// Paymaster with fixed data bytes
    pub fn new(address: Address, data: Bytes) -> Self {
        Self { address, data: PaymasterData::Static(data) }
    }

    /// Paymaster whose data is computed per operation (e.g. a signed
    /// sponsorship voucher)
    pub fn with_provider(address: Address, provider: Arc<dyn PaymasterDataProvider>) -> Self {
        Self { address, data: PaymasterData::Provider(provider) }
    }

    /// Resolves the paymaster data for the operation built so far
    pub(crate) async fn resolve_data(&self, uo: &UserOperation) -> eyre::Result<Bytes> {
        match &self.data {
            PaymasterData::Static(data) => Ok(data.clone()),
            PaymasterData::Provider(provider) => provider.paymaster_data(uo).await,
        }
    }
}

impl fmt::Debug for PaymasterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = match &self.data {
            PaymasterData::Static(data) => format!("static({data})"),
            PaymasterData::Provider(_) => "provider".to_string(),
        };
        f.debug_struct("PaymasterConfig")
            .field("address", &self.address)
            .field("data", &data)
            .finish()
    }
}

/// Gas estimate margin and receipt-poll tuning
#[derive(Clone, Debug)]
pub struct GasConfig {
    /// Extra margin applied to bundler gas estimates, in percent
    pub estimate_buffer_percent: u64,
    /// Interval between receipt polls
    pub receipt_poll_interval: Duration,
    /// Wall-clock budget for the receipt wait
    pub receipt_timeout: Duration,
}

impl Default for GasConfig {
    fn default() -> Self {
        Self {
            estimate_buffer_percent: 10,
            receipt_poll_interval: Duration::from_millis(RECEIPT_POLL_INTERVAL_MS),
            receipt_timeout: Duration::from_millis(RECEIPT_TIMEOUT_MS),
        }
    }
}

impl GasConfig {
    /// Applies the configured margin to an estimate
    pub(crate) fn apply_buffer(&self, gas: U256) -> U256 {
        gas + gas * U256::from(self.estimate_buffer_percent) / U256::from(100u64)
    }
}

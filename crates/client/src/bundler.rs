//! JSON-RPC client for ERC-4337 bundler endpoints

use crate::errors::ClientError;
use ethers::{
    providers::{Http, JsonRpcClient, Provider},
    types::Address,
};
use serde_json::json;
use std::time::Duration;
use tracing::trace;
use userop_primitives::{
    provider::create_http_provider, RpcUserOperation, UserOperationGasEstimation,
    UserOperationHash, UserOperationReceipt,
};

/// Typed wrapper over a bundler's JSON-RPC endpoint. The underlying
/// transport is shared read-only; no state lives here.
#[derive(Clone, Debug)]
pub struct BundlerClient<C> {
    provider: Provider<C>,
}

impl BundlerClient<Http> {
    /// Connects to a bundler over HTTP
    pub fn new_http(url: &str) -> eyre::Result<Self> {
        Ok(Self::new(create_http_provider(url, Duration::from_millis(500))?))
    }
}

impl<C: JsonRpcClient> BundlerClient<C> {
    /// Wraps an existing provider pointing at a bundler endpoint
    pub fn new(provider: Provider<C>) -> Self {
        Self { provider }
    }

    /// Submits the user operation (eth_sendUserOperation) and returns the
    /// hash the bundler will index the operation under
    pub async fn send_user_operation(
        &self,
        uo: &RpcUserOperation,
        entry_point: &Address,
    ) -> Result<UserOperationHash, ClientError> {
        trace!("sending user operation to the bundler: {uo:?}");
        self.provider
            .request("eth_sendUserOperation", [json!(uo), json!(entry_point)])
            .await
            .map_err(ClientError::Bundler)
    }

    /// Asks the bundler for gas estimates
    /// (eth_estimateUserOperationGas); the operation may be unsigned
    pub async fn estimate_user_operation_gas(
        &self,
        uo: &RpcUserOperation,
        entry_point: &Address,
    ) -> Result<UserOperationGasEstimation, ClientError> {
        self.provider
            .request("eth_estimateUserOperationGas", [json!(uo), json!(entry_point)])
            .await
            .map_err(ClientError::Bundler)
    }

    /// Fetches the receipt (eth_getUserOperationReceipt); `None` until the
    /// operation is mined
    pub async fn get_user_operation_receipt(
        &self,
        hash: &UserOperationHash,
    ) -> Result<Option<UserOperationReceipt>, ClientError> {
        self.provider
            .request("eth_getUserOperationReceipt", [json!(hash)])
            .await
            .map_err(ClientError::Bundler)
    }
}

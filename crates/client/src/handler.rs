//! Submission pipeline for ERC-4337 user operations
//!
//! One handler instance drives operations for one smart account:
//! Building (init code + paymaster data) → Signing (EIP-712) → Submitted
//! (eth_sendUserOperation) → Polling (receipt wait with bounded timeout).
//! Stages are strictly ordered; each consumes the previous stage's output.

use crate::{
    bundler::BundlerClient,
    config::{FactoryConfig, GasConfig, PaymasterConfig},
    errors::ClientError,
    receipt::AccountTransactionReceipt,
};
use ethers::{
    providers::{JsonRpcClient, Middleware},
    types::{Address, Bytes, U256},
};
use std::sync::Arc;
use tokio::{
    sync::OnceCell,
    time::{sleep, Instant},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};
use userop_contracts::{encode_create_account, encode_execute, encode_execute_batch, Call};
use userop_primitives::{
    pack_init_code, PackedUserOperation, RpcUserOperation, UserOperation, UserOperationHash,
    UserOperationReceipt, Wallet,
};

/// Builds, signs, submits, and awaits user operations for one smart account
#[derive(Clone, Debug)]
pub struct AccountHandler<M, C> {
    /// Ethereum execution client
    eth_client: Arc<M>,
    /// Bundler endpoint the operations are submitted to
    bundler: BundlerClient<C>,
    /// The smart account the operations act for
    account: Address,
    /// Entry point contract address, also the EIP-712 verifying contract
    entry_point: Address,
    /// Wallet that signs the operations
    wallet: Wallet,
    /// Counterfactual deployment configuration
    factory: Option<FactoryConfig>,
    /// Paymaster sponsorship configuration
    paymaster: Option<PaymasterConfig>,
    /// Gas margin and receipt-poll tuning
    gas: GasConfig,
    /// Chain id, fetched once; concurrent first fetches all write the same
    /// value, so the race is benign
    chain_id: Arc<OnceCell<u64>>,
}

impl<M, C> AccountHandler<M, C>
where
    M: Middleware + 'static,
    C: JsonRpcClient,
{
    /// Create a new handler for the given account and entry point
    ///
    /// # Returns
    /// * `Self` - A new `AccountHandler` instance
    pub fn new(
        eth_client: Arc<M>,
        bundler: BundlerClient<C>,
        account: Address,
        entry_point: Address,
        wallet: Wallet,
    ) -> Self {
        Self {
            eth_client,
            bundler,
            account,
            entry_point,
            wallet,
            factory: None,
            paymaster: None,
            gas: GasConfig::default(),
            chain_id: Arc::new(OnceCell::new()),
        }
    }

    /// Configures counterfactual deployment through an account factory
    pub fn with_factory(mut self, factory: FactoryConfig) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Configures paymaster sponsorship
    pub fn with_paymaster(mut self, paymaster: PaymasterConfig) -> Self {
        self.paymaster = Some(paymaster);
        self
    }

    /// Overrides the gas margin and receipt-poll tuning
    pub fn with_gas_config(mut self, gas: GasConfig) -> Self {
        self.gas = gas;
        self
    }

    /// The smart account the handler acts for
    pub fn account(&self) -> Address {
        self.account
    }

    /// The entry point the operations are signed against
    pub fn entry_point(&self) -> Address {
        self.entry_point
    }

    async fn chain_id(&self) -> Result<u64, ClientError> {
        self.chain_id
            .get_or_try_init(|| async {
                let id = self
                    .eth_client
                    .get_chainid()
                    .await
                    .map_err(|err| ClientError::EthClient { inner: err.to_string() })?;
                Ok(id.as_u64())
            })
            .await
            .map(|id| *id)
    }

    /// Resolves the init code: an account with deployed code gets empty init
    /// code even when a factory is configured
    async fn resolve_init_code(&self) -> Result<Bytes, ClientError> {
        let Some(factory) = &self.factory else {
            return Ok(Bytes::default());
        };

        let code = self
            .eth_client
            .get_code(self.account, None)
            .await
            .map_err(|err| ClientError::EthClient { inner: err.to_string() })?;
        if !code.is_empty() {
            trace!("account {:?} already deployed, skipping factory", self.account);
            return Ok(Bytes::default());
        }

        let factory_data = encode_create_account(factory.owner, factory.salt);
        Ok(pack_init_code(factory.factory_address, &factory_data))
    }

    /// Building stage: assembles the unpacked operation around the given
    /// calldata, resolving init code and paymaster data
    pub async fn build_user_operation(
        &self,
        call_data: Bytes,
    ) -> Result<UserOperation, ClientError> {
        let init_code = self.resolve_init_code().await?;

        let mut uo = UserOperation::default()
            .sender(self.account)
            .init_code(init_code)
            .call_data(call_data);

        if let Some(paymaster) = &self.paymaster {
            let data = paymaster
                .resolve_data(&uo)
                .await
                .map_err(|err| ClientError::PaymasterData { inner: err.to_string() })?;
            uo = uo.paymaster(paymaster.address).paymaster_data(data);
        }

        trace!("built user operation for account {:?}: {uo:?}", self.account);
        Ok(uo)
    }

    /// Building + Signing stages: returns the packed, EIP-712-signed
    /// operation without submitting it
    pub async fn create_user_operation(
        &self,
        call_data: Bytes,
    ) -> Result<PackedUserOperation, ClientError> {
        let uo = self.build_user_operation(call_data).await?;
        let chain_id = self.chain_id().await?;
        let packed = self
            .wallet
            .sign_uo(&uo, &self.entry_point, chain_id)
            .map_err(|err| ClientError::Signer { inner: err.to_string() })?;
        debug!(
            "signed user operation, hash: {}",
            packed.hash(&self.entry_point, chain_id)
        );
        Ok(packed)
    }

    /// Submitted stage: serializes to the bundler wire format and sends
    pub async fn send_user_operation(
        &self,
        packed: &PackedUserOperation,
    ) -> Result<UserOperationHash, ClientError> {
        let rpc_uo = RpcUserOperation::from(packed.clone());
        let hash = self.bundler.send_user_operation(&rpc_uo, &self.entry_point).await?;
        info!(
            "user operation submitted, hash: {}, sender: {:?}, entry point: {:?}",
            hash, self.account, self.entry_point
        );
        Ok(hash)
    }

    /// Polling stage: waits for the bundler to report a mined receipt.
    /// The cancellation token is checked at the top of every iteration,
    /// before the inter-poll sleep; an in-flight RPC call is never aborted,
    /// and a submitted operation is never rolled back client-side.
    pub async fn wait_for_receipt(
        &self,
        hash: UserOperationHash,
        cancel: Option<&CancellationToken>,
    ) -> Result<UserOperationReceipt, ClientError> {
        let started = Instant::now();

        while started.elapsed() < self.gas.receipt_timeout {
            if let Some(token) = cancel {
                if token.is_cancelled() {
                    return Err(ClientError::Cancelled { hash });
                }
            }

            if let Some(receipt) = self.bundler.get_user_operation_receipt(&hash).await? {
                debug!(
                    "user operation {} mined in transaction {:?}",
                    hash, receipt.tx_receipt.transaction_hash
                );
                return Ok(receipt);
            }

            sleep(self.gas.receipt_poll_interval).await;
        }

        Err(ClientError::ReceiptTimeout { hash, timeout: self.gas.receipt_timeout })
    }

    /// Submits the signed operation and waits for its receipt
    pub async fn send_and_wait(
        &self,
        packed: &PackedUserOperation,
        cancel: Option<&CancellationToken>,
    ) -> Result<AccountTransactionReceipt, ClientError> {
        let hash = self.send_user_operation(packed).await?;
        let receipt = self.wait_for_receipt(hash, cancel).await?;
        Ok(receipt.into())
    }

    /// Wraps the target call in `execute` and runs the full pipeline
    pub async fn execute(
        &self,
        target: Address,
        value: U256,
        data: Bytes,
    ) -> Result<AccountTransactionReceipt, ClientError> {
        self.execute_with_cancel(target, value, data, None).await
    }

    /// [`execute`](Self::execute) with a cooperative cancellation token
    pub async fn execute_with_cancel(
        &self,
        target: Address,
        value: U256,
        data: Bytes,
        cancel: Option<&CancellationToken>,
    ) -> Result<AccountTransactionReceipt, ClientError> {
        let call_data = encode_execute(target, value, data);
        let packed = self.create_user_operation(call_data).await?;
        self.send_and_wait(&packed, cancel).await
    }

    /// Aggregates calls into one `executeBatch` operation and runs the same
    /// pipeline
    pub async fn execute_batch(
        &self,
        calls: Vec<Call>,
    ) -> Result<AccountTransactionReceipt, ClientError> {
        self.execute_batch_with_cancel(calls, None).await
    }

    /// [`execute_batch`](Self::execute_batch) with a cooperative
    /// cancellation token
    pub async fn execute_batch_with_cancel(
        &self,
        calls: Vec<Call>,
        cancel: Option<&CancellationToken>,
    ) -> Result<AccountTransactionReceipt, ClientError> {
        let call_data = encode_execute_batch(calls);
        let packed = self.create_user_operation(call_data).await?;
        self.send_and_wait(&packed, cancel).await
    }

    /// Builds the unsigned operation and asks the bundler for a total gas
    /// estimate (call + verification + pre-verification), with the
    /// configured margin applied
    pub async fn estimate_gas(
        &self,
        target: Address,
        value: U256,
        data: Bytes,
    ) -> Result<U256, ClientError> {
        let call_data = encode_execute(target, value, data);
        let uo = self.build_user_operation(call_data).await?;
        let estimate = self
            .bundler
            .estimate_user_operation_gas(&RpcUserOperation::from(uo), &self.entry_point)
            .await?;

        let total = estimate.call_gas_limit
            + estimate.verification_gas_limit
            + estimate.pre_verification_gas;
        Ok(self.gas.apply_buffer(total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::{
        providers::{MockProvider, Provider},
        types::TransactionReceipt,
    };
    use serde_json::Value;
    use std::time::Duration;
    use userop_primitives::{get_address, unpack_init_code};

    const SIGNER_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn account() -> Address {
        "0x9c5754De1443984659E1b3a8d1931D83475ba29C".parse().unwrap()
    }

    fn entry_point() -> Address {
        userop_primitives::constants::entry_point::ADDRESS_V07.parse().unwrap()
    }

    fn factory_config() -> FactoryConfig {
        FactoryConfig::new(
            "0x9406Cc6185a346906296840746125a0E44976454".parse().unwrap(),
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".parse().unwrap(),
            U256::zero(),
        )
    }

    fn handler_with_mocks(
    ) -> (AccountHandler<Provider<MockProvider>, MockProvider>, MockProvider, MockProvider) {
        let (eth_provider, eth_mock) = Provider::mocked();
        let (bundler_provider, bundler_mock) = Provider::mocked();
        let handler = AccountHandler::new(
            Arc::new(eth_provider),
            BundlerClient::new(bundler_provider),
            account(),
            entry_point(),
            Wallet::from_key(SIGNER_KEY, 1).unwrap(),
        );
        (handler, eth_mock, bundler_mock)
    }

    fn fast_gas_config() -> GasConfig {
        GasConfig {
            receipt_poll_interval: Duration::from_millis(20),
            receipt_timeout: Duration::from_millis(100),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn building_embeds_factory_for_undeployed_account() {
        let (handler, eth_mock, _) = handler_with_mocks();
        let handler = handler.with_factory(factory_config());

        // eth_getCode returns empty code
        eth_mock.push(Bytes::default()).unwrap();

        let uo = handler.build_user_operation("0xb61d27f6".parse().unwrap()).await.unwrap();
        assert_eq!(uo.sender, account());
        assert_eq!(get_address(&uo.init_code), Some(factory_config().factory_address));

        let (_, factory_data) = unpack_init_code(&uo.init_code);
        assert_eq!(
            factory_data,
            encode_create_account(factory_config().owner, U256::zero())
        );
    }

    #[tokio::test]
    async fn building_skips_factory_for_deployed_account() {
        let (handler, eth_mock, _) = handler_with_mocks();
        let handler = handler.with_factory(factory_config());

        eth_mock.push("0x60806040".parse::<Bytes>().unwrap()).unwrap();

        let uo = handler.build_user_operation(Bytes::default()).await.unwrap();
        assert!(uo.init_code.is_empty());
    }

    #[tokio::test]
    async fn building_without_factory_never_reads_code() {
        let (handler, _, _) = handler_with_mocks();
        let uo = handler.build_user_operation(Bytes::default()).await.unwrap();
        assert!(uo.init_code.is_empty());
    }

    #[tokio::test]
    async fn signing_memoizes_chain_id() {
        let (handler, eth_mock, _) = handler_with_mocks();

        // one eth_chainId answer serves both create calls
        eth_mock.push(U256::from(1)).unwrap();

        let packed = handler.create_user_operation(Bytes::default()).await.unwrap();
        assert_eq!(packed.signature.len(), 65);

        // a second call would fail with an empty mock queue if the chain id
        // were fetched again
        let again = handler.create_user_operation(Bytes::default()).await.unwrap();
        assert_eq!(again.signature, packed.signature);
    }

    #[tokio::test]
    async fn receipt_timeout_carries_hash_and_budget() {
        let (handler, _, bundler_mock) = handler_with_mocks();
        let handler = handler.with_gas_config(fast_gas_config());

        for _ in 0..10 {
            bundler_mock.push(Value::Null).unwrap();
        }

        let hash: UserOperationHash =
            "0x95418c07086df02ff6bc9e8bdc150b380cb761beecc098630440bcec6e862702"
                .parse()
                .unwrap();

        let started = Instant::now();
        let err = handler.wait_for_receipt(hash, None).await.unwrap_err();
        let elapsed = started.elapsed();

        match err {
            ClientError::ReceiptTimeout { hash: reported, timeout } => {
                assert_eq!(reported, hash);
                assert_eq!(timeout, Duration::from_millis(100));
            }
            other => panic!("expected timeout, got {other:?}"),
        }
        // timeout budget plus at most one poll interval of slack
        assert!(elapsed < Duration::from_millis(100 + 20 + 80), "took {elapsed:?}");
    }

    #[tokio::test]
    async fn cancellation_short_circuits_polling() {
        let (handler, _, _) = handler_with_mocks();
        let handler = handler.with_gas_config(fast_gas_config());

        let token = CancellationToken::new();
        token.cancel();

        let hash = UserOperationHash::default();
        let err = handler.wait_for_receipt(hash, Some(&token)).await.unwrap_err();
        assert!(matches!(err, ClientError::Cancelled { hash: reported } if reported == hash));
    }

    #[tokio::test]
    async fn mined_receipt_is_translated() {
        let (handler, _, bundler_mock) = handler_with_mocks();
        let handler = handler.with_gas_config(fast_gas_config());

        let hash: UserOperationHash =
            "0x7c1b8c9df49a9e09ecef0f0fe6841d895850d29820f9a4b494097764085dcd7e"
                .parse()
                .unwrap();
        let receipt = UserOperationReceipt {
            user_operation_hash: hash,
            sender: account(),
            nonce: U256::zero(),
            paymaster: None,
            actual_gas_cost: 42.into(),
            actual_gas_used: 21_000.into(),
            success: true,
            reason: None,
            logs: vec![],
            tx_receipt: TransactionReceipt::default(),
        };
        bundler_mock.push(receipt).unwrap();

        let mined = handler.wait_for_receipt(hash, None).await.unwrap();
        let translated = AccountTransactionReceipt::from(mined);
        assert_eq!(translated.user_op_hash, hash);
        assert!(translated.user_op_success);
        assert_eq!(translated.actual_gas_used, U256::from(21_000));
    }

    #[tokio::test]
    async fn estimate_gas_sums_and_buffers() {
        let (handler, _, bundler_mock) = handler_with_mocks();

        bundler_mock
            .push(serde_json::json!({
                "preVerificationGas": "0x5208",
                "verificationGasLimit": "0x186a0",
                "callGasLimit": "0x30d40",
            }))
            .unwrap();

        let total = handler
            .estimate_gas(account(), U256::zero(), Bytes::default())
            .await
            .unwrap();

        // (21_000 + 100_000 + 200_000) * 1.1
        assert_eq!(total, U256::from(353_100));
    }
}

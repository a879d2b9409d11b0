//! Basic transaction types for account abstraction (ERC-4337)

mod hash;
mod request;

use crate::utils::{
    as_checksum_addr, as_checksum_addr_opt, get_address, pack_account_gas_limits, pack_gas_fees,
    pack_paymaster_and_data, unpack_account_gas_limits, unpack_gas_fees,
    unpack_paymaster_and_data,
};
use ethers::types::{Address, Bytes, Log, TransactionReceipt, H256, U256};
pub use hash::UserOperationHash;
pub use request::RpcUserOperation;
use serde::{Deserialize, Serialize};

/// One gwei, the default priority fee
const GWEI: u64 = 1_000_000_000;

/// User operation in its unpacked, caller-facing form
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOperation {
    /// Sender of the user operation
    #[serde(serialize_with = "as_checksum_addr")]
    pub sender: Address,

    /// Nonce (anti replay protection)
    pub nonce: U256,

    /// Init code for the account (factory address followed by the factory
    /// call data, or the EIP-7702 marker form; empty if already deployed)
    pub init_code: Bytes,

    /// The data that is passed to the sender during the main execution call
    pub call_data: Bytes,

    /// The amount of gas to allocate for the main execution call
    pub call_gas_limit: U256,

    /// The amount of gas to allocate for the verification step
    pub verification_gas_limit: U256,

    /// The amount of gas to pay bundler to compensate for the
    /// pre-verification execution and calldata
    pub pre_verification_gas: U256,

    /// Maximum fee per gas (similar to EIP-1559)
    pub max_fee_per_gas: U256,

    /// Maximum priority fee per gas (similar to EIP-1559)
    pub max_priority_fee_per_gas: U256,

    /// Address of the paymaster sponsoring the operation (zero when the
    /// account pays for itself)
    #[serde(serialize_with = "as_checksum_addr")]
    pub paymaster: Address,

    /// Extra data passed to the paymaster during verification
    pub paymaster_data: Bytes,

    /// The amount of gas to allocate for the paymaster verification step
    pub paymaster_verification_gas_limit: U256,

    /// The amount of gas to allocate for the paymaster post-operation step
    pub paymaster_post_op_gas_limit: U256,

    /// Signature over the packed operation, empty until signed
    pub signature: Bytes,
}

impl Default for UserOperation {
    fn default() -> Self {
        Self {
            sender: Address::zero(),
            nonce: U256::zero(),
            init_code: Bytes::default(),
            call_data: Bytes::default(),
            call_gas_limit: U256::zero(),
            verification_gas_limit: 15_000.into(),
            pre_verification_gas: 21_000.into(),
            max_fee_per_gas: U256::zero(),
            max_priority_fee_per_gas: GWEI.into(),
            paymaster: Address::zero(),
            paymaster_data: Bytes::default(),
            paymaster_verification_gas_limit: 300_000.into(),
            paymaster_post_op_gas_limit: U256::zero(),
            signature: Bytes::default(),
        }
    }
}

impl UserOperation {
    /// Packs the user operation into its fixed-slot wire form, carrying the
    /// signature bytes through unchanged
    pub fn pack(&self) -> PackedUserOperation {
        PackedUserOperation {
            sender: self.sender,
            nonce: self.nonce,
            init_code: self.init_code.clone(),
            call_data: self.call_data.clone(),
            account_gas_limits: pack_account_gas_limits(
                self.verification_gas_limit,
                self.call_gas_limit,
            )
            .into(),
            pre_verification_gas: self.pre_verification_gas,
            gas_fees: pack_gas_fees(self.max_priority_fee_per_gas, self.max_fee_per_gas).into(),
            paymaster_and_data: pack_paymaster_and_data(
                self.paymaster,
                self.paymaster_verification_gas_limit,
                self.paymaster_post_op_gas_limit,
                &self.paymaster_data,
            ),
            signature: self.signature.clone(),
        }
    }

    /// Packs the user operation and calculates its EIP-712 hash under the
    /// given entry point's signing domain
    pub fn pack_and_hash(&self, entry_point: &Address, chain_id: u64) -> UserOperationHash {
        crate::eip712::pack_and_hash_user_operation(self, entry_point, chain_id)
    }

    // Builder pattern helpers

    /// Sets the sender of the user operation
    pub fn sender(mut self, sender: Address) -> Self {
        self.sender = sender;
        self
    }

    /// Sets the nonce of the user operation
    pub fn nonce(mut self, nonce: U256) -> Self {
        self.nonce = nonce;
        self
    }

    /// Sets the init code of the user operation
    pub fn init_code(mut self, init_code: Bytes) -> Self {
        self.init_code = init_code;
        self
    }

    /// Sets the call data of the user operation
    pub fn call_data(mut self, call_data: Bytes) -> Self {
        self.call_data = call_data;
        self
    }

    /// Sets the call gas limit of the user operation
    pub fn call_gas_limit(mut self, call_gas_limit: U256) -> Self {
        self.call_gas_limit = call_gas_limit;
        self
    }

    /// Sets the verification gas limit of the user operation
    pub fn verification_gas_limit(mut self, verification_gas_limit: U256) -> Self {
        self.verification_gas_limit = verification_gas_limit;
        self
    }

    /// Sets the pre-verification gas of the user operation
    pub fn pre_verification_gas(mut self, pre_verification_gas: U256) -> Self {
        self.pre_verification_gas = pre_verification_gas;
        self
    }

    /// Sets the max fee per gas of the user operation
    pub fn max_fee_per_gas(mut self, max_fee_per_gas: U256) -> Self {
        self.max_fee_per_gas = max_fee_per_gas;
        self
    }

    /// Sets the max priority fee per gas of the user operation
    pub fn max_priority_fee_per_gas(mut self, max_priority_fee_per_gas: U256) -> Self {
        self.max_priority_fee_per_gas = max_priority_fee_per_gas;
        self
    }

    /// Sets the paymaster of the user operation
    pub fn paymaster(mut self, paymaster: Address) -> Self {
        self.paymaster = paymaster;
        self
    }

    /// Sets the paymaster data of the user operation
    pub fn paymaster_data(mut self, paymaster_data: Bytes) -> Self {
        self.paymaster_data = paymaster_data;
        self
    }

    /// Sets the paymaster verification gas limit of the user operation
    pub fn paymaster_verification_gas_limit(
        mut self,
        paymaster_verification_gas_limit: U256,
    ) -> Self {
        self.paymaster_verification_gas_limit = paymaster_verification_gas_limit;
        self
    }

    /// Sets the paymaster post-operation gas limit of the user operation
    pub fn paymaster_post_op_gas_limit(mut self, paymaster_post_op_gas_limit: U256) -> Self {
        self.paymaster_post_op_gas_limit = paymaster_post_op_gas_limit;
        self
    }

    /// Sets the signature of the user operation
    pub fn signature(mut self, signature: Bytes) -> Self {
        self.signature = signature;
        self
    }

    /// Creates random user operation (for testing purposes)
    #[cfg(feature = "test-utils")]
    pub fn random() -> Self {
        UserOperation::default()
            .sender(Address::random())
            .verification_gas_limit(100_000.into())
            .max_fee_per_gas(3_000_000_000_u64.into())
    }
}

/// The fixed-slot form of the user operation that enters the EIP-712 struct
/// hash; field order is the signed schema order
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackedUserOperationForHash {
    /// Sender of the user operation
    #[serde(serialize_with = "as_checksum_addr")]
    pub sender: Address,
    /// Nonce (anti replay protection)
    pub nonce: U256,
    /// Factory address followed by the factory call data, or the EIP-7702
    /// marker form
    pub init_code: Bytes,
    /// The data that is passed to the sender during the main execution call
    pub call_data: Bytes,
    /// `verificationGasLimit‖callGasLimit`, 16 bytes each
    pub account_gas_limits: H256,
    /// The amount of gas to pay bundler to compensate for the
    /// pre-verification execution and calldata
    pub pre_verification_gas: U256,
    /// `maxPriorityFeePerGas‖maxFeePerGas`, 16 bytes each
    pub gas_fees: H256,
    /// `paymaster(20)‖verificationGasLimit(16)‖postOpGasLimit(16)‖data`, or
    /// empty without a paymaster
    pub paymaster_and_data: Bytes,
}

/// The fixed-slot form of the user operation submitted to the bundler
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackedUserOperation {
    /// Sender of the user operation
    #[serde(serialize_with = "as_checksum_addr")]
    pub sender: Address,
    /// Nonce (anti replay protection)
    pub nonce: U256,
    /// Factory address followed by the factory call data, or the EIP-7702
    /// marker form
    pub init_code: Bytes,
    /// The data that is passed to the sender during the main execution call
    pub call_data: Bytes,
    /// `verificationGasLimit‖callGasLimit`, 16 bytes each
    pub account_gas_limits: H256,
    /// The amount of gas to pay bundler to compensate for the
    /// pre-verification execution and calldata
    pub pre_verification_gas: U256,
    /// `maxPriorityFeePerGas‖maxFeePerGas`, 16 bytes each
    pub gas_fees: H256,
    /// `paymaster(20)‖verificationGasLimit(16)‖postOpGasLimit(16)‖data`, or
    /// empty without a paymaster
    pub paymaster_and_data: Bytes,
    /// Signature over the EIP-712 digest of the other fields
    pub signature: Bytes,
}

impl From<&PackedUserOperation> for PackedUserOperationForHash {
    fn from(uo: &PackedUserOperation) -> Self {
        Self {
            sender: uo.sender,
            nonce: uo.nonce,
            init_code: uo.init_code.clone(),
            call_data: uo.call_data.clone(),
            account_gas_limits: uo.account_gas_limits,
            pre_verification_gas: uo.pre_verification_gas,
            gas_fees: uo.gas_fees,
            paymaster_and_data: uo.paymaster_and_data.clone(),
        }
    }
}

impl PackedUserOperation {
    /// Verification gas limit recovered from the packed word
    pub fn verification_gas_limit(&self) -> U256 {
        unpack_account_gas_limits(self.account_gas_limits.as_bytes()).0
    }

    /// Call gas limit recovered from the packed word
    pub fn call_gas_limit(&self) -> U256 {
        unpack_account_gas_limits(self.account_gas_limits.as_bytes()).1
    }

    /// Max priority fee recovered from the packed word
    pub fn max_priority_fee_per_gas(&self) -> U256 {
        unpack_gas_fees(self.gas_fees.as_bytes()).0
    }

    /// Max fee recovered from the packed word
    pub fn max_fee_per_gas(&self) -> U256 {
        unpack_gas_fees(self.gas_fees.as_bytes()).1
    }

    /// Factory address embedded in the init code, if any
    pub fn factory(&self) -> Option<Address> {
        get_address(&self.init_code)
    }

    /// Paymaster address embedded in `paymasterAndData`, if any
    pub fn paymaster(&self) -> Option<Address> {
        get_address(&self.paymaster_and_data)
    }

    /// Reverses [`UserOperation::pack`]; a missing paymaster unpacks to the
    /// zero address with zero gas limits, not the construction defaults
    pub fn unpack(&self) -> UserOperation {
        let (verification_gas_limit, call_gas_limit) =
            unpack_account_gas_limits(self.account_gas_limits.as_bytes());
        let (max_priority_fee_per_gas, max_fee_per_gas) =
            unpack_gas_fees(self.gas_fees.as_bytes());
        let (paymaster, paymaster_verification_gas_limit, paymaster_post_op_gas_limit, paymaster_data) =
            unpack_paymaster_and_data(&self.paymaster_and_data);
        UserOperation {
            sender: self.sender,
            nonce: self.nonce,
            init_code: self.init_code.clone(),
            call_data: self.call_data.clone(),
            call_gas_limit,
            verification_gas_limit,
            pre_verification_gas: self.pre_verification_gas,
            max_fee_per_gas,
            max_priority_fee_per_gas,
            paymaster,
            paymaster_data,
            paymaster_verification_gas_limit,
            paymaster_post_op_gas_limit,
            signature: self.signature.clone(),
        }
    }

    /// Calculates the EIP-712 hash of the user operation under the given
    /// entry point's signing domain
    pub fn hash(&self, entry_point: &Address, chain_id: u64) -> UserOperationHash {
        crate::eip712::hash_user_operation(self, entry_point, chain_id).into()
    }
}

/// Receipt of the user operation (returned from the RPC endpoint
/// eth_getUserOperationReceipt)
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOperationReceipt {
    #[serde(rename = "userOpHash")]
    pub user_operation_hash: UserOperationHash,
    #[serde(serialize_with = "as_checksum_addr")]
    pub sender: Address,
    pub nonce: U256,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "as_checksum_addr_opt"
    )]
    pub paymaster: Option<Address>,
    pub actual_gas_cost: U256,
    pub actual_gas_used: U256,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default)]
    pub logs: Vec<Log>,
    #[serde(rename = "receipt")]
    pub tx_receipt: TransactionReceipt,
}

/// Gas estimations for user operation (returned from the RPC endpoint
/// eth_estimateUserOperationGas)
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOperationGasEstimation {
    pub pre_verification_gas: U256,
    pub verification_gas_limit: U256,
    pub call_gas_limit: U256,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paymaster_verification_gas_limit: Option<U256>,
}

//! Caller-facing receipt of a mined user operation

use derive_more::{AsRef, Deref};
use ethers::types::{Address, TransactionReceipt, U256};
use serde::{Deserialize, Serialize};
use userop_primitives::{UserOperationHash, UserOperationReceipt};

/// Transaction receipt augmented with the user operation outcome. Derefs to
/// the standard receipt of the bundle transaction that carried the
/// operation, so the usual fields (block number, gas used, logs) read
/// directly off it.
#[derive(AsRef, Deref, Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountTransactionReceipt {
    /// Standard receipt of the enclosing bundle transaction
    #[deref]
    #[as_ref]
    #[serde(flatten)]
    pub tx_receipt: TransactionReceipt,

    /// Hash the bundler indexes the operation under
    pub user_op_hash: UserOperationHash,
    /// Account that issued the operation
    pub sender: Address,
    /// Paymaster that sponsored the operation, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paymaster: Option<Address>,
    /// Whether the inner execution call succeeded
    pub user_op_success: bool,
    /// Revert reason reported by the bundler, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_op_reason: Option<String>,
    /// Amount actually paid for the operation
    pub actual_gas_cost: U256,
    /// Gas actually consumed by the operation
    pub actual_gas_used: U256,
}

impl From<UserOperationReceipt> for AccountTransactionReceipt {
    fn from(receipt: UserOperationReceipt) -> Self {
        Self {
            tx_receipt: receipt.tx_receipt,
            user_op_hash: receipt.user_operation_hash,
            sender: receipt.sender,
            paymaster: receipt.paymaster,
            user_op_success: receipt.success,
            user_op_reason: receipt.reason,
            actual_gas_cost: receipt.actual_gas_cost,
            actual_gas_used: receipt.actual_gas_used,
        }
    }
}

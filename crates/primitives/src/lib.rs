//! Account abstraction (ERC-4337) user operation primitive types
//!
//! This crate contains the user operation data model, the packing codec
//! between its unpacked and fixed-slot forms, the EIP-712 signing domain,
//! the EIP-7702 init code helpers, and the bundler wire format.

pub mod constants;
pub mod eip712;
pub mod eip7702;
pub mod provider;
mod user_operation;
mod utils;
mod wallet;

pub use user_operation::{
    PackedUserOperation, PackedUserOperationForHash, RpcUserOperation, UserOperation,
    UserOperationGasEstimation, UserOperationHash, UserOperationReceipt,
};
pub use utils::{
    get_address, pack_account_gas_limits, pack_gas_fees, pack_init_code,
    pack_paymaster_and_data, unpack_account_gas_limits, unpack_gas_fees, unpack_init_code,
    unpack_paymaster_and_data,
};
pub use wallet::Wallet;

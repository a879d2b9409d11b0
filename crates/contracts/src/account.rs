//! Calldata encoding for the smart account's execute entry points

use crate::gen::{Call, ExecuteBatchCall, ExecuteCall};
use ethers::{
    abi::AbiEncode,
    types::{Address, Bytes, U256},
};

/// Encodes a single `execute(target, value, data)` call the entry point
/// dispatches to the account during the main execution step
pub fn encode_execute(target: Address, value: U256, data: Bytes) -> Bytes {
    ExecuteCall { target, value, data }.encode().into()
}

/// Encodes `executeBatch(calls)` aggregating `(target, value, data)` tuples
/// into one operation
pub fn encode_execute_batch(calls: Vec<Call>) -> Bytes {
    ExecuteBatchCall { calls }.encode().into()
}

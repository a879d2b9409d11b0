//! Calldata encoding for the counterfactual account factory

use crate::gen::CreateAccountCall;
use ethers::{
    abi::AbiEncode,
    types::{Address, Bytes, U256},
};

/// Encodes the factory `createAccount(owner, salt)` call that follows the
/// factory address inside `initCode`
pub fn encode_create_account(owner: Address, salt: U256) -> Bytes {
    CreateAccountCall { owner, salt }.encode().into()
}

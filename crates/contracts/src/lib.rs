//! Account abstraction (ERC-4337) smart contract call encoding
//!
//! Typed bindings and calldata helpers for the three calls the user
//! operation pipeline needs: the account's `execute`/`executeBatch` entry
//! points and the factory's `createAccount`.

pub mod account;
pub mod factory;
mod gen;

pub use account::{encode_execute, encode_execute_batch};
pub use factory::encode_create_account;
pub use gen::{AccountFactoryAPI, Call, SimpleAccountAPI};

//! Bundler JSON-RPC wire form of the user operation (hex-string fields,
//! factory/paymaster keys omitted entirely when absent)

use super::{PackedUserOperation, UserOperation};
use crate::utils::{
    as_checksum_addr, as_checksum_addr_opt, pack_account_gas_limits, pack_gas_fees,
    pack_init_code, pack_paymaster_and_data, unpack_account_gas_limits, unpack_gas_fees,
    unpack_init_code, unpack_paymaster_and_data,
};
use ethers::types::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

/// User operation as accepted by `eth_sendUserOperation` and
/// `eth_estimateUserOperationGas`, with the packed fields split back into
/// named sub-fields
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcUserOperation {
    #[serde(serialize_with = "as_checksum_addr")]
    pub sender: Address,
    #[serde(default)]
    pub nonce: U256,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "as_checksum_addr_opt"
    )]
    pub factory: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub factory_data: Option<Bytes>,
    #[serde(default)]
    pub call_data: Bytes,
    #[serde(default)]
    pub call_gas_limit: Option<U256>,
    #[serde(default)]
    pub verification_gas_limit: Option<U256>,
    #[serde(default)]
    pub pre_verification_gas: Option<U256>,
    #[serde(default)]
    pub max_fee_per_gas: Option<U256>,
    #[serde(default)]
    pub max_priority_fee_per_gas: Option<U256>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "as_checksum_addr_opt"
    )]
    pub paymaster: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paymaster_verification_gas_limit: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paymaster_post_op_gas_limit: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paymaster_data: Option<Bytes>,
    #[serde(default)]
    pub signature: Bytes,
}

impl From<PackedUserOperation> for RpcUserOperation {
    fn from(uo: PackedUserOperation) -> Self {
        let (verification_gas_limit, call_gas_limit) =
            unpack_account_gas_limits(uo.account_gas_limits.as_bytes());
        let (max_priority_fee_per_gas, max_fee_per_gas) =
            unpack_gas_fees(uo.gas_fees.as_bytes());

        let (factory, factory_data) = {
            let (factory, data) = unpack_init_code(&uo.init_code);
            if factory.is_zero() {
                (None, None)
            } else {
                (Some(factory), Some(data))
            }
        };

        let (paymaster, paymaster_verification_gas_limit, paymaster_post_op_gas_limit, paymaster_data) = {
            let (paymaster, verification, post_op, data) =
                unpack_paymaster_and_data(&uo.paymaster_and_data);
            if paymaster.is_zero() {
                (None, None, None, None)
            } else {
                (Some(paymaster), Some(verification), Some(post_op), Some(data))
            }
        };

        Self {
            sender: uo.sender,
            nonce: uo.nonce,
            factory,
            factory_data,
            call_data: uo.call_data,
            call_gas_limit: Some(call_gas_limit),
            verification_gas_limit: Some(verification_gas_limit),
            pre_verification_gas: Some(uo.pre_verification_gas),
            max_fee_per_gas: Some(max_fee_per_gas),
            max_priority_fee_per_gas: Some(max_priority_fee_per_gas),
            paymaster,
            paymaster_verification_gas_limit,
            paymaster_post_op_gas_limit,
            paymaster_data,
            signature: uo.signature,
        }
    }
}

impl From<RpcUserOperation> for PackedUserOperation {
    fn from(uo: RpcUserOperation) -> Self {
        Self {
            sender: uo.sender,
            nonce: uo.nonce,
            init_code: pack_init_code(
                uo.factory.unwrap_or_default(),
                &uo.factory_data.unwrap_or_default(),
            ),
            call_data: uo.call_data,
            account_gas_limits: pack_account_gas_limits(
                uo.verification_gas_limit.unwrap_or_default(),
                uo.call_gas_limit.unwrap_or_default(),
            )
            .into(),
            pre_verification_gas: uo.pre_verification_gas.unwrap_or_default(),
            gas_fees: pack_gas_fees(
                uo.max_priority_fee_per_gas.unwrap_or_default(),
                uo.max_fee_per_gas.unwrap_or_default(),
            )
            .into(),
            paymaster_and_data: pack_paymaster_and_data(
                uo.paymaster.unwrap_or_default(),
                uo.paymaster_verification_gas_limit.unwrap_or_default(),
                uo.paymaster_post_op_gas_limit.unwrap_or_default(),
                &uo.paymaster_data.unwrap_or_default(),
            ),
            signature: uo.signature,
        }
    }
}

impl From<UserOperation> for RpcUserOperation {
    fn from(uo: UserOperation) -> Self {
        let (factory, factory_data) = {
            let (factory, data) = unpack_init_code(&uo.init_code);
            if factory.is_zero() {
                (None, None)
            } else {
                (Some(factory), Some(data))
            }
        };

        let (paymaster, paymaster_verification_gas_limit, paymaster_post_op_gas_limit, paymaster_data) =
            if uo.paymaster.is_zero() {
                (None, None, None, None)
            } else {
                (
                    Some(uo.paymaster),
                    Some(uo.paymaster_verification_gas_limit),
                    Some(uo.paymaster_post_op_gas_limit),
                    Some(uo.paymaster_data),
                )
            };

        Self {
            sender: uo.sender,
            nonce: uo.nonce,
            factory,
            factory_data,
            call_data: uo.call_data,
            call_gas_limit: Some(uo.call_gas_limit),
            verification_gas_limit: Some(uo.verification_gas_limit),
            pre_verification_gas: Some(uo.pre_verification_gas),
            max_fee_per_gas: Some(uo.max_fee_per_gas),
            max_priority_fee_per_gas: Some(uo.max_priority_fee_per_gas),
            paymaster,
            paymaster_verification_gas_limit,
            paymaster_post_op_gas_limit,
            paymaster_data,
            signature: uo.signature,
        }
    }
}

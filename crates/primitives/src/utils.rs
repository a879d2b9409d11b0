//! Packing codec shared by the packed and RPC user operation forms

use ethers::{
    types::{Address, Bytes, U256},
    utils::to_checksum,
};

/// Converts address to checksum address
pub fn as_checksum_addr<S>(val: &Address, s: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    s.serialize_str(&to_checksum(val, None))
}

/// Converts Option address to checksum
pub fn as_checksum_addr_opt<S>(val: &Option<Address>, s: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    if let Some(addr) = val {
        s.serialize_str(&to_checksum(addr, None))
    } else {
        s.serialize_none()
    }
}

/// If possible, parses address from the first 20 bytes
pub fn get_address(buf: &[u8]) -> Option<Address> {
    if buf.len() >= 20 {
        Some(Address::from_slice(&buf[0..20]))
    } else {
        None
    }
}

/// Packs two uint128 into one 32-byte word, `a‖b`, each big-endian and
/// left-padded to 16 bytes. Values must fit in 128 bits; wider inputs are a
/// caller error.
pub fn pack_uint128(a: U256, b: U256) -> [u8; 32] {
    debug_assert!(a.bits() <= 128 && b.bits() <= 128, "packed value exceeds 128 bits");
    let mut res = [0u8; 32];
    let mut word = [0u8; 32];
    a.to_big_endian(&mut word);
    res[0..16].copy_from_slice(&word[16..32]);
    b.to_big_endian(&mut word);
    res[16..32].copy_from_slice(&word[16..32]);
    res
}

/// Unpacks two uint128 from a 32-byte word. Input of any other length
/// decodes to zeros.
pub fn unpack_uint128(buf: &[u8]) -> (U256, U256) {
    if buf.len() != 32 {
        return (U256::zero(), U256::zero());
    }
    (U256::from_big_endian(&buf[0..16]), U256::from_big_endian(&buf[16..32]))
}

/// Packs the `accountGasLimits` word (`verificationGasLimit‖callGasLimit`)
pub fn pack_account_gas_limits(verification_gas_limit: U256, call_gas_limit: U256) -> [u8; 32] {
    pack_uint128(verification_gas_limit, call_gas_limit)
}

/// Unpacks the `accountGasLimits` word into
/// `(verificationGasLimit, callGasLimit)`, zeros on malformed length
pub fn unpack_account_gas_limits(buf: &[u8]) -> (U256, U256) {
    unpack_uint128(buf)
}

/// Packs the `gasFees` word (`maxPriorityFeePerGas‖maxFeePerGas`)
pub fn pack_gas_fees(max_priority_fee_per_gas: U256, max_fee_per_gas: U256) -> [u8; 32] {
    pack_uint128(max_priority_fee_per_gas, max_fee_per_gas)
}

/// Unpacks the `gasFees` word into
/// `(maxPriorityFeePerGas, maxFeePerGas)`, zeros on malformed length
pub fn unpack_gas_fees(buf: &[u8]) -> (U256, U256) {
    unpack_uint128(buf)
}

/// Packs the `paymasterAndData` field:
/// `paymaster(20)‖verificationGasLimit(16)‖postOpGasLimit(16)‖data`,
/// or empty bytes when no paymaster sponsors the operation
pub fn pack_paymaster_and_data(
    paymaster: Address,
    verification_gas_limit: U256,
    post_op_gas_limit: U256,
    data: &Bytes,
) -> Bytes {
    if paymaster.is_zero() {
        Bytes::default()
    } else {
        let gas = pack_uint128(verification_gas_limit, post_op_gas_limit);
        [paymaster.as_bytes(), gas.as_slice(), data.as_ref()].concat().into()
    }
}

/// Unpacks the `paymasterAndData` field into
/// `(paymaster, verificationGasLimit, postOpGasLimit, data)`. Anything
/// shorter than the 52-byte prefix decodes to zeros and empty data.
pub fn unpack_paymaster_and_data(buf: &[u8]) -> (Address, U256, U256, Bytes) {
    if buf.len() >= 52 {
        let (verification_gas_limit, post_op_gas_limit) = unpack_uint128(&buf[20..52]);
        (
            Address::from_slice(&buf[0..20]),
            verification_gas_limit,
            post_op_gas_limit,
            Bytes::from(buf[52..].to_vec()),
        )
    } else {
        (Address::zero(), U256::zero(), U256::zero(), Bytes::default())
    }
}

/// Packs the `initCode` field: `factory(20)‖factoryData`, or empty bytes
/// when no factory is configured
pub fn pack_init_code(factory: Address, factory_data: &Bytes) -> Bytes {
    if factory.is_zero() {
        Bytes::default()
    } else {
        [factory.as_bytes(), factory_data.as_ref()].concat().into()
    }
}

/// Splits the `initCode` field into `(factory, factoryData)`. Factory
/// extraction requires at least 20 bytes; shorter input decodes to the zero
/// address and empty data. Exactly 20 bytes is a factory with empty data.
pub fn unpack_init_code(init_code: &[u8]) -> (Address, Bytes) {
    if init_code.len() >= 20 {
        (Address::from_slice(&init_code[0..20]), Bytes::from(init_code[20..].to_vec()))
    } else {
        (Address::zero(), Bytes::default())
    }
}

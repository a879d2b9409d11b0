//! EIP-712 signing domain and digest computation for packed user operations
//!
//! The type schema is an explicit table rather than something derived from
//! the structs, so the encoded type string and the field order are
//! independently testable.

use crate::user_operation::{PackedUserOperation, PackedUserOperationForHash, UserOperationHash};
use crate::UserOperation;
use ethers::{
    abi::{encode, Token},
    types::{
        transaction::eip712::{EIP712Domain, Eip712DomainType, TypedData, Types},
        Address, H256,
    },
    utils::keccak256,
};
use lazy_static::lazy_static;
use serde_json::json;
use std::collections::BTreeMap;

/// EIP-712 domain name shared by all ERC-4337 entry point deployments
pub const DOMAIN_NAME: &str = "ERC4337";
/// EIP-712 domain version
pub const DOMAIN_VERSION: &str = "1";
/// Primary type of the signed struct
pub const PRIMARY_TYPE: &str = "PackedUserOperation";

/// Ordered `(field name, ABI type)` schema of the signed struct
pub const PACKED_USER_OPERATION_SCHEMA: [(&str, &str); 8] = [
    ("sender", "address"),
    ("nonce", "uint256"),
    ("initCode", "bytes"),
    ("callData", "bytes"),
    ("accountGasLimits", "bytes32"),
    ("preVerificationGas", "uint256"),
    ("gasFees", "bytes32"),
    ("paymasterAndData", "bytes"),
];

/// Schema of the EIP712Domain struct itself
const DOMAIN_SCHEMA: [(&str, &str); 4] = [
    ("name", "string"),
    ("version", "string"),
    ("chainId", "uint256"),
    ("verifyingContract", "address"),
];

lazy_static! {
    /// keccak256 of the encoded primary type, computed once from the schema
    pub static ref PACKED_USER_OPERATION_TYPE_HASH: H256 =
        H256::from(keccak256(encode_type()));
}

/// Encoded type string per EIP-712 (`Name(type1 name1,...)`)
fn encode_type() -> String {
    let fields = PACKED_USER_OPERATION_SCHEMA
        .iter()
        .map(|(name, kind)| format!("{kind} {name}"))
        .collect::<Vec<_>>()
        .join(",");
    format!("{PRIMARY_TYPE}({fields})")
}

/// Builds the ERC4337 signing domain for the given entry point deployment
pub fn erc4337_domain(entry_point: &Address, chain_id: u64) -> EIP712Domain {
    EIP712Domain {
        name: Some(DOMAIN_NAME.into()),
        version: Some(DOMAIN_VERSION.into()),
        chain_id: Some(chain_id.into()),
        verifying_contract: Some(*entry_point),
        salt: None,
    }
}

/// Builds the full typed-data object (domain, type schema, message) for the
/// packed user operation, suitable for `eth_signTypedData`-style signers
pub fn create_user_operation_type_data(
    uo: &PackedUserOperation,
    entry_point: &Address,
    chain_id: u64,
) -> TypedData {
    let mut types: Types = BTreeMap::new();
    types.insert(
        "EIP712Domain".to_string(),
        DOMAIN_SCHEMA
            .iter()
            .map(|(name, kind)| Eip712DomainType {
                name: name.to_string(),
                r#type: kind.to_string(),
            })
            .collect(),
    );
    types.insert(
        PRIMARY_TYPE.to_string(),
        PACKED_USER_OPERATION_SCHEMA
            .iter()
            .map(|(name, kind)| Eip712DomainType {
                name: name.to_string(),
                r#type: kind.to_string(),
            })
            .collect(),
    );

    let mut message = BTreeMap::new();
    message.insert("sender".to_string(), json!(uo.sender));
    message.insert("nonce".to_string(), json!(uo.nonce));
    message.insert("initCode".to_string(), json!(uo.init_code));
    message.insert("callData".to_string(), json!(uo.call_data));
    message.insert("accountGasLimits".to_string(), json!(uo.account_gas_limits));
    message.insert("preVerificationGas".to_string(), json!(uo.pre_verification_gas));
    message.insert("gasFees".to_string(), json!(uo.gas_fees));
    message.insert("paymasterAndData".to_string(), json!(uo.paymaster_and_data));

    TypedData {
        domain: erc4337_domain(entry_point, chain_id),
        types,
        primary_type: PRIMARY_TYPE.to_string(),
        message,
    }
}

/// EIP-712 struct hash of the packed fields; dynamic `bytes` fields enter as
/// their keccak256 per the EIP-712 `encodeData` rules
pub fn struct_hash(uo: &PackedUserOperationForHash) -> H256 {
    let tokens = [
        Token::FixedBytes(PACKED_USER_OPERATION_TYPE_HASH.as_bytes().to_vec()),
        Token::Address(uo.sender),
        Token::Uint(uo.nonce),
        Token::FixedBytes(keccak256(&uo.init_code).to_vec()),
        Token::FixedBytes(keccak256(&uo.call_data).to_vec()),
        Token::FixedBytes(uo.account_gas_limits.as_bytes().to_vec()),
        Token::Uint(uo.pre_verification_gas),
        Token::FixedBytes(uo.gas_fees.as_bytes().to_vec()),
        Token::FixedBytes(keccak256(&uo.paymaster_and_data).to_vec()),
    ];
    H256::from(keccak256(encode(&tokens)))
}

/// EIP-712 digest of the packed user operation under the ERC4337 domain of
/// the given entry point and chain. The signature field never enters the
/// digest, so re-hashing a signed operation reproduces the signed digest.
pub fn hash_user_operation(
    uo: &PackedUserOperation,
    entry_point: &Address,
    chain_id: u64,
) -> H256 {
    let domain = erc4337_domain(entry_point, chain_id);
    let mut digest_input = Vec::with_capacity(2 + 32 + 32);
    digest_input.extend_from_slice(&[0x19, 0x01]);
    digest_input.extend_from_slice(&domain.separator());
    digest_input.extend_from_slice(struct_hash(&uo.into()).as_bytes());
    H256::from(keccak256(digest_input))
}

/// Packs the unpacked operation, then hashes it
pub fn pack_and_hash_user_operation(
    uo: &UserOperation,
    entry_point: &Address,
    chain_id: u64,
) -> UserOperationHash {
    hash_user_operation(&uo.pack(), entry_point, chain_id).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Wallet;
    use ethers::types::{Bytes, Signature};

    fn test_uo() -> UserOperation {
        UserOperation::default()
            .sender("0x9c5754De1443984659E1b3a8d1931D83475ba29C".parse().unwrap())
            .call_data("0xb61d27f60000000000000000000000009c5754de1443984659e1b3a8d1931d83475ba29c00000000000000000000000000000000000000000000000000005af3107a400000000000000000000000000000000000000000000000000000000000000000600000000000000000000000000000000000000000000000000000000000000000".parse().unwrap())
            .call_gas_limit(33_100.into())
            .verification_gas_limit(60_624.into())
            .max_fee_per_gas(20_000_000_000_u64.into())
    }

    fn entry_point() -> Address {
        crate::constants::entry_point::ADDRESS_V07.parse().unwrap()
    }

    #[test]
    fn encoded_type_matches_schema() {
        assert_eq!(
            encode_type(),
            "PackedUserOperation(address sender,uint256 nonce,bytes initCode,bytes callData,\
             bytes32 accountGasLimits,uint256 preVerificationGas,bytes32 gasFees,\
             bytes paymasterAndData)"
        );
    }

    #[test]
    fn hash_is_deterministic() {
        let packed = test_uo().pack();
        let h1 = hash_user_operation(&packed, &entry_point(), 1);
        let h2 = hash_user_operation(&packed, &entry_point(), 1);
        assert_eq!(h1, h2);
    }

    #[test]
    fn hash_changes_with_any_field() {
        let ep = entry_point();
        let base = hash_user_operation(&test_uo().pack(), &ep, 1);

        let nonce = hash_user_operation(&test_uo().nonce(1.into()).pack(), &ep, 1);
        assert_ne!(base, nonce);

        let fees =
            hash_user_operation(&test_uo().max_fee_per_gas(1.into()).pack(), &ep, 1);
        assert_ne!(base, fees);

        let other_chain = hash_user_operation(&test_uo().pack(), &ep, 5);
        assert_ne!(base, other_chain);

        let other_ep: Address = crate::constants::entry_point::ADDRESS_V08.parse().unwrap();
        assert_ne!(base, hash_user_operation(&test_uo().pack(), &other_ep, 1));
    }

    #[test]
    fn signature_does_not_affect_hash() {
        let ep = entry_point();
        let unsigned = test_uo().pack();
        let signed = test_uo().signature(vec![0xab; 65].into()).pack();
        assert_eq!(
            hash_user_operation(&unsigned, &ep, 1),
            hash_user_operation(&signed, &ep, 1)
        );
    }

    #[test]
    fn type_data_shape() {
        let packed = test_uo().pack();
        let type_data = create_user_operation_type_data(&packed, &entry_point(), 1);
        assert_eq!(type_data.primary_type, PRIMARY_TYPE);
        assert_eq!(type_data.domain.name.as_deref(), Some(DOMAIN_NAME));
        assert_eq!(type_data.domain.version.as_deref(), Some(DOMAIN_VERSION));
        assert_eq!(type_data.domain.verifying_contract, Some(entry_point()));

        let fields = &type_data.types[PRIMARY_TYPE];
        assert_eq!(fields.len(), PACKED_USER_OPERATION_SCHEMA.len());
        for (field, (name, kind)) in fields.iter().zip(PACKED_USER_OPERATION_SCHEMA) {
            assert_eq!(field.name, name);
            assert_eq!(field.r#type, kind);
        }
        assert_eq!(type_data.message["sender"], json!(packed.sender));
    }

    #[test]
    fn sign_and_recover() {
        // well-known dev chain account 0
        let wallet = Wallet::from_key(
            "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
            1,
        )
        .unwrap();
        let expected: Address = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".parse().unwrap();
        assert_eq!(wallet.address(), expected);

        let ep = entry_point();
        let signed = wallet.sign_uo(&test_uo(), &ep, 1).unwrap();
        assert_eq!(signed.signature.len(), 65);

        let digest = hash_user_operation(&signed, &ep, 1);
        let sig = Signature::try_from(signed.signature.as_ref()).unwrap();
        assert_eq!(sig.recover(digest).unwrap(), expected);
    }

    #[test]
    fn mutating_after_signing_invalidates_digest() {
        let wallet = Wallet::from_key(
            "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
            1,
        )
        .unwrap();
        let ep = entry_point();
        let mut signed = wallet.sign_uo(&test_uo(), &ep, 1).unwrap();
        let original_digest = hash_user_operation(&signed, &ep, 1);

        signed.call_data = Bytes::default();
        let mutated_digest = hash_user_operation(&signed, &ep, 1);
        assert_ne!(original_digest, mutated_digest);

        let sig = Signature::try_from(signed.signature.as_ref()).unwrap();
        assert_ne!(
            sig.recover(mutated_digest).unwrap(),
            wallet.address(),
            "signature over the old digest must not verify for the mutated operation"
        );
    }
}

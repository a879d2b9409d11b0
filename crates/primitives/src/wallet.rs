//! A `Wallet` is a wrapper around an ethers wallet that signs user operations

use crate::{eip712, PackedUserOperation, UserOperation};
use ethers::{
    prelude::k256::ecdsa::SigningKey,
    signers::{coins_bip39::English, LocalWallet, MnemonicBuilder, Signer},
    types::Address,
};

/// Wrapper around ethers wallet
#[derive(Clone, Debug)]
pub struct Wallet {
    /// Signing key of the wallet
    pub signer: ethers::signers::Wallet<SigningKey>,
}

impl Wallet {
    /// Creates a new wallet from the given mnemonic phrase
    ///
    /// # Arguments
    /// * `phrase` - The mnemonic phrase
    /// * `chain_id` - The chain id of the blockchain network to be used
    ///
    /// # Returns
    /// * `Self` - A new `Wallet` instance
    pub fn from_phrase(phrase: &str, chain_id: u64) -> eyre::Result<Self> {
        let wallet = MnemonicBuilder::<English>::default()
            .phrase(phrase)
            .derivation_path("m/44'/60'/0'/0/0")?
            .build()?;
        Ok(Self { signer: wallet.with_chain_id(chain_id) })
    }

    /// Creates a new wallet from the given hex-encoded private key
    ///
    /// # Arguments
    /// * `key` - The private key
    /// * `chain_id` - The chain id of the blockchain network to be used
    ///
    /// # Returns
    /// * `Self` - A new `Wallet` instance
    pub fn from_key(key: &str, chain_id: u64) -> eyre::Result<Self> {
        let wallet = key.trim_start_matches("0x").parse::<LocalWallet>()?;
        Ok(Self { signer: wallet.with_chain_id(chain_id) })
    }

    /// Address of the signing key
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Packs and signs the user operation over its EIP-712 digest
    ///
    /// # Arguments
    /// * `uo` - The [UserOperation](UserOperation) to be signed
    /// * `entry_point` - The entry point contract address
    /// * `chain_id` - The chain id of the blockchain network to be used
    ///
    /// # Returns
    /// * `PackedUserOperation` - The packed operation with the signature set
    pub fn sign_uo(
        &self,
        uo: &UserOperation,
        entry_point: &Address,
        chain_id: u64,
    ) -> eyre::Result<PackedUserOperation> {
        let mut packed = uo.pack();
        let digest = eip712::hash_user_operation(&packed, entry_point, chain_id);
        let sig = self.signer.sign_hash(digest)?;
        packed.signature = sig.to_vec().into();
        Ok(packed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wallet_from_phrase() {
        // well-known test vector mnemonic
        let wallet = Wallet::from_phrase(
            "test test test test test test test test test test test junk",
            1,
        )
        .unwrap();
        assert_eq!(
            wallet.address(),
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".parse::<Address>().unwrap()
        );
    }

    #[test]
    fn wallet_key_accepts_both_hex_forms() {
        let with_prefix = Wallet::from_key(
            "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
            1,
        )
        .unwrap();
        let without_prefix = Wallet::from_key(
            "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
            1,
        )
        .unwrap();
        assert_eq!(with_prefix.address(), without_prefix.address());
    }
}

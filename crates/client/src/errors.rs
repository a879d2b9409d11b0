//! Errors produced by the user operation submission pipeline

use ethers::providers::ProviderError;
use std::time::Duration;
use thiserror::Error;
use userop_primitives::UserOperationHash;

/// Submission pipeline errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// The bundler never reported a receipt within the configured budget.
    /// Carries the hash so the caller can resume polling externally.
    #[error("user operation {hash} not mined within {timeout:?}")]
    ReceiptTimeout {
        /// Hash of the submitted user operation
        hash: UserOperationHash,
        /// The configured wall-clock budget
        timeout: Duration,
    },

    /// Cooperative cancellation observed between poll iterations; the
    /// submitted operation stays pending at the bundler
    #[error("wait for user operation {hash} cancelled")]
    Cancelled {
        /// Hash of the submitted user operation
        hash: UserOperationHash,
    },

    /// Transport error from the execution client
    #[error("execution client error: {inner}")]
    EthClient {
        /// The inner error message
        inner: String,
    },

    /// Transport error from the bundler endpoint, propagated unchanged
    #[error("bundler error: {0}")]
    Bundler(ProviderError),

    /// The paymaster data provider failed
    #[error("paymaster data error: {inner}")]
    PaymasterData {
        /// The inner error message
        inner: String,
    },

    /// ECDSA signing failure
    #[error("signer error: {inner}")]
    Signer {
        /// The inner error message
        inner: String,
    },
}

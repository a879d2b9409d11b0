//! Account abstraction (ERC-4337)-related constants

/// Entry point smart contract deployments
pub mod entry_point {
    /// Address of the v0.6 entry point smart contract
    pub const ADDRESS_V06: &str = "0x5FF137D4b0FDCD49DcA30c7CF57E578a026d2789";
    /// Address of the v0.7 entry point smart contract
    pub const ADDRESS_V07: &str = "0x0000000071727De22E5E9d8BAf0edAc6f37da032";
    /// Address of the v0.8 entry point smart contract
    pub const ADDRESS_V08: &str = "0x4337084D9E255Ff0702461CF8895CE9E3b5Ff108";
    /// Address of the v0.9 entry point smart contract
    pub const ADDRESS_V09: &str = "0x433709009B8330FDa32311DF1C2AFA402eD8D009";

    /// Latest deployed entry point smart contract
    pub const ADDRESS: &str = ADDRESS_V09;
    /// Version of the latest entry point smart contract
    pub const VERSION: &str = "0.9.0";

    /// Entry point deployments by protocol version
    pub const VERSIONS: [(&str, &str); 4] = [
        ("0.6.0", ADDRESS_V06),
        ("0.7.0", ADDRESS_V07),
        ("0.8.0", ADDRESS_V08),
        ("0.9.0", ADDRESS_V09),
    ];
}

/// Bundler endpoint interaction
pub mod bundler {
    /// Default interval between receipt polls (in milliseconds)
    pub const RECEIPT_POLL_INTERVAL_MS: u64 = 1000;
    /// Default wall-clock budget for the receipt wait (in milliseconds)
    pub const RECEIPT_TIMEOUT_MS: u64 = 60000;
}

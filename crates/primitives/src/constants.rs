//! Smart account related constants

/// Entry point smart contract
pub mod entry_point {
    /// Address of the v0.6 entry point smart contract
    pub const ADDRESS: &str = "0x5FF137D4b0FDCD49DcA30c7CF57E578a026d2789";
}

/// Smart account contracts
pub mod smart_account {
    /// Batch id used when the caller does not pick a nonce space
    pub const DEFAULT_BATCH_ID: u64 = 0;
}

/// Gas accounting defaults (overridable per contract version through `GasOffsets`)
pub mod gas {
    /// Delegate call, event emission and refund bookkeeping charged on top of `handlePayment`
    pub const GAS_USAGE_OFFSET: u64 = 4928 + 2360;
    /// Safety margin added to the required tx gas of a deployed wallet
    pub const DEPLOYED_REQUIRED_TX_GAS_OFFSET: u64 = 30_000;
    /// Safety margin added to the required tx gas estimated with override bytecode
    pub const OVERRIDE_REQUIRED_TX_GAS_OFFSET: u64 = 700_000;
    /// Placeholder `targetTxGas` used while simulating against an undeployed wallet
    pub const TARGET_TX_GAS_PLACEHOLDER: u64 = 500_000;
    /// Verification gas charged before wallet creation costs are added
    pub const BASE_VERIFICATION_GAS: u64 = 100_000;
    /// Token transfer overhead added to the deployment estimate when paying deployment fees
    pub const DEPLOYMENT_FEE_TRANSFER_GAS: u64 = 77_369;
    /// Gas limit forced on relayed transactions of a phantom wallet
    pub const UNDEPLOYED_RELAY_GAS_LIMIT: u64 = 2_000_000;
    /// Gas limit of the no-op user operation that only deploys the wallet
    pub const DEPLOY_ONLY_CALL_GAS: u64 = 21_000;
    /// Gas limit passed to `execFromEntryPoint` for the wallet's inner call
    pub const EXEC_FROM_ENTRY_POINT_GAS: u64 = 200_000;
}

/// Signatures
pub mod signature {
    /// Length of an ECDSA signature (r, s, v)
    pub const SIGNATURE_LENGTH: usize = 65;
    /// Placeholder signature used while estimating (never valid on-chain)
    pub const DUMMY_SIGNATURE: &str = "0xfffffffffffffffffffffffffffffff0000000000000000000000000000000007aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa1c";
}

/// Supported chains
pub mod supported_chains {
    use alloy_chains::NamedChain;

    /// Chains a default configuration is active on
    pub const CHAINS: [NamedChain; 2] = [NamedChain::Goerli, NamedChain::PolygonMumbai];
}

/// Backend services
pub mod services {
    /// Default SDK backend (gas estimation and fee options)
    pub const BACKEND_URL: &str = "https://sdk-backend.staging.biconomy.io/v1";
    /// Default relayer endpoint
    pub const RELAYER_URL: &str = "https://sdk-relayer.staging.biconomy.io/api/v1/relay";
}

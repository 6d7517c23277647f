//! Protocol Constants
//!
//! Fixed-point bases and deployment defaults for the vault and ledger.

/// Virtual price fixed-point configuration
pub mod price {
    /// Fixed-point base of quoted virtual prices ("1.0" = no appreciation)
    pub const VIRTUAL_PRICE_PRECISION: u128 = 1_000_000_000_000_000_000; // 1e18

    /// Virtual price at which one LP unit backs exactly one share
    pub const PEG: u128 = VIRTUAL_PRICE_PRECISION;
}

/// Vault share token metadata
pub mod vault {
    /// Default vault name (USDC/cUSD Mobius LP)
    pub const DEFAULT_NAME: &str = "MobLP USDC/cUSD Vault";
    /// Default vault share symbol
    pub const DEFAULT_SYMBOL: &str = "mobVAULT";
    /// Share decimals, matching the LP token
    pub const SHARE_DECIMALS: u8 = 18;

    /// Fraction of a reward balance paid per redemption.
    /// One recipient by construction, so every redemption pays the whole balance.
    pub const RECIPIENT_SHARE_NUMERATOR: u64 = 1;
    pub const RECIPIENT_SHARE_DENOMINATOR: u64 = 1;
}

/// Synthetic unit metadata and ledger defaults
pub mod ledger {
    /// Default synthetic unit name
    pub const DEFAULT_NAME: &str = "Stabilite USD";
    /// Default synthetic unit symbol
    pub const DEFAULT_SYMBOL: &str = "stabUSD";
    /// Synthetic unit decimals, matching vault shares (minted 1:1)
    pub const DECIMALS: u8 = 18;
    /// Deposit limit of a vault that was never configured; blocks minting
    pub const DEFAULT_DEPOSIT_LIMIT: u64 = 0;
}

/// Reward gauge limits
pub mod gauge {
    /// Number of secondary reward slots a gauge exposes
    pub const MAX_REWARD_TOKENS: usize = 8;
}

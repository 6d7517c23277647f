//! Error Types for Stabilite
//!
//! Every failure aborts the whole operation; contracts roll back both their
//! own state and the host's token balances before returning one of these.

use thiserror::Error;

use crate::types::Address;

/// Result type alias for Stabilite operations
pub type StabiliteResult<T> = Result<T, StabiliteError>;

/// Main error enum for all vault and ledger errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StabiliteError {
    // ============ Authorization Errors ============
    /// Caller lacks the owner privilege
    #[error("caller is not the owner")]
    Unauthorized { expected: Address, actual: Address },

    /// Caller is not the registered minter of an asset
    #[error("caller is not allowed to mint or burn this asset")]
    MintUnauthorized { asset: Address, caller: Address },

    // ============ Ledger Errors ============
    /// Vault is not on the ledger whitelist
    #[error("vault is not whitelisted")]
    VaultNotWhitelisted { vault: Address },

    /// Mint would push the vault reserve over its deposit limit
    #[error("mint amount exceeds deposit limit: reserve {reserve} + {amount} > limit {limit}")]
    DepositLimitExceeded { reserve: u64, amount: u64, limit: u64 },

    /// Burn asks for more than the vault reserve backs
    #[error("burn amount exceeds vault reserve: {amount} > {reserve}")]
    BurnExceedsReserve { amount: u64, reserve: u64 },

    /// New deposit limit would sit below the current reserve
    #[error("deposit limit {limit} is below the current reserve {reserve}")]
    LimitBelowReserve { limit: u64, reserve: u64 },

    // ============ Token Errors ============
    /// Holder balance too small
    #[error("insufficient balance: available {available}, requested {requested}")]
    InsufficientBalance { available: u64, requested: u64 },

    /// Spender allowance too small
    #[error("insufficient allowance: allowed {allowed}, requested {requested}")]
    InsufficientAllowance { allowed: u64, requested: u64 },

    /// Asset is not registered with the token primitive
    #[error("unknown asset")]
    UnknownAsset { asset: Address },

    /// Asset is already registered
    #[error("asset already registered")]
    AssetAlreadyExists { asset: Address },

    // ============ Vault Errors ============
    /// Redemption would pay nothing
    #[error("nothing to redeem")]
    NothingToRedeem { asset: Address },

    /// Withdrawal payout rounds down to zero
    #[error("withdrawal of {shares} shares pays nothing")]
    NothingToWithdraw { shares: u64 },

    /// Virtual price quote is unusable
    #[error("invalid virtual price {price}")]
    InvalidPrice { price: u128 },

    // ============ Collaborator Errors ============
    /// Gauge is not known to the host
    #[error("unknown gauge")]
    UnknownGauge { gauge: Address },

    /// Swap is not known to the host
    #[error("unknown swap")]
    UnknownSwap { swap: Address },

    /// Minter is not known to the host
    #[error("unknown minter")]
    UnknownMinter { minter: Address },

    // ============ Input Errors ============
    /// Zero amount not allowed
    #[error("amount must be greater than zero")]
    ZeroAmount,

    /// Invalid address (e.g., zero address)
    #[error("invalid address: {reason}")]
    InvalidAddress { reason: &'static str },

    // ============ Math Errors ============
    /// Arithmetic overflow occurred
    #[error("arithmetic overflow")]
    Overflow,

    /// Arithmetic underflow occurred
    #[error("arithmetic underflow")]
    Underflow,

    /// Division by zero
    #[error("division by zero")]
    DivisionByZero,

    // ============ State Errors ============
    /// An accounting invariant does not hold
    #[error("invariant violated: {what}")]
    InvariantViolated { what: &'static str },
}

impl StabiliteError {
    /// Returns a stable error code for logging/debugging
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized { .. } => "E001_UNAUTHORIZED",
            Self::MintUnauthorized { .. } => "E002_MINT_UNAUTH",
            Self::VaultNotWhitelisted { .. } => "E010_VAULT_NOT_WHITELISTED",
            Self::DepositLimitExceeded { .. } => "E011_DEPOSIT_LIMIT",
            Self::BurnExceedsReserve { .. } => "E012_BURN_EXCEEDS_RESERVE",
            Self::LimitBelowReserve { .. } => "E013_LIMIT_BELOW_RESERVE",
            Self::InsufficientBalance { .. } => "E020_INSUFFICIENT_BALANCE",
            Self::InsufficientAllowance { .. } => "E021_INSUFFICIENT_ALLOWANCE",
            Self::UnknownAsset { .. } => "E022_UNKNOWN_ASSET",
            Self::AssetAlreadyExists { .. } => "E023_ASSET_EXISTS",
            Self::NothingToRedeem { .. } => "E030_NOTHING_TO_REDEEM",
            Self::NothingToWithdraw { .. } => "E031_NOTHING_TO_WITHDRAW",
            Self::InvalidPrice { .. } => "E032_INVALID_PRICE",
            Self::UnknownGauge { .. } => "E040_UNKNOWN_GAUGE",
            Self::UnknownSwap { .. } => "E041_UNKNOWN_SWAP",
            Self::UnknownMinter { .. } => "E042_UNKNOWN_MINTER",
            Self::ZeroAmount => "E050_ZERO_AMOUNT",
            Self::InvalidAddress { .. } => "E051_INVALID_ADDRESS",
            Self::Overflow => "E060_OVERFLOW",
            Self::Underflow => "E061_UNDERFLOW",
            Self::DivisionByZero => "E062_DIV_ZERO",
            Self::InvariantViolated { .. } => "E070_INVARIANT",
        }
    }

    /// Returns true if the caller can fix this by retrying with other inputs
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::DepositLimitExceeded { .. }
                | Self::BurnExceedsReserve { .. }
                | Self::InsufficientBalance { .. }
                | Self::InsufficientAllowance { .. }
                | Self::NothingToRedeem { .. }
                | Self::NothingToWithdraw { .. }
                | Self::ZeroAmount
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_error_codes_unique() {
        let errors = [
            StabiliteError::Unauthorized { expected: [1u8; 32], actual: [2u8; 32] },
            StabiliteError::VaultNotWhitelisted { vault: [3u8; 32] },
            StabiliteError::DepositLimitExceeded { reserve: 1000, amount: 1, limit: 1000 },
            StabiliteError::BurnExceedsReserve { amount: 1001, reserve: 1000 },
            StabiliteError::NothingToRedeem { asset: [4u8; 32] },
            StabiliteError::ZeroAmount,
            StabiliteError::Overflow,
        ];

        let codes: Vec<_> = errors.iter().map(|e| e.code()).collect();
        let unique: BTreeSet<_> = codes.iter().collect();
        assert_eq!(codes.len(), unique.len(), "Error codes must be unique");
    }

    #[test]
    fn test_messages_name_the_failure() {
        let err = StabiliteError::DepositLimitExceeded { reserve: 1000, amount: 1, limit: 1000 };
        assert!(err.to_string().starts_with("mint amount exceeds deposit limit"));

        let err = StabiliteError::BurnExceedsReserve { amount: 1001, reserve: 1000 };
        assert!(err.to_string().starts_with("burn amount exceeds vault reserve"));

        let err = StabiliteError::VaultNotWhitelisted { vault: [0u8; 32] };
        assert_eq!(err.to_string(), "vault is not whitelisted");
    }

    #[test]
    fn test_recoverable() {
        assert!(StabiliteError::ZeroAmount.is_recoverable());
        assert!(!StabiliteError::Overflow.is_recoverable());
        assert!(!StabiliteError::Unauthorized { expected: [0u8; 32], actual: [1u8; 32] }
            .is_recoverable());
    }
}

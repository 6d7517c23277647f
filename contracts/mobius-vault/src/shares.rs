//! Share accounting
//!
//! Shares are minted 1:1 against deposited LP. Burning them is priced off
//! the pool's virtual price, so LP value gained above the peg stays in the
//! vault as redeemable surplus.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use stabilite_common::{
    errors::{StabiliteError, StabiliteResult},
    math::{calculate_underlying_surplus, calculate_withdraw_payout, safe_add, safe_sub},
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct ShareLedger {
    /// Outstanding shares; mirrors the share asset's total supply
    share_supply: u64,
}

impl ShareLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn share_supply(&self) -> u64 {
        self.share_supply
    }

    /// Shares issued for depositing `amount` LP
    pub fn shares_for_deposit(&self, amount: u64) -> StabiliteResult<u64> {
        if amount == 0 {
            return Err(StabiliteError::ZeroAmount);
        }
        safe_add(self.share_supply, amount)?;
        Ok(amount)
    }

    /// LP paid for burning `shares`
    pub fn underlying_for_withdraw(
        &self,
        shares: u64,
        underlying_held: u64,
        virtual_price: u128,
    ) -> StabiliteResult<u64> {
        if shares == 0 {
            return Err(StabiliteError::ZeroAmount);
        }
        let payout =
            calculate_withdraw_payout(shares, self.share_supply, underlying_held, virtual_price)?;
        if payout == 0 {
            return Err(StabiliteError::NothingToWithdraw { shares });
        }
        Ok(payout)
    }

    /// LP held beyond what outstanding shares are owed at `virtual_price`
    pub fn surplus(&self, underlying_held: u64, virtual_price: u128) -> StabiliteResult<u64> {
        calculate_underlying_surplus(underlying_held, self.share_supply, virtual_price)
    }

    pub fn record_mint(&mut self, shares: u64) -> StabiliteResult<()> {
        self.share_supply = safe_add(self.share_supply, shares)?;
        Ok(())
    }

    pub fn record_burn(&mut self, shares: u64) -> StabiliteResult<()> {
        self.share_supply = safe_sub(self.share_supply, shares)?;
        Ok(())
    }
}

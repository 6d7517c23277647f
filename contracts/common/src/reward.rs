//! Reward Accumulator
//!
//! Per-asset balances of third-party rewards a vault has claimed but not yet
//! paid out. Balances only grow through [`RewardAccumulator::credit`] (reward
//! claims) and only shrink through [`RewardAccumulator::debit`] (redemptions).

use std::collections::BTreeMap;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::errors::{StabiliteError, StabiliteResult};
use crate::math::{proportional_share, safe_add};
use crate::types::AssetId;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct RewardAccumulator {
    held: BTreeMap<AssetId, u64>,
}

impl RewardAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a claimed amount, returning the new held balance
    pub fn credit(&mut self, asset: AssetId, amount: u64) -> StabiliteResult<u64> {
        let current = self.held(&asset);
        let updated = safe_add(current, amount)?;
        if updated > 0 {
            self.held.insert(asset, updated);
        }
        Ok(updated)
    }

    /// Balance currently held for `asset`
    pub fn held(&self, asset: &AssetId) -> u64 {
        self.held.get(asset).copied().unwrap_or(0)
    }

    /// Amount a redemption of `numerator / denominator` would pay
    pub fn redeemable(
        &self,
        asset: &AssetId,
        numerator: u64,
        denominator: u64,
    ) -> StabiliteResult<u64> {
        proportional_share(self.held(asset), numerator, denominator)
    }

    /// Remove a redeemed amount
    pub fn debit(&mut self, asset: &AssetId, amount: u64) -> StabiliteResult<()> {
        let current = self.held(asset);
        if amount > current {
            return Err(StabiliteError::InsufficientBalance {
                available: current,
                requested: amount,
            });
        }
        let remaining = current - amount;
        if remaining == 0 {
            self.held.remove(asset);
        } else {
            self.held.insert(*asset, remaining);
        }
        Ok(())
    }

    /// Assets with a non-zero held balance
    pub fn assets(&self) -> impl Iterator<Item = (&AssetId, &u64)> {
        self.held.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }
}

//! Token Operations Module
//!
//! The fungible-token bookkeeping primitive used for LP tokens, reward
//! tokens, vault shares and the synthetic unit.
//!
//! ## Key Features
//!
//! - **Mint Authorization**: Each asset has exactly one minter (its issuing contract)
//! - **Allowances**: `transfer_from` spends a pre-approved allowance
//! - **Supply Tracking**: Total supply plus cumulative minted/burned
//! - **All-or-nothing**: Every check runs before any balance moves

use std::collections::BTreeMap;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::errors::{StabiliteError, StabiliteResult};
use crate::math::{safe_add, safe_sub};
use crate::types::{is_zero, Address, AssetId};

// ============================================================================
// Types
// ============================================================================

/// Static token metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct TokenMetadata {
    /// Token name
    pub name: String,
    /// Token symbol
    pub symbol: String,
    /// Decimal places
    pub decimals: u8,
}

impl TokenMetadata {
    pub fn new(name: impl Into<String>, symbol: impl Into<String>, decimals: u8) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            decimals,
        }
    }
}

/// Token supply state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct TokenSupply {
    /// Current total supply
    pub total_supply: u64,
    /// Total minted (cumulative)
    pub total_minted: u64,
    /// Total burned (cumulative)
    pub total_burned: u64,
}

impl TokenSupply {
    /// Circulating supply derived from the cumulative counters
    pub fn circulating(&self) -> u64 {
        self.total_minted.saturating_sub(self.total_burned)
    }
}

/// Book of a single asset
#[derive(Debug, Clone, PartialEq, Eq)]
struct AssetBook {
    metadata: TokenMetadata,
    minter: Address,
    supply: TokenSupply,
    balances: BTreeMap<Address, u64>,
    /// (owner, spender) -> remaining allowance
    allowances: BTreeMap<(Address, Address), u64>,
}

impl AssetBook {
    fn balance(&self, owner: &Address) -> u64 {
        self.balances.get(owner).copied().unwrap_or(0)
    }

    fn allowance(&self, owner: &Address, spender: &Address) -> u64 {
        self.allowances.get(&(*owner, *spender)).copied().unwrap_or(0)
    }

    fn set_balance(&mut self, owner: Address, balance: u64) {
        if balance == 0 {
            self.balances.remove(&owner);
        } else {
            self.balances.insert(owner, balance);
        }
    }

    fn move_balance(&mut self, from: &Address, to: &Address, amount: u64) -> StabiliteResult<()> {
        let from_balance = self.balance(from);
        if from_balance < amount {
            return Err(StabiliteError::InsufficientBalance {
                available: from_balance,
                requested: amount,
            });
        }
        if from == to {
            return Ok(());
        }
        let to_balance = safe_add(self.balance(to), amount)?;

        self.set_balance(*from, from_balance - amount);
        self.set_balance(*to, to_balance);
        Ok(())
    }
}

/// Balances, allowances and supply of every registered asset
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenLedger {
    assets: BTreeMap<AssetId, AssetBook>,
}

// ============================================================================
// Core Token Functions
// ============================================================================

impl TokenLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new asset whose supply only `minter` may change
    pub fn register_asset(
        &mut self,
        asset: AssetId,
        minter: Address,
        metadata: TokenMetadata,
    ) -> StabiliteResult<()> {
        if is_zero(&asset) {
            return Err(StabiliteError::InvalidAddress {
                reason: "asset cannot be the zero address",
            });
        }
        if self.assets.contains_key(&asset) {
            return Err(StabiliteError::AssetAlreadyExists { asset });
        }

        self.assets.insert(
            asset,
            AssetBook {
                metadata,
                minter,
                supply: TokenSupply::default(),
                balances: BTreeMap::new(),
                allowances: BTreeMap::new(),
            },
        );
        Ok(())
    }

    fn book(&self, asset: &AssetId) -> StabiliteResult<&AssetBook> {
        self.assets
            .get(asset)
            .ok_or(StabiliteError::UnknownAsset { asset: *asset })
    }

    fn book_mut(&mut self, asset: &AssetId) -> StabiliteResult<&mut AssetBook> {
        self.assets
            .get_mut(asset)
            .ok_or(StabiliteError::UnknownAsset { asset: *asset })
    }

    pub fn metadata(&self, asset: &AssetId) -> StabiliteResult<&TokenMetadata> {
        self.book(asset).map(|book| &book.metadata)
    }

    pub fn supply(&self, asset: &AssetId) -> StabiliteResult<&TokenSupply> {
        self.book(asset).map(|book| &book.supply)
    }

    /// Balance of `owner`; zero for unknown assets
    pub fn balance_of(&self, asset: &AssetId, owner: &Address) -> u64 {
        self.assets
            .get(asset)
            .map(|book| book.balance(owner))
            .unwrap_or(0)
    }

    /// Total supply; zero for unknown assets
    pub fn total_supply(&self, asset: &AssetId) -> u64 {
        self.assets
            .get(asset)
            .map(|book| book.supply.total_supply)
            .unwrap_or(0)
    }

    pub fn allowance(&self, asset: &AssetId, owner: &Address, spender: &Address) -> u64 {
        self.assets
            .get(asset)
            .map(|book| book.allowance(owner, spender))
            .unwrap_or(0)
    }

    /// Set the allowance of `spender` over `owner`'s balance
    pub fn approve(
        &mut self,
        asset: &AssetId,
        owner: &Address,
        spender: &Address,
        amount: u64,
    ) -> StabiliteResult<()> {
        if is_zero(spender) {
            return Err(StabiliteError::InvalidAddress {
                reason: "cannot approve the zero address",
            });
        }
        let book = self.book_mut(asset)?;
        if amount == 0 {
            book.allowances.remove(&(*owner, *spender));
        } else {
            book.allowances.insert((*owner, *spender), amount);
        }
        Ok(())
    }

    /// Move `amount` from `from` to `to`
    pub fn transfer(
        &mut self,
        asset: &AssetId,
        from: &Address,
        to: &Address,
        amount: u64,
    ) -> StabiliteResult<()> {
        if is_zero(to) {
            return Err(StabiliteError::InvalidAddress {
                reason: "cannot transfer to the zero address",
            });
        }
        self.book_mut(asset)?.move_balance(from, to, amount)
    }

    /// Move `amount` from `from` to `to`, spending `spender`'s allowance
    pub fn transfer_from(
        &mut self,
        asset: &AssetId,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: u64,
    ) -> StabiliteResult<()> {
        if is_zero(to) {
            return Err(StabiliteError::InvalidAddress {
                reason: "cannot transfer to the zero address",
            });
        }
        let book = self.book_mut(asset)?;

        let allowed = book.allowance(from, spender);
        if allowed < amount {
            return Err(StabiliteError::InsufficientAllowance {
                allowed,
                requested: amount,
            });
        }

        book.move_balance(from, to, amount)?;

        let remaining = allowed - amount;
        if remaining == 0 {
            book.allowances.remove(&(*from, *spender));
        } else {
            book.allowances.insert((*from, *spender), remaining);
        }
        Ok(())
    }

    /// Create `amount` new units for `to` (minter only)
    pub fn mint(
        &mut self,
        asset: &AssetId,
        minter: &Address,
        to: &Address,
        amount: u64,
    ) -> StabiliteResult<()> {
        if is_zero(to) {
            return Err(StabiliteError::InvalidAddress {
                reason: "cannot mint to the zero address",
            });
        }
        let book = self.book_mut(asset)?;
        if book.minter != *minter {
            return Err(StabiliteError::MintUnauthorized {
                asset: *asset,
                caller: *minter,
            });
        }

        let new_supply = safe_add(book.supply.total_supply, amount)?;
        let new_balance = safe_add(book.balance(to), amount)?;

        book.supply.total_supply = new_supply;
        book.supply.total_minted = book.supply.total_minted.saturating_add(amount);
        book.set_balance(*to, new_balance);
        Ok(())
    }

    /// Destroy `amount` units held by `from` (minter only)
    pub fn burn(
        &mut self,
        asset: &AssetId,
        minter: &Address,
        from: &Address,
        amount: u64,
    ) -> StabiliteResult<()> {
        let book = self.book_mut(asset)?;
        if book.minter != *minter {
            return Err(StabiliteError::MintUnauthorized {
                asset: *asset,
                caller: *minter,
            });
        }

        let balance = book.balance(from);
        if balance < amount {
            return Err(StabiliteError::InsufficientBalance {
                available: balance,
                requested: amount,
            });
        }
        let new_supply = safe_sub(book.supply.total_supply, amount)?;

        book.supply.total_supply = new_supply;
        book.supply.total_burned = book.supply.total_burned.saturating_add(amount);
        book.set_balance(*from, balance - amount);
        Ok(())
    }
}

//! Host Collaborators
//!
//! The vault and ledger never own token balances or external protocol state
//! directly. Everything outside their own bookkeeping is reached through the
//! traits in this module:
//!
//! - [`TokenHost`]: fungible token primitive (LP, rewards, shares, synthetic)
//! - [`SwapHost`]: virtual price of an LP pool
//! - [`GaugeHost`]: LP staking and secondary reward claims
//! - [`MinterHost`]: primary reward emissions
//! - [`Transactional`]: checkpoint / commit / revert of host state
//!
//! [`InMemoryHost`] implements all of them and is what the test suites run
//! against. [`execute_atomic`] wraps a contract operation so that a failure
//! restores both the host and the contract state.

use std::collections::BTreeMap;

use crate::constants::gauge::MAX_REWARD_TOKENS;
use crate::constants::price::PEG;
use crate::errors::{StabiliteError, StabiliteResult};
use crate::math::{safe_add, safe_sub, validate_virtual_price};
use crate::token_ops::{TokenLedger, TokenMetadata};
use crate::types::{Address, AssetId};

// ============================================================================
// Collaborator Traits
// ============================================================================

/// Fungible token primitive
pub trait TokenHost {
    fn register_asset(
        &mut self,
        asset: AssetId,
        minter: Address,
        metadata: TokenMetadata,
    ) -> StabiliteResult<()>;

    fn balance_of(&self, asset: &AssetId, owner: &Address) -> u64;

    fn total_supply(&self, asset: &AssetId) -> u64;

    fn allowance(&self, asset: &AssetId, owner: &Address, spender: &Address) -> u64;

    fn approve(
        &mut self,
        asset: &AssetId,
        owner: &Address,
        spender: &Address,
        amount: u64,
    ) -> StabiliteResult<()>;

    fn transfer(
        &mut self,
        asset: &AssetId,
        from: &Address,
        to: &Address,
        amount: u64,
    ) -> StabiliteResult<()>;

    fn transfer_from(
        &mut self,
        asset: &AssetId,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: u64,
    ) -> StabiliteResult<()>;

    fn mint(
        &mut self,
        asset: &AssetId,
        minter: &Address,
        to: &Address,
        amount: u64,
    ) -> StabiliteResult<()>;

    fn burn(
        &mut self,
        asset: &AssetId,
        minter: &Address,
        from: &Address,
        amount: u64,
    ) -> StabiliteResult<()>;
}

/// LP pool pricing
pub trait SwapHost {
    /// Value of one LP unit in peg units, scaled by 1e18
    fn virtual_price(&self, swap: &Address) -> StabiliteResult<u128>;
}

/// Reward gauge holding staked LP
pub trait GaugeHost {
    /// LP token the gauge accepts
    fn lp_token(&self, gauge: &Address) -> StabiliteResult<AssetId>;

    /// Secondary reward tokens, at most `MAX_REWARD_TOKENS`
    fn reward_tokens(&self, gauge: &Address) -> StabiliteResult<Vec<AssetId>>;

    fn staked_balance(&self, gauge: &Address, account: &Address) -> u64;

    /// Move `amount` LP from `account` into gauge custody
    fn stake(&mut self, gauge: &Address, account: &Address, amount: u64) -> StabiliteResult<()>;

    /// Return `amount` staked LP to `account`
    fn unstake(&mut self, gauge: &Address, account: &Address, amount: u64)
        -> StabiliteResult<()>;

    /// Pay every pending secondary reward of `account` to `account`
    fn claim(&mut self, gauge: &Address, account: &Address) -> StabiliteResult<()>;
}

/// Primary reward emissions
pub trait MinterHost {
    fn reward_token(&self, minter: &Address) -> StabiliteResult<AssetId>;

    /// Mint the emissions `beneficiary` has earned on `gauge`
    fn mint_for(
        &mut self,
        minter: &Address,
        gauge: &Address,
        beneficiary: &Address,
    ) -> StabiliteResult<()>;
}

/// Nested checkpoints over host state
pub trait Transactional {
    fn checkpoint(&mut self);

    /// Discard the latest checkpoint, keeping current state
    fn commit(&mut self);

    /// Restore the latest checkpoint
    fn revert(&mut self);
}

/// Everything a contract needs from its environment
pub trait Host: TokenHost + SwapHost + GaugeHost + MinterHost + Transactional {}

impl<T> Host for T where T: TokenHost + SwapHost + GaugeHost + MinterHost + Transactional {}

// ============================================================================
// Atomic Execution
// ============================================================================

/// Run `op` so that it either fully applies or leaves no trace
///
/// The host is checkpointed and the contract state cloned up front; on error
/// both are restored before the error is returned.
pub fn execute_atomic<H, S, T, F>(host: &mut H, state: &mut S, op: F) -> StabiliteResult<T>
where
    H: Transactional,
    S: Clone,
    F: FnOnce(&mut H, &mut S) -> StabiliteResult<T>,
{
    host.checkpoint();
    let snapshot = state.clone();

    match op(host, state) {
        Ok(value) => {
            host.commit();
            Ok(value)
        }
        Err(err) => {
            host.revert();
            *state = snapshot;
            tracing::debug!(code = err.code(), error = %err, "operation rolled back");
            Err(err)
        }
    }
}

// ============================================================================
// In-Memory Host
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
struct GaugeState {
    lp_token: AssetId,
    reward_tokens: Vec<AssetId>,
    staked: BTreeMap<Address, u64>,
    /// (account, reward token) -> claimable
    pending: BTreeMap<(Address, AssetId), u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct MinterState {
    reward_token: AssetId,
    /// (gauge, account) -> mintable
    pending: BTreeMap<(Address, Address), u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct HostState {
    tokens: TokenLedger,
    swaps: BTreeMap<Address, u128>,
    gauges: BTreeMap<Address, GaugeState>,
    minters: BTreeMap<Address, MinterState>,
}

/// Reference host keeping every collaborator in memory
///
/// Tokens created through [`InMemoryHost::create_token`] are issued by the
/// host itself and use their own id as minter key. Gauges pay secondary
/// rewards and minters pay emissions by minting those tokens on claim.
#[derive(Debug, Clone, Default)]
pub struct InMemoryHost {
    state: HostState,
    checkpoints: Vec<HostState>,
}

impl InMemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a host-issued token
    pub fn create_token(
        &mut self,
        asset: AssetId,
        name: &str,
        symbol: &str,
        decimals: u8,
    ) -> StabiliteResult<()> {
        self.state
            .tokens
            .register_asset(asset, asset, TokenMetadata::new(name, symbol, decimals))
    }

    /// Mint a host-issued token to `to`
    pub fn faucet(&mut self, asset: &AssetId, to: &Address, amount: u64) -> StabiliteResult<()> {
        self.state.tokens.mint(asset, asset, to, amount)
    }

    /// Register an LP pool quoting at the peg
    pub fn create_swap(&mut self, swap: Address) {
        self.state.swaps.insert(swap, PEG);
    }

    pub fn set_virtual_price(&mut self, swap: &Address, price: u128) -> StabiliteResult<()> {
        validate_virtual_price(price)?;
        let quote = self
            .state
            .swaps
            .get_mut(swap)
            .ok_or(StabiliteError::UnknownSwap { swap: *swap })?;
        *quote = price;
        Ok(())
    }

    /// Register a gauge staking `lp_token` and paying `reward_tokens`
    pub fn create_gauge(
        &mut self,
        gauge: Address,
        lp_token: AssetId,
        reward_tokens: Vec<AssetId>,
    ) -> StabiliteResult<()> {
        if reward_tokens.len() > MAX_REWARD_TOKENS {
            return Err(StabiliteError::InvariantViolated {
                what: "too many gauge reward tokens",
            });
        }
        self.state.gauges.insert(
            gauge,
            GaugeState {
                lp_token,
                reward_tokens,
                staked: BTreeMap::new(),
                pending: BTreeMap::new(),
            },
        );
        Ok(())
    }

    pub fn create_minter(&mut self, minter: Address, reward_token: AssetId) {
        self.state.minters.insert(
            minter,
            MinterState {
                reward_token,
                pending: BTreeMap::new(),
            },
        );
    }

    /// Accrue a secondary reward for `account` on `gauge`
    pub fn accrue_gauge_reward(
        &mut self,
        gauge: &Address,
        account: &Address,
        asset: &AssetId,
        amount: u64,
    ) -> StabiliteResult<()> {
        let state = self
            .state
            .gauges
            .get_mut(gauge)
            .ok_or(StabiliteError::UnknownGauge { gauge: *gauge })?;
        if !state.reward_tokens.contains(asset) {
            return Err(StabiliteError::UnknownAsset { asset: *asset });
        }
        let pending = state.pending.entry((*account, *asset)).or_insert(0);
        *pending = safe_add(*pending, amount)?;
        Ok(())
    }

    /// Accrue primary emissions for `account` staking on `gauge`
    pub fn accrue_minter_reward(
        &mut self,
        minter: &Address,
        gauge: &Address,
        account: &Address,
        amount: u64,
    ) -> StabiliteResult<()> {
        let state = self
            .state
            .minters
            .get_mut(minter)
            .ok_or(StabiliteError::UnknownMinter { minter: *minter })?;
        let pending = state.pending.entry((*gauge, *account)).or_insert(0);
        *pending = safe_add(*pending, amount)?;
        Ok(())
    }

    /// Number of open checkpoints
    pub fn checkpoint_depth(&self) -> usize {
        self.checkpoints.len()
    }

    fn gauge(&self, gauge: &Address) -> StabiliteResult<&GaugeState> {
        self.state
            .gauges
            .get(gauge)
            .ok_or(StabiliteError::UnknownGauge { gauge: *gauge })
    }

    fn minter(&self, minter: &Address) -> StabiliteResult<&MinterState> {
        self.state
            .minters
            .get(minter)
            .ok_or(StabiliteError::UnknownMinter { minter: *minter })
    }
}

impl TokenHost for InMemoryHost {
    fn register_asset(
        &mut self,
        asset: AssetId,
        minter: Address,
        metadata: TokenMetadata,
    ) -> StabiliteResult<()> {
        self.state.tokens.register_asset(asset, minter, metadata)
    }

    fn balance_of(&self, asset: &AssetId, owner: &Address) -> u64 {
        self.state.tokens.balance_of(asset, owner)
    }

    fn total_supply(&self, asset: &AssetId) -> u64 {
        self.state.tokens.total_supply(asset)
    }

    fn allowance(&self, asset: &AssetId, owner: &Address, spender: &Address) -> u64 {
        self.state.tokens.allowance(asset, owner, spender)
    }

    fn approve(
        &mut self,
        asset: &AssetId,
        owner: &Address,
        spender: &Address,
        amount: u64,
    ) -> StabiliteResult<()> {
        self.state.tokens.approve(asset, owner, spender, amount)
    }

    fn transfer(
        &mut self,
        asset: &AssetId,
        from: &Address,
        to: &Address,
        amount: u64,
    ) -> StabiliteResult<()> {
        self.state.tokens.transfer(asset, from, to, amount)
    }

    fn transfer_from(
        &mut self,
        asset: &AssetId,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: u64,
    ) -> StabiliteResult<()> {
        self.state.tokens.transfer_from(asset, spender, from, to, amount)
    }

    fn mint(
        &mut self,
        asset: &AssetId,
        minter: &Address,
        to: &Address,
        amount: u64,
    ) -> StabiliteResult<()> {
        self.state.tokens.mint(asset, minter, to, amount)
    }

    fn burn(
        &mut self,
        asset: &AssetId,
        minter: &Address,
        from: &Address,
        amount: u64,
    ) -> StabiliteResult<()> {
        self.state.tokens.burn(asset, minter, from, amount)
    }
}

impl SwapHost for InMemoryHost {
    fn virtual_price(&self, swap: &Address) -> StabiliteResult<u128> {
        self.state
            .swaps
            .get(swap)
            .copied()
            .ok_or(StabiliteError::UnknownSwap { swap: *swap })
    }
}

impl GaugeHost for InMemoryHost {
    fn lp_token(&self, gauge: &Address) -> StabiliteResult<AssetId> {
        self.gauge(gauge).map(|state| state.lp_token)
    }

    fn reward_tokens(&self, gauge: &Address) -> StabiliteResult<Vec<AssetId>> {
        self.gauge(gauge).map(|state| state.reward_tokens.clone())
    }

    fn staked_balance(&self, gauge: &Address, account: &Address) -> u64 {
        self.state
            .gauges
            .get(gauge)
            .and_then(|state| state.staked.get(account).copied())
            .unwrap_or(0)
    }

    fn stake(&mut self, gauge: &Address, account: &Address, amount: u64) -> StabiliteResult<()> {
        let lp_token = self.gauge(gauge)?.lp_token;
        let staked = safe_add(self.staked_balance(gauge, account), amount)?;

        self.state.tokens.transfer(&lp_token, account, gauge, amount)?;
        if let Some(state) = self.state.gauges.get_mut(gauge) {
            state.staked.insert(*account, staked);
        }
        Ok(())
    }

    fn unstake(
        &mut self,
        gauge: &Address,
        account: &Address,
        amount: u64,
    ) -> StabiliteResult<()> {
        let lp_token = self.gauge(gauge)?.lp_token;
        let current = self.staked_balance(gauge, account);
        if current < amount {
            return Err(StabiliteError::InsufficientBalance {
                available: current,
                requested: amount,
            });
        }
        let staked = safe_sub(current, amount)?;

        self.state.tokens.transfer(&lp_token, gauge, account, amount)?;
        if let Some(state) = self.state.gauges.get_mut(gauge) {
            state.staked.insert(*account, staked);
        }
        Ok(())
    }

    fn claim(&mut self, gauge: &Address, account: &Address) -> StabiliteResult<()> {
        let reward_tokens = self.gauge(gauge)?.reward_tokens.clone();

        for asset in reward_tokens {
            let amount = self
                .state
                .gauges
                .get_mut(gauge)
                .and_then(|state| state.pending.remove(&(*account, asset)))
                .unwrap_or(0);
            if amount > 0 {
                self.state.tokens.mint(&asset, &asset, account, amount)?;
            }
        }
        Ok(())
    }
}

impl MinterHost for InMemoryHost {
    fn reward_token(&self, minter: &Address) -> StabiliteResult<AssetId> {
        self.minter(minter).map(|state| state.reward_token)
    }

    fn mint_for(
        &mut self,
        minter: &Address,
        gauge: &Address,
        beneficiary: &Address,
    ) -> StabiliteResult<()> {
        let reward_token = self.minter(minter)?.reward_token;
        let amount = self
            .state
            .minters
            .get_mut(minter)
            .and_then(|state| state.pending.remove(&(*gauge, *beneficiary)))
            .unwrap_or(0);

        if amount > 0 {
            self.state
                .tokens
                .mint(&reward_token, &reward_token, beneficiary, amount)?;
        }
        Ok(())
    }
}

impl Transactional for InMemoryHost {
    fn checkpoint(&mut self) {
        self.checkpoints.push(self.state.clone());
    }

    fn commit(&mut self) {
        self.checkpoints.pop();
    }

    fn revert(&mut self) {
        if let Some(saved) = self.checkpoints.pop() {
            self.state = saved;
        }
    }
}

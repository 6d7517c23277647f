//! Mobius Vault Contract
//!
//! Custodies a single Mobius LP position, staked in its reward gauge, and
//! issues vault shares 1:1 against deposited LP.
//!
//! ## Rewards
//!
//! Two kinds of value accrue to the vault without belonging to depositors:
//!
//! - **Gauge rewards**: the minter's primary emissions and the gauge's
//!   secondary reward tokens, pulled in by `claim_rewards` and pooled in a
//!   [`RewardAccumulator`].
//! - **LP appreciation**: when the pool's virtual price rises above the peg,
//!   fewer LP units back the outstanding shares. The excess is redeemable by
//!   passing the gauge (or LP token) address to `redeem_reward`.
//!
//! Both are only ever paid to the reward recipient chosen by the owner.
//!
//! ## Atomicity
//!
//! Every mutating entry point runs inside [`execute_atomic`]. Events are
//! pushed to the caller's [`CallContext`] after the operation commits.

pub mod shares;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use stabilite_common::{
    access_control::{CallContext, Ownable},
    constants::vault,
    errors::{StabiliteError, StabiliteResult},
    events::StabiliteEvent,
    host::{execute_atomic, Host, TokenHost},
    math::{safe_add, validate_virtual_price},
    reward::RewardAccumulator,
    token_ops::TokenMetadata,
    types::{derive_contract_address, is_zero, Address, AssetAmount, AssetId},
};

pub use shares::ShareLedger;

// ============ Configuration ============

/// Deployment parameters of a vault
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct VaultConfig {
    /// Share token name
    #[serde(default = "default_name")]
    pub name: String,
    /// Share token symbol; also salts the vault address
    #[serde(default = "default_symbol")]
    pub symbol: String,
    /// Primary reward minter
    pub minter: Address,
    /// Gauge the LP is staked in
    pub gauge: Address,
    /// Pool quoting the LP virtual price
    pub swap: Address,
    /// Initial reward recipient
    pub reward_recipient: Address,
}

fn default_name() -> String {
    vault::DEFAULT_NAME.to_string()
}

fn default_symbol() -> String {
    vault::DEFAULT_SYMBOL.to_string()
}

impl VaultConfig {
    pub fn new(minter: Address, gauge: Address, swap: Address, reward_recipient: Address) -> Self {
        Self {
            name: default_name(),
            symbol: default_symbol(),
            minter,
            gauge,
            swap,
            reward_recipient,
        }
    }

    pub fn with_token(mut self, name: impl Into<String>, symbol: impl Into<String>) -> Self {
        self.name = name.into();
        self.symbol = symbol.into();
        self
    }

    fn validate(&self) -> StabiliteResult<()> {
        if is_zero(&self.minter) || is_zero(&self.gauge) || is_zero(&self.swap) {
            return Err(StabiliteError::InvalidAddress {
                reason: "vault collaborators cannot be the zero address",
            });
        }
        if is_zero(&self.reward_recipient) {
            return Err(StabiliteError::InvalidAddress {
                reason: "reward recipient cannot be the zero address",
            });
        }
        Ok(())
    }
}

// ============ Vault State ============

/// Persistent state of a vault
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct VaultState {
    pub name: String,
    pub symbol: String,
    /// LP token accepted by the gauge
    pub underlying: AssetId,
    pub gauge: Address,
    pub minter: Address,
    pub swap: Address,
    pub reward_recipient: Address,
    pub ownable: Ownable,
    pub shares: ShareLedger,
    pub rewards: RewardAccumulator,
}

impl VaultState {
    /// Redemptions of these assets pay LP appreciation instead of pooled rewards
    fn is_underlying(&self, asset: &AssetId) -> bool {
        *asset == self.gauge || *asset == self.underlying
    }
}

/// A deployed vault; its address doubles as the share asset id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vault {
    address: Address,
    state: VaultState,
}

// ============ Host Helpers ============

/// LP attributable to the vault: staked plus any loose balance
fn underlying_held<H: Host>(host: &H, vault: &Address, state: &VaultState) -> StabiliteResult<u64> {
    safe_add(
        host.staked_balance(&state.gauge, vault),
        host.balance_of(&state.underlying, vault),
    )
}

/// Pay `amount` LP to `to`, unstaking whatever the loose balance lacks
fn release_underlying<H: Host>(
    host: &mut H,
    vault: &Address,
    state: &VaultState,
    to: &Address,
    amount: u64,
) -> StabiliteResult<()> {
    let loose = host.balance_of(&state.underlying, vault);
    if loose < amount {
        host.unstake(&state.gauge, vault, amount - loose)?;
    }
    host.transfer(&state.underlying, vault, to, amount)
}

/// Primary and secondary reward assets, excluding LP and shares
fn reward_assets<H: Host>(host: &H, vault: &Address, state: &VaultState) -> StabiliteResult<Vec<AssetId>> {
    let mut assets = vec![host.reward_token(&state.minter)?];
    assets.extend(host.reward_tokens(&state.gauge)?);

    let mut tracked: Vec<AssetId> = Vec::with_capacity(assets.len());
    for asset in assets {
        if is_zero(&asset) || asset == *vault || state.is_underlying(&asset) {
            continue;
        }
        if !tracked.contains(&asset) {
            tracked.push(asset);
        }
    }
    Ok(tracked)
}

fn ensure_recipient(recipient: &Address) -> StabiliteResult<()> {
    if is_zero(recipient) {
        return Err(StabiliteError::InvalidAddress {
            reason: "recipient cannot be the zero address",
        });
    }
    Ok(())
}

// ============ Vault Operations ============

impl Vault {
    /// Deploy a vault owned by the caller
    ///
    /// The underlying LP token is read from the gauge. The share asset is
    /// registered with the vault as its only minter.
    pub fn deploy<H: Host>(
        ctx: &CallContext,
        host: &mut H,
        config: VaultConfig,
    ) -> StabiliteResult<Self> {
        config.validate()?;
        let ownable = Ownable::new(ctx.caller)?;

        let address = derive_contract_address(&ctx.caller, config.symbol.as_bytes());
        let underlying = host.lp_token(&config.gauge)?;
        host.reward_token(&config.minter)?;
        validate_virtual_price(host.virtual_price(&config.swap)?)?;

        host.register_asset(
            address,
            address,
            TokenMetadata::new(config.name.clone(), config.symbol.clone(), vault::SHARE_DECIMALS),
        )?;

        tracing::info!(
            vault = ?address,
            owner = ?ctx.caller,
            symbol = %config.symbol,
            "vault deployed"
        );

        Ok(Self {
            address,
            state: VaultState {
                name: config.name,
                symbol: config.symbol,
                underlying,
                gauge: config.gauge,
                minter: config.minter,
                swap: config.swap,
                reward_recipient: config.reward_recipient,
                ownable,
                shares: ShareLedger::new(),
                rewards: RewardAccumulator::new(),
            },
        })
    }

    /// Rebuild a vault from persisted state
    pub fn from_state(address: Address, state: VaultState) -> Self {
        Self { address, state }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn state(&self) -> &VaultState {
        &self.state
    }

    pub fn owner(&self) -> Address {
        self.state.ownable.owner()
    }

    pub fn reward_recipient(&self) -> Address {
        self.state.reward_recipient
    }

    pub fn underlying(&self) -> AssetId {
        self.state.underlying
    }

    pub fn gauge(&self) -> Address {
        self.state.gauge
    }

    /// Deposit `amount` LP from the caller and mint shares to `recipient`
    ///
    /// The caller must have approved the vault for `amount` LP.
    pub fn deposit<H: Host>(
        &mut self,
        ctx: &mut CallContext,
        host: &mut H,
        amount: u64,
        recipient: Address,
    ) -> StabiliteResult<u64> {
        ensure_recipient(&recipient)?;
        let vault = self.address;
        let depositor = ctx.caller;

        let shares = execute_atomic(host, &mut self.state, |host, state| {
            let shares = state.shares.shares_for_deposit(amount)?;
            host.transfer_from(&state.underlying, &vault, &depositor, &vault, amount)?;
            host.stake(&state.gauge, &vault, amount)?;

            state.shares.record_mint(shares)?;
            host.mint(&vault, &vault, &recipient, shares)?;
            Ok(shares)
        })?;

        ctx.events.emit(StabiliteEvent::Deposited {
            vault,
            depositor,
            recipient,
            amount,
            shares,
            block_height: ctx.block_height,
        });
        tracing::info!(vault = ?vault, depositor = ?depositor, amount, shares, "deposit");

        Ok(shares)
    }

    /// Burn `shares` from the caller and pay the LP they are worth to `recipient`
    pub fn withdraw<H: Host>(
        &mut self,
        ctx: &mut CallContext,
        host: &mut H,
        shares: u64,
        recipient: Address,
    ) -> StabiliteResult<u64> {
        ensure_recipient(&recipient)?;
        let vault = self.address;
        let owner = ctx.caller;

        let underlying = execute_atomic(host, &mut self.state, |host, state| {
            let price = host.virtual_price(&state.swap)?;
            let held = underlying_held(host, &vault, state)?;
            let payout = state.shares.underlying_for_withdraw(shares, held, price)?;

            host.burn(&vault, &vault, &owner, shares)?;
            state.shares.record_burn(shares)?;
            release_underlying(host, &vault, state, &recipient, payout)?;
            Ok(payout)
        })?;

        ctx.events.emit(StabiliteEvent::Withdrawn {
            vault,
            owner,
            recipient,
            shares,
            underlying,
            block_height: ctx.block_height,
        });
        tracing::info!(vault = ?vault, owner = ?owner, shares, underlying, "withdraw");

        Ok(underlying)
    }

    /// Pull primary and secondary rewards into the accumulator
    ///
    /// Anyone may call this. Returns the amount credited per asset; assets
    /// with nothing new are left out.
    pub fn claim_rewards<H: Host>(
        &mut self,
        ctx: &mut CallContext,
        host: &mut H,
    ) -> StabiliteResult<Vec<AssetAmount>> {
        let vault = self.address;

        let claimed = execute_atomic(host, &mut self.state, |host, state| {
            let assets = reward_assets(host, &vault, state)?;
            let before: Vec<u64> = assets
                .iter()
                .map(|asset| host.balance_of(asset, &vault))
                .collect();

            host.mint_for(&state.minter, &state.gauge, &vault)?;
            host.claim(&state.gauge, &vault)?;

            let mut claimed = Vec::new();
            for (asset, before) in assets.into_iter().zip(before) {
                let delta = host.balance_of(&asset, &vault).saturating_sub(before);
                if delta > 0 {
                    state.rewards.credit(asset, delta)?;
                    claimed.push(AssetAmount::new(asset, delta));
                }
            }
            Ok(claimed)
        })?;

        let block_height = ctx.block_height;
        ctx.events.extend(claimed.iter().map(|reward| StabiliteEvent::RewardsClaimed {
            vault,
            asset: reward.asset,
            amount: reward.amount,
            block_height,
        }));
        tracing::info!(vault = ?vault, caller = ?ctx.caller, assets = claimed.len(), "rewards claimed");

        Ok(claimed)
    }

    /// Pay the redeemable balance of `asset` to the reward recipient
    ///
    /// Anyone may trigger a redemption. The gauge or LP address redeems LP
    /// appreciation; any other asset redeems its pooled reward balance.
    pub fn redeem_reward<H: Host>(
        &mut self,
        ctx: &mut CallContext,
        host: &mut H,
        asset: AssetId,
    ) -> StabiliteResult<u64> {
        let vault = self.address;

        let (recipient, amount) = execute_atomic(host, &mut self.state, |host, state| {
            let recipient = state.reward_recipient;

            let amount = if state.is_underlying(&asset) {
                let price = host.virtual_price(&state.swap)?;
                let held = underlying_held(host, &vault, state)?;
                let surplus = state.shares.surplus(held, price)?;
                if surplus == 0 {
                    return Err(StabiliteError::NothingToRedeem { asset });
                }
                release_underlying(host, &vault, state, &recipient, surplus)?;
                surplus
            } else {
                let amount = state.rewards.redeemable(
                    &asset,
                    vault::RECIPIENT_SHARE_NUMERATOR,
                    vault::RECIPIENT_SHARE_DENOMINATOR,
                )?;
                if amount == 0 {
                    return Err(StabiliteError::NothingToRedeem { asset });
                }
                state.rewards.debit(&asset, amount)?;
                host.transfer(&asset, &vault, &recipient, amount)?;
                amount
            };
            Ok((recipient, amount))
        })?;

        ctx.events.emit(StabiliteEvent::RewardRedeemed {
            vault,
            asset,
            recipient,
            amount,
            block_height: ctx.block_height,
        });
        tracing::info!(vault = ?vault, asset = ?asset, recipient = ?recipient, amount, "reward redeemed");

        Ok(amount)
    }

    /// Amount `redeem_reward(asset)` would currently pay
    pub fn redeemable<H: Host>(&self, host: &H, asset: &AssetId) -> StabiliteResult<u64> {
        if self.state.is_underlying(asset) {
            let price = host.virtual_price(&self.state.swap)?;
            let held = underlying_held(host, &self.address, &self.state)?;
            self.state.shares.surplus(held, price)
        } else {
            self.state.rewards.redeemable(
                asset,
                vault::RECIPIENT_SHARE_NUMERATOR,
                vault::RECIPIENT_SHARE_DENOMINATOR,
            )
        }
    }

    /// Replace the reward recipient (owner only)
    pub fn set_reward_recipient(
        &mut self,
        ctx: &mut CallContext,
        new_recipient: Address,
    ) -> StabiliteResult<()> {
        self.state.ownable.ensure_owner(ctx)?;
        ensure_recipient(&new_recipient)?;

        let old_recipient = self.state.reward_recipient;
        self.state.reward_recipient = new_recipient;

        ctx.events.emit(StabiliteEvent::RewardRecipientChanged {
            vault: self.address,
            old_recipient,
            new_recipient,
            block_height: ctx.block_height,
        });
        tracing::info!(vault = ?self.address, new_recipient = ?new_recipient, "reward recipient changed");
        Ok(())
    }

    pub fn transfer_ownership(
        &mut self,
        ctx: &mut CallContext,
        new_owner: Address,
    ) -> StabiliteResult<()> {
        let event = self
            .state
            .ownable
            .transfer_ownership(ctx, self.address, new_owner)?;
        ctx.events.emit(event);
        Ok(())
    }

    /// Verify share supply and pooled rewards against host balances
    pub fn check_invariants<H: Host>(&self, host: &H) -> StabiliteResult<()> {
        if self.state.shares.share_supply() != host.total_supply(&self.address) {
            return Err(StabiliteError::InvariantViolated {
                what: "share supply out of sync with share asset",
            });
        }
        for (asset, held) in self.state.rewards.assets() {
            if host.balance_of(asset, &self.address) < *held {
                return Err(StabiliteError::InvariantViolated {
                    what: "pooled reward not backed by vault balance",
                });
            }
        }
        Ok(())
    }

    // ============ Share Token ============

    pub fn name(&self) -> &str {
        &self.state.name
    }

    pub fn symbol(&self) -> &str {
        &self.state.symbol
    }

    pub fn decimals(&self) -> u8 {
        vault::SHARE_DECIMALS
    }

    pub fn total_supply(&self) -> u64 {
        self.state.shares.share_supply()
    }

    pub fn balance_of<H: TokenHost>(&self, host: &H, owner: &Address) -> u64 {
        host.balance_of(&self.address, owner)
    }

    pub fn allowance<H: TokenHost>(&self, host: &H, owner: &Address, spender: &Address) -> u64 {
        host.allowance(&self.address, owner, spender)
    }

    pub fn transfer<H: Host>(
        &mut self,
        ctx: &CallContext,
        host: &mut H,
        to: Address,
        amount: u64,
    ) -> StabiliteResult<()> {
        let (asset, from) = (self.address, ctx.caller);
        execute_atomic(host, &mut self.state, |host, _| host.transfer(&asset, &from, &to, amount))
    }

    pub fn approve<H: Host>(
        &mut self,
        ctx: &CallContext,
        host: &mut H,
        spender: Address,
        amount: u64,
    ) -> StabiliteResult<()> {
        let (asset, owner) = (self.address, ctx.caller);
        execute_atomic(host, &mut self.state, |host, _| {
            host.approve(&asset, &owner, &spender, amount)
        })
    }

    pub fn transfer_from<H: Host>(
        &mut self,
        ctx: &CallContext,
        host: &mut H,
        from: Address,
        to: Address,
        amount: u64,
    ) -> StabiliteResult<()> {
        let (asset, spender) = (self.address, ctx.caller);
        execute_atomic(host, &mut self.state, |host, _| {
            host.transfer_from(&asset, &spender, &from, &to, amount)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stabilite_common::{
        constants::price::VIRTUAL_PRICE_PRECISION,
        events::EventType,
        host::{GaugeHost, InMemoryHost},
    };

    const DEPLOYER: Address = [1u8; 32];
    const RECIPIENT: Address = [2u8; 32];
    const OTHER: Address = [3u8; 32];
    const LP: AssetId = [20u8; 32];
    const MOBI: AssetId = [21u8; 32];
    const REWARD0: AssetId = [22u8; 32];
    const REWARD1: AssetId = [23u8; 32];
    const GAUGE: Address = [30u8; 32];
    const MINTER: Address = [31u8; 32];

    const AMOUNT: u64 = 1000;

    fn create_test_host() -> InMemoryHost {
        let mut host = InMemoryHost::new();
        host.create_token(LP, "Mobius USDC/cUSD LP", "MOB-LP", 18).unwrap();
        host.create_token(MOBI, "Mobius", "MOBI", 18).unwrap();
        host.create_token(REWARD0, "Reward Zero", "RWD0", 18).unwrap();
        host.create_token(REWARD1, "Reward One", "RWD1", 18).unwrap();
        // The LP token stands in as its own swap
        host.create_swap(LP);
        host.create_gauge(GAUGE, LP, vec![REWARD0, REWARD1]).unwrap();
        host.create_minter(MINTER, MOBI);
        host.faucet(&LP, &DEPLOYER, AMOUNT).unwrap();
        host
    }

    fn setup() -> (InMemoryHost, Vault, CallContext) {
        let mut host = create_test_host();
        let ctx = CallContext::new(DEPLOYER, 100);
        let config = VaultConfig::new(MINTER, GAUGE, LP, RECIPIENT)
            .with_token("Mobius ULP Vault", "mobiVAULT");
        let vault = Vault::deploy(&ctx, &mut host, config).unwrap();

        let address = vault.address();
        host.accrue_minter_reward(&MINTER, &GAUGE, &address, 42).unwrap();
        host.accrue_gauge_reward(&GAUGE, &address, &REWARD0, 1).unwrap();
        host.accrue_gauge_reward(&GAUGE, &address, &REWARD1, 1).unwrap();

        (host, vault, ctx)
    }

    fn deposit_all(host: &mut InMemoryHost, vault: &mut Vault, ctx: &mut CallContext) {
        host.approve(&LP, &DEPLOYER, &vault.address(), AMOUNT).unwrap();
        vault.deposit(ctx.as_caller(DEPLOYER), host, AMOUNT, DEPLOYER).unwrap();
    }

    #[test]
    fn test_deploy_initializes() {
        let (host, vault, _) = setup();

        assert_eq!(vault.reward_recipient(), RECIPIENT);
        assert_eq!(vault.owner(), DEPLOYER);
        assert_eq!(vault.underlying(), LP);
        assert_eq!(vault.name(), "Mobius ULP Vault");
        assert_eq!(vault.symbol(), "mobiVAULT");
        assert_eq!(vault.total_supply(), 0);
        assert_eq!(vault.address(), derive_contract_address(&DEPLOYER, b"mobiVAULT"));
        assert!(vault.check_invariants(&host).is_ok());
    }

    #[test]
    fn test_deploy_same_symbol_twice() {
        let (mut host, _, ctx) = setup();
        let config = VaultConfig::new(MINTER, GAUGE, LP, RECIPIENT)
            .with_token("Mobius ULP Vault", "mobiVAULT");

        let result = Vault::deploy(&ctx, &mut host, config);
        assert!(matches!(result, Err(StabiliteError::AssetAlreadyExists { .. })));
    }

    #[test]
    fn test_deploy_unknown_gauge() {
        let mut host = create_test_host();
        let config = VaultConfig::new(MINTER, [99u8; 32], LP, RECIPIENT);

        let result = Vault::deploy(&CallContext::new(DEPLOYER, 1), &mut host, config);
        assert!(matches!(result, Err(StabiliteError::UnknownGauge { .. })));
    }

    #[test]
    fn test_set_reward_recipient_not_owner() {
        let (_, mut vault, mut ctx) = setup();

        let result = vault.set_reward_recipient(ctx.as_caller(OTHER), OTHER);
        assert!(matches!(result, Err(StabiliteError::Unauthorized { .. })));
        assert_eq!(vault.reward_recipient(), RECIPIENT);
        assert!(ctx.events.is_empty());
    }

    #[test]
    fn test_set_reward_recipient_owner() {
        let (_, mut vault, mut ctx) = setup();

        vault.set_reward_recipient(&mut ctx, OTHER).unwrap();
        assert_eq!(vault.reward_recipient(), OTHER);
        vault.set_reward_recipient(&mut ctx, RECIPIENT).unwrap();
        assert_eq!(vault.reward_recipient(), RECIPIENT);

        assert_eq!(ctx.events.filter_by_type(EventType::RewardRecipientChanged).len(), 2);

        let result = vault.set_reward_recipient(&mut ctx, [0u8; 32]);
        assert!(matches!(result, Err(StabiliteError::InvalidAddress { .. })));
    }

    #[test]
    fn test_claim_rewards() {
        let (mut host, mut vault, mut ctx) = setup();

        let claimed = vault.claim_rewards(ctx.as_caller(OTHER), &mut host).unwrap();
        assert_eq!(
            claimed,
            vec![
                AssetAmount::new(MOBI, 42),
                AssetAmount::new(REWARD0, 1),
                AssetAmount::new(REWARD1, 1),
            ]
        );
        assert_eq!(host.balance_of(&MOBI, &vault.address()), 42);
        assert_eq!(vault.state().rewards.held(&MOBI), 42);
        assert_eq!(ctx.events.filter_by_type(EventType::RewardsClaimed).len(), 3);

        // Nothing new accrued
        let claimed = vault.claim_rewards(&mut ctx, &mut host).unwrap();
        assert!(claimed.is_empty());
        assert_eq!(vault.state().rewards.held(&MOBI), 42);
        assert!(vault.check_invariants(&host).is_ok());
    }

    #[test]
    fn test_deposit() {
        let (mut host, mut vault, mut ctx) = setup();
        let address = vault.address();

        host.approve(&LP, &DEPLOYER, &address, AMOUNT).unwrap();
        let shares = vault.deposit(&mut ctx, &mut host, AMOUNT, DEPLOYER).unwrap();

        assert_eq!(shares, AMOUNT);
        assert_eq!(host.balance_of(&LP, &DEPLOYER), 0);
        assert_eq!(vault.balance_of(&host, &DEPLOYER), AMOUNT);
        assert_eq!(host.staked_balance(&GAUGE, &address), AMOUNT);
        assert_eq!(vault.total_supply(), AMOUNT);
        assert!(vault.check_invariants(&host).is_ok());
    }

    #[test]
    fn test_deposit_without_approval() {
        let (mut host, mut vault, mut ctx) = setup();

        let result = vault.deposit(&mut ctx, &mut host, AMOUNT, DEPLOYER);
        assert!(matches!(result, Err(StabiliteError::InsufficientAllowance { .. })));
        assert_eq!(host.balance_of(&LP, &DEPLOYER), AMOUNT);
        assert_eq!(vault.total_supply(), 0);
        assert!(ctx.events.is_empty());
    }

    #[test]
    fn test_deposit_zero() {
        let (mut host, mut vault, mut ctx) = setup();
        let result = vault.deposit(&mut ctx, &mut host, 0, DEPLOYER);
        assert!(matches!(result, Err(StabiliteError::ZeroAmount)));
    }

    #[test]
    fn test_redeem_reward_flow() {
        let (mut host, mut vault, mut ctx) = setup();
        vault.claim_rewards(&mut ctx, &mut host).unwrap();
        deposit_all(&mut host, &mut vault, &mut ctx);

        // Quadruple the virtual price
        host.set_virtual_price(&LP, 4 * VIRTUAL_PRICE_PRECISION).unwrap();
        assert_eq!(vault.redeemable(&host, &GAUGE).unwrap(), AMOUNT * 3 / 4);

        // Redeem LP
        let paid = vault.redeem_reward(&mut ctx, &mut host, GAUGE).unwrap();
        assert_eq!(paid, AMOUNT * 3 / 4);
        assert_eq!(host.balance_of(&LP, &RECIPIENT), AMOUNT * 3 / 4);

        // Redeem secondary rewards
        assert_eq!(vault.redeem_reward(&mut ctx, &mut host, REWARD0).unwrap(), 1);
        assert_eq!(host.balance_of(&REWARD0, &RECIPIENT), 1);
        assert_eq!(vault.redeem_reward(&mut ctx, &mut host, REWARD1).unwrap(), 1);
        assert_eq!(host.balance_of(&REWARD1, &RECIPIENT), 1);

        // Redeem primary reward
        assert_eq!(vault.redeem_reward(&mut ctx, &mut host, MOBI).unwrap(), 42);
        assert_eq!(host.balance_of(&MOBI, &RECIPIENT), 42);

        // Drained
        let result = vault.redeem_reward(&mut ctx, &mut host, REWARD0);
        assert!(matches!(result, Err(StabiliteError::NothingToRedeem { .. })));
        let result = vault.redeem_reward(&mut ctx, &mut host, GAUGE);
        assert!(matches!(result, Err(StabiliteError::NothingToRedeem { .. })));

        // Withdraw what the shares are still worth
        let paid = vault.withdraw(&mut ctx, &mut host, AMOUNT, DEPLOYER).unwrap();
        assert_eq!(paid, AMOUNT / 4);
        assert_eq!(host.balance_of(&LP, &DEPLOYER), AMOUNT / 4);
        assert_eq!(vault.balance_of(&host, &DEPLOYER), 0);
        assert_eq!(vault.total_supply(), 0);
        assert!(vault.check_invariants(&host).is_ok());
    }

    #[test]
    fn test_redeem_via_lp_address() {
        let (mut host, mut vault, mut ctx) = setup();
        deposit_all(&mut host, &mut vault, &mut ctx);
        host.set_virtual_price(&LP, 2 * VIRTUAL_PRICE_PRECISION).unwrap();

        let paid = vault.redeem_reward(&mut ctx, &mut host, LP).unwrap();
        assert_eq!(paid, 500);
        assert_eq!(host.staked_balance(&GAUGE, &vault.address()), 500);
    }

    #[test]
    fn test_redeem_at_peg_pays_nothing() {
        let (mut host, mut vault, mut ctx) = setup();
        deposit_all(&mut host, &mut vault, &mut ctx);

        let result = vault.redeem_reward(&mut ctx, &mut host, GAUGE);
        assert!(matches!(result, Err(StabiliteError::NothingToRedeem { .. })));
        assert!(ctx.events.filter_by_type(EventType::RewardRedeemed).is_empty());
    }

    #[test]
    fn test_redeem_pays_recipient_not_caller() {
        let (mut host, mut vault, mut ctx) = setup();
        vault.claim_rewards(&mut ctx, &mut host).unwrap();

        vault.redeem_reward(ctx.as_caller(OTHER), &mut host, MOBI).unwrap();
        assert_eq!(host.balance_of(&MOBI, &OTHER), 0);
        assert_eq!(host.balance_of(&MOBI, &RECIPIENT), 42);
    }

    #[test]
    fn test_withdraw_below_peg_pro_rata() {
        let (mut host, mut vault, mut ctx) = setup();
        deposit_all(&mut host, &mut vault, &mut ctx);
        host.set_virtual_price(&LP, VIRTUAL_PRICE_PRECISION / 2).unwrap();

        let paid = vault.withdraw(&mut ctx, &mut host, 400, DEPLOYER).unwrap();
        assert_eq!(paid, 400);
        assert_eq!(vault.total_supply(), 600);
        assert_eq!(host.staked_balance(&GAUGE, &vault.address()), 600);
    }

    #[test]
    fn test_withdraw_at_quadrupled_price_before_redeem() {
        let (mut host, mut vault, mut ctx) = setup();
        deposit_all(&mut host, &mut vault, &mut ctx);
        host.set_virtual_price(&LP, 4 * VIRTUAL_PRICE_PRECISION).unwrap();

        // Surplus is still in the vault; shares are paid at the virtual price
        let paid = vault.withdraw(&mut ctx, &mut host, AMOUNT, DEPLOYER).unwrap();
        assert_eq!(paid, AMOUNT / 4);
        assert_eq!(host.balance_of(&LP, &DEPLOYER), AMOUNT / 4);
        assert_eq!(vault.total_supply(), 0);

        // Everything left over belongs to the reward recipient
        assert_eq!(vault.redeemable(&host, &GAUGE).unwrap(), AMOUNT * 3 / 4);
        let paid = vault.redeem_reward(&mut ctx, &mut host, GAUGE).unwrap();
        assert_eq!(paid, AMOUNT * 3 / 4);
        assert_eq!(host.staked_balance(&GAUGE, &vault.address()), 0);
        assert!(vault.check_invariants(&host).is_ok());
    }

    #[test]
    fn test_deposit_above_peg_mints_one_to_one() {
        let (mut host, mut vault, mut ctx) = setup();
        host.set_virtual_price(&LP, 4 * VIRTUAL_PRICE_PRECISION).unwrap();

        host.approve(&LP, &DEPLOYER, &vault.address(), 400).unwrap();
        vault.deposit(ctx.as_caller(DEPLOYER), &mut host, 400, DEPLOYER).unwrap();
        assert_eq!(vault.balance_of(&host, &DEPLOYER), 400);

        // Only a quarter of the deposit backs the new shares
        assert_eq!(vault.redeemable(&host, &GAUGE).unwrap(), 300);
        let paid = vault.withdraw(&mut ctx, &mut host, 400, DEPLOYER).unwrap();
        assert_eq!(paid, 100);
    }

    #[test]
    fn test_unclaimed_transfer_is_not_redeemable() {
        let (mut host, mut vault, mut ctx) = setup();
        let address = vault.address();
        host.faucet(&REWARD0, &address, 5).unwrap();
        assert_eq!(vault.redeemable(&host, &REWARD0).unwrap(), 0);

        // Only the gauge payout is credited by a claim
        vault.claim_rewards(&mut ctx, &mut host).unwrap();
        assert_eq!(vault.redeem_reward(&mut ctx, &mut host, REWARD0).unwrap(), 1);
        assert_eq!(host.balance_of(&REWARD0, &address), 5);
        let result = vault.redeem_reward(&mut ctx, &mut host, REWARD0);
        assert!(matches!(result, Err(StabiliteError::NothingToRedeem { .. })));
    }

    #[test]
    fn test_withdraw_without_shares_rolls_back() {
        let (mut host, mut vault, mut ctx) = setup();
        deposit_all(&mut host, &mut vault, &mut ctx);
        let events_before = ctx.events.len();
        let state_before = vault.state().clone();

        let result = vault.withdraw(ctx.as_caller(OTHER), &mut host, 10, OTHER);
        assert!(matches!(result, Err(StabiliteError::InsufficientBalance { .. })));

        assert_eq!(vault.state(), &state_before);
        assert_eq!(host.balance_of(&LP, &OTHER), 0);
        assert_eq!(host.staked_balance(&GAUGE, &vault.address()), AMOUNT);
        assert_eq!(ctx.events.len(), events_before);
        assert_eq!(host.checkpoint_depth(), 0);
    }

    #[test]
    fn test_withdraw_zero() {
        let (mut host, mut vault, mut ctx) = setup();
        deposit_all(&mut host, &mut vault, &mut ctx);
        let result = vault.withdraw(&mut ctx, &mut host, 0, DEPLOYER);
        assert!(matches!(result, Err(StabiliteError::ZeroAmount)));
    }

    #[test]
    fn test_share_transfer_and_transfer_from() {
        let (mut host, mut vault, mut ctx) = setup();
        deposit_all(&mut host, &mut vault, &mut ctx);

        vault.transfer(&ctx, &mut host, OTHER, 300).unwrap();
        assert_eq!(vault.balance_of(&host, &OTHER), 300);

        vault.approve(&ctx, &mut host, OTHER, 200).unwrap();
        assert_eq!(vault.allowance(&host, &DEPLOYER, &OTHER), 200);

        let result = vault.transfer_from(ctx.as_caller(OTHER), &mut host, DEPLOYER, OTHER, 201);
        assert!(matches!(result, Err(StabiliteError::InsufficientAllowance { .. })));

        vault
            .transfer_from(ctx.as_caller(OTHER), &mut host, DEPLOYER, OTHER, 200)
            .unwrap();
        assert_eq!(vault.balance_of(&host, &OTHER), 500);
        assert_eq!(vault.balance_of(&host, &DEPLOYER), 500);
        assert_eq!(vault.total_supply(), AMOUNT);
    }

    #[test]
    fn test_transfer_ownership() {
        let (_, mut vault, mut ctx) = setup();

        vault.transfer_ownership(&mut ctx, OTHER).unwrap();
        assert_eq!(vault.owner(), OTHER);

        let result = vault.set_reward_recipient(ctx.as_caller(DEPLOYER), DEPLOYER);
        assert!(matches!(result, Err(StabiliteError::Unauthorized { .. })));
        vault.set_reward_recipient(ctx.as_caller(OTHER), OTHER).unwrap();
    }

    #[test]
    fn test_config_defaults() {
        let config = VaultConfig::new(MINTER, GAUGE, LP, RECIPIENT);
        assert_eq!(config.name, vault::DEFAULT_NAME);
        assert_eq!(config.symbol, vault::DEFAULT_SYMBOL);

        let bytes = borsh::to_vec(&config).unwrap();
        let restored: VaultConfig = borsh::from_slice(&bytes).unwrap();
        assert_eq!(config, restored);
    }
}

//! Stabilite Collateral Ledger
//!
//! Mints a synthetic unit of account 1:1 against shares of whitelisted
//! vaults. Each vault has its own deposit limit capping how many of its
//! shares the ledger will hold in reserve.
//!
//! ## Invariants
//!
//! - `reserve <= deposit_limit` for every vault
//! - the sum of all reserves equals the synthetic total supply
//! - banning a vault keeps its limit and reserve
//!
//! Minting requires the vault to be whitelisted. Burning does too unless
//! the ledger is deployed with `burn_requires_whitelist = false`.

use std::collections::BTreeMap;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use stabilite_common::{
    access_control::{CallContext, Ownable},
    constants::ledger,
    errors::{StabiliteError, StabiliteResult},
    events::StabiliteEvent,
    host::{execute_atomic, Host, TokenHost},
    math::{safe_add, safe_sub},
    token_ops::TokenMetadata,
    types::{derive_contract_address, is_zero, Address},
};


// ============ Configuration ============

/// Deployment parameters of a ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct LedgerConfig {
    /// Synthetic unit name
    #[serde(default = "default_name")]
    pub name: String,
    /// Synthetic unit symbol; also salts the ledger address
    #[serde(default = "default_symbol")]
    pub symbol: String,
    /// Reject burns against banned vaults
    #[serde(default = "default_burn_requires_whitelist")]
    pub burn_requires_whitelist: bool,
}

fn default_name() -> String {
    ledger::DEFAULT_NAME.to_string()
}

fn default_symbol() -> String {
    ledger::DEFAULT_SYMBOL.to_string()
}

fn default_burn_requires_whitelist() -> bool {
    true
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            symbol: default_symbol(),
            burn_requires_whitelist: default_burn_requires_whitelist(),
        }
    }
}

impl LedgerConfig {
    pub fn new(name: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            ..Self::default()
        }
    }
}

// ============ Ledger State ============

/// Per-vault configuration and reserve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct VaultEntry {
    pub whitelisted: bool,
    /// Maximum reserve of this vault's shares
    pub deposit_limit: u64,
    /// Vault shares held against minted synthetic units
    pub reserve: u64,
}

impl Default for VaultEntry {
    fn default() -> Self {
        Self {
            whitelisted: false,
            deposit_limit: ledger::DEFAULT_DEPOSIT_LIMIT,
            reserve: 0,
        }
    }
}

impl VaultEntry {
    /// Whether `amount` more shares fit under the limit
    pub fn has_capacity(&self, amount: u64) -> bool {
        self.reserve
            .checked_add(amount)
            .map(|total| total <= self.deposit_limit)
            .unwrap_or(false)
    }

    /// Remaining room under the deposit limit
    pub fn capacity(&self) -> u64 {
        self.deposit_limit.saturating_sub(self.reserve)
    }

    /// Reserve as basis points of the limit
    pub fn utilization_bps(&self) -> u64 {
        if self.deposit_limit == 0 {
            return 0;
        }
        (self.reserve as u128 * 10000 / self.deposit_limit as u128) as u64
    }
}

/// Persistent state of a ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct LedgerState {
    pub name: String,
    pub symbol: String,
    pub ownable: Ownable,
    pub burn_requires_whitelist: bool,
    /// Vaults that have ever been configured
    pub entries: BTreeMap<Address, VaultEntry>,
}

impl LedgerState {
    /// Entry of `vault`, zeroed if it was never configured
    pub fn entry(&self, vault: &Address) -> VaultEntry {
        self.entries.get(vault).copied().unwrap_or_default()
    }

    fn entry_mut(&mut self, vault: Address) -> &mut VaultEntry {
        self.entries.entry(vault).or_insert_with(VaultEntry::default)
    }

    pub fn total_reserve(&self) -> StabiliteResult<u64> {
        self.entries
            .values()
            .try_fold(0u64, |total, entry| safe_add(total, entry.reserve))
    }
}

/// A deployed ledger; its address doubles as the synthetic asset id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollateralLedger {
    address: Address,
    state: LedgerState,
}

fn ensure_vault(vault: &Address) -> StabiliteResult<()> {
    if is_zero(vault) {
        return Err(StabiliteError::InvalidAddress {
            reason: "vault cannot be the zero address",
        });
    }
    Ok(())
}

fn ensure_recipient(recipient: &Address) -> StabiliteResult<()> {
    if is_zero(recipient) {
        return Err(StabiliteError::InvalidAddress {
            reason: "recipient cannot be the zero address",
        });
    }
    Ok(())
}

impl CollateralLedger {
    /// Deploy a ledger owned by the caller and register its synthetic unit
    pub fn deploy<H: Host>(
        ctx: &CallContext,
        host: &mut H,
        config: LedgerConfig,
    ) -> StabiliteResult<Self> {
        let ownable = Ownable::new(ctx.caller)?;
        let address = derive_contract_address(&ctx.caller, config.symbol.as_bytes());

        host.register_asset(
            address,
            address,
            TokenMetadata::new(config.name.clone(), config.symbol.clone(), ledger::DECIMALS),
        )?;

        tracing::info!(
            ledger = ?address,
            owner = ?ctx.caller,
            symbol = %config.symbol,
            burn_requires_whitelist = config.burn_requires_whitelist,
            "ledger deployed"
        );

        Ok(Self {
            address,
            state: LedgerState {
                name: config.name,
                symbol: config.symbol,
                ownable,
                burn_requires_whitelist: config.burn_requires_whitelist,
                entries: BTreeMap::new(),
            },
        })
    }

    /// Rebuild a ledger from persisted state
    pub fn from_state(address: Address, state: LedgerState) -> Self {
        Self { address, state }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn state(&self) -> &LedgerState {
        &self.state
    }

    pub fn owner(&self) -> Address {
        self.state.ownable.owner()
    }

    // ============ Owner Operations ============

    pub fn whitelist_vault(&mut self, ctx: &mut CallContext, vault: Address) -> StabiliteResult<()> {
        self.state.ownable.ensure_owner(ctx)?;
        ensure_vault(&vault)?;

        self.state.entry_mut(vault).whitelisted = true;

        ctx.events.emit(StabiliteEvent::VaultWhitelisted {
            vault,
            block_height: ctx.block_height,
        });
        tracing::info!(ledger = ?self.address, vault = ?vault, "vault whitelisted");
        Ok(())
    }

    /// Stop minting against `vault`; its limit and reserve are kept
    pub fn ban_vault(&mut self, ctx: &mut CallContext, vault: Address) -> StabiliteResult<()> {
        self.state.ownable.ensure_owner(ctx)?;
        ensure_vault(&vault)?;

        self.state.entry_mut(vault).whitelisted = false;

        ctx.events.emit(StabiliteEvent::VaultBanned {
            vault,
            block_height: ctx.block_height,
        });
        tracing::warn!(ledger = ?self.address, vault = ?vault, "vault banned");
        Ok(())
    }

    /// Set the deposit limit of `vault`, whitelisted or not
    ///
    /// A limit below the current reserve is rejected.
    pub fn set_deposit_limit(
        &mut self,
        ctx: &mut CallContext,
        vault: Address,
        limit: u64,
    ) -> StabiliteResult<()> {
        self.state.ownable.ensure_owner(ctx)?;
        ensure_vault(&vault)?;

        let reserve = self.state.entry(&vault).reserve;
        if limit < reserve {
            return Err(StabiliteError::LimitBelowReserve { limit, reserve });
        }

        let entry = self.state.entry_mut(vault);
        let old_limit = entry.deposit_limit;
        entry.deposit_limit = limit;

        ctx.events.emit(StabiliteEvent::DepositLimitChanged {
            vault,
            old_limit,
            new_limit: limit,
            block_height: ctx.block_height,
        });
        tracing::info!(ledger = ?self.address, vault = ?vault, old_limit, new_limit = limit, "deposit limit changed");
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

    // ============ Mint / Burn ============

    /// Deposit `amount` shares of `vault` and mint as many synthetic units to `recipient`
    ///
    /// The caller must have approved the ledger on the vault's share token.
    /// Returns the vault's new reserve.
    pub fn mint<H: Host>(
        &mut self,
        ctx: &mut CallContext,
        host: &mut H,
        vault: Address,
        amount: u64,
        recipient: Address,
    ) -> StabiliteResult<u64> {
        let ledger = self.address;
        let depositor = ctx.caller;

        let new_reserve = execute_atomic(host, &mut self.state, |host, state| {
            let entry = state.entry(&vault);
            if !entry.whitelisted {
                return Err(StabiliteError::VaultNotWhitelisted { vault });
            }
            if !entry.has_capacity(amount) {
                return Err(StabiliteError::DepositLimitExceeded {
                    reserve: entry.reserve,
                    amount,
                    limit: entry.deposit_limit,
                });
            }
            if amount == 0 {
                return Err(StabiliteError::ZeroAmount);
            }
            ensure_recipient(&recipient)?;

            host.transfer_from(&vault, &ledger, &depositor, &ledger, amount)?;

            let entry = state.entry_mut(vault);
            entry.reserve = safe_add(entry.reserve, amount)?;
            let new_reserve = entry.reserve;

            host.mint(&ledger, &ledger, &recipient, amount)?;
            Ok(new_reserve)
        })?;

        ctx.events.emit(StabiliteEvent::SyntheticMinted {
            vault,
            depositor,
            recipient,
            amount,
            new_reserve,
            block_height: ctx.block_height,
        });
        tracing::info!(ledger = ?ledger, vault = ?vault, amount, new_reserve, "synthetic minted");

        Ok(new_reserve)
    }

    /// Burn `amount` synthetic units from the caller and return as many
    /// shares of `vault` to `recipient`
    ///
    /// Returns the vault's new reserve.
    pub fn burn<H: Host>(
        &mut self,
        ctx: &mut CallContext,
        host: &mut H,
        vault: Address,
        amount: u64,
        recipient: Address,
    ) -> StabiliteResult<u64> {
        let ledger = self.address;
        let burner = ctx.caller;

        let new_reserve = execute_atomic(host, &mut self.state, |host, state| {
            let entry = state.entry(&vault);
            if state.burn_requires_whitelist && !entry.whitelisted {
                return Err(StabiliteError::VaultNotWhitelisted { vault });
            }
            if amount > entry.reserve {
                return Err(StabiliteError::BurnExceedsReserve {
                    amount,
                    reserve: entry.reserve,
                });
            }
            if amount == 0 {
                return Err(StabiliteError::ZeroAmount);
            }
            ensure_recipient(&recipient)?;

            host.burn(&ledger, &ledger, &burner, amount)?;

            let entry = state.entry_mut(vault);
            entry.reserve = safe_sub(entry.reserve, amount)?;
            let new_reserve = entry.reserve;

            host.transfer(&vault, &ledger, &recipient, amount)?;
            Ok(new_reserve)
        })?;

        ctx.events.emit(StabiliteEvent::SyntheticBurned {
            vault,
            burner,
            recipient,
            amount,
            new_reserve,
            block_height: ctx.block_height,
        });
        tracing::info!(ledger = ?ledger, vault = ?vault, amount, new_reserve, "synthetic burned");

        Ok(new_reserve)
    }

    // ============ Views ============

    /// Whether `vault` is currently whitelisted
    pub fn vaults(&self, vault: &Address) -> bool {
        self.state.entry(vault).whitelisted
    }

    pub fn deposit_limits(&self, vault: &Address) -> u64 {
        self.state.entry(vault).deposit_limit
    }

    pub fn reserve(&self, vault: &Address) -> u64 {
        self.state.entry(vault).reserve
    }

    pub fn entry(&self, vault: &Address) -> VaultEntry {
        self.state.entry(vault)
    }

    /// Verify reserves against the synthetic supply and the shares held
    pub fn check_invariants<H: Host>(&self, host: &H) -> StabiliteResult<()> {
        if self.state.total_reserve()? != host.total_supply(&self.address) {
            return Err(StabiliteError::InvariantViolated {
                what: "reserves do not sum to synthetic supply",
            });
        }
        for (vault, entry) in &self.state.entries {
            if entry.reserve > entry.deposit_limit {
                return Err(StabiliteError::InvariantViolated {
                    what: "reserve above deposit limit",
                });
            }
            if host.balance_of(vault, &self.address) < entry.reserve {
                return Err(StabiliteError::InvariantViolated {
                    what: "reserve not backed by held shares",
                });
            }
        }
        Ok(())
    }

    // ============ Synthetic Token ============

    pub fn name(&self) -> &str {
        &self.state.name
    }

    pub fn symbol(&self) -> &str {
        &self.state.symbol
    }

    pub fn decimals(&self) -> u8 {
        ledger::DECIMALS
    }

    pub fn total_supply<H: TokenHost>(&self, host: &H) -> u64 {
        host.total_supply(&self.address)
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

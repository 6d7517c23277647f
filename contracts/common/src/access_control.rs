//! Access Control Module
//!
//! Authenticated-caller context and single-owner gating.
//!
//! There is no global admin: every mutating entry point receives a
//! [`CallContext`] naming the authenticated caller, and owner-only
//! operations check it against the contract's [`Ownable`] state.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::errors::{StabiliteError, StabiliteResult};
use crate::events::{EventLog, StabiliteEvent};
use crate::types::{is_zero, Address};

// ============================================================================
// Call Context
// ============================================================================

/// Context of a single contract call
#[derive(Debug, Clone)]
pub struct CallContext {
    /// Authenticated caller
    pub caller: Address,
    /// Current block height
    pub block_height: u64,
    /// Events emitted by committed operations
    pub events: EventLog,
}

impl CallContext {
    pub fn new(caller: Address, block_height: u64) -> Self {
        Self {
            caller,
            block_height,
            events: EventLog::new(),
        }
    }

    /// Same block, different caller; the event log carries over
    pub fn as_caller(&mut self, caller: Address) -> &mut Self {
        self.caller = caller;
        self
    }
}

// ============================================================================
// Ownership
// ============================================================================

/// Single-owner gate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct Ownable {
    owner: Address,
}

impl Ownable {
    /// Create an ownership record; the zero address can never own
    pub fn new(owner: Address) -> StabiliteResult<Self> {
        if is_zero(&owner) {
            return Err(StabiliteError::InvalidAddress {
                reason: "owner cannot be the zero address",
            });
        }
        Ok(Self { owner })
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn is_owner(&self, caller: &Address) -> bool {
        self.owner == *caller
    }

    /// Fail with `Unauthorized` unless the caller is the owner
    pub fn ensure_owner(&self, ctx: &CallContext) -> StabiliteResult<()> {
        if !self.is_owner(&ctx.caller) {
            tracing::warn!(
                caller = ?ctx.caller,
                block_height = ctx.block_height,
                "rejected owner-only call"
            );
            return Err(StabiliteError::Unauthorized {
                expected: self.owner,
                actual: ctx.caller,
            });
        }
        Ok(())
    }

    /// Hand ownership to `new_owner` (owner only)
    pub fn transfer_ownership(
        &mut self,
        ctx: &CallContext,
        contract: Address,
        new_owner: Address,
    ) -> StabiliteResult<StabiliteEvent> {
        self.ensure_owner(ctx)?;
        if is_zero(&new_owner) {
            return Err(StabiliteError::InvalidAddress {
                reason: "new owner cannot be the zero address",
            });
        }

        let previous_owner = self.owner;
        self.owner = new_owner;

        Ok(StabiliteEvent::OwnershipTransferred {
            contract,
            previous_owner,
            new_owner,
            block_height: ctx.block_height,
        })
    }
}

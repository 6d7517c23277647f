//! Stabilite Common Library
//!
//! Shared types, constants, and utilities for the Stabilite contracts.
//!
//! ## Layers
//!
//! - **Mobius Vault** (`stabilite-mobius-vault`): custodies a staked LP
//!   position, issues shares 1:1 and pools claimed gauge rewards for a
//!   single reward recipient.
//! - **Collateral Ledger** (`stabilite-ledger`): mints and burns a synthetic
//!   unit against shares of whitelisted vaults, each under its own deposit
//!   limit.
//!
//! ## Execution Model
//!
//! Contracts do not hold balances. Every token movement, gauge interaction
//! and price quote goes through the [`host`] traits, and every mutating entry
//! point runs inside [`host::execute_atomic`]: a failed call restores the
//! host and the contract state, and emits no events.

pub mod constants;
pub mod errors;
pub mod types;
pub mod math;
pub mod events;
pub mod access_control;
pub mod token_ops;
pub mod host;
pub mod reward;

// Re-exports for convenience
pub use constants::*;
pub use errors::*;
pub use types::*;
pub use math::*;
pub use events::*;
pub use access_control::*;
pub use token_ops::*;
pub use host::*;
pub use reward::*;

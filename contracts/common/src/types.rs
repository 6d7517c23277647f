//! Core Types for Stabilite
//!
//! Fundamental data structures shared by the vault and ledger contracts.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Type alias for addresses (32-byte hash)
pub type Address = [u8; 32];

/// Fungible assets are identified by the address of their issuing contract
pub type AssetId = Address;

/// The zero address; never a valid owner, recipient or asset
pub const ZERO_ADDRESS: Address = [0u8; 32];

/// Returns true for the zero address
pub fn is_zero(address: &Address) -> bool {
    *address == ZERO_ADDRESS
}

/// Derive a deterministic contract address from its deployer and a salt
///
/// Both contracts use their token symbol as salt, so one deployer cannot
/// deploy two contracts issuing the same symbol.
pub fn derive_contract_address(deployer: &Address, salt: &[u8]) -> Address {
    let mut hasher = Sha256::new();
    hasher.update(b"stabilite/contract");
    hasher.update(deployer);
    hasher.update((salt.len() as u64).to_le_bytes());
    hasher.update(salt);
    let result = hasher.finalize();
    let mut address = [0u8; 32];
    address.copy_from_slice(&result);
    address
}

/// An amount of a specific asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct AssetAmount {
    /// Asset identifier
    pub asset: AssetId,
    /// Amount in the asset's base units
    pub amount: u64,
}

impl AssetAmount {
    pub fn new(asset: AssetId, amount: u64) -> Self {
        Self { asset, amount }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_contract_address_deterministic() {
        let deployer = [7u8; 32];
        let a = derive_contract_address(&deployer, b"mobVAULT");
        let b = derive_contract_address(&deployer, b"mobVAULT");
        let c = derive_contract_address(&deployer, b"stabUSD");
        let d = derive_contract_address(&[8u8; 32], b"mobVAULT");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
        assert!(!is_zero(&a));
    }
}

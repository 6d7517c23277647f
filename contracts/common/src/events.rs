//! Protocol Events for Stabilite
//!
//! Events are collected in the caller's [`EventLog`] once an operation has
//! fully succeeded, so a rolled-back call never leaves events behind.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::types::{Address, AssetId};

/// Event types for indexing and filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
#[borsh(use_discriminant = true)]
#[repr(u8)]
pub enum EventType {
    // Vault Events (0x01 - 0x1F)
    Deposited = 0x01,
    Withdrawn = 0x02,
    RewardsClaimed = 0x03,
    RewardRedeemed = 0x04,
    RewardRecipientChanged = 0x05,

    // Ledger Events (0x20 - 0x3F)
    VaultWhitelisted = 0x20,
    VaultBanned = 0x21,
    DepositLimitChanged = 0x22,
    SyntheticMinted = 0x23,
    SyntheticBurned = 0x24,

    // Ownership Events (0x80 - 0x9F)
    OwnershipTransferred = 0x80,
}

/// Main event enum containing all vault and ledger events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum StabiliteEvent {
    // ============ Vault Events ============

    /// Emitted when LP is deposited and shares minted
    Deposited {
        vault: Address,
        depositor: Address,
        recipient: Address,
        amount: u64,
        shares: u64,
        block_height: u64,
    },

    /// Emitted when shares are burned for LP
    Withdrawn {
        vault: Address,
        owner: Address,
        recipient: Address,
        shares: u64,
        underlying: u64,
        block_height: u64,
    },

    /// Emitted once per asset credited by a reward claim
    RewardsClaimed {
        vault: Address,
        asset: AssetId,
        amount: u64,
        block_height: u64,
    },

    /// Emitted when a reward balance is paid to the recipient
    RewardRedeemed {
        vault: Address,
        asset: AssetId,
        recipient: Address,
        amount: u64,
        block_height: u64,
    },

    /// Emitted when the owner replaces the reward recipient
    RewardRecipientChanged {
        vault: Address,
        old_recipient: Address,
        new_recipient: Address,
        block_height: u64,
    },

    // ============ Ledger Events ============

    VaultWhitelisted {
        vault: Address,
        block_height: u64,
    },

    VaultBanned {
        vault: Address,
        block_height: u64,
    },

    DepositLimitChanged {
        vault: Address,
        old_limit: u64,
        new_limit: u64,
        block_height: u64,
    },

    /// Emitted when vault shares enter reserve and synthetic units are minted
    SyntheticMinted {
        vault: Address,
        depositor: Address,
        recipient: Address,
        amount: u64,
        new_reserve: u64,
        block_height: u64,
    },

    /// Emitted when synthetic units are burned and shares leave reserve
    SyntheticBurned {
        vault: Address,
        burner: Address,
        recipient: Address,
        amount: u64,
        new_reserve: u64,
        block_height: u64,
    },

    // ============ Ownership Events ============

    OwnershipTransferred {
        contract: Address,
        previous_owner: Address,
        new_owner: Address,
        block_height: u64,
    },
}

impl StabiliteEvent {
    /// Get the event type for filtering
    pub fn event_type(&self) -> EventType {
        match self {
            Self::Deposited { .. } => EventType::Deposited,
            Self::Withdrawn { .. } => EventType::Withdrawn,
            Self::RewardsClaimed { .. } => EventType::RewardsClaimed,
            Self::RewardRedeemed { .. } => EventType::RewardRedeemed,
            Self::RewardRecipientChanged { .. } => EventType::RewardRecipientChanged,
            Self::VaultWhitelisted { .. } => EventType::VaultWhitelisted,
            Self::VaultBanned { .. } => EventType::VaultBanned,
            Self::DepositLimitChanged { .. } => EventType::DepositLimitChanged,
            Self::SyntheticMinted { .. } => EventType::SyntheticMinted,
            Self::SyntheticBurned { .. } => EventType::SyntheticBurned,
            Self::OwnershipTransferred { .. } => EventType::OwnershipTransferred,
        }
    }

    /// Get the block height when event occurred
    pub fn block_height(&self) -> u64 {
        match self {
            Self::Deposited { block_height, .. }
            | Self::Withdrawn { block_height, .. }
            | Self::RewardsClaimed { block_height, .. }
            | Self::RewardRedeemed { block_height, .. }
            | Self::RewardRecipientChanged { block_height, .. }
            | Self::VaultWhitelisted { block_height, .. }
            | Self::VaultBanned { block_height, .. }
            | Self::DepositLimitChanged { block_height, .. }
            | Self::SyntheticMinted { block_height, .. }
            | Self::SyntheticBurned { block_height, .. }
            | Self::OwnershipTransferred { block_height, .. } => *block_height,
        }
    }

    /// Serialize event to bytes for storage/transmission
    pub fn to_bytes(&self) -> Vec<u8> {
        borsh::to_vec(self).unwrap_or_default()
    }

    /// Deserialize event from bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        borsh::from_slice(bytes).ok()
    }
}

/// Event log for collecting multiple events during execution
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<StabiliteEvent>,
}

impl EventLog {
    /// Create a new empty event log
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Emit an event (add to log)
    pub fn emit(&mut self, event: StabiliteEvent) {
        self.events.push(event);
    }

    /// Append every event of an operation that has committed
    pub fn extend(&mut self, events: impl IntoIterator<Item = StabiliteEvent>) {
        self.events.extend(events);
    }

    /// Get all events
    pub fn events(&self) -> &[StabiliteEvent] {
        &self.events
    }

    /// Filter events by type
    pub fn filter_by_type(&self, event_type: EventType) -> Vec<&StabiliteEvent> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    /// Check if any events were emitted
    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }

    /// Get number of events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Clear all events
    pub fn clear(&mut self) {
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type() {
        let event = StabiliteEvent::SyntheticMinted {
            vault: [1u8; 32],
            depositor: [2u8; 32],
            recipient: [2u8; 32],
            amount: 1000,
            new_reserve: 1000,
            block_height: 100,
        };

        assert_eq!(event.event_type(), EventType::SyntheticMinted);
        assert_eq!(event.block_height(), 100);
    }

    #[test]
    fn test_event_serialization() {
        let event = StabiliteEvent::RewardRedeemed {
            vault: [1u8; 32],
            asset: [3u8; 32],
            recipient: [2u8; 32],
            amount: 750,
            block_height: 200,
        };

        let bytes = event.to_bytes();
        let restored = StabiliteEvent::from_bytes(&bytes).unwrap();

        assert_eq!(event, restored);
    }

    #[test]
    fn test_event_log() {
        let mut log = EventLog::new();

        log.emit(StabiliteEvent::VaultWhitelisted {
            vault: [1u8; 32],
            block_height: 100,
        });
        log.extend([
            StabiliteEvent::VaultBanned { vault: [1u8; 32], block_height: 101 },
            StabiliteEvent::VaultWhitelisted { vault: [1u8; 32], block_height: 102 },
        ]);

        assert_eq!(log.len(), 3);
        assert!(log.has_events());
        assert_eq!(log.filter_by_type(EventType::VaultWhitelisted).len(), 2);

        log.clear();
        assert!(log.is_empty());
    }
}

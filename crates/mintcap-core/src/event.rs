use serde::{Deserialize, Serialize};

use crate::role::Role;
use crate::types::{AccountId, Balance, CallId, Timestamp, YearIndex};

/// The invocation that produced an event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallContext {
    pub call_id: CallId,
    pub caller: AccountId,
    pub timestamp: Timestamp,
}

/// Observable ledger events.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SupplyEvent {
    TokensMinted {
        year: YearIndex,
        to: AccountId,
        amount: Balance,
    },
    TokensBurned {
        from: AccountId,
        amount: Balance,
    },
    RoleGranted {
        role: Role,
        account: AccountId,
        sender: AccountId,
    },
    RoleRevoked {
        role: Role,
        account: AccountId,
        sender: AccountId,
    },
}

impl SupplyEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SupplyEvent::TokensMinted { .. } => "TokensMinted",
            SupplyEvent::TokensBurned { .. } => "TokensBurned",
            SupplyEvent::RoleGranted { .. } => "RoleGranted",
            SupplyEvent::RoleRevoked { .. } => "RoleRevoked",
        }
    }
}

/// One entry of the append-only event log. `seq` is strictly increasing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub seq: u64,
    pub context: CallContext,
    pub event: SupplyEvent,
}

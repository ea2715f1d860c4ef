use serde::{Deserialize, Serialize};

use crate::role::Role;
use crate::types::{AccountId, Balance};

/// A state-changing request against the supply controller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerCall {
    /// Requires Minter on the caller.
    Mint { to: AccountId, amount: Balance },

    /// Burns from the caller's own balance. Requires Burner.
    Burn { amount: Balance },

    /// Requires Admin on the caller.
    GrantRole { role: Role, account: AccountId },

    /// Requires Admin on the caller.
    RevokeRole { role: Role, account: AccountId },

    /// Drops one of the caller's own roles.
    RenounceRole { role: Role },
}

impl LedgerCall {
    pub fn name(&self) -> &'static str {
        match self {
            LedgerCall::Mint { .. } => "mint",
            LedgerCall::Burn { .. } => "burn",
            LedgerCall::GrantRole { .. } => "grantRole",
            LedgerCall::RevokeRole { .. } => "revokeRole",
            LedgerCall::RenounceRole { .. } => "renounceRole",
        }
    }
}

/// A call together with the account that issued it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallEnvelope {
    pub caller: AccountId,
    pub call: LedgerCall,
}

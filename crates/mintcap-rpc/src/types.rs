use serde::{Deserialize, Serialize};

use mintcap_core::call::{CallEnvelope, LedgerCall};
use mintcap_core::error::MintcapError;
use mintcap_core::event::{EventRecord, SupplyEvent};
use mintcap_core::role::Role;
use mintcap_core::types::{AccountId, Balance, YearIndex};

/// A state-changing call as submitted over JSON-RPC.
///
/// ```json
/// { "caller": "<b58>", "kind": "mint", "to": "<b58>", "amount": "1000" }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcCall {
    pub caller: String,
    #[serde(flatten)]
    pub call: RpcCallKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RpcCallKind {
    Mint { to: String, amount: String },
    Burn { amount: String },
    GrantRole { role: String, account: String },
    RevokeRole { role: String, account: String },
    RenounceRole { role: String },
}

impl RpcCall {
    /// Parse account ids, roles and amounts into a domain call.
    pub fn to_envelope(&self) -> Result<CallEnvelope, MintcapError> {
        let caller = AccountId::from_b58(&self.caller)?;
        let call = match &self.call {
            RpcCallKind::Mint { to, amount } => LedgerCall::Mint {
                to: AccountId::from_b58(to)?,
                amount: parse_amount(amount)?,
            },
            RpcCallKind::Burn { amount } => LedgerCall::Burn { amount: parse_amount(amount)? },
            RpcCallKind::GrantRole { role, account } => LedgerCall::GrantRole {
                role: role.parse()?,
                account: AccountId::from_b58(account)?,
            },
            RpcCallKind::RevokeRole { role, account } => LedgerCall::RevokeRole {
                role: role.parse()?,
                account: AccountId::from_b58(account)?,
            },
            RpcCallKind::RenounceRole { role } => LedgerCall::RenounceRole { role: role.parse()? },
        };
        Ok(CallEnvelope { caller, call })
    }
}

fn parse_amount(s: &str) -> Result<Balance, MintcapError> {
    s.trim()
        .parse::<Balance>()
        .map_err(|e| MintcapError::Serialization(format!("invalid amount {s:?}: {e}")))
}

/// JSON-serializable event log entry. Fields that do not apply to `kind`
/// are omitted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RpcEvent {
    pub seq: u64,
    pub call_id: String,
    pub caller: String,
    pub timestamp: u64,
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub year: Option<YearIndex>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub account: Option<String>,
    /// u128 as string.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub amount: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub sender: Option<String>,
}

impl From<&EventRecord> for RpcEvent {
    fn from(r: &EventRecord) -> Self {
        let mut out = RpcEvent {
            seq: r.seq,
            call_id: r.context.call_id.to_hex(),
            caller: r.context.caller.to_b58(),
            timestamp: r.context.timestamp,
            kind: r.event.name().to_string(),
            year: None,
            account: None,
            amount: None,
            role: None,
            sender: None,
        };
        match &r.event {
            SupplyEvent::TokensMinted { year, to, amount } => {
                out.year = Some(*year);
                out.account = Some(to.to_b58());
                out.amount = Some(amount.to_string());
            }
            SupplyEvent::TokensBurned { from, amount } => {
                out.account = Some(from.to_b58());
                out.amount = Some(amount.to_string());
            }
            SupplyEvent::RoleGranted { role, account, sender }
            | SupplyEvent::RoleRevoked { role, account, sender } => {
                out.role = Some(role.id().to_string());
                out.account = Some(account.to_b58());
                out.sender = Some(sender.to_b58());
            }
        }
        out
    }
}

/// Protocol constants returned by `mintcap_getSupplyInfo`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcSupplyInfo {
    pub symbol: String,
    pub decimals: u32,
    pub initial_supply: String,
    pub max_annual_mint: String,
    pub seconds_per_year: u64,
    pub roles: Vec<String>,
    pub admin: String,
    pub total_supply: String,
    pub current_year: YearIndex,
    pub minted_this_year: String,
}

impl RpcSupplyInfo {
    /// Constants plus the live figures passed in.
    pub fn current(
        admin: &AccountId,
        total_supply: Balance,
        current_year: YearIndex,
        minted_this_year: Balance,
    ) -> Self {
        use mintcap_core::constants::*;
        Self {
            symbol: TOKEN_SYMBOL.into(),
            decimals: DECIMALS,
            initial_supply: INITIAL_SUPPLY.to_string(),
            max_annual_mint: MAX_ANNUAL_MINT.to_string(),
            seconds_per_year: SECONDS_PER_YEAR,
            roles: Role::ALL.iter().map(|r| r.id().to_string()).collect(),
            admin: admin.to_b58(),
            total_supply: total_supply.to_string(),
            current_year,
            minted_this_year: minted_this_year.to_string(),
        }
    }
}

use thiserror::Error;

use crate::role::Role;
use crate::types::{Balance, YearIndex};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MintcapError {
    // ── Genesis ──────────────────────────────────────────────────────────────
    #[error("admin account must not be the null account")]
    InvalidAdmin,

    #[error("ledger already initialized")]
    AlreadyInitialized,

    #[error("ledger has no genesis state")]
    NotInitialized,

    // ── Access control ───────────────────────────────────────────────────────
    #[error("account {account} is missing role {role}")]
    Unauthorized { account: String, role: Role },

    #[error("re-entrant call into a guarded operation")]
    ReentrantCall,

    // ── Supply operations ────────────────────────────────────────────────────
    #[error("recipient must not be the null account")]
    InvalidRecipient,

    #[error("amount must be greater than zero")]
    InvalidAmount,

    #[error("annual mint cap exceeded for year {year}: minted {minted}, requested {requested}, cap {cap}")]
    AnnualCapExceeded {
        year: YearIndex,
        minted: Balance,
        requested: Balance,
        cap: Balance,
    },

    #[error("insufficient balance: need {need}, have {have}")]
    InsufficientBalance { need: Balance, have: Balance },

    #[error("total supply overflow")]
    SupplyOverflow,

    #[error("recipient hook rejected mint: {0}")]
    RecipientRejected(String),

    // ── Parsing ──────────────────────────────────────────────────────────────
    #[error("invalid account id: {0}")]
    InvalidAccountId(String),

    #[error("unknown role: {0}")]
    UnknownRole(String),

    // ── Serialization / storage ──────────────────────────────────────────────
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("storage error: {0}")]
    Storage(String),

    // ── General ──────────────────────────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

impl MintcapError {
    /// Rejections caused by the caller's input or capabilities, as opposed
    /// to storage or codec faults inside the node.
    pub fn is_rejection(&self) -> bool {
        !matches!(
            self,
            MintcapError::Serialization(_) | MintcapError::Storage(_) | MintcapError::Other(_)
        )
    }
}

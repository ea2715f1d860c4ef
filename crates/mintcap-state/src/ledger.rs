use mintcap_core::error::MintcapError;
use mintcap_core::event::EventRecord;
use mintcap_core::types::{AccountId, Balance};

use crate::batch::StateBatch;
use crate::db::StateDb;

/// Balance and total-supply bookkeeping consumed by `SupplyController`.
///
/// Implementations keep balances non-negative and move the total supply in
/// lock-step with every credit and debit. `commit` is all-or-nothing: a
/// reader never observes part of a batch.
pub trait Ledger: Send + Sync {
    fn balance_of(&self, account: &AccountId) -> Result<Balance, MintcapError>;

    fn total_supply(&self) -> Result<Balance, MintcapError>;

    /// Apply `batch` atomically and return the appended event records.
    ///
    /// # Errors
    /// `InsufficientBalance`, `AnnualCapExceeded`, `AlreadyInitialized` or
    /// `SupplyOverflow` from the staged checks; nothing is written.
    fn commit(&self, batch: &StateBatch) -> Result<Vec<EventRecord>, MintcapError>;
}

impl Ledger for StateDb {
    fn balance_of(&self, account: &AccountId) -> Result<Balance, MintcapError> {
        self.get_balance(account)
    }

    fn total_supply(&self) -> Result<Balance, MintcapError> {
        self.get_total_supply()
    }

    fn commit(&self, batch: &StateBatch) -> Result<Vec<EventRecord>, MintcapError> {
        StateDb::commit(self, batch)
    }
}

use mintcap_core::event::{CallContext, SupplyEvent};
use mintcap_core::role::Role;
use mintcap_core::types::{AccountId, Balance, YearIndex};

/// Increase of one year's mint counter, bounded by `cap`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnnualMint {
    pub year: YearIndex,
    pub amount: Balance,
    pub cap: Balance,
}

/// Writes staged by one call, applied by `Ledger::commit` in a single
/// storage transaction. Either every entry lands or none does.
#[derive(Clone, Debug, Default)]
pub struct StateBatch {
    pub(crate) credits: Vec<(AccountId, Balance)>,
    pub(crate) debits: Vec<(AccountId, Balance)>,
    pub(crate) annual: Option<AnnualMint>,
    pub(crate) grants: Vec<(Role, AccountId)>,
    pub(crate) revokes: Vec<(Role, AccountId)>,
    pub(crate) events: Vec<(CallContext, SupplyEvent)>,
    pub(crate) genesis_admin: Option<AccountId>,
}

impl StateBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `amount` to `account` and to the total supply.
    pub fn credit(&mut self, account: &AccountId, amount: Balance) -> &mut Self {
        self.credits.push((account.clone(), amount));
        self
    }

    /// Remove `amount` from `account` and from the total supply. The commit
    /// aborts with `InsufficientBalance` if the account holds less.
    pub fn debit(&mut self, account: &AccountId, amount: Balance) -> &mut Self {
        self.debits.push((account.clone(), amount));
        self
    }

    /// Raise `year`'s counter by `amount`. The commit aborts with
    /// `AnnualCapExceeded` if the new total would pass `cap`.
    pub fn count_mint(&mut self, year: YearIndex, amount: Balance, cap: Balance) -> &mut Self {
        self.annual = Some(AnnualMint { year, amount, cap });
        self
    }

    pub fn grant(&mut self, role: Role, account: &AccountId) -> &mut Self {
        self.grants.push((role, account.clone()));
        self
    }

    pub fn revoke(&mut self, role: Role, account: &AccountId) -> &mut Self {
        self.revokes.push((role, account.clone()));
        self
    }

    /// Append an event; sequence numbers are assigned at commit.
    pub fn emit(&mut self, context: &CallContext, event: SupplyEvent) -> &mut Self {
        self.events.push((context.clone(), event));
        self
    }

    /// Write the genesis marker. The commit aborts with `AlreadyInitialized`
    /// if one exists.
    pub fn mark_genesis(&mut self, admin: &AccountId) -> &mut Self {
        self.genesis_admin = Some(admin.clone());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.credits.is_empty()
            && self.debits.is_empty()
            && self.annual.is_none()
            && self.grants.is_empty()
            && self.revokes.is_empty()
            && self.events.is_empty()
            && self.genesis_admin.is_none()
    }
}

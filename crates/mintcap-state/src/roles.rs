use mintcap_core::error::MintcapError;
use mintcap_core::role::Role;
use mintcap_core::types::AccountId;

use crate::db::StateDb;

/// Role membership consumed by `SupplyController`. Membership changes are
/// staged on a `StateBatch` and land through `Ledger::commit`.
pub trait RoleRegistry: Send + Sync {
    fn has_role(&self, role: Role, account: &AccountId) -> Result<bool, MintcapError>;

    /// Holders of `role`, in storage key order.
    fn members(&self, role: Role) -> Result<Vec<AccountId>, MintcapError>;
}

impl RoleRegistry for StateDb {
    fn has_role(&self, role: Role, account: &AccountId) -> Result<bool, MintcapError> {
        self.role_entry(role, account)
    }

    fn members(&self, role: Role) -> Result<Vec<AccountId>, MintcapError> {
        self.role_members(role)
    }
}

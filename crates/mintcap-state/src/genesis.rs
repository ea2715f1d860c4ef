use std::sync::Arc;

use mintcap_core::error::MintcapError;
use mintcap_core::types::AccountId;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::controller::{Capabilities, SupplyController};
use crate::db::StateDb;

/// Genesis inputs, loaded from JSON on a node's first start.
///
/// ```json
/// { "admin": "<base-58 account id>" }
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenesisParams {
    /// Receives the initial supply and every role.
    pub admin: String,
}

impl GenesisParams {
    pub fn new(admin: &AccountId) -> Self {
        Self { admin: admin.to_b58() }
    }

    pub fn admin_id(&self) -> Result<AccountId, MintcapError> {
        AccountId::from_b58(&self.admin)
    }
}

/// Attach to an initialised store, or run genesis on a fresh one.
///
/// # Errors
/// `NotInitialized` if the store is fresh and no params were given;
/// `InvalidAdmin` if the params name the null account.
pub fn open_or_genesis(
    db: Arc<StateDb>,
    caps: Capabilities,
    params: Option<&GenesisParams>,
) -> Result<SupplyController, MintcapError> {
    if db.get_genesis_admin()?.is_some() {
        info!("existing ledger found, skipping genesis");
        return SupplyController::open(db, caps);
    }
    let params = params.ok_or(MintcapError::NotInitialized)?;
    info!("fresh ledger, applying genesis");
    SupplyController::initialize(db, caps, params.admin_id()?)
}

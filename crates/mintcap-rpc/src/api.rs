use jsonrpsee::core::RpcResult;
use jsonrpsee::proc_macros::rpc;

use crate::types::{RpcCall, RpcEvent, RpcSupplyInfo};

/// Mintcap JSON-RPC 2.0 API definition.
///
/// All method names are prefixed with "mintcap_" via `namespace = "mintcap"`.
/// Amounts travel as decimal strings (u128 does not fit a JSON number).
#[rpc(server, namespace = "mintcap")]
pub trait MintcapApi {
    /// Balance of a base-58 account id.
    #[method(name = "getBalance")]
    async fn get_balance(&self, account_id: String) -> RpcResult<String>;

    #[method(name = "getTotalSupply")]
    async fn get_total_supply(&self) -> RpcResult<String>;

    /// Cumulative amount minted in `year` (zero if never minted in).
    #[method(name = "getAnnualMinted")]
    async fn get_annual_minted(&self, year: u64) -> RpcResult<String>;

    /// Cap headroom for `year`; defaults to the current year bucket.
    #[method(name = "getRemainingAnnualMint")]
    async fn get_remaining_annual_mint(&self, year: Option<u64>) -> RpcResult<String>;

    /// `role` accepts `ADMIN_ROLE`, `MINTER_ROLE`, `BURNER_ROLE`.
    #[method(name = "hasRole")]
    async fn has_role(&self, role: String, account_id: String) -> RpcResult<bool>;

    #[method(name = "getRoleMembers")]
    async fn get_role_members(&self, role: String) -> RpcResult<Vec<String>>;

    /// Events with `seq >= from_seq`, oldest first. `limit` is capped at 500.
    #[method(name = "getEvents")]
    async fn get_events(&self, from_seq: u64, limit: u32) -> RpcResult<Vec<RpcEvent>>;

    #[method(name = "getSupplyInfo")]
    async fn get_supply_info(&self) -> RpcResult<RpcSupplyInfo>;

    /// Submit a state-changing call. Returns the emitted event, or null when
    /// a role call changed nothing.
    #[method(name = "submitCall")]
    async fn submit_call(&self, call: RpcCall) -> RpcResult<Option<RpcEvent>>;
}

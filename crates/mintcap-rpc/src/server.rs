use std::net::SocketAddr;
use std::sync::Arc;

use jsonrpsee::core::{async_trait, RpcResult};
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::types::ErrorObject;
use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};

use mintcap_core::call::CallEnvelope;
use mintcap_core::error::MintcapError;
use mintcap_core::event::EventRecord;
use mintcap_core::role::Role;
use mintcap_core::types::AccountId;
use mintcap_state::SupplyController;

use crate::api::MintcapApiServer;
use crate::types::{RpcCall, RpcEvent, RpcSupplyInfo};

const MAX_EVENTS_PER_PAGE: u32 = 500;

/// Result of one applied call, as sent back by the apply loop.
pub type CallReply = Result<Option<EventRecord>, MintcapError>;

/// A call queued for the node's apply loop.
pub struct CallRequest {
    pub envelope: CallEnvelope,
    pub reply: oneshot::Sender<CallReply>,
}

fn rpc_err(code: i32, msg: impl Into<String>) -> ErrorObject<'static> {
    ErrorObject::owned(code, msg.into(), None::<()>)
}

/// Malformed input → -32602, domain rejection → -32000, node fault → -32603.
fn map_err(e: MintcapError) -> ErrorObject<'static> {
    match e {
        MintcapError::InvalidAccountId(_)
        | MintcapError::UnknownRole(_)
        | MintcapError::Serialization(_) => rpc_err(-32602, e.to_string()),
        e if e.is_rejection() => rpc_err(-32000, e.to_string()),
        e => rpc_err(-32603, e.to_string()),
    }
}

/// Shared state passed to the RPC server.
pub struct RpcServerState {
    pub controller: Arc<SupplyController>,
    /// Queue into the node's apply loop. When absent, calls are applied
    /// directly on the controller.
    pub call_sender: Option<mpsc::Sender<CallRequest>>,
}

/// The RPC server implementation.
pub struct RpcServer {
    state: Arc<RpcServerState>,
}

impl RpcServer {
    pub fn new(state: Arc<RpcServerState>) -> Self {
        Self { state }
    }

    /// Start the JSON-RPC server on `addr`. Returns the bound address and a
    /// handle to stop it.
    pub async fn start(self, addr: SocketAddr) -> anyhow::Result<(SocketAddr, ServerHandle)> {
        let server = Server::builder().build(addr).await?;
        let local = server.local_addr()?;
        let module = self.into_rpc();
        let handle = server.start(module);
        info!(addr = %local, "RPC server started");
        Ok((local, handle))
    }

    async fn dispatch(&self, envelope: CallEnvelope) -> CallReply {
        let Some(sender) = &self.state.call_sender else {
            return self.state.controller.apply(&envelope);
        };
        let (reply, rx) = oneshot::channel();
        sender
            .send(CallRequest { envelope, reply })
            .await
            .map_err(|_| MintcapError::Other("apply loop stopped".into()))?;
        rx.await
            .map_err(|_| MintcapError::Other("apply loop dropped the call".into()))?
    }
}

fn parse_account(s: &str) -> RpcResult<AccountId> {
    AccountId::from_b58(s).map_err(map_err)
}

fn parse_role(s: &str) -> RpcResult<Role> {
    s.parse::<Role>().map_err(map_err)
}

#[async_trait]
impl MintcapApiServer for RpcServer {
    async fn get_balance(&self, account_id: String) -> RpcResult<String> {
        let id = parse_account(&account_id)?;
        let balance = self.state.controller.balance_of(&id).map_err(map_err)?;
        Ok(balance.to_string())
    }

    async fn get_total_supply(&self) -> RpcResult<String> {
        let supply = self.state.controller.total_supply().map_err(map_err)?;
        Ok(supply.to_string())
    }

    async fn get_annual_minted(&self, year: u64) -> RpcResult<String> {
        let minted = self.state.controller.annual_minted(year).map_err(map_err)?;
        Ok(minted.to_string())
    }

    async fn get_remaining_annual_mint(&self, year: Option<u64>) -> RpcResult<String> {
        let c = &self.state.controller;
        let year = year.unwrap_or_else(|| c.current_year());
        let remaining = c.remaining_annual_mint(year).map_err(map_err)?;
        Ok(remaining.to_string())
    }

    async fn has_role(&self, role: String, account_id: String) -> RpcResult<bool> {
        let role = parse_role(&role)?;
        let id = parse_account(&account_id)?;
        self.state.controller.has_role(role, &id).map_err(map_err)
    }

    async fn get_role_members(&self, role: String) -> RpcResult<Vec<String>> {
        let role = parse_role(&role)?;
        let members = self.state.controller.role_members(role).map_err(map_err)?;
        Ok(members.iter().map(|a| a.to_b58()).collect())
    }

    async fn get_events(&self, from_seq: u64, limit: u32) -> RpcResult<Vec<RpcEvent>> {
        let limit = limit.min(MAX_EVENTS_PER_PAGE) as usize;
        let records = self
            .state
            .controller
            .events(from_seq, limit)
            .map_err(map_err)?;
        Ok(records.iter().map(RpcEvent::from).collect())
    }

    async fn get_supply_info(&self) -> RpcResult<RpcSupplyInfo> {
        let c = &self.state.controller;
        let year = c.current_year();
        Ok(RpcSupplyInfo::current(
            c.admin(),
            c.total_supply().map_err(map_err)?,
            year,
            c.annual_minted(year).map_err(map_err)?,
        ))
    }

    async fn submit_call(&self, call: RpcCall) -> RpcResult<Option<RpcEvent>> {
        let envelope = call.to_envelope().map_err(map_err)?;
        let name = envelope.call.name();
        match self.dispatch(envelope).await {
            Ok(record) => Ok(record.as_ref().map(RpcEvent::from)),
            Err(e) => {
                warn!(call = name, error = %e, "RPC: call rejected");
                Err(map_err(e))
            }
        }
    }
}

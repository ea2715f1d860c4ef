//! mintcap-rpc
//!
//! JSON-RPC 2.0 server for Mintcap nodes.
//!
//! Namespace: "mintcap"
//! Methods:
//!   mintcap_getBalance             balance in base units
//!   mintcap_getTotalSupply         total supply in base units
//!   mintcap_getAnnualMinted        cumulative mint for a year bucket
//!   mintcap_getRemainingAnnualMint cap headroom for a year bucket
//!   mintcap_hasRole                role membership check
//!   mintcap_getRoleMembers         all holders of a role
//!   mintcap_getEvents              page through the event log
//!   mintcap_getSupplyInfo          protocol constants + current year
//!   mintcap_submitCall             mint / burn / role administration

pub mod api;
pub mod server;
pub mod types;

pub use server::{CallReply, CallRequest, RpcServer, RpcServerState};
pub use types::{RpcCall, RpcCallKind, RpcEvent, RpcSupplyInfo};

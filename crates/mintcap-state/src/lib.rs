//! mintcap-state
//!
//! Persistent ledger state and the supply controller that mutates it.
//!
//! `StateDb` is the sled-backed store. It implements the `Ledger` and
//! `RoleRegistry` capabilities consumed by `SupplyController`, which adds the
//! annual mint cap, role gating, the re-entrancy guard and the event log.
//! Each call stages its writes on a `StateBatch`, which `Ledger::commit`
//! applies in a single sled transaction.

pub mod batch;
pub mod clock;
pub mod controller;
pub mod db;
pub mod genesis;
pub mod guard;
pub mod ledger;
pub mod roles;

pub use batch::{AnnualMint, StateBatch};
pub use clock::{Clock, ManualClock, SystemClock};
pub use controller::{Capabilities, RecipientHook, SupplyController};
pub use db::StateDb;
pub use genesis::{open_or_genesis, GenesisParams};
pub use guard::{CallGuard, GuardToken};
pub use ledger::Ledger;
pub use roles::RoleRegistry;

pub mod call;
pub mod constants;
pub mod error;
pub mod event;
pub mod hash;
pub mod role;
pub mod types;

pub use call::{CallEnvelope, LedgerCall};
pub use constants::*;
pub use error::MintcapError;
pub use event::*;
pub use role::Role;
pub use types::*;

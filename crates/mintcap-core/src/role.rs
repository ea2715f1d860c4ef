use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::MintcapError;

/// Capabilities that gate state-changing operations.
///
/// `Admin` administers role membership for every role, `Minter` authorizes
/// capped issuance and `Burner` authorizes burning from the caller's own
/// balance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Minter,
    Burner,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Minter, Role::Burner];

    /// Stable string identifier, also used in storage keys and over RPC.
    pub fn id(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN_ROLE",
            Role::Minter => "MINTER_ROLE",
            Role::Burner => "BURNER_ROLE",
        }
    }

    /// Single-byte tag used as the storage key prefix.
    pub fn tag(&self) -> u8 {
        match self {
            Role::Admin => 0,
            Role::Minter => 1,
            Role::Burner => 2,
        }
    }

    /// The role whose holders may grant and revoke this one.
    pub fn admin_role(&self) -> Role {
        Role::Admin
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Role {
    type Err = MintcapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN_ROLE" | "admin" => Ok(Role::Admin),
            "MINTER_ROLE" | "minter" => Ok(Role::Minter),
            "BURNER_ROLE" | "burner" => Ok(Role::Burner),
            other => Err(MintcapError::UnknownRole(other.to_string())),
        }
    }
}

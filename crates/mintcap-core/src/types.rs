use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::MintcapError;

/// Token amount in base units (1 MCP = 10^18 units). u128 holds the genesis
/// supply and a century of capped issuance with room to spare.
pub type Balance = u128;

/// Seconds since the Unix epoch, as reported by the node clock.
pub type Timestamp = u64;

/// Coarse year bucket: `timestamp / SECONDS_PER_YEAR`. Not a calendar year.
pub type YearIndex = u64;

// ── AccountId ────────────────────────────────────────────────────────────────

/// 32-byte account identifier. The all-zero id is the null account and is
/// never a valid admin or mint recipient.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId(pub [u8; 32]);

impl AccountId {
    pub const NULL: AccountId = AccountId([0u8; 32]);

    pub fn from_bytes(b: [u8; 32]) -> Self {
        Self(b)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_null(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Base-58 encoded string representation.
    pub fn to_b58(&self) -> String {
        bs58::encode(&self.0).into_string()
    }

    pub fn from_b58(s: &str) -> Result<Self, MintcapError> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| MintcapError::InvalidAccountId(e.to_string()))?;
        let arr: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
            MintcapError::InvalidAccountId(format!("expected 32 bytes, got {}", bytes.len()))
        })?;
        Ok(Self(arr))
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_b58())
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.to_b58();
        write!(f, "AccountId({})", &s[..s.len().min(8)])
    }
}

// ── CallId ───────────────────────────────────────────────────────────────────

/// 32-byte identifier of one controller invocation: BLAKE3 over
/// (sequence, caller, timestamp). Tags every event the call emits.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CallId(pub [u8; 32]);

impl CallId {
    pub fn from_bytes(b: [u8; 32]) -> Self {
        Self(b)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CallId({}…)", &self.to_hex()[..16])
    }
}

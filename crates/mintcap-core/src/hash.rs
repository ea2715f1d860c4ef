use crate::types::{AccountId, CallId, Timestamp};

/// Compute BLAKE3 hash of arbitrary bytes → 32-byte array.
pub fn blake3_hash(data: &[u8]) -> [u8; 32] {
    *blake3::hash(data).as_bytes()
}

/// Derive a deterministic AccountId from a human-readable seed.
/// Used for devnet genesis files and tests.
pub fn account_id_from_seed(seed: &str) -> AccountId {
    let mut input = b"mintcap_account".to_vec();
    input.extend_from_slice(seed.as_bytes());
    AccountId::from_bytes(blake3_hash(&input))
}

/// CallId for invocation `seq`: BLAKE3(seq LE || caller || timestamp LE).
pub fn call_id(seq: u64, caller: &AccountId, timestamp: Timestamp) -> CallId {
    let mut input = Vec::with_capacity(48);
    input.extend_from_slice(&seq.to_le_bytes());
    input.extend_from_slice(caller.as_bytes());
    input.extend_from_slice(&timestamp.to_le_bytes());
    CallId::from_bytes(blake3_hash(&input))
}

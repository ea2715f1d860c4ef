use std::path::Path;

use mintcap_core::error::MintcapError;
use mintcap_core::event::EventRecord;
use mintcap_core::role::Role;
use mintcap_core::types::{AccountId, Balance, YearIndex};
use sled::transaction::{
    ConflictableTransactionError, ConflictableTransactionResult, TransactionError,
};
use sled::{IVec, Transactional};

use crate::batch::{AnnualMint, StateBatch};

const TOTAL_SUPPLY_KEY: &str = "total_supply";
const GENESIS_ADMIN_KEY: &str = "genesis_admin";

/// Persistent state database backed by sled (pure-Rust, no C dependencies).
///
/// Named trees (analogous to column families):
///   balances       AccountId bytes      → u128 BE
///   roles          role tag ‖ AccountId → [] (membership set)
///   annual_minted  YearIndex BE         → u128 BE
///   events         seq BE               → bincode(EventRecord)
///   meta           utf8 key bytes       → raw bytes
pub struct StateDb {
    db: sled::Db,
    balances: sled::Tree,
    roles: sled::Tree,
    annual_minted: sled::Tree,
    events: sled::Tree,
    meta: sled::Tree,
}

impl StateDb {
    /// Open or create the state database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, MintcapError> {
        let db = sled::open(path).map_err(storage)?;
        Self::from_db(db)
    }

    /// In-memory database removed on drop. Used by tests and dry runs.
    pub fn temporary() -> Result<Self, MintcapError> {
        let db = sled::Config::new().temporary(true).open().map_err(storage)?;
        Self::from_db(db)
    }

    fn from_db(db: sled::Db) -> Result<Self, MintcapError> {
        let balances      = db.open_tree("balances").map_err(storage)?;
        let roles         = db.open_tree("roles").map_err(storage)?;
        let annual_minted = db.open_tree("annual_minted").map_err(storage)?;
        let events        = db.open_tree("events").map_err(storage)?;
        let meta          = db.open_tree("meta").map_err(storage)?;
        Ok(Self { db, balances, roles, annual_minted, events, meta })
    }

    // ── Balances ─────────────────────────────────────────────────────────────

    pub fn get_balance(&self, id: &AccountId) -> Result<Balance, MintcapError> {
        decode_amount(self.balances.get(id.as_bytes()).map_err(storage)?)
    }

    pub fn get_total_supply(&self) -> Result<Balance, MintcapError> {
        decode_amount(self.meta.get(TOTAL_SUPPLY_KEY).map_err(storage)?)
    }

    // ── Commit ───────────────────────────────────────────────────────────────

    /// Apply every write in `batch` in one multi-tree transaction and return
    /// the appended event records. On any error nothing is written.
    pub fn commit(&self, batch: &StateBatch) -> Result<Vec<EventRecord>, MintcapError> {
        let mut records = Vec::with_capacity(batch.events.len());
        for (context, event) in &batch.events {
            let seq = self.next_id()?;
            let record = EventRecord { seq, context: context.clone(), event: event.clone() };
            let bytes = bincode::serialize(&record)
                .map_err(|e| MintcapError::Serialization(e.to_string()))?;
            records.push((seq.to_be_bytes(), bytes, record));
        }

        (&self.balances, &self.roles, &self.annual_minted, &self.events, &self.meta)
            .transaction(
                |(balances, roles, annual, events, meta)| -> ConflictableTransactionResult<(), MintcapError> {
                    if let Some(admin) = &batch.genesis_admin {
                        if meta.get(GENESIS_ADMIN_KEY)?.is_some() {
                            return Err(abort(MintcapError::AlreadyInitialized));
                        }
                        meta.insert(GENESIS_ADMIN_KEY, &admin.as_bytes()[..])?;
                    }

                    if !batch.credits.is_empty() || !batch.debits.is_empty() {
                        let mut supply = decode_amount(meta.get(TOTAL_SUPPLY_KEY)?).map_err(abort)?;
                        for (id, amount) in &batch.credits {
                            let key = &id.as_bytes()[..];
                            let have = decode_amount(balances.get(key)?).map_err(abort)?;
                            let overflow = || abort(MintcapError::SupplyOverflow);
                            let balance = have.checked_add(*amount).ok_or_else(overflow)?;
                            supply = supply.checked_add(*amount).ok_or_else(overflow)?;
                            balances.insert(key, encode_amount(balance))?;
                        }
                        for (id, amount) in &batch.debits {
                            let key = &id.as_bytes()[..];
                            let have = decode_amount(balances.get(key)?).map_err(abort)?;
                            if have < *amount {
                                return Err(abort(MintcapError::InsufficientBalance { need: *amount, have }));
                            }
                            supply = supply.checked_sub(*amount).ok_or_else(|| {
                                abort(MintcapError::Other("total supply below account balance".into()))
                            })?;
                            if have == *amount {
                                balances.remove(key)?;
                            } else {
                                balances.insert(key, encode_amount(have - amount))?;
                            }
                        }
                        meta.insert(TOTAL_SUPPLY_KEY, encode_amount(supply))?;
                    }

                    if let Some(AnnualMint { year, amount, cap }) = &batch.annual {
                        let key = year.to_be_bytes();
                        let minted = decode_amount(annual.get(&key[..])?).map_err(abort)?;
                        let total = match minted.checked_add(*amount) {
                            Some(total) if total <= *cap => total,
                            _ => {
                                return Err(abort(MintcapError::AnnualCapExceeded {
                                    year: *year,
                                    minted,
                                    requested: *amount,
                                    cap: *cap,
                                }))
                            }
                        };
                        annual.insert(&key[..], encode_amount(total))?;
                    }

                    for (role, id) in &batch.grants {
                        roles.insert(role_key(*role, id), &b""[..])?;
                    }
                    for (role, id) in &batch.revokes {
                        roles.remove(role_key(*role, id))?;
                    }

                    for (key, bytes, _) in &records {
                        events.insert(&key[..], bytes.as_slice())?;
                    }
                    Ok(())
                },
            )
            .map_err(from_tx)?;

        Ok(records.into_iter().map(|(_, _, record)| record).collect())
    }

    /// Sum of every stored balance.
    pub fn sum_balances(&self) -> Result<Balance, MintcapError> {
        let mut total: Balance = 0;
        for item in self.balances.iter() {
            let (_, value) = item.map_err(storage)?;
            total = total
                .checked_add(decode_amount(Some(value))?)
                .ok_or(MintcapError::SupplyOverflow)?;
        }
        Ok(total)
    }

    pub fn holder_count(&self) -> usize {
        self.balances.len()
    }

    // ── Roles ────────────────────────────────────────────────────────────────

    pub fn role_entry(&self, role: Role, id: &AccountId) -> Result<bool, MintcapError> {
        self.roles.contains_key(role_key(role, id)).map_err(storage)
    }

    pub fn role_members(&self, role: Role) -> Result<Vec<AccountId>, MintcapError> {
        let mut members = Vec::new();
        for item in self.roles.scan_prefix([role.tag()]) {
            let (key, _) = item.map_err(storage)?;
            let arr = <[u8; 32]>::try_from(&key[1..])
                .map_err(|_| MintcapError::Serialization("malformed role key".into()))?;
            members.push(AccountId::from_bytes(arr));
        }
        Ok(members)
    }

    // ── Annual mint counters ─────────────────────────────────────────────────

    /// `None` when nothing has been minted in `year`.
    pub fn get_annual_minted(&self, year: YearIndex) -> Result<Option<Balance>, MintcapError> {
        match self.annual_minted.get(year.to_be_bytes()).map_err(storage)? {
            Some(v) => Ok(Some(decode_amount(Some(v))?)),
            None => Ok(None),
        }
    }

    /// All year buckets with a non-empty counter, ascending.
    pub fn iter_annual_minted(&self) -> Result<Vec<(YearIndex, Balance)>, MintcapError> {
        let mut out = Vec::new();
        for item in self.annual_minted.iter() {
            let (key, value) = item.map_err(storage)?;
            let arr = <[u8; 8]>::try_from(&key[..])
                .map_err(|_| MintcapError::Serialization("malformed year key".into()))?;
            out.push((u64::from_be_bytes(arr), decode_amount(Some(value))?));
        }
        Ok(out)
    }

    // ── Event log ────────────────────────────────────────────────────────────

    /// Events with `seq >= from_seq`, oldest first, at most `limit`.
    pub fn get_events(&self, from_seq: u64, limit: usize) -> Result<Vec<EventRecord>, MintcapError> {
        let mut out = Vec::new();
        for item in self.events.range(from_seq.to_be_bytes()..).take(limit) {
            let (_, bytes) = item.map_err(storage)?;
            let record = bincode::deserialize(&bytes)
                .map_err(|e| MintcapError::Serialization(e.to_string()))?;
            out.push(record);
        }
        Ok(out)
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    // ── Meta ─────────────────────────────────────────────────────────────────

    pub fn get_genesis_admin(&self) -> Result<Option<AccountId>, MintcapError> {
        match self.meta.get(GENESIS_ADMIN_KEY).map_err(storage)? {
            Some(bytes) => {
                let arr = <[u8; 32]>::try_from(&bytes[..])
                    .map_err(|_| MintcapError::Serialization("malformed genesis marker".into()))?;
                Ok(Some(AccountId::from_bytes(arr)))
            }
            None => Ok(None),
        }
    }

    /// True when no balance, role or counter has ever been written.
    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
            && self.roles.is_empty()
            && self.annual_minted.is_empty()
            && self.meta.is_empty()
    }

    /// Monotonic id shared by call ids and event sequence numbers.
    pub fn next_id(&self) -> Result<u64, MintcapError> {
        self.db.generate_id().map_err(storage)
    }

    /// Flush all pending writes to disk.
    pub fn flush(&self) -> Result<(), MintcapError> {
        self.db.flush().map_err(storage)?;
        Ok(())
    }
}

// ── Encoding helpers ──────────────────────────────────────────────────────────

fn storage(e: sled::Error) -> MintcapError {
    MintcapError::Storage(e.to_string())
}

fn abort(e: MintcapError) -> ConflictableTransactionError<MintcapError> {
    ConflictableTransactionError::Abort(e)
}

fn from_tx(e: TransactionError<MintcapError>) -> MintcapError {
    match e {
        TransactionError::Abort(e) => e,
        TransactionError::Storage(e) => storage(e),
    }
}

fn role_key(role: Role, id: &AccountId) -> Vec<u8> {
    let mut key = Vec::with_capacity(33);
    key.push(role.tag());
    key.extend_from_slice(id.as_bytes());
    key
}

fn encode_amount(amount: Balance) -> Vec<u8> {
    amount.to_be_bytes().to_vec()
}

/// Absent keys decode as zero.
fn decode_amount(bytes: Option<IVec>) -> Result<Balance, MintcapError> {
    match bytes {
        None => Ok(0),
        Some(v) => {
            let arr = <[u8; 16]>::try_from(&v[..])
                .map_err(|_| MintcapError::Serialization(format!("amount is {} bytes", v.len())))?;
            Ok(u128::from_be_bytes(arr))
        }
    }
}

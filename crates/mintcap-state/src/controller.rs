use std::sync::Arc;

use mintcap_core::call::{CallEnvelope, LedgerCall};
use mintcap_core::constants::{INITIAL_SUPPLY, MAX_ANNUAL_MINT, SECONDS_PER_YEAR};
use mintcap_core::error::MintcapError;
use mintcap_core::event::{CallContext, EventRecord, SupplyEvent};
use mintcap_core::hash::call_id;
use mintcap_core::role::Role;
use mintcap_core::types::{AccountId, Balance, Timestamp, YearIndex};
use parking_lot::RwLock;
use tracing::{info, warn};

use crate::batch::StateBatch;
use crate::clock::Clock;
use crate::db::StateDb;
use crate::guard::CallGuard;
use crate::ledger::Ledger;
use crate::roles::RoleRegistry;

// ── Capabilities ──────────────────────────────────────────────────────────────

/// External services the controller consumes.
#[derive(Clone)]
pub struct Capabilities {
    pub ledger: Arc<dyn Ledger>,
    pub roles: Arc<dyn RoleRegistry>,
    pub clock: Arc<dyn Clock>,
}

impl Capabilities {
    /// Ledger and role registry both backed by `db`.
    pub fn from_db(db: &Arc<StateDb>, clock: Arc<dyn Clock>) -> Self {
        Self {
            ledger: Arc::clone(db) as Arc<dyn Ledger>,
            roles: Arc::clone(db) as Arc<dyn RoleRegistry>,
            clock,
        }
    }
}

/// Called once a mint has passed every check and before it commits, while
/// the call guard is held. The recipient's balance does not include
/// `amount` yet. Returning an error cancels the mint and nothing is written.
///
/// The hook runs on the minting thread. Calling back into the controller
/// from that thread fails with `ReentrantCall`; blocking on another thread
/// that calls a guarded operation deadlocks.
pub trait RecipientHook: Send + Sync {
    fn on_mint(
        &self,
        context: &CallContext,
        to: &AccountId,
        amount: Balance,
    ) -> Result<(), MintcapError>;
}

// ── SupplyController ──────────────────────────────────────────────────────────

/// Role-gated supply control over a ledger.
///
/// Every state-changing call runs under `guard`, stages its writes on a
/// `StateBatch` and hands it to `Ledger::commit`. The balances, total supply,
/// annual counter, role set and event of a call land together or not at all.
pub struct SupplyController {
    db: Arc<StateDb>,
    ledger: Arc<dyn Ledger>,
    roles: Arc<dyn RoleRegistry>,
    clock: Arc<dyn Clock>,
    hook: RwLock<Option<Arc<dyn RecipientHook>>>,
    guard: CallGuard,
    admin: AccountId,
}

impl SupplyController {
    /// Genesis: grant every role to `admin` and credit it `INITIAL_SUPPLY`,
    /// in one commit together with the genesis marker. The annual counters
    /// are not touched.
    pub fn initialize(
        db: Arc<StateDb>,
        caps: Capabilities,
        admin: AccountId,
    ) -> Result<Self, MintcapError> {
        if admin.is_null() {
            return Err(MintcapError::InvalidAdmin);
        }
        if db.get_genesis_admin()?.is_some() {
            return Err(MintcapError::AlreadyInitialized);
        }
        if caps.ledger.total_supply()? != 0 {
            return Err(MintcapError::Other("ledger already holds supply".into()));
        }

        let controller = Self::assemble(db, caps, admin);
        {
            let _token = controller.guard.enter()?;
            let admin = &controller.admin;
            let context = controller.begin_call(admin)?;

            let mut batch = StateBatch::new();
            for role in Role::ALL {
                batch.grant(role, admin).emit(
                    &context,
                    SupplyEvent::RoleGranted { role, account: admin.clone(), sender: admin.clone() },
                );
            }
            batch.credit(admin, INITIAL_SUPPLY).mark_genesis(admin);
            controller.ledger.commit(&batch)?;
            controller.db.flush()?;
        }

        info!(
            admin = %controller.admin,
            supply = INITIAL_SUPPLY,
            "genesis: initial supply credited"
        );
        Ok(controller)
    }

    /// Attach to a store that already went through genesis.
    pub fn open(db: Arc<StateDb>, caps: Capabilities) -> Result<Self, MintcapError> {
        let admin = db.get_genesis_admin()?.ok_or(MintcapError::NotInitialized)?;
        Ok(Self::assemble(db, caps, admin))
    }

    fn assemble(db: Arc<StateDb>, caps: Capabilities, admin: AccountId) -> Self {
        Self {
            db,
            ledger: caps.ledger,
            roles: caps.roles,
            clock: caps.clock,
            hook: RwLock::new(None),
            guard: CallGuard::new(),
            admin,
        }
    }

    pub fn set_recipient_hook(&self, hook: Arc<dyn RecipientHook>) {
        *self.hook.write() = Some(hook);
    }

    pub fn clear_recipient_hook(&self) {
        *self.hook.write() = None;
    }

    /// Dispatch one call. Supply calls always yield an event; role calls
    /// yield `None` when membership did not change.
    pub fn apply(&self, envelope: &CallEnvelope) -> Result<Option<EventRecord>, MintcapError> {
        let caller = &envelope.caller;
        match &envelope.call {
            LedgerCall::Mint { to, amount } => self.mint(caller, to, *amount).map(Some),
            LedgerCall::Burn { amount } => self.burn_from_self(caller, *amount).map(Some),
            LedgerCall::GrantRole { role, account } => self.grant_role(caller, *role, account),
            LedgerCall::RevokeRole { role, account } => self.revoke_role(caller, *role, account),
            LedgerCall::RenounceRole { role } => self.renounce_role(caller, *role),
        }
    }

    // ── Supply operations ─────────────────────────────────────────────────────

    /// Mint `amount` to `to` against the current year's cap.
    pub fn mint(
        &self,
        caller: &AccountId,
        to: &AccountId,
        amount: Balance,
    ) -> Result<EventRecord, MintcapError> {
        let _token = self.guard.enter()?;

        self.require_role(Role::Minter, caller)?;
        if to.is_null() {
            return Err(MintcapError::InvalidRecipient);
        }
        if amount == 0 {
            return Err(MintcapError::InvalidAmount);
        }

        let context = self.begin_call(caller)?;
        let year = year_of(context.timestamp);
        let minted = self.annual_minted(year)?;
        if minted.checked_add(amount).map_or(true, |total| total > MAX_ANNUAL_MINT) {
            return Err(MintcapError::AnnualCapExceeded {
                year,
                minted,
                requested: amount,
                cap: MAX_ANNUAL_MINT,
            });
        }

        let hook = self.hook.read().clone();
        if let Some(hook) = hook {
            if let Err(e) = hook.on_mint(&context, to, amount) {
                warn!(%to, amount, error = %e, "recipient hook rejected mint");
                return Err(match e {
                    MintcapError::RecipientRejected(_) => e,
                    other => MintcapError::RecipientRejected(other.to_string()),
                });
            }
        }

        let mut batch = StateBatch::new();
        batch
            .credit(to, amount)
            .count_mint(year, amount, MAX_ANNUAL_MINT)
            .emit(&context, SupplyEvent::TokensMinted { year, to: to.clone(), amount });
        let record = self.commit_one(&batch)?;

        info!(%caller, %to, amount, year, minted = minted + amount, "minted");
        Ok(record)
    }

    /// Burn `amount` from the caller's own balance.
    pub fn burn_from_self(
        &self,
        caller: &AccountId,
        amount: Balance,
    ) -> Result<EventRecord, MintcapError> {
        let _token = self.guard.enter()?;

        self.require_role(Role::Burner, caller)?;
        if amount == 0 {
            return Err(MintcapError::InvalidAmount);
        }

        let context = self.begin_call(caller)?;
        let mut batch = StateBatch::new();
        batch
            .debit(caller, amount)
            .emit(&context, SupplyEvent::TokensBurned { from: caller.clone(), amount });
        let record = self.commit_one(&batch)?;

        info!(%caller, amount, "burned");
        Ok(record)
    }

    // ── Role administration ───────────────────────────────────────────────────

    /// Returns the emitted event, or `None` if `account` already held `role`.
    pub fn grant_role(
        &self,
        caller: &AccountId,
        role: Role,
        account: &AccountId,
    ) -> Result<Option<EventRecord>, MintcapError> {
        let _token = self.guard.enter()?;
        self.require_role(role.admin_role(), caller)?;
        if account.is_null() {
            return Err(MintcapError::InvalidRecipient);
        }
        if self.roles.has_role(role, account)? {
            return Ok(None);
        }

        let context = self.begin_call(caller)?;
        let mut batch = StateBatch::new();
        batch.grant(role, account).emit(
            &context,
            SupplyEvent::RoleGranted { role, account: account.clone(), sender: caller.clone() },
        );
        let record = self.commit_one(&batch)?;
        info!(%caller, %role, %account, "role granted");
        Ok(Some(record))
    }

    /// Returns the emitted event, or `None` if `account` did not hold `role`.
    pub fn revoke_role(
        &self,
        caller: &AccountId,
        role: Role,
        account: &AccountId,
    ) -> Result<Option<EventRecord>, MintcapError> {
        let _token = self.guard.enter()?;
        self.require_role(role.admin_role(), caller)?;
        self.remove_role(caller, role, account)
    }

    /// Drop one of the caller's own roles. Needs no admin rights.
    pub fn renounce_role(
        &self,
        caller: &AccountId,
        role: Role,
    ) -> Result<Option<EventRecord>, MintcapError> {
        let _token = self.guard.enter()?;
        self.remove_role(caller, role, caller)
    }

    fn remove_role(
        &self,
        caller: &AccountId,
        role: Role,
        account: &AccountId,
    ) -> Result<Option<EventRecord>, MintcapError> {
        if !self.roles.has_role(role, account)? {
            return Ok(None);
        }
        let context = self.begin_call(caller)?;
        let mut batch = StateBatch::new();
        batch.revoke(role, account).emit(
            &context,
            SupplyEvent::RoleRevoked { role, account: account.clone(), sender: caller.clone() },
        );
        let record = self.commit_one(&batch)?;
        info!(%caller, %role, %account, "role revoked");
        Ok(Some(record))
    }

    // ── Queries ───────────────────────────────────────────────────────────────

    /// Cumulative amount minted in `year`; zero for years never minted in.
    pub fn annual_minted(&self, year: YearIndex) -> Result<Balance, MintcapError> {
        Ok(self.db.get_annual_minted(year)?.unwrap_or(0))
    }

    pub fn remaining_annual_mint(&self, year: YearIndex) -> Result<Balance, MintcapError> {
        Ok(MAX_ANNUAL_MINT.saturating_sub(self.annual_minted(year)?))
    }

    pub fn current_year(&self) -> YearIndex {
        year_of(self.clock.now())
    }

    pub fn balance_of(&self, account: &AccountId) -> Result<Balance, MintcapError> {
        self.ledger.balance_of(account)
    }

    pub fn total_supply(&self) -> Result<Balance, MintcapError> {
        self.ledger.total_supply()
    }

    pub fn has_role(&self, role: Role, account: &AccountId) -> Result<bool, MintcapError> {
        self.roles.has_role(role, account)
    }

    /// Holders of `role`, in storage key order.
    pub fn role_members(&self, role: Role) -> Result<Vec<AccountId>, MintcapError> {
        self.roles.members(role)
    }

    pub fn events(&self, from_seq: u64, limit: usize) -> Result<Vec<EventRecord>, MintcapError> {
        self.db.get_events(from_seq, limit)
    }

    /// The account genesis credited.
    pub fn admin(&self) -> &AccountId {
        &self.admin
    }

    pub fn db(&self) -> &Arc<StateDb> {
        &self.db
    }

    /// Check that stored balances add up to the total supply.
    pub fn verify_supply(&self) -> Result<Balance, MintcapError> {
        let _token = self.guard.enter()?;
        let supply = self.ledger.total_supply()?;
        let summed = self.db.sum_balances()?;
        if summed != supply {
            return Err(MintcapError::Other(format!(
                "supply mismatch: total {supply}, balances sum {summed}"
            )));
        }
        Ok(supply)
    }

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn require_role(&self, role: Role, caller: &AccountId) -> Result<(), MintcapError> {
        if !self.roles.has_role(role, caller)? {
            return Err(MintcapError::Unauthorized { account: caller.to_b58(), role });
        }
        Ok(())
    }

    fn begin_call(&self, caller: &AccountId) -> Result<CallContext, MintcapError> {
        let seq = self.db.next_id()?;
        let timestamp = self.clock.now();
        Ok(CallContext { call_id: call_id(seq, caller, timestamp), caller: caller.clone(), timestamp })
    }

    /// Commit a batch that emits exactly one event.
    fn commit_one(&self, batch: &StateBatch) -> Result<EventRecord, MintcapError> {
        self.ledger
            .commit(batch)?
            .pop()
            .ok_or_else(|| MintcapError::Other("commit returned no event".into()))
    }
}

/// Year bucket of `ts`: plain integer division, no calendar alignment.
pub fn year_of(ts: Timestamp) -> YearIndex {
    ts / SECONDS_PER_YEAR
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Weak;

    use crate::clock::ManualClock;
    use mintcap_core::hash::account_id_from_seed;
    use mintcap_core::UNITS_PER_TOKEN;

    // ── Helpers ───────────────────────────────────────────────────────────────

    /// 2026-10-16 00:00:00 UTC, year bucket 56.
    const T0: Timestamp = 1_792_108_800;

    struct Fixture {
        controller: Arc<SupplyController>,
        clock: Arc<ManualClock>,
        admin: AccountId,
    }

    fn setup() -> Fixture {
        let db = Arc::new(StateDb::temporary().expect("temp db"));
        let clock = Arc::new(ManualClock::new(T0));
        let admin = account_id_from_seed("admin");
        let caps = Capabilities::from_db(&db, clock.clone());
        let controller = SupplyController::initialize(db, caps, admin.clone()).expect("genesis");
        Fixture { controller: Arc::new(controller), clock, admin }
    }

    fn snapshot(f: &Fixture, who: &AccountId) -> (Balance, Balance, Balance, usize) {
        let c = &f.controller;
        (
            c.balance_of(who).unwrap(),
            c.total_supply().unwrap(),
            c.annual_minted(c.current_year()).unwrap(),
            c.db().event_count(),
        )
    }

    // ── Genesis ───────────────────────────────────────────────────────────────

    #[test]
    fn genesis_credits_admin_and_grants_roles() {
        let f = setup();
        let c = &f.controller;
        assert_eq!(c.balance_of(&f.admin).unwrap(), INITIAL_SUPPLY);
        assert_eq!(c.total_supply().unwrap(), INITIAL_SUPPLY);
        for role in Role::ALL {
            assert!(c.has_role(role, &f.admin).unwrap());
        }
        for year in [0, 1, year_of(T0), u64::MAX] {
            assert_eq!(c.annual_minted(year).unwrap(), 0);
        }
        assert!(c.db().iter_annual_minted().unwrap().is_empty());
        assert_eq!(c.verify_supply().unwrap(), INITIAL_SUPPLY);
    }

    #[test]
    fn genesis_rejects_null_admin_and_writes_nothing() {
        let db = Arc::new(StateDb::temporary().unwrap());
        let caps = Capabilities::from_db(&db, Arc::new(ManualClock::new(T0)));
        let err = SupplyController::initialize(Arc::clone(&db), caps, AccountId::NULL)
            .err()
            .unwrap();
        assert_eq!(err, MintcapError::InvalidAdmin);
        assert!(db.is_empty());
        assert_eq!(db.event_count(), 0);
    }

    #[test]
    fn genesis_runs_once() {
        let f = setup();
        let db = Arc::clone(f.controller.db());
        let caps = Capabilities::from_db(&db, f.clock.clone());
        let err = SupplyController::initialize(db, caps, account_id_from_seed("other"))
            .err()
            .unwrap();
        assert_eq!(err, MintcapError::AlreadyInitialized);
    }

    #[test]
    fn open_requires_genesis() {
        let db = Arc::new(StateDb::temporary().unwrap());
        let caps = Capabilities::from_db(&db, Arc::new(ManualClock::new(T0)));
        assert_eq!(
            SupplyController::open(db, caps).err().unwrap(),
            MintcapError::NotInitialized
        );

        let f = setup();
        let db = Arc::clone(f.controller.db());
        let caps = Capabilities::from_db(&db, f.clock.clone());
        let reopened = SupplyController::open(db, caps).unwrap();
        assert_eq!(reopened.admin(), &f.admin);
    }

    // ── Mint ──────────────────────────────────────────────────────────────────

    #[test]
    fn mint_credits_and_counts() {
        let f = setup();
        let bob = account_id_from_seed("bob");
        let amount = 1_000 * UNITS_PER_TOKEN;
        let record = f.controller.mint(&f.admin, &bob, amount).unwrap();

        let year = year_of(T0);
        assert_eq!(record.event, SupplyEvent::TokensMinted { year, to: bob.clone(), amount });
        assert_eq!(record.context.caller, f.admin);
        assert_eq!(record.context.timestamp, T0);
        assert_eq!(f.controller.balance_of(&bob).unwrap(), amount);
        assert_eq!(f.controller.total_supply().unwrap(), INITIAL_SUPPLY + amount);
        assert_eq!(f.controller.annual_minted(year).unwrap(), amount);
        assert_eq!(f.controller.remaining_annual_mint(year).unwrap(), MAX_ANNUAL_MINT - amount);
    }

    #[test]
    fn exact_cap_then_one_more_fails() {
        let f = setup();
        let bob = account_id_from_seed("bob");
        f.controller.mint(&f.admin, &bob, MAX_ANNUAL_MINT).unwrap();

        let before = snapshot(&f, &bob);
        let err = f.controller.mint(&f.admin, &bob, 1).unwrap_err();
        assert_eq!(
            err,
            MintcapError::AnnualCapExceeded {
                year: year_of(T0),
                minted: MAX_ANNUAL_MINT,
                requested: 1,
                cap: MAX_ANNUAL_MINT,
            }
        );
        assert_eq!(snapshot(&f, &bob), before);
    }

    #[test]
    fn second_mint_over_cap_leaves_state_unchanged() {
        let f = setup();
        let bob = account_id_from_seed("bob");
        let first = MAX_ANNUAL_MINT / 2 + 1;
        f.controller.mint(&f.admin, &bob, first).unwrap();

        let before = snapshot(&f, &bob);
        let err = f.controller.mint(&f.admin, &bob, MAX_ANNUAL_MINT / 2).unwrap_err();
        assert!(matches!(err, MintcapError::AnnualCapExceeded { .. }));
        assert_eq!(snapshot(&f, &bob), before);
    }

    #[test]
    fn single_mint_over_cap_on_fresh_year_fails() {
        let f = setup();
        let bob = account_id_from_seed("bob");
        let err = f.controller.mint(&f.admin, &bob, MAX_ANNUAL_MINT + 1).unwrap_err();
        assert!(matches!(err, MintcapError::AnnualCapExceeded { minted: 0, .. }));
        assert!(f.controller.db().iter_annual_minted().unwrap().is_empty());
    }

    #[test]
    fn year_rollover_opens_a_new_bucket() {
        let f = setup();
        let bob = account_id_from_seed("bob");
        let y0 = f.controller.current_year();
        f.controller.mint(&f.admin, &bob, MAX_ANNUAL_MINT).unwrap();

        f.clock.advance(SECONDS_PER_YEAR);
        let y1 = f.controller.current_year();
        assert_eq!(y1, y0 + 1);
        f.controller.mint(&f.admin, &bob, MAX_ANNUAL_MINT).unwrap();

        assert_eq!(f.controller.annual_minted(y0).unwrap(), MAX_ANNUAL_MINT);
        assert_eq!(f.controller.annual_minted(y1).unwrap(), MAX_ANNUAL_MINT);
        assert_eq!(f.controller.balance_of(&bob).unwrap(), 2 * MAX_ANNUAL_MINT);
    }

    #[test]
    fn bucket_boundary_is_exact() {
        let f = setup();
        let bob = account_id_from_seed("bob");
        let boundary = (year_of(T0) + 1) * SECONDS_PER_YEAR;

        f.clock.set(boundary - 1);
        f.controller.mint(&f.admin, &bob, MAX_ANNUAL_MINT).unwrap();
        assert!(f.controller.mint(&f.admin, &bob, 1).is_err());

        f.clock.set(boundary);
        f.controller.mint(&f.admin, &bob, 1).unwrap();
        assert_eq!(f.controller.annual_minted(year_of(boundary)).unwrap(), 1);
    }

    #[test]
    fn mint_requires_minter_role() {
        let f = setup();
        let mallory = account_id_from_seed("mallory");
        let before = snapshot(&f, &mallory);
        let err = f.controller.mint(&mallory, &mallory, 1).unwrap_err();
        assert_eq!(
            err,
            MintcapError::Unauthorized { account: mallory.to_b58(), role: Role::Minter }
        );
        assert_eq!(snapshot(&f, &mallory), before);
    }

    #[test]
    fn mint_input_guards() {
        let f = setup();
        let bob = account_id_from_seed("bob");
        assert_eq!(
            f.controller.mint(&f.admin, &AccountId::NULL, 1).unwrap_err(),
            MintcapError::InvalidRecipient
        );
        assert_eq!(f.controller.mint(&f.admin, &bob, 0).unwrap_err(), MintcapError::InvalidAmount);
        assert_eq!(f.controller.total_supply().unwrap(), INITIAL_SUPPLY);
    }

    #[test]
    fn role_check_precedes_input_checks() {
        let f = setup();
        let mallory = account_id_from_seed("mallory");
        let err = f.controller.mint(&mallory, &AccountId::NULL, 0).unwrap_err();
        assert!(matches!(err, MintcapError::Unauthorized { .. }));
    }

    // ── Burn ──────────────────────────────────────────────────────────────────

    #[test]
    fn burn_debits_caller_and_supply() {
        let f = setup();
        let amount = 5 * UNITS_PER_TOKEN;
        let record = f.controller.burn_from_self(&f.admin, amount).unwrap();
        assert_eq!(record.event, SupplyEvent::TokensBurned { from: f.admin.clone(), amount });
        assert_eq!(f.controller.balance_of(&f.admin).unwrap(), INITIAL_SUPPLY - amount);
        assert_eq!(f.controller.total_supply().unwrap(), INITIAL_SUPPLY - amount);
        // Burning never refunds the annual cap.
        assert_eq!(f.controller.annual_minted(f.controller.current_year()).unwrap(), 0);
    }

    #[test]
    fn burn_requires_burner_role() {
        let f = setup();
        let bob = account_id_from_seed("bob");
        f.controller.mint(&f.admin, &bob, 10).unwrap();
        let before = snapshot(&f, &bob);
        let err = f.controller.burn_from_self(&bob, 1).unwrap_err();
        assert_eq!(err, MintcapError::Unauthorized { account: bob.to_b58(), role: Role::Burner });
        assert_eq!(snapshot(&f, &bob), before);
    }

    #[test]
    fn burn_guards_amount_and_balance() {
        let f = setup();
        let bob = account_id_from_seed("bob");
        f.controller.grant_role(&f.admin, Role::Burner, &bob).unwrap();
        f.controller.mint(&f.admin, &bob, 10).unwrap();

        assert_eq!(f.controller.burn_from_self(&bob, 0).unwrap_err(), MintcapError::InvalidAmount);
        let before = snapshot(&f, &bob);
        assert_eq!(
            f.controller.burn_from_self(&bob, 11).unwrap_err(),
            MintcapError::InsufficientBalance { need: 11, have: 10 }
        );
        assert_eq!(snapshot(&f, &bob), before);

        f.controller.burn_from_self(&bob, 10).unwrap();
        assert_eq!(f.controller.balance_of(&bob).unwrap(), 0);
    }

    // ── Supply identity ───────────────────────────────────────────────────────

    #[test]
    fn supply_tracks_mints_minus_burns() {
        let f = setup();
        let bob = account_id_from_seed("bob");
        f.controller.grant_role(&f.admin, Role::Burner, &bob).unwrap();

        let mut minted: Balance = 0;
        let mut burned: Balance = 0;
        for (i, amount) in [7u128, 300, 12, MAX_ANNUAL_MINT, 1, 99].into_iter().enumerate() {
            if f.controller.mint(&f.admin, &bob, amount).is_ok() {
                minted += amount;
            }
            if i % 2 == 1 && f.controller.burn_from_self(&bob, amount / 2 + 1).is_ok() {
                burned += amount / 2 + 1;
            }
            assert_eq!(f.controller.total_supply().unwrap(), INITIAL_SUPPLY + minted - burned);
            assert!(f.controller.annual_minted(f.controller.current_year()).unwrap() <= MAX_ANNUAL_MINT);
        }
        assert_eq!(f.controller.verify_supply().unwrap(), INITIAL_SUPPLY + minted - burned);
    }

    // ── Roles ─────────────────────────────────────────────────────────────────

    #[test]
    fn granted_minter_can_mint_and_revoked_cannot() {
        let f = setup();
        let minter = account_id_from_seed("minter");
        let granted = f.controller.grant_role(&f.admin, Role::Minter, &minter).unwrap();
        assert!(matches!(
            granted.map(|r| r.event),
            Some(SupplyEvent::RoleGranted { role: Role::Minter, .. })
        ));
        assert!(f.controller.grant_role(&f.admin, Role::Minter, &minter).unwrap().is_none());

        f.controller.mint(&minter, &minter, 1).unwrap();
        f.controller.revoke_role(&f.admin, Role::Minter, &minter).unwrap();
        assert!(matches!(
            f.controller.mint(&minter, &minter, 1),
            Err(MintcapError::Unauthorized { .. })
        ));
    }

    #[test]
    fn non_admin_cannot_grant() {
        let f = setup();
        let bob = account_id_from_seed("bob");
        let err = f.controller.grant_role(&bob, Role::Minter, &bob).unwrap_err();
        assert_eq!(err, MintcapError::Unauthorized { account: bob.to_b58(), role: Role::Admin });
        assert!(!f.controller.has_role(Role::Minter, &bob).unwrap());
    }

    #[test]
    fn null_account_cannot_be_granted() {
        let f = setup();
        assert_eq!(
            f.controller.grant_role(&f.admin, Role::Minter, &AccountId::NULL).unwrap_err(),
            MintcapError::InvalidRecipient
        );
        assert_eq!(f.controller.role_members(Role::Minter).unwrap(), vec![f.admin.clone()]);
    }

    #[test]
    fn admin_can_renounce_minting() {
        let f = setup();
        let record = f.controller.renounce_role(&f.admin, Role::Minter).unwrap();
        assert!(record.is_some());
        assert!(f.controller.renounce_role(&f.admin, Role::Minter).unwrap().is_none());
        assert!(f.controller.mint(&f.admin, &f.admin, 1).is_err());
    }

    // ── Events ────────────────────────────────────────────────────────────────

    #[test]
    fn events_are_tagged_with_distinct_calls() {
        let f = setup();
        let bob = account_id_from_seed("bob");
        let a = f.controller.mint(&f.admin, &bob, 1).unwrap();
        let b = f.controller.mint(&f.admin, &bob, 1).unwrap();
        assert_ne!(a.context.call_id, b.context.call_id);
        assert!(b.seq > a.seq);

        let log = f.controller.events(a.seq, 10).unwrap();
        assert_eq!(log, vec![a, b]);
        // Genesis emits one RoleGranted per role.
        let genesis = f.controller.events(0, 3).unwrap();
        assert!(genesis.iter().all(|r| matches!(r.event, SupplyEvent::RoleGranted { .. })));
    }

    #[test]
    fn apply_dispatches_calls() {
        let f = setup();
        let bob = account_id_from_seed("bob");
        let call = |caller: &AccountId, call| CallEnvelope { caller: caller.clone(), call };

        let minted = f
            .controller
            .apply(&call(&f.admin, LedgerCall::Mint { to: bob.clone(), amount: 9 }))
            .unwrap();
        assert!(matches!(minted.map(|r| r.event), Some(SupplyEvent::TokensMinted { amount: 9, .. })));

        f.controller
            .apply(&call(&f.admin, LedgerCall::GrantRole { role: Role::Burner, account: bob.clone() }))
            .unwrap();
        f.controller.apply(&call(&bob, LedgerCall::Burn { amount: 4 })).unwrap();
        assert_eq!(f.controller.balance_of(&bob).unwrap(), 5);

        let renounced = f
            .controller
            .apply(&call(&bob, LedgerCall::RenounceRole { role: Role::Burner }))
            .unwrap();
        assert!(renounced.is_some());
        assert!(matches!(
            f.controller.apply(&call(&bob, LedgerCall::Burn { amount: 1 })),
            Err(MintcapError::Unauthorized { .. })
        ));
    }

    // ── Re-entrancy ───────────────────────────────────────────────────────────

    /// Calls back into the controller during the hook and records the result.
    struct ReenteringHook {
        controller: Weak<SupplyController>,
        caller: AccountId,
        nested: RwLock<Vec<Result<EventRecord, MintcapError>>>,
    }

    impl RecipientHook for ReenteringHook {
        fn on_mint(&self, _: &CallContext, to: &AccountId, _: Balance) -> Result<(), MintcapError> {
            if let Some(c) = self.controller.upgrade() {
                let nested = c.mint(&self.caller, to, MAX_ANNUAL_MINT);
                self.nested.write().push(nested);
                let nested = c.burn_from_self(&self.caller, 1);
                self.nested.write().push(nested);
            }
            Ok(())
        }
    }

    #[test]
    fn hook_cannot_reenter_mint_or_burn() {
        let f = setup();
        let bob = account_id_from_seed("bob");
        let hook = Arc::new(ReenteringHook {
            controller: Arc::downgrade(&f.controller),
            caller: f.admin.clone(),
            nested: RwLock::new(Vec::new()),
        });
        f.controller.set_recipient_hook(hook.clone());

        f.controller.mint(&f.admin, &bob, MAX_ANNUAL_MINT).unwrap();

        let nested = hook.nested.read();
        assert_eq!(nested.len(), 2);
        assert!(nested.iter().all(|r| matches!(r, Err(MintcapError::ReentrantCall))));
        assert_eq!(f.controller.annual_minted(year_of(T0)).unwrap(), MAX_ANNUAL_MINT);
        assert_eq!(f.controller.balance_of(&bob).unwrap(), MAX_ANNUAL_MINT);
        assert_eq!(f.controller.total_supply().unwrap(), INITIAL_SUPPLY + MAX_ANNUAL_MINT);
    }

    struct RejectingHook;

    impl RecipientHook for RejectingHook {
        fn on_mint(&self, _: &CallContext, _: &AccountId, _: Balance) -> Result<(), MintcapError> {
            Err(MintcapError::Other("recipient refuses tokens".into()))
        }
    }

    #[test]
    fn rejected_hook_rolls_mint_back() {
        let f = setup();
        let bob = account_id_from_seed("bob");
        f.controller.mint(&f.admin, &bob, 5).unwrap();
        f.controller.set_recipient_hook(Arc::new(RejectingHook));

        let before = snapshot(&f, &bob);
        let err = f.controller.mint(&f.admin, &bob, 7).unwrap_err();
        assert!(matches!(err, MintcapError::RecipientRejected(_)));
        assert_eq!(snapshot(&f, &bob), before);

        // A rejected first mint of a year leaves no counter behind.
        f.clock.advance(SECONDS_PER_YEAR);
        assert!(f.controller.mint(&f.admin, &bob, 7).is_err());
        assert_eq!(f.controller.db().get_annual_minted(f.controller.current_year()).unwrap(), None);

        f.controller.clear_recipient_hook();
        f.controller.mint(&f.admin, &bob, 7).unwrap();
    }

    /// Reads shared state from another thread while the mint is in flight.
    struct ObservingHook {
        controller: Weak<SupplyController>,
        seen: RwLock<Option<(Balance, Balance, Balance, usize)>>,
        reject: bool,
    }

    impl RecipientHook for ObservingHook {
        fn on_mint(&self, ctx: &CallContext, to: &AccountId, _: Balance) -> Result<(), MintcapError> {
            if let Some(c) = self.controller.upgrade() {
                let to = to.clone();
                let year = year_of(ctx.timestamp);
                let seen = std::thread::spawn(move || {
                    (
                        c.balance_of(&to).unwrap(),
                        c.total_supply().unwrap(),
                        c.annual_minted(year).unwrap(),
                        c.db().event_count(),
                    )
                })
                .join()
                .ok();
                *self.seen.write() = seen;
            }
            if self.reject {
                Err(MintcapError::Other("refuse".into()))
            } else {
                Ok(())
            }
        }
    }

    fn observing_hook(f: &Fixture, reject: bool) -> Arc<ObservingHook> {
        let hook = Arc::new(ObservingHook {
            controller: Arc::downgrade(&f.controller),
            seen: RwLock::new(None),
            reject,
        });
        f.controller.set_recipient_hook(hook.clone());
        hook
    }

    #[test]
    fn readers_never_see_a_cancelled_mint() {
        let f = setup();
        let bob = account_id_from_seed("bob");
        f.controller.mint(&f.admin, &bob, 5).unwrap();
        let hook = observing_hook(&f, true);

        let before = snapshot(&f, &bob);
        let err = f.controller.mint(&f.admin, &bob, 7).unwrap_err();
        assert!(matches!(err, MintcapError::RecipientRejected(_)));
        assert_eq!(*hook.seen.read(), Some(before));
        assert_eq!(snapshot(&f, &bob), before);
        assert_eq!(f.controller.verify_supply().unwrap(), INITIAL_SUPPLY + 5);
    }

    #[test]
    fn accepted_mint_lands_in_one_step() {
        let f = setup();
        let bob = account_id_from_seed("bob");
        let hook = observing_hook(&f, false);

        let before = snapshot(&f, &bob);
        f.controller.mint(&f.admin, &bob, 7).unwrap();
        assert_eq!(*hook.seen.read(), Some(before));
        assert_eq!(snapshot(&f, &bob), (7, INITIAL_SUPPLY + 7, 7, before.3 + 1));
    }

    #[test]
    fn racing_genesis_installs_a_single_admin() {
        let db = Arc::new(StateDb::temporary().unwrap());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let db = Arc::clone(&db);
                std::thread::spawn(move || {
                    let caps = Capabilities::from_db(&db, Arc::new(ManualClock::new(T0)));
                    let admin = account_id_from_seed(&format!("admin-{i}"));
                    SupplyController::initialize(Arc::clone(&db), caps, admin).is_ok()
                })
            })
            .collect();
        let ok = handles.into_iter().filter_map(|h| h.join().ok()).filter(|ok| *ok).count();
        assert_eq!(ok, 1);

        let admin = db.get_genesis_admin().unwrap().unwrap();
        for role in Role::ALL {
            assert_eq!(db.role_members(role).unwrap(), vec![admin.clone()]);
        }
        assert_eq!(db.get_balance(&admin).unwrap(), INITIAL_SUPPLY);
        assert_eq!(db.get_total_supply().unwrap(), INITIAL_SUPPLY);
        assert_eq!(db.event_count(), Role::ALL.len());
    }

    #[test]
    fn concurrent_mints_never_exceed_cap() {
        let f = setup();
        let chunk = MAX_ANNUAL_MINT / 10 + 1;
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let c = Arc::clone(&f.controller);
                let admin = f.admin.clone();
                std::thread::spawn(move || {
                    let to = account_id_from_seed(&format!("holder-{i}"));
                    c.mint(&admin, &to, chunk).is_ok()
                })
            })
            .collect();
        let ok = handles.into_iter().filter_map(|h| h.join().ok()).filter(|ok| *ok).count();

        assert_eq!(ok, 9);
        let minted = f.controller.annual_minted(year_of(T0)).unwrap();
        assert_eq!(minted, chunk * 9);
        assert!(minted <= MAX_ANNUAL_MINT);
        assert_eq!(f.controller.verify_supply().unwrap(), INITIAL_SUPPLY + minted);
    }
}

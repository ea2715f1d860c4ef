use std::cell::Cell;

use mintcap_core::error::MintcapError;
use parking_lot::{ReentrantMutex, ReentrantMutexGuard};

/// Mutual exclusion for the controller's state-changing operations.
///
/// Calls from other threads block until the running operation finishes.
/// A nested call from the thread that already holds the guard (for example
/// a recipient hook calling back into `mint`) is refused with
/// `ReentrantCall` instead of deadlocking.
#[derive(Default)]
pub struct CallGuard {
    lock: ReentrantMutex<Cell<bool>>,
}

/// Proof that the guard is held. Releases on drop, including on early
/// returns through `?`.
pub struct GuardToken<'a> {
    held: ReentrantMutexGuard<'a, Cell<bool>>,
}

impl CallGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter(&self) -> Result<GuardToken<'_>, MintcapError> {
        let held = self.lock.lock();
        if held.get() {
            return Err(MintcapError::ReentrantCall);
        }
        held.set(true);
        Ok(GuardToken { held })
    }

    /// True while some operation holds the guard.
    pub fn is_held(&self) -> bool {
        match self.lock.try_lock() {
            Some(held) => held.get(),
            None => true,
        }
    }
}

impl Drop for GuardToken<'_> {
    fn drop(&mut self) {
        self.held.set(false);
    }
}

//! Lock-serialized ledger handle for concurrent callers.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::LedgerError;
use crate::event::EventListener;
use crate::ledger::{Ledger, LedgerSnapshot};
use buidl_types::{AccountId, TokenAmount};

/// A cloneable handle to one [`Ledger`] behind a single mutex.
///
/// The whole ledger is one lock: supply conservation spans the supply counter
/// and every balance, so no finer-grained locking is sound. Each call holds the
/// lock for exactly one operation, so operations from different threads are
/// applied one at a time and never interleave.
#[derive(Clone)]
pub struct SharedLedger {
    inner: Arc<Mutex<Ledger>>,
}

impl SharedLedger {
    pub fn new(ledger: Ledger) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ledger)),
        }
    }

    /// Run `f` with exclusive access to the ledger.
    pub fn with<R>(&self, f: impl FnOnce(&mut Ledger) -> R) -> R {
        f(&mut self.lock())
    }

    pub fn mint(&self, caller: &AccountId, amount: TokenAmount) -> Result<(), LedgerError> {
        self.lock().mint(caller, amount)
    }

    pub fn burn(&self, caller: &AccountId, amount: TokenAmount) -> Result<(), LedgerError> {
        self.lock().burn(caller, amount)
    }

    pub fn approve(
        &self,
        owner: &AccountId,
        spender: &AccountId,
        amount: TokenAmount,
    ) -> Result<(), LedgerError> {
        self.lock().approve(owner, spender, amount)
    }

    pub fn transfer(
        &self,
        from: &AccountId,
        to: &AccountId,
        amount: TokenAmount,
    ) -> Result<(), LedgerError> {
        self.lock().transfer(from, to, amount)
    }

    pub fn transfer_from(
        &self,
        spender: &AccountId,
        owner: &AccountId,
        to: &AccountId,
        amount: TokenAmount,
    ) -> Result<(), LedgerError> {
        self.lock().transfer_from(spender, owner, to, amount)
    }

    pub fn total_supply(&self) -> TokenAmount {
        self.lock().total_supply()
    }

    pub fn balance_of(&self, account: &AccountId) -> TokenAmount {
        self.lock().balance_of(account)
    }

    pub fn allowance(&self, owner: &AccountId, spender: &AccountId) -> TokenAmount {
        self.lock().allowance(owner, spender)
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        self.lock().snapshot()
    }

    pub fn subscribe(&self, listener: EventListener) {
        self.lock().subscribe(listener);
    }

    fn lock(&self) -> MutexGuard<'_, Ledger> {
        // Operations validate before writing and never panic mid-commit, so a
        // poisoned lock still guards a consistent ledger.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl From<Ledger> for SharedLedger {
    fn from(ledger: Ledger) -> Self {
        Self::new(ledger)
    }
}

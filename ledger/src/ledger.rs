//! Core ledger state machine.

use std::collections::{BTreeMap, HashMap};

use crate::error::LedgerError;
use crate::event::{EventBus, EventListener, LedgerEvent};
use buidl_types::{AccountId, SupplyPolicy, TokenAmount, TokenParams};
use tracing::debug;

/// Point-in-time copy of all accounting state.
///
/// Zero balances and allowances are never stored, so two snapshots compare
/// equal exactly when every query on the ledgers would return the same value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LedgerSnapshot {
    pub total_supply: TokenAmount,
    pub balances: BTreeMap<AccountId, TokenAmount>,
    /// Keyed by `(owner, spender)`.
    pub allowances: BTreeMap<(AccountId, AccountId), TokenAmount>,
}

impl LedgerSnapshot {
    /// Whether total supply equals the sum of all balances.
    pub fn is_conserved(&self) -> bool {
        self.balances
            .values()
            .try_fold(TokenAmount::ZERO, |acc, b| acc.checked_add(*b))
            == Some(self.total_supply)
    }
}

/// The fungible-token ledger.
///
/// Every mutating operation validates completely before writing anything, so
/// it is either applied in full or rejected with no state change. Events are
/// emitted only after a successful commit.
pub struct Ledger {
    params: TokenParams,
    owner: AccountId,
    total_supply: TokenAmount,
    /// Absent entry means a zero balance.
    balances: HashMap<AccountId, TokenAmount>,
    /// owner → spender → remaining allowance. Absent entry means zero.
    allowances: HashMap<AccountId, HashMap<AccountId, TokenAmount>>,
    events: EventBus,
}

impl Ledger {
    /// Create a ledger with default metadata, crediting `initial_supply` to `owner`.
    pub fn new(initial_supply: TokenAmount, owner: AccountId) -> Self {
        Self::with_params(TokenParams::with_initial_supply(initial_supply), owner)
    }

    /// Create a ledger from full token parameters, crediting the initial supply to `owner`.
    pub fn with_params(params: TokenParams, owner: AccountId) -> Self {
        let mut ledger = Self {
            total_supply: params.initial_supply,
            params,
            owner: owner.clone(),
            balances: HashMap::new(),
            allowances: HashMap::new(),
            events: EventBus::new(),
        };
        ledger.set_balance(&owner, ledger.total_supply);
        debug!(
            %owner,
            initial_supply = %ledger.total_supply,
            symbol = %ledger.params.symbol,
            "ledger created"
        );
        ledger
    }

    // ── Queries ─────────────────────────────────────────────────────────

    pub fn name(&self) -> &str {
        &self.params.name
    }

    pub fn symbol(&self) -> &str {
        &self.params.symbol
    }

    pub fn decimals(&self) -> u8 {
        self.params.decimals
    }

    pub fn owner(&self) -> &AccountId {
        &self.owner
    }

    pub fn params(&self) -> &TokenParams {
        &self.params
    }

    pub fn total_supply(&self) -> TokenAmount {
        self.total_supply
    }

    pub fn balance_of(&self, account: &AccountId) -> TokenAmount {
        self.balances.get(account).copied().unwrap_or(TokenAmount::ZERO)
    }

    pub fn allowance(&self, owner: &AccountId, spender: &AccountId) -> TokenAmount {
        self.allowances
            .get(owner)
            .and_then(|spenders| spenders.get(spender))
            .copied()
            .unwrap_or(TokenAmount::ZERO)
    }

    /// Number of accounts holding a non-zero balance.
    pub fn holder_count(&self) -> usize {
        self.balances.len()
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            total_supply: self.total_supply,
            balances: self
                .balances
                .iter()
                .map(|(account, amount)| (account.clone(), *amount))
                .collect(),
            allowances: self
                .allowances
                .iter()
                .flat_map(|(owner, spenders)| {
                    spenders
                        .iter()
                        .map(move |(spender, amount)| ((owner.clone(), spender.clone()), *amount))
                })
                .collect(),
        }
    }

    /// Register a listener for events of committed operations.
    pub fn subscribe(&mut self, listener: EventListener) {
        self.events.subscribe(listener);
    }

    /// Number of events published by committed operations.
    pub fn events_published(&self) -> u64 {
        self.events.published()
    }

    // ── Operations ──────────────────────────────────────────────────────

    /// Create `amount` new tokens and credit them to `caller`.
    pub fn mint(&mut self, caller: &AccountId, amount: TokenAmount) -> Result<(), LedgerError> {
        self.apply_mint(caller, amount)
            .inspect_err(|err| debug!(%caller, %amount, %err, "mint rejected"))
    }

    /// Destroy `amount` tokens from `caller`'s own balance.
    ///
    /// Gated only by the caller's balance; total supply is the sum of balances
    /// and so can never be the binding constraint.
    pub fn burn(&mut self, caller: &AccountId, amount: TokenAmount) -> Result<(), LedgerError> {
        self.apply_burn(caller, amount)
            .inspect_err(|err| debug!(%caller, %amount, %err, "burn rejected"))
    }

    /// Set the allowance of `spender` over `owner`'s balance to exactly `amount`.
    ///
    /// Overwrites any previous allowance. Not checked against the owner's
    /// balance; that happens when the allowance is spent.
    pub fn approve(
        &mut self,
        owner: &AccountId,
        spender: &AccountId,
        amount: TokenAmount,
    ) -> Result<(), LedgerError> {
        self.set_allowance(owner, spender, amount);
        debug!(%owner, %spender, %amount, "approval set");
        self.events.publish(&[LedgerEvent::Approval {
            owner: owner.clone(),
            spender: spender.clone(),
            amount,
        }]);
        Ok(())
    }

    /// Move `amount` from `from` to `to`. Total supply is unchanged.
    pub fn transfer(
        &mut self,
        from: &AccountId,
        to: &AccountId,
        amount: TokenAmount,
    ) -> Result<(), LedgerError> {
        self.apply_transfer(from, to, amount)
            .inspect_err(|err| debug!(%from, %to, %amount, %err, "transfer rejected"))
    }

    /// Move `amount` from `owner` to `to` on behalf of `spender`, consuming
    /// exactly `amount` of the allowance `owner` granted `spender`.
    ///
    /// The allowance is checked first, then the owner's current balance.
    pub fn transfer_from(
        &mut self,
        spender: &AccountId,
        owner: &AccountId,
        to: &AccountId,
        amount: TokenAmount,
    ) -> Result<(), LedgerError> {
        self.apply_transfer_from(spender, owner, to, amount).inspect_err(|err| {
            debug!(%spender, %owner, %to, %amount, %err, "delegated transfer rejected")
        })
    }

    // ── Transitions ─────────────────────────────────────────────────────

    fn apply_mint(&mut self, caller: &AccountId, amount: TokenAmount) -> Result<(), LedgerError> {
        self.authorize_supply_change(caller)?;
        let total_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        let balance = self
            .balance_of(caller)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;

        self.total_supply = total_supply;
        self.set_balance(caller, balance);
        debug!(%caller, %amount, %total_supply, "mint applied");
        self.events.publish(&[LedgerEvent::Transfer {
            from: None,
            to: Some(caller.clone()),
            amount,
        }]);
        Ok(())
    }

    fn apply_burn(&mut self, caller: &AccountId, amount: TokenAmount) -> Result<(), LedgerError> {
        self.authorize_supply_change(caller)?;
        let available = self.balance_of(caller);
        let balance = available
            .checked_sub(amount)
            .ok_or_else(|| LedgerError::InsufficientBalance {
                account: caller.clone(),
                needed: amount,
                available,
            })?;
        // Cannot fail while supply is conserved, since balance <= total supply.
        let total_supply = self
            .total_supply
            .checked_sub(amount)
            .ok_or(LedgerError::Overflow)?;

        self.total_supply = total_supply;
        self.set_balance(caller, balance);
        debug!(%caller, %amount, %total_supply, "burn applied");
        self.events.publish(&[LedgerEvent::Transfer {
            from: Some(caller.clone()),
            to: None,
            amount,
        }]);
        Ok(())
    }

    fn apply_transfer(
        &mut self,
        from: &AccountId,
        to: &AccountId,
        amount: TokenAmount,
    ) -> Result<(), LedgerError> {
        let planned = self.plan_move(from, to, amount)?;

        self.commit_move(from, to, planned);
        debug!(%from, %to, %amount, "transfer applied");
        self.events.publish(&[LedgerEvent::Transfer {
            from: Some(from.clone()),
            to: Some(to.clone()),
            amount,
        }]);
        Ok(())
    }

    fn apply_transfer_from(
        &mut self,
        spender: &AccountId,
        owner: &AccountId,
        to: &AccountId,
        amount: TokenAmount,
    ) -> Result<(), LedgerError> {
        let allowed = self.allowance(owner, spender);
        let remaining =
            allowed
                .checked_sub(amount)
                .ok_or_else(|| LedgerError::InsufficientAllowance {
                    owner: owner.clone(),
                    spender: spender.clone(),
                    needed: amount,
                    available: allowed,
                })?;
        let planned = self.plan_move(owner, to, amount)?;

        self.set_allowance(owner, spender, remaining);
        self.commit_move(owner, to, planned);
        debug!(%spender, %owner, %to, %amount, allowance = %remaining, "delegated transfer applied");
        self.events.publish(&[
            LedgerEvent::Transfer {
                from: Some(owner.clone()),
                to: Some(to.clone()),
                amount,
            },
            LedgerEvent::Approval {
                owner: owner.clone(),
                spender: spender.clone(),
                amount: remaining,
            },
        ]);
        Ok(())
    }

    // ── Helpers ─────────────────────────────────────────────────────────

    fn authorize_supply_change(&self, caller: &AccountId) -> Result<(), LedgerError> {
        match self.params.supply_policy {
            SupplyPolicy::Open => Ok(()),
            SupplyPolicy::OwnerOnly if *caller == self.owner => Ok(()),
            SupplyPolicy::OwnerOnly => Err(LedgerError::Unauthorized {
                caller: caller.clone(),
            }),
        }
    }

    /// Compute the post-move `(from, to)` balances without writing them.
    /// `None` means a self-transfer, which leaves balances unchanged.
    fn plan_move(
        &self,
        from: &AccountId,
        to: &AccountId,
        amount: TokenAmount,
    ) -> Result<Option<(TokenAmount, TokenAmount)>, LedgerError> {
        let available = self.balance_of(from);
        let debited = available
            .checked_sub(amount)
            .ok_or_else(|| LedgerError::InsufficientBalance {
                account: from.clone(),
                needed: amount,
                available,
            })?;
        if from == to {
            return Ok(None);
        }
        let credited = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        Ok(Some((debited, credited)))
    }

    fn commit_move(
        &mut self,
        from: &AccountId,
        to: &AccountId,
        planned: Option<(TokenAmount, TokenAmount)>,
    ) {
        if let Some((debited, credited)) = planned {
            self.set_balance(from, debited);
            self.set_balance(to, credited);
        }
    }

    fn set_balance(&mut self, account: &AccountId, amount: TokenAmount) {
        if amount.is_zero() {
            self.balances.remove(account);
        } else {
            self.balances.insert(account.clone(), amount);
        }
    }

    fn set_allowance(&mut self, owner: &AccountId, spender: &AccountId, amount: TokenAmount) {
        if amount.is_zero() {
            if let Some(spenders) = self.allowances.get_mut(owner) {
                spenders.remove(spender);
                if spenders.is_empty() {
                    self.allowances.remove(owner);
                }
            }
        } else {
            self.allowances
                .entry(owner.clone())
                .or_default()
                .insert(spender.clone(), amount);
        }
    }
}

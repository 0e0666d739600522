//! Custodial balance store.
//!
//! A [`Ledger`] is plain data: balances, held funds, the pending-withdrawal
//! queue, and the guard flag. Every operation that can invoke a payout hook is
//! driven by [`Machine`](crate::Machine), which owns all ledgers.

use crate::guard::Lock;
use reentrancy_types::{Account, Amount, Error, GuardPolicy, LedgerId};
use std::collections::BTreeMap;

#[derive(Clone, Debug)]
pub struct Ledger {
    id: LedgerId,
    name: String,
    policy: GuardPolicy,
    balances: BTreeMap<Account, Amount>,
    pending: BTreeMap<Account, Amount>,
    held: Amount,
    lock: Lock,
}

impl Ledger {
    pub fn new(id: LedgerId, name: impl Into<String>, policy: GuardPolicy) -> Self {
        Self {
            id,
            name: name.into(),
            policy,
            balances: BTreeMap::new(),
            pending: BTreeMap::new(),
            held: 0,
            lock: Lock::for_policy(policy),
        }
    }

    pub fn id(&self) -> LedgerId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn policy(&self) -> GuardPolicy {
        self.policy
    }

    /// Custodial total (`getBalance`).
    pub fn held_funds(&self) -> Amount {
        self.held
    }

    /// Recorded balance of `account` (`getUserBalance`).
    pub fn balance_of(&self, account: Account) -> Amount {
        self.balances.get(&account).copied().unwrap_or(0)
    }

    /// Amount owed to `account` by a pull-payment ledger.
    pub fn pending_of(&self, account: Account) -> Amount {
        self.pending.get(&account).copied().unwrap_or(0)
    }

    pub fn total_balances(&self) -> Amount {
        self.balances.values().sum()
    }

    pub fn total_pending(&self) -> Amount {
        self.pending.values().sum()
    }

    pub fn balances(&self) -> impl Iterator<Item = (Account, Amount)> + '_ {
        self.balances.iter().map(|(account, amount)| (*account, *amount))
    }

    /// Whether the guard flag is currently held.
    pub fn is_locked(&self) -> bool {
        self.lock.is_held()
    }

    /// Held funds equal everything the ledger owes (balances plus pending withdrawals).
    pub fn is_conserved(&self) -> bool {
        self.held == self.total_balances() + self.total_pending()
    }

    pub(crate) fn lock_mut(&mut self) -> &mut Lock {
        &mut self.lock
    }

    pub(crate) fn credit(&mut self, account: Account, amount: Amount) {
        *self.balances.entry(account).or_default() += amount;
        self.held += amount;
    }

    /// Commit a balance computed at check time. Zero balances are pruned.
    pub(crate) fn set_balance(&mut self, account: Account, amount: Amount) {
        if amount == 0 {
            self.balances.remove(&account);
        } else {
            self.balances.insert(account, amount);
        }
    }

    /// Release custodial funds for a payout.
    pub(crate) fn release_funds(&mut self, amount: Amount) -> Result<(), Error> {
        if amount > self.held {
            return Err(Error::InsufficientLiquidity {
                ledger: self.id,
                requested: amount,
                held: self.held,
            });
        }
        self.held -= amount;
        Ok(())
    }

    pub(crate) fn park(&mut self, account: Account, amount: Amount) {
        *self.pending.entry(account).or_default() += amount;
    }

    pub(crate) fn take_pending(&mut self, account: Account) -> Amount {
        self.pending.remove(&account).unwrap_or(0)
    }
}

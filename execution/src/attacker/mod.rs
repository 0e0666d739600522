//! Attacker state machines.
//!
//! An attacker is a contract account with a payout hook: when a target ledger
//! pays it, the hook re-enters that ledger before the outer call commits. The
//! recursion is bounded by a step budget, by the ledger running out of funds,
//! and by the machine's call-depth ceiling.

use crate::{Machine, Payout, PayoutNotifiable, Settlement};
use reentrancy_types::{Account, Amount, Error, LedgerId, OperationKind, Phase};
use tracing::{debug, info, warn};

mod cross_ledger;

pub use cross_ledger::CrossLedgerAttacker;

/// Default bound on re-entries per attack.
pub const DEFAULT_STEP_BUDGET: u64 = 100;

/// Default gas an attacker's callback logic costs on every payout.
pub const DEFAULT_CALLBACK_GAS: u64 = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttackerConfig {
    /// Maximum re-entries in one attack.
    pub step_budget: u64,
    /// Gas charged against the active meter each time the callback runs.
    pub callback_gas: u64,
}

impl Default for AttackerConfig {
    fn default() -> Self {
        Self {
            step_budget: DEFAULT_STEP_BUDGET,
            callback_gas: DEFAULT_CALLBACK_GAS,
        }
    }
}

impl AttackerConfig {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.step_budget == 0 {
            return Err("step_budget must be > 0");
        }
        Ok(())
    }
}

/// Entry point the callback re-enters through.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
    /// Re-issue `withdraw` on every payout.
    WithdrawOnly,
    /// Alternate `transfer` and `withdraw` against the same balance record.
    CrossFunction,
}

/// Single-ledger reentrancy attacker.
#[derive(Clone, Debug)]
pub struct Attacker {
    owner: Account,
    account: Account,
    target: LedgerId,
    strategy: Strategy,
    config: AttackerConfig,
    phase: Phase,
    steps: u64,
    deposit_amount: Amount,
    next_entry: OperationKind,
}

impl Attacker {
    pub fn new(
        owner: Account,
        account: Account,
        target: LedgerId,
        strategy: Strategy,
        config: AttackerConfig,
    ) -> Self {
        Self {
            owner,
            account,
            target,
            strategy,
            config,
            phase: Phase::Idle,
            steps: 0,
            deposit_amount: 0,
            next_entry: OperationKind::Withdraw,
        }
    }

    pub fn owner(&self) -> Account {
        self.owner
    }

    /// The attacker contract's own account.
    pub fn account(&self) -> Account {
        self.account
    }

    pub fn target(&self) -> LedgerId {
        self.target
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Successful re-entries in the current (or last) attack (`getAttackSteps`).
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Native funds accumulated by the attacker contract (`getBalance`).
    pub fn balance(&self, machine: &Machine) -> Amount {
        machine.wallet(self.account)
    }

    pub(crate) fn begin(&mut self, deposit: Amount) {
        self.phase = Phase::Attacking;
        self.steps = 0;
        self.deposit_amount = deposit;
        self.next_entry = OperationKind::Withdraw;
    }

    /// Fund the attacker from `caller`, deposit into the target, and withdraw.
    ///
    /// The whole attack is one transaction: if it fails, nothing it did
    /// persists and the attacker returns to `Idle`.
    pub fn attack(
        &mut self,
        machine: &mut Machine,
        caller: Account,
        deposit: Amount,
    ) -> Result<Settlement, Error> {
        if self.phase == Phase::Attacking {
            return Err(Error::AttackInProgress);
        }
        self.begin(deposit);
        info!(
            ledger = %self.target,
            account = %self.account,
            deposit,
            strategy = ?self.strategy,
            "starting attack"
        );

        let (target, account) = (self.target, self.account);
        let result = machine.transact(|machine| {
            machine.send(caller, account, deposit)?;
            machine.deposit(target, account, deposit)?;
            let settlement = machine.withdraw(target, account, self)?;
            if let Settlement::Deferred(_) = settlement {
                machine.complete_withdrawal(target, account, self)?;
            }
            Ok(settlement)
        });

        match &result {
            Ok(_) => {
                self.phase = Phase::Done;
                info!(
                    ledger = %target,
                    steps = self.steps,
                    balance = self.balance(machine),
                    "attack finished"
                );
            }
            Err(err) => {
                self.phase = Phase::Idle;
                self.steps = 0;
                warn!(ledger = %target, %err, "attack failed");
            }
        }
        result
    }

    /// Alias for [`Attacker::attack`] under [`Strategy::WithdrawOnly`].
    pub fn attack_with_withdraw(
        &mut self,
        machine: &mut Machine,
        caller: Account,
        deposit: Amount,
    ) -> Result<Settlement, Error> {
        self.strategy = Strategy::WithdrawOnly;
        self.attack(machine, caller, deposit)
    }

    /// Alias for [`Attacker::attack`] under [`Strategy::CrossFunction`].
    pub fn attack_with_cross_function(
        &mut self,
        machine: &mut Machine,
        caller: Account,
        deposit: Amount,
    ) -> Result<Settlement, Error> {
        self.strategy = Strategy::CrossFunction;
        self.attack(machine, caller, deposit)
    }

    /// Sweep the attacker contract's funds to its owner.
    pub fn collect_stolen_funds(
        &mut self,
        machine: &mut Machine,
        caller: Account,
    ) -> Result<Amount, Error> {
        if caller != self.owner {
            return Err(Error::Unauthorized { caller });
        }
        let amount = machine.wallet(self.account);
        if amount > 0 {
            machine.send(self.account, self.owner, amount)?;
        }
        info!(owner = %self.owner, amount, "collected stolen funds");
        Ok(amount)
    }

    fn reenter(&mut self, machine: &mut Machine) -> Result<Settlement, Error> {
        let (target, account) = (self.target, self.account);
        match self.next_entry {
            OperationKind::Transfer => {
                let amount = self.deposit_amount;
                machine.transfer(target, account, account, amount, self)
            }
            _ => machine.withdraw(target, account, self),
        }
    }
}

impl PayoutNotifiable for Attacker {
    fn notify(&mut self, machine: &mut Machine, payout: &Payout) -> Result<(), Error> {
        if self.phase != Phase::Attacking
            || payout.ledger != self.target
            || payout.recipient != self.account
        {
            return Ok(());
        }
        machine.consume_gas(self.config.callback_gas)?;

        if self.steps < self.config.step_budget && machine.balance(self.target)? > 0 {
            self.steps += 1;
            if self.strategy == Strategy::CrossFunction {
                self.next_entry = match self.next_entry {
                    OperationKind::Withdraw => OperationKind::Transfer,
                    _ => OperationKind::Withdraw,
                };
            }
            debug!(
                step = self.steps,
                entry = %self.next_entry,
                depth = machine.depth(),
                "re-entering"
            );
            if let Err(err) = self.reenter(machine) {
                // The nested frame was rolled back; it did not count.
                self.steps -= 1;
                debug!(%err, depth = machine.depth(), "re-entry failed");
            }
        }
        self.phase = Phase::Done;
        Ok(())
    }
}

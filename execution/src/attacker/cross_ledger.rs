use super::AttackerConfig;
use crate::{Machine, Payout, PayoutNotifiable, Settlement};
use reentrancy_types::{
    Account, Amount, AttackStatus, Error, LedgerId, Phase, DONE_TARGET_NAME,
};
use tracing::{debug, info, warn};

/// Minimum stake per target ledger.
pub const MIN_DEPOSIT_PER_TARGET: Amount = 1;

/// Ping-pongs withdrawals between two ledgers inside one outer call.
///
/// Each ledger may carry its own guard, but neither knows about the other: a
/// payout from ledger A re-enters ledger B, whose payout re-enters A, and so on.
/// A target whose nested call fails is closed for the rest of the attack.
#[derive(Clone, Debug)]
pub struct CrossLedgerAttacker {
    owner: Account,
    account: Account,
    targets: [LedgerId; 2],
    config: AttackerConfig,
    phase: Phase,
    steps: u64,
    closed: [bool; 2],
    next: usize,
}

impl CrossLedgerAttacker {
    pub fn new(
        owner: Account,
        account: Account,
        targets: [LedgerId; 2],
        config: AttackerConfig,
    ) -> Self {
        Self {
            owner,
            account,
            targets,
            config,
            phase: Phase::Idle,
            steps: 0,
            closed: [false; 2],
            next: 0,
        }
    }

    pub fn account(&self) -> Account {
        self.account
    }

    pub fn targets(&self) -> [LedgerId; 2] {
        self.targets
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn balance(&self, machine: &Machine) -> Amount {
        machine.wallet(self.account)
    }

    pub(crate) fn begin(&mut self) {
        self.phase = Phase::Attacking;
        self.steps = 0;
        self.closed = [false; 2];
        self.next = 0;
    }

    /// Split `deposit` across both targets, then withdraw from the first.
    pub fn attack(
        &mut self,
        machine: &mut Machine,
        caller: Account,
        deposit: Amount,
    ) -> Result<Settlement, Error> {
        if self.phase == Phase::Attacking {
            return Err(Error::AttackInProgress);
        }
        let required = MIN_DEPOSIT_PER_TARGET * self.targets.len() as Amount;
        if deposit < required {
            return Err(Error::InsufficientDeposit {
                required,
                provided: deposit,
            });
        }
        self.begin();
        info!(a = %self.targets[0], b = %self.targets[1], deposit, "starting cross-ledger attack");

        let ([a, b], account) = (self.targets, self.account);
        let half = deposit / 2;
        let result = machine.transact(|machine| {
            machine.send(caller, account, deposit)?;
            machine.deposit(a, account, half)?;
            machine.deposit(b, account, deposit - half)?;
            self.next = 1;
            machine.withdraw(a, account, self)
        });

        match &result {
            Ok(_) => {
                self.phase = Phase::Done;
                info!(
                    steps = self.steps,
                    balance = self.balance(machine),
                    "cross-ledger attack finished"
                );
            }
            Err(err) => {
                self.phase = Phase::Idle;
                self.steps = 0;
                warn!(%err, "cross-ledger attack failed");
            }
        }
        result
    }

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
        Ok(amount)
    }

    /// Live or final snapshot of the attack.
    pub fn get_attack_status(&self, machine: &Machine) -> Result<AttackStatus, Error> {
        let next_target_name = match self.phase {
            Phase::Done => DONE_TARGET_NAME.to_string(),
            _ => machine.ledger_name(self.targets[self.next])?.to_string(),
        };
        Ok(AttackStatus {
            in_progress: self.phase == Phase::Attacking,
            steps: self.steps,
            next_target_name,
            vault_a_balance: machine.balance(self.targets[0])?,
            vault_b_balance: machine.balance(self.targets[1])?,
        })
    }

    /// Re-enter `targets[index]`. A failed strike closes that target.
    fn strike(&mut self, machine: &mut Machine, index: usize) -> bool {
        self.steps += 1;
        self.next = 1 - index;
        let (target, account) = (self.targets[index], self.account);
        debug!(step = self.steps, ledger = %target, depth = machine.depth(), "striking");
        match machine.withdraw(target, account, self) {
            Ok(_) => true,
            Err(err) => {
                self.steps -= 1;
                self.closed[index] = true;
                debug!(ledger = %target, %err, "target closed");
                false
            }
        }
    }
}

impl PayoutNotifiable for CrossLedgerAttacker {
    fn notify(&mut self, machine: &mut Machine, payout: &Payout) -> Result<(), Error> {
        if self.phase != Phase::Attacking || payout.recipient != self.account {
            return Ok(());
        }
        let Some(from) = self.targets.iter().position(|t| *t == payout.ledger) else {
            return Ok(());
        };
        machine.consume_gas(self.config.callback_gas)?;

        // The other ledger first, then back into the one that just paid.
        for index in [1 - from, from] {
            if self.steps >= self.config.step_budget {
                break;
            }
            if self.closed[index] || machine.balance(self.targets[index])? == 0 {
                continue;
            }
            if self.strike(machine, index) {
                break;
            }
        }
        self.phase = Phase::Done;
        Ok(())
    }
}

use super::super::*;
use super::insufficient_balance;

impl Machine {
    // === Custody Handlers ===

    /// Move `amount` from the depositor's wallet into the ledger.
    ///
    /// Deposits take the guard like every other mutator: a nested deposit
    /// would otherwise be overwritten by the outer call's stale write.
    pub fn deposit(
        &mut self,
        ledger: LedgerId,
        account: Account,
        amount: Amount,
    ) -> Result<(), Error> {
        self.frame(ledger, account, OperationKind::Deposit, |machine| {
            machine.acquire(ledger, OperationKind::Deposit)?;
            if amount == 0 {
                return Err(Error::InvalidAmount);
            }
            machine.debit_wallet(account, amount)?;
            machine.ledger_mut(ledger)?.credit(account, amount);
            machine.release(ledger)?;
            debug!(%ledger, %account, amount, "deposited");
            Ok(())
        })
    }

    /// Pay out the caller's full balance.
    ///
    /// On a pull-payment ledger the balance is parked instead (see
    /// [`Machine::initiate_withdrawal`]) and the result is [`Settlement::Deferred`].
    pub fn withdraw(
        &mut self,
        ledger: LedgerId,
        account: Account,
        hook: &mut dyn PayoutNotifiable,
    ) -> Result<Settlement, Error> {
        if self.ledger(ledger)?.policy().is_pull_payment() {
            return self
                .initiate_withdrawal(ledger, account)
                .map(Settlement::Deferred);
        }

        self.frame(ledger, account, OperationKind::Withdraw, |machine| {
            machine.acquire(ledger, OperationKind::Withdraw)?;
            let observed = machine.ledger(ledger)?.balance_of(account);
            if observed == 0 {
                return Err(insufficient_balance(ledger, account, observed));
            }
            let settlement = machine.settle(
                ledger,
                account,
                account,
                observed,
                0,
                OperationKind::Withdraw,
                hook,
            )?;
            machine.release(ledger)?;
            Ok(settlement)
        })
    }
}

use super::super::*;
use super::insufficient_balance;

impl Machine {
    // === Pull Payment Handlers ===

    fn require_pull(&self, ledger: LedgerId, operation: OperationKind) -> Result<(), Error> {
        if !self.ledger(ledger)?.policy().is_pull_payment() {
            return Err(Error::UnsupportedOperation { ledger, operation });
        }
        Ok(())
    }

    /// Zero the live balance and record it as owed. No hook runs.
    pub fn initiate_withdrawal(
        &mut self,
        ledger: LedgerId,
        account: Account,
    ) -> Result<Amount, Error> {
        self.require_pull(ledger, OperationKind::InitiateWithdrawal)?;
        self.frame(ledger, account, OperationKind::InitiateWithdrawal, |machine| {
            let observed = machine.ledger(ledger)?.balance_of(account);
            if observed == 0 {
                return Err(insufficient_balance(ledger, account, observed));
            }
            let state = machine.ledger_mut(ledger)?;
            state.set_balance(account, 0);
            state.park(account, observed);
            debug!(%ledger, %account, amount = observed, "withdrawal initiated");
            Ok(observed)
        })
    }

    /// Clear the pending amount, then pay it out.
    pub fn complete_withdrawal(
        &mut self,
        ledger: LedgerId,
        account: Account,
        hook: &mut dyn PayoutNotifiable,
    ) -> Result<Amount, Error> {
        self.require_pull(ledger, OperationKind::CompleteWithdrawal)?;
        self.frame(ledger, account, OperationKind::CompleteWithdrawal, |machine| {
            let amount = machine.ledger_mut(ledger)?.take_pending(account);
            if amount == 0 {
                return Err(insufficient_balance(ledger, account, 0));
            }
            machine.pay_out(ledger, account, amount, OperationKind::CompleteWithdrawal, hook)?;
            Ok(amount)
        })
    }
}

use super::super::*;
use super::insufficient_balance;

impl Machine {
    // === Transfer Handlers ===

    /// Pay `amount` of `from`'s balance out to `to`.
    ///
    /// Shares the balance store with [`Machine::withdraw`]: on an unguarded
    /// ledger the debit lands after `to`'s hook has run.
    pub fn transfer(
        &mut self,
        ledger: LedgerId,
        from: Account,
        to: Account,
        amount: Amount,
        hook: &mut dyn PayoutNotifiable,
    ) -> Result<Settlement, Error> {
        self.frame(ledger, from, OperationKind::Transfer, |machine| {
            machine.acquire(ledger, OperationKind::Transfer)?;
            if to.is_zero() {
                return Err(Error::InvalidRecipient);
            }
            if amount == 0 {
                return Err(Error::InvalidAmount);
            }
            let observed = machine.ledger(ledger)?.balance_of(from);
            if amount > observed {
                return Err(insufficient_balance(ledger, from, observed));
            }
            let settlement = machine.settle(
                ledger,
                from,
                to,
                amount,
                observed - amount,
                OperationKind::Transfer,
                hook,
            )?;
            machine.release(ledger)?;
            Ok(settlement)
        })
    }
}

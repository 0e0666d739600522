use crate::call_stack::{CallStack, DEFAULT_MAX_CALL_DEPTH, MAX_CALL_DEPTH_LIMIT};
use crate::gas::{GasMeters, DEFAULT_REENTRY_GAS_COST};
use crate::guard::{mutation_order, MutationOrder};
use crate::hooks::{Payout, PayoutNotifiable};
use crate::ledger::Ledger;
use reentrancy_types::{Account, Amount, Error, GuardPolicy, LedgerId, OperationKind};
use std::collections::BTreeMap;
use tracing::{debug, warn};

mod handlers;

/// Outcome of a withdraw or transfer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Settlement {
    /// Funds were paid out to the recipient.
    Paid(Amount),
    /// Funds were parked as a pending withdrawal (pull payment).
    Deferred(Amount),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MachineConfig {
    /// Ceiling on nested ledger calls.
    pub max_call_depth: usize,
    /// Gas charged for entering a ledger operation while a gas meter is active.
    pub reentry_gas_cost: u64,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            reentry_gas_cost: DEFAULT_REENTRY_GAS_COST,
        }
    }
}

impl MachineConfig {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.max_call_depth == 0 {
            return Err("max_call_depth must be > 0");
        }
        if self.max_call_depth > MAX_CALL_DEPTH_LIMIT {
            return Err("max_call_depth must be <= 256");
        }
        if self.reentry_gas_cost == 0 {
            return Err("reentry_gas_cost must be > 0");
        }
        Ok(())
    }
}

/// Everything a failed frame rolls back.
#[derive(Clone, Debug, Default)]
struct Storage {
    ledgers: Vec<Ledger>,
    wallets: BTreeMap<Account, Amount>,
    minted: Amount,
}

/// One simulated machine: every ledger, the native wallets, and the call stack
/// of the invocation currently executing.
///
/// Payout hooks are passed into each operation and receive `&mut Machine`, so a
/// hook can re-enter any ledger synchronously. Every ledger operation runs as a
/// frame: a failure anywhere inside it restores storage (and with it any guard
/// flag) to what it was on entry.
#[derive(Debug)]
pub struct Machine {
    storage: Storage,
    stack: CallStack,
    gas: GasMeters,
    config: MachineConfig,
}

impl Default for Machine {
    fn default() -> Self {
        Self::new(MachineConfig::default())
    }
}

impl Machine {
    pub fn new(config: MachineConfig) -> Self {
        Self {
            storage: Storage::default(),
            stack: CallStack::new(config.max_call_depth),
            gas: GasMeters::default(),
            config,
        }
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    pub fn create_ledger(&mut self, name: impl Into<String>, policy: GuardPolicy) -> LedgerId {
        let id = LedgerId::new(self.storage.ledgers.len() as u32);
        let ledger = Ledger::new(id, name, policy);
        debug!(%id, name = ledger.name(), %policy, "created ledger");
        self.storage.ledgers.push(ledger);
        id
    }

    pub fn ledger(&self, id: LedgerId) -> Result<&Ledger, Error> {
        self.storage
            .ledgers
            .get(id.index())
            .ok_or(Error::UnknownLedger(id))
    }

    fn ledger_mut(&mut self, id: LedgerId) -> Result<&mut Ledger, Error> {
        self.storage
            .ledgers
            .get_mut(id.index())
            .ok_or(Error::UnknownLedger(id))
    }

    pub fn ledger_name(&self, id: LedgerId) -> Result<&str, Error> {
        Ok(self.ledger(id)?.name())
    }

    /// Held funds of a ledger (`getBalance`).
    pub fn balance(&self, id: LedgerId) -> Result<Amount, Error> {
        Ok(self.ledger(id)?.held_funds())
    }

    /// Recorded balance of `account` on a ledger (`getUserBalance`).
    pub fn user_balance(&self, id: LedgerId, account: Account) -> Result<Amount, Error> {
        Ok(self.ledger(id)?.balance_of(account))
    }

    /// Amount awaiting `complete_withdrawal` (`getPendingWithdrawal`).
    pub fn pending_withdrawal(&self, id: LedgerId, account: Account) -> Result<Amount, Error> {
        Ok(self.ledger(id)?.pending_of(account))
    }

    // === Native wallets ===

    /// Mint native funds into `account`.
    pub fn fund(&mut self, account: Account, amount: Amount) -> Result<(), Error> {
        if amount == 0 {
            return Err(Error::InvalidAmount);
        }
        if account.is_zero() {
            return Err(Error::InvalidRecipient);
        }
        let minted = self
            .storage
            .minted
            .checked_add(amount)
            .ok_or(Error::InvalidAmount)?;
        self.storage.minted = minted;
        *self.storage.wallets.entry(account).or_default() += amount;
        Ok(())
    }

    /// Plain native transfer between wallets. Never invokes a hook.
    pub fn send(&mut self, from: Account, to: Account, amount: Amount) -> Result<(), Error> {
        if amount == 0 {
            return Err(Error::InvalidAmount);
        }
        if to.is_zero() {
            return Err(Error::InvalidRecipient);
        }
        self.debit_wallet(from, amount)?;
        self.credit_wallet(to, amount);
        Ok(())
    }

    pub fn wallet(&self, account: Account) -> Amount {
        self.storage.wallets.get(&account).copied().unwrap_or(0)
    }

    /// Total native funds ever minted.
    pub fn total_supply(&self) -> Amount {
        self.storage.minted
    }

    /// Funds in wallets plus funds held by ledgers. Equals [`Self::total_supply`]
    /// under every policy.
    pub fn circulating_supply(&self) -> Amount {
        let wallets: Amount = self.storage.wallets.values().sum();
        let held: Amount = self.storage.ledgers.iter().map(Ledger::held_funds).sum();
        wallets + held
    }

    fn credit_wallet(&mut self, account: Account, amount: Amount) {
        *self.storage.wallets.entry(account).or_default() += amount;
    }

    fn debit_wallet(&mut self, account: Account, amount: Amount) -> Result<(), Error> {
        let available = self.wallet(account);
        if amount > available {
            return Err(Error::InsufficientFunds {
                account,
                requested: amount,
                available,
            });
        }
        if available == amount {
            self.storage.wallets.remove(&account);
        } else {
            self.storage.wallets.insert(account, available - amount);
        }
        Ok(())
    }

    // === Call stack and gas ===

    pub fn depth(&self) -> usize {
        self.stack.depth()
    }

    pub fn call_stack(&self) -> &CallStack {
        &self.stack
    }

    /// Charge `units` of gas to the innermost active meter.
    ///
    /// Hooks call this to account for their own logic. Without an active meter
    /// it always succeeds.
    pub fn consume_gas(&mut self, units: u64) -> Result<(), Error> {
        self.gas.consume(units)
    }

    /// Gas left in the innermost active meter.
    pub fn gas_remaining(&self) -> Option<u64> {
        self.gas.remaining()
    }

    /// Run `f` with all-or-nothing semantics over storage.
    pub fn transact<T>(
        &mut self,
        f: impl FnOnce(&mut Machine) -> Result<T, Error>,
    ) -> Result<T, Error> {
        let checkpoint = self.storage.clone();
        let result = f(self);
        if let Err(err) = &result {
            warn!(?err, "transaction reverted");
            self.storage = checkpoint;
        }
        result
    }

    /// Execute `body` as a frame on the call stack.
    fn frame<T>(
        &mut self,
        ledger: LedgerId,
        account: Account,
        operation: OperationKind,
        body: impl FnOnce(&mut Machine) -> Result<T, Error>,
    ) -> Result<T, Error> {
        self.ledger(ledger)?;
        self.gas.consume(self.config.reentry_gas_cost)?;
        let frame = self.stack.push(ledger, account, operation)?;
        if self.stack.is_reentry() {
            debug!(%ledger, %account, %operation, depth = frame.depth, "re-entered ledger");
        } else {
            debug!(%ledger, %account, %operation, depth = frame.depth, "entered ledger");
        }

        let checkpoint = self.storage.clone();
        let result = body(self);
        if let Err(err) = &result {
            warn!(%ledger, %operation, depth = frame.depth, %err, "frame reverted");
            self.storage = checkpoint;
        }
        self.stack.pop();
        result
    }

    // === Guard enforcement ===

    fn acquire(&mut self, ledger: LedgerId, operation: OperationKind) -> Result<(), Error> {
        let result = self.ledger_mut(ledger)?.lock_mut().acquire(ledger, operation);
        if result.is_err() {
            warn!(%ledger, %operation, depth = self.stack.depth(), "rejected re-entrant call");
        }
        result
    }

    fn release(&mut self, ledger: LedgerId) -> Result<(), Error> {
        self.ledger_mut(ledger)?.lock_mut().release();
        Ok(())
    }

    /// Commit the effect computed at check time (`from` ends at `remaining`) and
    /// move `amount` to `to`, in the order the ledger's policy dictates.
    #[allow(clippy::too_many_arguments)]
    fn settle(
        &mut self,
        ledger: LedgerId,
        from: Account,
        to: Account,
        amount: Amount,
        remaining: Amount,
        operation: OperationKind,
        hook: &mut dyn PayoutNotifiable,
    ) -> Result<Settlement, Error> {
        let policy = self.ledger(ledger)?.policy();
        match mutation_order(policy) {
            MutationOrder::BeforePayout => {
                self.ledger_mut(ledger)?.set_balance(from, remaining);
                self.pay_out(ledger, to, amount, operation, hook)?;
                Ok(Settlement::Paid(amount))
            }
            MutationOrder::AfterPayout => {
                self.pay_out(ledger, to, amount, operation, hook)?;
                self.ledger_mut(ledger)?.set_balance(from, remaining);
                Ok(Settlement::Paid(amount))
            }
            MutationOrder::Deferred => {
                let state = self.ledger_mut(ledger)?;
                state.set_balance(from, remaining);
                state.park(to, amount);
                debug!(%ledger, %to, amount, "parked pending withdrawal");
                Ok(Settlement::Deferred(amount))
            }
        }
    }

    /// Move held funds into the recipient's wallet, then run its hook.
    fn pay_out(
        &mut self,
        ledger: LedgerId,
        recipient: Account,
        amount: Amount,
        operation: OperationKind,
        hook: &mut dyn PayoutNotifiable,
    ) -> Result<(), Error> {
        let state = self.ledger_mut(ledger)?;
        state.release_funds(amount)?;
        let stipend = state.policy().stipend();
        self.credit_wallet(recipient, amount);

        let payout = Payout {
            ledger,
            recipient,
            amount,
            operation,
            depth: self.stack.depth(),
        };
        debug!(%ledger, %recipient, amount, depth = payout.depth, "paying out");

        if let Some(stipend) = stipend {
            let meter = self.gas.enter(stipend);
            debug!(limit = meter.limit, "metered payout");
        }
        let result = hook.notify(self, &payout);
        if stipend.is_some() {
            self.gas.exit();
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::{NoopHook, RecordingHook, RejectingHook};

    const ALICE: Account = Account::new(1);
    const BOB: Account = Account::new(2);

    fn funded(policy: GuardPolicy) -> (Machine, LedgerId) {
        let mut machine = Machine::default();
        let bank = machine.create_ledger("bank", policy);
        machine.fund(ALICE, 10).unwrap();
        machine.fund(BOB, 10).unwrap();
        (machine, bank)
    }

    #[test]
    fn test_config_validate() {
        assert!(MachineConfig::default().validate().is_ok());
        let config = MachineConfig {
            max_call_depth: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err("max_call_depth must be > 0"));
        let config = MachineConfig {
            max_call_depth: MAX_CALL_DEPTH_LIMIT + 1,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err("max_call_depth must be <= 256"));
        let config = MachineConfig {
            max_call_depth: MAX_CALL_DEPTH_LIMIT,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(Machine::new(config).config().max_call_depth, MAX_CALL_DEPTH_LIMIT);
    }

    #[test]
    fn test_unknown_ledger() {
        let mut machine = Machine::default();
        let missing = LedgerId::new(4);
        assert_eq!(machine.balance(missing), Err(Error::UnknownLedger(missing)));
        assert_eq!(
            machine.withdraw(missing, ALICE, &mut NoopHook),
            Err(Error::UnknownLedger(missing))
        );
    }

    #[test]
    fn test_fund_and_send() {
        let (mut machine, _) = funded(GuardPolicy::None);
        machine.send(ALICE, BOB, 4).unwrap();
        assert_eq!(machine.wallet(ALICE), 6);
        assert_eq!(machine.wallet(BOB), 14);

        let err = machine.send(ALICE, BOB, 7).unwrap_err();
        assert_eq!(
            err,
            Error::InsufficientFunds {
                account: ALICE,
                requested: 7,
                available: 6,
            }
        );
        assert_eq!(machine.send(ALICE, Account::ZERO, 1), Err(Error::InvalidRecipient));
        assert_eq!(machine.fund(ALICE, 0), Err(Error::InvalidAmount));
        assert_eq!(machine.total_supply(), 20);
        assert_eq!(machine.circulating_supply(), 20);
    }

    #[test]
    fn test_transact_rolls_back_everything() {
        let (mut machine, bank) = funded(GuardPolicy::None);
        let err = machine
            .transact(|machine| {
                machine.deposit(bank, ALICE, 5)?;
                machine.send(BOB, ALICE, 3)?;
                machine.withdraw(bank, BOB, &mut NoopHook)
            })
            .unwrap_err();
        assert!(matches!(err, Error::InsufficientBalance { .. }));
        assert_eq!(machine.balance(bank).unwrap(), 0);
        assert_eq!(machine.wallet(ALICE), 10);
        assert_eq!(machine.wallet(BOB), 10);
    }

    #[test]
    fn test_failed_hook_rolls_back_payout() {
        let (mut machine, bank) = funded(GuardPolicy::Mutex);
        machine.deposit(bank, ALICE, 5).unwrap();

        let mut hook = RejectingHook(Error::Unauthorized { caller: ALICE });
        let err = machine.withdraw(bank, ALICE, &mut hook).unwrap_err();
        assert_eq!(err, Error::Unauthorized { caller: ALICE });

        // Balance, held funds, wallet and guard flag are exactly as before.
        assert_eq!(machine.user_balance(bank, ALICE).unwrap(), 5);
        assert_eq!(machine.balance(bank).unwrap(), 5);
        assert_eq!(machine.wallet(ALICE), 5);
        assert!(!machine.ledger(bank).unwrap().is_locked());
        assert_eq!(machine.depth(), 0);

        // The ledger remains usable.
        assert_eq!(
            machine.withdraw(bank, ALICE, &mut NoopHook),
            Ok(Settlement::Paid(5))
        );
    }

    #[test]
    fn test_hook_sees_funds_and_depth() {
        let (mut machine, bank) = funded(GuardPolicy::None);
        machine.deposit(bank, ALICE, 5).unwrap();

        let mut seen = None;
        let mut hook = |machine: &mut Machine, payout: &Payout| -> Result<(), Error> {
            seen = Some((machine.wallet(payout.recipient), machine.depth(), payout.depth));
            Ok(())
        };
        machine.withdraw(bank, ALICE, &mut hook).unwrap();
        assert_eq!(seen, Some((10, 1, 1)));

        let mut recorder = RecordingHook::default();
        machine.deposit(bank, BOB, 3).unwrap();
        machine.withdraw(bank, BOB, &mut recorder).unwrap();
        assert_eq!(recorder.total(), 3);
        assert_eq!(recorder.received[0].operation, OperationKind::Withdraw);
    }

    struct Deepen {
        bank: LedgerId,
        outcome: Option<Result<Settlement, Error>>,
    }

    impl PayoutNotifiable for Deepen {
        fn notify(&mut self, machine: &mut Machine, _: &Payout) -> Result<(), Error> {
            if self.outcome.is_none() {
                let bank = self.bank;
                let outcome = machine.withdraw(bank, ALICE, self);
                self.outcome.get_or_insert(outcome);
            }
            Ok(())
        }
    }

    #[test]
    fn test_call_depth_ceiling() {
        let mut machine = Machine::new(MachineConfig {
            max_call_depth: 3,
            ..Default::default()
        });
        let bank = machine.create_ledger("bank", GuardPolicy::None);
        machine.fund(ALICE, 1).unwrap();
        machine.fund(BOB, 9).unwrap();
        machine.deposit(bank, ALICE, 1).unwrap();
        machine.deposit(bank, BOB, 9).unwrap();

        let mut hook = Deepen {
            bank,
            outcome: None,
        };
        machine.withdraw(bank, ALICE, &mut hook).unwrap();

        assert_eq!(hook.outcome, Some(Err(Error::CallDepthExceeded { max: 3 })));
        assert_eq!(machine.call_stack().peak(), 3);
        assert_eq!(machine.depth(), 0);
        assert_eq!(machine.wallet(ALICE), 3);
    }
}

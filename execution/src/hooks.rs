//! Payout hooks.
//!
//! A hook is the recipient's code: the machine invokes it synchronously, after
//! the funds have reached the recipient's wallet, and it may call back into any
//! ledger operation through the `&mut Machine` it receives.

use crate::Machine;
use reentrancy_types::{Account, Amount, Error, LedgerId, OperationKind};

/// A single payout delivered to a hook.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Payout {
    pub ledger: LedgerId,
    pub recipient: Account,
    pub amount: Amount,
    /// Operation that paid out.
    pub operation: OperationKind,
    /// Call-stack depth at the payout site.
    pub depth: usize,
}

/// Capability the machine calls into on every payout.
///
/// Returning an error fails the paying frame, which is then rolled back.
pub trait PayoutNotifiable {
    fn notify(&mut self, machine: &mut Machine, payout: &Payout) -> Result<(), Error>;
}

impl<F> PayoutNotifiable for F
where
    F: FnMut(&mut Machine, &Payout) -> Result<(), Error>,
{
    fn notify(&mut self, machine: &mut Machine, payout: &Payout) -> Result<(), Error> {
        self(machine, payout)
    }
}

/// A plain account: accepts every payout and does nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopHook;

impl PayoutNotifiable for NoopHook {
    fn notify(&mut self, _: &mut Machine, _: &Payout) -> Result<(), Error> {
        Ok(())
    }
}

/// Refuses every payout with the configured error.
#[derive(Clone, Debug)]
pub struct RejectingHook(pub Error);

impl PayoutNotifiable for RejectingHook {
    fn notify(&mut self, _: &mut Machine, _: &Payout) -> Result<(), Error> {
        Err(self.0.clone())
    }
}

/// Accepts every payout and remembers it.
#[derive(Clone, Debug, Default)]
pub struct RecordingHook {
    pub received: Vec<Payout>,
}

impl RecordingHook {
    pub fn total(&self) -> Amount {
        self.received.iter().map(|p| p.amount).sum()
    }
}

impl PayoutNotifiable for RecordingHook {
    fn notify(&mut self, _: &mut Machine, payout: &Payout) -> Result<(), Error> {
        self.received.push(*payout);
        Ok(())
    }
}

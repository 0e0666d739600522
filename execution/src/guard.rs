//! Guard policy enforcement.
//!
//! Every policy answers the same three questions for a ledger operation:
//! 1. **Pre-check**: may the operation start? ([`Lock::acquire`])
//! 2. **Mutation ordering**: when is the balance write committed relative to
//!    the payout hook? ([`mutation_order`])
//! 3. **Post-release**: what must be undone when the operation returns?
//!    ([`Lock::release`])
//!
//! `ReentrancyGuard` and `Mutex` implement the same contract with independent
//! state (a status word versus a boolean) so that each can be verified on its own.

use reentrancy_types::{Error, GuardPolicy, LedgerId, OperationKind};

/// When a ledger commits the balance effect of an operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MutationOrder {
    /// Commit, then call the payout hook (checks-effects-interactions).
    BeforePayout,
    /// Call the payout hook, then commit the effect computed at check time.
    AfterPayout,
    /// Commit into the pending-withdrawal queue; no hook is called.
    Deferred,
}

/// Mutation ordering for a policy.
pub fn mutation_order(policy: GuardPolicy) -> MutationOrder {
    match policy {
        GuardPolicy::ChecksEffectsInteractions => MutationOrder::BeforePayout,
        GuardPolicy::PullPayment => MutationOrder::Deferred,
        GuardPolicy::None
        | GuardPolicy::ReentrancyGuard
        | GuardPolicy::Mutex
        | GuardPolicy::GasLimited { .. } => MutationOrder::AfterPayout,
    }
}

/// Status word used by [`GuardPolicy::ReentrancyGuard`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuardStatus {
    NotEntered,
    Entered,
}

/// Per-ledger reentrancy flag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lock {
    /// Policies that never reject a nested call.
    Open,
    Status(GuardStatus),
    Mutex { locked: bool },
}

impl Lock {
    pub fn for_policy(policy: GuardPolicy) -> Self {
        match policy {
            GuardPolicy::ReentrancyGuard => Lock::Status(GuardStatus::NotEntered),
            GuardPolicy::Mutex => Lock::Mutex { locked: false },
            _ => Lock::Open,
        }
    }

    /// Take the flag for `operation`, rejecting the call if it is already held.
    pub fn acquire(&mut self, ledger: LedgerId, operation: OperationKind) -> Result<(), Error> {
        match self {
            Lock::Open => Ok(()),
            Lock::Status(status) => {
                if *status == GuardStatus::Entered {
                    return Err(Error::ReentrantCallRejected { ledger, operation });
                }
                *status = GuardStatus::Entered;
                Ok(())
            }
            Lock::Mutex { locked } => {
                if *locked {
                    return Err(Error::ReentrantCallRejected { ledger, operation });
                }
                *locked = true;
                Ok(())
            }
        }
    }

    pub fn release(&mut self) {
        match self {
            Lock::Open => {}
            Lock::Status(status) => *status = GuardStatus::NotEntered,
            Lock::Mutex { locked } => *locked = false,
        }
    }

    /// The `reentrancyFlag` of the ledger.
    pub fn is_held(&self) -> bool {
        matches!(
            self,
            Lock::Status(GuardStatus::Entered) | Lock::Mutex { locked: true }
        )
    }
}

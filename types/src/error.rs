use crate::{Account, Amount, LedgerId, OperationKind};
use thiserror::Error as ThisError;

/// Failures surfaced by ledger operations and attackers.
///
/// Every variant is a violated precondition, never a transient fault: nothing
/// here is worth retrying without changing the inputs.
#[derive(Clone, Debug, ThisError, PartialEq, Eq)]
pub enum Error {
    #[error("insufficient balance for {account} on {ledger} (available={available})")]
    InsufficientBalance {
        ledger: LedgerId,
        account: Account,
        available: Amount,
    },
    #[error("amount must be greater than zero")]
    InvalidAmount,
    #[error("invalid recipient")]
    InvalidRecipient,
    #[error("reentrant {operation} rejected on {ledger}")]
    ReentrantCallRejected {
        ledger: LedgerId,
        operation: OperationKind,
    },
    #[error("attack already in progress")]
    AttackInProgress,
    #[error("insufficient deposit (required={required}, provided={provided})")]
    InsufficientDeposit { required: Amount, provided: Amount },
    #[error("{caller} is not authorized")]
    Unauthorized { caller: Account },
    #[error("insufficient wallet funds for {account} (requested={requested}, available={available})")]
    InsufficientFunds {
        account: Account,
        requested: Amount,
        available: Amount,
    },
    #[error("{ledger} cannot pay {requested} (held={held})")]
    InsufficientLiquidity {
        ledger: LedgerId,
        requested: Amount,
        held: Amount,
    },
    #[error("out of gas (required={required}, remaining={remaining})")]
    OutOfGas { required: u64, remaining: u64 },
    #[error("call depth exceeded (max={max})")]
    CallDepthExceeded { max: usize },
    #[error("unknown ledger {0}")]
    UnknownLedger(LedgerId),
    #[error("{operation} is not supported on {ledger}")]
    UnsupportedOperation {
        ledger: LedgerId,
        operation: OperationKind,
    },
}

impl Error {
    /// Whether this failure came from a guard refusing a nested call.
    pub fn is_reentry_rejection(&self) -> bool {
        matches!(self, Error::ReentrantCallRejected { .. })
    }
}

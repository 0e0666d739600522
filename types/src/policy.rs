//! Guard policy catalog and the operations it governs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Gas forwarded to a payout hook under [`GuardPolicy::GasLimited`] unless configured otherwise.
pub const DEFAULT_GAS_STIPEND: u64 = 2_300;

/// Strategy a ledger uses to order its balance mutation relative to the
/// external payout, or to reject nested calls outright.
///
/// Selected once at ledger construction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GuardPolicy {
    /// Unguarded baseline: payout first, bookkeeping afterwards.
    #[default]
    None,
    /// Status-word guard held for the whole operation.
    ReentrancyGuard,
    /// Boolean lock held for the whole operation.
    Mutex,
    /// Checks-effects-interactions: commit the balance before paying out.
    #[serde(alias = "cei")]
    ChecksEffectsInteractions,
    /// Funds are parked as a pending withdrawal and released by a separate call.
    PullPayment,
    /// Payout hook runs under a capped gas budget. Not a complete defense.
    GasLimited { stipend: u64 },
}

impl GuardPolicy {
    /// Every policy, with `GasLimited` using the given stipend.
    pub fn catalog(stipend: u64) -> [GuardPolicy; 6] {
        [
            GuardPolicy::None,
            GuardPolicy::ReentrancyGuard,
            GuardPolicy::Mutex,
            GuardPolicy::ChecksEffectsInteractions,
            GuardPolicy::PullPayment,
            GuardPolicy::GasLimited { stipend },
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            GuardPolicy::None => "None",
            GuardPolicy::ReentrancyGuard => "ReentrancyGuard",
            GuardPolicy::Mutex => "Mutex",
            GuardPolicy::ChecksEffectsInteractions => "CEI",
            GuardPolicy::PullPayment => "PullPayment",
            GuardPolicy::GasLimited { .. } => "GasLimited",
        }
    }

    /// Whether the policy fully closes the reentrancy gap.
    ///
    /// `GasLimited` only narrows it, so the `heldFunds == sum(balances)`
    /// invariant is guaranteed for these four policies alone.
    pub fn is_complete_defense(&self) -> bool {
        matches!(
            self,
            GuardPolicy::ReentrancyGuard
                | GuardPolicy::Mutex
                | GuardPolicy::ChecksEffectsInteractions
                | GuardPolicy::PullPayment
        )
    }

    /// Whether the policy holds a lock flag for the duration of an operation.
    pub fn holds_lock(&self) -> bool {
        matches!(self, GuardPolicy::ReentrancyGuard | GuardPolicy::Mutex)
    }

    pub fn is_pull_payment(&self) -> bool {
        matches!(self, GuardPolicy::PullPayment)
    }

    /// Gas stipend forwarded to payout hooks, if the policy meters them.
    pub fn stipend(&self) -> Option<u64> {
        match self {
            GuardPolicy::GasLimited { stipend } => Some(*stipend),
            _ => None,
        }
    }
}

impl fmt::Display for GuardPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GuardPolicy::GasLimited { stipend } => write!(f, "GasLimited({stipend})"),
            other => f.write_str(other.name()),
        }
    }
}

/// Ledger entry points recorded on the call stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Deposit,
    Withdraw,
    Transfer,
    InitiateWithdrawal,
    CompleteWithdrawal,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Deposit => "deposit",
            OperationKind::Withdraw => "withdraw",
            OperationKind::Transfer => "transfer",
            OperationKind::InitiateWithdrawal => "initiateWithdrawal",
            OperationKind::CompleteWithdrawal => "completeWithdrawal",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

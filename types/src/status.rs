use crate::Amount;
use serde::{Deserialize, Serialize};

/// Target name reported once an attack has finished.
pub const DONE_TARGET_NAME: &str = "Done";

/// Lifecycle of an attacker: `Idle -> Attacking -> Done`.
///
/// `Done` is re-armable: a fresh `attack` resets the attacker to `Attacking`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    Attacking,
    Done,
}

/// Read-only snapshot of a cross-ledger attack.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttackStatus {
    pub in_progress: bool,
    pub steps: u64,
    pub next_target_name: String,
    pub vault_a_balance: Amount,
    pub vault_b_balance: Amount,
}

//! Common types used throughout the reentrancy simulation engine.
//!
//! This crate holds the shared vocabulary only: identifiers, the guard policy
//! catalog, attacker phases and status snapshots, and the error taxonomy. The
//! engine that gives these types their behavior lives in `reentrancy-execution`.

pub mod account;
pub mod error;
pub mod policy;
pub mod status;

pub use account::{Account, Amount, LedgerId};
pub use error::Error;
pub use policy::{GuardPolicy, OperationKind, DEFAULT_GAS_STIPEND};
pub use status::{AttackStatus, Phase, DONE_TARGET_NAME};

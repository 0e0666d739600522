//! Reentrancy simulation engine.
//!
//! A [`Machine`] owns a set of custodial [`Ledger`]s and the native wallets of
//! every account. Withdrawals and transfers pay out through a
//! [`PayoutNotifiable`] hook that may synchronously call back into any ledger
//! before the paying call has committed its bookkeeping. Each ledger is built
//! with a [`GuardPolicy`](reentrancy_types::GuardPolicy) that decides whether
//! that nested call can observe (and re-spend) a stale balance.
//!
//! ## Execution model
//! - Single-threaded and synchronous: suspension happens only at the payout hook.
//! - Every ledger operation is a frame. A failed frame leaves storage exactly
//!   as it found it, guard flags included.
//! - Recursion is bounded by the call-depth ceiling, the attacker's step
//!   budget, and (for gas-limited ledgers) the payout stipend.
//!
//! ## Example
//! ```rust
//! use reentrancy_execution::{Attacker, AttackerConfig, Machine, Strategy};
//! use reentrancy_types::{Account, GuardPolicy};
//!
//! let mut machine = Machine::default();
//! let bank = machine.create_ledger("bank", GuardPolicy::None);
//! let (user, owner, contract) = (Account::new(1), Account::new(2), Account::new(3));
//! machine.fund(user, 10).unwrap();
//! machine.deposit(bank, user, 10).unwrap();
//! machine.fund(owner, 1).unwrap();
//!
//! let config = AttackerConfig::default();
//! let mut attacker = Attacker::new(owner, contract, bank, Strategy::WithdrawOnly, config);
//! attacker.attack(&mut machine, owner, 1).unwrap();
//! assert_eq!(machine.balance(bank).unwrap(), 0);
//! assert_eq!(attacker.balance(&machine), 11);
//! ```

pub mod attacker;
pub mod call_stack;
pub mod gas;
pub mod guard;
pub mod hooks;
pub mod ledger;
mod machine;

pub use attacker::{Attacker, AttackerConfig, CrossLedgerAttacker, Strategy};
pub use call_stack::{CallStack, Frame};
pub use hooks::{NoopHook, Payout, PayoutNotifiable, RecordingHook, RejectingHook};
pub use ledger::Ledger;
pub use machine::{Machine, MachineConfig, Settlement};

#[cfg(any(test, feature = "mocks"))]
pub mod mocks;

mod cross_function_tests;

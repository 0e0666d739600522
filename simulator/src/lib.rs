//! Harness around the reentrancy engine: configuration, named scenarios, and a
//! seeded randomized invariant checker.

pub mod config;
pub mod fuzz;
pub mod scenarios;

pub use config::SimulatorConfig;
pub use fuzz::FuzzReport;
pub use scenarios::{AttackReport, CrossLedgerReport, Outcome, Report, Scenario};

//! Named attack scenarios and their reports.

use crate::config::SimulatorConfig;
use clap::ValueEnum;
use reentrancy_execution::mocks::{
    create_attacker, create_cross_ledger_attacker, create_victim_bank, create_victim_vaults,
    ATTACKER_OWNER,
};
use reentrancy_execution::Strategy;
use reentrancy_types::{Amount, AttackStatus, Error, GuardPolicy};
use serde::Serialize;
use tracing::info;

/// Deposit the single-ledger attacker stakes.
pub const ATTACK_DEPOSIT: Amount = 1;

/// Deposit the cross-ledger attacker splits across both vaults.
pub const CROSS_LEDGER_DEPOSIT: Amount = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Scenario {
    /// Withdraw-only attack on an unguarded ledger.
    Single,
    /// Alternating withdraw/transfer attack on an unguarded ledger.
    CrossFunction,
    /// Ping-pong attack across two unguarded vaults.
    CrossLedger,
    /// Withdraw-only attack on a pull-payment ledger.
    PullPayment,
    /// Withdraw-only attack on a gas-limited ledger.
    GasLimited,
}

/// How much of the victims' funds survived an attack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    Protected,
    Partial,
    Drained,
}

impl Outcome {
    pub fn classify(before: Amount, after: Amount) -> Self {
        if after >= before {
            Outcome::Protected
        } else if after == 0 {
            Outcome::Drained
        } else {
            Outcome::Partial
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttackReport {
    pub policy: GuardPolicy,
    pub strategy: &'static str,
    pub ledger_balance_before: Amount,
    pub ledger_balance_after: Amount,
    pub attacker_balance: Amount,
    pub stolen: Amount,
    pub steps: u64,
    pub max_depth: usize,
    pub conserved: bool,
    pub outcome: Outcome,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossLedgerReport {
    pub policies: [GuardPolicy; 2],
    pub status: AttackStatus,
    pub attacker_balance: Amount,
    pub stolen: Amount,
    pub outcome: Outcome,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Report {
    Attack(AttackReport),
    CrossLedger(CrossLedgerReport),
    Comparison(Vec<AttackReport>),
}

fn strategy_name(strategy: Strategy) -> &'static str {
    match strategy {
        Strategy::WithdrawOnly => "withdraw",
        Strategy::CrossFunction => "cross-function",
    }
}

/// Attack a two-user bank guarded by `policy`.
pub fn run_single(
    config: &SimulatorConfig,
    policy: GuardPolicy,
    strategy: Strategy,
) -> Result<AttackReport, Error> {
    let (mut machine, bank) = create_victim_bank(config.machine_config(), policy)?;
    let before = machine.balance(bank)?;

    let mut attacker = create_attacker(bank, strategy, config.attacker_config());
    attacker.attack(&mut machine, ATTACKER_OWNER, ATTACK_DEPOSIT)?;

    let after = machine.balance(bank)?;
    let attacker_balance = attacker.balance(&machine);
    let report = AttackReport {
        policy,
        strategy: strategy_name(strategy),
        ledger_balance_before: before,
        ledger_balance_after: after,
        attacker_balance,
        stolen: attacker_balance.saturating_sub(ATTACK_DEPOSIT),
        steps: attacker.steps(),
        max_depth: machine.call_stack().peak(),
        conserved: machine.ledger(bank)?.is_conserved(),
        outcome: Outcome::classify(before, after),
    };
    info!(
        %policy,
        steps = report.steps,
        stolen = report.stolen,
        outcome = ?report.outcome,
        "attack scenario"
    );
    Ok(report)
}

/// Ping-pong between two vaults guarded by `policies`.
pub fn run_cross_ledger(
    config: &SimulatorConfig,
    policies: [GuardPolicy; 2],
) -> Result<CrossLedgerReport, Error> {
    let (mut machine, vaults) = create_victim_vaults(config.machine_config(), policies)?;
    let before = machine.balance(vaults[0])? + machine.balance(vaults[1])?;

    let mut attacker = create_cross_ledger_attacker(vaults, config.attacker_config());
    attacker.attack(&mut machine, ATTACKER_OWNER, CROSS_LEDGER_DEPOSIT)?;

    let status = attacker.get_attack_status(&machine)?;
    let after = status.vault_a_balance + status.vault_b_balance;
    let attacker_balance = attacker.balance(&machine);
    info!(steps = status.steps, attacker_balance, "cross-ledger scenario");
    Ok(CrossLedgerReport {
        policies,
        status,
        attacker_balance,
        stolen: attacker_balance.saturating_sub(CROSS_LEDGER_DEPOSIT),
        outcome: Outcome::classify(before, after),
    })
}

/// Every policy against the same withdraw-only attack.
pub fn compare(config: &SimulatorConfig) -> Result<Vec<AttackReport>, Error> {
    GuardPolicy::catalog(config.gas_stipend)
        .into_iter()
        .map(|policy| run_single(config, policy, Strategy::WithdrawOnly))
        .collect()
}

pub fn run(scenario: Scenario, config: &SimulatorConfig) -> Result<Report, Error> {
    let report = match scenario {
        Scenario::Single => Report::Attack(run_single(
            config,
            GuardPolicy::None,
            Strategy::WithdrawOnly,
        )?),
        Scenario::CrossFunction => Report::Attack(run_single(
            config,
            GuardPolicy::None,
            Strategy::CrossFunction,
        )?),
        Scenario::CrossLedger => {
            Report::CrossLedger(run_cross_ledger(config, [GuardPolicy::None; 2])?)
        }
        Scenario::PullPayment => Report::Attack(run_single(
            config,
            GuardPolicy::PullPayment,
            Strategy::WithdrawOnly,
        )?),
        Scenario::GasLimited => Report::Attack(run_single(
            config,
            GuardPolicy::GasLimited {
                stipend: config.gas_stipend,
            },
            Strategy::WithdrawOnly,
        )?),
    };
    Ok(report)
}

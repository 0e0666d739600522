//! Seeded randomized workload checker.
//!
//! Drives every guard policy through the same random sequence of deposits,
//! withdrawals, transfers, pull-payment steps, and attacks, and checks the
//! conservation properties after every step. The first violation is returned
//! as an error naming the policy, step, and operation.

use crate::config::SimulatorConfig;
use anyhow::{bail, Context, Result};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use reentrancy_execution::mocks::{create_attacker, ATTACKER_OWNER};
use reentrancy_execution::{Machine, NoopHook, Payout, Strategy};
use reentrancy_types::{Account, Amount, Error, GuardPolicy, LedgerId};
use serde::Serialize;
use tracing::{debug, info};

const USERS: [Account; 4] = [
    Account::new(0x21),
    Account::new(0x22),
    Account::new(0x23),
    Account::new(0x24),
];
const STARTING_FUNDS: Amount = 10_000;

#[derive(Clone, Copy, Debug)]
enum Op {
    Deposit { user: usize, amount: Amount },
    Withdraw { user: usize },
    Transfer { from: usize, to: usize, amount: Amount },
    Initiate { user: usize },
    Complete { user: usize },
    NestedWithdraw { user: usize },
    Attack { deposit: Amount, cross_function: bool },
}

impl Op {
    fn random(rng: &mut impl Rng) -> Self {
        let user = rng.gen_range(0..USERS.len());
        match rng.gen_range(0..10) {
            0..=2 => Op::Deposit {
                user,
                amount: rng.gen_range(1..100),
            },
            3 => Op::Withdraw { user },
            4 | 5 => Op::Transfer {
                from: user,
                to: rng.gen_range(0..USERS.len()),
                amount: rng.gen_range(1..60),
            },
            6 => Op::Initiate { user },
            7 => Op::Complete { user },
            8 => Op::NestedWithdraw { user },
            _ => Op::Attack {
                deposit: rng.gen_range(1..5),
                cross_function: rng.gen_bool(0.5),
            },
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyStats {
    pub policy: String,
    pub succeeded: u64,
    pub failed: u64,
    pub final_held_funds: Amount,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FuzzReport {
    pub seed: u64,
    pub iterations: u64,
    pub policies: Vec<PolicyStats>,
}

fn nested_hook(machine: &mut Machine, payout: &Payout) -> Result<(), Error> {
    let failures = [
        machine
            .withdraw(payout.ledger, payout.recipient, &mut NoopHook)
            .err(),
        machine
            .transfer(payout.ledger, payout.recipient, USERS[0], 1, &mut NoopHook)
            .err(),
    ];
    for err in failures.iter().flatten() {
        debug!(%err, "nested call failed");
    }
    Ok(())
}

fn apply(
    machine: &mut Machine,
    bank: LedgerId,
    config: &SimulatorConfig,
    op: Op,
) -> Result<(), Error> {
    match op {
        Op::Deposit { user, amount } => machine.deposit(bank, USERS[user], amount),
        Op::Withdraw { user } => machine
            .withdraw(bank, USERS[user], &mut NoopHook)
            .map(|_| ()),
        Op::Transfer { from, to, amount } => machine
            .transfer(bank, USERS[from], USERS[to], amount, &mut NoopHook)
            .map(|_| ()),
        Op::Initiate { user } => machine.initiate_withdrawal(bank, USERS[user]).map(|_| ()),
        Op::Complete { user } => machine
            .complete_withdrawal(bank, USERS[user], &mut NoopHook)
            .map(|_| ()),
        Op::NestedWithdraw { user } => machine
            .withdraw(bank, USERS[user], &mut nested_hook)
            .map(|_| ()),
        Op::Attack {
            deposit,
            cross_function,
        } => {
            let strategy = if cross_function {
                Strategy::CrossFunction
            } else {
                Strategy::WithdrawOnly
            };
            let mut attacker = create_attacker(bank, strategy, config.attacker_config());
            attacker
                .attack(machine, ATTACKER_OWNER, deposit)
                .map(|_| ())
        }
    }
}

fn check(machine: &Machine, bank: LedgerId, policy: GuardPolicy) -> Result<()> {
    if machine.circulating_supply() != machine.total_supply() {
        bail!(
            "supply not conserved (circulating={}, minted={})",
            machine.circulating_supply(),
            machine.total_supply()
        );
    }
    if machine.depth() != 0 {
        bail!("call stack not idle (depth={})", machine.depth());
    }
    let ledger = machine.ledger(bank)?;
    if ledger.is_locked() {
        bail!("guard flag still held");
    }
    if policy.is_complete_defense() && !ledger.is_conserved() {
        bail!(
            "ledger not conserved (held={}, balances={}, pending={})",
            ledger.held_funds(),
            ledger.total_balances(),
            ledger.total_pending()
        );
    }
    Ok(())
}

fn run_policy(
    config: &SimulatorConfig,
    policy: GuardPolicy,
    seed: u64,
    iterations: u64,
) -> Result<PolicyStats> {
    // Same seed for every policy, so each one faces the same workload.
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    let mut machine = Machine::new(config.machine_config());
    let bank = machine.create_ledger("bank", policy);
    for user in USERS {
        machine.fund(user, STARTING_FUNDS)?;
    }
    machine.fund(ATTACKER_OWNER, STARTING_FUNDS)?;

    let mut stats = PolicyStats {
        policy: policy.to_string(),
        ..Default::default()
    };
    for step in 0..iterations {
        let op = Op::random(&mut rng);
        match apply(&mut machine, bank, config, op) {
            Ok(()) => stats.succeeded += 1,
            Err(err) => {
                stats.failed += 1;
                debug!(%policy, step, %err, "operation failed");
            }
        }
        check(&machine, bank, policy)
            .with_context(|| format!("{policy} violated an invariant at step {step} ({op:?})"))?;
    }
    stats.final_held_funds = machine.balance(bank)?;
    Ok(stats)
}

/// Run `iterations` random operations against every policy.
pub fn run(config: &SimulatorConfig, seed: u64, iterations: u64) -> Result<FuzzReport> {
    let mut policies = Vec::new();
    for policy in GuardPolicy::catalog(config.gas_stipend) {
        let stats = run_policy(config, policy, seed, iterations)?;
        info!(
            %policy,
            succeeded = stats.succeeded,
            failed = stats.failed,
            "policy checked"
        );
        policies.push(stats);
    }
    Ok(FuzzReport {
        seed,
        iterations,
        policies,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fuzz_finds_no_violation() {
        let report = run(&SimulatorConfig::default(), 7, 500).unwrap();
        assert_eq!(report.policies.len(), 6);
        for stats in &report.policies {
            assert_eq!(stats.succeeded + stats.failed, 500);
        }
    }

    #[test]
    fn test_fuzz_is_deterministic() {
        let config = SimulatorConfig::default();
        assert_eq!(run(&config, 11, 200).unwrap(), run(&config, 11, 200).unwrap());
    }

    #[test]
    fn test_report_json() {
        let report = run(&SimulatorConfig::default(), 3, 50).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["seed"], 3);
        assert_eq!(json["policies"][0]["policy"], "None");
        assert_eq!(json["policies"][5]["policy"], "GasLimited(2300)");
        assert!(json["policies"][1]["finalHeldFunds"].is_u64());
    }
}

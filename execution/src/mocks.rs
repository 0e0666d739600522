//! Scenario builders shared by tests and the simulator.

use crate::{Attacker, AttackerConfig, CrossLedgerAttacker, Machine, MachineConfig, Strategy};
use reentrancy_types::{Account, Amount, Error, GuardPolicy, LedgerId};

pub const USER1: Account = Account::new(0x11);
pub const USER2: Account = Account::new(0x12);
pub const ATTACKER_OWNER: Account = Account::new(0xa0);
pub const ATTACKER_CONTRACT: Account = Account::new(0xac);

/// Each legitimate user's stake in a victim ledger.
pub const VICTIM_DEPOSIT: Amount = 5;

/// Native funds the attacker owner starts with.
pub const ATTACKER_FUNDS: Amount = 10;

/// Create a ledger and have every `(account, amount)` fund a wallet and deposit it.
pub fn create_funded_ledger(
    machine: &mut Machine,
    name: &str,
    policy: GuardPolicy,
    deposits: &[(Account, Amount)],
) -> Result<LedgerId, Error> {
    let ledger = machine.create_ledger(name, policy);
    for (account, amount) in deposits {
        machine.fund(*account, *amount)?;
        machine.deposit(ledger, *account, *amount)?;
    }
    Ok(ledger)
}

/// A machine with one ledger holding two users' deposits, plus a funded attacker owner.
pub fn create_victim_bank(
    config: MachineConfig,
    policy: GuardPolicy,
) -> Result<(Machine, LedgerId), Error> {
    let mut machine = Machine::new(config);
    let bank = create_funded_ledger(
        &mut machine,
        "bank",
        policy,
        &[(USER1, VICTIM_DEPOSIT), (USER2, VICTIM_DEPOSIT)],
    )?;
    machine.fund(ATTACKER_OWNER, ATTACKER_FUNDS)?;
    Ok((machine, bank))
}

/// Two ledgers each holding `2 * VICTIM_DEPOSIT`, plus a funded attacker owner.
pub fn create_victim_vaults(
    config: MachineConfig,
    policies: [GuardPolicy; 2],
) -> Result<(Machine, [LedgerId; 2]), Error> {
    let mut machine = Machine::new(config);
    let deposits = [(USER1, VICTIM_DEPOSIT), (USER2, VICTIM_DEPOSIT)];
    let a = create_funded_ledger(&mut machine, "VaultA", policies[0], &deposits)?;
    let b = create_funded_ledger(&mut machine, "VaultB", policies[1], &deposits)?;
    machine.fund(ATTACKER_OWNER, ATTACKER_FUNDS)?;
    Ok((machine, [a, b]))
}

pub fn create_attacker(target: LedgerId, strategy: Strategy, config: AttackerConfig) -> Attacker {
    Attacker::new(ATTACKER_OWNER, ATTACKER_CONTRACT, target, strategy, config)
}

pub fn create_cross_ledger_attacker(
    targets: [LedgerId; 2],
    config: AttackerConfig,
) -> CrossLedgerAttacker {
    CrossLedgerAttacker::new(ATTACKER_OWNER, ATTACKER_CONTRACT, targets, config)
}

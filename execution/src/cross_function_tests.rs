//! Cross-function reentrancy: `withdraw` and `transfer` share one balance record,
//! so a hook entered through either can re-spend the balance through the other.

#[cfg(test)]
mod tests {
    use crate::mocks::{
        create_attacker, create_victim_bank, ATTACKER_CONTRACT, ATTACKER_OWNER, USER1, USER2,
    };
    use crate::{
        AttackerConfig, Machine, MachineConfig, NoopHook, Payout, RecordingHook, Settlement,
        Strategy,
    };
    use reentrancy_types::{Account, Error, GuardPolicy, OperationKind};

    fn outcome(policy: GuardPolicy, strategy: Strategy) -> (u64, u64, u64) {
        let (mut machine, bank) = create_victim_bank(MachineConfig::default(), policy).unwrap();
        let mut attacker = create_attacker(bank, strategy, AttackerConfig::default());
        attacker.attack(&mut machine, ATTACKER_OWNER, 1).unwrap();
        (
            machine.balance(bank).unwrap(),
            attacker.balance(&machine),
            attacker.steps(),
        )
    }

    #[test]
    fn test_cross_function_attack_drains_unguarded_ledger() {
        assert_eq!(outcome(GuardPolicy::None, Strategy::CrossFunction), (0, 11, 10));
    }

    #[test]
    fn test_both_strategies_are_equivalent() {
        for policy in [
            GuardPolicy::None,
            GuardPolicy::ReentrancyGuard,
            GuardPolicy::Mutex,
            GuardPolicy::ChecksEffectsInteractions,
            GuardPolicy::PullPayment,
        ] {
            assert_eq!(
                outcome(policy, Strategy::WithdrawOnly),
                outcome(policy, Strategy::CrossFunction),
                "{policy}"
            );
        }
        assert_eq!(
            outcome(GuardPolicy::Mutex, Strategy::CrossFunction),
            (10, 1, 0)
        );
    }

    #[test]
    fn test_attack_aliases_select_strategy() {
        let (mut machine, bank) =
            create_victim_bank(MachineConfig::default(), GuardPolicy::None).unwrap();
        let mut attacker =
            create_attacker(bank, Strategy::WithdrawOnly, AttackerConfig::default());
        attacker
            .attack_with_cross_function(&mut machine, ATTACKER_OWNER, 1)
            .unwrap();
        assert_eq!(attacker.strategy(), Strategy::CrossFunction);
        assert_eq!(machine.balance(bank).unwrap(), 0);
    }

    #[test]
    fn test_direct_transfer_pays_recipient() {
        let (mut machine, bank) =
            create_victim_bank(MachineConfig::default(), GuardPolicy::None).unwrap();
        machine.deposit(bank, ATTACKER_OWNER, 2).unwrap();

        let mut recorder = RecordingHook::default();
        let settlement = machine
            .transfer(bank, ATTACKER_OWNER, ATTACKER_CONTRACT, 1, &mut recorder)
            .unwrap();

        assert_eq!(settlement, Settlement::Paid(1));
        assert_eq!(machine.user_balance(bank, ATTACKER_OWNER).unwrap(), 1);
        assert_eq!(machine.wallet(ATTACKER_CONTRACT), 1);
        assert_eq!(recorder.received[0].recipient, ATTACKER_CONTRACT);
        assert_eq!(recorder.received[0].operation, OperationKind::Transfer);
    }

    #[test]
    fn test_transfer_preconditions() {
        let (mut machine, bank) =
            create_victim_bank(MachineConfig::default(), GuardPolicy::None).unwrap();

        assert_eq!(
            machine.transfer(bank, USER1, Account::ZERO, 1, &mut NoopHook),
            Err(Error::InvalidRecipient)
        );
        assert_eq!(
            machine.transfer(bank, USER1, USER2, 0, &mut NoopHook),
            Err(Error::InvalidAmount)
        );
        assert_eq!(
            machine.transfer(bank, USER1, USER2, 6, &mut NoopHook),
            Err(Error::InsufficientBalance {
                ledger: bank,
                account: USER1,
                available: 5,
            })
        );
        assert_eq!(
            machine.withdraw(bank, ATTACKER_CONTRACT, &mut NoopHook),
            Err(Error::InsufficientBalance {
                ledger: bank,
                account: ATTACKER_CONTRACT,
                available: 0,
            })
        );
        assert_eq!(machine.balance(bank).unwrap(), 10);
    }

    #[test]
    fn test_guard_covers_both_entry_points() {
        for policy in [GuardPolicy::ReentrancyGuard, GuardPolicy::Mutex] {
            let (mut machine, bank) =
                create_victim_bank(MachineConfig::default(), policy).unwrap();

            let mut nested = None;
            let mut hook = |machine: &mut Machine, _: &Payout| -> Result<(), Error> {
                nested = Some(machine.transfer(bank, USER1, USER2, 1, &mut NoopHook));
                Ok(())
            };
            machine.withdraw(bank, USER1, &mut hook).unwrap();

            assert_eq!(
                nested,
                Some(Err(Error::ReentrantCallRejected {
                    ledger: bank,
                    operation: OperationKind::Transfer,
                })),
                "{policy}"
            );
            // The outer withdrawal completed for its own legitimate portion.
            assert_eq!(machine.user_balance(bank, USER1).unwrap(), 0);
            assert_eq!(machine.wallet(USER1), 5);
            assert!(machine.ledger(bank).unwrap().is_conserved());
        }
    }

    #[test]
    fn test_cei_nested_call_observes_debit() {
        let (mut machine, bank) =
            create_victim_bank(MachineConfig::default(), GuardPolicy::ChecksEffectsInteractions)
                .unwrap();

        let mut observed = None;
        let mut nested = None;
        let mut hook = |machine: &mut Machine, payout: &Payout| -> Result<(), Error> {
            observed = Some(machine.user_balance(payout.ledger, USER1)?);
            nested = Some(machine.withdraw(payout.ledger, USER1, &mut NoopHook));
            Ok(())
        };
        machine.withdraw(bank, USER1, &mut hook).unwrap();

        assert_eq!(observed, Some(0));
        assert_eq!(
            nested,
            Some(Err(Error::InsufficientBalance {
                ledger: bank,
                account: USER1,
                available: 0,
            }))
        );
        assert_eq!(machine.balance(bank).unwrap(), 5);
    }

    #[test]
    fn test_unguarded_nested_call_observes_stale_balance() {
        let (mut machine, bank) =
            create_victim_bank(MachineConfig::default(), GuardPolicy::None).unwrap();

        let mut observed = None;
        let mut hook = |machine: &mut Machine, payout: &Payout| -> Result<(), Error> {
            observed = Some(machine.user_balance(payout.ledger, USER1)?);
            Ok(())
        };
        machine.withdraw(bank, USER1, &mut hook).unwrap();

        assert_eq!(observed, Some(5));
        assert_eq!(machine.user_balance(bank, USER1).unwrap(), 0);
    }
}

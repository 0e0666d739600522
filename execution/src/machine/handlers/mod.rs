use super::*;

fn insufficient_balance(ledger: LedgerId, account: Account, available: Amount) -> Error {
    Error::InsufficientBalance {
        ledger,
        account,
        available,
    }
}

mod custody;
mod pull;
mod transfer;

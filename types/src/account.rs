use serde::{Deserialize, Serialize};
use std::fmt;

/// Smallest indivisible unit of value.
pub type Amount = u64;

/// Identifier of a balance holder (user, attacker contract, or owner).
///
/// The zero identifier is reserved and never a valid transfer recipient.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Account(u64);

impl Account {
    pub const ZERO: Account = Account(0);

    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn id(&self) -> u64 {
        self.0
    }

    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl From<u64> for Account {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:04x}", self.0)
    }
}

/// Index of a ledger within a machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LedgerId(u32);

impl LedgerId {
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for LedgerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ledger#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_account_is_reserved() {
        assert!(Account::ZERO.is_zero());
        assert!(!Account::new(7).is_zero());
        assert_eq!(Account::default(), Account::ZERO);
    }

    #[test]
    fn test_display() {
        assert_eq!(Account::new(0xbeef).to_string(), "0xbeef");
        assert_eq!(Account::new(1).to_string(), "0x0001");
        assert_eq!(LedgerId::new(3).to_string(), "ledger#3");
    }

    #[test]
    fn test_serde_is_transparent() {
        let json = serde_json::to_string(&Account::new(42)).unwrap();
        assert_eq!(json, "42");
        let ledger: LedgerId = serde_json::from_str("2").unwrap();
        assert_eq!(ledger.index(), 2);
    }
}

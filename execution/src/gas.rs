//! Gas meters for payout hooks running under [`GuardPolicy::GasLimited`].
//!
//! Meters nest: a hook that re-enters a gas-limited ledger runs its own payout
//! under a child meter whose limit never exceeds what the parent has left.
//! Without an active meter, gas is not tracked at all.
//!
//! [`GuardPolicy::GasLimited`]: reentrancy_types::GuardPolicy::GasLimited

use reentrancy_types::Error;

/// Default gas charged for entering a ledger operation while metered.
pub const DEFAULT_REENTRY_GAS_COST: u64 = 700;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GasMeter {
    pub limit: u64,
    pub used: u64,
}

impl GasMeter {
    pub fn remaining(&self) -> u64 {
        self.limit - self.used
    }
}

#[derive(Clone, Debug, Default)]
pub struct GasMeters {
    stack: Vec<GasMeter>,
}

impl GasMeters {
    /// Open a meter capped at `stipend` (and at the parent's remaining gas).
    pub fn enter(&mut self, stipend: u64) -> GasMeter {
        let limit = match self.stack.last() {
            Some(parent) => stipend.min(parent.remaining()),
            None => stipend,
        };
        let meter = GasMeter { limit, used: 0 };
        self.stack.push(meter);
        meter
    }

    /// Close the innermost meter, charging what it used to its parent.
    pub fn exit(&mut self) -> Option<GasMeter> {
        let meter = self.stack.pop()?;
        if let Some(parent) = self.stack.last_mut() {
            // The child limit never exceeds the parent's remaining gas.
            parent.used = parent.used.saturating_add(meter.used).min(parent.limit);
        }
        Some(meter)
    }

    /// Charge the innermost meter. A no-op when no meter is active.
    pub fn consume(&mut self, units: u64) -> Result<(), Error> {
        let Some(meter) = self.stack.last_mut() else {
            return Ok(());
        };
        let remaining = meter.remaining();
        if units > remaining {
            return Err(Error::OutOfGas {
                required: units,
                remaining,
            });
        }
        meter.used += units;
        Ok(())
    }

    pub fn is_metered(&self) -> bool {
        !self.stack.is_empty()
    }

    /// Gas left in the innermost meter, if any.
    pub fn remaining(&self) -> Option<u64> {
        self.stack.last().map(GasMeter::remaining)
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}

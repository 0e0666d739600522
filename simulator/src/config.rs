use anyhow::{Context, Result};
use reentrancy_execution::{AttackerConfig, MachineConfig};
use reentrancy_types::DEFAULT_GAS_STIPEND;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use tracing::Level;

pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_SEED: u64 = 0;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineSettings {
    pub max_call_depth: usize,
    pub reentry_gas_cost: u64,
}

impl Default for MachineSettings {
    fn default() -> Self {
        let config = MachineConfig::default();
        Self {
            max_call_depth: config.max_call_depth,
            reentry_gas_cost: config.reentry_gas_cost,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttackerSettings {
    pub step_budget: u64,
    pub callback_gas: u64,
}

impl Default for AttackerSettings {
    fn default() -> Self {
        let config = AttackerConfig::default();
        Self {
            step_budget: config.step_budget,
            callback_gas: config.callback_gas,
        }
    }
}

/// Harness configuration, loaded from YAML.
///
/// Every field is optional in the file; missing fields take their defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    pub log_level: String,
    pub machine: MachineSettings,
    /// Stipend forwarded to payout hooks on gas-limited ledgers.
    pub gas_stipend: u64,
    pub attacker: AttackerSettings,
    /// Seed for the randomized checker.
    pub seed: u64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            machine: MachineSettings::default(),
            gas_stipend: DEFAULT_GAS_STIPEND,
            attacker: AttackerSettings::default(),
            seed: DEFAULT_SEED,
        }
    }
}

impl SimulatorConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("could not read config file {}", path.display()))?;
        let config: SimulatorConfig = serde_yaml::from_str(&raw)
            .with_context(|| format!("could not parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.level()?;
        self.machine_config()
            .validate()
            .map_err(|err| anyhow::anyhow!("machine: {err}"))?;
        self.attacker_config()
            .validate()
            .map_err(|err| anyhow::anyhow!("attacker: {err}"))?;
        if self.gas_stipend == 0 {
            anyhow::bail!("gas_stipend must be > 0");
        }
        Ok(())
    }

    pub fn level(&self) -> Result<Level> {
        Level::from_str(&self.log_level)
            .map_err(|_| anyhow::anyhow!("invalid log_level: {}", self.log_level))
    }

    pub fn machine_config(&self) -> MachineConfig {
        MachineConfig {
            max_call_depth: self.machine.max_call_depth,
            reentry_gas_cost: self.machine.reentry_gas_cost,
        }
    }

    pub fn attacker_config(&self) -> AttackerConfig {
        AttackerConfig {
            step_budget: self.attacker.step_budget,
            callback_gas: self.attacker.callback_gas,
        }
    }
}

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MachineId(pub u64);

/// Money a machine has produced and not yet handed over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoneyHolder {
    balance: u64,
}

impl MoneyHolder {
    pub fn with_balance(balance: u64) -> Self {
        Self { balance }
    }

    pub fn balance(&self) -> u64 {
        self.balance
    }

    pub fn deposit(&mut self, amount: u64) {
        self.balance = self.balance.saturating_add(amount);
    }

    pub fn take_all(&mut self) -> u64 {
        std::mem::take(&mut self.balance)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum WalletError {
    #[error("insufficient funds: balance {balance}, requested {requested}")]
    InsufficientFunds { balance: u64, requested: u64 },
    #[error("wallet balance would overflow: balance {balance}, adding {amount}")]
    Overflow { balance: u64, amount: u64 },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Wallet {
    balance: u64,
}

impl Wallet {
    pub fn with_balance(balance: u64) -> Self {
        Self { balance }
    }

    pub fn balance(&self) -> u64 {
        self.balance
    }

    /// Applies a signed change; the balance never drops below zero.
    pub fn change(&mut self, delta: i64) -> Result<u64, WalletError> {
        let amount = delta.unsigned_abs();
        if delta >= 0 {
            return self.credit(amount);
        }
        self.balance = self
            .balance
            .checked_sub(amount)
            .ok_or(WalletError::InsufficientFunds {
                balance: self.balance,
                requested: amount,
            })?;
        Ok(self.balance)
    }

    fn credit(&mut self, amount: u64) -> Result<u64, WalletError> {
        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or(WalletError::Overflow {
                balance: self.balance,
                amount,
            })?;
        Ok(self.balance)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MachineRegistry {
    holders: BTreeMap<MachineId, MoneyHolder>,
}

impl MachineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: MachineId, holder: MoneyHolder) -> Option<MoneyHolder> {
        self.holders.insert(id, holder)
    }

    pub fn remove(&mut self, id: MachineId) -> Option<MoneyHolder> {
        self.holders.remove(&id)
    }

    pub fn get(&self, id: MachineId) -> Option<&MoneyHolder> {
        self.holders.get(&id)
    }

    pub fn get_mut(&mut self, id: MachineId) -> Option<&mut MoneyHolder> {
        self.holders.get_mut(&id)
    }

    pub fn len(&self) -> usize {
        self.holders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.holders.is_empty()
    }
}

/// Tracks the machine the player is standing at and moves its money into the
/// wallet on the interact action.
#[derive(Debug, Clone, Copy, Default)]
pub struct MoneyGrabber {
    tracked: Option<MachineId>,
}

impl MoneyGrabber {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tracked(&self) -> Option<MachineId> {
        self.tracked
    }

    pub fn can_grab(&self) -> bool {
        self.tracked.is_some()
    }

    /// Called every tick the player overlaps `machine`. Only a machine holding
    /// money becomes the grab target.
    pub fn observe(&mut self, machine: MachineId, holder: &MoneyHolder) {
        if holder.balance() > 0 {
            self.tracked = Some(machine);
        }
    }

    pub fn leave(&mut self, machine: MachineId) {
        if self.tracked == Some(machine) {
            self.tracked = None;
        }
    }

    /// Returns the amount moved, or `None` when nothing was grabbable.
    pub fn grab(
        &mut self,
        machines: &mut MachineRegistry,
        wallet: &mut Wallet,
    ) -> Result<Option<u64>, WalletError> {
        let Some(machine) = self.tracked else {
            return Ok(None);
        };
        let Some(holder) = machines.get_mut(machine) else {
            debug!(machine = machine.0, "grab_target_missing");
            self.tracked = None;
            return Ok(None);
        };

        let amount = holder.balance();
        if amount == 0 {
            self.tracked = None;
            return Ok(None);
        }

        let balance = wallet.credit(amount)?;
        holder.take_all();
        self.tracked = None;
        info!(machine = machine.0, amount, balance, "money_grabbed");
        Ok(Some(amount))
    }
}

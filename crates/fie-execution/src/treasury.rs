//! Per-principal balances held for value-moving actions

use std::collections::HashMap;

use fie_types::{FieError, PrincipalId, Result};

/// Internal bookkeeping of funds available to each principal's actions.
///
/// All arithmetic is checked. A debit never leaves a balance negative.
#[derive(Debug, Default, Clone)]
pub struct Treasury {
    balances: HashMap<PrincipalId, u64>,
}

impl Treasury {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance(&self, principal: &PrincipalId) -> u64 {
        self.balances.get(principal).copied().unwrap_or(0)
    }

    /// Credit funds; returns the new balance
    pub fn credit(&mut self, principal: &PrincipalId, amount: u64) -> Result<u64> {
        if amount == 0 {
            return Err(FieError::invalid_input("amount", "must be positive"));
        }
        let current = self.balance(principal);
        let updated = current.checked_add(amount).ok_or(FieError::BalanceOverflow)?;
        self.balances.insert(principal.clone(), updated);
        Ok(updated)
    }

    /// Debit funds; rejects before touching state if the balance is short
    pub fn debit(&mut self, principal: &PrincipalId, amount: u64) -> Result<u64> {
        let available = self.balance(principal);
        if available < amount {
            return Err(FieError::InsufficientBalance {
                available,
                required: amount,
            });
        }
        let updated = available - amount;
        self.balances.insert(principal.clone(), updated);
        Ok(updated)
    }
}

// The colony's wood stockpile.
//
// A single unsigned counter. Chopping credits it, ordering a build debits
// the structure's cost up front (a reservation), and a build that never
// completes refunds exactly what was reserved. Debits are checked, so the
// balance can never go negative.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stockpile {
    wood: u32,
}

impl Stockpile {
    pub fn new(wood: u32) -> Self {
        Self { wood }
    }

    pub fn wood(&self) -> u32 {
        self.wood
    }

    pub fn can_afford(&self, cost: u32) -> bool {
        self.wood >= cost
    }

    /// Add chopped wood.
    pub fn credit(&mut self, amount: u32) {
        self.wood = self.wood.saturating_add(amount);
    }

    /// Reserve `cost` wood. Returns `false` (and changes nothing) if the
    /// stockpile is short.
    pub fn try_debit(&mut self, cost: u32) -> bool {
        match self.wood.checked_sub(cost) {
            Some(rest) => {
                self.wood = rest;
                true
            }
            None => false,
        }
    }

    /// Return a reservation for a build that will not happen.
    pub fn refund(&mut self, cost: u32) {
        self.credit(cost);
    }
}

//! Grapple shot pool with timed regeneration.

use rapier3d::prelude::Real;
use serde::{Deserialize, Serialize};

const TIMER_EPSILON: Real = 1.0e-4;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChargePool {
    charges: u32,
    max_charges: u32,
    recharge_interval: Real,
    /// Seconds until the next charge; zero when no recharge is running.
    recharge_timer: Real,
}

impl ChargePool {
    pub fn full(max_charges: u32, recharge_interval: Real) -> Self {
        Self {
            charges: max_charges,
            max_charges,
            recharge_interval,
            recharge_timer: 0.0,
        }
    }

    /// A pool holding `charges` (clamped to the cap) with no recharge running yet.
    pub fn with_charges(charges: u32, max_charges: u32, recharge_interval: Real) -> Self {
        Self {
            charges: charges.min(max_charges),
            ..Self::full(max_charges, recharge_interval)
        }
    }

    pub fn charges(&self) -> u32 {
        self.charges
    }

    pub fn max_charges(&self) -> u32 {
        self.max_charges
    }

    pub fn recharge_timer(&self) -> Real {
        self.recharge_timer
    }

    pub fn is_recharging(&self) -> bool {
        self.recharge_timer > 0.0
    }

    pub fn has_charge(&self) -> bool {
        self.charges > 0
    }

    /// Spends one charge. Returns false (and changes nothing) on an empty pool.
    pub fn try_consume(&mut self) -> bool {
        if self.charges == 0 {
            return false;
        }
        self.charges -= 1;
        if !self.is_recharging() {
            self.recharge_timer = self.recharge_interval;
        }
        true
    }

    /// Counts the recharge timer down and returns how many charges were restored.
    pub fn tick(&mut self, dt: Real) -> u32 {
        if self.charges >= self.max_charges {
            self.recharge_timer = 0.0;
            return 0;
        }
        if !self.is_recharging() {
            self.recharge_timer = self.recharge_interval;
        }
        self.recharge_timer -= dt.max(0.0);
        let mut restored = 0;
        while self.recharge_timer <= TIMER_EPSILON && self.charges < self.max_charges {
            self.charges += 1;
            restored += 1;
            if self.charges < self.max_charges && self.recharge_interval > 0.0 {
                self.recharge_timer += self.recharge_interval;
            } else {
                self.recharge_timer = 0.0;
                if self.recharge_interval <= 0.0 {
                    self.charges = self.max_charges;
                }
                break;
            }
        }
        restored
    }

    pub fn reset(&mut self) {
        self.charges = self.max_charges;
        self.recharge_timer = 0.0;
    }
}

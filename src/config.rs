//! Simulation parameters
//!
//! All tunables for the market random walk and the loan/cooldown rules live
//! here. Interest tier factors are fixed constants of the accrual formula and
//! are defined alongside it in `accrual`.

use crate::error::BankError;

/// Configuration for the market simulator and loan rules
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Seconds between market ticks; `advance` is a no-op below this
    pub tick_interval_secs: i64,

    // Re-targeting draws (fractional percent changes, low..=high)
    /// Normal re-target range
    pub normal_move: (f64, f64),
    /// Probability of drawing from the shock range instead
    pub shock_prob: f64,
    /// Shock range, biased negative to model occasional crashes
    pub shock_move: (f64, f64),
    /// Strictly positive recovery range used when a draw violates the floor
    pub recovery_move: (f64, f64),

    /// Minimum admissible target after any re-target
    pub target_floor: f64,
    /// Hard floor for any single produced price
    pub price_floor: f64,
    /// Inclusive range for a fresh remaining-steps countdown
    pub steps_range: (u32, u32),
    /// Inclusive range for a fresh stability coefficient
    pub stability_range: (f64, f64),

    // Loan and cooldown rules
    /// Grace period before a loan turns overdue, in minutes
    pub loan_grace_mins: i64,
    /// Repayment due within the grace period
    pub repayment_on_time: f64,
    /// Repayment due once overdue
    pub repayment_overdue: f64,
    /// Cooldown comparing a login timestamp against the last action, in minutes
    pub action_cooldown_mins: i64,
}

impl SimConfig {
    /// Baseline configuration: one-minute ticks, 5% crash probability,
    /// $500/$1500 loan tiers
    pub fn baseline() -> Self {
        Self::default()
    }

    /// Calm market: no shocks, tighter noise
    pub fn calm() -> Self {
        SimConfig {
            shock_prob: 0.0,
            stability_range: (0.005, 0.02),
            ..Self::default()
        }
    }

    /// Turbulent market: frequent shocks, wider noise
    pub fn turbulent() -> Self {
        SimConfig {
            shock_prob: 0.15,
            shock_move: (-0.5, 0.0),
            stability_range: (0.03, 0.1),
            ..Self::default()
        }
    }

    /// Check that all ranges are ordered and all floors are sane
    pub fn validate(&self) -> Result<(), BankError> {
        if self.tick_interval_secs <= 0 {
            return Err(BankError::BadConfig(
                "tick interval must be positive".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.shock_prob) {
            return Err(BankError::BadConfig(
                "shock probability must lie in [0, 1]".into(),
            ));
        }
        for (name, (low, high)) in [
            ("normal_move", self.normal_move),
            ("shock_move", self.shock_move),
            ("recovery_move", self.recovery_move),
            ("stability_range", self.stability_range),
        ] {
            if low > high {
                return Err(BankError::BadConfig(format!("{name} range is inverted")));
            }
        }
        if self.recovery_move.0 <= 0.0 {
            return Err(BankError::BadConfig(
                "recovery range must be strictly positive".into(),
            ));
        }
        if self.stability_range.0 < 0.0 || self.stability_range.1 > 1.0 {
            return Err(BankError::BadConfig(
                "stability range must lie in [0, 1]".into(),
            ));
        }
        if self.steps_range.0 == 0 || self.steps_range.0 > self.steps_range.1 {
            return Err(BankError::BadConfig(
                "steps range must start at 1 or above and be ordered".into(),
            ));
        }
        if self.price_floor <= 0.0 || self.target_floor < self.price_floor {
            return Err(BankError::BadConfig(
                "price floor must be positive and below the target floor".into(),
            ));
        }
        if self.loan_grace_mins < 0 || self.action_cooldown_mins < 0 {
            return Err(BankError::BadConfig(
                "grace and cooldown periods cannot be negative".into(),
            ));
        }
        Ok(())
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig {
            tick_interval_secs: 60,
            normal_move: (-0.20, 0.30),
            shock_prob: 0.05,
            shock_move: (-0.40, 0.0),
            recovery_move: (0.05, 0.30),
            target_floor: 1.0,
            price_floor: 0.01,
            steps_range: (8, 15),
            stability_range: (0.01, 0.06),
            loan_grace_mins: 20,
            repayment_on_time: 500.0,
            repayment_overdue: 1500.0,
            action_cooldown_mins: 5,
        }
    }
}

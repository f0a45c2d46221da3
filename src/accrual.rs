//! Time-based accrual: tiered compound interest and loan ageing
//!
//! Balances are stored as of the last deposit/withdraw and interest is
//! computed on read, never persisted continuously. Three disjoint minute
//! bands compound independently and multiplicatively: 1%/min for the first
//! 30 minutes, 2%/min for the next 30, 3%/min beyond the hour.

use chrono::{DateTime, Utc};

use crate::config::SimConfig;
use crate::helpers::minutes_between;

const TIER1_FACTOR: f64 = 1.01;
const TIER2_FACTOR: f64 = 1.02;
const TIER3_FACTOR: f64 = 1.03;
/// Width in minutes of each of the first two bands
const BAND_MINS: i64 = 30;

/// A balance valued at a specific instant
///
/// The only way to obtain one is to supply `now`, so a stale stored balance
/// can never be mistaken for a spendable total.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccruedBalance {
    /// Marginal tier rate for display (0.01, 0.02 or 0.03; 0.0 if never
    /// transacted). Does not affect the compounding itself.
    pub rate: f64,
    /// Balance with all applicable bands compounded, floored to a whole amount
    pub total: f64,
    /// Whole minutes since the last interest-accruing transaction
    pub minutes_elapsed: i64,
}

/// Compound a stored balance up to `now`
///
/// `last_transaction = None` means the account has never transacted: the
/// balance passes through unchanged.
pub fn interest_accrued(
    balance: f64,
    last_transaction: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> AccruedBalance {
    let Some(last) = last_transaction else {
        return AccruedBalance {
            rate: 0.0,
            total: balance,
            minutes_elapsed: 0,
        };
    };

    let minutes = minutes_between(last, now);
    let tier1 = minutes.min(BAND_MINS);
    let tier2 = (minutes - BAND_MINS).max(0).min(BAND_MINS);
    let tier3 = (minutes - 2 * BAND_MINS).max(0);

    let total = (balance
        * TIER1_FACTOR.powi(tier1 as i32)
        * TIER2_FACTOR.powi(tier2 as i32)
        * TIER3_FACTOR.powi(tier3 as i32))
    .floor();

    let rate = if minutes >= 2 * BAND_MINS {
        0.03
    } else if minutes >= BAND_MINS {
        0.02
    } else {
        0.01
    };

    AccruedBalance {
        rate,
        total,
        minutes_elapsed: minutes,
    }
}

/// Age of the current loan, if any
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoanStatus {
    pub active: bool,
    pub overdue: bool,
    /// Flat penalty tier; 0 with no active loan
    pub repayment_due: f64,
}

/// Evaluate a loan against the grace period
///
/// The boundary is exclusive at millisecond precision: a loan aged exactly
/// the grace period is still on time.
pub fn loan_status(
    loan_time: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    config: &SimConfig,
) -> LoanStatus {
    let Some(start) = loan_time else {
        return LoanStatus {
            active: false,
            overdue: false,
            repayment_due: 0.0,
        };
    };

    let overdue = (now - start).num_milliseconds() > config.loan_grace_mins * 60_000;
    let repayment_due = if overdue {
        config.repayment_overdue
    } else {
        config.repayment_on_time
    };
    LoanStatus {
        active: true,
        overdue,
        repayment_due,
    }
}

/// Cooldown gate evaluated by the mutation layer before any action
///
/// An account is blocked while its client-held login timestamp is within the
/// cooldown of its own last action. A missing last action counts as the epoch.
pub fn is_action_blocked(
    last_action: Option<DateTime<Utc>>,
    login_time: DateTime<Utc>,
    config: &SimConfig,
) -> bool {
    let last_ms = last_action.map(|t| t.timestamp_millis()).unwrap_or(0);
    login_time.timestamp_millis() - last_ms < config.action_cooldown_mins * 60_000
}

//! Toy bank simulation core
//!
//! A stochastic market simulator and a time-based financial accrual engine,
//! pure functions of state + time. The surrounding shell (HTTP routing, file
//! persistence, UI) is an external collaborator: it loads a snapshot, calls
//! in with the current time, and writes the returned state back.
//!
//! Components:
//! - `market`: per-instrument target-seeking random walk with periodic
//!   re-targeting and an administrative control surface
//! - `accrual`: tiered compound interest, loan ageing and the action
//!   cooldown gate
//! - `account`: the mutation layer (deposit/withdraw/buy/sell/loan/repay)
//!   that locks in accrued interest at every boundary
//! - `aggregate`: stateless bank-wide summary views
//! - `snapshot`: the serde layout consumed and produced by the persistence
//!   collaborator
//!
//! Nothing in the core blocks, performs I/O (beyond the snapshot helpers) or
//! locks. Callers must serialize mutations: concurrent buy/sell/deposit/
//! withdraw against the same account race with lost updates unless funneled
//! through a single writer per state file.

pub mod account;
pub mod accrual;
pub mod aggregate;
pub mod config;
pub mod error;
pub mod helpers;
pub mod market;
pub mod snapshot;

pub use account::Account;
pub use accrual::{interest_accrued, is_action_blocked, loan_status, AccruedBalance, LoanStatus};
pub use aggregate::{holdings_aggregation, total_assets, HoldingsAggregation, TotalAssets};
pub use config::SimConfig;
pub use error::BankError;
pub use market::{Instrument, InstrumentControl, MarketState};

//! Persisted snapshot layout for the persistence collaborator
//!
//! Mirrors the JSON files the surrounding shell reads and writes: a market
//! snapshot keyed by symbol plus top-level `lastUpdate` and `marquee`, and a
//! flat account list. Every price and balance is rounded to 2 decimal places
//! before writing.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::account::Account;
use crate::error::BankError;
use crate::helpers::round2;
use crate::market::{Instrument, MarketState};

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot io: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot encoding: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Invalid(#[from] BankError),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstrumentSnapshot {
    pub price: Vec<f64>,
    pub target: f64,
    pub remaining: u32,
    pub stability: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSnapshot {
    pub last_update: DateTime<Utc>,
    pub marquee: String,
    pub stocks: BTreeMap<String, InstrumentSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSnapshot {
    pub id: String,
    pub name: String,
    pub balance: f64,
    pub last_action: Option<DateTime<Utc>>,
    pub last_transaction: Option<DateTime<Utc>>,
    pub loan_time: Option<DateTime<Utc>>,
    pub holdings: BTreeMap<String, f64>,
}

impl From<&MarketState> for MarketSnapshot {
    fn from(state: &MarketState) -> Self {
        let stocks = state
            .instruments
            .iter()
            .map(|(symbol, instrument)| {
                (
                    symbol.clone(),
                    InstrumentSnapshot {
                        price: instrument.price_history.iter().copied().map(round2).collect(),
                        target: round2(instrument.target),
                        remaining: instrument.remaining_steps,
                        stability: instrument.stability,
                    },
                )
            })
            .collect();
        MarketSnapshot {
            last_update: state.last_update,
            marquee: state.marquee.clone(),
            stocks,
        }
    }
}

impl TryFrom<MarketSnapshot> for MarketState {
    type Error = BankError;

    fn try_from(snapshot: MarketSnapshot) -> Result<Self, Self::Error> {
        let mut instruments = BTreeMap::new();
        for (symbol, stock) in snapshot.stocks {
            if stock.price.is_empty() {
                return Err(BankError::EmptyPriceHistory(symbol));
            }
            instruments.insert(
                symbol,
                Instrument {
                    price_history: stock.price,
                    target: stock.target,
                    remaining_steps: stock.remaining,
                    stability: stock.stability,
                },
            );
        }
        Ok(MarketState {
            instruments,
            last_update: snapshot.last_update,
            marquee: snapshot.marquee,
        })
    }
}

impl From<&Account> for AccountSnapshot {
    fn from(account: &Account) -> Self {
        AccountSnapshot {
            id: account.id.clone(),
            name: account.name.clone(),
            balance: round2(account.balance),
            last_action: account.last_action,
            last_transaction: account.last_transaction,
            loan_time: account.loan_time,
            holdings: account.holdings.clone(),
        }
    }
}

impl From<AccountSnapshot> for Account {
    fn from(snapshot: AccountSnapshot) -> Self {
        Account {
            id: snapshot.id,
            name: snapshot.name,
            balance: snapshot.balance,
            last_action: snapshot.last_action,
            last_transaction: snapshot.last_transaction,
            loan_time: snapshot.loan_time,
            holdings: snapshot.holdings,
        }
    }
}

pub fn save_market(state: &MarketState, path: &Path) -> Result<(), SnapshotError> {
    let snapshot = MarketSnapshot::from(state);
    fs::write(path, serde_json::to_string_pretty(&snapshot)?)?;
    Ok(())
}

pub fn load_market(path: &Path) -> Result<MarketState, SnapshotError> {
    let snapshot: MarketSnapshot = serde_json::from_str(&fs::read_to_string(path)?)?;
    Ok(MarketState::try_from(snapshot)?)
}

pub fn save_accounts(accounts: &[Account], path: &Path) -> Result<(), SnapshotError> {
    let snapshots: Vec<AccountSnapshot> = accounts.iter().map(AccountSnapshot::from).collect();
    fs::write(path, serde_json::to_string_pretty(&snapshots)?)?;
    Ok(())
}

pub fn load_accounts(path: &Path) -> Result<Vec<Account>, SnapshotError> {
    let snapshots: Vec<AccountSnapshot> = serde_json::from_str(&fs::read_to_string(path)?)?;
    Ok(snapshots.into_iter().map(Account::from).collect())
}

//! Derived, stateless summary views
//!
//! Pure folds over accounts and current market prices; nothing here holds
//! state of its own.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::account::Account;
use crate::accrual::loan_status;
use crate::config::SimConfig;
use crate::helpers::round2;
use crate::market::MarketState;

/// Bank-wide asset summary
#[derive(Debug, Clone, PartialEq)]
pub struct TotalAssets {
    pub total_balance: f64,
    pub total_stock_value: f64,
    /// Repayments due across accounts with an active loan
    pub total_repayment: f64,
    /// Balance plus stock value minus outstanding repayments
    pub total_assets: f64,
}

/// Sum balances, mark holdings to current prices and net out loan repayments
///
/// Holdings of a symbol the market no longer tracks are valued at zero.
pub fn total_assets(
    accounts: &[Account],
    market: &MarketState,
    now: DateTime<Utc>,
    config: &SimConfig,
) -> TotalAssets {
    let total_balance: f64 = accounts.iter().map(|account| account.balance).sum();

    let total_stock_value: f64 = accounts
        .iter()
        .flat_map(|account| account.holdings.iter())
        .map(|(symbol, quantity)| {
            let price = market
                .instruments
                .get(symbol)
                .map(|instrument| instrument.current_price())
                .unwrap_or(0.0);
            quantity * price
        })
        .sum();

    let total_repayment: f64 = accounts
        .iter()
        .map(|account| loan_status(account.loan_time, now, config).repayment_due)
        .sum();

    TotalAssets {
        total_balance: round2(total_balance),
        total_stock_value: round2(total_stock_value),
        total_repayment: round2(total_repayment),
        total_assets: round2(total_balance + total_stock_value - total_repayment),
    }
}

/// Per-symbol holding totals with the largest and smallest holders
#[derive(Debug, Clone, PartialEq)]
pub struct HoldingsAggregation {
    pub totals: BTreeMap<String, f64>,
    /// Symbol with the largest total; ties keep the first-encountered symbol
    pub max: Option<String>,
    /// Symbol with the smallest total; ties keep the first-encountered symbol
    pub min: Option<String>,
}

pub fn holdings_aggregation(accounts: &[Account]) -> HoldingsAggregation {
    let mut totals: BTreeMap<String, f64> = BTreeMap::new();
    for account in accounts {
        for (symbol, quantity) in &account.holdings {
            *totals.entry(symbol.clone()).or_insert(0.0) += quantity;
        }
    }

    let mut max: Option<(String, f64)> = None;
    let mut min: Option<(String, f64)> = None;
    for (symbol, &total) in &totals {
        if max.as_ref().map_or(true, |(_, best)| total > *best) {
            max = Some((symbol.clone(), total));
        }
        if min.as_ref().map_or(true, |(_, least)| total < *least) {
            min = Some((symbol.clone(), total));
        }
    }

    HoldingsAggregation {
        totals,
        max: max.map(|(symbol, _)| symbol),
        min: min.map(|(symbol, _)| symbol),
    }
}

//! Accounts and the mutation layer over the accrual calculator
//!
//! Every mutating operation first materializes the accrued total as the new
//! balance and stamps `last_transaction = now`, so interest never compounds
//! across a mutation boundary. Rejected operations leave the account
//! untouched.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::accrual::{interest_accrued, loan_status, AccruedBalance};
use crate::config::SimConfig;
use crate::error::BankError;
use crate::helpers::round2;
use crate::market::MarketState;

/// One customer account
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    /// Unique 4-digit identifier
    pub id: String,
    pub name: String,
    /// Deposit amount as of `last_transaction`; interest is computed on read
    pub balance: f64,
    /// Timestamp of the last mutating operation of any kind
    pub last_action: Option<DateTime<Utc>>,
    /// Timestamp of the last deposit/withdraw (interest-accruing event)
    pub last_transaction: Option<DateTime<Utc>>,
    /// Start of the current loan; at most one loan is active at a time
    pub loan_time: Option<DateTime<Utc>>,
    /// Quantity owned per instrument symbol; fractional shares allowed
    pub holdings: BTreeMap<String, f64>,
}

impl Account {
    pub fn new(id: impl Into<String>, name: impl Into<String>, balance: f64) -> Self {
        Account {
            id: id.into(),
            name: name.into(),
            balance: round2(balance),
            last_action: None,
            last_transaction: None,
            loan_time: None,
            holdings: BTreeMap::new(),
        }
    }

    /// Balance with interest compounded up to `now`
    pub fn accrued(&self, now: DateTime<Utc>) -> AccruedBalance {
        interest_accrued(self.balance, self.last_transaction, now)
    }

    /// Lock in a settled balance and stamp both timestamps
    fn settle(&self, new_balance: f64, now: DateTime<Utc>) -> Account {
        Account {
            balance: round2(new_balance),
            last_transaction: Some(now),
            last_action: Some(now),
            ..self.clone()
        }
    }

    pub fn deposit(&self, amount: f64, now: DateTime<Utc>) -> Result<Account, BankError> {
        check_amount(amount)?;
        let accrued = self.accrued(now);
        Ok(self.settle(accrued.total + amount, now))
    }

    pub fn withdraw(&self, amount: f64, now: DateTime<Utc>) -> Result<Account, BankError> {
        check_amount(amount)?;
        let accrued = self.accrued(now);
        if amount > accrued.total {
            return Err(BankError::InsufficientBalance {
                required: amount,
                available: accrued.total,
            });
        }
        Ok(self.settle(accrued.total - amount, now))
    }

    /// Buy shares at the instrument's current price
    pub fn buy(
        &self,
        symbol: &str,
        quantity: f64,
        market: &MarketState,
        now: DateTime<Utc>,
    ) -> Result<Account, BankError> {
        check_amount(quantity)?;
        let cost = round2(quantity * market.price_of(symbol)?);
        let accrued = self.accrued(now);
        if cost > accrued.total {
            return Err(BankError::InsufficientBalance {
                required: cost,
                available: accrued.total,
            });
        }

        let mut updated = self.settle(accrued.total - cost, now);
        *updated.holdings.entry(symbol.to_string()).or_insert(0.0) += quantity;
        Ok(updated)
    }

    /// Sell held shares at the instrument's current price
    pub fn sell(
        &self,
        symbol: &str,
        quantity: f64,
        market: &MarketState,
        now: DateTime<Utc>,
    ) -> Result<Account, BankError> {
        check_amount(quantity)?;
        let price = market.price_of(symbol)?;
        let held = self.holdings.get(symbol).copied().unwrap_or(0.0);
        if quantity > held {
            return Err(BankError::InsufficientShares {
                symbol: symbol.to_string(),
                requested: quantity,
                held,
            });
        }

        let proceeds = round2(quantity * price);
        let accrued = self.accrued(now);
        let mut updated = self.settle(accrued.total + proceeds, now);
        if let Some(held) = updated.holdings.get_mut(symbol) {
            *held -= quantity;
        }
        Ok(updated)
    }

    /// Open a loan; rejected while one is already active
    ///
    /// Only the loan clock starts here; no principal is credited.
    pub fn take_loan(&self, now: DateTime<Utc>) -> Result<Account, BankError> {
        if self.loan_time.is_some() {
            return Err(BankError::LoanAlreadyActive(self.id.clone()));
        }
        Ok(Account {
            loan_time: Some(now),
            last_action: Some(now),
            ..self.clone()
        })
    }

    /// Repay the active loan: the due amount is deducted from the accrued
    /// total atomically with clearing the loan
    pub fn repay(&self, now: DateTime<Utc>, config: &SimConfig) -> Result<Account, BankError> {
        let status = loan_status(self.loan_time, now, config);
        if !status.active {
            return Err(BankError::NoActiveLoan(self.id.clone()));
        }
        let accrued = self.accrued(now);
        if accrued.total < status.repayment_due {
            return Err(BankError::InsufficientBalance {
                required: status.repayment_due,
                available: accrued.total,
            });
        }

        let mut updated = self.settle(accrued.total - status.repayment_due, now);
        updated.loan_time = None;
        Ok(updated)
    }
}

fn check_amount(amount: f64) -> Result<(), BankError> {
    if amount <= 0.0 || !amount.is_finite() {
        return Err(BankError::InvalidAmount(amount));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::Instrument;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap()
    }

    fn market() -> MarketState {
        let mut state = MarketState::new(t0());
        state
            .instruments
            .insert("AAPL".to_string(), Instrument::new(120.0, 130.0, 10, 0.02));
        state
    }

    #[test]
    fn deposit_materializes_accrued_interest() {
        let account = Account {
            last_transaction: Some(t0()),
            ..Account::new("1001", "Ada", 100.0)
        };

        let now = t0() + Duration::minutes(30);
        let updated = account.deposit(50.0, now).unwrap();

        // 100 accrues to 134, plus the fresh 50
        assert_eq!(updated.balance, 184.0);
        assert_eq!(updated.last_transaction, Some(now));
        assert_eq!(updated.last_action, Some(now));
    }

    #[test]
    fn deposit_rejects_non_positive_amount() {
        let account = Account::new("1001", "Ada", 100.0);
        assert_eq!(
            account.deposit(0.0, t0()),
            Err(BankError::InvalidAmount(0.0))
        );
        assert_eq!(
            account.deposit(-5.0, t0()),
            Err(BankError::InvalidAmount(-5.0))
        );
    }

    #[test]
    fn withdraw_checks_accrued_total_not_stored_balance() {
        let account = Account {
            last_transaction: Some(t0()),
            ..Account::new("1001", "Ada", 100.0)
        };

        // Stored balance is 100, but 30 minutes of interest allow 120
        let updated = account.withdraw(120.0, t0() + Duration::minutes(30)).unwrap();
        assert_eq!(updated.balance, 14.0);
    }

    #[test]
    fn withdraw_beyond_accrued_total_rejected() {
        let account = Account::new("1001", "Ada", 100.0);
        let result = account.withdraw(100.5, t0());
        assert_eq!(
            result,
            Err(BankError::InsufficientBalance {
                required: 100.5,
                available: 100.0,
            })
        );
    }

    #[test]
    fn buy_moves_balance_into_holdings() {
        let account = Account::new("1001", "Ada", 1000.0);
        let updated = account.buy("AAPL", 2.0, &market(), t0()).unwrap();

        assert_eq!(updated.balance, 760.0);
        assert_eq!(updated.holdings["AAPL"], 2.0);
        assert_eq!(updated.last_transaction, Some(t0()));
    }

    #[test]
    fn buy_rejects_unknown_symbol() {
        let account = Account::new("1001", "Ada", 1000.0);
        assert_eq!(
            account.buy("MSFT", 1.0, &market(), t0()),
            Err(BankError::StockNotFound("MSFT".to_string()))
        );
    }

    #[test]
    fn buy_rejects_unaffordable_cost() {
        let account = Account::new("1001", "Ada", 100.0);
        let result = account.buy("AAPL", 1.0, &market(), t0());
        assert_eq!(
            result,
            Err(BankError::InsufficientBalance {
                required: 120.0,
                available: 100.0,
            })
        );
    }

    #[test]
    fn sell_rejects_more_than_held() {
        let mut account = Account::new("1001", "Ada", 0.0);
        account.holdings.insert("AAPL".to_string(), 1.5);

        let result = account.sell("AAPL", 2.0, &market(), t0());
        assert_eq!(
            result,
            Err(BankError::InsufficientShares {
                symbol: "AAPL".to_string(),
                requested: 2.0,
                held: 1.5,
            })
        );
    }

    #[test]
    fn sell_credits_proceeds() {
        let mut account = Account::new("1001", "Ada", 10.0);
        account.holdings.insert("AAPL".to_string(), 2.0);

        let updated = account.sell("AAPL", 1.5, &market(), t0()).unwrap();
        assert_eq!(updated.balance, 190.0);
        assert_eq!(updated.holdings["AAPL"], 0.5);
    }

    #[test]
    fn second_loan_rejected() {
        let account = Account::new("1001", "Ada", 100.0)
            .take_loan(t0())
            .unwrap();
        assert_eq!(
            account.take_loan(t0() + Duration::minutes(1)),
            Err(BankError::LoanAlreadyActive("1001".to_string()))
        );
    }

    #[test]
    fn take_loan_does_not_touch_balance() {
        let account = Account::new("1001", "Ada", 100.0)
            .take_loan(t0())
            .unwrap();
        assert_eq!(account.balance, 100.0);
        assert_eq!(account.loan_time, Some(t0()));
        assert_eq!(account.last_transaction, None);
    }

    #[test]
    fn repay_deducts_due_and_clears_loan() {
        let config = SimConfig::baseline();
        let account = Account::new("1001", "Ada", 800.0)
            .take_loan(t0())
            .unwrap();

        let updated = account.repay(t0() + Duration::minutes(10), &config).unwrap();
        assert_eq!(updated.balance, 300.0);
        assert_eq!(updated.loan_time, None);
    }

    #[test]
    fn overdue_repay_costs_the_penalty_tier() {
        let config = SimConfig::baseline();
        let account = Account::new("1001", "Ada", 2000.0)
            .take_loan(t0())
            .unwrap();

        let updated = account.repay(t0() + Duration::minutes(21), &config).unwrap();
        assert_eq!(updated.balance, 500.0);
        assert_eq!(updated.loan_time, None);
    }

    #[test]
    fn repay_without_funds_leaves_loan_active() {
        let config = SimConfig::baseline();
        let account = Account::new("1001", "Ada", 100.0)
            .take_loan(t0())
            .unwrap();

        let result = account.repay(t0() + Duration::minutes(1), &config);
        assert_eq!(
            result,
            Err(BankError::InsufficientBalance {
                required: 500.0,
                available: 100.0,
            })
        );
        assert_eq!(account.loan_time, Some(t0()));
    }

    #[test]
    fn repay_without_loan_rejected() {
        let config = SimConfig::baseline();
        let account = Account::new("1001", "Ada", 1000.0);
        assert_eq!(
            account.repay(t0(), &config),
            Err(BankError::NoActiveLoan("1001".to_string()))
        );
    }
}

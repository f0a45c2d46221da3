//! Toy bank simulation - demonstration driver
//!
//! Seeds a small market and a handful of accounts, then drives the clock
//! tick by tick: customers deposit, trade and borrow while the market
//! evolves, and an operator override lands mid-run.

use bank_sim::{
    holdings_aggregation, total_assets, Account, Instrument, InstrumentControl, MarketState,
    SimConfig,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn seed_market(now: DateTime<Utc>) -> MarketState {
    let mut market = MarketState::new(now).set_marquee("Welcome to the toy bank");
    market
        .instruments
        .insert("AAPL".to_string(), Instrument::new(180.0, 200.0, 12, 0.02));
    market
        .instruments
        .insert("GOOG".to_string(), Instrument::new(140.0, 120.0, 9, 0.03));
    market
        .instruments
        .insert("TSLA".to_string(), Instrument::new(250.0, 310.0, 15, 0.05));
    market
}

fn main() {
    env_logger::init();

    println!("=== Toy Bank Simulation ===\n");

    let config = SimConfig::baseline();
    let ticks = 120;
    let seed = 42;
    let mut rng = StdRng::seed_from_u64(seed);

    println!("Configuration:");
    println!("  Tick interval: {}s", config.tick_interval_secs);
    println!("  Shock probability: {}", config.shock_prob);
    println!("  Target floor: ${:.2}", config.target_floor);
    println!("  Loan grace: {} minutes", config.loan_grace_mins);
    println!("  Ticks to simulate: {}\n", ticks);

    let start = Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0).unwrap();
    let mut market = seed_market(start);
    let mut accounts = vec![
        Account::new("1001", "Ada", 2500.0),
        Account::new("1002", "Grace", 900.0),
        Account::new("1003", "Edsger", 4000.0),
    ];

    println!(
        "Seeded {} instruments, {} accounts",
        market.instruments.len(),
        accounts.len()
    );

    for tick in 1..=ticks {
        let now = start + Duration::seconds(tick * config.tick_interval_secs);
        market = market.advance(now, &config, &mut rng);

        match tick {
            5 => {
                accounts[0] = accounts[0]
                    .deposit(500.0, now)
                    .expect("deposit should succeed");
                println!("tick {tick:>3}: Ada deposits $500.00");
            }
            10 => {
                accounts[1] = accounts[1]
                    .take_loan(now)
                    .expect("first loan should succeed");
                println!("tick {tick:>3}: Grace takes a loan");
            }
            15 => {
                accounts[1] = accounts[1]
                    .deposit(800.0, now)
                    .expect("deposit should succeed");
                println!("tick {tick:>3}: Grace deposits $800.00");
            }
            20 => {
                accounts[0] = accounts[0]
                    .buy("AAPL", 5.0, &market, now)
                    .expect("buy should succeed");
                println!("tick {tick:>3}: Ada buys 5 AAPL");
            }
            40 => {
                // Operator pins TSLA onto a short climb
                market = market
                    .apply_control(
                        "TSLA",
                        InstrumentControl {
                            target: Some(400.0),
                            remaining: Some(10),
                            stability: Some(0.01),
                        },
                    )
                    .expect("override should succeed");
                println!("tick {tick:>3}: operator re-targets TSLA to $400.00");
            }
            60 => {
                accounts[2] = accounts[2]
                    .buy("TSLA", 3.0, &market, now)
                    .expect("buy should succeed");
                println!("tick {tick:>3}: Edsger buys 3 TSLA");
            }
            80 => {
                accounts[0] = accounts[0]
                    .sell("AAPL", 2.0, &market, now)
                    .expect("sell should succeed");
                println!("tick {tick:>3}: Ada sells 2 AAPL");
            }
            100 => match accounts[1].repay(now, &config) {
                Ok(updated) => {
                    accounts[1] = updated;
                    println!("tick {tick:>3}: Grace repays her (overdue) loan");
                }
                Err(reason) => println!("tick {tick:>3}: Grace cannot repay: {reason}"),
            },
            _ => {}
        }
    }

    let end = start + Duration::seconds(ticks * config.tick_interval_secs);

    println!("\n=== Final Market ===\n");
    for (symbol, instrument) in &market.instruments {
        let prices = &instrument.price_history;
        let first = prices[0];
        let last = instrument.current_price();
        println!(
            "  {symbol}: ${first:.2} -> ${last:.2} ({:+.1}%), target ${:.2}, {} steps left",
            (last - first) / first * 100.0,
            instrument.target,
            instrument.remaining_steps,
        );
    }

    println!("\n=== Accounts ===\n");
    for account in &accounts {
        let accrued = account.accrued(end);
        println!(
            "  {} ({}): balance ${:.2}, accrued ${:.2} at {:.0}%/min after {} minutes",
            account.name,
            account.id,
            account.balance,
            accrued.total,
            accrued.rate * 100.0,
            accrued.minutes_elapsed,
        );
        for (symbol, quantity) in &account.holdings {
            println!("      holds {quantity} x {symbol}");
        }
    }

    println!("\n=== Bank Summary ===\n");
    let summary = total_assets(&accounts, &market, end, &config);
    println!("  Total deposits: ${:.2}", summary.total_balance);
    println!("  Stock value:    ${:.2}", summary.total_stock_value);
    println!("  Repayments due: ${:.2}", summary.total_repayment);
    println!("  Net assets:     ${:.2}", summary.total_assets);

    let aggregation = holdings_aggregation(&accounts);
    if let (Some(max), Some(min)) = (&aggregation.max, &aggregation.min) {
        println!("  Most held: {max}, least held: {min}");
    }

    println!("\n=== Simulation Complete ===");
}

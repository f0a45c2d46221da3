//! Market simulator: a target-seeking random walk per instrument
//!
//! Each instrument drifts toward its current target over a countdown of
//! steps. The interpolation fraction `1/remaining_steps` guarantees the walk
//! arrives exactly on target at the terminal step regardless of the noise
//! accumulated along the way; once the countdown expires a new target, a new
//! countdown and a new volatility coefficient are drawn.
//!
//! `advance` is immutable-in/immutable-out: the persistence collaborator owns
//! the read-modify-write cycle around it. Calling it more often than the tick
//! interval is a defined no-op, so at-least-once external scheduling is safe
//! as long as calls are serialized by the caller.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use log::{debug, info};
use rand::Rng;

use crate::config::SimConfig;
use crate::error::BankError;
use crate::helpers::round2;

/// Bounded number of recovery redraws before the target is clamped outright.
const MAX_RECOVERY_REDRAWS: u32 = 16;

/// One simulated security
#[derive(Debug, Clone, PartialEq)]
pub struct Instrument {
    /// Append-only price series, oldest first; the last element is current
    pub price_history: Vec<f64>,
    /// Price the walk is drifting toward
    pub target: f64,
    /// Ticks left until a new target is drawn
    pub remaining_steps: u32,
    /// Volatility coefficient bounding per-step relative noise
    pub stability: f64,
}

impl Instrument {
    pub fn new(initial_price: f64, target: f64, remaining_steps: u32, stability: f64) -> Self {
        Instrument {
            price_history: vec![round2(initial_price)],
            target: round2(target),
            remaining_steps,
            stability,
        }
    }

    /// Last element of the price history
    pub fn current_price(&self) -> f64 {
        *self
            .price_history
            .last()
            .expect("price history is never empty")
    }

    /// One step of evolution: interpolate toward the target, perturb, append
    fn step(&self, config: &SimConfig, rng: &mut impl Rng) -> Instrument {
        let current = self.current_price();

        // t = 1 on the terminal step snaps the walk fully onto the target
        let t = if self.remaining_steps > 0 {
            1.0 / self.remaining_steps as f64
        } else {
            1.0
        };
        let base = current + (self.target - current) * t;

        let noise = if self.stability > 0.0 {
            rng.gen_range(-self.stability / 2.0..=self.stability / 2.0)
        } else {
            0.0
        };
        let next_price = round2(base * (1.0 + noise)).max(config.price_floor);

        let mut price_history = self.price_history.clone();
        price_history.push(next_price);
        let remaining_steps = self.remaining_steps.saturating_sub(1);

        if remaining_steps > 0 {
            return Instrument {
                price_history,
                target: self.target,
                remaining_steps,
                stability: self.stability,
            };
        }

        let (target, remaining_steps, stability) = draw_target(next_price, config, rng);
        Instrument {
            price_history,
            target,
            remaining_steps,
            stability,
        }
    }
}

/// Draw a fresh target, countdown and stability for an expired cycle
///
/// A small fixed probability swaps the normal percent range for a shock range
/// biased negative. If the resulting target falls below the floor it is
/// redrawn from the strictly positive recovery range; a bounded number of
/// redraws keeps the loop total even when the current price is too low for
/// any recovery draw to clear the floor, in which case the target is clamped
/// to the floor itself.
fn draw_target(next_price: f64, config: &SimConfig, rng: &mut impl Rng) -> (f64, u32, f64) {
    let percent = if rng.gen::<f64>() < config.shock_prob {
        rng.gen_range(config.shock_move.0..=config.shock_move.1)
    } else {
        rng.gen_range(config.normal_move.0..=config.normal_move.1)
    };

    let mut target = round2(next_price * (1.0 + percent));
    if target < config.target_floor {
        for _ in 0..MAX_RECOVERY_REDRAWS {
            let percent = rng.gen_range(config.recovery_move.0..=config.recovery_move.1);
            target = round2(next_price * (1.0 + percent));
            if target >= config.target_floor {
                break;
            }
        }
        target = target.max(config.target_floor);
    }

    let remaining_steps = rng.gen_range(config.steps_range.0..=config.steps_range.1);
    let stability = rng.gen_range(config.stability_range.0..=config.stability_range.1);
    (target, remaining_steps, stability)
}

/// Administrative override for a single instrument
///
/// Externally set values are authoritative on the next tick. The only
/// validation is `stability ∈ [0, 1]`; `remaining` is non-negative by type.
#[derive(Debug, Clone, Copy, Default)]
pub struct InstrumentControl {
    pub target: Option<f64>,
    pub remaining: Option<u32>,
    pub stability: Option<f64>,
}

/// Process-wide market snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct MarketState {
    /// Tracked instruments keyed by symbol
    pub instruments: BTreeMap<String, Instrument>,
    /// Timestamp of the most recent simulation tick
    pub last_update: DateTime<Utc>,
    /// Operator-settable free text, carried through unchanged
    pub marquee: String,
}

impl MarketState {
    pub fn new(now: DateTime<Utc>) -> Self {
        MarketState {
            instruments: BTreeMap::new(),
            last_update: now,
            marquee: String::new(),
        }
    }

    /// Advance every instrument by one step
    ///
    /// A no-op clone when less than one tick interval has elapsed since
    /// `last_update`; otherwise exactly one step of evolution and
    /// `last_update = now`. An overdue tick is never skipped, but missed
    /// intervals beyond one are not replayed.
    pub fn advance(&self, now: DateTime<Utc>, config: &SimConfig, rng: &mut impl Rng) -> MarketState {
        let elapsed_secs = (now - self.last_update).num_seconds();
        if elapsed_secs < config.tick_interval_secs {
            debug!("tick skipped: only {elapsed_secs}s since last update");
            return self.clone();
        }

        let instruments: BTreeMap<String, Instrument> = self
            .instruments
            .iter()
            .map(|(symbol, instrument)| {
                let stepped = instrument.step(config, rng);
                debug!(
                    "{symbol}: {:.2} -> {:.2} ({} steps to target {:.2})",
                    instrument.current_price(),
                    stepped.current_price(),
                    stepped.remaining_steps,
                    stepped.target,
                );
                if instrument.remaining_steps <= 1 {
                    info!(
                        "{symbol} re-targeted to {:.2} over {} steps, stability {:.3}",
                        stepped.target, stepped.remaining_steps, stepped.stability,
                    );
                }
                (symbol.clone(), stepped)
            })
            .collect();

        MarketState {
            instruments,
            last_update: now,
            marquee: self.marquee.clone(),
        }
    }

    /// Apply an operator override to one instrument
    pub fn apply_control(
        &self,
        symbol: &str,
        control: InstrumentControl,
    ) -> Result<MarketState, BankError> {
        let instrument = self
            .instruments
            .get(symbol)
            .ok_or_else(|| BankError::StockNotFound(symbol.to_string()))?;
        if let Some(stability) = control.stability {
            if !(0.0..=1.0).contains(&stability) {
                return Err(BankError::StabilityOutOfRange(stability));
            }
        }

        let mut updated = instrument.clone();
        if let Some(target) = control.target {
            updated.target = round2(target);
        }
        if let Some(remaining) = control.remaining {
            updated.remaining_steps = remaining;
        }
        if let Some(stability) = control.stability {
            updated.stability = stability;
        }
        info!(
            "{symbol} override: target {:.2}, {} steps, stability {:.3}",
            updated.target, updated.remaining_steps, updated.stability,
        );

        let mut instruments = self.instruments.clone();
        instruments.insert(symbol.to_string(), updated);
        Ok(MarketState {
            instruments,
            last_update: self.last_update,
            marquee: self.marquee.clone(),
        })
    }

    /// Replace the operator marquee text
    pub fn set_marquee(&self, marquee: impl Into<String>) -> MarketState {
        MarketState {
            marquee: marquee.into(),
            ..self.clone()
        }
    }

    /// Current price of one instrument
    pub fn price_of(&self, symbol: &str) -> Result<f64, BankError> {
        self.instruments
            .get(symbol)
            .map(Instrument::current_price)
            .ok_or_else(|| BankError::StockNotFound(symbol.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0).unwrap()
    }

    fn market_with(symbol: &str, instrument: Instrument) -> MarketState {
        let mut state = MarketState::new(t0());
        state.instruments.insert(symbol.to_string(), instrument);
        state
    }

    #[test]
    fn step_decrements_countdown_and_appends() {
        let config = SimConfig::baseline();
        let mut rng = StdRng::seed_from_u64(7);
        let instrument = Instrument::new(100.0, 120.0, 10, 0.02);

        let stepped = instrument.step(&config, &mut rng);

        assert_eq!(stepped.price_history.len(), 2);
        assert_eq!(stepped.remaining_steps, 9);
        assert_eq!(stepped.target, 120.0);
    }

    #[test]
    fn terminal_step_snaps_to_target_without_noise() {
        let config = SimConfig::baseline();
        let mut rng = StdRng::seed_from_u64(7);
        let instrument = Instrument::new(100.0, 42.0, 1, 0.0);

        let stepped = instrument.step(&config, &mut rng);

        assert_eq!(stepped.current_price(), 42.0);
        // Cycle expired: fresh countdown and stability drawn
        assert!(stepped.remaining_steps >= config.steps_range.0);
        assert!(stepped.remaining_steps <= config.steps_range.1);
        assert!(stepped.stability >= config.stability_range.0);
        assert!(stepped.stability <= config.stability_range.1);
    }

    #[test]
    fn zero_countdown_behaves_like_terminal_step() {
        let config = SimConfig::baseline();
        let mut rng = StdRng::seed_from_u64(3);
        let instrument = Instrument::new(100.0, 50.0, 0, 0.0);

        let stepped = instrument.step(&config, &mut rng);

        assert_eq!(stepped.current_price(), 50.0);
    }

    #[test]
    fn price_clamped_to_floor() {
        let config = SimConfig::baseline();
        let mut rng = StdRng::seed_from_u64(11);
        // Walking toward a target below the per-step floor
        let instrument = Instrument::new(0.02, 0.0, 1, 0.0);

        let stepped = instrument.step(&config, &mut rng);

        assert_eq!(stepped.current_price(), config.price_floor);
    }

    #[test]
    fn redrawn_target_respects_floor() {
        let config = SimConfig::baseline();
        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            let (target, _, _) = draw_target(0.01, &config, &mut rng);
            assert!(
                target >= config.target_floor,
                "seed {seed}: target {target} below floor"
            );
        }
    }

    #[test]
    fn advance_is_noop_within_interval() {
        let config = SimConfig::baseline();
        let mut rng = StdRng::seed_from_u64(1);
        let state = market_with("AAPL", Instrument::new(100.0, 110.0, 10, 0.02));

        let after = state.advance(t0() + Duration::seconds(30), &config, &mut rng);

        assert_eq!(after, state);
    }

    #[test]
    fn advance_steps_once_per_call() {
        let config = SimConfig::baseline();
        let mut rng = StdRng::seed_from_u64(1);
        let state = market_with("AAPL", Instrument::new(100.0, 110.0, 10, 0.02));

        let now = t0() + Duration::seconds(config.tick_interval_secs);
        let after = state.advance(now, &config, &mut rng);

        assert_eq!(after.instruments["AAPL"].price_history.len(), 2);
        assert_eq!(after.last_update, now);
    }

    #[test]
    fn advance_preserves_marquee() {
        let config = SimConfig::baseline();
        let mut rng = StdRng::seed_from_u64(1);
        let state = market_with("AAPL", Instrument::new(100.0, 110.0, 10, 0.02))
            .set_marquee("Welcome to the toy bank");

        let after = state.advance(t0() + Duration::minutes(2), &config, &mut rng);

        assert_eq!(after.marquee, "Welcome to the toy bank");
    }

    #[test]
    fn control_rejects_out_of_range_stability() {
        let state = market_with("AAPL", Instrument::new(100.0, 110.0, 10, 0.02));

        let result = state.apply_control(
            "AAPL",
            InstrumentControl {
                stability: Some(1.5),
                ..Default::default()
            },
        );

        assert_eq!(result, Err(BankError::StabilityOutOfRange(1.5)));
    }

    #[test]
    fn control_rejects_unknown_symbol() {
        let state = market_with("AAPL", Instrument::new(100.0, 110.0, 10, 0.02));

        let result = state.apply_control("MSFT", InstrumentControl::default());

        assert_eq!(result, Err(BankError::StockNotFound("MSFT".to_string())));
    }

    #[test]
    fn control_overrides_are_authoritative() {
        let state = market_with("AAPL", Instrument::new(100.0, 110.0, 10, 0.02));

        let updated = state
            .apply_control(
                "AAPL",
                InstrumentControl {
                    target: Some(55.0),
                    remaining: Some(3),
                    stability: Some(0.0),
                },
            )
            .unwrap();

        let instrument = &updated.instruments["AAPL"];
        assert_eq!(instrument.target, 55.0);
        assert_eq!(instrument.remaining_steps, 3);
        assert_eq!(instrument.stability, 0.0);
        // Price history untouched by an override
        assert_eq!(instrument.price_history, vec![100.0]);
    }

    #[test]
    fn price_of_unknown_symbol_fails() {
        let state = MarketState::new(t0());
        assert_eq!(
            state.price_of("AAPL"),
            Err(BankError::StockNotFound("AAPL".to_string()))
        );
    }
}

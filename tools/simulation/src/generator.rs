//! Seeded tick generator
//!
//! Walks a price through the trading sessions of each requested day at the
//! configured cadence. A fraction of steps is dropped at random so the
//! aggregation engine has gaps to fill. The book is always consistent:
//! bids strictly below the latest price, asks strictly above.

use lob_types::tick::{TickRecord, BOOK_DEPTH, DIRECTION_BUY, DIRECTION_SELL};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

const MIN_PRICE_TICK: i16 = 100;
const MAX_PRICE_TICK: i16 = 30_000;
const DIRECTION_UNKNOWN: u8 = 2;

/// Configuration for the tick generator.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Opening price of the first day, in ticks.
    pub start_price_tick: i16,
    /// Largest price move between consecutive records, in ticks.
    pub max_step_ticks: i16,
    /// Probability that a step is skipped.
    pub dropout_ratio: f64,
    /// Largest traded volume per record, in lots.
    pub max_volume: u16,
    /// Largest resting volume per book level, in lots.
    pub max_depth_volume: u16,
    /// Cadence in seconds.
    pub interval_secs: u16,
    /// Trading sessions as (open, close) seconds in day, both inclusive.
    pub sessions: Vec<(u16, u16)>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            start_price_tick: 1_000,
            max_step_ticks: 2,
            dropout_ratio: 0.05,
            max_volume: 200,
            max_depth_volume: 1_000,
            interval_secs: 3,
            sessions: vec![(9 * 3600 + 30 * 60, 11 * 3600 + 30 * 60), (13 * 3600, 15 * 3600)],
        }
    }
}

/// Deterministic tick generator.
pub struct TickGenerator {
    config: GeneratorConfig,
    rng: ChaCha8Rng,
    price_tick: i16,
}

impl TickGenerator {
    /// Create a generator with a deterministic seed.
    pub fn new(config: GeneratorConfig, seed: u64) -> Self {
        let price_tick = config.start_price_tick.clamp(MIN_PRICE_TICK, MAX_PRICE_TICK);
        Self {
            config,
            rng: ChaCha8Rng::seed_from_u64(seed),
            price_tick,
        }
    }

    pub fn price_tick(&self) -> i16 {
        self.price_tick
    }

    /// Absolute records for every session of one day, in time order.
    pub fn generate_day(&mut self, day: u8) -> Vec<TickRecord> {
        let interval = usize::from(self.config.interval_secs.max(1));
        let sessions = self.config.sessions.clone();
        let mut records = Vec::new();

        for (open, close) in sessions {
            for time_s in (open..=close).step_by(interval) {
                if self.rng.gen_bool(self.config.dropout_ratio) {
                    continue;
                }
                let mut record = self.next_record(day, time_s);
                record.sync = records.is_empty();
                records.push(record);
            }
        }
        records
    }

    /// Records for several days, concatenated.
    pub fn generate_days(&mut self, days: impl IntoIterator<Item = u8>) -> Vec<TickRecord> {
        days.into_iter()
            .flat_map(|day| self.generate_day(day))
            .collect()
    }

    fn next_record(&mut self, day: u8, time_s: u16) -> TickRecord {
        let step = self.config.max_step_ticks.max(0);
        let delta = self.rng.gen_range(-step..=step);
        self.price_tick = self
            .price_tick
            .saturating_add(delta)
            .clamp(MIN_PRICE_TICK, MAX_PRICE_TICK);
        let price = self.price_tick;

        let volume = self.rng.gen_range(0..=self.config.max_volume);
        let (trade_count, direction) = if volume == 0 {
            (0, DIRECTION_UNKNOWN)
        } else {
            let side = if self.rng.gen_bool(0.5) {
                DIRECTION_BUY
            } else {
                DIRECTION_SELL
            };
            (self.rng.gen_range(1..=20u8), side)
        };

        let depth = self.config.max_depth_volume.max(1);
        let mut record = TickRecord {
            day,
            time_s,
            price_tick: price,
            trade_count,
            turnover: u32::from(volume) * price as u32,
            volume,
            direction,
            ..Default::default()
        };
        for level in 0..BOOK_DEPTH {
            let offset = level as i16 + 1;
            record.bid_price_ticks[level] = price - offset;
            record.ask_price_ticks[level] = price + offset;
            record.bid_volumes[level] = self.rng.gen_range(1..=depth);
            record.ask_volumes[level] = self.rng.gen_range(1..=depth);
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_same_seed_same_output() {
        let a = TickGenerator::new(GeneratorConfig::default(), 42).generate_day(3);
        let b = TickGenerator::new(GeneratorConfig::default(), 42).generate_day(3);
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_seeds_different_output() {
        let a = TickGenerator::new(GeneratorConfig::default(), 1).generate_day(3);
        let b = TickGenerator::new(GeneratorConfig::default(), 2).generate_day(3);
        assert_ne!(a, b);
    }

    #[test]
    fn test_records_stay_inside_sessions() {
        let config = GeneratorConfig::default();
        let sessions = config.sessions.clone();
        let records = TickGenerator::new(config, 7).generate_day(12);

        assert!(!records.is_empty());
        assert!(records[0].sync);
        assert!(records.windows(2).all(|w| w[0].time_s < w[1].time_s));
        for r in &records {
            assert_eq!(r.day, 12);
            assert!(sessions.iter().any(|(o, c)| (*o..=*c).contains(&r.time_s)));
        }
    }

    #[test]
    fn test_book_is_consistent() {
        let records = TickGenerator::new(GeneratorConfig::default(), 9).generate_day(3);
        for r in &records {
            assert!(r.bid_price_ticks[0] < r.price_tick);
            assert!(r.ask_price_ticks[0] > r.price_tick);
            assert!(r.bid_price_ticks.windows(2).all(|w| w[0] > w[1]));
            assert!(r.ask_price_ticks.windows(2).all(|w| w[0] < w[1]));
            if r.volume == 0 {
                assert_eq!((r.trade_count, r.turnover), (0, 0));
            }
        }
    }

    #[test]
    fn test_no_dropout_gives_full_cadence() {
        let config = GeneratorConfig {
            dropout_ratio: 0.0,
            sessions: vec![(34_200, 34_259)],
            ..Default::default()
        };
        let records = TickGenerator::new(config, 0).generate_day(1);
        assert_eq!(records.len(), 20);
    }

    proptest! {
        #[test]
        fn prop_price_walk_respects_step_and_bounds(
            seed in any::<u64>(),
            max_step_ticks in 0i16..=20,
            dropout_ratio in 0.0f64..0.5,
        ) {
            let config = GeneratorConfig {
                max_step_ticks,
                dropout_ratio,
                sessions: vec![(34_200, 35_999)],
                ..Default::default()
            };
            let records = TickGenerator::new(config, seed).generate_day(2);

            prop_assert!(records.windows(2).all(|w| w[0].time_s < w[1].time_s));
            for w in records.windows(2) {
                prop_assert!((w[1].price_tick - w[0].price_tick).abs() <= max_step_ticks);
            }
            for r in &records {
                prop_assert!((MIN_PRICE_TICK..=MAX_PRICE_TICK).contains(&r.price_tick));
                prop_assert!(r.bid_price_ticks[0] < r.price_tick && r.price_tick < r.ask_price_ticks[0]);
            }
        }
    }
}

//! Snowflake ID Generator
//!
//! Time-ordered 64-bit ids.
//!
//! ```text
//! 63       22          12           0
//! +---------+-----------+------------+
//! | millis  | machine   | sequence   |
//! | (41)    | (10)      | (12)       |
//! +---------+-----------+------------+
//! ```

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

/// 2024-01-01T00:00:00Z
pub const DEFAULT_EPOCH_MS: u64 = 1_704_067_200_000;

const MACHINE_BITS: u64 = 10;
const SEQUENCE_BITS: u64 = 12;
const MACHINE_MASK: u64 = (1 << MACHINE_BITS) - 1;
const SEQUENCE_MASK: u64 = (1 << SEQUENCE_BITS) - 1;

#[derive(Debug, Default)]
struct State {
    last_ms: u64,
    sequence: u64,
}

/// Snowflake ID generator
#[derive(Debug)]
pub struct SnowflakeGenerator {
    epoch_ms: u64,
    machine_id: u64,
    state: Mutex<State>,
}

impl SnowflakeGenerator {
    pub fn new(machine_id: u16, epoch_ms: u64) -> Self {
        Self {
            epoch_ms,
            machine_id: u64::from(machine_id) & MACHINE_MASK,
            state: Mutex::new(State::default()),
        }
    }

    /// Generate a new id. Strictly increasing within this generator.
    pub fn generate(&self) -> i64 {
        let mut state = self.state.lock();

        // A clock that steps backwards keeps using the last observed millisecond.
        let mut now = now_ms().max(state.last_ms);

        if now == state.last_ms {
            state.sequence = (state.sequence + 1) & SEQUENCE_MASK;
            if state.sequence == 0 {
                while now <= state.last_ms {
                    std::hint::spin_loop();
                    now = now_ms();
                }
            }
        } else {
            state.sequence = 0;
        }
        state.last_ms = now;

        let elapsed = now.saturating_sub(self.epoch_ms);
        let id = (elapsed << (MACHINE_BITS + SEQUENCE_BITS))
            | (self.machine_id << SEQUENCE_BITS)
            | state.sequence;

        (id & i64::MAX as u64) as i64
    }

    /// Creation time encoded in `id`.
    pub fn timestamp_of(&self, id: i64) -> Option<DateTime<Utc>> {
        let millis = (id as u64 >> (MACHINE_BITS + SEQUENCE_BITS)) + self.epoch_ms;
        DateTime::<Utc>::from_timestamp_millis(i64::try_from(millis).ok()?)
    }
}

impl Default for SnowflakeGenerator {
    fn default() -> Self {
        Self::new(1, DEFAULT_EPOCH_MS)
    }
}

fn now_ms() -> u64 {
    u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn ids_are_strictly_increasing() {
        let gen = SnowflakeGenerator::default();
        let mut last = 0;
        for _ in 0..10_000 {
            let id = gen.generate();
            assert!(id > last);
            last = id;
        }
    }

    #[test]
    fn ids_are_unique_across_threads() {
        let gen = Arc::new(SnowflakeGenerator::default());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let gen = Arc::clone(&gen);
                std::thread::spawn(move || (0..2_000).map(|_| gen.generate()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(seen.insert(id));
            }
        }
    }

    #[test]
    fn timestamp_is_recoverable() {
        let gen = SnowflakeGenerator::new(7, DEFAULT_EPOCH_MS);
        let before = Utc::now().timestamp_millis();
        let ts = gen.timestamp_of(gen.generate()).unwrap().timestamp_millis();
        assert!(ts >= before && ts <= Utc::now().timestamp_millis());
    }
}

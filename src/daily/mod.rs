//! Date-seeded question of the day

mod selector;

pub use selector::{date_seed, select, DailyPick, DailyRng, INCREMENT, MODULUS, MULTIPLIER};

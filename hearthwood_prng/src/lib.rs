// Seeded random source for the colony simulation.
//
// xoshiro256++ (Blackman & Vigna) seeded through SplitMix64. The simulation
// never touches OS entropy or thread-local generators: every roll (tree
// growth, initial forest, worker spawning) is drawn from a `GameRng` that the
// sim owns and passes by `&mut` into the component that needs it. Two sims
// built from the same seed and fed the same commands stay in lockstep, which
// is what the scenario tests rely on.
//
// Sampling helpers are phrased in the vocabulary the sim uses: `chance(p)`
// for a Bernoulli roll, `index(len)` for picking among candidates, and
// `choose(slice)` for the common "pick one of these tiles" case.
//
// **Critical constraint: determinism.** The core generator uses integer
// arithmetic only. Float conversions happen after the integer draw and are
// bit-exact across platforms.

use serde::{Deserialize, Serialize};

/// xoshiro256++ generator, the only randomness source in the simulation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRng {
    s: [u64; 4],
}

impl GameRng {
    /// Create a generator from a 64-bit seed.
    ///
    /// The seed is expanded to the 256-bit state with SplitMix64, so nearby
    /// seeds (0, 1, 2, ...) still produce unrelated streams.
    pub fn new(seed: u64) -> Self {
        let mut sm = seed;
        Self {
            s: [
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
            ],
        }
    }

    /// Next raw 64-bit output.
    pub fn next_u64(&mut self) -> u64 {
        let result = self.s[0]
            .wrapping_add(self.s[3])
            .rotate_left(23)
            .wrapping_add(self.s[0]);
        let t = self.s[1] << 17;

        self.s[2] ^= self.s[0];
        self.s[3] ^= self.s[1];
        self.s[1] ^= self.s[2];
        self.s[0] ^= self.s[3];
        self.s[2] ^= t;
        self.s[3] = self.s[3].rotate_left(45);

        result
    }

    /// Uniform `f64` in `[0, 1)` built from the top 53 bits.
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Bernoulli roll: `true` with probability `p`.
    ///
    /// `p <= 0.0` never succeeds and `p >= 1.0` always does, so config values
    /// of exactly 0 or 1 can be used to switch a random mechanic off or on.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Uniform index in `[0, len)`. Returns 0 when `len` is 0.
    ///
    /// Rejection sampling keeps the result free of modulo bias.
    pub fn index(&mut self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }
        let range = len as u64;
        if range.is_power_of_two() {
            return (self.next_u64() & (range - 1)) as usize;
        }
        let threshold = range.wrapping_neg() % range;
        loop {
            let r = self.next_u64();
            if r >= threshold {
                return (r % range) as usize;
            }
        }
    }

    /// Pick one element uniformly, or `None` for an empty slice.
    ///
    /// An empty slice consumes no randomness.
    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let i = self.index(items.len());
        items.get(i)
    }
}

fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_stream() {
        let mut a = GameRng::new(7);
        let mut b = GameRng::new(7);
        for _ in 0..1000 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn adjacent_seeds_diverge() {
        let mut a = GameRng::new(1);
        let mut b = GameRng::new(2);
        assert_ne!(a.next_u64(), b.next_u64());
    }

    #[test]
    fn unit_float_stays_in_range() {
        let mut rng = GameRng::new(12345);
        for _ in 0..10_000 {
            let v = rng.next_f64();
            assert!((0.0..1.0).contains(&v), "next_f64 out of range: {v}");
        }
    }

    #[test]
    fn chance_extremes_are_exact() {
        let mut rng = GameRng::new(3);
        for _ in 0..200 {
            assert!(!rng.chance(0.0));
            assert!(rng.chance(1.0));
        }
    }

    #[test]
    fn chance_tracks_probability() {
        let mut rng = GameRng::new(42);
        let n = 20_000;
        let hits = (0..n).filter(|_| rng.chance(0.1)).count();
        let pct = hits as f64 / n as f64;
        assert!(
            (0.08..0.12).contains(&pct),
            "chance(0.1) should land near 10%, got {:.1}%",
            pct * 100.0
        );
    }

    #[test]
    fn index_covers_whole_range() {
        let mut rng = GameRng::new(555);
        let mut seen = [false; 7];
        for _ in 0..5_000 {
            let i = rng.index(7);
            assert!(i < 7, "index out of range: {i}");
            seen[i] = true;
        }
        assert!(seen.iter().all(|&s| s), "every index should be reachable");
    }

    #[test]
    fn index_of_empty_or_single_is_zero() {
        let mut rng = GameRng::new(9);
        let before = rng.clone();
        assert_eq!(rng.index(0), 0);
        assert_eq!(rng.index(1), 0);
        assert_eq!(rng, before, "degenerate ranges consume no randomness");
    }

    #[test]
    fn choose_returns_member_or_none() {
        let mut rng = GameRng::new(11);
        let empty: [u8; 0] = [];
        assert!(rng.choose(&empty).is_none());

        let items = [10, 20, 30];
        for _ in 0..100 {
            let picked = rng.choose(&items).copied();
            assert!(matches!(picked, Some(10 | 20 | 30)));
        }
    }

    #[test]
    fn state_survives_serialization() {
        let mut rng = GameRng::new(42);
        for _ in 0..50 {
            rng.next_u64();
        }
        let json = serde_json::to_string(&rng).unwrap();
        let mut restored: GameRng = serde_json::from_str(&json).unwrap();
        for _ in 0..50 {
            assert_eq!(rng.next_u64(), restored.next_u64());
        }
    }
}

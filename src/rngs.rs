// Copyright 2025 N. Dornseif
//
// Dual-licensed under Apache 2.0 and MIT terms.

//! Sources of raw 64-bit words fed into the conversions.
//! All implement the RNG interface.

use rand::{RngCore, SeedableRng};

/// General trait for word sources.
pub trait RNG {
    /// Initialize with specified seed.
    fn new(seed: u64) -> Self;
    /// Generate u64 and advance the state one step.
    fn next(&mut self) -> u64;
    /// Reset to inital state, equivalent to replacing with ::new(seed).
    fn reseed(&mut self, seed: u64);
}

/// The rand crates default RNG.
pub struct ReferenceRand {
    rng: rand::rngs::StdRng,
}

impl RNG for ReferenceRand {
    fn new(seed: u64) -> Self {
        ReferenceRand {
            rng: rand::rngs::StdRng::seed_from_u64(seed),
        }
    }

    fn next(&mut self) -> u64 {
        self.rng.next_u64()
    }

    fn reseed(&mut self, seed: u64) {
        self.rng = rand::rngs::StdRng::seed_from_u64(seed);
    }
}

// Xorshift PRNGs
pub mod xorshift {
    use super::RNG;

    /// xorshift64* with a fixed odd output multiplier.
    /// A zero seed is replaced by 1 since zero is a fixed point.
    #[derive(Debug, Copy, Clone)]
    pub struct XorShift64Star {
        state: u64,
    }

    impl RNG for XorShift64Star {
        fn new(seed: u64) -> Self {
            XorShift64Star {
                state: seed.max(1),
            }
        }

        fn next(&mut self) -> u64 {
            let mut x = self.state;
            x ^= x >> 12;
            x ^= x << 25;
            x ^= x >> 27;
            self.state = x;
            x.wrapping_mul(0x2545f4914f6cdd1d)
        }

        fn reseed(&mut self, seed: u64) {
            self.state = seed.max(1);
        }
    }
}

// Linear congruential generators
pub mod lcg {
    use super::RNG;

    /// Originaly designed by Donald Knuth.
    /// Low bits are weak, which the conversions mostly discard.
    #[derive(Debug, Copy, Clone)]
    pub struct Mmix {
        state: u64,
    }

    impl RNG for Mmix {
        fn new(seed: u64) -> Self {
            Mmix { state: seed }
        }

        fn next(&mut self) -> u64 {
            self.state = self.state.wrapping_mul(0x5851f42d4c957f2d);
            self.state = self.state.wrapping_add(0x14057b7ef767814f);
            self.state
        }

        fn reseed(&mut self, seed: u64) {
            self.state = seed;
        }
    }
}

/// Deterministic patterns for probing edge cases of the conversions.
/// None of these are random, statistical tests are expected to fail.
pub mod testgens {
    use super::RNG;

    /// Always zero. Hits the zero short-circuit or the
    /// largest leading zero count.
    pub struct OnlyZero {}
    impl RNG for OnlyZero {
        fn new(_seed: u64) -> Self {
            OnlyZero {}
        }

        fn next(&mut self) -> u64 {
            0
        }

        fn reseed(&mut self, _seed: u64) {}
    }

    /// Always u64::MAX, the value closest to the outer interval bound.
    pub struct OnlyOne {}
    impl RNG for OnlyOne {
        fn new(_seed: u64) -> Self {
            OnlyOne {}
        }

        fn next(&mut self) -> u64 {
            u64::MAX
        }

        fn reseed(&mut self, _seed: u64) {}
    }

    /// Cycles through 1 << 63, 1 << 62, ..., 1, 0.
    /// Every leading zero count from 0 to 64 is produced once per cycle.
    #[derive(Debug, Copy, Clone)]
    pub struct SingleBitWalk {
        position: u32,
    }
    impl RNG for SingleBitWalk {
        fn new(seed: u64) -> Self {
            SingleBitWalk {
                position: (seed % 65) as u32,
            }
        }

        fn next(&mut self) -> u64 {
            let word = 0x8000000000000000u64.checked_shr(self.position).unwrap_or(0);
            self.position = (self.position + 1) % 65;
            word
        }

        fn reseed(&mut self, seed: u64) {
            self.position = (seed % 65) as u32;
        }
    }

    /// Counts up from the seed. Small seeds stay in the region where
    /// a scaled conversion collapses everything to zero.
    #[derive(Debug, Copy, Clone)]
    pub struct Counter {
        state: u64,
    }
    impl RNG for Counter {
        fn new(seed: u64) -> Self {
            Counter { state: seed }
        }

        fn next(&mut self) -> u64 {
            let word = self.state;
            self.state = self.state.wrapping_add(1);
            word
        }

        fn reseed(&mut self, seed: u64) {
            self.state = seed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testgens::{Counter, SingleBitWalk};
    use super::*;

    #[test]
    fn reseed_restarts_sequence() {
        let mut a = ReferenceRand::new(7);
        let first: Vec<u64> = (0..8).map(|_| a.next()).collect();
        a.reseed(7);
        let second: Vec<u64> = (0..8).map(|_| a.next()).collect();
        assert_eq!(first, second);

        let mut x = xorshift::XorShift64Star::new(0);
        let y0 = x.next();
        x.reseed(0);
        assert_eq!(x.next(), y0);
        assert_ne!(y0, 0);
    }

    #[test]
    fn single_bit_walk_covers_every_leading_zero_count() {
        let mut walk = SingleBitWalk::new(0);
        let counts: Vec<u32> = (0..65).map(|_| walk.next().leading_zeros()).collect();
        assert_eq!(counts, (0..=64).collect::<Vec<u32>>());
        assert_eq!(walk.next(), 0x8000000000000000);
    }

    #[test]
    fn counter_wraps() {
        let mut c = Counter::new(u64::MAX);
        assert_eq!(c.next(), u64::MAX);
        assert_eq!(c.next(), 0);
    }

    #[test]
    fn mmix_matches_recurrence() {
        let mut m = lcg::Mmix::new(1);
        assert_eq!(
            m.next(),
            0x5851f42d4c957f2du64.wrapping_add(0x14057b7ef767814f)
        );
    }
}

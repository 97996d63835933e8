/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

/// Seed from which the Zobrist constants are derived.
const SEED: u64 = 0x5EED_C0FF_EE15_600D;

/// A pseudo-random number generator using the xoshiro256** algorithm.
///
/// Every method is `const`, so the generator can run at compile time.
/// See <https://prng.di.unimi.it/xoshiro256starstar.c>.
#[derive(Clone, Copy, Debug)]
pub struct XoShiRo([u64; 4]);

impl XoShiRo {
    /// Constructs a generator from the crate's fixed seed.
    #[inline(always)]
    pub const fn new() -> Self {
        Self::from_seed(SEED)
    }

    /// Constructs a generator whose state is expanded from `seed` with SplitMix64,
    /// as recommended by the xoshiro authors.
    pub const fn from_seed(seed: u64) -> Self {
        let mut state = [0; 4];
        let mut x = seed;
        let mut i = 0;
        while i < 4 {
            let (next, z) = splitmix64(x);
            state[i] = z;
            x = next;
            i += 1;
        }

        Self(state)
    }

    /// Returns the next number in the sequence along with the advanced generator.
    #[inline(always)]
    pub const fn next_const(self) -> (u64, Self) {
        let mut s = self.0;
        let result = s[1].wrapping_mul(5).rotate_left(7).wrapping_mul(9);
        let t = s[1] << 17;

        s[2] ^= s[0];
        s[3] ^= s[1];
        s[1] ^= s[2];
        s[0] ^= s[3];
        s[2] ^= t;
        s[3] = s[3].rotate_left(45);

        (result, Self(s))
    }

    /// Advances the generator in place and returns the next number.
    #[inline(always)]
    pub fn next_u64(&mut self) -> u64 {
        let (result, next) = self.next_const();
        *self = next;
        result
    }
}

impl Default for XoShiRo {
    #[inline(always)]
    fn default() -> Self {
        Self::new()
    }
}

/// One step of SplitMix64, returning `(next_state, output)`.
const fn splitmix64(state: u64) -> (u64, u64) {
    let next = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = next;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    (next, z ^ (z >> 31))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_is_reproducible() {
        let mut a = XoShiRo::new();
        let mut b = XoShiRo::new();
        for _ in 0..100 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn test_const_and_mutable_agree() {
        let mut rng = XoShiRo::from_seed(42);
        let (first, next) = XoShiRo::from_seed(42).next_const();
        let (second, _) = next.next_const();
        assert_eq!(rng.next_u64(), first);
        assert_eq!(rng.next_u64(), second);
        assert_ne!(first, second);
    }
}

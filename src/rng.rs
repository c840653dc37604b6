//! The `R` combinator's nondeterministic choice source.
//!
//! `R`'s reduction (§4.3) is a fair Bernoulli(0.5) pick between its two
//! captured arguments. The original leaves the actual coin-flip to the C++
//! standard library's PRNG; here it is made explicit and seedable — the
//! design note in spec.md §9 ("the seed must be injectable for deterministic
//! tests") is carried at the CLI layer via `--seed`. `rand`'s presence
//! elsewhere in the retrieval pack (`0xMiden-miden-vm`) grounds pulling it in
//! here rather than hand-rolling a PRNG.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub struct Coin {
    rng: StdRng,
}

impl Coin {
    pub fn from_seed(seed: u64) -> Self {
        Coin {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Coin {
            rng: StdRng::from_entropy(),
        }
    }

    /// `true` and `false` each with probability 1/2.
    pub fn flip(&mut self) -> bool {
        self.rng.gen_bool(0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_reproduces_same_sequence() {
        let mut a = Coin::from_seed(42);
        let mut b = Coin::from_seed(42);
        let seq_a: Vec<bool> = (0..50).map(|_| a.flip()).collect();
        let seq_b: Vec<bool> = (0..50).map(|_| b.flip()).collect();
        assert_eq!(seq_a, seq_b);
    }
}

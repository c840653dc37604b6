//! The evaluation memo cache (§4.2).
//!
//! Keyed on `Term::fingerprint_applied_to`, with the transitive-collapse
//! insert behavior straight out of `original_source/src/cache.cpp`:
//! `EvaluationCache::insert` follows the existing chain of cached values for
//! a key before deciding whether a fresh entry is needed, so a later lookup
//! never has to chase more than one hop.

use fxhash::FxBuildHasher;
use hashbrown::HashMap;

use crate::term::Term;

type FxHashMap<K, V> = HashMap<K, V, FxBuildHasher>;

#[derive(Default)]
pub struct EvaluationCache {
    inner: FxHashMap<String, Term>,
    pub hits: usize,
    pub misses: usize,
}

impl EvaluationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up `key`, counting the lookup towards the hit/miss stats
    /// surfaced in the end-of-program trace summary (§4.7).
    pub fn result(&mut self, key: &str) -> Option<Term> {
        match self.inner.get(key) {
            Some(v) => {
                self.hits += 1;
                Some(v.clone())
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Inserts `value` under `key`, collapsing through any existing chain of
    /// cached values first so every key resolves in a single hop (§4.2).
    /// `value` itself may be an un-forced thunk spine built out of other
    /// thunks, so its fingerprint is bounded the same way `eval`'s cache-key
    /// lookup is — a term can reference the same shared subterm from more
    /// than one place, making this serialization's size exponential in the
    /// number of references even though the underlying graph is compact.
    /// Hitting the fingerprint bound just means the chain isn't collapsed
    /// further, which only forgoes the one-hop optimization, not correctness.
    ///
    /// The hop count itself is also bounded: a value can fingerprint to a key
    /// that resolves back to an equivalent value under the same fingerprint
    /// (the self-applying thunks produced by something like the Ω combinator
    /// cache this way), which would otherwise chase the same entry forever.
    pub fn insert(&mut self, key: String, value: Term) {
        const CHAIN_FINGERPRINT_BUDGET: usize = 16_384;
        const MAX_CHAIN_HOPS: u32 = 64;

        // The original (`cache.cpp`) never stores a value under its own
        // fingerprint — that would just be a self-reference a later lookup
        // gains nothing from. Bounded the same way the chain-collapse walk
        // below is, since a self-referential value is exactly the shape that
        // makes the unbounded fingerprint blow up.
        if value.fingerprint_bounded(CHAIN_FINGERPRINT_BUDGET).as_deref() == Some(key.as_str()) {
            return;
        }

        let mut v = value;
        let mut hops = 0u32;
        while let Some(fp) = v.fingerprint_bounded(CHAIN_FINGERPRINT_BUDGET) {
            hops += 1;
            if hops > MAX_CHAIN_HOPS {
                break;
            }
            match self.inner.get(&fp) {
                Some(next) => v = next.clone(),
                None => break,
            }
        }
        self.inner.entry(key).or_insert(v);
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::Term;

    #[test]
    fn insert_then_result_round_trips() {
        let mut cache = EvaluationCache::new();
        cache.insert("KI".to_string(), Term::i());
        assert_eq!(cache.result("KI").unwrap().fingerprint(), "I");
        assert_eq!(cache.hits, 1);
        assert_eq!(cache.misses, 0);
    }

    #[test]
    fn miss_is_counted() {
        let mut cache = EvaluationCache::new();
        assert!(cache.result("nope").is_none());
        assert_eq!(cache.misses, 1);
    }

    #[test]
    fn insert_is_idempotent_for_existing_key() {
        let mut cache = EvaluationCache::new();
        cache.insert("K".to_string(), Term::i());
        cache.insert("K".to_string(), Term::k());
        assert_eq!(cache.result("K").unwrap().fingerprint(), "I");
    }

    #[test]
    fn insert_skips_a_self_referential_entry() {
        let mut cache = EvaluationCache::new();
        cache.insert("K".to_string(), Term::k());
        assert_eq!(cache.len(), 0);
        assert!(cache.result("K").is_none());
    }

    #[test]
    fn insert_collapses_through_an_existing_chain() {
        // insert(a, b); insert(c, <value fingerprinting to a>) must make
        // result(c) resolve all the way to b, not stop at a.
        let mut cache = EvaluationCache::new();
        cache.insert("a".to_string(), Term::k());
        cache.insert("c".to_string(), Term::var('a'));
        assert_eq!(cache.result("c").unwrap().fingerprint(), "K");
    }
}

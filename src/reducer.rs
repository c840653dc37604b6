//! The reduction engine: `eval(left, right)` dispatch, the `B`/`C`
//! optimization rewrites, the recursion budget, and the memoization gate
//! (§4.3). Grounded on `original_source/src/combinators.cpp`'s `eval()` —
//! same dispatch shape, same depth counter, same end-of-function cache-insert
//! gate — generalized from a bare free function into a method on an owned
//! `Interpreter` so the cache/trace/RNG are instance state rather than
//! process-wide statics (design note, spec.md §9), the way `nanoda`'s
//! `TypeChecker` owns its own caches instead of reaching for globals.

use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::{Mutex, RwLock};

use crate::cache::EvaluationCache;
use crate::config::Options;
use crate::errors::{invariant_violation, HofError};
use crate::rng::Coin;
use crate::term::{Callback, Tag, Term};
use crate::trace::{eval_event, TraceEvent, TraceHooks, TraceScope};

pub struct Interpreter {
    cache: RwLock<EvaluationCache>,
    depth: AtomicUsize,
    max_depth: usize,
    trace: RwLock<TraceHooks>,
    rng: Mutex<Coin>,
    sink: Mutex<Option<Box<dyn Write + Send>>>,
}

impl Interpreter {
    pub fn new(options: &Options) -> Self {
        let rng = match options.seed {
            Some(seed) => Coin::from_seed(seed),
            None => Coin::from_entropy(),
        };
        Interpreter {
            cache: RwLock::new(EvaluationCache::new()),
            depth: AtomicUsize::new(0),
            max_depth: options.max_depth,
            trace: RwLock::new(TraceHooks::disabled()),
            rng: Mutex::new(rng),
            sink: Mutex::new(None),
        }
    }

    pub fn set_trace(&mut self, trace: TraceHooks) {
        self.trace = RwLock::new(trace);
    }

    pub fn set_print_sink(&mut self, sink: Box<dyn Write + Send>) {
        self.sink = Mutex::new(Some(sink));
    }

    pub fn cache_stats(&self) -> (usize, usize) {
        let cache = self.cache.read();
        (cache.hits, cache.misses)
    }

    pub fn max_depth_seen(&self) -> usize {
        self.trace.read().max_depth_seen
    }

    pub fn emit(&self, event: TraceEvent) {
        self.trace.write().emit(event);
    }

    /// Repeatedly applies a well-formed `A` node until it stops being one —
    /// `A::apply()` run to exhaustion, used by the parser/driver (§4.6) once
    /// an application is complete. Forces regardless of the `is_thunk` flag:
    /// the flag only changes trace decoration, per §4.4.
    pub fn force_well_formed(&self, mut term: Term) -> Result<Term, HofError> {
        // Counts only this call's own forcing steps, reset on entry — a
        // program that legitimately performs more than `max_depth` top-level
        // forcing steps across its whole run (e.g. a church numeral driving
        // many `P` outputs) must not accumulate toward the same budget a
        // single divergent term would. Genuine non-termination from an
        // ever-growing thunk spine is instead caught by `eval`'s bounded
        // fingerprint once the term itself grows past budget.
        let mut steps = 0usize;
        while term.tag() == Tag::App {
            steps += 1;
            if steps >= self.max_depth {
                log::warn!("recursion budget exhausted after {} force steps", steps);
                return Err(HofError::StackDepthExceeded { depth: steps });
            }
            let (left, right) = term
                .app_children()
                .unwrap_or_else(|| invariant_violation("force_well_formed on an incomplete A"));
            let (left, right) = (left.clone(), right.clone());
            term = self.eval(&left, &right)?;
        }
        Ok(term)
    }

    /// The core dispatch (§4.3). Consults the memo cache, dispatches on
    /// `left`'s tag, and — unless the result is a `Capture` or the
    /// application's spine head is `R`/`P` — memoizes the result before
    /// returning it.
    pub fn eval(&self, left: &Term, right: &Term) -> Result<Term, HofError> {
        let current_depth = self.depth.load(Ordering::Relaxed);
        if current_depth >= self.max_depth {
            log::warn!("recursion budget exhausted at depth {}", current_depth);
            return Err(HofError::StackDepthExceeded {
                depth: current_depth,
            });
        }
        self.depth.fetch_add(1, Ordering::Relaxed);
        let depth_here = current_depth + 1;

        // A term shared via `Arc` in several places (a self-applying thunk
        // still wrapped in deferred `I`s, say) has a compact graph but an
        // exponential *printed* size, since fingerprinting expands every
        // reference in full. Bound the walk so that divergence shows up as
        // the same recursion-budget error instead of an unbounded stall.
        let fingerprint_budget = self.max_depth.saturating_mul(256).max(16_384);
        let key = match left.fingerprint_applied_to_bounded(right, fingerprint_budget) {
            Some(key) => key,
            None => {
                self.depth.fetch_sub(1, Ordering::Relaxed);
                log::warn!("recursion budget exhausted: term grew past the fingerprint budget");
                return Err(HofError::StackDepthExceeded {
                    depth: self.max_depth,
                });
            }
        };
        let cached = self.cache.write().result(&key);
        // Building the event unconditionally would fingerprint `left`/`right`
        // a second time (unbounded) purely for display, even with tracing
        // off — skip it unless something is actually listening.
        if self.trace.read().is_active() {
            self.emit(eval_event(left, right, depth_here, cached.is_some()));
        }

        let result = match cached {
            Some(v) => Ok(v),
            None => {
                let _scope = TraceScope::enter(&self.trace);
                self.dispatch(left, right)
            }
        };

        self.depth.fetch_sub(1, Ordering::Relaxed);

        if let Ok(v) = &result {
            let should_cache =
                v.tag() != Tag::Capture && left.tag() != Tag::P && left.tag() != Tag::R && {
                    left.tag() != Tag::App || !left.do_not_cache()
                };
            if should_cache {
                self.cache.write().insert(key, v.clone());
            }
        }
        result
    }

    fn dispatch(&self, left: &Term, right: &Term) -> Result<Term, HofError> {
        match left.tag() {
            Tag::I | Tag::Var => Ok(right.clone()),
            Tag::K => Ok(Term::capture(Callback::K, 1, vec![right.clone()])),
            Tag::S => Ok(Term::capture(Callback::S, 1, vec![right.clone()])),
            Tag::R => Ok(Term::capture(Callback::R, 1, vec![right.clone()])),
            Tag::P => self.apply_p(right),
            Tag::App => {
                // A::apply(x): force `left` by exactly one step, then apply
                // the result to `right`. Repeated forcing (if the one step
                // still leaves an App) happens through the recursive `eval`
                // call below seeing `Tag::App` again, the same way the
                // original's nested `eval` calls do it — not a local loop,
                // which would skip the depth/cache bookkeeping each step
                // needs.
                let (inner_left, inner_right) = left
                    .app_children()
                    .unwrap_or_else(|| invariant_violation("App dispatch on an incomplete A"));
                let (inner_left, inner_right) = (inner_left.clone(), inner_right.clone());
                let evaluate = self.eval(&inner_left, &inner_right)?;
                self.eval(&evaluate, right)
            }
            Tag::Capture => self.apply_capture(left, right),
            Tag::B | Tag::C => invariant_violation("B/C reached the dispatch head directly"),
        }
    }

    fn apply_p(&self, arg: &Term) -> Result<Term, HofError> {
        let forced = self.force_thunk(arg.clone())?;
        self.emit(TraceEvent::OutputStart);
        {
            let mut sink = self.sink.lock();
            if let Some(w) = sink.as_mut() {
                let _ = write!(w, "{}", forced.fingerprint());
                let _ = w.flush();
            }
        }
        self.emit(TraceEvent::OutputEnd);
        Ok(forced)
    }

    /// `P`'s forcing rule (§4.5): unlike the driver's `force_well_formed`,
    /// this only forces nodes the reducer itself built lazily (`is_thunk`),
    /// matching the original's `while (isThunk) toPrint = apply()` loop
    /// verbatim rather than forcing every well-formed application.
    fn force_thunk(&self, mut term: Term) -> Result<Term, HofError> {
        while term.is_thunk() {
            let (left, right) = term
                .app_children()
                .unwrap_or_else(|| invariant_violation("thunk application missing a child"));
            let (left, right) = (left.clone(), right.clone());
            term = self.eval(&left, &right)?;
        }
        Ok(term)
    }

    fn apply_capture(&self, capture: &Term, arg: &Term) -> Result<Term, HofError> {
        let (callback, args_to_capture, args) = capture
            .capture_parts()
            .unwrap_or_else(|| invariant_violation("apply_capture on a non-Capture term"));

        // Every Capture we construct already holds exactly `args_to_capture`
        // args at creation (K/R/S start with 1, B/C/the post-promotion S
        // start with 2) — `arg` here is always the one action-triggering
        // argument arriving on top of an already-full Capture, never a value
        // to accumulate.
        if args.len() < args_to_capture as usize {
            invariant_violation("capture received fewer args than its own args_to_capture");
        }

        match callback {
            Callback::K => Ok(args[0].clone()),
            Callback::R => {
                let choose_x = self.rng.lock().flip();
                Ok(if choose_x { args[0].clone() } else { arg.clone() })
            }
            // One-arg S: `arg` is the second application, which decides
            // (via the rewrite rules) whether S promotes to K/B/C or stays S.
            Callback::S if args.len() == 1 => self.promote_s(args[0].clone(), arg.clone()),
            Callback::S => {
                let x = &args[0];
                let y = &args[1];
                let z = arg;
                let first = self.eval(x, z)?;
                let second = self.thunk_or_cached(y, z)?;
                Ok(Term::app(first, second, true))
            }
            Callback::B => {
                let x = &args[0];
                let y = &args[1];
                let z = arg;
                let yz = self.thunk_or_cached(y, z)?;
                Ok(Term::app(x.clone(), yz, true))
            }
            Callback::C => {
                let x = &args[0];
                let y = &args[1];
                let z = arg;
                let first = self.eval(x, z)?;
                Ok(Term::app(first, y.clone(), true))
            }
        }
    }

    /// `y@z`: reuses an already-memoized result for that pair if one exists,
    /// otherwise defers the application as a thunk — the laziness that makes
    /// `S`'s second half (and `B`'s whole body) lazy per §4.3/§9. Uses the
    /// same bounded fingerprint as `eval` (§4.3): a deferred thunk built out
    /// of other deferred thunks is exactly the shape that makes a cache-key
    /// lookup here blow up the same way `eval`'s own lookup can.
    fn thunk_or_cached(&self, y: &Term, z: &Term) -> Result<Term, HofError> {
        let fingerprint_budget = self.max_depth.saturating_mul(256).max(16_384);
        match y.fingerprint_applied_to_bounded(z, fingerprint_budget) {
            Some(key) => match self.cache.write().result(&key) {
                Some(v) => Ok(v),
                None => Ok(Term::app(y.clone(), z.clone(), true)),
            },
            None => {
                log::warn!("recursion budget exhausted: thunk key grew past the fingerprint budget");
                Err(HofError::StackDepthExceeded {
                    depth: self.max_depth,
                })
            }
        }
    }

    /// The S-optimization rewrites (§4.3): fires when a 1-arg `S` capture is
    /// about to become a 2-arg one. `x` is the already-captured first
    /// argument, `y` the incoming second. Produces `K`/`B`/`C` captures in
    /// place of a plain `S` capture where the shape of `x`/`y` makes one of
    /// those combinators equivalent and cheaper to drive.
    fn promote_s(&self, x: Term, y: Term) -> Result<Term, HofError> {
        // Rule 1: S K y = I for every y (K discards its second application
        // regardless of what y reduces to).
        if x.tag() == Tag::K {
            self.emit(TraceEvent::Rewrite {
                from: format!("S({})({})", x.fingerprint(), y.fingerprint()),
                to: "I".to_string(),
            });
            return Ok(Term::i());
        }

        if let Some(p) = x.as_k_applied() {
            // x = A(K, p): S(Kp)y.
            if let Some(q) = y.as_k_applied() {
                // Rule 2: S(Kp)(Kq) = K(pq) (the k-optimization).
                let pq = Term::app(p.clone(), q.clone(), true);
                self.emit(TraceEvent::Rewrite {
                    from: format!("S(K{})(K{})", p.fingerprint(), q.fingerprint()),
                    to: format!("K({})", pq.fingerprint()),
                });
                return Ok(Term::capture(Callback::K, 1, vec![pq]));
            }
            if y.tag() == Tag::I {
                // Rule 3: S(Kp)I = p (the special-b-optimization).
                self.emit(TraceEvent::Rewrite {
                    from: format!("S(K{})I", p.fingerprint()),
                    to: p.fingerprint(),
                });
                return Ok(p.clone());
            }
            // Rule 4: S(Kp)y = B p y (the b-optimization).
            self.emit(TraceEvent::Rewrite {
                from: format!("S(K{})({})", p.fingerprint(), y.fingerprint()),
                to: format!("B({})({})", p.fingerprint(), y.fingerprint()),
            });
            return Ok(Term::capture(Callback::B, 2, vec![p.clone(), y]));
        }

        if let Some(q) = y.as_k_applied() {
            // Rule 5: Sx(Kq) = Cxq (the c-optimization).
            self.emit(TraceEvent::Rewrite {
                from: format!("S({})(K{})", x.fingerprint(), q.fingerprint()),
                to: format!("C({})({})", x.fingerprint(), q.fingerprint()),
            });
            return Ok(Term::capture(Callback::C, 2, vec![x, q.clone()]));
        }

        // Rule 6: no optimization applies; stay a plain 2-arg S capture.
        Ok(Term::capture(Callback::S, 2, vec![x, y]))
    }
}

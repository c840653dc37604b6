//! The combinator term model.
//!
//! A [`Term`] is an `Arc`-wrapped tagged variant, mirroring the shared,
//! reference-counted term DAG used by `nanoda::expr::Expr`: many parents may
//! point at the same subterm (a `Capture`'s stored argument, an `A` node's
//! children, a singleton combinator), and nothing here is ever cyclic —
//! rewrites only ever build new `A` nodes pointing at pre-existing children.

use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;

/// Which combinator a `Capture` is waiting to saturate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Callback {
    K,
    S,
    R,
    B,
    C,
}

impl Callback {
    fn letter(self) -> char {
        match self {
            Callback::K => 'K',
            Callback::S => 'S',
            Callback::R => 'R',
            Callback::B => 'B',
            Callback::C => 'C',
        }
    }
}

/// The tag of a `Term`, used for dispatch in the reducer without having to
/// match out the full payload every time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    I,
    K,
    S,
    B,
    C,
    P,
    R,
    Var,
    App,
    Capture,
}

#[derive(Clone)]
enum Inner {
    I,
    K,
    S,
    B,
    C,
    P,
    R,
    Var(char),
    /// `left`/`right` are `None` while the parser/driver is still reading an
    /// application's children off the source text — mirrors the original's
    /// nullable `m_left`/`m_right` on the `A` class rather than reusing a
    /// sentinel term, which would be ambiguous with a genuine child.
    App {
        left: Option<Term>,
        right: Option<Term>,
        is_thunk: bool,
    },
    Capture {
        callback: Callback,
        args_to_capture: u8,
        args: Vec<Term>,
    },
}

/// A node in the combinator term DAG. Cheaply `Clone`-able (an `Arc` bump);
/// equality for memoization purposes goes through [`Term::fingerprint`], not
/// `Arc` pointer identity — see the module docs.
#[derive(Clone)]
pub struct Term(Arc<Inner>);

impl PartialEq for Term {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.fingerprint() == other.fingerprint()
    }
}

static I_SINGLETON: Lazy<Term> = Lazy::new(|| Term(Arc::new(Inner::I)));
static K_SINGLETON: Lazy<Term> = Lazy::new(|| Term(Arc::new(Inner::K)));
static S_SINGLETON: Lazy<Term> = Lazy::new(|| Term(Arc::new(Inner::S)));
static B_SINGLETON: Lazy<Term> = Lazy::new(|| Term(Arc::new(Inner::B)));
static C_SINGLETON: Lazy<Term> = Lazy::new(|| Term(Arc::new(Inner::C)));
static P_SINGLETON: Lazy<Term> = Lazy::new(|| Term(Arc::new(Inner::P)));
static R_SINGLETON: Lazy<Term> = Lazy::new(|| Term(Arc::new(Inner::R)));

impl Term {
    pub fn i() -> Term {
        I_SINGLETON.clone()
    }

    pub fn k() -> Term {
        K_SINGLETON.clone()
    }

    pub fn s() -> Term {
        S_SINGLETON.clone()
    }

    pub fn b() -> Term {
        B_SINGLETON.clone()
    }

    pub fn c() -> Term {
        C_SINGLETON.clone()
    }

    pub fn p() -> Term {
        P_SINGLETON.clone()
    }

    pub fn r() -> Term {
        R_SINGLETON.clone()
    }

    pub fn var(ch: char) -> Term {
        Term(Arc::new(Inner::Var(ch)))
    }

    /// Builds a fully-formed application node. `is_thunk = true` marks a node
    /// synthesized by a lazy rewrite rather than one the parser read off the
    /// source text (invariant 1, §3: the flag only changes trace display,
    /// never the reduction itself).
    pub fn app(left: Term, right: Term, is_thunk: bool) -> Term {
        Term(Arc::new(Inner::App {
            left: Some(left),
            right: Some(right),
            is_thunk,
        }))
    }

    /// An `A` node with neither child filled in yet, as produced while the
    /// driver is midway through reading an application out of source text.
    pub fn empty_app() -> Term {
        Term(Arc::new(Inner::App {
            left: None,
            right: None,
            is_thunk: false,
        }))
    }

    pub fn capture(callback: Callback, args_to_capture: u8, args: Vec<Term>) -> Term {
        debug_assert!(args.len() <= args_to_capture as usize);
        Term(Arc::new(Inner::Capture {
            callback,
            args_to_capture,
            args,
        }))
    }

    pub fn tag(&self) -> Tag {
        match self.0.as_ref() {
            Inner::I => Tag::I,
            Inner::K => Tag::K,
            Inner::S => Tag::S,
            Inner::B => Tag::B,
            Inner::C => Tag::C,
            Inner::P => Tag::P,
            Inner::R => Tag::R,
            Inner::Var(_) => Tag::Var,
            Inner::App { .. } => Tag::App,
            Inner::Capture { .. } => Tag::Capture,
        }
    }

    pub fn is_thunk(&self) -> bool {
        matches!(self.0.as_ref(), Inner::App { is_thunk: true, .. })
    }

    /// The `left`/`right` children of an `A` node, if both slots are filled.
    pub fn app_children(&self) -> Option<(&Term, &Term)> {
        match self.0.as_ref() {
            Inner::App {
                left: Some(l),
                right: Some(r),
                ..
            } => Some((l, r)),
            _ => None,
        }
    }

    pub fn capture_parts(&self) -> Option<(Callback, u8, &[Term])> {
        match self.0.as_ref() {
            Inner::Capture {
                callback,
                args_to_capture,
                args,
            } => Some((*callback, *args_to_capture, args.as_slice())),
            _ => None,
        }
    }

    /// `A(Kq, _)` shape-match used by the S-optimization rewrites (§4.3):
    /// an application whose left child is the singleton `K`. Returns the
    /// right child (`q`/`p` in the spec's notation) on a match.
    pub fn as_k_applied(&self) -> Option<&Term> {
        let (left, right) = self.app_children()?;
        if left.tag() == Tag::K {
            Some(right)
        } else {
            None
        }
    }

    /// True iff this `A` node and every `A` in its (possibly still-growing)
    /// spine has both children filled in. Mirrors `A::isWellFormed` /
    /// invariant 1. Non-`A` terms are trivially well formed.
    pub fn is_well_formed_app(&self) -> bool {
        match self.0.as_ref() {
            Inner::App {
                left: Some(l),
                right: Some(r),
                ..
            } => l.is_well_formed_app() && r.is_well_formed_app(),
            Inner::App { .. } => false,
            _ => true,
        }
    }

    /// True iff the spine head of this application is `R` or `P` (§4.1) —
    /// used by the reducer to skip memoizing side-effecting/nondeterministic
    /// applications. Only meaningful on well-formed applications.
    pub fn do_not_cache(&self) -> bool {
        match self.app_children() {
            Some((left, _)) => match left.tag() {
                Tag::App => left.do_not_cache(),
                Tag::R | Tag::P => true,
                _ => false,
            },
            None => false,
        }
    }

    /// Descends into the first not-yet-well-formed `A` subtree and fills its
    /// first empty slot with `term`, per `A::addCombinator` (§4.1/4.6).
    /// Panics (an interpreter invariant break, §7.3) if called on an
    /// already-well-formed application.
    pub fn add_child(&mut self, term: Term) {
        let inner = Arc::make_mut(&mut self.0);
        let (left, right) = match inner {
            Inner::App { left, right, .. } => (left, right),
            _ => panic!("add_child called on a non-application term"),
        };
        match (left.as_mut(), right.as_mut()) {
            (Some(l), _) if !l.is_well_formed_app() => l.add_child(term),
            (None, _) => *left = Some(term),
            (Some(_), Some(r)) if !r.is_well_formed_app() => r.add_child(term),
            (Some(_), None) => *right = Some(term),
            (Some(_), Some(_)) => panic!("add_child called on an already well-formed application"),
        }
    }

    /// Canonical textual serialization used as the memoization key (§3).
    pub fn fingerprint(&self) -> String {
        let mut buf = String::new();
        self.write_fingerprint(&mut buf);
        buf
    }

    /// The cache key for `eval(self, arg)`: `fingerprint(self) ++
    /// fingerprint(arg)`, matching the original's `toStringApply` without
    /// its ANSI decoration.
    pub fn fingerprint_applied_to(&self, arg: &Term) -> String {
        let mut buf = self.fingerprint();
        arg.write_fingerprint(&mut buf);
        buf
    }

    /// Bounded single-term counterpart of [`fingerprint_applied_to_bounded`].
    pub fn fingerprint_bounded(&self, budget: usize) -> Option<String> {
        let mut buf = String::new();
        let mut remaining = budget;
        self.write_fingerprint_bounded(&mut buf, &mut remaining)?;
        Some(buf)
    }

    /// Like [`fingerprint_applied_to`], but bails out once the walk has
    /// visited more than `budget` nodes instead of finishing. A term shared
    /// via `Arc` in several places (e.g. a self-applying thunk still wrapped
    /// in deferred `I`s) has a compact graph but an exponential *number of
    /// references* to walk, since this serialization — like the original's
    /// `toString` — expands every reference in full rather than consulting
    /// a seen-set. Counting visited nodes (not output bytes) is what
    /// actually bounds the walk: thunked `App` nodes contribute no
    /// characters of their own, so a length budget alone would never catch
    /// a spine built entirely out of them. Returns `None` once the budget
    /// is exhausted, well before the walk would actually finish.
    pub fn fingerprint_applied_to_bounded(&self, arg: &Term, budget: usize) -> Option<String> {
        let mut buf = String::new();
        let mut remaining = budget;
        self.write_fingerprint_bounded(&mut buf, &mut remaining)?;
        arg.write_fingerprint_bounded(&mut buf, &mut remaining)?;
        Some(buf)
    }

    /// Decrements `*remaining` once per node visited; returns `None` once it
    /// hits zero, having stopped the walk at that point.
    fn write_fingerprint_bounded(&self, out: &mut String, remaining: &mut usize) -> Option<()> {
        *remaining = remaining.checked_sub(1)?;
        match self.0.as_ref() {
            Inner::App {
                left,
                right,
                is_thunk,
            } => {
                if !is_thunk {
                    out.push('A');
                }
                if let Some(l) = left {
                    l.write_fingerprint_bounded(out, remaining)?;
                }
                if let Some(r) = right {
                    r.write_fingerprint_bounded(out, remaining)?;
                }
                Some(())
            }
            Inner::Capture { callback, args, .. } => {
                out.push(callback.letter());
                for a in args {
                    a.write_fingerprint_bounded(out, remaining)?;
                }
                Some(())
            }
            _ => {
                self.write_fingerprint(out);
                Some(())
            }
        }
    }

    fn write_fingerprint(&self, out: &mut String) {
        match self.0.as_ref() {
            Inner::I => out.push('I'),
            Inner::K => out.push('K'),
            Inner::S => out.push('S'),
            Inner::B => out.push('B'),
            Inner::C => out.push('C'),
            Inner::P => out.push('P'),
            Inner::R => out.push('R'),
            Inner::Var(ch) => out.push(*ch),
            Inner::App {
                left,
                right,
                is_thunk,
            } => {
                if !is_thunk {
                    out.push('A');
                }
                if let Some(l) = left {
                    l.write_fingerprint(out);
                }
                if let Some(r) = right {
                    r.write_fingerprint(out);
                }
            }
            Inner::Capture { callback, args, .. } => {
                out.push(callback.letter());
                for a in args {
                    a.write_fingerprint(out);
                }
            }
        }
    }
}

impl fmt::Debug for Term {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.fingerprint())
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.fingerprint())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn singletons_share_identity() {
        assert!(Term::i().tag() == Tag::I);
        assert_eq!(Term::k().fingerprint(), "K");
    }

    #[test]
    fn app_fingerprint_matches_spec_forms() {
        let a = Term::app(Term::i(), Term::k(), false);
        assert_eq!(a.fingerprint(), "AIK");
        let thunk = Term::app(Term::i(), Term::k(), true);
        assert_eq!(thunk.fingerprint(), "IK");
    }

    #[test]
    fn capture_fingerprint_is_callback_then_args() {
        let cap = Term::capture(Callback::K, 1, vec![Term::i()]);
        assert_eq!(cap.fingerprint(), "KI");
    }

    #[test]
    fn do_not_cache_follows_spine_head() {
        let p_app = Term::app(Term::p(), Term::i(), false);
        assert!(p_app.do_not_cache());
        let nested = Term::app(p_app, Term::k(), true);
        assert!(nested.do_not_cache());
        let plain = Term::app(Term::k(), Term::i(), false);
        assert!(!plain.do_not_cache());
    }

    #[test]
    fn as_k_applied_matches_shape() {
        let t = Term::app(Term::k(), Term::i(), false);
        assert_eq!(t.as_k_applied().unwrap().tag(), Tag::I);
        assert!(Term::i().as_k_applied().is_none());
    }

    #[test]
    fn add_child_fills_open_slots_left_to_right() {
        let mut a = Term::empty_app();
        assert!(!a.is_well_formed_app());
        a.add_child(Term::k());
        assert!(!a.is_well_formed_app());
        a.add_child(Term::i());
        assert!(a.is_well_formed_app());
        assert_eq!(a.fingerprint(), "AKI");
    }

    #[test]
    fn add_child_descends_into_open_left_spine() {
        // A(A(K,_), _): outer right still open, inner still open.
        let mut inner = Term::empty_app();
        inner.add_child(Term::k());
        let mut outer = Term::empty_app();
        outer.add_child(inner);
        assert!(!outer.is_well_formed_app());
        outer.add_child(Term::s());
        assert!(!outer.is_well_formed_app());
        outer.add_child(Term::i());
        assert!(outer.is_well_formed_app());
        assert_eq!(outer.fingerprint(), "AAKSI");
    }
}

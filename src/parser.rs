//! The linear parser/driver (§4.6): scans a Hof program one character at a
//! time, building application trees into an evaluation list and folding the
//! list through `eval` every time its tail application becomes well-formed.
//! Grounded on `original_source/src/hof.cpp`'s `cppInterpreter` driver loop,
//! generalized from that file's fixed `I/K/S/V/P/R/A` alphabet to the spec's
//! "any other character becomes `Var`" rule.

use crate::errors::HofError;
use crate::reducer::Interpreter;
use crate::term::{Tag, Term};
use crate::trace::TraceEvent;

fn char_to_term(ch: char) -> Term {
    match ch {
        'I' => Term::i(),
        'K' => Term::k(),
        'S' => Term::s(),
        'P' => Term::p(),
        'R' => Term::r(),
        'A' => Term::empty_app(),
        other => Term::var(other),
    }
}

fn list_is_well_formed(list: &[Term]) -> bool {
    list.iter().all(|t| t.tag() != Tag::App || t.is_well_formed_app())
}

/// Runs the driver over `program`, returning the single resulting term.
/// Empty input returns `I` without touching the interpreter (the "print
/// nothing, exit 0" open-question resolution in spec.md §9).
pub fn drive(interp: &Interpreter, program: &str) -> Result<Term, HofError> {
    if program.is_empty() {
        return Ok(Term::i());
    }

    interp.emit(TraceEvent::ProgramStart {
        program: program.to_string(),
    });

    let mut list: Vec<Term> = Vec::new();

    for ch in program.chars() {
        let term = char_to_term(ch);

        if list.is_empty() {
            list.push(term);
            continue;
        }

        if term.tag() == Tag::App {
            match list.last_mut() {
                Some(last) if last.tag() == Tag::App && !last.is_well_formed_app() => {
                    last.add_child(term);
                }
                _ => list.push(term),
            }
            // An application marker just opened can never complete the list
            // in the same step that introduced it.
            continue;
        }

        let mut consumed = false;
        if let Some(last) = list.last_mut() {
            if last.tag() == Tag::App && !last.is_well_formed_app() {
                last.add_child(term.clone());
                consumed = true;
            }
        }

        if !list_is_well_formed(&list) {
            continue;
        }

        let mut iter = list.drain(..);
        let mut evaluate = iter.next().expect("list checked non-empty above");
        for next in iter {
            evaluate = interp.eval(&evaluate, &next)?;
        }
        if !consumed {
            evaluate = interp.eval(&evaluate, &term)?;
        }
        evaluate = interp.force_well_formed(evaluate)?;
        list = vec![evaluate];
    }

    if let Some(bad) = list
        .iter()
        .find(|t| t.tag() == Tag::App && !t.is_well_formed_app())
    {
        return Err(HofError::MalformedSource {
            detail: format!(
                "unterminated application (incomplete A, got `{}`)",
                bad.fingerprint()
            ),
        });
    }

    let (hits, misses) = interp.cache_stats();
    interp.emit(TraceEvent::ProgramEnd {
        cache_hits: hits,
        cache_misses: misses,
        max_depth: interp.max_depth_seen(),
    });

    Ok(list.into_iter().next().unwrap_or_else(Term::i))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Options;
    use std::io;
    use std::sync::{Arc, Mutex};

    #[derive(Clone)]
    struct SharedSink(Arc<Mutex<Vec<u8>>>);

    impl io::Write for SharedSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn run_to_term(program: &str) -> Term {
        let interp = Interpreter::new(&Options::default());
        drive(&interp, program).unwrap()
    }

    #[test]
    fn empty_program_yields_identity_without_touching_interpreter() {
        let interp = Interpreter::new(&Options::default());
        let result = drive(&interp, "").unwrap();
        assert_eq!(result.fingerprint(), "I");
        assert_eq!(interp.cache_stats(), (0, 0));
    }

    #[test]
    fn aki_parses_to_a_one_arg_k_capture() {
        let t = run_to_term("AKI");
        assert_eq!(t.fingerprint(), "KI");
    }

    #[test]
    fn unterminated_application_is_malformed() {
        let interp = Interpreter::new(&Options::default());
        let err = drive(&interp, "AK").unwrap_err();
        assert!(matches!(err, HofError::MalformedSource { .. }));
    }

    #[test]
    fn if_true_picks_first_branch_and_prints_it() {
        // KAPIAPK: K applied to (A P I) applied to (A P K) picks (P I).
        let buf = Arc::new(Mutex::new(Vec::new()));
        let mut interp = Interpreter::new(&Options::default());
        interp.set_print_sink(Box::new(SharedSink(buf.clone())));
        let result = drive(&interp, "KAPIAPK").unwrap();
        assert_eq!(result.fingerprint(), "I");
        assert_eq!(buf.lock().unwrap().as_slice(), b"I");
    }

    #[test]
    fn if_false_picks_second_branch() {
        // AKIAPIAPK: (A K I) applied to (A P I) applied to (A P K).
        let buf = Arc::new(Mutex::new(Vec::new()));
        let mut interp = Interpreter::new(&Options::default());
        interp.set_print_sink(Box::new(SharedSink(buf.clone())));
        let result = drive(&interp, "AKIAPIAPK").unwrap();
        assert_eq!(result.fingerprint(), "K");
        assert_eq!(buf.lock().unwrap().as_slice(), b"K");
    }

    #[test]
    fn church_two_applied_to_print_identity_prints_twice() {
        let buf = Arc::new(Mutex::new(Vec::new()));
        let mut interp = Interpreter::new(&Options::default());
        interp.set_print_sink(Box::new(SharedSink(buf.clone())));
        drive(&interp, "AASAASAKSKIPI").unwrap();
        assert_eq!(buf.lock().unwrap().as_slice(), b"II");
    }

    #[test]
    fn omega_combinator_exhausts_recursion_budget() {
        let mut options = Options::default();
        options.max_depth = 200;
        let interp = Interpreter::new(&options);
        let err = drive(&interp, "SIIAASII").unwrap_err();
        assert!(matches!(err, HofError::StackDepthExceeded { .. }));
    }
}

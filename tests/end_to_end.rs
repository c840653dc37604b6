//! End-to-end scenarios and fuzz-style termination check (spec §8).
//!
//! Exercises the crate only through its public `run`/`run_with` entry
//! points, the way a caller embedding the interpreter would, rather than
//! reaching into `Interpreter` internals the way the unit tests do.

use std::io;
use std::sync::{Arc, Mutex};

use hof::{run, run_with, HofError, Options};
use rand::Rng;

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

fn run_capturing(program: &str) -> (Result<hof::Term, HofError>, Vec<u8>) {
    let buf = Arc::new(Mutex::new(Vec::new()));
    let result = run(program, SharedSink(buf.clone()), false);
    let out = buf.lock().unwrap().clone();
    (result, out)
}

#[test]
fn scenario_1_print_identity() {
    let (result, out) = run_capturing("PI");
    assert!(result.is_ok());
    assert_eq!(out, b"I");
}

#[test]
fn scenario_2_if_then_else_true_branch() {
    let (result, out) = run_capturing("KAPIAPK");
    assert!(result.is_ok());
    assert_eq!(out, b"I");
}

#[test]
fn scenario_3_if_then_else_false_branch() {
    let (result, out) = run_capturing("AKIAPIAPK");
    assert!(result.is_ok());
    assert_eq!(out, b"K");
}

#[test]
fn scenario_4_church_two_applied_to_print_identity() {
    let (result, out) = run_capturing("AASAASAKSKIPI");
    assert!(result.is_ok());
    assert_eq!(out, b"II");
}

#[test]
fn scenario_5_church_three_applied_to_print_identity() {
    let (result, out) = run_capturing("AASAASAKSKAASAASAKSKIPI");
    assert!(result.is_ok());
    assert_eq!(out, b"III");
}

#[test]
fn scenario_6_r_picks_one_of_its_two_arguments() {
    let (result, out) = run_capturing("RAPIAPK");
    assert!(result.is_ok());
    assert!(out == b"I" || out == b"K");
}

#[test]
fn scenario_7_omega_terminates_with_stack_depth_exceeded() {
    let (result, out) = run_capturing("SIIAASII");
    assert!(matches!(result, Err(HofError::StackDepthExceeded { .. })));
    assert!(out.is_empty());
}

/// Invariant 9: two runs of an R-free program produce byte-identical output.
#[test]
fn r_free_program_is_deterministic_across_runs() {
    let program = "AASAASAKSKAASAASAKSKIPI";
    let (_, out_a) = run_capturing(program);
    let (_, out_b) = run_capturing(program);
    assert_eq!(out_a, out_b);
}

/// 100 random strings over {I,K,S,A,P,R}, length <= 100: `run` must always
/// terminate, either with a result or a recursion-budget error, never hang
/// or panic.
#[test]
fn random_programs_always_terminate() {
    let alphabet = [b'I', b'K', b'S', b'A', b'P', b'R'];
    let mut rng = rand::thread_rng();
    let mut options = Options::default();
    options.max_depth = 500;

    for _ in 0..100 {
        let len = rng.gen_range(0..=100);
        let program: String = (0..len)
            .map(|_| alphabet[rng.gen_range(0..alphabet.len())] as char)
            .collect();
        let buf = Arc::new(Mutex::new(Vec::new()));
        // Never propagate a panic out of the loop: a native fault on any one
        // generated string would otherwise abort the whole test silently.
        let _ = run_with(&program, SharedSink(buf), false, &options);
    }
}

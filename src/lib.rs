//! Hof: an interpreter for a minimal combinatory-logic language over the
//! alphabet `I K S P R A` (plus arbitrary characters for translated
//! programs). See the module docs in `term`, `reducer`, and `parser` for the
//! term model, reduction engine, and driver respectively.
#![forbid(unsafe_code)]

pub mod cache;
pub mod config;
pub mod errors;
pub mod parser;
pub mod reducer;
pub mod rng;
pub mod term;
pub mod trace;
pub mod translate;

use std::io::{self, Write};

pub use config::Options;
pub use errors::HofError;
pub use reducer::Interpreter;
pub use term::Term;

/// Runs `program` to completion, writing any `P`-printed bytes to `stdout`.
/// `verbose` turns on the stderr trace (§4.7) using the default ANSI-off
/// format; use [`run_with`] to pick a [`trace::TraceFormat`] or inject an
/// RNG seed.
pub fn run<W>(program: &str, stdout: W, verbose: bool) -> Result<Term, HofError>
where
    W: Write + Send + 'static,
{
    run_with(program, stdout, verbose, &Options::default())
}

/// The fuller entry point: same contract as [`run`], but takes an explicit
/// [`Options`] (recursion budget, RNG seed, trace format).
pub fn run_with<W>(
    program: &str,
    stdout: W,
    verbose: bool,
    options: &Options,
) -> Result<Term, HofError>
where
    W: Write + Send + 'static,
{
    let mut interp = Interpreter::new(options);
    interp.set_print_sink(Box::new(stdout));
    if verbose {
        interp.set_trace(trace::TraceHooks::enabled(
            Box::new(io::stderr()),
            options.trace,
        ));
    }
    parser::drive(&interp, program)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_executes_a_print_program() {
        let out = Vec::new();
        let result = run("PI", out, false);
        assert!(result.is_ok());
    }

    #[test]
    fn run_reports_stack_depth_exhaustion_for_omega() {
        let mut options = Options::default();
        options.max_depth = 200;
        let out = Vec::new();
        let result = run_with("SIIAASII", out, false, &options);
        assert!(matches!(result, Err(HofError::StackDepthExceeded { .. })));
    }
}

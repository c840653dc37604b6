//! Error types (§7). Three failure modes from the spec collapse into one
//! recoverable `HofError` plus a family of unrecoverable invariant-violation
//! helpers, the same split `nanoda::errors` draws between `NanodaErr` and its
//! `eprintln!` + `process::exit`/`panic!` helpers.

use std::fmt;

#[derive(Debug)]
pub enum HofError {
    /// Recursion budget exhausted (§4.3). The CLI maps this to exit code 2.
    StackDepthExceeded { depth: usize },
    /// A translator (§6.3) was fed input it cannot make sense of.
    MalformedSource { detail: String },
    Io(std::io::Error),
}

impl fmt::Display for HofError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            HofError::StackDepthExceeded { depth } => write!(
                f,
                "evaluation depth exceeded the recursion budget (reached {})",
                depth
            ),
            HofError::MalformedSource { detail } => write!(f, "malformed source: {}", detail),
            HofError::Io(e) => write!(f, "i/o error: {}", e),
        }
    }
}

impl std::error::Error for HofError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HofError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for HofError {
    fn from(e: std::io::Error) -> Self {
        HofError::Io(e)
    }
}

/// A genuine interpreter-invariant break (§7.3, mode 3): not something a
/// caller can recover from, so it aborts rather than returning a `Result`.
/// Used at dispatch sites that are unreachable unless `add_child`/well-
/// formedness checking above them already failed to catch a malformed term.
pub fn invariant_violation(what: &str) -> ! {
    panic!("hof interpreter invariant violated: {}", what);
}

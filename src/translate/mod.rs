//! Source translators (§6.3), external to the core evaluator: parenthesized
//! SKI and λ-calculus both compile down to Hof source text rather than being
//! interpreted directly.

pub mod ski;
pub mod lambda;

use std::fmt;

#[derive(Debug)]
pub struct TranslateError(pub String);

impl fmt::Display for TranslateError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for TranslateError {}

fn malformed(msg: impl Into<String>) -> TranslateError {
    TranslateError(msg.into())
}

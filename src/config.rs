//! Interpreter configuration, separated from the CLI's flag parsing the way
//! `nanoda::cli::Opt` is a thin shell around values the rest of the crate
//! actually consumes. Defaults mirror the original's hardcoded constants.

use crate::trace::TraceFormat;

#[derive(Debug, Clone)]
pub struct Options {
    /// Recursion depth at which `eval` aborts (§4.3). The original hardcodes
    /// 1000; kept configurable here since nothing in the spec pins the value.
    pub max_depth: usize,
    /// `None` seeds `R`'s coin from OS entropy; `Some` makes runs reproducible.
    pub seed: Option<u64>,
    pub trace: TraceFormat,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            max_depth: 1000,
            seed: None,
            trace: TraceFormat::None,
        }
    }
}

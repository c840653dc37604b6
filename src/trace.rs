//! Verbose trace hooks (§4.7). Grounded on the original's `Verbose` +
//! `SubEval` pair (`original_source/src/verbose.h`, `hof.cpp`) and on the
//! general shape of `nanoda::tracing`'s scoped-guard/event-stream split,
//! simplified down to the event set the spec actually calls for.

use std::io::Write;

use parking_lot::RwLock;

use crate::term::Term;

/// ANSI vs. plain trace rendering, grounded on `original_source/src/colors.cpp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceFormat {
    None,
    Bash,
}

impl TraceFormat {
    fn code(self, ansi: &'static str) -> &'static str {
        match self {
            TraceFormat::None => "",
            TraceFormat::Bash => ansi,
        }
    }

    fn cyan(self) -> &'static str {
        self.code("\u{1b}[96m")
    }
    fn green(self) -> &'static str {
        self.code("\u{1b}[92m")
    }
    fn yellow(self) -> &'static str {
        self.code("\u{1b}[93m")
    }
    fn red(self) -> &'static str {
        self.code("\u{1b}[91m")
    }
    fn reset(self) -> &'static str {
        self.code("\u{1b}[0m")
    }
}

#[derive(Debug)]
pub enum TraceEvent {
    ProgramStart { program: String },
    Eval {
        left: String,
        right: String,
        depth: usize,
        cached: bool,
    },
    Rewrite { from: String, to: String },
    OutputStart,
    OutputEnd,
    ProgramEnd {
        cache_hits: usize,
        cache_misses: usize,
        max_depth: usize,
    },
}

/// Holds the trace sink and the running prefix indentation. `None` means
/// tracing is off (`--verbose` was not passed); the reducer still calls
/// `TraceHooks::emit`, which is then a no-op, so call sites never need to
/// branch on whether tracing is enabled.
pub struct TraceHooks {
    sink: Option<Box<dyn Write + Send>>,
    format: TraceFormat,
    depth: usize,
    pub max_depth_seen: usize,
}

impl TraceHooks {
    pub fn disabled() -> Self {
        TraceHooks {
            sink: None,
            format: TraceFormat::None,
            depth: 0,
            max_depth_seen: 0,
        }
    }

    pub fn enabled(sink: Box<dyn Write + Send>, format: TraceFormat) -> Self {
        TraceHooks {
            sink: Some(sink),
            format,
            depth: 0,
            max_depth_seen: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.sink.is_some()
    }

    pub fn emit(&mut self, event: TraceEvent) {
        if let TraceEvent::Eval { depth, .. } = &event {
            if *depth > self.max_depth_seen {
                self.max_depth_seen = *depth;
            }
        }
        let Some(sink) = self.sink.as_mut() else {
            return;
        };
        let fmt = self.format;
        let indent = "  ".repeat(self.depth);
        let line = match event {
            TraceEvent::ProgramStart { program } => {
                format!("{}{}program{} {}", fmt.cyan(), indent, fmt.reset(), program)
            }
            TraceEvent::Eval {
                left,
                right,
                depth,
                cached,
            } => format!(
                "{}{}eval{}({})({}) depth={}{}",
                fmt.green(),
                indent,
                fmt.reset(),
                left,
                right,
                depth,
                if cached { " [cached]" } else { "" }
            ),
            TraceEvent::Rewrite { from, to } => format!(
                "{}{}rewrite{} {} -> {}",
                fmt.yellow(),
                indent,
                fmt.reset(),
                from,
                to
            ),
            TraceEvent::OutputStart => {
                format!("{}{}output{}", fmt.blue_fallback(), indent, fmt.reset())
            }
            TraceEvent::OutputEnd => format!("{}{}/output{}", fmt.blue_fallback(), indent, fmt.reset()),
            TraceEvent::ProgramEnd {
                cache_hits,
                cache_misses,
                max_depth,
            } => format!(
                "{}{}done{} hits={} misses={} max_depth={}",
                fmt.red(),
                indent,
                fmt.reset(),
                cache_hits,
                cache_misses,
                max_depth
            ),
        };
        let _ = writeln!(sink, "{}", line);
    }

    pub(crate) fn push(&mut self) {
        self.depth += 1;
    }

    pub(crate) fn pop(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}

impl TraceFormat {
    fn blue_fallback(self) -> &'static str {
        self.code("\u{1b}[94m")
    }
}

/// RAII scope guard mirroring the original's `SubEval`: pushes one level of
/// indentation on entry, pops it on every exit path (including unwinding)
/// via `Drop`. Holds the lock itself rather than a write guard, since the
/// scope spans a recursive `eval` call that needs to take its own write
/// locks on `TraceHooks` along the way — holding one across that recursion
/// would deadlock on `parking_lot`'s non-reentrant `RwLock`.
pub struct TraceScope<'a> {
    trace: &'a RwLock<TraceHooks>,
}

impl<'a> TraceScope<'a> {
    pub fn enter(trace: &'a RwLock<TraceHooks>) -> Self {
        trace.write().push();
        TraceScope { trace }
    }
}

impl<'a> Drop for TraceScope<'a> {
    fn drop(&mut self) {
        self.trace.write().pop();
    }
}

pub fn eval_event(left: &Term, right: &Term, depth: usize, cached: bool) -> TraceEvent {
    TraceEvent::Eval {
        left: left.fingerprint(),
        right: right.fingerprint(),
        depth,
        cached,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_hooks_do_not_allocate_a_sink() {
        let mut hooks = TraceHooks::disabled();
        assert!(!hooks.is_active());
        hooks.emit(TraceEvent::OutputStart);
        assert_eq!(hooks.max_depth_seen, 0);
    }

    #[test]
    fn scope_pops_depth_on_drop() {
        let hooks = RwLock::new(TraceHooks::enabled(Box::new(Vec::new()), TraceFormat::None));
        {
            let _scope = TraceScope::enter(&hooks);
            assert_eq!(hooks.read().depth, 1);
        }
        assert_eq!(hooks.read().depth, 0);
    }

    #[test]
    fn max_depth_tracks_eval_events() {
        let mut hooks = TraceHooks::enabled(Box::new(Vec::new()), TraceFormat::None);
        hooks.emit(eval_event(&Term::i(), &Term::k(), 5, false));
        hooks.emit(eval_event(&Term::i(), &Term::k(), 3, false));
        assert_eq!(hooks.max_depth_seen, 5);
    }
}

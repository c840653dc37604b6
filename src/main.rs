#![forbid(unsafe_code)]

use std::io::{self, Write};
use std::process::ExitCode;

use structopt::StructOpt;

use hof::config::Options;
use hof::errors::HofError;
use hof::trace::TraceFormat;

mod cli;

use cli::{CliError, Opt, SourceForm};

fn main() -> ExitCode {
    env_logger::init();
    let opt = Opt::from_args();

    if opt.debug {
        eprintln!("CLI returned these arguments: {:#?}", opt);
    }

    match run(&opt) {
        Ok(()) => ExitCode::SUCCESS,
        Err(Failure::Usage(msg)) => {
            eprintln!("error: {}", msg);
            ExitCode::from(1)
        }
        Err(Failure::Hof(HofError::StackDepthExceeded { depth })) => {
            eprintln!(
                "error: evaluation exceeded the recursion budget (depth {})",
                depth
            );
            ExitCode::from(2)
        }
        Err(Failure::Hof(e)) => {
            eprintln!("error: {}", e);
            ExitCode::from(1)
        }
    }
}

enum Failure {
    Usage(String),
    Hof(HofError),
}

impl From<CliError> for Failure {
    fn from(e: CliError) -> Self {
        Failure::Usage(e.0)
    }
}

impl From<HofError> for Failure {
    fn from(e: HofError) -> Self {
        Failure::Hof(e)
    }
}

fn run(opt: &Opt) -> Result<(), Failure> {
    let (raw, form) = opt.resolve_source()?;

    let translated = match form {
        SourceForm::Hof => raw,
        SourceForm::Ski => hof::translate::ski::translate(&raw)
            .map_err(|e| Failure::Usage(e.to_string()))?,
        SourceForm::Lambda => hof::translate::lambda::translate(&raw)
            .map_err(|e| Failure::Usage(e.to_string()))?,
    };

    if opt.translate.is_some() && opt.file.is_none() {
        // `--translate` without `--file` short-circuits: print the
        // translated source and stop, matching `main_hof.cpp`'s `isTranslate`
        // branch (file suffix-sniffing runs the program instead).
        println!("{}", translated);
        return Ok(());
    }

    let mut program = cli::strip_whitespace(&translated);
    if let Some(extra) = &opt.input {
        program.push_str(&cli::strip_whitespace(extra));
    }

    let options = Options {
        max_depth: 1000,
        seed: opt.seed,
        trace: TraceFormat::Bash,
    };

    hof::run_with(&program, io::stdout(), opt.verbose, &options)?;

    if !opt.verbose {
        let mut stdout = io::stdout();
        let _ = writeln!(stdout);
    }

    Ok(())
}

//! Command-line flag parsing, kept as a thin shell around `hof::Options`
//! the way `nanoda::cli::Opt` is a thin shell around the values the rest of
//! the crate consumes. Grounded on `nanoda::cli::Opt`'s `structopt` usage and
//! on `original_source/src/main_hof.cpp`'s flag set and suffix-sniffing
//! translator dispatch.

use std::fs;
use std::path::PathBuf;

use structopt::StructOpt;

#[derive(StructOpt, Debug)]
#[structopt(setting = structopt::clap::AppSettings::ColoredHelp)]
#[structopt(
    name = "hof",
    about = "Interpreter for the Hof combinatory-logic language",
    author = "ammkrn <ammkrn@tuta.io>",
    version = "0.1.0"
)]
pub struct Opt {
    #[structopt(short = "d", long = "debug")]
    pub debug: bool,

    /// Hof (or `.ski`/`.lambda`) file to run. Mutually exclusive with
    /// `--program`; exactly one of the two is required.
    #[structopt(long = "file", parse(from_os_str))]
    pub file: Option<PathBuf>,

    /// Hof source given directly on the command line.
    #[structopt(long = "program")]
    pub program: Option<String>,

    /// Extra Hof source appended to the program after whitespace removal.
    #[structopt(long = "input")]
    pub input: Option<String>,

    /// Print the interpreter's step-by-step trace to stderr.
    #[structopt(short = "v", long = "verbose")]
    pub verbose: bool,

    /// Translate from (ski|lambda) to Hof source and print the result
    /// instead of executing it.
    #[structopt(long = "translate")]
    pub translate: Option<String>,

    /// Seed the `R` combinator's coin for reproducible runs.
    #[structopt(long = "seed")]
    pub seed: Option<u64>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum SourceForm {
    Hof,
    Ski,
    Lambda,
}

impl Opt {
    /// Resolves the requested program's raw text and the source form it was
    /// written in — matching `main_hof.cpp`'s `QFileInfo::suffix()`
    /// dispatch, which suffix-sniffs only for `--file` and otherwise trusts
    /// `--translate`. Translation and whitespace-stripping happen afterward,
    /// in that order, matching the original's own sequencing.
    pub fn resolve_source(&self) -> Result<(String, SourceForm), CliError> {
        match (&self.file, &self.program) {
            (Some(_), Some(_)) | (None, None) => {
                Err(CliError("exactly one of --file or --program is required".into()))
            }
            (Some(path), None) => {
                let text = fs::read_to_string(path)
                    .map_err(|e| CliError(format!("could not read {}: {}", path.display(), e)))?;
                let form = match path.extension().and_then(|e| e.to_str()) {
                    Some("ski") => SourceForm::Ski,
                    Some("lambda") => SourceForm::Lambda,
                    _ => self.translate_form()?.unwrap_or(SourceForm::Hof),
                };
                Ok((text, form))
            }
            (None, Some(text)) => Ok((text.clone(), self.translate_form()?.unwrap_or(SourceForm::Hof))),
        }
    }

    fn translate_form(&self) -> Result<Option<SourceForm>, CliError> {
        match self.translate.as_deref() {
            None => Ok(None),
            Some("ski") => Ok(Some(SourceForm::Ski)),
            Some("lambda") => Ok(Some(SourceForm::Lambda)),
            Some(other) => Err(CliError(format!(
                "--translate must be `ski` or `lambda`, got `{}`",
                other
            ))),
        }
    }
}

/// `program.simplified(); program.replace(" ", "")` in the original: collapse
/// all whitespace runs, then drop what's left. Implemented directly as "drop
/// every whitespace character" since that is the observable end result.
pub fn strip_whitespace(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

#[derive(Debug)]
pub struct CliError(pub String);

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for CliError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn opt_program(program: &str) -> Opt {
        Opt {
            debug: false,
            file: None,
            program: Some(program.to_string()),
            input: None,
            verbose: false,
            translate: None,
            seed: None,
        }
    }

    #[test]
    fn program_and_file_together_is_an_error() {
        let mut opt = opt_program("I");
        opt.file = Some(PathBuf::from("x.hof"));
        assert!(opt.resolve_source().is_err());
    }

    #[test]
    fn neither_program_nor_file_is_an_error() {
        let mut opt = opt_program("I");
        opt.program = None;
        assert!(opt.resolve_source().is_err());
    }

    #[test]
    fn whitespace_strip_drops_every_whitespace_character() {
        assert_eq!(strip_whitespace(" A K \n I "), "AKI");
    }

    #[test]
    fn translate_flag_selects_the_source_form() {
        let mut opt = opt_program("(S K I)");
        opt.translate = Some("ski".to_string());
        let (_, form) = opt.resolve_source().unwrap();
        assert_eq!(form, SourceForm::Ski);
    }

    #[test]
    fn unknown_translate_value_is_an_error() {
        let mut opt = opt_program("I");
        opt.translate = Some("brainfuck".to_string());
        assert!(opt.resolve_source().is_err());
    }
}

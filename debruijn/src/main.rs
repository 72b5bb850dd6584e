use anyhow::{anyhow, Result};
use ariadne::{Color, Fmt, Label, Report, ReportKind, Source};
use chumsky::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use util::repl;

use crate::{evaluator::EvalError, format::show, prelude::*, term::Term};

mod compiler;
mod evaluator;
mod format;
mod lang;
mod parser;
mod prelude;
mod term;

const DEFAULT_STEP_LIMIT: usize = 1000;
const DEMO_STEP_LIMIT: usize = 8;
// Every pass over a term recurses once per nesting level.
const STACK_SIZE: usize = 256 * 1024 * 1024;

const DEMO: &[&str] = &[
    "(λa a) λb b",
    "(λa λb b a)",
    "((λa λb b a) λc c)",
    "λa b",
    "(λa a",
    "λa a b",
    "(λx λy x) ((λa a) λb b) ((λc c) λd d)",
    "(λn λf λx f (n f x)) λf λx f (f x)",
    "(λx x x) λx x x",
];

fn build_report(e: Error<String>) -> Report {
    use chumsky::error::SimpleReason;
    let report = Report::build(ReportKind::Error, (), e.span().start);
    match e.reason() {
        SimpleReason::Unexpected => {
            let found = e.found().map(String::as_str).unwrap_or("end of the input");
            let expected = e
                .expected()
                .map(|t| t.as_ref().map(String::as_str).unwrap_or("end of the input"))
                .collect::<Vec<_>>()
                .join(", ");
            let expected = if expected.is_empty() {
                "something else"
            } else {
                &expected
            };
            report
                .with_message(format!("Unexpected {found}, expected {expected}",))
                .with_label(
                    Label::new(e.span())
                        .with_message(format!("Unexpected {}", found.fg(Color::Red)))
                        .with_color(Color::Red),
                )
        }
        SimpleReason::Unclosed { span, delimiter } => report
            .with_message(format!("Unclosed delimiter {}", delimiter.fg(Color::Yellow)))
            .with_label(
                Label::new(span.clone())
                    .with_message(format!(
                        "Unclosed delimiter {}",
                        delimiter.fg(Color::Yellow)
                    ))
                    .with_color(Color::Yellow),
            )
            .with_label(
                Label::new(e.span())
                    .with_message(format!(
                        "Must be closed before this {}",
                        e.found()
                            .map(String::as_str)
                            .unwrap_or("end of the input")
                            .fg(Color::Red)
                    ))
                    .with_color(Color::Red),
            ),
        SimpleReason::Custom(msg) => report.with_message(msg).with_label(
            Label::new(e.span())
                .with_message(format!("{}", msg.fg(Color::Red)))
                .with_color(Color::Red),
        ),
    }
    .finish()
}

#[derive(Debug)]
enum Failure<'a> {
    Syntax(&'a str, Vec<Error<String>>),
    Eval(EvalError),
}
impl From<EvalError> for Failure<'_> {
    fn from(e: EvalError) -> Self {
        Failure::Eval(e)
    }
}

type CommandResult<'a> = Result<(), Failure<'a>>;

fn parse(input: &str) -> Result<Term, Failure> {
    parser::parse(input).map_err(|es| Failure::Syntax(input, es))
}

struct Settings {
    /// `None` lets evaluation run until a normal form, possibly forever.
    step_limit: Option<usize>,
    /// Print every intermediate term while evaluating.
    verbose: bool,
}
impl Default for Settings {
    fn default() -> Self {
        Self {
            step_limit: Some(DEFAULT_STEP_LIMIT),
            verbose: false,
        }
    }
}

#[derive(Default)]
struct Repl {
    settings: Settings,
}
impl Repl {
    fn tokenize(input: &str) -> CommandResult {
        let tokens = parser::lexer()
            .parse(input)
            .map_err(|es| {
                Failure::Syntax(
                    input,
                    es.into_iter().map(|e| e.map(|e| e.to_string())).collect(),
                )
            })?
            .iter()
            .map(Spanned::value)
            .cloned()
            .collect::<Vec<_>>();
        println!("{tokens:?}");
        Ok(())
    }

    fn parse(input: &str) -> CommandResult {
        let term = parser::parse_term(input).map_err(|es| Failure::Syntax(input, es))?;
        println!("{term}");
        Ok(())
    }

    fn compile(input: &str) -> CommandResult {
        let term = parse(input)?;
        println!("{term}");
        Ok(())
    }

    fn step(input: &str) -> CommandResult {
        let term = parse(input)?;
        match evaluator::reduce_step(&term) {
            Some(next) => println!("{next}"),
            None => println!("{term} is in normal form"),
        }
        Ok(())
    }

    fn trace(term: &Term, limit: Option<usize>) -> Result<(), EvalError> {
        println!("    {}", show(term));
        let mut last = term.clone();
        for (i, next) in evaluator::steps(term).enumerate() {
            if let Some(limit) = limit.filter(|&limit| i >= limit) {
                return Err(EvalError::StepLimitExceeded { limit, term: last });
            }
            println!("{:>3} {}", i + 1, show(&next));
            last = next;
        }
        Ok(())
    }

    fn evaluate<'i>(&self, input: &'i str) -> CommandResult<'i> {
        let term = parse(input)?;
        if self.settings.verbose {
            Self::trace(&term, self.settings.step_limit)?;
        } else {
            let normalized = evaluator::normalize(&term, self.settings.step_limit)?;
            info!(steps = normalized.steps, "reached a normal form");
            println!("{}", normalized.term);
        }
        Ok(())
    }

    fn set_limit(&mut self, input: &str) {
        match input.trim() {
            "off" => self.settings.step_limit = None,
            arg => match arg.parse() {
                Ok(limit) => self.settings.step_limit = Some(limit),
                Err(e) => eprintln!("Invalid step limit `{arg}`: {e}"),
            },
        }
        match self.settings.step_limit {
            Some(limit) => println!("Step limit: {limit}"),
            None => println!("Step limit: off"),
        }
    }

    fn set_verbose(&mut self, input: &str) {
        match input.trim() {
            "on" => self.settings.verbose = true,
            "off" => self.settings.verbose = false,
            arg => eprintln!("Expected `on` or `off`, found `{arg}`"),
        }
        println!("Verbose: {}", if self.settings.verbose { "on" } else { "off" });
    }

    fn demo() -> Result<()> {
        for input in DEMO {
            println!("> {input}");
            match parse(input) {
                Ok(term) => {
                    if let Err(e) = Self::trace(&term, Some(DEMO_STEP_LIMIT)) {
                        println!("{e}");
                    }
                }
                Err(failure) => report(failure)?,
            }
            println!();
        }
        Ok(())
    }

    fn show_help() {
        println!(
            "{}",
            r#"
term                -- same as :evaluate term
:tokenize   term    -- show the token stream
:parse      term    -- show the surface syntax tree
:compile    term    -- show the de Bruijn term
:step       term    -- apply one reduction step
:trace      term    -- show every step down to the normal form
:evaluate   term    -- show the normal form
:limit      N|off   -- set the step limit
:verbose    on|off  -- show intermediate terms while evaluating
:demo               -- run the built-in examples
:help               -- show this message

Binders are written `λ` or `\`, variables are single letters a-z.
Terms in de Bruijn notation (`λλ1 0`) are accepted too.
        "#
            .trim()
        );
    }

    fn handle_repl_input<'i>(&mut self, input: &'i str) -> Result<CommandResult<'i>> {
        let (cmd, input) = if let Some(stripped) = input.strip_prefix(':') {
            stripped
                .trim_start()
                .split_once(' ')
                .unwrap_or((stripped, ""))
        } else {
            ("", input)
        };
        Ok(match cmd {
            "to" | "tokenize" => Self::tokenize(input),
            "p" | "parse" => Self::parse(input),
            "c" | "compile" => Self::compile(input),
            "s" | "step" => Self::step(input),
            "tr" | "trace" => parse(input)
                .and_then(|term| Ok(Self::trace(&term, self.settings.step_limit)?)),
            "" | "e" | "eval" | "evaluate" => self.evaluate(input),
            "l" | "limit" => {
                self.set_limit(input);
                Ok(())
            }
            "v" | "verbose" => {
                self.set_verbose(input);
                Ok(())
            }
            "d" | "demo" => {
                Self::demo()?;
                Ok(())
            }
            "h" | "he" | "hel" | "help" => {
                Self::show_help();
                Ok(())
            }
            _ => {
                eprintln!("Unknown command {cmd}");
                Self::show_help();
                Ok(())
            }
        })
    }
}

fn report(failure: Failure) -> Result<()> {
    match failure {
        Failure::Syntax(input, es) => {
            for e in es {
                build_report(e).eprint(Source::from(input))?;
            }
        }
        Failure::Eval(e) => eprintln!("Error: {e}"),
    }
    Ok(())
}

impl repl::Repl for Repl {
    type Error = anyhow::Error;
    const HISTORY: Option<&'static str> = Some("/tmp/debruijn.history");
    const PROMPT: &'static str = "λ> ";
    fn evaluate(&mut self, input: String) -> Result<(), Self::Error> {
        if input.trim().is_empty() {
            return Ok(());
        }
        if let Err(failure) = self.handle_repl_input(&input)? {
            report(failure)?;
        }
        Ok(())
    }
}

fn run() -> Result<()> {
    let mut repl = Repl::default();
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    if !args.is_empty() {
        for arg in args {
            repl::Repl::evaluate(&mut repl, arg)?;
        }
        return Ok(());
    }
    info!("starting the REPL");
    println!("Hi, this is an untyped lambda calculus REPL. :h to show help");
    println!();
    repl::start_repl(repl)?;
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
    std::thread::Builder::new()
        .stack_size(STACK_SIZE)
        .spawn(run)?
        .join()
        .map_err(|_| anyhow!("The evaluator thread panicked"))?
}

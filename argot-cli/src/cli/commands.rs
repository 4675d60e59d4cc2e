//! The toolbox container and the glue that dispatches into it.

use std::io::{self, Write};

use argot_core::{
    Annotation, Arguments, BoxError, Callable, Coercion, Container, DispatchError,
    DispatchErrorCode, Function, Role, SpecError, SpecErrorCode, Synthesizer, Value,
};
use thiserror::Error;
use tracing::{Span, field, info, instrument};

/// Program name shown in usage lines.
pub const PROGRAM: &str = "argot";

/// Errors surfaced while executing CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// A toolbox command could not be turned into a grammar.
    #[error("toolbox definition is invalid: {0}")]
    Definition(#[from] SpecError),
    /// Parsing or running the command failed.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

impl CliError {
    /// Stable code of the underlying dispatch failure, if any.
    #[must_use]
    pub const fn dispatch_code(&self) -> Option<DispatchErrorCode> {
        match self {
            Self::Dispatch(err) => Some(err.code()),
            Self::Definition(_) => None,
        }
    }

    /// Stable code of the underlying construction failure, if any.
    #[must_use]
    pub const fn spec_code(&self) -> Option<SpecErrorCode> {
        match self {
            Self::Definition(err) => Some(err.code()),
            Self::Dispatch(err) => err.spec_code(),
        }
    }
}

/// Builds the container exposing `greet`, `sum`, `echo`, and `env`.
///
/// # Errors
/// Returns [`SpecError`] if one of the command signatures is malformed.
///
/// # Examples
/// ```
/// use argot_cli::cli::toolbox;
///
/// let toolbox = toolbox()?;
/// assert_eq!(
///     toolbox.command_names().collect::<Vec<_>>(),
///     ["greet", "sum", "echo", "env"],
/// );
/// # Ok::<(), argot_core::SpecError>(())
/// ```
pub fn toolbox() -> Result<Container, SpecError> {
    Ok(Container::builder(PROGRAM)
        .description("Demonstration commands dispatched by the argot engine.")
        .command("greet", greet()?)
        .command("sum", sum()?)
        .command("echo", echo()?)
        .command("env", env()?)
        .build())
}

fn greet() -> Result<Function, SpecError> {
    let signature = argot_core::Signature::builder()
        .param("name")
        .param_with_default("greeting", "Hello")
        .param_with_default("shout", false)
        .annotate("name", "who to greet")
        .annotate(
            "greeting",
            Annotation::new("salutation to use")
                .with_role(Role::Option)
                .with_abbrev('g'),
        )
        .annotate("shout", ("print in capitals", Role::Flag, Some('s')))
        .build()?;
    Ok(Function::builder("greet", signature, |args: Arguments| {
        let greeting = args.text("greeting").unwrap_or("Hello");
        let name = args.text("name").unwrap_or_default();
        let line = format!("{greeting} {name}");
        let shout = args.get("shout").and_then(Value::as_bool).unwrap_or(false);
        Ok(Value::from(if shout { line.to_uppercase() } else { line }))
    })
    .description("Greet someone.")
    .build())
}

fn sum() -> Result<Function, SpecError> {
    let signature = argot_core::Signature::builder()
        .varargs("numbers")
        .annotate(
            "numbers",
            Annotation::new("numbers to add")
                .with_coercion(Coercion::float())
                .with_label("NUMBER"),
        )
        .build()?;
    Ok(Function::builder("sum", signature, |args: Arguments| {
        // `Iterator::sum` over no floats yields `-0.0`.
        let total = args
            .rest()
            .iter()
            .filter_map(Value::as_float)
            .fold(0.0, |acc, number| acc + number);
        Ok(Value::Float(total))
    })
    .description("Add numbers together.")
    .build())
}

fn echo() -> Result<Function, SpecError> {
    let signature = argot_core::Signature::builder()
        .param_with_default("upper", false)
        .varargs("words")
        .annotate("upper", ("convert to upper case", Role::Flag, Some('u')))
        .annotate("words", "words to print, one per line")
        .build()?;
    Ok(Function::builder("echo", signature, |args: Arguments| {
        let upper = args.get("upper").and_then(Value::as_bool).unwrap_or(false);
        let words = args
            .rest()
            .iter()
            .map(|word| {
                let text = word.to_string();
                Value::from(if upper { text.to_uppercase() } else { text })
            })
            .collect::<Vec<_>>();
        Ok(Value::List(words))
    })
    .description("Print words.")
    .build())
}

fn env() -> Result<Function, SpecError> {
    let signature = argot_core::Signature::builder()
        .param_with_default("prefix", "")
        .varkw("variables")
        .annotate(
            "prefix",
            Annotation::new("only show names starting with this")
                .with_role(Role::Option)
                .with_abbrev('p')
                .with_label("PREFIX"),
        )
        .build()?;
    Ok(Function::builder("env", signature, |args: Arguments| -> Result<Value, BoxError> {
        let prefix = args.text("prefix").unwrap_or_default();
        // Keywords arrive sorted by name.
        let selected: Vec<Value> = args
            .keywords()
            .iter()
            .filter(|(name, _)| name.starts_with(prefix))
            .map(|(name, value)| Value::from(format!("{name}={value}")))
            .collect();
        Ok(Value::List(selected))
    })
    .description("Show NAME=VALUE pairs.")
    .build())
}

/// Dispatches `tokens` against the toolbox and returns the output lines.
///
/// # Errors
/// Returns [`CliError`] when the toolbox is malformed or the dispatch fails,
/// including help requests (see [`DispatchError::is_display_request`]).
///
/// # Examples
/// ```
/// use argot_cli::cli::run_cli;
///
/// assert_eq!(run_cli(["greet", "World"])?, ["Hello World"]);
/// assert_eq!(run_cli(["sum", "1", "2.5"])?, ["3.5"]);
/// # Ok::<(), argot_cli::cli::CliError>(())
/// ```
#[instrument(
    name = "cli.run",
    skip(tokens),
    fields(command = field::Empty),
)]
pub fn run_cli<I, S>(tokens: I) -> Result<Vec<String>, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let tokens: Vec<String> = tokens.into_iter().map(Into::into).collect();
    if let Some(first) = tokens.first() {
        Span::current().record("command", field::display(first));
    }

    let synth = Synthesizer::builder().with_program(PROGRAM).build();
    let toolbox = Callable::from(toolbox()?);
    let output = synth.run(&toolbox, tokens)?;
    info!(lines = output.len(), "command completed");
    Ok(output)
}

/// Writes each output line to `writer`.
///
/// # Errors
/// Returns [`io::Error`] if writing to the supplied writer fails.
///
/// # Examples
/// ```
/// use std::io::Cursor;
///
/// use argot_cli::cli::render_output;
///
/// let mut buffer = Cursor::new(Vec::new());
/// render_output(&["a".to_owned(), "b".to_owned()], &mut buffer)?;
/// assert_eq!(buffer.into_inner(), b"a\nb\n");
/// # Ok::<(), std::io::Error>(())
/// ```
pub fn render_output(lines: &[String], mut writer: impl Write) -> io::Result<()> {
    for line in lines {
        writeln!(writer, "{line}")?;
    }
    Ok(())
}

//! Unit tests for the toolbox commands and output rendering.

use super::{CliError, PROGRAM, render_output, run_cli, toolbox};

use argot_core::{DispatchError, DispatchErrorCode};
use argot_test_support::tracing::RecordingLayer;
use clap::error::ErrorKind;
use rstest::rstest;
use tracing::Level;

#[rstest]
#[case::greet_default(&["greet", "World"], &["Hello World"])]
#[case::greet_option(&["greet", "World", "-g", "Hi"], &["Hi World"])]
#[case::greet_shout(&["gr", "--shout", "World"], &["HELLO WORLD"])]
#[case::sum(&["sum", "1", "2.5", "-0.5"], &["3"])]
#[case::sum_empty(&["sum"], &["0"])]
#[case::echo(&["echo", "a", "b"], &["a", "b"])]
#[case::echo_upper(&["echo", "-u", "a"], &["A"])]
#[case::env(&["env", "B=2", "A=1"], &["A=1", "B=2"])]
#[case::env_prefix(&["env", "--prefix", "HO", "HOME=/root", "PATH=/bin"], &["HOME=/root"])]
fn toolbox_commands_produce_lines(#[case] tokens: &[&str], #[case] expected: &[&str]) {
    let output = run_cli(tokens.iter().copied()).expect("command succeeds");
    assert_eq!(output, expected);
}

#[test]
fn toolbox_lists_commands_in_order() {
    let toolbox = toolbox().expect("toolbox builds");
    assert_eq!(toolbox.name(), PROGRAM);
    assert_eq!(
        toolbox.command_names().collect::<Vec<_>>(),
        ["greet", "sum", "echo", "env"]
    );
}

#[rstest]
#[case::bad_number(&["sum", "one"], ErrorKind::ValueValidation)]
#[case::missing_name(&["greet"], ErrorKind::MissingRequiredArgument)]
#[case::help(&["--help"], ErrorKind::DisplayHelp)]
#[case::command_help(&["greet", "--help"], ErrorKind::DisplayHelp)]
fn grammar_failures_surface_clap_errors(#[case] tokens: &[&str], #[case] kind: ErrorKind) {
    let err = run_cli(tokens.iter().copied()).expect_err("dispatch stops");
    match err {
        CliError::Dispatch(DispatchError::Parse { source }) => assert_eq!(source.kind(), kind),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn usage_lines_name_the_program() {
    let err = run_cli(["greet", "--help"]).expect_err("help stops dispatch");
    let rendered = err.to_string();
    assert!(rendered.contains("argot greet"), "unexpected help: {rendered}");
}

#[rstest]
#[case::ambiguous(&["e", "x"], DispatchErrorCode::AmbiguousCommand)]
#[case::unknown(&["frobnicate"], DispatchErrorCode::UnknownCommand)]
#[case::missing(&[], DispatchErrorCode::MissingCommand)]
fn resolution_failures_carry_codes(#[case] tokens: &[&str], #[case] code: DispatchErrorCode) {
    let err = run_cli(tokens.iter().copied()).expect_err("resolution fails");
    assert_eq!(err.dispatch_code(), Some(code));
    assert_eq!(err.spec_code(), None);
}

#[test]
fn run_cli_records_command_span() {
    let (layer, output) = RecordingLayer::capture(|| run_cli(["echo", "hi"]));
    assert_eq!(output.expect("echo succeeds"), ["hi"]);

    let span = layer.span("cli.run").expect("cli span recorded");
    assert_eq!(span.field("command"), Some("echo"));
    let completed = layer.events_with_message("command completed");
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].level, Level::INFO);
}

#[test]
fn render_output_writes_one_line_each() {
    let mut buffer = Vec::new();
    render_output(&["x".to_owned(), String::new(), "y".to_owned()], &mut buffer)
        .expect("writing to a vector succeeds");
    assert_eq!(buffer, b"x\n\ny\n");
}

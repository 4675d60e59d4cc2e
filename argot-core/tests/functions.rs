#![expect(clippy::expect_used, reason = "tests require contextual panics")]

mod common;

use argot_core::{
    Annotation, Callable, Coercion, DispatchError, DispatchErrorCode, Function, Role, Signature,
    SpecErrorCode, Synthesizer, Value, run,
};
use argot_test_support::fixtures::greet;
use clap::error::ErrorKind;
use rstest::rstest;

use common::{constant, reporter};

fn dispatch<const N: usize>(function: &Function, tokens: [&str; N]) -> Result<Vec<String>, DispatchError> {
    Synthesizer::default().run(&Callable::from(function.clone()), tokens)
}

fn parse_kind(err: &DispatchError) -> Option<ErrorKind> {
    match err {
        DispatchError::Parse { source } => Some(source.kind()),
        _ => None,
    }
}

fn positionals(count: usize) -> Function {
    let mut builder = Signature::builder();
    for index in 0..count {
        builder = builder.param(format!("p{index}"));
    }
    reporter("positionals", builder.build().expect("signature"))
}

#[test]
fn required_positionals_bind_in_order() {
    let output = dispatch(&positionals(3), ["a", "b", "c"]).expect("three tokens fit");
    assert_eq!(output, ["a", "b", "c"]);
}

#[rstest]
#[case::too_few(&["a", "b"], ErrorKind::MissingRequiredArgument)]
#[case::none(&[], ErrorKind::MissingRequiredArgument)]
#[case::too_many(&["a", "b", "c", "d"], ErrorKind::UnknownArgument)]
fn wrong_positional_count_is_a_parse_error(#[case] tokens: &[&str], #[case] kind: ErrorKind) {
    let err = Synthesizer::default()
        .run(&positionals(3).into(), tokens.iter().copied())
        .expect_err("token count does not match");
    assert_eq!(err.code(), DispatchErrorCode::Parse);
    assert_eq!(parse_kind(&err), Some(kind));
}

#[rstest]
#[case::default_greeting(&["World"], "Hello World")]
#[case::long_option(&["World", "--greeting", "Hi"], "Hi World")]
#[case::option_first(&["--greeting", "Hi", "World"], "Hi World")]
#[case::short_option(&["World", "-g", "Hey"], "Hey World")]
fn greet_end_to_end(#[case] tokens: &[&str], #[case] expected: &str) {
    let output = run(&greet().into(), tokens.iter().copied()).expect("greet dispatches");
    assert_eq!(output, [expected]);
}

#[test]
fn true_flag_default_fails_before_parsing() {
    let signature = Signature::builder()
        .param_with_default("verbose", true)
        .annotate("verbose", ("be chatty", Role::Flag, Some('v')))
        .build()
        .expect("signature");
    let function = reporter("chatty", signature);
    for tokens in [vec![], vec!["--verbose"], vec!["--bogus", "x"]] {
        let err = Synthesizer::default()
            .run(&function.clone().into(), tokens)
            .expect_err("flag default must be false");
        assert_eq!(err.spec_code(), Some(SpecErrorCode::InvalidFlagDefault));
    }
}

#[rstest]
#[case::present(&["--verbose"], "true")]
#[case::short(&["-v"], "true")]
#[case::absent(&[], "false")]
fn flag_presence_sets_true(#[case] tokens: &[&str], #[case] expected: &str) {
    let signature = Signature::builder()
        .param_with_default("verbose", false)
        .annotate("verbose", ("be chatty", Role::Flag, Some('v')))
        .build()
        .expect("signature");
    let output = Synthesizer::default()
        .run(&reporter("flags", signature).into(), tokens.iter().copied())
        .expect("flag parses");
    assert_eq!(output, [expected]);
}

fn keyword_taker(declared: &str) -> Function {
    let signature = Signature::builder()
        .param_with_default(declared, "unset")
        .varkw("options")
        .build()
        .expect("signature");
    reporter("keywords", signature)
}

#[test]
fn keyword_tokens_leave_the_positional_stream() {
    let output = dispatch(&keyword_taker("a"), ["x=5", "first"]).expect("keywords extracted");
    assert_eq!(output, ["first", "x=5"]);

    let output = dispatch(&keyword_taker("a"), ["x=5"]).expect("keywords extracted");
    assert_eq!(output, ["unset", "x=5"]);
}

#[test]
fn keyword_colliding_with_parameter_is_rejected() {
    let err = dispatch(&keyword_taker("x"), ["x=5"]).expect_err("x is declared");
    match err {
        DispatchError::CollidingKeywords { names } => assert_eq!(names, ["x"]),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn grammar_is_checked_before_keyword_collisions() {
    let err = dispatch(&keyword_taker("x"), ["x=5", "--help"]).expect_err("help stops dispatch");
    assert!(err.is_display_request(), "unexpected error: {err:?}");

    let err = dispatch(&keyword_taker("x"), ["x=5", "--bogus"]).expect_err("unknown option");
    assert_eq!(parse_kind(&err), Some(ErrorKind::UnknownArgument));
}

#[test]
fn keyword_tokens_stay_positional_without_a_keyword_parameter() {
    let signature = Signature::builder().param("a").build().expect("signature");
    let output = dispatch(&reporter("plain", signature), ["x=5"]).expect("parses");
    assert_eq!(output, ["x=5"]);
}

#[rstest]
#[case::integer(Value::from(42), &["42"])]
#[case::list(Value::from(vec![1, 2]), &["1", "2"])]
#[case::text(Value::from("ok"), &["ok"])]
fn results_are_normalized_to_lines(#[case] value: Value, #[case] expected: &[&str]) {
    let output = dispatch(&constant(value), []).expect("no tokens needed");
    assert_eq!(output, expected);
}

fn counter() -> Function {
    let signature = Signature::builder()
        .param_with_default("retries", 3)
        .param_with_default("mode", "fast")
        .varargs("values")
        .annotate(
            "retries",
            Annotation::new("attempts")
                .with_role(Role::Option)
                .with_abbrev('r')
                .with_coercion(Coercion::integer()),
        )
        .annotate(
            "mode",
            Annotation::new("speed")
                .with_role(Role::Option)
                .with_choices(["fast", "slow"]),
        )
        .annotate("values", Annotation::new("numbers").with_coercion(Coercion::integer()))
        .build()
        .expect("signature");
    Function::builder("counter", signature, |args| {
        let retries = args.get("retries").and_then(Value::as_int).unwrap_or_default();
        let total: i64 = args.rest().iter().filter_map(Value::as_int).sum();
        let mode = args.text("mode").unwrap_or_default();
        Ok(Value::from(vec![
            Value::Int(retries),
            Value::from(mode),
            Value::Int(total),
        ]))
    })
    .build()
}

#[rstest]
#[case::defaults(&[], &["3", "fast", "0"])]
#[case::coerced_option(&["-r", "5", "1", "2"], &["5", "fast", "3"])]
#[case::negative_values(&["--mode", "slow", "-4", "10"], &["3", "slow", "6"])]
fn coercions_and_defaults_apply(#[case] tokens: &[&str], #[case] expected: &[&str]) {
    let output = Synthesizer::default()
        .run(&counter().into(), tokens.iter().copied())
        .expect("tokens are valid");
    assert_eq!(output, expected);
}

#[rstest]
#[case::bad_integer(&["--retries", "many"], ErrorKind::ValueValidation)]
#[case::bad_variadic(&["1", "two"], ErrorKind::ValueValidation)]
#[case::outside_choices(&["--mode", "medium"], ErrorKind::InvalidValue)]
#[case::missing_value(&["--retries"], ErrorKind::InvalidValue)]
fn invalid_values_are_parse_errors(#[case] tokens: &[&str], #[case] kind: ErrorKind) {
    let err = Synthesizer::default()
        .run(&counter().into(), tokens.iter().copied())
        .expect_err("token is invalid");
    assert_eq!(parse_kind(&err), Some(kind));
}

#[rstest]
#[case::padded(&["--level", "02"], "2")]
#[case::plain(&["--level", "1"], "1")]
fn choices_accept_any_spelling_of_an_allowed_value(
    #[case] tokens: &[&str],
    #[case] expected: &str,
) {
    let signature = Signature::builder()
        .param_with_default("level", 1)
        .annotate(
            "level",
            Annotation::new("verbosity")
                .with_role(Role::Option)
                .with_coercion(Coercion::integer())
                .with_choices(["1", "2"]),
        )
        .build()
        .expect("signature");
    let output = Synthesizer::default()
        .run(&reporter("levels", signature).into(), tokens.iter().copied())
        .expect("value is an allowed level");
    assert_eq!(output, [expected]);
}

#[test]
fn repeated_names_fail_before_parsing() {
    let signature = Signature::builder()
        .param("a")
        .build()
        .expect("signature")
        .with_varargs("a");
    let err = dispatch(&reporter("twice", signature), ["x"]).expect_err("a is declared twice");
    assert_eq!(err.spec_code(), Some(SpecErrorCode::DuplicateParameter));
}

#[test]
fn help_is_a_display_request() {
    let err = dispatch(&greet(), ["--help"]).expect_err("help stops dispatch");
    assert!(err.is_display_request());
    let rendered = err.to_string();
    assert!(rendered.contains("salutation to use"));
    assert!(rendered.contains("Greet someone."));
}

#[test]
fn bound_method_receiver_is_not_a_rule() {
    let signature = Signature::builder()
        .param("self")
        .param("item")
        .build()
        .expect("signature");
    let method = Function::builder("take", signature, |args| {
        Ok(Value::from(format!("took {}", args.text("item").unwrap_or_default())))
    })
    .bound_method()
    .build();
    assert_eq!(dispatch(&method, ["box"]).expect("one token"), ["took box"]);
}

#[test]
fn custom_prefix_characters_are_honoured() {
    let signature = Signature::builder()
        .param("target")
        .param_with_default("level", 1)
        .param_with_default("quiet", false)
        .annotate(
            "level",
            Annotation::new("")
                .with_role(Role::Option)
                .with_abbrev('l')
                .with_coercion(Coercion::integer()),
        )
        .annotate("quiet", ("", Role::Flag))
        .build()
        .expect("signature");
    let function = Function::builder("plus", signature, |args| {
        Ok(Value::from(args.positional().to_vec()))
    })
    .prefix_chars("+")
    .build();

    let output = dispatch(&function, ["-x", "+l", "7", "++quiet"]).expect("plus prefix parses");
    assert_eq!(output, ["-x", "7", "true"]);
}

#[test]
fn callable_failure_is_an_invocation_error() {
    let signature = Signature::builder().param("path").build().expect("signature");
    let failing = Function::builder("open", signature, |args| {
        Err(format!("cannot open {}", args.text("path").unwrap_or_default()).into())
    })
    .build();
    let err = dispatch(&failing, ["/nowhere"]).expect_err("handler fails");
    assert_eq!(err.code(), DispatchErrorCode::Invocation);
    assert_eq!(err.to_string(), "`open` failed: cannot open /nowhere");
}

//! Token dispatch: parse a token list against a target and call it.

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::LazyLock,
};

use regex::Regex;
use tracing::{debug, info, instrument, warn};

use crate::{
    callable::{Arguments, Callable, Container, Function},
    error::{DispatchError, Result},
    matcher::resolve,
    synth::{ParserSpec, Synthesizer, translate_prefix},
    value::Value,
};

#[expect(
    clippy::expect_used,
    reason = "the pattern is a literal and compiles on every run"
)]
static KEYWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([a-zA-Z_]\w*)=").expect("keyword pattern compiles"));

/// Splits `name=value` tokens away from the rest.
///
/// The name must look like an identifier; the value is everything after the
/// first `=` and may be empty. When a name repeats, the last value wins.
/// Remaining tokens keep their order.
///
/// # Examples
/// ```
/// use argot_core::extract_keywords;
///
/// let (rest, keywords) = extract_keywords(["a", "x=5", "--n", "1=2"]);
/// assert_eq!(rest, ["a", "--n", "1=2"]);
/// assert_eq!(keywords.get("x").map(String::as_str), Some("5"));
/// ```
pub fn extract_keywords<I, S>(tokens: I) -> (Vec<String>, BTreeMap<String, String>)
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut rest = Vec::new();
    let mut keywords = BTreeMap::new();
    for token in tokens {
        let token: String = token.into();
        // A match guarantees the first `=` ends the name.
        match token.split_once('=') {
            Some((name, value)) if KEYWORD.is_match(&token) => {
                keywords.insert(name.to_owned(), value.to_owned());
            }
            _ => rest.push(token),
        }
    }
    (rest, keywords)
}

/// Flattens a callable's result into output lines.
///
/// Lists yield one line per element, maps one line per key in key order,
/// and every other value a single line.
///
/// # Examples
/// ```
/// use argot_core::{Value, stringlist};
///
/// assert_eq!(stringlist(Value::from(42)), ["42"]);
/// assert_eq!(stringlist(Value::from(vec![1, 2])), ["1", "2"]);
/// assert_eq!(stringlist(Value::from("ok")), ["ok"]);
/// ```
#[must_use]
pub fn stringlist(value: Value) -> Vec<String> {
    match value {
        Value::List(items) => items.iter().map(ToString::to_string).collect(),
        Value::Map(entries) => entries.into_keys().collect(),
        other => vec![other.to_string()],
    }
}

impl Synthesizer {
    /// Parses `tokens` against `target`, calls it, and returns its result as
    /// output lines.
    ///
    /// The target's scope, if any, is entered before anything else and
    /// released afterwards whatever the outcome.
    ///
    /// # Errors
    /// Returns [`DispatchError`] when the target's specification is invalid,
    /// the tokens violate the grammar (including help requests), a command
    /// token is unknown or ambiguous, keywords collide with declared
    /// parameters, the scope refuses to open, or the callable fails.
    #[instrument(
        name = "dispatch.run",
        skip(self, target, tokens),
        fields(target = %target.name()),
    )]
    pub fn run<I, S>(&self, target: &Callable, tokens: I) -> Result<Vec<String>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tokens: Vec<String> = tokens.into_iter().map(Into::into).collect();
        let bin_name = self.bin_name(target.name()).to_owned();
        let output = crate::scope::with_scope(target.scope(), target.name(), || match target {
            Callable::Function(function) => self.dispatch_function(function, &bin_name, tokens),
            Callable::Container(container) => {
                self.dispatch_container(container, &bin_name, tokens)
            }
        })?;
        info!(lines = output.len(), "dispatch complete");
        Ok(output)
    }

    #[instrument(
        name = "dispatch.function",
        skip(self, function, tokens),
        fields(function = %function.name(), tokens = tokens.len()),
    )]
    fn dispatch_function(
        &self,
        function: &Function,
        bin_name: &str,
        tokens: Vec<String>,
    ) -> Result<Vec<String>> {
        let spec = self.synthesize(function)?;
        invoke(&spec, bin_name, tokens)
    }

    #[instrument(
        name = "dispatch.container",
        skip(self, container, tokens),
        fields(container = %container.name(), tokens = tokens.len()),
    )]
    fn dispatch_container(
        &self,
        container: &Container,
        bin_name: &str,
        mut tokens: Vec<String>,
    ) -> Result<Vec<String>> {
        let registry = self.register(container)?;

        let Some(index) = tokens
            .iter()
            .position(|token| !token.starts_with(registry.prefix()))
        else {
            // Lets `--help` render the command list before reporting.
            registry
                .grammar(bin_name)
                .try_get_matches_from(translate_prefix(registry.prefix(), tokens))?;
            return Err(DispatchError::MissingCommand {
                container: registry.name().to_owned(),
                known: registry.known(),
            });
        };

        let token = tokens.remove(index);
        if let Some(name) = resolve(&token, registry.names())? {
            let Some(spec) = registry.get(name) else {
                return Err(DispatchError::UnknownCommand {
                    token,
                    known: registry.known(),
                });
            };
            debug!(command = name, "command resolved");
            return invoke(spec, &format!("{bin_name} {name}"), tokens);
        }

        let Some(fallback) = registry.fallback() else {
            return Err(DispatchError::UnknownCommand {
                token,
                known: registry.known(),
            });
        };
        warn!(token = %token, "no matching command; using fallback");
        let value = fallback(&token).map_err(|source| DispatchError::Invocation {
            command: token.clone(),
            source,
        })?;
        Ok(stringlist(value))
    }
}

fn invoke(spec: &ParserSpec, bin_name: &str, tokens: Vec<String>) -> Result<Vec<String>> {
    let (tokens, keywords) = if spec.keywords().is_some() {
        extract_keywords(tokens)
    } else {
        (tokens, BTreeMap::new())
    };
    if !keywords.is_empty() {
        debug!(keywords = keywords.len(), "keyword arguments extracted");
    }

    let matches = spec
        .grammar(bin_name)
        .try_get_matches_from(spec.translate(tokens))?;

    let colliding: BTreeSet<&str> = spec
        .bindings()
        .iter()
        .map(|binding| binding.name())
        .filter(|name| keywords.contains_key(*name))
        .collect();
    if !colliding.is_empty() {
        return Err(DispatchError::CollidingKeywords {
            names: colliding.into_iter().map(ToOwned::to_owned).collect(),
        });
    }

    let names = spec
        .bindings()
        .iter()
        .map(|binding| binding.name().to_owned())
        .collect();
    let mut positional: Vec<Value> = spec
        .bindings()
        .iter()
        .map(|binding| binding.extract(&matches))
        .collect();
    if let Some(variadic) = spec.variadic()
        && let Some(values) = matches.get_many::<Value>(variadic.name())
    {
        positional.extend(values.cloned());
    }

    let function = spec.function();
    let value = function
        .call(Arguments::new(names, positional, keywords))
        .map_err(|source| DispatchError::Invocation {
            command: function.name().to_owned(),
            source,
        })?;
    Ok(stringlist(value))
}

/// Dispatches `tokens` against `target` using the process-wide
/// [`Synthesizer`].
///
/// # Errors
/// See [`Synthesizer::run`].
///
/// # Examples
/// ```
/// use argot_core::{Annotation, Function, Role, Signature, Value, run};
///
/// let signature = Signature::builder()
///     .param("name")
///     .param_with_default("greeting", "Hello")
///     .annotate("greeting", Annotation::new("salutation").with_role(Role::Option))
///     .build()?;
/// let greet = Function::builder("greet", signature, |args| {
///     let greeting = args.text("greeting").unwrap_or("Hello");
///     let name = args.text("name").unwrap_or_default();
///     Ok(Value::from(format!("{greeting} {name}")))
/// })
/// .build();
///
/// assert_eq!(run(&greet.clone().into(), ["World"])?, ["Hello World"]);
/// assert_eq!(run(&greet.into(), ["World", "--greeting", "Hi"])?, ["Hi World"]);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn run<I, S>(target: &Callable, tokens: I) -> Result<Vec<String>>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Synthesizer::global().run(target, tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case::plain(&["a", "b"], &["a", "b"], &[])]
    #[case::keyword(&["x=5", "a"], &["a"], &[("x", "5")])]
    #[case::empty_value(&["x="], &[], &[("x", "")])]
    #[case::value_with_equals(&["url=a=b"], &[], &[("url", "a=b")])]
    #[case::digit_name(&["1x=2"], &["1x=2"], &[])]
    #[case::option_like(&["--x=2"], &["--x=2"], &[])]
    #[case::last_wins(&["x=1", "x=2"], &[], &[("x", "2")])]
    fn splits_keyword_tokens(
        #[case] input: &[&str],
        #[case] rest: &[&str],
        #[case] keywords: &[(&str, &str)],
    ) {
        let (got_rest, got_keywords) = extract_keywords(input.iter().copied());
        assert_eq!(got_rest, rest);
        let expected: BTreeMap<String, String> = keywords
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect();
        assert_eq!(got_keywords, expected);
    }

    #[rstest]
    #[case::scalar(Value::Int(42), &["42"])]
    #[case::list(Value::from(vec![1, 2]), &["1", "2"])]
    #[case::text(Value::from("ok"), &["ok"])]
    #[case::null(Value::Null, &["null"])]
    #[case::empty_list(Value::List(Vec::new()), &[])]
    fn normalizes_results(#[case] value: Value, #[case] expected: &[&str]) {
        assert_eq!(stringlist(value), expected);
    }

    #[test]
    fn maps_render_their_keys() {
        let map: BTreeMap<String, Value> = [("b", 2), ("a", 1)]
            .into_iter()
            .map(|(key, value)| (key.to_owned(), Value::from(value)))
            .collect();
        assert_eq!(stringlist(Value::Map(map)), ["a", "b"]);
    }

    proptest! {
        #[test]
        fn tokens_without_equals_pass_through(tokens in prop::collection::vec("[a-z-]{0,8}", 0..10)) {
            let (rest, keywords) = extract_keywords(tokens.clone());
            prop_assert_eq!(rest, tokens);
            prop_assert!(keywords.is_empty());
        }

        #[test]
        fn identifier_pairs_are_always_captured(
            name in "[a-zA-Z_][a-zA-Z0-9_]{0,6}",
            value in "[^\\n]{0,8}",
        ) {
            let (rest, keywords) = extract_keywords([format!("{name}={value}")]);
            prop_assert!(rest.is_empty());
            prop_assert_eq!(keywords.get(&name), Some(&value));
        }
    }
}

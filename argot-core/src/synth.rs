//! Parser synthesis: turning a signature into an argument grammar.
//!
//! The [`Synthesizer`] validates a function's signature and annotations once,
//! produces a [`ParserSpec`], and memoizes it in a side-table keyed by the
//! function's [`CallableId`]. Specs are lowered to a [`clap::Command`] on
//! demand; clap is the token-parsing primitive that enforces arity, choices
//! and coercions.

use std::{collections::HashMap, ffi::OsStr, sync::Arc, sync::OnceLock};

use clap::{
    Arg, ArgAction, Command,
    builder::{PossibleValue, TypedValueParser},
    error::ErrorKind,
};
use dashmap::DashMap;
use tracing::{debug, instrument};

use crate::{
    annotation::{Annotation, Role},
    callable::{CallableId, Container, Function},
    error::SpecError,
    registry::Registry,
    signature::ParamDefault,
    value::{Coercion, Value},
};

/// Prefix character used when neither the callable nor the synthesizer
/// configures one.
pub const DEFAULT_PREFIX: char = '-';

const HELP_NAME: &str = "help";
const HELP_ABBREV: char = 'h';

/// One declared parameter, paired with its default and resolved annotation.
#[derive(Clone, Debug)]
pub struct Binding {
    name: String,
    default: ParamDefault,
    annotation: Annotation,
    parser: CoercingParser,
}

impl Binding {
    /// Parameter name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared default.
    #[must_use]
    pub const fn default(&self) -> &ParamDefault {
        &self.default
    }

    /// Resolved annotation.
    #[must_use]
    pub const fn annotation(&self) -> &Annotation {
        &self.annotation
    }

    /// Label shown for the value in usage text.
    ///
    /// Options with a default and no explicit label show the default.
    #[must_use]
    pub fn label(&self) -> String {
        if let Some(label) = self.annotation.label() {
            return label.to_owned();
        }
        match (self.annotation.role(), &self.default) {
            (Role::Option, ParamDefault::Value(value)) if !value.is_null() => {
                let text = value.to_string();
                if text.is_empty() { self.name.clone() } else { text }
            }
            _ => self.name.clone(),
        }
    }

    fn lower(&self, hyphen_values: bool) -> Arg {
        let annotation = &self.annotation;
        let arg = Arg::new(self.name.clone()).help(annotation.help().to_owned());
        match annotation.role() {
            Role::Positional => arg
                .value_name(self.label())
                .required(self.default.is_required())
                .action(ArgAction::Set)
                .value_parser(self.parser.clone())
                .allow_negative_numbers(true)
                .allow_hyphen_values(hyphen_values),
            Role::Option => with_abbrev(arg.long(self.name.clone()), annotation.abbrev())
                .value_name(self.label())
                .action(ArgAction::Set)
                .value_parser(self.parser.clone())
                .allow_negative_numbers(true)
                .allow_hyphen_values(hyphen_values),
            Role::Flag => {
                with_abbrev(arg.long(self.name.clone()), annotation.abbrev()).action(ArgAction::SetTrue)
            }
        }
    }

    /// Value the callable receives for this parameter, read from the parsed
    /// matches.
    pub(crate) fn extract(&self, matches: &clap::ArgMatches) -> Value {
        if self.annotation.role() == Role::Flag {
            return Value::Bool(matches.get_flag(&self.name));
        }
        matches
            .get_one::<Value>(&self.name)
            .cloned()
            .or_else(|| self.default.value().cloned())
            .unwrap_or(Value::Null)
    }
}

fn with_abbrev(arg: Arg, abbrev: Option<char>) -> Arg {
    match abbrev {
        Some(short) => arg.short(short),
        None => arg,
    }
}

/// Applies an argument's coercion, then checks the coerced value against
/// the declared choices.
#[derive(Clone, Debug)]
struct CoercingParser {
    coercion: Coercion,
    choices: Option<Arc<[(String, Value)]>>,
}

impl CoercingParser {
    fn new(name: &str, annotation: &Annotation) -> Result<Self, SpecError> {
        let coercion = annotation.coercion().cloned().unwrap_or_else(Coercion::text);
        let choices = annotation
            .choices()
            .map(|declared| {
                declared
                    .iter()
                    .map(|choice| {
                        coercion
                            .apply(choice)
                            .map(|value| (choice.clone(), value))
                            .map_err(|_| SpecError::InvalidChoice {
                                parameter: name.to_owned(),
                                choice: choice.clone(),
                                coercion: coercion.name().to_owned(),
                            })
                    })
                    .collect::<Result<Arc<[_]>, _>>()
            })
            .transpose()?;
        Ok(Self { coercion, choices })
    }
}

impl TypedValueParser for CoercingParser {
    type Value = Value;

    fn parse_ref(
        &self,
        cmd: &Command,
        arg: Option<&Arg>,
        raw: &OsStr,
    ) -> Result<Value, clap::Error> {
        let label = arg.map_or_else(|| "...".to_owned(), ToString::to_string);
        let Some(raw) = raw.to_str() else {
            return Err(clap::Error::new(ErrorKind::InvalidUtf8).with_cmd(cmd));
        };
        let value = self.coercion.apply(raw).map_err(|err| {
            clap::Error::raw(
                ErrorKind::ValueValidation,
                format!("invalid value '{raw}' for '{label}': {err}\n"),
            )
            .with_cmd(cmd)
        })?;
        match &self.choices {
            Some(choices) if !choices.iter().any(|(_, allowed)| *allowed == value) => {
                let listed: Vec<&str> = choices.iter().map(|(text, _)| text.as_str()).collect();
                Err(clap::Error::raw(
                    ErrorKind::InvalidValue,
                    format!(
                        "invalid value '{raw}' for '{label}' [possible values: {}]\n",
                        listed.join(", ")
                    ),
                )
                .with_cmd(cmd))
            }
            _ => Ok(value),
        }
    }

    fn possible_values(&self) -> Option<Box<dyn Iterator<Item = PossibleValue> + '_>> {
        let choices = self.choices.as_ref()?;
        Some(Box::new(
            choices.iter().map(|(text, _)| PossibleValue::new(text.clone())),
        ))
    }
}

/// Capture rule for a variadic positional or keyword parameter.
#[derive(Clone, Debug)]
pub struct VariadicRule {
    name: String,
    annotation: Annotation,
    parser: CoercingParser,
}

impl VariadicRule {
    /// Variadic parameter name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolved annotation.
    #[must_use]
    pub const fn annotation(&self) -> &Annotation {
        &self.annotation
    }

    fn lower_positional(&self, hyphen_values: bool) -> Arg {
        Arg::new(self.name.clone())
            .help(self.annotation.help().to_owned())
            .value_name(self.annotation.label().unwrap_or(&self.name).to_owned())
            .num_args(0..)
            .action(ArgAction::Append)
            .value_parser(self.parser.clone())
            .allow_negative_numbers(true)
            .allow_hyphen_values(hyphen_values)
    }
}

/// The grammar derived from one function.
///
/// Built once per function and shared through [`Arc`]; see
/// [`Synthesizer::synthesize`].
#[derive(Clone, Debug)]
pub struct ParserSpec {
    function: Function,
    bindings: Vec<Binding>,
    variadic: Option<VariadicRule>,
    keywords: Option<VariadicRule>,
    prefix: char,
}

impl ParserSpec {
    /// The originating function.
    #[must_use]
    pub const fn function(&self) -> &Function {
        &self.function
    }

    /// Declared parameters in order, receiver excluded.
    #[must_use]
    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    /// Variadic positional capture, if declared.
    #[must_use]
    pub const fn variadic(&self) -> Option<&VariadicRule> {
        self.variadic.as_ref()
    }

    /// Variadic keyword capture, if declared.
    #[must_use]
    pub const fn keywords(&self) -> Option<&VariadicRule> {
        self.keywords.as_ref()
    }

    /// Prefix character for options and flags.
    #[must_use]
    pub const fn prefix(&self) -> char {
        self.prefix
    }

    /// Lowers the specification to a clap command named `bin_name` in usage
    /// text.
    #[must_use]
    pub fn grammar(&self, bin_name: &str) -> Command {
        let hyphen_values = self.prefix != DEFAULT_PREFIX;
        let mut command = Command::new(self.function.name().to_owned())
            .bin_name(bin_name.to_owned())
            .no_binary_name(true)
            .args(self.bindings.iter().map(|binding| binding.lower(hyphen_values)));
        if let Some(description) = self.function.description() {
            command = command.about(description.to_owned());
        }
        if let Some(variadic) = &self.variadic {
            command = command.arg(variadic.lower_positional(hyphen_values));
        }
        if let Some(keywords) = &self.keywords {
            command = command.after_help(format!(
                "Extra NAME=VALUE arguments are collected into `{}`.",
                keywords.name
            ));
        }
        command
    }

    /// Rewrites tokens spelled with a custom prefix to the `-` convention the
    /// grammar is lowered to.
    #[must_use]
    pub fn translate(&self, tokens: Vec<String>) -> Vec<String> {
        translate_prefix(self.prefix, tokens)
    }
}

pub(crate) fn translate_prefix(prefix: char, tokens: Vec<String>) -> Vec<String> {
    if prefix == DEFAULT_PREFIX {
        return tokens;
    }
    tokens
        .into_iter()
        .map(|token| {
            let Some(rest) = token.strip_prefix(prefix) else {
                return token;
            };
            match rest.strip_prefix(prefix) {
                Some(long) => format!("--{long}"),
                None => format!("-{rest}"),
            }
        })
        .collect()
}

pub(crate) fn prefix_of(declared: Option<&str>, fallback: char) -> char {
    declared
        .and_then(|chars| chars.chars().next())
        .unwrap_or(fallback)
}

/// Builds and memoizes parser specifications.
///
/// The side-tables live as long as the synthesizer. The process-wide
/// instance behind [`Synthesizer::global`] backs [`crate::run`].
///
/// # Examples
/// ```
/// use std::sync::Arc;
///
/// use argot_core::{Function, Signature, Synthesizer, Value};
///
/// let synth = Synthesizer::builder().with_default_prefix('+').build();
/// let echo = Function::builder("echo", Signature::builder().param("word").build()?, |args| {
///     Ok(args.get("word").cloned().unwrap_or(Value::Null))
/// })
/// .build();
///
/// let first = synth.synthesize(&echo)?;
/// let second = synth.synthesize(&echo)?;
/// assert!(Arc::ptr_eq(&first, &second));
/// assert_eq!(first.prefix(), '+');
/// # Ok::<(), argot_core::SpecError>(())
/// ```
#[derive(Debug)]
pub struct Synthesizer {
    default_prefix: char,
    program: Option<String>,
    specs: DashMap<CallableId, Arc<ParserSpec>>,
    registries: DashMap<CallableId, Arc<Registry>>,
}

impl Default for Synthesizer {
    fn default() -> Self {
        SynthesizerBuilder::default().build()
    }
}

impl Synthesizer {
    /// Starts a [`SynthesizerBuilder`].
    #[must_use]
    pub fn builder() -> SynthesizerBuilder {
        SynthesizerBuilder::default()
    }

    /// Process-wide synthesizer with default configuration.
    pub fn global() -> &'static Self {
        static GLOBAL: OnceLock<Synthesizer> = OnceLock::new();
        GLOBAL.get_or_init(Self::default)
    }

    /// Default prefix character.
    #[must_use]
    pub const fn default_prefix(&self) -> char {
        self.default_prefix
    }

    /// Program name override used in top-level usage lines.
    #[must_use]
    pub fn program(&self) -> Option<&str> {
        self.program.as_deref()
    }

    /// Number of memoized function specifications.
    #[must_use]
    pub fn cached_specs(&self) -> usize {
        self.specs.len()
    }

    /// Returns the specification for `function`, building it on first use.
    ///
    /// Later calls return the cached [`Arc`] without re-validating. Failed
    /// builds are not cached.
    ///
    /// # Errors
    /// Returns [`SpecError`] when a name is empty or repeated, an annotation
    /// names an unknown parameter, an abbreviation is misplaced or not
    /// alphanumeric, a flag has a default other than `false`, a choice fails
    /// its own coercion, or two rules claim the same option string.
    #[instrument(
        name = "synth.synthesize",
        err,
        skip(self, function),
        fields(function = %function.name(), id = function.id().get()),
    )]
    pub fn synthesize(&self, function: &Function) -> Result<Arc<ParserSpec>, SpecError> {
        if let Some(spec) = self.specs.get(&function.id()) {
            debug!("specification cache hit");
            return Ok(Arc::clone(spec.value()));
        }

        let spec = Arc::new(self.build_spec(function)?);
        debug!(
            bindings = spec.bindings.len(),
            variadic = spec.variadic.is_some(),
            keywords = spec.keywords.is_some(),
            "specification built"
        );
        let cached = self.specs.entry(function.id()).or_insert(spec);
        Ok(Arc::clone(cached.value()))
    }

    /// Returns the registry for `container`, synthesizing every command on
    /// first use.
    ///
    /// # Errors
    /// Returns [`SpecError`] when a command name is empty or repeated, or
    /// when any command fails to synthesize.
    #[instrument(
        name = "synth.register",
        err,
        skip(self, container),
        fields(container = %container.name(), id = container.id().get()),
    )]
    pub fn register(&self, container: &Container) -> Result<Arc<Registry>, SpecError> {
        if let Some(registry) = self.registries.get(&container.id()) {
            debug!("registry cache hit");
            return Ok(Arc::clone(registry.value()));
        }

        let prefix = prefix_of(container.prefix_chars(), self.default_prefix);
        let mut commands = Vec::with_capacity(container.commands().len());
        for (name, function) in container.commands() {
            if name.is_empty() {
                return Err(SpecError::EmptyCommandName {
                    container: container.name().to_owned(),
                });
            }
            if commands.iter().any(|(existing, _)| existing == name) {
                return Err(SpecError::DuplicateCommand {
                    container: container.name().to_owned(),
                    command: name.clone(),
                });
            }
            commands.push((name.clone(), self.synthesize(function)?));
        }

        let registry = Arc::new(Registry::new(container, prefix, commands));
        debug!(commands = registry.len(), "registry built");
        let cached = self.registries.entry(container.id()).or_insert(registry);
        Ok(Arc::clone(cached.value()))
    }

    /// Usage name for a top-level target called `name`.
    pub(crate) fn bin_name<'a>(&'a self, name: &'a str) -> &'a str {
        self.program().unwrap_or(name)
    }

    fn build_spec(&self, function: &Function) -> Result<ParserSpec, SpecError> {
        let signature = function.signature();
        signature.check_names()?;

        if let Some(unknown) = signature
            .annotated_names()
            .find(|name| !signature.declares(name))
        {
            return Err(SpecError::UnknownAnnotation {
                callable: function.name().to_owned(),
                parameter: unknown.to_owned(),
            });
        }

        let skip = usize::from(function.is_bound());
        let bindings = signature
            .paired_defaults()
            .into_iter()
            .skip(skip)
            .map(|(name, default)| {
                let annotation = signature.annotation(name).cloned().unwrap_or_default();
                bind(name, default, annotation)
            })
            .collect::<Result<Vec<_>, _>>()?;
        let variadic = signature
            .varargs()
            .map(|name| variadic_rule(name, signature.annotation(name)))
            .transpose()?;
        let keywords = signature
            .varkw()
            .map(|name| variadic_rule(name, signature.annotation(name)))
            .transpose()?;
        check_option_strings(&bindings, variadic.as_ref())?;

        Ok(ParserSpec {
            function: function.clone(),
            bindings,
            variadic,
            keywords,
            prefix: prefix_of(function.prefix_chars(), self.default_prefix),
        })
    }
}

fn bind(name: &str, default: ParamDefault, annotation: Annotation) -> Result<Binding, SpecError> {
    match (annotation.role(), annotation.abbrev()) {
        (Role::Positional, Some(abbrev)) => {
            return Err(SpecError::AbbreviationOnPositional {
                parameter: name.to_owned(),
                abbrev,
            });
        }
        (_, Some(abbrev)) if !abbrev.is_alphanumeric() => {
            return Err(SpecError::InvalidAbbreviation {
                parameter: name.to_owned(),
                abbrev,
            });
        }
        _ => {}
    }
    if annotation.role() == Role::Flag
        && let Some(other) = default.value()
        && *other != Value::Bool(false)
    {
        return Err(SpecError::InvalidFlagDefault {
            parameter: name.to_owned(),
            default: other.to_string(),
        });
    }

    Ok(Binding {
        name: name.to_owned(),
        default,
        parser: CoercingParser::new(name, &annotation)?,
        annotation,
    })
}

fn variadic_rule(name: &str, annotation: Option<&Annotation>) -> Result<VariadicRule, SpecError> {
    let annotation = annotation.cloned().unwrap_or_default();
    Ok(VariadicRule {
        name: name.to_owned(),
        parser: CoercingParser::new(name, &annotation)?,
        annotation,
    })
}

fn check_option_strings(
    bindings: &[Binding],
    variadic: Option<&VariadicRule>,
) -> Result<(), SpecError> {
    let mut claimed: HashMap<String, &str> = HashMap::new();
    claimed.insert(format!("--{HELP_NAME}"), HELP_NAME);
    claimed.insert(format!("-{HELP_ABBREV}"), HELP_NAME);

    let ids = bindings
        .iter()
        .map(Binding::name)
        .chain(variadic.map(VariadicRule::name));
    for id in ids {
        // Ids share a namespace with clap's own help argument.
        if id == HELP_NAME {
            return Err(SpecError::ConflictingOption {
                option: format!("--{HELP_NAME}"),
                first: HELP_NAME.to_owned(),
                second: id.to_owned(),
            });
        }
    }

    for binding in bindings {
        if !binding.annotation.role().is_prefixed() {
            continue;
        }
        let mut strings = vec![format!("--{}", binding.name)];
        if let Some(abbrev) = binding.annotation.abbrev() {
            strings.push(format!("-{abbrev}"));
        }
        for option in strings {
            if let Some(first) = claimed.get(&option) {
                return Err(SpecError::ConflictingOption {
                    option,
                    first: (*first).to_owned(),
                    second: binding.name.clone(),
                });
            }
            claimed.insert(option, &binding.name);
        }
    }
    Ok(())
}

/// Configures and constructs a [`Synthesizer`].
#[derive(Debug, Clone)]
pub struct SynthesizerBuilder {
    default_prefix: char,
    program: Option<String>,
}

impl Default for SynthesizerBuilder {
    fn default() -> Self {
        Self {
            default_prefix: DEFAULT_PREFIX,
            program: None,
        }
    }
}

impl SynthesizerBuilder {
    /// Overrides the prefix character used when a callable declares none.
    #[must_use]
    pub const fn with_default_prefix(mut self, prefix: char) -> Self {
        self.default_prefix = prefix;
        self
    }

    /// Sets the program name shown in top-level usage lines.
    #[must_use]
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = Some(program.into());
        self
    }

    /// Constructs the synthesizer with empty caches.
    #[must_use]
    pub fn build(self) -> Synthesizer {
        Synthesizer {
            default_prefix: self.default_prefix,
            program: self.program,
            specs: DashMap::new(),
            registries: DashMap::new(),
        }
    }
}

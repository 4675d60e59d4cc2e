//! Error types for the argot core library.
//!
//! Construction-time failures surface as [`SpecError`]; anything that aborts
//! a single dispatch is a [`DispatchError`]. Both carry stable codes so
//! front-ends can log or branch on them without matching display strings.

use std::fmt;

use clap::error::ErrorKind;
use thiserror::Error;

/// Boxed error returned by command handlers, fallbacks, and scopes.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

macro_rules! define_error_codes {
    (
        $(#[$enum_meta:meta])*
        enum $CodeTy:ident for $ErrTy:ident {
            $(
                $(#[$variant_meta:meta])*
                $CodeVariant:ident => $ErrVariant:ident $( { $($pattern:tt)* } )? => $code:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$enum_meta])*
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        #[non_exhaustive]
        pub enum $CodeTy {
            $(
                $(#[$variant_meta])*
                $CodeVariant,
            )+
        }

        impl $CodeTy {
            /// Return the stable machine-readable representation of this error code.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$CodeVariant => $code,)+
                }
            }
        }

        impl fmt::Display for $CodeTy {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl $ErrTy {
            #[doc = concat!(
                "Retrieve the stable [`",
                stringify!($CodeTy),
                "`] for this error."
            )]
            #[must_use]
            pub const fn code(&self) -> $CodeTy {
                match self {
                    $(Self::$ErrVariant $( { $($pattern)* } )? => $CodeTy::$CodeVariant,)+
                }
            }
        }
    };
}

/// An error raised while building a parser specification from a callable.
///
/// These are fatal for the callable: nothing is cached, so the same error is
/// reported again on every later attempt.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum SpecError {
    /// An annotation names a parameter the signature does not declare.
    #[error("`{callable}` annotates non-existing argument `{parameter}`")]
    UnknownAnnotation {
        /// Name of the callable carrying the annotation.
        callable: String,
        /// Parameter name used by the annotation.
        parameter: String,
    },
    /// A positional parameter was given a short flag.
    #[error("positional argument `{parameter}` cannot take the abbreviation `{abbrev}`")]
    AbbreviationOnPositional {
        /// Offending parameter.
        parameter: String,
        /// Abbreviation that was supplied.
        abbrev: char,
    },
    /// A flag declared a default other than "required" or `false`.
    #[error("flag `{parameter}` wants default false, got {default}")]
    InvalidFlagDefault {
        /// Offending parameter.
        parameter: String,
        /// Text form of the declared default.
        default: String,
    },
    /// Two grammar rules claim the same option string.
    #[error("option `{option}` is claimed by both `{first}` and `{second}`")]
    ConflictingOption {
        /// The contested option string, for example `-v` or `--help`.
        option: String,
        /// First claimant.
        first: String,
        /// Second claimant.
        second: String,
    },
    /// The signature lists more defaults than parameters.
    #[error("signature declares {defaults} defaults for {params} parameters")]
    TooManyDefaults {
        /// Number of declared parameters.
        params: usize,
        /// Number of declared defaults.
        defaults: usize,
    },
    /// A parameter without a default follows one with a default.
    #[error("required argument `{parameter}` follows an argument with a default")]
    RequiredAfterDefault {
        /// Offending parameter.
        parameter: String,
    },
    /// A parameter or variadic name is empty.
    #[error("signature declares an argument with an empty name")]
    EmptyParameterName,
    /// Two parameters, or a parameter and a variadic, share a name.
    #[error("argument `{parameter}` is declared more than once")]
    DuplicateParameter {
        /// Repeated name.
        parameter: String,
    },
    /// An option or flag abbreviation is not a letter or digit.
    #[error("argument `{parameter}` cannot take the abbreviation `{abbrev}`")]
    InvalidAbbreviation {
        /// Offending parameter.
        parameter: String,
        /// Abbreviation that was supplied.
        abbrev: char,
    },
    /// A declared choice is rejected by the argument's own coercion.
    #[error("choice `{choice}` of `{parameter}` is not a valid {coercion}")]
    InvalidChoice {
        /// Offending parameter.
        parameter: String,
        /// Choice text as declared.
        choice: String,
        /// Name of the coercion that rejected it.
        coercion: String,
    },
    /// A container registered a command with an empty name.
    #[error("container `{container}` registers a command with an empty name")]
    EmptyCommandName {
        /// Container name.
        container: String,
    },
    /// A container registered the same command name twice.
    #[error("container `{container}` registers `{command}` more than once")]
    DuplicateCommand {
        /// Container name.
        container: String,
        /// Repeated command name.
        command: String,
    },
}

define_error_codes! {
    /// Stable codes describing [`SpecError`] variants.
    enum SpecErrorCode for SpecError {
        /// An annotation names a parameter the signature does not declare.
        UnknownAnnotation => UnknownAnnotation { .. } => "SPEC_UNKNOWN_ANNOTATION",
        /// A positional parameter was given a short flag.
        AbbreviationOnPositional => AbbreviationOnPositional { .. } => "SPEC_ABBREVIATION_ON_POSITIONAL",
        /// A flag declared a default other than "required" or `false`.
        InvalidFlagDefault => InvalidFlagDefault { .. } => "SPEC_INVALID_FLAG_DEFAULT",
        /// Two grammar rules claim the same option string.
        ConflictingOption => ConflictingOption { .. } => "SPEC_CONFLICTING_OPTION",
        /// The signature lists more defaults than parameters.
        TooManyDefaults => TooManyDefaults { .. } => "SPEC_TOO_MANY_DEFAULTS",
        /// A parameter without a default follows one with a default.
        RequiredAfterDefault => RequiredAfterDefault { .. } => "SPEC_REQUIRED_AFTER_DEFAULT",
        /// A parameter or variadic name is empty.
        EmptyParameterName => EmptyParameterName => "SPEC_EMPTY_PARAMETER_NAME",
        /// Two parameters, or a parameter and a variadic, share a name.
        DuplicateParameter => DuplicateParameter { .. } => "SPEC_DUPLICATE_PARAMETER",
        /// An option or flag abbreviation is not a letter or digit.
        InvalidAbbreviation => InvalidAbbreviation { .. } => "SPEC_INVALID_ABBREVIATION",
        /// A declared choice is rejected by the argument's own coercion.
        InvalidChoice => InvalidChoice { .. } => "SPEC_INVALID_CHOICE",
        /// A container registered a command with an empty name.
        EmptyCommandName => EmptyCommandName { .. } => "SPEC_EMPTY_COMMAND_NAME",
        /// A container registered the same command name twice.
        DuplicateCommand => DuplicateCommand { .. } => "SPEC_DUPLICATE_COMMAND",
    }
}

/// Error type produced when dispatching a token list against a callable.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The callable could not be turned into a parser specification.
    #[error(transparent)]
    Spec {
        /// Underlying construction failure.
        #[from]
        source: SpecError,
    },
    /// A command prefix matched more than one command.
    #[error("ambiguous command `{token}`: matching {}", .candidates.join(", "))]
    AmbiguousCommand {
        /// Token supplied by the user.
        token: String,
        /// Every command name starting with the token.
        candidates: Vec<String>,
    },
    /// No command matched and the container has no fallback.
    #[error("no command `{token}`; known commands: {}", .known.join(", "))]
    UnknownCommand {
        /// Token supplied by the user.
        token: String,
        /// Commands the container exposes.
        known: Vec<String>,
    },
    /// A container was dispatched without any command token.
    #[error("`{container}` expects a command; known commands: {}", .known.join(", "))]
    MissingCommand {
        /// Container name.
        container: String,
        /// Commands the container exposes.
        known: Vec<String>,
    },
    /// The token list violated the derived grammar.
    ///
    /// Also used for help and version displays; see
    /// [`DispatchError::is_display_request`].
    #[error("{source}")]
    Parse {
        /// Rendered usage error produced by the token parser.
        #[from]
        source: clap::Error,
    },
    /// A `name=value` token reused the name of a declared parameter.
    #[error("colliding keyword arguments: {}", .names.join(" "))]
    CollidingKeywords {
        /// Declared parameter names that were also supplied as keywords.
        names: Vec<String>,
    },
    /// The callable (or fallback) itself failed.
    #[error("`{command}` failed: {source}")]
    Invocation {
        /// Name of the callable that failed.
        command: String,
        /// Error returned by the callable.
        #[source]
        source: BoxError,
    },
    /// The invocation scope refused to open.
    #[error("failed to enter scope of `{target}`: {source}")]
    ScopeEnter {
        /// Name of the dispatch target.
        target: String,
        /// Error returned by the scope.
        #[source]
        source: BoxError,
    },
}

define_error_codes! {
    /// Stable codes describing [`DispatchError`] variants.
    enum DispatchErrorCode for DispatchError {
        /// The callable could not be turned into a parser specification.
        Spec => Spec { .. } => "DISPATCH_SPEC",
        /// A command prefix matched more than one command.
        AmbiguousCommand => AmbiguousCommand { .. } => "DISPATCH_AMBIGUOUS_COMMAND",
        /// No command matched and the container has no fallback.
        UnknownCommand => UnknownCommand { .. } => "DISPATCH_UNKNOWN_COMMAND",
        /// A container was dispatched without any command token.
        MissingCommand => MissingCommand { .. } => "DISPATCH_MISSING_COMMAND",
        /// The token list violated the derived grammar.
        Parse => Parse { .. } => "DISPATCH_PARSE",
        /// A `name=value` token reused the name of a declared parameter.
        CollidingKeywords => CollidingKeywords { .. } => "DISPATCH_COLLIDING_KEYWORDS",
        /// The callable (or fallback) itself failed.
        Invocation => Invocation { .. } => "DISPATCH_INVOCATION",
        /// The invocation scope refused to open.
        ScopeEnter => ScopeEnter { .. } => "DISPATCH_SCOPE_ENTER",
    }
}

impl DispatchError {
    /// Retrieve the inner [`SpecErrorCode`] when the dispatch failed while
    /// building a specification.
    #[must_use]
    pub const fn spec_code(&self) -> Option<SpecErrorCode> {
        match self {
            Self::Spec { source } => Some(source.code()),
            _ => None,
        }
    }

    /// Returns `true` when the parser stopped to show help or version text
    /// rather than because the input was wrong.
    #[must_use]
    pub fn is_display_request(&self) -> bool {
        match self {
            Self::Parse { source } => matches!(
                source.kind(),
                ErrorKind::DisplayHelp
                    | ErrorKind::DisplayVersion
                    | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
            ),
            _ => false,
        }
    }
}

/// Convenient alias for results returned by the dispatch API.
pub type Result<T> = core::result::Result<T, DispatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    #[rstest]
    #[case(
        SpecError::UnknownAnnotation { callable: "f".into(), parameter: "x".into() },
        SpecErrorCode::UnknownAnnotation,
    )]
    #[case(
        SpecError::InvalidFlagDefault { parameter: "v".into(), default: "true".into() },
        SpecErrorCode::InvalidFlagDefault,
    )]
    #[case(
        SpecError::DuplicateCommand { container: "c".into(), command: "add".into() },
        SpecErrorCode::DuplicateCommand,
    )]
    fn spec_errors_report_codes(#[case] error: SpecError, #[case] expected: SpecErrorCode) {
        assert_eq!(error.code(), expected);
        assert!(error.code().as_str().starts_with("SPEC_"));
    }

    #[test]
    fn dispatch_error_exposes_inner_spec_code() {
        let err = DispatchError::from(SpecError::RequiredAfterDefault {
            parameter: "b".into(),
        });
        assert_eq!(err.code(), DispatchErrorCode::Spec);
        assert_eq!(err.spec_code(), Some(SpecErrorCode::RequiredAfterDefault));
    }

    #[test]
    fn ambiguous_command_lists_candidates() {
        let err = DispatchError::AmbiguousCommand {
            token: "pu".into(),
            candidates: vec!["push".into(), "pull".into()],
        };
        assert_eq!(err.to_string(), "ambiguous command `pu`: matching push, pull");
        assert_eq!(err.code().as_str(), "DISPATCH_AMBIGUOUS_COMMAND");
        assert!(err.spec_code().is_none());
    }

    #[test]
    fn colliding_keywords_names_offenders() {
        let err = DispatchError::CollidingKeywords {
            names: vec!["x".into(), "y".into()],
        };
        assert_eq!(err.to_string(), "colliding keyword arguments: x y");
        assert!(!err.is_display_request());
    }
}

//! Normalized description of a callable's parameter list.
//!
//! Rust has no runtime reflection, so callers describe the interface of a
//! callable explicitly. The shape mirrors what reflection would report:
//! ordered parameter names, a right-aligned list of defaults, optional
//! variadic positional and keyword names, and per-parameter annotations.

use std::fmt;

use crate::{
    annotation::{Annotation, RawAnnotation, normalize},
    error::SpecError,
    value::Value,
};

/// Default of a declared parameter.
#[derive(Clone, Debug, PartialEq)]
pub enum ParamDefault {
    /// No default: the value must be supplied.
    Required,
    /// Value used when the token stream omits the parameter.
    Value(Value),
}

impl ParamDefault {
    /// Returns `true` for [`ParamDefault::Required`].
    #[must_use]
    pub const fn is_required(&self) -> bool {
        matches!(self, Self::Required)
    }

    /// The default value, if any.
    #[must_use]
    pub const fn value(&self) -> Option<&Value> {
        match self {
            Self::Required => None,
            Self::Value(value) => Some(value),
        }
    }
}

impl fmt::Display for ParamDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Required => f.write_str("<required>"),
            Self::Value(value) => write!(f, "{value}"),
        }
    }
}

/// Signature descriptor of a callable.
///
/// # Examples
/// ```
/// use argot_core::{ParamDefault, Role, Signature, Value};
///
/// let signature = Signature::builder()
///     .param("name")
///     .param_with_default("greeting", "Hello")
///     .annotate("greeting", ("salutation to use", Role::Option, Some('g')))
///     .build()?;
///
/// assert_eq!(signature.params(), ["name", "greeting"]);
/// assert_eq!(
///     signature.paired_defaults(),
///     vec![
///         ("name", ParamDefault::Required),
///         ("greeting", ParamDefault::Value(Value::from("Hello"))),
///     ],
/// );
/// # Ok::<(), argot_core::SpecError>(())
/// ```
#[derive(Clone, Debug, Default)]
pub struct Signature {
    params: Vec<String>,
    defaults: Vec<Value>,
    varargs: Option<String>,
    varkw: Option<String>,
    annotations: Vec<(String, Annotation)>,
}

impl Signature {
    /// Builds a descriptor from parameter names and a trailing list of
    /// defaults, the way reflection reports them.
    ///
    /// # Errors
    /// Returns [`SpecError::TooManyDefaults`] when `defaults` is longer than
    /// `params`, and [`SpecError::EmptyParameterName`] or
    /// [`SpecError::DuplicateParameter`] for unusable names.
    pub fn new<P, S, D>(params: P, defaults: D) -> Result<Self, SpecError>
    where
        P: IntoIterator<Item = S>,
        S: Into<String>,
        D: IntoIterator<Item = Value>,
    {
        let params: Vec<String> = params.into_iter().map(Into::into).collect();
        let defaults: Vec<Value> = defaults.into_iter().collect();
        if defaults.len() > params.len() {
            return Err(SpecError::TooManyDefaults {
                params: params.len(),
                defaults: defaults.len(),
            });
        }
        let signature = Self {
            params,
            defaults,
            ..Self::default()
        };
        signature.check_names()?;
        Ok(signature)
    }

    /// Starts an incremental [`SignatureBuilder`].
    #[must_use]
    pub fn builder() -> SignatureBuilder {
        SignatureBuilder::default()
    }

    /// Sets the variadic positional name.
    #[must_use]
    pub fn with_varargs(mut self, name: impl Into<String>) -> Self {
        self.varargs = Some(name.into());
        self
    }

    /// Sets the variadic keyword name.
    #[must_use]
    pub fn with_varkw(mut self, name: impl Into<String>) -> Self {
        self.varkw = Some(name.into());
        self
    }

    /// Attaches an annotation to `name`, replacing any earlier one.
    ///
    /// The name is checked against the declared parameters when the parser
    /// specification is built.
    #[must_use]
    pub fn with_annotation(mut self, name: impl Into<String>, raw: impl Into<RawAnnotation>) -> Self {
        let name = name.into();
        let annotation = normalize(raw);
        if let Some(slot) = self.annotations.iter_mut().find(|(key, _)| *key == name) {
            slot.1 = annotation;
        } else {
            self.annotations.push((name, annotation));
        }
        self
    }

    /// Declared parameter names in order.
    #[must_use]
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Defaults, aligned with the tail of [`Self::params`].
    #[must_use]
    pub fn defaults(&self) -> &[Value] {
        &self.defaults
    }

    /// Variadic positional name.
    #[must_use]
    pub fn varargs(&self) -> Option<&str> {
        self.varargs.as_deref()
    }

    /// Variadic keyword name.
    #[must_use]
    pub fn varkw(&self) -> Option<&str> {
        self.varkw.as_deref()
    }

    /// Annotation attached to `name`, if any.
    #[must_use]
    pub fn annotation(&self, name: &str) -> Option<&Annotation> {
        self.annotations
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, annotation)| annotation)
    }

    /// Names carrying an annotation, in attachment order.
    pub fn annotated_names(&self) -> impl Iterator<Item = &str> {
        self.annotations.iter().map(|(name, _)| name.as_str())
    }

    /// Returns `true` when `name` is a parameter or a variadic name.
    #[must_use]
    pub fn declares(&self, name: &str) -> bool {
        self.params.iter().any(|param| param == name)
            || self.varargs() == Some(name)
            || self.varkw() == Some(name)
    }

    /// Every declared name, variadics included, must be non-empty and
    /// unique.
    pub(crate) fn check_names(&self) -> Result<(), SpecError> {
        let mut seen: Vec<&str> = Vec::with_capacity(self.params.len() + 2);
        let names = self
            .params
            .iter()
            .map(String::as_str)
            .chain(self.varargs())
            .chain(self.varkw());
        for name in names {
            if name.is_empty() {
                return Err(SpecError::EmptyParameterName);
            }
            if seen.contains(&name) {
                return Err(SpecError::DuplicateParameter {
                    parameter: name.to_owned(),
                });
            }
            seen.push(name);
        }
        Ok(())
    }

    /// Pairs every parameter with its default, right-aligning the defaults
    /// so leading parameters without one get [`ParamDefault::Required`].
    #[must_use]
    pub fn paired_defaults(&self) -> Vec<(&str, ParamDefault)> {
        let required = self.params.len().saturating_sub(self.defaults.len());
        let defaults = std::iter::repeat_n(ParamDefault::Required, required)
            .chain(self.defaults.iter().cloned().map(ParamDefault::Value));
        self.params.iter().map(String::as_str).zip(defaults).collect()
    }
}

/// Incrementally assembles a [`Signature`].
#[derive(Debug, Default)]
pub struct SignatureBuilder {
    params: Vec<(String, Option<Value>)>,
    varargs: Option<String>,
    varkw: Option<String>,
    annotations: Vec<(String, RawAnnotation)>,
}

impl SignatureBuilder {
    /// Appends a parameter without a default.
    #[must_use]
    pub fn param(mut self, name: impl Into<String>) -> Self {
        self.params.push((name.into(), None));
        self
    }

    /// Appends a parameter with a default.
    #[must_use]
    pub fn param_with_default(mut self, name: impl Into<String>, default: impl Into<Value>) -> Self {
        self.params.push((name.into(), Some(default.into())));
        self
    }

    /// Declares the variadic positional parameter.
    #[must_use]
    pub fn varargs(mut self, name: impl Into<String>) -> Self {
        self.varargs = Some(name.into());
        self
    }

    /// Declares the variadic keyword parameter.
    #[must_use]
    pub fn varkw(mut self, name: impl Into<String>) -> Self {
        self.varkw = Some(name.into());
        self
    }

    /// Attaches an annotation to `name`.
    #[must_use]
    pub fn annotate(mut self, name: impl Into<String>, raw: impl Into<RawAnnotation>) -> Self {
        self.annotations.push((name.into(), raw.into()));
        self
    }

    /// Finishes the descriptor.
    ///
    /// # Errors
    /// Returns [`SpecError::RequiredAfterDefault`] when a parameter without a
    /// default follows one with a default, and
    /// [`SpecError::DuplicateParameter`] or [`SpecError::EmptyParameterName`]
    /// when a name is repeated or empty.
    pub fn build(self) -> Result<Signature, SpecError> {
        let mut names = Vec::with_capacity(self.params.len());
        let mut defaults = Vec::new();
        for (name, default) in self.params {
            match default {
                Some(value) => defaults.push(value),
                None if !defaults.is_empty() => {
                    return Err(SpecError::RequiredAfterDefault { parameter: name });
                }
                None => {}
            }
            names.push(name);
        }

        let mut signature = Signature::new(names, defaults)?;
        signature.varargs = self.varargs;
        signature.varkw = self.varkw;
        signature.check_names()?;
        for (name, raw) in self.annotations {
            signature = signature.with_annotation(name, raw);
        }
        Ok(signature)
    }
}

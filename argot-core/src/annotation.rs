//! Per-parameter metadata attached to a callable's signature.
//!
//! An [`Annotation`] tells the synthesizer how a parameter should appear on
//! the command line. Callers rarely build one field by field; [`normalize`]
//! accepts a finished record, an ordered shorthand tuple, or bare help text.

use crate::value::Coercion;

/// How a parameter is spelled on the command line.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Role {
    /// A bare token in declaration order.
    #[default]
    Positional,
    /// `--name VALUE`, optionally `-a VALUE`.
    Option,
    /// `--name` alone; presence means `true`.
    Flag,
}

impl Role {
    /// Returns `true` for roles spelled with the prefix character.
    #[must_use]
    pub const fn is_prefixed(self) -> bool {
        matches!(self, Self::Option | Self::Flag)
    }
}

/// Metadata describing one parameter.
///
/// The abbreviation is only meaningful for [`Role::Option`] and
/// [`Role::Flag`]; a positional with an abbreviation is rejected when the
/// parser specification is built, not here.
///
/// # Examples
/// ```
/// use argot_core::{Annotation, Coercion, Role};
///
/// let annotation = Annotation::new("number of retries")
///     .with_role(Role::Option)
///     .with_abbrev('r')
///     .with_coercion(Coercion::integer());
/// assert_eq!(annotation.role(), Role::Option);
/// assert_eq!(annotation.abbrev(), Some('r'));
/// assert_eq!(annotation.coercion().map(Coercion::name), Some("integer"));
/// ```
#[derive(Clone, Debug, Default)]
pub struct Annotation {
    help: String,
    role: Role,
    abbrev: Option<char>,
    coercion: Option<Coercion>,
    choices: Option<Vec<String>>,
    label: Option<String>,
}

impl Annotation {
    /// Creates a positional annotation carrying `help`.
    #[must_use]
    pub fn new(help: impl Into<String>) -> Self {
        Self {
            help: help.into(),
            ..Self::default()
        }
    }

    /// Sets the role.
    #[must_use]
    pub const fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    /// Sets the one-character short form.
    #[must_use]
    pub const fn with_abbrev(mut self, abbrev: char) -> Self {
        self.abbrev = Some(abbrev);
        self
    }

    /// Sets the coercion applied to each raw token.
    #[must_use]
    pub fn with_coercion(mut self, coercion: Coercion) -> Self {
        self.coercion = Some(coercion);
        self
    }

    /// Restricts accepted tokens to `choices`, in display order.
    #[must_use]
    pub fn with_choices<I, S>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.choices = Some(choices.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the label shown for the value in usage text.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Help text.
    #[must_use]
    pub fn help(&self) -> &str {
        &self.help
    }

    /// Role on the command line.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    /// Short form, if any.
    #[must_use]
    pub const fn abbrev(&self) -> Option<char> {
        self.abbrev
    }

    /// Coercion, if any. Absent means tokens are passed through as text.
    #[must_use]
    pub const fn coercion(&self) -> Option<&Coercion> {
        self.coercion.as_ref()
    }

    /// Allowed token values, if restricted.
    #[must_use]
    pub fn choices(&self) -> Option<&[String]> {
        self.choices.as_deref()
    }

    /// Explicit display label, if any.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

/// Any of the accepted spellings of an annotation, before normalization.
///
/// Tuples follow the field order `(help, role, abbrev, coercion, choices,
/// label)`; trailing fields may be left off.
#[derive(Clone, Debug)]
pub enum RawAnnotation {
    /// An already complete record, used as-is.
    Record(Annotation),
    /// Ordered shorthand fields.
    Fields(AnnotationFields),
    /// Bare help text for a positional parameter.
    Help(String),
}

/// Ordered shorthand fields of an annotation. Omitted trailing fields are
/// `None`.
#[derive(Clone, Debug, Default)]
pub struct AnnotationFields {
    /// Help text.
    pub help: String,
    /// Role; positional when absent.
    pub role: Option<Role>,
    /// Short form.
    pub abbrev: Option<char>,
    /// Coercion.
    pub coercion: Option<Coercion>,
    /// Allowed token values.
    pub choices: Option<Vec<String>>,
    /// Display label.
    pub label: Option<String>,
}

impl From<AnnotationFields> for Annotation {
    fn from(fields: AnnotationFields) -> Self {
        Self {
            help: fields.help,
            role: fields.role.unwrap_or_default(),
            abbrev: fields.abbrev,
            coercion: fields.coercion,
            choices: fields.choices,
            label: fields.label,
        }
    }
}

impl From<Annotation> for RawAnnotation {
    fn from(annotation: Annotation) -> Self {
        Self::Record(annotation)
    }
}

impl From<AnnotationFields> for RawAnnotation {
    fn from(fields: AnnotationFields) -> Self {
        Self::Fields(fields)
    }
}

impl From<&str> for RawAnnotation {
    fn from(help: &str) -> Self {
        Self::Help(help.to_owned())
    }
}

impl From<String> for RawAnnotation {
    fn from(help: String) -> Self {
        Self::Help(help)
    }
}

impl<S: Into<String>> From<(S, Role)> for RawAnnotation {
    fn from((help, role): (S, Role)) -> Self {
        Self::Fields(AnnotationFields {
            help: help.into(),
            role: Some(role),
            ..AnnotationFields::default()
        })
    }
}

impl<S: Into<String>> From<(S, Role, Option<char>)> for RawAnnotation {
    fn from((help, role, abbrev): (S, Role, Option<char>)) -> Self {
        Self::Fields(AnnotationFields {
            help: help.into(),
            role: Some(role),
            abbrev,
            ..AnnotationFields::default()
        })
    }
}

impl<S: Into<String>> From<(S, Role, Option<char>, Option<Coercion>)> for RawAnnotation {
    fn from((help, role, abbrev, coercion): (S, Role, Option<char>, Option<Coercion>)) -> Self {
        Self::Fields(AnnotationFields {
            help: help.into(),
            role: Some(role),
            abbrev,
            coercion,
            ..AnnotationFields::default()
        })
    }
}

impl<S: Into<String>>
    From<(
        S,
        Role,
        Option<char>,
        Option<Coercion>,
        Option<Vec<String>>,
    )> for RawAnnotation
{
    fn from(
        (help, role, abbrev, coercion, choices): (
            S,
            Role,
            Option<char>,
            Option<Coercion>,
            Option<Vec<String>>,
        ),
    ) -> Self {
        Self::Fields(AnnotationFields {
            help: help.into(),
            role: Some(role),
            abbrev,
            coercion,
            choices,
            label: None,
        })
    }
}

impl<S: Into<String>>
    From<(
        S,
        Role,
        Option<char>,
        Option<Coercion>,
        Option<Vec<String>>,
        Option<String>,
    )> for RawAnnotation
{
    fn from(
        (help, role, abbrev, coercion, choices, label): (
            S,
            Role,
            Option<char>,
            Option<Coercion>,
            Option<Vec<String>>,
            Option<String>,
        ),
    ) -> Self {
        Self::Fields(AnnotationFields {
            help: help.into(),
            role: Some(role),
            abbrev,
            coercion,
            choices,
            label,
        })
    }
}

/// Converts any accepted spelling into an [`Annotation`].
///
/// Records pass through untouched, shorthand fields are applied in order,
/// and bare text becomes the help of a positional parameter. Never fails.
///
/// # Examples
/// ```
/// use argot_core::{Role, normalize};
///
/// let bare = normalize("file to read");
/// assert_eq!(bare.help(), "file to read");
/// assert_eq!(bare.role(), Role::Positional);
///
/// let short = normalize(("be chatty", Role::Flag, Some('v')));
/// assert_eq!(short.role(), Role::Flag);
/// assert_eq!(short.abbrev(), Some('v'));
/// ```
pub fn normalize(raw: impl Into<RawAnnotation>) -> Annotation {
    match raw.into() {
        RawAnnotation::Record(annotation) => annotation,
        RawAnnotation::Fields(fields) => fields.into(),
        RawAnnotation::Help(help) => Annotation::new(help),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    #[test]
    fn records_pass_through_unchanged() {
        let record = Annotation::new("mode")
            .with_role(Role::Option)
            .with_choices(["fast", "slow"])
            .with_label("MODE");
        let normalized = normalize(record);
        assert_eq!(normalized.help(), "mode");
        assert_eq!(normalized.role(), Role::Option);
        assert_eq!(
            normalized.choices(),
            Some(&["fast".to_owned(), "slow".to_owned()][..])
        );
        assert_eq!(normalized.label(), Some("MODE"));
    }

    #[rstest]
    #[case::help_only(RawAnnotation::from("text"), Role::Positional, None)]
    #[case::with_role(RawAnnotation::from(("text", Role::Option)), Role::Option, None)]
    #[case::with_abbrev(
        RawAnnotation::from(("text", Role::Flag, Some('f'))),
        Role::Flag,
        Some('f')
    )]
    fn shorthand_fields_apply_in_order(
        #[case] raw: RawAnnotation,
        #[case] role: Role,
        #[case] abbrev: Option<char>,
    ) {
        let annotation = normalize(raw);
        assert_eq!(annotation.help(), "text");
        assert_eq!(annotation.role(), role);
        assert_eq!(annotation.abbrev(), abbrev);
        assert!(annotation.coercion().is_none());
    }

    #[test]
    fn full_shorthand_sets_every_field() {
        let annotation = normalize((
            "level",
            Role::Option,
            Some('l'),
            Some(Coercion::integer()),
            Some(vec!["1".to_owned(), "2".to_owned()]),
            Some("N".to_owned()),
        ));
        assert_eq!(annotation.abbrev(), Some('l'));
        assert_eq!(annotation.coercion().map(Coercion::name), Some("integer"));
        assert_eq!(annotation.choices().map(<[String]>::len), Some(2));
        assert_eq!(annotation.label(), Some("N"));
    }

    #[test]
    fn positional_abbreviation_is_not_rejected_here() {
        let annotation = normalize(("oops", Role::Positional, Some('o')));
        assert_eq!(annotation.abbrev(), Some('o'));
    }

    #[test]
    fn prefixed_roles() {
        assert!(!Role::Positional.is_prefixed());
        assert!(Role::Option.is_prefixed());
        assert!(Role::Flag.is_prefixed());
    }
}

//! Command registries for multi-command containers.

use std::sync::Arc;

use clap::Command;

use crate::{
    callable::{Container, FallbackFn},
    synth::ParserSpec,
};

/// The command table derived from one [`Container`].
///
/// Built by [`crate::Synthesizer::register`]; every command's
/// [`ParserSpec`] is synthesized up front so a broken command surfaces on
/// first registration rather than on first use.
#[derive(Clone)]
pub struct Registry {
    name: String,
    description: Option<String>,
    prefix: char,
    commands: Vec<(String, Arc<ParserSpec>)>,
    fallback: Option<Arc<FallbackFn>>,
}

impl Registry {
    pub(crate) fn new(
        container: &Container,
        prefix: char,
        commands: Vec<(String, Arc<ParserSpec>)>,
    ) -> Self {
        Self {
            name: container.name().to_owned(),
            description: container.description().map(ToOwned::to_owned),
            prefix,
            commands,
            fallback: container.fallback().cloned(),
        }
    }

    /// Container name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Prefix character used to tell options apart from the command token.
    #[must_use]
    pub const fn prefix(&self) -> char {
        self.prefix
    }

    /// Command names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().map(|(name, _)| name.as_str())
    }

    /// Number of commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Returns `true` when the container exposes no command.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Specification registered under exactly `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<ParserSpec>> {
        self.commands
            .iter()
            .find(|(candidate, _)| candidate == name)
            .map(|(_, spec)| spec)
    }

    /// Returns `true` when unmatched tokens go to a fallback handler.
    #[must_use]
    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    pub(crate) fn fallback(&self) -> Option<&Arc<FallbackFn>> {
        self.fallback.as_ref()
    }

    /// Top-level grammar listing every command, used for `--help` and for
    /// reporting a missing command.
    #[must_use]
    pub fn grammar(&self, bin_name: &str) -> Command {
        let mut command = Command::new(self.name.clone())
            .bin_name(bin_name.to_owned())
            .no_binary_name(true)
            .disable_help_subcommand(true)
            .subcommands(self.commands.iter().map(|(name, spec)| {
                spec.grammar(&format!("{bin_name} {name}"))
                    .name(name.clone())
            }));
        if let Some(description) = &self.description {
            command = command.about(description.clone());
        }
        command
    }

    /// Known command names, collected for error reports.
    pub(crate) fn known(&self) -> Vec<String> {
        self.names().map(ToOwned::to_owned).collect()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("name", &self.name)
            .field("prefix", &self.prefix)
            .field("commands", &self.known())
            .field("fallback", &self.fallback.is_some())
            .finish_non_exhaustive()
    }
}

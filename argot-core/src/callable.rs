//! Dispatch targets: plain functions, bound methods, and command containers.
//!
//! Each target gets a [`CallableId`] when it is built. Clones share the id,
//! which is what the synthesizer keys its specification cache on.

use std::{
    collections::BTreeMap,
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use crate::{error::BoxError, scope::Scope, signature::Signature, value::Value};

type HandlerFn = dyn Fn(Arguments) -> Result<Value, BoxError> + Send + Sync;
pub(crate) type FallbackFn = dyn Fn(&str) -> Result<Value, BoxError> + Send + Sync;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a dispatch target.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct CallableId(u64);

impl CallableId {
    fn next() -> Self {
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric identity.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Parsed arguments handed to a function.
///
/// Positional values appear in declaration order followed by the variadic
/// tail; keyword values are the `name=value` tokens captured for the
/// variadic keyword parameter.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Arguments {
    names: Vec<String>,
    positional: Vec<Value>,
    keywords: BTreeMap<String, String>,
}

impl Arguments {
    /// Assembles arguments for a direct call. `names` label the leading
    /// values of `positional`; any further values form the variadic tail.
    #[must_use]
    pub const fn new(
        names: Vec<String>,
        positional: Vec<Value>,
        keywords: BTreeMap<String, String>,
    ) -> Self {
        Self {
            names,
            positional,
            keywords,
        }
    }

    /// Every positional value, declared parameters first.
    #[must_use]
    pub fn positional(&self) -> &[Value] {
        &self.positional
    }

    /// Value bound to the declared parameter `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        let index = self.names.iter().position(|candidate| candidate == name)?;
        self.positional.get(index)
    }

    /// Text of the declared parameter `name`, when it holds text.
    #[must_use]
    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_text)
    }

    /// Values captured by the variadic positional parameter.
    #[must_use]
    pub fn rest(&self) -> &[Value] {
        self.positional.get(self.names.len()..).unwrap_or_default()
    }

    /// Captured `name=value` pairs.
    #[must_use]
    pub const fn keywords(&self) -> &BTreeMap<String, String> {
        &self.keywords
    }
}

struct FunctionInner {
    id: CallableId,
    name: String,
    description: Option<String>,
    signature: Signature,
    bound: bool,
    prefix_chars: Option<String>,
    scope: Option<Arc<dyn Scope>>,
    handler: Arc<HandlerFn>,
}

/// A function or bound method with an explicit signature.
///
/// # Examples
/// ```
/// use argot_core::{Function, Signature, Value};
///
/// let signature = Signature::builder().param("name").build()?;
/// let hello = Function::builder("hello", signature, |args| {
///     Ok(Value::from(format!("hello {}", args.text("name").unwrap_or("?"))))
/// })
/// .description("Say hello.")
/// .build();
///
/// assert_eq!(hello.name(), "hello");
/// assert_eq!(hello.clone().id(), hello.id());
/// # Ok::<(), argot_core::SpecError>(())
/// ```
#[derive(Clone)]
pub struct Function {
    inner: Arc<FunctionInner>,
}

impl Function {
    /// Starts a [`FunctionBuilder`].
    pub fn builder<F>(name: impl Into<String>, signature: Signature, handler: F) -> FunctionBuilder
    where
        F: Fn(Arguments) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        FunctionBuilder {
            name: name.into(),
            description: None,
            signature,
            bound: false,
            prefix_chars: None,
            scope: None,
            handler: Arc::new(handler),
        }
    }

    /// Identity used for memoization.
    #[must_use]
    pub fn id(&self) -> CallableId {
        self.inner.id
    }

    /// Name used in usage lines.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Description shown above the help text.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.inner.description.as_deref()
    }

    /// Signature descriptor.
    #[must_use]
    pub fn signature(&self) -> &Signature {
        &self.inner.signature
    }

    /// Returns `true` when the first parameter is a receiver.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.inner.bound
    }

    /// Declared prefix characters, if overridden.
    #[must_use]
    pub fn prefix_chars(&self) -> Option<&str> {
        self.inner.prefix_chars.as_deref()
    }

    /// Resource scope wrapped around dispatches targeting this function.
    #[must_use]
    pub fn scope(&self) -> Option<&dyn Scope> {
        self.inner.scope.as_deref()
    }

    /// Calls the handler directly.
    ///
    /// # Errors
    /// Propagates the handler's error.
    pub fn call(&self, arguments: Arguments) -> Result<Value, BoxError> {
        (self.inner.handler)(arguments)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .field("signature", &self.inner.signature)
            .field("bound", &self.inner.bound)
            .finish_non_exhaustive()
    }
}

/// Configures and constructs a [`Function`].
pub struct FunctionBuilder {
    name: String,
    description: Option<String>,
    signature: Signature,
    bound: bool,
    prefix_chars: Option<String>,
    scope: Option<Arc<dyn Scope>>,
    handler: Arc<HandlerFn>,
}

impl FunctionBuilder {
    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Marks the first declared parameter as the receiver of a bound method.
    /// The receiver gets no grammar rule; the handler is expected to carry it.
    #[must_use]
    pub const fn bound_method(mut self) -> Self {
        self.bound = true;
        self
    }

    /// Overrides the prefix characters; only the first one is used.
    #[must_use]
    pub fn prefix_chars(mut self, prefix_chars: impl Into<String>) -> Self {
        self.prefix_chars = Some(prefix_chars.into());
        self
    }

    /// Wraps every dispatch targeting this function in `scope`.
    #[must_use]
    pub fn scope(mut self, scope: Arc<dyn Scope>) -> Self {
        self.scope = Some(scope);
        self
    }

    /// Finishes the function and assigns its identity.
    #[must_use]
    pub fn build(self) -> Function {
        Function {
            inner: Arc::new(FunctionInner {
                id: CallableId::next(),
                name: self.name,
                description: self.description,
                signature: self.signature,
                bound: self.bound,
                prefix_chars: self.prefix_chars,
                scope: self.scope,
                handler: self.handler,
            }),
        }
    }
}

struct ContainerInner {
    id: CallableId,
    name: String,
    description: Option<String>,
    prefix_chars: Option<String>,
    commands: Vec<(String, Function)>,
    fallback: Option<Arc<FallbackFn>>,
    scope: Option<Arc<dyn Scope>>,
}

/// An object exposing several named sub-commands.
///
/// # Examples
/// ```
/// use argot_core::{Container, Function, Signature, Value};
///
/// let add = Function::builder("add", Signature::builder().param("item").build()?, |args| {
///     Ok(Value::from(format!("added {}", args.text("item").unwrap_or_default())))
/// })
/// .build();
///
/// let inventory = Container::builder("inventory").command("add", add).build();
/// assert_eq!(inventory.command_names().collect::<Vec<_>>(), ["add"]);
/// # Ok::<(), argot_core::SpecError>(())
/// ```
#[derive(Clone)]
pub struct Container {
    inner: Arc<ContainerInner>,
}

impl Container {
    /// Starts a [`ContainerBuilder`].
    #[must_use]
    pub fn builder(name: impl Into<String>) -> ContainerBuilder {
        ContainerBuilder {
            name: name.into(),
            description: None,
            prefix_chars: None,
            commands: Vec::new(),
            fallback: None,
            scope: None,
        }
    }

    /// Identity used for memoization.
    #[must_use]
    pub fn id(&self) -> CallableId {
        self.inner.id
    }

    /// Name used in usage lines.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Description shown above the command list.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.inner.description.as_deref()
    }

    /// Declared prefix characters, if overridden.
    #[must_use]
    pub fn prefix_chars(&self) -> Option<&str> {
        self.inner.prefix_chars.as_deref()
    }

    /// Command names in declaration order.
    pub fn command_names(&self) -> impl Iterator<Item = &str> {
        self.inner.commands.iter().map(|(name, _)| name.as_str())
    }

    /// Commands in declaration order.
    #[must_use]
    pub fn commands(&self) -> &[(String, Function)] {
        &self.inner.commands
    }

    pub(crate) fn fallback(&self) -> Option<&Arc<FallbackFn>> {
        self.inner.fallback.as_ref()
    }

    /// Resource scope wrapped around dispatches targeting this container.
    #[must_use]
    pub fn scope(&self) -> Option<&dyn Scope> {
        self.inner.scope.as_deref()
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .field("commands", &self.command_names().collect::<Vec<_>>())
            .field("fallback", &self.inner.fallback.is_some())
            .finish_non_exhaustive()
    }
}

/// Configures and constructs a [`Container`].
pub struct ContainerBuilder {
    name: String,
    description: Option<String>,
    prefix_chars: Option<String>,
    commands: Vec<(String, Function)>,
    fallback: Option<Arc<FallbackFn>>,
    scope: Option<Arc<dyn Scope>>,
}

impl ContainerBuilder {
    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Overrides the prefix characters; only the first one is used.
    #[must_use]
    pub fn prefix_chars(mut self, prefix_chars: impl Into<String>) -> Self {
        self.prefix_chars = Some(prefix_chars.into());
        self
    }

    /// Exposes `function` under `name`.
    #[must_use]
    pub fn command(mut self, name: impl Into<String>, function: Function) -> Self {
        self.commands.push((name.into(), function));
        self
    }

    /// Handles tokens that match no command. The handler receives the
    /// unmatched token and its result is reported like any command result.
    #[must_use]
    pub fn fallback<F>(mut self, fallback: F) -> Self
    where
        F: Fn(&str) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        self.fallback = Some(Arc::new(fallback));
        self
    }

    /// Wraps every dispatch targeting this container in `scope`.
    #[must_use]
    pub fn scope(mut self, scope: Arc<dyn Scope>) -> Self {
        self.scope = Some(scope);
        self
    }

    /// Finishes the container and assigns its identity. Command names are
    /// validated when the container is first registered.
    #[must_use]
    pub fn build(self) -> Container {
        Container {
            inner: Arc::new(ContainerInner {
                id: CallableId::next(),
                name: self.name,
                description: self.description,
                prefix_chars: self.prefix_chars,
                commands: self.commands,
                fallback: self.fallback,
                scope: self.scope,
            }),
        }
    }
}

/// Anything [`crate::run`] accepts.
#[derive(Clone, Debug)]
pub enum Callable {
    /// A function or bound method.
    Function(Function),
    /// A multi-command container.
    Container(Container),
}

impl Callable {
    /// Name of the target.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Function(function) => function.name(),
            Self::Container(container) => container.name(),
        }
    }

    /// Identity of the target.
    #[must_use]
    pub fn id(&self) -> CallableId {
        match self {
            Self::Function(function) => function.id(),
            Self::Container(container) => container.id(),
        }
    }

    /// Resource scope of the target.
    #[must_use]
    pub fn scope(&self) -> Option<&dyn Scope> {
        match self {
            Self::Function(function) => function.scope(),
            Self::Container(container) => container.scope(),
        }
    }
}

impl From<Function> for Callable {
    fn from(function: Function) -> Self {
        Self::Function(function)
    }
}

impl From<Container> for Callable {
    fn from(container: Container) -> Self {
        Self::Container(container)
    }
}

//! argot core library.
//!
//! Derives a command-line grammar from a callable's signature and
//! annotations, then parses token lists against it and calls the target.
//! Containers expose several named commands with prefix matching and an
//! optional fallback.

mod annotation;
mod callable;
mod dispatch;
mod error;
mod matcher;
mod registry;
mod scope;
mod signature;
mod synth;
mod value;

pub use crate::{
    annotation::{Annotation, AnnotationFields, RawAnnotation, Role, normalize},
    callable::{
        Arguments, Callable, CallableId, Container, ContainerBuilder, Function, FunctionBuilder,
    },
    dispatch::{extract_keywords, run, stringlist},
    error::{BoxError, DispatchError, DispatchErrorCode, Result, SpecError, SpecErrorCode},
    matcher::resolve,
    registry::Registry,
    scope::{Scope, with_scope},
    signature::{ParamDefault, Signature, SignatureBuilder},
    synth::{Binding, DEFAULT_PREFIX, ParserSpec, Synthesizer, SynthesizerBuilder, VariadicRule},
    value::{Coercion, CoercionError, Value},
};

//! Form builders and the delegating form proxy
//!
//! A [`FormBuilder`] is any object that answers named operations with either
//! markup ([`Outcome::Emitted`]), a plain value, or a nested builder. Widgets
//! never talk to one directly: [`FormBuilderProxy`] wraps it, renames a few
//! operations, and writes emitted markup straight into the output buffer.

pub mod helpers;
pub mod proxy;
pub mod registry;
pub mod standard;

pub use helpers::{form_for, FormForOptions};
pub use proxy::{canonical_name, FormBuilderProxy, ProxyClass, PROXY_RENAMES};
pub use registry::BuilderRegistry;
pub use standard::StandardFormBuilder;

use crate::error::TrellisResult;
use crate::value::Value;
use crate::widget::OutputBuffer;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// Options bag handed to builders
pub type Options = BTreeMap<String, Value>;

/// Block run with a nested builder, e.g. for `fields_for`
pub type FieldsBlock<'a> = &'a mut dyn FnMut(&mut dyn FormBuilder) -> TrellisResult<()>;

/// The model a form edits
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormObject {
    attributes: BTreeMap<String, Value>,
    children: BTreeMap<String, Rc<FormObject>>,
}

impl FormObject {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an attribute
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Attach an associated object for nested fields
    pub fn with_child(mut self, name: impl Into<String>, child: FormObject) -> Self {
        self.children.insert(name.into(), Rc::new(child));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    pub fn child(&self, name: &str) -> Option<Rc<FormObject>> {
        self.children.get(name).cloned()
    }
}

/// Construction arguments shared by every builder
#[derive(Debug, Clone)]
pub struct FormArgs {
    pub object_name: String,
    pub object: Option<Rc<FormObject>>,
    pub template: OutputBuffer,
    pub options: Options,
}

/// Result of a builder operation
pub enum Outcome {
    /// Markup meant for the output buffer
    Emitted(String),
    /// Any other value
    Value(Value),
    /// A nested builder the caller may keep calling
    Builder(Box<dyn FormBuilder>),
}

/// Result of a call forwarded through a proxy
///
/// Markup never appears here; the proxy has already written it.
pub enum Returned {
    Value(Value),
    Builder(Box<dyn FormBuilder>),
}

impl Returned {
    pub fn is_nil(&self) -> bool {
        matches!(self, Self::Value(Value::Nil))
    }

    pub fn into_builder(self) -> Option<Box<dyn FormBuilder>> {
        match self {
            Self::Builder(builder) => Some(builder),
            Self::Value(_) => None,
        }
    }

    pub fn into_value(self) -> Option<Value> {
        match self {
            Self::Value(value) => Some(value),
            Self::Builder(_) => None,
        }
    }
}

impl fmt::Debug for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Emitted(markup) => f.debug_tuple("Emitted").field(markup).finish(),
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Builder(b) => f.debug_tuple("Builder").field(&b.builder_name()).finish(),
        }
    }
}

impl fmt::Debug for Returned {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Builder(b) => f.debug_tuple("Builder").field(&b.builder_name()).finish(),
        }
    }
}

/// A form-builder implementation driven by operation name
pub trait FormBuilder {
    /// Name used in error messages
    fn builder_name(&self) -> &str;

    /// Whether `operation` is understood
    fn responds_to(&self, operation: &str) -> bool;

    /// Perform `operation`
    fn call(
        &mut self,
        operation: &str,
        args: &[Value],
        block: Option<FieldsBlock<'_>>,
    ) -> TrellisResult<Outcome>;
}

/// A constructible builder implementation
#[derive(Clone, Copy)]
pub struct BuilderClass {
    name: &'static str,
    construct: fn(FormArgs) -> Box<dyn FormBuilder>,
}

impl BuilderClass {
    pub const fn new(name: &'static str, construct: fn(FormArgs) -> Box<dyn FormBuilder>) -> Self {
        Self { name, construct }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Build an instance
    pub fn instantiate(&self, args: FormArgs) -> Box<dyn FormBuilder> {
        (self.construct)(args)
    }
}

/// Same name and same constructor
impl PartialEq for BuilderClass {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && std::ptr::eq(self.construct as *const (), other.construct as *const ())
    }
}

impl Eq for BuilderClass {}

impl fmt::Debug for BuilderClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BuilderClass").field(&self.name).finish()
    }
}

//! Delegating form proxy
//!
//! The proxy owns one parent builder and one output buffer. Every operation
//! is forwarded to the parent after renaming; markup results are appended to
//! the buffer and the caller gets `Nil` back. Values are returned as-is and
//! nested builders come back wrapped in a proxy on the same buffer.

use crate::error::{TrellisError, TrellisResult};
use crate::form::standard::StandardFormBuilder;
use crate::form::{
    BuilderClass, FieldsBlock, FormArgs, FormBuilder, FormObject, Options, Outcome, Returned,
};
use crate::value::Value;
use crate::widget::OutputBuffer;
use std::rc::Rc;
use std::sync::{Arc, LazyLock};
use tracing::{debug, trace};

/// Operations renamed before forwarding (requested name, canonical name)
pub const PROXY_RENAMES: &[(&str, &str)] = &[("simple_fields_for", "fields_for")];

/// The name an operation is forwarded under
pub fn canonical_name(operation: &str) -> &str {
    PROXY_RENAMES
        .iter()
        .find(|(from, _)| *from == operation)
        .map_or(operation, |(_, to)| *to)
}

static STANDARD: LazyLock<Arc<ProxyClass>> =
    LazyLock::new(|| ProxyClass::new(StandardFormBuilder::class()));

/// A proxy "class": which parent builder its instances construct
#[derive(Debug)]
pub struct ProxyClass {
    parent_builder_class: BuilderClass,
    superclass: Option<Arc<ProxyClass>>,
}

impl ProxyClass {
    /// A root proxy class wrapping `parent_builder_class`
    pub fn new(parent_builder_class: BuilderClass) -> Arc<Self> {
        Arc::new(Self {
            parent_builder_class,
            superclass: None,
        })
    }

    /// The shared root class wrapping [`StandardFormBuilder`]
    pub fn standard() -> Arc<Self> {
        Arc::clone(&STANDARD)
    }

    /// Derive a class with a different default parent builder
    ///
    /// `None` returns this very class.
    pub fn wrapping(self: &Arc<Self>, parent_builder_class: Option<BuilderClass>) -> Arc<Self> {
        match parent_builder_class {
            None => Arc::clone(self),
            Some(parent_builder_class) => {
                debug!(
                    "Deriving form proxy class wrapping {}",
                    parent_builder_class.name()
                );
                Arc::new(Self {
                    parent_builder_class,
                    superclass: Some(Arc::clone(self)),
                })
            }
        }
    }

    pub fn parent_builder_class(&self) -> BuilderClass {
        self.parent_builder_class
    }

    /// The class this one was derived from, if any
    pub fn superclass(&self) -> Option<&Arc<ProxyClass>> {
        self.superclass.as_ref()
    }

    /// Instantiate a proxy, constructing its parent from the same arguments
    pub fn build(
        self: &Arc<Self>,
        object_name: impl Into<String>,
        object: Option<Rc<FormObject>>,
        template: OutputBuffer,
        options: Options,
    ) -> FormBuilderProxy {
        FormBuilderProxy::new(
            Arc::clone(self),
            FormArgs {
                object_name: object_name.into(),
                object,
                template,
                options,
            },
        )
    }
}

/// Forwarding wrapper around a parent form builder
pub struct FormBuilderProxy {
    class: Arc<ProxyClass>,
    parent: Box<dyn FormBuilder>,
    template: OutputBuffer,
}

impl FormBuilderProxy {
    pub fn new(class: Arc<ProxyClass>, args: FormArgs) -> Self {
        let template = args.template.clone();
        let parent = class.parent_builder_class().instantiate(args);
        Self {
            class,
            parent,
            template,
        }
    }

    /// Wrap an already constructed builder
    pub fn adopt(
        class: Arc<ProxyClass>,
        parent: Box<dyn FormBuilder>,
        template: OutputBuffer,
    ) -> Self {
        Self {
            class,
            parent,
            template,
        }
    }

    pub fn class(&self) -> &Arc<ProxyClass> {
        &self.class
    }

    /// The wrapped builder
    pub fn parent(&self) -> &dyn FormBuilder {
        self.parent.as_ref()
    }

    pub fn parent_mut(&mut self) -> &mut dyn FormBuilder {
        self.parent.as_mut()
    }

    /// The buffer emitted markup goes to
    pub fn template(&self) -> &OutputBuffer {
        &self.template
    }

    /// Forward an operation to the parent
    pub fn forward(
        &mut self,
        operation: &str,
        args: &[Value],
        block: Option<FieldsBlock<'_>>,
    ) -> TrellisResult<Returned> {
        forward(
            &self.class,
            self.parent.as_mut(),
            &self.template,
            operation,
            args,
            block,
        )
    }

    /// Forward an operation without a block
    pub fn invoke(&mut self, operation: &str, args: &[Value]) -> TrellisResult<Returned> {
        self.forward(operation, args, None)
    }

    /// Forward an operation with a block receiving the nested builder
    pub fn invoke_with<F>(
        &mut self,
        operation: &str,
        args: &[Value],
        mut block: F,
    ) -> TrellisResult<Returned>
    where
        F: FnMut(&mut dyn FormBuilder) -> TrellisResult<()>,
    {
        let block: FieldsBlock<'_> = &mut block;
        self.forward(operation, args, Some(block))
    }
}

impl FormBuilder for FormBuilderProxy {
    fn builder_name(&self) -> &str {
        self.parent.builder_name()
    }

    fn responds_to(&self, operation: &str) -> bool {
        self.parent.responds_to(canonical_name(operation))
    }

    fn call(
        &mut self,
        operation: &str,
        args: &[Value],
        block: Option<FieldsBlock<'_>>,
    ) -> TrellisResult<Outcome> {
        self.forward(operation, args, block).map(into_outcome)
    }
}

/// Proxy view over a nested builder handed to a block
struct NestedProxy<'a> {
    class: Arc<ProxyClass>,
    parent: &'a mut dyn FormBuilder,
    template: OutputBuffer,
}

impl FormBuilder for NestedProxy<'_> {
    fn builder_name(&self) -> &str {
        self.parent.builder_name()
    }

    fn responds_to(&self, operation: &str) -> bool {
        self.parent.responds_to(canonical_name(operation))
    }

    fn call(
        &mut self,
        operation: &str,
        args: &[Value],
        block: Option<FieldsBlock<'_>>,
    ) -> TrellisResult<Outcome> {
        forward(
            &self.class,
            &mut *self.parent,
            &self.template,
            operation,
            args,
            block,
        )
        .map(into_outcome)
    }
}

fn into_outcome(returned: Returned) -> Outcome {
    match returned {
        Returned::Value(value) => Outcome::Value(value),
        Returned::Builder(builder) => Outcome::Builder(builder),
    }
}

fn forward(
    class: &Arc<ProxyClass>,
    parent: &mut dyn FormBuilder,
    template: &OutputBuffer,
    operation: &str,
    args: &[Value],
    block: Option<FieldsBlock<'_>>,
) -> TrellisResult<Returned> {
    let canonical = canonical_name(operation);
    if !parent.responds_to(canonical) {
        return Err(TrellisError::UnsupportedOperation {
            operation: operation.to_string(),
            builder: parent.builder_name().to_string(),
        });
    }
    trace!("Forwarding {} to {} as {}", operation, parent.builder_name(), canonical);

    let outcome = match block {
        Some(block) => {
            // Nested builders reach the block through a proxy on the same buffer
            let mut wrapped = |nested: &mut dyn FormBuilder| -> TrellisResult<()> {
                let mut view = NestedProxy {
                    class: Arc::clone(class),
                    parent: nested,
                    template: template.clone(),
                };
                block(&mut view)
            };
            let wrapped: FieldsBlock<'_> = &mut wrapped;
            parent.call(canonical, args, Some(wrapped))?
        }
        None => parent.call(canonical, args, None)?,
    };

    Ok(match outcome {
        Outcome::Emitted(markup) => {
            template.concat(&markup);
            Returned::Value(Value::Nil)
        }
        Outcome::Value(value) => Returned::Value(value),
        Outcome::Builder(builder) => Returned::Builder(Box::new(FormBuilderProxy::adopt(
            Arc::clone(class),
            builder,
            template.clone(),
        ))),
    })
}

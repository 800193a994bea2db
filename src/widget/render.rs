//! Render context, output sink and cache-aware emission

use crate::cache::{Cacheability, FragmentCache};
use crate::error::TrellisResult;
use crate::form::ProxyClass;
use crate::widget::Widget;
use html_escape::encode_text;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;
use tracing::debug;

/// Append-only text sink
///
/// Clones share the same underlying buffer, so a render context, the form
/// proxies it creates and their nested builders all write to one place.
#[derive(Debug, Clone, Default)]
pub struct OutputBuffer(Rc<RefCell<String>>);

impl OutputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append text verbatim
    pub fn concat(&self, text: &str) {
        self.0.borrow_mut().push_str(text);
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Copy of everything written so far
    pub fn contents(&self) -> String {
        self.0.borrow().clone()
    }

    pub fn ends_with(&self, suffix: &str) -> bool {
        self.0.borrow().ends_with(suffix)
    }

    /// Whether two handles share the same buffer
    pub fn same_buffer(&self, other: &OutputBuffer) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    fn split_off(&self, at: usize) -> String {
        self.0.borrow_mut().split_off(at)
    }
}

/// Everything a widget needs while rendering
pub struct RenderContext {
    output: OutputBuffer,
    cache: Option<Arc<dyn FragmentCache>>,
    form_class: Arc<ProxyClass>,
}

impl RenderContext {
    /// A context with a fresh buffer, no cache and the standard form proxy
    pub fn new() -> Self {
        Self::with_output(OutputBuffer::new())
    }

    /// A context writing into an existing buffer
    pub fn with_output(output: OutputBuffer) -> Self {
        Self {
            output,
            cache: None,
            form_class: ProxyClass::standard(),
        }
    }

    /// Attach a fragment cache
    pub fn with_cache(mut self, cache: Arc<dyn FragmentCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Attach an optional fragment cache, as returned by the store factory
    pub fn with_optional_cache(mut self, cache: Option<Arc<dyn FragmentCache>>) -> Self {
        self.cache = cache;
        self
    }

    /// Use a different proxy class for `form_for`
    pub fn with_form_class(mut self, form_class: Arc<ProxyClass>) -> Self {
        self.form_class = form_class;
        self
    }

    pub fn output(&self) -> &OutputBuffer {
        &self.output
    }

    pub fn cache(&self) -> Option<&Arc<dyn FragmentCache>> {
        self.cache.as_ref()
    }

    pub fn form_class(&self) -> &Arc<ProxyClass> {
        &self.form_class
    }

    /// Write escaped text
    pub fn text(&mut self, text: impl fmt::Display) {
        self.output.concat(&encode_text(&text.to_string()));
    }

    /// Write markup verbatim
    pub fn raw(&mut self, markup: &str) {
        self.output.concat(markup);
    }

    /// Emit a nested widget
    pub fn widget(&mut self, widget: &dyn Widget) -> TrellisResult<()> {
        emit(widget, self)
    }

    /// Run `f` and return what it wrote instead of leaving it in the buffer
    pub fn capture<F>(&mut self, f: F) -> TrellisResult<String>
    where
        F: FnOnce(&mut Self) -> TrellisResult<()>,
    {
        let start = self.output.len();
        let result = f(self);
        let captured = self.output.split_off(start);
        result.map(|()| captured)
    }
}

impl Default for RenderContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Emit a widget into the context
///
/// A cacheable widget rendered with a cache attached goes through
/// fetch-or-store under its cache name; everything else renders directly.
pub fn emit<W: Widget + ?Sized>(widget: &W, ctx: &mut RenderContext) -> TrellisResult<()> {
    let cache = match ctx.cache() {
        Some(cache) if widget.is_cacheable() => Arc::clone(cache),
        _ => return widget.content(ctx),
    };

    let key = widget.cache_name()?;
    let options = widget.cache_options();
    debug!(
        "Emitting {} through {} cache",
        widget.widget_type().name(),
        cache.store_name()
    );

    let fragment = cache.fetch_or_store(&key, &options, &mut || {
        ctx.capture(|ctx| widget.content(ctx))
    })?;
    ctx.raw(&fragment);
    Ok(())
}

/// Emit a widget and return the full contents of the context's buffer
pub fn render<W: Widget + ?Sized>(widget: &W, ctx: &mut RenderContext) -> TrellisResult<String> {
    emit(widget, ctx)?;
    Ok(ctx.output().contents())
}

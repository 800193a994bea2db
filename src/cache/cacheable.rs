//! Declarative cacheability for widgets
//!
//! A widget type opts into caching by carrying a [`Cacheable`] declaration.
//! The declaration fixes which inputs identify a rendered fragment; every
//! instance derives its [`CacheKey`] from it at render time.

use crate::cache::key::{CacheKey, CacheOptions};
use crate::error::{TrellisError, TrellisResult};
use crate::value::Value;
use crate::widget::Widget;

/// Options accepted when declaring a widget type cacheable
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheableOptions {
    /// Restrict dynamic keys to these needed variables
    pub needs_keys: Option<Vec<String>>,
    /// Ask the backend to store the key verbatim instead of digesting it
    pub skip_digest: bool,
}

impl CacheableOptions {
    pub fn needs_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.needs_keys = Some(keys.into_iter().map(Into::into).collect());
        self
    }

    pub fn skip_digest(mut self, skip: bool) -> Self {
        self.skip_digest = skip;
        self
    }
}

/// A widget type's cacheable declaration
#[derive(Debug, Clone, PartialEq)]
pub struct Cacheable {
    static_keys: Vec<Value>,
    dynamic_keys: Vec<String>,
    skip_digest: bool,
}

impl Cacheable {
    /// Build a declaration
    ///
    /// Dynamic keys default to every needed variable; `needs_keys` narrows
    /// them while keeping the order of `needed_variables`.
    pub fn declare<I, K>(needed_variables: &[&str], static_keys: I, options: CacheableOptions) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<Value>,
    {
        let mut dynamic_keys: Vec<String> = Vec::with_capacity(needed_variables.len());
        for name in needed_variables {
            let allowed = options
                .needs_keys
                .as_ref()
                .is_none_or(|allow| allow.iter().any(|k| k == name));
            if allowed && !dynamic_keys.iter().any(|k| k == name) {
                dynamic_keys.push((*name).to_string());
            }
        }

        Self {
            static_keys: static_keys.into_iter().map(Into::into).collect(),
            dynamic_keys,
            skip_digest: options.skip_digest,
        }
    }

    pub fn static_keys(&self) -> &[Value] {
        &self.static_keys
    }

    pub fn dynamic_keys(&self) -> &[String] {
        &self.dynamic_keys
    }

    pub fn skip_digest(&self) -> bool {
        self.skip_digest
    }
}

/// Cache identity for any widget
pub trait Cacheability {
    /// Whether the widget's type carries a cacheable declaration
    fn is_cacheable(&self) -> bool;

    /// Compute the cache key
    ///
    /// Static keys come first in declared order. A symbol is resolved through
    /// the widget accessor of that name when the widget has one, otherwise it
    /// is used as-is. Dynamic keys follow, read from the widget's assigns.
    /// `Nil` entries are dropped. Accessor failures propagate unchanged.
    fn cache_name(&self) -> TrellisResult<CacheKey>;

    /// Options handed to the backend alongside the key
    fn cache_options(&self) -> CacheOptions;
}

impl<W: Widget + ?Sized> Cacheability for W {
    fn is_cacheable(&self) -> bool {
        self.widget_type().cacheable_opts().is_some()
    }

    fn cache_name(&self) -> TrellisResult<CacheKey> {
        let ty = self.widget_type();
        let declaration = ty
            .cacheable_opts()
            .ok_or_else(|| TrellisError::NotCacheable(ty.name().to_string()))?;

        let mut parts = Vec::with_capacity(
            declaration.static_keys().len() + declaration.dynamic_keys().len(),
        );

        for key in declaration.static_keys() {
            let resolved = match key {
                Value::Symbol(name) => match self.accessor(name) {
                    Some(result) => result?,
                    None => key.clone(),
                },
                literal => literal.clone(),
            };
            parts.push(resolved);
        }

        for name in declaration.dynamic_keys() {
            parts.push(self.assigns().read(name));
        }

        Ok(CacheKey::new(parts))
    }

    fn cache_options(&self) -> CacheOptions {
        let ty = self.widget_type();
        CacheOptions {
            skip_digest: ty.cacheable_opts().is_some_and(Cacheable::skip_digest),
            scope: Some(ty.name().to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::{Assigns, RenderContext, WidgetType};

    struct Sidebar {
        ty: WidgetType,
        assigns: Assigns,
        locale: Option<&'static str>,
    }

    impl Widget for Sidebar {
        fn widget_type(&self) -> &WidgetType {
            &self.ty
        }

        fn assigns(&self) -> &Assigns {
            &self.assigns
        }

        fn accessor(&self, name: &str) -> Option<TrellisResult<Value>> {
            match name {
                "locale" => Some(Ok(Value::from(self.locale))),
                "broken" => Some(Err(TrellisError::accessor("broken", "no session"))),
                _ => None,
            }
        }

        fn content(&self, ctx: &mut RenderContext) -> TrellisResult<()> {
            ctx.text("sidebar");
            Ok(())
        }
    }

    fn sidebar(ty: WidgetType, pairs: &[(&str, Value)], locale: Option<&'static str>) -> Sidebar {
        let assigns = ty.assigns(pairs.iter().cloned()).unwrap();
        Sidebar { ty, assigns, locale }
    }

    #[test]
    fn declare_defaults_to_all_needs() {
        let decl = Cacheable::declare(&["user", "posts"], ["v1"], CacheableOptions::default());
        assert_eq!(decl.dynamic_keys(), &["user".to_string(), "posts".to_string()]);
        assert!(!decl.skip_digest());
    }

    #[test]
    fn declare_narrows_with_needs_keys() {
        let options = CacheableOptions::default().needs_keys(["posts", "unknown"]);
        let decl = Cacheable::declare(&["user", "posts"], Vec::<Value>::new(), options);
        assert_eq!(decl.dynamic_keys(), &["posts".to_string()]);
    }

    #[test]
    fn cache_name_orders_static_then_dynamic() {
        let ty = WidgetType::new("Views::Sidebar")
            .needs(["user", "page"])
            .cacheable([Value::from("sidebar"), Value::sym("locale")], CacheableOptions::default());
        let widget = sidebar(ty, &[("user", "alice".into()), ("page", 3.into())], Some("en"));

        let key = widget.cache_name().unwrap();
        assert_eq!(
            key.parts(),
            &[
                Value::from("sidebar"),
                Value::from("en"),
                Value::from("alice"),
                Value::Int(3)
            ]
        );
    }

    #[test]
    fn unknown_symbol_is_kept_literally() {
        let ty = WidgetType::new("Views::Sidebar")
            .cacheable([Value::sym("not_an_accessor")], CacheableOptions::default());
        let widget = sidebar(ty, &[], None);
        assert_eq!(widget.cache_name().unwrap().parts(), &[Value::sym("not_an_accessor")]);
    }

    #[test]
    fn nil_entries_are_dropped() {
        let ty = WidgetType::new("Views::Sidebar")
            .needs(["user"])
            .needs_default("page", Value::Nil)
            .cacheable([Value::sym("locale"), Value::from("tail")], CacheableOptions::default());
        let widget = sidebar(ty, &[("user", "bob".into())], None);
        assert_eq!(
            widget.cache_name().unwrap().parts(),
            &[Value::from("tail"), Value::from("bob")]
        );
    }

    #[test]
    fn accessor_failure_propagates() {
        let ty = WidgetType::new("Views::Sidebar")
            .cacheable([Value::sym("broken")], CacheableOptions::default());
        let widget = sidebar(ty, &[], None);
        assert!(matches!(
            widget.cache_name(),
            Err(TrellisError::Accessor { ref name, .. }) if name == "broken"
        ));
    }

    #[test]
    fn options_carry_skip_digest() {
        let ty = WidgetType::new("Views::Sidebar")
            .cacheable(["x"], CacheableOptions::default().skip_digest(true));
        let widget = sidebar(ty, &[], None);
        assert!(widget.is_cacheable());
        assert!(widget.cache_options().skip_digest);
    }

    #[test]
    fn options_are_scoped_to_widget_type() {
        let ty = WidgetType::new("Views::Sidebar").cacheable(["x"], CacheableOptions::default());
        let widget = sidebar(ty, &[], None);
        assert_eq!(widget.cache_options().scope.as_deref(), Some("Views::Sidebar"));
    }

    #[test]
    fn undeclared_is_not_cacheable() {
        let widget = sidebar(WidgetType::new("Views::Plain"), &[], None);
        assert!(!widget.is_cacheable());
        assert!(!widget.cache_options().skip_digest);
        assert!(matches!(widget.cache_name(), Err(TrellisError::NotCacheable(_))));
    }
}

//! Widget descriptors and the renderable unit interface
//!
//! A widget type is described once by an immutable [`WidgetType`]: its name,
//! the variables it needs, and an optional cacheable declaration. Instances
//! carry validated [`Assigns`] and produce markup through [`Widget::content`].
//!
//! ```
//! use std::sync::LazyLock;
//! use trellis::cache::CacheableOptions;
//! use trellis::value::Value;
//! use trellis::widget::WidgetType;
//!
//! static PROFILE: LazyLock<WidgetType> = LazyLock::new(|| {
//!     WidgetType::new("Views::Users::Profile")
//!         .needs(["user", "theme"])
//!         .cacheable([Value::sym("locale")], CacheableOptions::default())
//! });
//!
//! assert_eq!(PROFILE.needed_variables(), vec!["user", "theme"]);
//! assert!(PROFILE.cacheable_opts().is_some());
//! ```

pub mod render;

pub use render::{emit, render, OutputBuffer, RenderContext};

use crate::cache::{Cacheable, CacheableOptions};
use crate::error::{TrellisError, TrellisResult};
use crate::value::Value;
use std::collections::BTreeMap;
use tracing::debug;

/// A variable a widget type needs to render
#[derive(Debug, Clone, PartialEq)]
pub struct Need {
    pub name: String,
    /// Value used when the caller does not supply one; `None` means required
    pub default: Option<Value>,
}

/// Immutable per-type descriptor for a widget
#[derive(Debug, Clone)]
pub struct WidgetType {
    name: String,
    needs: Vec<Need>,
    cacheable: Option<Cacheable>,
}

impl WidgetType {
    /// Start describing a widget type
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            needs: Vec::new(),
            cacheable: None,
        }
    }

    /// Declare required variables
    pub fn needs<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            self.push_need(name.into(), None);
        }
        self
    }

    /// Declare an optional variable with a default value
    pub fn needs_default(mut self, name: impl Into<String>, default: impl Into<Value>) -> Self {
        self.push_need(name.into(), Some(default.into()));
        self
    }

    fn push_need(&mut self, name: String, default: Option<Value>) {
        match self.needs.iter_mut().find(|n| n.name == name) {
            Some(existing) => existing.default = default,
            None => self.needs.push(Need { name, default }),
        }
    }

    /// Declare this type cacheable
    ///
    /// Dynamic keys are taken from the needs declared before this call.
    /// Declaring again replaces the previous declaration.
    pub fn cacheable<I, K>(mut self, static_keys: I, options: CacheableOptions) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<Value>,
    {
        let needed = self.needed_variables();
        let declaration = Cacheable::declare(&needed, static_keys, options);
        debug!(
            "Declared {} cacheable: {} static, {} dynamic keys",
            self.name,
            declaration.static_keys().len(),
            declaration.dynamic_keys().len()
        );
        self.cacheable = Some(declaration);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn needs_list(&self) -> &[Need] {
        &self.needs
    }

    /// Names of the variables this type needs, in declaration order
    pub fn needed_variables(&self) -> Vec<&str> {
        self.needs.iter().map(|n| n.name.as_str()).collect()
    }

    /// The cacheable declaration, if any
    pub fn cacheable_opts(&self) -> Option<&Cacheable> {
        self.cacheable.as_ref()
    }

    /// Validate construction input against the declared needs
    ///
    /// Types that declare no needs accept any variables.
    pub fn assigns<I, K, V>(&self, given: I) -> TrellisResult<Assigns>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mut values: BTreeMap<String, Value> = given
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        if !self.needs.is_empty() {
            if let Some(extra) = values
                .keys()
                .find(|k| !self.needs.iter().any(|n| &n.name == *k))
            {
                return Err(TrellisError::UnexpectedAssign {
                    widget: self.name.clone(),
                    name: extra.clone(),
                });
            }
        }

        for need in &self.needs {
            if values.contains_key(&need.name) {
                continue;
            }
            match &need.default {
                Some(default) => {
                    values.insert(need.name.clone(), default.clone());
                }
                None => {
                    return Err(TrellisError::MissingAssign {
                        widget: self.name.clone(),
                        name: need.name.clone(),
                    })
                }
            }
        }

        Ok(Assigns(values))
    }
}

/// Validated variables held by a widget instance
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Assigns(BTreeMap<String, Value>);

impl Assigns {
    /// Read a variable by name
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Read a variable, treating an unset one as `Nil`
    pub fn read(&self, name: &str) -> Value {
        self.get(name).cloned().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// A renderable unit
pub trait Widget {
    /// The type-level descriptor shared by all instances
    fn widget_type(&self) -> &WidgetType;

    /// Instance state, read by name for dynamic cache keys
    fn assigns(&self) -> &Assigns;

    /// Zero-argument accessor lookup
    ///
    /// Returns `None` when the widget has no accessor of that name.
    fn accessor(&self, name: &str) -> Option<TrellisResult<Value>> {
        let _ = name;
        None
    }

    /// Write this widget's markup
    fn content(&self, ctx: &mut RenderContext) -> TrellisResult<()>;
}

//! Builder classes by configured name

use crate::config::schema::FormsConfig;
use crate::error::{TrellisError, TrellisResult};
use crate::form::proxy::ProxyClass;
use crate::form::standard::StandardFormBuilder;
use crate::form::BuilderClass;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Name the standard builder is registered under
pub const STANDARD_BUILDER: &str = "standard";

/// Registry of builder classes a form proxy can wrap
#[derive(Debug, Clone)]
pub struct BuilderRegistry {
    classes: BTreeMap<String, BuilderClass>,
}

impl BuilderRegistry {
    /// A registry holding the standard builder
    pub fn new() -> Self {
        let mut registry = Self {
            classes: BTreeMap::new(),
        };
        registry.register(STANDARD_BUILDER, StandardFormBuilder::class());
        registry
    }

    /// Register or replace a builder class
    pub fn register(&mut self, name: impl Into<String>, class: BuilderClass) {
        let name = name.into();
        debug!("Registering form builder {} as {}", class.name(), name);
        self.classes.insert(name, class);
    }

    /// Look up a builder class
    pub fn get(&self, name: &str) -> TrellisResult<BuilderClass> {
        self.classes
            .get(name)
            .copied()
            .ok_or_else(|| TrellisError::UnknownBuilder(name.to_string()))
    }

    /// Registered names in sorted order
    pub fn names(&self) -> Vec<&str> {
        self.classes.keys().map(String::as_str).collect()
    }

    /// The proxy class render contexts should use for `config`
    ///
    /// The standard builder maps to the shared root class; anything else is
    /// derived from it.
    pub fn proxy_class(&self, config: &FormsConfig) -> TrellisResult<Arc<ProxyClass>> {
        let class = self.get(&config.default_builder)?;
        let root = ProxyClass::standard();
        if class == root.parent_builder_class() {
            return Ok(root);
        }
        Ok(root.wrapping(Some(class)))
    }
}

impl Default for BuilderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

//! Cache keys and their expansion into storage keys

use crate::value::Value;
use sha2::{Digest, Sha256};
use std::fmt;

/// Ordered key sequence computed for one render
///
/// Never contains `Nil`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CacheKey(Vec<Value>);

impl CacheKey {
    /// Build a key, dropping `Nil` parts
    pub fn new(parts: impl IntoIterator<Item = Value>) -> Self {
        Self(parts.into_iter().filter(|v| !v.is_nil()).collect())
    }

    pub fn parts(&self) -> &[Value] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{}", part)?;
        }
        Ok(())
    }
}

/// Options passed to the backend with each key
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheOptions {
    /// Use the key verbatim instead of digesting it
    pub skip_digest: bool,
    /// Folded into the digest so equal keys from different widget types
    /// never share a fragment. Ignored with `skip_digest`.
    pub scope: Option<String>,
}

impl CacheOptions {
    /// Options that keep the key verbatim
    pub fn verbatim() -> Self {
        Self {
            skip_digest: true,
            scope: None,
        }
    }

    pub fn scoped(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }
}

/// Turns a joined key into a fixed-size storage identifier
pub trait KeyDigest: Send + Sync {
    fn digest(&self, input: &str) -> String;
}

/// SHA256 digest, first 16 bytes hex-encoded
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Digest;

impl KeyDigest for Sha256Digest {
    fn digest(&self, input: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(input.as_bytes());
        let result = hasher.finalize();
        hex::encode(&result[..16])
    }
}

/// Namespaced storage key builder shared by the backends
pub struct KeyExpander {
    namespace: String,
    digest: Box<dyn KeyDigest>,
}

impl KeyExpander {
    pub const DEFAULT_NAMESPACE: &'static str = "views";

    pub fn new(namespace: impl Into<String>) -> Self {
        Self::with_digest(namespace, Box::new(Sha256Digest))
    }

    pub fn with_digest(namespace: impl Into<String>, digest: Box<dyn KeyDigest>) -> Self {
        Self {
            namespace: namespace.into(),
            digest,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Expand a key into the string the backend stores under
    ///
    /// `skip_digest` keeps the `/`-joined segments; otherwise they are
    /// replaced by the digest of the scope and segments. A non-empty
    /// namespace is prefixed.
    pub fn expand(&self, key: &CacheKey, options: &CacheOptions) -> String {
        let joined = key.to_string();
        let body = match (options.skip_digest, &options.scope) {
            (true, _) => joined,
            (false, Some(scope)) => self.digest.digest(&format!("{}:{}", scope, joined)),
            (false, None) => self.digest.digest(&joined),
        };

        if self.namespace.is_empty() {
            body
        } else {
            format!("{}/{}", self.namespace, body)
        }
    }
}

impl Default for KeyExpander {
    fn default() -> Self {
        Self::new(Self::DEFAULT_NAMESPACE)
    }
}

impl fmt::Debug for KeyExpander {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyExpander")
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

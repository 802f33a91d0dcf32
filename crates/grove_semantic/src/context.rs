//! Per-request context shared by every resolver of one execution.

use rustc_hash::FxHashMap;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::any::{Any, TypeId};
use std::sync::Arc;

pub use tokio_util::sync::CancellationToken;

#[derive(Default, Clone)]
struct ContextInner {
    data: FxHashMap<String, Value>,
    extensions: FxHashMap<TypeId, Arc<dyn Any + Send + Sync>>,
    cancellation: Option<CancellationToken>,
}

/// Request context.
///
/// Holds caller-supplied values (JSON values by key, typed values by type)
/// and an optional cancellation token. Cloning is cheap; concurrent requests
/// each carry their own context.
#[derive(Clone, Default)]
pub struct Context {
    inner: Arc<ContextInner>,
}

impl Context {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a serializable value under `key`.
    #[must_use]
    pub fn with_value<T: Serialize>(mut self, key: impl Into<String>, value: T) -> Self {
        self.set(key, value);
        self
    }

    /// Stores a typed value, retrievable with [`Context::data`].
    #[must_use]
    pub fn with_data<T: Any + Send + Sync>(mut self, value: T) -> Self {
        Arc::make_mut(&mut self.inner)
            .extensions
            .insert(TypeId::of::<T>(), Arc::new(value));
        self
    }

    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        Arc::make_mut(&mut self.inner).cancellation = Some(token);
        self
    }

    /// Stores a serializable value; values that fail to serialize are stored as null.
    pub fn set<T: Serialize>(&mut self, key: impl Into<String>, value: T) {
        let value = serde_json::to_value(value).unwrap_or(Value::Null);
        Arc::make_mut(&mut self.inner).data.insert(key.into(), value);
    }

    /// Reads a value under `key`, deserialized into `T`.
    #[must_use]
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.inner
            .data
            .get(key)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    /// Raw JSON value under `key`.
    #[must_use]
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.inner.data.get(key)
    }

    /// Typed value stored with [`Context::with_data`].
    #[must_use]
    pub fn data<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.inner
            .extensions
            .get(&TypeId::of::<T>())
            .and_then(|value| value.downcast_ref::<T>())
    }

    #[must_use]
    pub fn cancellation(&self) -> Option<&CancellationToken> {
        self.inner.cancellation.as_ref()
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner
            .cancellation
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("data", &self.inner.data)
            .field("extensions", &self.inner.extensions.len())
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

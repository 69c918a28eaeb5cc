//! Typed adapters between collected data types
//!
//! A validator may require a data type that differs from what a collector
//! produces. Adapters convert items from one tagged type to another. The
//! registry is keyed by the `(from, to)` pair and is consulted once per
//! validator source when the pipeline is planned, never per item.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::Result;
use crate::types::DataType;

/// Converts an item of one data type into another
pub trait Adapter: Send + Sync {
    fn adapt(&self, value: &Value) -> Result<Value>;
}

/// Adapter backed by a closure
pub struct CallbackAdapter {
    callback: Box<dyn Fn(&Value) -> Result<Value> + Send + Sync>,
}

impl Adapter for CallbackAdapter {
    fn adapt(&self, value: &Value) -> Result<Value> {
        (self.callback)(value)
    }
}

/// Wrap a conversion closure as a shared adapter
pub fn adapter_fn<F>(f: F) -> Arc<dyn Adapter>
where
    F: Fn(&Value) -> Result<Value> + Send + Sync + 'static,
{
    Arc::new(CallbackAdapter {
        callback: Box::new(f),
    })
}

/// How items of a collector reach a validator
#[derive(Clone)]
pub enum AdapterMatch {
    /// Items are passed through unchanged
    Direct,
    /// Items are converted by a registered adapter
    Adapted(Arc<dyn Adapter>),
    /// No way to feed these items to the validator; the source is skipped
    Incompatible,
}

impl AdapterMatch {
    pub fn is_compatible(&self) -> bool {
        !matches!(self, AdapterMatch::Incompatible)
    }

    /// Apply the match to one item
    pub fn apply(&self, value: &Value) -> Result<Value> {
        match self {
            AdapterMatch::Adapted(adapter) => adapter.adapt(value),
            _ => Ok(value.clone()),
        }
    }
}

impl fmt::Debug for AdapterMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdapterMatch::Direct => f.write_str("Direct"),
            AdapterMatch::Adapted(_) => f.write_str("Adapted"),
            AdapterMatch::Incompatible => f.write_str("Incompatible"),
        }
    }
}

/// Link-time registration of an adapter
///
/// Submitted with `inventory::submit!` by crates that ship adapters.
pub struct AdapterRegistration {
    pub from: &'static str,
    pub to: &'static str,
    pub build: fn() -> Arc<dyn Adapter>,
}

inventory::collect!(AdapterRegistration);

/// Registry of adapters keyed by `(from, to)` data types
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    entries: HashMap<(DataType, DataType), Arc<dyn Adapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every adapter submitted through `inventory`
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for registration in inventory::iter::<AdapterRegistration> {
            registry.register(
                DataType::new(registration.from),
                DataType::new(registration.to),
                (registration.build)(),
            );
        }
        registry
    }

    /// Register an adapter, replacing any existing one for the same pair
    pub fn register(&mut self, from: DataType, to: DataType, adapter: Arc<dyn Adapter>) {
        log::debug!("Registering adapter {} -> {}", from, to);
        self.entries.insert((from, to), adapter);
    }

    pub fn get(&self, from: &DataType, to: &DataType) -> Option<Arc<dyn Adapter>> {
        self.entries.get(&(from.clone(), to.clone())).cloned()
    }

    /// Decide how items of type `produced` reach a validator requiring `required`
    pub fn resolve(&self, produced: Option<&DataType>, required: Option<&DataType>) -> AdapterMatch {
        let Some(required) = required else {
            return AdapterMatch::Direct;
        };
        let Some(produced) = produced else {
            return AdapterMatch::Incompatible;
        };
        if produced == required {
            return AdapterMatch::Direct;
        }
        match self.get(produced, required) {
            Some(adapter) => AdapterMatch::Adapted(adapter),
            None => AdapterMatch::Incompatible,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Merge another registry into this one; entries from `other` win
    pub fn merge(&mut self, other: AdapterRegistry) {
        self.entries.extend(other.entries);
    }
}

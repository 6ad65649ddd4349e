// SPDX-License-Identifier: MIT OR Apache-2.0
//! Connection type registry.
//!
//! Every port carries a string type tag. The registry maps each tag to a
//! [`TypeDescriptor`] holding its display colour, the rule deciding which input
//! tags it may feed, and the Rust type materialized in port value slots.
//!
//! Registration happens once at startup through [`TypeProvider`]s supplied by
//! the host and plugins; afterwards the registry is read-only unless it is
//! explicitly rebuilt.

use crate::error::{GraphError, Result};
use egui::Color32;
use indexmap::IndexMap;
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// Predicate deciding whether an output of one tag may feed an input tag
pub type CompatibilityFn = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Rust type stored in the value slot of ports with a given tag
#[derive(Clone, Copy)]
pub struct ValueType {
    type_id: TypeId,
    type_name: &'static str,
    make: fn() -> Box<dyn Any + Send + Sync>,
}

fn make_default<T: Any + Default + Send + Sync>() -> Box<dyn Any + Send + Sync> {
    Box::new(T::default())
}

impl ValueType {
    /// Value type backed by `T::default()`
    pub fn of<T: Any + Default + Send + Sync>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            make: make_default::<T>,
        }
    }

    /// Whether this is the value type for `T`
    pub fn is<T: Any>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    /// Rust name of the value type
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub(crate) fn instantiate(&self) -> Box<dyn Any + Send + Sync> {
        (self.make)()
    }
}

impl fmt::Debug for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ValueType").field(&self.type_name).finish()
    }
}

/// Static information about one connection type
#[derive(Clone)]
pub struct TypeDescriptor {
    /// Unique tag, e.g. `"Condition"`
    pub tag: String,
    /// Colour used for knobs and wires
    pub color: Color32,
    /// Type materialized in port value slots
    pub value_type: Option<ValueType>,
    /// Custom compatibility rule; `None` means exact tag equality
    compatible_with: Option<CompatibilityFn>,
}

impl TypeDescriptor {
    /// Descriptor using exact tag matching and no value slot
    pub fn new(tag: impl Into<String>, color: Color32) -> Self {
        Self {
            tag: tag.into(),
            color,
            value_type: None,
            compatible_with: None,
        }
    }

    /// Set the value slot type
    pub fn with_value<T: Any + Default + Send + Sync>(mut self) -> Self {
        self.value_type = Some(ValueType::of::<T>());
        self
    }

    /// Replace the exact-match rule with a custom predicate over input tags
    pub fn with_compatibility(
        mut self,
        rule: impl Fn(&str) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.compatible_with = Some(Arc::new(rule));
        self
    }

    /// Whether an output with this descriptor may feed an input tagged `input_tag`
    pub fn accepts(&self, input_tag: &str) -> bool {
        match &self.compatible_with {
            Some(rule) => rule(input_tag),
            None => self.tag == input_tag,
        }
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("tag", &self.tag)
            .field("color", &self.color)
            .field("value_type", &self.value_type)
            .field("custom_rule", &self.compatible_with.is_some())
            .finish()
    }
}

/// Supplies type descriptors at startup
pub trait TypeProvider {
    /// Descriptors to register
    fn type_descriptors(&self) -> Vec<TypeDescriptor>;
}

/// Registry of connection types keyed by tag
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: IndexMap<String, TypeDescriptor>,
}

impl TypeRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a set of providers
    pub fn from_providers(providers: &[&dyn TypeProvider]) -> Result<Self> {
        let mut registry = Self::new();
        for provider in providers {
            for descriptor in provider.type_descriptors() {
                registry.register(descriptor)?;
            }
        }
        Ok(registry)
    }

    /// Register a descriptor. A repeated tag is an error and the first
    /// registration stays active.
    pub fn register(&mut self, descriptor: TypeDescriptor) -> Result<()> {
        if self.types.contains_key(&descriptor.tag) {
            return Err(GraphError::DuplicateTypeTag(descriptor.tag));
        }
        tracing::debug!(tag = %descriptor.tag, "registered connection type");
        self.types.insert(descriptor.tag.clone(), descriptor);
        Ok(())
    }

    /// Discard the cache and re-register everything from `providers`.
    ///
    /// On failure the registry keeps its previous contents.
    pub fn rebuild(&mut self, providers: &[&dyn TypeProvider]) -> Result<()> {
        let rebuilt = Self::from_providers(providers)?;
        tracing::info!(count = rebuilt.len(), "rebuilt connection type registry");
        *self = rebuilt;
        Ok(())
    }

    /// Look up a descriptor
    pub fn lookup(&self, tag: &str) -> Result<&TypeDescriptor> {
        self.types
            .get(tag)
            .ok_or_else(|| GraphError::UnknownTypeTag(tag.to_string()))
    }

    /// Check that an output tag may feed an input tag.
    ///
    /// Both tags must be registered; the output's descriptor decides.
    pub fn check_compatible(&self, output_tag: &str, input_tag: &str) -> Result<()> {
        let output = self.lookup(output_tag)?;
        self.lookup(input_tag)?;
        if output.accepts(input_tag) {
            Ok(())
        } else {
            Err(GraphError::IncompatibleTypes)
        }
    }

    /// Whether an output tag may feed an input tag; unknown tags never match
    pub fn compatible(&self, output_tag: &str, input_tag: &str) -> bool {
        self.check_compatible(output_tag, input_tag).is_ok()
    }

    /// Whether a tag is registered
    pub fn contains(&self, tag: &str) -> bool {
        self.types.contains_key(tag)
    }

    /// Registered descriptors in registration order
    pub fn descriptors(&self) -> impl Iterator<Item = &TypeDescriptor> {
        self.types.values()
    }

    /// Number of registered tags
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

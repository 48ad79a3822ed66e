//! Comparison and patch options.
//!
//! [`PatchConfig`] is the user-facing bag of optional settings. It is resolved
//! once into an immutable [`Options`] bundle, which then derives the options
//! for each child slot while the engine recurses: [`Options::child_options`]
//! for a named record field and [`Options::element_options`] for the
//! elements of a collection.
//!
//! # Defaults
//!
//! | Setting | Default |
//! |---|---|
//! | `sorted` | `false` |
//! | `map` | `false` |
//! | `key` | the element itself |
//! | `value` | the element itself |
//! | `entry` | `(key, value) -> value` |
//! | `identity` | equality of `key` |
//! | `element_factory` | none (payloads pass through unreconstructed) |
//!
//! # Inheritance
//!
//! Element options inherit everything from the collection's options, with the
//! collection's `element` override applied on top. Child options of a record
//! field keep only the traversal-wide settings (`sorted` and the type
//! registry); collection-shape settings start again from the defaults, then the
//! parent type's field hook and any configured `fields` entry are applied.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use tp_types::{Record, Value};

use crate::error::DiffResult;
use crate::typed::Diffable;

/// Projects an element (or entry value) to another value.
pub type KeyFn = Arc<dyn Fn(&Value) -> Value + Send + Sync>;
/// Folds a key and a value back into a collection element.
pub type EntryFn = Arc<dyn Fn(&Value, Value) -> Value + Send + Sync>;
/// Decides whether two sequence elements are the same logical element.
pub type IdentityFn = Arc<dyn Fn(&Value, &Value) -> bool + Send + Sync>;
/// Rebuilds a typed element from a raw payload.
pub type ElementFactory = Arc<dyn Fn(&Value) -> DiffResult<Value> + Send + Sync>;
/// Per-field options hook exposed by a record type.
pub type FieldOptionsFn = Arc<dyn Fn(&str) -> Option<PatchConfig> + Send + Sync>;

/// Registry of record types that expose per-field options.
///
/// Lookups are keyed by the record's type tag, so the options resolver never
/// needs to inspect a value beyond its tag.
#[derive(Clone, Default)]
pub struct TypeRegistry {
    field_hooks: HashMap<String, FieldOptionsFn>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a [`Diffable`] type's field options hook under its tag,
    /// along with the types it nests (see [`Diffable::register_nested`]).
    /// Registering a tag that is already present is a no-op.
    pub fn register<T: Diffable + 'static>(&mut self) -> &mut Self {
        if self.contains(T::TYPE_TAG) {
            return self;
        }
        self.field_hooks
            .insert(T::TYPE_TAG.to_string(), Arc::new(|field: &str| T::field_options(field)));
        T::register_nested(self);
        self
    }

    /// Register a field options hook for an arbitrary type tag.
    pub fn register_hook(&mut self, tag: impl Into<String>, hook: FieldOptionsFn) -> &mut Self {
        self.field_hooks.insert(tag.into(), hook);
        self
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.field_hooks.contains_key(tag)
    }

    /// The override configuration a type declares for one of its fields.
    pub fn field_options(&self, tag: &str, field: &str) -> Option<PatchConfig> {
        self.field_hooks.get(tag).and_then(|hook| hook(field))
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tags: Vec<&String> = self.field_hooks.keys().collect();
        tags.sort();
        f.debug_struct("TypeRegistry").field("types", &tags).finish()
    }
}

/// User-supplied configuration. Every setting is optional; unset settings
/// fall back to the defaults (or to the inherited value) on resolution.
#[derive(Clone, Default)]
pub struct PatchConfig {
    /// Inputs are already sorted by key; skip the merge-join sort.
    pub sorted: Option<bool>,
    /// Treat sequences as keyed collections.
    pub map: Option<bool>,
    pub key: Option<KeyFn>,
    pub value: Option<KeyFn>,
    pub entry: Option<EntryFn>,
    pub identity: Option<IdentityFn>,
    pub element_factory: Option<ElementFactory>,
    /// Override applied to the options of collection elements.
    pub element: Option<Box<PatchConfig>>,
    /// Overrides applied to the options of named record fields.
    pub fields: BTreeMap<String, PatchConfig>,
    pub registry: Option<Arc<TypeRegistry>>,
}

impl PatchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keyed-collection configuration: sequences are diffed by the value of
    /// the named field of each element.
    pub fn keyed_map(field: impl Into<String>) -> Self {
        Self::new().with_map(true).keyed_by(field)
    }

    pub fn with_sorted(mut self, sorted: bool) -> Self {
        self.sorted = Some(sorted);
        self
    }

    pub fn with_map(mut self, map: bool) -> Self {
        self.map = Some(map);
        self
    }

    pub fn with_key(mut self, key: impl Fn(&Value) -> Value + Send + Sync + 'static) -> Self {
        self.key = Some(Arc::new(key));
        self
    }

    /// Use the named record field of each element as its key. Elements that
    /// are not records, or lack the field, key as `Null`.
    pub fn keyed_by(self, field: impl Into<String>) -> Self {
        let field = field.into();
        self.with_key(move |element: &Value| element.get(&field).cloned().unwrap_or_default())
    }

    pub fn with_value(mut self, value: impl Fn(&Value) -> Value + Send + Sync + 'static) -> Self {
        self.value = Some(Arc::new(value));
        self
    }

    pub fn with_entry(
        mut self,
        entry: impl Fn(&Value, Value) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.entry = Some(Arc::new(entry));
        self
    }

    pub fn with_identity(
        mut self,
        identity: impl Fn(&Value, &Value) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.identity = Some(Arc::new(identity));
        self
    }

    pub fn with_element_factory(
        mut self,
        factory: impl Fn(&Value) -> DiffResult<Value> + Send + Sync + 'static,
    ) -> Self {
        self.element_factory = Some(Arc::new(factory));
        self
    }

    /// Reconstruct inserted and replaced payloads as instances of `T`.
    pub fn element_type<T: Diffable + 'static>(self) -> Self {
        self.with_element_factory(T::reconstruct)
    }

    pub fn with_element(mut self, element: PatchConfig) -> Self {
        self.element = Some(Box::new(element));
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, config: PatchConfig) -> Self {
        self.fields.insert(name.into(), config);
        self
    }

    pub fn with_registry(mut self, registry: Arc<TypeRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }
}

impl fmt::Debug for PatchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatchConfig")
            .field("sorted", &self.sorted)
            .field("map", &self.map)
            .field("key", &self.key.is_some())
            .field("value", &self.value.is_some())
            .field("entry", &self.entry.is_some())
            .field("identity", &self.identity.is_some())
            .field("element_factory", &self.element_factory.is_some())
            .field("element", &self.element)
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

/// A fully resolved options bundle. Never mutated after resolution.
#[derive(Clone)]
pub struct Options {
    pub sorted: bool,
    pub map: bool,
    key: KeyFn,
    value: KeyFn,
    entry: EntryFn,
    identity: Option<IdentityFn>,
    element_factory: Option<ElementFactory>,
    element: Option<Arc<PatchConfig>>,
    fields: Arc<BTreeMap<String, PatchConfig>>,
    registry: Arc<TypeRegistry>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            sorted: false,
            map: false,
            key: Arc::new(Value::clone),
            value: Arc::new(Value::clone),
            entry: Arc::new(|_key: &Value, value: Value| value),
            identity: None,
            element_factory: None,
            element: None,
            fields: Arc::new(BTreeMap::new()),
            registry: Arc::new(TypeRegistry::new()),
        }
    }
}

impl Options {
    /// Fill every unset setting of `config` with its default.
    pub fn resolve(config: &PatchConfig) -> Self {
        Self::default().merged(config)
    }

    /// Apply `config` over these options; settings it leaves unset are kept.
    pub fn merged(&self, config: &PatchConfig) -> Self {
        let mut fields = self.fields.clone();
        if !config.fields.is_empty() {
            let merged = Arc::make_mut(&mut fields);
            for (name, field) in &config.fields {
                merged.insert(name.clone(), field.clone());
            }
        }
        Self {
            sorted: config.sorted.unwrap_or(self.sorted),
            map: config.map.unwrap_or(self.map),
            key: config.key.clone().unwrap_or_else(|| self.key.clone()),
            value: config.value.clone().unwrap_or_else(|| self.value.clone()),
            entry: config.entry.clone().unwrap_or_else(|| self.entry.clone()),
            identity: config.identity.clone().or_else(|| self.identity.clone()),
            element_factory: config
                .element_factory
                .clone()
                .or_else(|| self.element_factory.clone()),
            element: config
                .element
                .as_ref()
                .map(|e| Arc::new((**e).clone()))
                .or_else(|| self.element.clone()),
            fields,
            registry: config
                .registry
                .clone()
                .unwrap_or_else(|| self.registry.clone()),
        }
    }

    /// Options for the field `field` of the record `parent`.
    pub fn child_options(&self, parent: &Record, field: &str) -> Self {
        let mut child = Self {
            sorted: self.sorted,
            registry: self.registry.clone(),
            ..Self::default()
        };
        if let Some(tag) = parent.type_tag() {
            if let Some(config) = self.registry.field_options(tag, field) {
                child = child.merged(&config);
            }
        }
        if let Some(config) = self.fields.get(field) {
            child = child.merged(config);
        }
        child
    }

    /// Options for the elements of a collection diffed with these options.
    pub fn element_options(&self) -> Self {
        match &self.element {
            Some(config) => self.merged(config),
            None => self.clone(),
        }
    }

    pub fn key(&self, element: &Value) -> Value {
        (self.key)(element)
    }

    pub fn value(&self, element: &Value) -> Value {
        (self.value)(element)
    }

    pub fn entry(&self, key: &Value, value: Value) -> Value {
        (self.entry)(key, value)
    }

    /// Whether two sequence elements are the same logical element.
    pub fn same_identity(&self, a: &Value, b: &Value) -> bool {
        match &self.identity {
            Some(identity) => identity(a, b),
            None => self.key(a) == self.key(b),
        }
    }

    pub fn has_element_factory(&self) -> bool {
        self.element_factory.is_some()
    }

    /// Turn a raw payload into the element it stands for.
    ///
    /// Without a factory the payload is passed through unchanged; inserts and
    /// replacements are treated alike.
    pub fn reconstruct(&self, payload: &Value) -> DiffResult<Value> {
        match &self.element_factory {
            Some(factory) => factory(payload),
            None => Ok(payload.clone()),
        }
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("sorted", &self.sorted)
            .field("map", &self.map)
            .field("identity", &self.identity.is_some())
            .field("element_factory", &self.element_factory.is_some())
            .field("element", &self.element)
            .field("fields", &self.fields)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

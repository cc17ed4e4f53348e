// Queryer variant registry
// Maps a discriminator string to the descriptor used to construct that
// variant. The registry is built once, before any compilation starts, and
// is read-only afterwards; duplicate discriminators are rejected at
// registration time rather than silently overwritten.

use std::collections::HashMap;
use std::fmt;

use tracing::debug;

use super::queryer::QueryerBuilder;

/// Declared kind of one bindable property value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// A JSON string.
    Text,
    /// A JSON number representable as `i64`.
    Int,
    /// A JSON boolean.
    Bool,
    /// A nested query expression, compiled recursively.
    Queryer,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Text => "a string",
            ValueKind::Int => "an integer",
            ValueKind::Bool => "a boolean",
            ValueKind::Queryer => "a query expression",
        };
        write!(f, "{}", name)
    }
}

/// Schema of one property a variant can bind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertySpec {
    name: String,
    required: bool,
    kind: ValueKind,
}

impl PropertySpec {
    /// A property every expression of the variant must supply.
    pub fn required(name: impl Into<String>, kind: ValueKind) -> Self {
        PropertySpec {
            name: name.into(),
            required: true,
            kind,
        }
    }

    /// A property an expression may omit, leaving the variant's default.
    pub fn optional(name: impl Into<String>, kind: ValueKind) -> Self {
        PropertySpec {
            name: name.into(),
            required: false,
            kind,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }
}

type StartFn = Box<dyn Fn() -> Box<dyn QueryerBuilder> + Send + Sync>;

/// Static description of one registered queryer variant: the discriminator
/// it answers to, its ordered property schema, and how to start building an
/// instance.
pub struct VariantDescriptor {
    name: String,
    properties: Vec<PropertySpec>,
    start: StartFn,
}

impl VariantDescriptor {
    pub fn new(
        name: impl Into<String>,
        properties: Vec<PropertySpec>,
        start: impl Fn() -> Box<dyn QueryerBuilder> + Send + Sync + 'static,
    ) -> Self {
        VariantDescriptor {
            name: name.into(),
            properties,
            start: Box::new(start),
        }
    }

    /// The discriminator this descriptor is registered under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared properties, in declaration order.
    pub fn properties(&self) -> &[PropertySpec] {
        &self.properties
    }

    /// Start a fresh builder for this variant.
    pub fn start(&self) -> Box<dyn QueryerBuilder> {
        (self.start)()
    }
}

impl fmt::Debug for VariantDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VariantDescriptor")
            .field("name", &self.name)
            .field("properties", &self.properties)
            .finish_non_exhaustive()
    }
}

/// Lookup table from discriminator to variant descriptor.
///
/// Immutable once built; share it by reference across however many threads
/// compile queries concurrently.
#[derive(Debug)]
pub struct QueryerRegistry {
    variants: HashMap<String, VariantDescriptor>,
}

impl QueryerRegistry {
    /// A registry holding exactly the built-in variants
    /// (`text`, `int`, `list`, `context`).
    pub fn with_builtins() -> Self {
        let mut variants = HashMap::new();
        for descriptor in super::builtins::descriptors() {
            variants.insert(descriptor.name().to_string(), descriptor);
        }
        QueryerRegistry { variants }
    }

    /// An empty builder for assembling a custom variant set.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Look up a discriminator. Matching is a case-sensitive exact
    /// comparison; `"Text"` does not resolve `"text"`.
    pub fn get(&self, name: &str) -> Option<&VariantDescriptor> {
        self.variants.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.variants.contains_key(name)
    }

    /// Names of every registered variant, in no particular order.
    pub fn variant_names(&self) -> impl Iterator<Item = &str> {
        self.variants.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }
}

impl Default for QueryerRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

/// Accumulates variant descriptors and freezes them into a registry.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    variants: HashMap<String, VariantDescriptor>,
}

impl RegistryBuilder {
    /// Register the built-in variants on top of whatever is already here.
    pub fn with_builtins(self) -> Result<Self, RegistryError> {
        let mut builder = self;
        for descriptor in super::builtins::descriptors() {
            builder = builder.register(descriptor)?;
        }
        Ok(builder)
    }

    /// Register one variant. A second descriptor under an already-taken
    /// discriminator is a configuration error, surfaced here rather than at
    /// compile time.
    pub fn register(mut self, descriptor: VariantDescriptor) -> Result<Self, RegistryError> {
        let name = descriptor.name().to_string();
        if self.variants.contains_key(&name) {
            return Err(RegistryError::DuplicateVariant(name));
        }
        debug!("Registered queryer variant `{}`", name);
        self.variants.insert(name, descriptor);
        Ok(self)
    }

    /// Freeze the accumulated variants into an immutable registry.
    pub fn build(self) -> QueryerRegistry {
        QueryerRegistry {
            variants: self.variants,
        }
    }
}

/// Errors raised while assembling a registry.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("queryer variant `{0}` is already registered")]
    DuplicateVariant(String),
}

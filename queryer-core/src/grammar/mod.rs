// Queryer grammar
// The variant registry, the property-binding machinery and the recursive
// compiler that turns decoded JSON query expressions into queryer trees.

pub mod builtins;
pub mod compiler;
pub mod queryer;
pub mod registry;


pub use builtins::{ContextQueryer, IntQueryer, ListQueryer, ObjectQueryer, TextQueryer};
pub use compiler::{GrammarCompiler, GrammarError, TYPE_KEY};
pub use queryer::{PropertyError, PropertyValue, Queryer, QueryerBuilder};
pub use registry::{
    PropertySpec, QueryerRegistry, RegistryBuilder, RegistryError, ValueKind, VariantDescriptor,
};

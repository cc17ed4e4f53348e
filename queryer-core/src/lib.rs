// Queryer grammar compiler
// Turns JSON-encoded query expressions into trees of polymorphic queryer
// nodes. Compilation only: evaluating a compiled tree against a document
// belongs to whatever engine consumes it.

pub mod decode;
pub mod error;
pub mod grammar;

// Source-form entry points over the built-in registry
pub use decode::{compile_file, compile_reader, compile_slice, compile_str};
pub use error::CompileError;

// Grammar types
pub use grammar::{
    builtins::{ContextQueryer, IntQueryer, ListQueryer, ObjectQueryer, TextQueryer},
    compiler::{GrammarCompiler, GrammarError, TYPE_KEY},
    queryer::{PropertyError, PropertyValue, Queryer, QueryerBuilder},
    registry::{
        PropertySpec, QueryerRegistry, RegistryBuilder, RegistryError, ValueKind,
        VariantDescriptor,
    },
};

use std::sync::OnceLock;

use serde_json::Value;

/// The shared registry holding exactly the built-in variants, initialized
/// on first use and read-only afterwards.
pub fn default_registry() -> &'static QueryerRegistry {
    static REGISTRY: OnceLock<QueryerRegistry> = OnceLock::new();
    REGISTRY.get_or_init(QueryerRegistry::with_builtins)
}

/// Compile one already-decoded query expression with the built-in variants.
///
/// Custom variant sets go through [`GrammarCompiler`] with a registry of
/// their own; this shortcut covers the common case.
pub fn compile(expr: &Value) -> Result<Box<dyn Queryer>, GrammarError> {
    GrammarCompiler::new(default_registry()).compile(expr)
}

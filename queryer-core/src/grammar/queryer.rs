// Compiled queryer nodes and their construction contract
// A Queryer is one node of a compiled query-evaluation tree. Builders
// receive property values while the grammar compiler binds an expression
// and are consumed once the node is fully assembled.

use std::any::Any;
use std::fmt;

/// One compiled query-evaluation rule.
///
/// Nodes are immutable once returned by the compiler and own all of their
/// data; no node keeps a reference into the JSON expression it was compiled
/// from. Compiled trees are handed off to whatever execution context
/// evaluates them, so every node is `Send + Sync`.
pub trait Queryer: fmt::Debug + Send + Sync {
    /// The grammar name of this node's variant (`"text"`, `"list"`, ...).
    fn type_name(&self) -> &str;

    /// Downcast support for consumers that need the concrete variant.
    fn as_any(&self) -> &dyn Any;
}

/// Construction-side contract of a queryer variant.
///
/// The compiler starts a fresh builder through the variant's descriptor,
/// assigns each supplied property with [`set`](QueryerBuilder::set) and
/// turns the builder into the finished node with
/// [`finish`](QueryerBuilder::finish). Required properties are enforced by
/// the compiler before `finish` is reached; `finish` itself may still fail
/// when the assembled state cannot form a node.
pub trait QueryerBuilder {
    /// Assign one declared property.
    fn set(&mut self, property: &str, value: PropertyValue) -> Result<(), PropertyError>;

    /// Consume the builder and produce the compiled node.
    fn finish(self: Box<Self>) -> Result<Box<dyn Queryer>, PropertyError>;
}

/// A value bound onto a queryer property, already matched against the
/// property's declared kind.
#[derive(Debug)]
pub enum PropertyValue {
    Text(String),
    Int(i64),
    Bool(bool),
    Queryer(Box<dyn Queryer>),
}

/// Errors raised by a variant's builder while a node is under construction.
#[derive(Debug, thiserror::Error)]
pub enum PropertyError {
    #[error("property `{0}` is not declared by this variant")]
    UnknownProperty(String),

    #[error("property `{0}` cannot hold the supplied value")]
    WrongKind(String),

    #[error("{0}")]
    Invalid(String),
}

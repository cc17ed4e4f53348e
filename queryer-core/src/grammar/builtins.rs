// Built-in queryer variants
// Four variants answer to registry discriminators (text, int, list,
// context). The object queryer is synthesized directly by the compiler for
// implicit field-matching expressions and is never looked up by name.

use std::any::Any;

use indexmap::IndexMap;

use super::queryer::{PropertyError, PropertyValue, Queryer, QueryerBuilder};
use super::registry::{PropertySpec, ValueKind, VariantDescriptor};

/// Extracts one text value. `value` holds the selection expression to
/// evaluate against the queried document; `grep` optionally narrows the
/// extracted text to a matching portion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextQueryer {
    pub value: String,
    pub grep: Option<String>,
}

impl Queryer for TextQueryer {
    fn type_name(&self) -> &str {
        "text"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl QueryerBuilder for TextQueryer {
    fn set(&mut self, property: &str, value: PropertyValue) -> Result<(), PropertyError> {
        match (property, value) {
            ("value", PropertyValue::Text(s)) => self.value = s,
            ("grep", PropertyValue::Text(s)) => self.grep = Some(s),
            ("value" | "grep", _) => return Err(PropertyError::WrongKind(property.to_string())),
            _ => return Err(PropertyError::UnknownProperty(property.to_string())),
        }
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<Box<dyn Queryer>, PropertyError> {
        Ok(self)
    }
}

/// Extracts one integer value from the selection named by `value`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntQueryer {
    pub value: String,
}

impl Queryer for IntQueryer {
    fn type_name(&self) -> &str {
        "int"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl QueryerBuilder for IntQueryer {
    fn set(&mut self, property: &str, value: PropertyValue) -> Result<(), PropertyError> {
        match (property, value) {
            ("value", PropertyValue::Text(s)) => self.value = s,
            ("value", _) => return Err(PropertyError::WrongKind(property.to_string())),
            _ => return Err(PropertyError::UnknownProperty(property.to_string())),
        }
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<Box<dyn Queryer>, PropertyError> {
        Ok(self)
    }
}

/// Selects a sequence of nodes (`from`) and applies a child rule
/// (`select`) to each of them, yielding a list of results.
#[derive(Debug)]
pub struct ListQueryer {
    pub from: String,
    pub select: Box<dyn Queryer>,
}

impl Queryer for ListQueryer {
    fn type_name(&self) -> &str {
        "list"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Default)]
struct ListBuilder {
    from: String,
    select: Option<Box<dyn Queryer>>,
}

impl QueryerBuilder for ListBuilder {
    fn set(&mut self, property: &str, value: PropertyValue) -> Result<(), PropertyError> {
        match (property, value) {
            ("from", PropertyValue::Text(s)) => self.from = s,
            ("select", PropertyValue::Queryer(q)) => self.select = Some(q),
            ("from" | "select", _) => return Err(PropertyError::WrongKind(property.to_string())),
            _ => return Err(PropertyError::UnknownProperty(property.to_string())),
        }
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<Box<dyn Queryer>, PropertyError> {
        let select = self
            .select
            .ok_or_else(|| PropertyError::Invalid("`select` was never supplied".to_string()))?;
        Ok(Box::new(ListQueryer {
            from: self.from,
            select,
        }))
    }
}

/// Narrows the evaluation context to the node selected by `from`, then
/// applies the child rule (`select`) within it.
#[derive(Debug)]
pub struct ContextQueryer {
    pub from: String,
    pub select: Box<dyn Queryer>,
}

impl Queryer for ContextQueryer {
    fn type_name(&self) -> &str {
        "context"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Default)]
struct ContextBuilder {
    from: String,
    select: Option<Box<dyn Queryer>>,
}

impl QueryerBuilder for ContextBuilder {
    fn set(&mut self, property: &str, value: PropertyValue) -> Result<(), PropertyError> {
        match (property, value) {
            ("from", PropertyValue::Text(s)) => self.from = s,
            ("select", PropertyValue::Queryer(q)) => self.select = Some(q),
            ("from" | "select", _) => return Err(PropertyError::WrongKind(property.to_string())),
            _ => return Err(PropertyError::UnknownProperty(property.to_string())),
        }
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<Box<dyn Queryer>, PropertyError> {
        let select = self
            .select
            .ok_or_else(|| PropertyError::Invalid("`select` was never supplied".to_string()))?;
        Ok(Box::new(ContextQueryer {
            from: self.from,
            select,
        }))
    }
}

/// Matches a set of named fields, each against its own child rule, in the
/// order the fields appeared in the expression.
///
/// Any map containing a `_type` key is read as a complexed expression, so a
/// field literally named `_type` cannot be written in this form.
#[derive(Debug, Default)]
pub struct ObjectQueryer {
    pub field_rules: IndexMap<String, Box<dyn Queryer>>,
}

impl ObjectQueryer {
    pub fn new(field_rules: IndexMap<String, Box<dyn Queryer>>) -> Self {
        ObjectQueryer { field_rules }
    }
}

impl Queryer for ObjectQueryer {
    fn type_name(&self) -> &str {
        "object"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Descriptors for the built-in variants, in registration order.
pub(crate) fn descriptors() -> Vec<VariantDescriptor> {
    vec![
        VariantDescriptor::new(
            "text",
            vec![
                PropertySpec::required("value", ValueKind::Text),
                PropertySpec::optional("grep", ValueKind::Text),
            ],
            || Box::new(TextQueryer::default()),
        ),
        VariantDescriptor::new(
            "int",
            vec![PropertySpec::required("value", ValueKind::Text)],
            || Box::new(IntQueryer::default()),
        ),
        VariantDescriptor::new(
            "list",
            vec![
                PropertySpec::required("from", ValueKind::Text),
                PropertySpec::required("select", ValueKind::Queryer),
            ],
            || Box::new(ListBuilder::default()),
        ),
        VariantDescriptor::new(
            "context",
            vec![
                PropertySpec::required("from", ValueKind::Text),
                PropertySpec::required("select", ValueKind::Queryer),
            ],
            || Box::new(ContextBuilder::default()),
        ),
    ]
}

// Grammar compiler
// Dispatches on the shape of a JSON query expression and builds the
// corresponding queryer tree, consulting the variant registry for
// discriminated forms. Compilation is pure: the first violation anywhere
// in the expression aborts the whole compile and no partial tree escapes.

use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::{debug, trace, warn};

use super::builtins::ObjectQueryer;
use super::queryer::{PropertyError, PropertyValue, Queryer};
use super::registry::{PropertySpec, QueryerRegistry, ValueKind, VariantDescriptor};

/// The discriminator key that marks a map as a complexed expression.
pub const TYPE_KEY: &str = "_type";

/// Compiles JSON query expressions against one variant registry.
///
/// The compiler holds no state beyond the registry reference, so one
/// instance can serve any number of compilations, concurrently or not.
#[derive(Debug)]
pub struct GrammarCompiler<'a> {
    registry: &'a QueryerRegistry,
}

impl<'a> GrammarCompiler<'a> {
    pub fn new(registry: &'a QueryerRegistry) -> Self {
        GrammarCompiler { registry }
    }

    /// Compile one query expression into a queryer tree.
    ///
    /// Three shapes are legal at an expression position: a shorthand string
    /// (`"type:value"`), a complexed map (`{"_type": ...}`) and an implicit
    /// field-matching map. Numbers, booleans, nulls and arrays are rejected
    /// wherever they appear.
    pub fn compile(&self, expr: &Value) -> Result<Box<dyn Queryer>, GrammarError> {
        match expr {
            Value::String(shorthand) => self.compile_shorthand(shorthand),
            Value::Object(map) if map.contains_key(TYPE_KEY) => self.compile_complexed(map),
            Value::Object(map) => self.compile_implicit(map),
            other => {
                warn!("Rejecting {} at an expression position", json_kind(other));
                Err(GrammarError::IllegalExpression {
                    found: json_kind(other),
                })
            }
        }
    }

    /// Shorthand sugar: `"type:value"` is canonicalized to
    /// `{"_type": type, "value": value}` and compiled as a complexed
    /// expression, so both spellings resolve identically.
    fn compile_shorthand(&self, shorthand: &str) -> Result<Box<dyn Queryer>, GrammarError> {
        trace!("Expanding shorthand expression `{}`", shorthand);
        let canonical = canonicalize_shorthand(shorthand)?;
        self.compile_complexed(&canonical)
    }

    fn compile_complexed(
        &self,
        expr: &Map<String, Value>,
    ) -> Result<Box<dyn Queryer>, GrammarError> {
        let type_name = match expr.get(TYPE_KEY) {
            Some(Value::String(name)) => name.as_str(),
            Some(Value::Null) | None => {
                warn!("Complexed expression carries no usable `{}`", TYPE_KEY);
                return Err(GrammarError::MissingType);
            }
            Some(other) => {
                warn!("`{}` holds {}, not a string", TYPE_KEY, json_kind(other));
                return Err(GrammarError::TypeNotString {
                    found: json_kind(other),
                });
            }
        };

        let descriptor = self.registry.get(type_name).ok_or_else(|| {
            warn!("No queryer variant registered for `{}`", type_name);
            GrammarError::UnsupportedType(type_name.to_string())
        })?;
        debug!("Resolved queryer variant `{}`", type_name);

        // Every key a declared property actually binds is consumed; whatever
        // is left over at the end is illegal.
        let mut consumed: Vec<&str> = Vec::with_capacity(descriptor.properties().len());
        let mut builder = descriptor.start();
        for spec in descriptor.properties() {
            match expr.get(spec.name()) {
                Some(supplied) if !supplied.is_null() => {
                    let value = self.bind_value(spec, supplied, descriptor)?;
                    builder
                        .set(spec.name(), value)
                        .map_err(|source| GrammarError::PropertySet {
                            property: spec.name().to_string(),
                            type_name: descriptor.name().to_string(),
                            source,
                        })?;
                    consumed.push(spec.name());
                }
                _ => {
                    if spec.is_required() {
                        warn!(
                            "Property `{}` missing on `{}` expression",
                            spec.name(),
                            descriptor.name()
                        );
                        return Err(GrammarError::MissingProperty {
                            property: spec.name().to_string(),
                            type_name: descriptor.name().to_string(),
                        });
                    }
                    // Optional and absent (a JSON null counts as absent):
                    // the builder keeps its default, and a null key stays
                    // unconsumed.
                }
            }
        }

        let leftovers: Vec<&str> = expr
            .keys()
            .map(String::as_str)
            .filter(|key| *key != TYPE_KEY && !consumed.contains(key))
            .collect();
        if !leftovers.is_empty() {
            let unexpected = leftovers.join(",");
            warn!(
                "Unexpected properties `{}` on `{}` expression",
                unexpected,
                descriptor.name()
            );
            return Err(GrammarError::UnexpectedProperties {
                unexpected,
                type_name: descriptor.name().to_string(),
            });
        }

        builder
            .finish()
            .map_err(|source| GrammarError::Instantiation {
                type_name: descriptor.name().to_string(),
                source,
            })
    }

    /// Match one supplied JSON value against the property's declared kind,
    /// recursing into the compiler for nested query expressions.
    fn bind_value(
        &self,
        spec: &PropertySpec,
        supplied: &Value,
        descriptor: &VariantDescriptor,
    ) -> Result<PropertyValue, GrammarError> {
        let mismatch = || GrammarError::PropertyType {
            property: spec.name().to_string(),
            type_name: descriptor.name().to_string(),
            expected: spec.kind(),
            found: json_kind(supplied),
        };

        match spec.kind() {
            ValueKind::Queryer => {
                trace!(
                    "Recursing into property `{}` of `{}`",
                    spec.name(),
                    descriptor.name()
                );
                Ok(PropertyValue::Queryer(self.compile(supplied)?))
            }
            ValueKind::Text => match supplied {
                Value::String(s) => Ok(PropertyValue::Text(s.clone())),
                _ => Err(mismatch()),
            },
            ValueKind::Int => match supplied.as_i64() {
                Some(n) => Ok(PropertyValue::Int(n)),
                None => Err(mismatch()),
            },
            ValueKind::Bool => match supplied {
                Value::Bool(b) => Ok(PropertyValue::Bool(*b)),
                _ => Err(mismatch()),
            },
        }
    }

    /// Implicit field-matching form: every value is itself an expression,
    /// and the synthesized object queryer keeps the fields in expression
    /// order.
    fn compile_implicit(
        &self,
        expr: &Map<String, Value>,
    ) -> Result<Box<dyn Queryer>, GrammarError> {
        trace!("Compiling implicit object with {} field(s)", expr.len());
        let mut field_rules: IndexMap<String, Box<dyn Queryer>> =
            IndexMap::with_capacity(expr.len());
        for (field, value) in expr {
            let rule = self.compile(value)?;
            field_rules.insert(field.clone(), rule);
        }
        Ok(Box::new(ObjectQueryer::new(field_rules)))
    }
}

/// Split a shorthand expression into its canonical complexed map.
///
/// The split must yield exactly a type and a value, so the value part
/// cannot itself contain a colon and a trailing colon reads as an empty
/// value rather than nothing.
fn canonicalize_shorthand(shorthand: &str) -> Result<Map<String, Value>, GrammarError> {
    let parts: Vec<&str> = shorthand.split(':').collect();
    if parts.len() != 2 {
        warn!(
            "Shorthand expression `{}` does not split into a type and a value",
            shorthand
        );
        return Err(GrammarError::IllegalShorthand(shorthand.to_string()));
    }

    let mut canonical = Map::new();
    canonical.insert(TYPE_KEY.to_string(), Value::String(parts[0].to_string()));
    canonical.insert("value".to_string(), Value::String(parts[1].to_string()));
    Ok(canonical)
}

/// Human-readable name for the kind of a JSON value, for diagnostics.
fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// A syntactically well-formed JSON value that violates the query grammar.
#[derive(Debug, thiserror::Error)]
pub enum GrammarError {
    /// A shorthand string did not split into exactly a type and a value.
    #[error("illegal shorthand expression: `{0}`")]
    IllegalShorthand(String),

    /// The `_type` key held something other than a string.
    #[error("`_type` must be a string, got {found}")]
    TypeNotString { found: &'static str },

    /// The `_type` key held null, which never names a variant.
    #[error("`_type` must be a string, got null")]
    MissingType,

    /// The discriminator named no registered variant.
    #[error("unsupported queryer type: `{0}`")]
    UnsupportedType(String),

    /// A required property was absent (or null) on the expression.
    #[error("property `{property}` is required for queryer type `{type_name}`")]
    MissingProperty { property: String, type_name: String },

    /// A supplied property value did not match the declared kind.
    #[error("property `{property}` on queryer type `{type_name}` expects {expected}, got {found}")]
    PropertyType {
        property: String,
        type_name: String,
        expected: ValueKind,
        found: &'static str,
    },

    /// The variant's builder refused an assignment the schema allowed.
    #[error("cannot set property `{property}` on queryer type `{type_name}`: {source}")]
    PropertySet {
        property: String,
        type_name: String,
        #[source]
        source: PropertyError,
    },

    /// The variant's builder could not assemble the final node.
    #[error("cannot instantiate queryer type `{type_name}`: {source}")]
    Instantiation {
        type_name: String,
        #[source]
        source: PropertyError,
    },

    /// Properties beyond the declared schema, comma-joined in expression
    /// order.
    #[error("unexpected properties `{unexpected}` on queryer type `{type_name}`")]
    UnexpectedProperties {
        unexpected: String,
        type_name: String,
    },

    /// The expression position held a JSON shape the grammar never accepts.
    #[error("illegal query expression: expected a string or an object, got {found}")]
    IllegalExpression { found: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::builtins::{IntQueryer, ListQueryer, TextQueryer};
    use serde_json::json;

    fn compile(expr: &Value) -> Result<Box<dyn Queryer>, GrammarError> {
        let registry = QueryerRegistry::with_builtins();
        GrammarCompiler::new(&registry).compile(expr)
    }

    #[test]
    fn test_shorthand_matches_complexed_form() {
        let short = compile(&json!("text:h1")).unwrap();
        let long = compile(&json!({"_type": "text", "value": "h1"})).unwrap();
        assert_eq!(format!("{:?}", short), format!("{:?}", long));

        let short = short.as_any().downcast_ref::<TextQueryer>().unwrap();
        assert_eq!(short.value, "h1");
        assert_eq!(short.grep, None);
    }

    #[test]
    fn test_shorthand_accepts_empty_value() {
        let node = compile(&json!("text:")).unwrap();
        let text = node.as_any().downcast_ref::<TextQueryer>().unwrap();
        assert_eq!(text.value, "");
    }

    #[test]
    fn test_shorthand_with_no_colon_is_illegal() {
        let err = compile(&json!("text")).unwrap_err();
        assert!(matches!(err, GrammarError::IllegalShorthand(s) if s == "text"));
    }

    #[test]
    fn test_shorthand_with_two_colons_is_illegal() {
        let err = compile(&json!("text:a:b")).unwrap_err();
        assert!(matches!(err, GrammarError::IllegalShorthand(s) if s == "text:a:b"));

        let err = compile(&json!("text:h1:")).unwrap_err();
        assert!(matches!(err, GrammarError::IllegalShorthand(_)));
    }

    #[test]
    fn test_shorthand_with_empty_type_hits_registry() {
        // ":h1" splits cleanly; the empty discriminator then fails lookup.
        let err = compile(&json!(":h1")).unwrap_err();
        assert!(matches!(err, GrammarError::UnsupportedType(t) if t.is_empty()));
    }

    #[test]
    fn test_unknown_discriminator() {
        let err = compile(&json!({"_type": "regex", "value": "x"})).unwrap_err();
        assert!(matches!(err, GrammarError::UnsupportedType(t) if t == "regex"));
    }

    #[test]
    fn test_discriminator_lookup_is_case_sensitive() {
        let err = compile(&json!({"_type": "Text", "value": "x"})).unwrap_err();
        assert!(matches!(err, GrammarError::UnsupportedType(t) if t == "Text"));
    }

    #[test]
    fn test_type_key_must_be_string() {
        let err = compile(&json!({"_type": 7, "value": "x"})).unwrap_err();
        assert!(matches!(err, GrammarError::TypeNotString { found: "a number" }));

        let err = compile(&json!({"_type": ["text"], "value": "x"})).unwrap_err();
        assert!(matches!(err, GrammarError::TypeNotString { found: "an array" }));
    }

    #[test]
    fn test_null_type_key_reads_as_missing() {
        let err = compile(&json!({"_type": null, "value": "x"})).unwrap_err();
        assert!(matches!(err, GrammarError::MissingType));
    }

    #[test]
    fn test_missing_required_property() {
        let err = compile(&json!({"_type": "int"})).unwrap_err();
        match err {
            GrammarError::MissingProperty {
                property,
                type_name,
            } => {
                assert_eq!(property, "value");
                assert_eq!(type_name, "int");
            }
            other => panic!("expected missing-property error, got {:?}", other),
        }
    }

    #[test]
    fn test_null_required_property_reads_as_missing() {
        let err = compile(&json!({"_type": "int", "value": null})).unwrap_err();
        assert!(matches!(err, GrammarError::MissingProperty { property, .. } if property == "value"));
    }

    #[test]
    fn test_property_kind_mismatch() {
        let err = compile(&json!({"_type": "text", "value": 5})).unwrap_err();
        match err {
            GrammarError::PropertyType {
                property,
                type_name,
                expected,
                found,
            } => {
                assert_eq!(property, "value");
                assert_eq!(type_name, "text");
                assert_eq!(expected, ValueKind::Text);
                assert_eq!(found, "a number");
            }
            other => panic!("expected property-type error, got {:?}", other),
        }
    }

    #[test]
    fn test_unexpected_properties_are_all_reported() {
        let err = compile(&json!({
            "_type": "text",
            "value": "h1",
            "trim": true,
            "limit": 3
        }))
        .unwrap_err();
        match err {
            GrammarError::UnexpectedProperties {
                unexpected,
                type_name,
            } => {
                assert_eq!(unexpected, "trim,limit");
                assert_eq!(type_name, "text");
            }
            other => panic!("expected unexpected-properties error, got {:?}", other),
        }
    }

    #[test]
    fn test_null_optional_property_is_left_unconsumed() {
        // A null on an optional property neither binds nor consumes the key.
        let err = compile(&json!({"_type": "text", "value": "h1", "grep": null})).unwrap_err();
        assert!(matches!(
            err,
            GrammarError::UnexpectedProperties { unexpected, .. } if unexpected == "grep"
        ));
    }

    #[test]
    fn test_optional_property_binds_when_supplied() {
        let node = compile(&json!({"_type": "text", "value": "h1", "grep": "[a-z]+"})).unwrap();
        let text = node.as_any().downcast_ref::<TextQueryer>().unwrap();
        assert_eq!(text.grep.as_deref(), Some("[a-z]+"));
    }

    #[test]
    fn test_nested_expression_compiles_recursively() {
        let node = compile(&json!({
            "_type": "list",
            "from": "li",
            "select": {"name": "text:a", "count": "int:span"}
        }))
        .unwrap();

        let list = node.as_any().downcast_ref::<ListQueryer>().unwrap();
        assert_eq!(list.from, "li");
        let object = list.select.as_any().downcast_ref::<ObjectQueryer>().unwrap();
        assert_eq!(object.field_rules.len(), 2);
        assert!(object.field_rules["name"]
            .as_any()
            .downcast_ref::<TextQueryer>()
            .is_some());
        assert!(object.field_rules["count"]
            .as_any()
            .downcast_ref::<IntQueryer>()
            .is_some());
    }

    #[test]
    fn test_nested_violation_aborts_outer_compile() {
        let err = compile(&json!({
            "_type": "list",
            "from": "li",
            "select": {"name": "text"}
        }))
        .unwrap_err();
        assert!(matches!(err, GrammarError::IllegalShorthand(s) if s == "text"));
    }

    #[test]
    fn test_implicit_object_preserves_field_order() {
        let node = compile(&json!({
            "zebra": "text:z",
            "apple": "text:a",
            "mango": "text:m"
        }))
        .unwrap();
        let object = node.as_any().downcast_ref::<ObjectQueryer>().unwrap();
        let fields: Vec<&str> = object.field_rules.keys().map(String::as_str).collect();
        assert_eq!(fields, vec!["zebra", "apple", "mango"]);
    }

    #[test]
    fn test_empty_implicit_object_compiles() {
        let node = compile(&json!({})).unwrap();
        let object = node.as_any().downcast_ref::<ObjectQueryer>().unwrap();
        assert!(object.field_rules.is_empty());
    }

    #[test]
    fn test_scalars_and_arrays_are_illegal_expressions() {
        for expr in [json!(42), json!(4.5), json!(true), json!(null), json!([1, 2])] {
            let err = compile(&expr).unwrap_err();
            assert!(
                matches!(err, GrammarError::IllegalExpression { .. }),
                "expected illegal-expression error for {}",
                expr
            );
        }
    }

    #[test]
    fn test_canonicalize_shorthand_layout() {
        let canonical = canonicalize_shorthand("int:span.count").unwrap();
        assert_eq!(canonical.len(), 2);
        assert_eq!(canonical[TYPE_KEY], json!("int"));
        assert_eq!(canonical["value"], json!("span.count"));
    }

    #[test]
    fn test_error_messages_name_the_offenders() {
        let err = compile(&json!({"_type": "regex", "value": "x"})).unwrap_err();
        assert_eq!(format!("{}", err), "unsupported queryer type: `regex`");

        let err = compile(&json!({"_type": "int"})).unwrap_err();
        assert_eq!(
            format!("{}", err),
            "property `value` is required for queryer type `int`"
        );

        let err = compile(&json!({"_type": "int", "value": "n", "a": 1, "b": 2})).unwrap_err();
        assert_eq!(
            format!("{}", err),
            "unexpected properties `a,b` on queryer type `int`"
        );
    }
}

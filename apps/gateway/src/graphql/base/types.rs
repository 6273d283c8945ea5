//! Translation of OpenAPI definitions into dynamic GraphQL object types
//!
//! Objects are backed by the raw JSON returned from the API server: every
//! field resolver looks up its original property key on the parent
//! `serde_json::Value` and hands scalars, nested objects and arrays down the
//! tree. Only definitions reachable from a list operation's return type are
//! emitted.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use async_graphql::dynamic::{
    Field, FieldFuture, FieldValue, Object, ResolverContext, Scalar, Type, TypeRef,
};
use serde_json::Value;

/// Scalar used for maps, `int-or-string` and untyped schemas
pub const JSON_SCALAR: &str = "JSON";

const DEFINITION_PREFIX: &str = "#/definitions/";

/// How a JSON value is exposed through GraphQL
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Shape {
    Scalar,
    Object,
    List(Box<Shape>),
}

impl Shape {
    pub(crate) fn to_field_value(&self, value: &Value) -> async_graphql::Result<Option<FieldValue<'static>>> {
        if value.is_null() {
            return Ok(None);
        }

        match self {
            Shape::Scalar => Ok(Some(FieldValue::value(async_graphql::Value::from_json(
                value.clone(),
            )?))),
            Shape::Object => Ok(Some(FieldValue::owned_any(value.clone()))),
            Shape::List(inner) => {
                let items = value.as_array().ok_or_else(|| {
                    async_graphql::Error::new(format!("expected an array, found {}", value))
                })?;
                let values = items
                    .iter()
                    .map(|item| {
                        inner
                            .to_field_value(item)
                            .map(|value| value.unwrap_or(FieldValue::NULL))
                    })
                    .collect::<async_graphql::Result<Vec<_>>>()?;
                Ok(Some(FieldValue::list(values)))
            }
        }
    }
}

/// Turn an arbitrary identifier into a valid GraphQL field name
///
/// Invalid characters become `_`, a leading digit gets a `_` prefix and the
/// reserved `__` prefix is collapsed.
pub(crate) fn sanitize_name(raw: &str) -> String {
    let mut name: String = raw
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();

    if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert(0, '_');
    }
    while name.starts_with("__") {
        name.remove(0);
    }
    name
}

/// GraphQL type name for a definition key
///
/// `io.k8s.api.core.v1.PodList` becomes `IoK8sApiCoreV1PodList`.
pub(crate) fn type_name(definition: &str) -> String {
    let name: String = definition
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect();

    sanitize_name(&name)
}

fn is_object_definition(schema: &Value) -> bool {
    schema
        .get("properties")
        .and_then(Value::as_object)
        .is_some_and(|properties| !properties.is_empty())
}

/// Collects the object types reachable from a set of root definitions
pub(crate) struct TypeCatalog<'a> {
    definitions: &'a BTreeMap<String, Value>,
    names: HashMap<String, String>,
    taken: BTreeSet<String>,
    pending: Vec<String>,
    uses_json: bool,
}

impl<'a> TypeCatalog<'a> {
    pub(crate) fn new(definitions: &'a BTreeMap<String, Value>) -> Self {
        Self {
            definitions,
            names: HashMap::new(),
            taken: BTreeSet::new(),
            pending: Vec::new(),
            uses_json: false,
        }
    }

    /// Queue an object definition for emission and return its type name
    ///
    /// Returns `None` when the definition is unknown or has no properties.
    pub(crate) fn object_type(&mut self, definition: &str) -> Option<String> {
        let schema = self.definitions.get(definition)?;
        if !is_object_definition(schema) {
            return None;
        }

        if let Some(name) = self.names.get(definition) {
            return Some(name.clone());
        }

        let base = type_name(definition);
        let mut name = base.clone();
        let mut suffix = 2;
        while !self.taken.insert(name.clone()) {
            name = format!("{}{}", base, suffix);
            suffix += 1;
        }

        self.names.insert(definition.to_string(), name.clone());
        self.pending.push(definition.to_string());
        Some(name)
    }

    /// Build every queued object, following references as they appear
    pub(crate) fn finish(mut self) -> Vec<(String, Type)> {
        let mut types = Vec::new();

        while let Some(definition) = self.pending.pop() {
            let name = self.names[&definition].clone();
            let object = self.build_object(&definition, &name);
            types.push((name, Type::from(object)));
        }

        if self.uses_json {
            let scalar = Scalar::new(JSON_SCALAR)
                .description("Arbitrary JSON value passed through from the API server");
            types.push((JSON_SCALAR.to_string(), Type::from(scalar)));
        }

        tracing::debug!(types = types.len(), "Translated OpenAPI definitions");
        types
    }

    fn build_object(&mut self, definition: &str, name: &str) -> Object {
        let definitions = self.definitions;
        let schema = &definitions[definition];

        let mut object = Object::new(name);
        if let Some(description) = schema.get("description").and_then(Value::as_str) {
            object = object.description(description);
        }

        let mut used = BTreeSet::new();
        let properties = schema.get("properties").and_then(Value::as_object);
        for (property, property_schema) in properties.into_iter().flatten() {
            let field_name = sanitize_name(property);
            if !used.insert(field_name.clone()) {
                tracing::warn!(
                    definition,
                    property = property.as_str(),
                    "Skipping property whose sanitized name is already taken"
                );
                continue;
            }

            let (type_ref, shape) = self.schema_type(property_schema);
            let mut field = json_field(field_name, property.clone(), type_ref, shape);
            if let Some(description) = property_schema.get("description").and_then(Value::as_str) {
                field = field.description(description);
            }
            object = object.field(field);
        }

        object
    }

    fn json(&mut self) -> (TypeRef, Shape) {
        self.uses_json = true;
        (TypeRef::named(JSON_SCALAR), Shape::Scalar)
    }

    fn definition_type(&mut self, definition: &str) -> (TypeRef, Shape) {
        if let Some(name) = self.object_type(definition) {
            return (TypeRef::named(name), Shape::Object);
        }

        let definitions = self.definitions;
        match definitions.get(definition) {
            // Aliases such as `Time` or `Quantity`; chained references are not followed
            Some(schema) if schema.get("$ref").is_none() => self.schema_type(schema),
            _ => self.json(),
        }
    }

    fn schema_type(&mut self, schema: &Value) -> (TypeRef, Shape) {
        if let Some(reference) = schema.get("$ref").and_then(Value::as_str) {
            return match reference.strip_prefix(DEFINITION_PREFIX) {
                Some(definition) => self.definition_type(definition),
                None => self.json(),
            };
        }

        let format = schema.get("format").and_then(Value::as_str);
        match schema.get("type").and_then(Value::as_str) {
            Some("array") => {
                let (inner, shape) = match schema.get("items") {
                    Some(items) => self.schema_type(items),
                    None => self.json(),
                };
                (TypeRef::List(Box::new(inner)), Shape::List(Box::new(shape)))
            }
            Some("string") if format == Some("int-or-string") => self.json(),
            Some("string") => (TypeRef::named(TypeRef::STRING), Shape::Scalar),
            Some("integer") if format == Some("int64") => {
                (TypeRef::named(TypeRef::FLOAT), Shape::Scalar)
            }
            Some("integer") => (TypeRef::named(TypeRef::INT), Shape::Scalar),
            Some("number") => (TypeRef::named(TypeRef::FLOAT), Shape::Scalar),
            Some("boolean") => (TypeRef::named(TypeRef::BOOLEAN), Shape::Scalar),
            _ => self.json(),
        }
    }
}

/// A field that reads `key` from a JSON-backed parent object
fn json_field(name: String, key: String, type_ref: TypeRef, shape: Shape) -> Field {
    Field::new(name, type_ref, move |ctx| {
        let result = read_property(&ctx, &key, &shape);
        FieldFuture::new(async move { result })
    })
}

fn read_property(
    ctx: &ResolverContext<'_>,
    key: &str,
    shape: &Shape,
) -> async_graphql::Result<Option<FieldValue<'static>>> {
    let parent = ctx.parent_value.try_downcast_ref::<Value>()?;
    match parent.get(key) {
        Some(value) => shape.to_field_value(value),
        None => Ok(None),
    }
}

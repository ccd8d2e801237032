//! Field constructors: one AST fragment per schema/property pair.
//!
//! Dispatch is a capability-keyed lookup table from (kind, format) to a
//! constructor function. Lookup falls back from the format-specific entry to
//! the format-agnostic entry for the same kind; failing both is an
//! unsupported-schema error naming the pair. New field kinds register
//! additional entries without touching the existing constructors.
use std::collections::HashMap;

use crate::contract::{JsonKind, Schema, SchemaOrRef};
use crate::error::{Error, Result};
use crate::graph::BindingGraph;
use crate::pytree::PyExpr;

pub struct NodeBuilderContext<'a, 'g> {
    pub bindings: &'g BindingGraph<'a>,
    pub registry: &'g NodeBuilderRegistry,
}

/// Constructor for one field fragment. `name` is the rendered attribute
/// identifier, `source` the raw property name in the wire format; a
/// `source=` kwarg is emitted only when they differ. `aux` kwargs are
/// appended last, in received order.
pub type NodeBuilderFn = fn(
    &NodeBuilderContext<'_, '_>,
    &Schema,
    &str,
    &str,
    &[(String, PyExpr)],
) -> Result<PyExpr>;

pub struct NodeBuilderRegistry {
    mapping: HashMap<(JsonKind, Option<String>), NodeBuilderFn>,
}

impl NodeBuilderRegistry {
    pub fn empty() -> Self {
        NodeBuilderRegistry { mapping: HashMap::new() }
    }

    pub fn register(&mut self, kind: JsonKind, format: Option<&str>, builder: NodeBuilderFn) {
        self.mapping.insert((kind, format.map(str::to_string)), builder);
    }

    pub fn lookup(&self, kind: JsonKind, format: Option<&str>) -> Result<NodeBuilderFn> {
        if let Some(f) = format {
            if let Some(builder) = self.mapping.get(&(kind, Some(f.to_string()))) {
                return Ok(*builder);
            }
        }
        self.mapping
            .get(&(kind, None))
            .copied()
            .ok_or_else(|| {
                Error::UnsupportedSchema(format!(
                    "unsupported type and format pair: {} and {}",
                    kind.as_str(),
                    format.unwrap_or("<none>"),
                ))
            })
    }
}

impl Default for NodeBuilderRegistry {
    fn default() -> Self {
        let mut registry = NodeBuilderRegistry::empty();
        registry.register(JsonKind::Number, None, build_float_field);
        registry.register(JsonKind::Number, Some("decimal"), build_decimal_field);
        registry.register(JsonKind::Integer, None, build_integer_field);
        registry.register(JsonKind::String, None, build_char_field);
        registry.register(JsonKind::Boolean, None, build_boolean_field);
        registry.register(JsonKind::Array, None, build_list_field);
        registry.register(JsonKind::Object, None, build_nested_field);
        registry
    }
}

/// Dispatch through the registry. `schema` must already be resolved; raw
/// references never reach a constructor.
pub fn build_property(
    nbctx: &NodeBuilderContext<'_, '_>,
    schema: &Schema,
    name: &str,
    source: &str,
    aux: &[(String, PyExpr)],
) -> Result<PyExpr> {
    let builder = nbctx.registry.lookup(schema.kind, schema.format.as_deref())?;
    builder(nbctx, schema, name, source, aux)
}

fn base_kwargs(name: &str, source: &str) -> Vec<(String, PyExpr)> {
    if name != source {
        vec![("source".to_string(), PyExpr::str(source))]
    } else {
        Vec::new()
    }
}

fn scalar_field(
    field_type: &str,
    name: &str,
    source: &str,
    extra: Vec<(String, PyExpr)>,
    aux: &[(String, PyExpr)],
) -> PyExpr {
    let mut kwargs = base_kwargs(name, source);
    kwargs.extend(extra);
    kwargs.extend(aux.iter().cloned());
    PyExpr::call(["fields".to_string(), field_type.to_string()], kwargs)
}

fn build_float_field(
    _nbctx: &NodeBuilderContext<'_, '_>,
    _schema: &Schema,
    name: &str,
    source: &str,
    aux: &[(String, PyExpr)],
) -> Result<PyExpr> {
    Ok(scalar_field("FloatField", name, source, Vec::new(), aux))
}

fn build_decimal_field(
    _nbctx: &NodeBuilderContext<'_, '_>,
    _schema: &Schema,
    name: &str,
    source: &str,
    aux: &[(String, PyExpr)],
) -> Result<PyExpr> {
    Ok(scalar_field(
        "DecimalField",
        name,
        source,
        vec![
            ("max_digits".to_string(), PyExpr::Number("20".into())),
            ("decimal_places".to_string(), PyExpr::Number("20".into())),
        ],
        aux,
    ))
}

fn build_integer_field(
    _nbctx: &NodeBuilderContext<'_, '_>,
    _schema: &Schema,
    name: &str,
    source: &str,
    aux: &[(String, PyExpr)],
) -> Result<PyExpr> {
    Ok(scalar_field("IntegerField", name, source, Vec::new(), aux))
}

fn build_char_field(
    _nbctx: &NodeBuilderContext<'_, '_>,
    _schema: &Schema,
    name: &str,
    source: &str,
    aux: &[(String, PyExpr)],
) -> Result<PyExpr> {
    Ok(scalar_field("CharField", name, source, Vec::new(), aux))
}

fn build_boolean_field(
    _nbctx: &NodeBuilderContext<'_, '_>,
    _schema: &Schema,
    name: &str,
    source: &str,
    aux: &[(String, PyExpr)],
) -> Result<PyExpr> {
    Ok(scalar_field("BooleanField", name, source, Vec::new(), aux))
}

/// Arrays delegate to their element. Object-shaped elements re-embed as a
/// nested serializer with `many=True`; anything else becomes a generic
/// `ListField` whose `child` is the element's own fragment.
fn build_list_field(
    nbctx: &NodeBuilderContext<'_, '_>,
    schema: &Schema,
    name: &str,
    source: &str,
    aux: &[(String, PyExpr)],
) -> Result<PyExpr> {
    let items = schema
        .items
        .as_deref()
        .ok_or_else(|| Error::invalid_schema("array schema without items", &schema.ctx))?;

    let elem_schema: &Schema = match items {
        SchemaOrRef::Ref(r) => {
            let binding = nbctx.bindings.get(&r.target).ok_or_else(|| {
                Error::UnsupportedSchema(format!("array element reference {} has no binding", r.target))
            })?;
            binding.schema
        }
        SchemaOrRef::Schema(s) => s,
    };

    if elem_schema.kind == JsonKind::Object {
        let mut aux = aux.to_vec();
        aux.push(("many".to_string(), PyExpr::true_()));
        build_property(nbctx, elem_schema, name, source, &aux)
    } else {
        let mut kwargs = base_kwargs(name, source);
        kwargs.push(("child".to_string(), build_property(nbctx, elem_schema, "", "", &[])?));
        kwargs.extend(aux.iter().cloned());
        Ok(PyExpr::call(["fields", "ListField"], kwargs))
    }
}

/// Objects become a call naming the binding's serializer class.
fn build_nested_field(
    nbctx: &NodeBuilderContext<'_, '_>,
    schema: &Schema,
    name: &str,
    source: &str,
    aux: &[(String, PyExpr)],
) -> Result<PyExpr> {
    let binding = nbctx.bindings.get(&schema.ctx).ok_or_else(|| {
        Error::UnsupportedSchema(format!("no binding for object schema at {}", schema.ctx))
    })?;
    let mut kwargs = base_kwargs(name, source);
    kwargs.extend(aux.iter().cloned());
    Ok(PyExpr::call([binding.class_name()], kwargs))
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{parse_contract, Contract};
    use crate::graph::{build_graph, discover, Discovery};
    use crate::pointer::JsonPointer;
    use crate::pytree::PyRenderer;
    use crate::resolver::SchemaResolver;
    use serde_json::json;

    fn scalar_schema(kind: JsonKind, format: Option<&str>) -> Schema {
        Schema {
            ctx: JsonPointer::root(),
            kind,
            description: None,
            format: format.map(str::to_string),
            properties: None,
            required: None,
            items: None,
        }
    }

    fn render_with_empty_graph(schema: &Schema, name: &str, source: &str) -> Result<String> {
        let bindings = BindingGraph::default();
        let registry = NodeBuilderRegistry::default();
        let nbctx = NodeBuilderContext { bindings: &bindings, registry: &registry };
        build_property(&nbctx, schema, name, source, &[]).map(|e| PyRenderer.render(&e))
    }

    #[test]
    fn source_kwarg_only_when_names_differ() {
        let schema = scalar_schema(JsonKind::Integer, None);
        assert_eq!(
            render_with_empty_graph(&schema, "widget_count", "widgetCount").unwrap(),
            "fields.IntegerField(source='widgetCount')",
        );
        assert_eq!(
            render_with_empty_graph(&schema, "count", "count").unwrap(),
            "fields.IntegerField()",
        );
    }

    #[test]
    fn format_specific_entry_wins_and_unknown_format_falls_back() {
        let decimal = scalar_schema(JsonKind::Number, Some("decimal"));
        assert_eq!(
            render_with_empty_graph(&decimal, "price", "price").unwrap(),
            "fields.DecimalField(max_digits=20, decimal_places=20)",
        );
        // (string, "date") has no date-specific entry: format-agnostic fallback
        let date = scalar_schema(JsonKind::String, Some("date"));
        assert_eq!(render_with_empty_graph(&date, "day", "day").unwrap(), "fields.CharField()");
    }

    #[test]
    fn missing_kind_entry_is_unsupported() {
        let mut registry = NodeBuilderRegistry::empty();
        registry.register(JsonKind::String, None, build_char_field);
        let err = registry.lookup(JsonKind::Array, Some("csv")).unwrap_err();
        match err {
            Error::UnsupportedSchema(msg) => {
                assert!(msg.contains("array"), "message should name the kind: {msg}");
                assert!(msg.contains("csv"), "message should name the format: {msg}");
            }
            other => panic!("expected UnsupportedSchema, got {other}"),
        }
    }

    fn widget_contract() -> Contract {
        parse_contract(
            &JsonPointer::root(),
            &json!({
                "definitions": {
                    "Widget": {
                        "type": "object",
                        "properties": {
                            "tags": { "type": "array", "items": { "type": "string" } },
                            "parts": {
                                "type": "array",
                                "items": {
                                    "type": "object",
                                    "properties": { "serial": { "type": "integer" } }
                                }
                            }
                        }
                    }
                },
                "paths": {
                    "/widgets": {
                        "get": {
                            "x-appgen-function-name": "get_widget",
                            "responses": { "200": { "schema": { "$ref": "#/definitions/Widget" } } }
                        }
                    }
                }
            }),
        )
        .unwrap()
    }

    fn with_widget_graph(check: impl FnOnce(&Contract, &NodeBuilderContext<'_, '_>)) {
        let contract = widget_contract();
        let resolver = SchemaResolver::new(&contract);
        let discovery: Discovery = discover(&contract);
        let graph = build_graph(&contract, &resolver, &discovery).unwrap();
        let registry = NodeBuilderRegistry::default();
        let nbctx = NodeBuilderContext { bindings: &graph, registry: &registry };
        check(&contract, &nbctx);
    }

    #[test]
    fn list_of_scalars_renders_as_list_field() {
        with_widget_graph(|contract, nbctx| {
            let widget = &contract.definitions["Widget"].schema;
            let props = widget.properties.as_ref().unwrap();
            let SchemaOrRef::Schema(tags) = &props["tags"] else { panic!() };
            let expr = build_property(nbctx, tags, "tags", "tags", &[]).unwrap();
            assert_eq!(PyRenderer.render(&expr), "fields.ListField(child=fields.CharField())");
        });
    }

    #[test]
    fn list_of_objects_re_embeds_nested_serializer_with_many() {
        with_widget_graph(|contract, nbctx| {
            let widget = &contract.definitions["Widget"].schema;
            let props = widget.properties.as_ref().unwrap();
            let SchemaOrRef::Schema(parts) = &props["parts"] else { panic!() };
            let expr = build_property(nbctx, parts, "parts", "parts", &[]).unwrap();
            assert_eq!(PyRenderer.render(&expr), "Widget_partsSerializer(many=True)");
        });
    }

    #[test]
    fn nested_object_without_binding_is_unsupported() {
        let schema = Schema {
            ctx: JsonPointer::parse("/definitions/Unknown"),
            kind: JsonKind::Object,
            description: None,
            format: None,
            properties: Some(Default::default()),
            required: None,
            items: None,
        };
        let err = render_with_empty_graph(&schema, "x", "x").unwrap_err();
        assert!(matches!(err, Error::UnsupportedSchema(_)));
    }
}

//! End-to-end rendering: contract in, three Python source units out.
//!
//! The pipeline is resolve, discover, qualify, weigh, then emit. Field
//! fragments are built as expression trees and formatted once; the unit
//! skeletons are Handlebars templates compiled into the binary. Everything
//! downstream of parsing is deterministic, so rendering the same document
//! twice yields byte-identical units.
use handlebars::Handlebars;
use serde::Serialize;
use tracing::debug;

use crate::contract::{Contract, Schema};
use crate::endpoints::{group_endpoints, render_url_pattern, EndpointPlan};
use crate::error::Result;
use crate::fields::{build_property, NodeBuilderContext, NodeBuilderRegistry};
use crate::graph::{build_graph, discover, Binding, BindingGraph};
use crate::naming::{render_as_snake_case, tokenize_camel_case};
use crate::pytree::{PyExpr, PyRenderer};
use crate::resolver::SchemaResolver;
use crate::weigh::emission_order;

/// The three generated source units, as text.
#[derive(Debug)]
pub struct GeneratedUnits {
    pub serializers: String,
    pub views: String,
    pub urls: String,
}

#[derive(Serialize)]
struct FieldCtx {
    name: String,
    code: String,
}

#[derive(Serialize)]
struct SerializerCtx {
    class_name: String,
    many_child: Option<String>,
    fields: Vec<FieldCtx>,
    empty: bool,
}

#[derive(Serialize)]
struct VerbCtx {
    method: &'static str,
    function_name: String,
    serializer: Option<String>,
}

#[derive(Serialize)]
struct EndpointCtx {
    class_name: String,
    has_serializers: bool,
    verbs: Vec<VerbCtx>,
}

#[derive(Serialize)]
struct HandlerVerbCtx {
    function_name: String,
    method_upper: String,
    serializer: Option<String>,
}

#[derive(Serialize)]
struct HandlerGroupCtx {
    dispatch_name: String,
    /// Pre-rendered method list for the dispatcher decorator,
    /// e.g. `'GET', 'DELETE'`.
    methods: String,
    verbs: Vec<HandlerVerbCtx>,
}

#[derive(Serialize)]
struct RouteCtx {
    pattern: String,
    view: String,
}

#[derive(Serialize)]
struct SerializersUnit {
    serializers: Vec<SerializerCtx>,
}

#[derive(Serialize)]
struct ViewsUnit {
    endpoints: Vec<EndpointCtx>,
    handler_groups: Vec<HandlerGroupCtx>,
}

#[derive(Serialize)]
struct UrlsUnit {
    routes: Vec<RouteCtx>,
}

fn template_registry() -> Result<Handlebars<'static>> {
    let mut registry = Handlebars::new();
    registry.register_escape_fn(handlebars::no_escape);
    registry.register_template_string("serializers.py", include_str!("../templates/serializers.py.hbs"))?;
    registry.register_template_string("views.py", include_str!("../templates/views.py.hbs"))?;
    registry.register_template_string("urls.py", include_str!("../templates/urls.py.hbs"))?;
    Ok(registry)
}

fn render_field(
    nbctx: &NodeBuilderContext<'_, '_>,
    schema: &Schema,
    raw_name: &str,
    required: bool,
) -> Result<FieldCtx> {
    let attr = render_as_snake_case(&tokenize_camel_case(raw_name));
    let mut aux: Vec<(String, PyExpr)> = Vec::new();
    if !required {
        aux.push(("required".to_string(), PyExpr::false_()));
    }
    let expr = build_property(nbctx, schema, &attr, raw_name, &aux)?;
    Ok(FieldCtx { name: attr, code: PyRenderer.render(&expr) })
}

fn serializer_ctx<'a>(
    nbctx: &NodeBuilderContext<'a, '_>,
    resolver: &SchemaResolver<'a>,
    binding: &Binding<'a>,
) -> Result<SerializerCtx> {
    if binding.many.is_some() {
        // Array-shaped definition: a ListSerializer whose child is either the
        // element's own serializer class or an inline field fragment.
        let child = match binding.schema.items.as_deref() {
            Some(items) => {
                let elem = resolver.resolve_if_ref(items)?;
                match nbctx.bindings.get(&elem.ctx) {
                    Some(elem_binding) => format!("{}()", elem_binding.class_name()),
                    None => PyRenderer.render(&build_property(nbctx, elem, "", "", &[])?),
                }
            }
            None => {
                return Err(crate::error::Error::invalid_schema(
                    "array schema without items",
                    &binding.schema.ctx,
                ))
            }
        };
        return Ok(SerializerCtx {
            class_name: binding.class_name(),
            many_child: Some(child),
            fields: Vec::new(),
            empty: false,
        });
    }

    let mut fields = Vec::new();
    if let Some(properties) = &binding.schema.properties {
        for (raw_name, schema_or_ref) in properties {
            let schema = resolver.resolve_if_ref(schema_or_ref)?;
            let required = binding
                .schema
                .required
                .as_ref()
                .is_some_and(|names| names.iter().any(|n| n == raw_name));
            fields.push(render_field(nbctx, schema, raw_name, required)?);
        }
    }
    let empty = fields.is_empty();
    Ok(SerializerCtx {
        class_name: binding.class_name(),
        many_child: None,
        fields,
        empty,
    })
}

fn views_units(plan: &EndpointPlan<'_>) -> (Vec<EndpointCtx>, Vec<HandlerGroupCtx>) {
    let endpoints = plan
        .endpoints
        .iter()
        .map(|e| {
            let verbs: Vec<VerbCtx> = e
                .verbs
                .iter()
                .map(|vb| VerbCtx {
                    method: vb.verb.method.as_str(),
                    function_name: vb.function_name.to_string(),
                    serializer: vb.binding.map(|b| b.class_name()),
                })
                .collect();
            EndpointCtx {
                class_name: e.class_name.clone(),
                has_serializers: verbs.iter().any(|v| v.serializer.is_some()),
                verbs,
            }
        })
        .collect();

    let handler_groups = plan
        .handler_groups
        .iter()
        .map(|group| {
            let verbs: Vec<HandlerVerbCtx> = group
                .verbs
                .iter()
                .map(|vb| HandlerVerbCtx {
                    function_name: vb.function_name.to_string(),
                    method_upper: vb.verb.method.as_str().to_uppercase(),
                    serializer: vb.binding.map(|b| b.class_name()),
                })
                .collect();
            let methods = verbs
                .iter()
                .map(|v| format!("'{}'", v.method_upper))
                .collect::<Vec<_>>()
                .join(", ");
            HandlerGroupCtx {
                dispatch_name: group.dispatch_name.clone(),
                methods,
                verbs,
            }
        })
        .collect();

    (endpoints, handler_groups)
}

fn routes(plan: &EndpointPlan<'_>) -> Result<Vec<RouteCtx>> {
    let mut routes = Vec::new();
    for e in &plan.endpoints {
        routes.push(RouteCtx {
            pattern: render_url_pattern(e.path)?,
            view: format!("views.{}.as_view()", e.class_name),
        });
    }
    for group in &plan.handler_groups {
        routes.push(RouteCtx {
            pattern: render_url_pattern(group.path)?,
            view: format!("views.{}", group.dispatch_name),
        });
    }
    Ok(routes)
}

/// Renders every generated unit for one contract.
pub fn render_units(contract: &Contract) -> Result<GeneratedUnits> {
    let resolver = SchemaResolver::new(contract);
    let discovery = discover(contract);
    let graph: BindingGraph<'_> = build_graph(contract, &resolver, &discovery)?;
    debug!(bindings = graph.len(), "binding graph built");

    let registry = NodeBuilderRegistry::default();
    let nbctx = NodeBuilderContext { bindings: &graph, registry: &registry };

    let mut serializers = Vec::new();
    for binding in emission_order(&graph)? {
        serializers.push(serializer_ctx(&nbctx, &resolver, binding)?);
    }

    let plan = group_endpoints(contract, &resolver, &graph)?;
    debug!(
        endpoints = plan.endpoints.len(),
        handler_groups = plan.handler_groups.len(),
        "endpoints grouped"
    );
    let (endpoints, handler_groups) = views_units(&plan);
    let routes = routes(&plan)?;

    let templates = template_registry()?;
    Ok(GeneratedUnits {
        serializers: templates.render("serializers.py", &SerializersUnit { serializers })?,
        views: templates.render("views.py", &ViewsUnit { endpoints, handler_groups })?,
        urls: templates.render("urls.py", &UrlsUnit { routes })?,
    })
}

// ------------------------------- Tests ------------------------------------ //

//! Endpoint grouping and route rendering.
//!
//! Flagged operations on one route either collapse into a single class-based
//! view, when every operation's function name shares the same leading token
//! run, or fall back to standalone handler functions. Route templates are
//! rewritten into Django URL patterns with typed placeholder converters.
use std::collections::{BTreeSet, HashMap};

use crate::contract::{Contract, JsonKind, PathItem, Verb};
use crate::error::{Error, Result};
use crate::graph::{build_pseudo_name, Binding, BindingGraph};
use crate::naming::{render_as_camel_case, tokenize_snake_case, Tokens};
use crate::resolver::SchemaResolver;

/// One flagged operation, linked to the serializer binding of its success
/// response body when one exists.
#[derive(Debug)]
pub struct VerbBinding<'a> {
    pub verb: &'a Verb,
    pub function_name: &'a str,
    pub binding: Option<&'a Binding<'a>>,
}

/// A route whose flagged operations share one function-name prefix and merge
/// into one class-based view.
#[derive(Debug)]
pub struct Endpoint<'a> {
    pub path: &'a PathItem,
    pub class_name: String,
    pub verbs: Vec<VerbBinding<'a>>,
}

/// A route whose flagged operations do not share a function-name prefix.
/// Each operation keeps its own handler function, and the route is served
/// by one generated dispatcher that branches on the request method, so
/// every route still renders exactly one URL entry.
#[derive(Debug)]
pub struct HandlerGroup<'a> {
    pub path: &'a PathItem,
    pub dispatch_name: String,
    pub verbs: Vec<VerbBinding<'a>>,
}

#[derive(Debug, Default)]
pub struct EndpointPlan<'a> {
    pub endpoints: Vec<Endpoint<'a>>,
    pub handler_groups: Vec<HandlerGroup<'a>>,
}

fn success_binding<'a>(
    verb: &'a Verb,
    resolver: &SchemaResolver<'a>,
    bindings: &'a BindingGraph<'a>,
) -> Result<Option<&'a Binding<'a>>> {
    let Some(schema_or_ref) = verb.responses.get("200").and_then(|r| r.schema.as_ref()) else {
        return Ok(None);
    };
    let schema = resolver.resolve_if_ref(schema_or_ref)?;
    let binding = bindings.get(&schema.ctx).ok_or_else(|| {
        Error::UnsupportedSchema(format!(
            "response schema at {} has no serializer binding",
            schema.ctx
        ))
    })?;
    Ok(Some(binding))
}

pub fn group_endpoints<'a>(
    contract: &'a Contract,
    resolver: &SchemaResolver<'a>,
    bindings: &'a BindingGraph<'a>,
) -> Result<EndpointPlan<'a>> {
    let mut plan = EndpointPlan::default();

    for path in &contract.paths {
        let mut prefixes: BTreeSet<Vec<String>> = BTreeSet::new();
        let mut verbs: Vec<VerbBinding<'a>> = Vec::new();

        for verb in path.verbs.values() {
            let Some(function_name) = verb.function_name.as_deref() else {
                continue;
            };
            let mut tokens = tokenize_snake_case(function_name, true).parts;
            tokens.pop();
            prefixes.insert(tokens);
            verbs.push(VerbBinding {
                verb,
                function_name,
                binding: success_binding(verb, resolver, bindings)?,
            });
        }
        if verbs.is_empty() {
            continue;
        }

        if prefixes.len() == 1 {
            let prefix = prefixes.into_iter().next().unwrap_or_default();
            plan.endpoints.push(Endpoint {
                path,
                class_name: render_as_camel_case(&Tokens::new(true, prefix)) + "View",
                verbs,
            });
        } else {
            plan.handler_groups.push(HandlerGroup {
                path,
                dispatch_name: build_pseudo_name(path),
                verbs,
            });
        }
    }

    Ok(plan)
}

fn converter_for(kind: JsonKind) -> Option<&'static str> {
    match kind {
        JsonKind::Integer | JsonKind::Number => Some("int"),
        JsonKind::String => Some("str"),
        _ => None,
    }
}

/// Rewrites a route template into a Django URL pattern: `{name}` placeholders
/// become `<int:name>`/`<str:name>` from the declared parameter type, the
/// leading slash is dropped, and empty components are elided. Parameter types
/// are collected across every operation on the route and must agree.
pub fn render_url_pattern(path: &PathItem) -> Result<String> {
    let mut param_kinds: HashMap<&str, JsonKind> = HashMap::new();
    for verb in path.verbs.values() {
        for p in &verb.parameters {
            match param_kinds.get(p.name.as_str()) {
                Some(seen) if *seen != p.kind => {
                    return Err(Error::UnsupportedSchema(format!(
                        "parameter {:?} declared with conflicting types {} and {}",
                        p.name,
                        seen.as_str(),
                        p.kind.as_str(),
                    )));
                }
                Some(_) => {}
                None => {
                    param_kinds.insert(p.name.as_str(), p.kind);
                }
            }
        }
    }

    let mut components: Vec<String> = Vec::new();
    for c in path.path.split('/') {
        if c.is_empty() {
            continue;
        }
        if let Some(name) = c.strip_prefix('{').and_then(|c| c.strip_suffix('}')) {
            let kind = param_kinds.get(name).ok_or_else(|| {
                Error::UnsupportedSchema(format!("no parameter declaration for placeholder {name:?}"))
            })?;
            let converter = converter_for(*kind).ok_or_else(|| {
                Error::UnsupportedSchema(format!(
                    "placeholder {name:?} has non-path-convertible type {}",
                    kind.as_str(),
                ))
            })?;
            components.push(format!("<{converter}:{name}>"));
        } else {
            components.push(c.to_string());
        }
    }

    Ok(components.join("/"))
}

// ------------------------------- Tests ------------------------------------ //

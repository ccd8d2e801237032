//! Binding-descriptor graph construction.
//!
//! Two passes over the contract. Pass 1 finds the "important" shapes: the
//! 200-response schemas of every generation-flagged verb, either as
//! references into the named definitions or as pseudo-definitions
//! synthesized for inline response schemas. Pass 2 walks each important
//! shape recursively and registers one binding per distinct schema address,
//! recording ownership edges as it descends.
use std::collections::BTreeSet;

use indexmap::IndexMap;
use tracing::debug;

use crate::contract::{Contract, Definition, JsonKind, PathItem, Schema, SchemaOrRef};
use crate::error::{Error, Result};
use crate::pointer::JsonPointer;
use crate::resolver::SchemaResolver;

/// One generated serializer definition in the dependency graph.
///
/// Created at most once per schema address; after construction only owner
/// edges are added.
#[derive(Debug)]
pub struct Binding<'a> {
    pub schema: &'a Schema,
    pub name: String,
    /// Addresses of the bindings whose property or element directly
    /// contains this one.
    pub owners: BTreeSet<JsonPointer>,
    /// For array-of-object bindings, the address of the element type.
    pub many: Option<JsonPointer>,
}

impl Binding<'_> {
    pub fn class_name(&self) -> String {
        format!("{}Serializer", self.name)
    }
}

/// Address-keyed binding map in discovery order.
#[derive(Debug, Default)]
pub struct BindingGraph<'a> {
    bindings: IndexMap<JsonPointer, Binding<'a>>,
}

impl<'a> BindingGraph<'a> {
    pub fn get(&self, ctx: &JsonPointer) -> Option<&Binding<'a>> {
        self.bindings.get(ctx)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&JsonPointer, &Binding<'a>)> {
        self.bindings.iter()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Pass-1 output: addresses of referenced definitions that must become
/// bindings, plus pseudo-definitions for inline response schemas.
#[derive(Debug, Default)]
pub struct Discovery {
    pub important: BTreeSet<JsonPointer>,
    pub pseudo_defs: IndexMap<JsonPointer, Definition>,
}

/// Name an inline response schema after its path template: placeholders are
/// stripped of braces, empty components dropped, the rest joined with `_`.
/// `/widgets/{id}` names `widgets_id`.
pub fn build_pseudo_name(path: &PathItem) -> String {
    path.path
        .split('/')
        .filter(|c| !c.is_empty())
        .map(|c| c.strip_prefix('{').and_then(|c| c.strip_suffix('}')).unwrap_or(c))
        .collect::<Vec<_>>()
        .join("_")
}

pub fn discover(contract: &Contract) -> Discovery {
    let mut discovery = Discovery::default();

    for path in &contract.paths {
        for verb in path.verbs.values() {
            if verb.function_name.is_none() {
                continue;
            }
            let Some(schema_or_ref) = verb.responses.get("200").and_then(|r| r.schema.as_ref())
            else {
                continue;
            };
            match schema_or_ref {
                SchemaOrRef::Ref(r) => {
                    discovery.important.insert(r.target.clone());
                }
                SchemaOrRef::Schema(schema) => {
                    discovery.pseudo_defs.insert(
                        schema.ctx.clone(),
                        Definition {
                            name: build_pseudo_name(path),
                            schema: schema.clone(),
                        },
                    );
                }
            }
        }
    }

    debug!(
        important = discovery.important.len(),
        pseudo = discovery.pseudo_defs.len(),
        "discovered important shapes"
    );
    discovery
}

struct Qualifier<'a, 'r> {
    resolver: &'r SchemaResolver<'a>,
    bindings: IndexMap<JsonPointer, Binding<'a>>,
}

impl<'a> Qualifier<'a, '_> {
    /// Look up or create the binding for `schema`. Returns true when the
    /// binding already existed; the caller then skips re-recursion, which
    /// both dedupes work and breaks cycles on self-referencing shapes
    /// (owner registration is the only effect of a repeat visit).
    fn register(
        &mut self,
        schema: &'a Schema,
        name: &str,
        owner: Option<&JsonPointer>,
        many: Option<JsonPointer>,
    ) -> bool {
        match self.bindings.get_mut(&schema.ctx) {
            Some(existing) => {
                if let Some(o) = owner {
                    existing.owners.insert(o.clone());
                }
                true
            }
            None => {
                let mut owners = BTreeSet::new();
                if let Some(o) = owner {
                    owners.insert(o.clone());
                }
                self.bindings.insert(
                    schema.ctx.clone(),
                    Binding {
                        schema,
                        name: name.to_string(),
                        owners,
                        many,
                    },
                );
                false
            }
        }
    }

    fn qualify_schema(
        &mut self,
        name: &str,
        schema: &'a Schema,
        owner: Option<&JsonPointer>,
        is_definition: bool,
    ) -> Result<()> {
        match schema.kind {
            JsonKind::Object => {
                if self.register(schema, name, owner, None) {
                    return Ok(());
                }
                let Some(properties) = schema.properties.as_ref() else {
                    return Err(Error::invalid_schema(
                        "object schema without properties",
                        &schema.ctx,
                    ));
                };
                let me = schema.ctx.clone();
                for (pname, p) in properties {
                    self.qualify_child(Some(&me), &format!("{name}_{pname}"), p)?;
                }
                Ok(())
            }
            JsonKind::Array => {
                let Some(items) = schema.items.as_deref() else {
                    return Err(Error::invalid_schema("array schema without items", &schema.ctx));
                };
                if is_definition {
                    let many = match items {
                        SchemaOrRef::Ref(r) => r.target.clone(),
                        SchemaOrRef::Schema(s) => s.ctx.clone(),
                    };
                    if self.register(schema, name, owner, Some(many)) {
                        return Ok(());
                    }
                    let me = schema.ctx.clone();
                    self.qualify_child(Some(&me), &format!("{name}_item"), items)
                } else {
                    // Inline arrays render as plain collection fields; only
                    // the element may need a binding of its own, under the
                    // unchanged owner and name context.
                    self.qualify_child(owner, name, items)
                }
            }
            // scalars render inline at the point of use
            _ => Ok(()),
        }
    }

    /// Recurse into a property or element. A reference resolves to a named
    /// definition which keeps its declared name; an inline schema takes the
    /// compositional name derived from its containment path.
    fn qualify_child(
        &mut self,
        owner: Option<&JsonPointer>,
        inline_name: &str,
        child: &'a SchemaOrRef,
    ) -> Result<()> {
        match child {
            SchemaOrRef::Ref(r) => {
                let def = self.resolver.resolve(&r.target)?;
                self.qualify_schema(&def.name, &def.schema, owner, true)
            }
            SchemaOrRef::Schema(s) => self.qualify_schema(inline_name, s, owner, false),
        }
    }
}

pub fn build_graph<'a>(
    contract: &'a Contract,
    resolver: &SchemaResolver<'a>,
    discovery: &'a Discovery,
) -> Result<BindingGraph<'a>> {
    let mut qualifier = Qualifier {
        resolver,
        bindings: IndexMap::new(),
    };

    for def in contract.definitions.values() {
        if !discovery.important.contains(&def.schema.ctx) {
            continue;
        }
        qualifier.qualify_schema(&def.name, &def.schema, None, true)?;
    }

    for def in discovery.pseudo_defs.values() {
        if def.schema.kind != JsonKind::Object {
            continue;
        }
        qualifier.qualify_schema(&def.name, &def.schema, None, true)?;
    }

    debug!(bindings = qualifier.bindings.len(), "qualified binding graph");
    Ok(BindingGraph {
        bindings: qualifier.bindings,
    })
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::parse_contract;
    use serde_json::json;

    fn contract_of(doc: serde_json::Value) -> Contract {
        parse_contract(&JsonPointer::root(), &doc).unwrap()
    }

    fn graph_of<'a>(
        contract: &'a Contract,
        discovery: &'a Discovery,
    ) -> BindingGraph<'a> {
        let resolver = SchemaResolver::new(contract);
        build_graph(contract, &resolver, discovery).unwrap()
    }

    #[test]
    fn shared_shape_gets_one_binding_with_both_owners() {
        let contract = contract_of(json!({
            "definitions": {
                "A": {
                    "type": "object",
                    "properties": { "c": { "$ref": "#/definitions/C" } }
                },
                "B": {
                    "type": "object",
                    "properties": { "c": { "$ref": "#/definitions/C" } }
                },
                "C": { "type": "object", "properties": {} }
            },
            "paths": {
                "/a": {
                    "get": {
                        "x-appgen-function-name": "get_a",
                        "responses": { "200": { "schema": { "$ref": "#/definitions/A" } } }
                    }
                },
                "/b": {
                    "get": {
                        "x-appgen-function-name": "get_b",
                        "responses": { "200": { "schema": { "$ref": "#/definitions/B" } } }
                    }
                }
            }
        }));
        let discovery = discover(&contract);
        let graph = graph_of(&contract, &discovery);

        assert_eq!(graph.len(), 3);
        let c = graph.get(&JsonPointer::parse("/definitions/C")).unwrap();
        assert_eq!(c.name, "C");
        let owners: Vec<String> = c.owners.iter().map(ToString::to_string).collect();
        assert_eq!(owners, vec!["/definitions/A", "/definitions/B"]);

        // building again over the same contract yields the same graph
        let resolver = SchemaResolver::new(&contract);
        let discovery = discover(&contract);
        let again = build_graph(&contract, &resolver, &discovery).unwrap();
        assert_eq!(again.len(), graph.len());
        let c2 = again.get(&JsonPointer::parse("/definitions/C")).unwrap();
        assert_eq!(c2.owners.len(), 2);
    }

    #[test]
    fn inline_response_schema_becomes_pseudo_definition_named_after_path() {
        let contract = contract_of(json!({
            "paths": {
                "/widgets/{id}": {
                    "get": {
                        "x-appgen-function-name": "get_widget",
                        "responses": {
                            "200": {
                                "schema": {
                                    "type": "object",
                                    "properties": { "name": { "type": "string" } }
                                }
                            }
                        }
                    }
                }
            }
        }));
        let discovery = discover(&contract);
        let graph = graph_of(&contract, &discovery);

        assert_eq!(graph.len(), 1);
        let (_, binding) = graph.iter().next().unwrap();
        assert_eq!(binding.name, "widgets_id");
        assert_eq!(binding.class_name(), "widgets_idSerializer");
    }

    #[test]
    fn array_definition_carries_many_marker_and_inline_array_does_not_bind() {
        let contract = contract_of(json!({
            "definitions": {
                "WidgetList": {
                    "type": "array",
                    "items": { "$ref": "#/definitions/Widget" }
                },
                "Widget": {
                    "type": "object",
                    "properties": {
                        "tags": {
                            "type": "array",
                            "items": { "type": "object", "properties": { "label": { "type": "string" } } }
                        }
                    }
                }
            },
            "paths": {
                "/widgets": {
                    "get": {
                        "x-appgen-function-name": "list_widget",
                        "responses": { "200": { "schema": { "$ref": "#/definitions/WidgetList" } } }
                    }
                }
            }
        }));
        let discovery = discover(&contract);
        let graph = graph_of(&contract, &discovery);

        let list = graph.get(&JsonPointer::parse("/definitions/WidgetList")).unwrap();
        assert_eq!(list.many.as_ref().unwrap(), &JsonPointer::parse("/definitions/Widget"));

        let widget = graph.get(&JsonPointer::parse("/definitions/Widget")).unwrap();
        assert!(widget.owners.contains(&JsonPointer::parse("/definitions/WidgetList")));

        // the inline array property itself has no binding, its element does
        let tags_ctx = JsonPointer::parse("/definitions/Widget/properties/tags");
        assert!(graph.get(&tags_ctx).is_none());
        let elem = graph.get(&tags_ctx.child("items")).unwrap();
        assert_eq!(elem.name, "Widget_tags");
        assert!(elem.owners.contains(&JsonPointer::parse("/definitions/Widget")));
    }

    #[test]
    fn self_referencing_schema_terminates() {
        let contract = contract_of(json!({
            "definitions": {
                "Node": {
                    "type": "object",
                    "properties": {
                        "next": { "$ref": "#/definitions/Node" },
                        "value": { "type": "string" }
                    }
                }
            },
            "paths": {
                "/nodes": {
                    "get": {
                        "x-appgen-function-name": "get_node",
                        "responses": { "200": { "schema": { "$ref": "#/definitions/Node" } } }
                    }
                }
            }
        }));
        let discovery = discover(&contract);
        let graph = graph_of(&contract, &discovery);

        let node = graph.get(&JsonPointer::parse("/definitions/Node")).unwrap();
        assert!(node.owners.contains(&JsonPointer::parse("/definitions/Node")));
    }

    #[test]
    fn pseudo_names_strip_braces_and_empty_components() {
        let contract = contract_of(json!({
            "paths": {
                "/widgets/{id}/parts/{partId}": {
                    "get": {
                        "x-appgen-function-name": "get_part",
                        "responses": { "200": { "description": "ok" } }
                    }
                }
            }
        }));
        assert_eq!(build_pseudo_name(&contract.paths[0]), "widgets_id_parts_partId");
    }
}

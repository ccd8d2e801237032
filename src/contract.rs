//! Typed contract model and parser.
//!
//! Turns the untyped document tree (`serde_json::Value`) into the typed
//! contract graph. Every node is assigned the `JsonPointer` mirroring its
//! position in the source document, and every structural violation fails
//! fast with an `InvalidSchema` error tagged with the offending address.
use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::pointer::JsonPointer;

pub type JsonMap = Map<String, Value>;

/// Extension key that selects which operations produce handlers.
pub const FUNCTION_NAME_KEY: &str = "x-appgen-function-name";

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JsonKind {
    Number,
    Integer,
    String,
    Boolean,
    Array,
    Object,
}

impl JsonKind {
    pub fn as_str(self) -> &'static str {
        match self {
            JsonKind::Number => "number",
            JsonKind::Integer => "integer",
            JsonKind::String => "string",
            JsonKind::Boolean => "boolean",
            JsonKind::Array => "array",
            JsonKind::Object => "object",
        }
    }

    fn from_name(ctx: &JsonPointer, name: &str) -> Result<Self> {
        match name {
            "number" => Ok(JsonKind::Number),
            "integer" => Ok(JsonKind::Integer),
            "string" => Ok(JsonKind::String),
            "boolean" => Ok(JsonKind::Boolean),
            "array" => Ok(JsonKind::Array),
            "object" => Ok(JsonKind::Object),
            other => Err(Error::invalid_schema(format!("unknown type {other:?}"), ctx)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Place {
    Path,
    Query,
    FormData,
    Body,
}

impl Place {
    fn from_name(ctx: &JsonPointer, name: &str) -> Result<Self> {
        match name {
            "path" => Ok(Place::Path),
            "query" => Ok(Place::Query),
            "formData" => Ok(Place::FormData),
            "body" => Ok(Place::Body),
            other => Err(Error::invalid_schema(
                format!("unknown parameter placement {other:?}"),
                ctx,
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "get",
            Method::Post => "post",
            Method::Put => "put",
            Method::Patch => "patch",
            Method::Delete => "delete",
        }
    }

    fn from_name(ctx: &JsonPointer, name: &str) -> Result<Self> {
        match name {
            "get" => Ok(Method::Get),
            "post" => Ok(Method::Post),
            "put" => Ok(Method::Put),
            "patch" => Ok(Method::Patch),
            "delete" => Ok(Method::Delete),
            other => Err(Error::invalid_schema(format!("unknown HTTP verb {other:?}"), ctx)),
        }
    }
}

/// One object/array/scalar type occurrence in the document.
#[derive(Debug, Clone)]
pub struct Schema {
    pub ctx: JsonPointer,
    pub kind: JsonKind,
    pub description: Option<String>,
    pub format: Option<String>,
    pub properties: Option<IndexMap<String, SchemaOrRef>>,
    pub required: Option<Vec<String>>,
    pub items: Option<Box<SchemaOrRef>>,
}

/// Stand-in for a schema that only carries the address to resolve later.
#[derive(Debug, Clone)]
pub struct SchemaRef {
    pub ctx: JsonPointer,
    pub target: JsonPointer,
}

#[derive(Debug, Clone)]
pub enum SchemaOrRef {
    Schema(Schema),
    Ref(SchemaRef),
}

impl SchemaOrRef {
    pub fn ctx(&self) -> &JsonPointer {
        match self {
            SchemaOrRef::Schema(s) => &s.ctx,
            SchemaOrRef::Ref(r) => &r.ctx,
        }
    }
}

/// A schema with a declared name, living in the top-level `definitions` map.
#[derive(Debug, Clone)]
pub struct Definition {
    pub name: String,
    pub schema: Schema,
}

#[derive(Debug, Clone)]
pub struct Parameter {
    pub ctx: JsonPointer,
    pub name: String,
    pub place: Place,
    pub kind: JsonKind,
    pub schema: Option<SchemaOrRef>,
    pub description: Option<String>,
    pub required: bool,
}

#[derive(Debug, Clone)]
pub struct Response {
    pub ctx: JsonPointer,
    pub status_code: String,
    pub schema: Option<SchemaOrRef>,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Verb {
    pub ctx: JsonPointer,
    pub method: Method,
    pub tags: Vec<String>,
    pub parameters: Vec<Parameter>,
    pub responses: IndexMap<String, Response>,
    /// Generator-directed function name; operations without one produce no
    /// handler.
    pub function_name: Option<String>,
    pub description: Option<String>,
    pub operation_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PathItem {
    pub ctx: JsonPointer,
    pub path: String,
    pub verbs: IndexMap<Method, Verb>,
}

#[derive(Debug, Clone)]
pub struct Contract {
    pub ctx: JsonPointer,
    pub definitions: IndexMap<String, Definition>,
    pub paths: Vec<PathItem>,
}

// ————————————————————————————————————————————————————————————————————————————
// PROPERTY ACCESS
// ————————————————————————————————————————————————————————————————————————————

/// Type-directed extraction out of an untyped map value.
pub(crate) trait FromJson<'v>: Sized {
    const EXPECTED: &'static str;
    fn from_json(v: &'v Value) -> Option<Self>;
}

impl<'v> FromJson<'v> for &'v str {
    const EXPECTED: &'static str = "a string";
    fn from_json(v: &'v Value) -> Option<Self> {
        v.as_str()
    }
}

impl<'v> FromJson<'v> for bool {
    const EXPECTED: &'static str = "a boolean";
    fn from_json(v: &'v Value) -> Option<Self> {
        v.as_bool()
    }
}

impl<'v> FromJson<'v> for &'v JsonMap {
    const EXPECTED: &'static str = "an object";
    fn from_json(v: &'v Value) -> Option<Self> {
        v.as_object()
    }
}

impl<'v> FromJson<'v> for &'v Vec<Value> {
    const EXPECTED: &'static str = "an array";
    fn from_json(v: &'v Value) -> Option<Self> {
        v.as_array()
    }
}

/// Required property: absent is an error at the property's address.
fn get_required<'v, T: FromJson<'v>>(ctx: &JsonPointer, m: &'v JsonMap, name: &str) -> Result<T> {
    let sub_ctx = ctx.child(name);
    match m.get(name) {
        None => Err(Error::invalid_schema("no such property", &sub_ctx)),
        Some(v) => T::from_json(v).ok_or_else(|| {
            Error::invalid_schema(format!("value must be {}, got {v}", T::EXPECTED), &sub_ctx)
        }),
    }
}

/// Optional property: absent and explicit null both read as `None`.
fn get_optional<'v, T: FromJson<'v>>(
    ctx: &JsonPointer,
    m: &'v JsonMap,
    name: &str,
) -> Result<Option<T>> {
    let sub_ctx = ctx.child(name);
    match m.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => T::from_json(v).map(Some).ok_or_else(|| {
            Error::invalid_schema(format!("value must be {}, got {v}", T::EXPECTED), &sub_ctx)
        }),
    }
}

/// Defaulted property: like [`get_optional`] but collapses `None`.
fn get_or<'v, T: FromJson<'v>>(
    ctx: &JsonPointer,
    m: &'v JsonMap,
    name: &str,
    default: T,
) -> Result<T> {
    Ok(get_optional(ctx, m, name)?.unwrap_or(default))
}

fn get_str_opt(ctx: &JsonPointer, m: &JsonMap, name: &str) -> Result<Option<String>> {
    Ok(get_optional::<&str>(ctx, m, name)?.map(str::to_string))
}

/// Optional array of strings, each element validated at its indexed address.
fn get_str_array_opt(ctx: &JsonPointer, m: &JsonMap, name: &str) -> Result<Option<Vec<String>>> {
    let Some(values) = get_optional::<&Vec<Value>>(ctx, m, name)? else {
        return Ok(None);
    };
    let sub_ctx = ctx.child(name);
    let mut out = Vec::with_capacity(values.len());
    for (i, v) in values.iter().enumerate() {
        let elem_ctx = sub_ctx.child(i.to_string());
        let s = v.as_str().ok_or_else(|| {
            Error::invalid_schema(format!("value must be a string, got {v}"), &elem_ctx)
        })?;
        out.push(s.to_string());
    }
    Ok(Some(out))
}

fn as_map<'v>(ctx: &JsonPointer, v: &'v Value) -> Result<&'v JsonMap> {
    v.as_object()
        .ok_or_else(|| Error::invalid_schema(format!("value must be an object, got {v}"), ctx))
}

// ————————————————————————————————————————————————————————————————————————————
// PARSER
// ————————————————————————————————————————————————————————————————————————————

/// `$ref` short-circuits schema parsing; sibling keys are ignored.
pub fn parse_schema_or_ref(ctx: &JsonPointer, m: &JsonMap) -> Result<SchemaOrRef> {
    match get_optional::<&str>(ctx, m, "$ref")? {
        Some(r) => Ok(SchemaOrRef::Ref(SchemaRef {
            ctx: ctx.clone(),
            target: JsonPointer::parse(r),
        })),
        None => Ok(SchemaOrRef::Schema(parse_schema(ctx, m)?)),
    }
}

pub fn parse_schema(ctx: &JsonPointer, m: &JsonMap) -> Result<Schema> {
    let prop_repr = get_optional::<&JsonMap>(ctx, m, "properties")?;
    let items_repr = get_optional::<&JsonMap>(ctx, m, "items")?;

    // Kind inference when `type` is not declared: `properties` means object,
    // `items` means array; otherwise the missing property is the error.
    let kind = match get_optional::<&str>(ctx, m, "type")? {
        Some(name) => JsonKind::from_name(&ctx.child("type"), name)?,
        None if prop_repr.is_some() => JsonKind::Object,
        None if items_repr.is_some() => JsonKind::Array,
        None => return Err(Error::invalid_schema("no such property", &ctx.child("type"))),
    };

    let properties = match prop_repr {
        None => None,
        Some(props) => {
            let props_ctx = ctx.child("properties");
            let mut out = IndexMap::with_capacity(props.len());
            for (pname, pv) in props {
                let p_ctx = props_ctx.child(pname);
                let p_map = as_map(&p_ctx, pv)?;
                out.insert(pname.clone(), parse_schema_or_ref(&p_ctx, p_map)?);
            }
            Some(out)
        }
    };

    let items = match items_repr {
        None => None,
        Some(items_map) => Some(Box::new(parse_schema_or_ref(&ctx.child("items"), items_map)?)),
    };

    Ok(Schema {
        ctx: ctx.clone(),
        kind,
        description: get_str_opt(ctx, m, "description")?,
        format: get_str_opt(ctx, m, "format")?,
        properties,
        required: get_str_array_opt(ctx, m, "required")?,
        items,
    })
}

pub fn parse_parameter(ctx: &JsonPointer, m: &JsonMap) -> Result<Parameter> {
    let kind = match get_optional::<&str>(ctx, m, "type")? {
        Some(name) => JsonKind::from_name(&ctx.child("type"), name)?,
        None => JsonKind::String,
    };
    let schema = match get_optional::<&JsonMap>(ctx, m, "schema")? {
        Some(schema_map) => Some(parse_schema_or_ref(&ctx.child("schema"), schema_map)?),
        None => None,
    };
    Ok(Parameter {
        ctx: ctx.clone(),
        name: get_required::<&str>(ctx, m, "name")?.to_string(),
        place: Place::from_name(&ctx.child("in"), get_required::<&str>(ctx, m, "in")?)?,
        kind,
        schema,
        description: get_str_opt(ctx, m, "description")?,
        required: get_or(ctx, m, "required", true)?,
    })
}

pub fn parse_response(ctx: &JsonPointer, status_code: &str, m: &JsonMap) -> Result<Response> {
    let schema = match get_optional::<&JsonMap>(ctx, m, "schema")? {
        Some(schema_map) => Some(parse_schema_or_ref(&ctx.child("schema"), schema_map)?),
        None => None,
    };
    Ok(Response {
        ctx: ctx.clone(),
        status_code: status_code.to_string(),
        schema,
        description: get_str_opt(ctx, m, "description")?,
    })
}

pub fn parse_verb(ctx: &JsonPointer, method: Method, m: &JsonMap) -> Result<Verb> {
    let mut parameters = Vec::new();
    if let Some(param_reprs) = get_optional::<&Vec<Value>>(ctx, m, "parameters")? {
        let params_ctx = ctx.child("parameters");
        for (i, pv) in param_reprs.iter().enumerate() {
            let p_ctx = params_ctx.child(i.to_string());
            parameters.push(parse_parameter(&p_ctx, as_map(&p_ctx, pv)?)?);
        }
    }

    let responses_map = get_required::<&JsonMap>(ctx, m, "responses")?;
    let responses_ctx = ctx.child("responses");
    let mut responses = IndexMap::with_capacity(responses_map.len());
    for (status_code, rv) in responses_map {
        let r_ctx = responses_ctx.child(status_code);
        responses.insert(
            status_code.clone(),
            parse_response(&r_ctx, status_code, as_map(&r_ctx, rv)?)?,
        );
    }

    Ok(Verb {
        ctx: ctx.clone(),
        method,
        tags: get_str_array_opt(ctx, m, "tags")?.unwrap_or_default(),
        parameters,
        responses,
        function_name: get_str_opt(ctx, m, FUNCTION_NAME_KEY)?,
        description: get_str_opt(ctx, m, "description")?,
        operation_id: get_str_opt(ctx, m, "operationId")?,
    })
}

pub fn parse_definition(ctx: &JsonPointer, name: &str, m: &JsonMap) -> Result<Definition> {
    Ok(Definition {
        name: name.to_string(),
        schema: parse_schema(ctx, m)?,
    })
}

pub fn parse_contract(ctx: &JsonPointer, doc: &Value) -> Result<Contract> {
    let root = as_map(ctx, doc)?;

    let mut definitions = IndexMap::new();
    if let Some(def_reprs) = get_optional::<&JsonMap>(ctx, root, "definitions")? {
        let defs_ctx = ctx.child("definitions");
        for (name, dv) in def_reprs {
            let d_ctx = defs_ctx.child(name);
            definitions.insert(name.clone(), parse_definition(&d_ctx, name, as_map(&d_ctx, dv)?)?);
        }
    }

    let path_reprs = get_required::<&JsonMap>(ctx, root, "paths")?;
    let paths_ctx = ctx.child("paths");
    let mut paths = Vec::with_capacity(path_reprs.len());
    for (path, pv) in path_reprs {
        let p_ctx = paths_ctx.child(path);
        let verb_reprs = as_map(&p_ctx, pv)?;
        let mut verbs = IndexMap::with_capacity(verb_reprs.len());
        for (verb_name, vv) in verb_reprs {
            let v_ctx = p_ctx.child(verb_name);
            let method = Method::from_name(&v_ctx, verb_name)?;
            verbs.insert(method, parse_verb(&v_ctx, method, as_map(&v_ctx, vv)?)?);
        }
        paths.push(PathItem {
            ctx: p_ctx,
            path: path.clone(),
            verbs,
        });
    }

    Ok(Contract {
        ctx: ctx.clone(),
        definitions,
        paths,
    })
}

// ------------------------------- Tests ------------------------------------ //

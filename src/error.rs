//! Pipeline error kinds. Every failure is fatal: the generator is a pure
//! transform of one document, so there is nothing to retry and no partial
//! output to salvage.
use crate::pointer::JsonPointer;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required property was missing or mis-typed during parsing.
    /// Carries the address of the offending node.
    #[error("{ctx}: {message}")]
    InvalidSchema { message: String, ctx: JsonPointer },

    /// A `$ref` whose address has no matching named definition.
    #[error("unresolved reference: {0}")]
    UnresolvedRef(JsonPointer),

    /// A kind/format pair with no constructor, a route placeholder with an
    /// inconsistent or missing type, or a response schema with no binding.
    #[error("unsupported schema: {0}")]
    UnsupportedSchema(String),

    /// A schema that transitively contains itself; rejected instead of
    /// recursing until the stack runs out.
    #[error("cyclic schema reference involving {0}")]
    CyclicSchema(JsonPointer),

    #[error("template error: {0}")]
    Template(#[from] handlebars::TemplateError),

    #[error("render error: {0}")]
    Render(#[from] handlebars::RenderError),
}

impl Error {
    pub fn invalid_schema(message: impl Into<String>, ctx: &JsonPointer) -> Self {
        Error::InvalidSchema { message: message.into(), ctx: ctx.clone() }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

//! Reference resolution against the contract's named definitions.
//!
//! Built once after parsing; read-only afterwards.
use std::collections::HashMap;

use crate::contract::{Contract, Definition, Schema, SchemaOrRef};
use crate::error::{Error, Result};
use crate::pointer::JsonPointer;

pub struct SchemaResolver<'a> {
    pointers_to_defs: HashMap<JsonPointer, &'a Definition>,
}

impl<'a> SchemaResolver<'a> {
    pub fn new(contract: &'a Contract) -> Self {
        let pointers_to_defs = contract
            .definitions
            .values()
            .map(|def| (def.schema.ctx.clone(), def))
            .collect();
        SchemaResolver { pointers_to_defs }
    }

    /// Resolve an address to its named definition.
    pub fn resolve(&self, target: &JsonPointer) -> Result<&'a Definition> {
        self.pointers_to_defs
            .get(target)
            .copied()
            .ok_or_else(|| Error::UnresolvedRef(target.clone()))
    }

    /// Pass concrete schemas through; resolve references.
    pub fn resolve_if_ref(&self, schema_or_ref: &'a SchemaOrRef) -> Result<&'a Schema> {
        match schema_or_ref {
            SchemaOrRef::Schema(schema) => Ok(schema),
            SchemaOrRef::Ref(r) => Ok(&self.resolve(&r.target)?.schema),
        }
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::parse_contract;
    use serde_json::json;

    #[test]
    fn resolves_named_definitions_and_rejects_unknown_targets() {
        let doc = json!({
            "definitions": {
                "Widget": { "type": "object", "properties": {} }
            },
            "paths": {}
        });
        let contract = parse_contract(&JsonPointer::root(), &doc).unwrap();
        let resolver = SchemaResolver::new(&contract);

        let def = resolver.resolve(&JsonPointer::parse("/definitions/Widget")).unwrap();
        assert_eq!(def.name, "Widget");

        let err = resolver.resolve(&JsonPointer::parse("/definitions/Gadget")).unwrap_err();
        assert!(matches!(err, Error::UnresolvedRef(_)));
    }
}

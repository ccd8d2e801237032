//! Emission-order weighing over the binding graph.
//!
//! weight = 1 + sum of owner weights; bindings depended upon by deeply
//! nested callers sink to the front of the emission order. This is a
//! heuristic topological ordering, not a strict one: ties keep discovery
//! order.
use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::graph::{Binding, BindingGraph};
use crate::pointer::JsonPointer;

#[derive(Clone, Copy)]
enum Mark {
    InProgress,
    Done(u64),
}

/// Memoized weight evaluation. An owner cycle (mutually containing shapes)
/// is rejected instead of recursing unboundedly.
pub fn eval_weights(graph: &BindingGraph<'_>) -> Result<IndexMap<JsonPointer, u64>> {
    fn weigh(
        graph: &BindingGraph<'_>,
        memo: &mut IndexMap<JsonPointer, Mark>,
        ctx: &JsonPointer,
        binding: &Binding<'_>,
    ) -> Result<u64> {
        match memo.get(ctx) {
            Some(Mark::Done(w)) => return Ok(*w),
            Some(Mark::InProgress) => return Err(Error::CyclicSchema(ctx.clone())),
            None => {}
        }
        memo.insert(ctx.clone(), Mark::InProgress);
        let mut w = 1u64;
        for owner_ctx in &binding.owners {
            let owner = graph
                .get(owner_ctx)
                .ok_or_else(|| Error::UnresolvedRef(owner_ctx.clone()))?;
            w += weigh(graph, memo, owner_ctx, owner)?;
        }
        memo.insert(ctx.clone(), Mark::Done(w));
        Ok(w)
    }

    let mut memo: IndexMap<JsonPointer, Mark> = IndexMap::with_capacity(graph.len());
    for (ctx, binding) in graph.iter() {
        weigh(graph, &mut memo, ctx, binding)?;
    }
    Ok(memo
        .into_iter()
        .map(|(ctx, mark)| match mark {
            Mark::Done(w) => (ctx, w),
            Mark::InProgress => unreachable!("weighing left an in-progress mark"),
        })
        .collect())
}

/// Bindings sorted by descending weight, discovery order breaking ties.
pub fn emission_order<'g, 'a>(graph: &'g BindingGraph<'a>) -> Result<Vec<&'g Binding<'a>>> {
    let weights = eval_weights(graph)?;
    let mut ordered: Vec<(&'g Binding<'a>, u64)> = graph
        .iter()
        .map(|(ctx, binding)| (binding, weights[ctx]))
        .collect();
    ordered.sort_by(|a, b| b.1.cmp(&a.1)); // stable: ties keep discovery order
    Ok(ordered.into_iter().map(|(binding, _)| binding).collect())
}

// ------------------------------- Tests ------------------------------------ //

//! Query evaluation over an in-memory collection.

use std::collections::HashMap;

use schoolhub_core::types::document::{Document, Fields};
use schoolhub_core::types::query::Query;

/// Evaluate `query` against a collection snapshot: filter, order, cap.
///
/// Ties on the sort field are broken by document id so results are stable
/// from one evaluation to the next.
pub fn evaluate(query: &Query, docs: &HashMap<String, Fields>) -> Vec<Document> {
    let mut matched: Vec<Document> = docs
        .iter()
        .filter(|(_, fields)| query.filters.iter().all(|f| f.matches(fields)))
        .map(|(id, fields)| Document::new(id.clone(), fields.clone()))
        .collect();

    match &query.order_by {
        Some(sort) => matched.sort_by(|a, b| {
            sort.compare(a.get(&sort.field), b.get(&sort.field))
                .then_with(|| a.id.cmp(&b.id))
        }),
        None => matched.sort_by(|a, b| a.id.cmp(&b.id)),
    }

    if let Some(limit) = query.limit {
        matched.truncate(limit);
    }
    matched
}

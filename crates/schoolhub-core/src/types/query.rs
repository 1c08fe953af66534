//! Document query builder.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::filter::FilterField;
use super::sorting::SortField;

/// A query against one collection: equality filters, optional ordering,
/// and an optional result cap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    /// Collection name.
    pub collection: String,
    /// All filters must match.
    #[serde(default)]
    pub filters: Vec<FilterField>,
    /// Ordering applied before the limit.
    pub order_by: Option<SortField>,
    /// Maximum number of documents returned.
    pub limit: Option<usize>,
}

impl Query {
    /// Start a query over `collection` with no filters.
    pub fn collection(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            filters: Vec::new(),
            order_by: None,
            limit: None,
        }
    }

    /// Add an equality filter.
    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(FilterField::eq(field, value));
        self
    }

    /// Order results descending on `field`.
    pub fn order_desc(mut self, field: impl Into<String>) -> Self {
        self.order_by = Some(SortField::desc(field));
        self
    }

    /// Cap the number of results.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether the query carries an equality filter on `field`.
    pub fn is_scoped_by(&self, field: &str) -> bool {
        self.filters.iter().any(|f| f.field == field)
    }
}

//! Shared value types: identifiers, the clock, documents, and queries.

pub mod clock;
pub mod document;
pub mod filter;
pub mod id;
pub mod query;
pub mod sorting;

pub use clock::{Clock, ManualClock, SystemClock};
pub use document::{Document, Fields, encode_fields};
pub use filter::FilterField;
pub use id::{EventId, NotificationId, PrincipalId, SessionId, TenantId};
pub use query::Query;
pub use sorting::{SortDirection, SortField};

//! Live feed events, audiences, and persisted inbox notifications.

pub mod audience;
pub mod event;
pub mod model;

pub use audience::{Audience, RoleClass};
pub use event::NotificationEvent;
pub use model::{NotificationPayload, PersistedNotification, ReadStatus};

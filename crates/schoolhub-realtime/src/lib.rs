//! # schoolhub-realtime
//!
//! Per-session real-time machinery for SchoolHub:
//!
//! - Presence heartbeats and the derived online roster
//! - The live toast feed with watermark and seen-set de-duplication
//! - The persisted unread inbox with optimistic mark-read
//! - [`PresenceEngine`], which wires all of the above to sign-in and sign-out

pub mod engine;
pub mod notification;
pub mod presence;

pub use engine::{ClientInfo, PresenceEngine, SessionContext};
pub use notification::{FeedHandle, NotificationFeed, Toast, UnreadNotificationStore, UnreadSnapshot};
pub use presence::{HeartbeatHandle, PresenceTracker, Roster};

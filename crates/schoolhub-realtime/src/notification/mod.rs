//! Live toast feed and persisted unread inbox.

pub mod feed;
pub mod toast;
pub mod unread;

pub use feed::{FeedHandle, FeedState, NotificationFeed};
pub use toast::{Toast, ToastPhase};
pub use unread::{ListView, UnreadNotificationStore, UnreadSnapshot};

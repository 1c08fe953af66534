//! Presence heartbeats and online rosters.

pub mod heartbeat;
pub mod roster;
pub mod tracker;

pub use heartbeat::HeartbeatHandle;
pub use roster::{Roster, RosterEntry, compute_online_roster};
pub use tracker::{PresenceTracker, RosterStream};

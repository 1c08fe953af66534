//! Online roster derived from presence samples.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};

use schoolhub_core::types::id::PrincipalId;
use schoolhub_entity::presence::PresenceSample;

/// Principals whose last heartbeat is strictly within `window` of `now`.
pub fn compute_online_roster(
    samples: &[PresenceSample],
    now: DateTime<Utc>,
    window: Duration,
) -> HashSet<PrincipalId> {
    samples
        .iter()
        .filter(|s| s.is_online(now, window))
        .map(|s| s.principal_id)
        .collect()
}

/// One roster row.
#[derive(Debug, Clone, PartialEq)]
pub struct RosterEntry {
    /// Latest sample for the principal.
    pub sample: PresenceSample,
    /// Online at the time the entry was computed.
    pub is_online: bool,
}

/// A snapshot of the tenant's presence samples.
///
/// Online status is not stored anywhere: every call re-derives it from
/// `last_seen_at` and the instant passed in.
#[derive(Debug, Clone, PartialEq)]
pub struct Roster {
    samples: Vec<PresenceSample>,
    window: Duration,
}

impl Roster {
    /// Wrap a set of samples.
    pub fn new(samples: Vec<PresenceSample>, window: Duration) -> Self {
        Self { samples, window }
    }

    /// A roster with no data, as seen by viewers who may not see presence.
    pub fn empty(window: Duration) -> Self {
        Self::new(Vec::new(), window)
    }

    /// Raw samples.
    pub fn samples(&self) -> &[PresenceSample] {
        &self.samples
    }

    /// Whether no samples are present.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Ids of principals online at `now`.
    pub fn online(&self, now: DateTime<Utc>) -> HashSet<PrincipalId> {
        compute_online_roster(&self.samples, now, self.window)
    }

    /// Whether a specific principal is online at `now`.
    pub fn is_online(&self, principal_id: PrincipalId, now: DateTime<Utc>) -> bool {
        self.samples
            .iter()
            .any(|s| s.principal_id == principal_id && s.is_online(now, self.window))
    }

    /// Rows ordered online first, then by display name.
    pub fn entries(&self, now: DateTime<Utc>) -> Vec<RosterEntry> {
        let mut entries: Vec<RosterEntry> = self
            .samples
            .iter()
            .map(|sample| RosterEntry {
                is_online: sample.is_online(now, self.window),
                sample: sample.clone(),
            })
            .collect();
        entries.sort_by(|a, b| {
            b.is_online
                .cmp(&a.is_online)
                .then_with(|| {
                    a.sample
                        .display_name
                        .to_lowercase()
                        .cmp(&b.sample.display_name.to_lowercase())
                })
        });
        entries
    }
}

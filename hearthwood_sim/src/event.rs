// Player-visible notifications.
//
// The sim reports noteworthy happenings (a structure finished, trees spread,
// a worker arrived) as `Notification`s stamped with the tick they occurred
// on. They are kept in a bounded `NotificationLog`; once it holds
// `notification_capacity` entries the oldest is dropped for each new one.
// Each tick's new notifications are also returned to the caller through
// `TickOutcome` (see `sim.rs`).
//
// Notifications are output only. Nothing in the sim reads them back.
//
// See also: `sim.rs` for where each kind is emitted.

use crate::types::{AgentId, BuildType, NotificationId, Position};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// A notification stamped with the tick it occurred on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub tick: u64,
    pub kind: NotificationKind,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationKind {
    /// An agent finished a structure.
    Built {
        build_type: BuildType,
        position: Position,
    },
    /// A growth pass added trees.
    TreesGrew { count: u32 },
    /// A new worker spawned by a fireplace.
    WorkerArrived { agent_id: AgentId, position: Position },
}

impl NotificationKind {
    /// Player-facing text.
    pub fn message(&self) -> String {
        match self {
            Self::Built { build_type, .. } => format!("Built {build_type}"),
            Self::TreesGrew { count: 1 } => "A new tree has grown".to_string(),
            Self::TreesGrew { count } => format!("{count} new trees have grown"),
            Self::WorkerArrived { .. } => "A new worker has arrived".to_string(),
        }
    }
}

impl Notification {
    pub fn message(&self) -> String {
        self.kind.message()
    }
}

/// Bounded, oldest-first notification history.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationLog {
    entries: VecDeque<Notification>,
}

impl NotificationLog {
    /// Append, evicting from the front until at most `capacity` remain.
    pub fn push(&mut self, notification: Notification, capacity: usize) {
        self.entries.push_back(notification);
        while self.entries.len() > capacity {
            self.entries.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&Notification> {
        self.entries.back()
    }
}

//! Heartbeat-based presence tracking for connected users
//!
//! There is no explicit disconnect message. Every client sends a
//! `UserHeartbeat` each frame while logged in; the host ages every entry
//! once per tick and forgets users whose heartbeat has gone stale. The
//! surviving roster is broadcast to all clients after every tick.

use log::info;
use shared::HEARTBEAT_THRESHOLD;

/// A user seen recently and the ticks elapsed since their last heartbeat
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceEntry {
    pub username: String,
    pub age: u32,
}

/// Tracks which users are alive, in order of first heartbeat
#[derive(Debug)]
pub struct PresenceTracker {
    entries: Vec<PresenceEntry>,
    /// Age at which an entry is evicted
    max_age: u32,
}

impl Default for PresenceTracker {
    fn default() -> Self {
        Self::new(HEARTBEAT_THRESHOLD)
    }
}

impl PresenceTracker {
    pub fn new(max_age: u32) -> Self {
        Self {
            entries: Vec::new(),
            max_age,
        }
    }

    /// Resets the user's age to zero, adding them if unknown
    pub fn heartbeat(&mut self, username: &str) {
        match self.entries.iter_mut().find(|e| e.username == username) {
            Some(entry) => entry.age = 0,
            None => {
                info!("User {} is now present", username);
                self.entries.push(PresenceEntry {
                    username: username.to_string(),
                    age: 0,
                });
            }
        }
    }

    /// Ages every entry by one tick, evicts stale ones and returns the roster
    pub fn tick(&mut self) -> Vec<String> {
        for entry in &mut self.entries {
            entry.age = entry.age.saturating_add(1);
        }

        let max_age = self.max_age;
        self.entries.retain(|entry| {
            let alive = entry.age < max_age;
            if !alive {
                info!(
                    "User {} timed out after {} ticks without heartbeat",
                    entry.username, entry.age
                );
            }
            alive
        });

        self.roster()
    }

    pub fn roster(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.username.clone()).collect()
    }

    pub fn age(&self, username: &str) -> Option<u32> {
        self.entries
            .iter()
            .find(|e| e.username == username)
            .map(|e| e.age)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// Liveness state observed by the engine between ticks: when each intel
// channel last spoke, and when each character last fought.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use crate::core::model::CharacterId;

/// Last message time per tracked intel channel.
#[derive(Debug, Default, Clone)]
pub struct ChannelActivity {
    last_message: HashMap<String, DateTime<Utc>>,
}

impl ChannelActivity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the tracked channel set. Channels seen before keep their last
    /// message time; new ones start their silence clock at `now`.
    pub fn track(&mut self, channels: &[String], now: DateTime<Utc>) {
        self.last_message.retain(|channel, _| channels.contains(channel));
        for channel in channels {
            self.last_message.entry(channel.clone()).or_insert(now);
        }
    }

    /// Record a message. Untracked channels are ignored.
    pub fn touch(&mut self, channel: &str, at: DateTime<Utc>) -> bool {
        match self.last_message.get_mut(channel) {
            Some(last) => {
                if at > *last {
                    *last = at;
                }
                true
            }
            None => false,
        }
    }

    pub fn tracked_count(&self) -> usize {
        self.last_message.len()
    }

    pub fn last_message(&self, channel: &str) -> Option<DateTime<Utc>> {
        self.last_message.get(channel).copied()
    }

    /// Channels with no message for at least `threshold`, sorted by name.
    pub fn silent_channels(&self, threshold: Duration, now: DateTime<Utc>) -> Vec<String> {
        let mut silent: Vec<String> = self
            .last_message
            .iter()
            .filter(|(_, last)| now - **last >= threshold)
            .map(|(channel, _)| channel.clone())
            .collect();
        silent.sort();
        silent
    }
}

#[derive(Debug, Clone)]
struct CombatState {
    last_activity: DateTime<Utc>,
    last_target: String,
}

/// A character that has stopped fighting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdleCharacter {
    pub character_id: CharacterId,
    pub last_target: String,
    pub idle_seconds: u64,
    /// Last combat action; identifies the idle period
    pub combat_ended_at: DateTime<Utc>,
}

/// Per-character combat timing, used to synthesize combat-stopped actions.
#[derive(Debug, Default, Clone)]
pub struct CombatTracker {
    characters: HashMap<CharacterId, CombatState>,
}

impl CombatTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record combat activity. Any combat action resets the idle timer.
    pub fn record(&mut self, character_id: CharacterId, target: &str, at: DateTime<Utc>) {
        let state = self
            .characters
            .entry(character_id)
            .or_insert_with(|| CombatState {
                last_activity: at,
                last_target: target.to_string(),
            });
        if at >= state.last_activity {
            state.last_activity = at;
            state.last_target = target.to_string();
        }
    }

    /// Characters idle for at least one second.
    pub fn idle_characters(&self, now: DateTime<Utc>) -> Vec<IdleCharacter> {
        let mut idle: Vec<IdleCharacter> = self
            .characters
            .iter()
            .filter_map(|(character_id, state)| {
                let idle_seconds = u64::try_from((now - state.last_activity).num_seconds()).ok()?;
                (idle_seconds > 0).then(|| IdleCharacter {
                    character_id: *character_id,
                    last_target: state.last_target.clone(),
                    idle_seconds,
                    combat_ended_at: state.last_activity,
                })
            })
            .collect();
        idle.sort_by_key(|c| c.character_id);
        idle
    }

    /// Drop characters idle for longer than any alert cares about.
    pub fn forget_idle(&mut self, max_idle: Duration, now: DateTime<Utc>) {
        self.characters
            .retain(|_, state| now - state.last_activity <= max_idle);
    }
}

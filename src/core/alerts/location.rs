// Location matching for intel alerts.
//
// Distances come from an external oracle (the solar system graph); this module
// only decides whether a reported system falls inside an alert's jump range.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use super::model::{IntelReportLocation, JumpRange};
use crate::core::model::CharacterId;

/// Jump distance between two systems, `None` when no route is known.
pub trait DistanceOracle: Send + Sync {
    fn jump_distance(&self, from: &str, to: &str, use_jump_bridges: bool) -> Option<u32>;
}

/// Current system of each tracked character that is online.
pub trait CharacterLocations: Send + Sync {
    fn online_characters(&self) -> Vec<(CharacterId, String)>;
}

/// Where a report matched, and how far away it was.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AlertLocationMatch {
    System {
        system: String,
        distance: u32,
    },
    Character {
        character_id: CharacterId,
        /// The character's current system
        system: String,
        distance: u32,
    },
}

impl AlertLocationMatch {
    pub fn distance(&self) -> u32 {
        match self {
            Self::System { distance, .. } | Self::Character { distance, .. } => *distance,
        }
    }
}

pub struct LocationMatcher<'a> {
    oracle: &'a dyn DistanceOracle,
    characters: &'a dyn CharacterLocations,
    use_jump_bridges: bool,
}

impl<'a> LocationMatcher<'a> {
    pub fn new(
        oracle: &'a dyn DistanceOracle,
        characters: &'a dyn CharacterLocations,
        use_jump_bridges: bool,
    ) -> Self {
        Self {
            oracle,
            characters,
            use_jump_bridges,
        }
    }

    /// Match a reported system against an alert's location constraint.
    /// Unresolvable distances never match.
    pub fn matches(
        &self,
        reported_system: &str,
        location: &IntelReportLocation,
    ) -> Option<AlertLocationMatch> {
        match location {
            IntelReportLocation::System {
                system_name,
                jumps_range,
            } => {
                let distance = self.distance(system_name, reported_system)?;
                in_range(jumps_range, distance).then(|| AlertLocationMatch::System {
                    system: system_name.clone(),
                    distance,
                })
            }
            IntelReportLocation::AnyOwnedCharacter { jumps_range } => {
                let closest = self
                    .characters
                    .online_characters()
                    .into_iter()
                    .filter_map(|(character_id, system)| {
                        let distance = self.distance(&system, reported_system)?;
                        Some((character_id, system, distance))
                    })
                    .min_by_key(|(character_id, _, distance)| (*distance, *character_id))?;

                let (character_id, system, distance) = closest;
                in_range(jumps_range, distance).then_some(AlertLocationMatch::Character {
                    character_id,
                    system,
                    distance,
                })
            }
            IntelReportLocation::OwnedCharacter {
                character_id,
                jumps_range,
            } => {
                let (_, system) = self
                    .characters
                    .online_characters()
                    .into_iter()
                    .find(|(id, _)| id == character_id)?;
                let distance = self.distance(&system, reported_system)?;
                in_range(jumps_range, distance).then_some(AlertLocationMatch::Character {
                    character_id: *character_id,
                    system,
                    distance,
                })
            }
        }
    }

    fn distance(&self, from: &str, to: &str) -> Option<u32> {
        if from == to {
            return Some(0);
        }
        self.oracle.jump_distance(from, to, self.use_jump_bridges)
    }
}

fn in_range(range: &JumpRange, distance: u32) -> bool {
    let matched = range.contains(distance);
    if !matched && range.min > range.max {
        log::debug!("Ignoring inverted jump range {}-{}", range.min, range.max);
    }
    matched
}

/// Symmetric distance lookup table. Used by replays and tests in place of the
/// solar system graph.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct DistanceTable {
    routes: Vec<Route>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    pub from: String,
    pub to: String,
    pub jumps: u32,
    /// Route only exists when jump bridges are allowed
    #[serde(default)]
    pub via_jump_bridge: bool,
}

impl DistanceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_route(mut self, from: &str, to: &str, jumps: u32) -> Self {
        self.routes.push(Route {
            from: from.to_string(),
            to: to.to_string(),
            jumps,
            via_jump_bridge: false,
        });
        self
    }

    pub fn with_bridge_route(mut self, from: &str, to: &str, jumps: u32) -> Self {
        self.routes.push(Route {
            from: from.to_string(),
            to: to.to_string(),
            jumps,
            via_jump_bridge: true,
        });
        self
    }
}

impl DistanceOracle for DistanceTable {
    fn jump_distance(&self, from: &str, to: &str, use_jump_bridges: bool) -> Option<u32> {
        if from == to {
            return Some(0);
        }
        self.routes
            .iter()
            .filter(|route| use_jump_bridges || !route.via_jump_bridge)
            .filter(|route| {
                (route.from == from && route.to == to) || (route.from == to && route.to == from)
            })
            .map(|route| route.jumps)
            .min()
    }
}

/// In-memory character tracker fed by location updates.
#[derive(Debug, Default)]
pub struct TrackedCharacters {
    characters: RwLock<HashMap<CharacterId, TrackedCharacter>>,
}

#[derive(Debug, Clone)]
struct TrackedCharacter {
    system: String,
    online: bool,
}

impl TrackedCharacters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&self, character_id: CharacterId, system: &str, online: bool) {
        self.characters
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                character_id,
                TrackedCharacter {
                    system: system.to_string(),
                    online,
                },
            );
    }

    pub fn remove(&self, character_id: CharacterId) {
        self.characters
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&character_id);
    }
}

impl CharacterLocations for TrackedCharacters {
    fn online_characters(&self) -> Vec<(CharacterId, String)> {
        let characters = self.characters.read().unwrap_or_else(PoisonError::into_inner);
        let mut online: Vec<_> = characters
            .iter()
            .filter(|(_, c)| c.online)
            .map(|(id, c)| (*id, c.system.clone()))
            .collect();
        online.sort_by_key(|(id, _)| *id);
        online
    }
}

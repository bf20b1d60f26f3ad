// Alert model types: user-authored rules, their triggers and actions.
//
// These are persisted in settings.json by the settings layer; the engine only
// holds them in memory.

use serde::{Deserialize, Serialize};

use crate::core::model::{CharacterId, ColonyId, PapType, PiEventType};

pub type AlertId = String;

/// A user-defined rule pairing one trigger with one or more actions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub id: AlertId,
    pub is_enabled: bool,
    /// `None` is the default group
    #[serde(default)]
    pub group: Option<String>,
    pub trigger: AlertTrigger,
    pub actions: Vec<AlertAction>,
    /// 0 fires every time
    #[serde(default)]
    pub cooldown_seconds: u32,
}

impl Alert {
    /// Remove repeated actions, keeping the first occurrence of each.
    pub fn dedup_actions(&mut self) {
        let mut seen: Vec<AlertAction> = Vec::with_capacity(self.actions.len());
        self.actions.retain(|action| {
            if seen.contains(action) {
                false
            } else {
                seen.push(action.clone());
                true
            }
        });
    }

    /// The first sound-producing action, used for previews.
    pub fn sound_action(&self) -> Option<&AlertAction> {
        self.actions.iter().find(|action| action.is_sound())
    }
}

/// Trigger condition, one variant per event source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AlertTrigger {
    IntelReported {
        report_types: Vec<IntelReportType>,
        report_location: IntelReportLocation,
    },
    GameAction {
        action_types: Vec<GameActionType>,
    },
    PlanetaryIndustry {
        event_types: Vec<PiEventType>,
        #[serde(default)]
        colonies_filter: Option<Vec<ColonyId>>,
        #[serde(default)]
        alert_before_seconds: u32,
    },
    ChatMessage {
        channel: ChatMessageChannel,
        #[serde(default)]
        sender: Option<String>,
        #[serde(default)]
        message_containing: Option<String>,
    },
    JabberPing {
        ping_type: JabberPingType,
    },
    JabberMessage {
        channel: JabberMessageChannel,
        #[serde(default)]
        sender: Option<String>,
        #[serde(default)]
        message_containing: Option<String>,
    },
    NoChannelActivity {
        channel: IntelChannel,
        duration_seconds: u32,
    },
}

impl AlertTrigger {
    pub fn category(&self) -> TriggerCategory {
        match self {
            Self::IntelReported { .. } => TriggerCategory::IntelReported,
            Self::GameAction { .. } => TriggerCategory::GameAction,
            Self::PlanetaryIndustry { .. } => TriggerCategory::PlanetaryIndustry,
            Self::ChatMessage { .. } => TriggerCategory::ChatMessage,
            Self::JabberPing { .. } => TriggerCategory::JabberPing,
            Self::JabberMessage { .. } => TriggerCategory::JabberMessage,
            Self::NoChannelActivity { .. } => TriggerCategory::NoChannelActivity,
        }
    }
}

/// Event source category an alert reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriggerCategory {
    IntelReported,
    GameAction,
    PlanetaryIndustry,
    ChatMessage,
    JabberPing,
    JabberMessage,
    NoChannelActivity,
}

impl TriggerCategory {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::IntelReported => "Intel reported",
            Self::GameAction => "In-game action",
            Self::PlanetaryIndustry => "Planetary industry",
            Self::ChatMessage => "Chat message",
            Self::JabberPing => "Jabber ping",
            Self::JabberMessage => "Jabber message",
            Self::NoChannelActivity => "No channel activity",
        }
    }

    pub fn all() -> &'static [TriggerCategory] {
        &[
            Self::IntelReported,
            Self::GameAction,
            Self::PlanetaryIndustry,
            Self::ChatMessage,
            Self::JabberPing,
            Self::JabberMessage,
            Self::NoChannelActivity,
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum IntelReportType {
    AnyCharacter,
    SpecificCharacters { characters: Vec<String> },
    AnyShip,
    SpecificShipClasses { classes: Vec<String> },
    Wormhole,
    GateCamp,
    Bubbles,
}

/// Inclusive jump distance bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JumpRange {
    pub min: u32,
    pub max: u32,
}

impl JumpRange {
    pub fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    /// An inverted range never matches.
    pub fn contains(&self, distance: u32) -> bool {
        self.min <= self.max && self.min <= distance && distance <= self.max
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum IntelReportLocation {
    System {
        system_name: String,
        jumps_range: JumpRange,
    },
    AnyOwnedCharacter {
        jumps_range: JumpRange,
    },
    OwnedCharacter {
        character_id: CharacterId,
        jumps_range: JumpRange,
    },
}

impl IntelReportLocation {
    pub fn jumps_range(&self) -> JumpRange {
        match self {
            Self::System { jumps_range, .. }
            | Self::AnyOwnedCharacter { jumps_range }
            | Self::OwnedCharacter { jumps_range, .. } => *jumps_range,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GameActionType {
    InCombat {
        #[serde(default)]
        name_containing: Option<String>,
    },
    UnderAttack {
        #[serde(default)]
        name_containing: Option<String>,
    },
    Attacking {
        #[serde(default)]
        name_containing: Option<String>,
    },
    BeingWarpScrambled,
    Decloaked {
        #[serde(default)]
        ignored_keywords: Vec<String>,
    },
    CombatStopped {
        #[serde(default)]
        name_containing: Option<String>,
        duration_seconds: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ChatMessageChannel {
    Any,
    Channel { name: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum JabberMessageChannel {
    Any,
    Channel { name: String },
    DirectMessage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum JabberPingType {
    Message,
    Message2 {
        #[serde(default)]
        target: Option<String>,
    },
    Fleet {
        #[serde(default)]
        target: Option<String>,
        #[serde(default)]
        fleet_commanders: Vec<String>,
        #[serde(default)]
        formup_system: Option<String>,
        pap_type: PapType,
        #[serde(default)]
        doctrine_containing: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum IntelChannel {
    All,
    Any,
    Channel { name: String },
}

/// What happens when an alert fires
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AlertAction {
    RiftNotification,
    SystemNotification,
    PushNotification,
    Sound { id: u32 },
    CustomSound { path: String },
    ShowPing,
    ShowColonies,
}

impl AlertAction {
    pub fn is_sound(&self) -> bool {
        matches!(self, Self::Sound { .. } | Self::CustomSound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alert(actions: Vec<AlertAction>) -> Alert {
        Alert {
            id: "a".to_string(),
            is_enabled: true,
            group: None,
            trigger: AlertTrigger::NoChannelActivity {
                channel: IntelChannel::All,
                duration_seconds: 120,
            },
            actions,
            cooldown_seconds: 0,
        }
    }

    #[test]
    fn test_all_categories_have_names() {
        for category in TriggerCategory::all() {
            assert!(!category.display_name().is_empty());
        }
    }

    #[test]
    fn test_jump_range_bounds() {
        let range = JumpRange::new(1, 3);
        assert!(!range.contains(0));
        assert!(range.contains(1));
        assert!(range.contains(3));
        assert!(!range.contains(4));

        assert!(JumpRange::new(0, 0).contains(0));
    }

    #[test]
    fn test_inverted_jump_range_never_matches() {
        let range = JumpRange::new(5, 2);
        for distance in 0..10 {
            assert!(!range.contains(distance));
        }
    }

    #[test]
    fn test_dedup_actions_by_kind_and_payload() {
        let mut alert = alert(vec![
            AlertAction::Sound { id: 1 },
            AlertAction::SystemNotification,
            AlertAction::Sound { id: 1 },
            AlertAction::Sound { id: 2 },
            AlertAction::SystemNotification,
        ]);
        alert.dedup_actions();
        assert_eq!(
            alert.actions,
            vec![
                AlertAction::Sound { id: 1 },
                AlertAction::SystemNotification,
                AlertAction::Sound { id: 2 },
            ]
        );
    }

    #[test]
    fn test_sound_action() {
        let alert = alert(vec![
            AlertAction::PushNotification,
            AlertAction::CustomSound {
                path: "/tmp/x.wav".to_string(),
            },
        ]);
        assert_eq!(
            alert.sound_action(),
            Some(&AlertAction::CustomSound {
                path: "/tmp/x.wav".to_string()
            })
        );
    }

    #[test]
    fn test_alert_defaults_when_deserializing() {
        let json = r#"{
            "id": "x",
            "is_enabled": true,
            "trigger": {"type": "ChatMessage", "channel": {"type": "Any"}},
            "actions": [{"type": "Sound", "id": 6}]
        }"#;
        let alert: Alert = serde_json::from_str(json).unwrap();
        assert_eq!(alert.group, None);
        assert_eq!(alert.cooldown_seconds, 0);
        assert_eq!(alert.trigger.category(), TriggerCategory::ChatMessage);
    }
}
